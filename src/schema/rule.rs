//! Structured form of a single rule and of a ruleset.
//!
//! Rules are parsed from and serialized to the textual encoding only at the
//! boundary; every edit acts on the structured form.
//!
//! ```text
//! interaction := <e1> <e2> > <name> (key=value)*
//! termination := <e1> <e2> > <name> (key=value)* win=<True|False> limit=<int|>
//! ```

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::RuleKind;

/// Value on the right-hand side of a `key=value` parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamValue {
    /// Any non-numeric token, normally an entity identifier.
    Sprite(String),
    /// Canonical decimal integer.
    Number(i64),
    /// `True` / `False`.
    Flag(bool),
    /// Nothing after the `=`.
    Empty,
}

impl ParamValue {
    /// Classify a raw value token. Tokens whose integer reading would not
    /// print back identically stay as `Sprite` so parsing is lossless.
    pub(crate) fn parse(raw: &str) -> Self {
        match raw {
            "" => ParamValue::Empty,
            "True" => ParamValue::Flag(true),
            "False" => ParamValue::Flag(false),
            _ => match raw.parse::<i64>() {
                Ok(n) if n.to_string() == raw => ParamValue::Number(n),
                _ => ParamValue::Sprite(raw.to_string()),
            },
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Sprite(s) => write!(f, "{s}"),
            ParamValue::Number(n) => write!(f, "{n}"),
            ParamValue::Flag(true) => write!(f, "True"),
            ParamValue::Flag(false) => write!(f, "False"),
            ParamValue::Empty => Ok(()),
        }
    }
}

/// A single `key=value` parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Param {
    pub key: String,
    pub value: ParamValue,
}

impl Param {
    pub fn new(key: impl Into<String>, value: ParamValue) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Mandatory trailer of a termination rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Outcome {
    /// Whether reaching the condition is a win for the player.
    pub win: bool,
    /// Counter limit; `None` serializes as an empty `limit=`.
    pub limit: Option<i64>,
}

/// Rule text parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleParseError {
    #[error("Rule '{0}' needs two entities, '>' and a rule name")]
    TooFewTokens(String),
    #[error("Rule '{0}' is missing '>' after the entity pair")]
    MissingArrow(String),
    #[error("Invalid entity or name '{token}' in rule '{rule}'")]
    MalformedToken { rule: String, token: String },
    #[error("Invalid parameter '{param}' in rule '{rule}'")]
    MalformedParam { rule: String, param: String },
    #[error("Termination '{0}' must carry both win= and limit=")]
    MissingOutcome(String),
    #[error("Termination '{rule}' has invalid win value '{value}'")]
    InvalidWin { rule: String, value: String },
    #[error("Termination '{rule}' has invalid limit value '{value}'")]
    InvalidLimit { rule: String, value: String },
}

/// One interaction or termination rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rule {
    /// First entity of the colliding pair.
    pub first: String,
    /// Second entity of the colliding pair.
    pub second: String,
    /// Interaction effect or termination condition name.
    pub name: String,
    /// Free parameters, in text order.
    pub params: Vec<Param>,
    /// Present exactly on termination rules.
    pub outcome: Option<Outcome>,
}

impl Rule {
    /// New interaction rule without parameters.
    pub fn interaction(
        first: impl Into<String>,
        second: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
            name: name.into(),
            params: Vec::new(),
            outcome: None,
        }
    }

    /// New termination rule without free parameters.
    pub fn termination(
        first: impl Into<String>,
        second: impl Into<String>,
        name: impl Into<String>,
        outcome: Outcome,
    ) -> Self {
        Self {
            outcome: Some(outcome),
            ..Self::interaction(first, second, name)
        }
    }

    /// Builder-style parameter append.
    pub fn with_param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    pub fn kind(&self) -> RuleKind {
        if self.outcome.is_some() {
            RuleKind::Termination
        } else {
            RuleKind::Interaction
        }
    }

    /// Whether a free parameter with this key is already present.
    pub fn has_key(&self, key: &str) -> bool {
        self.params.iter().any(|p| p.key == key)
    }

    /// Parse a rule of the given kind.
    pub fn parse(text: &str, kind: RuleKind) -> Result<Self, RuleParseError> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.len() < 4 {
            return Err(RuleParseError::TooFewTokens(text.to_string()));
        }
        if tokens[2] != ">" {
            return Err(RuleParseError::MissingArrow(text.to_string()));
        }
        for &token in [tokens[0], tokens[1], tokens[3]].iter() {
            if token.contains('=') || token.contains('>') {
                return Err(RuleParseError::MalformedToken {
                    rule: text.to_string(),
                    token: token.to_string(),
                });
            }
        }

        let mut params = Vec::with_capacity(tokens.len() - 4);
        for &token in &tokens[4..] {
            match token.split_once('=') {
                Some((key, value)) if !key.is_empty() && !value.contains('=') => {
                    params.push(Param::new(key, ParamValue::parse(value)));
                }
                _ => {
                    return Err(RuleParseError::MalformedParam {
                        rule: text.to_string(),
                        param: token.to_string(),
                    });
                }
            }
        }

        let outcome = match kind {
            RuleKind::Interaction => None,
            RuleKind::Termination => Some(lift_outcome(text, &mut params)?),
        };

        Ok(Self {
            first: tokens[0].to_string(),
            second: tokens[1].to_string(),
            name: tokens[3].to_string(),
            params,
            outcome,
        })
    }
}

/// Remove the last `win` and `limit` parameters and turn them into an
/// [`Outcome`]. Serialization always puts them last, so taking the last
/// occurrence keeps parse(display(r)) == r even with duplicated keys.
fn lift_outcome(text: &str, params: &mut Vec<Param>) -> Result<Outcome, RuleParseError> {
    let win_at = params.iter().rposition(|p| p.key == "win");
    let limit_at = params.iter().rposition(|p| p.key == "limit");
    let (Some(win_at), Some(limit_at)) = (win_at, limit_at) else {
        return Err(RuleParseError::MissingOutcome(text.to_string()));
    };

    let win = match &params[win_at].value {
        ParamValue::Flag(b) => *b,
        other => {
            return Err(RuleParseError::InvalidWin {
                rule: text.to_string(),
                value: other.to_string(),
            });
        }
    };
    let limit = match &params[limit_at].value {
        ParamValue::Empty => None,
        ParamValue::Number(n) => Some(*n),
        other => {
            return Err(RuleParseError::InvalidLimit {
                rule: text.to_string(),
                value: other.to_string(),
            });
        }
    };

    // Remove the higher index first so the lower one stays valid.
    let (hi, lo) = (win_at.max(limit_at), win_at.min(limit_at));
    params.remove(hi);
    params.remove(lo);

    Ok(Outcome { win, limit })
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} > {}", self.first, self.second, self.name)?;
        for param in &self.params {
            write!(f, " {param}")?;
        }
        if let Some(outcome) = &self.outcome {
            let win = if outcome.win { "True" } else { "False" };
            write!(f, " win={win} limit=")?;
            if let Some(limit) = outcome.limit {
                write!(f, "{limit}")?;
            }
        }
        Ok(())
    }
}

/// Drop textually identical rules, keeping the first occurrence.
///
/// Returns how many entries were removed.
pub fn dedup_rules(rules: &mut Vec<Rule>) -> usize {
    let before = rules.len();
    let mut seen = HashSet::with_capacity(before);
    rules.retain(|rule| seen.insert(rule.to_string()));
    before - rules.len()
}

/// The interaction and termination collections of one candidate game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RuleSetText", into = "RuleSetText")]
pub struct RuleSet {
    pub interactions: Vec<Rule>,
    pub terminations: Vec<Rule>,
}

/// Textual wire form of a [`RuleSet`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RuleSetText {
    #[serde(default)]
    interactions: Vec<String>,
    #[serde(default)]
    terminations: Vec<String>,
}

impl RuleSet {
    /// Parse both collections from their textual encodings.
    pub fn from_text<S: AsRef<str>>(
        interactions: &[S],
        terminations: &[S],
    ) -> Result<Self, RuleParseError> {
        let parse_all = |texts: &[S], kind| {
            texts
                .iter()
                .map(|t| Rule::parse(t.as_ref(), kind))
                .collect::<Result<Vec<_>, _>>()
        };
        Ok(Self {
            interactions: parse_all(interactions, RuleKind::Interaction)?,
            terminations: parse_all(terminations, RuleKind::Termination)?,
        })
    }

    /// Serialize both collections, in order.
    pub fn to_text(&self) -> (Vec<String>, Vec<String>) {
        (
            self.interactions.iter().map(Rule::to_string).collect(),
            self.terminations.iter().map(Rule::to_string).collect(),
        )
    }

    pub fn rules(&self, kind: RuleKind) -> &[Rule] {
        match kind {
            RuleKind::Interaction => &self.interactions,
            RuleKind::Termination => &self.terminations,
        }
    }

    pub fn rules_mut(&mut self, kind: RuleKind) -> &mut Vec<Rule> {
        match kind {
            RuleKind::Interaction => &mut self.interactions,
            RuleKind::Termination => &mut self.terminations,
        }
    }
}

impl TryFrom<RuleSetText> for RuleSet {
    type Error = RuleParseError;

    fn try_from(text: RuleSetText) -> Result<Self, Self::Error> {
        RuleSet::from_text(&text.interactions, &text.terminations)
    }
}

impl From<RuleSet> for RuleSetText {
    fn from(rules: RuleSet) -> Self {
        let (interactions, terminations) = rules.to_text();
        Self {
            interactions,
            terminations,
        }
    }
}
