//! Rule mutation operators.
//!
//! Every operator edits the structured [`Rule`] form of one explicitly named
//! collection and deduplicates it afterwards, so the collection stays
//! parseable and duplicate-free whatever branch is taken.

use log::debug;
use rand::prelude::*;

use crate::schema::{
    MutationConfig, Outcome, Param, ParamValue, Rule, RuleKind, RuleSet, Vocabulary, dedup_rules,
};

/// Explicit random stream threaded through mutation and evaluation.
pub struct RuleRng {
    rng: StdRng,
}

impl RuleRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create with random seed.
    pub fn random() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Independent stream for task `index` of a run, reproducible from the
    /// run seed alone.
    pub fn for_task(run_seed: u64, index: usize) -> Self {
        Self::new(splitmix64(
            run_seed ^ (index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15),
        ))
    }

    /// Generate next u64 for seeding child streams.
    pub fn next_seed(&mut self) -> u64 {
        self.rng.r#gen()
    }

    /// `true` with probability `p`; never panics on out-of-range `p`.
    fn chance(&mut self, p: f64) -> bool {
        self.rng.r#gen::<f64>() < p
    }

    /// Apply between zero and `mutation_amount - 1` elementary mutations,
    /// each routed to interactions or terminations with equal odds.
    pub fn mutate(
        &mut self,
        rules: &mut RuleSet,
        config: &MutationConfig,
        vocabulary: &Vocabulary,
    ) -> Vec<Mutation> {
        let count = self.rng.gen_range(0..config.mutation_amount.max(1));
        (0..count)
            .map(|_| {
                let kind = if self.rng.gen_bool(0.5) {
                    RuleKind::Interaction
                } else {
                    RuleKind::Termination
                };
                self.mutate_rules(rules.rules_mut(kind), kind, config, vocabulary)
            })
            .collect()
    }

    /// Apply one elementary mutation to `rules`, which hold rules of `kind`.
    pub fn mutate_rules(
        &mut self,
        rules: &mut Vec<Rule>,
        kind: RuleKind,
        config: &MutationConfig,
        vocabulary: &Vocabulary,
    ) -> Mutation {
        let operator = MutationOperator::choose(config, &mut self.rng);
        let mutation = match operator {
            MutationOperator::Insertion => {
                if self.chance(config.insert_param_prob) {
                    self.insert_param(rules, kind, config, vocabulary)
                } else {
                    self.insert_rule(rules, kind, config, vocabulary)
                }
            }
            MutationOperator::Deletion => {
                if self.chance(config.delete_param_prob) {
                    self.delete_param(rules, kind)
                } else {
                    self.delete_rule(rules, kind)
                }
            }
            MutationOperator::Modification => {
                if self.chance(config.modify_param_prob) {
                    self.modify_param(rules, kind, config, vocabulary)
                } else {
                    self.rename_rule(rules, kind)
                }
            }
        };

        let removed = dedup_rules(rules);
        debug!("{kind} mutation: {mutation:?} ({removed} duplicates removed)");
        mutation
    }

    /// Draw a fresh parameter whose key is not in `taken`.
    fn random_param(
        &mut self,
        kind: RuleKind,
        taken: &[&str],
        config: &MutationConfig,
        vocabulary: &Vocabulary,
    ) -> Option<Param> {
        let keys: Vec<&str> = kind
            .param_keys()
            .iter()
            .copied()
            .filter(|k| !taken.contains(k))
            .collect();
        let key = *keys.choose(&mut self.rng)?;

        let value = if self.chance(config.param_sprite_prob) {
            let sprite = vocabulary.get(self.rng.gen_range(0..vocabulary.len()));
            ParamValue::Sprite(sprite.to_string())
        } else {
            ParamValue::Number(self.rng.gen_range(0..config.numerical_value_bound.max(1)))
        };
        Some(Param::new(key, value))
    }

    /// Add a parameter to a random existing rule.
    fn insert_param(
        &mut self,
        rules: &mut [Rule],
        kind: RuleKind,
        config: &MutationConfig,
        vocabulary: &Vocabulary,
    ) -> Mutation {
        if rules.is_empty() {
            return Mutation::skipped(kind, MutationOperator::Insertion, "no rules");
        }
        let point = self.rng.gen_range(0..rules.len());
        let taken: Vec<&str> = rules[point].params.iter().map(|p| p.key.as_str()).collect();
        let Some(param) = self.random_param(kind, &taken, config, vocabulary) else {
            return Mutation::skipped(kind, MutationOperator::Insertion, "every key present");
        };

        let text = param.to_string();
        rules[point].params.push(param);
        Mutation::InsertParam {
            kind,
            rule: point,
            param: text,
        }
    }

    /// Synthesize a whole new rule between two distinct sprites.
    fn insert_rule(
        &mut self,
        rules: &mut Vec<Rule>,
        kind: RuleKind,
        config: &MutationConfig,
        vocabulary: &Vocabulary,
    ) -> Mutation {
        let Some(name) = kind.names().choose(&mut self.rng) else {
            return Mutation::skipped(kind, MutationOperator::Insertion, "no rule names");
        };

        let n = vocabulary.len();
        let i1 = self.rng.gen_range(0..n);
        let i2 = if n > 1 {
            (i1 + 1 + self.rng.gen_range(0..n - 1)) % n
        } else {
            i1
        };

        let mut rule = Rule::interaction(vocabulary.get(i1), vocabulary.get(i2), *name);
        if self.chance(config.insert_param_prob)
            && let Some(param) = self.random_param(kind, &[], config, vocabulary)
        {
            rule.params.push(param);
        }
        if kind == RuleKind::Termination {
            rule.outcome = Some(Outcome {
                win: self.chance(config.win_param_prob),
                limit: None,
            });
        }

        let text = rule.to_string();
        rules.push(rule);
        Mutation::InsertRule { kind, rule: text }
    }

    /// Drop one parameter of a random rule.
    fn delete_param(&mut self, rules: &mut [Rule], kind: RuleKind) -> Mutation {
        if rules.is_empty() {
            return Mutation::skipped(kind, MutationOperator::Deletion, "no rules");
        }
        let point = self.rng.gen_range(0..rules.len());
        let params = &mut rules[point].params;

        let removed = match params.len() {
            0 => return Mutation::skipped(kind, MutationOperator::Deletion, "no parameters"),
            1 => params.remove(0),
            n => params.remove(self.rng.gen_range(0..n)),
        };
        Mutation::DeleteParam {
            kind,
            rule: point,
            param: removed.to_string(),
        }
    }

    /// Drop a whole rule, never shrinking the collection below one entry.
    fn delete_rule(&mut self, rules: &mut Vec<Rule>, kind: RuleKind) -> Mutation {
        if rules.len() <= 1 {
            return Mutation::skipped(kind, MutationOperator::Deletion, "last rule");
        }
        let point = self.rng.gen_range(0..rules.len());
        let removed = rules.remove(point);
        Mutation::DeleteRule {
            kind,
            rule: removed.to_string(),
        }
    }

    /// Replace one parameter of a random rule with a fresh one.
    fn modify_param(
        &mut self,
        rules: &mut [Rule],
        kind: RuleKind,
        config: &MutationConfig,
        vocabulary: &Vocabulary,
    ) -> Mutation {
        if rules.is_empty() {
            return Mutation::skipped(kind, MutationOperator::Modification, "no rules");
        }
        let point = self.rng.gen_range(0..rules.len());
        let count = rules[point].params.len();
        if count == 0 {
            return Mutation::skipped(kind, MutationOperator::Modification, "no parameters");
        }

        let index = self.rng.gen_range(0..count);
        let others: Vec<&str> = rules[point]
            .params
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, p)| p.key.as_str())
            .collect();
        let Some(param) = self.random_param(kind, &others, config, vocabulary) else {
            return Mutation::skipped(kind, MutationOperator::Modification, "every key present");
        };

        let to = param.to_string();
        let from = std::mem::replace(&mut rules[point].params[index], param).to_string();
        Mutation::ModifyParam {
            kind,
            rule: point,
            from,
            to,
        }
    }

    /// Swap the rule name, keeping the sprite pair and parameters.
    fn rename_rule(&mut self, rules: &mut [Rule], kind: RuleKind) -> Mutation {
        if rules.is_empty() {
            return Mutation::skipped(kind, MutationOperator::Modification, "no rules");
        }
        let point = self.rng.gen_range(0..rules.len());
        let Some(name) = kind.names().choose(&mut self.rng) else {
            return Mutation::skipped(kind, MutationOperator::Modification, "no rule names");
        };

        let from = std::mem::replace(&mut rules[point].name, name.to_string());
        Mutation::RenameRule {
            kind,
            rule: point,
            from,
            to: name.to_string(),
        }
    }
}

/// SplitMix64 finalizer; spreads nearby task seeds apart.
fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Operator class of an elementary mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOperator {
    Insertion,
    Deletion,
    Modification,
}

impl MutationOperator {
    /// Pick a class by cumulative thresholds. The draw is scaled to the sum
    /// of the three shares, so there is no fall-through branch.
    pub fn choose<R: Rng + ?Sized>(config: &MutationConfig, rng: &mut R) -> Self {
        let roll = rng.r#gen::<f64>() * config.operator_total();
        if roll < config.insertion_prob {
            MutationOperator::Insertion
        } else if roll < config.insertion_prob + config.deletion_prob {
            MutationOperator::Deletion
        } else {
            MutationOperator::Modification
        }
    }
}

/// Record of one elementary mutation. Indices refer to the collection as it
/// was when the edit happened, before deduplication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    InsertParam {
        kind: RuleKind,
        rule: usize,
        param: String,
    },
    InsertRule {
        kind: RuleKind,
        rule: String,
    },
    DeleteParam {
        kind: RuleKind,
        rule: usize,
        param: String,
    },
    DeleteRule {
        kind: RuleKind,
        rule: String,
    },
    ModifyParam {
        kind: RuleKind,
        rule: usize,
        from: String,
        to: String,
    },
    RenameRule {
        kind: RuleKind,
        rule: usize,
        from: String,
        to: String,
    },
    /// Legal no-op, e.g. deleting a parameter from a parameter-less rule.
    Skipped {
        kind: RuleKind,
        operator: MutationOperator,
        reason: &'static str,
    },
}

impl Mutation {
    fn skipped(kind: RuleKind, operator: MutationOperator, reason: &'static str) -> Self {
        Mutation::Skipped {
            kind,
            operator,
            reason,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Mutation::Skipped { .. })
    }
}
