//! Fixed name tables of the rule language.
//!
//! Rule names and parameter keys are never derived from a game; they are the
//! closed vocabularies mutation is allowed to draw from.

use serde::{Deserialize, Serialize};

/// Interaction effects mutation may introduce.
pub const INTERACTIONS: &[&str] = &[
    "killSprite",
    "killAll",
    "killIfHasMore",
    "killIfHasLess",
    "killIfFromAbove",
    "killIfOtherHasMore",
    "transformToSingleton",
    "spawnBehind",
    "spawnIfHasMore",
    "spawnIfHasLess",
    "cloneSprite",
    "transformTo",
    "transformIfCounts",
    "transformToRandomChild",
    "updateSpawnType",
    "removeScore",
    "addHealthPoints",
    "addHealthPointsToMax",
    "subtractHealthPoints",
    "increaseSpeedToAll",
    "decreaseSpeedToAll",
    "setSpeedForAll",
    "stepBack",
    "undoAll",
    "flipDirection",
    "reverseDirection",
    "attractGaze",
    "align",
    "turnAround",
    "wrapAround",
    "teleportToExit",
    "pullWithIt",
    "bounceForward",
    "collectResource",
    "changeResource",
];

/// Termination conditions mutation may introduce.
pub const TERMINATIONS: &[&str] = &[
    "SpriteCounter",
    "SpriteCounterMore",
    "MultiSpriteCounter",
    "StopCounter",
    "Timeout",
];

/// Parameter keys legal on interaction rules.
pub const INTERACTION_PARAMS: &[&str] = &[
    "scoreChange",
    "stype",
    "limit",
    "resource",
    "stype_other",
    "forceOrientation",
    "spawnPoint",
    "value",
    "geq",
    "leq",
];

/// Parameter keys legal on termination rules.
pub const TERMINATION_PARAMS: &[&str] = &["stype", "stype1", "stype2", "stype3"];

/// Which of the two rule collections a rule belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleKind {
    /// Fires when two entity kinds collide.
    Interaction,
    /// Declares a game-ending condition; always carries `win`/`limit`.
    Termination,
}

impl RuleKind {
    /// Legal rule names for this kind.
    pub fn names(self) -> &'static [&'static str] {
        match self {
            RuleKind::Interaction => INTERACTIONS,
            RuleKind::Termination => TERMINATIONS,
        }
    }

    /// Legal parameter keys for this kind.
    pub fn param_keys(self) -> &'static [&'static str] {
        match self {
            RuleKind::Interaction => INTERACTION_PARAMS,
            RuleKind::Termination => TERMINATION_PARAMS,
        }
    }
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleKind::Interaction => write!(f, "interaction"),
            RuleKind::Termination => write!(f, "termination"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_have_no_duplicates() {
        for table in [INTERACTIONS, TERMINATIONS, INTERACTION_PARAMS, TERMINATION_PARAMS] {
            let mut sorted = table.to_vec();
            sorted.sort_unstable();
            sorted.dedup();
            assert_eq!(sorted.len(), table.len());
        }
    }

    #[test]
    fn test_termination_keys_exclude_outcome() {
        assert!(!TERMINATION_PARAMS.contains(&"win"));
        assert!(!TERMINATION_PARAMS.contains(&"limit"));
    }
}
