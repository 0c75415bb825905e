//! Configuration types for rule mutation and feasibility evaluation.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Top-level configuration for one generator run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Mutation operator probabilities and value bounds.
    #[serde(default)]
    pub mutation: MutationConfig,
    /// Playout limits for the feasibility test.
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl GeneratorConfig {
    /// Read, parse and validate a JSON configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: GeneratorConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate both sections.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.mutation.validate()?;
        self.evaluation.validate()
    }
}

/// Probability table driving the mutation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationConfig {
    /// Exclusive upper bound on elementary mutations per `mutate` call.
    #[serde(default = "default_mutation_amount")]
    pub mutation_amount: usize,
    /// Share of insertion among operator classes.
    #[serde(default = "default_insertion_prob")]
    pub insertion_prob: f64,
    /// Share of deletion among operator classes.
    #[serde(default = "default_deletion_prob")]
    pub deletion_prob: f64,
    /// Share of modification among operator classes.
    #[serde(default = "default_modify_rule_prob")]
    pub modify_rule_prob: f64,
    /// Insertion: add a parameter rather than a whole rule.
    /// Also the chance a synthesized rule gets one parameter.
    #[serde(default = "default_half")]
    pub insert_param_prob: f64,
    /// Deletion: drop a parameter rather than a whole rule.
    #[serde(default = "default_half")]
    pub delete_param_prob: f64,
    /// Modification: replace a parameter rather than the rule name.
    #[serde(default = "default_half")]
    pub modify_param_prob: f64,
    /// A drawn parameter value is a sprite (otherwise a number).
    #[serde(default = "default_half")]
    pub param_sprite_prob: f64,
    /// A synthesized termination is a win.
    #[serde(default = "default_half")]
    pub win_param_prob: f64,
    /// Numeric parameter values are drawn from `[0, bound)`.
    #[serde(default = "default_numerical_value_bound")]
    pub numerical_value_bound: i64,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            mutation_amount: default_mutation_amount(),
            insertion_prob: default_insertion_prob(),
            deletion_prob: default_deletion_prob(),
            modify_rule_prob: default_modify_rule_prob(),
            insert_param_prob: default_half(),
            delete_param_prob: default_half(),
            modify_param_prob: default_half(),
            param_sprite_prob: default_half(),
            win_param_prob: default_half(),
            numerical_value_bound: default_numerical_value_bound(),
        }
    }
}

fn default_mutation_amount() -> usize {
    2
}
fn default_insertion_prob() -> f64 {
    0.3
}
fn default_deletion_prob() -> f64 {
    0.3
}
fn default_modify_rule_prob() -> f64 {
    0.4
}
fn default_half() -> f64 {
    0.5
}
fn default_numerical_value_bound() -> i64 {
    10
}

impl MutationConfig {
    /// Sum of the three operator-class shares.
    pub fn operator_total(&self) -> f64 {
        self.insertion_prob + self.deletion_prob + self.modify_rule_prob
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mutation_amount == 0 {
            return Err(ConfigError::InvalidMutationAmount);
        }

        let probabilities = [
            ("insertion_prob", self.insertion_prob),
            ("deletion_prob", self.deletion_prob),
            ("modify_rule_prob", self.modify_rule_prob),
            ("insert_param_prob", self.insert_param_prob),
            ("delete_param_prob", self.delete_param_prob),
            ("modify_param_prob", self.modify_param_prob),
            ("param_sprite_prob", self.param_sprite_prob),
            ("win_param_prob", self.win_param_prob),
        ];
        for (name, p) in probabilities {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::InvalidProbability {
                    name: name.to_string(),
                    value: p,
                });
            }
        }

        // Small tolerance for sums like 0.1 + 0.2 + 0.7.
        let total = self.operator_total();
        if total <= 0.0 || total > 1.0 + 1e-9 {
            return Err(ConfigError::InvalidOperatorTotal(total));
        }

        if self.numerical_value_bound < 1 {
            return Err(ConfigError::InvalidNumericBound(self.numerical_value_bound));
        }
        Ok(())
    }
}

/// Playout limits for the feasibility test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Steps the naive policy must survive; fewer means degenerate.
    #[serde(default = "default_feasibility_step_limit")]
    pub feasibility_step_limit: u32,
    /// Independent playouts per feasibility test.
    #[serde(default = "default_repetition_amount")]
    pub repetition_amount: usize,
    /// Wall-clock budget handed to a policy for each decision.
    #[serde(default = "default_evaluation_step_time_ms")]
    pub evaluation_step_time_ms: u64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            feasibility_step_limit: default_feasibility_step_limit(),
            repetition_amount: default_repetition_amount(),
            evaluation_step_time_ms: default_evaluation_step_time_ms(),
        }
    }
}

fn default_feasibility_step_limit() -> u32 {
    40
}
fn default_repetition_amount() -> usize {
    20
}
fn default_evaluation_step_time_ms() -> u64 {
    40
}

impl EvaluationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feasibility_step_limit == 0 {
            return Err(ConfigError::InvalidStepLimit);
        }
        if self.repetition_amount == 0 {
            return Err(ConfigError::InvalidRepetitions);
        }
        if self.evaluation_step_time_ms == 0 {
            return Err(ConfigError::InvalidStepTime);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Mutation amount must be at least 1")]
    InvalidMutationAmount,
    #[error("Probability {name} must be within [0, 1], got {value}")]
    InvalidProbability { name: String, value: f64 },
    #[error("Insertion, deletion and modification shares must sum to (0, 1], got {0}")]
    InvalidOperatorTotal(f64),
    #[error("Numerical value bound must be at least 1, got {0}")]
    InvalidNumericBound(i64),
    #[error("Feasibility step limit must be non-zero")]
    InvalidStepLimit,
    #[error("Repetition amount must be non-zero")]
    InvalidRepetitions,
    #[error("Evaluation step time must be non-zero")]
    InvalidStepTime,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_valid() {
        let config = GeneratorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.evaluation.feasibility_step_limit, 40);
    }

    #[test]
    fn test_operator_total_above_one_rejected() {
        let config = MutationConfig {
            insertion_prob: 0.5,
            deletion_prob: 0.5,
            modify_rule_prob: 0.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidOperatorTotal(_))
        ));
    }

    #[test]
    fn test_zero_operator_total_rejected() {
        let config = MutationConfig {
            insertion_prob: 0.0,
            deletion_prob: 0.0,
            modify_rule_prob: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_probability_out_of_range_rejected() {
        let config = MutationConfig {
            win_param_prob: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidProbability { .. })
        ));
    }

    #[test]
    fn test_zero_bounds_rejected() {
        let mutation = MutationConfig {
            numerical_value_bound: 0,
            ..Default::default()
        };
        assert!(mutation.validate().is_err());

        let evaluation = EvaluationConfig {
            repetition_amount: 0,
            ..Default::default()
        };
        assert!(evaluation.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "mutation": { "mutation_amount": 5 }, "random_seed": 7 }"#;
        let config: GeneratorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.mutation.mutation_amount, 5);
        assert_eq!(config.mutation.insertion_prob, 0.3);
        assert_eq!(config.evaluation.repetition_amount, 20);
        assert_eq!(config.random_seed, Some(7));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "evaluation": {{ "feasibility_step_limit": 60 }} }}"#
        )
        .unwrap();

        let config = GeneratorConfig::load(file.path()).unwrap();
        assert_eq!(config.evaluation.feasibility_step_limit, 60);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "mutation": {{ "mutation_amount": 0 }} }}"#).unwrap();
        assert!(matches!(
            GeneratorConfig::load(file.path()),
            Err(ConfigError::InvalidMutationAmount)
        ));

        assert!(matches!(
            GeneratorConfig::load("/nonexistent/rulegen.json"),
            Err(ConfigError::Io(_))
        ));
    }
}
