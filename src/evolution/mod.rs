//! Evolutionary search over game rulesets.
//!
//! # Overview
//!
//! - **Mutation** (`genome`): elementary insert/delete/modify edits on the
//!   structured rule form, driven by an explicit [`RuleRng`] stream
//! - **Evaluation** (`fitness`): build check, feasibility playouts under the
//!   naive policy, then pluggable [`Objective`]s
//! - **Chromosomes** (`search`): one ruleset plus its cached state, policies
//!   and evaluation
//! - **Ranking** (`ranking`): two-tier feasibility-first ordering
//!
//! # Example
//!
//! ```rust,no_run
//! use rulegen::evolution::RuleRng;
//! use rulegen::schema::{MutationConfig, RuleSet, Vocabulary};
//!
//! let mut rules = RuleSet::from_text(
//!     &["avatar wall > stepBack"],
//!     &["avatar goal > SpriteCounter stype=goal win=True limit=0"],
//! )
//! .unwrap();
//! let vocabulary = Vocabulary::new(["avatar", "wall", "goal"]).unwrap();
//!
//! let mut rng = RuleRng::new(42);
//! for mutation in rng.mutate(&mut rules, &MutationConfig::default(), &vocabulary) {
//!     println!("{mutation:?}");
//! }
//! ```

mod fitness;
mod genome;
mod ranking;
mod search;

pub use fitness::{
    DEFAULT_FITNESS_LEN, Evaluation, EvaluationError, Evaluator, Feasibility, Objective, play_out,
};
pub use genome::{Mutation, MutationOperator, RuleRng};
pub use ranking::{
    FEASIBILITY_THRESHOLD, FitnessSnapshot, compare, compare_chromosomes, sort_best_first,
};
pub use search::{Chromosome, evaluate_population};
