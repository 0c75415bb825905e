//! Rulegen - Evolutionary search over video game description rules.
//!
//! A candidate game is a [`RuleSet`]: interaction rules (what happens when
//! two sprites collide) and termination rules (when the game ends and who
//! wins). This crate mutates rulesets, checks them for feasibility by
//! simulated play and ranks them.
//!
//! # Architecture
//!
//! - `schema`: Rule grammar, textual rule model, vocabulary and configuration
//! - `game`: Collaborator traits for the game engine, compiler and policies
//! - `evolution`: Mutation, evaluation, chromosomes and ranking
//!
//! The game engine itself is not part of this crate. Hosts implement
//! [`game::RuleCompiler`] and [`game::GameState`] and register one
//! constructor per [`game::PolicyKind`].
//!
//! # Example
//!
//! ```rust,no_run
//! use rulegen::{
//!     evolution::RuleRng,
//!     schema::{GeneratorConfig, RuleSet, Vocabulary},
//! };
//!
//! let config = GeneratorConfig::default();
//! let vocabulary = Vocabulary::new(["avatar", "wall", "box", "goal"]).unwrap();
//! let mut rules = RuleSet::from_text(
//!     &["avatar wall > stepBack", "box avatar > bounceForward"],
//!     &["box goal > SpriteCounter stype=box win=True limit=0"],
//! )
//! .unwrap();
//!
//! let mut rng = RuleRng::new(7);
//! for _ in 0..10 {
//!     rng.mutate(&mut rules, &config.mutation, &vocabulary);
//! }
//!
//! let (interactions, terminations) = rules.to_text();
//! println!("{interactions:#?}\n{terminations:#?}");
//! ```

pub mod evolution;
pub mod game;
pub mod schema;

// Re-export commonly used types
pub use evolution::{Chromosome, Evaluator, RuleRng};
pub use schema::{GeneratorConfig, Rule, RuleKind, RuleSet, Vocabulary};
