//! Schema module - Rule grammar model and configuration types.

mod config;
mod grammar;
mod rule;
mod vocabulary;

pub use config::*;
pub use grammar::*;
pub use rule::*;
pub use vocabulary::*;
