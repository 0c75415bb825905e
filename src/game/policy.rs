//! Policy kinds, the constructor registry and the per-chromosome policy set.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{GameState, Policy};
use crate::evolution::RuleRng;

/// The four fixed strategies used to drive evaluation playouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyKind {
    /// Strongest available player.
    Reference,
    /// Simple greedy player; drives the feasibility test.
    Naive,
    /// Never acts.
    Inert,
    /// Uniformly random actions.
    Random,
}

impl PolicyKind {
    pub const ALL: [PolicyKind; 4] = [
        PolicyKind::Reference,
        PolicyKind::Naive,
        PolicyKind::Inert,
        PolicyKind::Random,
    ];
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PolicyKind::Reference => "reference",
            PolicyKind::Naive => "naive",
            PolicyKind::Inert => "inert",
            PolicyKind::Random => "random",
        };
        write!(f, "{name}")
    }
}

/// Policy construction errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    #[error("No {0} policy registered")]
    NotRegistered(PolicyKind),
    #[error("Failed to construct {kind} policy: {reason}")]
    Construction { kind: PolicyKind, reason: String },
}

/// Boxed error a constructor may fail with.
pub type ConstructorError = Box<dyn std::error::Error + Send + Sync>;

/// Builds a policy from the compiled initial state and a stream seed.
pub type PolicyConstructor<S> =
    Box<dyn Fn(&S, u64) -> Result<Box<dyn Policy<S>>, ConstructorError> + Send + Sync>;

/// Maps each [`PolicyKind`] to a constructor, populated by the host at
/// startup.
pub struct PolicyRegistry<S: GameState> {
    constructors: HashMap<PolicyKind, PolicyConstructor<S>>,
}

impl<S: GameState> Default for PolicyRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: GameState> fmt::Debug for PolicyRegistry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.constructors.keys().collect();
        kinds.sort_by_key(|k| k.to_string());
        f.debug_struct("PolicyRegistry")
            .field("kinds", &kinds)
            .finish()
    }
}

impl<S: GameState> PolicyRegistry<S> {
    pub fn new() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Register (or replace) the constructor for `kind`.
    pub fn register<F>(&mut self, kind: PolicyKind, constructor: F) -> &mut Self
    where
        F: Fn(&S, u64) -> Result<Box<dyn Policy<S>>, ConstructorError> + Send + Sync + 'static,
    {
        self.constructors.insert(kind, Box::new(constructor));
        self
    }

    /// Builder-style [`register`](Self::register).
    pub fn with<F>(mut self, kind: PolicyKind, constructor: F) -> Self
    where
        F: Fn(&S, u64) -> Result<Box<dyn Policy<S>>, ConstructorError> + Send + Sync + 'static,
    {
        self.register(kind, constructor);
        self
    }

    pub fn contains(&self, kind: PolicyKind) -> bool {
        self.constructors.contains_key(&kind)
    }

    /// Fail on the first kind without a constructor.
    pub fn check_complete(&self) -> Result<(), PolicyError> {
        match PolicyKind::ALL.into_iter().find(|k| !self.contains(*k)) {
            Some(missing) => Err(PolicyError::NotRegistered(missing)),
            None => Ok(()),
        }
    }

    /// Construct one policy.
    pub fn build(
        &self,
        kind: PolicyKind,
        state: &S,
        seed: u64,
    ) -> Result<Box<dyn Policy<S>>, PolicyError> {
        let constructor = self
            .constructors
            .get(&kind)
            .ok_or(PolicyError::NotRegistered(kind))?;
        constructor(state, seed).map_err(|e| PolicyError::Construction {
            kind,
            reason: e.to_string(),
        })
    }

    /// Construct all four policies, each seeded from `rng`.
    pub fn build_set(&self, state: &S, rng: &mut RuleRng) -> Result<PolicySet<S>, PolicyError> {
        Ok(PolicySet {
            reference: self.build(PolicyKind::Reference, state, rng.next_seed())?,
            naive: self.build(PolicyKind::Naive, state, rng.next_seed())?,
            inert: self.build(PolicyKind::Inert, state, rng.next_seed())?,
            random: self.build(PolicyKind::Random, state, rng.next_seed())?,
        })
    }
}

/// The constructed policies of one chromosome.
pub struct PolicySet<S: GameState> {
    pub reference: Box<dyn Policy<S>>,
    pub naive: Box<dyn Policy<S>>,
    pub inert: Box<dyn Policy<S>>,
    pub random: Box<dyn Policy<S>>,
}

impl<S: GameState> PolicySet<S> {
    pub fn get_mut(&mut self, kind: PolicyKind) -> &mut dyn Policy<S> {
        match kind {
            PolicyKind::Reference => self.reference.as_mut(),
            PolicyKind::Naive => self.naive.as_mut(),
            PolicyKind::Inert => self.inert.as_mut(),
            PolicyKind::Random => self.random.as_mut(),
        }
    }
}

impl<S: GameState> fmt::Debug for PolicySet<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PolicySet { .. }")
    }
}
