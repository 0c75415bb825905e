//! Collaborator interfaces.
//!
//! The simulation engine, playout policies and level analysis live outside
//! this crate. The host implements these traits; nothing here depends on a
//! concrete game or agent type.

mod policy;

pub use policy::*;

use std::time::{Duration, Instant};

/// A running game that can be advanced one action at a time.
///
/// `Clone` is the independent snapshot used to start each playout from the
/// same initial state.
pub trait GameState: Clone + Send + Sync {
    type Action: Send;

    /// Apply one action and advance the simulation a tick.
    fn advance(&mut self, action: Self::Action);

    /// Whether a termination rule has fired.
    fn is_game_over(&self) -> bool;

    /// Action applied when a policy overruns its deadline.
    fn nil_action(&self) -> Self::Action;
}

/// Result of compiling a ruleset against the level.
#[derive(Debug, Clone)]
pub struct Compilation<S> {
    /// Initial state; may be absent when the build failed.
    pub state: Option<S>,
    /// Build messages. Any message makes the ruleset build-invalid.
    pub diagnostics: Vec<String>,
}

impl<S> Compilation<S> {
    /// Clean build.
    pub fn ok(state: S) -> Self {
        Self {
            state: Some(state),
            diagnostics: Vec::new(),
        }
    }

    /// Build with diagnostics and no usable state.
    pub fn failed(diagnostics: Vec<String>) -> Self {
        Self {
            state: None,
            diagnostics,
        }
    }

    /// The state if the build was clean, the diagnostics otherwise.
    pub fn into_result(self) -> Result<S, Vec<String>> {
        match (self.state, self.diagnostics.is_empty()) {
            (Some(state), true) => Ok(state),
            (None, true) => Err(vec!["compiler returned no state".to_string()]),
            (_, false) => Err(self.diagnostics),
        }
    }
}

/// The game engine side that turns rule text into a playable state.
pub trait RuleCompiler: Sync {
    type State: GameState;

    fn compile(&self, interactions: &[String], terminations: &[String])
    -> Compilation<Self::State>;
}

/// Source of the usable entity identifiers of a level.
pub trait VocabularyProvider {
    fn usable_sprites(&self) -> Vec<String>;
}

/// Cooperative per-decision time budget.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    start: Instant,
    budget: Duration,
}

impl Deadline {
    /// Deadline starting now.
    pub fn after(budget: Duration) -> Self {
        Self {
            start: Instant::now(),
            budget,
        }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::after(Duration::from_millis(ms))
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Time left, zero once expired.
    pub fn remaining(&self) -> Duration {
        self.budget.saturating_sub(self.elapsed())
    }

    pub fn is_expired(&self) -> bool {
        self.elapsed() > self.budget
    }
}

/// A decision strategy used to play out a ruleset.
///
/// Implementations must return before `deadline` expires; a late answer is
/// discarded by the caller.
pub trait Policy<S: GameState>: Send {
    fn act(&mut self, state: &S, deadline: &Deadline) -> S::Action;
}

impl<S, F> Policy<S> for F
where
    S: GameState,
    F: FnMut(&S, &Deadline) -> S::Action + Send,
{
    fn act(&mut self, state: &S, deadline: &Deadline) -> S::Action {
        self(state, deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct Dummy;

    impl GameState for Dummy {
        type Action = ();
        fn advance(&mut self, _action: ()) {}
        fn is_game_over(&self) -> bool {
            false
        }
        fn nil_action(&self) {}
    }

    #[test]
    fn test_compilation_into_result() {
        assert!(Compilation::ok(Dummy).into_result().is_ok());

        let failed = Compilation::<Dummy>::failed(vec!["bad stype".into()]);
        assert_eq!(failed.into_result().err(), Some(vec!["bad stype".to_string()]));

        let with_warning = Compilation {
            state: Some(Dummy),
            diagnostics: vec!["warning".to_string()],
        };
        assert!(with_warning.into_result().is_err());

        let empty = Compilation::<Dummy> {
            state: None,
            diagnostics: Vec::new(),
        };
        assert_eq!(empty.into_result().err().map(|d| d.len()), Some(1));
    }

    #[test]
    fn test_deadline() {
        let deadline = Deadline::from_millis(10_000);
        assert!(!deadline.is_expired());
        assert!(deadline.remaining() <= deadline.budget());

        let expired = Deadline::after(Duration::ZERO);
        std::thread::sleep(Duration::from_millis(1));
        assert!(expired.is_expired());
        assert_eq!(expired.remaining(), Duration::ZERO);
    }

    #[test]
    fn test_closure_policy() {
        let mut calls = 0;
        let mut policy = |_: &Dummy, _: &Deadline| calls += 1;
        policy.act(&Dummy, &Deadline::from_millis(5));
        policy.act(&Dummy, &Deadline::from_millis(5));
        assert_eq!(calls, 2);
    }
}
