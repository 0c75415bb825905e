//! Feasibility test and fitness evaluation of a ruleset.
//!
//! A ruleset is infeasible when it does not build, or when the naive policy
//! cannot survive `feasibility_step_limit` steps of play. Only feasible
//! rulesets are handed to the fitness objectives.

use log::{debug, warn};

use crate::game::{
    Deadline, GameState, Policy, PolicyError, PolicyRegistry, PolicySet, RuleCompiler,
};
use crate::schema::EvaluationConfig;

use super::genome::RuleRng;
use super::ranking::FEASIBILITY_THRESHOLD;
use super::search::Chromosome;

/// Number of fitness entries present before any objective runs.
pub const DEFAULT_FITNESS_LEN: usize = 2;

/// One scalar objective of the multi-objective fitness vector.
pub trait Objective<S: GameState>: Send + Sync {
    fn name(&self) -> &str;

    /// Score a feasible ruleset from its compiled initial state.
    fn score(&self, state: &S, policies: &mut PolicySet<S>, step_time_ms: u64) -> f64;
}

/// Outcome of the feasibility test.
#[derive(Debug, Clone, PartialEq)]
pub enum Feasibility {
    /// Builds cleanly and survives passive play.
    Feasible,
    /// The compiler reported diagnostics; nothing was simulated.
    BuildInvalid { diagnostics: Vec<String> },
    /// The game ended after `survived` steps under the naive policy.
    Degenerate { survived: u32 },
}

impl Feasibility {
    pub fn is_feasible(&self) -> bool {
        matches!(self, Feasibility::Feasible)
    }
}

/// Result of evaluating one chromosome.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub feasibility: Feasibility,
    pub fitness: Vec<f64>,
    /// 1.0 when feasible, below 1.0 otherwise.
    pub constraint_fitness: f64,
}

impl Evaluation {
    pub fn is_feasible(&self) -> bool {
        self.feasibility.is_feasible()
    }
}

/// Fatal evaluation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvaluationError {
    #[error("Policy setup failed: {0}")]
    Policy(#[from] PolicyError),
}

/// Evaluates chromosomes against one compiler and policy registry.
pub struct Evaluator<'a, C: RuleCompiler> {
    compiler: &'a C,
    registry: &'a PolicyRegistry<C::State>,
    config: EvaluationConfig,
    objectives: Vec<Box<dyn Objective<C::State>>>,
}

impl<'a, C: RuleCompiler> Evaluator<'a, C> {
    /// Create a new evaluator.
    pub fn new(
        compiler: &'a C,
        registry: &'a PolicyRegistry<C::State>,
        config: EvaluationConfig,
    ) -> Self {
        Self {
            compiler,
            registry,
            config,
            objectives: Vec::new(),
        }
    }

    /// Append an objective; objective `i` fills fitness entry `i`.
    pub fn with_objective(mut self, objective: Box<dyn Objective<C::State>>) -> Self {
        self.objectives.push(objective);
        self
    }

    /// Length of the fitness vectors this evaluator produces.
    pub fn fitness_len(&self) -> usize {
        self.objectives.len().max(DEFAULT_FITNESS_LEN)
    }

    /// Classify and score `chromosome`, caching the result on it.
    pub fn evaluate(
        &self,
        chromosome: &mut Chromosome<C::State>,
        rng: &mut RuleRng,
    ) -> Result<Evaluation, EvaluationError> {
        if let Some(cached) = chromosome.evaluation() {
            return Ok(cached.clone());
        }

        let evaluation = self.compute(chromosome, rng)?;
        chromosome.store_evaluation(evaluation.clone());
        Ok(evaluation)
    }

    fn compute(
        &self,
        chromosome: &mut Chromosome<C::State>,
        rng: &mut RuleRng,
    ) -> Result<Evaluation, EvaluationError> {
        let mut fitness = vec![0.0; self.fitness_len()];

        let cached = chromosome.state().cloned();
        let state = match cached {
            Some(state) => state,
            None => {
                let (interactions, terminations) = chromosome.rules().to_text();
                match self
                    .compiler
                    .compile(&interactions, &terminations)
                    .into_result()
                {
                    Ok(state) => {
                        chromosome.cache_state(state.clone());
                        state
                    }
                    Err(diagnostics) => {
                        debug!("build invalid: {} diagnostics", diagnostics.len());
                        return Ok(Evaluation {
                            feasibility: Feasibility::BuildInvalid { diagnostics },
                            fitness,
                            constraint_fitness: 0.0,
                        });
                    }
                }
            }
        };

        let policies = chromosome.policies_or_build(self.registry, &state, rng)?;

        let limit = self.config.feasibility_step_limit;
        let survived = (0..self.config.repetition_amount.max(1))
            .map(|_| {
                play_out(
                    state.clone(),
                    limit,
                    policies.naive.as_mut(),
                    self.config.evaluation_step_time_ms,
                )
            })
            .min()
            .unwrap_or(0);

        if survived < limit {
            debug!("degenerate ruleset: naive policy survived {survived}/{limit} steps");
            return Ok(Evaluation {
                feasibility: Feasibility::Degenerate { survived },
                fitness,
                constraint_fitness: f64::from(survived) / f64::from(limit),
            });
        }

        for (slot, objective) in fitness.iter_mut().zip(&self.objectives) {
            *slot = objective.score(&state, policies, self.config.evaluation_step_time_ms);
            debug!("objective {} = {:.4}", objective.name(), *slot);
        }

        Ok(Evaluation {
            feasibility: Feasibility::Feasible,
            fitness,
            constraint_fitness: FEASIBILITY_THRESHOLD,
        })
    }
}

/// Play `state` with `policy` for at most `steps` steps, stopping early on
/// game over. Returns the number of steps taken.
///
/// Each decision gets a fresh deadline of `step_time_ms`. An answer that
/// arrives after its deadline is discarded and the nil action applied.
pub fn play_out<S: GameState>(
    mut state: S,
    steps: u32,
    policy: &mut dyn Policy<S>,
    step_time_ms: u64,
) -> u32 {
    let mut taken = 0;
    while taken < steps {
        if state.is_game_over() {
            break;
        }
        let deadline = Deadline::from_millis(step_time_ms);
        let mut action = policy.act(&state, &deadline);
        if deadline.is_expired() {
            warn!(
                "policy exceeded its {}ms budget ({}ms), applying nil action",
                step_time_ms,
                deadline.elapsed().as_millis()
            );
            action = state.nil_action();
        }
        state.advance(action);
        taken += 1;
    }
    taken
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::game::{Compilation, PolicyKind};
    use crate::schema::RuleSet;

    /// Game that ends once `ticks` reaches `lifetime`; moves add to a score.
    #[derive(Clone)]
    struct Clock {
        ticks: u32,
        lifetime: u32,
        score: i32,
    }

    impl GameState for Clock {
        type Action = i32;
        fn advance(&mut self, action: i32) {
            self.ticks += 1;
            self.score += action;
        }
        fn is_game_over(&self) -> bool {
            self.ticks >= self.lifetime
        }
        fn nil_action(&self) -> i32 {
            0
        }
    }

    /// Compiles to a clock whose lifetime is the number of interactions x 20,
    /// and rejects any rule named `killAll`.
    struct ClockCompiler {
        compiles: AtomicUsize,
    }

    impl ClockCompiler {
        fn new() -> Self {
            Self {
                compiles: AtomicUsize::new(0),
            }
        }
    }

    impl RuleCompiler for ClockCompiler {
        type State = Clock;
        fn compile(&self, interactions: &[String], _terminations: &[String]) -> Compilation<Clock> {
            self.compiles.fetch_add(1, Ordering::Relaxed);
            if interactions.iter().any(|r| r.contains("killAll")) {
                return Compilation::failed(vec!["killAll is not allowed here".into()]);
            }
            Compilation::ok(Clock {
                ticks: 0,
                lifetime: interactions.len() as u32 * 20,
                score: 0,
            })
        }
    }

    fn registry(naive_calls: Arc<AtomicUsize>) -> PolicyRegistry<Clock> {
        PolicyRegistry::new()
            .with(PolicyKind::Reference, |_, _| {
                Ok(Box::new(|_: &Clock, _: &Deadline| 2))
            })
            .with(PolicyKind::Naive, move |_, _| {
                let calls = Arc::clone(&naive_calls);
                Ok(Box::new(move |_: &Clock, _: &Deadline| {
                    calls.fetch_add(1, Ordering::Relaxed);
                    1
                }))
            })
            .with(PolicyKind::Inert, |_, _| Ok(Box::new(|_: &Clock, _: &Deadline| 0)))
            .with(PolicyKind::Random, |_, _| Ok(Box::new(|_: &Clock, _: &Deadline| -1)))
    }

    struct ReferenceScore;

    impl Objective<Clock> for ReferenceScore {
        fn name(&self) -> &str {
            "reference-score"
        }
        fn score(&self, state: &Clock, policies: &mut PolicySet<Clock>, step_time_ms: u64) -> f64 {
            let mut game = state.clone();
            for _ in 0..5 {
                let action = policies
                    .reference
                    .act(&game, &Deadline::from_millis(step_time_ms));
                game.advance(action);
            }
            f64::from(game.score)
        }
    }

    fn chromosome(interactions: &[&str], registry: &PolicyRegistry<Clock>) -> Chromosome<Clock> {
        let rules = RuleSet::from_text(
            interactions,
            &["avatar goal > SpriteCounter stype=goal win=True limit=0"],
        )
        .unwrap();
        Chromosome::new(rules, registry).unwrap()
    }

    fn config(repetitions: usize) -> EvaluationConfig {
        EvaluationConfig {
            feasibility_step_limit: 40,
            repetition_amount: repetitions,
            evaluation_step_time_ms: 1_000,
        }
    }

    #[test]
    fn test_survival_at_limit_is_feasible() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = registry(Arc::clone(&calls));
        let compiler = ClockCompiler::new();
        let evaluator = Evaluator::new(&compiler, &registry, config(3));

        // Two interactions: lifetime 40, exactly the limit.
        let mut c = chromosome(&["avatar wall > stepBack", "box wall > stepBack"], &registry);
        let evaluation = evaluator.evaluate(&mut c, &mut RuleRng::new(1)).unwrap();

        assert_eq!(evaluation.feasibility, Feasibility::Feasible);
        assert_eq!(evaluation.constraint_fitness, 1.0);
        assert_eq!(evaluation.fitness, vec![0.0, 0.0]);
        assert_eq!(calls.load(Ordering::Relaxed), 3 * 40);
    }

    #[test]
    fn test_early_collapse_is_degenerate() {
        let registry = registry(Arc::new(AtomicUsize::new(0)));
        let compiler = ClockCompiler::new();
        let evaluator = Evaluator::new(&compiler, &registry, config(2));

        // One interaction: lifetime 20 < 40.
        let mut c = chromosome(&["avatar wall > stepBack"], &registry);
        let evaluation = evaluator.evaluate(&mut c, &mut RuleRng::new(1)).unwrap();

        assert_eq!(evaluation.feasibility, Feasibility::Degenerate { survived: 20 });
        assert_eq!(evaluation.constraint_fitness, 0.5);
        assert!(!c.is_feasible());
    }

    #[test]
    fn test_build_invalid_skips_simulation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = registry(Arc::clone(&calls));
        let compiler = ClockCompiler::new();
        let evaluator = Evaluator::new(&compiler, &registry, config(5));

        let mut c = chromosome(&["avatar wall > killAll"], &registry);
        let evaluation = evaluator.evaluate(&mut c, &mut RuleRng::new(1)).unwrap();

        assert_eq!(
            evaluation.feasibility,
            Feasibility::BuildInvalid {
                diagnostics: vec!["killAll is not allowed here".to_string()]
            }
        );
        assert_eq!(evaluation.constraint_fitness, 0.0);
        assert_eq!(calls.load(Ordering::Relaxed), 0);
        assert!(!c.has_policies());
    }

    #[test]
    fn test_objectives_fill_fitness_vector() {
        let registry = registry(Arc::new(AtomicUsize::new(0)));
        let compiler = ClockCompiler::new();
        let evaluator = Evaluator::new(&compiler, &registry, config(1))
            .with_objective(Box::new(ReferenceScore));

        let mut c = chromosome(&["avatar wall > stepBack", "box wall > stepBack"], &registry);
        let evaluation = evaluator.evaluate(&mut c, &mut RuleRng::new(1)).unwrap();

        assert_eq!(evaluation.fitness, vec![10.0, 0.0]);
        assert_eq!(c.fitness(), &[10.0, 0.0]);
    }

    #[test]
    fn test_calculated_chromosome_not_recompiled() {
        let registry = registry(Arc::new(AtomicUsize::new(0)));
        let compiler = ClockCompiler::new();
        let evaluator = Evaluator::new(&compiler, &registry, config(1));

        let mut c = chromosome(&["avatar wall > stepBack", "box wall > stepBack"], &registry);
        let first = evaluator.evaluate(&mut c, &mut RuleRng::new(1)).unwrap();
        let second = evaluator.evaluate(&mut c, &mut RuleRng::new(2)).unwrap();

        assert_eq!(first, second);
        assert_eq!(compiler.compiles.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_policy_construction_failure_is_fatal() {
        let registry = registry(Arc::new(AtomicUsize::new(0)))
            .with(PolicyKind::Random, |_, _| Err("no random agent".into()));
        let compiler = ClockCompiler::new();
        let evaluator = Evaluator::new(&compiler, &registry, config(1));

        let mut c = chromosome(&["avatar wall > stepBack"], &registry);
        let err = evaluator.evaluate(&mut c, &mut RuleRng::new(1)).unwrap_err();
        assert!(matches!(
            err,
            EvaluationError::Policy(PolicyError::Construction {
                kind: PolicyKind::Random,
                ..
            })
        ));
        assert!(!c.is_calculated());
    }

    #[test]
    fn test_play_out_stops_on_game_over() {
        let state = Clock {
            ticks: 0,
            lifetime: 7,
            score: 0,
        };
        let mut policy = |_: &Clock, _: &Deadline| 1;
        assert_eq!(play_out(state.clone(), 40, &mut policy, 100), 7);
        assert_eq!(play_out(state, 3, &mut policy, 100), 3);
    }

    #[test]
    fn test_play_out_discards_late_actions() {
        #[derive(Clone)]
        struct Tally(Vec<i32>);
        impl GameState for Tally {
            type Action = i32;
            fn advance(&mut self, action: i32) {
                self.0.push(action);
            }
            fn is_game_over(&self) -> bool {
                self.0.iter().any(|&a| a != 0)
            }
            fn nil_action(&self) -> i32 {
                0
            }
        }

        let mut slow = |_: &Tally, deadline: &Deadline| {
            std::thread::sleep(deadline.budget() + Duration::from_millis(2));
            9
        };
        // A landed 9 would end the game after one step.
        assert_eq!(play_out(Tally(Vec::new()), 3, &mut slow, 1), 3);
    }
}
