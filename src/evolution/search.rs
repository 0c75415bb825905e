//! The chromosome: one candidate ruleset plus its cached evaluation.

use log::{debug, error};
use rayon::prelude::*;

use crate::game::{GameState, PolicyRegistry, PolicySet, RuleCompiler};
use crate::schema::{MutationConfig, RuleSet, Vocabulary};

use super::fitness::{DEFAULT_FITNESS_LEN, Evaluation, EvaluationError, Evaluator};
use super::genome::{Mutation, RuleRng};
use super::ranking::{FEASIBILITY_THRESHOLD, FitnessSnapshot};

/// A candidate ruleset in the population.
pub struct Chromosome<S: GameState> {
    /// The ruleset; owned, never aliased.
    rules: RuleSet,
    /// Multi-objective fitness, meaningful once feasible.
    fitness: Vec<f64>,
    /// 1.0 when feasible, below 1.0 when not.
    constraint_fitness: f64,
    /// Set once evaluated; cleared by any rule change.
    evaluation: Option<Evaluation>,
    /// Compiled initial state of `rules`.
    state: Option<S>,
    /// Policies built against `state`.
    policies: Option<PolicySet<S>>,
}

impl<S: GameState> Chromosome<S> {
    /// Create an unevaluated chromosome.
    ///
    /// Fails when `registry` cannot supply all four policy kinds; such a
    /// chromosome could never be evaluated.
    pub fn new(rules: RuleSet, registry: &PolicyRegistry<S>) -> Result<Self, EvaluationError> {
        registry.check_complete().inspect_err(|e| {
            error!("cannot set up chromosome: {e}");
        })?;
        Ok(Self::unchecked(rules))
    }

    fn unchecked(rules: RuleSet) -> Self {
        Self {
            rules,
            fitness: vec![0.0; DEFAULT_FITNESS_LEN],
            constraint_fitness: 0.0,
            evaluation: None,
            state: None,
            policies: None,
        }
    }

    /// Unevaluated chromosome holding a copy of this one's rules.
    pub fn fresh_copy(&self) -> Self {
        Self::unchecked(self.rules.clone())
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Replace the ruleset, dropping everything derived from the old one.
    pub fn set_rules(&mut self, rules: RuleSet) {
        self.rules = rules;
        self.invalidate();
    }

    pub fn fitness(&self) -> &[f64] {
        &self.fitness
    }

    pub fn constraint_fitness(&self) -> f64 {
        self.constraint_fitness
    }

    pub fn is_calculated(&self) -> bool {
        self.evaluation.is_some()
    }

    pub fn is_feasible(&self) -> bool {
        self.constraint_fitness >= FEASIBILITY_THRESHOLD
    }

    pub fn evaluation(&self) -> Option<&Evaluation> {
        self.evaluation.as_ref()
    }

    pub fn state(&self) -> Option<&S> {
        self.state.as_ref()
    }

    pub fn has_policies(&self) -> bool {
        self.policies.is_some()
    }

    /// Values the ranking comparator needs.
    pub fn snapshot(&self) -> FitnessSnapshot {
        FitnessSnapshot::new(self.constraint_fitness, self.fitness.clone())
    }

    /// Mutate the rules in place. Cached results are dropped if anything
    /// changed.
    pub fn mutate(
        &mut self,
        rng: &mut RuleRng,
        config: &MutationConfig,
        vocabulary: &Vocabulary,
    ) -> Vec<Mutation> {
        let before = self.rules.clone();
        let mutations = rng.mutate(&mut self.rules, config, vocabulary);
        if self.rules != before {
            self.invalidate();
        }
        mutations
    }

    /// Evaluate with `evaluator`; see [`Evaluator::evaluate`].
    pub fn calculate_fitness<C>(
        &mut self,
        evaluator: &Evaluator<'_, C>,
        rng: &mut RuleRng,
    ) -> Result<Evaluation, EvaluationError>
    where
        C: RuleCompiler<State = S>,
    {
        evaluator.evaluate(self, rng)
    }

    fn invalidate(&mut self) {
        self.fitness = vec![0.0; DEFAULT_FITNESS_LEN];
        self.constraint_fitness = 0.0;
        self.evaluation = None;
        self.state = None;
        self.policies = None;
    }

    pub(crate) fn store_evaluation(&mut self, evaluation: Evaluation) {
        self.fitness = evaluation.fitness.clone();
        self.constraint_fitness = evaluation.constraint_fitness;
        self.evaluation = Some(evaluation);
    }

    pub(crate) fn cache_state(&mut self, state: S) {
        self.state = Some(state);
    }

    /// Policies for this chromosome, building them on first use.
    pub(crate) fn policies_or_build(
        &mut self,
        registry: &PolicyRegistry<S>,
        state: &S,
        rng: &mut RuleRng,
    ) -> Result<&mut PolicySet<S>, EvaluationError> {
        let policies = match self.policies.take() {
            Some(policies) => policies,
            None => registry.build_set(state, rng).inspect_err(|e| {
                error!("policy construction failed: {e}");
            })?,
        };
        Ok(self.policies.insert(policies))
    }
}

impl<S: GameState> std::fmt::Debug for Chromosome<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chromosome")
            .field("rules", &self.rules)
            .field("fitness", &self.fitness)
            .field("constraint_fitness", &self.constraint_fitness)
            .field("calculated", &self.is_calculated())
            .finish()
    }
}

/// Evaluate a population in parallel. Chromosome `i` draws from
/// `RuleRng::for_task(run_seed, i)`, so results do not depend on thread
/// scheduling.
pub fn evaluate_population<C: RuleCompiler>(
    evaluator: &Evaluator<'_, C>,
    population: &mut [Chromosome<C::State>],
    run_seed: u64,
) -> Vec<Result<Evaluation, EvaluationError>> {
    let results: Vec<_> = population
        .par_iter_mut()
        .enumerate()
        .map(|(i, chromosome)| {
            let mut rng = RuleRng::for_task(run_seed, i);
            evaluator.evaluate(chromosome, &mut rng)
        })
        .collect();

    let feasible = results
        .iter()
        .filter(|r| matches!(r, Ok(e) if e.is_feasible()))
        .count();
    debug!("evaluated {} chromosomes, {feasible} feasible", results.len());
    results
}
