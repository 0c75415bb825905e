//! Two-tier chromosome ordering.
//!
//! Feasibility dominates: while either side is infeasible only the
//! constraint fitness counts. Between feasible chromosomes the summed
//! fitness vector decides.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::search::Chromosome;
use crate::game::GameState;

/// Constraint fitness at or above which a chromosome counts as feasible.
pub const FEASIBILITY_THRESHOLD: f64 = 1.0;

/// Immutable copy of the values ranking looks at.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FitnessSnapshot {
    pub constraint_fitness: f64,
    pub fitness: Vec<f64>,
}

impl FitnessSnapshot {
    pub fn new(constraint_fitness: f64, fitness: Vec<f64>) -> Self {
        Self {
            constraint_fitness,
            fitness,
        }
    }

    pub fn is_feasible(&self) -> bool {
        self.constraint_fitness >= FEASIBILITY_THRESHOLD
    }

    /// Scalarized fitness: the plain sum of all entries.
    pub fn total(&self) -> f64 {
        self.fitness.iter().sum()
    }
}

/// `Greater` when `a` ranks above `b`, `Equal` on ties.
pub fn compare(a: &FitnessSnapshot, b: &FitnessSnapshot) -> Ordering {
    compare_parts(a.constraint_fitness, &a.fitness, b.constraint_fitness, &b.fitness)
}

fn compare_parts(
    a_constraint: f64,
    a_fitness: &[f64],
    b_constraint: f64,
    b_fitness: &[f64],
) -> Ordering {
    let (a_constraint, b_constraint) = (clean(a_constraint), clean(b_constraint));
    if a_constraint < FEASIBILITY_THRESHOLD || b_constraint < FEASIBILITY_THRESHOLD {
        return cmp_score(a_constraint, b_constraint);
    }
    cmp_score(a_fitness.iter().sum(), b_fitness.iter().sum())
}

/// NaN ranks below everything so the order stays a strict weak ordering.
fn clean(x: f64) -> f64 {
    if x.is_nan() { f64::NEG_INFINITY } else { x }
}

fn cmp_score(a: f64, b: f64) -> Ordering {
    clean(a).partial_cmp(&clean(b)).unwrap_or(Ordering::Equal)
}

/// Order two chromosomes by their current fitness values.
pub fn compare_chromosomes<S: GameState>(a: &Chromosome<S>, b: &Chromosome<S>) -> Ordering {
    compare_parts(
        a.constraint_fitness(),
        a.fitness(),
        b.constraint_fitness(),
        b.fitness(),
    )
}

/// Sort a population best first. Stable, so ties keep their order.
pub fn sort_best_first<S: GameState>(population: &mut [Chromosome<S>]) {
    population.sort_by(|a, b| compare_chromosomes(b, a));
}
