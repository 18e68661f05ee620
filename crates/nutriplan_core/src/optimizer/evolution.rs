//! Differential-evolution global stage.
//!
//! rand/1/bin scheme: each member is perturbed by a scaled difference of
//! two other members, crossed over binomially, and replaced only if the
//! trial scores better. Trial vectors are generated serially from a seeded
//! RNG so runs are reproducible; only the objective evaluations fan out
//! across threads.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::error::StageFailure;
use crate::formulate::Problem;
use crate::optimizer::objective::ObjectiveFn;
use crate::optimizer::{GlobalConfig, StageSolution};

const STAGE: &str = "global";

/// Population size below which rand/1/bin cannot pick distinct donors.
const MIN_POPULATION: usize = 4;

pub(crate) fn solve_global(
    problem: &Problem,
    objective: &ObjectiveFn<'_>,
    config: &GlobalConfig,
) -> Result<StageSolution, StageFailure> {
    if config.population < MIN_POPULATION {
        return Err(StageFailure::Degenerate {
            stage: STAGE,
            reason: "population too small for donor selection",
        });
    }
    if config.max_generations == 0 {
        return Err(StageFailure::IterationCap {
            stage: STAGE,
            iterations: 0,
        });
    }

    let bounds = search_bounds(problem);
    let mut rng = SmallRng::seed_from_u64(config.seed);

    // Seed member 0 with the formulator's guess so the global stage never
    // starts worse than the local stage did.
    let mut population: Vec<Vec<f64>> = Vec::with_capacity(config.population);
    let mut seeded = problem.initial_guess();
    clamp_into(&mut seeded, &bounds);
    population.push(seeded);
    for _ in 1..config.population {
        population.push(random_member(&mut rng, &bounds));
    }

    let mut scores = evaluate(objective, &population);
    if scores.iter().all(|s| !s.is_finite()) {
        return Err(StageFailure::NonFinite { stage: STAGE });
    }

    let mut generations_run = 0;
    let mut converged = false;
    for generation in 1..=config.max_generations {
        generations_run = generation;

        // RNG work stays on one thread for determinism.
        let trials: Vec<Vec<f64>> = (0..config.population)
            .map(|target| {
                make_trial(
                    &mut rng,
                    &population,
                    target,
                    &bounds,
                    config.differential_weight,
                    config.crossover_probability,
                )
            })
            .collect();

        let trial_scores = evaluate(objective, &trials);

        for (member, (trial, trial_score)) in
            trials.into_iter().zip(trial_scores).enumerate()
        {
            if trial_score.is_finite() && trial_score <= scores[member] {
                population[member] = trial;
                scores[member] = trial_score;
            }
        }

        if spread(&scores) < config.tolerance {
            converged = true;
            break;
        }
    }

    let best = scores
        .iter()
        .enumerate()
        .filter(|(_, s)| s.is_finite())
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(i, _)| i);
    let Some(best) = best else {
        return Err(StageFailure::NonFinite { stage: STAGE });
    };

    Ok(StageSolution {
        objective: scores[best],
        rates: population.swap_remove(best),
        iterations: generations_run,
        converged,
    })
}

/// Bound box for the search: the formulator's bounds, tightened so no
/// single nutrient can exceed the whole budget on its own.
fn search_bounds(problem: &Problem) -> Vec<(f64, f64)> {
    let mut bounds = problem.bounds();
    if let Some(budget) = problem.budget {
        for (bound, spec) in bounds.iter_mut().zip(problem.specs()) {
            if spec.unit_cost > 0.0 {
                bound.1 = bound.1.min(budget / spec.unit_cost).max(bound.0);
            }
        }
    }
    bounds
}

fn random_member(rng: &mut SmallRng, bounds: &[(f64, f64)]) -> Vec<f64> {
    bounds
        .iter()
        .map(|(lower, upper)| {
            if upper > lower {
                rng.random_range(*lower..*upper)
            } else {
                *lower
            }
        })
        .collect()
}

fn make_trial(
    rng: &mut SmallRng,
    population: &[Vec<f64>],
    target: usize,
    bounds: &[(f64, f64)],
    weight: f64,
    crossover: f64,
) -> Vec<f64> {
    let (a, b, c) = pick_donors(rng, population.len(), target);
    let dimension = bounds.len();
    let forced = rng.random_range(0..dimension);
    let mut trial = population[target].clone();
    for i in 0..dimension {
        if i == forced || rng.random::<f64>() < crossover {
            trial[i] = population[a][i] + weight * (population[b][i] - population[c][i]);
        }
    }
    clamp_into(&mut trial, bounds);
    trial
}

/// Three distinct member indices, all different from `target`.
fn pick_donors(rng: &mut SmallRng, population: usize, target: usize) -> (usize, usize, usize) {
    let mut pick = |taken: &[usize]| loop {
        let candidate = rng.random_range(0..population);
        if candidate != target && !taken.contains(&candidate) {
            return candidate;
        }
    };
    let a = pick(&[]);
    let b = pick(&[a]);
    let c = pick(&[a, b]);
    (a, b, c)
}

fn clamp_into(member: &mut [f64], bounds: &[(f64, f64)]) {
    for (value, (lower, upper)) in member.iter_mut().zip(bounds) {
        *value = value.clamp(*lower, *upper);
    }
}

fn evaluate(objective: &ObjectiveFn<'_>, members: &[Vec<f64>]) -> Vec<f64> {
    #[cfg(feature = "parallel")]
    let scores: Vec<f64> = members.par_iter().map(|m| objective.value(m)).collect();

    #[cfg(not(feature = "parallel"))]
    let scores: Vec<f64> = members.iter().map(|m| objective.value(m)).collect();

    scores
}

/// Objective spread across the finite members of the population.
fn spread(scores: &[f64]) -> f64 {
    let mut best = f64::INFINITY;
    let mut worst = f64::NEG_INFINITY;
    for score in scores.iter().filter(|s| s.is_finite()) {
        best = best.min(*score);
        worst = worst.max(*score);
    }
    if best.is_finite() && worst.is_finite() {
        worst - best
    } else {
        f64::INFINITY
    }
}
