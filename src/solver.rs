//! The search driver: population lifecycle, restarts and termination.

use std::time::{Duration, Instant};

use itertools::Itertools;
use rand::rngs::SmallRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};
use typed_builder::TypedBuilder;

use crate::{
  archive::{Archive, OBJECTIVE_TOLERANCE},
  evaluation::{mokp_evaluator, Evaluator, MokpObjectives},
  instance::{Instance, Item},
  random::{seeded, RandomSource},
  search::LocalSearch,
  solution::{Candidate, ParetoPoint},
};

/// Inclusion densities used for random initial candidates.
const DENSITIES: [f64; 3] = [0.2, 0.35, 0.5];

/// Archive self-heal cadence, in driver iterations.
const PRUNE_PERIOD: usize = 200;

/// Configuration of a solver run.
///
/// Built with a compile-time-checked builder; every knob has a default:
/// ```
/// # use ibmols::solver::SolverConfig;
/// let config = SolverConfig::builder().seed(42).max_iterations(500).build();
/// ```
#[derive(TypedBuilder, Clone, Debug, Serialize, Deserialize)]
pub struct SolverConfig {
  /// Seed for the run's random source. The same seed over the same
  /// instance reproduces the run exactly.
  #[builder(default = 1)]
  pub seed: u64,
  /// Driver iterations to execute before stopping.
  #[builder(default = 50_000)]
  pub max_iterations: usize,
  /// Optional wall-clock budget, checked cooperatively between iterations.
  #[builder(default, setter(strip_option))]
  pub max_time: Option<Duration>,
  /// Number of candidates kept alive by the driver.
  #[builder(default = 24)]
  pub population_size: usize,
  /// Accepted hill-climbing steps allowed per local-search call.
  #[builder(default = 100)]
  pub local_search_depth: usize,
  /// Upper bound on archive size. Keep it generous relative to the
  /// expected front size; premature truncation destroys the result.
  #[builder(default = 10_000)]
  pub archive_bound: usize,
  /// Explored flags are cleared every `population_size * reset_period`
  /// iterations, allowing re-exploration of stale candidates.
  #[builder(default = 5)]
  pub reset_period: usize,
  /// A fresh random or greedy candidate replaces a population slot every
  /// `restart_period` iterations. Restarts are what keep the archive
  /// growing once the population has converged; without them the search
  /// saturates a small locked population far below the achievable front
  /// size.
  #[builder(default = 10)]
  pub restart_period: usize,
}

impl Default for SolverConfig {
  fn default() -> Self {
    Self::builder().build()
  }
}

impl SolverConfig {
  fn validate(&self) {
    assert!(self.max_iterations > 0, "max_iterations must be positive");
    assert!(self.population_size > 0, "population_size must be positive");
    assert!(
      self.local_search_depth > 0,
      "local_search_depth must be positive"
    );
    assert!(self.archive_bound > 0, "archive_bound must be positive");
    assert!(self.reset_period > 0, "reset_period must be positive");
    assert!(self.restart_period > 0, "restart_period must be positive");
  }
}

/// Outcome of a solver run. The archive members are deep copies,
/// independent of any internal storage.
#[derive(Clone, Debug)]
pub struct RunResult {
  /// Final non-dominated archive.
  pub archive: Vec<Candidate>,
  /// Driver iterations executed.
  pub iterations: usize,
  /// Objective evaluations performed.
  pub evaluations: u64,
  /// Wall time consumed.
  pub elapsed: Duration,
}

impl RunResult {
  /// The archive projected onto objective space.
  pub fn front(&self) -> Vec<ParetoPoint> {
    self.archive.iter().map(Candidate::point).collect()
  }

  /// A serializable summary of the run.
  pub fn summary(&self) -> RunSummary {
    RunSummary {
      archive_size: self.archive.len(),
      iterations: self.iterations,
      evaluations: self.evaluations,
      elapsed: self.elapsed,
      front: self.front(),
    }
  }
}

/// Serializable run statistics plus the final front.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
  /// Number of non-dominated solutions found.
  pub archive_size: usize,
  /// Driver iterations executed.
  pub iterations: usize,
  /// Objective evaluations performed.
  pub evaluations: u64,
  /// Wall time consumed.
  pub elapsed: Duration,
  /// The final front in objective space.
  pub front: Vec<ParetoPoint>,
}

/// Greedy construction weightings, one per ratio strategy.
#[derive(Clone, Copy, Debug)]
enum Ratio {
  Profit1,
  Profit2,
  ProfitSum,
}

impl Ratio {
  fn of(self, item: &Item) -> f64 {
    let profit = match self {
      Ratio::Profit1 => item.profit1,
      Ratio::Profit2 => item.profit2,
      Ratio::ProfitSum => item.profit1 + item.profit2,
    };
    profit / item.weight.max(1.0)
  }
}

const GREEDY_RATIOS: [Ratio; 3] =
  [Ratio::ProfitSum, Ratio::Profit1, Ratio::Profit2];

/// The IBMOLS driver: iterated local search over a small population,
/// feeding a bounded non-dominated archive.
///
/// One run proceeds in phases: a mixed random/greedy initial population
/// (repaired to feasibility) seeds the archive; the driver then walks the
/// population round-robin, climbing from each unexplored candidate and
/// offering the result to the archive; explored flags, periodic flag
/// resets and fresh-candidate restarts keep the search from stagnating;
/// the run stops on its iteration or wall-clock budget and returns the
/// archive.
#[derive(Clone, Debug)]
pub struct Solver {
  config: SolverConfig,
}

impl Solver {
  /// Creates a solver with given configuration.
  pub fn new(config: SolverConfig) -> Self {
    Self { config }
  }

  /// The solver's configuration.
  pub fn config(&self) -> &SolverConfig {
    &self.config
  }

  /// Runs the search on `instance` and returns the final archive.
  ///
  /// # Panics
  ///
  /// Panics if the configuration is invalid (any zero budget or size).
  pub fn run(&self, instance: &Instance) -> RunResult {
    self.config.validate();
    let mut rng = seeded(self.config.seed);
    self.run_with(instance, &mut rng)
  }

  /// Runs `workers` independent searches with distinct seeds in parallel
  /// and merges their archives into one. The merge is a single-threaded
  /// reduction through [`Archive::offer`], so the combined front upholds
  /// the same invariants as a single run.
  ///
  /// # Panics
  ///
  /// Panics if `workers` is zero or the configuration is invalid.
  pub fn run_multistart(
    &self,
    instance: &Instance,
    workers: usize,
  ) -> RunResult {
    assert!(workers > 0, "need at least one worker");
    self.config.validate();
    let start = Instant::now();

    let results: Vec<RunResult> = (0..workers)
      .into_par_iter()
      .map(|worker| {
        let config = SolverConfig {
          seed: self.config.seed.wrapping_add(worker as u64),
          ..self.config.clone()
        };
        Solver::new(config).run(instance)
      })
      .collect();

    let mut archive = Archive::new(self.config.archive_bound);
    let mut iterations = 0;
    let mut evaluations = 0;
    for result in &results {
      iterations += result.iterations;
      evaluations += result.evaluations;
      for candidate in &result.archive {
        archive.offer(candidate, instance);
      }
    }
    info!(workers, merged = archive.len(), "multi-start runs merged");
    RunResult {
      archive: archive.into_members(),
      iterations,
      evaluations,
      elapsed: start.elapsed(),
    }
  }

  fn run_with(&self, instance: &Instance, rng: &mut SmallRng) -> RunResult {
    let start = Instant::now();
    let evaluator = mokp_evaluator(instance);
    let search = LocalSearch::new(self.config.local_search_depth);
    let mut archive = Archive::new(self.config.archive_bound);

    let mut population = self.initial_population(instance, &evaluator, rng);
    for candidate in &population {
      archive.offer(candidate, instance);
    }
    info!(
      items = instance.len(),
      population = population.len(),
      seeded = archive.len(),
      "starting run"
    );

    let reset_every = self.config.population_size * self.config.reset_period;
    let mut explored = vec![false; population.len()];
    let mut cursor = 0;
    let mut restarts = 0;
    let mut iterations = 0;

    while iterations < self.config.max_iterations {
      if let Some(budget) = self.config.max_time {
        if start.elapsed() >= budget {
          debug!(iteration = iterations, "wall-clock budget exhausted");
          break;
        }
      }
      iterations += 1;

      if iterations % reset_every == 0 {
        explored.fill(false);
        debug!(iteration = iterations, "cleared explored flags");
      }
      if iterations % self.config.restart_period == 0 {
        let slot = restarts % population.len();
        population[slot] =
          self.fresh_candidate(restarts, instance, &evaluator, rng);
        explored[slot] = false;
        restarts += 1;
        debug!(iteration = iterations, slot, "injected fresh candidate");
      }

      let Some(slot) = next_unexplored(&explored, cursor) else {
        explored.fill(false);
        continue;
      };
      cursor = (slot + 1) % population.len();

      let improved =
        search.improve(&population[slot], instance, &evaluator, rng);
      let outcome = archive.offer(&improved, instance);
      trace!(iteration = iterations, slot, ?outcome, "offered climb result");

      if improved.score() > population[slot].score() + OBJECTIVE_TOLERANCE {
        population[slot] = improved;
        explored[slot] = false;
      } else {
        explored[slot] = true;
      }

      if iterations % PRUNE_PERIOD == 0 {
        let removed = archive.prune();
        if removed > 0 {
          debug!(iteration = iterations, removed, "archive self-heal");
        }
      }
    }

    info!(
      iterations,
      archive = archive.len(),
      evaluations = evaluator.evaluations(),
      "run finished"
    );
    RunResult {
      archive: archive.into_members(),
      iterations,
      evaluations: evaluator.evaluations(),
      elapsed: start.elapsed(),
    }
  }

  fn initial_population(
    &self,
    instance: &Instance,
    evaluator: &Evaluator<MokpObjectives<'_>>,
    rng: &mut impl RandomSource,
  ) -> Vec<Candidate> {
    let mut population = Vec::with_capacity(self.config.population_size);
    for ratio in GREEDY_RATIOS.into_iter().take(self.config.population_size)
    {
      population.push(greedy_candidate(instance, evaluator, ratio));
    }
    for slot in population.len()..self.config.population_size {
      let density = DENSITIES[slot % DENSITIES.len()];
      population.push(random_candidate(instance, evaluator, rng, density));
    }
    population
  }

  fn fresh_candidate(
    &self,
    restarts: usize,
    instance: &Instance,
    evaluator: &Evaluator<MokpObjectives<'_>>,
    rng: &mut impl RandomSource,
  ) -> Candidate {
    // alternate greedy and random construction across restarts
    match restarts % 6 {
      0 => greedy_candidate(instance, evaluator, Ratio::ProfitSum),
      2 => greedy_candidate(instance, evaluator, Ratio::Profit1),
      4 => greedy_candidate(instance, evaluator, Ratio::Profit2),
      odd => random_candidate(
        instance,
        evaluator,
        rng,
        DENSITIES[(odd / 2) % DENSITIES.len()],
      ),
    }
  }
}

/// Builds a candidate by taking items in decreasing profit/weight ratio
/// order while they fit the tighter capacity.
fn greedy_candidate(
  instance: &Instance,
  evaluator: &Evaluator<MokpObjectives<'_>>,
  ratio: Ratio,
) -> Candidate {
  let capacity = instance.capacity1().min(instance.capacity2());
  let order = (0..instance.len()).sorted_by(|&a, &b| {
    ratio
      .of(instance.item(b))
      .total_cmp(&ratio.of(instance.item(a)))
  });
  let mut candidate = Candidate::new(instance.len());
  let mut weight = 0.0;
  for index in order {
    let item = instance.item(index);
    if weight + item.weight <= capacity {
      candidate.set(index, true);
      weight += item.weight;
    }
  }
  evaluator.evaluate(&mut candidate);
  candidate
}

/// Builds a uniform-random candidate at the given inclusion density and
/// repairs it to feasibility by dropping random selected items.
fn random_candidate(
  instance: &Instance,
  evaluator: &Evaluator<MokpObjectives<'_>>,
  rng: &mut impl RandomSource,
  density: f64,
) -> Candidate {
  let mut candidate = Candidate::new(instance.len());
  for index in 0..instance.len() {
    if rng.next_float01() < density {
      candidate.set(index, true);
    }
  }
  evaluator.evaluate(&mut candidate);
  while !candidate.is_feasible(instance) {
    let selected: Vec<usize> = candidate.selected().collect();
    if selected.is_empty() {
      break;
    }
    let victim = selected[rng.next_in_range(selected.len() as u32) as usize];
    candidate.set(victim, false);
    evaluator.evaluate(&mut candidate);
  }
  candidate
}

fn next_unexplored(explored: &[bool], cursor: usize) -> Option<usize> {
  let n = explored.len();
  (0..n)
    .map(|offset| (cursor + offset) % n)
    .find(|&slot| !explored[slot])
}
