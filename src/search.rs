//! Bit-flip local search over candidate solutions.

use crate::{
  archive::dominates,
  evaluation::{Evaluator, Objectives},
  instance::Instance,
  random::{shuffle_indices, RandomSource},
  solution::Candidate,
};

/// Acceptance rule for a hill-climbing step: the neighbor must strictly
/// increase the scalarized profit sum or Pareto-dominate the current
/// candidate. Mutual non-domination alone is not an improvement - treating
/// it as one lets the search declare success without any objective moving,
/// which stalls archive growth.
fn improves(neighbor: &Candidate, current: &Candidate) -> bool {
  neighbor.score() > current.score() || dominates(neighbor, current)
}

/// Best-improvement bit-flip hill climber.
///
/// Each step visits all single-flip neighbors of the current candidate in
/// a freshly shuffled order, keeps the best feasible improving one, and
/// falls back to a bounded number of random pair flips when no single flip
/// improves. The climb stops at the first step with no improving move or
/// after `max_iterations` accepted steps, whichever comes first.
#[derive(Clone, Copy, Debug)]
pub struct LocalSearch {
  max_iterations: usize,
}

/// Random pair-flip attempts per step once single flips are exhausted,
/// capped at the chromosome length.
const PAIR_FLIP_BUDGET: usize = 50;

impl LocalSearch {
  /// Creates a climber accepting at most `max_iterations` steps per call.
  pub fn new(max_iterations: usize) -> Self {
    Self { max_iterations }
  }

  /// Climbs from `candidate` and returns the best candidate found, which
  /// is the input itself when it already sits on a local optimum. The
  /// result is always evaluated and, if the input was feasible, feasible.
  pub fn improve<O: Objectives>(
    &self,
    candidate: &Candidate,
    instance: &Instance,
    evaluator: &Evaluator<O>,
    rng: &mut impl RandomSource,
  ) -> Candidate {
    let mut current = candidate.clone();
    evaluator.evaluate(&mut current);
    for _ in 0..self.max_iterations {
      let next = self
        .best_single_flip(&current, instance, evaluator, rng)
        .or_else(|| self.best_pair_flip(&current, instance, evaluator, rng));
      match next {
        Some(neighbor) => current = neighbor,
        None => break,
      }
    }
    current
  }

  fn best_single_flip<O: Objectives>(
    &self,
    current: &Candidate,
    instance: &Instance,
    evaluator: &Evaluator<O>,
    rng: &mut impl RandomSource,
  ) -> Option<Candidate> {
    let mut best: Option<Candidate> = None;
    for index in shuffle_indices(current.len(), rng) {
      let mut neighbor = current.clone();
      neighbor.flip(index);
      evaluator.evaluate(&mut neighbor);
      if !neighbor.is_feasible(instance) || !improves(&neighbor, current) {
        continue;
      }
      if best.as_ref().map_or(true, |b| neighbor.score() > b.score()) {
        best = Some(neighbor);
      }
    }
    best
  }

  fn best_pair_flip<O: Objectives>(
    &self,
    current: &Candidate,
    instance: &Instance,
    evaluator: &Evaluator<O>,
    rng: &mut impl RandomSource,
  ) -> Option<Candidate> {
    let n = current.len();
    let mut best: Option<Candidate> = None;
    for _ in 0..PAIR_FLIP_BUDGET.min(n) {
      let first = rng.next_in_range(n as u32) as usize;
      let second = rng.next_in_range(n as u32) as usize;
      if first == second {
        continue;
      }
      let mut neighbor = current.clone();
      neighbor.flip(first);
      neighbor.flip(second);
      evaluator.evaluate(&mut neighbor);
      if !neighbor.is_feasible(instance) || !improves(&neighbor, current) {
        continue;
      }
      if best.as_ref().map_or(true, |b| neighbor.score() > b.score()) {
        best = Some(neighbor);
      }
    }
    best
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{evaluation::mokp_evaluator, random::seeded};

  fn instance() -> Instance {
    Instance::parse("3 2\n3\n10 1 5\n1 10 5\n5 5 5\n10 10\n").unwrap()
  }

  #[test]
  fn test_improve_climbs_to_feasible_optimum() {
    let instance = instance();
    let evaluator = mokp_evaluator(&instance);
    let mut rng = seeded(3);
    let search = LocalSearch::new(100);

    let improved =
      search.improve(&Candidate::new(3), &instance, &evaluator, &mut rng);
    assert!(improved.is_feasible(&instance));
    // best attainable profit sum under capacity 10 is 22 = {item0, item1}
    assert_eq!(improved.score(), 22.0);
  }

  #[test]
  fn test_improve_is_monotone() {
    let instance = instance();
    let evaluator = mokp_evaluator(&instance);
    let mut rng = seeded(4);
    let search = LocalSearch::new(100);

    let mut start = Candidate::new(3);
    evaluator.evaluate(&mut start);
    let improved = search.improve(&start, &instance, &evaluator, &mut rng);
    assert!(improved.score() >= start.score());
  }

  #[test]
  fn test_improve_is_idempotent_at_optimum() {
    let instance = instance();
    let evaluator = mokp_evaluator(&instance);
    let mut rng = seeded(5);
    let search = LocalSearch::new(100);

    let once =
      search.improve(&Candidate::new(3), &instance, &evaluator, &mut rng);
    let twice = search.improve(&once, &instance, &evaluator, &mut rng);
    assert_eq!(once.chromosome(), twice.chromosome());
  }

  #[test]
  fn test_infeasible_neighbors_never_accepted() {
    // single item too heavy to ever fit
    let instance = Instance::parse("1 2\n1\n100\n100\n20\n10 10\n").unwrap();
    let evaluator = mokp_evaluator(&instance);
    let mut rng = seeded(6);
    let search = LocalSearch::new(100);

    let improved =
      search.improve(&Candidate::new(1), &instance, &evaluator, &mut rng);
    assert_eq!(improved.selected().count(), 0);
  }
}
