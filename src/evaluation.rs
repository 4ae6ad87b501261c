//! Objective evaluation operators and utilities.

use std::cell::Cell;

use crate::{instance::Instance, solution::Candidate};

/// An operator that measures a decision vector, producing both objective
/// values and the total weight counted against the capacity constraints.
///
/// The knapsack objectives live in [`MokpObjectives`]; any closure of type
/// `Fn(&[bool]) -> (f64, f64, f64)` works too, which keeps the evaluator
/// usable with other binary-encoded problems.
///
/// # Examples
/// ```
/// # use ibmols::evaluation::Objectives;
/// // "count the ones" toy problem with a free second objective
/// let o = |bits: &[bool]| {
///   let ones = bits.iter().filter(|b| **b).count() as f64;
///   (ones, bits.len() as f64 - ones, 0.0)
/// };
/// # let _ = o.measure(&[true, false]);
/// ```
///
/// **Note that you always can implement this trait instead of using closures.**
pub trait Objectives {
  /// Returns `(profit1, profit2, total_weight)` for given chromosome.
  fn measure(&self, chromosome: &[bool]) -> (f64, f64, f64);
}

impl<F> Objectives for F
where
  F: Fn(&[bool]) -> (f64, f64, f64),
{
  fn measure(&self, chromosome: &[bool]) -> (f64, f64, f64) {
    self(chromosome)
  }
}

/// The knapsack objective function: profit and weight sums over the
/// selected items of an instance.
#[derive(Clone, Copy, Debug)]
pub struct MokpObjectives<'a> {
  instance: &'a Instance,
}

impl Objectives for MokpObjectives<'_> {
  /// # Panics
  ///
  /// Panics if the chromosome length differs from the instance item count.
  fn measure(&self, chromosome: &[bool]) -> (f64, f64, f64) {
    assert_eq!(
      chromosome.len(),
      self.instance.len(),
      "chromosome length does not match instance item count"
    );
    let mut profit1 = 0.0;
    let mut profit2 = 0.0;
    let mut total_weight = 0.0;
    for (item, _) in self
      .instance
      .items()
      .iter()
      .zip(chromosome)
      .filter(|(_, &bit)| bit)
    {
      profit1 += item.profit1;
      profit2 += item.profit2;
      total_weight += item.weight;
    }
    (profit1, profit2, total_weight)
  }
}

/// Evaluates candidates against an [`Objectives`] operator, caching results
/// in the candidate and counting distinct evaluations.
///
/// Evaluating an already-evaluated candidate is a no-op; the counter only
/// moves for fresh chromosome states. The local search calls this O(n)
/// times per improvement step, so the caching contract matters.
#[derive(Debug)]
pub struct Evaluator<O> {
  objectives: O,
  evaluations: Cell<u64>,
}

impl<O: Objectives> Evaluator<O> {
  /// Wraps an objectives operator in a counting evaluator.
  pub fn new(objectives: O) -> Self {
    Self {
      objectives,
      evaluations: Cell::new(0),
    }
  }

  /// Computes and caches objective values for `candidate` if they are not
  /// current.
  pub fn evaluate(&self, candidate: &mut Candidate) {
    if candidate.is_evaluated() {
      return;
    }
    let (profit1, profit2, total_weight) =
      self.objectives.measure(candidate.chromosome());
    candidate.cache_objectives(profit1, profit2, total_weight);
    self.evaluations.set(self.evaluations.get() + 1);
  }

  /// Number of distinct chromosome states evaluated so far.
  pub fn evaluations(&self) -> u64 {
    self.evaluations.get()
  }
}

/// Shorthand for the evaluator every solver run uses.
pub fn mokp_evaluator(instance: &Instance) -> Evaluator<MokpObjectives<'_>> {
  Evaluator::new(MokpObjectives { instance })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn small_instance() -> Instance {
    Instance::parse("3 2\n3\n10 1 5\n1 10 5\n5 5 5\n10 10\n").unwrap()
  }

  #[test]
  fn test_mokp_sums() {
    let instance = small_instance();
    let evaluator = mokp_evaluator(&instance);
    let mut candidate = Candidate::from_bits(vec![true, false, true]);
    evaluator.evaluate(&mut candidate);
    assert_eq!(candidate.profit1(), 15.0);
    assert_eq!(candidate.profit2(), 6.0);
    assert_eq!(candidate.total_weight(), 10.0);
  }

  #[test]
  fn test_counter_skips_cached_states() {
    let instance = small_instance();
    let evaluator = mokp_evaluator(&instance);
    let mut candidate = Candidate::new(3);
    evaluator.evaluate(&mut candidate);
    evaluator.evaluate(&mut candidate);
    assert_eq!(evaluator.evaluations(), 1);
    candidate.flip(0);
    evaluator.evaluate(&mut candidate);
    assert_eq!(evaluator.evaluations(), 2);
  }

  #[test]
  #[should_panic(expected = "chromosome length")]
  fn test_length_mismatch_is_fatal() {
    let instance = small_instance();
    let evaluator = mokp_evaluator(&instance);
    let mut candidate = Candidate::new(2);
    evaluator.evaluate(&mut candidate);
  }

  #[test]
  fn test_closure_objectives() {
    let ones =
      |bits: &[bool]| (bits.iter().filter(|b| **b).count() as f64, 0.0, 0.0);
    let evaluator = Evaluator::new(ones);
    let mut candidate = Candidate::from_bits(vec![true, true, false]);
    evaluator.evaluate(&mut candidate);
    assert_eq!(candidate.profit1(), 2.0);
  }
}
