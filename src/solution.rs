//! Candidate solutions over binary item-selection chromosomes.

use serde::{Deserialize, Serialize};

use crate::instance::Instance;

/// A candidate solution: a binary decision vector over the instance items
/// plus objective values cached by the evaluator.
///
/// The cached values are only readable while the candidate is evaluated;
/// any chromosome mutation clears the cache, and reading stale objectives
/// is a programming error that aborts the run. This keeps a candidate's
/// profits consistent with its chromosome at all times.
#[derive(Clone, Debug)]
pub struct Candidate {
  chromosome: Vec<bool>,
  profit1: f64,
  profit2: f64,
  total_weight: f64,
  evaluated: bool,
}

impl Candidate {
  /// Creates an unevaluated candidate with nothing selected.
  pub fn new(len: usize) -> Self {
    Self::from_bits(vec![false; len])
  }

  /// Creates an unevaluated candidate from an explicit decision vector.
  pub fn from_bits(chromosome: Vec<bool>) -> Self {
    Self {
      chromosome,
      profit1: 0.0,
      profit2: 0.0,
      total_weight: 0.0,
      evaluated: false,
    }
  }

  /// Chromosome length, which must match the instance item count.
  pub fn len(&self) -> usize {
    self.chromosome.len()
  }

  /// True if the chromosome has no genes at all.
  pub fn is_empty(&self) -> bool {
    self.chromosome.is_empty()
  }

  /// The raw decision vector.
  pub fn chromosome(&self) -> &[bool] {
    &self.chromosome
  }

  /// Whether item `index` is selected.
  pub fn is_selected(&self, index: usize) -> bool {
    self.chromosome[index]
  }

  /// Indices of all selected items.
  pub fn selected(&self) -> impl Iterator<Item = usize> + '_ {
    self
      .chromosome
      .iter()
      .enumerate()
      .filter_map(|(index, &bit)| bit.then_some(index))
  }

  /// Selects or deselects item `index`, invalidating cached objectives.
  pub fn set(&mut self, index: usize, selected: bool) {
    if self.chromosome[index] != selected {
      self.chromosome[index] = selected;
      self.evaluated = false;
    }
  }

  /// Flips the selection of item `index`, invalidating cached objectives.
  pub fn flip(&mut self, index: usize) {
    self.chromosome[index] = !self.chromosome[index];
    self.evaluated = false;
  }

  /// Whether the cached objective values are current.
  pub fn is_evaluated(&self) -> bool {
    self.evaluated
  }

  /// Stores freshly computed objective values.
  pub(crate) fn cache_objectives(
    &mut self,
    profit1: f64,
    profit2: f64,
    total_weight: f64,
  ) {
    self.profit1 = profit1;
    self.profit2 = profit2;
    self.total_weight = total_weight;
    self.evaluated = true;
  }

  /// First objective value.
  ///
  /// # Panics
  ///
  /// Panics if the candidate is not evaluated.
  pub fn profit1(&self) -> f64 {
    self.assert_evaluated();
    self.profit1
  }

  /// Second objective value.
  ///
  /// # Panics
  ///
  /// Panics if the candidate is not evaluated.
  pub fn profit2(&self) -> f64 {
    self.assert_evaluated();
    self.profit2
  }

  /// Total weight of the selected items.
  ///
  /// # Panics
  ///
  /// Panics if the candidate is not evaluated.
  pub fn total_weight(&self) -> f64 {
    self.assert_evaluated();
    self.total_weight
  }

  /// Scalarized objective sum, the hill-climbing score.
  ///
  /// # Panics
  ///
  /// Panics if the candidate is not evaluated.
  pub fn score(&self) -> f64 {
    self.assert_evaluated();
    self.profit1 + self.profit2
  }

  /// Whether the selection fits both capacity constraints. Feasibility is
  /// derived from the cached weight, never stored.
  ///
  /// # Panics
  ///
  /// Panics if the candidate is not evaluated.
  pub fn is_feasible(&self, instance: &Instance) -> bool {
    self.assert_evaluated();
    self.total_weight <= instance.capacity1()
      && self.total_weight <= instance.capacity2()
  }

  /// The candidate's position in objective space.
  ///
  /// # Panics
  ///
  /// Panics if the candidate is not evaluated.
  pub fn point(&self) -> ParetoPoint {
    self.assert_evaluated();
    ParetoPoint {
      profit1: self.profit1,
      profit2: self.profit2,
    }
  }

  fn assert_evaluated(&self) {
    assert!(
      self.evaluated,
      "objective values read from an unevaluated candidate"
    );
  }
}

/// A point of the objective space: the serializable face of a candidate.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParetoPoint {
  /// First objective value.
  pub profit1: f64,
  /// Second objective value.
  pub profit2: f64,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_mutation_invalidates_cache() {
    let mut candidate = Candidate::new(4);
    candidate.cache_objectives(3.0, 4.0, 5.0);
    assert!(candidate.is_evaluated());
    candidate.flip(1);
    assert!(!candidate.is_evaluated());

    candidate.cache_objectives(3.0, 4.0, 5.0);
    candidate.set(1, true); // already selected, cache stays valid
    assert!(candidate.is_evaluated());
    candidate.set(1, false);
    assert!(!candidate.is_evaluated());
  }

  #[test]
  #[should_panic(expected = "unevaluated candidate")]
  fn test_stale_read_panics() {
    let mut candidate = Candidate::new(2);
    candidate.cache_objectives(1.0, 1.0, 1.0);
    candidate.flip(0);
    candidate.score();
  }

  #[test]
  fn test_selected_indices() {
    let candidate = Candidate::from_bits(vec![true, false, true, false]);
    assert_eq!(candidate.selected().collect::<Vec<_>>(), vec![0, 2]);
  }

  #[test]
  fn test_feasibility_against_both_capacities() {
    let instance = Instance::parse("1 2\n1\n1\n1\n4\n5 3\n").unwrap();
    let mut candidate = Candidate::from_bits(vec![true]);
    candidate.cache_objectives(1.0, 1.0, 4.0);
    // fits capacity1 but not capacity2
    assert!(!candidate.is_feasible(&instance));
    candidate.cache_objectives(1.0, 1.0, 3.0);
    assert!(candidate.is_feasible(&instance));
  }
}
