//! Pareto dominance and the bounded non-dominated archive.
//!
//! The archive is the product of a run: every candidate the search produces
//! is offered to it, and it keeps exactly the feasible, mutually
//! non-dominated, duplicate-free subset seen so far. The non-domination
//! invariant holds after every mutation, not just at the end of a run.

use std::collections::HashSet;

use itertools::Itertools;

use crate::{instance::Instance, solution::Candidate};

/// Absolute tolerance under which two objective pairs count as the same
/// point. Duplicate detection quantizes objectives into buckets of this
/// width.
pub const OBJECTIVE_TOLERANCE: f64 = 1e-3;

/// Pareto dominance: `a` dominates `b` iff `a` is at least as good in both
/// objectives and strictly better in one.
///
/// Both candidates must be evaluated and feasible; dominance between
/// infeasible candidates is undefined and never queried by this crate.
///
/// # Panics
///
/// Panics if either candidate is unevaluated.
pub fn dominates(a: &Candidate, b: &Candidate) -> bool {
  a.profit1() >= b.profit1()
    && a.profit2() >= b.profit2()
    && (a.profit1() > b.profit1() || a.profit2() > b.profit2())
}

/// Outcome of offering a candidate to the archive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertResult {
  /// The candidate joined the archive; members it dominated were removed.
  Inserted,
  /// The candidate violates a capacity constraint. Not an error: infeasible
  /// candidates are a normal local-search byproduct.
  RejectedInfeasible,
  /// A member with the same objective values (within
  /// [`OBJECTIVE_TOLERANCE`]) already exists.
  RejectedDuplicate,
  /// An existing member dominates the candidate.
  RejectedDominated,
}

fn signature(profit1: f64, profit2: f64) -> (i64, i64) {
  (
    (profit1 / OBJECTIVE_TOLERANCE).round() as i64,
    (profit2 / OBJECTIVE_TOLERANCE).round() as i64,
  )
}

/// A bounded, duplicate-free archive of non-dominated candidates.
///
/// Members are deep copies: the archive never aliases a candidate owned by
/// the live population. When the size bound is exceeded, the member with
/// the smallest crowding distance is discarded, recomputing distances
/// after each removal, so boundary solutions and sparse regions of the
/// front survive truncation. Truncation by insertion order destroys front
/// diversity and is deliberately not implemented.
#[derive(Clone, Debug)]
pub struct Archive {
  members: Vec<Candidate>,
  signatures: HashSet<(i64, i64)>,
  bound: usize,
}

impl Archive {
  /// Creates an empty archive holding at most `bound` members.
  ///
  /// The bound should be generous relative to the expected front size
  /// (thousands for typical knapsack instances): premature truncation is
  /// the dominant failure mode to avoid.
  ///
  /// # Panics
  ///
  /// Panics if `bound` is zero.
  pub fn new(bound: usize) -> Self {
    assert!(bound > 0, "archive bound must be positive");
    Self {
      members: Vec::new(),
      signatures: HashSet::new(),
      bound,
    }
  }

  /// Offers a candidate for insertion.
  ///
  /// The candidate is screened in order: feasibility, duplicate objective
  /// values, dominance by an existing member. If it passes, every member
  /// it dominates is removed, a deep copy is inserted, and the size bound
  /// is re-established. Never fails for a well-formed feasible candidate.
  ///
  /// # Panics
  ///
  /// Panics if the candidate is unevaluated or its chromosome length does
  /// not match the instance.
  pub fn offer(
    &mut self,
    candidate: &Candidate,
    instance: &Instance,
  ) -> InsertResult {
    assert_eq!(
      candidate.len(),
      instance.len(),
      "chromosome length does not match instance item count"
    );
    if !candidate.is_feasible(instance) {
      return InsertResult::RejectedInfeasible;
    }
    let signature = signature(candidate.profit1(), candidate.profit2());
    if self.signatures.contains(&signature) {
      return InsertResult::RejectedDuplicate;
    }
    if self.members.iter().any(|member| dominates(member, candidate)) {
      return InsertResult::RejectedDominated;
    }

    let mut index = 0;
    while index < self.members.len() {
      if dominates(candidate, &self.members[index]) {
        self.remove(index);
      } else {
        index += 1;
      }
    }
    self.members.push(candidate.clone());
    self.signatures.insert(signature);

    while self.members.len() > self.bound {
      self.discard_most_crowded();
    }
    InsertResult::Inserted
  }

  /// Re-validates the non-domination invariant in full, removing any
  /// member dominated by another. Returns the number of removals - zero
  /// under a correct [`offer`](Self::offer), so this is a periodic
  /// self-heal against accumulated floating-point drift, not a routine
  /// maintenance step.
  pub fn prune(&mut self) -> usize {
    let n = self.members.len();
    let mut dominated = vec![false; n];
    for (i, j) in (0..n).tuple_combinations() {
      if dominates(&self.members[i], &self.members[j]) {
        dominated[j] = true;
      } else if dominates(&self.members[j], &self.members[i]) {
        dominated[i] = true;
      }
    }
    let mut removed = 0;
    for index in (0..n).rev() {
      if dominated[index] {
        self.remove(index);
        removed += 1;
      }
    }
    removed
  }

  /// Crowding distance of each member in objective space. Boundary members
  /// of each objective get `f64::INFINITY`.
  pub fn crowding_distances(&self) -> Vec<f64> {
    let n = self.members.len();
    if n <= 2 {
      return vec![f64::INFINITY; n];
    }
    let mut distances = vec![0.0; n];
    for objective in 0..2 {
      let value = |index: usize| {
        let member = &self.members[index];
        match objective {
          0 => member.profit1(),
          _ => member.profit2(),
        }
      };
      let order: Vec<usize> =
        (0..n).sorted_by(|&a, &b| value(a).total_cmp(&value(b))).collect();
      distances[order[0]] = f64::INFINITY;
      distances[order[n - 1]] = f64::INFINITY;
      let span = value(order[n - 1]) - value(order[0]);
      if span <= 0.0 {
        continue;
      }
      for window in 1..n - 1 {
        let index = order[window];
        if distances[index].is_finite() {
          distances[index] +=
            (value(order[window + 1]) - value(order[window - 1])) / span;
        }
      }
    }
    distances
  }

  /// Drops the member contributing least to front diversity.
  fn discard_most_crowded(&mut self) {
    let distances = self.crowding_distances();
    let victim = distances
      .iter()
      .enumerate()
      .min_by(|a, b| a.1.total_cmp(b.1))
      .map(|(index, _)| index)
      .expect("archive exceeds its bound, so it is not empty");
    self.remove(victim);
  }

  fn remove(&mut self, index: usize) {
    let removed = self.members.swap_remove(index);
    self.signatures.remove(&signature(removed.profit1(), removed.profit2()));
  }

  /// Current members, in no particular order.
  pub fn members(&self) -> &[Candidate] {
    &self.members
  }

  /// Number of members.
  pub fn len(&self) -> usize {
    self.members.len()
  }

  /// True if the archive holds no members.
  pub fn is_empty(&self) -> bool {
    self.members.is_empty()
  }

  /// The configured size bound.
  pub fn bound(&self) -> usize {
    self.bound
  }

  /// Consumes the archive, returning its members.
  pub fn into_members(self) -> Vec<Candidate> {
    self.members
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::evaluation::mokp_evaluator;

  /// Instance whose items all weigh nothing, so any subset is feasible and
  /// selecting item `i` alone realizes that item's profit pair exactly.
  fn point_instance(points: &[(f64, f64)]) -> Instance {
    let items = points
      .iter()
      .enumerate()
      .map(|(index, &(profit1, profit2))| crate::instance::Item {
        profit1,
        profit2,
        weight: 0.0,
        index,
      })
      .collect();
    Instance::new(items, 1.0, 1.0).unwrap()
  }

  fn single(instance: &Instance, index: usize) -> Candidate {
    let mut bits = vec![false; instance.len()];
    bits[index] = true;
    let mut candidate = Candidate::from_bits(bits);
    mokp_evaluator(instance).evaluate(&mut candidate);
    candidate
  }

  fn assert_non_dominated(archive: &Archive) {
    for (a, b) in archive.members().iter().tuple_combinations() {
      assert!(!dominates(a, b) && !dominates(b, a));
    }
  }

  #[test]
  fn test_dominance_laws() {
    let instance = point_instance(&[(3.0, 3.0), (2.0, 3.0), (3.0, 2.0)]);
    let a = single(&instance, 0);
    let b = single(&instance, 1);
    let c = single(&instance, 2);
    // irreflexivity
    assert!(!dominates(&a, &a));
    // strict improvement in one objective suffices
    assert!(dominates(&a, &b) && dominates(&a, &c));
    // asymmetry
    assert!(!dominates(&b, &a) && !dominates(&c, &a));
    // incomparable pair
    assert!(!dominates(&b, &c) && !dominates(&c, &b));
  }

  #[test]
  fn test_offer_keeps_non_dominated_set() {
    let instance =
      point_instance(&[(1.0, 9.0), (5.0, 5.0), (9.0, 1.0), (4.0, 4.0)]);
    let mut archive = Archive::new(100);
    for index in 0..3 {
      assert_eq!(
        archive.offer(&single(&instance, index), &instance),
        InsertResult::Inserted
      );
    }
    // (4, 4) is dominated by (5, 5)
    assert_eq!(
      archive.offer(&single(&instance, 3), &instance),
      InsertResult::RejectedDominated
    );
    assert_eq!(archive.len(), 3);
    assert_non_dominated(&archive);
  }

  #[test]
  fn test_offer_sweeps_dominated_members() {
    let instance =
      point_instance(&[(2.0, 2.0), (3.0, 1.0), (1.0, 3.0), (4.0, 4.0)]);
    let mut archive = Archive::new(100);
    for index in 0..3 {
      archive.offer(&single(&instance, index), &instance);
    }
    assert_eq!(archive.len(), 3);
    // (4, 4) dominates all three at once
    assert_eq!(
      archive.offer(&single(&instance, 3), &instance),
      InsertResult::Inserted
    );
    assert_eq!(archive.len(), 1);
    assert_eq!(archive.members()[0].profit1(), 4.0);
  }

  #[test]
  fn test_infeasible_never_changes_archive() {
    let instance = Instance::parse("2 2\n2\n5 5\n5 5\n8 8\n10 10\n").unwrap();
    let evaluator = mokp_evaluator(&instance);
    let mut archive = Archive::new(100);

    let mut heavy = Candidate::from_bits(vec![true, true]);
    evaluator.evaluate(&mut heavy);
    assert_eq!(
      archive.offer(&heavy, &instance),
      InsertResult::RejectedInfeasible
    );
    assert!(archive.is_empty());
  }

  #[test]
  fn test_duplicate_objectives_rejected() {
    // two distinct chromosomes with identical objective values
    let instance = point_instance(&[(5.0, 5.0), (5.0, 5.0)]);
    let mut archive = Archive::new(100);
    assert_eq!(
      archive.offer(&single(&instance, 0), &instance),
      InsertResult::Inserted
    );
    assert_eq!(
      archive.offer(&single(&instance, 1), &instance),
      InsertResult::RejectedDuplicate
    );
    assert_eq!(archive.len(), 1);
  }

  #[test]
  fn test_near_equal_objectives_rejected_within_tolerance() {
    let instance = point_instance(&[(5.0, 5.0), (5.0 + 2e-4, 5.0 - 2e-4)]);
    let mut archive = Archive::new(100);
    archive.offer(&single(&instance, 0), &instance);
    assert_eq!(
      archive.offer(&single(&instance, 1), &instance),
      InsertResult::RejectedDuplicate
    );
  }

  #[test]
  fn test_truncation_preserves_extremes() {
    let n = 9;
    let points: Vec<(f64, f64)> =
      (0..n).map(|i| (i as f64, (n - 1 - i) as f64)).collect();
    let instance = point_instance(&points);
    let mut archive = Archive::new(4);
    for index in 0..n {
      archive.offer(&single(&instance, index), &instance);
    }
    assert_eq!(archive.len(), 4);
    assert_non_dominated(&archive);
    let profits: Vec<f64> =
      archive.members().iter().map(|m| m.profit1()).collect();
    // boundary members of the front survive crowding truncation
    assert!(profits.contains(&0.0));
    assert!(profits.contains(&(n as f64 - 1.0)));
  }

  #[test]
  fn test_prune_is_noop_after_offers() {
    let points: Vec<(f64, f64)> =
      (0..20).map(|i| (i as f64, 20.0 - i as f64)).collect();
    let instance = point_instance(&points);
    let mut archive = Archive::new(100);
    for index in 0..20 {
      archive.offer(&single(&instance, index), &instance);
    }
    assert_eq!(archive.prune(), 0);
    assert_non_dominated(&archive);
  }

  #[test]
  #[should_panic(expected = "chromosome length")]
  fn test_wrong_length_is_fatal() {
    let instance = point_instance(&[(1.0, 1.0)]);
    let mut archive = Archive::new(10);
    let mut candidate = Candidate::new(3);
    candidate.cache_objectives(0.0, 0.0, 0.0);
    archive.offer(&candidate, &instance);
  }
}
