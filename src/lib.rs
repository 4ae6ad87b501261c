//! **IBMOLS** is an iterated binary multi-objective local search solver for
//! the two-objective knapsack problem. It maintains a bounded, duplicate-free
//! Pareto archive under continuous insertion pressure and feeds it with a
//! restart-driven bit-flip hill climber.
//!
//! The crate is built from a few small components that mirror the data flow
//! of a run:
//! - An [`Instance`](instance::Instance) is the immutable problem: items
//!   with two profits and a weight, plus two capacities. Instances are
//!   loaded from the classic MOKP text format or generated randomly.
//! - A [`Candidate`](solution::Candidate) is a binary decision vector with
//!   objective values cached by the [`Evaluator`](evaluation::Evaluator);
//!   mutating the vector invalidates the cache, so profits can never go
//!   stale.
//! - The [`Archive`](archive::Archive) holds the feasible, mutually
//!   non-dominated solutions seen so far. Everything the search produces is
//!   [`offer`](archive::Archive::offer)ed to it; it rejects infeasible,
//!   duplicate and dominated candidates, sweeps out members a newcomer
//!   dominates, and truncates by crowding distance when over its bound.
//! - [`LocalSearch`](search::LocalSearch) climbs from a candidate with
//!   best-improvement single-bit flips, escaping flat spots with a bounded
//!   number of random pair flips.
//! - The [`Solver`](solver::Solver) drives the loop: it seeds a mixed
//!   greedy/random population, climbs from each candidate round-robin,
//!   offers every result to the archive, and injects fresh candidates on a
//!   fixed cadence so the search keeps discovering new front regions
//!   instead of saturating a locked population.
//!
//! Runs are deterministic: the solver owns a single seeded
//! [`RandomSource`](random::RandomSource) and threads it through every
//! random decision, so a seed plus a config reproduces an archive exactly.
//!
//! # Example
//!
//! ```
//! use ibmols::{Instance, Solver, SolverConfig};
//!
//! let instance =
//!   Instance::parse("3 2\n3\n10 1 5\n1 10 5\n5 5 5\n10 10\n").unwrap();
//!
//! let config = SolverConfig::builder()
//!   .seed(42)
//!   .max_iterations(1_000)
//!   .population_size(8)
//!   .build();
//! let result = Solver::new(config).run(&instance);
//!
//! // the archive is a valid Pareto front over what the search has seen
//! for point in result.front() {
//!   println!("{} {}", point.profit1, point.profit2);
//! }
//! ```
//!
//! For long runs on large instances, [`Solver::run_multistart`] fans
//! independent seeds out over a thread pool and merges the resulting
//! archives into one front with the same invariants.
//!
//! [`Solver::run_multistart`]: solver::Solver::run_multistart

#![warn(missing_docs)]

pub mod archive;
pub mod evaluation;
pub mod instance;
pub mod random;
pub mod search;
pub mod solution;
pub mod solver;

pub use crate::{
  archive::{dominates, Archive, InsertResult, OBJECTIVE_TOLERANCE},
  evaluation::{mokp_evaluator, Evaluator, MokpObjectives, Objectives},
  instance::{Instance, InstanceError, Item},
  random::{seeded, RandomSource},
  search::LocalSearch,
  solution::{Candidate, ParetoPoint},
  solver::{RunResult, RunSummary, Solver, SolverConfig},
};
