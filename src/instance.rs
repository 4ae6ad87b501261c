//! Knapsack problem instances and their on-disk text format.
//!
//! An [`Instance`] is the immutable description of a two-objective knapsack
//! problem: a sequence of items, each carrying two profit values and a
//! weight, plus two capacity constraints. Instances are constructed once -
//! loaded from a file, parsed from text or generated randomly - and shared
//! read-only with the rest of the crate for the duration of a run.
//!
//! The text format is the classic MOKP layout:
//! ```text
//! line 1: <n_items> <n_objectives>
//! line 2: <n_items>                      (redundant, ignored)
//! line 3: <n_items profit1 values>
//! line 4: <n_items profit2 values>
//! line 5: <n_items weight values>
//! line 6: <capacity1> <capacity2>
//! ```
//! A missing second capacity mirrors the first one.

use std::{fs, io, io::Write, path::Path};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::random::RandomSource;

/// Errors produced while loading or constructing an instance.
///
/// All of them are fatal: a rejected instance never reaches the solver and
/// there is nothing to retry.
#[derive(Debug, Error)]
pub enum InstanceError {
  /// The instance file could not be read.
  #[error("failed to read instance file: {0}")]
  Io(#[from] io::Error),
  /// The file structure does not match the MOKP text format.
  #[error("malformed instance: {0}")]
  Malformed(String),
}

fn malformed(message: impl Into<String>) -> InstanceError {
  InstanceError::Malformed(message.into())
}

/// A single knapsack item. Created at instance load, never mutated.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
  /// Profit contributed to the first objective when the item is selected.
  pub profit1: f64,
  /// Profit contributed to the second objective when the item is selected.
  pub profit2: f64,
  /// Weight counted against both capacity constraints.
  pub weight: f64,
  /// Position of the item in the original instance.
  pub index: usize,
}

/// An immutable two-objective knapsack instance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Instance {
  items: Vec<Item>,
  capacity1: f64,
  capacity2: f64,
}

impl Instance {
  /// Creates an instance from raw item data and capacities.
  ///
  /// Returns an error if `items` is empty, any profit or weight is negative
  /// or non-finite, or either capacity is not strictly positive.
  pub fn new(
    items: Vec<Item>,
    capacity1: f64,
    capacity2: f64,
  ) -> Result<Self, InstanceError> {
    if items.is_empty() {
      return Err(malformed("instance has no items"));
    }
    if !(capacity1 > 0.0 && capacity2 > 0.0) {
      return Err(malformed(format!(
        "capacities must be positive, got {capacity1} and {capacity2}"
      )));
    }
    for item in &items {
      let fields = [item.profit1, item.profit2, item.weight];
      if fields.iter().any(|v| !v.is_finite() || *v < 0.0) {
        return Err(malformed(format!(
          "item {} has a negative or non-finite field",
          item.index
        )));
      }
    }
    Ok(Self {
      items,
      capacity1,
      capacity2,
    })
  }

  /// Loads an instance from a file in the MOKP text format.
  pub fn load(path: impl AsRef<Path>) -> Result<Self, InstanceError> {
    Self::parse(&fs::read_to_string(path)?)
  }

  /// Parses an instance from text in the MOKP format.
  pub fn parse(text: &str) -> Result<Self, InstanceError> {
    let mut lines = text.lines().filter(|line| !line.trim().is_empty());
    let mut header = lines
      .next()
      .ok_or_else(|| malformed("missing header line"))?
      .split_whitespace();
    let n_items: usize = header
      .next()
      .ok_or_else(|| malformed("missing item count"))?
      .parse()
      .map_err(|_| malformed("item count is not an integer"))?;
    let n_objectives: usize = header
      .next()
      .ok_or_else(|| malformed("missing objective count"))?
      .parse()
      .map_err(|_| malformed("objective count is not an integer"))?;
    if n_objectives != 2 {
      return Err(malformed(format!(
        "expected 2 objectives, got {n_objectives}"
      )));
    }
    // Second line repeats the item count and is ignored.
    lines
      .next()
      .ok_or_else(|| malformed("missing item count line"))?;

    let profits1 = parse_values(lines.next(), n_items, "profit1")?;
    let profits2 = parse_values(lines.next(), n_items, "profit2")?;
    let weights = parse_values(lines.next(), n_items, "weight")?;

    let mut capacities = lines
      .next()
      .ok_or_else(|| malformed("missing capacity line"))?
      .split_whitespace();
    let capacity1: f64 = capacities
      .next()
      .ok_or_else(|| malformed("missing capacity value"))?
      .parse()
      .map_err(|_| malformed("capacity1 is not a number"))?;
    let capacity2 = match capacities.next() {
      Some(field) => field
        .parse()
        .map_err(|_| malformed("capacity2 is not a number"))?,
      None => capacity1,
    };

    let items = (0..n_items)
      .map(|index| Item {
        profit1: profits1[index],
        profit2: profits2[index],
        weight: weights[index],
        index,
      })
      .collect();
    Self::new(items, capacity1, capacity2)
  }

  /// Writes the instance in the MOKP text format.
  pub fn write_to(&self, writer: &mut impl Write) -> io::Result<()> {
    writeln!(writer, "{} 2", self.items.len())?;
    writeln!(writer, "{}", self.items.len())?;
    writeln!(writer, "{}", self.items.iter().map(|i| i.profit1).join(" "))?;
    writeln!(writer, "{}", self.items.iter().map(|i| i.profit2).join(" "))?;
    writeln!(writer, "{}", self.items.iter().map(|i| i.weight).join(" "))?;
    writeln!(writer, "{} {}", self.capacity1, self.capacity2)
  }

  /// Generates a random instance of `n` items: profits uniform in
  /// [10, 100], weights uniform in [5, 50], both capacities set to 40% of
  /// the total weight.
  ///
  /// # Panics
  ///
  /// Panics if `n` is zero.
  pub fn random(n: usize, rng: &mut impl RandomSource) -> Self {
    assert!(n > 0, "cannot generate an empty instance");
    let mut uniform = |low: u32, high: u32| {
      f64::from(low + rng.next_in_range(high - low + 1))
    };
    let items: Vec<Item> = (0..n)
      .map(|index| Item {
        profit1: uniform(10, 100),
        profit2: uniform(10, 100),
        weight: uniform(5, 50),
        index,
      })
      .collect();
    let capacity = items.iter().map(|i| i.weight).sum::<f64>() * 0.4;
    Self::new(items, capacity, capacity)
      .expect("generated items are positive and non-empty")
  }

  /// The items of this instance, in original order.
  pub fn items(&self) -> &[Item] {
    &self.items
  }

  /// The item at position `index`.
  pub fn item(&self, index: usize) -> &Item {
    &self.items[index]
  }

  /// Number of items.
  pub fn len(&self) -> usize {
    self.items.len()
  }

  /// Always false: construction rejects empty instances.
  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  /// First capacity constraint.
  pub fn capacity1(&self) -> f64 {
    self.capacity1
  }

  /// Second capacity constraint.
  pub fn capacity2(&self) -> f64 {
    self.capacity2
  }
}

fn parse_values(
  line: Option<&str>,
  n: usize,
  what: &str,
) -> Result<Vec<f64>, InstanceError> {
  let values: Vec<f64> = line
    .ok_or_else(|| malformed(format!("missing {what} line")))?
    .split_whitespace()
    .map(|field| field.parse::<f64>())
    .try_collect()
    .map_err(|_| malformed(format!("{what} line contains a non-number")))?;
  if values.len() < n {
    return Err(malformed(format!(
      "expected {n} {what} values, got {}",
      values.len()
    )));
  }
  Ok(values[..n].to_vec())
}
