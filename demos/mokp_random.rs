use std::{io::Write, path::Path};

use ibmols::{seeded, Instance, Solver, SolverConfig};
use tracing_subscriber::EnvFilter;

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info")
      }),
    )
    .init();

  // a reproducible 250-item knapsack instance
  let instance = Instance::random(250, &mut seeded(42));

  let config = SolverConfig::builder()
    .seed(12345)
    .max_iterations(5_000)
    .population_size(24)
    .build();
  let result = Solver::new(config).run(&instance);

  println!(
    "{} non-dominated solutions after {} evaluations in {:.2?}",
    result.archive.len(),
    result.evaluations,
    result.elapsed
  );

  // write the front to demos/mokp_random.csv
  let _ = std::fs::File::create(
    Path::new(file!()).with_file_name("mokp_random.csv"),
  )
  .unwrap()
  .write_all(
    result
      .front()
      .iter()
      .map(|p| format!("{} {}", p.profit1, p.profit2))
      .collect::<Vec<_>>()
      .join("\n")
      .as_bytes(),
  );

  // and print the first few points
  println!(" profit1  |  profit2");
  for point in result.front().iter().take(10) {
    println!("{:>9.1} | {:>9.1}", point.profit1, point.profit2);
  }
  println!("   ...    |    ...");
}
