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

  let instance = Instance::random(250, &mut seeded(42));

  let config = SolverConfig::builder()
    .seed(1)
    .max_iterations(2_000)
    .build();
  let solver = Solver::new(config);

  // independent trajectories per worker, merged into one front
  let result = solver.run_multistart(&instance, 4);

  let summary = result.summary();
  println!(
    "{}",
    serde_json::to_string_pretty(&summary).expect("summary serializes")
  );
}
