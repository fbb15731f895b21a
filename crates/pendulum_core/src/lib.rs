pub mod adaptive;
pub mod error;
pub mod fractal;
pub mod output;
pub mod parallel;
pub mod pendulum;
pub mod solvers;
pub mod state;
/// The `pendulum_core` crate computes flip-time fractals of double pendulums.
///
/// For every pair of initial rod angles it counts how many integration steps
/// elapse before one of the rods flips over the upward vertical, and samples
/// that scalar field over a 2D domain.
///
/// Key components:
/// - **Traits**: `DynamicalSystem` (vector fields), `Steppable` (solvers), `DomainFunction` (sampled f(x, y)).
/// - **Models**: simple and compound double pendulums sharing the `DoublePendulum` trait.
/// - **Fractal**: flip detection and the steps-to-flip evaluator.
/// - **Samplers**: a uniform grid and an adaptive grid that refines the most variable regions first,
///   both evaluated on a `WorkerPool`.
/// - **Output**: the `#key=value` text format consumed by rendering tools.
pub mod traits;
pub mod trajectory;
pub mod uniform;
