pub mod compute;
pub mod error;
pub mod hamiltonian;
pub mod plan;
pub mod poincare;
pub mod solvers;
pub mod system;
/// The `henon_core` crate integrates the Hénon-Heiles system with four fixed-step
/// schemes and derives energy and Poincaré-section diagnostics from the results.
///
/// Key components:
/// - **Plan**: `StepPlan` turns `(t0, t_end, h, stride)` into step counts and the final partial step.
/// - **Traits**: `DynamicalSystem`, `HamiltonianSystem` and `Steppable` (solvers).
/// - **Solvers**: RK4, three-stage RK3, Kahan's linearly implicit method and Störmer-Verlet.
/// - **Trajectory**: `Method` dispatch and the shared integration driver.
/// - **Diagnostics**: Hamiltonian series and Poincaré sections.
/// - **Compute**: the two-phase parallel fan-out over all four methods.
pub mod traits;
pub mod trajectory;

pub use error::{HenonError, Result};
pub use traits::State;
