use thiserror::Error;

/// Every failure the core can report. All of them are fatal for the run that
/// produced them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HenonError {
    #[error("Initial energy {energy} is too small for the fixed starting position (radicand = {radicand}).")]
    InvalidInitialCondition { energy: f64, radicand: f64 },

    #[error("Invalid step plan: {0}")]
    InvalidStepPlan(String),

    #[error("Linear system is singular at micro-step {step}.")]
    SingularSystem { step: usize },

    #[error("{method} produced a non-finite state at micro-step {step}.")]
    NonFiniteState { method: &'static str, step: usize },

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Inconsistent Hamiltonian table: {0}")]
    InconsistentTable(String),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(String),
}

pub type Result<T> = std::result::Result<T, HenonError>;
