//! Error types for the cf-app service layer.

/// Application error wrapping the errors of the backend crates.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Project error: {0}")]
    Project(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Scenario compilation failed: {0}")]
    Compile(String),

    #[error("Dynamics error: {0}")]
    Dynamics(String),

    #[error("Simulation error: {0}")]
    Simulation(String),

    #[error("Results error: {0}")]
    Results(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for cf-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<cf_project::ProjectError> for AppError {
    fn from(err: cf_project::ProjectError) -> Self {
        AppError::Project(err.to_string())
    }
}

impl From<cf_project::ValidationError> for AppError {
    fn from(err: cf_project::ValidationError) -> Self {
        AppError::Project(err.to_string())
    }
}

impl From<cf_network::NetworkError> for AppError {
    fn from(err: cf_network::NetworkError) -> Self {
        AppError::Network(err.to_string())
    }
}

impl From<cf_dynamics::DynamicsError> for AppError {
    fn from(err: cf_dynamics::DynamicsError) -> Self {
        AppError::Dynamics(err.to_string())
    }
}

impl From<cf_sim::SimError> for AppError {
    fn from(err: cf_sim::SimError) -> Self {
        AppError::Simulation(err.to_string())
    }
}

impl From<cf_results::ResultsError> for AppError {
    fn from(err: cf_results::ResultsError) -> Self {
        AppError::Results(err.to_string())
    }
}
