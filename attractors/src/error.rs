use thiserror::Error;

/// Custom error type for this crate
///
/// This error type is used to wrap all possible errors that can occur when resolving, integrating or rendering an attractor
#[derive(Error, Debug)]
pub enum AttractorError {
    #[error("Unknown attractor: {name}")]
    UnknownAttractor { name: String },
    #[error("Attractor {attractor} is missing required parameter {key}")]
    MissingParameter {
        attractor: &'static str,
        key: &'static str,
    },
    #[error("Integration diverged at time = {time}")]
    IntegrationDivergence { time: f64 },
    #[error("Invalid time grid: {0}")]
    InvalidTimeGrid(String),
    #[error("Linear solver error: {0}")]
    LinearSolverError(#[from] LinearSolverError),
    #[error("Non-linear solver error: {0}")]
    NonLinearSolverError(#[from] NonLinearSolverError),
    #[error("ODE solver error: {0}")]
    OdeSolverError(#[from] OdeSolverError),
    #[error("Render error: {0}")]
    RenderError(#[from] RenderError),
}

impl AttractorError {
    /// The time at which the solver gave up, if this error means the trajectory blew up.
    pub fn divergence_time(&self) -> Option<f64> {
        match self {
            AttractorError::IntegrationDivergence { time } => Some(*time),
            AttractorError::OdeSolverError(OdeSolverError::StepSizeTooSmall { time })
            | AttractorError::OdeSolverError(OdeSolverError::TooManyErrorTestFailures { time })
            | AttractorError::OdeSolverError(OdeSolverError::NonFiniteState { time }) => {
                Some(*time)
            }
            _ => None,
        }
    }
}

/// Possible errors that can occur when solving a linear problem
#[derive(Error, Debug)]
pub enum LinearSolverError {
    #[error("LU not initialized")]
    LuNotInitialized,
    #[error("LU solve failed, matrix is singular")]
    SingularMatrix,
}

/// Possible errors that can occur when solving a non-linear problem
#[derive(Error, Debug)]
pub enum NonLinearSolverError {
    #[error("Newton iterations did not converge")]
    NewtonDidNotConverge,
    #[error("Jacobian not reset before calling solve")]
    JacobianNotReset,
}

/// Possible errors that can occur when solving an ODE
#[derive(Debug, Error)]
pub enum OdeSolverError {
    #[error(
        "Stop time = {} is less than current state time = {}",
        stop_time,
        state_time
    )]
    StopTimeBeforeCurrentTime { stop_time: f64, state_time: f64 },
    #[error("Stop time is at the current state time")]
    StopTimeAtCurrentTime,
    #[error("Interpolation time is not within the current step")]
    InterpolationTimeOutsideCurrentStep,
    #[error("Exceeded maximum number of error test failures at time = {time}")]
    TooManyErrorTestFailures { time: f64 },
    #[error("Step size is too small at time = {time}")]
    StepSizeTooSmall { time: f64 },
    #[error("State is not finite at time = {time}")]
    NonFiniteState { time: f64 },
    #[error("t_eval must be increasing and all values must be greater than or equal to the current time")]
    InvalidTEval,
    #[error("Builder error: {0}")]
    BuilderError(String),
}

/// Possible errors when turning a trajectory into a figure
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Invalid colormap: {0}")]
    InvalidColormap(String),
    #[error("Failed to write figure: {0}")]
    Io(#[from] std::io::Error),
}

#[macro_export]
macro_rules! linear_solver_error {
    ($variant:ident) => {
        AttractorError::from(LinearSolverError::$variant)
    };
}

#[macro_export]
macro_rules! non_linear_solver_error {
    ($variant:ident) => {
        AttractorError::from(NonLinearSolverError::$variant)
    };
}

#[macro_export]
macro_rules! ode_solver_error {
    ($variant:ident) => {
        AttractorError::from(OdeSolverError::$variant)
    };
    ($variant:ident, $($arg:tt)*) => {
        AttractorError::from(OdeSolverError::$variant($($arg)*.to_string()))
    };
}

#[macro_export]
macro_rules! render_error {
    ($variant:ident, $($arg:tt)*) => {
        AttractorError::from(RenderError::$variant($($arg)*.to_string()))
    };
}
