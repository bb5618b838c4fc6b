//! # Attractors
//!
//! Attractors integrates the classic chaotic strange attractors (Lorenz, Rössler, Chen, ...) and renders their
//! trajectories as interactive 3D figures.
//!
//! ## Integrating a catalog attractor
//!
//! The nine shipped systems are listed by [Attractor]. Each is identified by a registry name
//! ([Attractor::name]) and takes a fixed set of coefficients, held in a per-system record of the [Parameters] union.
//! Use [vector_field] to resolve a name and a string-keyed [ParameterMap], or [Parameters::preset] for a
//! known chaotic parameter set.
//!
//! An [Integrator] (configured with [Integrator::builder]) samples the solution on the evenly spaced
//! [TimeGrid] of a [Window], by default 10,000 points over `t = 0..=100`. [Integrator::integrate] takes a registry name,
//! [Integrator::integrate_attractor] a typed [Parameters], and [SolveIvp::solve_ivp] any [VectorField] on any grid.
//! The result is a [Trajectory], whose first state is the initial state.
//!
//! When the solver can no longer meet its error tolerances the trajectory has blown up. The [DivergencePolicy] decides
//! whether this is an [AttractorError::IntegrationDivergence] or a truncated trajectory marked [Completion::Partial].
//!
//! ## The solvers
//!
//! Two adaptive solvers are provided, selected with [Method]:
//! - A variable order Backwards Difference Formulae [Bdf] solver with a Newton iteration, the default.
//! - An explicit Runge-Kutta solver [ExplicitRk] using the Tsitouras 5(4) [Tableau::tsit45].
//!
//! They can also be used directly. Create an [OdeSolverProblem] with [OdeBuilder], then a solver with
//! [OdeSolverProblem::bdf] or [OdeSolverProblem::tsit45]. See the [OdeSolverMethod] trait for stepping
//! ([OdeSolverMethod::step]), stopping at a time ([OdeSolverMethod::set_stop_time]), interpolating within the last
//! step ([OdeSolverMethod::interpolate]) and the convenience functions [OdeSolverMethod::solve] and [OdeSolverMethod::solve_dense].
//!
//! ## Rendering
//!
//! [render()] turns a [Trajectory] into a `plotly` figure colored by `z` using one of the [Colormap]s, and optionally
//! writes it to `<output_dir>/<slug(title)>_3d_animation.html`.
//!
//! ## Logging
//!
//! The [Integrator] and [render_with_logger] log through a `slog` [slog::Logger], discarding everything unless
//! one is given with [IntegratorBuilder::logger].

pub mod catalog;
pub mod error;
pub mod integrator;
pub mod linear_solver;
pub mod nonlinear_solver;
pub mod ode_solver;
pub mod op;
pub mod render;
pub mod trajectory;
pub mod vector;

pub use catalog::{
    vector_field, Attractor, CatalogEntry, ChenParams, DadrasParams, FourWingParams,
    HalvorsenParams, Lorenz83Params, LorenzParams, ParameterMap, Parameters,
    RabinovichFabrikantParams, RosslerParams, SprottParams, CATALOG,
};
pub use error::{
    AttractorError, LinearSolverError, NonLinearSolverError, OdeSolverError, RenderError,
};
pub use integrator::{
    DivergencePolicy, Integrator, IntegratorBuilder, Method, SolveIvp, TimeGrid, Window,
};
pub use linear_solver::LU;
pub use nonlinear_solver::{
    convergence::{Convergence, ConvergenceStatus},
    newton::NewtonNonlinearSolver,
    NonLinearSolver,
};
pub use ode_solver::state::{StateRef, StateRefMut};
pub use ode_solver::{
    bdf::Bdf,
    bdf_state::BdfState,
    builder::OdeBuilder,
    config::{BdfConfig, ExplicitRkConfig, OdeSolverConfig},
    explicit_rk::ExplicitRk,
    method::{OdeSolverMethod, OdeSolverStopReason, SolverStatistics},
    problem::OdeSolverProblem,
    rk_state::RkState,
    state::OdeSolverState,
    tableau::Tableau,
};
pub use op::{closure::Closure, closure_no_jac::ClosureNoJac, OpStatistics, VectorField};
pub use render::{figure, render, render_with_logger, slug, Colormap, FigureOptions, Rendered};
pub use trajectory::{Completion, Trajectory};
pub use vector::{Jacobian, State, VectorNorm};
