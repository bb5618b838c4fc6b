use super::OdeSolverSolution;
use crate::{Closure, Jacobian, OdeBuilder, OdeSolverProblem, State, VectorField};

// exponential decay problem
// dy/dt = -ay
// J = -aI
pub fn exponential_decay(a: f64) -> impl VectorField {
    Closure::new(
        move |x: &State, _t: f64, y: &mut State| *y = x * -a,
        move |_x: &State, _t: f64, j: &mut Jacobian| *j = Jacobian::identity() * -a,
    )
}

pub fn exponential_decay_problem(
    a: f64,
) -> (OdeSolverProblem<impl VectorField>, OdeSolverSolution) {
    let y0 = State::new(1.0, 2.0, 3.0);
    let problem = OdeBuilder::new()
        .rtol(1e-6)
        .atol([1e-6])
        .init(y0)
        .build(exponential_decay(a))
        .unwrap();
    let mut soln = OdeSolverSolution {
        rtol: problem.rtol,
        atol: problem.atol,
        ..Default::default()
    };
    for i in 0..10 {
        let t = f64::from(i);
        soln.push(y0 * (-a * t).exp(), t);
    }
    (problem, soln)
}
