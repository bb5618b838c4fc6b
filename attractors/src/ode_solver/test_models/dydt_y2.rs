use crate::{Closure, Jacobian, State, VectorField};

// dy/dt = y^2, componentwise
// y(t) = y0 / (1 - y0 t), which blows up at t = 1 / y0
pub fn dydt_y2() -> impl VectorField {
    Closure::new(
        |x: &State, _t: f64, y: &mut State| *y = x.component_mul(x),
        |x: &State, _t: f64, j: &mut Jacobian| *j = Jacobian::from_diagonal(&(x * 2.0)),
    )
}
