//! Right-hand sides of the catalog systems together with their analytic Jacobians.

use crate::{
    ChenParams, DadrasParams, FourWingParams, HalvorsenParams, Jacobian, Lorenz83Params,
    LorenzParams, Parameters, RabinovichFabrikantParams, RosslerParams, SprottParams, State,
    VectorField,
};

// dx/dt = -a x - 4y - 4z - y^2
// dy/dt = -a y - 4z - 4x - z^2
// dz/dt = -a z - 4x - 4y - x^2
impl VectorField for HalvorsenParams {
    fn call_inplace(&self, s: &State, _t: f64, ds: &mut State) {
        let (x, y, z, a) = (s[0], s[1], s[2], self.alpha);
        ds[0] = -(a * x) - 4.0 * y - 4.0 * z - y * y;
        ds[1] = -(a * y) - 4.0 * z - 4.0 * x - z * z;
        ds[2] = -(a * z) - 4.0 * x - 4.0 * y - x * x;
    }
    #[rustfmt::skip]
    fn jacobian_inplace(&self, s: &State, _t: f64, j: &mut Jacobian) {
        let (x, y, z, a) = (s[0], s[1], s[2], self.alpha);
        *j = Jacobian::new(
            -a, -4.0 - 2.0 * y, -4.0,
            -4.0, -a, -4.0 - 2.0 * z,
            -4.0 - 2.0 * x, -4.0, -a,
        );
    }
}

// dx/dt = sigma (y - x)
// dy/dt = x (rho - z) - y
// dz/dt = x y - beta z
impl VectorField for LorenzParams {
    fn call_inplace(&self, s: &State, _t: f64, ds: &mut State) {
        let (x, y, z) = (s[0], s[1], s[2]);
        ds[0] = self.sigma * (y - x);
        ds[1] = x * (self.rho - z) - y;
        ds[2] = x * y - self.beta * z;
    }
    #[rustfmt::skip]
    fn jacobian_inplace(&self, s: &State, _t: f64, j: &mut Jacobian) {
        let (x, y, z) = (s[0], s[1], s[2]);
        *j = Jacobian::new(
            -self.sigma, self.sigma, 0.0,
            self.rho - z, -1.0, -x,
            y, x, -self.beta,
        );
    }
}

// dx/dt = y - a x + b y z
// dy/dt = c y - x z + z
// dz/dt = d x y - e z
impl VectorField for DadrasParams {
    fn call_inplace(&self, s: &State, _t: f64, ds: &mut State) {
        let (x, y, z) = (s[0], s[1], s[2]);
        ds[0] = y - self.a * x + self.b * y * z;
        ds[1] = self.c * y - x * z + z;
        ds[2] = self.d * x * y - self.e * z;
    }
    #[rustfmt::skip]
    fn jacobian_inplace(&self, s: &State, _t: f64, j: &mut Jacobian) {
        let (x, y, z) = (s[0], s[1], s[2]);
        *j = Jacobian::new(
            -self.a, 1.0 + self.b * z, self.b * y,
            -z, self.c, 1.0 - x,
            self.d * y, self.d * x, -self.e,
        );
    }
}

// dx/dt = alpha x - y z
// dy/dt = beta y + x z
// dz/dt = delta z + x y / 3
impl VectorField for ChenParams {
    fn call_inplace(&self, s: &State, _t: f64, ds: &mut State) {
        let (x, y, z) = (s[0], s[1], s[2]);
        ds[0] = self.alpha * x - y * z;
        ds[1] = self.beta * y + x * z;
        ds[2] = self.delta * z + x * y / 3.0;
    }
    #[rustfmt::skip]
    fn jacobian_inplace(&self, s: &State, _t: f64, j: &mut Jacobian) {
        let (x, y, z) = (s[0], s[1], s[2]);
        *j = Jacobian::new(
            self.alpha, -z, -y,
            z, self.beta, x,
            y / 3.0, x / 3.0, self.delta,
        );
    }
}

// dx/dt = -a x - y^2 - z^2 + a f
// dy/dt = -y + x y - b x z + g
// dz/dt = -z + b x y + x z
impl VectorField for Lorenz83Params {
    fn call_inplace(&self, s: &State, _t: f64, ds: &mut State) {
        let (x, y, z) = (s[0], s[1], s[2]);
        ds[0] = -(self.a * x) - y * y - z * z + self.a * self.f;
        ds[1] = -y + x * y - self.b * x * z + self.g;
        ds[2] = -z + self.b * x * y + x * z;
    }
    #[rustfmt::skip]
    fn jacobian_inplace(&self, s: &State, _t: f64, j: &mut Jacobian) {
        let (x, y, z) = (s[0], s[1], s[2]);
        *j = Jacobian::new(
            -self.a, -2.0 * y, -2.0 * z,
            y - self.b * z, x - 1.0, -self.b * x,
            self.b * y + z, self.b * x, x - 1.0,
        );
    }
}

// dx/dt = -(y + z)
// dy/dt = x + a y
// dz/dt = b + z (x - c)
impl VectorField for RosslerParams {
    fn call_inplace(&self, s: &State, _t: f64, ds: &mut State) {
        let (x, y, z) = (s[0], s[1], s[2]);
        ds[0] = -(y + z);
        ds[1] = x + self.a * y;
        ds[2] = self.b + z * (x - self.c);
    }
    #[rustfmt::skip]
    fn jacobian_inplace(&self, s: &State, _t: f64, j: &mut Jacobian) {
        let (x, z) = (s[0], s[2]);
        *j = Jacobian::new(
            0.0, -1.0, -1.0,
            1.0, self.a, 0.0,
            z, 0.0, x - self.c,
        );
    }
}

// dx/dt = y (z - 1 + x^2) + gamma x
// dy/dt = x (3z + 1 - x^2) + gamma y
// dz/dt = -2z (alpha + x y)
impl VectorField for RabinovichFabrikantParams {
    fn call_inplace(&self, s: &State, _t: f64, ds: &mut State) {
        let (x, y, z) = (s[0], s[1], s[2]);
        ds[0] = y * (z - 1.0 + x * x) + self.gamma * x;
        ds[1] = x * (3.0 * z + 1.0 - x * x) + self.gamma * y;
        ds[2] = -2.0 * z * (self.alpha + x * y);
    }
    #[rustfmt::skip]
    fn jacobian_inplace(&self, s: &State, _t: f64, j: &mut Jacobian) {
        let (x, y, z) = (s[0], s[1], s[2]);
        *j = Jacobian::new(
            2.0 * x * y + self.gamma, z - 1.0 + x * x, y,
            3.0 * z + 1.0 - 3.0 * x * x, self.gamma, 3.0 * x,
            -2.0 * z * y, -2.0 * z * x, -2.0 * (self.alpha + x * y),
        );
    }
}

// dx/dt = y + a x y + x z
// dy/dt = 1 - b x^2 + y z
// dz/dt = x - x^2 - y^2
impl VectorField for SprottParams {
    fn call_inplace(&self, s: &State, _t: f64, ds: &mut State) {
        let (x, y, z) = (s[0], s[1], s[2]);
        ds[0] = y + self.a * x * y + x * z;
        ds[1] = 1.0 - self.b * x * x + y * z;
        ds[2] = x - x * x - y * y;
    }
    #[rustfmt::skip]
    fn jacobian_inplace(&self, s: &State, _t: f64, j: &mut Jacobian) {
        let (x, y, z) = (s[0], s[1], s[2]);
        *j = Jacobian::new(
            self.a * y + z, 1.0 + self.a * x, x,
            -2.0 * self.b * x, z, y,
            1.0 - 2.0 * x, -2.0 * y, 0.0,
        );
    }
}

// dx/dt = a x + y z
// dy/dt = b x + c y - x z
// dz/dt = -z - x y
impl VectorField for FourWingParams {
    fn call_inplace(&self, s: &State, _t: f64, ds: &mut State) {
        let (x, y, z) = (s[0], s[1], s[2]);
        ds[0] = self.a * x + y * z;
        ds[1] = self.b * x + self.c * y - x * z;
        ds[2] = -z - x * y;
    }
    #[rustfmt::skip]
    fn jacobian_inplace(&self, s: &State, _t: f64, j: &mut Jacobian) {
        let (x, y, z) = (s[0], s[1], s[2]);
        *j = Jacobian::new(
            self.a, z, y,
            self.b - z, self.c, -x,
            -y, -x, -1.0,
        );
    }
}

macro_rules! dispatch {
    ($params:expr, $p:ident => $body:expr) => {
        match $params {
            Parameters::Halvorsen($p) => $body,
            Parameters::Lorenz($p) => $body,
            Parameters::Dadras($p) => $body,
            Parameters::Chen($p) => $body,
            Parameters::Lorenz83($p) => $body,
            Parameters::Rossler($p) => $body,
            Parameters::RabinovichFabrikant($p) => $body,
            Parameters::Sprott($p) => $body,
            Parameters::FourWing($p) => $body,
        }
    };
}

impl VectorField for Parameters {
    fn call_inplace(&self, x: &State, t: f64, y: &mut State) {
        dispatch!(self, p => p.call_inplace(x, t, y))
    }
    fn jacobian_inplace(&self, x: &State, t: f64, j: &mut Jacobian) {
        dispatch!(self, p => p.jacobian_inplace(x, t, j))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Attractor;

    /// Central differences of the right-hand side, independent of the forward
    /// difference used as the trait default.
    fn central_difference_jacobian(f: &impl VectorField, x: &State) -> Jacobian {
        let mut j = Jacobian::zeros();
        for k in 0..3 {
            let delta = 1e-6 * x[k].abs().max(1.0);
            let mut xp = *x;
            let mut xm = *x;
            xp[k] += delta;
            xm[k] -= delta;
            j.set_column(k, &((f.call(&xp, 0.0) - f.call(&xm, 0.0)) / (2.0 * delta)));
        }
        j
    }

    #[test]
    fn analytic_jacobians_match_finite_differences() {
        let points = [
            State::new(0.3, -1.2, 0.7),
            State::new(-2.5, 0.4, 3.1),
            State::new(1.0, 1.0, 1.0),
        ];
        for attractor in Attractor::ALL {
            let params = Parameters::preset(attractor);
            for x in points.iter() {
                let analytic = params.jacobian(x, 0.0);
                let numeric = central_difference_jacobian(&params, x);
                assert!(
                    (analytic - numeric).norm() < 1e-6 * (1.0 + analytic.norm()),
                    "{} at {:?}: {} vs {}",
                    attractor,
                    x,
                    analytic,
                    numeric
                );
            }
        }
    }

    #[test]
    fn lorenz_has_fixed_points_at_its_equilibria() {
        let (rho, beta): (f64, f64) = (28.0, 8.0 / 3.0);
        let c = (beta * (rho - 1.0)).sqrt();
        let params = Parameters::preset(Attractor::Lorenz);
        for x in [
            State::zeros(),
            State::new(c, c, rho - 1.0),
            State::new(-c, -c, rho - 1.0),
        ] {
            assert!(params.call(&x, 0.0).norm() < 1e-12);
        }
    }

    #[test]
    fn rossler_derivative_at_known_point() {
        let params = RosslerParams {
            a: 0.2,
            b: 0.2,
            c: 5.7,
        };
        // x' = -(y + z), y' = x + a y, z' = b + z (x - c)
        let ds = params.call(&State::new(1.0, 2.0, 3.0), 0.0);
        assert!((ds - State::new(-5.0, 1.4, 0.2 + 3.0 * (1.0 - 5.7))).norm() < 1e-12);
    }
}
