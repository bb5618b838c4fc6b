use nalgebra::{DMatrix, DVector};

use crate::{
    error::{AttractorError, OdeSolverError},
    ode_solver_error,
};

/// A butcher tableau for an explicit Runge-Kutta method with a continuous extension.
///
/// The tableau is defined by the matrices `a`, `b`, `c` and `d` and the order of the method.
/// The butchers tableau is often depicted like this example of a 3-stage method:
///
/// ```text
/// c1 | 0   0   0
/// c2 | a21 0   0
/// c3 | a31 a32 0
/// -------------------
///   | b1  b2  b3
///   | be1 be2 be3
/// -------------------
///   | d1  d2  d3
/// ```
///
/// where `be` is the embedded method for error control and `d` is the difference between the main and embedded method.
///
/// Row `i` of `beta` holds the coefficients of the dense output polynomial of stage `i`,
/// column `k` multiplies `theta^(k+1)`.
#[derive(Clone, Debug)]
pub struct Tableau {
    a: DMatrix<f64>,
    b: DVector<f64>,
    c: DVector<f64>,
    d: DVector<f64>,
    order: usize,
    beta: DMatrix<f64>,
}

impl Tableau {
    /// Tsitouras 5(4) method, with the free interpolant of
    /// Ch. Tsitouras, Runge-Kutta pairs of order 5(4) satisfying only the first column simplifying assumption,
    /// Computers & Mathematics with Applications 62 (2011) 770-775.
    pub fn tsit45() -> Self {
        let c = DVector::from_vec(vec![
            0.0,
            0.161,
            0.327,
            0.9,
            0.9800255409045097,
            1.0,
            1.0,
        ]);

        let b = DVector::from_vec(vec![
            0.09646076681806523,
            0.01,
            0.4798896504144996,
            1.379008574103742,
            -3.290069515436081,
            2.324710524099774,
            0.0,
        ]);

        let d = DVector::from_vec(vec![
            -0.001_780_011_052_225_777,
            -0.0008164344596567469,
            0.007880878010261995,
            -0.1447110071732629,
            0.5823571654525552,
            -0.45808210592918697,
            0.015151515151515152,
        ]);

        // first column is filled in below so that each row sums to c
        let mut a = DMatrix::zeros(7, 7);
        a[(2, 1)] = 0.335_480_655_492_357;
        a[(3, 1)] = -6.359448489975075;
        a[(3, 2)] = 4.362295432869581;
        a[(4, 1)] = -11.74888356406283;
        a[(4, 2)] = 7.495539342889836;
        a[(4, 3)] = -0.09249506636175525;
        a[(5, 1)] = -12.92096931784711;
        a[(5, 2)] = 8.159367898576159;
        a[(5, 3)] = -0.071_584_973_281_401;
        a[(5, 4)] = -0.02826905039406838;
        for i in 1..6 {
            let a_sum: f64 = (1..i).map(|j| a[(i, j)]).sum();
            a[(i, 0)] = c[i] - a_sum;
        }
        for j in 0..6 {
            a[(6, j)] = b[j];
        }

        // b0 = -1.05308849772902*t**4 + 2.91325546182191*t**3 - 2.76370619727483*t**2 + 1.0*t
        // b6 = 2.5*t**4 - 4.0*t**3 + 1.5*t**2
        let beta = DMatrix::from_row_slice(
            7,
            4,
            &[
                1.0,
                -2.76370619727483,
                2.91325546182191,
                -1.05308849772902,
                0.0,
                0.1317,
                -0.2234,
                0.1017,
                0.0,
                3.93029623689475,
                -5.9410338721315,
                2.49062728565125,
                0.0,
                -12.4110771669337,
                30.3381886302823,
                -16.5481028892449,
                0.0,
                37.509313416511,
                -88.1789048947664,
                47.3795219628193,
                0.0,
                -27.8965262891973,
                65.0918946747937,
                -34.8706578614966,
                0.0,
                1.5,
                -4.0,
                2.5,
            ],
        );

        Self {
            a,
            b,
            c,
            d,
            order: 4,
            beta,
        }
    }

    pub fn new(
        a: DMatrix<f64>,
        b: DVector<f64>,
        c: DVector<f64>,
        d: DVector<f64>,
        order: usize,
        beta: DMatrix<f64>,
    ) -> Result<Self, AttractorError> {
        let s = c.len();
        if a.shape() != (s, s) || b.len() != s || d.len() != s || beta.nrows() != s {
            return Err(ode_solver_error!(
                BuilderError,
                format!("Inconsistent tableau dimensions, expected {s} stages")
            ));
        }
        // explicit methods only
        if (0..s).any(|i| (i..s).any(|j| a[(i, j)] != 0.0)) {
            return Err(ode_solver_error!(
                BuilderError,
                "Tableau is not explicit, a must be strictly lower triangular"
            ));
        }
        Ok(Self {
            a,
            b,
            c,
            d,
            order,
            beta,
        })
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn s(&self) -> usize {
        self.c.len()
    }

    pub fn a(&self) -> &DMatrix<f64> {
        &self.a
    }

    pub fn b(&self) -> &DVector<f64> {
        &self.b
    }

    pub fn c(&self) -> &DVector<f64> {
        &self.c
    }

    pub fn d(&self) -> &DVector<f64> {
        &self.d
    }

    pub fn beta(&self) -> &DMatrix<f64> {
        &self.beta
    }
}
