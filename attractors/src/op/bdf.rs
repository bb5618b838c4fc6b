use std::cell::{Cell, RefCell};

use crate::{ode_solver::bdf_state::Diff, Jacobian, State, VectorField};

// residual of the implicit BDF step, F(y) = y - y0 + psi - c * f(y) = 0
//
// The residual is exposed as a [VectorField] so the Newton solver can treat it like any other
// operator, its Jacobian is I - c * df/dy.
pub struct BdfCallable<'a, F: VectorField> {
    eqn: &'a F,
    psi_neg_y0: RefCell<State>,
    c: Cell<f64>,
    rhs_jac: RefCell<Jacobian>,
    jacobian_is_stale: Cell<bool>,
    number_of_jac_evals: Cell<usize>,
}

impl<'a, F: VectorField> BdfCallable<'a, F> {
    pub fn new(eqn: &'a F) -> Self {
        Self {
            eqn,
            psi_neg_y0: RefCell::new(State::zeros()),
            c: Cell::new(0.0),
            rhs_jac: RefCell::new(Jacobian::zeros()),
            jacobian_is_stale: Cell::new(true),
            number_of_jac_evals: Cell::new(0),
        }
    }

    pub fn eqn(&self) -> &'a F {
        self.eqn
    }

    pub fn c(&self) -> f64 {
        self.c.get()
    }

    pub fn number_of_jac_evals(&self) -> usize {
        self.number_of_jac_evals.get()
    }

    pub fn set_c(&self, h: f64, alpha: f64) {
        self.c.set(h * alpha);
    }

    // psi = alpha_k * sum_{i=1}^{k} gamma_i D^i, stored as psi - y0
    pub fn set_psi_and_y0(
        &self,
        diff: &Diff,
        gamma: &[f64],
        alpha: &[f64],
        order: usize,
        y0: &State,
    ) {
        let mut psi = State::zeros();
        for (i, &gamma_i) in gamma.iter().enumerate().take(order + 1).skip(1) {
            psi += gamma_i * diff.column(i);
        }
        psi *= alpha[order];
        self.psi_neg_y0.replace(psi - y0);
    }

    pub fn set_jacobian_is_stale(&self) {
        self.jacobian_is_stale.set(true);
    }

    #[cfg(test)]
    fn set_psi_neg_y0_direct(&self, psi_neg_y0: State) {
        self.psi_neg_y0.replace(psi_neg_y0);
    }
}

impl<F: VectorField> VectorField for BdfCallable<'_, F> {
    fn call_inplace(&self, x: &State, t: f64, y: &mut State) {
        self.eqn.call_inplace(x, t, y);
        let c = self.c.get();
        let tmp = x + *self.psi_neg_y0.borrow();
        *y = tmp - *y * c;
    }

    fn jacobian_inplace(&self, x: &State, t: f64, j: &mut Jacobian) {
        // the rhs Jacobian is reused until marked stale, only c may have changed
        if self.jacobian_is_stale.get() {
            self.eqn.jacobian_inplace(x, t, &mut self.rhs_jac.borrow_mut());
            self.jacobian_is_stale.set(false);
        }
        let c = self.c.get();
        *j = Jacobian::identity() - *self.rhs_jac.borrow() * c;
        self.number_of_jac_evals.set(self.number_of_jac_evals.get() + 1);
    }
}
