use nalgebra::SMatrix;

use super::state::StateCommon;
use crate::{OdeSolverState, State, StateRef, StateRefMut};

/// Modified divided differences `D` of the BDF method, one column per difference order.
/// Columns `0..=MAX_ORDER` plus two spare columns that hold the differences of order `order + 1` and `order + 2`.
pub type Diff = SMatrix<f64, 3, 8>;

#[derive(Clone, Debug)]
pub struct BdfState {
    pub(crate) order: usize,
    pub(crate) diff: Diff,
    pub(crate) y: State,
    pub(crate) dy: State,
    pub(crate) t: f64,
    pub(crate) h: f64,
    pub(crate) diff_initialised: bool,
}

impl BdfState {
    pub(crate) const MAX_ORDER: usize = 5;

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn initialise_diff_to_first_order(&mut self) {
        self.order = 1usize;
        self.diff.fill(0.0);
        self.diff.set_column(0, &self.y);
        self.diff.set_column(1, &(self.dy * self.h));
        self.diff_initialised = true;
    }
}

impl OdeSolverState for BdfState {
    fn new_from_common(state: StateCommon) -> Self {
        let StateCommon { y, dy, t, h } = state;
        Self {
            order: 1,
            diff: Diff::zeros(),
            y,
            dy,
            t,
            h,
            diff_initialised: false,
        }
    }

    fn into_common(self) -> StateCommon {
        StateCommon {
            y: self.y,
            dy: self.dy,
            t: self.t,
            h: self.h,
        }
    }

    fn as_mut(&mut self) -> StateRefMut<'_> {
        StateRefMut {
            y: &mut self.y,
            dy: &mut self.dy,
            t: &mut self.t,
            h: &mut self.h,
        }
    }

    fn as_ref(&self) -> StateRef<'_> {
        StateRef {
            y: &self.y,
            dy: &self.dy,
            t: self.t,
            h: self.h,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn first_order_diff_holds_y_and_scaled_derivative() {
        let mut state = BdfState::new_from_common(StateCommon {
            y: State::new(1.0, 2.0, 3.0),
            dy: State::new(-1.0, 0.5, 0.0),
            t: 0.0,
            h: 0.1,
        });
        assert!(!state.diff_initialised);
        state.initialise_diff_to_first_order();
        assert_eq!(state.order(), 1);
        assert_eq!(state.diff.column(0), State::new(1.0, 2.0, 3.0));
        assert!((state.diff.column(1) - State::new(-0.1, 0.05, 0.0)).norm() < 1e-15);
        assert_eq!(state.diff.column(2), State::zeros());
    }
}
