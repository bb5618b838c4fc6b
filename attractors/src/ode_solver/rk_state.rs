use super::state::StateCommon;
use crate::{OdeSolverState, State, StateRef, StateRefMut};

/// State of a one-step Runge-Kutta solver, just the common variables.
#[derive(Clone, Debug)]
pub struct RkState {
    pub(crate) y: State,
    pub(crate) dy: State,
    pub(crate) t: f64,
    pub(crate) h: f64,
}

impl OdeSolverState for RkState {
    fn new_from_common(state: StateCommon) -> Self {
        let StateCommon { y, dy, t, h } = state;
        Self { y, dy, t, h }
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
