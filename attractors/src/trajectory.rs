use serde::Serialize;

use crate::State;

/// Whether a [Trajectory] covers its whole time grid.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub enum Completion {
    Complete,
    /// The solver gave up at `diverged_at`; the trajectory holds every grid point reached before.
    Partial { diverged_at: f64 },
}

/// The solution of an initial value problem sampled on a time grid.
///
/// `states()[i]` is the solution at `times()[i]`, and the first state is the initial state.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Trajectory {
    times: Vec<f64>,
    states: Vec<State>,
    completion: Completion,
}

impl Trajectory {
    pub(crate) fn new(times: Vec<f64>, states: Vec<State>, completion: Completion) -> Self {
        debug_assert_eq!(times.len(), states.len());
        Self {
            times,
            states,
            completion,
        }
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn completion(&self) -> Completion {
        self.completion
    }

    pub fn is_complete(&self) -> bool {
        self.completion == Completion::Complete
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Pairs of `(t, y)` in time order.
    pub fn iter(&self) -> impl Iterator<Item = (f64, &State)> + '_ {
        self.times.iter().copied().zip(self.states.iter())
    }

    /// The x, y and z components as three parallel sequences.
    pub fn xyz(&self) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let mut x = Vec::with_capacity(self.len());
        let mut y = Vec::with_capacity(self.len());
        let mut z = Vec::with_capacity(self.len());
        for s in self.states.iter() {
            x.push(s[0]);
            y.push(s[1]);
            z.push(s[2]);
        }
        (x, y, z)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn xyz_splits_components() {
        let traj = Trajectory::new(
            vec![0.0, 1.0],
            vec![State::new(1.0, 2.0, 3.0), State::new(4.0, 5.0, 6.0)],
            Completion::Complete,
        );
        let (x, y, z) = traj.xyz();
        assert_eq!(x, vec![1.0, 4.0]);
        assert_eq!(y, vec![2.0, 5.0]);
        assert_eq!(z, vec![3.0, 6.0]);
        assert_eq!(traj.len(), 2);
        assert!(traj.is_complete());
        let times: Vec<f64> = traj.iter().map(|(t, _)| t).collect();
        assert_eq!(times, traj.times());
    }

    #[test]
    fn completion_serializes_with_divergence_time() {
        insta::assert_yaml_snapshot!(Completion::Partial { diverged_at: 1.5 }, @r"
        Partial:
          diverged_at: 1.5
        ");
    }
}
