use serde::{Deserialize, Serialize};

/// Settings shared by every solver configuration.
pub trait OdeSolverConfig: Clone + Default {
    fn minimum_timestep(&self) -> f64;
    fn set_minimum_timestep(&mut self, value: f64);
    fn maximum_error_test_failures(&self) -> usize;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BdfConfig {
    pub minimum_timestep: f64,
    pub maximum_error_test_failures: usize,
    pub maximum_timestep_growth: f64,
    pub minimum_timestep_growth: f64,
    pub maximum_timestep_shrink: f64,
    pub minimum_timestep_shrink: f64,
    pub maximum_newton_iterations: usize,
}

impl Default for BdfConfig {
    fn default() -> Self {
        Self {
            minimum_timestep: 1e-32,
            maximum_error_test_failures: 40,
            maximum_timestep_growth: 2.1,
            minimum_timestep_growth: 2.0,
            maximum_timestep_shrink: 0.9,
            minimum_timestep_shrink: 0.5,
            maximum_newton_iterations: 4,
        }
    }
}

impl OdeSolverConfig for BdfConfig {
    fn minimum_timestep(&self) -> f64 {
        self.minimum_timestep
    }
    fn set_minimum_timestep(&mut self, value: f64) {
        self.minimum_timestep = value;
    }
    fn maximum_error_test_failures(&self) -> usize {
        self.maximum_error_test_failures
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplicitRkConfig {
    pub minimum_timestep: f64,
    pub maximum_error_test_failures: usize,
    pub maximum_timestep_growth: f64,
    pub minimum_timestep_shrink: f64,
}

impl Default for ExplicitRkConfig {
    fn default() -> Self {
        Self {
            minimum_timestep: 1e-13,
            maximum_error_test_failures: 40,
            maximum_timestep_growth: 10.0,
            minimum_timestep_shrink: 0.2,
        }
    }
}

impl OdeSolverConfig for ExplicitRkConfig {
    fn minimum_timestep(&self) -> f64 {
        self.minimum_timestep
    }
    fn set_minimum_timestep(&mut self, value: f64) {
        self.minimum_timestep = value;
    }
    fn maximum_error_test_failures(&self) -> usize {
        self.maximum_error_test_failures
    }
}
