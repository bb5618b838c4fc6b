use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{error::AttractorError, State};

pub mod fields;
pub mod params;

pub use params::{
    ChenParams, DadrasParams, FourWingParams, HalvorsenParams, Lorenz83Params, LorenzParams,
    ParameterMap, Parameters, RabinovichFabrikantParams, RosslerParams, SprottParams,
};

/// The nine systems shipped with the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attractor {
    Halvorsen,
    Lorenz,
    Dadras,
    Chen,
    Lorenz83,
    Rossler,
    RabinovichFabrikant,
    Sprott,
    FourWing,
}

/// One row of the registry.
#[derive(Debug)]
pub struct CatalogEntry {
    pub attractor: Attractor,
    pub name: &'static str,
    pub display_name: &'static str,
    pub parameter_keys: &'static [&'static str],
    pub initial_state: [f64; 3],
}

/// The registry, in the order of [Attractor::ALL]. It is fixed at compile time.
pub static CATALOG: [CatalogEntry; 9] = [
    CatalogEntry {
        attractor: Attractor::Halvorsen,
        name: "halvorsen",
        display_name: "Halvorsen",
        parameter_keys: &["alpha"],
        initial_state: [-1.48, -1.51, 2.04],
    },
    CatalogEntry {
        attractor: Attractor::Lorenz,
        name: "lorenz",
        display_name: "Lorenz",
        parameter_keys: &["sigma", "rho", "beta"],
        initial_state: [0.1, 0.0, 0.0],
    },
    CatalogEntry {
        attractor: Attractor::Dadras,
        name: "dadras",
        display_name: "Dadras",
        parameter_keys: &["a", "b", "c", "d", "e"],
        initial_state: [1.1, 2.1, -2.0],
    },
    CatalogEntry {
        attractor: Attractor::Chen,
        name: "chen",
        display_name: "Chen",
        parameter_keys: &["alpha", "beta", "delta"],
        initial_state: [5.0, 10.0, 10.0],
    },
    CatalogEntry {
        attractor: Attractor::Lorenz83,
        name: "lorenz83",
        display_name: "Lorenz-83",
        parameter_keys: &["a", "b", "f", "g"],
        initial_state: [-0.2, -2.82, 2.71],
    },
    CatalogEntry {
        attractor: Attractor::Rossler,
        name: "rossler",
        display_name: "Rössler",
        parameter_keys: &["a", "b", "c"],
        initial_state: [10.0, 0.0, 10.0],
    },
    CatalogEntry {
        attractor: Attractor::RabinovichFabrikant,
        name: "rabinovich_fabrikant",
        display_name: "Rabinovich-Fabrikant",
        parameter_keys: &["alpha", "gamma"],
        initial_state: [-1.0, 0.0, 0.5],
    },
    CatalogEntry {
        attractor: Attractor::Sprott,
        name: "sprott",
        display_name: "Sprott",
        parameter_keys: &["a", "b"],
        initial_state: [0.63, 0.47, -0.54],
    },
    CatalogEntry {
        attractor: Attractor::FourWing,
        name: "four_wing",
        display_name: "Four-Wing",
        parameter_keys: &["a", "b", "c"],
        initial_state: [1.3, -0.18, 0.01],
    },
];

impl Attractor {
    pub const ALL: [Attractor; 9] = [
        Attractor::Halvorsen,
        Attractor::Lorenz,
        Attractor::Dadras,
        Attractor::Chen,
        Attractor::Lorenz83,
        Attractor::Rossler,
        Attractor::RabinovichFabrikant,
        Attractor::Sprott,
        Attractor::FourWing,
    ];

    fn entry(self) -> &'static CatalogEntry {
        &CATALOG[self as usize]
    }

    /// Registry identifier, e.g. `"four_wing"`.
    pub fn name(self) -> &'static str {
        self.entry().name
    }

    pub fn display_name(self) -> &'static str {
        self.entry().display_name
    }

    /// Coefficients the system requires, in the order they appear in its equations.
    pub fn parameter_keys(self) -> &'static [&'static str] {
        self.entry().parameter_keys
    }

    /// A starting point on (or close to) the attractor for [Parameters::preset].
    pub fn preset_initial_state(self) -> State {
        State::from(self.entry().initial_state)
    }

    /// Resolve a registry identifier. Matching is exact.
    pub fn from_name(name: &str) -> Result<Self, AttractorError> {
        CATALOG
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.attractor)
            .ok_or_else(|| AttractorError::UnknownAttractor {
                name: name.to_string(),
            })
    }
}

impl FromStr for Attractor {
    type Err = AttractorError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Attractor::from_name(s)
    }
}

impl fmt::Display for Attractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Look up `name` in the registry and bind its coefficients from `params`.
///
/// The returned [Parameters] is itself the [crate::VectorField] of the system.
///
/// ```
/// use attractors::{vector_field, Attractor, Parameters, State, VectorField};
///
/// let params = Parameters::preset(Attractor::Lorenz).to_map();
/// let field = vector_field("lorenz", &params).unwrap();
/// let ds = field.call(&State::new(1.0, 1.0, 1.0), 0.0);
/// assert_eq!(ds[0], 0.0);
/// assert!(vector_field("not_a_system", &params).is_err());
/// ```
pub fn vector_field(name: &str, params: &ParameterMap) -> Result<Parameters, AttractorError> {
    let attractor = Attractor::from_name(name)?;
    Parameters::from_map(attractor, params)
}
