use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{error::AttractorError, Attractor};

/// Parameters keyed by coefficient name, as accepted at the boundary of the crate.
pub type ParameterMap = HashMap<String, f64>;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HalvorsenParams {
    pub alpha: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LorenzParams {
    pub sigma: f64,
    pub rho: f64,
    pub beta: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DadrasParams {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChenParams {
    pub alpha: f64,
    pub beta: f64,
    pub delta: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Lorenz83Params {
    pub a: f64,
    pub b: f64,
    pub f: f64,
    pub g: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RosslerParams {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RabinovichFabrikantParams {
    pub alpha: f64,
    pub gamma: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SprottParams {
    pub a: f64,
    pub b: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FourWingParams {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

/// The coefficients of one attractor. The variant fixes which system is integrated.
///
/// Serialized with an `attractor` tag holding the registry identifier.
///
/// ```
/// use attractors::{Attractor, LorenzParams, ParameterMap, Parameters};
///
/// let map: ParameterMap = [("sigma", 10.0), ("rho", 28.0), ("beta", 2.5)]
///     .into_iter()
///     .map(|(k, v)| (k.to_string(), v))
///     .collect();
/// let p = Parameters::from_map(Attractor::Lorenz, &map).unwrap();
/// assert_eq!(p, Parameters::Lorenz(LorenzParams { sigma: 10.0, rho: 28.0, beta: 2.5 }));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "attractor", rename_all = "snake_case")]
pub enum Parameters {
    Halvorsen(HalvorsenParams),
    Lorenz(LorenzParams),
    Dadras(DadrasParams),
    Chen(ChenParams),
    Lorenz83(Lorenz83Params),
    Rossler(RosslerParams),
    RabinovichFabrikant(RabinovichFabrikantParams),
    Sprott(SprottParams),
    FourWing(FourWingParams),
}

struct Lookup<'a> {
    attractor: Attractor,
    map: &'a ParameterMap,
}

impl Lookup<'_> {
    fn get(&self, key: &'static str) -> Result<f64, AttractorError> {
        self.map
            .get(key)
            .copied()
            .ok_or(AttractorError::MissingParameter {
                attractor: self.attractor.name(),
                key,
            })
    }
}

impl Parameters {
    /// Bind the coefficients of `attractor` from a string-keyed map.
    /// Keys the attractor does not use are ignored.
    pub fn from_map(attractor: Attractor, map: &ParameterMap) -> Result<Self, AttractorError> {
        let p = Lookup { attractor, map };
        let params = match attractor {
            Attractor::Halvorsen => Parameters::Halvorsen(HalvorsenParams {
                alpha: p.get("alpha")?,
            }),
            Attractor::Lorenz => Parameters::Lorenz(LorenzParams {
                sigma: p.get("sigma")?,
                rho: p.get("rho")?,
                beta: p.get("beta")?,
            }),
            Attractor::Dadras => Parameters::Dadras(DadrasParams {
                a: p.get("a")?,
                b: p.get("b")?,
                c: p.get("c")?,
                d: p.get("d")?,
                e: p.get("e")?,
            }),
            Attractor::Chen => Parameters::Chen(ChenParams {
                alpha: p.get("alpha")?,
                beta: p.get("beta")?,
                delta: p.get("delta")?,
            }),
            Attractor::Lorenz83 => Parameters::Lorenz83(Lorenz83Params {
                a: p.get("a")?,
                b: p.get("b")?,
                f: p.get("f")?,
                g: p.get("g")?,
            }),
            Attractor::Rossler => Parameters::Rossler(RosslerParams {
                a: p.get("a")?,
                b: p.get("b")?,
                c: p.get("c")?,
            }),
            Attractor::RabinovichFabrikant => {
                Parameters::RabinovichFabrikant(RabinovichFabrikantParams {
                    alpha: p.get("alpha")?,
                    gamma: p.get("gamma")?,
                })
            }
            Attractor::Sprott => Parameters::Sprott(SprottParams {
                a: p.get("a")?,
                b: p.get("b")?,
            }),
            Attractor::FourWing => Parameters::FourWing(FourWingParams {
                a: p.get("a")?,
                b: p.get("b")?,
                c: p.get("c")?,
            }),
        };
        Ok(params)
    }

    /// A parameter set known to produce the chaotic regime of `attractor`.
    pub fn preset(attractor: Attractor) -> Self {
        match attractor {
            Attractor::Halvorsen => Parameters::Halvorsen(HalvorsenParams { alpha: 1.89 }),
            Attractor::Lorenz => Parameters::Lorenz(LorenzParams {
                sigma: 10.0,
                rho: 28.0,
                beta: 8.0 / 3.0,
            }),
            Attractor::Dadras => Parameters::Dadras(DadrasParams {
                a: 3.0,
                b: 2.7,
                c: 1.7,
                d: 2.0,
                e: 9.0,
            }),
            Attractor::Chen => Parameters::Chen(ChenParams {
                alpha: 5.0,
                beta: -10.0,
                delta: -0.38,
            }),
            Attractor::Lorenz83 => Parameters::Lorenz83(Lorenz83Params {
                a: 0.95,
                b: 7.91,
                f: 4.83,
                g: 4.66,
            }),
            Attractor::Rossler => Parameters::Rossler(RosslerParams {
                a: 0.2,
                b: 0.2,
                c: 5.7,
            }),
            Attractor::RabinovichFabrikant => {
                Parameters::RabinovichFabrikant(RabinovichFabrikantParams {
                    alpha: 0.14,
                    gamma: 0.1,
                })
            }
            Attractor::Sprott => Parameters::Sprott(SprottParams { a: 2.07, b: 1.79 }),
            Attractor::FourWing => Parameters::FourWing(FourWingParams {
                a: 0.2,
                b: 0.01,
                c: -0.4,
            }),
        }
    }

    pub fn attractor(&self) -> Attractor {
        match self {
            Parameters::Halvorsen(_) => Attractor::Halvorsen,
            Parameters::Lorenz(_) => Attractor::Lorenz,
            Parameters::Dadras(_) => Attractor::Dadras,
            Parameters::Chen(_) => Attractor::Chen,
            Parameters::Lorenz83(_) => Attractor::Lorenz83,
            Parameters::Rossler(_) => Attractor::Rossler,
            Parameters::RabinovichFabrikant(_) => Attractor::RabinovichFabrikant,
            Parameters::Sprott(_) => Attractor::Sprott,
            Parameters::FourWing(_) => Attractor::FourWing,
        }
    }

    /// The coefficients as a string-keyed map, the inverse of [Self::from_map].
    pub fn to_map(&self) -> ParameterMap {
        let pairs: Vec<(&str, f64)> = match *self {
            Parameters::Halvorsen(p) => vec![("alpha", p.alpha)],
            Parameters::Lorenz(p) => vec![("sigma", p.sigma), ("rho", p.rho), ("beta", p.beta)],
            Parameters::Dadras(p) => vec![("a", p.a), ("b", p.b), ("c", p.c), ("d", p.d), ("e", p.e)],
            Parameters::Chen(p) => vec![("alpha", p.alpha), ("beta", p.beta), ("delta", p.delta)],
            Parameters::Lorenz83(p) => vec![("a", p.a), ("b", p.b), ("f", p.f), ("g", p.g)],
            Parameters::Rossler(p) => vec![("a", p.a), ("b", p.b), ("c", p.c)],
            Parameters::RabinovichFabrikant(p) => vec![("alpha", p.alpha), ("gamma", p.gamma)],
            Parameters::Sprott(p) => vec![("a", p.a), ("b", p.b)],
            Parameters::FourWing(p) => vec![("a", p.a), ("b", p.b), ("c", p.c)],
        };
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn presets_round_trip_through_maps() {
        for attractor in Attractor::ALL {
            let preset = Parameters::preset(attractor);
            assert_eq!(preset.attractor(), attractor);
            let map = preset.to_map();
            let mut keys: Vec<&str> = map.keys().map(String::as_str).collect();
            keys.sort_unstable();
            let mut expected = attractor.parameter_keys().to_vec();
            expected.sort_unstable();
            assert_eq!(keys, expected);
            assert_eq!(Parameters::from_map(attractor, &map).unwrap(), preset);
        }
    }

    #[test]
    fn missing_key_is_reported() {
        let mut map = Parameters::preset(Attractor::Lorenz).to_map();
        map.remove("beta");
        let err = Parameters::from_map(Attractor::Lorenz, &map).unwrap_err();
        assert!(matches!(
            err,
            AttractorError::MissingParameter {
                attractor: "lorenz",
                key: "beta"
            }
        ));
    }

    #[test]
    fn parameters_serialize_with_attractor_tag() {
        insta::assert_yaml_snapshot!(Parameters::preset(Attractor::Rossler), @r"
        attractor: rossler
        a: 0.2
        b: 0.2
        c: 5.7
        ");
    }

    #[test]
    fn extra_keys_are_ignored() {
        let mut map = Parameters::preset(Attractor::Sprott).to_map();
        map.insert("sigma".to_string(), 1.0);
        assert_eq!(
            Parameters::from_map(Attractor::Sprott, &map).unwrap(),
            Parameters::preset(Attractor::Sprott)
        );
    }
}
