//! Libmap configuration.
//!
//! Parsed once before search from a colon-separated option string such as
//! `pick_mode=ucb:explore_p=0.1:counterattack=dx:eval=global`, then handed to
//! every component by reference. Option names are case-insensitive.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::constants::{
    DEFAULT_EXPLORE_P, DEFAULT_PICK_EPSILON, DEFAULT_PICK_THRESHOLD, DEFAULT_PRIOR,
    DEFAULT_TENUKI_PRIOR,
};
use crate::stats::MoveStats;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid libmap argument {0} or missing value")]
    UnknownOption(String),
    #[error("invalid libmap:{option} value {value}")]
    InvalidValue { option: &'static str, value: String },
}

/// How a candidate is picked from the move queue.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PickMode {
    /// Random candidate, skipping ones proven below the threshold.
    Threshold,
    /// Upper confidence bound over the remembered statistics.
    Ucb,
}

/// How a finished playout is turned into a value for each queued move.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EvalMode {
    /// Ownership of the group's own points.
    Local,
    /// Ownership of the group's points and their neighbors.
    LocalValue,
    /// 1 if the goal color won the playout, else 0.
    Global,
}

/// Which hash framings a candidate is recorded under.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Counterattack {
    /// The group's own local-shape hash.
    pub defense: bool,
    /// The counter-atari target's hash.
    pub attack: bool,
    /// Both hashes XORed together.
    pub defense_attack: bool,
}

impl Counterattack {
    pub const ALL: Counterattack = Counterattack {
        defense: true,
        attack: true,
        defense_attack: true,
    };
}

#[derive(Clone, Debug, PartialEq)]
pub struct LibmapConfig {
    pub pick_mode: PickMode,
    pub pick_threshold: f64,
    pub pick_epsilon: u32,
    pub avoid_bad: bool,
    pub explore_p: f64,
    pub prior: MoveStats,
    pub tenuki_prior: MoveStats,
    pub mq_merge_groups: bool,
    pub counterattack: Counterattack,
    pub eval: EvalMode,
    pub tenuki: bool,
}

impl Default for LibmapConfig {
    fn default() -> Self {
        Self {
            pick_mode: PickMode::Threshold,
            pick_threshold: DEFAULT_PICK_THRESHOLD,
            pick_epsilon: DEFAULT_PICK_EPSILON,
            avoid_bad: false,
            explore_p: DEFAULT_EXPLORE_P,
            prior: MoveStats::new(DEFAULT_PRIOR.0, DEFAULT_PRIOR.1),
            tenuki_prior: MoveStats::new(DEFAULT_TENUKI_PRIOR.0, DEFAULT_TENUKI_PRIOR.1),
            mq_merge_groups: true,
            counterattack: Counterattack::ALL,
            eval: EvalMode::LocalValue,
            tenuki: false,
        }
    }
}

fn parse_value<T: FromStr>(option: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        option,
        value: value.to_string(),
    })
}

/// Like [`parse_value`], but NaN and infinities are rejected too.
fn parse_float(option: &'static str, value: &str) -> Result<f64, ConfigError> {
    let v: f64 = parse_value(option, value)?;
    if !v.is_finite() {
        return Err(ConfigError::InvalidValue {
            option,
            value: value.to_string(),
        });
    }
    Ok(v)
}

/// Flags accept a bare name (on) or `=N` (on unless zero).
fn parse_flag(option: &'static str, value: Option<&str>) -> Result<bool, ConfigError> {
    match value {
        None => Ok(true),
        Some(v) => Ok(parse_value::<i64>(option, v)? != 0),
    }
}

/// Priors are written `VALUExPLAYOUTS`, e.g. `0.5x1`.
fn parse_prior(option: &'static str, value: &str) -> Result<MoveStats, ConfigError> {
    let (v, p) = value
        .split_once('x')
        .ok_or_else(|| ConfigError::InvalidValue {
            option,
            value: value.to_string(),
        })?;
    Ok(MoveStats::new(parse_float(option, v)?, parse_value(option, p)?))
}

impl LibmapConfig {
    /// Parse an option string on top of the defaults.
    pub fn parse(spec: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let spec = spec.strip_suffix(':').unwrap_or(spec);
        if spec.is_empty() {
            return Ok(config);
        }

        for optspec in spec.split(':') {
            let (name, value) = match optspec.split_once('=') {
                Some((n, v)) => (n, Some(v)),
                None => (optspec, None),
            };
            let name = name.to_ascii_lowercase();
            match (name.as_str(), value) {
                ("pick_mode", Some(v)) => {
                    config.pick_mode = match v.to_ascii_lowercase().as_str() {
                        "threshold" => PickMode::Threshold,
                        "ucb" => PickMode::Ucb,
                        _ => {
                            return Err(ConfigError::InvalidValue {
                                option: "pick_mode",
                                value: v.to_string(),
                            });
                        }
                    };
                }
                ("pick_threshold", Some(v)) => {
                    config.pick_threshold = parse_float("pick_threshold", v)?
                }
                ("pick_epsilon", Some(v)) => config.pick_epsilon = parse_value("pick_epsilon", v)?,
                ("avoid_bad", v) => config.avoid_bad = parse_flag("avoid_bad", v)?,
                ("explore_p", Some(v)) => config.explore_p = parse_float("explore_p", v)?,
                ("prior", Some(v)) => config.prior = parse_prior("prior", v)?,
                ("tenuki_prior", Some(v)) => config.tenuki_prior = parse_prior("tenuki_prior", v)?,
                ("mq_merge_groups", v) => {
                    config.mq_merge_groups = parse_flag("mq_merge_groups", v)?
                }
                ("counterattack", Some(v)) => {
                    // Several framings make little sense with mq_merge_groups,
                    // but the flags are honored as given.
                    if let Some(bad) = v.chars().find(|c| !matches!(c, 'd' | 'a' | 'x')) {
                        return Err(ConfigError::InvalidValue {
                            option: "counterattack",
                            value: bad.to_string(),
                        });
                    }
                    config.counterattack = Counterattack {
                        defense: v.contains('d'),
                        attack: v.contains('a'),
                        defense_attack: v.contains('x'),
                    };
                }
                ("eval", Some(v)) => {
                    config.eval = match v.to_ascii_lowercase().as_str() {
                        "local" => EvalMode::Local,
                        "lvalue" => EvalMode::LocalValue,
                        "global" => EvalMode::Global,
                        _ => {
                            return Err(ConfigError::InvalidValue {
                                option: "eval",
                                value: v.to_string(),
                            });
                        }
                    };
                }
                ("tenuki", v) => config.tenuki = parse_flag("tenuki", v)?,
                _ => return Err(ConfigError::UnknownOption(name)),
            }
        }
        Ok(config)
    }
}

impl FromStr for LibmapConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for LibmapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pick_mode = match self.pick_mode {
            PickMode::Threshold => "threshold",
            PickMode::Ucb => "ucb",
        };
        let eval = match self.eval {
            EvalMode::Local => "local",
            EvalMode::LocalValue => "lvalue",
            EvalMode::Global => "global",
        };
        let mut ca = String::new();
        if self.counterattack.defense {
            ca.push('d');
        }
        if self.counterattack.attack {
            ca.push('a');
        }
        if self.counterattack.defense_attack {
            ca.push('x');
        }
        write!(
            f,
            "pick_mode={pick_mode}:pick_threshold={}:pick_epsilon={}:avoid_bad={}:\
             explore_p={}:prior={}x{}:tenuki_prior={}x{}:mq_merge_groups={}:\
             counterattack={ca}:eval={eval}:tenuki={}",
            self.pick_threshold,
            self.pick_epsilon,
            u8::from(self.avoid_bad),
            self.explore_p,
            self.prior.value,
            self.prior.playouts,
            self.tenuki_prior.value,
            self.tenuki_prior.playouts,
            u8::from(self.mq_merge_groups),
            u8::from(self.tenuki),
        )
    }
}
