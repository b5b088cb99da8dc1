//! Parameter bounds and file limits.
//!
//! [`ServiceLimits`] is resolved once at startup from built-in defaults and an
//! optional override file, then shared read-only by every request. The same
//! structure is published to clients so they can pre-validate input.

use std::path::Path;

use figment::{
    Figment,
    providers::{Format, Json, Serialized},
};
use serde::{Deserialize, Serialize};

use crate::action::{BridgeEndplay, Castles, Drones, SimpleVoting, TianJi};

/// Sentinel disabling a bound or limit.
pub const UNLIMITED: i64 = -1;

/// Default byte ceiling for model and mapping files.
pub const DEFAULT_MAX_FILE_SIZE_BYTES: i64 = 256 * 1024;
/// Default ceiling for every counted model-file quantity.
pub const DEFAULT_MAX_COUNT: i64 = 100;

/// Whether `value` is below a lower bound that is not [`UNLIMITED`].
#[must_use]
pub const fn below_min(value: i64, min: i64) -> bool { min != UNLIMITED && value < min }

/// Whether `value` is above an upper bound that is not [`UNLIMITED`].
#[must_use]
pub const fn above_max(value: i64, max: i64) -> bool { max != UNLIMITED && value > max }

/// Inclusive bounds for one model family, shaped like its parameters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyBounds<P> {
    /// Lower bounds per field.
    pub min: P,
    /// Upper bounds per field.
    pub max: P,
}

impl<P> FamilyBounds<P> {
    /// Pair lower and upper bounds.
    pub const fn new(min: P, max: P) -> Self { Self { min, max } }
}

/// Bounds for every parametric model family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundsConfig {
    /// Bridge endplay bounds.
    pub bridge_endplay: FamilyBounds<BridgeEndplay>,
    /// Castles bounds.
    pub castles: FamilyBounds<Castles>,
    /// Drones bounds.
    pub drones: FamilyBounds<Drones>,
    /// Simple voting bounds.
    pub simple_voting: FamilyBounds<SimpleVoting>,
    /// Tian Ji bounds.
    pub tian_ji: FamilyBounds<TianJi>,
}

impl Default for BoundsConfig {
    fn default() -> Self {
        Self {
            bridge_endplay: FamilyBounds::new(
                BridgeEndplay {
                    deck_size: 1,
                    cards_in_hand: 1,
                },
                BridgeEndplay {
                    deck_size: 15,
                    cards_in_hand: 2,
                },
            ),
            castles: FamilyBounds::new(
                Castles {
                    castle1_size: 1,
                    castle2_size: 1,
                    castle3_size: 1,
                    life: 1,
                },
                Castles {
                    castle1_size: 2,
                    castle2_size: 2,
                    castle3_size: 2,
                    life: 2,
                },
            ),
            drones: FamilyBounds::new(
                Drones {
                    number_of_drones: 1,
                    initial_energy: 1,
                },
                Drones {
                    number_of_drones: 2,
                    initial_energy: 3,
                },
            ),
            simple_voting: FamilyBounds::new(
                SimpleVoting {
                    voters: 1,
                    candidates: 1,
                },
                SimpleVoting {
                    voters: 2,
                    candidates: 3,
                },
            ),
            tian_ji: FamilyBounds::new(TianJi { horses: 1 }, TianJi { horses: 4 }),
        }
    }
}

/// Limits applied to model description files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelFileLimits {
    /// Maximum file length in bytes.
    pub max_file_size_bytes: i64,
    /// Maximum number of agent declarations.
    pub max_number_of_agent_types: i64,
    /// Maximum instance count of one agent declaration.
    pub max_number_of_agents_per_type: i64,
    /// Maximum instance count summed over all declarations.
    pub max_number_of_agents_total: i64,
    /// Maximum number of distinct states.
    pub max_number_of_states: i64,
    /// Maximum number of transitions.
    pub max_number_of_transitions: i64,
    /// Maximum `COALITION` entries.
    pub max_coalition_size: i64,
    /// Maximum `PERSISTENT` entries.
    pub max_number_of_persistent_variables: i64,
    /// Maximum `REDUCTION` entries.
    pub max_number_of_reduction_variables: i64,
    /// Maximum `GOAL` entries.
    pub max_number_of_goal_variables: i64,
}

impl Default for ModelFileLimits {
    fn default() -> Self {
        Self {
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            max_number_of_agent_types: DEFAULT_MAX_COUNT,
            max_number_of_agents_per_type: DEFAULT_MAX_COUNT,
            max_number_of_agents_total: DEFAULT_MAX_COUNT,
            max_number_of_states: DEFAULT_MAX_COUNT,
            max_number_of_transitions: DEFAULT_MAX_COUNT,
            max_coalition_size: DEFAULT_MAX_COUNT,
            max_number_of_persistent_variables: DEFAULT_MAX_COUNT,
            max_number_of_reduction_variables: DEFAULT_MAX_COUNT,
            max_number_of_goal_variables: DEFAULT_MAX_COUNT,
        }
    }
}

/// Limits applied to bisimulation mapping files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingFileLimits {
    /// Maximum file length in bytes.
    pub max_file_size_bytes: i64,
    /// Maximum number of mapping lines.
    pub max_number_of_mappings: i64,
}

impl Default for MappingFileLimits {
    fn default() -> Self {
        Self {
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            max_number_of_mappings: DEFAULT_MAX_COUNT,
        }
    }
}

/// Every bound and limit enforced before the engine runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceLimits {
    /// Numeric bounds of the parametric model families.
    pub parameterized_models: BoundsConfig,
    /// Model-file limits.
    pub file_model: ModelFileLimits,
    /// Mapping-file limits.
    pub mapping_file: MappingFileLimits,
}

impl ServiceLimits {
    /// Build the figment that resolves the limits.
    ///
    /// Built-in defaults are merged with the override file when one is given.
    /// Files ending in `.json` are read as JSON; any other file is read with
    /// the format enabled by the crate features (TOML by default).
    #[must_use]
    pub fn figment(path: Option<&Path>) -> Figment {
        let figment = Figment::from(Serialized::defaults(Self::default()));
        match path {
            Some(path) => merge_file(figment, path),
            None => figment,
        }
    }

    /// Resolve the limits from defaults and an optional override file.
    ///
    /// # Errors
    ///
    /// Returns an error when the override file is missing, unreadable, or does
    /// not match the limits schema.
    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        if let Some(missing) = path.filter(|candidate| !candidate.is_file()) {
            return Err(figment::Error::from(format!(
                "limits file '{}' does not exist",
                missing.display()
            )));
        }
        Self::figment(path).extract()
    }
}

fn merge_file(figment: Figment, path: &Path) -> Figment {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        return figment.merge(Json::file_exact(path));
    }
    merge_text_config(figment, path)
}

#[cfg(feature = "toml")]
fn merge_text_config(figment: Figment, path: &Path) -> Figment {
    figment.merge(figment::providers::Toml::file_exact(path))
}

#[cfg(all(feature = "yaml", not(feature = "toml")))]
fn merge_text_config(figment: Figment, path: &Path) -> Figment {
    figment.merge(figment::providers::Yaml::file_exact(path))
}

#[cfg(not(any(feature = "toml", feature = "yaml")))]
fn merge_text_config(figment: Figment, path: &Path) -> Figment { figment.merge(Json::file_exact(path)) }
