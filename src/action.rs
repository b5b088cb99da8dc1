//! Request types accepted by the compute API.
//!
//! The JSON form is internally tagged: every action and every model parameter
//! set carries a `type` field in camelCase, e.g.
//! `{"type": "dominoDfs", "modelParameters": {"type": "tianJi", "horses": 3},
//! "heuristic": "epistemic"}`.

use serde::{Deserialize, Serialize};

/// A model supplied as raw model-file text.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileModel {
    /// Raw model description text.
    pub model_string: String,
}

impl FileModel {
    /// Wrap raw model text.
    pub fn new(model_string: impl Into<String>) -> Self {
        Self {
            model_string: model_string.into(),
        }
    }
}

/// Parameters of the bridge endplay family.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeEndplay {
    /// Number of cards in the deck.
    pub deck_size: i64,
    /// Number of cards dealt to each hand.
    pub cards_in_hand: i64,
}

/// Parameters of the castles family.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Castles {
    /// Workers defending the first castle.
    pub castle1_size: i64,
    /// Workers defending the second castle.
    pub castle2_size: i64,
    /// Workers defending the third castle.
    pub castle3_size: i64,
    /// Hit points of each castle.
    pub life: i64,
}

/// Parameters of the drones family.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Drones {
    /// Number of drones.
    pub number_of_drones: i64,
    /// Energy each drone starts with.
    pub initial_energy: i64,
}

/// Parameters of the simple voting family.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleVoting {
    /// Number of voters.
    pub voters: i64,
    /// Number of candidates.
    pub candidates: i64,
}

/// Parameters of the Tian Ji horse-racing family.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TianJi {
    /// Horses per player.
    pub horses: i64,
}

/// The model an action operates on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ModelParameters {
    /// A model described by model-file text.
    File(FileModel),
    /// A generated bridge endplay model.
    BridgeEndplay(BridgeEndplay),
    /// A generated castles model.
    Castles(Castles),
    /// A generated drones model.
    Drones(Drones),
    /// A generated simple voting model.
    SimpleVoting(SimpleVoting),
    /// A generated Tian Ji model.
    TianJi(TianJi),
}

/// Search heuristic for the DominoDFS strategy synthesis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Heuristic {
    /// Plain depth-first order.
    Basic,
    /// Prefer controlled transitions.
    Control,
    /// Prefer epistemically distinguishing transitions.
    Epistemic,
    /// Prefer states visited least often.
    VisitedStates,
}

impl Heuristic {
    /// Numeric code understood by the engine.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Basic => 0,
            Self::Control => 1,
            Self::Epistemic => 2,
            Self::VisitedStates => 3,
        }
    }
}

/// A compute request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Action {
    /// Check whether a mapping is a bisimulation between two models.
    BisimulationChecking {
        /// First model.
        #[serde(rename = "model1Parameters", alias = "model1")]
        model1: FileModel,
        /// Second model.
        #[serde(rename = "model2Parameters", alias = "model2")]
        model2: FileModel,
        /// Mapping file relating the two models.
        specification: FileModel,
    },
    /// Generate the global models used for bisimulation checking.
    BisimulationModelsGeneration {
        /// First model.
        #[serde(rename = "model1Parameters", alias = "model1")]
        model1: FileModel,
        /// Second model.
        #[serde(rename = "model2Parameters", alias = "model2")]
        model2: FileModel,
    },
    /// Synthesize a strategy with DominoDFS.
    DominoDfs {
        /// Model to search.
        model_parameters: ModelParameters,
        /// Search heuristic.
        heuristic: Heuristic,
    },
    /// Verify with the lower approximation.
    LowerApproximation {
        /// Model to verify.
        model_parameters: ModelParameters,
    },
    /// Verify with the upper approximation.
    UpperApproximation {
        /// Model to verify.
        model_parameters: ModelParameters,
    },
    /// Generate the global model.
    ModelGeneration {
        /// Model to generate.
        model_parameters: ModelParameters,
        /// Generate the reduced model instead of the full one.
        #[serde(default)]
        reduced: bool,
    },
}
