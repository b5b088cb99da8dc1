//! Translate validated actions into engine invocations.
//!
//! [`translate`] is the only way to obtain an [`InvocationDescriptor`], and it
//! validates every file and parameter before building the argument vector.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::Serialize;

use crate::{
    action::{Action, FileModel, Heuristic, ModelParameters},
    config::{BoundsConfig, ServiceLimits},
    error::StructuredError,
    validation::{Parametric, check_bounds, validate_mapping_file, validate_model_file},
};

/// File identifier of the model in single-model actions.
pub const MODEL_FILE_ID: &str = "model";
/// File identifier of the first bisimulation model.
pub const MODEL1_FILE_ID: &str = "model1";
/// File identifier of the second bisimulation model.
pub const MODEL2_FILE_ID: &str = "model2";
/// File identifier of the bisimulation mapping.
pub const SPECIFICATION_FILE_ID: &str = "specification";

/// Engine entry points.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineName {
    /// Bisimulation checking and model generation.
    Bisimulation,
    /// Bridge endplay models.
    Bridge,
    /// Castles models.
    Castles,
    /// Drone models.
    Drone,
    /// Models read from model-file text.
    Global,
    /// Tian Ji models.
    TianJi,
    /// Simple voting models.
    Voting,
}

impl EngineName {
    /// Name passed as the first engine argument.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bisimulation => "bisimulation",
            Self::Bridge => "bridge",
            Self::Castles => "castles",
            Self::Drone => "drone",
            Self::Global => "global",
            Self::TianJi => "tian_ji",
            Self::Voting => "voting",
        }
    }
}

impl std::fmt::Display for EngineName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

/// Engine operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    /// Check a bisimulation mapping.
    Check,
    /// Run DominoDFS strategy synthesis.
    Domino,
    /// Generate models.
    Run,
    /// Verify with an approximation.
    Verify,
}

impl Method {
    /// Name passed as the second engine argument.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Check => "check",
            Self::Domino => "domino",
            Self::Run => "run",
            Self::Verify => "verify",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

/// A fully resolved engine invocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InvocationDescriptor {
    /// Engine entry point.
    pub engine: EngineName,
    /// Engine operation.
    pub method: Method,
    /// Positional arguments following the engine and method names.
    pub args: Vec<String>,
}

impl InvocationDescriptor {
    /// The complete argument vector: engine, method, then the arguments.
    #[must_use]
    pub fn into_argv(self) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.args.len() + 2);
        argv.push(self.engine.as_str().to_owned());
        argv.push(self.method.as_str().to_owned());
        argv.extend(self.args);
        argv
    }
}

/// Encode model text for the engine command line.
#[must_use]
pub fn encode_model(model: &str) -> String { STANDARD.encode(model.as_bytes()) }

/// Validate `action` and build its engine invocation.
///
/// # Errors
///
/// Returns the first validation failure; no descriptor is built in that case.
pub fn translate(action: &Action, limits: &ServiceLimits) -> Result<InvocationDescriptor, StructuredError> {
    match action {
        Action::BisimulationChecking {
            model1,
            model2,
            specification,
        } => {
            let encoded1 = checked_model(MODEL1_FILE_ID, model1, limits)?;
            let encoded2 = checked_model(MODEL2_FILE_ID, model2, limits)?;
            validate_mapping_file(
                SPECIFICATION_FILE_ID,
                &specification.model_string,
                &limits.mapping_file,
            )?;
            Ok(InvocationDescriptor {
                engine: EngineName::Bisimulation,
                method: Method::Check,
                args: vec![encoded1, encoded2, encode_model(&specification.model_string)],
            })
        }
        Action::BisimulationModelsGeneration { model1, model2 } => {
            let encoded1 = checked_model(MODEL1_FILE_ID, model1, limits)?;
            let encoded2 = checked_model(MODEL2_FILE_ID, model2, limits)?;
            Ok(InvocationDescriptor {
                engine: EngineName::Bisimulation,
                method: Method::Run,
                args: vec![encoded1, encoded2],
            })
        }
        Action::DominoDfs {
            model_parameters,
            heuristic,
        } => parameterized(model_parameters, false, limits, Method::Domino, Some(heuristic_arg(*heuristic))),
        Action::LowerApproximation { model_parameters } => {
            parameterized(model_parameters, false, limits, Method::Verify, Some("1".to_owned()))
        }
        Action::UpperApproximation { model_parameters } => {
            parameterized(model_parameters, false, limits, Method::Verify, Some("0".to_owned()))
        }
        Action::ModelGeneration {
            model_parameters,
            reduced,
        } => parameterized(model_parameters, *reduced, limits, Method::Run, None),
    }
}

fn heuristic_arg(heuristic: Heuristic) -> String { heuristic.code().to_string() }

fn checked_model(file_id: &str, model: &FileModel, limits: &ServiceLimits) -> Result<String, StructuredError> {
    validate_model_file(file_id, &model.model_string, &limits.file_model)?;
    Ok(encode_model(&model.model_string))
}

fn parameterized(
    parameters: &ModelParameters,
    reduced: bool,
    limits: &ServiceLimits,
    method: Method,
    suffix: Option<String>,
) -> Result<InvocationDescriptor, StructuredError> {
    let (engine, mut args) = model_args(parameters, reduced, limits)?;
    args.extend(suffix);
    Ok(InvocationDescriptor {
        engine,
        method,
        args,
    })
}

fn model_args(
    parameters: &ModelParameters,
    reduced: bool,
    limits: &ServiceLimits,
) -> Result<(EngineName, Vec<String>), StructuredError> {
    let bounds = &limits.parameterized_models;
    match parameters {
        ModelParameters::File(model) => {
            let mode = if reduced { "reduced" } else { "global" };
            let encoded = checked_model(MODEL_FILE_ID, model, limits)?;
            Ok((EngineName::Global, vec![mode.to_owned(), encoded]))
        }
        ModelParameters::BridgeEndplay(params) => family_args(EngineName::Bridge, params, bounds),
        ModelParameters::Castles(params) => family_args(EngineName::Castles, params, bounds),
        ModelParameters::Drones(params) => family_args(EngineName::Drone, params, bounds),
        ModelParameters::SimpleVoting(params) => family_args(EngineName::Voting, params, bounds),
        ModelParameters::TianJi(params) => family_args(EngineName::TianJi, params, bounds),
    }
}

fn family_args<P: Parametric>(
    engine: EngineName,
    params: &P,
    bounds: &BoundsConfig,
) -> Result<(EngineName, Vec<String>), StructuredError> {
    check_bounds(params, bounds)?;
    let args = params
        .fields()
        .into_iter()
        .map(|field| field.value.to_string())
        .collect();
    Ok((engine, args))
}
