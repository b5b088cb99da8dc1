//! Offline subcommands.
//!
//! These run the same validators and translator as the HTTP endpoint against
//! local files, so operators can check inputs and inspect the engine argument
//! vector without starting the daemon or the engine.

#![expect(
    clippy::print_stdout,
    reason = "intentional user output for CLI commands"
)]

use std::path::Path;

use anyhow::{Context, Result, bail};

use super::{Commands, Settings};
use crate::{
    action::Action,
    dispatch::{MODEL_FILE_ID, SPECIFICATION_FILE_ID, translate},
    error::StructuredError,
    validation::{validate_mapping_file, validate_model_file},
};

/// Printable outcome of an offline subcommand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Report {
    /// Text written to stdout.
    pub output: String,
    /// Error type when the input was rejected.
    pub failure: Option<&'static str>,
}

impl Report {
    fn ok(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            failure: None,
        }
    }

    fn rejected(err: &StructuredError) -> Self {
        Self {
            output: err.to_json_value().to_string(),
            failure: Some(err.kind()),
        }
    }

    fn from_outcome<T>(
        outcome: Result<T, StructuredError>,
        render: impl FnOnce(T) -> Result<String>,
    ) -> Result<Self> {
        match outcome {
            Ok(value) => render(value).map(Self::ok),
            Err(err) => Ok(Self::rejected(&err)),
        }
    }
}

/// Execute an offline subcommand and print its report.
///
/// # Errors
///
/// Fails when the input file cannot be read or parsed, and when the input is
/// rejected by validation.
pub async fn run_command(command: Commands, settings: &Settings) -> Result<()> {
    let report = render_command(command, settings).await?;
    println!("{}", report.output);
    if let Some(kind) = report.failure {
        bail!("input rejected with {kind}");
    }
    Ok(())
}

/// Execute an offline subcommand and return its report without printing.
///
/// # Errors
///
/// Fails when the input file cannot be read, or when a `plan` file is not a
/// valid action.
pub async fn render_command(command: Commands, settings: &Settings) -> Result<Report> {
    let limits = &settings.limits;
    match command {
        Commands::ValidateModel(args) => {
            let content = read_input(&args.path).await?;
            let outcome = validate_model_file(MODEL_FILE_ID, &content, &limits.file_model);
            Report::from_outcome(outcome, |summary| {
                serde_json::to_string(&summary).context("failed to encode model summary")
            })
        }
        Commands::ValidateMapping(args) => {
            let content = read_input(&args.path).await?;
            let outcome = validate_mapping_file(SPECIFICATION_FILE_ID, &content, &limits.mapping_file);
            Report::from_outcome(outcome, |_| Ok("ok".to_owned()))
        }
        Commands::ShowLimits => {
            let published = serde_json::to_string_pretty(&settings.published())
                .context("failed to encode limits")?;
            Ok(Report::ok(published))
        }
        Commands::Plan(args) => {
            let content = read_input(&args.path).await?;
            let action: Action = serde_json::from_str(&content)
                .with_context(|| format!("'{}' is not a valid action", args.path.display()))?;
            Report::from_outcome(translate(&action, limits), |invocation| {
                serde_json::to_string(&invocation.into_argv()).context("failed to encode argv")
            })
        }
    }
}

async fn read_input(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read '{}'", path.display()))
}
