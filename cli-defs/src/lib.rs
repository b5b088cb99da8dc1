//! Shared CLI type definitions for stvd build and runtime.
//!
//! This crate provides CLI argument and configuration types used by both the
//! `build.rs` script (for man page generation) and the runtime binary.
//! Keeping them apart from the service crate means the build script does not
//! pull in the HTTP stack or the engine gateway.

// FIXME: File-wide suppressions are unavoidable here. Clap and OrthoConfig derive macros
// inject generated code throughout the module, and there is no mechanism to narrow
// the scope without restructuring the crate.
#![expect(
    non_snake_case,
    reason = "Clap/OrthoConfig derive macros generate helper modules with uppercase names"
)]
#![expect(
    missing_docs,
    reason = "OrthoConfig and Clap derive macros generate items that cannot be documented"
)]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

/// Default listening address of the HTTP gateway.
pub const DEFAULT_BIND: &str = "0.0.0.0:3000";
/// Default interpreter used to launch the engine.
pub const DEFAULT_ENGINE_PROGRAM: &str = "python3";
/// Default engine entry script, relative to the working directory.
pub const DEFAULT_ENGINE_SCRIPT: &str = "../stv-compute/gui.py";
/// Default wall-clock ceiling for one engine run, in seconds.
pub const DEFAULT_MAX_EXECUTION_TIME_SECONDS: u64 = 3;

/// Arguments naming a single input file.
#[derive(Args, Deserialize, Serialize, Default, Debug, Clone)]
pub struct FileArgs {
    /// Path of the file to read.
    pub path: PathBuf,
}

/// CLI subcommands exposed by `stvd`.
#[derive(Subcommand, Deserialize, Serialize, Debug, Clone)]
pub enum Commands {
    /// Validate a model description file against the configured limits.
    #[command(name = "validate-model")]
    ValidateModel(FileArgs),
    /// Validate a bisimulation mapping file against the configured limits.
    #[command(name = "validate-mapping")]
    ValidateMapping(FileArgs),
    /// Print the active parameter bounds and file limits as JSON.
    #[command(name = "show-limits")]
    ShowLimits,
    /// Translate a JSON action into the engine argument vector without running it.
    #[command(name = "plan")]
    Plan(FileArgs),
}

/// Runtime configuration shared by all binaries.
///
/// The default bind address `0.0.0.0:3000` listens on all interfaces. Put the
/// gateway behind a reverse proxy when exposing it beyond localhost.
#[derive(Args, OrthoConfig, Serialize, Deserialize, Default, Debug, Clone)]
#[ortho_config(prefix = "STVD_")]
pub struct AppConfig {
    /// HTTP bind address.
    #[ortho_config(default = DEFAULT_BIND.to_owned())]
    #[arg(long, default_value_t = String::from(DEFAULT_BIND))]
    pub bind: String,
    /// Program used to launch the engine.
    #[ortho_config(default = DEFAULT_ENGINE_PROGRAM.to_owned())]
    #[arg(long, default_value_t = String::from(DEFAULT_ENGINE_PROGRAM))]
    pub engine_program: String,
    /// Script passed to the engine program before the engine arguments.
    /// Leave empty when the program is the engine itself.
    #[ortho_config(default = DEFAULT_ENGINE_SCRIPT.to_owned())]
    #[arg(long, default_value_t = String::from(DEFAULT_ENGINE_SCRIPT))]
    pub engine_script: String,
    /// Wall-clock ceiling for one engine run; zero disables the ceiling.
    #[ortho_config(default = DEFAULT_MAX_EXECUTION_TIME_SECONDS)]
    #[arg(long, default_value_t = DEFAULT_MAX_EXECUTION_TIME_SECONDS)]
    pub max_execution_time_seconds: u64,
    /// Optional file overriding the parameter bounds and file limits.
    #[arg(long)]
    pub limits: Option<String>,
}

/// Top-level CLI entry point consumed by binaries.
#[derive(Parser, Deserialize, Serialize, Debug, Clone)]
#[command(name = "stvd", author, version, about)]
pub struct Cli {
    /// Application configuration.
    #[command(flatten)]
    pub config: AppConfig,
    /// Optional subcommand.
    #[command(subcommand)]
    pub command: Option<Commands>,
}
