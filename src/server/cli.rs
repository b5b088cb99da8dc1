//! Command-line and configuration loading for the gateway binary.
//!
//! The clap and `OrthoConfig` types live in the `cli-defs` crate so the build
//! script can render the man page without compiling the service. This module
//! layers environment variables and the `.stvd.toml` dotfile over the parsed
//! flags.

use std::ffi::OsString;

use anyhow::{Result, anyhow};
use clap::{CommandFactory, Parser};
use ortho_config::OrthoConfig;
pub use cli_defs::{AppConfig, Cli, Commands, FileArgs};

/// Configuration merged from every source, plus the optional subcommand.
#[derive(Debug, Clone)]
pub struct ResolvedCli {
    /// Merged runtime configuration.
    pub config: AppConfig,
    /// Subcommand to run instead of the daemon.
    pub command: Option<Commands>,
}

/// Parse the process arguments and merge configuration sources.
///
/// # Errors
///
/// Returns an error when the environment or dotfile configuration is invalid.
pub fn load_cli() -> Result<ResolvedCli> { load_cli_from(std::env::args_os()) }

/// Parse `args` and merge configuration sources.
///
/// Flags win over `STVD_*` environment variables, which win over the
/// `.stvd.toml` dotfile.
///
/// # Errors
///
/// Returns an error when the environment or dotfile configuration is invalid.
pub fn load_cli_from<I, T>(args: I) -> Result<ResolvedCli>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let argv: Vec<OsString> = args.into_iter().map(Into::into).collect();
    let cli = Cli::parse_from(&argv);
    let config = AppConfig::load_from_iter(global_args(&argv))
        .map_err(|err| anyhow!("failed to load configuration: {err}"))?;
    Ok(ResolvedCli {
        config,
        command: cli.command,
    })
}

/// Arguments preceding the subcommand, which are the only ones
/// [`AppConfig`] understands.
fn global_args(args: &[OsString]) -> Vec<OsString> {
    let cli = Cli::command();
    let subcommands: Vec<&str> = cli.get_subcommands().map(clap::Command::get_name).collect();
    args.iter()
        .take_while(|arg| !arg.to_str().is_some_and(|name| subcommands.contains(&name)))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use figment::Jail;
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn env_config_loading() {
        Jail::expect_with(|j| {
            j.set_env("STVD_BIND", "127.0.0.1:8000");
            j.set_env("STVD_ENGINE_PROGRAM", "/opt/stv/engine");
            let cfg = AppConfig::load_from_iter(["stvd"]).expect("load");
            assert_eq!(cfg.bind, "127.0.0.1:8000");
            assert_eq!(cfg.engine_program, "/opt/stv/engine");
            Ok(())
        });
    }

    #[rstest]
    fn cli_overrides_env() {
        Jail::expect_with(|j| {
            j.set_env("STVD_MAX_EXECUTION_TIME_SECONDS", "10");
            let cfg = AppConfig::load_from_iter(["stvd", "--max-execution-time-seconds", "0"])
                .expect("load");
            assert_eq!(cfg.max_execution_time_seconds, 0);
            Ok(())
        });
    }

    #[rstest]
    fn loads_from_dotfile() {
        Jail::expect_with(|j| {
            j.create_file(".stvd.toml", "bind = \"1.2.3.4:1111\"")?;
            let cfg = AppConfig::load_from_iter(["stvd"]).expect("load");
            assert_eq!(cfg.bind, "1.2.3.4:1111");
            Ok(())
        });
    }

    #[rstest]
    fn subcommand_is_split_from_global_flags() {
        Jail::expect_with(|_j| {
            let resolved =
                load_cli_from(["stvd", "--bind", "127.0.0.1:4000", "show-limits"]).expect("load");
            assert_eq!(resolved.config.bind, "127.0.0.1:4000");
            assert!(matches!(resolved.command, Some(Commands::ShowLimits)));
            Ok(())
        });
    }

    #[rstest]
    fn subcommand_arguments_do_not_reach_config() {
        let args: Vec<OsString> = ["stvd", "--limits", "l.toml", "plan", "action.json"]
            .into_iter()
            .map(OsString::from)
            .collect();
        assert_eq!(Some(global_args(&args).as_slice()), args.get(..3));
    }
}
