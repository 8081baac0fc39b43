//! Resolve the build settings declared in a settings file against a command line.
//!
//! ```text
//! pb-settings SETTINGS.pb.toml --cfg string_list_delimiter=';' -- --//cc:opt_level=3 --nolto
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use pb_cfg::ConfigSet;
use pb_settings::defs::{SettingsSpec, SETTINGS_FILENAME};
use pb_settings::graph::InMemoryGraph;
use pb_settings::{Engine, EngineConfig, Lookup};
use tracing_subscriber::EnvFilter;

/// Exit code for invalid user input, e.g. a malformed flag value.
const EXIT_USER_ERROR: u8 = 2;
/// Exit code for a defect in the engine or its host, see `sysexits.h`.
const EXIT_INTERNAL_ERROR: u8 = 70;

/// Prefix of environment variables that override configs, e.g. `PB_CFG_FLAG_PREFIX=++`.
const CFG_ENV_PREFIX: &str = "PB_CFG_";

#[derive(Debug, Parser)]
#[command(name = "pb-settings", about = "Resolve build settings for a command line")]
struct Args {
    /// File that declares the build settings, and the targets label settings point at.
    settings_file: Option<PathBuf>,
    /// Override a config of the engine, e.g. `--cfg flag_prefix=++`.
    #[arg(long = "cfg", value_name = "NAME=VALUE")]
    cfgs: Vec<String>,
    /// Print the configs of the engine and exit.
    #[arg(long)]
    show_configs: bool,
    /// Name of the configuration the settings are resolved in.
    #[arg(long, default_value = "target")]
    configuration: String,
    /// Flags to resolve the settings against.
    #[arg(last = true)]
    flags: Vec<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_ansi(!pb_ore::env::is_truthy("NO_COLOR"))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

fn run(args: Args) -> Result<ExitCode, anyhow::Error> {
    let configs = configs(&args.cfgs)?;
    if args.show_configs {
        print!("{configs}");
        return Ok(ExitCode::SUCCESS);
    }

    let path = match args.settings_file {
        Some(path) => path,
        None => PathBuf::from(SETTINGS_FILENAME.read(&configs).as_str()),
    };
    tracing::info!(?path, "reading settings file");
    let raw = std::fs::read_to_string(&path)
        .map_err(|err| anyhow::anyhow!("failed to read {}: {err}", path.display()))?;
    let spec = SettingsSpec::from_toml(&raw)?;

    let graph = Arc::new(InMemoryGraph::new());
    spec.populate(&graph)?;
    let engine = Engine::new(EngineConfig {
        configs,
        graph: Arc::clone(&graph) as _,
    })?;
    let descriptors = spec.declare(&engine)?;

    let command_line = engine.parse_command_line(&args.flags)?;
    if !command_line.residue.is_empty() {
        eprintln!("error: unrecognized arguments: {}", command_line.residue.join(" "));
        return Ok(ExitCode::from(EXIT_USER_ERROR));
    }
    let key = engine.configuration(args.configuration, command_line.flags);

    let mut unresolved = 0;
    for descriptor in &descriptors {
        match engine.get(&key, descriptor)? {
            Lookup::Ready(entry) => {
                println!(
                    "{} = {} ({})",
                    descriptor.identity(),
                    entry.value,
                    entry.provenance
                );
            }
            Lookup::Pending(pending) => {
                unresolved += 1;
                let labels: Vec<_> = pending.iter().map(|r| r.label().to_string()).collect();
                println!(
                    "{} = <unresolved, no target for {}>",
                    descriptor.identity(),
                    labels.join(", ")
                );
            }
        }
    }

    tracing::debug!(stats = ?engine.store().stats(), "resolved settings");
    if unresolved > 0 {
        return Ok(ExitCode::from(EXIT_USER_ERROR));
    }
    Ok(ExitCode::SUCCESS)
}

/// Build the [`ConfigSet`] for the engine, applying overrides from the environment and then
/// from the command line.
fn configs(overrides: &[String]) -> Result<ConfigSet, anyhow::Error> {
    let mut builder = ConfigSet::builder();
    pb_settings::cfgs::all_cfgs(&mut builder);
    let configs = builder.build();

    let applied = configs.apply_env(CFG_ENV_PREFIX)?;
    tracing::debug!(applied, "applied config overrides from the environment");

    for item in overrides {
        let (name, value) = item
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("expected NAME=VALUE for --cfg, found '{item}'"))?;
        configs.try_update(name, value)?;
    }

    Ok(configs)
}

/// Internal defects are fatal, everything else is an error in the input.
fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<pb_settings::Error>() {
        Some(err) if err.is_internal() => EXIT_INTERNAL_ERROR,
        Some(_) => EXIT_USER_ERROR,
        None => 1,
    }
}
