use clap::{Parser, Subcommand};
use imgix_url::effects::{Effect, params_to_effects, translate};
use imgix_url::presets::{Preset, parse_query};
use imgix_url::{config, output};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    let on_tag = env!("IMGIX_URL_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("IMGIX_URL_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "imgix-url")]
#[command(about = "Build imgix CDN URLs from file locations, presets and effect chains")]
#[command(long_about = "\
Build imgix CDN URLs from file locations, presets and effect chains

Configuration lives in a TOML file with a [settings] table describing the
imgix source and [presets.<key>] tables holding named parameter sets:

  [settings]
  source_domain = \"example.imgix.net\"
  mapping_type = \"s3\"          # webfolder | webproxy | s3 | gcs

  [presets.thumb]
  key = \"thumb\"
  query = \"w=150&h=150&fit=crop&crop=entropy\"

Override files (--override) are merged on top, later files winning.

Run 'imgix-url gen-config' to generate a documented config file.")]
#[command(version = version_string())]
struct Cli {
    /// Base configuration file
    #[arg(long, default_value = "imgix.toml", global = true)]
    config: PathBuf,

    /// Override file merged on top of the base (repeatable)
    #[arg(long = "override", global = true)]
    overrides: Vec<PathBuf>,

    /// Log decisions to stderr (same as IMGIX_URL_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the imgix URL for a file's public URL
    Url {
        file_url: String,
        /// Start from this preset's parameters
        #[arg(long)]
        preset: Option<String>,
        /// Extra parameter, applied after the preset (repeatable)
        #[arg(long = "param", value_parser = parse_key_value)]
        params: Vec<(String, String)>,
    },
    /// Translate an effect chain (JSON array) into imgix parameters
    Translate { effects_json: String },
    /// Reverse an imgix query string into a weighted effect chain
    Effects { query: String },
    /// List, inspect and edit presets in the base config file
    #[command(subcommand)]
    Preset(PresetCommand),
    /// Validate configuration and print a summary
    Check,
    /// Print a stock config file with all options documented
    GenConfig,
}

#[derive(Subcommand)]
enum PresetCommand {
    /// List all presets
    List,
    /// Show one preset with its parameters and effects
    Show { key: String },
    /// Add a preset to the base config file
    Add { key: String, query: String },
    /// Remove a preset from the base config file
    Remove { key: String },
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Url {
            file_url,
            preset,
            params,
        } => {
            let config = config::load_config(&cli.config, &cli.overrides)?;
            let mut merged = match preset {
                Some(key) => config.presets.resolve(&key)?,
                None => Default::default(),
            };
            for (key, value) in params {
                merged.insert(key, value);
            }
            if let Some(url) = config.service().build_url(&file_url, &merged) {
                println!("{}", url);
            }
        }
        Command::Translate { effects_json } => {
            let effects: Vec<Effect> = serde_json::from_str(&effects_json)?;
            output::print_params(&translate(&effects)?);
        }
        Command::Effects { query } => {
            let effects = params_to_effects(&parse_query(&query))?;
            println!("{}", serde_json::to_string_pretty(&effects)?);
        }
        Command::Preset(command) => run_preset(command, &cli.config, &cli.overrides)?,
        Command::Check => {
            println!("==> Checking {}", cli.config.display());
            let config = config::load_config(&cli.config, &cli.overrides)?;
            output::print_check_summary(&config);
            println!("==> Configuration is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Preset commands. Edits only touch the base file, so presets that come
/// from override files are never copied into it.
fn run_preset(
    command: PresetCommand,
    base: &Path,
    overrides: &[PathBuf],
) -> Result<(), Box<dyn std::error::Error>> {
    let no_overrides: &[PathBuf] = &[];
    match command {
        PresetCommand::List => {
            let config = config::load_config(base, overrides)?;
            output::print_preset_list(&config.presets);
        }
        PresetCommand::Show { key } => {
            let config = config::load_config(base, overrides)?;
            let preset = config
                .presets
                .get(&key)
                .ok_or_else(|| imgix_url::PresetError::NotFound(key.clone()))?;
            output::print_preset(preset);
        }
        PresetCommand::Add { key, query } => {
            let mut presets = config::load_config(base, no_overrides)?.presets;
            presets.create(Preset::new(key.as_str(), query))?;
            config::save_presets(base, &presets)?;
            println!("Added preset '{}' to {}", key, base.display());
        }
        PresetCommand::Remove { key } => {
            let mut presets = config::load_config(base, no_overrides)?.presets;
            presets.delete(&key)?;
            config::save_presets(base, &presets)?;
            println!("Removed preset '{}' from {}", key, base.display());
        }
    }
    Ok(())
}

/// Log to stderr. `IMGIX_URL_LOG` takes a filter directive; `-v` forces
/// debug output for this crate.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("imgix_url=debug")
    } else {
        EnvFilter::try_from_env("IMGIX_URL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
