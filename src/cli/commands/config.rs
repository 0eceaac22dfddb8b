use anyhow::{Context, Result};
use clap::Subcommand;

use crate::cli::output::{Formatter, get_formatter};
use crate::models::{API_KEY_ENV_VARS, Config, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    #[command(about = "Write a configuration file with default values")]
    Init {
        #[arg(long, short = 'f', help = "Force overwrite existing config")]
        force: bool,
    },
    #[command(about = "Show current configuration")]
    Show,
    #[command(about = "Show configuration file paths")]
    Path {
        #[arg(long, help = "Show all possible config paths")]
        all: bool,
    },
}

pub async fn handle_config(cmd: ConfigCommand, format: OutputFormat, _verbose: bool) -> Result<()> {
    let formatter = get_formatter(format);

    match cmd {
        ConfigCommand::Init { force } => handle_init(force, formatter.as_ref()),
        ConfigCommand::Show => handle_show(format),
        ConfigCommand::Path { all } => handle_path(all),
    }
}

fn handle_init(force: bool, formatter: &dyn Formatter) -> Result<()> {
    let config_path = Config::config_path()
        .ok_or_else(|| anyhow::anyhow!("could not determine config directory"))?;

    if config_path.exists() && !force {
        anyhow::bail!(
            "Config already exists at: {}\nUse --force to overwrite.",
            config_path.display()
        );
    }

    let path = Config::default()
        .save()
        .context("failed to create config")?;
    print!(
        "{}",
        formatter.format_message(&format!("Created config at: {}", path.display()))
    );
    Ok(())
}

fn handle_show(format: OutputFormat) -> Result<()> {
    let config = Config::load()?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    match Config::config_path() {
        Some(path) if path.exists() => println!("# Config file: {}", path.display()),
        _ => println!("# No config file; showing defaults"),
    }
    let key_state = if config.embedding.api_key.is_some() {
        "set"
    } else {
        "not set"
    };
    println!("# API key: {key_state}");
    println!();
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

fn handle_path(show_all: bool) -> Result<()> {
    let config_path = Config::config_path();

    println!("Configuration paths:");
    println!();

    if let Some(ref path) = config_path {
        if path.exists() {
            println!("Config file (active): {}", path.display());
        } else {
            println!("Config file (would be): {}", path.display());
        }
    }

    if show_all {
        if let Ok(cwd) = std::env::current_dir() {
            let env_path = cwd.join(".env");
            if env_path.exists() {
                println!(".env file (active): {}", env_path.display());
            } else {
                println!(".env file (would be): {}", env_path.display());
            }
        }
        println!("API key variables: {}", API_KEY_ENV_VARS.join(", "));
    }

    Ok(())
}
