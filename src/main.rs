use std::path::Path;
use std::process::ExitCode;

use tracing::{debug, info};

use feedmill::commands::{App, CommandRegistry, Invocation};
use feedmill::{Config, Database, Result};

/// Environment variable naming the configuration file.
const ENV_CONFIG_PATH: &str = "FEEDMILL_CONFIG";

/// Default configuration file.
const DEFAULT_CONFIG_PATH: &str = "feedmill.toml";

fn default_config() -> Config {
    let mut config = Config::default();
    config.apply_env_overrides();
    config
}

fn load_config() -> Config {
    let explicit = std::env::var(ENV_CONFIG_PATH).ok().filter(|p| !p.is_empty());
    let path = explicit.clone().unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let loaded = if explicit.is_some() || Path::new(&path).exists() {
        Config::load_with_env(&path)
            .map_err(|e| {
                eprintln!("Failed to load {path}: {e}");
                eprintln!("Using default configuration.");
            })
            .ok()
    } else {
        None
    };
    let mut config = loaded.unwrap_or_else(default_config);

    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {e}");
        eprintln!("Using default configuration.");
        config = default_config();
    }
    config
}

async fn run(config: Config, invocation: Invocation) -> Result<String> {
    let db = Database::open(&config.database.url).await?;
    let app = App::new(db, config)?;
    let registry = CommandRegistry::standard();

    tokio::select! {
        result = registry.dispatch(&app, &invocation) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, stopping {}", invocation.name);
            Ok(String::new())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = load_config();

    // Initialize logging
    if let Err(e) = feedmill::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        feedmill::logging::init_console_only(&config.logging.level);
    }

    let invocation = match Invocation::from_args(std::env::args().skip(1)) {
        Ok(invocation) => invocation,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    debug!("Using database {}", config.database.url);

    match run(config, invocation).await {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
