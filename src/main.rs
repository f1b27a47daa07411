mod access;
mod channels;
mod config;
mod core;
mod intent;
mod pipeline;
mod providers;
mod query;
mod state;
mod traits;
mod types;
pub mod utils;

#[cfg(test)]
mod testing;

use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = PathBuf::from("config.toml");

    // Handle CLI arguments
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 {
        match args[1].as_str() {
            "--version" | "-V" => {
                println!("voxlog {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" => {
                println!("voxlog {}", env!("CARGO_PKG_VERSION"));
                println!("{}\n", env!("CARGO_PKG_DESCRIPTION"));
                println!("Usage: voxlog [COMMAND]\n");
                println!("Commands:");
                println!("  check-config     Load and validate config.toml plus environment, then exit");
                println!("\nOptions:");
                println!("  -h, --help       Print help");
                println!("  -V, --version    Print version");
                println!("\nConfiguration is read from ./config.toml; empty values fall back to");
                println!("OPENAI_API_KEY, OPENAI_BASE_URL, OPENAI_MODEL, TELEGRAM_BOT_TOKEN and");
                println!("ELEVENLABS_API_KEY (a .env file is honoured).");
                return Ok(());
            }
            "check-config" => {
                let config = config::AppConfig::load(&config_path)?;
                println!("Config OK");
                println!("  model:       {}", config.provider.model);
                println!("  database:    {}", config.state.db_path);
                println!("  owner:       {}", config.access.owner_username);
                println!("  daily limit: {}", config.access.daily_limit);
                return Ok(());
            }
            other => {
                eprintln!("Unknown argument: '{}'. Try --help.", other);
                std::process::exit(2);
            }
        }
    }

    let config = config::AppConfig::load(&config_path)?;

    // Run async
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(crate::core::run(config))
}
