use std::fs::File;

use tracing::info;
use tracing_subscriber::EnvFilter;
use tvscout::catalog::Catalog;
use tvscout::config::{Config, ConfigError};
use tvscout::{doctor, tui};

const EXAMPLE_CONFIG: &str = r#"
[playlists]
base_url = "https://iptv-org.github.io/iptv"

[[fetch.relays]]
kind = "prefix"
url = "https://corsproxy.io/?"

[player]
command = "mpv"
"#;

#[tokio::main]
async fn main() {
    // Log to a file so output doesn't corrupt the TUI
    let log_path = std::env::temp_dir().join("tvscout.log");

    match File::create(&log_path) {
        Ok(file) => {
            tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
                )
                .with_target(false)
                .with_ansi(false)
                .with_writer(file)
                .init();
        }
        Err(_) => {
            tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
                )
                .with_target(false)
                .init();
        }
    }

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            if let ConfigError::ParseError(_) | ConfigError::ValidationError(_) = &e {
                if let Ok(path) = Config::config_path() {
                    eprintln!("\nCheck the config file at: {}", path.display());
                }
                eprintln!("\nExample config.toml:\n{}", EXAMPLE_CONFIG);
            }
            std::process::exit(1);
        }
    };

    if std::env::args().skip(1).any(|a| a == "--doctor") {
        let results = doctor::run_checks(&config).await;
        doctor::print_results(&results);
        let failed = results
            .iter()
            .any(|r| r.status == doctor::CheckStatus::Error);
        std::process::exit(if failed { 1 } else { 0 });
    }

    let catalog = match Catalog::load(config.catalog.data_dir.as_deref()) {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("Failed to load catalog: {}", e);
            std::process::exit(1);
        }
    };

    info!(log = %log_path.display(), "starting tvscout");

    if let Err(e) = tui::run(config, catalog).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
