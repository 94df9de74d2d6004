use crate::config::Config;
use crate::fetcher::{PlaylistFetcher, relay_request_url};
use crate::playlist::PlaylistScheme;

pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
        }
    }

    fn warning(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
        }
    }

    fn error(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
        }
    }

    pub fn icon(&self) -> &'static str {
        match self.status {
            CheckStatus::Ok => "✓",
            CheckStatus::Warning => "⚠",
            CheckStatus::Error => "✗",
        }
    }

    pub fn color(&self) -> &'static str {
        match self.status {
            CheckStatus::Ok => "\x1b[32m",      // green
            CheckStatus::Warning => "\x1b[33m", // yellow
            CheckStatus::Error => "\x1b[31m",   // red
        }
    }
}

pub async fn run_checks(config: &Config) -> Vec<CheckResult> {
    let mut results = vec![check_config_file()];

    results.push(check_player(config));

    match PlaylistFetcher::new(config) {
        Ok(fetcher) => {
            results.push(check_playlist(config, &fetcher).await);
            results.extend(check_relays(config, &fetcher).await);
        }
        Err(e) => results.push(CheckResult::error("HTTP client", &e.to_string())),
    }

    results
}

fn check_config_file() -> CheckResult {
    match Config::config_path() {
        Ok(path) if path.exists() => {
            CheckResult::ok("Config", &format!("Loaded {}", path.display()))
        }
        Ok(path) => CheckResult::warning(
            "Config",
            &format!("No file at {}, using defaults", path.display()),
        ),
        Err(e) => CheckResult::warning("Config", &format!("{}, using defaults", e)),
    }
}

fn check_player(config: &Config) -> CheckResult {
    let player = &config.player.command;

    match which::which(player) {
        Ok(path) => CheckResult::ok("Player", &format!("{} found at {}", player, path.display())),
        Err(_) => CheckResult::error("Player", &format!("'{}' not found in PATH", player)),
    }
}

/// Full pipeline against the all-channels playlist
async fn check_playlist(config: &Config, fetcher: &PlaylistFetcher) -> CheckResult {
    let location = PlaylistScheme::new(&config.playlists.base_url).all_channels();

    match fetcher.fetch(&location, None).await {
        Ok(channels) => CheckResult::ok(
            "Playlist",
            &format!("{} playable channels in {}", channels.len(), location),
        ),
        Err(e) if e.is_empty_result() => CheckResult::warning("Playlist", &e.to_string()),
        Err(e) => CheckResult::error("Playlist", &e.to_string()),
    }
}

/// Each relay on its own, with the all-channels playlist as the target
async fn check_relays(config: &Config, fetcher: &PlaylistFetcher) -> Vec<CheckResult> {
    if fetcher.relays().is_empty() {
        return vec![CheckResult::warning(
            "Relays",
            "None configured, playlists load only directly",
        )];
    }

    let target = PlaylistScheme::new(&config.playlists.base_url).all_channels();
    let client = reqwest::Client::new();
    let mut results = Vec::new();

    for relay in fetcher.relays() {
        let name = format!("Relay {}", relay.url);
        let url = relay_request_url(relay, &target);
        let request = client.get(&url).send();

        let result = match tokio::time::timeout(config.fetch.relay_timeout(), request).await {
            Ok(Ok(response)) if response.status().is_success() => {
                CheckResult::ok(&name, &format!("Reachable ({})", response.status()))
            }
            Ok(Ok(response)) => {
                CheckResult::warning(&name, &format!("Responded with {}", response.status()))
            }
            Ok(Err(e)) => CheckResult::warning(&name, &format!("Unreachable: {}", e)),
            Err(_) => CheckResult::warning(
                &name,
                &format!("No response within {}s", config.fetch.relay_timeout_secs),
            ),
        };
        results.push(result);
    }

    results
}

pub fn print_results(results: &[CheckResult]) {
    let reset = "\x1b[0m";

    println!("\ntvscout doctor\n");

    for result in results {
        println!(
            "  {}{} {}{}  {}",
            result.color(),
            result.icon(),
            result.name,
            reset,
            result.message
        );
    }

    println!();

    let errors = results
        .iter()
        .filter(|r| r.status == CheckStatus::Error)
        .count();
    let warnings = results
        .iter()
        .filter(|r| r.status == CheckStatus::Warning)
        .count();

    if errors > 0 {
        println!("  {} error(s), {} warning(s)", errors, warnings);
        println!("  Fix errors above to use tvscout.\n");
    } else if warnings > 0 {
        println!(
            "  {} warning(s) - tvscout will work with limited features.\n",
            warnings
        );
    } else {
        println!("  All checks passed!\n");
    }
}
