use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::{Config, FetchConfig, RelayConfig, RelayKind};
use crate::playlist::{AccessFilter, Channel, Dimension, parse_playlist};

pub const PLAYLIST_ACCEPT: &str =
    "application/x-mpegURL, application/vnd.apple.mpegurl, application/octet-stream, */*";

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("failed to build http client: {0}")]
    ClientError(#[from] reqwest::Error),
    #[error("invalid playlist location '{0}'")]
    InvalidLocation(String),
    #[error("could not load playlist {location} ({attempts} attempts failed)")]
    Exhausted { location: String, attempts: usize },
    #[error("playlist {location} has no channels")]
    EmptyPlaylist { location: String },
    #[error("none of the {parsed} channels in {location} can play here")]
    NoAccessibleChannels { location: String, parsed: usize },
}

impl FetchError {
    /// A body came back but yielded nothing to show
    pub fn is_empty_result(&self) -> bool {
        matches!(
            self,
            FetchError::EmptyPlaylist { .. } | FetchError::NoAccessibleChannels { .. }
        )
    }
}

/// Why a single retrieval attempt failed. Only logged, never surfaced.
#[derive(Error, Debug)]
enum AttemptError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("status {0}")]
    Status(StatusCode),
    #[error("empty body")]
    EmptyBody,
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("relay reported failure")]
    RelayFailure,
}

/// Which dimension and label a load was made for, for logs only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadContext {
    pub dimension: Dimension,
    pub label: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RelayResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    content: Option<String>,
}

/// Resolves a playlist location to filtered channels.
///
/// Tries the location directly, then each relay in order, one at a time.
/// The first non-empty 2xx body wins.
pub struct PlaylistFetcher {
    client: Client,
    relays: Vec<RelayConfig>,
    direct_timeout: Duration,
    relay_timeout: Duration,
    filter: AccessFilter,
}

impl PlaylistFetcher {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        Self::with_settings(&config.fetch, config.filter.access_filter())
    }

    pub fn with_settings(fetch: &FetchConfig, filter: AccessFilter) -> Result<Self, FetchError> {
        let client = Client::builder().user_agent(fetch.user_agent.as_str()).build()?;

        Ok(Self {
            client,
            relays: fetch.relays.clone(),
            direct_timeout: fetch.direct_timeout(),
            relay_timeout: fetch.relay_timeout(),
            filter,
        })
    }

    pub fn relays(&self) -> &[RelayConfig] {
        &self.relays
    }

    /// Retrieve, parse and filter the playlist at `location`
    pub async fn fetch(
        &self,
        location: &str,
        context: Option<&LoadContext>,
    ) -> Result<Vec<Channel>, FetchError> {
        let (dimension, label) = match context {
            Some(ctx) => (Some(ctx.dimension), ctx.label.as_deref()),
            None => (None, None),
        };
        info!(url = %location, ?dimension, label, "fetching playlist");

        let body = self.retrieve(location).await?;

        let parsed = parse_playlist(&body);
        let parsed_count = parsed.len();
        info!(count = parsed_count, "parsed playlist");

        if parsed.is_empty() {
            return Err(FetchError::EmptyPlaylist {
                location: location.to_string(),
            });
        }

        let channels = self.filter.retain(parsed);
        info!(count = channels.len(), "filtered to accessible channels");

        if channels.is_empty() {
            return Err(FetchError::NoAccessibleChannels {
                location: location.to_string(),
                parsed: parsed_count,
            });
        }

        Ok(channels)
    }

    /// Raw playlist text via the first retrieval path that works
    pub async fn retrieve(&self, location: &str) -> Result<String, FetchError> {
        let valid = Url::parse(location)
            .is_ok_and(|u| matches!(u.scheme(), "http" | "https"));
        if !valid {
            return Err(FetchError::InvalidLocation(location.to_string()));
        }

        match timeout(self.direct_timeout, self.fetch_direct(location)).await {
            Ok(Ok(body)) => {
                debug!("direct fetch succeeded");
                return Ok(body);
            }
            Ok(Err(e)) => warn!(error = %e, "direct fetch failed, trying relays"),
            Err(_) => warn!(
                error = %AttemptError::Timeout(self.direct_timeout),
                "direct fetch failed, trying relays"
            ),
        }

        for (i, relay) in self.relays.iter().enumerate() {
            let result = timeout(self.relay_timeout, self.fetch_via_relay(relay, location))
                .await
                .unwrap_or(Err(AttemptError::Timeout(self.relay_timeout)));

            match result {
                Ok(body) => {
                    info!(relay = %relay.url, "fetch succeeded via relay");
                    return Ok(body);
                }
                Err(e) => {
                    warn!(relay = %relay.url, attempt = i + 1, error = %e, "relay fetch failed");
                }
            }
        }

        Err(FetchError::Exhausted {
            location: location.to_string(),
            attempts: self.relays.len() + 1,
        })
    }

    async fn fetch_direct(&self, url: &str) -> Result<String, AttemptError> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, PLAYLIST_ACCEPT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AttemptError::Status(response.status()));
        }

        non_empty(response.text().await?)
    }

    async fn fetch_via_relay(&self, relay: &RelayConfig, target: &str) -> Result<String, AttemptError> {
        let url = relay_request_url(relay, target);
        debug!(url = %url, "trying relay");

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(AttemptError::Status(response.status()));
        }

        match relay.kind {
            RelayKind::Prefix => non_empty(response.text().await?),
            RelayKind::Json => {
                let reply: RelayResponse = response.json().await?;
                if !reply.success {
                    return Err(AttemptError::RelayFailure);
                }
                non_empty(reply.content.unwrap_or_default())
            }
        }
    }
}

/// The URL to request for `target` through `relay`
pub fn relay_request_url(relay: &RelayConfig, target: &str) -> String {
    let encoded = urlencoding::encode(target);
    match relay.kind {
        RelayKind::Prefix => format!("{}{}", relay.url, encoded),
        RelayKind::Json => {
            let sep = if relay.url.contains('?') { '&' } else { '?' };
            format!("{}{}url={}", relay.url, sep, encoded)
        }
    }
}

fn non_empty(body: String) -> Result<String, AttemptError> {
    if body.trim().is_empty() {
        Err(AttemptError::EmptyBody)
    } else {
        Ok(body)
    }
}
