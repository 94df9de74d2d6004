use std::fmt;

use url::{Host, Url};

use super::Channel;

/// Hosts observed to block cross-origin playback or otherwise fail.
/// Matched as substrings of the lower-cased stream URL.
pub const DEFAULT_DENY_HOSTS: &[&str] = &[
    "pluto.tv",
    "plutotv.com",
    "cfd-v4-service-channel-stitcher-use1-1.prd.pluto.tv",
    "service-stitcher.clusters.pluto.tv",
    "alkassdigital.net",
    "vo-live-media.cdb.cdn.orange.com",
    "dev.aftermind.xyz",
    "raycom-accdn-firetv.amagi.tv",
    "bl.webcaster.pro",
    "webstreaming.viewmedia.tv",
    "aasthaott.akamaized.net",
    "live20.bozztv.com",
];

/// Why a stream was judged unlikely to play
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    InvalidUrl,
    NotHttps,
    IpAddressHost,
    TokenInQuery,
    DeniedHost(String),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::InvalidUrl => write!(f, "invalid url"),
            Rejection::NotHttps => write!(f, "not https"),
            Rejection::IpAddressHost => write!(f, "ip address host"),
            Rejection::TokenInQuery => write!(f, "token in query"),
            Rejection::DeniedHost(host) => write!(f, "denied host {}", host),
        }
    }
}

/// Heuristic predicate pruning channels unlikely to play in this client.
///
/// Advisory only: a kept channel can still fail at play time.
#[derive(Debug, Clone)]
pub struct AccessFilter {
    deny_hosts: Vec<String>,
}

impl Default for AccessFilter {
    fn default() -> Self {
        Self::new(DEFAULT_DENY_HOSTS.iter().copied())
    }
}

impl AccessFilter {
    pub fn new<I, S>(deny_hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            deny_hosts: deny_hosts
                .into_iter()
                .map(|h| h.as_ref().trim().to_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
        }
    }

    pub fn deny_hosts(&self) -> &[String] {
        &self.deny_hosts
    }

    pub fn is_accessible(&self, channel: &Channel) -> bool {
        self.check(&channel.url).is_ok()
    }

    pub fn check(&self, stream_url: &str) -> Result<(), Rejection> {
        let url = Url::parse(stream_url).map_err(|_| Rejection::InvalidUrl)?;

        if url.scheme() != "https" {
            return Err(Rejection::NotHttps);
        }

        if matches!(url.host(), Some(Host::Ipv4(_))) {
            return Err(Rejection::IpAddressHost);
        }

        if url
            .query()
            .is_some_and(|q| q.to_ascii_lowercase().contains("token="))
        {
            return Err(Rejection::TokenInQuery);
        }

        let lower = stream_url.to_lowercase();
        if let Some(host) = self.deny_hosts.iter().find(|h| lower.contains(h.as_str())) {
            return Err(Rejection::DeniedHost(host.clone()));
        }

        Ok(())
    }

    /// Keep the accessible channels, preserving order
    pub fn retain(&self, channels: Vec<Channel>) -> Vec<Channel> {
        channels
            .into_iter()
            .filter(|c| self.is_accessible(c))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(url: &str) -> Channel {
        Channel {
            id: "1".to_string(),
            name: "Test".to_string(),
            url: url.to_string(),
            logo: None,
            category: None,
            country: None,
            language: None,
            region: None,
            source: None,
        }
    }

    #[test]
    fn test_https_kept() {
        let filter = AccessFilter::default();
        assert!(filter.is_accessible(&channel("https://stream.example/bbc1.m3u8")));
    }

    #[test]
    fn test_http_rejected() {
        let filter = AccessFilter::default();
        assert_eq!(
            filter.check("http://stream.example/bbc1.m3u8"),
            Err(Rejection::NotHttps)
        );
    }

    #[test]
    fn test_ipv4_host_rejected() {
        let filter = AccessFilter::default();
        assert_eq!(
            filter.check("https://203.0.113.7:8443/live/index.m3u8"),
            Err(Rejection::IpAddressHost)
        );
        // digits in a domain name are fine
        assert!(filter.check("https://cdn1.example.com/live.m3u8").is_ok());
    }

    #[test]
    fn test_token_query_rejected() {
        let filter = AccessFilter::default();
        assert_eq!(
            filter.check("https://example.com/live.m3u8?token=abc123"),
            Err(Rejection::TokenInQuery)
        );
        assert_eq!(
            filter.check("https://example.com/live.m3u8?a=1&Token=x"),
            Err(Rejection::TokenInQuery)
        );
        // only the query counts
        assert!(filter.check("https://example.com/token=path/live.m3u8").is_ok());
    }

    #[test]
    fn test_denied_hosts() {
        let filter = AccessFilter::default();
        assert_eq!(
            filter.check("https://service-stitcher.clusters.pluto.tv/stitch/hls/channel/1/master.m3u8"),
            Err(Rejection::DeniedHost("pluto.tv".to_string()))
        );
        assert!(matches!(
            filter.check("https://LIVE20.BOZZTV.COM/x/index.m3u8"),
            Err(Rejection::DeniedHost(_))
        ));
    }

    #[test]
    fn test_custom_denylist() {
        let filter = AccessFilter::new(["Blocked.Example ", ""]);
        assert_eq!(filter.deny_hosts(), ["blocked.example"]);
        assert!(!filter.is_accessible(&channel("https://cdn.blocked.example/live.m3u8")));
        assert!(filter.is_accessible(&channel("https://pluto.tv/live.m3u8")));
    }

    #[test]
    fn test_invalid_url_rejected() {
        let filter = AccessFilter::default();
        assert_eq!(filter.check("not a url"), Err(Rejection::InvalidUrl));
    }

    #[test]
    fn test_deterministic() {
        let filter = AccessFilter::default();
        let ch = channel("https://example.com/a.m3u8");
        let mut other = ch.clone();
        other.name = "Different".to_string();
        other.category = Some("News".to_string());
        assert_eq!(filter.is_accessible(&ch), filter.is_accessible(&ch));
        assert_eq!(filter.is_accessible(&ch), filter.is_accessible(&other));
    }

    #[test]
    fn test_retain_preserves_order() {
        let filter = AccessFilter::default();
        let kept = filter.retain(vec![
            channel("https://a.example/1.m3u8"),
            channel("http://b.example/2.m3u8"),
            channel("https://c.example/3.m3u8"),
        ]);
        let urls: Vec<_> = kept.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(urls, ["https://a.example/1.m3u8", "https://c.example/3.m3u8"]);
    }
}
