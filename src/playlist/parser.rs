use std::collections::HashSet;

use url::Url;

use super::Channel;
use super::attrs::extract_attribute;

const EXTINF: &str = "#EXTINF:";

/// Logo filename fragments known to point at broken or placeholder images
pub const LOGO_BLOCKLIST: &[&str] = &[
    "alternatv.png",
    "cropped-LOGO-NEW.png",
    "5ba5a4abe66dd.png",
    "TBK-logo-2021.png",
    "Logo-BLTV-B-c-Li-u.png",
    "btv-Bac-Ninh-2021.png",
    "KULINAR_TEMP.png",
    "logo-square.png",
    "f-1.png",
    "default_logo-150x150.png",
    "tANAElTS_400x400.jpg",
    "IMG-20230706-142136.jpg",
    "20190716074123890vav.png",
    "go2-logo.png",
    "quran-radio-logo-h-rtl.png",
    "logo-ozhsm5mqi0zh2wnf8es5jbyh39ztnqmbbn9tbey0hw.png",
    "dunya-tv-az.png",
    "Persiana-HD.png",
    "Persiana-Rap.png",
    "logod.jpg",
    "qdtv1.jpg",
    "5fc81016d98cab623846a4f3",
    "IMG-20230629-152623.jpg",
    "6rj9aw.jpg",
    "8v2y8m.png",
    "1-210414213-U60-L.jpg",
    "s202038d.png",
    "Picture1111123.png",
];

/// Attributes read from an `#EXTINF:` line, waiting for their stream URL
#[derive(Debug)]
struct PendingEntry {
    id: Option<String>,
    name: String,
    logo: Option<String>,
    category: Option<String>,
    country: Option<String>,
    language: Option<String>,
    region: Option<String>,
}

impl PendingEntry {
    /// A missing or blank name falls back to `Channel {counter}`
    fn from_info(info: &str, counter: u64) -> Self {
        let name = info
            .rfind(',')
            .map(|pos| info[pos + 1..].trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Channel {}", counter));

        Self {
            id: extract_attribute(info, "tvg-id").filter(|id| !id.is_empty()),
            name,
            logo: sanitize_logo(extract_attribute(info, "tvg-logo")),
            category: extract_attribute(info, "group-title"),
            country: extract_attribute(info, "tvg-country"),
            language: extract_attribute(info, "tvg-language"),
            region: extract_attribute(info, "tvg-region"),
        }
    }

    fn into_channel(self, url: &str, id: String) -> Channel {
        Channel {
            id,
            name: self.name,
            url: url.to_string(),
            logo: self.logo,
            category: self.category,
            country: self.country,
            language: self.language,
            region: self.region,
            source: None,
        }
    }
}

/// Parse an extended-M3U document into channels, in document order.
///
/// Each `#EXTINF:` line opens a pending entry which the next non-comment line
/// completes as its stream URL. Entries whose URL isn't an absolute http(s)
/// URL are dropped, as are stray URL lines with no pending entry. The fallback
/// id counter advances once per URL line consumed, emitted or not.
pub fn parse_playlist(content: &str) -> Vec<Channel> {
    let mut channels = Vec::new();
    let mut seen_ids = HashSet::new();
    let mut pending: Option<PendingEntry> = None;
    let mut counter: u64 = 1;

    for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(info) = line.strip_prefix(EXTINF) {
            // a second #EXTINF before any URL abandons the first
            pending = Some(PendingEntry::from_info(info, counter));
            continue;
        }

        if line.starts_with('#') {
            continue;
        }

        let Some(entry) = pending.take() else {
            continue;
        };

        let attempt = counter;
        counter += 1;

        if !is_stream_url(line) {
            continue;
        }

        let mut id = entry.id.clone().unwrap_or_else(|| attempt.to_string());
        if seen_ids.contains(&id) {
            id = format!("{}#{}", id, attempt);
        }
        seen_ids.insert(id.clone());

        channels.push(entry.into_channel(line, id));
    }

    channels
}

/// Absolute URL with an explicit `http://` or `https://` prefix
pub fn is_stream_url(line: &str) -> bool {
    let lower = line.to_ascii_lowercase();
    if !lower.starts_with("http://") && !lower.starts_with("https://") {
        return false;
    }

    Url::parse(line).is_ok_and(|url| url.host().is_some())
}

/// Drop logos that are plain http or match the blocklist
pub fn sanitize_logo(logo: Option<String>) -> Option<String> {
    let logo = logo.filter(|l| !l.is_empty())?;

    if logo.to_ascii_lowercase().starts_with("http://") {
        return None;
    }

    if LOGO_BLOCKLIST.iter().any(|fragment| logo.contains(fragment)) {
        return None;
    }

    Some(logo)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_entry() {
        let content = r#"#EXTM3U
#EXTINF:-1 tvg-id="bbc1" tvg-logo="https://x/y.png" group-title="News",BBC One
https://stream.example/bbc1.m3u8
"#;
        let channels = parse_playlist(content);
        assert_eq!(channels.len(), 1);

        let ch = &channels[0];
        assert_eq!(ch.id, "bbc1");
        assert_eq!(ch.name, "BBC One");
        assert_eq!(ch.logo.as_deref(), Some("https://x/y.png"));
        assert_eq!(ch.category.as_deref(), Some("News"));
        assert_eq!(ch.url, "https://stream.example/bbc1.m3u8");
        assert_eq!(ch.country, None);
        assert_eq!(ch.source, None);
    }

    #[test]
    fn test_all_recognized_attributes() {
        let content = r#"#EXTINF:-1 tvg-region="Europe" tvg-language="French" tvg-country="FR" group-title="News" tvg-id="f24",France 24
https://static.example/f24/live.m3u8"#;
        let channels = parse_playlist(content);
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].region.as_deref(), Some("Europe"));
        assert_eq!(channels[0].language.as_deref(), Some("French"));
        assert_eq!(channels[0].country.as_deref(), Some("FR"));
        assert_eq!(channels[0].category.as_deref(), Some("News"));
    }

    #[test]
    fn test_extinf_followed_by_extinf_abandons_first() {
        let content = r#"#EXTINF:-1 tvg-id="lost",Lost Channel
#EXTINF:-1 tvg-id="kept",Kept Channel
https://example.com/kept.m3u8
"#;
        let channels = parse_playlist(content);
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].id, "kept");
        assert_eq!(channels[0].name, "Kept Channel");
    }

    #[test]
    fn test_invalid_url_discards_entry() {
        let content = r#"#EXTINF:-1,Good
https://example.com/good.m3u8
#EXTINF:-1,Relative
/streams/relative.m3u8
#EXTINF:-1,Rtmp
rtmp://example.com/live
#EXTINF:-1,Also Good
http://example.com/also.m3u8
"#;
        let channels = parse_playlist(content);
        let names: Vec<_> = channels.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Good", "Also Good"]);
    }

    #[test]
    fn test_counter_advances_on_discarded_entries() {
        let content = r#"#EXTINF:-1,One
https://example.com/1.m3u8
#EXTINF:-1,Two
not a url
#EXTINF:-1,Three
https://example.com/3.m3u8
"#;
        let channels = parse_playlist(content);
        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0].id, "1");
        assert_eq!(channels[1].id, "3");
    }

    #[test]
    fn test_stray_url_lines_ignored() {
        let content = r#"#EXTM3U
https://example.com/orphan.m3u8
#EXTINF:-1,Real
https://example.com/real.m3u8
https://example.com/second-url-for-same-entry.m3u8
"#;
        let channels = parse_playlist(content);
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].name, "Real");
        assert_eq!(channels[0].id, "1");
    }

    #[test]
    fn test_missing_comma_synthesizes_name() {
        let content = r#"#EXTINF:-1,First
https://example.com/1.m3u8
#EXTINF:-1 tvg-id="x"
https://example.com/2.m3u8
"#;
        let channels = parse_playlist(content);
        assert_eq!(channels.len(), 2);
        assert_eq!(channels[1].name, "Channel 2");
        assert_eq!(channels[1].id, "x");
    }

    #[test]
    fn test_name_after_last_comma() {
        let content = r#"#EXTINF:-1 group-title="News,Weather",Weather Now
https://example.com/w.m3u8
"#;
        let channels = parse_playlist(content);
        assert_eq!(channels[0].name, "Weather Now");
        assert_eq!(channels[0].category.as_deref(), Some("News,Weather"));
    }

    #[test]
    fn test_blank_name_gets_synthesized_name() {
        let content = "#EXTINF:-1 tvg-id=\"a\",   \nhttps://example.com/a.m3u8\n#EXTINF:-1,Next\nhttps://example.com/b.m3u8\n";
        let channels = parse_playlist(content);
        let got: Vec<(&str, &str)> = channels
            .iter()
            .map(|c| (c.id.as_str(), c.name.as_str()))
            .collect();
        assert_eq!(got, vec![("a", "Channel 1"), ("2", "Next")]);
    }

    #[test]
    fn test_comment_lines_between_extinf_and_url() {
        let content = r#"#EXTINF:-1,With Options
#EXTVLCOPT:http-user-agent=Mozilla/5.0
#KODIPROP:inputstream=adaptive
https://example.com/opts.m3u8
"#;
        let channels = parse_playlist(content);
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].url, "https://example.com/opts.m3u8");
    }

    #[test]
    fn test_crlf_and_padding() {
        let content = "#EXTM3U\r\n  #EXTINF:-1 tvg-id=\"c\",Carriage  \r\n\r\n   https://example.com/c.m3u8   \r\n";
        let channels = parse_playlist(content);
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].name, "Carriage");
        assert_eq!(channels[0].url, "https://example.com/c.m3u8");
    }

    #[test]
    fn test_duplicate_explicit_ids_made_unique() {
        let content = r#"#EXTINF:-1 tvg-id="dup",Feed A
https://example.com/a.m3u8
#EXTINF:-1 tvg-id="dup",Feed B
https://example.com/b.m3u8
"#;
        let channels = parse_playlist(content);
        assert_eq!(channels[0].id, "dup");
        assert_eq!(channels[1].id, "dup#2");
    }

    #[test]
    fn test_empty_tvg_id_falls_back_to_counter() {
        let content = "#EXTINF:-1 tvg-id=\"\",Anon\nhttps://example.com/a.m3u8\n";
        assert_eq!(parse_playlist(content)[0].id, "1");
    }

    #[test]
    fn test_parse_is_idempotent() {
        let content = r#"#EXTINF:-1 tvg-id="a",A
https://example.com/a.m3u8
#EXTINF:-1,B
https://example.com/b.m3u8
"#;
        assert_eq!(parse_playlist(content), parse_playlist(content));
    }

    #[test]
    fn test_empty_document() {
        assert!(parse_playlist("").is_empty());
        assert!(parse_playlist("#EXTM3U\n").is_empty());
    }

    #[test]
    fn test_is_stream_url() {
        assert!(is_stream_url("https://example.com/live.m3u8"));
        assert!(is_stream_url("http://1.2.3.4:8080/live"));
        assert!(is_stream_url("HTTPS://EXAMPLE.COM/x"));
        assert!(!is_stream_url("http:example.com"));
        assert!(!is_stream_url("ftp://example.com/file"));
        assert!(!is_stream_url("https://"));
        assert!(!is_stream_url("example.com/live.m3u8"));
    }

    #[test]
    fn test_sanitize_logo() {
        assert_eq!(sanitize_logo(None), None);
        assert_eq!(sanitize_logo(Some(String::new())), None);
        assert_eq!(sanitize_logo(Some("http://x/logo.png".to_string())), None);
        assert_eq!(
            sanitize_logo(Some("https://x/logo.png".to_string())),
            Some("https://x/logo.png".to_string())
        );
        assert_eq!(
            sanitize_logo(Some("https://x/images/logo-square.png".to_string())),
            None
        );
        assert_eq!(
            sanitize_logo(Some("https://i.imgur.com/5fc81016d98cab623846a4f3.webp".to_string())),
            None
        );
    }

    #[test]
    fn test_http_logo_dropped_during_parse() {
        let content = r#"#EXTINF:-1 tvg-logo="http://insecure/logo.png",Insecure Logo
https://example.com/s.m3u8
"#;
        let channels = parse_playlist(content);
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].logo, None);
    }
}
