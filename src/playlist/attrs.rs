//! `key="value"` metadata on `#EXTINF:` lines

/// Extract the quoted value of `key` from an `#EXTINF:` line.
///
/// The key match is ASCII case-insensitive and must start at an attribute
/// boundary, so `tvg-id` never matches inside `xtvg-id`. Attribute order and
/// the whitespace between attributes don't matter. An unterminated value
/// counts as absent.
pub fn extract_attribute(line: &str, key: &str) -> Option<String> {
    if key.is_empty() {
        return None;
    }

    // ASCII lowercasing keeps byte offsets identical between the two strings
    let haystack = line.to_ascii_lowercase();
    let needle = format!("{}=\"", key.to_ascii_lowercase());

    let mut from = 0;
    while let Some(pos) = haystack[from..].find(&needle) {
        let start = from + pos;
        let at_boundary = haystack[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !is_key_char(c));

        if at_boundary {
            let rest = &line[start + needle.len()..];
            return rest.find('"').map(|end| rest[..end].to_string());
        }

        from = start + needle.len();
    }

    None
}

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}
