pub mod access;
pub mod attrs;
pub mod parser;

pub use access::AccessFilter;
pub use parser::parse_playlist;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One playable stream entry with display metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
    /// Absolute http(s) stream URL
    pub url: String,
    /// https only, see `parser::sanitize_logo`
    pub logo: Option<String>,
    pub category: Option<String>,
    pub country: Option<String>,
    pub language: Option<String>,
    pub region: Option<String>,
    pub source: Option<String>,
}

impl Channel {
    /// The metadata label this channel carries for a browse dimension.
    /// `All` reads the category, same as the category dimension.
    pub fn attribute(&self, dimension: Dimension) -> Option<&str> {
        match dimension {
            Dimension::All | Dimension::Category => self.category.as_deref(),
            Dimension::Language => self.language.as_deref(),
            Dimension::Country => self.country.as_deref(),
            Dimension::Region => self.region.as_deref(),
        }
    }
}

/// The five ways to browse the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dimension {
    #[default]
    All,
    Category,
    Language,
    Country,
    Region,
}

impl Dimension {
    pub const ALL: &'static [Dimension] = &[
        Dimension::All,
        Dimension::Category,
        Dimension::Language,
        Dimension::Country,
        Dimension::Region,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Dimension::All => "All Channels",
            Dimension::Category => "Categories",
            Dimension::Language => "Languages",
            Dimension::Country => "Countries",
            Dimension::Region => "Regions",
        }
    }

    /// Path segment under the playlist base URL
    fn path_segment(&self) -> Option<&'static str> {
        match self {
            Dimension::All => None,
            Dimension::Category => Some("categories"),
            Dimension::Language => Some("languages"),
            Dimension::Country => Some("countries"),
            Dimension::Region => Some("regions"),
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LocationError {
    #[error("{0} playlists need a label")]
    MissingLabel(&'static str),
}

/// Maps a dimension and label to a playlist URL under a fixed base path,
/// e.g. `{base}/countries/united_kingdom.m3u`.
#[derive(Debug, Clone)]
pub struct PlaylistScheme {
    base_url: String,
}

impl PlaylistScheme {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn all_channels(&self) -> String {
        format!("{}/index.m3u", self.base_url)
    }

    pub fn location(&self, dimension: Dimension, label: Option<&str>) -> Result<String, LocationError> {
        let Some(segment) = dimension.path_segment() else {
            return Ok(self.all_channels());
        };

        let slug = label
            .map(slugify)
            .filter(|s| !s.is_empty())
            .ok_or(LocationError::MissingLabel(dimension.label()))?;

        Ok(format!("{}/{}/{}.m3u", self.base_url, segment, slug))
    }
}

/// Lower-case, whitespace runs replaced by underscores
pub fn slugify(label: &str) -> String {
    label
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}
