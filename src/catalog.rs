//! Static reference datasets for the four labelled browse dimensions.
//!
//! The datasets ship embedded in the binary and can be overridden per file
//! from a directory (`[catalog] data_dir`). Channel counts are informational
//! only and never reconciled with what a playlist actually contains.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::playlist::Dimension;

const CATEGORIES_FILE: &str = "categories.json";
const LANGUAGES_FILE: &str = "languages.json";
const COUNTRIES_FILE: &str = "countries.json";
const REGIONS_FILE: &str = "regions.json";

const EMBEDDED_CATEGORIES: &str = include_str!("../data/categories.json");
const EMBEDDED_LANGUAGES: &str = include_str!("../data/languages.json");
const EMBEDDED_COUNTRIES: &str = include_str!("../data/countries.json");
const EMBEDDED_REGIONS: &str = include_str!("../data/regions.json");

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("failed to read {file}: {source}")]
    ReadError {
        file: String,
        source: std::io::Error,
    },
    #[error("failed to parse {file}: {source}")]
    ParseError {
        file: String,
        source: serde_json::Error,
    },
}

/// Common view over catalog rows
pub trait ReferenceEntry {
    fn label(&self) -> &str;
    fn channels(&self) -> u32;
    /// May be empty, in which case callers derive one from the label
    fn playlist_location(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Category {
    #[serde(rename = "category")]
    pub name: String,
    #[serde(default)]
    pub channels: u32,
    #[serde(rename = "playlist", default)]
    pub playlist_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Language {
    #[serde(rename = "language_name")]
    pub name: String,
    #[serde(default)]
    pub channels: u32,
    #[serde(default)]
    pub playlist_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Country {
    pub name: String,
    pub flag: Option<String>,
    #[serde(default)]
    pub channels: u32,
    #[serde(default)]
    pub playlist_url: String,
    #[serde(default)]
    pub subdivisions: Vec<Subdivision>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Subdivision {
    pub name: String,
    #[serde(default)]
    pub channels: u32,
    #[serde(default)]
    pub playlist_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Region {
    #[serde(rename = "region_name", alias = "name")]
    pub name: String,
    #[serde(default)]
    pub channels: u32,
    #[serde(default)]
    pub playlist_url: String,
}

macro_rules! reference_entry {
    ($($ty:ty),*) => {
        $(
            impl ReferenceEntry for $ty {
                fn label(&self) -> &str {
                    &self.name
                }

                fn channels(&self) -> u32 {
                    self.channels
                }

                fn playlist_location(&self) -> &str {
                    &self.playlist_url
                }
            }
        )*
    };
}

reference_entry!(Category, Language, Country, Subdivision, Region);

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub categories: Vec<Category>,
    pub languages: Vec<Language>,
    pub countries: Vec<Country>,
    pub regions: Vec<Region>,
}

impl Catalog {
    /// The datasets compiled into the binary
    pub fn embedded() -> Result<Self, CatalogError> {
        Ok(Self {
            categories: parse(CATEGORIES_FILE, EMBEDDED_CATEGORIES)?,
            languages: parse(LANGUAGES_FILE, EMBEDDED_LANGUAGES)?,
            countries: parse(COUNTRIES_FILE, EMBEDDED_COUNTRIES)?,
            regions: parse(REGIONS_FILE, EMBEDDED_REGIONS)?,
        })
    }

    /// Load from `data_dir` where a file exists there, embedded data otherwise
    pub fn load(data_dir: Option<&Path>) -> Result<Self, CatalogError> {
        let Some(dir) = data_dir else {
            return Self::embedded();
        };

        Ok(Self {
            categories: load_file(dir, CATEGORIES_FILE, EMBEDDED_CATEGORIES)?,
            languages: load_file(dir, LANGUAGES_FILE, EMBEDDED_LANGUAGES)?,
            countries: load_file(dir, COUNTRIES_FILE, EMBEDDED_COUNTRIES)?,
            regions: load_file(dir, REGIONS_FILE, EMBEDDED_REGIONS)?,
        })
    }

    /// Rows for a labelled dimension; `All` has none
    pub fn entries(&self, dimension: Dimension) -> Vec<&dyn ReferenceEntry> {
        match dimension {
            Dimension::All => Vec::new(),
            Dimension::Category => self.categories.iter().map(|e| e as &dyn ReferenceEntry).collect(),
            Dimension::Language => self.languages.iter().map(|e| e as &dyn ReferenceEntry).collect(),
            Dimension::Country => self.countries.iter().map(|e| e as &dyn ReferenceEntry).collect(),
            Dimension::Region => self.regions.iter().map(|e| e as &dyn ReferenceEntry).collect(),
        }
    }

    pub fn len(&self, dimension: Dimension) -> usize {
        match dimension {
            Dimension::All => 0,
            Dimension::Category => self.categories.len(),
            Dimension::Language => self.languages.len(),
            Dimension::Country => self.countries.len(),
            Dimension::Region => self.regions.len(),
        }
    }
}

fn load_file<T: for<'de> Deserialize<'de>>(
    dir: &Path,
    file: &str,
    embedded: &str,
) -> Result<Vec<T>, CatalogError> {
    let path = dir.join(file);
    if !path.exists() {
        return parse(file, embedded);
    }

    debug!(path = %path.display(), "loading catalog file");
    let contents = std::fs::read_to_string(&path).map_err(|source| CatalogError::ReadError {
        file: file.to_string(),
        source,
    })?;
    parse(file, &contents)
}

fn parse<T: for<'de> Deserialize<'de>>(file: &str, contents: &str) -> Result<Vec<T>, CatalogError> {
    serde_json::from_str(contents).map_err(|source| CatalogError::ParseError {
        file: file.to_string(),
        source,
    })
}
