//! Browse/selection state: what is loaded, what is shown, what is playing.
//!
//! The controller never does I/O itself. `select` and `retry` hand back a
//! [`LoadRequest`] tagged with a generation; the caller runs the fetch and
//! feeds the result to `complete`, which drops anything from an older
//! generation.

use itertools::Itertools;
use tracing::{debug, info, warn};

use crate::catalog::{Category, Country, Language, ReferenceEntry, Region, Subdivision};
use crate::fetcher::{FetchError, LoadContext};
use crate::playlist::{Channel, Dimension, LocationError, PlaylistScheme};

pub const DEFAULT_PAGE_SIZE: usize = 50;

/// A country, optionally narrowed to one of its subdivisions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryPick {
    pub country: Country,
    pub subdivision: Option<Subdivision>,
}

impl CountryPick {
    pub fn country(country: Country) -> Self {
        Self {
            country,
            subdivision: None,
        }
    }

    pub fn subdivision(country: Country, subdivision: Subdivision) -> Self {
        Self {
            country,
            subdivision: Some(subdivision),
        }
    }
}

/// Active dimension plus at most one reference entry within it.
/// `None` means the dimension is open but nothing is picked yet.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    All,
    Category(Option<Category>),
    Language(Option<Language>),
    Country(Option<CountryPick>),
    Region(Option<Region>),
}

impl Selection {
    pub fn for_dimension(dimension: Dimension) -> Self {
        match dimension {
            Dimension::All => Selection::All,
            Dimension::Category => Selection::Category(None),
            Dimension::Language => Selection::Language(None),
            Dimension::Country => Selection::Country(None),
            Dimension::Region => Selection::Region(None),
        }
    }

    pub fn dimension(&self) -> Dimension {
        match self {
            Selection::All => Dimension::All,
            Selection::Category(_) => Dimension::Category,
            Selection::Language(_) => Dimension::Language,
            Selection::Country(_) => Dimension::Country,
            Selection::Region(_) => Dimension::Region,
        }
    }

    /// The entry whose playlist gets loaded
    pub fn entry(&self) -> Option<&dyn ReferenceEntry> {
        match self {
            Selection::All => None,
            Selection::Category(c) => c.as_ref().map(|e| e as &dyn ReferenceEntry),
            Selection::Language(l) => l.as_ref().map(|e| e as &dyn ReferenceEntry),
            Selection::Country(pick) => pick.as_ref().map(|p| match &p.subdivision {
                Some(sub) => sub as &dyn ReferenceEntry,
                None => &p.country as &dyn ReferenceEntry,
            }),
            Selection::Region(r) => r.as_ref().map(|e| e as &dyn ReferenceEntry),
        }
    }

    /// Human label, e.g. "United States / Texas"
    pub fn label(&self) -> Option<String> {
        match self {
            Selection::Country(Some(CountryPick {
                country,
                subdivision: Some(sub),
            })) => Some(format!("{} / {}", country.name, sub.name)),
            _ => self.entry().map(|e| e.label().to_string()),
        }
    }

    /// Whether this selection can be loaded without picking an entry first
    pub fn is_complete(&self) -> bool {
        matches!(self, Selection::All) || self.entry().is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// A labelled dimension is open with no entry picked
    #[default]
    Idle,
    Loading,
    Loaded,
    LoadingMore,
}

/// A fetch the caller should run, tagged with the generation that asked for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub generation: u64,
    pub location: String,
    pub context: LoadContext,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// Superseded by a newer selection; the result was dropped
    Stale,
}

pub struct BrowseController {
    scheme: PlaylistScheme,
    page_size: usize,

    selection: Selection,
    phase: Phase,
    generation: u64,

    batch: Vec<Channel>,
    filter_values: Vec<String>,

    search: String,
    filter_value: Option<String>,
    // indices into `batch` matching search and filter
    filtered: Vec<usize>,
    // displayed prefix length of `filtered`
    shown: usize,

    current: Option<Channel>,
    error: Option<String>,
}

impl BrowseController {
    pub fn new(scheme: PlaylistScheme, page_size: usize) -> Self {
        Self {
            scheme,
            page_size: page_size.max(1),
            selection: Selection::All,
            phase: Phase::Idle,
            generation: 0,
            batch: Vec::new(),
            filter_values: Vec::new(),
            search: String::new(),
            filter_value: None,
            filtered: Vec::new(),
            shown: 0,
            current: None,
            error: None,
        }
    }

    /// Switch dimension and/or entry. Clears the previous batch and returns
    /// the fetch to run, if the selection is loadable.
    pub fn select(&mut self, selection: Selection) -> Option<LoadRequest> {
        self.generation += 1;
        self.selection = selection;

        self.batch.clear();
        self.filter_values.clear();
        self.filter_value = None;
        self.filtered.clear();
        self.shown = 0;
        self.error = None;

        let dimension = self.selection.dimension();
        let location = match self.resolve_location() {
            Ok(Some(location)) => location,
            Ok(None) => {
                debug!(?dimension, "dimension open, waiting for an entry");
                self.phase = Phase::Idle;
                return None;
            }
            Err(e) => {
                warn!(?dimension, error = %e, "cannot build playlist location");
                self.error = Some(e.to_string());
                self.phase = Phase::Loaded;
                return None;
            }
        };

        self.phase = Phase::Loading;
        info!(generation = self.generation, url = %location, "loading selection");

        Some(LoadRequest {
            generation: self.generation,
            location,
            context: LoadContext {
                dimension,
                label: self.selection.label(),
            },
        })
    }

    /// Reload the current selection under a new generation
    pub fn retry(&mut self) -> Option<LoadRequest> {
        self.select(self.selection.clone())
    }

    fn resolve_location(&self) -> Result<Option<String>, LocationError> {
        let dimension = self.selection.dimension();
        match self.selection.entry() {
            None if dimension == Dimension::All => Ok(Some(self.scheme.all_channels())),
            None => Ok(None),
            Some(entry) if !entry.playlist_location().trim().is_empty() => {
                Ok(Some(entry.playlist_location().trim().to_string()))
            }
            Some(entry) => self.scheme.location(dimension, Some(entry.label())).map(Some),
        }
    }

    /// Apply a finished fetch. Results from a superseded generation are dropped.
    pub fn complete(
        &mut self,
        generation: u64,
        result: Result<Vec<Channel>, FetchError>,
    ) -> Completion {
        if generation != self.generation || self.phase != Phase::Loading {
            debug!(
                generation,
                current = self.generation,
                "dropping stale playlist result"
            );
            return Completion::Stale;
        }

        match result {
            Ok(channels) => {
                info!(count = channels.len(), "playlist loaded");
                self.batch = channels;
                self.error = None;

                let dimension = self.selection.dimension();
                self.filter_values = self
                    .batch
                    .iter()
                    .filter_map(|c| c.attribute(dimension))
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
                    .sorted()
                    .dedup()
                    .collect();

                if self.current.is_none() {
                    self.current = self.batch.first().cloned();
                }
            }
            Err(e) => {
                warn!(error = %e, "playlist load failed");
                self.batch.clear();
                self.filter_values.clear();
                self.error = Some(e.to_string());
            }
        }

        self.phase = Phase::Loaded;
        self.refilter();
        Completion::Applied
    }

    pub fn set_search(&mut self, term: &str) {
        if self.search == term {
            return;
        }
        self.search = term.to_string();
        self.refilter();
    }

    /// `None` shows every channel in the batch
    pub fn set_filter(&mut self, value: Option<String>) {
        if self.filter_value == value {
            return;
        }
        self.filter_value = value;
        self.refilter();
    }

    /// Step to the next secondary filter value, wrapping back to none
    pub fn cycle_filter(&mut self) {
        let next = match &self.filter_value {
            None => self.filter_values.first().cloned(),
            Some(current) => self
                .filter_values
                .iter()
                .position(|v| v == current)
                .and_then(|i| self.filter_values.get(i + 1))
                .cloned(),
        };
        self.set_filter(next);
    }

    fn refilter(&mut self) {
        let dimension = self.selection.dimension();
        let needle = self.search.trim().to_lowercase();

        self.filtered = self
            .batch
            .iter()
            .enumerate()
            .filter(|(_, c)| needle.is_empty() || c.name.to_lowercase().contains(&needle))
            .filter(|(_, c)| match &self.filter_value {
                Some(value) => c.attribute(dimension) == Some(value.as_str()),
                None => true,
            })
            .map(|(i, _)| i)
            .collect();

        self.shown = self.filtered.len().min(self.page_size);
    }

    /// Grow the displayed window by one page. Returns false if there was
    /// nothing to add or no batch is loaded.
    pub fn load_more(&mut self) -> bool {
        if self.phase != Phase::Loaded || !self.has_more() {
            return false;
        }

        self.phase = Phase::LoadingMore;
        self.shown = (self.shown + self.page_size).min(self.filtered.len());
        self.phase = Phase::Loaded;
        debug!(shown = self.shown, total = self.filtered.len(), "loaded more");
        true
    }

    /// Make the channel at `index` in the displayed window current
    pub fn select_channel(&mut self, index: usize) -> Option<&Channel> {
        if index >= self.shown {
            return None;
        }
        let channel = self.batch.get(self.filtered[index])?.clone();
        self.current = Some(channel);
        self.current.as_ref()
    }

    pub fn displayed(&self) -> Vec<&Channel> {
        self.filtered[..self.shown]
            .iter()
            .map(|&i| &self.batch[i])
            .collect()
    }

    pub fn has_more(&self) -> bool {
        self.shown < self.filtered.len()
    }

    pub fn shown_len(&self) -> usize {
        self.shown
    }

    pub fn filtered_len(&self) -> usize {
        self.filtered.len()
    }

    pub fn batch(&self) -> &[Channel] {
        &self.batch
    }

    pub fn filter_values(&self) -> &[String] {
        &self.filter_values
    }

    pub fn filter_value(&self) -> Option<&str> {
        self.filter_value.as_deref()
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn dimension(&self) -> Dimension {
        self.selection.dimension()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn current(&self) -> Option<&Channel> {
        self.current.as_ref()
    }

    /// Why the last load produced nothing, if it failed
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Channel count advertised by the selected catalog entry
    pub fn expected_total(&self) -> Option<u32> {
        self.selection.entry().map(|e| e.channels())
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }
}
