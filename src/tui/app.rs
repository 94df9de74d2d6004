use crate::browse::{BrowseController, CountryPick, LoadRequest, Selection};
use crate::catalog::{Catalog, ReferenceEntry};
use crate::playlist::{Channel, Dimension};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Channels,
    /// Picking a catalog entry for the active dimension
    Browser,
    Search,
    Help,
}

/// One row of the catalog browser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserRow {
    pub label: String,
    pub channels: u32,
    pub flag: Option<String>,
    pub has_subdivisions: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerState {
    Stopped,
    Playing(String),
    Error(String),
}

pub struct App {
    pub view: View,
    pub should_quit: bool,
    pub browse: BrowseController,
    pub catalog: Catalog,

    // Channel list cursor, within the displayed window
    pub selected_index: usize,

    // Catalog browser
    pub browser_query: String,
    pub browser_index: usize,
    /// Index into `catalog.countries` while listing its subdivisions
    pub browser_country: Option<usize>,

    // Search
    pub search_input: String,
    pub search_seq: u64, // Incremented per keystroke, only the latest settles

    pub player: PlayerState,
}

impl App {
    pub fn new(catalog: Catalog, browse: BrowseController) -> Self {
        Self {
            view: View::Channels,
            should_quit: false,
            browse,
            catalog,
            selected_index: 0,
            browser_query: String::new(),
            browser_index: 0,
            browser_country: None,
            search_input: String::new(),
            search_seq: 0,
            player: PlayerState::Stopped,
        }
    }

    /// Switch to `dimension`. `All` loads straight away, the others open the browser.
    pub fn select_dimension(&mut self, dimension: Dimension) -> Option<LoadRequest> {
        self.selected_index = 0;
        self.reset_browser();
        self.view = if dimension == Dimension::All {
            View::Channels
        } else {
            View::Browser
        };
        self.browse.select(Selection::for_dimension(dimension))
    }

    /// Reload the current selection. Nothing to retry while no entry is picked.
    pub fn retry(&mut self) -> Option<LoadRequest> {
        if !self.browse.selection().is_complete() {
            return None;
        }
        self.selected_index = 0;
        self.browse.retry()
    }

    fn reset_browser(&mut self) {
        self.browser_query.clear();
        self.browser_index = 0;
        self.browser_country = None;
    }

    /// Catalog entry indices matching the browser query
    fn browser_matches(&self) -> Vec<usize> {
        let query = self.browser_query.trim().to_lowercase();

        let labels: Vec<&str> = match self.browser_country.and_then(|i| self.catalog.countries.get(i)) {
            Some(country) => country.subdivisions.iter().map(|s| s.name.as_str()).collect(),
            None => self
                .catalog
                .entries(self.browse.dimension())
                .into_iter()
                .map(|e| e.label())
                .collect(),
        };

        labels
            .iter()
            .enumerate()
            .filter(|(_, label)| query.is_empty() || label.to_lowercase().contains(&query))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn browser_rows(&self) -> Vec<BrowserRow> {
        let matches = self.browser_matches();

        if let Some(country) = self.browser_country.and_then(|i| self.catalog.countries.get(i)) {
            return matches
                .into_iter()
                .map(|i| {
                    let sub = &country.subdivisions[i];
                    BrowserRow {
                        label: sub.name.clone(),
                        channels: sub.channels,
                        flag: None,
                        has_subdivisions: false,
                    }
                })
                .collect();
        }

        let dimension = self.browse.dimension();
        let entries = self.catalog.entries(dimension);
        matches
            .into_iter()
            .map(|i| {
                let entry = entries[i];
                let (flag, has_subdivisions) = match dimension {
                    Dimension::Country => {
                        let country = &self.catalog.countries[i];
                        (country.flag.clone(), !country.subdivisions.is_empty())
                    }
                    _ => (None, false),
                };
                BrowserRow {
                    label: entry.label().to_string(),
                    channels: entry.channels(),
                    flag,
                    has_subdivisions,
                }
            })
            .collect()
    }

    /// The selection the highlighted browser row stands for
    pub fn browser_selection(&self) -> Option<Selection> {
        let index = *self.browser_matches().get(self.browser_index)?;

        if let Some(ci) = self.browser_country {
            let country = self.catalog.countries.get(ci)?;
            let sub = country.subdivisions.get(index)?;
            return Some(Selection::Country(Some(CountryPick::subdivision(
                country.clone(),
                sub.clone(),
            ))));
        }

        let selection = match self.browse.dimension() {
            Dimension::All => return None,
            Dimension::Category => Selection::Category(Some(self.catalog.categories.get(index)?.clone())),
            Dimension::Language => Selection::Language(Some(self.catalog.languages.get(index)?.clone())),
            Dimension::Country => Selection::Country(Some(CountryPick::country(
                self.catalog.countries.get(index)?.clone(),
            ))),
            Dimension::Region => Selection::Region(Some(self.catalog.regions.get(index)?.clone())),
        };
        Some(selection)
    }

    /// Load the highlighted browser row
    pub fn confirm_browser(&mut self) -> Option<LoadRequest> {
        let selection = self.browser_selection()?;
        self.view = View::Channels;
        self.selected_index = 0;
        self.browse.select(selection)
    }

    /// Descend into the highlighted country's subdivisions
    pub fn open_subdivisions(&mut self) -> bool {
        if self.browse.dimension() != Dimension::Country || self.browser_country.is_some() {
            return false;
        }

        let Some(&index) = self.browser_matches().get(self.browser_index) else {
            return false;
        };

        if self.catalog.countries[index].subdivisions.is_empty() {
            return false;
        }

        self.browser_country = Some(index);
        self.browser_query.clear();
        self.browser_index = 0;
        true
    }

    /// Back out of a subdivision list. Returns false if already at the top.
    pub fn close_subdivisions(&mut self) -> bool {
        if self.browser_country.take().is_none() {
            return false;
        }
        self.browser_query.clear();
        self.browser_index = 0;
        true
    }

    pub fn browser_next(&mut self) {
        let len = self.browser_matches().len();
        if len > 0 {
            self.browser_index = (self.browser_index + 1) % len;
        }
    }

    pub fn browser_previous(&mut self) {
        let len = self.browser_matches().len();
        if len > 0 {
            self.browser_index = self.browser_index.checked_sub(1).unwrap_or(len - 1);
        }
    }

    pub fn browser_type(&mut self, c: char) {
        self.browser_query.push(c);
        self.browser_index = 0;
    }

    pub fn browser_backspace(&mut self) {
        self.browser_query.pop();
        self.browser_index = 0;
    }

    /// Move down the channel list, pulling in the next page at the end of the window
    pub fn select_next(&mut self) {
        let shown = self.browse.shown_len();
        if shown == 0 {
            return;
        }

        if self.selected_index + 1 >= shown {
            if self.browse.load_more() {
                self.selected_index += 1;
            }
        } else {
            self.selected_index += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    pub fn page_down(&mut self, rows: usize) {
        for _ in 0..rows {
            self.select_next();
        }
    }

    pub fn page_up(&mut self, rows: usize) {
        self.selected_index = self.selected_index.saturating_sub(rows);
    }

    pub fn selected_channel(&self) -> Option<&Channel> {
        self.browse.displayed().get(self.selected_index).copied()
    }

    /// Make the highlighted channel current and return it for playback
    pub fn tune_selected(&mut self) -> Option<Channel> {
        self.browse.select_channel(self.selected_index).cloned()
    }

    /// Record a search keystroke; returns the sequence number to settle later
    pub fn search_type(&mut self, c: char) -> u64 {
        self.search_input.push(c);
        self.search_seq += 1;
        self.search_seq
    }

    pub fn search_backspace(&mut self) -> u64 {
        self.search_input.pop();
        self.search_seq += 1;
        self.search_seq
    }

    pub fn search_clear(&mut self) {
        self.search_input.clear();
        self.search_seq += 1;
        self.apply_search();
    }

    /// Apply the debounced search term if no newer keystroke arrived
    pub fn settle_search(&mut self, seq: u64) -> bool {
        if seq != self.search_seq {
            return false;
        }
        self.apply_search();
        true
    }

    fn apply_search(&mut self) {
        self.browse.set_search(&self.search_input);
        self.selected_index = 0;
    }

    pub fn cycle_filter(&mut self) {
        self.browse.cycle_filter();
        self.selected_index = 0;
    }

    /// Keep the cursor inside the window after the list changed underneath it
    pub fn clamp_selection(&mut self) {
        let shown = self.browse.shown_len();
        if self.selected_index >= shown {
            self.selected_index = shown.saturating_sub(1);
        }
    }
}
