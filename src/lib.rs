pub mod browse;
pub mod catalog;
pub mod config;
pub mod doctor;
pub mod fetcher;
pub mod player;
pub mod playlist;
pub mod tui;
