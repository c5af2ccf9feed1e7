pub mod analysis;
pub mod app;
pub mod audio;
pub mod config;
pub mod logging;
pub mod player;
pub mod prefs;
pub mod render;
pub mod terminal;
pub mod visual;
