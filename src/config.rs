use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub pulse: PulseConfig,
    #[serde(default)]
    pub osd: OsdConfig,
    #[serde(default)]
    pub style: StyleConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PulseConfig {
    #[serde(default = "default_client_name")]
    pub client_name: String,
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            client_name: default_client_name(),
        }
    }
}

fn default_client_name() -> String {
    "volnotd".to_string()
}

/// Fixed screen coordinates for one overlay window.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct WindowPosition {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OsdConfig {
    #[serde(default = "default_hide_timeout_ms")]
    pub hide_timeout_ms: u64,
    #[serde(default = "default_positions")]
    pub positions: Vec<WindowPosition>,
    #[serde(default = "default_window_width")]
    pub window_width: f32,
    #[serde(default = "default_window_height")]
    pub window_height: f32,
    #[serde(default = "default_bar_length")]
    pub bar_length: f32,
}

impl OsdConfig {
    pub fn hide_timeout(&self) -> Duration {
        Duration::from_millis(self.hide_timeout_ms)
    }
}

impl Default for OsdConfig {
    fn default() -> Self {
        Self {
            hide_timeout_ms: default_hide_timeout_ms(),
            positions: default_positions(),
            window_width: default_window_width(),
            window_height: default_window_height(),
            bar_length: default_bar_length(),
        }
    }
}

fn default_hide_timeout_ms() -> u64 {
    3000
}

fn default_positions() -> Vec<WindowPosition> {
    vec![
        WindowPosition { x: 0.0, y: 24.0 },
        WindowPosition { x: 0.0, y: 794.0 },
    ]
}

fn default_window_width() -> f32 {
    96.0
}

fn default_window_height() -> f32 {
    260.0
}

fn default_bar_length() -> f32 {
    160.0
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StyleConfig {
    #[serde(default = "default_background")]
    pub background: String,
    #[serde(default = "default_foreground")]
    pub foreground: String,
    #[serde(default = "default_trough")]
    pub trough: String,
    #[serde(default = "default_bar")]
    pub bar: String,
    #[serde(default = "default_bar_thickness")]
    pub bar_thickness: f32,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            background: default_background(),
            foreground: default_foreground(),
            trough: default_trough(),
            bar: default_bar(),
            bar_thickness: default_bar_thickness(),
            font_size: default_font_size(),
        }
    }
}

fn default_background() -> String {
    "#000000".to_string()
}

fn default_foreground() -> String {
    "#ffffff".to_string()
}

fn default_trough() -> String {
    "#333333".to_string()
}

fn default_bar() -> String {
    "#00ddff".to_string()
}

fn default_bar_thickness() -> f32 {
    30.0
}

fn default_font_size() -> f32 {
    12.0
}

impl Config {
    pub fn load() -> Result<Self, figment::Error> {
        let dirs = ProjectDirs::from("com", "volnotd", "volnotd")
            .expect("Failed to determine project directories");

        let config_path = dirs.config_dir().join("config.toml");

        let figment = Figment::new()
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("VOLNOTD_").split("_"));

        let config: Config = figment.extract()?;

        Ok(config)
    }

    pub fn load_from_path(path: PathBuf) -> Result<Self, figment::Error> {
        let figment = Figment::new().merge(Toml::file(path));

        let config: Config = figment.extract()?;

        Ok(config)
    }
}
