//! Runtime configuration: one immutable value built at startup.
//!
//! Built-in defaults reproduce the classic FM-band wallpaper (88–108 MHz,
//! 10 kHz bins, 1920×1080). A JSON file may override any subset of fields;
//! CLI flags are applied on top by the binary.

use crate::types::{RenderStyle, Rgb};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // ─── Capture ────────────────────────────────────────────────
    /// Sweep tool executable
    pub rtl_power_bin: String,
    /// Range start, in the sweep tool's notation (e.g. "88M")
    pub freq_start: String,
    pub freq_end: String,
    /// Bin width (e.g. "10k")
    pub freq_step: String,
    /// Tuner gain, 0–50 or "auto"
    pub gain: String,
    /// Integration interval; also used as the tool's exit timer
    pub integration: String,
    /// CSV the sweep tool appends to
    pub capture_path: PathBuf,

    // ─── Timing ─────────────────────────────────────────────────
    pub update_interval_secs: u64,
    pub initial_delay_secs: u64,

    // ─── Output ─────────────────────────────────────────────────
    pub wallpaper_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub set_wallpaper: bool,
    pub gsettings_bin: String,

    // ─── Style ──────────────────────────────────────────────────
    pub style: RenderStyle,
    pub background: Rgb,
    pub spectrum_color: Rgb,
    pub text_color: Rgb,
    pub grid_color: Rgb,
    pub margin_x: u32,
    pub margin_y: u32,
    pub font_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rtl_power_bin: "rtl_power".into(),
            freq_start: "88M".into(),
            freq_end: "108M".into(),
            freq_step: "10k".into(),
            gain: "40".into(),
            integration: "2s".into(),
            capture_path: PathBuf::from("/tmp/rtl_spectrum.csv"),

            update_interval_secs: 5,
            initial_delay_secs: 5,

            wallpaper_path: default_wallpaper_path(),
            width: 1920,
            height: 1080,
            set_wallpaper: true,
            gsettings_bin: "gsettings".into(),

            style: RenderStyle::Bars,
            background: (10, 10, 20),
            spectrum_color: (0, 255, 100),
            text_color: (100, 255, 200),
            grid_color: (30, 30, 50),
            margin_x: 100,
            margin_y: 100,
            font_path: PathBuf::from("/usr/share/fonts/dejavu/DejaVuSansMono.ttf"),
        }
    }
}

fn default_wallpaper_path() -> PathBuf {
    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    home.join(".rtl_spectrum_wallpaper.png")
}

impl Config {
    /// Load overrides from a JSON file on top of the defaults.
    pub fn load(path: &Path) -> Result<Self, String> {
        let text = fs::read_to_string(path)
            .map_err(|e| format!("read config {}: {}", path.display(), e))?;
        Self::from_json(&text).map_err(|e| format!("{}: {}", path.display(), e))
    }

    pub fn from_json(text: &str) -> Result<Self, String> {
        serde_json::from_str(text).map_err(|e| format!("parse config: {}", e))
    }

    /// Reject configurations that cannot produce a frame.
    pub fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!("frame size {}x{} is empty", self.width, self.height));
        }
        if self.margin_x.saturating_mul(2) >= self.width
            || self.margin_y.saturating_mul(2) >= self.height
        {
            return Err(format!(
                "margins {}x{} leave no plot area in a {}x{} frame",
                self.margin_x, self.margin_y, self.width, self.height
            ));
        }
        if self.update_interval_secs == 0 {
            return Err("update interval must be at least 1s".into());
        }
        Ok(())
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_secs)
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_secs)
    }

    pub fn plot_width(&self) -> u32 {
        self.width.saturating_sub(self.margin_x.saturating_mul(2))
    }

    pub fn plot_height(&self) -> u32 {
        self.height.saturating_sub(self.margin_y.saturating_mul(2))
    }

    /// Argument vector for the sweep tool (everything after the binary name).
    pub fn rtl_power_args(&self) -> Vec<String> {
        vec![
            "-f".into(),
            format!("{}:{}:{}", self.freq_start, self.freq_end, self.freq_step),
            "-g".into(),
            self.gain.clone(),
            "-i".into(),
            self.integration.clone(),
            "-e".into(),
            self.integration.clone(),
            self.capture_path.display().to_string(),
        ]
    }
}
