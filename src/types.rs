use serde::{Deserialize, Serialize};
use std::fmt;

// ─── Sweep data from the capture file ───────────────────────────────────────

/// One frequency/power snapshot parsed from the newest capture row.
#[derive(Debug, Clone, PartialEq)]
pub struct Sweep {
    /// Lower bound of the swept range, Hz
    pub freq_low: f64,
    /// Upper bound of the swept range, Hz
    pub freq_high: f64,
    /// Power per frequency bin, dB, ordered low → high
    pub power_readings: Vec<f64>,
}

impl Sweep {
    pub fn freq_low_mhz(&self) -> f64 {
        self.freq_low / 1e6
    }

    pub fn freq_high_mhz(&self) -> f64 {
        self.freq_high / 1e6
    }

    /// Strongest bin, if any.
    pub fn peak_db(&self) -> Option<f64> {
        self.power_readings.iter().copied().reduce(f64::max)
    }
}

impl fmt::Display for Sweep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.3}–{:.3} MHz  {} bins",
            self.freq_low_mhz(),
            self.freq_high_mhz(),
            self.power_readings.len(),
        )?;
        if let Some(peak) = self.peak_db() {
            write!(f, "  peak {:.1} dB", peak)?;
        }
        Ok(())
    }
}

// ─── Rendering ──────────────────────────────────────────────────────────────

/// How each power reading is drawn.
/// Serializes lowercase ("bars", "glyphs") in config files and on the CLI.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RenderStyle {
    /// Filled vertical bars colored by the intensity gradient
    Bars,
    /// Stacked shade glyphs from the intensity ramp
    Glyphs,
}

impl fmt::Display for RenderStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderStyle::Bars => write!(f, "bars"),
            RenderStyle::Glyphs => write!(f, "glyphs"),
        }
    }
}

/// RGB triple, 0–255 per channel.
pub type Rgb = (u8, u8, u8);

// ─── Loop driver ────────────────────────────────────────────────────────────

/// Result of one read → render → publish cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// A sweep was rendered and published
    Published(Sweep),
    /// No usable sweep yet; the placeholder frame was published
    NoData,
    /// Rendering or publishing failed; nothing new reached the desktop
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Capture tool launched, waiting out the initial delay
    WaitingForFirstData,
    /// Steady-state tick loop
    Running,
}
