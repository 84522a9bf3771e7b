use spectrum_wallpaper::capture::CaptureProcess;
use spectrum_wallpaper::config::Config;
use spectrum_wallpaper::driver::Driver;
use spectrum_wallpaper::renderer::Renderer;
use spectrum_wallpaper::types::RenderStyle;

use clap::Parser;
use crossbeam_channel::bounded;
use log::{error, info, warn};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "spectrum-wallpaper")]
#[command(about = "Render live RTL-SDR spectrum sweeps as the desktop wallpaper")]
struct Cli {
    /// JSON file overriding the built-in defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Spectrum drawing style
    #[arg(long, value_enum)]
    style: Option<RenderStyle>,

    /// Seconds between wallpaper updates
    #[arg(long)]
    interval: Option<u64>,

    /// Where the rendered PNG is written
    #[arg(long)]
    output: Option<PathBuf>,

    /// CSV file the sweep tool appends to
    #[arg(long)]
    capture_file: Option<PathBuf>,

    /// Do not launch rtl_power; render whatever the capture file already holds
    #[arg(long)]
    no_capture: bool,

    /// Write the PNG but leave the desktop background alone
    #[arg(long)]
    no_wallpaper: bool,

    /// Render and publish a single frame, then exit
    #[arg(long)]
    once: bool,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    dump_config: bool,
}

impl Cli {
    /// Defaults ← JSON file ← command-line flags.
    fn resolve_config(&self) -> Result<Config, String> {
        let mut cfg = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(style) = self.style {
            cfg.style = style;
        }
        if let Some(secs) = self.interval {
            cfg.update_interval_secs = secs;
        }
        if let Some(path) = &self.output {
            cfg.wallpaper_path = path.clone();
        }
        if let Some(path) = &self.capture_file {
            cfg.capture_path = path.clone();
        }
        if self.no_wallpaper {
            cfg.set_wallpaper = false;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .format_timestamp_millis()
    .init();

    let cli = Cli::parse();
    let cfg = match cli.resolve_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            process::exit(2);
        }
    };

    if cli.dump_config {
        match serde_json::to_string_pretty(&cfg) {
            Ok(json) => println!("{}", json),
            Err(e) => error!("Failed to serialize config: {}", e),
        }
        return;
    }

    info!("═══════════════════════════════════════════════");
    info!("  RTL-SDR SPECTRUM WALLPAPER v{}", env!("CARGO_PKG_VERSION"));
    info!("  Frequency range: {} - {} (step {})", cfg.freq_start, cfg.freq_end, cfg.freq_step);
    info!("  Wallpaper path: {}", cfg.wallpaper_path.display());
    info!("  Update interval: {}s", cfg.update_interval_secs);
    info!("  Style: {}", cfg.style);
    info!("  Press Ctrl+C to stop");
    info!("═══════════════════════════════════════════════");

    // Signal handler → driver. Capacity 1: repeated signals collapse.
    let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = shutdown_tx.try_send(());
    }) {
        warn!("Failed to install signal handler: {}", e);
    }

    let capture = if cli.no_capture || cli.once {
        info!("Not launching capture tool; reading {:?}", cfg.capture_path);
        None
    } else {
        match CaptureProcess::start(&cfg) {
            Ok(capture) => {
                info!("Capture tool running (pid {})", capture.id());
                Some(capture)
            }
            Err(e) => {
                // Keep running: the placeholder frame makes the failure visible.
                error!("Failed to start capture tool: {}", e);
                None
            }
        }
    };

    let renderer = Renderer::new(&cfg);
    let driver = Driver::new(cfg, renderer, capture, shutdown_rx);
    if cli.once {
        driver.run_once();
    } else {
        driver.run();
    }
}
