use crate::capture::CaptureProcess;
use crate::config::Config;
use crate::renderer::Renderer;
use crate::sweep_reader::read_latest_sweep;
use crate::types::*;
use crate::wallpaper::WallpaperPublisher;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use log::{debug, error, info, warn};
use std::time::Duration;

/// The driver owns the capture tool and runs the read → render → publish
/// loop until a shutdown request arrives on `shutdown_rx`.
///
/// Every sleep is a `recv_timeout` on the shutdown channel, so a signal
/// interrupts the initial delay or the inter-tick wait immediately. A closed
/// channel counts as a shutdown request.
pub struct Driver {
    cfg: Config,
    renderer: Renderer,
    publisher: WallpaperPublisher,
    capture: Option<CaptureProcess>,
    shutdown_rx: Receiver<()>,
    state: DriverState,
    capture_exit_reported: bool,
}

impl Driver {
    pub fn new(
        cfg: Config,
        renderer: Renderer,
        capture: Option<CaptureProcess>,
        shutdown_rx: Receiver<()>,
    ) -> Self {
        let publisher = WallpaperPublisher::new(&cfg);
        Self {
            cfg,
            renderer,
            publisher,
            capture,
            shutdown_rx,
            state: DriverState::WaitingForFirstData,
            capture_exit_reported: false,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// One cycle: read the newest sweep, render it (or the placeholder),
    /// publish the frame.
    pub fn tick(&self) -> TickOutcome {
        let sweep = read_latest_sweep(&self.cfg.capture_path);
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let frame = self.renderer.render(&self.cfg, sweep.as_ref(), &timestamp);

        if let Err(e) = self.publisher.publish(&frame) {
            return TickOutcome::Failed(e);
        }
        match sweep {
            Some(sweep) => TickOutcome::Published(sweep),
            None => TickOutcome::NoData,
        }
    }

    /// Run until shutdown is requested, then stop the capture tool.
    pub fn run(mut self) {
        info!(
            "Waiting {}s for initial spectrum data...",
            self.cfg.initial_delay_secs
        );
        if self.wait(self.cfg.initial_delay()) {
            return self.shutdown();
        }

        self.state = DriverState::Running;
        loop {
            self.check_capture();
            let outcome = self.tick();
            self.report(&outcome);
            if self.wait(self.cfg.update_interval()) {
                break;
            }
        }
        self.shutdown();
    }

    /// Run exactly one tick without the initial delay, then shut down.
    pub fn run_once(mut self) -> TickOutcome {
        self.state = DriverState::Running;
        let outcome = self.tick();
        self.report(&outcome);
        self.shutdown();
        outcome
    }

    fn report(&self, outcome: &TickOutcome) {
        match outcome {
            TickOutcome::Published(sweep) => debug!("Rendered {}", sweep),
            TickOutcome::NoData => info!("No spectrum data yet; published placeholder frame"),
            TickOutcome::Failed(e) => error!("Wallpaper update failed: {}", e),
        }
    }

    /// Warn once if the capture tool has gone away; frames keep coming from
    /// whatever is already in the capture file.
    fn check_capture(&mut self) {
        if self.capture_exit_reported {
            return;
        }
        if let Some(capture) = self.capture.as_mut() {
            if !capture.is_running() {
                warn!(
                    "Capture tool is no longer running; showing the last sweep in {:?}",
                    self.cfg.capture_path
                );
                self.capture_exit_reported = true;
            }
        }
    }

    /// Sleep for `d`. Returns true if shutdown was requested meanwhile.
    fn wait(&self, d: Duration) -> bool {
        match self.shutdown_rx.recv_timeout(d) {
            Ok(()) => true,
            Err(RecvTimeoutError::Timeout) => false,
            Err(RecvTimeoutError::Disconnected) => true,
        }
    }

    fn shutdown(mut self) {
        info!("Shutting down gracefully...");
        if let Some(capture) = self.capture.take() {
            capture.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;
    use std::fs;
    use std::path::Path;

    fn test_cfg(dir: &Path) -> Config {
        Config {
            capture_path: dir.join("rtl_spectrum.csv"),
            wallpaper_path: dir.join("wall.png"),
            set_wallpaper: false,
            width: 320,
            height: 240,
            margin_x: 20,
            margin_y: 20,
            initial_delay_secs: 0,
            update_interval_secs: 1,
            ..Config::default()
        }
    }

    #[test]
    fn test_tick_without_capture_file() {
        let dir = tempfile::tempdir().unwrap();
        let (_tx, rx) = bounded(1);
        let driver = Driver::new(test_cfg(dir.path()), Renderer::without_text(), None, rx);

        assert_eq!(driver.tick(), TickOutcome::NoData);
        assert!(dir.path().join("wall.png").exists());
    }

    #[test]
    fn test_tick_with_sweep() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = test_cfg(dir.path());
        fs::write(&cfg.capture_path, "d,t,88000000,108000000,10000,2000,-70,-60\n").unwrap();
        let (_tx, rx) = bounded(1);
        let driver = Driver::new(cfg, Renderer::without_text(), None, rx);

        match driver.tick() {
            TickOutcome::Published(sweep) => assert_eq!(sweep.power_readings, vec![-70.0, -60.0]),
            other => panic!("expected Published, got {:?}", other),
        }
    }

    #[test]
    fn test_tick_publish_failure() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config {
            set_wallpaper: true,
            gsettings_bin: "/nonexistent/gsettings".into(),
            ..test_cfg(dir.path())
        };
        let (_tx, rx) = bounded(1);
        let driver = Driver::new(cfg, Renderer::without_text(), None, rx);

        assert!(matches!(driver.tick(), TickOutcome::Failed(_)));
    }

    #[test]
    fn test_shutdown_during_initial_delay() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config {
            initial_delay_secs: 60,
            ..test_cfg(dir.path())
        };
        let (tx, rx) = bounded(1);
        tx.send(()).unwrap();
        let driver = Driver::new(cfg, Renderer::without_text(), None, rx);
        assert_eq!(driver.state(), DriverState::WaitingForFirstData);

        driver.run();
        // No tick ran
        assert!(!dir.path().join("wall.png").exists());
    }

    #[test]
    fn test_run_once() {
        let dir = tempfile::tempdir().unwrap();
        let (_tx, rx) = bounded(1);
        let driver = Driver::new(test_cfg(dir.path()), Renderer::without_text(), None, rx);
        assert_eq!(driver.run_once(), TickOutcome::NoData);
    }
}
