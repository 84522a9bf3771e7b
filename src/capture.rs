use crate::config::Config;
use log::{info, warn};
use std::fs;
use std::io;
use std::process::{Child, Command, Stdio};

/// Handle to the running sweep tool. Owned by the loop driver; stopping it
/// consumes the handle.
pub struct CaptureProcess {
    child: Child,
    program: String,
}

impl CaptureProcess {
    /// Remove any stale capture file and launch the sweep tool against it.
    pub fn start(cfg: &Config) -> Result<Self, String> {
        match fs::remove_file(&cfg.capture_path) {
            Ok(()) => info!("Removed stale capture file {:?}", cfg.capture_path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(format!("remove {}: {}", cfg.capture_path.display(), e)),
        }

        let args = cfg.rtl_power_args();
        info!("Starting {} {}", cfg.rtl_power_bin, args.join(" "));

        // Output is never read; a pipe would eventually fill and stall the tool.
        let child = Command::new(&cfg.rtl_power_bin)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| format!("spawn {}: {}", cfg.rtl_power_bin, e))?;

        Ok(Self {
            child,
            program: cfg.rtl_power_bin.clone(),
        })
    }

    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Whether the tool is still alive. Reaps it if it has exited.
    pub fn is_running(&mut self) -> bool {
        match self.child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                warn!("{} exited: {}", self.program, status);
                false
            }
            Err(e) => {
                warn!("poll {}: {}", self.program, e);
                false
            }
        }
    }

    /// Kill the tool and wait for it to exit.
    pub fn stop(mut self) {
        info!("Stopping {} (pid {})", self.program, self.child.id());
        if let Err(e) = self.child.kill() {
            // Already exited
            warn!("kill {}: {}", self.program, e);
        }
        match self.child.wait() {
            Ok(status) => info!("{} stopped: {}", self.program, status),
            Err(e) => warn!("wait {}: {}", self.program, e),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn cfg_with(bin: &str, capture_path: PathBuf) -> Config {
        Config {
            rtl_power_bin: bin.into(),
            capture_path,
            ..Config::default()
        }
    }

    #[test]
    fn test_start_removes_stale_capture_file() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("rtl_spectrum.csv");
        fs::write(&csv, "old,row\n").unwrap();

        // `true` ignores the sweep arguments and exits immediately
        let capture = CaptureProcess::start(&cfg_with("true", csv.clone())).unwrap();
        assert!(!csv.exists(), "stale capture file should be gone");
        capture.stop();
    }

    #[test]
    fn test_start_missing_binary() {
        let dir = tempfile::tempdir().unwrap();
        let result = CaptureProcess::start(&cfg_with(
            "/nonexistent/rtl_power",
            dir.path().join("rtl_spectrum.csv"),
        ));
        let err = result.err().unwrap();
        assert!(err.contains("spawn /nonexistent/rtl_power"), "got: {}", err);
    }

    #[test]
    fn test_running_tool_is_stopped() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake_rtl_power");
        fs::write(&script, "#!/bin/sh\nexec sleep 30\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let cfg = cfg_with(
            script.to_str().unwrap(),
            dir.path().join("rtl_spectrum.csv"),
        );
        let mut capture = CaptureProcess::start(&cfg).unwrap();
        assert!(capture.is_running());
        assert!(capture.id() > 0);
        capture.stop();
    }

    #[test]
    fn test_exited_tool_is_not_running() {
        let dir = tempfile::tempdir().unwrap();
        let mut capture =
            CaptureProcess::start(&cfg_with("true", dir.path().join("rtl_spectrum.csv"))).unwrap();
        // Give `true` time to exit
        for _ in 0..100 {
            if !capture.is_running() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(20));
        }
        assert!(!capture.is_running());
        capture.stop();
    }
}
