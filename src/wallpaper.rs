use crate::config::Config;
use image::{ImageFormat, RgbImage};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// GNOME settings schema holding the desktop background.
const BACKGROUND_SCHEMA: &str = "org.gnome.desktop.background";
/// Light and dark variants; both are pointed at the same file.
const PICTURE_KEYS: [&str; 2] = ["picture-uri", "picture-uri-dark"];

/// Writes rendered frames to disk and hands them to the desktop.
pub struct WallpaperPublisher {
    path: PathBuf,
    gsettings_bin: String,
    set_wallpaper: bool,
}

impl WallpaperPublisher {
    pub fn new(cfg: &Config) -> Self {
        Self {
            path: cfg.wallpaper_path.clone(),
            gsettings_bin: cfg.gsettings_bin.clone(),
            set_wallpaper: cfg.set_wallpaper,
        }
    }

    /// Save the frame as PNG, overwriting the previous one, then point the
    /// desktop background at it (unless disabled).
    pub fn publish(&self, frame: &RgbImage) -> Result<(), String> {
        save_png(frame, &self.path)?;
        if !self.set_wallpaper {
            debug!("Frame written to {:?} (wallpaper update disabled)", self.path);
            return Ok(());
        }

        let uri = file_uri(&self.path)?;
        for key in PICTURE_KEYS {
            self.gsettings_set(key, &uri)?;
        }
        info!("Wallpaper updated: {}", self.path.display());
        Ok(())
    }

    fn gsettings_set(&self, key: &str, value: &str) -> Result<(), String> {
        let status = Command::new(&self.gsettings_bin)
            .args(["set", BACKGROUND_SCHEMA, key, value])
            .stdin(Stdio::null())
            .status()
            .map_err(|e| format!("run {}: {}", self.gsettings_bin, e))?;
        if !status.success() {
            return Err(format!(
                "{} set {} {} failed: {}",
                self.gsettings_bin, BACKGROUND_SCHEMA, key, status
            ));
        }
        Ok(())
    }
}

/// Write `frame` to `path` as PNG, creating the parent directory.
pub fn save_png(frame: &RgbImage, path: &Path) -> Result<(), String> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| format!("create {}: {}", dir.display(), e))?;
    }
    frame
        .save_with_format(path, ImageFormat::Png)
        .map_err(|e| format!("write {}: {}", path.display(), e))
}

/// `file://` URI for a path, made absolute against the working directory.
pub fn file_uri(path: &Path) -> Result<String, String> {
    let abs = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| format!("resolve {}: {}", path.display(), e))?
            .join(path)
    };
    Ok(format!("file://{}", abs.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn publisher(path: PathBuf, gsettings_bin: &str, set_wallpaper: bool) -> WallpaperPublisher {
        let cfg = Config {
            wallpaper_path: path,
            gsettings_bin: gsettings_bin.into(),
            set_wallpaper,
            ..Config::default()
        };
        WallpaperPublisher::new(&cfg)
    }

    #[test]
    fn test_file_uri_absolute() {
        assert_eq!(
            file_uri(Path::new("/home/op/.rtl_spectrum_wallpaper.png")).unwrap(),
            "file:///home/op/.rtl_spectrum_wallpaper.png"
        );
    }

    #[test]
    fn test_file_uri_relative() {
        let uri = file_uri(Path::new("wall.png")).unwrap();
        assert!(uri.starts_with("file:///"), "got: {}", uri);
        assert!(uri.ends_with("/wall.png"), "got: {}", uri);
    }

    #[test]
    fn test_publish_without_desktop_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("wall.png");
        let frame = RgbImage::from_pixel(8, 4, Rgb([10, 10, 20]));

        publisher(path.clone(), "gsettings", false).publish(&frame).unwrap();

        let back = image::open(&path).unwrap().to_rgb8();
        assert_eq!(back, frame);
    }

    #[test]
    fn test_publish_overwrites_previous_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wall.png");
        let p = publisher(path.clone(), "gsettings", false);

        p.publish(&RgbImage::from_pixel(4, 4, Rgb([0, 0, 0]))).unwrap();
        p.publish(&RgbImage::from_pixel(4, 4, Rgb([255, 0, 0]))).unwrap();

        let back = image::open(&path).unwrap().to_rgb8();
        assert_eq!(*back.get_pixel(0, 0), Rgb([255, 0, 0]));
    }

    #[test]
    fn test_publish_reports_missing_settings_tool() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wall.png");
        let frame = RgbImage::from_pixel(4, 4, Rgb([0, 0, 0]));

        let err = publisher(path.clone(), "/nonexistent/gsettings", true)
            .publish(&frame)
            .unwrap_err();
        assert!(err.contains("run /nonexistent/gsettings"), "got: {}", err);
        // The frame still reached disk
        assert!(path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_publish_reports_failed_settings_call() {
        let dir = tempfile::tempdir().unwrap();
        let frame = RgbImage::from_pixel(4, 4, Rgb([0, 0, 0]));

        let err = publisher(dir.path().join("wall.png"), "false", true)
            .publish(&frame)
            .unwrap_err();
        assert!(err.contains("picture-uri failed"), "got: {}", err);
    }

    #[cfg(unix)]
    #[test]
    fn test_publish_with_succeeding_settings_tool() {
        let dir = tempfile::tempdir().unwrap();
        let frame = RgbImage::from_pixel(4, 4, Rgb([0, 0, 0]));
        assert!(publisher(dir.path().join("wall.png"), "true", true).publish(&frame).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_publish_sets_light_and_dark_uri() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let calls = dir.path().join("calls.log");
        let script = dir.path().join("fake_gsettings");
        fs::write(
            &script,
            format!("#!/bin/sh\necho \"$@\" >> '{}'\n", calls.display()),
        )
        .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let wall = dir.path().join("wall.png");
        let frame = RgbImage::from_pixel(4, 4, Rgb([0, 0, 0]));
        publisher(wall.clone(), script.to_str().unwrap(), true)
            .publish(&frame)
            .unwrap();

        let log = fs::read_to_string(&calls).unwrap();
        let lines: Vec<&str> = log.lines().collect();
        let uri = format!("file://{}", wall.display());
        assert_eq!(
            lines,
            vec![
                format!("set org.gnome.desktop.background picture-uri {}", uri),
                format!("set org.gnome.desktop.background picture-uri-dark {}", uri),
            ]
        );
    }
}
