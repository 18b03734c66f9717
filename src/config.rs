use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::constants::{FADE_SPEED, FPS, WINDOW_HEIGHT, WINDOW_WIDTH};
use crate::error::{Result, ViewerError};
use crate::image_set::ImageSet;
use crate::look::LookSettings;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub width: i32,
    pub height: i32,
    pub fps: u32,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            width: WINDOW_WIDTH,
            height: WINDOW_HEIGHT,
            fps: FPS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory to scan, or the base for relative entries in `images`.
    pub image_dir: Option<PathBuf>,
    /// Explicit panorama list. Takes precedence over scanning `image_dir`.
    pub images: Vec<PathBuf>,
    pub start_index: usize,
    pub shuffle: bool,
    /// Overlay opacity change per second.
    pub fade_speed: f32,
    pub log_missing_subscribers: bool,
    pub look: LookSettings,
    pub window: WindowSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            image_dir: None,
            images: Vec::new(),
            start_index: 0,
            shuffle: false,
            fade_speed: FADE_SPEED,
            log_missing_subscribers: true,
            look: LookSettings::default(),
            window: WindowSettings::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|source| ViewerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ViewerError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if !self.fade_speed.is_finite() || self.fade_speed < 0.0 {
            return Err(ViewerError::InvalidConfig(format!(
                "fade_speed must be a non-negative number, got {}",
                self.fade_speed
            )));
        }
        if self.window.width <= 0 || self.window.height <= 0 {
            return Err(ViewerError::InvalidConfig(format!(
                "window size must be positive, got {}x{}",
                self.window.width, self.window.height
            )));
        }
        if self.image_dir.is_none() && self.images.is_empty() {
            return Err(ViewerError::InvalidConfig(
                "either image_dir or images must be set".to_string(),
            ));
        }
        Ok(())
    }

    /// Builds the panorama list this config describes.
    pub fn image_set(&self) -> Result<ImageSet> {
        let set = if self.images.is_empty() {
            match &self.image_dir {
                Some(dir) => ImageSet::from_dir(dir)?,
                None => {
                    return Err(ViewerError::InvalidConfig(
                        "either image_dir or images must be set".to_string(),
                    ));
                }
            }
        } else {
            let paths = self
                .images
                .iter()
                .map(|path| match &self.image_dir {
                    Some(dir) if path.is_relative() => dir.join(path),
                    _ => path.clone(),
                })
                .collect();
            ImageSet::new(paths)
        };

        Ok(if self.shuffle { set.shuffled() } else { set })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn parses_nested_sections() {
        let config: Config = toml::from_str(
            r#"
            image_dir = "panoramas"
            images = ["b.jpg", "/abs/a.jpg"]
            fade_speed = 0.5
            log_missing_subscribers = false

            [look]
            invert_y = true
            vertical_clamp = 45.0

            [window]
            width = 800
            "#,
        )
        .unwrap();

        assert_eq!(config.fade_speed, 0.5);
        assert!(!config.log_missing_subscribers);
        assert!(config.look.invert_y);
        assert_eq!(config.look.vertical_clamp, 45.0);
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, WINDOW_HEIGHT);
        config.validate().unwrap();

        let set = config.image_set().unwrap();
        let paths: Vec<_> = set.iter().collect();
        assert_eq!(paths, vec![Path::new("panoramas/b.jpg"), Path::new("/abs/a.jpg")]);
    }

    #[test]
    fn rejects_negative_fade_speed() {
        let config = Config {
            fade_speed: -1.0,
            image_dir: Some(PathBuf::from(".")),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ViewerError::InvalidConfig(_))));
    }

    #[test]
    fn requires_a_source_of_images() {
        assert!(Config::default().validate().is_err());
        assert!(Config::default().image_set().is_err());
    }

    #[test]
    fn unknown_types_are_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("viewer.toml");
        fs::write(&path, "fade_speed = \"fast\"").unwrap();
        assert!(matches!(Config::load(&path), Err(ViewerError::ConfigParse { .. })));
    }

    #[test]
    fn scans_image_dir_when_no_list_given() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("one.jpg")).unwrap();
        let config = Config {
            image_dir: Some(dir.path().to_path_buf()),
            ..Config::default()
        };
        assert_eq!(config.image_set().unwrap().len(), 1);
    }
}
