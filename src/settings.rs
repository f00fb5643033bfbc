//! Persistent operator settings.
//!
//! Settings are stored as a pretty-printed JSON object in `settings.json` inside the application's
//! data directory. Values the operator has not configured yet are `null`:
//!
//! ```json
//! {
//!     "models_last_scrape_time": 0,
//!     "person_height": 180.0,
//!     "tracking_height": null,
//!     "tracking_distance": null,
//!     "selected_object_detection_model": null,
//!     "debug_mode": false
//! }
//! ```
//!
//! Heights and distances are in centimeters. Unknown keys are ignored and missing keys take their
//! default value, so files written by older versions keep loading.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::resolution::Resolution;

/// File name of the settings file inside the data directory.
pub const SETTINGS_FILE: &str = "settings.json";

/// The operator settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(skip)]
    path: Option<PathBuf>,

    /// Unix timestamp of the last time the model list was refreshed.
    pub models_last_scrape_time: u64,
    /// Real height of the person to track.
    pub person_height: Option<f32>,
    /// Height above ground the drone should hold while tracking a person.
    pub tracking_height: Option<f32>,
    /// Distance the drone should keep from the tracked person.
    pub tracking_distance: Option<f32>,
    /// The object detection model used for human tracking.
    pub selected_object_detection_model: Option<ModelSelection>,
    /// Whether the annotated frame (rather than the raw camera frame) should be displayed.
    pub debug_mode: bool,
}

impl Settings {
    /// Loads the settings from `dir`, creating the directory and a default settings file if they
    /// don't exist yet.
    pub fn load_or_create<P: AsRef<Path>>(dir: P) -> anyhow::Result<Self> {
        let dir = dir.as_ref();
        let path = dir.join(SETTINGS_FILE);

        if !path.exists() {
            log::info!("creating default settings file at '{}'", path.display());
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create data directory '{}'", dir.display()))?;
            let settings = Self {
                path: Some(path),
                ..Self::default()
            };
            settings.save()?;
            return Ok(settings);
        }

        Self::load(path)
    }

    /// Loads the settings from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        log::debug!("reading settings from '{}'", path.display());

        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings from '{}'", path.display()))?;
        let mut settings: Settings = serde_json::from_str(&json)
            .with_context(|| format!("malformed settings file '{}'", path.display()))?;
        settings.path = Some(path.to_path_buf());
        Ok(settings)
    }

    /// Writes the settings back to the file they were loaded from.
    pub fn save(&self) -> anyhow::Result<()> {
        let Some(path) = &self.path else {
            anyhow::bail!("settings were not loaded from a file");
        };
        log::debug!("writing settings to '{}'", path.display());

        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .with_context(|| format!("failed to write settings to '{}'", path.display()))
    }

    /// Returns the path of the backing settings file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// An object detection model picked by the operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSelection {
    pub model_name: String,
    /// Input size of the network, as `"WxH"`.
    pub size: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_link: Option<String>,
    #[serde(default)]
    pub downloaded: bool,
    /// Local path of the model, `null` until it has been downloaded.
    #[serde(default)]
    pub downloaded_path: Option<PathBuf>,
}

impl ModelSelection {
    /// Parses the network input size.
    pub fn input_resolution(&self) -> Result<Resolution, Error> {
        self.size.parse().map_err(|e| Error::InvalidSetting {
            key: "selected_object_detection_model.size",
            reason: format!("{e}"),
        })
    }
}

/// Everything human tracking needs from the [`Settings`], validated.
#[derive(Debug, Clone, PartialEq)]
pub struct HumanTrackingSettings {
    pub model_path: PathBuf,
    pub input_resolution: Resolution,
    pub tracking_distance: f32,
    pub tracking_height: f32,
    pub person_height: f32,
}

impl HumanTrackingSettings {
    /// Extracts the human tracking parameters.
    ///
    /// Fails if a model has not been selected and downloaded, or if one of the geometric targets
    /// has not been configured.
    pub fn from_settings(settings: &Settings) -> Result<Self, Error> {
        let model = settings
            .selected_object_detection_model
            .as_ref()
            .ok_or(Error::MissingSetting("selected_object_detection_model"))?;
        let model_path = model
            .downloaded_path
            .clone()
            .ok_or(Error::MissingSetting("selected_object_detection_model.downloaded_path"))?;
        let input_resolution = model.input_resolution()?;

        let tracking_distance = positive(settings.tracking_distance, "tracking_distance")?;
        let tracking_height = positive(settings.tracking_height, "tracking_height")?;
        let person_height = positive(settings.person_height, "person_height")?;

        Ok(Self {
            model_path,
            input_resolution,
            tracking_distance,
            tracking_height,
            person_height,
        })
    }
}

fn positive(value: Option<f32>, key: &'static str) -> Result<f32, Error> {
    let value = value.ok_or(Error::MissingSetting(key))?;
    if !(value > 0.0) || !value.is_finite() {
        return Err(Error::InvalidSetting {
            key,
            reason: format!("expected a positive length, got {value}"),
        });
    }
    Ok(value)
}
