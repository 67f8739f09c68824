use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::alert::{AlertSettings, DEFAULT_COOLDOWN_SECS, DEFAULT_THRESHOLD};
use crate::labels::LabelResolver;
use crate::policy::AlertPolicy;
use crate::voice::{VoiceMode, DEFAULT_PROGRAM, DEFAULT_QUEUE_CAPACITY, DEFAULT_RATE};

const DEFAULT_SOURCE_URI: &str = "stub://camera";
const DEFAULT_SOURCE_FPS: u32 = 10;
const DEFAULT_SOURCE_WIDTH: u32 = 640;
const DEFAULT_SOURCE_HEIGHT: u32 = 480;
const DEFAULT_BACKEND: &str = "stub";
// SSD MobileNet v2 input.
const DEFAULT_INPUT_WIDTH: u32 = 300;
const DEFAULT_INPUT_HEIGHT: u32 = 300;

#[derive(Debug, Deserialize, Default)]
struct SpotterConfigFile {
    labels_path: Option<PathBuf>,
    source: Option<SourceConfigFile>,
    detector: Option<DetectorConfigFile>,
    alerts: Option<AlertsConfigFile>,
    voice: Option<VoiceConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct SourceConfigFile {
    uri: Option<String>,
    target_fps: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
    max_frames: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectorConfigFile {
    backend: Option<String>,
    model_path: Option<PathBuf>,
    input_width: Option<u32>,
    input_height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct AlertsConfigFile {
    threshold: Option<f32>,
    cooldown_secs: Option<f64>,
    policy: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Deserialize, Default)]
struct VoiceConfigFile {
    enabled: Option<bool>,
    program: Option<String>,
    rate: Option<u32>,
    mode: Option<VoiceMode>,
    queue_capacity: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct SpotterConfig {
    pub source: SourceSettings,
    pub detector: DetectorSettings,
    /// Label file; the built-in COCO table is used when unset.
    pub labels_path: Option<PathBuf>,
    pub alerts: AlertSettings,
    pub policy: AlertPolicy,
    pub voice: VoiceSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSettings {
    /// `stub://name` for synthetic frames, otherwise a device path.
    pub uri: String,
    pub target_fps: u32,
    pub width: u32,
    pub height: u32,
    /// End the stream after this many frames (synthetic sources only).
    pub max_frames: Option<u64>,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            uri: DEFAULT_SOURCE_URI.to_string(),
            target_fps: DEFAULT_SOURCE_FPS,
            width: DEFAULT_SOURCE_WIDTH,
            height: DEFAULT_SOURCE_HEIGHT,
            max_frames: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectorSettings {
    pub backend: String,
    pub model_path: Option<PathBuf>,
    pub input_width: u32,
    pub input_height: u32,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            backend: DEFAULT_BACKEND.to_string(),
            model_path: None,
            input_width: DEFAULT_INPUT_WIDTH,
            input_height: DEFAULT_INPUT_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceSettings {
    pub enabled: bool,
    pub program: String,
    /// Words per minute.
    pub rate: u32,
    pub mode: VoiceMode,
    pub queue_capacity: usize,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            program: DEFAULT_PROGRAM.to_string(),
            rate: DEFAULT_RATE,
            mode: VoiceMode::default(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl SpotterConfig {
    /// Load from the file named by `SPOTTER_CONFIG` (if any), then apply
    /// environment overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("SPOTTER_CONFIG").ok().map(PathBuf::from);
        Self::load_from(config_path.as_deref())
    }

    /// Load from an explicit file (if any), then apply environment overrides.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => read_config_file(path)?,
            None => SpotterConfigFile::default(),
        };
        let mut cfg = Self::from_file(file_cfg)?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: SpotterConfigFile) -> Result<Self> {
        let source_file = file.source.unwrap_or_default();
        let source = SourceSettings {
            uri: source_file
                .uri
                .unwrap_or_else(|| DEFAULT_SOURCE_URI.to_string()),
            target_fps: source_file.target_fps.unwrap_or(DEFAULT_SOURCE_FPS),
            width: source_file.width.unwrap_or(DEFAULT_SOURCE_WIDTH),
            height: source_file.height.unwrap_or(DEFAULT_SOURCE_HEIGHT),
            max_frames: source_file.max_frames,
        };

        let detector_file = file.detector.unwrap_or_default();
        let detector = DetectorSettings {
            backend: detector_file
                .backend
                .unwrap_or_else(|| DEFAULT_BACKEND.to_string()),
            model_path: detector_file.model_path,
            input_width: detector_file.input_width.unwrap_or(DEFAULT_INPUT_WIDTH),
            input_height: detector_file.input_height.unwrap_or(DEFAULT_INPUT_HEIGHT),
        };

        let alerts_file = file.alerts.unwrap_or_default();
        let alerts = AlertSettings {
            threshold: alerts_file.threshold.unwrap_or(DEFAULT_THRESHOLD),
            cooldown_secs: alerts_file.cooldown_secs.unwrap_or(DEFAULT_COOLDOWN_SECS),
        };
        let policy = match alerts_file.policy {
            Some(entries) => AlertPolicy::from_entries(entries)?,
            None => AlertPolicy::default(),
        };

        let voice_file = file.voice.unwrap_or_default();
        let voice = VoiceSettings {
            enabled: voice_file.enabled.unwrap_or(true),
            program: voice_file
                .program
                .unwrap_or_else(|| DEFAULT_PROGRAM.to_string()),
            rate: voice_file.rate.unwrap_or(DEFAULT_RATE),
            mode: voice_file.mode.unwrap_or_default(),
            queue_capacity: voice_file.queue_capacity.unwrap_or(DEFAULT_QUEUE_CAPACITY),
        };

        Ok(Self {
            source,
            detector,
            labels_path: file.labels_path,
            alerts,
            policy,
            voice,
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(uri) = non_empty_env("SPOTTER_SOURCE") {
            self.source.uri = uri;
        }
        if let Some(backend) = non_empty_env("SPOTTER_BACKEND") {
            self.detector.backend = backend;
        }
        if let Some(model) = non_empty_env("SPOTTER_MODEL") {
            self.detector.model_path = Some(PathBuf::from(model));
        }
        if let Some(labels) = non_empty_env("SPOTTER_LABELS") {
            self.labels_path = Some(PathBuf::from(labels));
        }
        if let Some(threshold) = non_empty_env("SPOTTER_THRESHOLD") {
            self.alerts.threshold = threshold
                .parse()
                .map_err(|_| anyhow!("SPOTTER_THRESHOLD must be a number between 0 and 1"))?;
        }
        if let Some(cooldown) = non_empty_env("SPOTTER_COOLDOWN_SECS") {
            self.alerts.cooldown_secs = cooldown
                .parse()
                .map_err(|_| anyhow!("SPOTTER_COOLDOWN_SECS must be a number of seconds"))?;
        }
        if let Some(voice) = non_empty_env("SPOTTER_VOICE") {
            self.voice.enabled = parse_switch(&voice)
                .ok_or_else(|| anyhow!("SPOTTER_VOICE must be on/off, true/false or 1/0"))?;
        }
        if let Some(mode) = non_empty_env("SPOTTER_VOICE_MODE") {
            self.voice.mode = match mode.to_lowercase().as_str() {
                "blocking" => VoiceMode::Blocking,
                "queued" => VoiceMode::Queued,
                _ => return Err(anyhow!("SPOTTER_VOICE_MODE must be 'blocking' or 'queued'")),
            };
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.alerts.validate()?;
        if self.source.uri.trim().is_empty() {
            return Err(anyhow!("source uri must not be empty"));
        }
        if self.source.width == 0 || self.source.height == 0 {
            return Err(anyhow!("source resolution must be non-zero"));
        }
        if self.detector.input_width == 0 || self.detector.input_height == 0 {
            return Err(anyhow!("detector input shape must be non-zero"));
        }
        if self.detector.backend == "tract" && self.detector.model_path.is_none() {
            return Err(anyhow!("tract backend requires detector.model_path"));
        }
        if self.voice.mode == VoiceMode::Queued && self.voice.queue_capacity == 0 {
            return Err(anyhow!("voice queue_capacity must be at least 1"));
        }
        Ok(())
    }

    /// Load the configured label table.
    pub fn labels(&self) -> Result<LabelResolver> {
        match &self.labels_path {
            Some(path) => LabelResolver::from_path(path),
            None => Ok(LabelResolver::coco()),
        }
    }
}

fn read_config_file(path: &Path) -> Result<SpotterConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let cfg: SpotterConfigFile = if is_json {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        toml::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_switch(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "1" | "on" | "true" | "yes" => Some(true),
        "0" | "off" | "false" | "no" => Some(false),
        _ => None,
    }
}
