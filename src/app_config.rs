use anyhow::{anyhow, Context, Result};
use log::{warn, LevelFilter};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

// @const: ASS colour literal, &HAABBGGRR
static COLOUR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^&H[0-9A-Fa-f]{8}$").expect("colour pattern is valid")
});

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    /// Overlay script style used when converting and burning
    #[serde(default)]
    pub overlay: OverlayStyle,

    /// External encoder settings
    #[serde(default)]
    pub encoder: EncoderConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Visual style and canvas of the generated overlay script
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OverlayStyle {
    /// Canvas width the script is authored for
    #[serde(default = "default_play_res_x")]
    pub play_res_x: u32,

    /// Canvas height the script is authored for
    #[serde(default = "default_play_res_y")]
    pub play_res_y: u32,

    #[serde(default)]
    pub wrap_style: u8,

    /// Style name referenced by every dialogue line
    #[serde(default = "default_style_name")]
    pub name: String,

    #[serde(default = "default_font_name")]
    pub font_name: String,

    #[serde(default = "default_font_size")]
    pub font_size: u32,

    // @field: Colours are &HAABBGGRR literals
    #[serde(default = "default_primary_colour")]
    pub primary_colour: String,

    #[serde(default = "default_secondary_colour")]
    pub secondary_colour: String,

    #[serde(default = "default_outline_colour")]
    pub outline_colour: String,

    #[serde(default = "default_back_colour")]
    pub back_colour: String,

    #[serde(default = "default_true")]
    pub bold: bool,

    #[serde(default)]
    pub italic: bool,

    #[serde(default)]
    pub underline: bool,

    #[serde(default)]
    pub strike_out: bool,

    #[serde(default = "default_scale")]
    pub scale_x: u32,

    #[serde(default = "default_scale")]
    pub scale_y: u32,

    #[serde(default)]
    pub spacing: i32,

    #[serde(default)]
    pub angle: i32,

    #[serde(default = "default_border_style")]
    pub border_style: u8,

    #[serde(default = "default_outline")]
    pub outline: u32,

    #[serde(default = "default_shadow")]
    pub shadow: u32,

    /// Numpad-style anchor, 8 is top centre
    #[serde(default = "default_alignment")]
    pub alignment: u8,

    #[serde(default = "default_margin_h")]
    pub margin_l: u32,

    #[serde(default = "default_margin_h")]
    pub margin_r: u32,

    #[serde(default = "default_margin_v")]
    pub margin_v: u32,

    #[serde(default = "default_encoding")]
    pub encoding: u32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            play_res_x: default_play_res_x(),
            play_res_y: default_play_res_y(),
            wrap_style: 0,
            name: default_style_name(),
            font_name: default_font_name(),
            font_size: default_font_size(),
            primary_colour: default_primary_colour(),
            secondary_colour: default_secondary_colour(),
            outline_colour: default_outline_colour(),
            back_colour: default_back_colour(),
            bold: true,
            italic: false,
            underline: false,
            strike_out: false,
            scale_x: default_scale(),
            scale_y: default_scale(),
            spacing: 0,
            angle: 0,
            border_style: default_border_style(),
            outline: default_outline(),
            shadow: default_shadow(),
            alignment: default_alignment(),
            margin_l: default_margin_h(),
            margin_r: default_margin_h(),
            margin_v: default_margin_v(),
            encoding: default_encoding(),
        }
    }
}

/// Settings passed through to the external encoder
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EncoderConfig {
    /// Encoder executable, looked up on PATH when not absolute
    #[serde(default = "default_program")]
    pub program: String,

    #[serde(default = "default_video_codec")]
    pub video_codec: String,

    #[serde(default = "default_preset")]
    pub preset: String,

    /// Constant rate factor (0-51)
    #[serde(default = "default_crf")]
    pub crf: u8,

    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    #[serde(default = "default_threads")]
    pub threads: String,

    /// Move the moov atom to the front for streaming playback
    #[serde(default = "default_true")]
    pub faststart: bool,

    /// Length of the truncated preview render in seconds
    #[serde(default = "default_preview_secs")]
    pub preview_secs: u64,

    /// Abort the encoder after this many seconds (optional)
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            video_codec: default_video_codec(),
            preset: default_preset(),
            crf: default_crf(),
            audio_codec: default_audio_codec(),
            threads: default_threads(),
            faststart: true,
            preview_secs: default_preview_secs(),
            timeout_secs: None,
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn default_play_res_x() -> u32 {
    1280
}

fn default_play_res_y() -> u32 {
    720
}

fn default_style_name() -> String {
    "TopSubs".to_string()
}

fn default_font_name() -> String {
    "Arial".to_string()
}

fn default_font_size() -> u32 {
    45
}

fn default_primary_colour() -> String {
    "&H00FFFFFF".to_string() // opaque white
}

fn default_secondary_colour() -> String {
    "&H000000FF".to_string()
}

fn default_outline_colour() -> String {
    "&H00000000".to_string()
}

fn default_back_colour() -> String {
    "&H80000000".to_string() // half-transparent black
}

fn default_scale() -> u32 {
    100
}

fn default_border_style() -> u8 {
    1
}

fn default_outline() -> u32 {
    2
}

fn default_shadow() -> u32 {
    1
}

fn default_alignment() -> u8 {
    8
}

fn default_margin_h() -> u32 {
    10
}

fn default_margin_v() -> u32 {
    25
}

fn default_encoding() -> u32 {
    1
}

fn default_program() -> String {
    "ffmpeg".to_string()
}

fn default_video_codec() -> String {
    "libx264".to_string()
}

fn default_preset() -> String {
    "veryfast".to_string()
}

fn default_crf() -> u8 {
    23
}

fn default_audio_codec() -> String {
    "copy".to_string()
}

fn default_threads() -> String {
    "auto".to_string()
}

fn default_preview_secs() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load the configuration file, writing a default one when it does not exist yet
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            return Ok(config);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());

        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write default config to file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        self.overlay.validate()?;
        self.encoder.validate()?;
        Ok(())
    }
}

impl OverlayStyle {
    pub fn validate(&self) -> Result<()> {
        if self.play_res_x == 0 || self.play_res_y == 0 {
            return Err(anyhow!(
                "Overlay resolution must be positive, got {}x{}",
                self.play_res_x, self.play_res_y
            ));
        }

        // Style lines are comma separated, a comma would shift every field
        if self.name.trim().is_empty() || self.name.contains(',') {
            return Err(anyhow!("Invalid overlay style name: '{}'", self.name));
        }
        if self.font_name.trim().is_empty() || self.font_name.contains(',') {
            return Err(anyhow!("Invalid overlay font name: '{}'", self.font_name));
        }

        if !(1..=9).contains(&self.alignment) {
            return Err(anyhow!("Overlay alignment must be between 1 and 9, got {}", self.alignment));
        }

        for (field, colour) in [
            ("primary_colour", &self.primary_colour),
            ("secondary_colour", &self.secondary_colour),
            ("outline_colour", &self.outline_colour),
            ("back_colour", &self.back_colour),
        ] {
            if !COLOUR_REGEX.is_match(colour) {
                return Err(anyhow!("Overlay {} must look like &HAABBGGRR, got '{}'", field, colour));
            }
        }

        Ok(())
    }
}

impl EncoderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.program.trim().is_empty() {
            return Err(anyhow!("Encoder program must not be empty"));
        }
        if self.crf > 51 {
            return Err(anyhow!("Encoder crf must be between 0 and 51, got {}", self.crf));
        }
        if self.preview_secs == 0 {
            return Err(anyhow!("Encoder preview_secs must be positive"));
        }
        if self.timeout_secs == Some(0) {
            return Err(anyhow!("Encoder timeout_secs must be positive when set"));
        }
        Ok(())
    }
}
