//! INI file loading for [`PreviewConfig`].

use std::path::Path;
use std::time::Duration;

use image::Rgba;
use ini::{Ini, Properties};
use thiserror::Error;

use super::PreviewConfig;
use crate::geometry::TileLayout;

/// Name of the INI section holding engine settings.
pub const PREVIEW_SECTION: &str = "preview";

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file
    #[error("Failed to read config file: {0}")]
    Read(#[from] ini::Error),

    /// Failed to parse config text
    #[error("Failed to parse config: {0}")]
    Parse(#[from] ini::ParseError),

    /// A key has a value that cannot be used
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

impl PreviewConfig {
    /// Load configuration from an INI file.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(path)?;
        Self::from_ini(&ini)
    }

    /// Parse configuration from INI text.
    pub fn from_ini_str(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text)?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let Some(section) = ini.section(Some(PREVIEW_SECTION)) else {
            return Ok(config);
        };

        if let Some(threads) = parse_number::<usize>(section, "threads")? {
            if threads == 0 {
                return Err(invalid("threads", "0", "must be at least 1"));
            }
            config.worker_threads = Some(threads);
        }

        let width = positive(section, "tile_width")?.unwrap_or(config.tile_layout.width());
        let depth = positive(section, "tile_depth")?.unwrap_or(config.tile_layout.depth());
        let height = positive(section, "tile_height")?.unwrap_or(config.tile_layout.height());
        config.tile_layout = TileLayout::new(width, depth).with_height(height);

        if let Some(color) = color(section, "tile_background")? {
            config.tile_background = color;
        }
        if let Some(color) = color(section, "canvas_background")? {
            config.canvas_background = color;
        }
        if let Some(color) = color(section, "axis_color")? {
            config.axis_color = color;
        }

        if let Some(ms) = parse_number::<u64>(section, "poll_interval_ms")? {
            if ms == 0 {
                return Err(invalid("poll_interval_ms", "0", "must be at least 1"));
            }
            config.poll_interval = Duration::from_millis(ms);
        }

        Ok(config)
    }
}

/// Parse `#RRGGBB` or `#RRGGBBAA` into a color. The `#` is optional.
pub fn parse_color(value: &str) -> Option<Rgba<u8>> {
    let value = value.trim();
    let hex = value.strip_prefix('#').unwrap_or(value);
    if !matches!(hex.len(), 6 | 8) || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok();
    let alpha = if hex.len() == 8 { channel(3)? } else { 255 };
    Some(Rgba([channel(0)?, channel(1)?, channel(2)?, alpha]))
}

fn parse_number<T: std::str::FromStr>(
    section: &Properties,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    match section.get(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| invalid(key, value, "not a number")),
    }
}

fn positive(section: &Properties, key: &str) -> Result<Option<u32>, ConfigError> {
    match parse_number::<u32>(section, key)? {
        Some(0) => Err(invalid(key, "0", "must be greater than 0")),
        other => Ok(other),
    }
}

fn color(section: &Properties, key: &str) -> Result<Option<Rgba<u8>>, ConfigError> {
    match section.get(key) {
        None => Ok(None),
        Some(value) => parse_color(value)
            .map(Some)
            .ok_or_else(|| invalid(key, value, "expected #RRGGBB or #RRGGBBAA")),
    }
}

fn invalid(key: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        section: PREVIEW_SECTION.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
