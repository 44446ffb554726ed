//! Editor configuration parsed from environment variables.

use std::time::Duration;

use crate::consts::{DEBOUNCE, NOTIFY_DURATION, PANEL_CONTAINER, POSITION_MAX, POSITION_MIN};
use crate::toolbox::PositionBounds;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },
    #[error("position bounds are inverted: min {min} > max {max}")]
    InvertedBounds { min: i32, max: i32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorConfig {
    /// Identifier attached to outbound change events. Emission is skipped when absent.
    pub identifier: Option<String>,
    /// Encoded diagram loaded when the surface attaches and on reset.
    pub initial_document: Option<String>,
    /// Quiet interval for the change emitter.
    pub debounce: Duration,
    /// Placement range for toolbox elements.
    pub position_bounds: PositionBounds,
    /// Lifetime of copy/paste acknowledgments.
    pub notification_duration: Duration,
    /// Container the property panels are shown in.
    pub panel_container: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            identifier: None,
            initial_document: None,
            debounce: DEBOUNCE,
            position_bounds: PositionBounds::default(),
            notification_duration: NOTIFY_DURATION,
            panel_container: PANEL_CONTAINER.to_owned(),
        }
    }
}

impl EditorConfig {
    /// Build typed editor config from environment variables.
    ///
    /// All optional:
    /// - `UMLBOARD_IDENTIFIER`: outbound event identifier (blank means unset)
    /// - `UMLBOARD_INITIAL_DOCUMENT`: encoded diagram to start from
    /// - `UMLBOARD_DEBOUNCE_MS`: default 200
    /// - `UMLBOARD_POSITION_MIN` / `UMLBOARD_POSITION_MAX`: default 20 / 500
    /// - `UMLBOARD_NOTIFY_MS`: default 2000
    /// - `UMLBOARD_PANEL_CONTAINER`: default `properties`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for unparsable numbers or inverted bounds.
    pub fn from_env() -> Result<Self, ConfigError> {
        let identifier = env_non_blank("UMLBOARD_IDENTIFIER");
        let initial_document = env_non_blank("UMLBOARD_INITIAL_DOCUMENT");
        let debounce = Duration::from_millis(env_parse("UMLBOARD_DEBOUNCE_MS", 200_u64)?);
        let min = env_parse("UMLBOARD_POSITION_MIN", POSITION_MIN)?;
        let max = env_parse("UMLBOARD_POSITION_MAX", POSITION_MAX)?;
        let position_bounds = PositionBounds::new(min, max).ok_or(ConfigError::InvertedBounds { min, max })?;
        let notification_duration = Duration::from_millis(env_parse("UMLBOARD_NOTIFY_MS", 2000_u64)?);
        let panel_container =
            env_non_blank("UMLBOARD_PANEL_CONTAINER").unwrap_or_else(|| PANEL_CONTAINER.to_owned());

        Ok(Self { identifier, initial_document, debounce, position_bounds, notification_duration, panel_container })
    }
}

fn env_non_blank(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env_non_blank(key) {
        None => Ok(default),
        Some(value) => value
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue { var: key, value }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
