//! Scroll controller parameters.
//!
//! Parameters arrive as an untyped key/value map (from the config file or
//! the command line) and are overlaid onto the current values, so callers
//! only name what they want to change.

use glide_common::config::ParameterMap;
use glide_common::error::{GlideError, GlideResult};
use serde::{Deserialize, Serialize};

/// Tunables shared by the scroll controllers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollParameters {
    /// Distance of one wheel detent, in pixels.
    pub px_per_tick: f64,

    /// The outstanding distance is covered linearly within this many
    /// milliseconds after the latest tick.
    pub ms_per_tick: f64,

    /// Momentum friction coefficient. Zero disables momentum.
    pub friction: f64,

    /// Exponent applied to the speed in the friction term.
    pub friction_depth: f64,

    /// Momentum ends below this speed (px/ms).
    pub momentum_stop_speed: f64,

    /// Ticks closer together than this form one burst (ms).
    pub consecutive_tick_max_interval_ms: f64,

    /// Ticks in a burst before it counts as a swipe.
    pub swipe_threshold_ticks: u32,

    /// Swipes closer together than this are consecutive (ms).
    pub consecutive_swipe_max_interval_ms: f64,

    /// Consecutive swipes before fast scrolling kicks in.
    pub fast_scroll_threshold_swipes: u32,

    /// Exponential base of the fast-scroll factor.
    pub fast_scroll_base: f64,

    /// Upper bound of the fast-scroll factor.
    pub fast_scroll_max_factor: f64,

    /// The first N ticks of an isolated burst scroll a single pixel.
    pub one_pixel_ticks: u32,

    /// Reverse the scroll direction.
    pub invert: bool,

    /// Holding shift turns vertical ticks into horizontal scrolling.
    pub shift_scrolls_horizontally: bool,

    /// Animation frame rate (Hz).
    pub frame_rate_hz: u32,
}

impl Default for ScrollParameters {
    fn default() -> Self {
        Self {
            px_per_tick: 76.0,
            ms_per_tick: 90.0,
            friction: 2.3,
            friction_depth: 1.0,
            momentum_stop_speed: 0.02,
            consecutive_tick_max_interval_ms: 130.0,
            swipe_threshold_ticks: 3,
            consecutive_swipe_max_interval_ms: 350.0,
            fast_scroll_threshold_swipes: 4,
            fast_scroll_base: 1.1,
            fast_scroll_max_factor: 8.0,
            one_pixel_ticks: 0,
            invert: false,
            shift_scrolls_horizontally: true,
            frame_rate_hz: 120,
        }
    }
}

impl ScrollParameters {
    /// Defaults with `map` applied on top.
    pub fn from_map(map: &ParameterMap) -> GlideResult<Self> {
        Self::default().overlay(map)
    }

    /// Return a copy with the keys in `map` replaced.
    ///
    /// Unknown keys are skipped with a warning. A value of the wrong type
    /// or out of range fails the whole update.
    pub fn overlay(&self, map: &ParameterMap) -> GlideResult<Self> {
        let serde_json::Value::Object(mut fields) = serde_json::to_value(self)? else {
            return Err(GlideError::config("Scroll parameters must serialize to an object"));
        };

        for (key, value) in map {
            if fields.contains_key(key) {
                fields.insert(key.clone(), value.clone());
            } else {
                tracing::warn!(key = %key, "Ignoring unknown scroll parameter");
            }
        }

        let updated: Self = serde_json::from_value(serde_json::Value::Object(fields))
            .map_err(|e| GlideError::config(format!("Invalid scroll parameter: {e}")))?;
        updated.validate()?;
        Ok(updated)
    }

    /// Check value ranges.
    pub fn validate(&self) -> GlideResult<()> {
        fn positive(name: &str, value: f64) -> GlideResult<()> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(GlideError::config(format!("{name} must be > 0, got {value}")))
            }
        }

        fn at_least(name: &str, value: f64, min: f64) -> GlideResult<()> {
            if value.is_finite() && value >= min {
                Ok(())
            } else {
                Err(GlideError::config(format!("{name} must be >= {min}, got {value}")))
            }
        }

        positive("px_per_tick", self.px_per_tick)?;
        positive("ms_per_tick", self.ms_per_tick)?;
        at_least("friction", self.friction, 0.0)?;
        positive("friction_depth", self.friction_depth)?;
        // Momentum decays toward zero without reaching it.
        positive("momentum_stop_speed", self.momentum_stop_speed)?;
        at_least(
            "consecutive_tick_max_interval_ms",
            self.consecutive_tick_max_interval_ms,
            0.0,
        )?;
        at_least(
            "consecutive_swipe_max_interval_ms",
            self.consecutive_swipe_max_interval_ms,
            0.0,
        )?;
        at_least("fast_scroll_base", self.fast_scroll_base, 1.0)?;
        at_least("fast_scroll_max_factor", self.fast_scroll_max_factor, 1.0)?;

        if self.swipe_threshold_ticks == 0 {
            return Err(GlideError::config("swipe_threshold_ticks must be >= 1"));
        }
        if !(1..=1000).contains(&self.frame_rate_hz) {
            return Err(GlideError::config(format!(
                "frame_rate_hz must be within 1..=1000, got {}",
                self.frame_rate_hz
            )));
        }
        Ok(())
    }
}

/// Parse `key=value` assignments into a parameter map.
///
/// Values are read as JSON (`76`, `true`, `1.5`), falling back to a plain
/// string when they are not valid JSON.
pub fn parse_assignments<S: AsRef<str>>(assignments: &[S]) -> GlideResult<ParameterMap> {
    let mut map = ParameterMap::new();
    for assignment in assignments {
        let assignment = assignment.as_ref();
        let Some((key, raw)) = assignment.split_once('=') else {
            return Err(GlideError::config(format!(
                "Expected key=value, got '{assignment}'"
            )));
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(GlideError::config(format!(
                "Missing parameter name in '{assignment}'"
            )));
        }
        let raw = raw.trim();
        let value = serde_json::from_str(raw)
            .unwrap_or_else(|_| serde_json::Value::String(raw.to_string()));
        map.insert(key.to_string(), value);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: serde_json::Value) -> ParameterMap {
        match value {
            serde_json::Value::Object(map) => map,
            _ => ParameterMap::new(),
        }
    }

    #[test]
    fn defaults_are_valid() {
        ScrollParameters::default().validate().unwrap();
    }

    #[test]
    fn overlay_changes_only_named_keys() {
        let params = ScrollParameters::from_map(&map(json!({
            "px_per_tick": 40,
            "invert": true
        })))
        .unwrap();

        assert!((params.px_per_tick - 40.0).abs() < 1e-9);
        assert!(params.invert);
        assert!((params.ms_per_tick - 90.0).abs() < 1e-9);
        assert_eq!(params.frame_rate_hz, 120);
    }

    #[test]
    fn overlay_ignores_unknown_keys() {
        let params = ScrollParameters::from_map(&map(json!({ "pxStepSize": 10 }))).unwrap();
        assert_eq!(params, ScrollParameters::default());
    }

    #[test]
    fn overlay_rejects_wrong_type() {
        let err = ScrollParameters::from_map(&map(json!({ "invert": "yes" }))).unwrap_err();
        assert!(matches!(err, GlideError::Config { .. }));
    }

    #[test]
    fn overlay_rejects_out_of_range() {
        assert!(ScrollParameters::from_map(&map(json!({ "px_per_tick": 0 }))).is_err());
        assert!(ScrollParameters::from_map(&map(json!({ "fast_scroll_base": 0.5 }))).is_err());
        assert!(ScrollParameters::from_map(&map(json!({ "frame_rate_hz": 0 }))).is_err());
        assert!(ScrollParameters::from_map(&map(json!({ "swipe_threshold_ticks": 0 }))).is_err());
        assert!(ScrollParameters::from_map(&map(json!({ "friction": -1.0 }))).is_err());
        assert!(ScrollParameters::from_map(&map(json!({ "momentum_stop_speed": 0 }))).is_err());
        assert!(ScrollParameters::from_map(&map(json!({ "momentum_stop_speed": 1e-9 }))).is_ok());
    }

    #[test]
    fn parse_assignments_reads_json_values() {
        let parsed = parse_assignments(&["px_per_tick=60", "invert=true", "label = fast"]).unwrap();
        assert_eq!(parsed["px_per_tick"], json!(60));
        assert_eq!(parsed["invert"], json!(true));
        assert_eq!(parsed["label"], json!("fast"));
    }

    #[test]
    fn parse_assignments_rejects_malformed() {
        assert!(parse_assignments(&["px_per_tick"]).is_err());
        assert!(parse_assignments(&["=5"]).is_err());
    }
}
