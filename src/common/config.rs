use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::geometry::Size;

/// Hard ceiling on concurrently placed streams, across every template.
pub const MAX_SLOTS_CEILING: usize = 16;

fn default_max_concurrent_slots() -> usize { MAX_SLOTS_CEILING }
fn default_min_slot_size() -> Size { Size::new(120.0, 68.0) }
fn default_pip_size() -> Size { Size::new(320.0, 180.0) }
fn default_pip_bubble_size() -> Size { Size::new(64.0, 64.0) }

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub gaps: GapSettings,
    /// Global cap on placed streams, applied on top of the active
    /// template's own slot limit.
    #[serde(default = "default_max_concurrent_slots")]
    pub max_concurrent_slots: usize,
    /// Floor for manual resizes, keeps pane controls usable.
    #[serde(default = "default_min_slot_size")]
    pub min_slot_size: Size,
    /// Size given to a pane when it is detached into the floating layer.
    #[serde(default = "default_pip_size")]
    pub default_pip_size: Size,
    /// Rendered footprint of a minimized floating pane. The stored size is
    /// untouched and restored on un-minimize.
    #[serde(default = "default_pip_bubble_size")]
    pub pip_bubble_size: Size,
    #[serde(default)]
    pub gestures: GestureSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gaps: GapSettings::default(),
            max_concurrent_slots: default_max_concurrent_slots(),
            min_slot_size: default_min_slot_size(),
            default_pip_size: default_pip_size(),
            pip_bubble_size: default_pip_bubble_size(),
            gestures: GestureSettings::default(),
        }
    }
}

impl Settings {
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let settings: Settings = toml::from_str(raw).context("failed to parse layout settings")?;
        for issue in settings.validate() {
            warn!("settings issue: {issue}");
        }
        Ok(settings)
    }

    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.max_concurrent_slots == 0 {
            issues.push("max_concurrent_slots must be at least 1".to_string());
        }
        if self.max_concurrent_slots > MAX_SLOTS_CEILING {
            issues.push(format!(
                "max_concurrent_slots should not exceed {MAX_SLOTS_CEILING}"
            ));
        }
        if self.min_slot_size.is_degenerate() {
            issues.push("min_slot_size must have positive width and height".to_string());
        }
        if self.default_pip_size.is_degenerate() {
            issues.push("default_pip_size must have positive width and height".to_string());
        }
        if self.pip_bubble_size.is_degenerate() {
            issues.push("pip_bubble_size must have positive width and height".to_string());
        }
        issues.extend(self.gestures.validate());
        issues
    }

    pub fn auto_fix(&mut self) -> usize {
        let mut fixes = 0;

        if self.max_concurrent_slots == 0 {
            self.max_concurrent_slots = 1;
            fixes += 1;
        }
        if self.max_concurrent_slots > MAX_SLOTS_CEILING {
            self.max_concurrent_slots = MAX_SLOTS_CEILING;
            fixes += 1;
        }
        if self.min_slot_size.is_degenerate() {
            self.min_slot_size = default_min_slot_size();
            fixes += 1;
        }
        if self.default_pip_size.is_degenerate() {
            self.default_pip_size = default_pip_size();
            fixes += 1;
        }
        if self.pip_bubble_size.is_degenerate() {
            self.pip_bubble_size = default_pip_bubble_size();
            fixes += 1;
        }
        fixes += self.gestures.auto_fix();
        fixes
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct GapSettings {
    #[serde(default)]
    pub outer: OuterGaps,
    #[serde(default)]
    pub inner: InnerGaps,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Copy, Default)]
#[serde(deny_unknown_fields)]
pub struct OuterGaps {
    #[serde(default)]
    pub top: f64,
    #[serde(default)]
    pub left: f64,
    #[serde(default)]
    pub bottom: f64,
    #[serde(default)]
    pub right: f64,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Copy, Default)]
#[serde(deny_unknown_fields)]
pub struct InnerGaps {
    #[serde(default)]
    pub horizontal: f64,
    #[serde(default)]
    pub vertical: f64,
}

fn default_drag_start_distance() -> f64 { 8.0 }
fn default_tap_slop() -> f64 { 10.0 }
fn default_double_tap_window_ms() -> u64 { 300 }
fn default_long_press_ms() -> u64 { 500 }
fn default_gesture_timeout_ms() -> u64 { 2_000 }
fn default_min_scale() -> f64 { 0.5 }
fn default_max_scale() -> f64 { 2.0 }
fn default_dismiss_velocity() -> f64 { 1_800.0 }

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Copy)]
#[serde(deny_unknown_fields)]
pub struct GestureSettings {
    /// Pointer travel before a press is treated as a drag rather than a tap.
    #[serde(default = "default_drag_start_distance")]
    pub drag_start_distance: f64,
    /// Maximum travel for a release to still count as a tap.
    #[serde(default = "default_tap_slop")]
    pub tap_slop: f64,
    #[serde(default = "default_double_tap_window_ms")]
    pub double_tap_window_ms: u64,
    #[serde(default = "default_long_press_ms")]
    pub long_press_ms: u64,
    /// Silence on an in-flight gesture after which its terminal intent is
    /// synthesized from the last known state.
    #[serde(default = "default_gesture_timeout_ms")]
    pub gesture_timeout_ms: u64,
    #[serde(default = "default_min_scale")]
    pub min_scale: f64,
    #[serde(default = "default_max_scale")]
    pub max_scale: f64,
    /// Vertical flick speed (px/s) that turns a drag release into a dismiss.
    #[serde(default = "default_dismiss_velocity")]
    pub dismiss_velocity: f64,
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self {
            drag_start_distance: default_drag_start_distance(),
            tap_slop: default_tap_slop(),
            double_tap_window_ms: default_double_tap_window_ms(),
            long_press_ms: default_long_press_ms(),
            gesture_timeout_ms: default_gesture_timeout_ms(),
            min_scale: default_min_scale(),
            max_scale: default_max_scale(),
            dismiss_velocity: default_dismiss_velocity(),
        }
    }
}

impl GestureSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.drag_start_distance <= 0.0 {
            issues.push("drag_start_distance must be positive".to_string());
        }
        if self.min_scale <= 0.0 || self.min_scale > 1.0 {
            issues.push("min_scale must be in (0, 1]".to_string());
        }
        if self.max_scale < 1.0 {
            issues.push("max_scale must be at least 1".to_string());
        }
        if self.gesture_timeout_ms == 0 {
            issues.push("gesture_timeout_ms must be positive".to_string());
        }
        issues
    }

    pub fn auto_fix(&mut self) -> usize {
        let mut fixes = 0;

        if self.drag_start_distance <= 0.0 {
            self.drag_start_distance = default_drag_start_distance();
            fixes += 1;
        }
        if self.min_scale <= 0.0 || self.min_scale > 1.0 {
            self.min_scale = default_min_scale();
            fixes += 1;
        }
        if self.max_scale < 1.0 {
            self.max_scale = default_max_scale();
            fixes += 1;
        }
        if self.gesture_timeout_ms == 0 {
            self.gesture_timeout_ms = default_gesture_timeout_ms();
            fixes += 1;
        }
        fixes
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_empty_toml_yields_defaults() {
        let settings = Settings::parse("").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_partial_toml_fills_in_defaults() {
        let settings = Settings::parse(
            r#"
            max_concurrent_slots = 9

            [gaps.inner]
            horizontal = 4.0
            vertical = 4.0

            [gestures]
            long_press_ms = 650
            "#,
        )
        .unwrap();

        assert_eq!(settings.max_concurrent_slots, 9);
        assert_eq!(settings.gaps.inner.horizontal, 4.0);
        assert_eq!(settings.gestures.long_press_ms, 650);
        assert_eq!(settings.gestures.tap_slop, default_tap_slop());
        assert_eq!(settings.min_slot_size, default_min_slot_size());
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        assert!(Settings::parse("not_a_real_setting = true").is_err());
    }

    #[test]
    fn test_validate_flags_bad_values() {
        let mut settings = Settings::default();
        settings.max_concurrent_slots = 0;
        settings.gestures.min_scale = 0.0;

        let issues = settings.validate();
        assert_eq!(issues.len(), 2);
    }

    #[test]
    fn test_auto_fix_restores_defaults() {
        let mut settings = Settings::default();
        settings.max_concurrent_slots = 99;
        settings.min_slot_size = Size::new(0.0, 68.0);
        settings.gestures.gesture_timeout_ms = 0;

        let fixes = settings.auto_fix();
        assert_eq!(fixes, 3);
        assert!(settings.validate().is_empty());
        assert_eq!(settings.max_concurrent_slots, MAX_SLOTS_CEILING);
    }
}
