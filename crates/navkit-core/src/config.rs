//! Controller configuration.
//!
//! Every field has a default matching the stock navigation markup and
//! stylesheet. Hosts can override a subset by passing a partial JSON object
//! to [`NavConfig::from_json_str`]; missing fields keep their defaults.

use core::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::NavError;

/// Pair of colors written to `--primary-color` / `--hover-color`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub primary: String,
    pub hover: String,
}

impl Palette {
    #[must_use]
    pub fn new(primary: impl Into<String>, hover: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            hover: hover.into(),
        }
    }
}

/// Which mechanisms are allowed to move the `active` link.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveLinkPolicy {
    /// Offset-scan on every scroll frame and the visibility observer both
    /// write the active link; the last writer wins.
    #[default]
    Both,
    /// Only intersection entries move the active link.
    ObserverOnly,
    /// Only the offset-scan moves the active link.
    OffsetScanOnly,
}

impl ActiveLinkPolicy {
    #[must_use]
    pub const fn uses_offset_scan(self) -> bool {
        matches!(self, Self::Both | Self::OffsetScanOnly)
    }

    #[must_use]
    pub const fn uses_observer(self) -> bool {
        matches!(self, Self::Both | Self::ObserverOnly)
    }
}

/// What the offset-scan does when no trigger zone contains the offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoMatchPolicy {
    /// Leave the previously active link untouched.
    #[default]
    Sticky,
    /// Clear `active` from every link.
    Clear,
}

/// Configuration for [`NavController`](crate::NavController).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// Offsets strictly above this mark the navbar `scrolled` (px).
    pub scrolled_threshold: f64,

    /// Trigger zones start this far above each section's top (px).
    pub section_trigger_offset: f64,

    /// Smooth scroll lands the target this far below the viewport top (px).
    pub smooth_scroll_offset: f64,

    /// Widths at or below this are treated as mobile (px).
    pub mobile_breakpoint: f64,

    /// Trailing debounce applied to raw scroll events (ms).
    pub scroll_debounce_ms: u64,

    /// Delay before the navbar slides into view after init (ms).
    pub load_animation_delay_ms: u64,

    /// Vertical inset applied to the observer viewport, top and bottom (px).
    pub observer_margin: f64,

    /// Fraction of a section that must be visible to count as intersecting.
    pub observer_threshold: f64,

    /// Theme for even-indexed sections; also written to the root at init.
    pub even_palette: Palette,

    /// Theme for odd-indexed sections.
    pub odd_palette: Palette,

    pub active_link_policy: ActiveLinkPolicy,

    pub no_match_policy: NoMatchPolicy,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            scrolled_threshold: 50.0,
            section_trigger_offset: 100.0,
            smooth_scroll_offset: 80.0,
            mobile_breakpoint: 768.0,
            scroll_debounce_ms: 10,
            load_animation_delay_ms: 100,
            observer_margin: 50.0,
            observer_threshold: 0.1,
            even_palette: Palette::new("#3498db", "#2980b9"),
            odd_palette: Palette::new("#e74c3c", "#c0392b"),
            active_link_policy: ActiveLinkPolicy::Both,
            no_match_policy: NoMatchPolicy::Sticky,
        }
    }
}

impl NavConfig {
    /// Parse a (possibly partial) JSON config and validate it.
    pub fn from_json_str(s: &str) -> Result<Self, NavError> {
        let config: Self = serde_json::from_str(s).map_err(|err| {
            warn!(error = %err, "config rejected");
            NavError::Config(err.to_string())
        })?;
        if let Err(err) = config.validate() {
            warn!(error = %err, "config rejected");
            return Err(err);
        }
        Ok(config)
    }

    /// Reject values the controller cannot act on.
    pub fn validate(&self) -> Result<(), NavError> {
        if !(0.0..=1.0).contains(&self.observer_threshold) {
            return Err(NavError::Config(format!(
                "observer_threshold must be within [0, 1], got {}",
                self.observer_threshold
            )));
        }
        let lengths = [
            ("scrolled_threshold", self.scrolled_threshold),
            ("section_trigger_offset", self.section_trigger_offset),
            ("smooth_scroll_offset", self.smooth_scroll_offset),
            ("mobile_breakpoint", self.mobile_breakpoint),
            ("observer_margin", self.observer_margin),
        ];
        for (name, value) in lengths {
            if !value.is_finite() {
                return Err(NavError::Config(format!("{name} must be finite")));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn with_active_link_policy(mut self, policy: ActiveLinkPolicy) -> Self {
        self.active_link_policy = policy;
        self
    }

    #[must_use]
    pub fn with_no_match_policy(mut self, policy: NoMatchPolicy) -> Self {
        self.no_match_policy = policy;
        self
    }

    #[must_use]
    pub fn with_mobile_breakpoint(mut self, px: f64) -> Self {
        self.mobile_breakpoint = px;
        self
    }

    #[must_use]
    pub fn with_scroll_debounce(mut self, wait: Duration) -> Self {
        self.scroll_debounce_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX);
        self
    }

    #[must_use]
    pub fn scroll_debounce(&self) -> Duration {
        Duration::from_millis(self.scroll_debounce_ms)
    }

    #[must_use]
    pub fn load_animation_delay(&self) -> Duration {
        Duration::from_millis(self.load_animation_delay_ms)
    }

    /// `rootMargin` string for the section `IntersectionObserver`.
    #[must_use]
    pub fn observer_root_margin(&self) -> String {
        let m = self.observer_margin;
        format!("-{m}px 0px -{m}px 0px")
    }

    #[must_use]
    pub fn is_mobile_width(&self, width: f64) -> bool {
        width <= self.mobile_breakpoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_stock_markup() {
        let config = NavConfig::default();
        assert_eq!(config.scroll_debounce(), Duration::from_millis(10));
        assert_eq!(config.observer_root_margin(), "-50px 0px -50px 0px");
        assert!(config.is_mobile_width(768.0));
        assert!(!config.is_mobile_width(769.0));
        assert_eq!(config.even_palette, Palette::new("#3498db", "#2980b9"));
    }

    #[test]
    fn partial_json_keeps_remaining_defaults() {
        let config = NavConfig::from_json_str(
            r#"{"mobile_breakpoint": 600, "active_link_policy": "observer_only"}"#,
        )
        .expect("valid config");
        assert_eq!(config.mobile_breakpoint, 600.0);
        assert_eq!(config.active_link_policy, ActiveLinkPolicy::ObserverOnly);
        assert_eq!(config.scrolled_threshold, 50.0);
        assert_eq!(config.no_match_policy, NoMatchPolicy::Sticky);
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let err = NavConfig::from_json_str(r#"{"observer_threshold": 1.5}"#).unwrap_err();
        assert!(matches!(err, NavError::Config(msg) if msg.contains("observer_threshold")));
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = NavConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, NavError::Config(_)));
    }

    #[test]
    fn builders_override_fields() {
        let config = NavConfig::default()
            .with_no_match_policy(NoMatchPolicy::Clear)
            .with_scroll_debounce(Duration::from_millis(25))
            .with_mobile_breakpoint(1024.0);
        assert_eq!(config.no_match_policy, NoMatchPolicy::Clear);
        assert_eq!(config.scroll_debounce_ms, 25);
        assert!(config.is_mobile_width(1000.0));
    }

    #[test]
    fn policy_flags() {
        assert!(ActiveLinkPolicy::Both.uses_observer());
        assert!(ActiveLinkPolicy::Both.uses_offset_scan());
        assert!(!ActiveLinkPolicy::ObserverOnly.uses_offset_scan());
        assert!(!ActiveLinkPolicy::OffsetScanOnly.uses_observer());
    }
}
