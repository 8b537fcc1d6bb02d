//! Host events, with a stable JSON encoding for record/replay.

use serde::{Deserialize, Serialize};

/// One intersection observer record for a `.section`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntersectionEntry {
    pub id: String,
    pub is_intersecting: bool,
}

impl IntersectionEntry {
    #[must_use]
    pub fn entering(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_intersecting: true,
        }
    }

    #[must_use]
    pub fn leaving(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_intersecting: false,
        }
    }
}

/// Normalized DOM event delivered to [`NavController::handle`](crate::NavController::handle).
///
/// Indices refer to the link/dropdown lists captured at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NavEvent {
    /// Raw window scroll.
    Scroll,
    /// Window resize; the new width is read from the host.
    Resize,
    HamburgerClick,
    /// Click anywhere in the document.
    DocumentClick { inside_navbar: bool },
    LinkClick { index: usize },
    LinkEnter { index: usize },
    LinkLeave { index: usize },
    DropdownEnter { index: usize },
    DropdownLeave { index: usize },
    DropdownToggleClick { index: usize },
    /// One observer callback batch, in delivery order.
    Intersections { entries: Vec<IntersectionEntry> },
}

impl NavEvent {
    /// Encode this event as a stable JSON string.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode a previously encoded event JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Stable event name for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Scroll => "scroll",
            Self::Resize => "resize",
            Self::HamburgerClick => "hamburger_click",
            Self::DocumentClick { .. } => "document_click",
            Self::LinkClick { .. } => "link_click",
            Self::LinkEnter { .. } => "link_enter",
            Self::LinkLeave { .. } => "link_leave",
            Self::DropdownEnter { .. } => "dropdown_enter",
            Self::DropdownLeave { .. } => "dropdown_leave",
            Self::DropdownToggleClick { .. } => "dropdown_toggle_click",
            Self::Intersections { .. } => "intersections",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn json_shape_is_tagged_and_snake_case() {
        let event = NavEvent::DropdownToggleClick { index: 2 };
        assert_eq!(
            event.to_json_string().unwrap(),
            r#"{"type":"dropdown_toggle_click","index":2}"#
        );
        assert_eq!(
            NavEvent::Scroll.to_json_string().unwrap(),
            r#"{"type":"scroll"}"#
        );
    }

    #[test]
    fn intersection_batch_decodes_from_host_json() {
        let json = r#"{"type":"intersections","entries":[
            {"id":"home","is_intersecting":false},
            {"id":"about","is_intersecting":true}
        ]}"#;
        let event = NavEvent::from_json_str(json).unwrap();
        assert_eq!(
            event,
            NavEvent::Intersections {
                entries: vec![
                    IntersectionEntry::leaving("home"),
                    IntersectionEntry::entering("about"),
                ]
            }
        );
        assert_eq!(event.kind(), "intersections");
    }

    #[test]
    fn unknown_event_type_is_rejected() {
        assert!(NavEvent::from_json_str(r#"{"type":"wheel"}"#).is_err());
    }
}
