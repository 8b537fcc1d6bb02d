//! Page geometry and markup inventory supplied by the host.
//!
//! The controller never touches the DOM. Everything it needs to read comes
//! through [`PageHost`], which the web shell implements over live elements
//! and tests implement with [`PageMetrics`].

use serde::{Deserialize, Serialize};

use crate::NavError;

/// Vertical placement of one `.section`, in document coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionRect {
    pub id: String,
    pub offset_top: f64,
    pub client_height: f64,
}

impl SectionRect {
    #[must_use]
    pub fn new(id: impl Into<String>, offset_top: f64, client_height: f64) -> Self {
        Self {
            id: id.into(),
            offset_top,
            client_height,
        }
    }

    /// Whether `offset` falls in `[top - lead, top - lead + height)`.
    #[must_use]
    pub fn trigger_zone_contains(&self, offset: f64, lead: f64) -> bool {
        let start = self.offset_top - lead;
        offset >= start && offset < start + self.client_height
    }
}

/// Read-only view of the page the controller is attached to.
pub trait PageHost {
    /// Current vertical scroll offset of the window.
    fn scroll_y(&self) -> f64;

    fn viewport_width(&self) -> f64;

    fn viewport_height(&self) -> f64;

    /// Full scrollable height of the document.
    fn document_height(&self) -> f64;

    /// Every `.section`, in DOM order.
    fn sections(&self) -> Vec<SectionRect>;

    /// `offsetTop` of the element matched by an anchor such as `#about`.
    fn anchor_top(&self, selector: &str) -> Option<f64>;
}

/// Plain snapshot of page geometry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageMetrics {
    pub scroll_y: f64,
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub document_height: f64,
    pub sections: Vec<SectionRect>,
}

impl PageMetrics {
    #[must_use]
    pub fn new(viewport_width: f64, viewport_height: f64, document_height: f64) -> Self {
        Self {
            scroll_y: 0.0,
            viewport_width,
            viewport_height,
            document_height,
            sections: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_section(mut self, section: SectionRect) -> Self {
        self.sections.push(section);
        self
    }

    #[must_use]
    pub fn scrolled_to(mut self, scroll_y: f64) -> Self {
        self.scroll_y = scroll_y;
        self
    }
}

impl PageHost for PageMetrics {
    fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    fn viewport_width(&self) -> f64 {
        self.viewport_width
    }

    fn viewport_height(&self) -> f64 {
        self.viewport_height
    }

    fn document_height(&self) -> f64 {
        self.document_height
    }

    fn sections(&self) -> Vec<SectionRect> {
        self.sections.clone()
    }

    fn anchor_top(&self, selector: &str) -> Option<f64> {
        let id = selector.strip_prefix('#')?;
        self.sections
            .iter()
            .find(|section| section.id == id)
            .map(|section| section.offset_top)
    }
}

/// Scroll progress as a width percentage in `[0, 100]`.
///
/// Pages no taller than the viewport report `100`.
#[must_use]
pub fn scroll_progress_percent(offset: f64, document_height: f64, viewport_height: f64) -> f64 {
    let scrollable = document_height - viewport_height;
    if scrollable.is_nan() || scrollable <= 0.0 {
        return 100.0;
    }
    let progress = offset / scrollable * 100.0;
    if progress.is_nan() {
        return 100.0;
    }
    progress.clamp(0.0, 100.0)
}

/// Index of the last section whose trigger zone contains `offset`.
#[must_use]
pub fn section_index_at(sections: &[SectionRect], offset: f64, lead: f64) -> Option<usize> {
    sections
        .iter()
        .rposition(|section| section.trigger_zone_contains(offset, lead))
}

/// One `.nav-link` as found at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavLink {
    pub href: Option<String>,
}

impl NavLink {
    #[must_use]
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: Some(href.into()),
        }
    }

    /// Same-page anchors (`#...`) are handled in place; everything else
    /// navigates natively.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        self.href.as_deref().is_some_and(|href| href.starts_with('#'))
    }

    #[must_use]
    pub fn targets(&self, section_id: &str) -> bool {
        self.href
            .as_deref()
            .and_then(|href| href.strip_prefix('#'))
            .is_some_and(|id| id == section_id)
    }
}

/// Presence of the two required children of a `.dropdown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropdownMarkup {
    pub has_toggle: bool,
    pub has_menu: bool,
}

impl DropdownMarkup {
    pub const COMPLETE: Self = Self {
        has_toggle: true,
        has_menu: true,
    };
}

/// Inventory of the collaborator elements queried once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMarkup {
    pub has_navbar: bool,
    pub has_hamburger: bool,
    pub has_menu: bool,
    pub links: Vec<NavLink>,
    pub dropdowns: Vec<DropdownMarkup>,
}

impl PageMarkup {
    /// Markup with the three required containers and no links or dropdowns.
    #[must_use]
    pub fn complete() -> Self {
        Self {
            has_navbar: true,
            has_hamburger: true,
            has_menu: true,
            links: Vec::new(),
            dropdowns: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_links<I, S>(mut self, hrefs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.links.extend(hrefs.into_iter().map(NavLink::new));
        self
    }

    #[must_use]
    pub fn with_dropdowns(mut self, count: usize) -> Self {
        self.dropdowns
            .extend(std::iter::repeat_n(DropdownMarkup::COMPLETE, count));
        self
    }

    /// Fail fast when the page does not satisfy the markup contract.
    pub fn validate(&self) -> Result<(), NavError> {
        if !self.has_navbar {
            return Err(NavError::MissingElement("#navbar"));
        }
        if !self.has_hamburger {
            return Err(NavError::MissingElement(".hamburger"));
        }
        if !self.has_menu {
            return Err(NavError::MissingElement(".nav-menu"));
        }
        for (index, dropdown) in self.dropdowns.iter().enumerate() {
            if !dropdown.has_toggle {
                return Err(NavError::MissingDropdownPart {
                    index,
                    part: ".dropdown-toggle",
                });
            }
            if !dropdown.has_menu {
                return Err(NavError::MissingDropdownPart {
                    index,
                    part: ".dropdown-menu",
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    fn two_sections() -> Vec<SectionRect> {
        vec![
            SectionRect::new("a", 0.0, 300.0),
            SectionRect::new("b", 300.0, 300.0),
        ]
    }

    #[test]
    fn offset_between_zones_resolves_to_later_section() {
        // Zone for "a" is [-100, 200); zone for "b" is [200, 500).
        let sections = two_sections();
        assert_eq!(section_index_at(&sections, 250.0, 100.0), Some(1));
        assert_eq!(section_index_at(&sections, 199.0, 100.0), Some(0));
        assert_eq!(section_index_at(&sections, 200.0, 100.0), Some(1));
        assert_eq!(section_index_at(&sections, 500.0, 100.0), None);
    }

    #[test]
    fn overlapping_zones_prefer_last_in_dom_order() {
        let sections = vec![
            SectionRect::new("tall", 0.0, 1000.0),
            SectionRect::new("inner", 200.0, 100.0),
        ];
        assert_eq!(section_index_at(&sections, 150.0, 100.0), Some(1));
        assert_eq!(section_index_at(&sections, 250.0, 100.0), Some(0));
    }

    #[test]
    fn progress_is_clamped_and_guards_short_pages() {
        assert_eq!(scroll_progress_percent(0.0, 2000.0, 1000.0), 0.0);
        assert_eq!(scroll_progress_percent(500.0, 2000.0, 1000.0), 50.0);
        assert_eq!(scroll_progress_percent(1500.0, 2000.0, 1000.0), 100.0);
        assert_eq!(scroll_progress_percent(-20.0, 2000.0, 1000.0), 0.0);
        assert_eq!(scroll_progress_percent(0.0, 800.0, 800.0), 100.0);
        assert_eq!(scroll_progress_percent(10.0, 600.0, 800.0), 100.0);
    }

    #[test]
    fn link_targets_match_hash_ids_only() {
        let link = NavLink::new("#about");
        assert!(link.is_internal());
        assert!(link.targets("about"));
        assert!(!link.targets("#about"));

        let external = NavLink::new("https://example.org/#about");
        assert!(!external.is_internal());
        assert!(!external.targets("about"));

        let bare = NavLink { href: None };
        assert!(!bare.is_internal());
    }

    #[test]
    fn anchor_lookup_uses_section_ids() {
        let page = PageMetrics::new(1024.0, 800.0, 3000.0)
            .with_section(SectionRect::new("home", 0.0, 600.0))
            .with_section(SectionRect::new("about", 600.0, 900.0));
        assert_eq!(page.anchor_top("#about"), Some(600.0));
        assert_eq!(page.anchor_top("#missing"), None);
        assert_eq!(page.anchor_top("about"), None);
    }

    #[test]
    fn markup_validation_fails_fast() {
        assert_eq!(PageMarkup::complete().validate(), Ok(()));

        let mut markup = PageMarkup::complete();
        markup.has_hamburger = false;
        assert_eq!(
            markup.validate(),
            Err(NavError::MissingElement(".hamburger"))
        );

        let mut markup = PageMarkup::complete().with_dropdowns(2);
        markup.dropdowns[1].has_menu = false;
        assert_eq!(
            markup.validate(),
            Err(NavError::MissingDropdownPart {
                index: 1,
                part: ".dropdown-menu"
            })
        );
    }
}
