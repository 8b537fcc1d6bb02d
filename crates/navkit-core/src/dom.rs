//! DOM mutations emitted by the controller.
//!
//! The controller describes every visual change as a [`DomMutation`] aimed at
//! a [`Target`]. Hosts apply the batch in order. [`MirrorDom`] applies the
//! same batches to an in-memory model so traces can be replayed and asserted
//! on without a browser.

use std::collections::{BTreeMap, BTreeSet};

pub const CLASS_SCROLLED: &str = "scrolled";
pub const CLASS_ACTIVE: &str = "active";
pub const CLASS_MOBILE_OPEN: &str = "mobile-open";
pub const CLASS_PROGRESS: &str = "scroll-progress";

pub const PROP_PRIMARY_COLOR: &str = "--primary-color";
pub const PROP_HOVER_COLOR: &str = "--hover-color";

/// Element a mutation applies to. Indices follow DOM order at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Target {
    /// `document.documentElement`.
    Root,
    Body,
    Navbar,
    Hamburger,
    Menu,
    ProgressBar,
    Link(usize),
    DropdownMenu(usize),
}

/// One change to the page.
#[derive(Debug, Clone, PartialEq)]
pub enum DomMutation {
    /// Append the single `div.scroll-progress` to `body`.
    InsertProgressBar,
    SetClass {
        target: Target,
        class: &'static str,
        present: bool,
    },
    SetStyle {
        target: Target,
        property: &'static str,
        value: String,
    },
    SetCustomProperty {
        target: Target,
        name: &'static str,
        value: String,
    },
    ScrollTo {
        top: f64,
        smooth: bool,
    },
}

impl DomMutation {
    #[must_use]
    pub fn class(target: Target, class: &'static str, present: bool) -> Self {
        Self::SetClass {
            target,
            class,
            present,
        }
    }

    #[must_use]
    pub fn style(target: Target, property: &'static str, value: impl Into<String>) -> Self {
        Self::SetStyle {
            target,
            property,
            value: value.into(),
        }
    }

    #[must_use]
    pub fn custom_property(target: Target, name: &'static str, value: impl Into<String>) -> Self {
        Self::SetCustomProperty {
            target,
            name,
            value: value.into(),
        }
    }
}

/// In-memory page model that mutation batches are applied to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MirrorDom {
    classes: BTreeMap<Target, BTreeSet<&'static str>>,
    styles: BTreeMap<Target, BTreeMap<&'static str, String>>,
    progress_bars: u32,
    scrolls: Vec<(f64, bool)>,
}

impl MirrorDom {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a batch in order.
    pub fn apply_all<'a, I>(&mut self, mutations: I)
    where
        I: IntoIterator<Item = &'a DomMutation>,
    {
        for mutation in mutations {
            self.apply(mutation);
        }
    }

    pub fn apply(&mut self, mutation: &DomMutation) {
        match mutation {
            DomMutation::InsertProgressBar => {
                self.progress_bars += 1;
                self.classes
                    .entry(Target::ProgressBar)
                    .or_default()
                    .insert(CLASS_PROGRESS);
            }
            DomMutation::SetClass {
                target,
                class,
                present,
            } => {
                let set = self.classes.entry(*target).or_default();
                if *present {
                    set.insert(*class);
                } else {
                    set.remove(*class);
                }
            }
            DomMutation::SetStyle {
                target,
                property,
                value,
            }
            | DomMutation::SetCustomProperty {
                target,
                name: property,
                value,
            } => {
                self.styles
                    .entry(*target)
                    .or_default()
                    .insert(*property, value.clone());
            }
            DomMutation::ScrollTo { top, smooth } => self.scrolls.push((*top, *smooth)),
        }
    }

    #[must_use]
    pub fn has_class(&self, target: Target, class: &str) -> bool {
        self.classes
            .get(&target)
            .is_some_and(|set| set.contains(class))
    }

    /// Inline style or custom property last written to `target`.
    #[must_use]
    pub fn style(&self, target: Target, property: &str) -> Option<&str> {
        self.styles
            .get(&target)?
            .get(property)
            .map(String::as_str)
    }

    /// Every target currently carrying `class`.
    #[must_use]
    pub fn targets_with_class(&self, class: &str) -> Vec<Target> {
        self.classes
            .iter()
            .filter(|(_, set)| set.contains(class))
            .map(|(target, _)| *target)
            .collect()
    }

    #[must_use]
    pub const fn progress_bar_count(&self) -> u32 {
        self.progress_bars
    }

    /// Scroll requests in the order they were issued: `(top, smooth)`.
    #[must_use]
    pub fn scroll_requests(&self) -> &[(f64, bool)] {
        &self.scrolls
    }
}
