#![forbid(unsafe_code)]

//! `navkit-core` is the host-driven half of the navigation bar controller.
//!
//! Design goals:
//! - **Host-driven I/O**: the embedding environment (JS) pushes [`NavEvent`]s and
//!   answers geometry queries through [`PageHost`].
//! - **Deterministic time**: the host advances a monotonic clock explicitly and
//!   polls the controller when [`NavController::next_deadline`] passes.
//! - **No DOM access**: every visual change is emitted as a [`DomMutation`] the
//!   host applies in order.
//!
//! `navkit-web` wraps this crate with a `wasm-bindgen` surface and real DOM
//! listeners.

pub mod config;
pub mod controller;
pub mod dom;
pub mod event;
pub mod geometry;
pub mod timing;

use core::time::Duration;

pub use config::{ActiveLinkPolicy, NavConfig, NoMatchPolicy, Palette};
pub use controller::{EventOutcome, NavController};
pub use dom::{DomMutation, MirrorDom, Target};
pub use event::{IntersectionEntry, NavEvent};
pub use geometry::{DropdownMarkup, NavLink, PageHost, PageMarkup, PageMetrics, SectionRect};
pub use timing::{DebounceTimer, Debounced, ThrottleWindow, Throttled};

/// Controller error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavError {
    /// A required collaborator element is absent from the page.
    MissingElement(&'static str),
    /// A `.dropdown` container lacks one of its required children.
    MissingDropdownPart { index: usize, part: &'static str },
    /// Configuration could not be parsed or failed validation.
    Config(String),
    /// The host failed to apply a DOM operation.
    Dom(String),
}

impl core::fmt::Display for NavError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::MissingElement(what) => write!(f, "missing required element: {what}"),
            Self::MissingDropdownPart { index, part } => {
                write!(f, "dropdown #{index} has no {part} child")
            }
            Self::Config(msg) => write!(f, "invalid config: {msg}"),
            Self::Dom(msg) => write!(f, "dom operation failed: {msg}"),
        }
    }
}

impl std::error::Error for NavError {}

/// Monotonic clock the host advances explicitly.
///
/// Hosts without a real time source (tests, trace replay) keep one of these
/// and pass `now()` to [`NavController::handle`] and [`NavController::poll`].
#[derive(Debug, Default, Clone)]
pub struct DeterministicClock {
    now: Duration,
}

impl DeterministicClock {
    /// Create a clock starting at `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
        }
    }

    /// Current monotonic time.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Set current monotonic time. Never moves backwards.
    pub fn set(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    /// Advance monotonic time by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }
}
