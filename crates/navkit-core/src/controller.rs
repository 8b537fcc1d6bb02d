#![forbid(unsafe_code)]

//! Host-driven navigation bar controller.
//!
//! [`NavController`] owns all page-scoped UI state (scroll offset, menu and
//! dropdown flags, active section) and turns host events into
//! [`DomMutation`] batches. The host controls the event loop:
//!
//! 1. Call [`NavController::init`] once after the markup is available.
//! 2. Forward DOM events via [`NavController::handle`] and honor the returned
//!    [`EventOutcome`].
//! 3. Call [`NavController::poll`] whenever [`NavController::next_deadline`]
//!    passes. When it returns `true`, schedule an animation frame and call
//!    [`NavController::on_animation_frame`] from it.
//! 4. Apply [`NavController::take_mutations`] to the page after each call.
//!
//! # Scroll pipeline
//!
//! Raw scroll events restart a trailing debounce (`scroll_debounce_ms`). When
//! it fires the controller asks for an animation frame unless one is already
//! pending (`ScrollState::is_progress_updating`). The frame reads the scroll
//! offset and updates, in order: the `scrolled` class, the progress bar, the
//! offset-scanned active link, and the navbar theme.
//!
//! # Example
//!
//! ```
//! use core::time::Duration;
//! use navkit_core::{NavConfig, NavController, NavEvent, PageMarkup, PageMetrics, SectionRect};
//!
//! let markup = PageMarkup::complete().with_links(["#home", "#about"]);
//! let mut nav = NavController::new(NavConfig::default(), markup).unwrap();
//! let page = PageMetrics::new(1280.0, 800.0, 2400.0)
//!     .with_section(SectionRect::new("home", 0.0, 1200.0))
//!     .with_section(SectionRect::new("about", 1200.0, 1200.0))
//!     .scrolled_to(1300.0);
//!
//! nav.init(&page, Duration::ZERO);
//! nav.handle(NavEvent::Scroll, &page, Duration::from_millis(200));
//! if nav.poll(Duration::from_millis(210)) {
//!     nav.on_animation_frame(&page);
//! }
//! assert_eq!(nav.active_link(), Some(1));
//! assert!(nav.is_scrolled());
//! let _batch = nav.take_mutations();
//! ```

use core::time::Duration;

use tracing::{debug, info, trace, warn};

use crate::config::{NavConfig, NoMatchPolicy, Palette};
use crate::dom::{
    CLASS_ACTIVE, CLASS_MOBILE_OPEN, CLASS_SCROLLED, DomMutation, PROP_HOVER_COLOR,
    PROP_PRIMARY_COLOR, Target,
};
use crate::event::{IntersectionEntry, NavEvent};
use crate::geometry::{
    NavLink, PageHost, PageMarkup, SectionRect, scroll_progress_percent, section_index_at,
};
use crate::timing::DebounceTimer;
use crate::NavError;

const NAVBAR_HIDDEN: &str = "translateY(-100%)";
const NAVBAR_SHOWN: &str = "translateY(0)";
const NAVBAR_TRANSITION: &str = "transform 0.5s ease";
const LINK_LIFTED: &str = "translateY(-2px) scale(1.05)";
const LINK_RESTING: &str = "translateY(0) scale(1)";
const SUBMENU_SHOWN_OFFSET: &str = "translateY(0)";
const SUBMENU_HIDDEN_OFFSET: &str = "translateY(-10px)";

/// Scroll tracking state.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScrollState {
    /// Offset read by the last animation frame.
    pub offset: f64,
    /// An animation frame has been requested and has not run yet.
    pub is_progress_updating: bool,
}

/// Open/closed flag for the mobile menu or one dropdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MenuState {
    pub is_open: bool,
}

/// What the host must do with the originating DOM event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventOutcome {
    /// Call `preventDefault()` on the DOM event.
    pub prevent_default: bool,
}

impl EventOutcome {
    const PASS: Self = Self {
        prevent_default: false,
    };
    const PREVENT: Self = Self {
        prevent_default: true,
    };
}

/// Page-scoped navigation state and its event handlers.
#[derive(Debug, Clone)]
pub struct NavController {
    config: NavConfig,
    links: Vec<NavLink>,
    dropdowns: Vec<MenuState>,
    menu: MenuState,
    scroll_locked: bool,
    scroll: ScrollState,
    scrolled: bool,
    progress: f64,
    active_section: Option<String>,
    theme: Option<Palette>,
    scroll_debounce: DebounceTimer,
    load_animation_at: Option<Duration>,
    initialized: bool,
    mutations: Vec<DomMutation>,
}

impl NavController {
    /// Validate the config and markup inventory and build the controller.
    pub fn new(config: NavConfig, markup: PageMarkup) -> Result<Self, NavError> {
        config.validate()?;
        markup.validate()?;
        let scroll_debounce = DebounceTimer::new(config.scroll_debounce(), false);
        Ok(Self {
            links: markup.links,
            dropdowns: vec![MenuState::default(); markup.dropdowns.len()],
            menu: MenuState::default(),
            scroll_locked: false,
            scroll: ScrollState::default(),
            scrolled: false,
            progress: 0.0,
            active_section: None,
            theme: None,
            scroll_debounce,
            load_animation_at: None,
            initialized: false,
            mutations: Vec::new(),
            config,
        })
    }

    /// Insert the progress bar, start the load animation, and seed the theme.
    ///
    /// Must be called once before [`handle`](Self::handle); later calls are
    /// ignored.
    pub fn init(&mut self, host: &impl PageHost, now: Duration) {
        if self.initialized {
            warn!("init() called twice; ignored");
            return;
        }
        self.initialized = true;

        self.mutations.push(DomMutation::InsertProgressBar);
        self.mutations
            .push(DomMutation::style(Target::Navbar, "transform", NAVBAR_HIDDEN));
        self.load_animation_at = Some(now.saturating_add(self.config.load_animation_delay()));

        self.update_scroll_progress(host);

        let palette = self.config.even_palette.clone();
        self.push_palette(Target::Root, &palette);

        info!(
            links = self.links.len(),
            dropdowns = self.dropdowns.len(),
            "navigation initialized"
        );
    }

    /// Dispatch one DOM event. Events before [`init`](Self::init) are dropped.
    pub fn handle(&mut self, event: NavEvent, host: &impl PageHost, now: Duration) -> EventOutcome {
        if !self.initialized {
            warn!(kind = event.kind(), "event before init() dropped");
            return EventOutcome::PASS;
        }
        trace!(kind = event.kind(), "event");

        match event {
            NavEvent::Scroll => {
                self.scroll_debounce.call(now);
                EventOutcome::PASS
            }
            NavEvent::Resize => {
                self.on_resize(host);
                EventOutcome::PASS
            }
            NavEvent::HamburgerClick => {
                self.toggle_menu();
                EventOutcome::PASS
            }
            NavEvent::DocumentClick { inside_navbar } => {
                if !inside_navbar && self.menu.is_open {
                    debug!("outside click closes menu");
                    self.close_menu(true);
                }
                EventOutcome::PASS
            }
            NavEvent::LinkClick { index } => self.on_link_click(index, host),
            NavEvent::LinkEnter { index } => {
                self.set_link_transform(index, LINK_LIFTED);
                EventOutcome::PASS
            }
            NavEvent::LinkLeave { index } => {
                self.set_link_transform(index, LINK_RESTING);
                EventOutcome::PASS
            }
            NavEvent::DropdownEnter { index } => {
                self.hover_dropdown(index, true, host);
                EventOutcome::PASS
            }
            NavEvent::DropdownLeave { index } => {
                self.hover_dropdown(index, false, host);
                EventOutcome::PASS
            }
            NavEvent::DropdownToggleClick { index } => self.on_dropdown_toggle(index, host),
            NavEvent::Intersections { entries } => {
                self.on_intersections(&entries);
                EventOutcome::PASS
            }
        }
    }

    /// Fire due timers. Returns `true` when the host should request an
    /// animation frame and then call [`on_animation_frame`](Self::on_animation_frame).
    pub fn poll(&mut self, now: Duration) -> bool {
        if self.load_animation_at.is_some_and(|at| now >= at) {
            self.load_animation_at = None;
            self.mutations.push(DomMutation::style(
                Target::Navbar,
                "transition",
                NAVBAR_TRANSITION,
            ));
            self.mutations
                .push(DomMutation::style(Target::Navbar, "transform", NAVBAR_SHOWN));
        }

        if !self.scroll_debounce.poll(now) {
            return false;
        }
        let request = !self.scroll.is_progress_updating;
        self.scroll.is_progress_updating = true;
        if !request {
            trace!("frame already pending; coalesced");
        }
        request
    }

    /// Earliest time at which [`poll`](Self::poll) has work to do.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        match (self.scroll_debounce.deadline(), self.load_animation_at) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Coalesced visual update for the latest scroll offset.
    pub fn on_animation_frame(&mut self, host: &impl PageHost) {
        let offset = host.scroll_y();
        self.scroll.offset = offset;

        let scrolled = offset > self.config.scrolled_threshold;
        if scrolled != self.scrolled {
            debug!(offset, scrolled, "navbar scrolled state changed");
        }
        self.scrolled = scrolled;
        self.mutations
            .push(DomMutation::class(Target::Navbar, CLASS_SCROLLED, scrolled));

        self.update_scroll_progress(host);

        let sections = host.sections();
        if self.config.active_link_policy.uses_offset_scan() {
            self.scan_active_link(&sections);
        }
        self.update_theme(&sections);

        self.scroll.is_progress_updating = false;
    }

    /// Recompute the progress bar width from the last known offset.
    pub fn update_scroll_progress(&mut self, host: &impl PageHost) {
        let percent = scroll_progress_percent(
            self.scroll.offset,
            host.document_height(),
            host.viewport_height(),
        );
        self.progress = percent;
        self.mutations.push(DomMutation::style(
            Target::ProgressBar,
            "width",
            format!("{percent}%"),
        ));
    }

    /// Smoothly scroll so `target` sits `smooth_scroll_offset` below the top.
    ///
    /// Unknown targets are ignored.
    pub fn smooth_scroll(&mut self, target: &str, host: &impl PageHost) {
        let Some(top) = host.anchor_top(target) else {
            debug!(selector = target, "smooth scroll target not found");
            return;
        };
        self.mutations.push(DomMutation::ScrollTo {
            top: top - self.config.smooth_scroll_offset,
            smooth: true,
        });
    }

    /// Take the pending mutation batch, leaving it empty.
    pub fn take_mutations(&mut self) -> Vec<DomMutation> {
        std::mem::take(&mut self.mutations)
    }

    #[must_use]
    pub fn mutations(&self) -> &[DomMutation] {
        &self.mutations
    }

    #[must_use]
    pub const fn config(&self) -> &NavConfig {
        &self.config
    }

    #[must_use]
    pub fn links(&self) -> &[NavLink] {
        &self.links
    }

    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    #[must_use]
    pub const fn scroll_state(&self) -> ScrollState {
        self.scroll
    }

    #[must_use]
    pub const fn is_scrolled(&self) -> bool {
        self.scrolled
    }

    /// Last progress bar width written, in percent.
    #[must_use]
    pub const fn progress_percent(&self) -> f64 {
        self.progress
    }

    /// Mobile menu open state. The hamburger always mirrors it.
    #[must_use]
    pub const fn is_menu_open(&self) -> bool {
        self.menu.is_open
    }

    /// Whether the last `overflow` written to `body` was `hidden`.
    ///
    /// Usually mirrors the menu, except that closing the menu through a link
    /// click leaves the lock in place.
    #[must_use]
    pub const fn is_scroll_locked(&self) -> bool {
        self.scroll_locked
    }

    #[must_use]
    pub fn is_dropdown_open(&self, index: usize) -> bool {
        self.dropdowns.get(index).is_some_and(|d| d.is_open)
    }

    /// Index of the mobile-open dropdown, if any.
    #[must_use]
    pub fn open_dropdown(&self) -> Option<usize> {
        self.dropdowns.iter().position(|d| d.is_open)
    }

    #[must_use]
    pub fn active_section(&self) -> Option<&str> {
        self.active_section.as_deref()
    }

    /// First link pointing at the active section.
    #[must_use]
    pub fn active_link(&self) -> Option<usize> {
        let id = self.active_section.as_deref()?;
        self.links.iter().position(|link| link.targets(id))
    }

    /// Palette last written to the navbar by the theme switcher.
    #[must_use]
    pub fn theme(&self) -> Option<&Palette> {
        self.theme.as_ref()
    }

    fn on_resize(&mut self, host: &impl PageHost) {
        let width = host.viewport_width();
        if !self.config.is_mobile_width(width) {
            if self.menu.is_open {
                debug!(width, "desktop resize closes menu");
            }
            self.close_menu(true);
        }
        self.update_scroll_progress(host);
    }

    fn toggle_menu(&mut self) {
        self.menu.is_open = !self.menu.is_open;
        let open = self.menu.is_open;
        debug!(open, "hamburger toggled");
        self.push_menu_classes(open);
        self.push_scroll_lock(open);
    }

    fn close_menu(&mut self, release_scroll_lock: bool) {
        self.menu.is_open = false;
        self.push_menu_classes(false);
        if release_scroll_lock {
            self.push_scroll_lock(false);
        }
    }

    fn push_menu_classes(&mut self, open: bool) {
        self.mutations
            .push(DomMutation::class(Target::Hamburger, CLASS_ACTIVE, open));
        self.mutations
            .push(DomMutation::class(Target::Menu, CLASS_ACTIVE, open));
    }

    fn push_scroll_lock(&mut self, locked: bool) {
        self.scroll_locked = locked;
        let overflow = if locked { "hidden" } else { "auto" };
        self.mutations
            .push(DomMutation::style(Target::Body, "overflow", overflow));
    }

    fn on_link_click(&mut self, index: usize, host: &impl PageHost) -> EventOutcome {
        let Some(link) = self.links.get(index) else {
            debug!(index, "click on unknown link");
            return EventOutcome::PASS;
        };
        if !link.is_internal() {
            return EventOutcome::PASS;
        }
        let target = link.href.clone().unwrap_or_default();
        self.smooth_scroll(&target, host);
        self.close_menu(false);
        EventOutcome::PREVENT
    }

    fn set_link_transform(&mut self, index: usize, transform: &'static str) {
        if index < self.links.len() {
            self.mutations
                .push(DomMutation::style(Target::Link(index), "transform", transform));
        }
    }

    fn hover_dropdown(&mut self, index: usize, entering: bool, host: &impl PageHost) {
        if index >= self.dropdowns.len() || self.config.is_mobile_width(host.viewport_width()) {
            return;
        }
        let target = Target::DropdownMenu(index);
        let (opacity, visibility, transform) = if entering {
            ("1", "visible", SUBMENU_SHOWN_OFFSET)
        } else {
            ("0", "hidden", SUBMENU_HIDDEN_OFFSET)
        };
        self.mutations
            .push(DomMutation::style(target, "opacity", opacity));
        self.mutations
            .push(DomMutation::style(target, "visibility", visibility));
        self.mutations
            .push(DomMutation::style(target, "transform", transform));
    }

    fn on_dropdown_toggle(&mut self, index: usize, host: &impl PageHost) -> EventOutcome {
        if index >= self.dropdowns.len() || !self.config.is_mobile_width(host.viewport_width()) {
            return EventOutcome::PASS;
        }
        let was_open = self.dropdowns[index].is_open;

        for (i, dropdown) in self.dropdowns.iter_mut().enumerate() {
            dropdown.is_open = false;
            self.mutations.push(DomMutation::class(
                Target::DropdownMenu(i),
                CLASS_MOBILE_OPEN,
                false,
            ));
        }
        if !was_open {
            self.dropdowns[index].is_open = true;
            self.mutations.push(DomMutation::class(
                Target::DropdownMenu(index),
                CLASS_MOBILE_OPEN,
                true,
            ));
        }
        debug!(index, open = !was_open, "dropdown toggled");
        EventOutcome::PREVENT
    }

    fn on_intersections(&mut self, entries: &[IntersectionEntry]) {
        if !self.config.active_link_policy.uses_observer() {
            return;
        }
        for entry in entries.iter().filter(|entry| entry.is_intersecting) {
            self.set_active_section(Some(entry.id.clone()));
        }
    }

    fn scan_active_link(&mut self, sections: &[SectionRect]) {
        let lead = self.config.section_trigger_offset;
        match section_index_at(sections, self.scroll.offset, lead) {
            Some(index) => self.set_active_section(Some(sections[index].id.clone())),
            None => match self.config.no_match_policy {
                NoMatchPolicy::Sticky => trace!("no section in range; active link kept"),
                NoMatchPolicy::Clear => self.set_active_section(None),
            },
        }
    }

    fn set_active_section(&mut self, id: Option<String>) {
        for (index, link) in self.links.iter().enumerate() {
            let active = id.as_deref().is_some_and(|id| link.targets(id));
            self.mutations
                .push(DomMutation::class(Target::Link(index), CLASS_ACTIVE, active));
        }
        if id != self.active_section {
            debug!(section = id.as_deref().unwrap_or(""), "active section changed");
        }
        self.active_section = id;
    }

    fn update_theme(&mut self, sections: &[SectionRect]) {
        let lead = self.config.section_trigger_offset;
        let Some(index) = section_index_at(sections, self.scroll.offset, lead) else {
            return;
        };
        let palette = if index % 2 == 0 {
            self.config.even_palette.clone()
        } else {
            self.config.odd_palette.clone()
        };
        self.push_palette(Target::Navbar, &palette);
        self.theme = Some(palette);
    }

    fn push_palette(&mut self, target: Target, palette: &Palette) {
        self.mutations.push(DomMutation::custom_property(
            target,
            PROP_PRIMARY_COLOR,
            palette.primary.as_str(),
        ));
        self.mutations.push(DomMutation::custom_property(
            target,
            PROP_HOVER_COLOR,
            palette.hover.as_str(),
        ));
    }
}
