#![forbid(unsafe_code)]

//! WASM frontend for navkit.
//!
//! This crate is host-specific (web/WASM). It owns the parts of the navigation
//! controller that need a browser:
//! - querying the navbar collaborators once at startup,
//! - registering DOM listeners and the section `IntersectionObserver`,
//! - scheduling `setTimeout`/`requestAnimationFrame` for controller deadlines,
//! - applying emitted [`navkit_core::DomMutation`] batches through `web-sys`.
//!
//! Behavior lives in `navkit-core`; this crate only moves events in and
//! mutations out.

pub mod console;

#[cfg(target_arch = "wasm32")]
mod page;
#[cfg(target_arch = "wasm32")]
mod rate_limit;
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use rate_limit::{debounce, throttle};
#[cfg(target_arch = "wasm32")]
pub use wasm::NavigationMenu;

/// Selectors for the collaborators queried at startup.
pub mod selectors {
    pub const NAVBAR: &str = "#navbar";
    pub const HAMBURGER: &str = ".hamburger";
    pub const MENU: &str = ".nav-menu";
    pub const LINK: &str = ".nav-link";
    pub const DROPDOWN: &str = ".dropdown";
    pub const DROPDOWN_TOGGLE: &str = ".dropdown-toggle";
    pub const DROPDOWN_MENU: &str = ".dropdown-menu";
    pub const SECTION: &str = ".section";
}

/// Native builds compile this crate as a stub so `cargo check --workspace` stays
/// green on non-wasm targets.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default)]
pub struct NavigationMenu;

#[cfg(not(target_arch = "wasm32"))]
impl NavigationMenu {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self
    }
}
