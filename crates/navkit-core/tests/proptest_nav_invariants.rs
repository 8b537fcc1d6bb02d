//! Property-based invariant tests for the navigation controller.
//!
//! Verifies:
//! 1. Progress width is `clamp(o / (doc - vh) * 100, 0, 100)`, or 100 on short pages
//! 2. `scrolled` is set exactly when the offset exceeds 50
//! 3. At most one dropdown is mobile-open for any click sequence
//! 4. Hamburger click parity drives menu and scroll lock in lock-step
//! 5. At most one link carries `active` for any mix of scroll frames and observer batches
//! 6. Desktop resize always leaves the menu closed and body scroll released
//! 7. Throttle runs the first call and never twice within one window
//! 8. Trailing debounce runs at most once per burst, with the last arguments

use core::time::Duration;
use std::cell::RefCell;

use navkit_core::dom::{CLASS_ACTIVE, CLASS_MOBILE_OPEN, CLASS_SCROLLED};
use navkit_core::geometry::scroll_progress_percent;
use navkit_core::timing::{debounce, throttle};
use navkit_core::{
    DeterministicClock, IntersectionEntry, MirrorDom, NavConfig, NavController, NavEvent,
    PageMarkup, PageMetrics, SectionRect, Target,
};
use proptest::prelude::*;

// ── Fixtures ──────────────────────────────────────────────────────────

const SECTION_IDS: [&str; 4] = ["home", "about", "services", "contact"];

fn page(width: f64, offset: f64) -> PageMetrics {
    let mut page = PageMetrics::new(width, 800.0, 3200.0).scrolled_to(offset);
    for (i, id) in SECTION_IDS.iter().enumerate() {
        page = page.with_section(SectionRect::new(*id, i as f64 * 800.0, 800.0));
    }
    page
}

fn started(dropdowns: usize) -> (NavController, MirrorDom) {
    let markup = PageMarkup::complete()
        .with_links(SECTION_IDS.iter().map(|id| format!("#{id}")))
        .with_dropdowns(dropdowns);
    let mut nav = NavController::new(NavConfig::default(), markup).expect("valid markup");
    let mut dom = MirrorDom::new();
    nav.init(&page(1280.0, 0.0), Duration::ZERO);
    dom.apply_all(&nav.take_mutations());
    (nav, dom)
}

fn run_frame(
    nav: &mut NavController,
    dom: &mut MirrorDom,
    host: &PageMetrics,
    clock: &mut DeterministicClock,
) {
    nav.handle(NavEvent::Scroll, host, clock.now());
    clock.advance(Duration::from_millis(10));
    if nav.poll(clock.now()) {
        nav.on_animation_frame(host);
    }
    dom.apply_all(&nav.take_mutations());
}

// ── Strategy helpers ──────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Step {
    Frame(f64),
    Observe(Vec<(usize, bool)>),
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (-200.0f64..3400.0).prop_map(Step::Frame),
        prop::collection::vec((0usize..4, any::<bool>()), 1..4).prop_map(Step::Observe),
    ]
}

// ── Properties ────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn progress_matches_clamped_ratio(offset in 0.0f64..=2400.0) {
        let expected = (offset / 2400.0 * 100.0).clamp(0.0, 100.0);
        let actual = scroll_progress_percent(offset, 3200.0, 800.0);
        prop_assert!((actual - expected).abs() < 1e-9);
    }

    #[test]
    fn progress_is_full_when_page_fits(offset in -100.0f64..1000.0, doc in 0.0f64..800.0) {
        prop_assert_eq!(scroll_progress_percent(offset, doc, 800.0), 100.0);
    }

    #[test]
    fn scrolled_flag_matches_threshold(offset in 0.0f64..400.0) {
        let (mut nav, mut dom) = started(0);
        let mut clock = DeterministicClock::new();
        clock.set(Duration::from_millis(500));
        run_frame(&mut nav, &mut dom, &page(1280.0, offset), &mut clock);
        prop_assert_eq!(nav.is_scrolled(), offset > 50.0);
        prop_assert_eq!(dom.has_class(Target::Navbar, CLASS_SCROLLED), offset > 50.0);
    }

    #[test]
    fn dropdowns_stay_mutually_exclusive(clicks in prop::collection::vec(0usize..5, 1..60)) {
        let (mut nav, mut dom) = started(5);
        let mobile = page(480.0, 0.0);
        for index in clicks {
            nav.handle(NavEvent::DropdownToggleClick { index }, &mobile, Duration::ZERO);
            dom.apply_all(&nav.take_mutations());
            prop_assert!(dom.targets_with_class(CLASS_MOBILE_OPEN).len() <= 1);
            prop_assert_eq!(
                dom.targets_with_class(CLASS_MOBILE_OPEN).first().copied(),
                nav.open_dropdown().map(Target::DropdownMenu)
            );
        }
    }

    #[test]
    fn hamburger_parity_controls_menu_and_lock(clicks in 0usize..40) {
        let (mut nav, mut dom) = started(0);
        for _ in 0..clicks {
            nav.handle(NavEvent::HamburgerClick, &page(480.0, 0.0), Duration::ZERO);
            dom.apply_all(&nav.take_mutations());
        }
        let open = clicks % 2 == 1;
        prop_assert_eq!(nav.is_menu_open(), open);
        prop_assert_eq!(nav.is_scroll_locked(), open);
        prop_assert_eq!(dom.has_class(Target::Menu, CLASS_ACTIVE), open);
        prop_assert_eq!(dom.has_class(Target::Hamburger, CLASS_ACTIVE), open);
        let overflow = dom.style(Target::Body, "overflow");
        if clicks == 0 {
            prop_assert_eq!(overflow, None);
        } else {
            prop_assert_eq!(overflow, Some(if open { "hidden" } else { "auto" }));
        }
    }

    #[test]
    fn at_most_one_active_link(steps in prop::collection::vec(arb_step(), 1..40)) {
        let (mut nav, mut dom) = started(0);
        let mut clock = DeterministicClock::new();
        clock.set(Duration::from_millis(200));
        for step in steps {
            match step {
                Step::Frame(offset) => run_frame(&mut nav, &mut dom, &page(1280.0, offset), &mut clock),
                Step::Observe(entries) => {
                    let entries = entries
                        .into_iter()
                        .map(|(i, on)| IntersectionEntry {
                            id: SECTION_IDS[i].to_string(),
                            is_intersecting: on,
                        })
                        .collect();
                    nav.handle(NavEvent::Intersections { entries }, &page(1280.0, 0.0), clock.now());
                    dom.apply_all(&nav.take_mutations());
                }
            }
            clock.advance(Duration::from_millis(20));
            let active = dom.targets_with_class(CLASS_ACTIVE);
            prop_assert!(active.len() <= 1);
            prop_assert_eq!(active.first().copied(), nav.active_link().map(Target::Link));
        }
    }

    #[test]
    fn desktop_resize_always_closes_menu(clicks in 0usize..6, width in 769.0f64..4000.0) {
        let (mut nav, mut dom) = started(0);
        for _ in 0..clicks {
            nav.handle(NavEvent::HamburgerClick, &page(480.0, 0.0), Duration::ZERO);
        }
        nav.handle(NavEvent::Resize, &page(width, 0.0), Duration::ZERO);
        dom.apply_all(&nav.take_mutations());
        prop_assert!(!nav.is_menu_open());
        prop_assert!(!dom.has_class(Target::Menu, CLASS_ACTIVE));
        prop_assert!(!dom.has_class(Target::Hamburger, CLASS_ACTIVE));
        prop_assert_eq!(dom.style(Target::Body, "overflow"), Some("auto"));
    }

    #[test]
    fn throttle_never_runs_twice_in_a_window(gaps in prop::collection::vec(0u64..250, 1..80)) {
        let runs = RefCell::new(Vec::new());
        let mut throttled = throttle(|t: u64| runs.borrow_mut().push(t), Duration::from_millis(100));
        let mut t = 0u64;
        let first = gaps[0];
        for gap in &gaps {
            t += gap;
            throttled.call(Duration::from_millis(t), t);
        }
        let runs = runs.borrow();
        prop_assert_eq!(runs.first().copied(), Some(first));
        for pair in runs.windows(2) {
            prop_assert!(pair[1] - pair[0] >= 100);
        }
    }

    #[test]
    fn trailing_debounce_fires_once_per_burst(burst in prop::collection::vec(0u64..20, 1..30)) {
        let runs = RefCell::new(Vec::new());
        let mut debounced = debounce(|n: usize| runs.borrow_mut().push(n), Duration::from_millis(100), false);
        let mut t = 0u64;
        for (i, gap) in burst.iter().enumerate() {
            t += gap;
            debounced.call(Duration::from_millis(t), i);
        }
        debounced.poll(Duration::from_millis(t + 99));
        prop_assert!(runs.borrow().is_empty());
        debounced.poll(Duration::from_millis(t + 100));
        prop_assert_eq!(runs.borrow().clone(), vec![burst.len() - 1]);
    }
}

// ── Fixed scenarios ───────────────────────────────────────────────────

#[test]
fn regression_fixture_offset_250_resolves_to_b() {
    let markup = PageMarkup::complete().with_links(["#a", "#b"]);
    let mut nav = NavController::new(NavConfig::default(), markup).expect("valid markup");
    let host = PageMetrics::new(1280.0, 600.0, 1200.0)
        .with_section(SectionRect::new("a", 0.0, 300.0))
        .with_section(SectionRect::new("b", 300.0, 300.0))
        .scrolled_to(250.0);
    nav.init(&host, Duration::ZERO);
    nav.handle(NavEvent::Scroll, &host, Duration::ZERO);
    assert!(nav.poll(Duration::from_millis(10)));
    nav.on_animation_frame(&host);
    assert_eq!(nav.active_section(), Some("b"));
    assert_eq!(nav.active_link(), Some(1));
}

#[test]
fn debounce_five_calls_within_50ms_runs_once_100ms_after_last() {
    let runs = RefCell::new(Vec::new());
    let mut debounced = debounce(|t: u64| runs.borrow_mut().push(t), Duration::from_millis(100), false);
    for t in [0u64, 12, 25, 37, 50] {
        debounced.call(Duration::from_millis(t), t);
    }
    for t in 51..150 {
        debounced.poll(Duration::from_millis(t));
    }
    assert!(runs.borrow().is_empty());
    debounced.poll(Duration::from_millis(150));
    assert_eq!(*runs.borrow(), vec![50]);
}

#[test]
fn throttle_every_10ms_for_500ms_runs_five_or_six_times() {
    let runs = RefCell::new(0u32);
    let mut throttled = throttle(|()| *runs.borrow_mut() += 1, Duration::from_millis(100));
    for t in (0..=500).step_by(10) {
        throttled.call(Duration::from_millis(t), ());
    }
    let runs = *runs.borrow();
    assert!((5..=6).contains(&runs), "ran {runs} times");
}
