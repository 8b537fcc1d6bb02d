#![forbid(unsafe_code)]

use std::cell::RefCell;
use std::rc::Rc;

use core::time::Duration;

use js_sys::Array;
use navkit_core::{EventOutcome, IntersectionEntry, NavConfig, NavController, NavEvent};
use tracing::{Level, debug, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    Element, Event, EventTarget, IntersectionObserver, IntersectionObserverEntry,
    IntersectionObserverInit, Node, Window,
};
use web_time::Instant;

use crate::console;
use crate::page::DomPage;
use crate::selectors;

/// Controller plus the browser handles it is driven by.
struct Runtime {
    window: Window,
    nav: NavController,
    page: DomPage,
    epoch: Instant,
    timeout_id: Option<i32>,
    frame_id: Option<i32>,
    on_timeout: Option<Closure<dyn FnMut()>>,
    on_frame: Option<Closure<dyn FnMut(f64)>>,
}

type Shared = Rc<RefCell<Runtime>>;

impl Runtime {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }

    fn dispatch(&mut self, event: NavEvent) -> EventOutcome {
        let now = self.now();
        let outcome = self.nav.handle(event, &self.page, now);
        self.flush();
        outcome
    }

    /// Apply pending mutations and re-arm the deadline timer.
    fn flush(&mut self) {
        let batch = self.nav.take_mutations();
        if let Err(err) = self.page.apply(&batch) {
            warn!(error = ?err, "failed to apply dom mutations");
        }
        self.schedule();
    }

    fn schedule(&mut self) {
        if let Some(id) = self.timeout_id.take() {
            self.window.clear_timeout_with_handle(id);
        }
        let (Some(deadline), Some(callback)) = (self.nav.next_deadline(), &self.on_timeout) else {
            return;
        };
        let delay = deadline.saturating_sub(self.now());
        let delay = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        match self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.as_ref().unchecked_ref(),
                delay,
            ) {
            Ok(id) => self.timeout_id = Some(id),
            Err(err) => warn!(error = ?err, "setTimeout failed"),
        }
    }

    fn on_timeout(&mut self) {
        self.timeout_id = None;
        // A timer fires at or after the deadline it was armed for.
        let now = self
            .nav
            .next_deadline()
            .map_or_else(|| self.now(), |deadline| deadline.max(self.now()));
        if self.nav.poll(now)
            && let Some(callback) = &self.on_frame
        {
            match self
                .window
                .request_animation_frame(callback.as_ref().unchecked_ref())
            {
                Ok(id) => self.frame_id = Some(id),
                Err(err) => warn!(error = ?err, "requestAnimationFrame failed"),
            }
        }
        self.flush();
    }

    fn on_frame(&mut self) {
        self.frame_id = None;
        self.nav.on_animation_frame(&self.page);
        self.flush();
    }
}

/// Run `f` against the runtime unless it is already borrowed further up the
/// stack.
fn with_runtime<R>(shared: &Shared, f: impl FnOnce(&mut Runtime) -> R) -> Option<R> {
    match shared.try_borrow_mut() {
        Ok(mut runtime) => Some(f(&mut runtime)),
        Err(_) => {
            debug!("re-entrant callback dropped");
            None
        }
    }
}

/// One registered DOM listener, kept alive until [`NavigationMenu::destroy`].
struct Listener {
    target: EventTarget,
    kind: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl Listener {
    fn add(
        target: &EventTarget,
        kind: &'static str,
        callback: impl FnMut(Event) + 'static,
    ) -> Result<Self, JsValue> {
        let callback = Closure::<dyn FnMut(Event)>::new(callback);
        target.add_event_listener_with_callback(kind, callback.as_ref().unchecked_ref())?;
        Ok(Self {
            target: target.clone(),
            kind,
            callback,
        })
    }

    fn remove(&self) {
        if let Err(err) = self
            .target
            .remove_event_listener_with_callback(self.kind, self.callback.as_ref().unchecked_ref())
        {
            warn!(error = ?err, kind = self.kind, "removeEventListener failed");
        }
    }
}

/// Forward events of `kind` on `target` into the controller as `event`.
fn forward(
    shared: &Shared,
    target: &EventTarget,
    kind: &'static str,
    event: NavEvent,
) -> Result<Listener, JsValue> {
    let shared = Rc::clone(shared);
    Listener::add(target, kind, move |dom_event: Event| {
        let outcome = with_runtime(&shared, |rt| rt.dispatch(event.clone()));
        if outcome.is_some_and(|o| o.prevent_default) {
            dom_event.prevent_default();
        }
    })
}

/// Navigation bar controller bound to the live page.
///
/// JS usage:
///
/// ```js
/// const nav = new NavigationMenu();
/// nav.init({ mobile_breakpoint: 900 });
/// nav.smoothScroll("#contact");
/// ```
#[wasm_bindgen]
pub struct NavigationMenu {
    shared: Option<Shared>,
    listeners: Vec<Listener>,
    observer: Option<IntersectionObserver>,
    observer_callback: Option<Closure<dyn FnMut(Array)>>,
}

#[wasm_bindgen]
impl NavigationMenu {
    #[wasm_bindgen(constructor)]
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            shared: None,
            listeners: Vec::new(),
            observer: None,
            observer_callback: None,
        }
    }

    /// Query the page, install listeners and run the startup sequence.
    ///
    /// `options` is an optional partial config object. Rejects when a
    /// required element is missing or the config is invalid.
    pub fn init(&mut self, options: Option<JsValue>) -> Result<(), JsValue> {
        if self.shared.is_some() {
            return Err(JsValue::from_str("NavigationMenu is already initialized"));
        }
        console::install(Level::INFO);

        let config = match options {
            Some(options) if !options.is_undefined() && !options.is_null() => {
                let json: String = js_sys::JSON::stringify(&options)?.into();
                NavConfig::from_json_str(&json).map_err(to_js)?
            }
            _ => NavConfig::default(),
        };
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
        let (page, markup) = DomPage::query(window.clone()).map_err(to_js)?;
        let nav = NavController::new(config, markup).map_err(to_js)?;

        let shared = Rc::new(RefCell::new(Runtime {
            window: window.clone(),
            nav,
            page,
            epoch: Instant::now(),
            timeout_id: None,
            frame_id: None,
            on_timeout: None,
            on_frame: None,
        }));
        {
            let weak = Rc::downgrade(&shared);
            let on_timeout = Closure::<dyn FnMut()>::new(move || {
                if let Some(shared) = weak.upgrade() {
                    with_runtime(&shared, Runtime::on_timeout);
                }
            });
            let weak = Rc::downgrade(&shared);
            let on_frame = Closure::<dyn FnMut(f64)>::new(move |_ts: f64| {
                if let Some(shared) = weak.upgrade() {
                    with_runtime(&shared, Runtime::on_frame);
                }
            });
            let mut rt = shared.borrow_mut();
            rt.on_timeout = Some(on_timeout);
            rt.on_frame = Some(on_frame);
        }

        if let Err(err) = self
            .install_listeners(&shared, &window)
            .and_then(|()| self.install_observer(&shared))
        {
            self.destroy();
            return Err(err);
        }

        with_runtime(&shared, |rt| {
            let now = rt.now();
            rt.nav.init(&rt.page, now);
            rt.flush();
        });
        self.shared = Some(shared);
        Ok(())
    }

    /// Recompute the progress bar from the current scroll position.
    #[wasm_bindgen(js_name = updateScrollProgress)]
    pub fn update_scroll_progress(&self) {
        if let Some(shared) = &self.shared {
            with_runtime(shared, |rt| {
                rt.nav.update_scroll_progress(&rt.page);
                rt.flush();
            });
        }
    }

    /// Smooth-scroll so `target` lands below the fixed navbar; unknown
    /// targets are ignored.
    #[wasm_bindgen(js_name = smoothScroll)]
    pub fn smooth_scroll(&self, target: &str) {
        if let Some(shared) = &self.shared {
            with_runtime(shared, |rt| {
                rt.nav.smooth_scroll(target, &rt.page);
                rt.flush();
            });
        }
    }

    /// Whether `init` has completed.
    #[wasm_bindgen(js_name = isInitialized)]
    pub fn is_initialized(&self) -> bool {
        self.shared.is_some()
    }

    /// Remove every listener, disconnect the observer and cancel timers.
    pub fn destroy(&mut self) {
        for listener in self.listeners.drain(..) {
            listener.remove();
        }
        if let Some(observer) = self.observer.take() {
            observer.disconnect();
        }
        self.observer_callback = None;
        if let Some(shared) = self.shared.take()
            && let Ok(mut rt) = shared.try_borrow_mut()
        {
            if let Some(id) = rt.timeout_id.take() {
                rt.window.clear_timeout_with_handle(id);
            }
            if let Some(id) = rt.frame_id.take()
                && let Err(err) = rt.window.cancel_animation_frame(id)
            {
                warn!(error = ?err, "cancelAnimationFrame failed");
            }
            rt.on_timeout = None;
            rt.on_frame = None;
        }
    }
}

impl NavigationMenu {
    fn install_listeners(&mut self, shared: &Shared, window: &Window) -> Result<(), JsValue> {
        let (document, hamburger, links, dropdowns) = {
            let rt = shared.borrow();
            let document: EventTarget = window
                .document()
                .ok_or_else(|| JsValue::from_str("window has no document"))?
                .into();
            let links: Vec<EventTarget> = rt.page.links.iter().map(|l| l.clone().into()).collect();
            let dropdowns: Vec<(EventTarget, EventTarget)> = rt
                .page
                .dropdowns
                .iter()
                .map(|d| (d.container.clone().into(), d.toggle.clone().into()))
                .collect();
            let hamburger: EventTarget = rt.page.hamburger.clone().into();
            (document, hamburger, links, dropdowns)
        };
        let window: &EventTarget = window.as_ref();

        self.listeners
            .push(forward(shared, window, "scroll", NavEvent::Scroll)?);
        self.listeners
            .push(forward(shared, window, "resize", NavEvent::Resize)?);
        self.listeners
            .push(forward(shared, &hamburger, "click", NavEvent::HamburgerClick)?);

        let document_click = {
            let shared = Rc::clone(shared);
            Listener::add(&document, "click", move |event: Event| {
                with_runtime(&shared, |rt| {
                    let inside_navbar = event
                        .target()
                        .and_then(|t| t.dyn_into::<Node>().ok())
                        .is_some_and(|node| rt.page.navbar.contains(Some(&node)));
                    rt.dispatch(NavEvent::DocumentClick { inside_navbar });
                });
            })?
        };
        self.listeners.push(document_click);

        for (index, link) in links.iter().enumerate() {
            self.listeners
                .push(forward(shared, link, "click", NavEvent::LinkClick { index })?);
            self.listeners
                .push(forward(shared, link, "mouseenter", NavEvent::LinkEnter { index })?);
            self.listeners
                .push(forward(shared, link, "mouseleave", NavEvent::LinkLeave { index })?);
        }
        for (index, (container, toggle)) in dropdowns.iter().enumerate() {
            self.listeners.push(forward(
                shared,
                container,
                "mouseenter",
                NavEvent::DropdownEnter { index },
            )?);
            self.listeners.push(forward(
                shared,
                container,
                "mouseleave",
                NavEvent::DropdownLeave { index },
            )?);
            self.listeners.push(forward(
                shared,
                toggle,
                "click",
                NavEvent::DropdownToggleClick { index },
            )?);
        }
        debug!(count = self.listeners.len(), "listeners installed");
        Ok(())
    }

    fn install_observer(&mut self, shared: &Shared) -> Result<(), JsValue> {
        let (root_margin, threshold, document) = {
            let rt = shared.borrow();
            let config = rt.nav.config();
            if !config.active_link_policy.uses_observer() {
                return Ok(());
            }
            (
                config.observer_root_margin(),
                config.observer_threshold,
                rt.window
                    .document()
                    .ok_or_else(|| JsValue::from_str("window has no document"))?,
            )
        };

        let callback = {
            let shared = Rc::clone(shared);
            Closure::<dyn FnMut(Array)>::new(move |records: Array| {
                let entries = records
                    .iter()
                    .filter_map(|record| record.dyn_into::<IntersectionObserverEntry>().ok())
                    .map(|entry| IntersectionEntry {
                        id: entry.target().id(),
                        is_intersecting: entry.is_intersecting(),
                    })
                    .collect();
                with_runtime(&shared, |rt| rt.dispatch(NavEvent::Intersections { entries }));
            })
        };

        let options = IntersectionObserverInit::new();
        options.set_root_margin(&root_margin);
        options.set_threshold(&JsValue::from_f64(threshold));
        let observer =
            IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &options)?;

        let sections = document.query_selector_all(selectors::SECTION)?;
        for i in 0..sections.length() {
            if let Some(section) = sections.get(i).and_then(|n| n.dyn_into::<Element>().ok()) {
                observer.observe(&section);
            }
        }
        self.observer = Some(observer);
        self.observer_callback = Some(callback);
        Ok(())
    }
}

impl Drop for NavigationMenu {
    fn drop(&mut self) {
        self.destroy();
    }
}

fn to_js(err: navkit_core::NavError) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}
