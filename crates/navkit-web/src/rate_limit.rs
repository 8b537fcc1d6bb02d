#![forbid(unsafe_code)]

//! JS-facing `debounce`/`throttle` built on the core timing primitives.
//!
//! The returned wrappers forward their first argument to `func`; `this` is
//! not preserved.

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::Function;
use navkit_core::{DebounceTimer, ThrottleWindow};
use tracing::warn;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::Window;
use web_time::Instant;

struct DebounceState {
    func: Function,
    timer: DebounceTimer,
    pending: Option<JsValue>,
    timeout_id: Option<i32>,
    epoch: Instant,
}

fn invoke(func: &Function, arg: &JsValue) {
    if let Err(err) = func.call1(&JsValue::NULL, arg) {
        warn!(error = ?err, "rate-limited callback threw");
    }
}

fn window() -> Result<Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))
}

/// Delay `func` until `wait` ms pass without another call.
///
/// With `immediate`, the first call of a burst runs at once and the trailing
/// edge is skipped.
#[wasm_bindgen]
pub fn debounce(func: Function, wait: u32, immediate: bool) -> Result<Function, JsValue> {
    let window = window()?;
    let delay = i32::try_from(wait).unwrap_or(i32::MAX);
    let state = Rc::new(RefCell::new(DebounceState {
        func,
        timer: DebounceTimer::new(core::time::Duration::from_millis(u64::from(wait)), immediate),
        pending: None,
        timeout_id: None,
        epoch: Instant::now(),
    }));

    let on_timeout: Function = {
        let state = Rc::clone(&state);
        Closure::<dyn FnMut()>::new(move || {
            let due = {
                let mut s = state.borrow_mut();
                s.timeout_id = None;
                // The timeout only survives when no later call re-armed the
                // timer, so its firing is the deadline.
                let now = s.timer.deadline().unwrap_or_else(|| s.epoch.elapsed());
                let fire = s.timer.poll(now);
                let pending = s.pending.take();
                fire.then(|| pending.map(|arg| (s.func.clone(), arg))).flatten()
            };
            if let Some((func, arg)) = due {
                invoke(&func, &arg);
            }
        })
        .into_js_value()
        .unchecked_into()
    };

    let wrapper = Closure::<dyn FnMut(JsValue)>::new(move |arg: JsValue| {
        let leading = {
            let mut s = state.borrow_mut();
            if let Some(id) = s.timeout_id.take() {
                window.clear_timeout_with_handle(id);
            }
            let now = s.epoch.elapsed();
            let leading = s.timer.call(now);
            match window.set_timeout_with_callback_and_timeout_and_arguments_0(&on_timeout, delay)
            {
                Ok(id) => s.timeout_id = Some(id),
                Err(err) => warn!(error = ?err, "setTimeout failed"),
            }
            if leading {
                Some(s.func.clone())
            } else {
                s.pending = Some(arg.clone());
                None
            }
        };
        if let Some(func) = leading {
            invoke(&func, &arg);
        }
    });
    Ok(wrapper.into_js_value().unchecked_into())
}

/// Run `func` at most once per `limit` ms; calls inside the window are dropped.
#[wasm_bindgen]
pub fn throttle(func: Function, limit: u32) -> Function {
    let mut window = ThrottleWindow::new(core::time::Duration::from_millis(u64::from(limit)));
    let epoch = Instant::now();
    Closure::<dyn FnMut(JsValue)>::new(move |arg: JsValue| {
        if window.call(epoch.elapsed()) {
            invoke(&func, &arg);
        }
    })
    .into_js_value()
    .unchecked_into()
}
