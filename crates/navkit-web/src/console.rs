//! `tracing` layer that forwards events to the browser console.
//!
//! Events are flattened to one line (`LEVEL target: message key=value ...`)
//! and handed to a sink. On wasm the sink is `web_sys::console`; native builds
//! and tests install their own.

use std::fmt::{self, Write as _};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

type Sink = Box<dyn Fn(Level, &str) + Send + Sync>;

/// Layer writing each enabled event through a sink.
pub struct ConsoleLayer {
    max_level: Level,
    sink: Sink,
}

impl ConsoleLayer {
    /// Forward events at `max_level` or more severe to `sink`.
    pub fn new<F>(max_level: Level, sink: F) -> Self
    where
        F: Fn(Level, &str) + Send + Sync + 'static,
    {
        Self {
            max_level,
            sink: Box::new(sink),
        }
    }

    /// Layer bound to `console.error/warn/info/debug/log`.
    #[cfg(target_arch = "wasm32")]
    pub fn browser(max_level: Level) -> Self {
        Self::new(max_level, write_to_console)
    }

    #[must_use]
    pub const fn max_level(&self) -> Level {
        self.max_level
    }
}

impl fmt::Debug for ConsoleLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleLayer")
            .field("max_level", &self.max_level)
            .finish_non_exhaustive()
    }
}

impl<S: Subscriber> Layer<S> for ConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        // Level ordering is by verbosity: TRACE > DEBUG > ... > ERROR.
        if *meta.level() > self.max_level {
            return;
        }
        let mut line = LineVisitor::default();
        event.record(&mut line);
        (self.sink)(*meta.level(), &line.finish(*meta.level(), meta.target()));
    }
}

#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl LineVisitor {
    fn finish(self, level: Level, target: &str) -> String {
        format!("{level} {target}: {}{}", self.message, self.fields)
    }
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={value}", field.name());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            let _ = write!(self.fields, " {}={value:?}", field.name());
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn write_to_console(level: Level, line: &str) {
    let line = wasm_bindgen::JsValue::from_str(line);
    match level {
        Level::ERROR => web_sys::console::error_1(&line),
        Level::WARN => web_sys::console::warn_1(&line),
        Level::INFO => web_sys::console::info_1(&line),
        Level::DEBUG => web_sys::console::debug_1(&line),
        Level::TRACE => web_sys::console::log_1(&line),
    }
}

/// Install a console layer as the global subscriber.
///
/// Returns `false` when a global subscriber was already set.
#[cfg(target_arch = "wasm32")]
pub fn install(max_level: Level) -> bool {
    use tracing_subscriber::layer::SubscriberExt;

    let subscriber = tracing_subscriber::registry().with(ConsoleLayer::browser(max_level));
    tracing::subscriber::set_global_default(subscriber).is_ok()
}
