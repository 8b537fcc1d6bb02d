//! Debounce and throttle wrappers driven by host-supplied time.
//!
//! There are no timers here. Callers pass the current monotonic time to every
//! call and call `poll` once a reported deadline has passed. Given the same
//! sequence of `(now, call)` pairs the output is always identical.
//!
//! The bare state machines ([`DebounceTimer`], [`ThrottleWindow`]) are what
//! the controller embeds; [`Debounced`] and [`Throttled`] wrap a closure for
//! standalone use.

use core::time::Duration;

/// Trailing (or leading, with `immediate`) debounce state.
#[derive(Debug, Clone)]
pub struct DebounceTimer {
    wait: Duration,
    immediate: bool,
    deadline: Option<Duration>,
}

impl DebounceTimer {
    #[must_use]
    pub const fn new(wait: Duration, immediate: bool) -> Self {
        Self {
            wait,
            immediate,
            deadline: None,
        }
    }

    /// Register a call at `now`, restarting the quiet period.
    ///
    /// Returns `true` when the call should run synchronously (leading edge of
    /// an `immediate` debounce).
    pub fn call(&mut self, now: Duration) -> bool {
        let call_now = self.immediate && self.deadline.is_none();
        self.deadline = Some(now.saturating_add(self.wait));
        call_now
    }

    /// Returns `true` when the trailing edge fires at `now`.
    ///
    /// An expired window always closes; in `immediate` mode it never fires.
    pub fn poll(&mut self, now: Duration) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                !self.immediate
            }
            _ => false,
        }
    }

    #[must_use]
    pub const fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

/// Leading-edge throttle state. Calls inside the window are dropped.
#[derive(Debug, Clone)]
pub struct ThrottleWindow {
    limit: Duration,
    open_at: Option<Duration>,
}

impl ThrottleWindow {
    #[must_use]
    pub const fn new(limit: Duration) -> Self {
        Self {
            limit,
            open_at: None,
        }
    }

    /// Returns `true` if the call at `now` runs, starting a new window.
    pub fn call(&mut self, now: Duration) -> bool {
        if self.open_at.is_some_and(|open_at| now < open_at) {
            return false;
        }
        self.open_at = Some(now.saturating_add(self.limit));
        true
    }

    /// End of the current window, if one is running.
    #[must_use]
    pub const fn window_end(&self) -> Option<Duration> {
        self.open_at
    }
}

/// A closure wrapped in a [`DebounceTimer`].
///
/// The trailing call receives the arguments of the most recent call.
pub struct Debounced<A, F>
where
    F: FnMut(A),
{
    timer: DebounceTimer,
    func: F,
    pending: Option<A>,
}

impl<A, F> Debounced<A, F>
where
    F: FnMut(A),
{
    #[must_use]
    pub fn new(func: F, wait: Duration, immediate: bool) -> Self {
        Self {
            timer: DebounceTimer::new(wait, immediate),
            func,
            pending: None,
        }
    }

    /// Invoke the wrapper. Returns `true` if `func` ran synchronously.
    pub fn call(&mut self, now: Duration, args: A) -> bool {
        // A window that expired before this call would already have fired.
        self.poll(now);
        if self.timer.call(now) {
            self.pending = None;
            (self.func)(args);
            true
        } else {
            self.pending = Some(args);
            false
        }
    }

    /// Fire the trailing call if its deadline has passed.
    pub fn poll(&mut self, now: Duration) -> bool {
        let due = self.timer.deadline().is_some_and(|deadline| now >= deadline);
        if !due {
            return false;
        }
        let fire = self.timer.poll(now);
        match self.pending.take() {
            Some(args) if fire => {
                (self.func)(args);
                true
            }
            _ => false,
        }
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Duration> {
        self.timer.deadline()
    }

    /// Drop any pending trailing call.
    pub fn cancel(&mut self) {
        self.timer.cancel();
        self.pending = None;
    }
}

impl<A, F> core::fmt::Debug for Debounced<A, F>
where
    F: FnMut(A),
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Debounced")
            .field("timer", &self.timer)
            .field("pending", &self.pending.is_some())
            .finish()
    }
}

/// A closure wrapped in a [`ThrottleWindow`].
pub struct Throttled<A, F>
where
    F: FnMut(A),
{
    window: ThrottleWindow,
    func: F,
    _args: core::marker::PhantomData<fn(A)>,
}

impl<A, F> Throttled<A, F>
where
    F: FnMut(A),
{
    #[must_use]
    pub fn new(func: F, limit: Duration) -> Self {
        Self {
            window: ThrottleWindow::new(limit),
            func,
            _args: core::marker::PhantomData,
        }
    }

    /// Invoke the wrapper. Returns `true` if `func` ran.
    pub fn call(&mut self, now: Duration, args: A) -> bool {
        if self.window.call(now) {
            (self.func)(args);
            true
        } else {
            false
        }
    }
}

impl<A, F> core::fmt::Debug for Throttled<A, F>
where
    F: FnMut(A),
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Throttled")
            .field("window", &self.window)
            .finish()
    }
}

/// Build a [`Debounced`] wrapper.
pub fn debounce<A, F>(func: F, wait: Duration, immediate: bool) -> Debounced<A, F>
where
    F: FnMut(A),
{
    Debounced::new(func, wait, immediate)
}

/// Build a [`Throttled`] wrapper.
pub fn throttle<A, F>(func: F, limit: Duration) -> Throttled<A, F>
where
    F: FnMut(A),
{
    Throttled::new(func, limit)
}
