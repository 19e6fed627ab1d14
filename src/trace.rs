//! The scanner's trace bus (spec.md §4.4): a single fault-isolated callback
//! slot. Grounded on the donor's `ParserGuard`, which always leaves the
//! parser in a safe state no matter how the guarded scope ends — here the
//! "guarded scope" is a single subscriber callback, and the safe state on
//! fault is "disabled for the rest of this scan".

use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextEventKind {
    Push,
    Pop,
}

#[derive(Debug, Clone)]
pub enum TraceEvent {
    Context {
        kind: ContextEventKind,
        mode: &'static str,
        line: usize,
        column: usize,
    },
    FlagChange {
        flag: &'static str,
        old: String,
        new: String,
        line: usize,
        column: usize,
    },
    Token {
        kind: &'static str,
        line: usize,
        column: usize,
    },
}

/// Wraps a subscriber callback with the enable/disable state spec.md §4.4
/// requires: a throwing callback is caught exactly once, logged, and
/// disabled for the remainder of the current `tokenize()` call; the next
/// `tokenize()` call re-enables it.
pub struct TraceSink {
    callback: Option<Box<dyn FnMut(TraceEvent)>>,
    enabled: Cell<bool>,
}

impl TraceSink {
    pub fn new(callback: Option<Box<dyn FnMut(TraceEvent)>>) -> Self {
        TraceSink {
            callback,
            enabled: Cell::new(true),
        }
    }

    pub fn none() -> Self {
        TraceSink::new(None)
    }

    /// Re-arms the sink at the start of a new `tokenize()` call.
    pub fn reset_for_new_scan(&mut self) {
        self.enabled.set(true);
    }

    pub fn emit(&mut self, event: TraceEvent) {
        if !self.enabled.get() {
            return;
        }
        let Some(callback) = self.callback.as_mut() else {
            return;
        };
        let mut callback = AssertUnwindSafe(callback);
        let result = panic::catch_unwind(move || {
            callback(event);
        });
        if result.is_err() {
            log::warn!("cal_front: trace callback panicked; disabling it for this scan");
            self.enabled.set(false);
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }
}

impl Default for TraceSink {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn disabled_sink_drops_events_silently() {
        let mut sink = TraceSink::none();
        sink.emit(TraceEvent::Token {
            kind: "Begin",
            line: 1,
            column: 1,
        });
        assert!(sink.is_enabled());
    }

    #[test]
    fn successful_callback_stays_enabled() {
        let seen = Rc::new(RefCell::new(0));
        let seen2 = seen.clone();
        let mut sink = TraceSink::new(Some(Box::new(move |_event| {
            *seen2.borrow_mut() += 1;
        })));
        sink.emit(TraceEvent::Token {
            kind: "Begin",
            line: 1,
            column: 1,
        });
        assert_eq!(*seen.borrow(), 1);
        assert!(sink.is_enabled());
    }

    #[test]
    fn panicking_callback_is_caught_once_then_disabled() {
        let mut sink = TraceSink::new(Some(Box::new(|_event| {
            panic!("boom");
        })));
        sink.emit(TraceEvent::Token {
            kind: "Begin",
            line: 1,
            column: 1,
        });
        assert!(!sink.is_enabled());
        // Further events are silently dropped, not re-attempted.
        sink.emit(TraceEvent::Token {
            kind: "End",
            line: 2,
            column: 1,
        });
        assert!(!sink.is_enabled());
    }

    #[test]
    fn reset_for_new_scan_re_enables() {
        let mut sink = TraceSink::new(Some(Box::new(|_event| panic!("boom"))));
        sink.emit(TraceEvent::Token {
            kind: "Begin",
            line: 1,
            column: 1,
        });
        assert!(!sink.is_enabled());
        sink.reset_for_new_scan();
        assert!(sink.is_enabled());
    }
}
