//! Console capture for print-style output.
//!
//! A [`ConsoleSink`] is a bounded ring buffer of [`ConsoleEntry`] values plus
//! an optional observer that receives a snapshot after every mutation.
//!
//! Creating a sink with [`ConsoleSink::install`] also makes it the target of
//! every [`crate::script_log::emit_log`] call on the current thread, until
//! [`ConsoleSink::teardown`] puts the previous target back.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use chrono::{DateTime, Local};
use serde::Serialize;

/// Default number of entries kept before the oldest is evicted.
pub const DEFAULT_CAPACITY: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsoleEntry {
    pub timestamp: DateTime<Local>,
    pub severity: Severity,
    pub message: String,
}

/// Observer notified with the full buffer after each append or clear.
pub type ConsoleObserver = Box<dyn FnMut(&[ConsoleEntry])>;

// Sink currently receiving print-style output on this thread.
thread_local! {
    static ACTIVE_SINK: RefCell<Option<ConsoleSink>> = const { RefCell::new(None) };
}

struct SinkState {
    entries: RefCell<VecDeque<ConsoleEntry>>,
    capacity: usize,
    observer: RefCell<Option<ConsoleObserver>>,
    /// Whatever was installed before this sink, put back on teardown.
    previous: RefCell<Option<ConsoleSink>>,
    restored: Cell<bool>,
}

/// Cheaply clonable handle; clones share one buffer.
#[derive(Clone)]
pub struct ConsoleSink {
    state: Rc<SinkState>,
}

impl ConsoleSink {
    /// Create a sink without installing it.
    pub fn detached(capacity: usize) -> Self {
        Self {
            state: Rc::new(SinkState {
                entries: RefCell::new(VecDeque::with_capacity(capacity.max(1))),
                capacity: capacity.max(1),
                observer: RefCell::new(None),
                previous: RefCell::new(None),
                restored: Cell::new(true),
            }),
        }
    }

    /// Create a sink and make it the print target for this thread.
    pub fn install(capacity: usize) -> Self {
        let sink = Self::detached(capacity);
        let previous = ACTIVE_SINK.with(|slot| slot.borrow_mut().replace(sink.clone()));
        *sink.state.previous.borrow_mut() = previous;
        sink.state.restored.set(false);
        sink
    }

    /// Restore the print target that was active before [`ConsoleSink::install`].
    /// Only the first call has any effect.
    pub fn teardown(&self) {
        if self.state.restored.replace(true) {
            return;
        }
        let previous = self.state.previous.borrow_mut().take();
        ACTIVE_SINK.with(|slot| {
            let mut slot = slot.borrow_mut();
            match slot.as_ref() {
                Some(current) if current.same_sink(self) => *slot = previous,
                // Torn down out of order: splice it out of the chain so a
                // later teardown cannot put it back.
                Some(current) => current.unlink(self, previous),
                None => {}
            }
        });
    }

    /// Replace `target` with `replacement` in the chain of previous sinks.
    fn unlink(&self, target: &ConsoleSink, replacement: Option<ConsoleSink>) {
        let mut cursor = self.clone();
        loop {
            let next = cursor.state.previous.borrow().clone();
            match next {
                Some(next) if next.same_sink(target) => {
                    *cursor.state.previous.borrow_mut() = replacement;
                    return;
                }
                Some(next) => cursor = next,
                None => return,
            }
        }
    }

    pub fn is_installed(&self) -> bool {
        !self.state.restored.get()
    }

    pub fn same_sink(&self, other: &ConsoleSink) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    pub fn set_observer(&self, observer: impl FnMut(&[ConsoleEntry]) + 'static) {
        *self.state.observer.borrow_mut() = Some(Box::new(observer));
    }

    pub fn record(&self, severity: Severity, message: impl Into<String>) {
        {
            let mut entries = self.state.entries.borrow_mut();
            entries.push_back(ConsoleEntry {
                timestamp: Local::now(),
                severity,
                message: message.into(),
            });
            while entries.len() > self.state.capacity {
                entries.pop_front();
            }
        }
        self.notify();
    }

    pub fn clear(&self) {
        self.state.entries.borrow_mut().clear();
        self.notify();
    }

    pub fn snapshot(&self) -> Vec<ConsoleEntry> {
        self.state.entries.borrow().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.state.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.state.capacity
    }

    fn notify(&self) {
        // The observer is taken out while it runs so it may call back into the sink.
        let Some(mut observer) = self.state.observer.borrow_mut().take() else {
            return;
        };
        let snapshot = self.snapshot();
        observer(&snapshot);
        let mut slot = self.state.observer.borrow_mut();
        if slot.is_none() {
            *slot = Some(observer);
        }
    }
}

/// Run `f` against the sink installed on this thread, if any.
pub fn with_active_sink<R>(f: impl FnOnce(&ConsoleSink) -> R) -> Option<R> {
    let sink = ACTIVE_SINK.with(|slot| slot.borrow().clone());
    sink.as_ref().map(f)
}

pub fn has_active_sink() -> bool {
    ACTIVE_SINK.with(|slot| slot.borrow().is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_buffer_evicts_oldest() {
        let sink = ConsoleSink::detached(DEFAULT_CAPACITY);
        for i in 1..=51 {
            sink.record(Severity::Info, format!("entry {i}"));
        }

        let entries = sink.snapshot();
        assert_eq!(entries.len(), 50);
        assert_eq!(entries[0].message, "entry 2");
        assert_eq!(entries[49].message, "entry 51");
        assert!(entries.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn test_observer_sees_every_mutation() {
        let sink = ConsoleSink::detached(3);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        sink.set_observer(move |entries| seen_clone.borrow_mut().push(entries.len()));

        sink.record(Severity::Info, "a");
        sink.record(Severity::Warn, "b");
        sink.clear();

        assert_eq!(*seen.borrow(), vec![1, 2, 0]);
    }

    #[test]
    fn test_observer_may_reenter_sink() {
        let sink = ConsoleSink::detached(10);
        let inner = sink.clone();
        sink.set_observer(move |_| {
            let _ = inner.len();
        });
        sink.record(Severity::Error, "boom");
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_install_and_teardown_are_paired() {
        assert!(!has_active_sink());

        let outer = ConsoleSink::install(10);
        let inner = ConsoleSink::install(10);
        assert!(with_active_sink(|s| s.same_sink(&inner)).unwrap());

        inner.teardown();
        assert!(with_active_sink(|s| s.same_sink(&outer)).unwrap());

        // Second teardown must not clobber the restored sink.
        inner.teardown();
        assert!(with_active_sink(|s| s.same_sink(&outer)).unwrap());

        outer.teardown();
        assert!(!has_active_sink());
        assert!(!outer.is_installed());
    }

    #[test]
    fn test_out_of_order_teardown_never_reinstalls() {
        let outer = ConsoleSink::install(10);
        let inner = ConsoleSink::install(10);

        outer.teardown();
        assert!(with_active_sink(|s| s.same_sink(&inner)).unwrap());

        inner.teardown();
        assert!(!has_active_sink());

        crate::script_log::emit_log(Severity::Info, "after teardown");
        assert!(outer.is_empty());
        assert!(inner.is_empty());
    }

    #[test]
    fn test_middle_sink_torn_down_first() {
        let bottom = ConsoleSink::install(10);
        let middle = ConsoleSink::install(10);
        let top = ConsoleSink::install(10);

        middle.teardown();
        top.teardown();
        assert!(with_active_sink(|s| s.same_sink(&bottom)).unwrap());

        bottom.teardown();
        assert!(!has_active_sink());
    }
}
