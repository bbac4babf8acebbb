// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Synchronous publish/subscribe channels
//!
//! A [`Signal`] keeps an ordered list of handlers and invokes every one of
//! them, in subscription order, before [`Signal::dispatch`] returns. There is
//! no queuing: the handlers observe the state exactly as it is at the moment
//! of dispatch.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Handle identifying one subscription on a [`Signal`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(u64);

impl SlotId {
    /// Get the raw slot number
    pub fn raw(&self) -> u64 {
        self.0
    }
}

struct HandlerEntry<T> {
    slot: SlotId,
    live: Cell<bool>,
    handler: Box<dyn Fn(&T)>,
}

type Handler<T> = Rc<HandlerEntry<T>>;

/// Multi-subscriber broadcast channel
///
/// Dispatch works on a snapshot of the handler list taken when dispatch
/// starts. Handlers connected while a dispatch is running are not invoked
/// for that dispatch; handlers disconnected while it is running are skipped
/// if they have not been reached yet.
///
/// # Examples
///
/// ```
/// use reactive_ecs::ecs::Signal;
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let signal = Signal::<u32>::new();
/// let total = Rc::new(Cell::new(0));
///
/// let sink = total.clone();
/// let slot = signal.connect(move |value| sink.set(sink.get() + *value));
///
/// signal.dispatch(&5);
/// assert!(signal.disconnect(slot));
/// signal.dispatch(&5);
/// assert_eq!(total.get(), 5);
/// ```
pub struct Signal<T> {
    next_slot: Cell<u64>,
    handlers: RefCell<Vec<Handler<T>>>,
}

impl<T> Signal<T> {
    /// Create a signal with no subscribers
    pub fn new() -> Self {
        Signal {
            next_slot: Cell::new(1),
            handlers: RefCell::new(Vec::new()),
        }
    }

    /// Subscribe a handler, returning the slot used to disconnect it later
    pub fn connect<F>(&self, handler: F) -> SlotId
    where
        F: Fn(&T) + 'static,
    {
        let slot = SlotId(self.next_slot.get());
        self.next_slot.set(slot.0 + 1);
        self.handlers.borrow_mut().push(Rc::new(HandlerEntry {
            slot,
            live: Cell::new(true),
            handler: Box::new(handler),
        }));
        slot
    }

    /// Unsubscribe a handler
    ///
    /// Returns false if the slot was not connected.
    pub fn disconnect(&self, slot: SlotId) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        match handlers.iter().position(|entry| entry.slot == slot) {
            Some(position) => {
                handlers.remove(position).live.set(false);
                true
            }
            None => false,
        }
    }

    /// Check whether a slot is currently connected
    pub fn is_connected(&self, slot: SlotId) -> bool {
        self.handlers.borrow().iter().any(|entry| entry.slot == slot)
    }

    /// Invoke every connected handler with the payload, in subscription order
    pub fn dispatch(&self, payload: &T) {
        let snapshot: Vec<Handler<T>> = match self.handlers.borrow().as_slice() {
            [] => return,
            handlers => handlers.to_vec(),
        };

        for entry in snapshot {
            if entry.live.get() {
                (entry.handler)(payload);
            }
        }
    }

    /// Number of connected handlers
    pub fn len(&self) -> usize {
        self.handlers.borrow().len()
    }

    /// Check whether the signal has no subscribers
    pub fn is_empty(&self) -> bool {
        self.handlers.borrow().is_empty()
    }

    /// Disconnect every handler
    pub fn clear(&self) {
        for entry in self.handlers.borrow_mut().drain(..) {
            entry.live.set(false);
        }
    }
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("handlers", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_order() {
        let signal = Signal::<()>::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        for i in 0..3 {
            let log = log.clone();
            signal.connect(move |_| log.borrow_mut().push(i));
        }

        signal.dispatch(&());
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn test_disconnect_unknown_slot() {
        let signal = Signal::<()>::new();
        let slot = signal.connect(|_| {});
        assert!(signal.disconnect(slot));
        assert!(!signal.disconnect(slot));
        assert!(signal.is_empty());
    }

    #[test]
    fn test_handler_connected_during_dispatch_is_deferred() {
        let signal = Rc::new(Signal::<()>::new());
        let calls = Rc::new(Cell::new(0));

        let inner_signal = Rc::downgrade(&signal);
        let inner_calls = calls.clone();
        signal.connect(move |_| {
            if let Some(signal) = inner_signal.upgrade() {
                let calls = inner_calls.clone();
                signal.connect(move |_| calls.set(calls.get() + 1));
            }
        });

        signal.dispatch(&());
        assert_eq!(calls.get(), 0);
        assert_eq!(signal.len(), 2);

        signal.dispatch(&());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_handler_disconnected_during_dispatch_is_skipped() {
        let signal = Rc::new(Signal::<()>::new());
        let calls = Rc::new(Cell::new(0));
        let victim = Rc::new(Cell::new(None));

        let weak = Rc::downgrade(&signal);
        let target = victim.clone();
        signal.connect(move |_| {
            if let (Some(signal), Some(slot)) = (weak.upgrade(), target.get()) {
                signal.disconnect(slot);
            }
        });

        let counter = calls.clone();
        victim.set(Some(signal.connect(move |_| counter.set(counter.get() + 1))));

        signal.dispatch(&());
        assert_eq!(calls.get(), 0);
        assert_eq!(signal.len(), 1);
    }

    #[test]
    fn test_clear_during_dispatch_skips_remaining() {
        let signal = Rc::new(Signal::<()>::new());
        let calls = Rc::new(Cell::new(0));

        let weak = Rc::downgrade(&signal);
        signal.connect(move |_| {
            if let Some(signal) = weak.upgrade() {
                signal.clear();
            }
        });
        for _ in 0..3 {
            let counter = calls.clone();
            signal.connect(move |_| counter.set(counter.get() + 1));
        }

        signal.dispatch(&());
        assert_eq!(calls.get(), 0);
        assert!(signal.is_empty());
    }

    #[test]
    fn test_disconnect_keeps_order_of_remaining() {
        let signal = Signal::<()>::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let slots: Vec<_> = (0..200)
            .map(|i| {
                let log = log.clone();
                signal.connect(move |_| log.borrow_mut().push(i))
            })
            .collect();
        for slot in slots.iter().step_by(2) {
            assert!(signal.disconnect(*slot));
        }

        signal.dispatch(&());
        let expected: Vec<_> = (0..200).filter(|i| i % 2 == 1).collect();
        assert_eq!(*log.borrow(), expected);
        assert!(!signal.is_connected(slots[0]));
        assert!(signal.is_connected(slots[1]));
    }
}
