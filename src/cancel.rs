// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A cancellation signal that can be waited on alongside a queue.
//!
//! The token owns the only sender of a channel that never carries a
//! message.  Cancelling drops that sender, which disconnects every
//! clone of the receiver at once, so a thread parked in `select!` on
//! a queue and on `signal()` wakes as soon as either side is ready.

use std::sync::{Arc, Mutex};

use crossbeam::channel::{self, Receiver, Sender, TryRecvError};

/// A cloneable, one-way switch.
#[derive(Clone, Debug)]
pub struct CancelToken {
    trigger: Arc<Mutex<Option<Sender<()>>>>,
    signal: Receiver<()>,
}

impl Default for CancelToken {
    fn default() -> Self {
        CancelToken::new()
    }
}

impl CancelToken {
    /// A token that has not been cancelled.
    pub fn new() -> Self {
        let (tx, rx) = channel::bounded(0);
        CancelToken {
            trigger: Arc::new(Mutex::new(Some(tx))),
            signal: rx,
        }
    }

    /// Flip the switch.  Calling this more than once is harmless.
    pub fn cancel(&self) {
        let sender = match self.trigger.lock() {
            Ok(mut trigger) => trigger.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        drop(sender);
    }

    /// Whether `cancel` has been called on this token or any clone.
    pub fn is_cancelled(&self) -> bool {
        match self.signal.try_recv() {
            Err(TryRecvError::Disconnected) => true,
            _ => false,
        }
    }

    /// A receiver that becomes ready (disconnected) on cancellation.
    /// Use it as one arm of a `select!`.
    pub fn signal(&self) -> &Receiver<()> {
        &self.signal
    }
}
