//! Bounded in-memory queue between the input reader and the dispatcher
//!
//! [`InputBuffer`] is the plain ring with an item capacity and a byte budget.
//! [`InputQueue`] shares it between two tasks and parks the producer while
//! the budget is exhausted.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use contracts::Message;
use ringbuf::{traits::*, HeapRb};
use tokio::sync::Notify;

/// Ring of messages bounded by count and total payload bytes
pub struct InputBuffer {
    ring: HeapRb<Message>,
    max_bytes: usize,
    bytes: usize,
}

impl fmt::Debug for InputBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputBuffer")
            .field("len", &self.ring.occupied_len())
            .field("capacity", &self.ring.capacity())
            .field("bytes", &self.bytes)
            .field("max_bytes", &self.max_bytes)
            .finish()
    }
}

impl InputBuffer {
    pub fn new(capacity: usize, max_bytes: usize) -> Self {
        Self {
            ring: HeapRb::new(capacity.max(1)),
            max_bytes,
            bytes: 0,
        }
    }

    /// Queue `message`, or hand it back when the buffer is full
    ///
    /// An empty buffer accepts one message of any size so oversized
    /// records still make progress.
    pub fn try_push(&mut self, message: Message) -> Result<(), Message> {
        if self.ring.is_full() {
            return Err(message);
        }
        if !self.ring.is_empty() && self.bytes + message.len() > self.max_bytes {
            return Err(message);
        }

        let len = message.len();
        self.ring.try_push(message)?;
        self.bytes += len;
        Ok(())
    }

    /// Oldest message
    pub fn pop(&mut self) -> Option<Message> {
        let message = self.ring.try_pop()?;
        self.bytes -= message.len();
        Some(message)
    }

    /// Remove everything, oldest first
    pub fn drain(&mut self) -> Vec<Message> {
        self.bytes = 0;
        self.ring.pop_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.ring.occupied_len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Payload bytes currently held
    pub fn bytes(&self) -> usize {
        self.bytes
    }
}

struct Shared {
    buffer: Mutex<InputBuffer>,
    readable: Notify,
    writable: Notify,
    closed: AtomicBool,
}

/// Single-producer, single-consumer handle over a shared [`InputBuffer`]
#[derive(Clone)]
pub struct InputQueue {
    shared: Arc<Shared>,
}

impl fmt::Debug for InputQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputQueue")
            .field("buffer", &*self.lock())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl InputQueue {
    pub fn new(buffer: InputBuffer) -> Self {
        Self {
            shared: Arc::new(Shared {
                buffer: Mutex::new(buffer),
                readable: Notify::new(),
                writable: Notify::new(),
                closed: AtomicBool::new(false),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, InputBuffer> {
        self.shared.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue `message`, waiting while the buffer is full
    ///
    /// Hands the message back if the queue is closed.
    pub async fn push(&self, message: Message) -> Result<(), Message> {
        let mut message = message;
        loop {
            if self.is_closed() {
                return Err(message);
            }
            let pushed = self.lock().try_push(message);
            match pushed {
                Ok(()) => {
                    self.shared.readable.notify_one();
                    return Ok(());
                }
                Err(rejected) => message = rejected,
            }
            self.shared.writable.notified().await;
        }
    }

    /// Queue `message` ignoring the byte budget
    ///
    /// Only for the shutdown path, where a record already read must not be
    /// lost. Falls back to handing it back when the ring itself is full.
    pub fn push_now(&self, message: Message) -> Result<(), Message> {
        let mut buffer = self.lock();
        if buffer.ring.is_full() {
            return Err(message);
        }
        let len = message.len();
        buffer.ring.try_push(message)?;
        buffer.bytes += len;
        drop(buffer);
        self.shared.readable.notify_one();
        Ok(())
    }

    /// Next message, waiting for one; `None` once closed and empty
    pub async fn pop(&self) -> Option<Message> {
        loop {
            let popped = self.lock().pop();
            if let Some(message) = popped {
                self.shared.writable.notify_one();
                return Some(message);
            }
            if self.is_closed() {
                return None;
            }
            self.shared.readable.notified().await;
        }
    }

    /// No more input will be pushed
    pub fn close(&self) {
        self.shared.closed.store(true, Ordering::SeqCst);
        self.shared.readable.notify_one();
        self.shared.writable.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }

    /// Take everything still queued
    pub fn drain(&self) -> Vec<Message> {
        let drained = self.lock().drain();
        self.shared.writable.notify_one();
        drained
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn bytes(&self) -> usize {
        self.lock().bytes()
    }
}
