//! Simulated device command queue.
//!
//! Work is recorded on the host into a [`CommandBuffer`] and executed in
//! submission order on a dedicated queue thread. Completion handlers run on
//! that thread after the buffer's last pass, which is where in-flight slots
//! are released.

use crate::{RenderError, Result};
use parking_lot::{Condvar, Mutex};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

/// Counting semaphore bounding the frames whose work is outstanding.
///
/// Closing the semaphore wakes every waiter and makes further acquires
/// fail; it is closed when the queue thread dies.
pub struct InFlightSemaphore {
    state: Mutex<SemaphoreState>,
    changed: Condvar,
    capacity: usize,
}

struct SemaphoreState {
    permits: usize,
    closed: bool,
}

impl InFlightSemaphore {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(SemaphoreState {
                permits: capacity,
                closed: false,
            }),
            changed: Condvar::new(),
            capacity,
        }
    }

    /// Block until a permit is free. Returns `false` if the semaphore was
    /// closed instead.
    pub fn acquire(&self) -> bool {
        let mut state = self.state.lock();
        while state.permits == 0 && !state.closed {
            self.changed.wait(&mut state);
        }
        if state.closed {
            return false;
        }
        state.permits -= 1;
        true
    }

    pub fn try_acquire(&self) -> bool {
        let mut state = self.state.lock();
        if state.closed || state.permits == 0 {
            return false;
        }
        state.permits -= 1;
        true
    }

    pub fn release(&self) {
        let mut state = self.state.lock();
        state.permits = (state.permits + 1).min(self.capacity);
        self.changed.notify_all();
    }

    pub fn close(&self) {
        self.state.lock().closed = true;
        self.changed.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Free permits.
    pub fn available(&self) -> usize {
        self.state.lock().permits
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Block until every permit is back. Returns `false` if the semaphore
    /// was closed while waiting.
    pub fn wait_idle(&self) -> bool {
        let mut state = self.state.lock();
        while state.permits < self.capacity && !state.closed {
            self.changed.wait(&mut state);
        }
        !state.closed
    }
}

type CompletedHandler = Box<dyn FnOnce() + Send>;

/// An ordered list of passes submitted to the queue as one unit.
pub struct CommandBuffer<P> {
    label: String,
    passes: Vec<P>,
    completed: Vec<CompletedHandler>,
}

impl<P> CommandBuffer<P> {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            passes: Vec::new(),
            completed: Vec::new(),
        }
    }

    pub fn encode(&mut self, pass: P) {
        self.passes.push(pass);
    }

    /// Run `handler` on the queue thread once every pass has executed.
    pub fn add_completed_handler<F>(&mut self, handler: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.completed.push(Box::new(handler));
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn passes(&self) -> &[P] {
        &self.passes
    }
}

/// Calls the loss callback if the queue thread unwinds.
struct LostGuard<L: Fn()>(L);

impl<L: Fn()> Drop for LostGuard<L> {
    fn drop(&mut self) {
        if thread::panicking() {
            (self.0)();
        }
    }
}

/// Serial queue executing command buffers on its own thread.
pub struct CommandQueue<P: Send + 'static> {
    sender: Option<mpsc::Sender<CommandBuffer<P>>>,
    worker: Option<JoinHandle<()>>,
}

impl<P: Send + 'static> CommandQueue<P> {
    /// Start the queue thread. `executor` runs every pass; `on_lost` runs if
    /// a pass panics and the thread goes away.
    pub fn new<E, L>(label: &str, mut executor: E, on_lost: L) -> std::io::Result<Self>
    where
        E: FnMut(P) + Send + 'static,
        L: Fn() + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel::<CommandBuffer<P>>();

        let worker = thread::Builder::new().name(label.to_string()).spawn(move || {
            let _guard = LostGuard(on_lost);

            for buffer in receiver {
                log::trace!("Executing {} ({} passes)", buffer.label, buffer.passes.len());
                for pass in buffer.passes {
                    executor(pass);
                }
                for handler in buffer.completed {
                    handler();
                }
            }
        })?;

        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
        })
    }

    /// Submit a buffer for execution after everything committed before it.
    pub fn commit(&self, buffer: CommandBuffer<P>) -> Result<()> {
        self.sender
            .as_ref()
            .ok_or(RenderError::DeviceLost)?
            .send(buffer)
            .map_err(|_| RenderError::DeviceLost)
    }
}

impl<P: Send + 'static> Drop for CommandQueue<P> {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain and exit
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("Command queue thread panicked");
            }
        }
    }
}
