//! Cross-context handoff between network tasks and the UI context.
//!
//! Dialog state belongs to the UI context: a single logical thread on which
//! every read or write of dialog text, validity, or button state happens.
//! Network tasks never touch that state directly.  Instead they hand the UI
//! context a closure and wait for its result:
//!
//! ```text
//! connection task                     UI context
//! ───────────────                     ──────────
//! call(f) ── enqueue(job, reply_tx) ──►  dequeue job
//!   .await reply_rx                      run f()
//!       ◄──────────── reply_tx.send(r) ──┘
//! ```
//!
//! The UI side only ever *sends* on the reply channel, which never blocks,
//! so the UI context can never end up waiting on the network side.  The one
//! rule for callers: never `call` from inside a UI job (that would wait on
//! the very queue it is running from).
//!
//! A host with its own event loop drains a [`UiQueue`] from that loop with
//! [`UiQueue::run_pending`].  Headless hosts and tests use [`UiContext`],
//! which owns a dedicated thread running [`UiQueue::run_blocking`].

use std::any::Any;
use std::fmt;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle, ThreadId};

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

type UiJob = Box<dyn FnOnce() + Send + 'static>;

enum UiMessage {
    Job(UiJob),
    Stop,
}

/// Errors returned when work cannot be completed on the UI context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The UI queue has been dropped or stopped.
    #[error("UI context is no longer running")]
    UiContextClosed,

    /// The dispatched work panicked; the message is the panic payload.
    #[error("UI task panicked: {0}")]
    Panicked(String),
}

/// Creates a connected dispatcher/queue pair.
pub fn ui_channel() -> (UiDispatcher, UiQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (UiDispatcher { tx }, UiQueue { rx })
}

// ── Dispatcher (any thread) ───────────────────────────────────────────────────

/// Sends work to the UI context.  Cheap to clone; usable from any thread.
#[derive(Clone)]
pub struct UiDispatcher {
    tx: mpsc::UnboundedSender<UiMessage>,
}

impl UiDispatcher {
    /// Enqueues `job` without waiting for it.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UiContextClosed`] if the queue is gone.
    pub fn post<F>(&self, job: F) -> Result<(), DispatchError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.tx
            .send(UiMessage::Job(Box::new(job)))
            .map_err(|_| DispatchError::UiContextClosed)
    }

    /// Runs `f` on the UI context and waits for its return value.
    ///
    /// A panic inside `f` is caught on the UI side and returned as
    /// [`DispatchError::Panicked`]; the UI context keeps running.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::UiContextClosed`] if the queue is gone or is
    ///   dropped before running `f`.
    /// - [`DispatchError::Panicked`] if `f` panicked.
    pub async fn call<F, R>(&self, f: F) -> Result<R, DispatchError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.post(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(f))
                .map_err(|payload| DispatchError::Panicked(panic_message(payload.as_ref())));
            // The caller may have given up waiting; nothing to do then.
            let _ = reply_tx.send(result);
        })?;
        reply_rx
            .await
            .map_err(|_| DispatchError::UiContextClosed)?
    }

    /// Resolves once the UI queue has been dropped.
    pub async fn closed(&self) {
        self.tx.closed().await;
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl fmt::Debug for UiDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiDispatcher")
            .field("closed", &self.is_closed())
            .finish()
    }
}

// ── Queue (UI thread only) ────────────────────────────────────────────────────

/// The receiving end, drained on the UI context.
pub struct UiQueue {
    rx: mpsc::UnboundedReceiver<UiMessage>,
}

impl UiQueue {
    /// Runs every job queued so far without waiting for more.
    ///
    /// Returns the number of jobs run.  Intended to be called from a host's
    /// own event loop.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(message) = self.rx.try_recv() {
            match message {
                UiMessage::Job(job) => {
                    run_job(job);
                    ran += 1;
                }
                UiMessage::Stop => {
                    self.rx.close();
                    break;
                }
            }
        }
        ran
    }

    /// Runs jobs until stopped or every dispatcher is dropped.
    ///
    /// Blocks the current thread; must not be called from an async task.
    pub fn run_blocking(mut self) {
        while let Some(message) = self.rx.blocking_recv() {
            match message {
                UiMessage::Job(job) => run_job(job),
                UiMessage::Stop => break,
            }
        }
        debug!("UI queue drained");
    }
}

fn run_job(job: UiJob) {
    // `call` wraps its own closure; this catches panics from `post`ed jobs.
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
        error!("UI job panicked: {}", panic_message(payload.as_ref()));
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ── Dedicated UI thread ───────────────────────────────────────────────────────

/// A UI context running on its own OS thread.
pub struct UiContext {
    dispatcher: UiDispatcher,
    thread: Option<JoinHandle<()>>,
    thread_id: ThreadId,
}

impl UiContext {
    /// Starts the UI thread.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the thread cannot be spawned.
    pub fn spawn() -> io::Result<Self> {
        let (dispatcher, queue) = ui_channel();
        let thread = thread::Builder::new()
            .name("remote-input-ui".to_string())
            .spawn(move || queue.run_blocking())?;
        let thread_id = thread.thread().id();
        info!("UI context started");
        Ok(Self {
            dispatcher,
            thread: Some(thread),
            thread_id,
        })
    }

    pub fn dispatcher(&self) -> UiDispatcher {
        self.dispatcher.clone()
    }

    /// `true` when called from the UI thread itself.
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    /// Stops the thread after the jobs already queued, and joins it.
    pub fn shutdown(mut self) {
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        let _ = self.dispatcher.tx.send(UiMessage::Stop);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("UI thread terminated abnormally");
            }
        }
    }
}

impl Drop for UiContext {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_call_runs_on_ui_thread_and_returns_value() {
        // Arrange
        let ui = UiContext::spawn().unwrap();
        let dispatcher = ui.dispatcher();

        // Act
        let (value, thread_name) = dispatcher
            .call(|| (21 * 2, thread::current().name().map(str::to_string)))
            .await
            .unwrap();

        // Assert
        assert_eq!(value, 42);
        assert_eq!(thread_name.as_deref(), Some("remote-input-ui"));
    }

    #[tokio::test]
    async fn test_call_reports_panic_and_ui_keeps_running() {
        let ui = UiContext::spawn().unwrap();
        let dispatcher = ui.dispatcher();

        let result: Result<(), _> = dispatcher.call(|| panic!("validator exploded")).await;
        assert_eq!(
            result,
            Err(DispatchError::Panicked("validator exploded".to_string()))
        );

        // The UI thread survived the panic.
        assert_eq!(dispatcher.call(|| 1).await, Ok(1));
    }

    #[tokio::test]
    async fn test_jobs_run_in_fifo_order() {
        let ui = UiContext::spawn().unwrap();
        let dispatcher = ui.dispatcher();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for i in 0..5 {
            let seen = Arc::clone(&seen);
            dispatcher.post(move || seen.lock().unwrap().push(i)).unwrap();
        }
        dispatcher.call(|| ()).await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_call_after_queue_dropped_fails() {
        let (dispatcher, queue) = ui_channel();
        drop(queue);

        assert!(dispatcher.is_closed());
        assert_eq!(
            dispatcher.call(|| ()).await,
            Err(DispatchError::UiContextClosed)
        );
    }

    #[test]
    fn test_post_after_shutdown_fails() {
        let ui = UiContext::spawn().unwrap();
        let dispatcher = ui.dispatcher();

        ui.shutdown();

        assert_eq!(dispatcher.post(|| ()), Err(DispatchError::UiContextClosed));
    }

    #[test]
    fn test_run_pending_drains_queue() {
        let (dispatcher, mut queue) = ui_channel();
        let count = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let count = Arc::clone(&count);
            dispatcher
                .post(move || {
                    count.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
        }

        assert_eq!(queue.run_pending(), 3);
        assert_eq!(queue.run_pending(), 0);
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_is_current_only_on_ui_thread() {
        let ui = UiContext::spawn().unwrap();

        let ui_thread = ui.dispatcher().call(|| thread::current().id()).await.unwrap();

        assert!(!ui.is_current());
        assert_eq!(ui_thread, ui.thread_id);
    }
}
