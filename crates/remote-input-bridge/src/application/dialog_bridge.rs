//! DialogBridge: the UI-side consumer of remote input.
//!
//! [`DialogBridge::request_text_input`] opens a text-input dialog and suspends
//! the caller until the dialog resolves.  While it is open, a
//! [`MessageHandler`] bound to the dialog is registered with the
//! [`SessionHandlerRegistry`], so frames arriving at the bridge server edit
//! the dialog's text or press its confirm button.
//!
//! # Session lifecycle
//!
//! ```text
//! request_text_input(request)
//!   ├─ create PendingResult (oneshot)
//!   ├─ build handler, register it            ─► Registration held by the session
//!   ├─ post presenter.show(handle) to UI
//!   └─ await PendingResult
//!
//! first of { valid submit, confirm, cancel, reset, dismiss, caller dropped }
//!   └─ DialogSession::resolve
//!        ├─ DialogState::close()             ─► only the first trigger passes
//!        ├─ release Registration             ─► exactly once
//!        └─ fulfil PendingResult             ─► exactly once
//! ```
//!
//! All of the session's state changes run on the UI context: remote
//! operations arrive through the server's [`UiDispatcher::call`], local
//! actions come from the presenter, and caller cancellation posts a dismiss.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use remote_input_core::{
    DialogAction, DialogOutcome, DialogSnapshot, DialogState, HandlerResult, Operation,
    ServerEndpoint, TextInputRequest,
};
use tokio::sync::{oneshot, watch};
use tracing::{debug, info, warn};

use super::presenter::{DialogPresenter, QrEncoder, RemoteAccess};
use super::registry::{HandlerFault, MessageHandler, Registration, SessionHandlerRegistry};
use super::ui_context::UiDispatcher;

/// Reply sent to a frame that raced the dialog closing.
pub const DIALOG_CLOSED_MESSAGE: &str = "input dialog is closed";

// ── Session ───────────────────────────────────────────────────────────────────

struct DialogSession {
    state: Mutex<DialogState>,
    pending: Mutex<Option<oneshot::Sender<DialogOutcome>>>,
    registration: Mutex<Option<Registration>>,
    snapshots: watch::Sender<DialogSnapshot>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl DialogSession {
    fn open(request: TextInputRequest, pending: oneshot::Sender<DialogOutcome>) -> Arc<Self> {
        let state = DialogState::unvalidated(request);
        let (snapshots, _) = watch::channel(state.snapshot());
        Arc::new(Self {
            state: Mutex::new(state),
            pending: Mutex::new(Some(pending)),
            registration: Mutex::new(None),
            snapshots,
        })
    }

    fn attach_registration(&self, registration: Registration) {
        if self.is_closed() {
            registration.release();
            return;
        }
        *lock(&self.registration) = Some(registration);
    }

    fn is_closed(&self) -> bool {
        lock(&self.state).is_closed()
    }

    fn snapshot(&self) -> DialogSnapshot {
        lock(&self.state).snapshot()
    }

    /// Runs the first validation of the initial text. Called on the UI
    /// context right before the dialog is shown.
    fn validate_opening(&self) {
        let mut state = lock(&self.state);
        if state.is_closed() {
            return;
        }
        state.revalidate();
        self.snapshots.send_replace(state.snapshot());
    }

    fn set_text(&self, text: String) -> bool {
        let mut state = lock(&self.state);
        let enabled = state.set_text(text);
        self.snapshots.send_replace(state.snapshot());
        enabled
    }

    fn perform(&self, action: DialogAction) -> bool {
        self.resolve(|state| state.outcome_for(action))
    }

    fn submit(&self) -> bool {
        self.resolve(DialogState::submit)
    }

    /// Closes the dialog with the outcome `decide` picks, if it picks one.
    ///
    /// Deciding and closing happen under one lock, so of two racing triggers
    /// exactly one wins; the loser sees a closed state and does nothing.
    fn resolve(&self, decide: impl FnOnce(&DialogState) -> Option<DialogOutcome>) -> bool {
        let outcome = {
            let mut state = lock(&self.state);
            let Some(outcome) = decide(&state) else {
                return false;
            };
            state.close();
            self.snapshots.send_replace(state.snapshot());
            outcome
        };

        if let Some(registration) = lock(&self.registration).take() {
            registration.release();
        }
        match lock(&self.pending).take() {
            Some(pending) => {
                // The caller may have been cancelled; the outcome is then dropped.
                let _ = pending.send(outcome);
            }
            None => warn!("dialog resolved twice; second outcome ignored"),
        }
        true
    }
}

// ── Handler ───────────────────────────────────────────────────────────────────

/// Maps remote operations onto the dialog exactly like local input.
struct SessionHandler {
    session: Arc<DialogSession>,
}

impl MessageHandler for SessionHandler {
    fn on_message(&self, operation: Operation) -> Result<HandlerResult, HandlerFault> {
        if self.session.is_closed() {
            return Ok(HandlerResult::error(DIALOG_CLOSED_MESSAGE));
        }
        match operation {
            Operation::Input { text } => {
                let enabled = self.session.set_text(text);
                debug!("remote input applied, submit enabled: {enabled}");
            }
            Operation::Submit => {
                if !self.session.submit() {
                    debug!("remote submit ignored: current text is not valid");
                }
            }
        }
        Ok(HandlerResult::Success)
    }
}

// ── Handle given to the presenter ─────────────────────────────────────────────

/// The presenter's view of an open dialog.
///
/// Methods must be called on the UI context, like any other UI event.  Every
/// action method returns `true` if it closed the dialog.
#[derive(Clone)]
pub struct DialogHandle {
    session: Arc<DialogSession>,
}

impl DialogHandle {
    /// A local edit; returns the new submit-enabled flag.
    pub fn set_text(&self, text: impl Into<String>) -> bool {
        self.session.set_text(text.into())
    }

    pub fn confirm(&self) -> bool {
        self.perform(DialogAction::Confirm)
    }

    pub fn cancel(&self) -> bool {
        self.perform(DialogAction::Cancel)
    }

    /// No-op on dialogs opened without a reset option.
    pub fn reset(&self) -> bool {
        self.perform(DialogAction::Reset)
    }

    pub fn dismiss(&self) -> bool {
        self.perform(DialogAction::Dismiss)
    }

    pub fn perform(&self, action: DialogAction) -> bool {
        self.session.perform(action)
    }

    pub fn snapshot(&self) -> DialogSnapshot {
        self.session.snapshot()
    }

    pub fn is_closed(&self) -> bool {
        self.session.is_closed()
    }

    /// Receives a new snapshot after every edit and when the dialog closes.
    pub fn subscribe(&self) -> watch::Receiver<DialogSnapshot> {
        self.session.snapshots.subscribe()
    }
}

impl std::fmt::Debug for DialogHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogHandle")
            .field("closed", &self.is_closed())
            .finish()
    }
}

// ── Cancellation guard ────────────────────────────────────────────────────────

/// Dismisses the dialog if the `request_text_input` future is dropped early.
struct DismissOnDrop {
    session: Arc<DialogSession>,
    ui: UiDispatcher,
}

impl Drop for DismissOnDrop {
    fn drop(&mut self) {
        if self.session.is_closed() {
            return;
        }
        info!("text input request cancelled; dismissing dialog");
        let session = Arc::clone(&self.session);
        if self
            .ui
            .post(move || {
                session.perform(DialogAction::Dismiss);
            })
            .is_err()
        {
            self.session.perform(DialogAction::Dismiss);
        }
    }
}

// ── Bridge ────────────────────────────────────────────────────────────────────

/// Opens text-input dialogs that a second device can drive.
pub struct DialogBridge {
    registry: SessionHandlerRegistry,
    ui: UiDispatcher,
    presenter: Arc<dyn DialogPresenter>,
    endpoint: Option<ServerEndpoint>,
    qr: Option<(Arc<dyn QrEncoder>, u32)>,
}

impl DialogBridge {
    /// A bridge with no remote access; add it with [`with_endpoint`](Self::with_endpoint).
    pub fn new(
        registry: SessionHandlerRegistry,
        ui: UiDispatcher,
        presenter: Arc<dyn DialogPresenter>,
    ) -> Self {
        Self {
            registry,
            ui,
            presenter,
            endpoint: None,
            qr: None,
        }
    }

    /// Advertises `endpoint` in every dialog.
    pub fn with_endpoint(mut self, endpoint: ServerEndpoint) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Encodes the discovery URL with `encoder` at `size` cells per side.
    pub fn with_qr_encoder(mut self, encoder: Arc<dyn QrEncoder>, size: u32) -> Self {
        self.qr = Some((encoder, size));
        self
    }

    /// The URL and QR code shown in dialogs, or `None` if the server is
    /// unavailable.
    pub fn remote_access(&self) -> Option<RemoteAccess> {
        let url = self.endpoint?.url();
        let qr = self
            .qr
            .as_ref()
            .and_then(|(encoder, size)| match encoder.encode(&url, *size) {
                Ok(matrix) => Some(matrix),
                Err(e) => {
                    warn!("could not encode discovery URL: {e}");
                    None
                }
            });
        Some(RemoteAccess { url, qr })
    }

    /// Opens a dialog and waits for it to resolve.
    ///
    /// Resolves to the confirmed text, to `request.initial` on cancel or
    /// dismiss, or to [`DialogOutcome::Reset`].  Dropping the returned future
    /// dismisses the dialog through the same cleanup path.  If the UI context
    /// goes away while the dialog is open, resolves to whatever outcome was
    /// already committed, else to `request.initial`.
    ///
    /// The validator first runs on the UI context, together with
    /// [`DialogPresenter::show`]; if either panics the dialog is dismissed.
    pub async fn request_text_input(&self, request: TextInputRequest) -> DialogOutcome {
        let initial = request.initial.clone();
        let (pending_tx, mut pending_rx) = oneshot::channel();
        let session = DialogSession::open(request, pending_tx);

        let handler = Arc::new(SessionHandler {
            session: Arc::clone(&session),
        });
        let registration = self.registry.register(&handler);
        debug!("dialog session bound to handler {}", registration.ticket());
        session.attach_registration(registration);

        let _guard = DismissOnDrop {
            session: Arc::clone(&session),
            ui: self.ui.clone(),
        };

        let presenter = Arc::clone(&self.presenter);
        let opening = Arc::clone(&session);
        let handle = DialogHandle {
            session: Arc::clone(&session),
        };
        let remote = self.remote_access();
        let shown = self
            .ui
            .call(move || {
                opening.validate_opening();
                presenter.show(handle, remote);
            })
            .await;
        if let Err(e) = shown {
            warn!("dialog could not be shown ({e}); dismissing");
            session.perform(DialogAction::Dismiss);
        }

        let received = tokio::select! {
            biased;
            received = &mut pending_rx => received.ok(),
            _ = self.ui.closed() => None,
        };
        // An outcome committed just before the UI context went away still wins.
        let outcome = received
            .or_else(|| pending_rx.try_recv().ok())
            .unwrap_or_else(|| {
                warn!("UI context closed while dialog was open");
                session.perform(DialogAction::Dismiss);
                DialogOutcome::Text(initial)
            });

        drop(handler);
        outcome
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ui_context::ui_channel;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_test::{assert_pending, assert_ready_eq, task};

    #[derive(Default)]
    struct CapturingPresenter {
        shown: Mutex<Vec<(DialogHandle, Option<RemoteAccess>)>>,
    }

    impl CapturingPresenter {
        fn handle(&self) -> DialogHandle {
            lock(&self.shown).last().map(|(h, _)| h.clone()).unwrap()
        }
    }

    impl DialogPresenter for CapturingPresenter {
        fn show(&self, dialog: DialogHandle, remote: Option<RemoteAccess>) {
            lock(&self.shown).push((dialog, remote));
        }
    }

    fn open_session(request: TextInputRequest) -> (Arc<DialogSession>, oneshot::Receiver<DialogOutcome>) {
        let (tx, rx) = oneshot::channel();
        let session = DialogSession::open(request, tx);
        session.validate_opening();
        (session, rx)
    }

    #[test]
    fn test_handler_input_updates_text_and_returns_success() {
        // Arrange
        let (session, _rx) = open_session(TextInputRequest::new("T", "foo"));
        let handler = SessionHandler {
            session: Arc::clone(&session),
        };

        // Act
        let result = handler.on_message(Operation::Input {
            text: "bar".to_string(),
        });

        // Assert
        assert_eq!(result, Ok(HandlerResult::Success));
        assert_eq!(session.snapshot().text, "bar");
    }

    #[test]
    fn test_handler_invalid_submit_is_success_without_resolving() {
        let (session, mut rx) = open_session(
            TextInputRequest::new("T", "foo").with_validator(|t| !t.contains(' ')),
        );
        let handler = SessionHandler {
            session: Arc::clone(&session),
        };

        handler
            .on_message(Operation::Input {
                text: "a b".to_string(),
            })
            .unwrap();
        let result = handler.on_message(Operation::Submit);

        assert_eq!(result, Ok(HandlerResult::Success));
        assert!(!session.is_closed());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_handler_after_close_reports_error() {
        let (session, _rx) = open_session(TextInputRequest::new("T", "foo"));
        let handler = SessionHandler {
            session: Arc::clone(&session),
        };
        session.perform(DialogAction::Cancel);

        let result = handler.on_message(Operation::Submit);

        assert_eq!(result, Ok(HandlerResult::error(DIALOG_CLOSED_MESSAGE)));
    }

    #[test]
    fn test_racing_triggers_fulfil_once() {
        // Arrange
        let (session, mut rx) = open_session(TextInputRequest::new("T", "foo"));
        session.set_text("bar".to_string());

        // Act: a remote submit and a local dismiss both fire
        let submitted = session.submit();
        let dismissed = session.perform(DialogAction::Dismiss);

        // Assert: the first trigger wins, the second is a no-op
        assert!(submitted);
        assert!(!dismissed);
        assert_eq!(rx.try_recv(), Ok(DialogOutcome::Text("bar".to_string())));
    }

    #[test]
    fn test_close_releases_registration_once() {
        let registry = SessionHandlerRegistry::new();
        let (session, _rx) = open_session(TextInputRequest::new("T", "foo"));
        let handler = Arc::new(SessionHandler {
            session: Arc::clone(&session),
        });
        session.attach_registration(registry.register(&handler));
        assert!(registry.current().is_some());

        session.perform(DialogAction::Dismiss);

        assert!(registry.current().is_none());
        assert!(lock(&session.registration).is_none());
    }

    #[test]
    fn test_request_stays_pending_until_resolved() {
        // Arrange: a manually pumped UI queue stands in for the UI thread
        let (ui, mut queue) = ui_channel();
        let registry = SessionHandlerRegistry::new();
        let presenter = Arc::new(CapturingPresenter::default());
        let bridge = DialogBridge::new(registry.clone(), ui, presenter.clone());

        let mut request = task::spawn(bridge.request_text_input(TextInputRequest::new("T", "foo")));

        // Act / Assert: registered and waiting before the UI even shows it
        assert_pending!(request.poll());
        assert!(registry.current().is_some());

        queue.run_pending();
        assert_pending!(request.poll());

        presenter.handle().confirm();
        assert!(request.is_woken());
        assert_ready_eq!(request.poll(), DialogOutcome::Text("foo".to_string()));
        assert!(registry.current().is_none());
    }

    #[test]
    fn test_committed_outcome_survives_ui_context_closing() {
        for _ in 0..200 {
            // Arrange
            let (ui, mut queue) = ui_channel();
            let presenter = Arc::new(CapturingPresenter::default());
            let bridge = DialogBridge::new(SessionHandlerRegistry::new(), ui, presenter.clone());
            let mut request =
                task::spawn(bridge.request_text_input(TextInputRequest::new("T", "foo")));
            assert_pending!(request.poll());
            queue.run_pending();
            assert_pending!(request.poll());

            // Act: confirm, then the UI context goes away before the caller runs
            let handle = presenter.handle();
            handle.set_text("bar");
            assert!(handle.confirm());
            drop(queue);

            // Assert
            assert_ready_eq!(request.poll(), DialogOutcome::Text("bar".to_string()));
        }
    }

    #[test]
    fn test_opening_validation_runs_on_ui_context() {
        // Arrange
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let request = TextInputRequest::new("T", "ok").with_validator(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        });
        let (ui, mut queue) = ui_channel();
        let presenter = Arc::new(CapturingPresenter::default());
        let bridge = DialogBridge::new(SessionHandlerRegistry::new(), ui, presenter.clone());
        let mut pending = task::spawn(bridge.request_text_input(request));

        // Act / Assert: the caller's poll leaves the validator alone
        assert_pending!(pending.poll());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        queue.run_pending();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let handle = presenter.handle();
        assert!(handle.snapshot().submit_enabled);

        assert_pending!(pending.poll());
        handle.cancel();
        assert_ready_eq!(pending.poll(), DialogOutcome::Text("ok".to_string()));
    }

    #[test]
    fn test_panicking_validator_dismisses_dialog() {
        // Arrange
        let (ui, mut queue) = ui_channel();
        let registry = SessionHandlerRegistry::new();
        let presenter = Arc::new(CapturingPresenter::default());
        let bridge = DialogBridge::new(registry.clone(), ui, presenter.clone());
        let request =
            TextInputRequest::new("T", "foo").with_validator(|_| panic!("validator failed"));
        let mut pending = task::spawn(bridge.request_text_input(request));

        // Act
        assert_pending!(pending.poll());
        queue.run_pending();

        // Assert: the panic stays on the UI context and the caller gets initial
        assert_ready_eq!(pending.poll(), DialogOutcome::Text("foo".to_string()));
        assert!(lock(&presenter.shown).is_empty());
        assert!(registry.active_ticket().is_none());
    }

    #[test]
    fn test_dropping_request_dismisses_via_ui_context() {
        let (ui, mut queue) = ui_channel();
        let registry = SessionHandlerRegistry::new();
        let presenter = Arc::new(CapturingPresenter::default());
        let bridge = DialogBridge::new(registry.clone(), ui, presenter.clone());

        let mut request = task::spawn(bridge.request_text_input(TextInputRequest::new("T", "foo")));
        assert_pending!(request.poll());
        queue.run_pending();
        let handle = presenter.handle();

        drop(request);
        assert!(!handle.is_closed(), "dismissal is marshalled to the UI context");

        queue.run_pending();
        assert!(handle.is_closed());
        assert!(registry.active_ticket().is_none());
    }

    #[test]
    fn test_remote_access_absent_without_endpoint() {
        let (ui, _queue) = ui_channel();
        let bridge = DialogBridge::new(
            SessionHandlerRegistry::new(),
            ui,
            Arc::new(CapturingPresenter::default()),
        );
        assert_eq!(bridge.remote_access(), None);
    }

    #[test]
    fn test_remote_access_carries_url() {
        let (ui, _queue) = ui_channel();
        let bridge = DialogBridge::new(
            SessionHandlerRegistry::new(),
            ui,
            Arc::new(CapturingPresenter::default()),
        )
        .with_endpoint(ServerEndpoint::new("10.0.0.8".parse().unwrap(), 12345));

        let access = bridge.remote_access().unwrap();

        assert_eq!(access.url, "http://10.0.0.8:12345");
        assert_eq!(access.qr, None);
    }
}
