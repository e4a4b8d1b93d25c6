//! Text-input dialog model.
//!
//! [`DialogState`] is the single source of truth for an open dialog: the
//! current text, whether the confirm button is enabled, and which outcome each
//! button produces.  Remote operations and local button presses both go
//! through it, so a remote `submit` behaves exactly like tapping the confirm
//! button: ignored while the validator rejects the text.
//!
//! The state is pure; closing the dialog, releasing the handler registration
//! and fulfilling the waiting caller are done by the bridge crate.

use std::fmt;
use std::sync::Arc;

/// Predicate gating the confirm button.  Must be cheap: it runs on every edit.
pub type Validator = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// A validator that accepts every string.
pub fn accept_all() -> Validator {
    Arc::new(|_| true)
}

// ── Request ───────────────────────────────────────────────────────────────────

/// Everything needed to open one text-input dialog.
#[derive(Clone)]
pub struct TextInputRequest {
    pub title: String,
    /// Text shown when the dialog opens; returned on cancel/dismiss.
    pub initial: String,
    pub hint: Option<String>,
    /// Shown while the current text is rejected by the validator.
    pub error: Option<String>,
    /// Label of the reset button; `None` means the dialog has no reset option.
    pub reset_label: Option<String>,
    pub validator: Validator,
}

impl TextInputRequest {
    pub fn new(title: impl Into<String>, initial: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            initial: initial.into(),
            hint: None,
            error: None,
            reset_label: None,
            validator: accept_all(),
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_reset(mut self, label: impl Into<String>) -> Self {
        self.reset_label = Some(label.into());
        self
    }

    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.validator = Arc::new(validator);
        self
    }

    pub fn reset_available(&self) -> bool {
        self.reset_label.is_some()
    }
}

impl fmt::Debug for TextInputRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextInputRequest")
            .field("title", &self.title)
            .field("initial", &self.initial)
            .field("hint", &self.hint)
            .field("error", &self.error)
            .field("reset_label", &self.reset_label)
            .finish_non_exhaustive()
    }
}

// ── Outcomes and actions ──────────────────────────────────────────────────────

/// The value a `request_text_input` caller receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogOutcome {
    /// The confirmed text, or the initial text when the dialog was cancelled,
    /// dismissed, or confirmed with invalid text.
    Text(String),
    /// The user chose the reset option.
    Reset,
}

impl DialogOutcome {
    pub fn text(&self) -> Option<&str> {
        match self {
            DialogOutcome::Text(t) => Some(t),
            DialogOutcome::Reset => None,
        }
    }
}

/// A local dialog action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogAction {
    Confirm,
    Cancel,
    Reset,
    /// Back button, tap outside, or programmatic dismissal.
    Dismiss,
}

/// Read-only view of the dialog for presenters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogSnapshot {
    pub title: String,
    pub hint: Option<String>,
    pub text: String,
    pub submit_enabled: bool,
    pub error: Option<String>,
    pub reset_label: Option<String>,
    pub closed: bool,
}

// ── State ─────────────────────────────────────────────────────────────────────

/// Mutable state of one open dialog.
pub struct DialogState {
    request: TextInputRequest,
    text: String,
    submit_enabled: bool,
    closed: bool,
}

impl DialogState {
    /// Opens a dialog showing `request.initial` and evaluates it once.
    pub fn open(request: TextInputRequest) -> Self {
        let mut state = Self::unvalidated(request);
        state.revalidate();
        state
    }

    /// Opens a dialog showing `request.initial` without running the
    /// validator. Submit stays disabled until [`revalidate`](Self::revalidate).
    pub fn unvalidated(request: TextInputRequest) -> Self {
        let text = request.initial.clone();
        Self {
            request,
            text,
            submit_enabled: false,
            closed: false,
        }
    }

    /// Replaces the current text and re-evaluates the validator.
    ///
    /// Returns the new submit-enabled flag.  Ignored once closed.
    pub fn set_text(&mut self, text: impl Into<String>) -> bool {
        if self.closed {
            return false;
        }
        self.text = text.into();
        self.revalidate();
        self.submit_enabled
    }

    /// Runs the validator over the current text and returns the new
    /// submit-enabled flag.
    pub fn revalidate(&mut self) -> bool {
        self.submit_enabled = (self.request.validator)(&self.text);
        self.submit_enabled
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn initial(&self) -> &str {
        &self.request.initial
    }

    pub fn submit_enabled(&self) -> bool {
        self.submit_enabled
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn reset_available(&self) -> bool {
        self.request.reset_available()
    }

    /// The error text to display, present only while the text is invalid.
    pub fn error_text(&self) -> Option<&str> {
        if self.submit_enabled {
            None
        } else {
            self.request.error.as_deref()
        }
    }

    /// The outcome `action` would resolve the dialog with.
    ///
    /// `None` when the action does nothing: the dialog is already closed, or
    /// `Reset` was requested on a dialog without a reset option.
    pub fn outcome_for(&self, action: DialogAction) -> Option<DialogOutcome> {
        if self.closed {
            return None;
        }
        match action {
            DialogAction::Confirm => {
                if (self.request.validator)(&self.text) {
                    Some(DialogOutcome::Text(self.text.clone()))
                } else {
                    Some(DialogOutcome::Text(self.request.initial.clone()))
                }
            }
            DialogAction::Cancel | DialogAction::Dismiss => {
                Some(DialogOutcome::Text(self.request.initial.clone()))
            }
            DialogAction::Reset => self.reset_available().then_some(DialogOutcome::Reset),
        }
    }

    /// A press of the confirm button that respects its enabled state.
    ///
    /// This is what a remote `submit` does: nothing while the button is
    /// disabled, otherwise the same as [`DialogAction::Confirm`].
    pub fn submit(&self) -> Option<DialogOutcome> {
        if !self.submit_enabled {
            return None;
        }
        self.outcome_for(DialogAction::Confirm)
    }

    /// Marks the dialog closed.  Returns `true` only for the first call.
    pub fn close(&mut self) -> bool {
        !std::mem::replace(&mut self.closed, true)
    }

    pub fn snapshot(&self) -> DialogSnapshot {
        DialogSnapshot {
            title: self.request.title.clone(),
            hint: self.request.hint.clone(),
            text: self.text.clone(),
            submit_enabled: self.submit_enabled,
            error: self.error_text().map(str::to_string),
            reset_label: self.request.reset_label.clone(),
            closed: self.closed,
        }
    }
}

impl fmt::Debug for DialogState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogState")
            .field("request", &self.request)
            .field("text", &self.text)
            .field("submit_enabled", &self.submit_enabled)
            .field("closed", &self.closed)
            .finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
