//! SessionHandlerRegistry: the single slot binding one open dialog to the server.
//!
//! At most one [`MessageHandler`] is active at any instant.  The server looks
//! the active handler up for every inbound frame; dialogs register a handler
//! when they open and release it when they close.
//!
//! # Registration lifecycle
//!
//! ```text
//! register(h1) ──► Registration { ticket: t1 }     slot = (t1, h1)
//! register(h2) ──► Registration { ticket: t2 }     slot = (t2, h2)   last writer wins
//! remove(t1)   ──► false                           slot = (t2, h2)   stale removal ignored
//! drop(reg2)   ──► remove(t2) ──► true             slot = empty
//! ```
//!
//! The slot keeps only a `Weak` reference: the dialog session owns its
//! handler, and a handler whose owner has gone away is treated as absent.
//! Removal requires the ticket issued by the matching `register`, so a
//! session that has been superseded can never clear its successor's slot.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use remote_input_core::{HandlerResult, Operation};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A failure reported by a handler while processing one operation.
///
/// The server answers it by closing the originating connection with an
/// internal-error code and this message as the reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct HandlerFault(pub String);

/// The callback representing one open dialog session.
///
/// Always invoked on the UI context, one operation at a time.
#[cfg_attr(test, mockall::automock)]
pub trait MessageHandler: Send + Sync {
    /// Applies `operation` to the session and says how to answer the remote.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerFault`] when the operation could not be processed.
    fn on_message(&self, operation: Operation) -> Result<HandlerResult, HandlerFault>;
}

/// Identifies one `register` call; required to remove that registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationTicket(Uuid);

impl fmt::Display for RegistrationTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct Slot {
    ticket: RegistrationTicket,
    handler: Weak<dyn MessageHandler>,
}

/// Holds zero or one active handler; cheap to clone and share.
#[derive(Clone, Default)]
pub struct SessionHandlerRegistry {
    slot: Arc<Mutex<Option<Slot>>>,
}

impl SessionHandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Slot>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes `handler` the active handler, replacing any previous one.
    ///
    /// The registry keeps a non-owning reference.  The returned
    /// [`Registration`] removes the handler when released or dropped.
    pub fn register<H>(&self, handler: &Arc<H>) -> Registration
    where
        H: MessageHandler + 'static,
    {
        let weak: Weak<H> = Arc::downgrade(handler);
        let handler: Weak<dyn MessageHandler> = weak;
        let ticket = RegistrationTicket(Uuid::new_v4());

        let previous = self.lock().replace(Slot { ticket, handler });
        match previous {
            Some(prev) if prev.handler.strong_count() > 0 => {
                warn!(
                    "handler {} replaced live handler {}; the earlier dialog no longer receives remote input",
                    ticket, prev.ticket
                );
            }
            _ => info!("handler {ticket} registered"),
        }

        Registration {
            registry: self.clone(),
            ticket,
            released: false,
        }
    }

    /// Clears the slot if `ticket` is the active registration.
    ///
    /// Returns `false` (and changes nothing) for a stale or unknown ticket.
    pub fn remove(&self, ticket: RegistrationTicket) -> bool {
        let mut slot = self.lock();
        match slot.as_ref() {
            Some(active) if active.ticket == ticket => {
                *slot = None;
                info!("handler {ticket} removed");
                true
            }
            _ => {
                debug!("ignoring removal of inactive handler {ticket}");
                false
            }
        }
    }

    /// The active handler, if one is registered and still alive.
    pub fn current(&self) -> Option<Arc<dyn MessageHandler>> {
        self.lock().as_ref().and_then(|slot| slot.handler.upgrade())
    }

    /// The ticket of the active registration, alive or not.
    pub fn active_ticket(&self) -> Option<RegistrationTicket> {
        self.lock().as_ref().map(|slot| slot.ticket)
    }
}

impl fmt::Debug for SessionHandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandlerRegistry")
            .field("active", &self.active_ticket())
            .finish()
    }
}

/// Scoped registration: removes its handler exactly once, on
/// [`release`](Self::release) or on drop, whichever comes first.
#[must_use = "dropping a Registration immediately removes the handler"]
pub struct Registration {
    registry: SessionHandlerRegistry,
    ticket: RegistrationTicket,
    released: bool,
}

impl Registration {
    pub fn ticket(&self) -> RegistrationTicket {
        self.ticket
    }

    /// Removes the handler now.  Returns `true` if it was still active.
    pub fn release(mut self) -> bool {
        self.release_once()
    }

    fn release_once(&mut self) -> bool {
        if std::mem::replace(&mut self.released, true) {
            return false;
        }
        self.registry.remove(self.ticket)
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.release_once();
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("ticket", &self.ticket)
            .field("released", &self.released)
            .finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
