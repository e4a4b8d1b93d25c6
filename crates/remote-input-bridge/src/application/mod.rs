//! Application layer: the handler registry, the UI-context handoff, and the
//! dialog bridge that ties a dialog session to both.

pub mod dialog_bridge;
pub mod presenter;
pub mod registry;
pub mod ui_context;

pub use dialog_bridge::{DialogBridge, DialogHandle, DIALOG_CLOSED_MESSAGE};
pub use presenter::{DialogPresenter, QrEncoder, QrError, QrMatrix, RemoteAccess};
pub use registry::{
    HandlerFault, MessageHandler, Registration, RegistrationTicket, SessionHandlerRegistry,
};
pub use ui_context::{ui_channel, DispatchError, UiContext, UiDispatcher, UiQueue};
