//! Address discovery and port selection for the bridge listener.

pub mod address;
pub mod port;

use std::net::SocketAddr;

use thiserror::Error;

pub use address::{resolve_host_ip, InterfaceSource, SystemInterfaces};
pub use port::find_available_port;

/// Error type for network setup.
///
/// Any of these leaves the bridge without a server; dialogs still open but
/// show no remote-access information.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// No usable host address could be determined.
    #[error("could not resolve a host address: {0}")]
    AddressResolution(String),

    /// Every port in the configured range is taken.
    #[error("no free port in {start}..={end}")]
    PortExhaustion { start: u16, end: u16 },

    /// The listener could not be bound on the chosen address.
    #[error("failed to bind listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}
