//! Free-port selection within the configured range.

use std::net::{IpAddr, TcpListener};
use std::ops::RangeInclusive;

use tracing::{debug, info};

use super::NetworkError;

/// Returns the first port in `range` that can be bound on `host`.
///
/// Each candidate is probed by binding and immediately dropping a listener.
/// Another process can take the port between the probe and the real bind;
/// the caller reports that as a bind error.
///
/// # Errors
///
/// Returns [`NetworkError::PortExhaustion`] if every candidate is taken.
pub fn find_available_port(host: IpAddr, range: RangeInclusive<u16>) -> Result<u16, NetworkError> {
    let (start, end) = (*range.start(), *range.end());
    for port in range {
        match TcpListener::bind((host, port)) {
            Ok(probe) => {
                drop(probe);
                info!("selected port {port} on {host}");
                return Ok(port);
            }
            Err(e) => debug!("port {port} unavailable: {e}"),
        }
    }
    Err(NetworkError::PortExhaustion { start, end })
}
