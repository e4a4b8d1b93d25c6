//! Host address discovery.
//!
//! Interfaces are enumerated with `if-addrs` and ranked by
//! [`select_lan_address`].  When every interface is loopback, or enumeration
//! fails, the address the OS routes outbound traffic from is used instead.
//! A host with neither has no address to advertise.

use std::io;
use std::net::{IpAddr, Ipv4Addr, UdpSocket};

use remote_input_core::select_lan_address;
use tracing::{debug, info, warn};

use super::NetworkError;

/// Where candidate addresses come from.  Mocked in tests.
#[cfg_attr(test, mockall::automock)]
pub trait InterfaceSource {
    /// Every address assigned to a local interface, in enumeration order.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the interfaces cannot be listed.
    fn interface_addresses(&self) -> io::Result<Vec<IpAddr>>;

    /// The address the OS routes outbound traffic from, if there is a route.
    fn local_host_address(&self) -> Option<IpAddr>;
}

/// Reads the real interfaces through `if-addrs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemInterfaces;

impl InterfaceSource for SystemInterfaces {
    fn interface_addresses(&self) -> io::Result<Vec<IpAddr>> {
        Ok(if_addrs::get_if_addrs()?
            .into_iter()
            .map(|iface| iface.ip())
            .collect())
    }

    fn local_host_address(&self) -> Option<IpAddr> {
        // Connecting a UDP socket sends nothing; it only asks the OS which
        // local address would route to the target.
        UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
            .and_then(|socket| {
                socket.connect((Ipv4Addr::new(192, 0, 2, 1), 9))?;
                socket.local_addr()
            })
            .map(|addr| addr.ip())
            .inspect_err(|e| debug!("no outbound route: {e}"))
            .ok()
            .filter(|ip| !ip.is_unspecified())
    }
}

/// Picks the address to advertise in the QR code.
///
/// # Errors
///
/// Returns [`NetworkError::AddressResolution`] when no interface yields a
/// usable address and the OS has no outbound route either.
pub fn resolve_host_ip(source: &dyn InterfaceSource) -> Result<IpAddr, NetworkError> {
    let enumeration_error = match source.interface_addresses() {
        Ok(addresses) => {
            debug!("interface addresses: {addresses:?}");
            if let Some(ip) = select_lan_address(addresses) {
                info!("advertising interface address {ip}");
                return Ok(ip);
            }
            None
        }
        Err(e) => {
            warn!("could not enumerate network interfaces: {e}");
            Some(e)
        }
    };

    match source.local_host_address() {
        Some(ip) => {
            info!("no usable interface address; falling back to local host address {ip}");
            Ok(ip)
        }
        None => Err(NetworkError::AddressResolution(match enumeration_error {
            Some(e) => e.to_string(),
            None => "only loopback interfaces and no local host address".to_string(),
        })),
    }
}
