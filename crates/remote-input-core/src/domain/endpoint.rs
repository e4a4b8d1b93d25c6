//! The bridge server's advertised address.

use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// Where the bridge server listens, as seen from another device on the LAN.
///
/// Resolved once when the server starts and never changed afterwards.  The
/// [`url`](Self::url) is the discovery payload handed to the QR encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServerEndpoint {
    pub host_ip: IpAddr,
    pub port: u16,
}

impl ServerEndpoint {
    pub fn new(host_ip: IpAddr, port: u16) -> Self {
        Self { host_ip, port }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host_ip, self.port)
    }

    /// The `http://{hostIp}:{port}` discovery payload.
    ///
    /// IPv6 hosts are bracketed so the URL stays valid.
    pub fn url(&self) -> String {
        format!("http://{}", self.socket_addr())
    }
}

impl fmt::Display for ServerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.socket_addr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn test_url_for_ipv4_host() {
        let ep = ServerEndpoint::new(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20)), 12345);
        assert_eq!(ep.url(), "http://192.168.1.20:12345");
    }

    #[test]
    fn test_url_brackets_ipv6_host() {
        let ep = ServerEndpoint::new(IpAddr::V6(Ipv6Addr::LOCALHOST), 40000);
        assert_eq!(ep.url(), "http://[::1]:40000");
    }

    #[test]
    fn test_display_matches_socket_addr() {
        let ep = ServerEndpoint::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 12346);
        assert_eq!(ep.to_string(), "127.0.0.1:12346");
    }
}
