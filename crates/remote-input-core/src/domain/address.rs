//! LAN address preference rules.
//!
//! A device usually has several addresses: loopback, one or more private LAN
//! addresses, maybe a public or link-local IPv6 address.  The QR code must
//! carry one that a phone on the same Wi-Fi can reach.  The tiers are:
//!
//! 1. the first private-range (10/8, 172.16/12, 192.168/16) IPv4 address;
//! 2. otherwise the first non-loopback address of any family;
//! 3. otherwise nothing (the caller falls back to the host's own address).

use std::net::IpAddr;

/// Picks the address to advertise from `candidates`, in enumeration order.
///
/// Returns `None` if every candidate is a loopback address.
pub fn select_lan_address<I>(candidates: I) -> Option<IpAddr>
where
    I: IntoIterator<Item = IpAddr>,
{
    let mut first_non_loopback = None;
    for ip in candidates {
        if ip.is_loopback() {
            continue;
        }
        if first_non_loopback.is_none() {
            first_non_loopback = Some(ip);
        }
        if is_private_ipv4(&ip) {
            return Some(ip);
        }
    }
    first_non_loopback
}

/// `true` for a dotted-quad address in one of the RFC 1918 ranges.
pub fn is_private_ipv4(ip: &IpAddr) -> bool {
    matches!(ip, IpAddr::V4(v4) if v4.is_private())
}
