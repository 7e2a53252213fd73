//! # Input Validation: Network Address Classification
//!
//! Decides whether a resolved address is somewhere an upload must never be sent:
//! private networks, loopback, link-local, the all-zero block and cloud metadata
//! services.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

struct BlockedV4 {
    network: Ipv4Addr,
    prefix: u8,
    label: &'static str,
}

struct BlockedV6 {
    network: Ipv6Addr,
    prefix: u8,
    label: &'static str,
}

// Metadata entries come first so the more specific label wins.
const BLOCKED_V4: &[BlockedV4] = &[
    BlockedV4 {
        network: Ipv4Addr::new(169, 254, 169, 254),
        prefix: 32,
        label: "cloud metadata service",
    },
    BlockedV4 {
        network: Ipv4Addr::new(10, 0, 0, 0),
        prefix: 8,
        label: "private network",
    },
    BlockedV4 {
        network: Ipv4Addr::new(172, 16, 0, 0),
        prefix: 12,
        label: "private network",
    },
    BlockedV4 {
        network: Ipv4Addr::new(192, 168, 0, 0),
        prefix: 16,
        label: "private network",
    },
    BlockedV4 {
        network: Ipv4Addr::new(127, 0, 0, 0),
        prefix: 8,
        label: "loopback",
    },
    BlockedV4 {
        network: Ipv4Addr::new(169, 254, 0, 0),
        prefix: 16,
        label: "link-local",
    },
    BlockedV4 {
        network: Ipv4Addr::new(224, 0, 0, 0),
        prefix: 24,
        label: "link-local multicast",
    },
    BlockedV4 {
        network: Ipv4Addr::new(0, 0, 0, 0),
        prefix: 8,
        label: "unspecified",
    },
];

const BLOCKED_V6: &[BlockedV6] = &[
    // AWS IMDS over IPv6
    BlockedV6 {
        network: Ipv6Addr::new(0xfd00, 0xec2, 0, 0, 0, 0, 0, 0x254),
        prefix: 128,
        label: "cloud metadata service",
    },
    BlockedV6 {
        network: Ipv6Addr::LOCALHOST,
        prefix: 128,
        label: "loopback",
    },
    BlockedV6 {
        network: Ipv6Addr::UNSPECIFIED,
        prefix: 128,
        label: "unspecified",
    },
    BlockedV6 {
        network: Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, 0),
        prefix: 10,
        label: "link-local",
    },
    BlockedV6 {
        network: Ipv6Addr::new(0xff02, 0, 0, 0, 0, 0, 0, 0),
        prefix: 16,
        label: "link-local multicast",
    },
    BlockedV6 {
        network: Ipv6Addr::new(0xfc00, 0, 0, 0, 0, 0, 0, 0),
        prefix: 7,
        label: "private network",
    },
];

fn v4_contains(network: Ipv4Addr, prefix: u8, addr: Ipv4Addr) -> bool {
    let mask = u32::MAX.checked_shl(32 - u32::from(prefix)).unwrap_or(0);
    u32::from(network) & mask == u32::from(addr) & mask
}

fn v6_contains(network: Ipv6Addr, prefix: u8, addr: Ipv6Addr) -> bool {
    let mask = u128::MAX.checked_shl(128 - u32::from(prefix)).unwrap_or(0);
    u128::from(network) & mask == u128::from(addr) & mask
}

fn classify_v4(addr: Ipv4Addr) -> Option<&'static str> {
    if let Some(range) = BLOCKED_V4
        .iter()
        .find(|r| v4_contains(r.network, r.prefix, addr))
    {
        return Some(range.label);
    }

    // std predicates as a backstop
    if addr.is_loopback() {
        Some("loopback")
    } else if addr.is_link_local() {
        Some("link-local")
    } else if addr.is_private() {
        Some("private network")
    } else {
        None
    }
}

fn classify_v6(addr: Ipv6Addr) -> Option<&'static str> {
    // ::ffff:a.b.c.d reaches the embedded IPv4 host.
    if let Some(v4) = addr.to_ipv4_mapped() {
        return classify_v4(v4);
    }

    if let Some(range) = BLOCKED_V6
        .iter()
        .find(|r| v6_contains(r.network, r.prefix, addr))
    {
        return Some(range.label);
    }

    if addr.is_loopback() {
        Some("loopback")
    } else {
        None
    }
}

/// Name the disallowed range `ip` falls into, or `None` if it is safe to contact.
pub fn classify_ip(ip: IpAddr) -> Option<&'static str> {
    match ip {
        IpAddr::V4(v4) => classify_v4(v4),
        IpAddr::V6(v6) => classify_v6(v6),
    }
}

/// Check whether an address is in a private, loopback, link-local or metadata range.
pub fn is_disallowed_ip(ip: IpAddr) -> bool {
    classify_ip(ip).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_public_addresses_are_allowed() {
        for addr in [
            "8.8.8.8",
            "8.8.4.4",
            "1.1.1.1",
            "151.101.0.223",
            "172.32.0.1",
            "192.169.0.1",
            "2607:f8b0:4004:800::200e",
            "2a04:4e42::223",
        ] {
            assert!(!is_disallowed_ip(ip(addr)), "{addr} should be allowed");
        }
    }

    #[test]
    fn test_private_and_reserved_ipv4_are_blocked() {
        for addr in [
            "10.0.0.1",
            "172.16.0.1",
            "172.31.255.255",
            "192.168.1.1",
            "127.0.0.1",
            "127.255.255.254",
            "169.254.1.1",
            "0.0.0.0",
            "0.1.2.3",
            "224.0.0.251",
        ] {
            assert!(is_disallowed_ip(ip(addr)), "{addr} should be blocked");
        }
    }

    #[test]
    fn test_ipv6_ranges_are_blocked() {
        for addr in ["::1", "::", "fe80::1", "ff02::fb", "fd12:3456::1", "fc00::1"] {
            assert!(is_disallowed_ip(ip(addr)), "{addr} should be blocked");
        }
    }

    #[test]
    fn test_metadata_endpoints_get_specific_label() {
        assert_eq!(
            classify_ip(ip("169.254.169.254")),
            Some("cloud metadata service")
        );
        assert_eq!(
            classify_ip(ip("fd00:ec2::254")),
            Some("cloud metadata service")
        );
    }

    #[test]
    fn test_ipv4_mapped_ipv6_uses_embedded_address() {
        assert_eq!(classify_ip(ip("::ffff:10.1.2.3")), Some("private network"));
        assert_eq!(classify_ip(ip("::ffff:127.0.0.1")), Some("loopback"));
        assert_eq!(classify_ip(ip("::ffff:8.8.8.8")), None);
    }

    #[test]
    fn test_prefix_boundaries() {
        assert!(v4_contains(Ipv4Addr::new(172, 16, 0, 0), 12, Ipv4Addr::new(172, 31, 0, 1)));
        assert!(!v4_contains(Ipv4Addr::new(172, 16, 0, 0), 12, Ipv4Addr::new(172, 32, 0, 1)));
        assert!(v4_contains(Ipv4Addr::new(0, 0, 0, 0), 0, Ipv4Addr::new(9, 9, 9, 9)));
        assert!(!v6_contains(Ipv6Addr::LOCALHOST, 128, Ipv6Addr::new(0, 0, 0, 0, 0, 0, 0, 2)));
    }
}
