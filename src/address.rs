use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// One SCTP transport address: an IP address plus port.
///
/// Comparison comes in two strengths. The plain form treats an unspecified
/// address (`0.0.0.0` / `::`) as a wildcard matching any address of the
/// same family and port. The exact form only ever matches a wildcard
/// against itself. Addresses of different families never compare equal in
/// either form.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TransportAddr(SocketAddr);

impl TransportAddr {
    pub fn new(addr: SocketAddr) -> Self {
        TransportAddr(addr)
    }

    pub fn ip(&self) -> IpAddr {
        self.0.ip()
    }

    pub fn port(&self) -> u16 {
        self.0.port()
    }

    /// Whether this is a wildcard (unspecified) address.
    pub fn is_any(&self) -> bool {
        self.0.ip().is_unspecified()
    }

    /// Wildcard-aware equality: an unspecified address matches any address
    /// of the same family, provided the ports agree.
    pub fn equal(&self, other: &TransportAddr) -> bool {
        if self.0.port() != other.0.port() {
            return false;
        }
        match (self.0.ip(), other.0.ip()) {
            (IpAddr::V4(a), IpAddr::V4(b)) => {
                a.is_unspecified() || b.is_unspecified() || a == b
            }
            (IpAddr::V6(a), IpAddr::V6(b)) => {
                a.is_unspecified() || b.is_unspecified() || a == b
            }
            // family mismatch
            _ => false,
        }
    }

    /// Strict equality: family, port, and raw address bytes. A wildcard
    /// equals only another wildcard of the same family.
    pub fn equal_exact(&self, other: &TransportAddr) -> bool {
        if self.0.port() != other.0.port() {
            return false;
        }
        match (self.0.ip(), other.0.ip()) {
            (IpAddr::V4(a), IpAddr::V4(b)) => a == b,
            (IpAddr::V6(a), IpAddr::V6(b)) => a == b,
            _ => false,
        }
    }
}

impl From<SocketAddr> for TransportAddr {
    fn from(addr: SocketAddr) -> Self {
        TransportAddr(addr)
    }
}

impl fmt::Display for TransportAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reachability scope of an address.
///
/// An association created with a given scope only accepts peer addresses
/// whose own scope is at most as wide: a loopback-scoped association may
/// use any address, a global-scoped one only globally routable ones.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Scope {
    Global = 0,
    Private = 1,
    Link = 2,
    Loopback = 3,
}

impl Scope {
    /// Classify an address.
    pub fn of(addr: &TransportAddr) -> Scope {
        match addr.ip() {
            IpAddr::V4(v4) => {
                if v4.is_loopback() || v4.is_unspecified() {
                    Scope::Loopback
                } else if v4.is_link_local() {
                    Scope::Link
                } else if v4.is_private() {
                    Scope::Private
                } else {
                    Scope::Global
                }
            }
            IpAddr::V6(v6) => {
                if v6.is_loopback() || v6.is_unspecified() {
                    Scope::Loopback
                } else if (v6.segments()[0] & 0xffc0) == 0xfe80 {
                    Scope::Link
                } else if (v6.segments()[0] & 0xfe00) == 0xfc00 {
                    // unique-local
                    Scope::Private
                } else {
                    Scope::Global
                }
            }
        }
    }

    /// Whether an address of the given scope may participate in an
    /// association of this scope.
    pub fn allows(&self, addr: &TransportAddr) -> bool {
        Scope::of(addr) <= *self
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            Scope::Global => "Global",
            Scope::Private => "Private",
            Scope::Link => "Link",
            Scope::Loopback => "Loopback",
        };
        write!(f, "{}", s)
    }
}
