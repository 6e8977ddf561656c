//! Host name resolution for scheduler nodes
//!
//! Resolution is best effort: schedulers often list hostnames before DNS has
//! caught up, so a failed lookup is logged and the address is left unset.

use std::collections::HashMap;
use std::io;
use std::net::{IpAddr, ToSocketAddrs};
use tracing::{debug, warn};

/// Maps a hostname to its private address
pub trait HostResolver: Send + Sync {
    /// Resolve `hostname`, returning `None` when no address is available
    fn resolve(&self, hostname: &str) -> Option<IpAddr>;
}

/// Resolver backed by the operating system
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemResolver;

impl SystemResolver {
    fn lookup(hostname: &str) -> io::Result<IpAddr> {
        let addrs: Vec<IpAddr> = (hostname, 0u16)
            .to_socket_addrs()?
            .map(|addr| addr.ip())
            .collect();

        // Prefer IPv4 when the resolver returns both families
        addrs
            .iter()
            .find(|ip| ip.is_ipv4())
            .or_else(|| addrs.first())
            .copied()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no addresses returned"))
    }
}

impl HostResolver for SystemResolver {
    fn resolve(&self, hostname: &str) -> Option<IpAddr> {
        match Self::lookup(hostname) {
            Ok(ip) => {
                debug!(hostname, %ip, "Resolved private ip");
                Some(ip)
            }
            Err(e) => {
                warn!("Could not find private ip for {}: {}", hostname, e);
                None
            }
        }
    }
}

/// Resolver that never resolves, for hermetic tests
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledResolver;

impl HostResolver for DisabledResolver {
    fn resolve(&self, _hostname: &str) -> Option<IpAddr> {
        None
    }
}

/// Resolver answering from a fixed table
#[derive(Debug, Default, Clone)]
pub struct StaticResolver {
    entries: HashMap<String, IpAddr>,
}

impl StaticResolver {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a hostname entry
    pub fn with_entry(mut self, hostname: impl Into<String>, ip: IpAddr) -> Self {
        self.entries.insert(hostname.into(), ip);
        self
    }
}

impl HostResolver for StaticResolver {
    fn resolve(&self, hostname: &str) -> Option<IpAddr> {
        let ip = self.entries.get(hostname).copied();
        if ip.is_none() {
            warn!("Could not find private ip for {}: not in static table", hostname);
        }
        ip
    }
}
