//! Session server allocation.

use std::future::Future;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::AllocationError;

/// Provisions a session server for a newly formed pair.
///
/// An allocator is called once per attempt; failures are retried by
/// [`allocate_with_retry`](crate::allocate_with_retry). The returned
/// string is the endpoint handed verbatim to both players.
///
/// ## Trait bounds
///
/// - `Send + Sync`: the coordinator shares one allocator between all of
///   its handler tasks, and several pairs may be allocating at once.
/// - `'static`: it lives as long as the coordinator.
///
/// An implementation should not retry internally. Return an
/// [`AllocationError`] and let the retry loop decide when to call again,
/// so cancellation and backoff stay in one place.
///
/// # Example
///
/// ```rust
/// use pairforge_match::{AllocationError, Allocator};
///
/// /// Hands out ports from a fixed range on one host.
/// struct LocalPorts {
///     next: std::sync::atomic::AtomicU16,
/// }
///
/// impl Allocator for LocalPorts {
///     async fn allocate(&self) -> Result<String, AllocationError> {
///         let port = self.next.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
///         if port == 0 {
///             return Err(AllocationError::NoPorts("range exhausted".into()));
///         }
///         Ok(format!("http://127.0.0.1:{port}"))
///     }
/// }
/// ```
pub trait Allocator: Send + Sync + 'static {
    fn allocate(&self) -> impl Future<Output = Result<String, AllocationError>> + Send;
}

/// Always returns the same endpoint.
#[derive(Debug, Clone)]
pub struct StaticAllocator {
    endpoint: String,
}

impl StaticAllocator {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl Allocator for StaticAllocator {
    async fn allocate(&self) -> Result<String, AllocationError> {
        Ok(self.endpoint.clone())
    }
}

/// A session server and the ports it exposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddress {
    pub host: String,
    pub ports: Vec<u16>,
}

impl ServerAddress {
    pub fn new(host: impl Into<String>, ports: Vec<u16>) -> Self {
        Self {
            host: host.into(),
            ports,
        }
    }

    /// Renders `http://<host>:<first port>`.
    ///
    /// # Errors
    ///
    /// [`AllocationError::NoPorts`] if the server exposes no ports.
    pub fn endpoint(&self) -> Result<String, AllocationError> {
        let port = self
            .ports
            .first()
            .ok_or_else(|| AllocationError::NoPorts(self.host.clone()))?;
        Ok(format!("http://{}:{}", self.host, port))
    }
}

impl FromStr for ServerAddress {
    type Err = AllocationError;

    /// Parses `host:port` or a bare `host` (no ports).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || AllocationError::InvalidAddress(s.to_string());
        match s.rsplit_once(':') {
            Some((host, port)) => {
                if host.is_empty() {
                    return Err(invalid());
                }
                let port = port.parse::<u16>().map_err(|_| invalid())?;
                Ok(Self::new(host, vec![port]))
            }
            None if s.is_empty() => Err(invalid()),
            None => Ok(Self::new(s, Vec::new())),
        }
    }
}

/// Hands out servers from a fixed list in rotation.
///
/// Each attempt moves on to the next server, so a retry after a failure
/// (e.g. a server with no ports) tries a different one.
#[derive(Debug)]
pub struct RoundRobinAllocator {
    servers: Vec<ServerAddress>,
    next: AtomicUsize,
}

impl RoundRobinAllocator {
    pub fn new(servers: Vec<ServerAddress>) -> Self {
        Self {
            servers,
            next: AtomicUsize::new(0),
        }
    }

    pub fn servers(&self) -> &[ServerAddress] {
        &self.servers
    }
}

impl Allocator for RoundRobinAllocator {
    async fn allocate(&self) -> Result<String, AllocationError> {
        if self.servers.is_empty() {
            return Err(AllocationError::Unavailable(
                "no session servers configured".to_string(),
            ));
        }
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.servers.len();
        self.servers[index].endpoint()
    }
}
