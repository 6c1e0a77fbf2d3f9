use std::collections::BTreeSet;
use std::sync::Mutex;

/// First port tried when spinning up an ephemeral reverse proxy.
pub const BASE_PROXY_PORT: u16 = 54800;

/// Process-wide set of ports currently claimed by live proxies. Shared by
/// `Arc`; entries are added on proxy open and removed on proxy close, so the
/// set self-cleans and needs no teardown.
#[derive(Debug, Default)]
pub struct PortRegistry {
    claimed: Mutex<BTreeSet<u16>>,
}

impl PortRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims and returns the first free port at or above `base_port`.
    /// Scanning and marking happen under one lock, so concurrent callers
    /// can never be handed the same port.
    pub fn allocate(&self, base_port: u16) -> u16 {
        let mut claimed = self.claimed.lock().expect("port registry lock poisoned");
        let mut port = base_port;
        while claimed.contains(&port) {
            port += 1;
        }
        claimed.insert(port);
        port
    }

    /// Releases a claimed port. Releasing a port that was never claimed, or
    /// was already released, is a no-op.
    pub fn release(&self, port: u16) {
        let mut claimed = self.claimed.lock().expect("port registry lock poisoned");
        claimed.remove(&port);
    }

    pub fn is_claimed(&self, port: u16) -> bool {
        let claimed = self.claimed.lock().expect("port registry lock poisoned");
        claimed.contains(&port)
    }
}
