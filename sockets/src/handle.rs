//! External handles to endpoints.
//!
//! A handle is the unit of ownership an embedder stores in its handle
//! table. Handles are cheap to duplicate; each endpoint counts its live
//! handles and fires `on_zero_handles` exactly once, when the last one is
//! released. That event, not object destruction, is what the peer observes
//! as `PEER_CLOSED`.

use crate::endpoint::SocketEndpoint;
use core_types::Rights;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// A counted reference to one endpoint of a socket pair.
pub struct EndpointHandle {
    endpoint: Arc<SocketEndpoint>,
    rights: Rights,
}

impl EndpointHandle {
    pub(crate) fn new(endpoint: Arc<SocketEndpoint>, rights: Rights) -> Self {
        endpoint.note_handle_created();
        Self { endpoint, rights }
    }

    /// Returns the rights this handle carries.
    pub fn rights(&self) -> Rights {
        self.rights
    }

    /// Returns the endpoint this handle refers to.
    pub fn endpoint(&self) -> &SocketEndpoint {
        &self.endpoint
    }
}

impl Deref for EndpointHandle {
    type Target = SocketEndpoint;

    fn deref(&self) -> &SocketEndpoint {
        &self.endpoint
    }
}

impl Clone for EndpointHandle {
    fn clone(&self) -> Self {
        Self::new(self.endpoint.clone(), self.rights)
    }
}

impl Drop for EndpointHandle {
    fn drop(&mut self) {
        if self.endpoint.note_handle_dropped() {
            self.endpoint.on_zero_handles();
        }
    }
}

impl fmt::Debug for EndpointHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointHandle")
            .field("endpoint", &self.endpoint.id())
            .field("rights", &self.rights)
            .finish()
    }
}
