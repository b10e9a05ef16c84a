//! Pair factory.
//!
//! Pairs are created whole: two endpoints, mutually linked, with identical
//! flags and their starting signals already asserted. Linking happens while
//! both objects are still private to the factory, so nothing can observe a
//! half-linked pair.

use crate::audit::SignalAuditLog;
use crate::endpoint::SocketEndpoint;
use crate::handle::EndpointHandle;
use crate::pipeline::DataPipeline;
use crate::signal_state::SignalObserver;
use core_types::{
    CreateFlags, EndpointId, PairId, Rights, Signals, SocketError, CONTROL_MSG_MAX,
    DEFAULT_BUFFER_CAPACITY,
};
use std::fmt;
use std::sync::Arc;

/// Tunables and hooks for pair creation.
pub struct PairConfig {
    capacity: usize,
    control_capacity: usize,
    observer: Option<Arc<dyn SignalObserver>>,
    audit: Option<Arc<SignalAuditLog>>,
}

impl PairConfig {
    /// Creates a config with the default capacities and no hooks.
    pub fn new() -> Self {
        Self {
            capacity: DEFAULT_BUFFER_CAPACITY,
            control_capacity: CONTROL_MSG_MAX,
            observer: None,
            audit: None,
        }
    }

    /// Sets the inbound pipeline capacity (bytes) of each endpoint.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the control-slot capacity (bytes) of each endpoint.
    pub fn with_control_capacity(mut self, capacity: usize) -> Self {
        self.control_capacity = capacity;
        self
    }

    /// Registers a signal observer shared by both endpoints.
    pub fn with_observer(mut self, observer: Arc<dyn SignalObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Attaches an audit log shared by both endpoints.
    pub fn with_audit_log(mut self, audit: Arc<SignalAuditLog>) -> Self {
        self.audit = Some(audit);
        self
    }
}

impl Default for PairConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PairConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PairConfig")
            .field("capacity", &self.capacity)
            .field("control_capacity", &self.control_capacity)
            .field("observer", &self.observer.is_some())
            .field("audit", &self.audit.is_some())
            .finish()
    }
}

/// Factory for socket pairs.
#[derive(Debug)]
pub struct SocketPair;

impl SocketPair {
    /// Creates a pair with default configuration.
    pub fn create(
        flags: CreateFlags,
    ) -> Result<(EndpointHandle, EndpointHandle, Rights), SocketError> {
        Self::create_with_config(flags, PairConfig::default())
    }

    /// Creates a pair from a raw flag word, rejecting unknown bits.
    pub fn create_raw(
        raw_flags: u32,
    ) -> Result<(EndpointHandle, EndpointHandle, Rights), SocketError> {
        Self::create(CreateFlags::from_raw(raw_flags)?)
    }

    /// Creates a pair with explicit configuration.
    pub fn create_with_config(
        flags: CreateFlags,
        config: PairConfig,
    ) -> Result<(EndpointHandle, EndpointHandle, Rights), SocketError> {
        let mut starting = Signals::WRITABLE;
        if flags.contains(CreateFlags::HAS_ACCEPT) {
            starting |= Signals::SHARE;
        }
        if flags.contains(CreateFlags::HAS_CONTROL) {
            starting |= Signals::CONTROL_WRITABLE;
        }

        let (pipeline0, pipeline1) = if flags.contains(CreateFlags::DATAGRAM) {
            (
                DataPipeline::datagram(config.capacity),
                DataPipeline::datagram(config.capacity),
            )
        } else {
            (
                DataPipeline::stream(config.capacity),
                DataPipeline::stream(config.capacity),
            )
        };

        let pair = PairId::new();
        let id0 = EndpointId::new();
        let id1 = EndpointId::new();

        let endpoint0 = SocketEndpoint::new(
            id0,
            id1,
            pair,
            flags,
            starting,
            pipeline0,
            config.control_capacity,
            config.observer.clone(),
            config.audit.clone(),
        )?;
        let endpoint1 = SocketEndpoint::new(
            id1,
            id0,
            pair,
            flags,
            starting,
            pipeline1,
            config.control_capacity,
            config.observer,
            config.audit,
        )?;

        endpoint0.link_peer(endpoint1.clone());
        endpoint1.link_peer(endpoint0.clone());

        let rights = Rights::DEFAULT_SOCKET;
        Ok((
            EndpointHandle::new(endpoint0, rights),
            EndpointHandle::new(endpoint1, rights),
            rights,
        ))
    }
}
