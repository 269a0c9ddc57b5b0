//! Shared registry of connected clients
//!
//! Maps each registered name to the sink that reaches its client. A name and
//! its sink are inserted and removed together under one lock, so no reader can
//! see a name without a sink or a sink without a name.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::client::ClientSink;
use crate::error::NameError;
use crate::message::ServerLine;
use crate::types::ClientName;

/// Registry of clients that completed the handshake
///
/// Cheap to clone; all clones share the same state. Critical sections never
/// await and never touch a socket.
#[derive(Debug, Clone, Default)]
pub struct ClientRegistry {
    inner: Arc<Mutex<BTreeMap<ClientName, ClientSink>>>,
}

impl ClientRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<ClientName, ClientSink>> {
        // Every critical section leaves the map consistent, so a poisoned lock is still usable.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `name` and attach its sink in one step
    ///
    /// Fails with [`NameError::Taken`] without changing anything if the name
    /// is already registered. On success `NAMEACCEPTED` is queued on the sink
    /// before it becomes visible to broadcasters, so it is always the first
    /// line the client receives after the prompt.
    pub fn try_register(&self, name: ClientName, sink: ClientSink) -> Result<(), NameError> {
        let mut clients = self.lock();

        if clients.contains_key(&name) {
            return Err(NameError::Taken(name.to_string()));
        }

        let _ = sink.send(ServerLine::NameAccepted);
        clients.insert(name, sink);
        debug!("Registered clients: {}", clients.len());
        Ok(())
    }

    /// Remove a name and its sink
    ///
    /// Returns false if the name was not registered.
    pub fn remove(&self, name: &ClientName) -> bool {
        let mut clients = self.lock();
        let removed = clients.remove(name).is_some();
        debug!("Registered clients: {}", clients.len());
        removed
    }

    /// Point-in-time list of registered names, in sorted order
    pub fn snapshot_names(&self) -> Vec<ClientName> {
        self.lock().keys().cloned().collect()
    }

    /// Point-in-time list of every attached sink
    pub fn snapshot_sinks(&self) -> Vec<ClientSink> {
        self.lock().values().cloned().collect()
    }

    /// Find the sink for a directed delivery
    pub fn lookup_sink(&self, name: &str) -> Option<ClientSink> {
        self.lock().get(name).cloned()
    }

    /// Push the current roster to every registered client
    ///
    /// Names and sinks come from the same locked state, and the lines are
    /// queued before the lock is released, so every client sees roster
    /// updates in the order the registry changed.
    pub fn broadcast_roster(&self) {
        let clients = self.lock();
        let roster = ServerLine::ClientList(clients.keys().cloned().collect());

        for sink in clients.values() {
            // A closed sink belongs to a session already tearing down; a full one misses this update.
            let _ = sink.send(roster.clone());
        }
        debug!("Roster sent to {} clients", clients.len());
    }

    /// Check if a name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    /// Number of registered clients
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if no client is registered
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
