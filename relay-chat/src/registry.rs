use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use thiserror::Error;
use tokio::sync::Mutex;

use crate::connection::{Connection, ConnectionId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("connection {0} is already registered")]
    Duplicate(ConnectionId),
}

/// Set of live connections, keyed by identity.
///
/// Add, remove and snapshot each take the same lock and never do I/O while
/// holding it. Callers write to the connections returned by [`snapshot`]
/// after the lock is released.
///
/// [`snapshot`]: Registry::snapshot
pub struct Registry {
    connections: Mutex<HashMap<ConnectionId, Arc<Connection>>>,
    next_id: AtomicU64,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn next_id(&self) -> ConnectionId {
        ConnectionId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    pub async fn add(&self, connection: Arc<Connection>) -> Result<(), RegistryError> {
        let mut connections = self.connections.lock().await;
        let id = connection.id();
        if connections.contains_key(&id) {
            return Err(RegistryError::Duplicate(id));
        }
        connections.insert(id, connection);
        Ok(())
    }

    /// Returns the removed connection, or `None` if it was already gone.
    pub async fn remove(&self, id: ConnectionId) -> Option<Arc<Connection>> {
        let mut connections = self.connections.lock().await;
        connections.remove(&id)
    }

    /// Every registered connection except `exclude`, ordered by identity.
    pub async fn snapshot(&self, exclude: Option<ConnectionId>) -> Vec<Arc<Connection>> {
        let connections = self.connections.lock().await;
        let mut snapshot: Vec<_> = connections
            .values()
            .filter(|connection| Some(connection.id()) != exclude)
            .cloned()
            .collect();
        snapshot.sort_by_key(|connection| connection.id());
        snapshot
    }

    pub async fn contains(&self, id: ConnectionId) -> bool {
        self.connections.lock().await.contains_key(&id)
    }

    pub async fn len(&self) -> usize {
        self.connections.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
