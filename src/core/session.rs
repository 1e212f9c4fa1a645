//! Connection/session management.
//!
//! Every client connection moves through `Connecting -> Open -> Closing ->
//! Closed`. Requests are accepted and responses queued only while a
//! connection is `Open`. Each connection owns one outbound queue with a single
//! consumer (the transport writer), so at most one writer touches a
//! connection's output at a time.
//!
//! Responses on one connection are delivered in the order their requests
//! complete, not the order they arrived: a fast call issued after a slow one
//! is answered first. Callers correlate by request id.
//!
//! Closing a connection drops anything still queued for it and discards the
//! results of requests still in flight. Sessions are not resumable.
//!
//! The outbound queue is bounded. A client that stops reading until the queue
//! fills is moved to `Closing`; its transport then sees the end of the queue
//! and tears the connection down.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Notify, RwLock, mpsc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::protocol::Response;

/// Opaque connection identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// A fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an id received from a client (e.g. a `session_id` query value).
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw).ok().map(Self)
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Lifecycle state of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionState {
    /// Registered but the transport has not finished setting up.
    Connecting,
    /// Accepting requests and delivering responses.
    Open,
    /// Tearing down; nothing is accepted or delivered.
    Closing,
    /// Gone.
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closing => "closing",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Errors from the session layer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// No connection with this id is registered.
    #[error("Unknown connection: {0}")]
    UnknownConnection(ConnectionId),

    /// The connection exists but is not accepting requests.
    #[error("Connection {id} is {state}, not open")]
    NotOpen {
        /// The connection.
        id: ConnectionId,
        /// Its current state.
        state: ConnectionState,
    },

    /// The connection has stopped reading new requests.
    #[error("Connection {0} is no longer accepting requests")]
    Finished(ConnectionId),
}

struct Slot {
    state: ConnectionState,
    /// Sender half of the outbound queue; `None` once the queue is closed.
    outbound: Option<mpsc::Sender<Response>>,
    finished: bool,
}

/// A single client connection.
pub struct Connection {
    id: ConnectionId,
    slot: Mutex<Slot>,
    in_flight: AtomicUsize,
    idle: Notify,
}

impl Connection {
    fn new(id: ConnectionId, outbound: mpsc::Sender<Response>) -> Self {
        Self {
            id,
            slot: Mutex::new(Slot {
                state: ConnectionState::Connecting,
                outbound: Some(outbound),
                finished: false,
            }),
            in_flight: AtomicUsize::new(0),
            idle: Notify::new(),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The connection id.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.slot().state
    }

    /// Number of requests accepted but not yet answered.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    fn request_done(&self) {
        if self.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

/// Receiving half of a connection's outbound queue, owned by the transport.
pub struct Outbound {
    connection: Arc<Connection>,
    rx: mpsc::Receiver<Response>,
}

impl Outbound {
    /// Next response to write, or `None` once the connection is no longer
    /// open or its queue has been closed and drained.
    ///
    /// Anything still queued when the connection leaves `Open` is dropped.
    pub async fn recv(&mut self) -> Option<Response> {
        let response = self.rx.recv().await?;
        if self.connection.state() == ConnectionState::Open {
            Some(response)
        } else {
            debug!(
                "Dropping queued response for {} connection {}",
                self.connection.state(),
                self.connection.id
            );
            self.rx.close();
            None
        }
    }

    /// The connection this queue belongs to.
    pub fn connection_id(&self) -> ConnectionId {
        self.connection.id
    }
}

/// Ticket for one accepted request. Delivering or dropping it settles the
/// connection's in-flight count.
pub struct InFlight {
    connection: Arc<Connection>,
}

impl InFlight {
    /// Queue the response on the originating connection.
    ///
    /// Returns `false` if the connection is no longer open and the response
    /// was dropped.
    pub fn deliver(self, response: Response) -> bool {
        let mut slot = self.connection.slot();
        let sent = match (slot.state, slot.outbound.as_ref()) {
            (ConnectionState::Open, Some(tx)) => Some(tx.try_send(response)),
            _ => None,
        };
        let delivered = match sent {
            Some(Ok(())) => true,
            Some(Err(TrySendError::Full(_))) => {
                warn!(
                    "Connection {} is not reading its responses; closing it",
                    self.connection.id
                );
                slot.state = ConnectionState::Closing;
                slot.outbound = None;
                false
            }
            Some(Err(TrySendError::Closed(_))) | None => false,
        };
        if !delivered {
            debug!(
                "Discarding response for {} connection {}",
                slot.state, self.connection.id
            );
        }
        delivered
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.connection.request_done();
    }
}

/// Tracks open connections and routes responses back to them.
#[derive(Debug)]
pub struct SessionManager {
    connections: RwLock<HashMap<ConnectionId, Arc<Connection>>>,
    outbound_capacity: usize,
}

/// Responses that may wait on one connection before it is considered stalled.
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 1024;

impl Default for SessionManager {
    fn default() -> Self {
        Self::with_outbound_capacity(DEFAULT_OUTBOUND_CAPACITY)
    }
}

impl SessionManager {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty manager whose connections queue at most `capacity`
    /// undelivered responses.
    pub fn with_outbound_capacity(capacity: usize) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            outbound_capacity: capacity.max(1),
        }
    }

    /// Register a new connection in `Connecting` state.
    pub async fn connect(&self) -> (ConnectionId, Outbound) {
        let id = ConnectionId::new();
        let (tx, rx) = mpsc::channel(self.outbound_capacity);
        let connection = Arc::new(Connection::new(id, tx));

        self.connections
            .write()
            .await
            .insert(id, Arc::clone(&connection));
        debug!("Connection {} registered", id);

        (id, Outbound { connection, rx })
    }

    /// Move a connection from `Connecting` to `Open`.
    pub async fn open(&self, id: ConnectionId) -> Result<(), SessionError> {
        let connection = self.get(id).await?;
        let mut slot = connection.slot();
        match slot.state {
            ConnectionState::Connecting => {
                slot.state = ConnectionState::Open;
                info!("Connection {} open", id);
                Ok(())
            }
            ConnectionState::Open => Ok(()),
            state => Err(SessionError::NotOpen { id, state }),
        }
    }

    /// Accept a request on a connection, returning the ticket used to answer it.
    pub async fn accept(&self, id: ConnectionId) -> Result<InFlight, SessionError> {
        let connection = self.get(id).await?;
        {
            let slot = connection.slot();
            if slot.state != ConnectionState::Open {
                return Err(SessionError::NotOpen {
                    id,
                    state: slot.state,
                });
            }
            if slot.finished {
                return Err(SessionError::Finished(id));
            }
            connection.in_flight.fetch_add(1, Ordering::SeqCst);
        }
        Ok(InFlight { connection })
    }

    /// Stop accepting requests on a connection while letting in-flight ones
    /// finish. Once the last response is queued the outbound queue closes, so
    /// the transport drains what is left and then sees the end.
    pub async fn finish(&self, id: ConnectionId) -> Result<(), SessionError> {
        let connection = self.get(id).await?;
        connection.slot().finished = true;
        self.wait_idle(id).await?;
        connection.slot().outbound = None;
        debug!("Connection {} finished", id);
        Ok(())
    }

    /// Wait until a connection has no request in flight.
    pub async fn wait_idle(&self, id: ConnectionId) -> Result<(), SessionError> {
        let connection = self.get(id).await?;
        loop {
            let notified = connection.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if connection.in_flight() == 0 {
                return Ok(());
            }
            notified.await;
        }
    }

    /// Close a connection, dropping queued responses and abandoning
    /// in-flight requests. Closing an unknown connection is a no-op.
    pub async fn close(&self, id: ConnectionId) {
        let Some(connection) = self.connections.write().await.remove(&id) else {
            return;
        };

        {
            let mut slot = connection.slot();
            slot.state = ConnectionState::Closing;
            slot.outbound = None;
        }

        let abandoned = connection.in_flight();
        if abandoned > 0 {
            warn!(
                "Connection {} closed with {} request(s) in flight; results will be discarded",
                id, abandoned
            );
        }

        connection.slot().state = ConnectionState::Closed;
        info!("Connection {} closed", id);
    }

    /// State of a connection, or `None` if it is not registered.
    pub async fn state(&self, id: ConnectionId) -> Option<ConnectionState> {
        self.connections
            .read()
            .await
            .get(&id)
            .map(|c| c.state())
    }

    /// Number of registered connections.
    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    /// True when no connection is registered.
    pub async fn is_empty(&self) -> bool {
        self.connections.read().await.is_empty()
    }

    async fn get(&self, id: ConnectionId) -> Result<Arc<Connection>, SessionError> {
        self.connections
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(SessionError::UnknownConnection(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::protocol::RequestId;
    use serde_json::json;
    use std::time::Duration;

    fn response(id: i64) -> Response {
        Response::success(RequestId::from(id), json!(id))
    }

    #[tokio::test]
    async fn test_lifecycle() {
        let sessions = SessionManager::new();
        let (id, _outbound) = sessions.connect().await;
        assert_eq!(sessions.state(id).await, Some(ConnectionState::Connecting));

        sessions.open(id).await.unwrap();
        assert_eq!(sessions.state(id).await, Some(ConnectionState::Open));

        sessions.close(id).await;
        assert_eq!(sessions.state(id).await, None);
        assert!(sessions.is_empty().await);
    }

    #[tokio::test]
    async fn test_requests_rejected_until_open() {
        let sessions = SessionManager::new();
        let (id, _outbound) = sessions.connect().await;

        let err = sessions.accept(id).await.err().unwrap();
        assert_eq!(
            err,
            SessionError::NotOpen {
                id,
                state: ConnectionState::Connecting
            }
        );

        sessions.open(id).await.unwrap();
        assert!(sessions.accept(id).await.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_connection() {
        let sessions = SessionManager::new();
        let ghost = ConnectionId::new();
        assert_eq!(
            sessions.accept(ghost).await.err(),
            Some(SessionError::UnknownConnection(ghost))
        );
        // Closing twice or closing an unknown id is harmless.
        sessions.close(ghost).await;
    }

    #[tokio::test]
    async fn test_delivery_in_completion_order() {
        let sessions = SessionManager::new();
        let (id, mut outbound) = sessions.connect().await;
        sessions.open(id).await.unwrap();

        let first = sessions.accept(id).await.unwrap();
        let second = sessions.accept(id).await.unwrap();

        // The second request completes first and is delivered first.
        assert!(second.deliver(response(2)));
        assert!(first.deliver(response(1)));

        assert_eq!(outbound.recv().await.unwrap().id, Some(RequestId::from(2)));
        assert_eq!(outbound.recv().await.unwrap().id, Some(RequestId::from(1)));
    }

    #[tokio::test]
    async fn test_close_drops_queued_and_in_flight() {
        let sessions = SessionManager::new();
        let (id, mut outbound) = sessions.connect().await;
        sessions.open(id).await.unwrap();

        let queued = sessions.accept(id).await.unwrap();
        let pending = sessions.accept(id).await.unwrap();
        assert!(queued.deliver(response(1)));

        sessions.close(id).await;

        assert!(!pending.deliver(response(2)));
        assert!(outbound.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_in_flight_tracking() {
        let sessions = SessionManager::new();
        let (id, _outbound) = sessions.connect().await;
        sessions.open(id).await.unwrap();

        let ticket = sessions.accept(id).await.unwrap();
        assert_eq!(ticket.connection.in_flight(), 1);

        let waiter = {
            let connection = Arc::clone(&ticket.connection);
            tokio::spawn(async move {
                while connection.in_flight() > 0 {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
            })
        };
        drop(ticket);
        waiter.await.unwrap();
        sessions.wait_idle(id).await.unwrap();
    }

    #[tokio::test]
    async fn test_finish_drains_then_ends() {
        let sessions = Arc::new(SessionManager::new());
        let (id, mut outbound) = sessions.connect().await;
        sessions.open(id).await.unwrap();

        let ticket = sessions.accept(id).await.unwrap();
        let finisher = {
            let sessions = Arc::clone(&sessions);
            tokio::spawn(async move { sessions.finish(id).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(
            sessions.accept(id).await.err(),
            Some(SessionError::Finished(id))
        );

        assert!(ticket.deliver(response(9)));
        finisher.await.unwrap().unwrap();

        assert_eq!(outbound.recv().await.unwrap().id, Some(RequestId::from(9)));
        assert!(outbound.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_stalled_reader_closes_connection() {
        let sessions = SessionManager::with_outbound_capacity(2);
        let (id, mut outbound) = sessions.connect().await;
        sessions.open(id).await.unwrap();

        let tickets: Vec<_> = [
            sessions.accept(id).await.unwrap(),
            sessions.accept(id).await.unwrap(),
            sessions.accept(id).await.unwrap(),
        ]
        .into();
        let delivered: Vec<bool> = tickets
            .into_iter()
            .zip(1..)
            .map(|(ticket, n)| ticket.deliver(response(n)))
            .collect();

        assert_eq!(delivered, vec![true, true, false]);
        assert_eq!(sessions.state(id).await, Some(ConnectionState::Closing));
        assert!(sessions.accept(id).await.is_err());
        assert!(outbound.recv().await.is_none());

        sessions.close(id).await;
        assert!(sessions.is_empty().await);
    }

    #[test]
    fn test_connection_id_parse() {
        let id = ConnectionId::new();
        assert_eq!(ConnectionId::parse(&id.to_string()), Some(id));
        assert_eq!(ConnectionId::parse("not-a-uuid"), None);
    }
}
