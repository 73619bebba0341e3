//! In-memory DataReader server.
//!
//! Mirrors the server side of the polling protocol closely enough to drive
//! a reader end to end: sessions, subscriptions, per-session change queues
//! and a snapshot resent on every subscribe.

use nosqlreader_protocol::{
    BatchWriter, GreetingResponse, OwnedSyncEvent, SyncEventType,
};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use uuid::Uuid;

#[derive(Debug, Default)]
struct SessionState {
    tables: Vec<String>,
    pending: VecDeque<OwnedSyncEvent>,
    raw: VecDeque<Vec<u8>>,
}

#[derive(Debug, Default)]
struct ServerState {
    sessions: HashMap<String, SessionState>,
    snapshots: HashMap<String, Vec<u8>>,
    greetings: Vec<(String, String)>,
    subscriptions: Vec<(String, String)>,
    fail_greetings: usize,
    fail_subscribes: usize,
    fail_get_changes: usize,
}

/// A fake DataReader server.
///
/// Errors are returned as strings, the way an HTTP client would surface
/// them.
#[derive(Debug)]
pub struct FakeDataReaderServer {
    state: Mutex<ServerState>,
    max_batch_events: usize,
}

impl FakeDataReaderServer {
    /// Creates a server with no tables and no sessions.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ServerState::default()),
            max_batch_events: 64,
        }
    }

    /// Limits how many events one `get_changes` call returns.
    pub fn with_max_batch_events(mut self, max: usize) -> Self {
        self.max_batch_events = max.max(1);
        self
    }

    /// Sets the snapshot sent as `InitTable` when a session subscribes.
    pub fn set_snapshot(&self, table: &str, payload: Vec<u8>) {
        self.state
            .lock()
            .snapshots
            .insert(table.to_string(), payload);
    }

    /// Queues an event for every session subscribed to its table.
    ///
    /// An `InitTable` event also replaces the stored snapshot. Returns the
    /// number of sessions reached.
    pub fn publish(&self, event: OwnedSyncEvent) -> usize {
        let mut state = self.state.lock();
        if event.event_type == SyncEventType::InitTable {
            state
                .snapshots
                .insert(event.table_name.clone(), event.payload.clone());
        }

        let mut reached = 0;
        for session in state.sessions.values_mut() {
            if session.tables.contains(&event.table_name) {
                session.pending.push_back(event.clone());
                reached += 1;
            }
        }
        reached
    }

    /// Queues raw bytes returned verbatim by the session's next fetch.
    ///
    /// Returns false if the session does not exist.
    pub fn push_raw(&self, session_id: &str, body: Vec<u8>) -> bool {
        match self.state.lock().sessions.get_mut(session_id) {
            Some(session) => {
                session.raw.push_back(body);
                true
            }
            None => false,
        }
    }

    /// Forgets a session, as if it expired on the server.
    pub fn drop_session(&self, session_id: &str) -> bool {
        self.state.lock().sessions.remove(session_id).is_some()
    }

    /// Makes the next `n` greetings fail.
    pub fn fail_next_greetings(&self, n: usize) {
        self.state.lock().fail_greetings = n;
    }

    /// Makes the next `n` subscribe calls fail.
    pub fn fail_next_subscribes(&self, n: usize) {
        self.state.lock().fail_subscribes = n;
    }

    /// Makes the next `n` change fetches fail.
    pub fn fail_next_get_changes(&self, n: usize) {
        self.state.lock().fail_get_changes = n;
    }

    /// Opens a session.
    ///
    /// # Errors
    ///
    /// Fails when a greeting failure was injected.
    pub fn greeting(&self, app_name: &str, app_version: &str) -> Result<String, String> {
        let mut state = self.state.lock();
        state
            .greetings
            .push((app_name.to_string(), app_version.to_string()));
        if take_failure(&mut state.fail_greetings) {
            return Err("greeting unavailable".into());
        }

        let session_id = Uuid::new_v4().to_string();
        state
            .sessions
            .insert(session_id.clone(), SessionState::default());
        Ok(session_id)
    }

    /// Subscribes a session to a table and queues the table snapshot.
    ///
    /// # Errors
    ///
    /// Fails for unknown sessions or when a subscribe failure was injected.
    pub fn subscribe(&self, session_id: &str, table: &str) -> Result<(), String> {
        let mut state = self.state.lock();
        state
            .subscriptions
            .push((session_id.to_string(), table.to_string()));
        if take_failure(&mut state.fail_subscribes) {
            return Err("subscribe unavailable".into());
        }

        let snapshot = state.snapshots.get(table).cloned().unwrap_or_default();
        let session = state
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| format!("unknown session {session_id}"))?;
        if !session.tables.iter().any(|t| t == table) {
            session.tables.push(table.to_string());
        }
        session.pending.push_back(OwnedSyncEvent::new(
            table,
            SyncEventType::InitTable,
            snapshot,
        ));
        Ok(())
    }

    /// Returns the next change batch for a session.
    ///
    /// Raw bodies queued with [`push_raw`](Self::push_raw) come first. An
    /// empty batch means nothing changed.
    ///
    /// # Errors
    ///
    /// Fails for unknown sessions or when a fetch failure was injected.
    pub fn get_changes(&self, session_id: &str) -> Result<Vec<u8>, String> {
        let mut state = self.state.lock();
        if take_failure(&mut state.fail_get_changes) {
            return Err("connection reset".into());
        }

        let session = state
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| format!("unknown session {session_id}"))?;
        if let Some(raw) = session.raw.pop_front() {
            return Ok(raw);
        }

        let mut writer = BatchWriter::new();
        while writer.len() < self.max_batch_events {
            let Some(event) = session.pending.pop_front() else {
                break;
            };
            writer.push(&event.as_event()).map_err(|e| e.to_string())?;
        }
        Ok(writer.finish())
    }

    /// Routes an HTTP-style call: `path` is `/DataReader/<Action>`.
    ///
    /// # Errors
    ///
    /// Returns `404`-style errors for unknown paths and `400`-style errors
    /// for missing parameters, plus any error of the routed call.
    pub fn handle_post(
        &self,
        path: &str,
        query: &[(&str, String)],
        session: Option<&str>,
    ) -> Result<Vec<u8>, String> {
        let param = |name: &str| {
            query
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.as_str())
                .ok_or_else(|| format!("400: missing query parameter {name}"))
        };
        let session = || session.ok_or_else(|| "400: missing session header".to_string());

        match path {
            "/DataReader/Greeting" => {
                let session_id = self.greeting(param("name")?, param("version")?)?;
                GreetingResponse::new(session_id)
                    .to_json()
                    .map_err(|e| e.to_string())
            }
            "/DataReader/Subscribe" => {
                self.subscribe(session()?, param("tableName")?)?;
                Ok(Vec::new())
            }
            "/DataReader/GetChanges" => self.get_changes(session()?),
            other => Err(format!("404: {other}")),
        }
    }

    /// Every greeting received, as `(app_name, app_version)`.
    pub fn greetings(&self) -> Vec<(String, String)> {
        self.state.lock().greetings.clone()
    }

    /// Every subscribe call received, as `(session, table)`.
    pub fn subscriptions(&self) -> Vec<(String, String)> {
        self.state.lock().subscriptions.clone()
    }

    /// Ids of live sessions.
    pub fn sessions(&self) -> Vec<String> {
        self.state.lock().sessions.keys().cloned().collect()
    }

    /// Events waiting for a session.
    pub fn pending_events(&self, session_id: &str) -> usize {
        self.state
            .lock()
            .sessions
            .get(session_id)
            .map_or(0, |s| s.pending.len())
    }
}

impl Default for FakeDataReaderServer {
    fn default() -> Self {
        Self::new()
    }
}

fn take_failure(counter: &mut usize) -> bool {
    if *counter > 0 {
        *counter -= 1;
        true
    } else {
        false
    }
}
