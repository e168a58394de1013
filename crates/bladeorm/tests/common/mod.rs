//! Recording in-memory connection pool for integration tests.

#![allow(dead_code)]

use bladeorm::{
    Client, ClientConfig, Column, Connection, ConnectionPool, Entity, EntityShape, OrmError,
    OrmResult, Record, Value,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

/// Canned response for the next statement.
#[derive(Debug, Clone)]
pub enum Response {
    Rows(Vec<Record>),
    Affected(u64),
}

#[derive(Default)]
struct State {
    statements: Vec<(String, Vec<Value>)>,
    responses: VecDeque<Response>,
    fail_next: Option<String>,
    acquired: usize,
    released: usize,
    closed: bool,
}

/// Pool that records every statement and replays queued responses.
///
/// Without a queued response, `execute` reports one affected row and
/// `fetch` returns no rows.
#[derive(Clone, Default)]
pub struct MockPool {
    state: Arc<Mutex<State>>,
}

impl MockPool {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("mock pool poisoned")
    }

    pub fn queue_rows(&self, rows: Vec<Record>) {
        self.lock().responses.push_back(Response::Rows(rows));
    }

    pub fn queue_affected(&self, n: u64) {
        self.lock().responses.push_back(Response::Affected(n));
    }

    /// Make the next statement fail with `OrmError::Other(message)`.
    pub fn fail_next(&self, message: &str) {
        self.lock().fail_next = Some(message.to_string());
    }

    pub fn statements(&self) -> Vec<(String, Vec<Value>)> {
        self.lock().statements.clone()
    }

    pub fn statement_count(&self) -> usize {
        self.lock().statements.len()
    }

    pub fn last(&self) -> (String, Vec<Value>) {
        self.lock()
            .statements
            .last()
            .cloned()
            .expect("no statement executed")
    }

    pub fn acquired(&self) -> usize {
        self.lock().acquired
    }

    pub fn released(&self) -> usize {
        self.lock().released
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

pub struct MockConnection {
    state: Arc<Mutex<State>>,
}

impl MockConnection {
    fn record(&self, sql: &str, params: &[Value]) -> OrmResult<Option<Response>> {
        let mut state = self.state.lock().expect("mock pool poisoned");
        state.statements.push((sql.to_string(), params.to_vec()));
        if let Some(message) = state.fail_next.take() {
            return Err(OrmError::Other(message));
        }
        Ok(state.responses.pop_front())
    }
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.released += 1;
        }
    }
}

impl Connection for MockConnection {
    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        match self.record(sql, params)? {
            Some(Response::Affected(n)) => Ok(n),
            Some(Response::Rows(rows)) => Ok(rows.len() as u64),
            None => Ok(1),
        }
    }

    async fn fetch(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Record>> {
        match self.record(sql, params)? {
            Some(Response::Rows(rows)) => Ok(rows),
            Some(Response::Affected(_)) | None => Ok(Vec::new()),
        }
    }
}

impl ConnectionPool for MockPool {
    type Connection = MockConnection;

    async fn acquire(&self) -> OrmResult<MockConnection> {
        let mut state = self.lock();
        if state.closed {
            return Err(OrmError::Connection("pool is closed".into()));
        }
        state.acquired += 1;
        Ok(MockConnection {
            state: Arc::clone(&self.state),
        })
    }

    fn close(&self) {
        self.lock().closed = true;
    }
}

pub fn client() -> (MockPool, Client<MockPool>) {
    let pool = MockPool::new();
    let client = Client::new(pool.clone(), ClientConfig::default());
    (pool, client)
}

/// `Person { name: text primary key, age: integer }`
pub fn person(client: &mut Client<MockPool>) -> Entity<MockPool> {
    client
        .register(
            EntityShape::new("Person")
                .column("name", Column::text().primary_key())
                .column("age", Column::integer()),
        )
        .expect("register Person")
}

pub fn person_row(name: &str, age: i64) -> Record {
    Record::new().with("name", name).with("age", age)
}

pub fn text(s: &str) -> Value {
    Value::from(s)
}
