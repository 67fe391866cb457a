//! In-memory executor for exercising mappers without a database.

use crate::executor::{DriverError, MapperExecutor, Row};
use crate::query::statement::Statement;
use sea_query::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Default)]
struct State {
    statements: Vec<Statement>,
    rows: VecDeque<Vec<Row>>,
    affected: VecDeque<u64>,
    last_insert_id: Option<Value>,
    fail_next: Option<DriverError>,
}

/// Captures every statement and replays queued results
///
/// Queries pop the next queued row set (empty when none is queued), writes
/// pop the next affected-row count (1 when none is queued).
#[derive(Default)]
pub struct RecordingExecutor {
    state: Mutex<State>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows returned by the next query
    pub fn push_rows(&self, rows: Vec<Row>) {
        self.lock().rows.push_back(rows);
    }

    /// Affected-row count returned by the next write
    pub fn push_affected(&self, affected: u64) {
        self.lock().affected.push_back(affected);
    }

    pub fn set_last_insert_id(&self, id: impl Into<Value>) {
        self.lock().last_insert_id = Some(id.into());
    }

    /// Make the next statement fail with `error`
    pub fn fail_next(&self, error: DriverError) {
        self.lock().fail_next = Some(error);
    }

    /// Statements seen so far, in execution order
    pub fn statements(&self) -> Vec<Statement> {
        self.lock().statements.clone()
    }

    pub fn last_statement(&self) -> Option<Statement> {
        self.lock().statements.last().cloned()
    }

    pub fn clear(&self) {
        *self.lock() = State::default();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        // a panicking test must not poison the others
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, statement: &Statement) -> Result<(), DriverError> {
        let mut state = self.lock();
        state.statements.push(statement.clone());
        match state.fail_next.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl MapperExecutor for RecordingExecutor {
    fn execute(&self, statement: &Statement) -> Result<u64, DriverError> {
        self.record(statement)?;
        Ok(self.lock().affected.pop_front().unwrap_or(1))
    }

    fn query_all(&self, statement: &Statement) -> Result<Vec<Row>, DriverError> {
        self.record(statement)?;
        Ok(self.lock().rows.pop_front().unwrap_or_default())
    }

    fn last_insert_id(&self) -> Result<Option<Value>, DriverError> {
        Ok(self.lock().last_insert_id.clone())
    }
}
