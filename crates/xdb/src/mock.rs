//! Scripted in-memory querier for unit tests.

use crate::arg::Arg;
use crate::driver::{Cursor, ExecResult, Querier};
use crate::error::XdbResult;
use crate::token::Placeholder;
use crate::value::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

/// One call the querier received.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Call {
    pub kind: &'static str,
    pub sql: String,
    pub args: Vec<Arg>,
}

#[derive(Debug, Default)]
pub(crate) struct ScriptedCursor {
    columns: Vec<String>,
    rows: VecDeque<Vec<Value>>,
}

impl ScriptedCursor {
    pub fn new(columns: &[&str], rows: &[&[Option<&str>]]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|v| Value::from(*v)).collect())
                .collect(),
        }
    }
}

impl Cursor for ScriptedCursor {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    async fn next_row(&mut self) -> XdbResult<Option<Vec<Value>>> {
        Ok(self.rows.pop_front())
    }
}

#[derive(Debug, Default)]
pub(crate) struct ScriptedQuerier {
    pub placeholder: Placeholder,
    pub calls: Mutex<Vec<Call>>,
    pub results: Mutex<VecDeque<ScriptedCursor>>,
    pub closed: Mutex<Vec<String>>,
}

impl ScriptedQuerier {
    pub fn returning(cursor: ScriptedCursor) -> Self {
        let querier = Self::default();
        querier.results.lock().unwrap().push_back(cursor);
        querier
    }

    pub fn record(&self, kind: &'static str, sql: &str, args: &[Arg]) {
        self.calls.lock().unwrap().push(Call {
            kind,
            sql: sql.to_string(),
            args: args.to_vec(),
        });
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn next_cursor(&self) -> ScriptedCursor {
        self.results.lock().unwrap().pop_front().unwrap_or_default()
    }
}

impl Querier for ScriptedQuerier {
    type Cursor = ScriptedCursor;
    type Prepared = String;

    fn placeholder(&self) -> Placeholder {
        self.placeholder
    }

    async fn exec(&self, sql: &str, args: &[Arg]) -> XdbResult<ExecResult> {
        self.record("exec", sql, args);
        Ok(ExecResult::new(1))
    }

    async fn query(&self, sql: &str, args: &[Arg]) -> XdbResult<ScriptedCursor> {
        self.record("query", sql, args);
        Ok(self.next_cursor())
    }

    async fn prepare(&self, sql: &str) -> XdbResult<String> {
        self.record("prepare", sql, &[]);
        Ok(sql.to_string())
    }

    async fn exec_prepared(&self, stmt: &String, args: &[Arg]) -> XdbResult<ExecResult> {
        self.record("exec_prepared", stmt, args);
        Ok(ExecResult::new(2))
    }

    async fn query_prepared(&self, stmt: &String, args: &[Arg]) -> XdbResult<ScriptedCursor> {
        self.record("query_prepared", stmt, args);
        Ok(self.next_cursor())
    }

    async fn close_prepared(&self, stmt: String) -> XdbResult<()> {
        self.closed.lock().unwrap().push(stmt);
        Ok(())
    }
}
