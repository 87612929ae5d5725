//! Driver abstraction the statement builder executes through.
//!
//! A [`Querier`] is a connection or an open transaction. Its cursors hand rows back
//! as owned [`Value`] lists, so nothing read from a cursor is invalidated when the
//! cursor advances.

use crate::arg::Arg;
use crate::error::XdbResult;
use crate::token::Placeholder;
use crate::value::Value;
use std::future::Future;

/// Result of a statement that does not return rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    rows_affected: u64,
    last_insert_id: Option<i64>,
}

impl ExecResult {
    pub fn new(rows_affected: u64) -> Self {
        Self {
            rows_affected,
            last_insert_id: None,
        }
    }

    /// Attach the id generated by the insert, for drivers that report one.
    pub fn with_last_insert_id(mut self, id: i64) -> Self {
        self.last_insert_id = Some(id);
        self
    }

    pub fn rows_affected(&self) -> u64 {
        self.rows_affected
    }

    /// `None` when the driver does not report generated ids (Postgres never does;
    /// use `RETURNING` and read the value instead).
    pub fn last_insert_id(&self) -> Option<i64> {
        self.last_insert_id
    }
}

/// A live result set.
///
/// Dropping the cursor releases it, on error paths included.
pub trait Cursor: Send {
    /// Column names in result order.
    fn columns(&self) -> &[String];

    /// Advance and return the next row, one value per column; `None` once exhausted.
    fn next_row(&mut self) -> impl Future<Output = XdbResult<Option<Vec<Value>>>> + Send;
}

/// A connection or transaction capable of executing SQL.
///
/// Prepared handles are per-querier and must not outlive it.
pub trait Querier: Send + Sync {
    type Cursor: Cursor;
    type Prepared: Send + Sync;

    /// The positional placeholder this driver expects.
    fn placeholder(&self) -> Placeholder {
        Placeholder::Question
    }

    /// Execute a statement and return its mutation result.
    fn exec(
        &self,
        sql: &str,
        args: &[Arg],
    ) -> impl Future<Output = XdbResult<ExecResult>> + Send;

    /// Execute a query and return a cursor over its rows.
    fn query(
        &self,
        sql: &str,
        args: &[Arg],
    ) -> impl Future<Output = XdbResult<Self::Cursor>> + Send;

    /// Prepare a statement for repeated execution.
    fn prepare(&self, sql: &str) -> impl Future<Output = XdbResult<Self::Prepared>> + Send;

    fn exec_prepared(
        &self,
        stmt: &Self::Prepared,
        args: &[Arg],
    ) -> impl Future<Output = XdbResult<ExecResult>> + Send;

    fn query_prepared(
        &self,
        stmt: &Self::Prepared,
        args: &[Arg],
    ) -> impl Future<Output = XdbResult<Self::Cursor>> + Send;

    /// Release a prepared statement.
    ///
    /// The default implementation drops the handle.
    fn close_prepared(&self, stmt: Self::Prepared) -> impl Future<Output = XdbResult<()>> + Send {
        drop(stmt);
        async { Ok(()) }
    }
}

impl<Q: Querier> Querier for &Q {
    type Cursor = Q::Cursor;
    type Prepared = Q::Prepared;

    fn placeholder(&self) -> Placeholder {
        (**self).placeholder()
    }

    fn exec(
        &self,
        sql: &str,
        args: &[Arg],
    ) -> impl Future<Output = XdbResult<ExecResult>> + Send {
        (**self).exec(sql, args)
    }

    fn query(
        &self,
        sql: &str,
        args: &[Arg],
    ) -> impl Future<Output = XdbResult<Self::Cursor>> + Send {
        (**self).query(sql, args)
    }

    fn prepare(&self, sql: &str) -> impl Future<Output = XdbResult<Self::Prepared>> + Send {
        (**self).prepare(sql)
    }

    fn exec_prepared(
        &self,
        stmt: &Self::Prepared,
        args: &[Arg],
    ) -> impl Future<Output = XdbResult<ExecResult>> + Send {
        (**self).exec_prepared(stmt, args)
    }

    fn query_prepared(
        &self,
        stmt: &Self::Prepared,
        args: &[Arg],
    ) -> impl Future<Output = XdbResult<Self::Cursor>> + Send {
        (**self).query_prepared(stmt, args)
    }

    fn close_prepared(&self, stmt: Self::Prepared) -> impl Future<Output = XdbResult<()>> + Send {
        (**self).close_prepared(stmt)
    }
}
