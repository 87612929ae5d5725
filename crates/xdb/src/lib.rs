//! # xdb
//!
//! A fluent SQL statement builder with named placeholders, struct mapping and a thin
//! execution layer over any driver.
//!
//! ## Features
//!
//! - **Clause builder**: `select`, `from`, joins, `where_`/`having` groups, `group_by`,
//!   `order_by`, `limit`, `update`/`set`, `delete_from`, `insert_into`/`columns`/`values`,
//!   or verbatim SQL via `sql()`
//! - **Named tokens**: write `${name}` in any fragment; tokens become the driver's
//!   positional placeholders (`?` or `$n`) and arguments are bound by name
//! - **Argument reflection**: bind from maps, JSON objects or `#[derive(ToArgs)]` structs
//! - **Row mapping**: scan rows into `#[derive(FromRow)]` structs, including embedded
//!   structs, with lenient byte-level decoding
//! - **Driver-agnostic**: anything implementing [`Querier`] executes statements;
//!   `tokio-postgres` (and `deadpool-postgres` with the `pool` feature) ship built in
//!
//! ## Quick start
//!
//! ```ignore
//! use xdb::{Db, FromRow, ToArgs, TracingLogger};
//!
//! #[derive(Debug, Default, FromRow)]
//! struct User {
//!     #[xdb(col = "user_id")]
//!     id: i64,
//!     name: String,
//! }
//!
//! #[derive(ToArgs)]
//! struct Filter {
//!     min_id: i64,
//! }
//!
//! let db = Db::new(client).with_logger(TracingLogger::new());
//!
//! let mut q = db.query();
//! q.select("user_id, name").from("users").where_("user_id > ${min_id}");
//! q.reflect_args(&Filter { min_id: 10 });
//! let users: Vec<User> = q.fetch_all_as().await?;
//! ```

extern crate self as xdb;

mod arg;
mod clause;
mod config;
mod db;
mod decode;
mod driver;
mod error;
pub mod logger;
pub mod reflect;
mod statement;
mod token;
mod value;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(test)]
mod mock;

pub use arg::{Arg, ToArg};
pub use clause::{ConditionTarget, StatementKind};
pub use config::DbConfig;
pub use db::Db;
pub use decode::DecodeRaw;
pub use driver::{Cursor, ExecResult, Querier};
pub use error::{XdbError, XdbResult};
pub use logger::{NoopLogger, SqlLogger};
pub use reflect::{ArgSource, FieldInfo, FromRow, RowSlot, Serialized, ToArgs};
pub use statement::{Condition, Statement};
pub use token::{ParsedSql, Placeholder, TokenSyntax, parse_tokens};
pub use value::{Row, Value};

#[cfg(feature = "tracing")]
pub use logger::TracingLogger;

#[cfg(feature = "derive")]
pub use xdb_derive::{FromRow, ToArgs};

// Keep tokio-postgres reachable for users of the built-in adapter.
#[cfg(feature = "postgres")]
pub use tokio_postgres;

#[cfg(feature = "pool")]
pub use deadpool_postgres;
