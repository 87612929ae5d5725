//! SQL logging.
//!
//! A [`SqlLogger`] sees every statement right before it reaches the driver. It is
//! passed in through [`Db::with_logger`](crate::Db::with_logger) or
//! [`Statement::logger`](crate::Statement::logger); there is no global hook.

use crate::arg::Arg;

/// Receives the executed SQL and its positional arguments.
pub trait SqlLogger: Send + Sync {
    fn log(&self, sql: &str, args: &[Arg]);
}

impl<F> SqlLogger for F
where
    F: Fn(&str, &[Arg]) + Send + Sync,
{
    fn log(&self, sql: &str, args: &[Arg]) {
        self(sql, args)
    }
}

/// A logger that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl SqlLogger for NoopLogger {
    fn log(&self, _sql: &str, _args: &[Arg]) {}
}

/// Cut `sql` to at most `max_bytes`, backing off to a char boundary.
pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

#[cfg(feature = "tracing")]
pub use tracing_logger::TracingLogger;

#[cfg(feature = "tracing")]
mod tracing_logger {
    use super::{SqlLogger, truncate_sql_bytes};
    use crate::arg::Arg;
    use tracing::Level;

    /// Reports each statement xdb hands to the driver as a `tracing` event.
    ///
    /// Events go to target `xdb.sql` with the rewritten SQL (placeholders already in the
    /// driver's style), its byte length and the argument count. Bound values are left
    /// out unless [`with_args`](Self::with_args) is set, since they often carry user data.
    #[derive(Debug, Clone)]
    pub struct TracingLogger {
        level: Level,
        sql_limit: Option<usize>,
        with_args: bool,
    }

    impl Default for TracingLogger {
        fn default() -> Self {
            Self {
                level: Level::DEBUG,
                sql_limit: Some(200),
                with_args: false,
            }
        }
    }

    impl TracingLogger {
        /// `DEBUG` events, SQL cut at 200 bytes, no argument values.
        pub fn new() -> Self {
            Self::default()
        }

        pub fn level(mut self, level: Level) -> Self {
            self.level = level;
            self
        }

        /// Cut logged SQL after `bytes` bytes and mark the cut with `...`.
        pub fn max_sql_length(mut self, bytes: usize) -> Self {
            self.sql_limit = Some(bytes);
            self
        }

        pub fn no_truncate(mut self) -> Self {
            self.sql_limit = None;
            self
        }

        /// Include the bound argument values in each event.
        pub fn with_args(mut self, yes: bool) -> Self {
            self.with_args = yes;
            self
        }

        pub(crate) fn shown_sql(&self, sql: &str) -> String {
            match self.sql_limit {
                Some(limit) if sql.len() > limit => {
                    format!("{}...", truncate_sql_bytes(sql, limit))
                }
                _ => sql.to_string(),
            }
        }
    }

    impl SqlLogger for TracingLogger {
        fn log(&self, sql: &str, args: &[Arg]) {
            // tracing macros need the level as a constant.
            macro_rules! emit_at_level {
                ($level:expr, $($field:tt)*) => {
                    match $level {
                        Level::ERROR => tracing::error!($($field)*),
                        Level::WARN  => tracing::warn!($($field)*),
                        Level::INFO  => tracing::info!($($field)*),
                        Level::DEBUG => tracing::debug!($($field)*),
                        Level::TRACE => tracing::trace!($($field)*),
                    }
                };
            }

            let shown = self.shown_sql(sql);
            if self.with_args {
                emit_at_level!(
                    self.level,
                    target: "xdb.sql",
                    sql_len = sql.len(),
                    arg_count = args.len(),
                    args = ?args,
                    "{shown}"
                );
            } else {
                emit_at_level!(
                    self.level,
                    target: "xdb.sql",
                    sql_len = sql.len(),
                    arg_count = args.len(),
                    "{shown}"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_sql_bytes("SELECT 1", 100), "SELECT 1");
        assert_eq!(truncate_sql_bytes("SELECT 1", 6), "SELECT");
        // 'é' is two bytes; cutting inside it backs off.
        assert_eq!(truncate_sql_bytes("é", 1), "");
    }

    #[test]
    fn closures_are_loggers() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let logger = move |sql: &str, args: &[Arg]| {
            sink.lock().unwrap().push((sql.to_string(), args.len()));
        };
        logger.log("SELECT ?", &[Arg::Int(1)]);
        NoopLogger.log("ignored", &[]);
        assert_eq!(*seen.lock().unwrap(), vec![("SELECT ?".to_string(), 1)]);
    }

    #[cfg(feature = "tracing")]
    #[test]
    fn tracing_logger_shortens_long_sql() {
        let logger = TracingLogger::new().max_sql_length(6);
        assert_eq!(logger.shown_sql("SELECT 1"), "SELECT...");
        assert_eq!(logger.shown_sql("SELECT"), "SELECT");
        assert_eq!(logger.no_truncate().shown_sql("SELECT 1"), "SELECT 1");
    }

    #[cfg(feature = "tracing")]
    #[test]
    fn tracing_logger_logs_without_a_subscriber() {
        let logger = TracingLogger::new().level(tracing::Level::TRACE).with_args(true);
        logger.log("SELECT $1", &[Arg::Text("secret".into())]);
        TracingLogger::new().log("SELECT 1", &[]);
    }
}
