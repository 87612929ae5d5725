//! Connection and transaction handles that hand out statements.

use crate::config::DbConfig;
use crate::driver::Querier;
use crate::logger::SqlLogger;
use crate::statement::Statement;
use std::fmt;
use std::sync::Arc;

/// A querier together with the configuration and logger its statements share.
///
/// # Example
///
/// ```ignore
/// let db = Db::new(client).with_logger(TracingLogger::new());
///
/// let mut q = db.query();
/// q.select("count(*)").from("users");
/// let count = q.value().await?.as_i64();
/// ```
pub struct Db<Q> {
    querier: Q,
    config: Arc<DbConfig>,
    logger: Option<Arc<dyn SqlLogger>>,
}

impl<Q: Querier> Db<Q> {
    pub fn new(querier: Q) -> Self {
        Self {
            querier,
            config: Arc::default(),
            logger: None,
        }
    }

    pub fn with_config(mut self, config: DbConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    /// Log every statement created from this handle.
    pub fn with_logger(mut self, logger: impl SqlLogger + 'static) -> Self {
        self.logger = Some(Arc::new(logger));
        self
    }

    /// Start a new, empty statement.
    pub fn query(&self) -> Statement<'_, Q> {
        let mut stmt = Statement::with_config(&self.querier, Arc::clone(&self.config));
        stmt.set_logger(self.logger.clone());
        stmt
    }

    pub fn querier(&self) -> &Q {
        &self.querier
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    pub fn into_inner(self) -> Q {
        self.querier
    }
}

impl<Q: fmt::Debug> fmt::Debug for Db<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Db")
            .field("querier", &self.querier)
            .field("config", &self.config)
            .field("logger", &self.logger.is_some())
            .finish()
    }
}

#[cfg(feature = "postgres")]
mod pg {
    use super::Db;
    use crate::error::XdbResult;
    use std::sync::Arc;

    impl Db<tokio_postgres::Client> {
        /// Open a transaction sharing this handle's configuration and logger.
        ///
        /// Dropping the returned handle without [`commit`](Db::commit) rolls back.
        pub async fn begin(&mut self) -> XdbResult<Db<tokio_postgres::Transaction<'_>>> {
            let config = Arc::clone(&self.config);
            let logger = self.logger.clone();
            let tx = self.querier.transaction().await?;
            Ok(Db {
                querier: tx,
                config,
                logger,
            })
        }
    }

    impl Db<tokio_postgres::Transaction<'_>> {
        pub async fn commit(self) -> XdbResult<()> {
            self.querier.commit().await?;
            Ok(())
        }

        pub async fn rollback(self) -> XdbResult<()> {
            self.querier.rollback().await?;
            Ok(())
        }
    }
}

/// Runs the given block inside a transaction of a `Db<tokio_postgres::Client>`.
///
/// - Begins a transaction via `$db.begin().await`.
/// - Commits on `Ok(_)`.
/// - Rolls back on `Err(_)`.
///
/// The block must evaluate to `xdb::XdbResult<T>`.
///
/// ```ignore
/// xdb::transaction!(&mut db, tx, {
///     let mut q = tx.query();
///     q.update("accounts").set("balance = balance - ${amount}").where_("id = ${id}");
///     q.reflect_args(&transfer).exec().await?;
///     Ok(())
/// })?;
/// ```
#[cfg(feature = "postgres")]
#[macro_export]
macro_rules! transaction {
    ($db:expr, $tx:ident, $body:block) => {{
        let $tx = ($db).begin().await?;

        let __xdb_tx_body_result = async { $body }.await;
        match __xdb_tx_body_result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(error) => match $tx.rollback().await {
                Ok(()) => Err(error),
                Err(rollback_err) => Err($crate::XdbError::Other(format!(
                    "{error} (rollback failed: {rollback_err})"
                ))),
            },
        }
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arg::Arg;
    use crate::mock::ScriptedQuerier;
    use crate::token::{Placeholder, TokenSyntax};
    use std::sync::Mutex;

    #[tokio::test]
    async fn statements_inherit_config_and_logger() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let db = Db::new(ScriptedQuerier::default())
            .with_config(
                DbConfig::new()
                    .token_syntax(TokenSyntax::new(":{", "}"))
                    .placeholder(Placeholder::Dollar),
            )
            .with_logger(move |sql: &str, _args: &[Arg]| {
                sink.lock().unwrap().push(sql.to_string());
            });

        let mut q = db.query();
        q.sql("SELECT * FROM t WHERE a = :{a} AND b = ${b}");
        q.args([1_i64]);
        q.exec().await.unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["SELECT * FROM t WHERE a = $1 AND b = ${b}"]
        );
        assert_eq!(db.querier().calls().len(), 1);
    }

    #[test]
    fn debug_hides_the_logger() {
        let db = Db::new(ScriptedQuerier::default())
            .with_config(DbConfig::new().placeholder(Placeholder::Dollar));
        assert_eq!(db.config().placeholder, Some(Placeholder::Dollar));
        assert!(format!("{db:?}").contains("logger: false"));
    }
}
