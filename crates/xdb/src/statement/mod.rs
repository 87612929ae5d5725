//! Fluent statement builder.
//!
//! A [`Statement`] accumulates clause fragments, renders them into SQL with named
//! `${token}` placeholders, rewrites those into the driver's positional placeholders
//! and executes through a [`Querier`].
//!
//! # Example
//!
//! ```ignore
//! let mut q = db.query();
//! q.select("id, user_name")
//!     .from("users")
//!     .where_("age > ${min_age}")
//!     .or()
//!     .where_("vip = ${vip}")
//!     .order_by("id DESC");
//! q.reflect_args(&filter);
//!
//! let users: Vec<User> = q.fetch_all_as().await?;
//! ```
//!
//! The first call that needs executable SQL (`build`, `reflect_args`, `prepare` or any
//! execution) renders and parses the statement once. From then on the parsed SQL is
//! authoritative: later clause calls change [`Statement::to_sql`] but not what executes.
//!
//! A statement is single-use state; it is not meant to be shared between tasks.
//! Independent statements may run concurrently against the same querier when the
//! querier allows it.

mod exec;

#[cfg(test)]
mod tests;

use crate::arg::{Arg, ToArg};
use crate::clause::{self, Clauses, ConditionTarget, Fragment, StatementKind};
use crate::config::DbConfig;
use crate::driver::Querier;
use crate::logger::SqlLogger;
use crate::reflect::ArgSource;
use crate::token::{ParsedSql, parse_tokens};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// A mutable, single-use SQL statement bound to a querier.
pub struct Statement<'q, Q: Querier> {
    querier: &'q Q,
    config: Arc<DbConfig>,
    logger: Option<Arc<dyn SqlLogger>>,
    clauses: Clauses,
    raw: Option<String>,
    compiled: Option<ParsedSql>,
    args: Vec<Arg>,
    prepared: Option<Q::Prepared>,
}

impl<'q, Q: Querier> Statement<'q, Q> {
    /// Create an empty statement with the default configuration.
    pub fn new(querier: &'q Q) -> Self {
        Self::with_config(querier, Arc::default())
    }

    pub fn with_config(querier: &'q Q, config: Arc<DbConfig>) -> Self {
        Self {
            querier,
            config,
            logger: None,
            clauses: Clauses::default(),
            raw: None,
            compiled: None,
            args: Vec::new(),
            prepared: None,
        }
    }

    /// Log every execution of this statement through `logger`.
    pub fn logger(&mut self, logger: Arc<dyn SqlLogger>) -> &mut Self {
        self.logger = Some(logger);
        self
    }

    pub(crate) fn set_logger(&mut self, logger: Option<Arc<dyn SqlLogger>>) {
        self.logger = logger;
    }

    pub fn querier(&self) -> &'q Q {
        self.querier
    }

    pub fn kind(&self) -> StatementKind {
        self.clauses.kind()
    }

    // ==================== SELECT ====================

    /// Append to the select list and make this a SELECT.
    pub fn select(&mut self, columns: impl Into<String>) -> &mut Self {
        clause::push(&mut self.clauses.select, columns);
        self.clauses.kind = StatementKind::Select;
        self
    }

    /// Like [`select`](Self::select), rendering `SELECT DISTINCT`.
    pub fn select_distinct(&mut self, columns: impl Into<String>) -> &mut Self {
        self.clauses.distinct = true;
        self.select(columns)
    }

    pub fn from(&mut self, tables: impl Into<String>) -> &mut Self {
        clause::push(&mut self.clauses.tables, tables);
        self
    }

    pub fn join(&mut self, join: impl Into<String>) -> &mut Self {
        clause::push(&mut self.clauses.join, join);
        self
    }

    pub fn inner_join(&mut self, join: impl Into<String>) -> &mut Self {
        clause::push(&mut self.clauses.inner_join, join);
        self
    }

    pub fn outer_join(&mut self, join: impl Into<String>) -> &mut Self {
        clause::push(&mut self.clauses.outer_join, join);
        self
    }

    /// Append a `LEFT OUTER JOIN` fragment.
    pub fn left_join(&mut self, join: impl Into<String>) -> &mut Self {
        clause::push(&mut self.clauses.left_outer_join, join);
        self
    }

    /// Append a `RIGHT OUTER JOIN` fragment.
    pub fn right_join(&mut self, join: impl Into<String>) -> &mut Self {
        clause::push(&mut self.clauses.right_outer_join, join);
        self
    }

    /// Append a WHERE predicate.
    ///
    /// Predicates are joined with `and` inside one parenthesized group. The returned
    /// [`Condition`] can break the group with [`Condition::and`] or [`Condition::or`].
    pub fn where_(&mut self, predicate: impl Into<String>) -> Condition<'_, 'q, Q> {
        self.condition(ConditionTarget::Where, predicate)
    }

    /// Append a HAVING predicate; grouping works as for [`where_`](Self::where_).
    pub fn having(&mut self, predicate: impl Into<String>) -> Condition<'_, 'q, Q> {
        self.condition(ConditionTarget::Having, predicate)
    }

    fn condition(
        &mut self,
        target: ConditionTarget,
        predicate: impl Into<String>,
    ) -> Condition<'_, 'q, Q> {
        clause::push(self.clauses.conditions_mut(target), predicate);
        Condition { stmt: self, target }
    }

    pub fn group_by(&mut self, group: impl Into<String>) -> &mut Self {
        clause::push(&mut self.clauses.group_by, group);
        self
    }

    pub fn order_by(&mut self, order: impl Into<String>) -> &mut Self {
        clause::push(&mut self.clauses.order_by, order);
        self
    }

    /// Append to the LIMIT clause. Fragments are concatenated as given, so
    /// `limit("10").limit(" OFFSET 20")` renders `LIMIT 10 OFFSET 20`.
    pub fn limit(&mut self, limit: impl Into<String>) -> &mut Self {
        clause::push(&mut self.clauses.limit, limit);
        self
    }

    // ==================== UPDATE / DELETE / INSERT ====================

    /// Make this an UPDATE of `table`.
    pub fn update(&mut self, table: impl Into<String>) -> &mut Self {
        clause::push(&mut self.clauses.tables, table);
        self.clauses.kind = StatementKind::Update;
        self
    }

    /// Append a `col = expr` assignment.
    pub fn set(&mut self, assignment: impl Into<String>) -> &mut Self {
        clause::push(&mut self.clauses.sets, assignment);
        self
    }

    /// Make this a DELETE from `table`.
    pub fn delete_from(&mut self, table: impl Into<String>) -> &mut Self {
        clause::push(&mut self.clauses.tables, table);
        self.clauses.kind = StatementKind::Delete;
        self
    }

    /// Make this an INSERT into `table`.
    pub fn insert_into(&mut self, table: impl Into<String>) -> &mut Self {
        clause::push(&mut self.clauses.tables, table);
        self.clauses.kind = StatementKind::Insert;
        self
    }

    pub fn columns(&mut self, columns: impl Into<String>) -> &mut Self {
        clause::push(&mut self.clauses.columns, columns);
        self
    }

    pub fn values(&mut self, values: impl Into<String>) -> &mut Self {
        clause::push(&mut self.clauses.values, values);
        self
    }

    /// Use `sql` verbatim instead of the structured clauses. An empty string
    /// restores clause rendering.
    pub fn sql(&mut self, sql: impl Into<String>) -> &mut Self {
        let sql = sql.into();
        self.raw = (!sql.is_empty()).then_some(sql);
        self
    }

    // ==================== Rendering ====================

    /// The statement text with named tokens still in place.
    pub fn to_sql(&self) -> String {
        match &self.raw {
            Some(raw) => raw.clone(),
            None => self.clauses.render(),
        }
    }

    /// Render and parse the statement, once.
    ///
    /// Repeated calls return the memoized result even if clauses were added since.
    pub fn build(&mut self) -> &ParsedSql {
        let compiled = match self.compiled.take() {
            Some(compiled) => compiled,
            None => {
                let placeholder = self.config.resolve_placeholder(self.querier.placeholder());
                parse_tokens(&self.to_sql(), &self.config.token_syntax, placeholder)
            }
        };
        self.compiled.insert(compiled)
    }

    /// The parsed form, if the statement has been built.
    pub fn parsed(&self) -> Option<&ParsedSql> {
        self.compiled.as_ref()
    }

    fn compiled_sql(&self) -> &str {
        self.compiled
            .as_ref()
            .map(|parsed| parsed.sql.as_str())
            .unwrap_or_default()
    }

    // ==================== Arguments ====================

    /// Set the positional arguments verbatim, bypassing token resolution.
    ///
    /// Count and order must match the placeholders of the built SQL.
    pub fn args<I>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        self.args = args.into_iter().map(|arg| arg.to_arg()).collect();
        self
    }

    /// Append one positional argument.
    pub fn bind(&mut self, value: impl ToArg) -> &mut Self {
        self.args.push(value.to_arg());
        self
    }

    /// Build, then bind one argument per token from `source`.
    ///
    /// Sequences (`Vec<Arg>`, slices, JSON arrays) are used verbatim. Maps and
    /// `#[derive(ToArgs)]` structs are looked up token by token; a token the source
    /// cannot resolve binds `NULL`.
    pub fn reflect_args<S: ArgSource + ?Sized>(&mut self, source: &S) -> &mut Self {
        let args = source.resolve_args(&self.build().tokens);
        self.args = args;
        self
    }

    /// The positional arguments that the next execution will send.
    pub fn bound_args(&self) -> &[Arg] {
        &self.args
    }
}

impl<Q: Querier> fmt::Display for Statement<'_, Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

impl<Q: Querier> fmt::Debug for Statement<'_, Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Statement")
            .field("sql", &self.to_sql())
            .field("compiled", &self.compiled)
            .field("args", &self.args)
            .field("prepared", &self.prepared.is_some())
            .finish()
    }
}

/// The predicate list a `where_` or `having` call appended to.
///
/// [`and`](Self::and) and [`or`](Self::or) close the current parenthesized group of
/// that list and open a new one:
///
/// ```ignore
/// q.where_("a").where_("b").or().where_("c");
/// // WHERE (a and b) \n or (c)
/// ```
///
/// Every other builder method is reachable through `Deref`.
pub struct Condition<'s, 'q, Q: Querier> {
    stmt: &'s mut Statement<'q, Q>,
    target: ConditionTarget,
}

impl<'s, 'q, Q: Querier> Condition<'s, 'q, Q> {
    /// Start a new group joined with `and`.
    pub fn and(self) -> &'s mut Statement<'q, Q> {
        self.push_break(Fragment::AndBreak)
    }

    /// Start a new group joined with `or`.
    pub fn or(self) -> &'s mut Statement<'q, Q> {
        self.push_break(Fragment::OrBreak)
    }

    pub fn where_(self, predicate: impl Into<String>) -> Condition<'s, 'q, Q> {
        self.stmt.condition(ConditionTarget::Where, predicate)
    }

    pub fn having(self, predicate: impl Into<String>) -> Condition<'s, 'q, Q> {
        self.stmt.condition(ConditionTarget::Having, predicate)
    }

    /// Return to the statement.
    pub fn end(self) -> &'s mut Statement<'q, Q> {
        self.stmt
    }

    pub fn target(&self) -> ConditionTarget {
        self.target
    }

    fn push_break(self, fragment: Fragment) -> &'s mut Statement<'q, Q> {
        self.stmt
            .clauses
            .conditions_mut(self.target)
            .push(fragment);
        self.stmt
    }
}

impl<'q, Q: Querier> Deref for Condition<'_, 'q, Q> {
    type Target = Statement<'q, Q>;

    fn deref(&self) -> &Self::Target {
        &*self.stmt
    }
}

impl<Q: Querier> DerefMut for Condition<'_, '_, Q> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.stmt
    }
}
