use super::Statement;
use crate::driver::{Cursor, ExecResult, Querier};
use crate::error::{XdbError, XdbResult};
use crate::reflect::{ColumnMap, FromRow, RowSlot};
use crate::value::{Row, Value};

impl<'q, Q: Querier> Statement<'q, Q> {
    fn log_sql(&self) {
        if let Some(logger) = &self.logger {
            logger.log(self.compiled_sql(), &self.args);
        }
    }

    // ==================== Execution ====================

    /// Execute the statement and return the driver's mutation result.
    ///
    /// Runs the prepared form when one exists, otherwise builds and executes directly.
    pub async fn exec(&mut self) -> XdbResult<ExecResult> {
        let querier = self.querier;
        if let Some(stmt) = &self.prepared {
            self.log_sql();
            return querier.exec_prepared(stmt, &self.args).await;
        }
        self.build();
        self.log_sql();
        querier.exec(self.compiled_sql(), &self.args).await
    }

    /// Open a cursor over the statement's result, routed like [`exec`](Self::exec).
    pub(crate) async fn open_cursor(&mut self) -> XdbResult<Q::Cursor> {
        let querier = self.querier;
        if let Some(stmt) = &self.prepared {
            self.log_sql();
            return querier.query_prepared(stmt, &self.args).await;
        }
        self.build();
        self.log_sql();
        querier.query(self.compiled_sql(), &self.args).await
    }

    /// Build and prepare the statement; later executions use the prepared form.
    ///
    /// A handle from an earlier `prepare` is closed first.
    pub async fn prepare(&mut self) -> XdbResult<()> {
        let querier = self.querier;
        self.build();
        let handle = querier.prepare(self.compiled_sql()).await?;
        if let Some(old) = self.prepared.replace(handle) {
            querier.close_prepared(old).await?;
        }
        Ok(())
    }

    /// Release the prepared form. Closing a statement that was never prepared, or
    /// was already closed, does nothing.
    pub async fn close(&mut self) -> XdbResult<()> {
        match self.prepared.take() {
            Some(stmt) => self.querier.close_prepared(stmt).await,
            None => Ok(()),
        }
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared.is_some()
    }

    // ==================== Readers ====================

    /// The single column of the first row.
    ///
    /// Returns [`XdbError::NoRows`] when the result is empty and [`XdbError::Scan`] when
    /// the result does not have exactly one column.
    pub async fn value(&mut self) -> XdbResult<Value> {
        let mut cursor = self.open_cursor().await?;
        let Some(values) = cursor.next_row().await? else {
            return Err(XdbError::NoRows);
        };
        let count = values.len();
        let mut values = values.into_iter();
        match (values.next(), count) {
            (Some(value), 1) => Ok(value),
            _ => Err(XdbError::scan(format!(
                "expected exactly 1 column, got {count}"
            ))),
        }
    }

    /// The first row. Returns [`XdbError::NoRows`] when the result is empty.
    pub async fn row(&mut self) -> XdbResult<Row> {
        let mut cursor = self.open_cursor().await?;
        match cursor.next_row().await? {
            Some(values) => Ok(Row::from_columns(cursor.columns(), values)),
            None => Err(XdbError::NoRows),
        }
    }

    /// All rows; an empty result is an empty vector, not an error.
    pub async fn rows(&mut self) -> XdbResult<Vec<Row>> {
        let mut cursor = self.open_cursor().await?;
        let mut rows = Vec::new();
        while let Some(values) = cursor.next_row().await? {
            rows.push(Row::from_columns(cursor.columns(), values));
        }
        Ok(rows)
    }

    /// One column across all rows, in cursor order.
    ///
    /// Returns [`XdbError::ColumnNotFound`] when the result has no such column.
    pub async fn list(&mut self, column: &str) -> XdbResult<Vec<Value>> {
        let mut cursor = self.open_cursor().await?;
        let index = cursor
            .columns()
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| XdbError::ColumnNotFound(column.to_string()))?;

        let mut list = Vec::new();
        while let Some(mut values) = cursor.next_row().await? {
            if index >= values.len() {
                return Err(XdbError::scan(format!(
                    "row has {} values, expected at least {}",
                    values.len(),
                    index + 1
                )));
            }
            list.push(values.swap_remove(index));
        }
        Ok(list)
    }

    /// Map the first row into `dest`.
    ///
    /// Columns without a matching field are skipped; fields without a column keep
    /// their value. Returns [`XdbError::NoRows`] when the result is empty.
    pub async fn reflect_row<T: FromRow>(&mut self, dest: &mut T) -> XdbResult<()> {
        let mut cursor = self.open_cursor().await?;
        let map = ColumnMap::new(T::FIELDS, cursor.columns());
        match cursor.next_row().await? {
            Some(values) => map.apply(dest, &values),
            None => Err(XdbError::NoRows),
        }
    }

    /// Map every row into `dest`, element `i` receiving row `i`.
    ///
    /// Existing elements are overwritten field by field and the vector grows as rows
    /// arrive; empty `Option`/`Box` slots are allocated first. Elements past the last
    /// row are left alone. Returns the number of rows mapped; an empty result maps 0.
    pub async fn reflect_rows<E: RowSlot>(&mut self, dest: &mut Vec<E>) -> XdbResult<u64> {
        let mut cursor = self.open_cursor().await?;
        let map = ColumnMap::new(<E::Target as FromRow>::FIELDS, cursor.columns());
        let mut count = 0_usize;
        while let Some(values) = cursor.next_row().await? {
            if dest.len() <= count {
                dest.push(E::new_slot());
            }
            map.apply(dest[count].target(), &values)?;
            count += 1;
        }
        Ok(count as u64)
    }

    // ==================== Typed fetch ====================

    /// Execute and map the first row into a fresh `T`.
    pub async fn fetch_one_as<T: FromRow>(&mut self) -> XdbResult<T> {
        let mut item = T::default();
        self.reflect_row(&mut item).await?;
        Ok(item)
    }

    /// Like [`fetch_one_as`](Self::fetch_one_as), with an empty result as `None`.
    pub async fn fetch_opt_as<T: FromRow>(&mut self) -> XdbResult<Option<T>> {
        match self.fetch_one_as().await {
            Ok(item) => Ok(Some(item)),
            Err(XdbError::NoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Execute and map every row into a fresh `T`.
    pub async fn fetch_all_as<T: FromRow>(&mut self) -> XdbResult<Vec<T>> {
        let mut cursor = self.open_cursor().await?;
        let map = ColumnMap::new(T::FIELDS, cursor.columns());
        let mut items = Vec::new();
        while let Some(values) = cursor.next_row().await? {
            let mut item = T::default();
            map.apply(&mut item, &values)?;
            items.push(item);
        }
        Ok(items)
    }
}
