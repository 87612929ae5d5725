//! tokio-postgres adapter.
//!
//! `tokio_postgres::Client`, `tokio_postgres::Transaction` and, with the `pool` feature,
//! `deadpool_postgres::Client` are [`Querier`]s. Statements use `$n` placeholders.
//!
//! Column values are converted to their text form so the byte-level decoders apply
//! unchanged; [`Arg`]s are converted to whatever parameter type Postgres inferred.

use crate::arg::Arg;
use crate::decode::parse_bool;
use crate::driver::{Cursor, ExecResult, Querier};
use crate::error::XdbResult;
use crate::token::Placeholder;
use crate::value::Value;
use bytes::{BufMut, Bytes, BytesMut};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use futures_core::Stream;
use std::error::Error;
use std::pin::Pin;
use tokio_postgres::types::{FromSql, IsNull, Kind, ToSql, Type, to_sql_checked};
use tokio_postgres::{Row, RowStream, Statement};

type BoxError = Box<dyn Error + Sync + Send>;

// ===== Cursor =====

/// A streaming result set over `query_raw`.
pub struct PgCursor {
    columns: Vec<String>,
    stream: Pin<Box<RowStream>>,
}

impl PgCursor {
    fn new(stmt: &Statement, stream: RowStream) -> Self {
        Self {
            columns: stmt.columns().iter().map(|c| c.name().to_string()).collect(),
            stream: Box::pin(stream),
        }
    }
}

impl Cursor for PgCursor {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    async fn next_row(&mut self) -> XdbResult<Option<Vec<Value>>> {
        let next = std::future::poll_fn(|cx| self.stream.as_mut().poll_next(cx)).await;
        match next {
            None => Ok(None),
            Some(row) => Ok(Some(row_values(&row?)?)),
        }
    }
}

fn row_values(row: &Row) -> XdbResult<Vec<Value>> {
    (0..row.len())
        .map(|i| Ok(row.try_get::<_, TextValue>(i)?.0))
        .collect()
}

fn params(args: &[Arg]) -> Vec<&(dyn ToSql + Sync)> {
    args.iter().map(|a| a as &(dyn ToSql + Sync)).collect()
}

// ===== Querier impls =====

macro_rules! impl_querier {
    ($ty:ty, $($client:ident)::+) => {
        impl Querier for $ty {
            type Cursor = PgCursor;
            type Prepared = Statement;

            fn placeholder(&self) -> Placeholder {
                Placeholder::Dollar
            }

            async fn exec(&self, sql: &str, args: &[Arg]) -> XdbResult<ExecResult> {
                let params = params(args);
                let rows = $($client)::+::execute_raw(self, sql, params.iter().copied()).await?;
                Ok(ExecResult::new(rows))
            }

            // Prepared first so the column names are known before the first row.
            async fn query(&self, sql: &str, args: &[Arg]) -> XdbResult<PgCursor> {
                let stmt = $($client)::+::prepare(self, sql).await?;
                Querier::query_prepared(self, &stmt, args).await
            }

            async fn prepare(&self, sql: &str) -> XdbResult<Statement> {
                Ok($($client)::+::prepare(self, sql).await?)
            }

            async fn exec_prepared(&self, stmt: &Statement, args: &[Arg]) -> XdbResult<ExecResult> {
                let params = params(args);
                let rows = $($client)::+::execute_raw(self, stmt, params.iter().copied()).await?;
                Ok(ExecResult::new(rows))
            }

            async fn query_prepared(&self, stmt: &Statement, args: &[Arg]) -> XdbResult<PgCursor> {
                let params = params(args);
                let stream = $($client)::+::query_raw(self, stmt, params.iter().copied()).await?;
                Ok(PgCursor::new(stmt, stream))
            }
        }
    };
}

impl_querier!(tokio_postgres::Client, tokio_postgres::Client);
impl_querier!(tokio_postgres::Transaction<'_>, tokio_postgres::Transaction);

// Ad-hoc queries go through the pooled connection's statement cache.
#[cfg(feature = "pool")]
impl Querier for deadpool_postgres::Client {
    type Cursor = PgCursor;
    type Prepared = Statement;

    fn placeholder(&self) -> Placeholder {
        Placeholder::Dollar
    }

    async fn exec(&self, sql: &str, args: &[Arg]) -> XdbResult<ExecResult> {
        let client: &tokio_postgres::Client = self;
        Querier::exec(client, sql, args).await
    }

    async fn query(&self, sql: &str, args: &[Arg]) -> XdbResult<PgCursor> {
        let stmt = self.prepare_cached(sql).await?;
        Querier::query_prepared(self, &stmt, args).await
    }

    async fn prepare(&self, sql: &str) -> XdbResult<Statement> {
        Ok(self.prepare_cached(sql).await?)
    }

    async fn exec_prepared(&self, stmt: &Statement, args: &[Arg]) -> XdbResult<ExecResult> {
        let client: &tokio_postgres::Client = self;
        Querier::exec_prepared(client, stmt, args).await
    }

    async fn query_prepared(&self, stmt: &Statement, args: &[Arg]) -> XdbResult<PgCursor> {
        let client: &tokio_postgres::Client = self;
        Querier::query_prepared(client, stmt, args).await
    }
}

// ===== Column values =====

/// Any column, converted to the bytes of its text representation.
struct TextValue(Value);

impl<'a> FromSql<'a> for TextValue {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        Ok(TextValue(Value::new(text_bytes(ty, raw)?)))
    }

    fn from_sql_null(_ty: &Type) -> Result<Self, BoxError> {
        Ok(TextValue(Value::null()))
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

fn text_bytes(ty: &Type, raw: &[u8]) -> Result<Bytes, BoxError> {
    match ty.kind() {
        Kind::Domain(inner) => return text_bytes(inner, raw),
        Kind::Enum(_) => return Ok(Bytes::copy_from_slice(raw)),
        Kind::Array(_) => {
            let items = Vec::<TextValue>::from_sql(ty, raw)?;
            return Ok(Bytes::from(array_literal(&items)));
        }
        _ => {}
    }
    let text = match *ty {
        // Sent as their text already.
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN | Type::BYTEA => {
            return Ok(Bytes::copy_from_slice(raw));
        }
        Type::BOOL => {
            let v = bool::from_sql(ty, raw)?;
            (if v { "true" } else { "false" }).to_string()
        }
        Type::CHAR => i8::from_sql(ty, raw)?.to_string(),
        Type::INT2 => i16::from_sql(ty, raw)?.to_string(),
        Type::INT4 => i32::from_sql(ty, raw)?.to_string(),
        Type::INT8 => i64::from_sql(ty, raw)?.to_string(),
        Type::OID => u32::from_sql(ty, raw)?.to_string(),
        Type::FLOAT4 => f32::from_sql(ty, raw)?.to_string(),
        Type::FLOAT8 => f64::from_sql(ty, raw)?.to_string(),
        #[cfg(feature = "rust_decimal")]
        Type::NUMERIC => rust_decimal::Decimal::from_sql(ty, raw)?.to_string(),
        Type::TIMESTAMP => NaiveDateTime::from_sql(ty, raw)?
            .format("%Y-%m-%d %H:%M:%S%.f")
            .to_string(),
        Type::TIMESTAMPTZ => DateTime::<Utc>::from_sql(ty, raw)?
            .format("%Y-%m-%d %H:%M:%S%.f%:z")
            .to_string(),
        Type::DATE => NaiveDate::from_sql(ty, raw)?.format("%Y-%m-%d").to_string(),
        Type::TIME => NaiveTime::from_sql(ty, raw)?.format("%H:%M:%S%.f").to_string(),
        Type::UUID => uuid::Uuid::from_sql(ty, raw)?.to_string(),
        Type::JSON | Type::JSONB => serde_json::Value::from_sql(ty, raw)?.to_string(),
        _ => return Err(format!("no text conversion for column type {ty}").into()),
    };
    Ok(Bytes::from(text))
}

/// Render array elements as a Postgres array literal, e.g. `{1,NULL,"a b"}`.
fn array_literal(items: &[TextValue]) -> String {
    let mut out = String::from("{");
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        match item.0.raw() {
            None => out.push_str("NULL"),
            Some(raw) => push_array_element(&mut out, &String::from_utf8_lossy(raw)),
        }
    }
    out.push('}');
    out
}

fn push_array_element(out: &mut String, text: &str) {
    let quote = text.is_empty()
        || text.eq_ignore_ascii_case("null")
        || text
            .chars()
            .any(|c| matches!(c, '{' | '}' | ',' | '"' | '\\') || c.is_whitespace());
    if !quote {
        out.push_str(text);
        return;
    }
    out.push('"');
    for c in text.chars() {
        if matches!(c, '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
}

// ===== Arguments =====

impl ToSql for Arg {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        if let Kind::Domain(inner) = ty.kind() {
            return self.to_sql(inner, out);
        }
        match self {
            Arg::Null => Ok(IsNull::Yes),
            Arg::Bool(v) => match *ty {
                Type::BOOL => v.to_sql(ty, out),
                _ => encode_text(if *v { "true" } else { "false" }, ty, out),
            },
            Arg::Int(v) => encode_int(i128::from(*v), ty, out),
            Arg::UInt(v) => encode_int(i128::from(*v), ty, out),
            Arg::Float(v) => match *ty {
                Type::FLOAT4 => (*v as f32).to_sql(ty, out),
                Type::FLOAT8 => v.to_sql(ty, out),
                _ => encode_text(&v.to_string(), ty, out),
            },
            Arg::Text(s) => encode_text(s, ty, out),
            Arg::Bytes(b) => {
                out.put_slice(b);
                Ok(IsNull::No)
            }
            Arg::Date(d) => match *ty {
                Type::DATE => d.to_sql(ty, out),
                Type::TIMESTAMP => midnight(d)?.to_sql(ty, out),
                Type::TIMESTAMPTZ => midnight(d)?.and_utc().to_sql(ty, out),
                _ => encode_text(&d.format("%Y-%m-%d").to_string(), ty, out),
            },
            Arg::DateTime(dt) => match *ty {
                Type::TIMESTAMP => dt.to_sql(ty, out),
                Type::TIMESTAMPTZ => dt.and_utc().to_sql(ty, out),
                Type::DATE => dt.date().to_sql(ty, out),
                _ => encode_text(&dt.format("%Y-%m-%d %H:%M:%S%.f").to_string(), ty, out),
            },
            Arg::Timestamp(ts) => match *ty {
                Type::TIMESTAMPTZ => ts.to_sql(ty, out),
                Type::TIMESTAMP => ts.naive_utc().to_sql(ty, out),
                Type::DATE => ts.date_naive().to_sql(ty, out),
                _ => encode_text(&ts.to_rfc3339(), ty, out),
            },
            Arg::Uuid(u) => match *ty {
                Type::UUID => u.to_sql(ty, out),
                _ => encode_text(&u.to_string(), ty, out),
            },
            Arg::Json(j) => match *ty {
                Type::JSON | Type::JSONB => j.to_sql(ty, out),
                _ => encode_text(&j.to_string(), ty, out),
            },
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

fn midnight(d: &NaiveDate) -> Result<NaiveDateTime, BoxError> {
    Ok(d.and_hms_opt(0, 0, 0).ok_or("invalid date")?)
}

fn encode_int(v: i128, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::INT2 => i16::try_from(v)?.to_sql(ty, out),
        Type::INT4 => i32::try_from(v)?.to_sql(ty, out),
        Type::INT8 => i64::try_from(v)?.to_sql(ty, out),
        Type::OID => u32::try_from(v)?.to_sql(ty, out),
        Type::FLOAT4 => (v as f32).to_sql(ty, out),
        Type::FLOAT8 => (v as f64).to_sql(ty, out),
        Type::BOOL => (v != 0).to_sql(ty, out),
        _ => encode_text(&v.to_string(), ty, out),
    }
}

/// Encode `text` in the binary format of `ty`; unknown types receive the raw text.
fn encode_text(text: &str, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::BOOL => parse_bool(text.trim().as_bytes())
            .ok_or_else(|| format!("invalid boolean: {text:?}"))?
            .to_sql(ty, out),
        Type::INT2 => text.trim().parse::<i16>()?.to_sql(ty, out),
        Type::INT4 => text.trim().parse::<i32>()?.to_sql(ty, out),
        Type::INT8 => text.trim().parse::<i64>()?.to_sql(ty, out),
        Type::OID => text.trim().parse::<u32>()?.to_sql(ty, out),
        Type::FLOAT4 => text.trim().parse::<f32>()?.to_sql(ty, out),
        Type::FLOAT8 => text.trim().parse::<f64>()?.to_sql(ty, out),
        Type::NUMERIC => encode_numeric(text, out),
        Type::UUID => uuid::Uuid::parse_str(text.trim())?.to_sql(ty, out),
        Type::DATE => NaiveDate::parse_from_str(text.get(..10).unwrap_or(text), "%Y-%m-%d")?
            .to_sql(ty, out),
        Type::TIMESTAMP => parse_timestamp(text)?.to_sql(ty, out),
        Type::TIMESTAMPTZ => match DateTime::parse_from_rfc3339(text) {
            Ok(ts) => ts.with_timezone(&Utc).to_sql(ty, out),
            Err(_) => parse_timestamp(text)?.and_utc().to_sql(ty, out),
        },
        Type::JSON | Type::JSONB => serde_json::from_str::<serde_json::Value>(text)
            .unwrap_or_else(|_| serde_json::Value::String(text.to_string()))
            .to_sql(ty, out),
        _ => {
            out.put_slice(text.as_bytes());
            Ok(IsNull::No)
        }
    }
}

#[cfg(feature = "rust_decimal")]
fn encode_numeric(text: &str, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    use rust_decimal::Decimal;
    let text = text.trim();
    let value = Decimal::from_str_exact(text).or_else(|_| Decimal::from_scientific(text))?;
    value.to_sql(&Type::NUMERIC, out)
}

#[cfg(not(feature = "rust_decimal"))]
fn encode_numeric(_text: &str, _out: &mut BytesMut) -> Result<IsNull, BoxError> {
    Err("NUMERIC parameters need the rust_decimal feature".into())
}

fn parse_timestamp(text: &str) -> Result<NaiveDateTime, BoxError> {
    let text = text.trim();
    if let Ok(ts) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(ts);
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(ts);
    }
    midnight(&NaiveDate::parse_from_str(text, "%Y-%m-%d")?)
}
