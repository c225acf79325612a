//! tokio-postgres implementation of [`SqlDriver`]
//!
//! JSON parameters are encoded according to the type PostgreSQL inferred for
//! each placeholder, and result columns are decoded back into JSON. `numeric`
//! goes through `rust_decimal`; pgvector's `vector` uses its binary wire format.

use std::error::Error;
use std::str::FromStr;

use async_trait::async_trait;
use bytes::{Buf, BufMut, BytesMut};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use futures_util::{pin_mut, TryStreamExt};
use pgops_exec::{DriverError, PlaceholderStyle, QueryOutput, SqlDriver};
use rust_decimal::Decimal;
use serde_json::{Number, Value};
use tokio_postgres::types::{to_sql_checked, FromSql, IsNull, ToSql, Type};
use tokio::sync::Mutex;
use tokio_postgres::{Client, NoTls};
use tracing::{debug, error, info};

use crate::config::{AccessMode, DatabaseConfig};

type BoxError = Box<dyn Error + Sync + Send>;

/// Rendered for columns of a type the driver cannot decode
const UNSUPPORTED: &str = "<unsupported>";

pub struct PostgresDriver {
    client: Client,
    /// Present in restricted mode; held from `BEGIN READ ONLY` to its end so
    /// statements from concurrent calls never land inside another's transaction
    read_only: Option<Mutex<()>>,
}

impl PostgresDriver {
    /// Connect and spawn the connection task on the current tokio runtime
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DriverError> {
        let (client, connection) = tokio_postgres::connect(&config.url, NoTls)
            .await
            .map_err(driver_error)?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("Database connection error: {}", e);
            }
        });

        if let Some(timeout) = config.effective_statement_timeout_ms() {
            info!("Setting statement_timeout to {}ms", timeout);
            client
                .batch_execute(&format!("SET statement_timeout = {}", timeout))
                .await
                .map_err(driver_error)?;
        }

        let read_only = match config.access_mode {
            AccessMode::Restricted => {
                info!("Restricted mode: statements run in read-only transactions");
                Some(Mutex::new(()))
            }
            AccessMode::Unrestricted => None,
        };

        Ok(Self { client, read_only })
    }

    async fn run(&self, sql: &str, params: &[Value]) -> Result<QueryOutput, DriverError> {
        let statement = self.client.prepare(sql).await.map_err(driver_error)?;

        let types = statement.params();
        if types.len() != params.len() {
            return Err(DriverError::new(format!(
                "statement expects {} parameter(s), got {}",
                types.len(),
                params.len()
            )));
        }
        let bound: Vec<JsonParam<'_>> = params.iter().map(JsonParam).collect();

        let stream = self
            .client
            .query_raw(&statement, bound.iter().map(|p| p as &dyn ToSql))
            .await
            .map_err(driver_error)?;
        pin_mut!(stream);

        let mut rows = Vec::new();
        while let Some(row) = stream.try_next().await.map_err(driver_error)? {
            rows.push(row_to_json(&row).map_err(driver_error)?);
        }
        let rows_affected = stream.rows_affected().unwrap_or(rows.len() as u64);
        debug!("{} row(s) returned, {} affected", rows.len(), rows_affected);

        Ok(QueryOutput { rows, rows_affected })
    }
}

#[async_trait]
impl SqlDriver for PostgresDriver {
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<QueryOutput, DriverError> {
        let Some(lock) = &self.read_only else {
            return self.run(sql, params).await;
        };

        let _session = lock.lock().await;
        self.client
            .batch_execute("BEGIN READ ONLY")
            .await
            .map_err(driver_error)?;
        let result = self.run(sql, params).await;
        let end = if result.is_ok() { "COMMIT" } else { "ROLLBACK" };
        self.client.batch_execute(end).await.map_err(driver_error)?;
        result
    }

    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Numbered
    }

    fn read_only(&self) -> bool {
        self.read_only.is_some()
    }
}

/// Server errors carry only the server's message; everything else its Display
fn driver_error(e: tokio_postgres::Error) -> DriverError {
    match e.as_db_error() {
        Some(db) => DriverError::new(db.message()),
        None => DriverError::new(e.to_string()),
    }
}

/// JSON value bound to whatever type the server inferred for its placeholder
#[derive(Debug)]
struct JsonParam<'a>(&'a Value);

impl ToSql for JsonParam<'_> {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        encode_param(self.0, ty, out)
    }

    fn accepts(_: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

fn mismatch(value: &Value, ty: &Type) -> BoxError {
    format!("cannot bind {} as {}", value, ty).into()
}

fn as_i64(value: &Value, ty: &Type) -> Result<i64, BoxError> {
    match value {
        Value::Number(n) => n.as_i64().ok_or_else(|| mismatch(value, ty)),
        Value::String(s) => Ok(s.trim().parse()?),
        Value::Bool(b) => Ok(i64::from(*b)),
        _ => Err(mismatch(value, ty)),
    }
}

fn as_f64(value: &Value, ty: &Type) -> Result<f64, BoxError> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| mismatch(value, ty)),
        Value::String(s) => Ok(s.trim().parse()?),
        _ => Err(mismatch(value, ty)),
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn encode_param(value: &Value, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    if value.is_null() {
        return Ok(IsNull::Yes);
    }

    match *ty {
        Type::BOOL => match value {
            Value::Bool(b) => b.to_sql(ty, out),
            Value::String(s) => s.trim().parse::<bool>()?.to_sql(ty, out),
            _ => Err(mismatch(value, ty)),
        },
        Type::INT2 => i16::try_from(as_i64(value, ty)?)?.to_sql(ty, out),
        Type::INT4 => i32::try_from(as_i64(value, ty)?)?.to_sql(ty, out),
        Type::INT8 => as_i64(value, ty)?.to_sql(ty, out),
        Type::OID => u32::try_from(as_i64(value, ty)?)?.to_sql(ty, out),
        Type::FLOAT4 => (as_f64(value, ty)? as f32).to_sql(ty, out),
        Type::FLOAT8 => as_f64(value, ty)?.to_sql(ty, out),
        Type::NUMERIC => parse_decimal(&as_text(value))?.to_sql(ty, out),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN => {
            as_text(value).to_sql(ty, out)
        }
        Type::JSON | Type::JSONB => match value {
            // Nested structures arrive serialized; send them as the JSON they contain
            Value::String(s) if looks_like_json_container(s) => {
                match serde_json::from_str::<Value>(s) {
                    Ok(parsed) => parsed.to_sql(ty, out),
                    Err(_) => value.to_sql(ty, out),
                }
            }
            other => other.to_sql(ty, out),
        },
        Type::UUID => uuid::Uuid::parse_str(as_text(value).trim())?.to_sql(ty, out),
        Type::TIMESTAMP => parse_timestamp(&as_text(value))?.to_sql(ty, out),
        Type::TIMESTAMPTZ => parse_timestamptz(&as_text(value))?.to_sql(ty, out),
        Type::DATE => NaiveDate::parse_from_str(as_text(value).trim(), "%Y-%m-%d")?.to_sql(ty, out),
        Type::TIME => NaiveTime::parse_from_str(as_text(value).trim(), "%H:%M:%S%.f")?.to_sql(ty, out),
        _ if ty.name() == "vector" => {
            encode_vector(&parse_vector(value)?, out)?;
            Ok(IsNull::No)
        }
        _ => Err(format!("unsupported parameter type {}", ty).into()),
    }
}

fn looks_like_json_container(text: &str) -> bool {
    let text = text.trim_start();
    text.starts_with('{') || text.starts_with('[')
}

fn parse_timestamp(text: &str) -> Result<NaiveDateTime, BoxError> {
    let text = text.trim();
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f"))
        .map_err(Into::into)
}

/// RFC 3339, or a zone-less timestamp taken as UTC
fn parse_timestamptz(text: &str) -> Result<DateTime<Utc>, BoxError> {
    match DateTime::parse_from_rfc3339(text.trim()) {
        Ok(dt) => Ok(dt.with_timezone(&Utc)),
        Err(_) => Ok(parse_timestamp(text)?.and_utc()),
    }
}

/// Accepts the bracketed text form `[1,2,3]` or a JSON array of numbers
fn parse_vector(value: &Value) -> Result<Vec<f32>, BoxError> {
    let parsed;
    let items = match value {
        Value::Array(items) => items,
        Value::String(s) => {
            parsed = serde_json::from_str::<Value>(s)?;
            match &parsed {
                Value::Array(items) => items,
                _ => return Err(format!("invalid vector literal {}", s).into()),
            }
        }
        _ => return Err(format!("invalid vector value {}", value).into()),
    };

    items
        .iter()
        .map(|item| {
            item.as_f64()
                .map(|f| f as f32)
                .ok_or_else(|| format!("invalid vector element {}", item).into())
        })
        .collect()
}

/// pgvector binary format: dimension, unused, then big-endian f32 values
fn encode_vector(values: &[f32], out: &mut BytesMut) -> Result<(), BoxError> {
    let dim = i16::try_from(values.len())?;
    out.put_i16(dim);
    out.put_i16(0);
    for v in values {
        out.put_f32(*v);
    }
    Ok(())
}

fn decode_vector(mut raw: &[u8]) -> Result<Vec<f32>, BoxError> {
    if raw.len() < 4 {
        return Err("vector value too short".into());
    }
    let dim = raw.get_i16();
    let _unused = raw.get_i16();
    let dim = usize::try_from(dim)?;
    if raw.len() != dim * 4 {
        return Err("vector length does not match its dimension".into());
    }
    Ok((0..dim).map(|_| raw.get_f32()).collect())
}

/// Plain or scientific decimal text
fn parse_decimal(text: &str) -> Result<Decimal, BoxError> {
    let text = text.trim();
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|_| format!("invalid numeric value: {}", text).into())
}

fn decimal_value(d: Decimal) -> Value {
    let text = d.to_string();
    text.parse::<Number>().map(Value::Number).unwrap_or(Value::String(text))
}

struct RawVector(Vec<f32>);

impl<'a> FromSql<'a> for RawVector {
    fn from_sql(_: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        decode_vector(raw).map(RawVector)
    }

    fn accepts(ty: &Type) -> bool {
        ty.name() == "vector"
    }
}

/// Shortest decimal form of an f32, so 0.1f32 reads back as 0.1
fn f32_value(v: f32) -> Value {
    v.to_string()
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn f64_value(v: f64) -> Value {
    Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
}

fn get<'a, T: FromSql<'a>>(row: &'a tokio_postgres::Row, idx: usize) -> Result<Option<T>, tokio_postgres::Error> {
    row.try_get::<_, Option<T>>(idx)
}

fn row_to_json(row: &tokio_postgres::Row) -> Result<pgops_ir::Row, tokio_postgres::Error> {
    let mut out = pgops_ir::Row::new();

    for (idx, column) in row.columns().iter().enumerate() {
        let ty = column.type_();
        let value = match *ty {
            Type::BOOL => get::<bool>(row, idx)?.map(Value::Bool),
            Type::INT2 => get::<i16>(row, idx)?.map(Value::from),
            Type::INT4 => get::<i32>(row, idx)?.map(Value::from),
            Type::INT8 => get::<i64>(row, idx)?.map(Value::from),
            Type::OID => get::<u32>(row, idx)?.map(Value::from),
            Type::FLOAT4 => get::<f32>(row, idx)?.map(f32_value),
            Type::FLOAT8 => get::<f64>(row, idx)?.map(f64_value),
            Type::NUMERIC => get::<Decimal>(row, idx)?.map(decimal_value),
            Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN => {
                get::<String>(row, idx)?.map(Value::String)
            }
            Type::JSON | Type::JSONB => get::<Value>(row, idx)?,
            Type::UUID => get::<uuid::Uuid>(row, idx)?.map(|u| Value::String(u.to_string())),
            Type::TIMESTAMP => get::<NaiveDateTime>(row, idx)?.map(|t| Value::String(t.to_string())),
            Type::TIMESTAMPTZ => get::<DateTime<Utc>>(row, idx)?.map(|t| Value::String(t.to_rfc3339())),
            Type::DATE => get::<NaiveDate>(row, idx)?.map(|d| Value::String(d.to_string())),
            Type::TIME => get::<NaiveTime>(row, idx)?.map(|t| Value::String(t.to_string())),
            Type::TEXT_ARRAY | Type::VARCHAR_ARRAY => get::<Vec<Option<String>>>(row, idx)?
                .map(|items| Value::Array(items.into_iter().map(|s| s.map_or(Value::Null, Value::String)).collect())),
            Type::INT4_ARRAY => get::<Vec<Option<i32>>>(row, idx)?
                .map(|items| Value::Array(items.into_iter().map(|i| i.map_or(Value::Null, Value::from)).collect())),
            Type::INT8_ARRAY => get::<Vec<Option<i64>>>(row, idx)?
                .map(|items| Value::Array(items.into_iter().map(|i| i.map_or(Value::Null, Value::from)).collect())),
            _ if ty.name() == "vector" => {
                get::<RawVector>(row, idx)?.map(|v| Value::Array(v.0.into_iter().map(f32_value).collect()))
            }
            _ => Some(Value::String(UNSUPPORTED.to_string())),
        };

        out.insert(column.name().to_string(), value.unwrap_or(Value::Null));
    }

    Ok(out)
}
