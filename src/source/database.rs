//! DuckDB-backed cursor source
//!
//! Pages through a DuckDB table with keyset pagination: the cursor holds the
//! sort key of the last row returned and the next read resumes strictly after
//! it. The query's order fields plus `rowid` form the key, so the order is
//! total even when the order fields repeat.

use super::types::CursorSource;
use crate::error::{Error, Result};
use crate::query::{Direction, FilterOp, Query};
use crate::types::{Batch, Cursor, JsonObject, JsonValue};
use async_trait::async_trait;
use duckdb::types::Value;
use duckdb::{params_from_iter, Connection};
use regex::Regex;
use std::sync::{Arc, LazyLock, Mutex};

/// Plain SQL identifier; anything else is rejected rather than escaped
static IDENTIFIER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Rows decoded from one fetch: record plus its key values
type KeyedRows = Vec<(JsonValue, Vec<JsonValue>)>;

/// Keyset-paginated query over a DuckDB table
pub struct DuckDbSource {
    /// Shared DuckDB connection
    conn: Arc<Mutex<Connection>>,
    /// Query being executed
    query: Query,
    /// Quoted table reference
    table: String,
    /// Column names returned for each record
    columns: Vec<String>,
    /// Keyset columns (quoted) with their directions
    keys: Vec<(String, Direction)>,
}

impl DuckDbSource {
    /// Create a source owning `conn`
    pub fn new(conn: Connection, query: Query) -> Result<Self> {
        Self::from_shared(Arc::new(Mutex::new(conn)), query)
    }

    /// Create a source over a connection shared with other sources
    pub fn from_shared(conn: Arc<Mutex<Connection>>, query: Query) -> Result<Self> {
        let parts: Vec<&str> = query.kind.split('.').collect();
        if parts.len() > 2 || !parts.iter().all(|p| is_identifier(p)) {
            return Err(Error::invalid_query(format!(
                "'{}' is not a valid table name",
                query.kind
            )));
        }
        let table = parts
            .iter()
            .map(|p| quote(p))
            .collect::<Vec<_>>()
            .join(".");

        let columns = {
            let guard = lock(&conn)?;
            table_columns(&guard, &parts)?
        };
        if columns.is_empty() {
            return Err(Error::invalid_query(format!(
                "table '{}' not found",
                query.kind
            )));
        }

        let referenced = query
            .filters
            .iter()
            .map(|f| &f.field)
            .chain(query.orders.iter().map(|o| &o.field));
        for field in referenced {
            if !columns.contains(field) {
                return Err(Error::invalid_query(format!(
                    "unknown column '{field}' in table '{}'",
                    query.kind
                )));
            }
        }

        let mut keys: Vec<(String, Direction)> = query
            .orders
            .iter()
            .map(|o| (quote(&o.field), o.direction))
            .collect();
        keys.push(("rowid".to_string(), Direction::Asc));

        tracing::debug!(table = %table, columns = columns.len(), "DuckDB source ready");

        Ok(Self {
            conn,
            query,
            table,
            columns,
            keys,
        })
    }

    /// Column names returned for each record
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// WHERE clause (with leading space) and its parameters.
    /// `after` holds the key values of the last row already returned.
    fn where_clause(&self, after: Option<&[JsonValue]>) -> (String, Vec<Value>) {
        let mut conditions = Vec::new();
        let mut params = Vec::new();

        for filter in &self.query.filters {
            let column = quote(&filter.field);
            match (filter.op, &filter.value) {
                (FilterOp::Eq, JsonValue::Null) => conditions.push(format!("{column} IS NULL")),
                (FilterOp::Ne, JsonValue::Null) => {
                    conditions.push(format!("{column} IS NOT NULL"));
                }
                (op, value) => {
                    conditions.push(format!("{column} {} ?", op.as_sql()));
                    params.push(json_to_value(value));
                }
            }
        }

        if let Some(after) = after {
            // (k0 > v0) OR (k0 = v0 AND k1 > v1) OR ..., with NULLs sorting last
            let last = self.keys.len() - 1;
            let mut alternatives = Vec::with_capacity(self.keys.len());
            for (i, (column, direction)) in self.keys.iter().enumerate() {
                // Nothing sorts after a NULL in its own column
                if after[i].is_null() {
                    continue;
                }
                let mut parts = Vec::with_capacity(i + 1);
                for (j, (prefix, _)) in self.keys[..i].iter().enumerate() {
                    if after[j].is_null() {
                        parts.push(format!("{prefix} IS NULL"));
                    } else {
                        parts.push(format!("{prefix} = ?"));
                        params.push(json_to_value(&after[j]));
                    }
                }
                let op = match direction {
                    Direction::Asc => ">",
                    Direction::Desc => "<",
                };
                if i == last {
                    parts.push(format!("{column} {op} ?"));
                } else {
                    parts.push(format!("({column} {op} ? OR {column} IS NULL)"));
                }
                params.push(json_to_value(&after[i]));
                alternatives.push(format!("({})", parts.join(" AND ")));
            }
            if alternatives.is_empty() {
                conditions.push("FALSE".to_string());
            } else {
                conditions.push(format!("({})", alternatives.join(" OR ")));
            }
        }

        if conditions.is_empty() {
            (String::new(), params)
        } else {
            (format!(" WHERE {}", conditions.join(" AND ")), params)
        }
    }

    fn count_sql(&self) -> (String, Vec<Value>) {
        let (clause, params) = self.where_clause(None);
        (format!("SELECT COUNT(*) FROM {}{clause}", self.table), params)
    }

    fn fetch_sql(&self, limit: usize, after: Option<&[JsonValue]>) -> (String, Vec<Value>) {
        let (clause, params) = self.where_clause(after);
        let select = self
            .columns
            .iter()
            .map(|c| quote(c))
            .chain(self.keys.iter().map(|(k, _)| k.clone()))
            .collect::<Vec<_>>()
            .join(", ");
        let order = self
            .keys
            .iter()
            .map(|(k, d)| match d {
                Direction::Asc => format!("{k} ASC NULLS LAST"),
                Direction::Desc => format!("{k} DESC NULLS LAST"),
            })
            .collect::<Vec<_>>()
            .join(", ");
        (
            format!(
                "SELECT {select} FROM {}{clause} ORDER BY {order} LIMIT {limit}",
                self.table
            ),
            params,
        )
    }
}

#[async_trait]
impl CursorSource for DuckDbSource {
    type Item = JsonValue;

    fn query(&self) -> &Query {
        &self.query
    }

    async fn count(&self) -> Result<u64> {
        let (sql, params) = self.count_sql();
        let conn = Arc::clone(&self.conn);

        tracing::debug!("Executing count query: {}", sql);

        let count = tokio::task::spawn_blocking(move || -> Result<i64> {
            let guard = lock(&conn)?;
            let count: i64 =
                guard.query_row(&sql, params_from_iter(params), |row| row.get(0))?;
            Ok(count)
        })
        .await
        .map_err(|e| Error::source(format!("DuckDB task failed: {e}")))??;

        Ok(count.max(0) as u64)
    }

    async fn fetch_page(&self, size: usize, start: Option<&Cursor>) -> Result<Batch<JsonValue>> {
        let after = start
            .map(Cursor::decode::<Vec<JsonValue>>)
            .transpose()?;
        if let Some(after) = &after {
            if after.len() != self.keys.len() {
                return Err(Error::invalid_cursor(format!(
                    "expected {} key values, got {}",
                    self.keys.len(),
                    after.len()
                )));
            }
        }

        // One extra row tells whether more data follows
        let (sql, params) = self.fetch_sql(size.saturating_add(1), after.as_deref());
        let conn = Arc::clone(&self.conn);
        let columns = self.columns.clone();
        let key_count = self.keys.len();

        tracing::debug!("Executing batch query: {}", sql);

        let mut rows = tokio::task::spawn_blocking(move || -> Result<KeyedRows> {
            let guard = lock(&conn)?;
            let mut stmt = guard.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(params), |row| {
                    let mut record = JsonObject::new();
                    for (i, name) in columns.iter().enumerate() {
                        let value: Value = row.get(i)?;
                        record.insert(name.clone(), value_to_json(value));
                    }
                    let mut key = Vec::with_capacity(key_count);
                    for i in columns.len()..columns.len() + key_count {
                        let value: Value = row.get(i)?;
                        key.push(value_to_json(value));
                    }
                    Ok((JsonValue::Object(record), key))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
        .map_err(|e| Error::source(format!("DuckDB task failed: {e}")))??;

        let more = rows.len() > size;
        rows.truncate(size);

        let next_cursor = match rows.last() {
            Some((_, key)) => Some(Cursor::encode(key)?),
            None => start.cloned(),
        };
        let items = rows.into_iter().map(|(record, _)| record).collect();

        Ok(Batch::new(items, next_cursor, more))
    }
}

fn lock(conn: &Mutex<Connection>) -> Result<std::sync::MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|_| Error::source("DuckDB connection lock poisoned"))
}

fn is_identifier(name: &str) -> bool {
    IDENTIFIER_REGEX.is_match(name)
}

fn quote(identifier: &str) -> String {
    format!("\"{identifier}\"")
}

/// Column names of `schema.table` or `table`, in declaration order
fn table_columns(conn: &Connection, parts: &[&str]) -> Result<Vec<String>> {
    let (sql, params): (&str, Vec<String>) = match parts {
        [schema, table] => (
            "SELECT column_name FROM information_schema.columns
             WHERE table_schema = ? AND table_name = ?
             ORDER BY ordinal_position",
            vec![(*schema).to_string(), (*table).to_string()],
        ),
        _ => (
            "SELECT column_name FROM information_schema.columns
             WHERE table_name = ?
             ORDER BY ordinal_position",
            vec![parts.join(".")],
        ),
    };

    let mut stmt = conn.prepare(sql)?;
    let columns = stmt
        .query_map(params_from_iter(params), |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(columns)
}

/// Convert a JSON scalar into a bind parameter
fn json_to_value(value: &JsonValue) -> Value {
    match value {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Boolean(*b),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::BigInt(i)
            } else if let Some(u) = n.as_u64() {
                Value::UBigInt(u)
            } else {
                Value::Double(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        JsonValue::String(s) => Value::Text(s.clone()),
        other => Value::Text(other.to_string()),
    }
}

/// Convert DuckDB Value to JSON Value
fn value_to_json(value: Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Boolean(b) => JsonValue::Bool(b),
        Value::TinyInt(i) => JsonValue::Number(i.into()),
        Value::SmallInt(i) => JsonValue::Number(i.into()),
        Value::Int(i) => JsonValue::Number(i.into()),
        Value::BigInt(i) => JsonValue::Number(i.into()),
        Value::HugeInt(i) => JsonValue::String(i.to_string()),
        Value::UTinyInt(i) => JsonValue::Number(i.into()),
        Value::USmallInt(i) => JsonValue::Number(i.into()),
        Value::UInt(i) => JsonValue::Number(i.into()),
        Value::UBigInt(i) => JsonValue::Number(i.into()),
        Value::Float(f) => {
            serde_json::Number::from_f64(f64::from(f)).map_or(JsonValue::Null, JsonValue::Number)
        }
        Value::Double(f) => {
            serde_json::Number::from_f64(f).map_or(JsonValue::Null, JsonValue::Number)
        }
        Value::Text(s) => JsonValue::String(s),
        Value::Blob(b) => JsonValue::String(base64::Engine::encode(
            &base64::engine::general_purpose::STANDARD,
            b,
        )),
        Value::Timestamp(_, i) => {
            // Microseconds since epoch
            let secs = i / 1_000_000;
            let nsecs = ((i % 1_000_000) * 1000) as u32;
            chrono::DateTime::from_timestamp(secs, nsecs)
                .map(|dt| JsonValue::String(dt.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()))
                .unwrap_or(JsonValue::Number(i.into()))
        }
        Value::Date32(d) => {
            // Days since epoch (719163 is the number of days from 1 CE to 1970-01-01)
            chrono::NaiveDate::from_num_days_from_ce_opt(d + 719_163)
                .map(|date| JsonValue::String(date.format("%Y-%m-%d").to_string()))
                .unwrap_or(JsonValue::Number(d.into()))
        }
        _ => JsonValue::String(format!("{value:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn source(query: Query) -> DuckDbSource {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE users (id BIGINT, name VARCHAR, age INTEGER);")
            .unwrap();
        DuckDbSource::new(conn, query).unwrap()
    }

    #[test]
    fn test_fetch_sql_without_cursor() {
        let src = source(
            Query::new("users")
                .filter("age", FilterOp::Ge, 18)
                .order_by("name", Direction::Desc),
        );
        let (sql, params) = src.fetch_sql(11, None);
        assert_eq!(
            sql,
            "SELECT \"id\", \"name\", \"age\", \"name\", rowid FROM \"users\" \
             WHERE \"age\" >= ? \
             ORDER BY \"name\" DESC NULLS LAST, rowid ASC NULLS LAST LIMIT 11"
        );
        assert_eq!(params, vec![Value::BigInt(18)]);
    }

    #[test]
    fn test_keyset_clause_expands_lexicographically() {
        let src = source(Query::new("users").order_by("age", Direction::Asc));
        let after = [json!(30), json!(7)];
        let (clause, params) = src.where_clause(Some(&after));
        assert_eq!(
            clause,
            " WHERE (((\"age\" > ? OR \"age\" IS NULL)) OR (\"age\" = ? AND rowid > ?))"
        );
        assert_eq!(
            params,
            vec![Value::BigInt(30), Value::BigInt(30), Value::BigInt(7)]
        );
    }

    #[test]
    fn test_keyset_clause_after_null_key() {
        let src = source(Query::new("users").order_by("name", Direction::Asc));
        let after = [JsonValue::Null, json!(3)];
        let (clause, params) = src.where_clause(Some(&after));
        assert_eq!(clause, " WHERE ((\"name\" IS NULL AND rowid > ?))");
        assert_eq!(params, vec![Value::BigInt(3)]);
    }

    #[test]
    fn test_null_filters_use_is_null() {
        let src = source(
            Query::new("users")
                .filter("name", FilterOp::Eq, JsonValue::Null)
                .filter("age", FilterOp::Ne, JsonValue::Null),
        );
        let (sql, params) = src.count_sql();
        assert_eq!(
            sql,
            "SELECT COUNT(*) FROM \"users\" WHERE \"name\" IS NULL AND \"age\" IS NOT NULL"
        );
        assert!(params.is_empty());
    }

    #[test]
    fn test_value_to_json() {
        assert_eq!(value_to_json(Value::Null), JsonValue::Null);
        assert_eq!(value_to_json(Value::Boolean(true)), JsonValue::Bool(true));
        assert_eq!(value_to_json(Value::Int(42)), json!(42));
        assert_eq!(
            value_to_json(Value::Text("hello".to_string())),
            json!("hello")
        );
        assert_eq!(value_to_json(Value::Date32(0)), json!("1970-01-01"));
    }

    #[test]
    fn test_json_to_value() {
        assert_eq!(json_to_value(&json!(5)), Value::BigInt(5));
        assert_eq!(json_to_value(&json!(1.5)), Value::Double(1.5));
        assert_eq!(json_to_value(&json!("x")), Value::Text("x".to_string()));
        assert_eq!(json_to_value(&json!(null)), Value::Null);
    }
}
