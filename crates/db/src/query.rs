use async_trait::async_trait;
use nl2sql_core::results::{ExecuteSqlResult, SqlRow, SqlValue, ValidateSqlResult};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Executor, Row, TypeInfo, ValueRef};
use tracing::{error, info};

use crate::DbPool;

pub const EMPTY_QUERY_MESSAGE: &str = "Query could not be parsed.";
pub const SELECT_ONLY_MESSAGE: &str = "Only SELECT statements are allowed.";

/// Syntax checks and read-only execution on behalf of the SQL tools.
///
/// Neither operation returns an error: failures are folded into the result
/// records so the calling agent can react to them conversationally.
#[async_trait]
pub trait SqlGateway: Send + Sync {
    async fn validate(&self, query: &str) -> ValidateSqlResult;
    async fn execute(&self, query: &str) -> ExecuteSqlResult;
}

pub struct SqlQueryGateway {
    pool: DbPool,
}

impl SqlQueryGateway {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl SqlGateway for SqlQueryGateway {
    async fn validate(&self, query: &str) -> ValidateSqlResult {
        if query.trim().is_empty() {
            return ValidateSqlResult::invalid(EMPTY_QUERY_MESSAGE);
        }

        // Preparing compiles the statement without running it.
        match (&self.pool).prepare(query).await {
            Ok(_) => ValidateSqlResult::valid(),
            Err(err) => {
                info!(event_name = "sql.validate.rejected", error = %err, "sql validation failed");
                ValidateSqlResult::invalid(err.to_string())
            }
        }
    }

    async fn execute(&self, query: &str) -> ExecuteSqlResult {
        if !is_select_statement(query) || !is_single_statement(query) {
            info!(event_name = "sql.execute.rejected", "non-select sql rejected");
            return ExecuteSqlResult::error(SELECT_ONLY_MESSAGE);
        }

        let rows = match sqlx::query(query).fetch_all(&self.pool).await {
            Ok(rows) => rows,
            Err(err) => {
                error!(event_name = "sql.execute.failed", error = %err, "sql execution failed");
                return ExecuteSqlResult::error(err.to_string());
            }
        };

        match rows.iter().map(decode_row).collect::<Result<Vec<_>, _>>() {
            Ok(rows) => {
                info!(event_name = "sql.execute.completed", row_count = rows.len(), "sql executed");
                ExecuteSqlResult::rows(rows)
            }
            Err(err) => {
                error!(event_name = "sql.execute.decode_failed", error = %err, "row decode failed");
                ExecuteSqlResult::error(err.to_string())
            }
        }
    }
}

pub fn is_select_statement(query: &str) -> bool {
    query.trim().to_lowercase().starts_with("select")
}

/// True when `query` holds one statement, optionally closed by `;`.
///
/// SQLite runs every statement of a multi-statement string, so anything after
/// the first terminator other than whitespace, comments or further `;` counts
/// as a second statement. Quoted literals and identifiers are skipped.
pub fn is_single_statement(query: &str) -> bool {
    let mut chars = query.chars().peekable();
    let mut terminated = false;

    while let Some(ch) = chars.next() {
        match ch {
            '-' if chars.peek() == Some(&'-') => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut previous = '\0';
                for next in chars.by_ref() {
                    if previous == '*' && next == '/' {
                        break;
                    }
                    previous = next;
                }
            }
            ';' => terminated = true,
            ch if ch.is_whitespace() => {}
            _ if terminated => return false,
            '\'' | '"' | '`' => skip_until(&mut chars, ch),
            '[' => skip_until(&mut chars, ']'),
            _ => {}
        }
    }

    true
}

fn skip_until(chars: &mut impl Iterator<Item = char>, close: char) {
    for next in chars.by_ref() {
        if next == close {
            break;
        }
    }
}

fn decode_row(row: &SqliteRow) -> Result<SqlRow, sqlx::Error> {
    let mut mapped = SqlRow::with_capacity(row.len());

    for column in row.columns() {
        let index = column.ordinal();
        let raw = row.try_get_raw(index)?;

        let value = if raw.is_null() {
            SqlValue::Null
        } else {
            let storage_class = raw.type_info().name().to_string();
            match storage_class.as_str() {
                "INTEGER" => SqlValue::Integer(row.try_get::<i64, _>(index)?),
                "REAL" => SqlValue::Real(row.try_get::<f64, _>(index)?),
                "BLOB" => {
                    let bytes = row.try_get::<Vec<u8>, _>(index)?;
                    SqlValue::Text(String::from_utf8_lossy(&bytes).into_owned())
                }
                _ => SqlValue::Text(row.try_get::<String, _>(index)?),
            }
        };

        mapped.insert(column.name().to_string(), value);
    }

    Ok(mapped)
}
