use serde_json::{Map, Value};
use sqlx::{postgres::PgRow, Postgres, QueryBuilder, Row};

use crate::error::AppError;

const ALLOWED_TABLES: &[&str] = &["payments", "rooms", "tenants"];

/// Column predicate for `list_rows`. Values compare as text so uuid, enum and
/// date columns all take string input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Eq(&'static str, String),
    In(&'static str, Vec<String>),
}

impl Filter {
    pub fn eq(column: &'static str, value: impl Into<String>) -> Self {
        Self::Eq(column, value.into())
    }

    pub fn any_of<I, S>(column: &'static str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::In(column, values.into_iter().map(Into::into).collect())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Ordering {
    pub column: &'static str,
    pub ascending: bool,
}

impl Ordering {
    pub const fn asc(column: &'static str) -> Self {
        Self {
            column,
            ascending: true,
        }
    }
}

pub async fn list_rows(
    pool: &sqlx::PgPool,
    table: &str,
    filters: &[Filter],
    limit: i64,
    order: Ordering,
) -> Result<Vec<Value>, AppError> {
    let mut query = build_select(table, filters, limit, order)?;
    let rows = query.build().fetch_all(pool).await.map_err(map_db_error)?;
    Ok(read_rows(rows))
}

pub async fn get_row(pool: &sqlx::PgPool, table: &str, row_id: &str) -> Result<Value, AppError> {
    let table_name = validate_table(table)?;

    let mut query = QueryBuilder::<Postgres>::new("SELECT row_to_json(t) AS row FROM ");
    query
        .push(table_name)
        .push(" t WHERE t.id::text = ")
        .push_bind(row_id.trim().to_string())
        .push(" LIMIT 1");

    let row = query
        .build()
        .fetch_optional(pool)
        .await
        .map_err(map_db_error)?;

    row.and_then(|value| value.try_get::<Option<Value>, _>("row").ok().flatten())
        .ok_or_else(|| AppError::NotFound(format!("{} record not found.", singular(table_name))))
}

pub async fn create_row(
    pool: &sqlx::PgPool,
    table: &str,
    payload: &Map<String, Value>,
) -> Result<Value, AppError> {
    let table_name = validate_table(table)?;
    if payload.is_empty() {
        return Err(AppError::BadRequest(format!(
            "Could not create {} record.",
            singular(table_name)
        )));
    }
    let keys = sorted_keys(payload)?;

    // jsonb_populate_record lets PostgreSQL coerce each value to its column type.
    let mut query = QueryBuilder::<Postgres>::new("INSERT INTO ");
    query.push(table_name).push(" (");
    {
        let mut separated = query.separated(", ");
        for key in &keys {
            separated.push(*key);
        }
    }
    query.push(") SELECT ");
    {
        let mut separated = query.separated(", ");
        for key in &keys {
            separated.push("r.");
            separated.push_unseparated(*key);
        }
    }
    query
        .push(" FROM jsonb_populate_record(NULL::")
        .push(table_name)
        .push(", ");
    query.push_bind(Value::Object(payload.clone()));
    query
        .push(") r RETURNING row_to_json(")
        .push(table_name)
        .push(".*) AS row");

    let row = query
        .build()
        .fetch_optional(pool)
        .await
        .map_err(map_db_error)?;

    row.and_then(|value| value.try_get::<Option<Value>, _>("row").ok().flatten())
        .ok_or_else(|| {
            AppError::Internal(format!("Could not create {} record.", singular(table_name)))
        })
}

pub async fn update_row(
    pool: &sqlx::PgPool,
    table: &str,
    row_id: &str,
    payload: &Map<String, Value>,
) -> Result<Value, AppError> {
    let table_name = validate_table(table)?;
    if payload.is_empty() {
        return Err(AppError::BadRequest("No fields to update.".to_string()));
    }
    let keys = sorted_keys(payload)?;

    let mut query = QueryBuilder::<Postgres>::new("UPDATE ");
    query.push(table_name).push(" t SET ");
    {
        let mut separated = query.separated(", ");
        for key in &keys {
            separated.push(*key);
            separated.push_unseparated(" = r.");
            separated.push_unseparated(*key);
        }
    }
    query
        .push(" FROM jsonb_populate_record(NULL::")
        .push(table_name)
        .push(", ");
    query.push_bind(Value::Object(payload.clone()));
    query
        .push(") r WHERE t.id::text = ")
        .push_bind(row_id.trim().to_string())
        .push(" RETURNING row_to_json(t) AS row");

    let row = query
        .build()
        .fetch_optional(pool)
        .await
        .map_err(map_db_error)?;

    row.and_then(|value| value.try_get::<Option<Value>, _>("row").ok().flatten())
        .ok_or_else(|| AppError::NotFound(format!("{} record not found.", singular(table_name))))
}

fn build_select<'a>(
    table: &str,
    filters: &'a [Filter],
    limit: i64,
    order: Ordering,
) -> Result<QueryBuilder<'a, Postgres>, AppError> {
    let table_name = validate_table(table)?;
    let order_name = validate_identifier(order.column)?;

    let mut query = QueryBuilder::<Postgres>::new("SELECT row_to_json(t) AS row FROM ");
    query.push(table_name).push(" t WHERE 1=1");

    for filter in filters {
        match filter {
            Filter::Eq(column, value) => {
                query
                    .push(" AND t.")
                    .push(validate_identifier(column)?)
                    .push("::text = ")
                    .push_bind(value.clone());
            }
            // An empty set matches nothing rather than everything.
            Filter::In(_, values) if values.is_empty() => {
                query.push(" AND FALSE");
            }
            Filter::In(column, values) => {
                query
                    .push(" AND t.")
                    .push(validate_identifier(column)?)
                    .push("::text = ANY(")
                    .push_bind(values.clone())
                    .push(")");
            }
        }
    }

    query.push(" ORDER BY t.").push(order_name);
    query.push(if order.ascending { " ASC" } else { " DESC" });
    query.push(" LIMIT ").push_bind(limit.clamp(1, 1000));
    Ok(query)
}

fn sorted_keys(payload: &Map<String, Value>) -> Result<Vec<&str>, AppError> {
    let mut keys = payload
        .keys()
        .map(|key| validate_identifier(key))
        .collect::<Result<Vec<_>, _>>()?;
    keys.sort_unstable();
    Ok(keys)
}

fn read_rows(rows: Vec<PgRow>) -> Vec<Value> {
    rows.into_iter()
        .filter_map(|row| row.try_get::<Option<Value>, _>("row").ok().flatten())
        .collect()
}

fn singular(table: &str) -> &str {
    table.strip_suffix('s').unwrap_or(table)
}

fn validate_table(table: &str) -> Result<&str, AppError> {
    let normalized = validate_identifier(table)?;
    if ALLOWED_TABLES.contains(&normalized) {
        return Ok(normalized);
    }
    Err(AppError::Internal(format!(
        "Table '{normalized}' is not allowed."
    )))
}

fn validate_identifier(identifier: &str) -> Result<&str, AppError> {
    let trimmed = identifier.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest(
            "Identifier cannot be empty.".to_string(),
        ));
    }
    let well_formed = trimmed.chars().all(|character| {
        character.is_ascii_lowercase() || character.is_ascii_digit() || character == '_'
    }) && !trimmed
        .chars()
        .next()
        .is_some_and(|first| first.is_ascii_digit());
    if !well_formed {
        return Err(AppError::BadRequest(format!(
            "Invalid identifier '{trimmed}'."
        )));
    }
    Ok(trimmed)
}

pub fn map_db_error(error: sqlx::Error) -> AppError {
    let message = error.to_string();
    tracing::error!(db_error = %message, "Database query failed");

    if let sqlx::Error::Database(db_error) = &error {
        if db_error.is_unique_violation() {
            return AppError::Conflict("Duplicate value violates a unique constraint.".to_string());
        }
    }
    if message.contains("23505")
        || message
            .to_ascii_lowercase()
            .contains("duplicate key value violates unique constraint")
    {
        return AppError::Conflict("Duplicate value violates a unique constraint.".to_string());
    }
    let detail = match &error {
        sqlx::Error::Database(db_error) => db_error.message().trim().to_string(),
        _ => message.trim().to_string(),
    };
    if detail.is_empty() {
        return AppError::Dependency("Database operation failed.".to_string());
    }
    AppError::Dependency(detail)
}

#[cfg(test)]
mod tests {
    use super::{
        build_select, map_db_error, validate_identifier, validate_table, Filter, Ordering,
    };
    use crate::error::AppError;

    #[test]
    fn select_binds_text_filters() {
        let filters = vec![
            Filter::eq("property_id", "p-1"),
            Filter::any_of("overall_status", ["active", "under_notice"]),
        ];
        let query = build_select("tenants", &filters, 50, Ordering::asc("joining_date"))
            .expect("valid select");
        let sql = query.sql();
        assert!(
            sql.contains("t.property_id::text = $1"),
            "Expected eq filter in SQL but got: {sql}"
        );
        assert!(
            sql.contains("t.overall_status::text = ANY($2)"),
            "Expected ANY filter in SQL but got: {sql}"
        );
        assert!(sql.contains("ORDER BY t.joining_date ASC LIMIT $3"));
    }

    #[test]
    fn empty_status_set_matches_nothing() {
        let filters = vec![Filter::any_of("overall_status", Vec::<String>::new())];
        let query =
            build_select("tenants", &filters, 10, Ordering::asc("id")).expect("valid select");
        assert!(query.sql().contains("AND FALSE"));
    }

    #[test]
    fn rejects_unknown_tables_and_bad_identifiers() {
        assert!(matches!(
            validate_table("app_users"),
            Err(AppError::Internal(_))
        ));
        assert!(validate_identifier("room_id; drop").is_err());
        assert!(validate_identifier("1col").is_err());
        assert_eq!(validate_identifier(" bed_letter ").ok(), Some("bed_letter"));
        let filters = vec![Filter::eq("Name", "x")];
        assert!(build_select("tenants", &filters, 10, Ordering::asc("id")).is_err());
    }

    #[test]
    fn database_errors_keep_their_message() {
        let error = map_db_error(sqlx::Error::Protocol(
            "new row violates check constraint \"tenants_bed_letter_check\"".to_string(),
        ));
        match error {
            AppError::Dependency(message) => {
                assert!(
                    message.contains("tenants_bed_letter_check"),
                    "Expected database message to survive but got: {message}"
                );
            }
            other => panic!("expected dependency error, got {other:?}"),
        }

        assert!(matches!(
            map_db_error(sqlx::Error::Protocol(
                "duplicate key value violates unique constraint \"tenants_pkey\"".to_string()
            )),
            AppError::Conflict(_)
        ));
        assert!(matches!(
            map_db_error(sqlx::Error::PoolTimedOut),
            AppError::Dependency(message) if !message.is_empty()
        ));
    }
}
