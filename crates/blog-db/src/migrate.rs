//! Forward-only auto-migration
//!
//! Creates missing tables, adds declared columns missing from existing
//! tables, and ensures indexes. Nothing is ever dropped, existing columns
//! are never altered, and no version table is kept: the store's own
//! catalog is the only state.

use std::collections::HashSet;

use serde::Serialize;
use sqlx::{PgConnection, PgPool};

use crate::repository::{RepositoryError, RepositoryResult};
use crate::schema::{ColumnDef, TableDef, TABLES};

/// What a migration run changed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub created_tables: Vec<&'static str>,
    /// (table, column)
    pub added_columns: Vec<(&'static str, &'static str)>,
    /// Added columns declared `NOT NULL` that had to stay nullable
    pub nullable_columns: Vec<(&'static str, &'static str)>,
}

impl MigrationReport {
    pub fn is_noop(&self) -> bool {
        self.created_tables.is_empty() && self.added_columns.is_empty()
    }
}

/// Bring the schema up to date in one transaction.
///
/// `schema` must be the schema the pool's `search_path` points at (or
/// `None` for the default); it is created when absent.
pub async fn auto_migrate(pool: &PgPool, schema: Option<&str>) -> RepositoryResult<MigrationReport> {
    let mut tx = pool.begin().await?;
    let mut report = MigrationReport::default();

    if let Some(schema) = schema {
        if !blog_core::config::is_identifier(schema) {
            return Err(RepositoryError::Migration {
                object: format!("schema {}", schema),
                source: sqlx::Error::Configuration("schema name is not a plain identifier".into()),
            });
        }
        sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", schema))
            .execute(&mut *tx)
            .await
            .map_err(|source| RepositoryError::Migration {
                object: format!("schema {}", schema),
                source,
            })?;
    }

    for table in TABLES {
        migrate_table(&mut tx, table, &mut report)
            .await
            .map_err(|source| RepositoryError::Migration {
                object: format!("table {}", table.name),
                source,
            })?;
    }

    tx.commit().await?;

    if report.is_noop() {
        tracing::info!("Schema is up to date");
    } else {
        tracing::info!(
            created_tables = ?report.created_tables,
            added_columns = ?report.added_columns,
            nullable_columns = ?report.nullable_columns,
            "Schema migrated"
        );
    }
    Ok(report)
}

async fn migrate_table(
    conn: &mut PgConnection,
    table: &TableDef,
    report: &mut MigrationReport,
) -> Result<(), sqlx::Error> {
    let existing = existing_columns(conn, table.name).await?;

    if existing.is_empty() {
        sqlx::query(&table.create_sql()).execute(&mut *conn).await?;
        tracing::debug!(table = table.name, "Created table");
        report.created_tables.push(table.name);
    } else {
        for column in table.columns.iter().filter(|c| !existing.contains(c.name)) {
            add_column(conn, table.name, column, report).await?;
        }
    }

    for index in table.indexes {
        sqlx::query(&index.create_sql(table.name))
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

/// Add one declared column to an existing table.
///
/// A `NOT NULL` column with no default is filled first and only then made
/// `NOT NULL`. When rows remain without a value (no fill declared, as for
/// foreign keys) the column stays nullable and is reported.
async fn add_column(
    conn: &mut PgConnection,
    table: &'static str,
    column: &ColumnDef,
    report: &mut MigrationReport,
) -> Result<(), sqlx::Error> {
    for statement in column.add_sql(table) {
        sqlx::query(&statement).execute(&mut *conn).await?;
    }
    tracing::debug!(table, column = column.name, "Added column");
    report.added_columns.push((table, column.name));

    if !column.needs_backfill() {
        return Ok(());
    }

    let has_nulls = sqlx::query_scalar::<_, bool>(&format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE {} IS NULL)",
        table, column.name
    ))
    .fetch_one(&mut *conn)
    .await?;

    if has_nulls {
        tracing::warn!(
            table,
            column = column.name,
            "Existing rows have no value; column left nullable"
        );
        report.nullable_columns.push((table, column.name));
    } else {
        sqlx::query(&column.set_not_null_sql(table))
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Column names of `table` in the current schema; empty when the table is absent
async fn existing_columns(conn: &mut PgConnection, table: &str) -> Result<HashSet<String>, sqlx::Error> {
    let columns = sqlx::query_scalar::<_, String>(
        r#"
        SELECT column_name::TEXT
        FROM information_schema.columns
        WHERE table_schema = current_schema() AND table_name = $1
        "#,
    )
    .bind(table)
    .fetch_all(&mut *conn)
    .await?;

    Ok(columns.into_iter().collect())
}
