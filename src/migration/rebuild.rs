/// Applying a migration plan against a store
use super::{plan, ColumnCopy, MigrationAction, MigrationOptions, MigrationReport};
use crate::catalog::{sql_gen, TableMetadata};
use crate::error::{MapperError, Result};
use crate::store::{Store, StoreError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

static REBUILD_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Introspect, plan and apply. The caller holds the store lock.
pub(crate) fn migrate(
    store: &mut dyn Store,
    meta: &TableMetadata,
    options: &MigrationOptions,
    temp_infix: &str,
) -> Result<MigrationReport> {
    let table = meta.name();
    let live = store
        .table_columns(table)
        .map_err(|e| MapperError::store(table, "describe table", e))?;

    let plan = plan(meta, &live, options)?;
    let mut report = plan.report;

    match plan.action {
        MigrationAction::UpToDate => {
            debug!(table, "schema up to date");
        }
        MigrationAction::Create => {
            store
                .execute(&meta.statements().create_table, &[])
                .map_err(|e| MapperError::store(table, "create table", e))?;
            info!(table, columns = report.added.len(), "created table");
        }
        MigrationAction::AddColumns(fields) => {
            // each statement stands alone; earlier additions survive a later failure
            for field in &fields {
                let sql = format!(
                    "ALTER TABLE {} ADD COLUMN {} {};",
                    table,
                    field.storage_key,
                    field.sql_type()
                );
                store
                    .execute(&sql, &[])
                    .map_err(|e| MapperError::store(table, "add column", e))?;

                if field.unique {
                    let sql = format!(
                        "CREATE UNIQUE INDEX IF NOT EXISTS {table}_{col}_unique ON {table}({col});",
                        table = table,
                        col = field.storage_key
                    );
                    store
                        .execute(&sql, &[])
                        .map_err(|e| MapperError::store(table, "add unique index", e))?;
                }
            }
            info!(table, added = ?report.added, "added columns");
        }
        MigrationAction::Rebuild { projection } => {
            let temp = temp_table_name(table, temp_infix);
            rebuild(store, meta, &temp, &projection)?;
            report.rebuilt = true;
            info!(
                table,
                dropped = ?report.dropped,
                changed = ?report.changed,
                renamed = ?report.renamed,
                "rebuilt table"
            );
        }
    }

    Ok(report)
}

/// `<table><infix><unix nanos>_<counter>`, unique per invocation
fn temp_table_name(table: &str, infix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let seq = REBUILD_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{}{}{}_{}", table, infix, nanos, seq)
}

/// Create/copy/drop/rename in one transaction
fn rebuild(store: &mut dyn Store, meta: &TableMetadata, temp: &str, projection: &[ColumnCopy]) -> Result<()> {
    let table = meta.name();
    store
        .begin()
        .map_err(|e| MapperError::store(table, "begin rebuild", e))?;

    let steps = rebuild_steps(meta, temp, projection);
    for (operation, sql) in &steps {
        if let Err(e) = store.execute(sql, &[]) {
            return Err(abort(store, table, operation, e));
        }
    }

    if let Err(e) = store.commit() {
        return Err(abort(store, table, "commit rebuild", e));
    }
    debug!(table, temp, copied = projection.len(), "rebuild committed");
    Ok(())
}

fn rebuild_steps(meta: &TableMetadata, temp: &str, projection: &[ColumnCopy]) -> Vec<(&'static str, String)> {
    let table = meta.name();
    let mut steps = vec![("create temp table", sql_gen::create_table_sql(meta, temp, false))];

    if !projection.is_empty() {
        let targets: Vec<&str> = projection.iter().map(|c| c.target.as_str()).collect();
        let sources: Vec<&str> = projection.iter().map(|c| c.source.as_str()).collect();
        steps.push((
            "copy rows",
            format!(
                "INSERT INTO {} ({}) SELECT {} FROM {};",
                temp,
                targets.join(", "),
                sources.join(", "),
                table
            ),
        ));
    }

    steps.push(("drop table", format!("DROP TABLE {};", table)));
    steps.push(("rename temp table", format!("ALTER TABLE {} RENAME TO {};", temp, table)));
    steps
}

/// Roll back after a failed step, keeping the step's error
fn abort(store: &mut dyn Store, table: &str, operation: &str, err: StoreError) -> MapperError {
    if let Err(rollback_err) = store.rollback() {
        warn!(table, operation, error = %rollback_err, "rollback after failed rebuild also failed");
    }
    MapperError::store(table, operation, err)
}
