//! Postgres-backed stock store implementation.
//!
//! ## Error Mapping
//!
//! SQLx errors are mapped to [`StoreError`] as follows:
//!
//! | SQLx Error | StoreError | Scenario |
//! |------------|------------|----------|
//! | Database | `Database { code, message }` | Server-reported errors, SQLSTATE preserved (`42703` undefined column, `42883` undefined function, ...) |
//! | Decode / ColumnDecode | `Decode` | Row came back in an unexpected shape |
//! | PoolTimedOut / PoolClosed / Io / others | `Connection` | Pool exhausted/closed, network failures |
//!
//! Preserving the SQLSTATE matters: the schema probe and the adjustment
//! service classify `Database` errors by code/message to distinguish schema
//! drift from real outages.
//!
//! ## Dynamic identifiers
//!
//! Quantity and ownership column names are resolved at runtime (that is the
//! point of the drift adapter), so they are interpolated into SQL text after
//! passing through [`quote_ident`]. All values still travel as bind
//! parameters.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use stockbook_core::{ExpenseId, ProductId, UserId};

use crate::error::StoreError;
use crate::r#trait::StockStore;
use crate::types::{ExpenseItemRecord, OwnerPredicate, OwnerScope, ProcedureOutcome, ProductRecord};

/// Production store over a sqlx connection pool.
///
/// `Send + Sync`; clone freely, the pool handles connection management.
#[derive(Debug, Clone)]
pub struct PostgresStockStore {
    pool: Arc<PgPool>,
}

impl PostgresStockStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

/// Double-quote an identifier for safe interpolation into SQL text.
fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Ownership predicate as a WHERE fragment. The caller id is always bound as
/// the given parameter position (used twice for `Either`, same placeholder).
fn owner_clause(predicate: OwnerPredicate, param: usize) -> String {
    match predicate {
        OwnerPredicate::UserId => format!("user_id = ${param}"),
        OwnerPredicate::OwnerId => format!("owner_id = ${param}"),
        OwnerPredicate::Either => format!("(user_id = ${param} OR owner_id = ${param})"),
    }
}

fn map_sqlx_error(op: &'static str, e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::Database(db) => StoreError::Database {
            code: db.code().map(|c| c.to_string()),
            message: db.message().to_string(),
        },
        sqlx::Error::Decode(e) => StoreError::Decode(format!("{op}: {e}")),
        sqlx::Error::ColumnDecode { index, source } => {
            StoreError::Decode(format!("{op}: column {index}: {source}"))
        }
        other => StoreError::Connection(format!("{op}: {other}")),
    }
}

fn as_uuid(id: ProductId) -> Uuid {
    *id.as_uuid()
}

fn user_uuid(user: UserId) -> Uuid {
    *user.as_uuid()
}

#[async_trait]
impl StockStore for PostgresStockStore {
    #[instrument(skip(self), err)]
    async fn probe_column(&self, table: &str, column: &str) -> Result<(), StoreError> {
        let sql = format!(
            "SELECT {} FROM {} LIMIT 1",
            quote_ident(column),
            quote_ident(table)
        );

        sqlx::query(&sql)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("probe_column", e))?;

        Ok(())
    }

    #[instrument(skip(self, scope), fields(user = %scope.user), err)]
    async fn fetch_product(
        &self,
        scope: &OwnerScope,
        id: ProductId,
        quantity_column: &str,
    ) -> Result<Option<ProductRecord>, StoreError> {
        let sql = format!(
            "SELECT id, name, {}::float8 AS quantity, COALESCE(track_stock, TRUE) AS track_stock \
             FROM products WHERE id = $1 AND {}",
            quote_ident(quantity_column),
            owner_clause(scope.predicate, 2),
        );

        let row = sqlx::query(&sql)
            .bind(as_uuid(id))
            .bind(user_uuid(scope.user))
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("fetch_product", e))?;

        row.map(decode_product_row).transpose()
    }

    #[instrument(skip(self, scope, ids), fields(user = %scope.user, count = ids.len()), err)]
    async fn fetch_products(
        &self,
        scope: &OwnerScope,
        ids: &[ProductId],
        quantity_column: &str,
    ) -> Result<Vec<ProductRecord>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT id, name, {}::float8 AS quantity, COALESCE(track_stock, TRUE) AS track_stock \
             FROM products WHERE id = ANY($1) AND {}",
            quote_ident(quantity_column),
            owner_clause(scope.predicate, 2),
        );

        let uuids: Vec<Uuid> = ids.iter().copied().map(as_uuid).collect();
        let rows = sqlx::query(&sql)
            .bind(&uuids)
            .bind(user_uuid(scope.user))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("fetch_products", e))?;

        rows.into_iter().map(decode_product_row).collect()
    }

    #[instrument(skip(self, scope), fields(user = %scope.user), err)]
    async fn update_product_quantity(
        &self,
        scope: &OwnerScope,
        id: ProductId,
        column: &str,
        value: f64,
    ) -> Result<u64, StoreError> {
        let sql = format!(
            "UPDATE products SET {} = $1 WHERE id = $2 AND {}",
            quote_ident(column),
            owner_clause(scope.predicate, 3),
        );

        let result = sqlx::query(&sql)
            .bind(value)
            .bind(as_uuid(id))
            .bind(user_uuid(scope.user))
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_product_quantity", e))?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self, note), err)]
    async fn call_adjust_procedure(
        &self,
        id: ProductId,
        delta: f64,
        note: &str,
    ) -> Result<ProcedureOutcome, StoreError> {
        let row = sqlx::query(
            "SELECT success, new_stock::float8 AS new_stock, message \
             FROM adjust_stock($1, $2, $3)",
        )
        .bind(as_uuid(id))
        .bind(delta)
        .bind(note)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("call_adjust_procedure", e))?;

        Ok(ProcedureOutcome {
            success: row
                .try_get("success")
                .map_err(|e| map_sqlx_error("call_adjust_procedure", e))?,
            new_stock: row
                .try_get("new_stock")
                .map_err(|e| map_sqlx_error("call_adjust_procedure", e))?,
            message: row
                .try_get("message")
                .map_err(|e| map_sqlx_error("call_adjust_procedure", e))?,
        })
    }

    #[instrument(skip(self, scope), fields(user = %scope.user), err)]
    async fn fetch_expense_items(
        &self,
        scope: &OwnerScope,
        expense_id: ExpenseId,
    ) -> Result<Vec<ExpenseItemRecord>, StoreError> {
        let sql = format!(
            "SELECT expense_id, product_id, quantity::float8 AS quantity \
             FROM expense_items WHERE expense_id = $1 AND {}",
            owner_clause(scope.predicate, 2),
        );

        let rows = sqlx::query(&sql)
            .bind(*expense_id.as_uuid())
            .bind(user_uuid(scope.user))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("fetch_expense_items", e))?;

        rows.into_iter()
            .map(|row| {
                Ok(ExpenseItemRecord {
                    expense_id: ExpenseId::from_uuid(
                        row.try_get("expense_id")
                            .map_err(|e| map_sqlx_error("fetch_expense_items", e))?,
                    ),
                    product_id: ProductId::from_uuid(
                        row.try_get("product_id")
                            .map_err(|e| map_sqlx_error("fetch_expense_items", e))?,
                    ),
                    quantity: row
                        .try_get::<Option<f64>, _>("quantity")
                        .map_err(|e| map_sqlx_error("fetch_expense_items", e))?
                        .unwrap_or(0.0),
                })
            })
            .collect()
    }
}

fn decode_product_row(row: sqlx::postgres::PgRow) -> Result<ProductRecord, StoreError> {
    Ok(ProductRecord {
        id: ProductId::from_uuid(
            row.try_get("id")
                .map_err(|e| map_sqlx_error("decode_product_row", e))?,
        ),
        name: row
            .try_get::<Option<String>, _>("name")
            .map_err(|e| map_sqlx_error("decode_product_row", e))?
            .unwrap_or_default(),
        quantity: row
            .try_get("quantity")
            .map_err(|e| map_sqlx_error("decode_product_row", e))?,
        track_stock: row
            .try_get("track_stock")
            .map_err(|e| map_sqlx_error("decode_product_row", e))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_ident_escapes_embedded_quotes() {
        assert_eq!(quote_ident("stock_quantity"), "\"stock_quantity\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn owner_clause_binds_caller_once_per_placeholder() {
        assert_eq!(owner_clause(OwnerPredicate::UserId, 2), "user_id = $2");
        assert_eq!(owner_clause(OwnerPredicate::OwnerId, 3), "owner_id = $3");
        assert_eq!(
            owner_clause(OwnerPredicate::Either, 2),
            "(user_id = $2 OR owner_id = $2)"
        );
    }
}
