//! Postgres-backed repository.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | GatewayError |
//! |------------|----------------------|--------------|
//! | Database (unique violation) | `23505` | `IntegrityViolation` |
//! | Database (foreign key violation) | `23503` | `IntegrityViolation` |
//! | Database (check constraint violation) | `23514` | `IntegrityViolation` |
//! | Database (other) | Any other | `Backend` |
//! | Anything else | N/A | `Backend` |
//!
//! An `UPDATE` or `DELETE` that touches zero rows is `NotFound`.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::query_builder::Separated;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use letmebuy_core::{Direction, Entity, Identifier, Page, PageRequest};

use super::{GatewayError, Repository};

/// Table mapping for an entity stored by [`PgRepository`].
///
/// Every table has a `BIGSERIAL` primary key named `id`; `COLUMNS` lists the
/// remaining columns in the order `push_values` binds them.
pub trait PgEntity: Entity {
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error>;

    fn push_values(&self, values: &mut Separated<'_, '_, Postgres, &'static str>);

    /// Append `AND ...` clauses for the filter.
    fn push_filter(filter: &Self::Filter, query: &mut QueryBuilder<'_, Postgres>);

    /// Column backing a sortable field.
    fn sort_column(field: &str) -> Option<&'static str> {
        std::iter::once("id")
            .chain(Self::COLUMNS.iter().copied())
            .find(|column| *column == field)
    }
}

#[derive(Debug)]
pub struct PgRepository<E> {
    pool: Arc<PgPool>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for PgRepository<E> {
    fn clone(&self) -> Self {
        Self { pool: self.pool.clone(), _entity: PhantomData }
    }
}

impl<E: PgEntity> PgRepository<E> {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool, _entity: PhantomData }
    }

    fn select_columns() -> String {
        std::iter::once("id")
            .chain(E::COLUMNS.iter().copied())
            .collect::<Vec<_>>()
            .join(", ")
    }

    async fn insert(&self, entity: &E) -> Result<E, GatewayError> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "INSERT INTO {} ({}) VALUES (",
            E::TABLE,
            E::COLUMNS.join(", ")
        ));
        {
            let mut values = query.separated(", ");
            entity.push_values(&mut values);
        }
        query.push(") RETURNING id");

        let id = query
            .build_query_scalar::<i64>()
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert", e))?;

        let mut saved = entity.clone();
        saved.assign_id(E::Id::from_raw(id));
        Ok(saved)
    }

    async fn update(&self, id: E::Id, entity: &E) -> Result<E, GatewayError> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "UPDATE {} SET ({}) = ROW(",
            E::TABLE,
            E::COLUMNS.join(", ")
        ));
        {
            let mut values = query.separated(", ");
            entity.push_values(&mut values);
        }
        query.push(") WHERE id = ");
        query.push_bind(id.raw());

        let result = query
            .build()
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update", e))?;

        if result.rows_affected() == 0 {
            return Err(GatewayError::NotFound);
        }
        Ok(entity.clone())
    }
}

#[async_trait]
impl<E: PgEntity> Repository<E> for PgRepository<E> {
    #[instrument(skip(self), fields(kind = %E::KIND), err)]
    async fn find_by_id(&self, id: E::Id) -> Result<Option<E>, GatewayError> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM {} WHERE id = ",
            Self::select_columns(),
            E::TABLE
        ));
        query.push_bind(id.raw());

        let row = query
            .build()
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_by_id", e))?;

        row.map(|r| E::from_row(&r))
            .transpose()
            .map_err(|e| map_sqlx_error("decode", e))
    }

    #[instrument(skip_all, fields(kind = %E::KIND), err)]
    async fn save(&self, entity: E) -> Result<E, GatewayError> {
        match entity.id() {
            Some(id) => self.update(id, &entity).await,
            None => self.insert(&entity).await,
        }
    }

    #[instrument(skip(self), fields(kind = %E::KIND), err)]
    async fn delete_by_id(&self, id: E::Id) -> Result<(), GatewayError> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", E::TABLE))
            .bind(id.raw())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_by_id", e))?;

        if result.rows_affected() == 0 {
            return Err(GatewayError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self, filter), fields(kind = %E::KIND), err)]
    async fn query(&self, page: &PageRequest, filter: &E::Filter) -> Result<Page<E>, GatewayError> {
        let mut count = QueryBuilder::<Postgres>::new(format!(
            "SELECT COUNT(*) FROM {} WHERE TRUE",
            E::TABLE
        ));
        E::push_filter(filter, &mut count);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("count", e))?;

        let mut select = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM {} WHERE TRUE",
            Self::select_columns(),
            E::TABLE
        ));
        E::push_filter(filter, &mut select);

        let (column, direction) = page
            .sort
            .as_ref()
            .and_then(|sort| E::sort_column(&sort.field).map(|c| (c, sort.direction)))
            .unwrap_or(("id", Direction::Asc));
        let direction = match direction {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        };
        // Column names come from the static table mapping, never from the request.
        select.push(format!(" ORDER BY {column} {direction}, id ASC LIMIT "));
        select.push_bind(i64::from(page.size));
        select.push(" OFFSET ");
        select.push_bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));

        let rows = select
            .build()
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("query", e))?;

        let content = rows
            .iter()
            .map(E::from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| map_sqlx_error("decode", e))?;

        Ok(Page::new(content, page, u64::try_from(total).unwrap_or(0)))
    }
}

/// Map SQLx errors to `GatewayError`.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> GatewayError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505" | "23503" | "23514") => GatewayError::IntegrityViolation(msg),
                _ => GatewayError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            GatewayError::Backend(format!("connection pool closed in {operation}"))
        }
        _ => GatewayError::Backend(format!("sqlx error in {operation}: {err}")),
    }
}
