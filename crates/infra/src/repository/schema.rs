//! Relational schema, created idempotently at startup.

use sqlx::PgPool;
use tracing::info;

use super::GatewayError;

/// Tables in dependency order; each statement is safe to re-run.
pub const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id            BIGSERIAL PRIMARY KEY,
        first_name    TEXT NOT NULL,
        last_name     TEXT NOT NULL,
        email         TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        roles         TEXT[] NOT NULL DEFAULT '{}'
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS categories (
        id   BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id          BIGSERIAL PRIMARY KEY,
        name        TEXT NOT NULL,
        description TEXT NOT NULL,
        price_cents BIGINT NOT NULL CHECK (price_cents >= 0),
        img_url     TEXT NULL,
        category_id BIGINT NOT NULL REFERENCES categories (id),
        created_at  TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS feedbacks (
        id         BIGSERIAL PRIMARY KEY,
        product_id BIGINT NOT NULL REFERENCES products (id),
        user_id    BIGINT NOT NULL REFERENCES users (id),
        rating     SMALLINT NOT NULL CHECK (rating BETWEEN 1 AND 5),
        comment    TEXT NOT NULL,
        moment     TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS costumers (
        id      BIGSERIAL PRIMARY KEY,
        user_id BIGINT NULL REFERENCES users (id),
        name    TEXT NOT NULL,
        cpf     TEXT NOT NULL UNIQUE,
        phone   TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS addresses (
        id          BIGSERIAL PRIMARY KEY,
        costumer_id BIGINT NOT NULL REFERENCES costumers (id),
        street      TEXT NOT NULL,
        number      TEXT NOT NULL,
        complement  TEXT NULL,
        district    TEXT NOT NULL,
        city        TEXT NOT NULL,
        state       CHAR(2) NOT NULL,
        cep         CHAR(8) NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS orders (
        id          BIGSERIAL PRIMARY KEY,
        costumer_id BIGINT NOT NULL REFERENCES costumers (id),
        moment      TIMESTAMPTZ NOT NULL,
        status      TEXT NOT NULL,
        items       JSONB NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS payments (
        id       BIGSERIAL PRIMARY KEY,
        order_id BIGINT NOT NULL UNIQUE REFERENCES orders (id),
        status   TEXT NOT NULL,
        method   JSONB NOT NULL
    )
    "#,
];

pub async fn ensure_schema(pool: &PgPool) -> Result<(), GatewayError> {
    for statement in STATEMENTS {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| GatewayError::backend(format!("failed to apply schema: {e}")))?;
    }
    info!(tables = STATEMENTS.len(), "database schema ready");
    Ok(())
}
