//! Postgres wiring: pool construction, schema, and the sync/async bridge.
//!
//! The store traits are synchronous. Postgres adapters keep a handle to a
//! multi-threaded tokio runtime and block on it; callers must therefore invoke
//! them from outside that runtime's worker threads (plain threads, or
//! `tokio::task::spawn_blocking`).

use std::future::Future;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use tokio::runtime::{Handle, RuntimeFlavor, TryCurrentError};

const SCHEMA: &str = include_str!("../migrations/0001_reqflow.sql");

/// Open a connection pool.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Create tables and indexes if they do not exist yet. Idempotent.
pub async fn apply_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    tracing::info!("reqflow schema applied");
    Ok(())
}

#[derive(Debug, Error)]
pub enum PgContextError {
    #[error("no tokio runtime: {0}")]
    NoRuntime(#[from] TryCurrentError),
    #[error("Postgres adapters need a multi-threaded tokio runtime, got a current-thread one")]
    CurrentThreadRuntime,
}

/// A pool plus the runtime it is driven by.
#[derive(Debug, Clone)]
pub struct PgContext {
    pool: PgPool,
    handle: Handle,
}

impl PgContext {
    /// Blocking on a current-thread runtime from outside it never makes
    /// progress, so such handles are rejected.
    pub fn new(pool: PgPool, handle: Handle) -> Result<Self, PgContextError> {
        check_flavor(&handle)?;
        Ok(Self { pool, handle })
    }

    /// Capture the runtime of the calling context.
    pub fn current(pool: PgPool) -> Result<Self, PgContextError> {
        Self::new(pool, Handle::try_current()?)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub(crate) fn block_on<F: Future>(&self, fut: F) -> F::Output {
        self.handle.block_on(fut)
    }
}

fn check_flavor(handle: &Handle) -> Result<(), PgContextError> {
    if handle.runtime_flavor() == RuntimeFlavor::CurrentThread {
        return Err(PgContextError::CurrentThreadRuntime);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_thread_runtime_is_rejected() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        assert!(matches!(
            check_flavor(rt.handle()),
            Err(PgContextError::CurrentThreadRuntime)
        ));
    }
}
