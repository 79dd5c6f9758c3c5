//! Assemble a ready-to-use engine from [`EngineConfig`].

use std::sync::Arc;

use anyhow::Context;
use serde_json::Value as JsonValue;

use reqflow_auth::AuthProvider;
use reqflow_core::{TenantId, UserId};
use reqflow_events::{EventEnvelope, InMemoryEventBus};
use reqflow_requisitions::Approver;

use crate::config::EngineConfig;
use crate::coordinator::RequisitionLifecycleCoordinator;
use crate::db::{self, PgContext};
use crate::directory::{
    ApproverDirectory, DirectoryError, InMemoryApproverDirectory, PostgresApproverDirectory,
};
use crate::event_store::{EventStore, InMemoryEventStore, PostgresEventStore};
use crate::sequence::{InMemorySequenceAllocator, PostgresSequenceAllocator, SequenceAllocator};

pub type SharedBus = Arc<InMemoryEventBus<EventEnvelope<JsonValue>>>;

/// Coordinator with its backends chosen at runtime.
pub type Engine = RequisitionLifecycleCoordinator<
    Arc<dyn EventStore>,
    SharedBus,
    Arc<dyn ApproverDirectory>,
    Arc<dyn SequenceAllocator>,
>;

/// Write access to the directory behind an [`Engine`], for provisioning.
#[derive(Debug, Clone)]
pub enum DirectoryAdmin {
    InMemory(Arc<InMemoryApproverDirectory>),
    Postgres(Arc<PostgresApproverDirectory>),
}

impl DirectoryAdmin {
    pub async fn upsert(&self, tenant_id: TenantId, approver: Approver) -> Result<(), DirectoryError> {
        match self {
            DirectoryAdmin::InMemory(dir) => dir.upsert(tenant_id, approver),
            DirectoryAdmin::Postgres(dir) => dir.upsert(tenant_id, &approver).await,
        }
    }

    pub async fn remove(&self, tenant_id: TenantId, user_id: UserId) -> Result<bool, DirectoryError> {
        match self {
            DirectoryAdmin::InMemory(dir) => dir.remove(tenant_id, user_id),
            DirectoryAdmin::Postgres(dir) => dir.remove(tenant_id, user_id).await,
        }
    }
}

pub struct Wired {
    pub engine: Engine,
    pub directory: DirectoryAdmin,
}

/// In-memory engine (tests, demos, local development).
pub fn in_memory(config: &EngineConfig, auth: Arc<dyn AuthProvider>) -> Wired {
    let directory = Arc::new(InMemoryApproverDirectory::new());
    let engine = RequisitionLifecycleCoordinator::new(
        Arc::new(InMemoryEventStore::new()) as Arc<dyn EventStore>,
        Arc::new(InMemoryEventBus::new()),
        directory.clone() as Arc<dyn ApproverDirectory>,
        Arc::new(InMemorySequenceAllocator::new()) as Arc<dyn SequenceAllocator>,
        auth,
        config,
    );
    Wired {
        engine,
        directory: DirectoryAdmin::InMemory(directory),
    }
}

/// Build the engine `config` asks for. Persistent mode connects to
/// `DATABASE_URL`, applies the schema, and captures the current tokio runtime,
/// which must be multi-threaded.
///
/// Engine operations block on that runtime in persistent mode, so call them
/// from `spawn_blocking` or plain threads.
pub async fn build(config: &EngineConfig, auth: Arc<dyn AuthProvider>) -> anyhow::Result<Wired> {
    if !config.use_persistent_stores {
        tracing::info!("using in-memory stores");
        return Ok(in_memory(config, auth));
    }

    let url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL is required for persistent stores")?;
    let pool = db::connect(url, config.db_max_connections)
        .await
        .context("connecting to Postgres")?;
    db::apply_schema(&pool)
        .await
        .context("applying reqflow schema")?;
    let ctx = PgContext::current(pool).context("capturing the tokio runtime for Postgres adapters")?;

    let directory = Arc::new(PostgresApproverDirectory::new(ctx.clone()));
    let engine = RequisitionLifecycleCoordinator::new(
        Arc::new(PostgresEventStore::new(ctx.clone())) as Arc<dyn EventStore>,
        Arc::new(InMemoryEventBus::new()),
        directory.clone() as Arc<dyn ApproverDirectory>,
        Arc::new(PostgresSequenceAllocator::new(ctx)) as Arc<dyn SequenceAllocator>,
        auth,
        config,
    );
    tracing::info!(max_connections = config.db_max_connections, "using Postgres stores");

    Ok(Wired {
        engine,
        directory: DirectoryAdmin::Postgres(directory),
    })
}
