// src/cli/serve.rs — Run the ledger API server

use std::sync::Arc;

use crate::api::{self, ApiState};
use crate::auth::StaticTokenVerifier;
use crate::infra::config::Config;
use crate::infra::paths;
use crate::ledger::store_server::spawn_store_server;
use crate::ledger::LedgerManager;

pub async fn run_serve(config: &Config, port_override: Option<u16>) -> anyhow::Result<()> {
    paths::ensure_dirs().await?;

    let ledger = LedgerManager::open(&paths::db_path())?;
    let (store, _store_task) = spawn_store_server(ledger.store);

    if config.server.tokens.is_empty() {
        tracing::warn!("no bearer tokens configured; every request will be rejected");
    }
    let verifier = Arc::new(StaticTokenVerifier::from_config(&config.server));

    let state = ApiState { store, verifier };

    let mut server_config = config.server.clone();
    if let Some(port) = port_override {
        server_config.port = port;
    }

    api::start_server(&server_config, state).await
}
