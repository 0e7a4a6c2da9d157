//! `shopclerk serve` — start the HTTP gateway.
//!
//! Loads the persisted index pair if present; otherwise builds it from
//! the seed corpus. A server without a usable corpus still starts — the
//! seed-docs context section simply degrades until `shopclerk index` is
//! run.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use shopclerk_config::AppConfig;
use shopclerk_context::ContextComposer;
use shopclerk_core::{Generator, PurchaseStore, StoreCatalog};
use shopclerk_gateway::AppState;
use shopclerk_index::load_seed_docs;
use shopclerk_store::{JsonStoreCatalog, SqlitePurchaseStore};
use tracing::{info, warn};

pub async fn run(config_path: &Path, port: Option<u16>) -> anyhow::Result<()> {
    let config = AppConfig::load(config_path)?;
    let port = port.unwrap_or(config.gateway.port);

    let client = super::build_client(&config);
    let index = super::build_index(&config, client.clone());

    // Load-or-build, as on every startup: a missing or stale pair on
    // disk forces a rebuild from the corpus.
    if index.load().await {
        info!(docs = index.doc_count().await, "loaded persisted index");
    } else {
        match load_seed_docs(&config.data.seed_docs_dir) {
            Ok(docs) if !docs.is_empty() => {
                let count = docs.len();
                index.build(docs).await.context("building index")?;
                info!(docs = count, "built index from seed corpus");
            }
            Ok(_) => warn!(
                dir = %config.data.seed_docs_dir.display(),
                "seed corpus is empty — retrieval disabled until `shopclerk index` runs"
            ),
            Err(e) => warn!(
                error = %e,
                "seed corpus unavailable — retrieval disabled until `shopclerk index` runs"
            ),
        }
    }

    let purchases: Arc<dyn PurchaseStore> = Arc::new(
        SqlitePurchaseStore::new(&config.data.db_file)
            .await
            .context("opening purchase store")?,
    );
    let catalog: Arc<dyn StoreCatalog> = Arc::new(JsonStoreCatalog::new(&config.data.stores_file));
    let generator: Arc<dyn Generator> = client;

    let state = Arc::new(AppState {
        composer: ContextComposer::new(index.clone(), catalog.clone(), purchases.clone()),
        index,
        generator,
        purchases,
        catalog,
    });

    let app = shopclerk_gateway::router(state);
    let addr = format!("{}:{port}", config.gateway.host);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    info!(%addr, "shopclerk gateway listening");
    axum::serve(listener, app).await.context("serving")?;
    Ok(())
}
