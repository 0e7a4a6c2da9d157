//! `shopclerk index` — rebuild the semantic index from the seed corpus.
//!
//! The index is rebuilt wholesale: any corpus change means a full
//! re-embed and re-persist of the index/metadata pair.

use std::path::Path;

use anyhow::Context;
use shopclerk_config::AppConfig;
use shopclerk_index::load_seed_docs;

pub async fn run(config_path: &Path) -> anyhow::Result<()> {
    let config = AppConfig::load(config_path)?;

    let client = super::build_client(&config);
    let index = super::build_index(&config, client);

    let docs = load_seed_docs(&config.data.seed_docs_dir)
        .with_context(|| format!("loading corpus from {:?}", config.data.seed_docs_dir))?;
    let count = docs.len();

    index.build(docs).await.context("building index")?;

    println!(
        "Index built with {count} docs → {} + {}",
        config.data.index_file.display(),
        config.data.meta_file.display()
    );
    Ok(())
}
