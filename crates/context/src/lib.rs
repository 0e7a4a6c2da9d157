//! Context composition — the orchestration layer of the retrieval engine.
//!
//! The composer folds up to three independent context sections into one
//! bounded string for the generator:
//!
//! 1. `Seed docs:` — top semantic hits for the (already masked) message
//! 2. `Nearby stores:` — geo-ranked stores, when a location is present
//! 3. `Past purchases:` — recent purchase history, when a user is known
//!
//! Step order is fixed for determinism; each step is independently
//! optional and absent sections contribute nothing — no empty headers.
//! The composer never calls the generator.
//!
//! Two entry points: [`ContextComposer::compose`] propagates the first
//! section error untouched; [`ContextComposer::compose_degraded`] is the
//! request-boundary fallback that omits a failing section (recording why)
//! instead of failing the whole request.

use std::sync::Arc;

use shopclerk_core::{Error, GeoPoint, PurchaseStore, StoreCatalog};
use shopclerk_index::SemanticIndex;
use tracing::{debug, warn};

/// Semantic hits folded into the seed-docs section.
pub const SEED_DOC_COUNT: usize = 3;
/// Stores folded into the nearby-stores section.
pub const NEARBY_STORE_COUNT: usize = 3;
/// Purchases folded into the past-purchases section.
pub const RECENT_PURCHASE_COUNT: usize = 5;

/// Separator between sections: exactly one blank line.
const SECTION_SEPARATOR: &str = "\n\n";

/// The three context sections, in composition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    SeedDocs,
    NearbyStores,
    PastPurchases,
}

impl Section {
    /// The section's context label.
    pub fn label(self) -> &'static str {
        match self {
            Section::SeedDocs => "Seed docs",
            Section::NearbyStores => "Nearby stores",
            Section::PastPurchases => "Past purchases",
        }
    }
}

/// A section omitted by [`ContextComposer::compose_degraded`].
#[derive(Debug, Clone)]
pub struct SkippedSection {
    pub section: Section,
    pub reason: String,
}

/// The result of a degraded composition.
#[derive(Debug, Clone, Default)]
pub struct Composition {
    /// The composed context (possibly empty).
    pub context: String,
    /// Sections dropped because their collaborator failed.
    pub skipped: Vec<SkippedSection>,
}

/// Composes retrieval, geo ranking, and purchase history into one
/// context string.
pub struct ContextComposer {
    index: Arc<SemanticIndex>,
    catalog: Arc<dyn StoreCatalog>,
    purchases: Arc<dyn PurchaseStore>,
}

impl ContextComposer {
    pub fn new(
        index: Arc<SemanticIndex>,
        catalog: Arc<dyn StoreCatalog>,
        purchases: Arc<dyn PurchaseStore>,
    ) -> Self {
        Self {
            index,
            catalog,
            purchases,
        }
    }

    /// Compose the context strictly: the first section error propagates.
    pub async fn compose(
        &self,
        masked_message: &str,
        user_id: Option<&str>,
        location: Option<GeoPoint>,
    ) -> Result<String, Error> {
        let mut sections = Vec::new();

        if let Some(section) = self.seed_docs_section(masked_message).await? {
            sections.push(section);
        }
        if let Some(location) = location
            && let Some(section) = self.nearby_stores_section(location).await?
        {
            sections.push(section);
        }
        if let Some(user_id) = user_id
            && let Some(section) = self.past_purchases_section(user_id).await?
        {
            sections.push(section);
        }

        Ok(sections.join(SECTION_SEPARATOR))
    }

    /// Compose with per-section fallback: a failing section is omitted
    /// and recorded, never failing the request.
    pub async fn compose_degraded(
        &self,
        masked_message: &str,
        user_id: Option<&str>,
        location: Option<GeoPoint>,
    ) -> Composition {
        let mut sections = Vec::new();
        let mut skipped = Vec::new();

        match self.seed_docs_section(masked_message).await {
            Ok(Some(section)) => sections.push(section),
            Ok(None) => {}
            Err(e) => skip(&mut skipped, Section::SeedDocs, e),
        }

        if let Some(location) = location {
            match self.nearby_stores_section(location).await {
                Ok(Some(section)) => sections.push(section),
                Ok(None) => {}
                Err(e) => skip(&mut skipped, Section::NearbyStores, e),
            }
        }

        if let Some(user_id) = user_id {
            match self.past_purchases_section(user_id).await {
                Ok(Some(section)) => sections.push(section),
                Ok(None) => {}
                Err(e) => skip(&mut skipped, Section::PastPurchases, e),
            }
        }

        debug!(
            sections = sections.len(),
            skipped = skipped.len(),
            "context composed"
        );

        Composition {
            context: sections.join(SECTION_SEPARATOR),
            skipped,
        }
    }

    /// Top semantic hits for the masked message, or `None` when there are
    /// no hits to show.
    async fn seed_docs_section(&self, masked_message: &str) -> Result<Option<String>, Error> {
        let hits = self.index.retrieve(masked_message, SEED_DOC_COUNT).await?;
        if hits.is_empty() {
            return Ok(None);
        }

        let texts: Vec<&str> = hits.iter().map(|h| h.document.text.as_str()).collect();
        Ok(Some(format!("Seed docs:\n{}", texts.join("\n"))))
    }

    /// Nearest stores with promos, or `None` when the catalog is empty.
    async fn nearby_stores_section(&self, location: GeoPoint) -> Result<Option<String>, Error> {
        let stores = self.catalog.load_stores().await?;
        if stores.is_empty() {
            return Ok(None);
        }

        let ranked = shopclerk_geo::nearest(location, &stores, NEARBY_STORE_COUNT)?;
        if ranked.is_empty() {
            return Ok(None);
        }

        let lines: Vec<String> = ranked
            .iter()
            .map(|r| {
                let promos: Vec<&str> = r.store.promos.iter().map(|p| p.desc.as_str()).collect();
                format!(
                    "- {} ({}m away) | Promos: {}",
                    r.store.name,
                    r.distance_m,
                    promos.join(", ")
                )
            })
            .collect();
        Ok(Some(format!("Nearby stores:\n{}", lines.join("\n"))))
    }

    /// Recent purchases, newest first, or `None` when the user has none.
    async fn past_purchases_section(&self, user_id: &str) -> Result<Option<String>, Error> {
        let purchases = self
            .purchases
            .recent_purchases(user_id, RECENT_PURCHASE_COUNT)
            .await?;
        if purchases.is_empty() {
            return Ok(None);
        }

        let lines: Vec<String> = purchases
            .iter()
            .map(|p| {
                format!(
                    "- {} at {} | {}",
                    p.store_name,
                    p.timestamp.format("%Y-%m-%d"),
                    p.category
                )
            })
            .collect();
        Ok(Some(format!("Past purchases:\n{}", lines.join("\n"))))
    }
}

fn skip(skipped: &mut Vec<SkippedSection>, section: Section, error: Error) {
    warn!(section = section.label(), error = %error, "omitting context section");
    skipped.push(SkippedSection {
        section,
        reason: error.to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use shopclerk_core::{
        Document, EmbeddingProvider, NewPurchase, Promo, ProviderError, Purchase, Store,
        StoreError, User,
    };

    // ── Test collaborators ────────────────────────────────────────────

    struct StubEmbedder;

    #[async_trait]
    impl EmbeddingProvider for StubEmbedder {
        fn name(&self) -> &str {
            "stub"
        }

        async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
            // Orthogonal-ish deterministic vectors keyed on first byte.
            Ok(texts
                .iter()
                .map(|t| match t.bytes().next().unwrap_or(0) % 3 {
                    0 => vec![1.0, 0.0, 0.0],
                    1 => vec![0.6, 0.8, 0.0],
                    _ => vec![0.0, 0.6, 0.8],
                })
                .collect())
        }
    }

    struct StaticCatalog(Vec<Store>);

    #[async_trait]
    impl StoreCatalog for StaticCatalog {
        async fn load_stores(&self) -> Result<Vec<Store>, StoreError> {
            Ok(self.0.clone())
        }
    }

    struct FailingCatalog;

    #[async_trait]
    impl StoreCatalog for FailingCatalog {
        async fn load_stores(&self) -> Result<Vec<Store>, StoreError> {
            Err(StoreError::Storage("catalog unreadable".into()))
        }
    }

    struct StaticPurchases(Vec<Purchase>);

    #[async_trait]
    impl PurchaseStore for StaticPurchases {
        async fn get_or_create_user(&self, user_id: &str) -> Result<User, StoreError> {
            Ok(User {
                user_id: user_id.into(),
                first_name: None,
                last_name: None,
                created_at: Utc::now(),
            })
        }

        async fn record_purchase(
            &self,
            _user_id: &str,
            _purchase: NewPurchase,
        ) -> Result<Purchase, StoreError> {
            Err(StoreError::Storage("read-only".into()))
        }

        async fn recent_purchases(
            &self,
            _user_id: &str,
            limit: usize,
        ) -> Result<Vec<Purchase>, StoreError> {
            Ok(self.0.iter().take(limit).cloned().collect())
        }
    }

    struct FailingPurchases;

    #[async_trait]
    impl PurchaseStore for FailingPurchases {
        async fn get_or_create_user(&self, _user_id: &str) -> Result<User, StoreError> {
            Err(StoreError::QueryFailed("db down".into()))
        }

        async fn record_purchase(
            &self,
            _user_id: &str,
            _purchase: NewPurchase,
        ) -> Result<Purchase, StoreError> {
            Err(StoreError::QueryFailed("db down".into()))
        }

        async fn recent_purchases(
            &self,
            _user_id: &str,
            _limit: usize,
        ) -> Result<Vec<Purchase>, StoreError> {
            Err(StoreError::QueryFailed("db down".into()))
        }
    }

    fn stores() -> Vec<Store> {
        vec![
            Store {
                name: "Y".into(),
                lat: 0.0,
                lng: 1.0,
                promos: vec![],
            },
            Store {
                name: "X".into(),
                lat: 0.0,
                lng: 0.0,
                promos: vec![Promo {
                    desc: "free cocoa".into(),
                }],
            },
        ]
    }

    fn purchases() -> Vec<Purchase> {
        vec![Purchase {
            user_id: "u1".into(),
            store_name: "X".into(),
            category: "Hot Cocoa".into(),
            amount: 3.0,
            timestamp: Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
        }]
    }

    async fn built_index(dir: &tempfile::TempDir) -> Arc<SemanticIndex> {
        let index = Arc::new(SemanticIndex::new(
            Arc::new(StubEmbedder),
            dir.path().join("test.index"),
            dir.path().join("test.meta.json"),
        ));
        index
            .build(vec![
                Document::new("a.txt", "Store hours are 9-5."),
                Document::new("b.txt", "Returns accepted for 30 days."),
            ])
            .await
            .unwrap();
        index
    }

    fn unloaded_index() -> Arc<SemanticIndex> {
        Arc::new(SemanticIndex::new(
            Arc::new(StubEmbedder),
            "/nonexistent/x.index",
            "/nonexistent/x.meta.json",
        ))
    }

    // ── Tests ─────────────────────────────────────────────────────────

    #[tokio::test]
    async fn all_three_sections_in_fixed_order() {
        let dir = tempfile::tempdir().unwrap();
        let composer = ContextComposer::new(
            built_index(&dir).await,
            Arc::new(StaticCatalog(stores())),
            Arc::new(StaticPurchases(purchases())),
        );

        let context = composer
            .compose("where can I buy cocoa", Some("u1"), Some(GeoPoint::new(0.0, 0.0)))
            .await
            .unwrap();

        let seed = context.find("Seed docs:").unwrap();
        let near = context.find("Nearby stores:").unwrap();
        let past = context.find("Past purchases:").unwrap();
        assert!(seed < near && near < past);
        assert!(context.contains("- X (0m away) | Promos: free cocoa"));
        assert!(context.contains("- X at 2026-01-15 | Hot Cocoa"));
    }

    #[tokio::test]
    async fn sections_joined_by_single_blank_line() {
        let dir = tempfile::tempdir().unwrap();
        let composer = ContextComposer::new(
            built_index(&dir).await,
            Arc::new(StaticCatalog(stores())),
            Arc::new(StaticPurchases(purchases())),
        );

        let context = composer
            .compose("hi", Some("u1"), Some(GeoPoint::new(0.0, 0.0)))
            .await
            .unwrap();

        assert_eq!(context.matches("\n\n").count(), 2);
        assert!(!context.contains("\n\n\n"));
    }

    #[tokio::test]
    async fn absent_inputs_produce_no_headers() {
        let dir = tempfile::tempdir().unwrap();
        let composer = ContextComposer::new(
            built_index(&dir).await,
            Arc::new(StaticCatalog(stores())),
            Arc::new(StaticPurchases(purchases())),
        );

        let context = composer.compose("hi", None, None).await.unwrap();
        assert!(context.starts_with("Seed docs:"));
        assert!(!context.contains("Nearby stores:"));
        assert!(!context.contains("Past purchases:"));
    }

    #[tokio::test]
    async fn empty_catalog_omits_store_section() {
        let dir = tempfile::tempdir().unwrap();
        let composer = ContextComposer::new(
            built_index(&dir).await,
            Arc::new(StaticCatalog(vec![])),
            Arc::new(StaticPurchases(vec![])),
        );

        let context = composer
            .compose("hi", Some("u1"), Some(GeoPoint::new(0.0, 0.0)))
            .await
            .unwrap();
        assert!(!context.contains("Nearby stores:"));
        assert!(!context.contains("Past purchases:"));
    }

    #[tokio::test]
    async fn strict_compose_propagates_index_error() {
        let composer = ContextComposer::new(
            unloaded_index(),
            Arc::new(StaticCatalog(stores())),
            Arc::new(StaticPurchases(purchases())),
        );

        let err = composer.compose("hi", None, None).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Index(shopclerk_core::IndexError::NotLoaded)
        ));
    }

    #[tokio::test]
    async fn strict_compose_propagates_invalid_coordinate() {
        let dir = tempfile::tempdir().unwrap();
        let composer = ContextComposer::new(
            built_index(&dir).await,
            Arc::new(StaticCatalog(stores())),
            Arc::new(StaticPurchases(purchases())),
        );

        let err = composer
            .compose("hi", None, Some(GeoPoint::new(200.0, 0.0)))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Geo(_)));
    }

    #[tokio::test]
    async fn degraded_compose_omits_failing_sections() {
        let dir = tempfile::tempdir().unwrap();
        let composer = ContextComposer::new(
            built_index(&dir).await,
            Arc::new(FailingCatalog),
            Arc::new(FailingPurchases),
        );

        let result = composer
            .compose_degraded("hi", Some("u1"), Some(GeoPoint::new(0.0, 0.0)))
            .await;

        assert!(result.context.starts_with("Seed docs:"));
        assert!(!result.context.contains("Nearby stores:"));
        assert_eq!(result.skipped.len(), 2);
        assert_eq!(result.skipped[0].section, Section::NearbyStores);
        assert_eq!(result.skipped[1].section, Section::PastPurchases);
        assert!(result.skipped[0].reason.contains("catalog unreadable"));
    }

    #[tokio::test]
    async fn degraded_compose_survives_unloaded_index() {
        let composer = ContextComposer::new(
            unloaded_index(),
            Arc::new(StaticCatalog(stores())),
            Arc::new(StaticPurchases(purchases())),
        );

        let result = composer
            .compose_degraded("hi", Some("u1"), Some(GeoPoint::new(0.0, 0.0)))
            .await;

        assert!(!result.context.contains("Seed docs:"));
        assert!(result.context.contains("Nearby stores:"));
        assert!(result.context.contains("Past purchases:"));
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].section, Section::SeedDocs);
    }

    #[tokio::test]
    async fn purchase_lines_capped_at_limit() {
        let dir = tempfile::tempdir().unwrap();
        let many: Vec<Purchase> = (0..9)
            .map(|i| Purchase {
                user_id: "u1".into(),
                store_name: format!("Store {i}"),
                category: "Coffee".into(),
                amount: 1.0,
                timestamp: Utc.with_ymd_and_hms(2026, 1, 1 + i, 8, 0, 0).unwrap(),
            })
            .collect();
        let composer = ContextComposer::new(
            built_index(&dir).await,
            Arc::new(StaticCatalog(vec![])),
            Arc::new(StaticPurchases(many)),
        );

        let context = composer.compose("hi", Some("u1"), None).await.unwrap();
        let lines = context
            .lines()
            .filter(|l| l.starts_with("- Store"))
            .count();
        assert_eq!(lines, RECENT_PURCHASE_COUNT);
    }
}
