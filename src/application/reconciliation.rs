//! Reconciliation engine: normalized records against the canonical catalog
//!
//! Two-tier matching. Tier 1 is deterministic: the source's own external id
//! already mapped onto a canonical record. Tier 2 is fuzzy: canonical
//! records within a small radius whose normalized names are substring
//! related. Exactly one fuzzy candidate merges; several is an ambiguous
//! skip rather than a guess. Reconciliation is idempotent per external id,
//! so re-processing a page after an aborted run is safe.

use std::sync::Arc;

use anyhow::Result;

use crate::domain::constants::matching::FUZZY_MATCH_RADIUS_METERS;
use crate::domain::local_food::{self, LocalFoodCategoryId};
use crate::domain::repositories::RestaurantCatalog;
use crate::domain::restaurant::{CanonicalRestaurant, NormalizedRecord, ReconcileOutcome};

pub struct ReconciliationEngine {
    catalog: Arc<dyn RestaurantCatalog>,
}

impl ReconciliationEngine {
    pub fn new(catalog: Arc<dyn RestaurantCatalog>) -> Self {
        Self { catalog }
    }

    /// Resolves one normalized record: update, merge, create, or skip.
    pub async fn reconcile(&self, record: &NormalizedRecord) -> Result<ReconcileOutcome> {
        let match_name = local_food::normalize_text(&record.name);
        if match_name.is_empty() {
            tracing::warn!(source = %record.source, external_id = %record.external_id,
                "record name empty after normalization, skipping");
            return Ok(ReconcileOutcome::SkippedInvalid);
        }

        let tag = detect_tag(record);

        // Tier 1: the source already knows this record.
        if let Some(mut existing) = self
            .catalog
            .find_by_external_id(record.source, &record.external_id)
            .await?
        {
            existing.merge_from(record, tag);
            self.catalog.update(&existing).await?;
            tracing::debug!(id = existing.id, source = %record.source, "updated by external id");
            return Ok(ReconcileOutcome::Updated(existing.id));
        }

        // Tier 2: nearby records with a related name.
        let nearby = self
            .catalog
            .find_within_radius(record.latitude, record.longitude, FUZZY_MATCH_RADIUS_METERS)
            .await?;
        let candidates: Vec<&CanonicalRestaurant> = nearby
            .iter()
            .filter(|existing| names_match(&match_name, &existing.name))
            .collect();

        match candidates.as_slice() {
            [] => {
                let created = CanonicalRestaurant::from_normalized(record, tag);
                let id = self.catalog.insert(&created).await?;
                tracing::debug!(id, source = %record.source, name = %record.name, "created");
                Ok(ReconcileOutcome::Created(id))
            }
            [single] => {
                let mut merged = (*single).clone();
                merged.merge_from(record, tag);
                self.catalog.update(&merged).await?;
                tracing::debug!(id = merged.id, source = %record.source, "merged by proximity");
                Ok(ReconcileOutcome::Updated(merged.id))
            }
            several => {
                tracing::warn!(
                    source = %record.source,
                    external_id = %record.external_id,
                    name = %record.name,
                    candidates = several.len(),
                    "ambiguous fuzzy match, skipping"
                );
                Ok(ReconcileOutcome::SkippedDuplicate { candidates: several.len() })
            }
        }
    }
}

/// Regional-food tag from the record's name and menu/tag text.
fn detect_tag(record: &NormalizedRecord) -> Option<LocalFoodCategoryId> {
    let mut text = record.name.clone();
    if let Some(menu) = record.menu_text.as_deref() {
        text.push(' ');
        text.push_str(menu);
    }
    local_food::detect(&text).map(|c| c.id)
}

/// True when one normalized name contains the other. Registries disagree on
/// suffixes ("본점", "제주점"), so containment in either direction counts.
fn names_match(normalized_incoming: &str, existing_name: &str) -> bool {
    let existing = local_food::normalize_text(existing_name);
    if existing.is_empty() {
        return false;
    }
    existing.contains(normalized_incoming) || normalized_incoming.contains(&existing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::restaurant::Source;
    use crate::test_support::InMemoryCatalog;

    fn record(source: Source, external_id: &str, name: &str, lat: f64, lon: f64) -> NormalizedRecord {
        NormalizedRecord {
            source,
            external_id: external_id.to_string(),
            name: name.to_string(),
            category: "한식".to_string(),
            address: "제주시 중앙로 1".to_string(),
            latitude: lat,
            longitude: lon,
            phone: None,
            menu_text: None,
        }
    }

    fn engine() -> (ReconciliationEngine, Arc<InMemoryCatalog>) {
        let catalog = Arc::new(InMemoryCatalog::new());
        (ReconciliationEngine::new(catalog.clone()), catalog)
    }

    #[tokio::test]
    async fn unseen_record_creates() {
        let (engine, catalog) = engine();
        let outcome = engine
            .reconcile(&record(Source::TourismApi, "C1", "올래국수", 33.489, 126.498))
            .await
            .unwrap();
        assert!(matches!(outcome, ReconcileOutcome::Created(_)));
        assert_eq!(catalog.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn same_external_id_updates_idempotently() {
        let (engine, catalog) = engine();
        let rec = record(Source::TourismApi, "C1", "올래국수", 33.489, 126.498);
        engine.reconcile(&rec).await.unwrap();
        // same page ingested twice
        let outcome = engine.reconcile(&rec).await.unwrap();
        assert!(matches!(outcome, ReconcileOutcome::Updated(_)));
        assert_eq!(catalog.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn nearby_name_match_merges_across_sources() {
        let (engine, catalog) = engine();
        engine
            .reconcile(&record(Source::GoodPriceJeju, "2024-01", "올래국수", 33.4890, 126.4983))
            .await
            .unwrap();

        // ~20 m away, suffixed name, different source
        let outcome = engine
            .reconcile(&record(Source::MapSearch, "k-77", "올래국수 본점", 33.48917, 126.49830))
            .await
            .unwrap();
        let id = match outcome {
            ReconcileOutcome::Updated(id) => id,
            other => panic!("expected merge, got {other:?}"),
        };

        let merged = catalog.get(id).expect("merged record");
        assert_eq!(merged.external_ids.len(), 2);
        assert!(merged.is_good_price_store, "good-price flag must survive merge");
        assert_eq!(catalog.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn distant_same_name_creates_separate_record() {
        let (engine, catalog) = engine();
        engine
            .reconcile(&record(Source::MapSearch, "k-1", "고향식당", 33.489, 126.498))
            .await
            .unwrap();
        // same name, ~28 km away in Seogwipo
        let outcome = engine
            .reconcile(&record(Source::TourismApi, "C9", "고향식당", 33.254, 126.560))
            .await
            .unwrap();
        assert!(matches!(outcome, ReconcileOutcome::Created(_)));
        assert_eq!(catalog.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn multiple_candidates_skip_as_ambiguous() {
        let (engine, catalog) = engine();
        // Two branches of the same shop a few meters apart. Their names are
        // not substring-related, so they stay separate records.
        engine
            .reconcile(&record(Source::MapSearch, "k-1", "제주식당 본점", 33.48900, 126.49800))
            .await
            .unwrap();
        engine
            .reconcile(&record(Source::MapSearch, "k-2", "제주식당 서문점", 33.48910, 126.49805))
            .await
            .unwrap();
        assert_eq!(catalog.count().await.unwrap(), 2);

        // The bare name is contained in both branch names.
        let outcome = engine
            .reconcile(&record(Source::TourismApi, "C5", "제주식당", 33.48905, 126.49802))
            .await
            .unwrap();
        assert_eq!(outcome, ReconcileOutcome::SkippedDuplicate { candidates: 2 });
        assert_eq!(catalog.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn local_food_tag_applied_from_menu_text() {
        let (engine, catalog) = engine();
        let mut rec = record(Source::GoodPriceJeju, "2024-05", "시골집", 33.48, 126.49);
        rec.menu_text = Some("고기국수, 멸치국수".to_string());
        let outcome = engine.reconcile(&rec).await.unwrap();
        let id = match outcome {
            ReconcileOutcome::Created(id) => id,
            other => panic!("expected create, got {other:?}"),
        };
        let stored = catalog.get(id).unwrap();
        assert_eq!(stored.local_food_category, Some(LocalFoodCategoryId::GogiGuksu));
        assert!(stored.is_local_store);
    }

    #[tokio::test]
    async fn symbol_only_name_is_invalid() {
        let (engine, _) = engine();
        let outcome = engine
            .reconcile(&record(Source::MapSearch, "k-3", "※★!!", 33.48, 126.49))
            .await
            .unwrap();
        assert_eq!(outcome, ReconcileOutcome::SkippedInvalid);
    }
}
