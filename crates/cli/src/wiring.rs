//! Builds the routine and its collaborators from a [`Config`].

use std::sync::Arc;

use deforest_routine::adapter::countries::ListCatalog;
use deforest_routine::adapter::glad::GladSource;
use deforest_routine::adapter::maps::MapLoader;
use deforest_routine::adapter::publish::{DirPublisher, DisabledPublisher, WebhookPublisher};
use deforest_routine::adapter::static_adapter::StaticMeasurement;
use deforest_routine::{
    Collaborators, CountryCatalog, MeasurementSource, Publisher, Routine, StatusLog,
};
use deforest_storage::{JsonlStore, MemoryStore, ProgressStore};

use crate::config::{Config, MeasurementKind, PublisherKind, StorageKind};

/// Open the configured progress store.
pub async fn build_store(config: &Config) -> Result<Arc<dyn ProgressStore>, String> {
    match config.storage.kind {
        StorageKind::Memory => Ok(Arc::new(MemoryStore::new())),
        StorageKind::File => {
            let store = JsonlStore::open(&config.storage.dir)
                .await
                .map_err(|e| format!("storage unavailable: {}", e))?;
            Ok(Arc::new(store))
        }
    }
}

fn build_catalog(config: &Config) -> Result<ListCatalog, String> {
    let catalog = ListCatalog::load(&config.countries.list, &config.maps.template)
        .map_err(|e| e.to_string())?;
    Ok(match &config.countries.details_url {
        Some(url) => catalog.with_details_url(url),
        None => catalog,
    })
}

fn build_source(config: &Config, catalog: &ListCatalog) -> Arc<dyn MeasurementSource> {
    let m = &config.measurement;
    match m.kind {
        MeasurementKind::Static => Arc::new(StaticMeasurement::new(m.static_area_km2)),
        MeasurementKind::Glad => {
            let codes = if m.codes.is_empty() {
                catalog.list().iter().map(|c| c.code.clone()).collect()
            } else {
                m.codes.clone()
            };
            Arc::new(GladSource::new(&m.base_url, codes, m.auth_token.clone()))
        }
    }
}

fn build_publisher(config: &Config) -> Result<Arc<dyn Publisher>, String> {
    let p = &config.publisher;
    match p.kind {
        PublisherKind::Dir => Ok(Arc::new(DirPublisher::new(p.dir.clone()))),
        PublisherKind::Webhook => {
            let url = p
                .url
                .as_deref()
                .ok_or("publisher.url is required when publisher.kind = \"webhook\"")?;
            Ok(Arc::new(WebhookPublisher::new(url, p.auth_token.clone())))
        }
        PublisherKind::Disabled => Ok(Arc::new(DisabledPublisher)),
    }
}

/// Wire a [`Routine`] around `store`, reporting into `status`.
pub fn build_routine(
    config: &Config,
    store: Arc<dyn ProgressStore>,
    status: Arc<StatusLog>,
) -> Result<Routine, String> {
    let settings = config.routine_settings()?;
    let catalog = build_catalog(config)?;
    let source = build_source(config, &catalog);
    let publisher = build_publisher(config)?;

    tracing::debug!(
        countries = catalog.list().len(),
        source = source.adapter_id(),
        publisher = publisher.adapter_id(),
        "routine wired"
    );

    let collaborators = Collaborators {
        store,
        source,
        catalog: Arc::new(catalog),
        maps: Arc::new(MapLoader::new()),
        publisher,
    };
    Ok(Routine::new(collaborators, settings, status))
}
