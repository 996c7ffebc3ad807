//! Shared state for command handlers: config, catalog, store and the
//! optional commerce API.

use std::sync::Arc;

use anyhow::Context as _;
use cartmirror_core::{load_catalog, AppConfig, ProductCatalog};
use cartmirror_extract::{CartApiClient, CommerceApi, ExtractSettings, Extractor};
use cartmirror_widget::{
    build_extractor, CartMirror, LocalStore, MirrorSettings, MutationGateway, RenderTarget,
    SharedPage,
};

pub(crate) struct AppContext {
    pub(crate) config: AppConfig,
    pub(crate) catalog: Arc<ProductCatalog>,
    pub(crate) api: Option<Arc<dyn CommerceApi>>,
    pub(crate) store: LocalStore,
}

impl AppContext {
    /// Loads the catalog, opens the local store and builds the API client
    /// when `api_base_url` is configured.
    ///
    /// A missing catalog file is not fatal: slugs then pass through as
    /// product IDs. A catalog that exists but fails validation is.
    pub(crate) fn load(config: AppConfig) -> anyhow::Result<Self> {
        let catalog = if config.catalog_path.exists() {
            load_catalog(&config.catalog_path)?
        } else {
            tracing::warn!(
                path = %config.catalog_path.display(),
                "catalog file not found, using empty catalog"
            );
            ProductCatalog::default()
        };

        let store = LocalStore::open(&config.store_path)
            .with_context(|| format!("opening store {}", config.store_path.display()))?;

        let api = match &config.api_base_url {
            Some(base_url) => {
                let client = CartApiClient::new(
                    base_url,
                    config.request_timeout_secs,
                    &config.user_agent,
                    config.api_token.clone(),
                    config.max_retries,
                    config.retry_backoff_base_secs,
                )?;
                tracing::info!(base_url, "using commerce API");
                Some(Arc::new(client) as Arc<dyn CommerceApi>)
            }
            None => {
                tracing::info!(
                    store = %config.store_path.display(),
                    "no API configured, using local fallback cart"
                );
                None
            }
        };

        tracing::debug!(
            env = ?config.env,
            products = catalog.len(),
            "cli context ready"
        );

        Ok(Self {
            config,
            catalog: Arc::new(catalog),
            api,
            store,
        })
    }

    pub(crate) fn extractor(&self) -> Extractor {
        build_extractor(
            Arc::clone(&self.catalog),
            &ExtractSettings::from_config(&self.config),
            self.api.clone(),
            &self.store,
        )
    }

    pub(crate) fn gateway(&self) -> MutationGateway {
        MutationGateway::new(
            self.api.clone(),
            self.store.clone(),
            self.config.currency.clone(),
        )
    }

    pub(crate) fn mirror_settings(&self) -> MirrorSettings {
        MirrorSettings::from_config(&self.config)
    }

    /// A mirror over `page`, using the API for metadata when configured.
    pub(crate) fn mirror(&self, page: SharedPage, target: Box<dyn RenderTarget>) -> CartMirror {
        let mirror = CartMirror::new(
            self.extractor(),
            Arc::new(page),
            target,
            self.gateway(),
            &self.mirror_settings(),
        );
        match &self.api {
            Some(api) => mirror.with_api(Arc::clone(api)),
            None => mirror,
        }
    }
}
