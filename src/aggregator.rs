//! `FoodSearch`: local results first, external providers only when local
//! coverage is thin, one deduplicated page out.

use crate::api_connection::ApiConnectionError;
use crate::config::{SearchConfig, DEFAULT_EXTERNAL_THRESHOLD};
use crate::errors::{SearchError, StoreError};
use crate::models::{to_food_candidate, FoodCandidate, FoodSource};
use crate::providers::{
    NutritionProvider, NutritionixProvider, OpenFoodFactsProvider, ProviderOutcome, ProviderQuery, UsdaProvider,
};
use crate::query_normalizer::normalize;
use crate::search::{search_local, FoodStore};
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

pub const MAX_PAGE_SIZE: u32 = 200;

pub struct FoodSearch {
    store: Arc<dyn FoodStore>,
    providers: Vec<Arc<dyn NutritionProvider>>,
    external_threshold: usize,
}

impl FoodSearch {
    /// Local-only search; add providers with [`FoodSearch::with_providers`].
    pub fn new(store: Arc<dyn FoodStore>) -> Self {
        Self {
            store,
            providers: Vec::new(),
            external_threshold: DEFAULT_EXTERNAL_THRESHOLD,
        }
    }

    /// The three standard providers, in merge order: natural language, crowd
    /// database, government database.
    pub fn from_config(store: Arc<dyn FoodStore>, config: &SearchConfig) -> Self {
        let providers: Vec<Arc<dyn NutritionProvider>> = vec![
            Arc::new(NutritionixProvider::new(&config.nutritionix)),
            Arc::new(OpenFoodFactsProvider::new(&config.open_food_facts)),
            Arc::new(UsdaProvider::new(&config.usda)),
        ];
        Self::new(store)
            .with_providers(providers)
            .with_external_threshold(config.external_threshold)
    }

    /// Providers are merged in the order given here, whatever order they answer in.
    pub fn with_providers(mut self, providers: Vec<Arc<dyn NutritionProvider>>) -> Self {
        self.providers = providers;
        self
    }

    pub fn with_external_threshold(mut self, threshold: usize) -> Self {
        self.external_threshold = threshold;
        self
    }

    /// Searches for `raw_query`, returning at most `page_size` candidates with
    /// no two sharing a `(source, source_id)`. Provider failures only shrink
    /// the result; store faults and invalid paging are errors.
    pub async fn search_foods(
        &self,
        raw_query: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<FoodCandidate>, SearchError> {
        if page == 0 {
            return Err(SearchError::InvalidPage(page));
        }
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(SearchError::InvalidPageSize {
                got: page_size,
                max: MAX_PAGE_SIZE,
            });
        }

        let Some(query) = normalize(raw_query) else {
            return Ok(Vec::new());
        };
        let offset = (page as usize - 1) * page_size as usize;

        let local = search_local(self.store.as_ref(), &query, offset, page_size as usize)?;
        let local_count = local.len();

        let mut seen: HashSet<(FoodSource, String)> = HashSet::new();
        let mut results = Vec::with_capacity(page_size as usize);
        append_unseen(&mut results, &mut seen, local);

        if local_count < self.external_threshold && !self.providers.is_empty() {
            let provider_query = ProviderQuery {
                raw: raw_query,
                page,
                page_size,
            };
            for outcome in self.fan_out(&provider_query).await {
                append_unseen(&mut results, &mut seen, outcome.into_candidates());
            }
        } else {
            debug!(local_count, threshold = self.external_threshold, "Skipping external providers");
        }

        results.truncate(page_size as usize);
        Ok(results)
    }

    /// The local food with this barcode, if any.
    pub fn lookup_barcode(&self, code: &str) -> Result<Option<FoodCandidate>, StoreError> {
        let code = code.trim();
        if code.is_empty() {
            return Ok(None);
        }
        Ok(self.store.find_by_barcode(code)?.as_ref().map(to_food_candidate))
    }

    /// Calls every provider concurrently, each bounded by its own timeout.
    /// Outcomes come back in provider order.
    async fn fan_out(&self, query: &ProviderQuery<'_>) -> Vec<ProviderOutcome> {
        let calls = self.providers.iter().map(|provider| async move {
            let outcome = match tokio::time::timeout(provider.timeout(), provider.search(query)).await {
                Ok(outcome) => outcome,
                Err(_) => ProviderOutcome::Failed(ApiConnectionError::Timeout),
            };
            let source = provider.source();
            match &outcome {
                ProviderOutcome::Found(found) => {
                    debug!(provider = provider.name(), %source, count = found.len(), "Provider answered")
                }
                ProviderOutcome::Skipped(reason) => {
                    debug!(provider = provider.name(), %source, reason, "Provider skipped")
                }
                ProviderOutcome::Failed(err) => {
                    warn!(provider = provider.name(), %source, error = %err, "Provider failed, continuing without it")
                }
            }
            outcome
        });
        let outcomes = join_all(calls).await;
        let failed = outcomes.iter().filter(|outcome| outcome.is_failure()).count();
        if failed > 0 && failed == outcomes.len() {
            warn!(failed, "Every external provider failed; returning local results only");
        }
        outcomes
    }
}

fn append_unseen(
    results: &mut Vec<FoodCandidate>,
    seen: &mut HashSet<(FoodSource, String)>,
    candidates: Vec<FoodCandidate>,
) {
    for candidate in candidates {
        if seen.insert((candidate.source, candidate.source_id.clone())) {
            results.push(candidate);
        }
    }
}
