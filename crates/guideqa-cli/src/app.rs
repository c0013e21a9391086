//! Application wiring from configuration.

use crate::config::Config;
use anyhow::{Result, bail};
use guideqa_core::{
    Backend, BackendClient, EvalRunner, KeyValueStore, QueryFlow, QueryFlowConfig, SqliteStore,
};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// Everything a command needs.
pub struct App {
    pub flow: QueryFlow,
    pub config: Config,
    backend: Arc<dyn Backend>,
}

impl App {
    /// Open the durable and session stores and connect the backend client.
    pub fn open(config: Config) -> Result<Self> {
        let backend: Arc<dyn Backend> = Arc::new(BackendClient::new(
            config.api_base.clone(),
            config.request_timeout(),
        )?);
        let durable = open_store(&config.durable_path(), config.store_quota_bytes)?;
        let ephemeral = open_store(&config.session_path, config.store_quota_bytes)?;

        tracing::debug!(
            target: "guideqa::startup",
            "Stores: {} (durable), {} (session)",
            config.durable_path().display(),
            config.session_path.display()
        );

        Ok(Self::with_parts(config, backend, durable, ephemeral))
    }

    /// Assemble from explicit parts.
    pub fn with_parts(
        config: Config,
        backend: Arc<dyn Backend>,
        durable: Arc<dyn KeyValueStore>,
        ephemeral: Arc<dyn KeyValueStore>,
    ) -> Self {
        let flow_config = QueryFlowConfig {
            default_top_k: config.top_k,
            debug_return_evidence: config.debug_return_evidence,
            patch_fallback: config.patch_fallback,
        };
        let flow = QueryFlow::new(backend.clone(), durable, ephemeral, flow_config);

        Self {
            flow,
            config,
            backend,
        }
    }

    pub fn eval_runner(&self) -> EvalRunner {
        EvalRunner::new(self.backend.clone(), self.config.top_k)
            .with_debug_evidence(self.config.debug_return_evidence)
    }

    /// Resolve a full id or a unique id prefix against stored history.
    pub fn resolve_id(&self, text: &str) -> Result<Uuid> {
        if let Ok(id) = Uuid::parse_str(text) {
            return Ok(id);
        }

        let prefix = text.to_lowercase();
        let matches: Vec<Uuid> = self
            .flow
            .history()
            .load()
            .iter()
            .map(|item| item.id)
            .filter(|id| id.to_string().starts_with(&prefix))
            .collect();

        match matches.as_slice() {
            [id] => Ok(*id),
            [] => bail!("No history item matches '{}'", text),
            _ => bail!(
                "'{}' matches {} history items; use more characters",
                text,
                matches.len()
            ),
        }
    }
}

fn open_store(path: &Path, quota: Option<usize>) -> Result<Arc<dyn KeyValueStore>> {
    let mut store = SqliteStore::open(path)?;
    if let Some(bytes) = quota {
        store = store.with_quota(bytes);
    }
    let store: Arc<dyn KeyValueStore> = Arc::new(store);
    Ok(store)
}
