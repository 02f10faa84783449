//! Subcommand implementations
//!
//! Each command works on an owned snapshot of the collection read from
//! disk; nothing is written unless the caller asks for it.

use anyhow::{Context, Result};
use reqflow_batch::{
    BatchConfig, BatchExecutor, BatchOperationResult, EngineConfig, InMemoryRepository, Notifier,
    Repository, ToastReporter,
};
use reqflow_index::{FilterExpr, IndexSettings, JsonFileSettingsStore, MultiFieldIndex};
use reqflow_model::{LevelNumber, OverallReviewStatus, Requirement, RequirementPatch, ReviewStatus};
use reqflow_review::{compute_overall_status, LevelDecision, ReviewStateMachine};
use std::path::Path;
use std::sync::Arc;

/// Settings key used when no view is named
pub const DEFAULT_VIEW: &str = "requirements";

/// Read a JSON array of requirements
///
/// # Errors
/// Returns error if the file cannot be read or parsed
pub fn load_requirements(path: &Path) -> Result<Vec<Requirement>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

/// Write requirements as a pretty JSON array
///
/// # Errors
/// Returns error if the file cannot be written
pub fn save_requirements(path: &Path, items: &[Requirement]) -> Result<()> {
    let raw = serde_json::to_string_pretty(items)?;
    std::fs::write(path, raw).with_context(|| format!("writing {}", path.display()))
}

/// Load engine configuration, defaults when no file is given
///
/// # Errors
/// Returns error if the file cannot be read or parsed
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

/// Fields to index for a view
///
/// Stored view settings win over the configuration. When a settings file
/// is given but has no entry for the view, the configured fields are
/// stored there.
///
/// # Errors
/// Returns error if the settings file cannot be read or written
pub fn resolve_indexed_fields(
    config: &EngineConfig,
    settings: Option<&Path>,
    view: &str,
) -> Result<Vec<String>> {
    let Some(path) = settings else {
        return Ok(config.indexed_fields.clone());
    };

    let store = JsonFileSettingsStore::open(path)
        .with_context(|| format!("opening settings {}", path.display()))?;
    if let Some(stored) = IndexSettings::load(&store, view)? {
        tracing::debug!(view, fields = ?stored.indexed_fields, "Using stored index settings");
        return Ok(stored.indexed_fields);
    }

    IndexSettings::with_fields(&config.indexed_fields).save(&store, view)?;
    tracing::info!(view, "Stored default index settings");
    Ok(config.indexed_fields.clone())
}

/// Requirements matching `filter`, in id order
///
/// Fields named by the filter are indexed alongside `fields`.
///
/// # Errors
/// Returns error if two requirements share an id
pub fn select(
    items: Vec<Requirement>,
    fields: &[String],
    filter: Option<&FilterExpr>,
) -> Result<Vec<Requirement>> {
    let mut indexed: Vec<String> = fields.to_vec();
    if let Some(filter) = filter {
        for field in filter.fields() {
            if !indexed.iter().any(|f| f == field) {
                indexed.push(field.to_string());
            }
        }
    }

    let index = MultiFieldIndex::from_items(items, &indexed)?;
    let ids = match filter {
        Some(filter) => index.evaluate(filter),
        None => index.all_ids().clone(),
    };
    tracing::debug!(matched = ids.len(), total = index.len(), "Selection evaluated");
    Ok(index.get_items(&ids).into_iter().cloned().collect())
}

/// Parameters of a review run
#[derive(Debug, Clone)]
pub struct ReviewRequest {
    /// Level to write
    pub level: LevelNumber,
    /// Status to write
    pub status: ReviewStatus,
    /// Opinion to store; `None` keeps the existing one
    pub opinion: Option<String>,
    /// Chunk size override
    pub batch_size: Option<usize>,
    /// Delay override in milliseconds
    pub delay_ms: Option<u64>,
}

impl ReviewRequest {
    fn batch_config(&self, defaults: &BatchConfig) -> BatchConfig {
        let mut config = defaults.clone();
        config.operation_name = format!("Review level {} {}", self.level, self.status);
        if let Some(size) = self.batch_size {
            config.batch_size = size;
        }
        if let Some(delay) = self.delay_ms {
            config.batch_delay_ms = delay;
        }
        config
    }
}

/// Outcome of a review run
#[derive(Debug)]
pub struct ReviewReport {
    /// Per-item results
    pub result: BatchOperationResult<Requirement>,
    /// Whole collection after the run, in id order
    pub collection: Vec<Requirement>,
}

/// Apply a review decision to every selected requirement
///
/// `collection` seeds the in-memory store; `selected` must be a subset.
///
/// # Errors
/// Returns error only when the batch itself aborts
pub async fn run_review(
    collection: Vec<Requirement>,
    selected: Vec<Requirement>,
    request: &ReviewRequest,
    config: &EngineConfig,
    notifier: Arc<dyn Notifier>,
) -> Result<ReviewReport> {
    let repository = Arc::new(InMemoryRepository::with_items(collection));
    let machine = ReviewStateMachine::new(config.transition_policy);
    let mut decision = LevelDecision::new(request.level, request.status);
    decision.opinion.clone_from(&request.opinion);

    let executor = BatchExecutor::new(Arc::new(ToastReporter::new(notifier)));
    let batch_config = request.batch_config(&config.batch);

    let result = executor
        .execute(
            selected,
            |item: Requirement| {
                let repository = repository.clone();
                let patch = machine.apply_decision(&item, &decision);
                async move {
                    let patch: RequirementPatch = patch?.into();
                    repository.apply(&item.id, &patch).await?;
                    Ok(())
                }
            },
            &batch_config,
        )
        .await?;

    for failed in result.failed() {
        tracing::warn!(item = %failed.item.id, "{:#}", failed.error);
    }

    Ok(ReviewReport {
        result,
        collection: repository.snapshot(),
    })
}

/// `id<TAB>overall status` per requirement
#[must_use]
pub fn status_lines(items: &[Requirement]) -> Vec<String> {
    items
        .iter()
        .map(|item| {
            let status: OverallReviewStatus = compute_overall_status(item);
            format!("{}\t{status}", item.id)
        })
        .collect()
}
