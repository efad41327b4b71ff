use std::sync::mpsc;
use std::sync::Arc;

use crate::applicator::{apply, apply_coarse};
use crate::catalog::{CatalogError, CatalogResult, CatalogSource, ThemeDefinition};
use crate::document::StyleContext;
use crate::persistence::{KeyValueStorage, Selection, SelectionStore};
use crate::resolver::resolve_definition;

/// What happened to a catalog fetch once its result was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefinementOutcome {
    Applied,
    /// The selection changed while the fetch was in flight.
    Stale,
    /// Fetch or lookup failed; coarse styling stays.
    Failed,
}

struct PendingRefinement {
    selection: Selection,
    generation: u64,
    rx: mpsc::Receiver<CatalogResult<ThemeDefinition>>,
}

/// Owns the document root and sequences theme application: coarse styling
/// synchronously, then fine-grained variables once the catalog arrives.
pub struct ThemeRuntime<S> {
    context: StyleContext,
    store: SelectionStore<S>,
    source: Arc<dyn CatalogSource>,
    selection: Selection,
    generation: u64,
    bootstrapped: bool,
    pending: Vec<PendingRefinement>,
}

impl<S: KeyValueStorage> ThemeRuntime<S> {
    pub fn new(store: SelectionStore<S>, source: Arc<dyn CatalogSource>) -> Self {
        let selection = store.fallback().clone();
        Self {
            context: StyleContext::new(),
            store,
            source,
            selection,
            generation: 0,
            bootstrapped: false,
            pending: Vec::new(),
        }
    }

    pub fn context(&self) -> &StyleContext {
        &self.context
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Runs once per load. Later calls only log.
    pub fn bootstrap(&mut self) {
        if self.bootstrapped {
            tracing::warn!("theme bootstrap already ran; ignoring");
            return;
        }
        self.bootstrapped = true;

        self.selection = self.store.load();
        tracing::info!(
            theme_key = self.selection.theme_key.as_str(),
            theme_type = %self.selection.theme_type,
            "bootstrapping theme"
        );
        self.apply_selection();
    }

    /// User picked a new theme: persist it, restyle coarsely, refetch.
    pub fn select_theme(&mut self, selection: Selection) {
        self.store.save(&selection);
        self.selection = selection;
        self.generation = self.generation.wrapping_add(1);
        tracing::info!(
            theme_key = self.selection.theme_key.as_str(),
            theme_type = %self.selection.theme_type,
            generation = self.generation,
            "theme selection changed"
        );
        self.apply_selection();
    }

    fn apply_selection(&mut self) {
        apply_coarse(
            &mut self.context,
            &self.selection.theme_key,
            self.selection.theme_type,
        );
        self.spawn_refinement();
    }

    fn spawn_refinement(&mut self) {
        let (tx, rx) = mpsc::channel();
        let source = Arc::clone(&self.source);
        let selection = self.selection.clone();
        let worker_selection = selection.clone();

        let spawned = std::thread::Builder::new()
            .name("theme-catalog".to_string())
            .spawn(move || {
                let _ = tx.send(fetch_definition(source.as_ref(), &worker_selection));
            });
        if let Err(err) = spawned {
            tracing::warn!(?err, "failed to start catalog worker; keeping coarse styling");
            return;
        }

        self.pending.push(PendingRefinement {
            selection,
            generation: self.generation,
            rx,
        });
    }

    /// Applies every finished fetch without blocking. Outcomes follow issue
    /// order among the fetches that are ready.
    pub fn poll(&mut self) -> Vec<RefinementOutcome> {
        let mut outcomes = Vec::new();
        let mut still_pending = Vec::with_capacity(self.pending.len());

        for pending in std::mem::take(&mut self.pending) {
            match pending.rx.try_recv() {
                Ok(result) => outcomes.push(self.finish(&pending, result)),
                Err(mpsc::TryRecvError::Empty) => still_pending.push(pending),
                Err(mpsc::TryRecvError::Disconnected) => {
                    outcomes.push(self.finish(&pending, Err(CatalogError::WorkerDisconnected)));
                }
            }
        }

        self.pending = still_pending;
        outcomes
    }

    /// Blocks until every in-flight fetch has finished, handling them in
    /// issue order.
    pub fn wait(&mut self) -> Vec<RefinementOutcome> {
        let pending = std::mem::take(&mut self.pending);
        pending
            .into_iter()
            .map(|pending| {
                let result = pending
                    .rx
                    .recv()
                    .unwrap_or(Err(CatalogError::WorkerDisconnected));
                self.finish(&pending, result)
            })
            .collect()
    }

    fn finish(
        &mut self,
        pending: &PendingRefinement,
        result: CatalogResult<ThemeDefinition>,
    ) -> RefinementOutcome {
        if pending.generation != self.generation || pending.selection != self.selection {
            tracing::debug!(
                theme_key = pending.selection.theme_key.as_str(),
                generation = pending.generation,
                current_generation = self.generation,
                "discarding stale catalog result"
            );
            return RefinementOutcome::Stale;
        }

        match result {
            Ok(definition) => {
                let styles = resolve_definition(&definition, pending.selection.theme_type);
                apply(
                    &mut self.context,
                    &styles,
                    &pending.selection.theme_key,
                    pending.selection.theme_type,
                );
                RefinementOutcome::Applied
            }
            Err(err) => {
                tracing::warn!(
                    ?err,
                    theme_key = pending.selection.theme_key.as_str(),
                    theme_type = %pending.selection.theme_type,
                    "theme catalog unavailable; keeping coarse styling"
                );
                RefinementOutcome::Failed
            }
        }
    }
}

fn fetch_definition(
    source: &dyn CatalogSource,
    selection: &Selection,
) -> CatalogResult<ThemeDefinition> {
    let response = source.fetch(selection.theme_type)?;
    let definition = response
        .lookup(&selection.theme_key)
        .ok_or_else(|| CatalogError::ThemeNotFound {
            key: selection.theme_key.clone(),
            theme_type: selection.theme_type,
        })?;
    definition.validate(selection.theme_type)?;
    Ok(definition.clone())
}
