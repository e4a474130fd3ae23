use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::api::CategoryApi;
use crate::catalog::{CatalogLoader, group};
use crate::credentials::TokenStore;
use crate::error::{TaggingError, TaggingResult};
use crate::model::{Cause, GroupedCatalog};
use crate::selection::SelectionState;
use crate::submit::{Navigator, SubmitContext, SubmitOutcome, SubmitStrategy};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenStatus {
    Loading,
    Ready,
    Failed(TaggingError),
    /// Submission succeeded and control has moved to another screen.
    Done,
}

/// Feedback the host should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Blocking alert; dismissing it is the only action.
    Alert(String),
    /// Banner with a retry button wired to [`CauseTaggingScreen::retry`].
    Retry(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Load,
    Submit,
}

#[derive(Debug, Clone)]
pub struct ScreenOptions {
    /// Send the bearer token with the catalog read.
    pub authenticated_catalog: bool,
    pub timeout: Duration,
    /// Previously chosen cause ids, applied once the catalog arrives.
    pub seed: Vec<u64>,
}

impl Default for ScreenOptions {
    fn default() -> Self {
        Self {
            authenticated_catalog: false,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            seed: vec![],
        }
    }
}

/// Controller behind every cause tagging screen.
///
/// All mutation goes through `&mut self`, so toggles and submissions are
/// applied one at a time. Network work races the screen's unmount token and
/// a timeout; results that lose either race are dropped unapplied.
pub struct CauseTaggingScreen<A> {
    api: A,
    tokens: Arc<dyn TokenStore>,
    navigator: Arc<dyn Navigator>,
    strategy: Box<dyn SubmitStrategy>,
    loader: CatalogLoader,
    timeout: Duration,
    seed: Vec<u64>,
    status: ScreenStatus,
    catalog: GroupedCatalog,
    selection: SelectionState,
    notice: Option<Notice>,
    last_failed: Option<Operation>,
    unmounted: CancellationToken,
}

impl<A> CauseTaggingScreen<A>
where
    A: CategoryApi,
{
    pub fn new(
        api: A,
        tokens: Arc<dyn TokenStore>,
        navigator: Arc<dyn Navigator>,
        strategy: Box<dyn SubmitStrategy>,
        options: ScreenOptions,
    ) -> Self {
        debug!(
            strategy = strategy.name(),
            seed = options.seed.len(),
            authenticated_catalog = options.authenticated_catalog,
            "mounting cause tagging screen"
        );
        Self {
            api,
            tokens,
            navigator,
            strategy,
            loader: CatalogLoader::new(options.authenticated_catalog),
            timeout: options.timeout,
            seed: options.seed,
            status: ScreenStatus::Loading,
            catalog: GroupedCatalog::default(),
            selection: SelectionState::new(),
            notice: None,
            last_failed: None,
            unmounted: CancellationToken::new(),
        }
    }

    pub fn status(&self) -> &ScreenStatus {
        &self.status
    }

    pub fn is_ready(&self) -> bool {
        self.status == ScreenStatus::Ready
    }

    pub fn catalog(&self) -> &GroupedCatalog {
        &self.catalog
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn is_pressed(&self, name: &str) -> bool {
        self.selection.is_pressed(name)
    }

    pub fn selected_cause_ids(&self) -> &[u64] {
        self.selection.selected_cause_ids()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    /// Token that fires when the screen goes away. Hosts may hand clones to
    /// whatever tears the view down.
    pub fn unmount_token(&self) -> CancellationToken {
        self.unmounted.clone()
    }

    pub fn unmount(&self) {
        if !self.unmounted.is_cancelled() {
            info!("unmounting cause tagging screen");
        }
        self.unmounted.cancel();
    }

    pub fn is_unmounted(&self) -> bool {
        self.unmounted.is_cancelled()
    }

    /// Fetch and group the catalog, then seed the selection.
    ///
    /// A failed reload keeps the catalog and selection already on screen.
    /// Once the selection has been submitted the screen refuses to reload.
    #[tracing::instrument(skip(self), fields(strategy = self.strategy.name()))]
    pub async fn load(&mut self) -> TaggingResult<()> {
        self.ensure_mounted()?;
        if self.status == ScreenStatus::Done {
            debug!("ignoring reload after submission");
            return Err(already_submitted());
        }
        let had_catalog = self.is_ready();
        if !had_catalog {
            self.status = ScreenStatus::Loading;
        }

        let fetch = self.loader.load(&self.api, self.tokens.as_ref());
        let result = guarded(&self.unmounted, self.timeout, fetch).await;

        match result {
            Ok(feed) => {
                let seed = if had_catalog {
                    self.selection.selected_cause_ids().to_vec()
                } else {
                    self.seed.clone()
                };
                self.catalog = group(&feed);
                self.selection = SelectionState::initialize(&seed, &self.catalog);
                self.status = ScreenStatus::Ready;
                self.clear_failure(Operation::Load);
                info!(
                    groups = self.catalog.groups.len(),
                    causes = self.catalog.len(),
                    selected = self.selection.len(),
                    "cause catalog ready"
                );
                Ok(())
            }
            Err(TaggingError::Cancelled) => {
                debug!("catalog load abandoned after unmount");
                Err(TaggingError::Cancelled)
            }
            Err(err) => {
                error!(error = %err, "cause catalog load failed");
                if !had_catalog {
                    self.status = ScreenStatus::Failed(err.clone());
                }
                self.record_failure(Operation::Load, &err);
                Err(err)
            }
        }
    }

    /// Toggle a cause from the loaded catalog.
    pub fn toggle(&mut self, cause: &Cause) -> TaggingResult<bool> {
        self.toggle_id(cause.id)
    }

    /// Toggle by id; returns whether the cause is now selected.
    pub fn toggle_id(&mut self, id: u64) -> TaggingResult<bool> {
        self.ensure_mounted()?;
        if !self.is_ready() {
            debug!(id, status = ?self.status, "ignoring toggle before catalog is ready");
            return Err(TaggingError::NotReady);
        }

        let cause = self
            .catalog
            .find_by_id(id)
            .ok_or_else(|| TaggingError::Validation(format!("unknown cause {id}")))?;
        Ok(self.selection.toggle(cause))
    }

    pub fn toggle_name(&mut self, name: &str) -> TaggingResult<bool> {
        let id = self
            .catalog
            .find_by_name(name)
            .map(|cause| cause.id)
            .ok_or_else(|| TaggingError::Validation(format!("unknown cause {name:?}")))?;
        self.toggle_id(id)
    }

    /// Run the screen's submission strategy on the current selection.
    #[tracing::instrument(skip(self), fields(strategy = self.strategy.name(), selected = self.selection.len()))]
    pub async fn submit(&mut self) -> TaggingResult<SubmitOutcome> {
        self.ensure_mounted()?;
        match self.status {
            ScreenStatus::Ready => {}
            ScreenStatus::Done => return Err(already_submitted()),
            _ => return Err(TaggingError::NotReady),
        }

        let ctx = SubmitContext {
            selection: &self.selection,
            catalog: &self.catalog,
            api: &self.api,
            tokens: self.tokens.as_ref(),
            navigator: self.navigator.as_ref(),
        };
        let result = guarded(&self.unmounted, self.timeout, self.strategy.submit(ctx)).await;

        match result {
            Ok(outcome) => {
                info!(?outcome, "cause selection submitted");
                self.clear_failure(Operation::Submit);
                self.status = ScreenStatus::Done;
                Ok(outcome)
            }
            Err(TaggingError::Cancelled) => {
                debug!("submission abandoned after unmount");
                Err(TaggingError::Cancelled)
            }
            Err(err) => {
                if matches!(err, TaggingError::Validation(_)) {
                    warn!(error = %err, "cause selection rejected locally");
                } else {
                    error!(error = %err, "cause selection submit failed");
                }
                self.record_failure(Operation::Submit, &err);
                Err(err)
            }
        }
    }

    /// Repeat whichever operation last failed with a retryable error.
    pub async fn retry(&mut self) -> TaggingResult<Option<SubmitOutcome>> {
        match self.last_failed {
            Some(Operation::Load) => self.load().await.map(|()| None),
            Some(Operation::Submit) => self.submit().await.map(Some),
            None => Ok(None),
        }
    }

    fn ensure_mounted(&self) -> TaggingResult<()> {
        if self.unmounted.is_cancelled() {
            return Err(TaggingError::Cancelled);
        }
        Ok(())
    }

    fn record_failure(&mut self, op: Operation, err: &TaggingError) {
        if err.is_retryable() {
            self.last_failed = Some(op);
            self.notice = Some(Notice::Retry(err.user_message()));
        } else {
            self.last_failed = None;
            self.notice = Some(Notice::Alert(err.user_message()));
        }
    }

    fn clear_failure(&mut self, op: Operation) {
        if self.last_failed == Some(op) {
            self.last_failed = None;
        }
        self.notice = None;
    }
}

fn already_submitted() -> TaggingError {
    TaggingError::Validation("selection already submitted".to_string())
}

async fn guarded<T, F>(unmounted: &CancellationToken, timeout: Duration, work: F) -> TaggingResult<T>
where
    F: Future<Output = TaggingResult<T>>,
{
    tokio::select! {
        biased;
        _ = unmounted.cancelled() => Err(TaggingError::Cancelled),
        outcome = tokio::time::timeout(timeout, work) => match outcome {
            Ok(result) => result,
            Err(_) => Err(TaggingError::Timeout(timeout.as_secs())),
        },
    }
}
