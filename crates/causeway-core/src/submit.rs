//! Submission policies for the cause tagging screen.
//!
//! Every screen shares [`SelectionState`]; what happens when the user
//! presses the primary button is decided by the [`SubmitStrategy`] the
//! screen was built with.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use causeway_shared::{NavigationPayload, OnboardingPayload, PostDraftPayload, ScreenName};
use tracing::{info, warn};

use crate::api::CategoryApi;
use crate::credentials::{TokenStore, bearer_token};
use crate::error::{TaggingError, TaggingResult};
use crate::model::GroupedCatalog;
use crate::selection::SelectionState;

/// Screen transitions, supplied by whatever hosts the screen.
pub trait Navigator: Send + Sync {
    fn navigate(&self, screen: ScreenName, payload: NavigationPayload);
    fn go_back(&self);
}

impl<T> Navigator for Arc<T>
where
    T: Navigator + ?Sized,
{
    fn navigate(&self, screen: ScreenName, payload: NavigationPayload) {
        (**self).navigate(screen, payload)
    }

    fn go_back(&self) {
        (**self).go_back()
    }
}

/// What a successful submission did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    WentBack,
    Navigated {
        screen: ScreenName,
        payload: NavigationPayload,
    },
}

pub struct SubmitContext<'a> {
    pub selection: &'a SelectionState,
    pub catalog: &'a GroupedCatalog,
    pub api: &'a dyn CategoryApi,
    pub tokens: &'a dyn TokenStore,
    pub navigator: &'a dyn Navigator,
}

#[async_trait]
pub trait SubmitStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn submit(&self, ctx: SubmitContext<'_>) -> TaggingResult<SubmitOutcome>;
}

pub const EMPTY_SELECTION_MESSAGE: &str = "Please select at least one cause.";

/// Replace the signed-in user's causes on the server, then go back.
#[derive(Debug, Clone, Default)]
pub struct UpdateCategories;

#[async_trait]
impl SubmitStrategy for UpdateCategories {
    fn name(&self) -> &'static str {
        "update"
    }

    #[tracing::instrument(skip_all, fields(strategy = "update", count = ctx.selection.len()))]
    async fn submit(&self, ctx: SubmitContext<'_>) -> TaggingResult<SubmitOutcome> {
        if ctx.selection.is_empty() {
            warn!("refusing to save an empty cause selection");
            return Err(TaggingError::Validation(EMPTY_SELECTION_MESSAGE.to_string()));
        }

        let token = bearer_token(ctx.tokens)?;
        ctx.api
            .replace_user_categories(&token, ctx.selection.selected_cause_ids())
            .await?;

        ctx.navigator.go_back();
        Ok(SubmitOutcome::WentBack)
    }
}

/// Onboarding: nothing is sent here. The selection rides along to the next
/// onboarding screen together with whatever the earlier steps collected.
#[derive(Debug, Clone, Default)]
pub struct ContinueOnboarding {
    draft: BTreeMap<String, String>,
}

impl ContinueOnboarding {
    pub fn new(draft: BTreeMap<String, String>) -> Self {
        Self { draft }
    }
}

#[async_trait]
impl SubmitStrategy for ContinueOnboarding {
    fn name(&self) -> &'static str {
        "onboarding"
    }

    #[tracing::instrument(skip_all, fields(strategy = "onboarding", count = ctx.selection.len()))]
    async fn submit(&self, ctx: SubmitContext<'_>) -> TaggingResult<SubmitOutcome> {
        let payload = NavigationPayload::Onboarding(OnboardingPayload {
            categories: ctx.selection.selected_cause_ids().to_vec(),
            draft: self.draft.clone(),
        });
        let screen = ScreenName::CompleteProfile;

        info!(screen = screen.as_str(), "continuing onboarding");
        ctx.navigator.navigate(screen, payload.clone());
        Ok(SubmitOutcome::Navigated { screen, payload })
    }
}

/// Post composer tagging: hand the chosen causes back to the draft post.
#[derive(Debug, Clone, Default)]
pub struct ReturnToPostDraft;

#[async_trait]
impl SubmitStrategy for ReturnToPostDraft {
    fn name(&self) -> &'static str {
        "post"
    }

    #[tracing::instrument(skip_all, fields(strategy = "post", count = ctx.selection.len()))]
    async fn submit(&self, ctx: SubmitContext<'_>) -> TaggingResult<SubmitOutcome> {
        if ctx.selection.is_empty() {
            return Err(TaggingError::Validation(EMPTY_SELECTION_MESSAGE.to_string()));
        }

        let category_names = ctx
            .selection
            .selected_causes(ctx.catalog)
            .into_iter()
            .map(|cause| cause.name.clone())
            .collect();
        let payload = NavigationPayload::PostDraft(PostDraftPayload {
            categories: ctx.selection.selected_cause_ids().to_vec(),
            category_names,
        });
        let screen = ScreenName::CreatePost;

        ctx.navigator.navigate(screen, payload.clone());
        Ok(SubmitOutcome::Navigated { screen, payload })
    }
}
