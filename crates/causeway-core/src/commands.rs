use std::sync::Arc;

use anyhow::Context;
use causeway_shared::{NavigationPayload, ScreenName};
use tracing::{info, instrument, warn};

use crate::api::HttpCategoryApi;
use crate::cli::{Command, SubmitMode, TagArgs, TokenAction};
use crate::config::Config;
use crate::credentials::{FileTokenStore, TOKEN_KEY, TokenStore};
use crate::error::TaggingError;
use crate::render::{Renderer, describe_navigation};
use crate::screen::{CauseTaggingScreen, ScreenOptions};
use crate::submit::{ContinueOnboarding, Navigator, ReturnToPostDraft, SubmitStrategy, UpdateCategories};

/// Navigator for the terminal host: there is no screen stack, so
/// transitions are only logged.
#[derive(Debug, Default)]
pub struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn navigate(&self, screen: ScreenName, payload: NavigationPayload) {
        info!(target: "causeway::navigation", "{}", describe_navigation(screen, &payload));
    }

    fn go_back(&self) {
        info!(target: "causeway::navigation", "back");
    }
}

pub struct Services {
    pub api: HttpCategoryApi,
    pub tokens: Arc<FileTokenStore>,
}

pub fn strategy_for(args: &TagArgs) -> Box<dyn SubmitStrategy> {
    match args.mode {
        SubmitMode::Update => Box::new(UpdateCategories),
        SubmitMode::Onboarding => Box::new(ContinueOnboarding::new(args.draft_map())),
        SubmitMode::Post => Box::new(ReturnToPostDraft),
    }
}

#[instrument(skip_all)]
pub async fn dispatch(
    services: Services,
    cfg: &Config,
    renderer: &mut Renderer,
    command: Command,
) -> anyhow::Result<()> {
    match command {
        Command::Catalog => {
            let args = TagArgs {
                mode: SubmitMode::Onboarding,
                seed: vec![],
                toggle: vec![],
                draft: vec![],
                submit: false,
            };
            cmd_tag(services, cfg, renderer, args).await
        }
        Command::Tag(args) => cmd_tag(services, cfg, renderer, args).await,
        Command::Token { action } => cmd_token(services.tokens.as_ref(), action),
    }
}

#[instrument(skip(services, cfg, renderer), fields(mode = ?args.mode))]
async fn cmd_tag(
    services: Services,
    cfg: &Config,
    renderer: &mut Renderer,
    args: TagArgs,
) -> anyhow::Result<()> {
    let options = ScreenOptions {
        authenticated_catalog: cfg.authenticated_catalog(),
        timeout: cfg.request_timeout()?,
        seed: args.seed.clone(),
    };
    let mut screen = CauseTaggingScreen::new(
        services.api,
        services.tokens,
        Arc::new(ConsoleNavigator),
        strategy_for(&args),
        options,
    );

    if let Err(err) = screen.load().await {
        return Err(surface(&mut screen, renderer, err));
    }

    for id in &args.toggle {
        screen
            .toggle_id(*id)
            .with_context(|| format!("failed to toggle cause {id}"))?;
    }

    renderer.print_catalog(screen.catalog(), screen.selection())?;

    if args.submit {
        match screen.submit().await {
            Ok(outcome) => renderer.print_outcome(&outcome)?,
            Err(err) => return Err(surface(&mut screen, renderer, err)),
        }
    }

    screen.unmount();
    Ok(())
}

fn surface<A>(screen: &mut CauseTaggingScreen<A>, renderer: &mut Renderer, err: TaggingError) -> anyhow::Error
where
    A: crate::api::CategoryApi,
{
    if let Some(notice) = screen.dismiss_notice()
        && let Err(print_err) = renderer.print_notice(&notice)
    {
        warn!(error = %print_err, "failed printing notice");
    }
    screen.unmount();
    anyhow::Error::new(err)
}

#[instrument(skip(tokens))]
fn cmd_token(tokens: &dyn TokenStore, action: TokenAction) -> anyhow::Result<()> {
    match action {
        TokenAction::Set { value } => {
            let value = value.trim();
            if value.is_empty() {
                anyhow::bail!("token cannot be empty");
            }
            tokens.set(TOKEN_KEY, value)?;
            println!("token saved");
        }
        TokenAction::Show => match tokens.get(TOKEN_KEY)? {
            Some(token) => println!("{}", mask_token(&token)),
            None => println!("no token stored"),
        },
        TokenAction::Clear => {
            tokens.remove(TOKEN_KEY)?;
            println!("token cleared");
        }
    }
    Ok(())
}

fn mask_token(token: &str) -> String {
    let visible: String = token.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
    if token.chars().count() <= 4 {
        "*".repeat(token.chars().count())
    } else {
        format!("****{visible}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_masked_except_tail() {
        assert_eq!(mask_token("abcdef123456"), "****3456");
        assert_eq!(mask_token("abc"), "***");
    }

    #[test]
    fn mode_selects_strategy() {
        let mut args = TagArgs {
            mode: SubmitMode::Update,
            seed: vec![],
            toggle: vec![],
            draft: vec![],
            submit: false,
        };
        assert_eq!(strategy_for(&args).name(), "update");
        args.mode = SubmitMode::Onboarding;
        assert_eq!(strategy_for(&args).name(), "onboarding");
        args.mode = SubmitMode::Post;
        assert_eq!(strategy_for(&args).name(), "post");
    }
}
