pub mod api;
pub mod catalog;
pub mod cli;
pub mod commands;
pub mod config;
pub mod credentials;
pub mod error;
pub mod model;
pub mod render;
pub mod screen;
pub mod selection;
pub mod submit;

use std::ffi::OsString;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

pub use error::{
  TaggingError,
  TaggingResult
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args)?;
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting causeway CLI"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.rc_file.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );

  let data_dir =
    config::resolve_data_dir(
      &cfg,
      cli.data.as_deref()
    )
    .context(
      "failed to resolve data \
       directory"
    )?;

  let tokens =
    credentials::FileTokenStore::open(
      &data_dir
    )
    .with_context(|| {
      format!(
        "failed to open credential \
         store at {}",
        data_dir.display()
      )
    })?;

  let api = api::HttpCategoryApi::new(
    &cfg.base_url(),
    cfg.request_timeout()?
  )?;

  let mut renderer =
    render::Renderer::new(&cfg)?;

  // One cooperative event loop, like
  // the UI thread the screens run on.
  let runtime =
    tokio::runtime::Builder::new_current_thread()
      .enable_all()
      .build()
      .context(
        "failed to start async runtime"
      )?;

  runtime.block_on(commands::dispatch(
    commands::Services {
      api,
      tokens: Arc::new(tokens)
    },
    &cfg,
    &mut renderer,
    cli.command
  ))?;

  info!("done");
  Ok(())
}
