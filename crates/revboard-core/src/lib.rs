pub mod cli;
pub mod commands;
pub mod config;
pub mod datastore;
pub mod datetime;
pub mod entry;
pub mod grid;
pub mod index;
pub mod level;
pub mod render;
pub mod selection;
pub mod stats;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
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
    "starting revboard"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.rcfile.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );

  let now = match cli.now.as_deref() {
    | Some(raw) => {
      datetime::parse_instant(raw)
        .context("invalid --now value")?
    }
    | None => datetime::project_now()
  };
  debug!(%now, "reference instant");

  let data_path =
    config::resolve_data_file(
      &cfg,
      cli.data.as_deref()
    )
    .context(
      "failed to resolve revenue \
       data file"
    )?;

  let renderer =
    render::Renderer::new(&cfg)?;
  let inv = cli::Invocation::parse(
    &cfg, cli.rest
  )?;

  commands::dispatch(
    &cfg,
    &renderer,
    &data_path,
    inv,
    now
  )?;

  info!("done");
  Ok(())
}
