use std::sync::Arc;

use anyhow::{Context as AnyhowContext, Result};
use clap::Parser;
use manifest_resolver::cli;
use manifest_resolver::logging::{self, Verbosity};
use manifest_resolver::output::OutputFormatter;
use manifest_resolver::{factory, Environment, ResolutionContext};

fn main() -> Result<()> {
    let args = cli::Args::parse();
    logging::init(Verbosity::from_flags(args.verbose, args.quiet));
    args.validate().context("Invalid arguments")?;

    let config = args.build_configuration()?;
    let module = args
        .module
        .canonicalize()
        .with_context(|| format!("Cannot resolve module: {}", args.module.display()))?;

    let mut environment = Environment::from_process();
    environment.working_dir = module;
    environment.args = args.runner_args.clone();
    let ctx = Arc::new(ResolutionContext::new(environment));

    let factory = factory::select(config, Arc::clone(&ctx));
    tracing::info!("using {} factory", factory.kind().as_str());

    let manifest = factory
        .create_app_manifest()
        .context("Failed to resolve app manifest")?;
    let output = OutputFormatter::build_output(factory.as_ref(), manifest.as_ref())?;
    println!("{}", OutputFormatter::format(&output, args.format)?);

    Ok(())
}
