mod cli;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

pub(crate) use revtrail::{adapters, config, core};

fn main() {
    let args = Cli::parse();

    init_tracing(args.verbose);
    cli::context::init(args.dir.as_deref());

    let result = match &args.command {
        Commands::Init => cli::commands::init::execute(),
        Commands::Record {
            entity_type,
            entity_id,
            action,
            before,
            after,
            actor,
            tenant,
        } => cli::commands::record::execute(cli::commands::record::RecordArgs {
            entity_type,
            entity_id,
            action,
            before: before.as_deref(),
            after: after.as_deref(),
            actor: actor.as_deref(),
            tenant: tenant.as_deref(),
        }),
        Commands::Log {
            entity_type,
            entity_id,
            actor,
            tenant,
            since,
            last,
        } => cli::commands::log::execute(cli::commands::log::LogArgs {
            entity_type: entity_type.as_deref(),
            entity_id: entity_id.as_deref(),
            actor: actor.as_deref(),
            tenant: tenant.as_deref(),
            since: since.as_deref(),
            last: *last,
        }),
        Commands::Revision {
            entity_type,
            entity_id,
            version,
            at,
            previous,
        } => cli::commands::revision::execute(
            entity_type,
            entity_id,
            *version,
            at.as_deref(),
            *previous,
        ),
        Commands::Revisions {
            entity_type,
            entity_id,
            from,
        } => cli::commands::revision::execute_all(entity_type, entity_id, *from),
        Commands::Prune {
            entity_type,
            entity_id,
            version,
        } => cli::commands::prune::execute(entity_type, entity_id, *version),
    };

    if let Err(e) = result {
        cli::output::error(&format!("Error: {e}"));
        std::process::exit(1);
    }
}

/// Structured logs go to stderr; `RUST_LOG` overrides the default level.
fn init_tracing(verbose: bool) {
    let default = if verbose { "revtrail=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
