pub mod commands;
pub mod context;
pub mod output;

use clap::{Parser, Subcommand};

/// Attribute-level change tracking with point-in-time reconstruction.
#[derive(Parser, Debug)]
#[command(name = "revtrail", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Store directory holding config.toml and the audit log
    #[arg(long, global = true, env = "REVTRAIL_DIR")]
    pub dir: Option<String>,

    /// Verbose output (debug-level logs on stderr)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the store directory, config and an empty log
    Init,

    /// Record a create, update or destroy event
    Record {
        /// Entity type tag, e.g. User
        entity_type: String,
        /// Entity id
        entity_id: String,
        /// create, update or destroy
        action: String,
        /// Attributes before the event, as a JSON object
        #[arg(long)]
        before: Option<String>,
        /// Attributes after the event, as a JSON object
        #[arg(long)]
        after: Option<String>,
        /// Acting user: `Type:id` or a plain name
        #[arg(long)]
        actor: Option<String>,
        /// Owning tenant: `Type:id` or a plain name
        #[arg(long)]
        tenant: Option<String>,
    },

    /// Show recorded history
    Log {
        /// Restrict to one entity type
        entity_type: Option<String>,
        /// Restrict to one entity id (requires the type)
        entity_id: Option<String>,
        /// Filter by actor
        #[arg(long)]
        actor: Option<String>,
        /// Filter by tenant
        #[arg(long)]
        tenant: Option<String>,
        /// Filter entries since this date (ISO 8601)
        #[arg(long)]
        since: Option<String>,
        /// Show last N entries
        #[arg(long)]
        last: Option<usize>,
    },

    /// Reconstruct an entity at one point in its history
    Revision {
        entity_type: String,
        entity_id: String,
        /// Version number to rebuild
        #[arg(long, conflicts_with_all = ["at", "previous"])]
        version: Option<u32>,
        /// Newest state recorded at or before this RFC 3339 time
        #[arg(long, conflicts_with = "previous")]
        at: Option<String>,
        /// Steps back from the newest version (default 1)
        #[arg(long, num_args = 0..=1, default_missing_value = "1")]
        previous: Option<u32>,
    },

    /// List every reconstructed revision of an entity
    Revisions {
        entity_type: String,
        entity_id: String,
        /// Only revisions from this version on
        #[arg(long)]
        from: Option<u32>,
    },

    /// Delete one audit record (operator action)
    Prune {
        entity_type: String,
        entity_id: String,
        version: u32,
    },
}
