use crate::cli::context;
use crate::cli::output;
use crate::config::app_config::AppConfig;
use crate::core::errors::{Result, RevtrailError};

/// Execute the `revtrail init` command.
///
/// Creates the store directory with a default `config.toml` and an empty
/// audit log.
pub fn execute() -> Result<()> {
    let dir = context::revtrail_dir();

    if dir.join("config.toml").exists() {
        return Err(RevtrailError::InvalidConfig {
            detail: format!("revtrail is already initialized ({} exists)", dir.display()),
        });
    }

    output::header("revtrail — Initializing store");

    std::fs::create_dir_all(dir)?;
    output::success(&format!("Created {}/", dir.display()));

    let config = AppConfig::initial();
    std::fs::write(dir.join("config.toml"), config.to_toml()?)?;
    output::success("Generated config.toml with defaults");

    let log_file = config.audit_section().log_file;
    let log_path = dir.join(&log_file);
    if !log_path.exists() {
        std::fs::write(&log_path, "")?;
    }
    output::success(&format!("Created empty {log_file}"));

    output::header("Next steps");
    output::detail("Declare attribute types under [entities.<Type>] in config.toml");
    output::detail(
        "Record a change: revtrail record User 1 create --after '{\"name\":\"Brandon\"}'",
    );

    Ok(())
}
