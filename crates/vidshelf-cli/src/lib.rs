use anyhow::Context;
use serde::Serialize;
use vidshelf_core::Config;
use vidshelf_services::PgMediaBackend;

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

/// Load configuration, initialize tracing and wire the Postgres-backed backend.
///
/// No connection is made until the first command needs the store.
pub fn init_backend() -> anyhow::Result<(Config, PgMediaBackend)> {
    let config = Config::from_env().context("Failed to load configuration")?;
    vidshelf_infra::init_telemetry(config.log_format)
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    let backend = PgMediaBackend::from_config(&config).context("Failed to build backend")?;
    tracing::debug!(environment = %config.environment, "Backend ready");
    Ok((config, backend))
}
