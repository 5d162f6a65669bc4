use std::time::Duration;

use anyhow::Context;
use chrono::FixedOffset;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 8;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub token: Option<String>,
    pub timeout: Duration,
    pub display_offset: FixedOffset,
}

impl Config {
    /// Reads `RAGENT_*` variables; a `.env` file is honoured when present.
    pub fn from_env() -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let api_url = lookup("RAGENT_API_URL")
            .filter(|value| !value.trim().is_empty())
            .context("RAGENT_API_URL must be set to the RAG platform API base URL")?;

        let token = lookup("RAGENT_TOKEN").filter(|value| !value.trim().is_empty());

        let timeout_secs = match lookup("RAGENT_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("RAGENT_TIMEOUT_SECS is not a number: {raw}"))?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        anyhow::ensure!(timeout_secs > 0, "RAGENT_TIMEOUT_SECS must be positive");

        let offset_hours = match lookup("RAGENT_UTC_OFFSET_HOURS") {
            Some(raw) => raw
                .trim()
                .parse::<i32>()
                .with_context(|| format!("RAGENT_UTC_OFFSET_HOURS is not a number: {raw}"))?,
            None => DEFAULT_UTC_OFFSET_HOURS,
        };
        anyhow::ensure!(
            (-12..=14).contains(&offset_hours),
            "RAGENT_UTC_OFFSET_HOURS must be between -12 and 14, got {offset_hours}"
        );
        let display_offset = FixedOffset::east_opt(offset_hours * 3600)
            .context("invalid display offset")?;

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
            timeout: Duration::from_secs(timeout_secs),
            display_offset,
        })
    }
}
