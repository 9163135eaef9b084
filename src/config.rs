//! Pipeline settings, built from environment variables.

use std::time::Duration;

/// Knobs for the orchestrator and retry pass.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Pause between records, to stay under store and provider rate limits.
    pub delay_between_records: Duration,
    /// Retry bound for the retry pass.
    pub max_retries: u32,
    /// Optional cap on records processed per run.
    pub batch_size: Option<usize>,
    /// Days until the follow-up date written on successful outreach.
    pub follow_up_days: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            delay_between_records: Duration::from_secs(60),
            max_retries: 3,
            batch_size: None,
            follow_up_days: 21,
        }
    }
}

impl PipelineConfig {
    /// Build config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let delay_secs: u64 = std::env::var("DELAY_BETWEEN_LEADS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.delay_between_records.as_secs());

        let max_retries: u32 = std::env::var("MAX_RETRIES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_retries);

        let batch_size: Option<usize> = std::env::var("BATCH_SIZE")
            .ok()
            .and_then(|s| s.parse().ok());

        let follow_up_days: u64 = std::env::var("FOLLOW_UP_DAYS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.follow_up_days);

        Self {
            delay_between_records: Duration::from_secs(delay_secs),
            max_retries,
            batch_size,
            follow_up_days,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = PipelineConfig::default();
        assert_eq!(config.delay_between_records, Duration::from_secs(60));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.batch_size, None);
        assert_eq!(config.follow_up_days, 21);
    }
}
