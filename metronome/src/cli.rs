use std::time::Duration;

use clap::Parser;
use metronome_core::{
    config::{
        DEFAULT_ENDPOINT, DEFAULT_INTERVAL_SECS, DEFAULT_MAX, DEFAULT_MIN,
        RemoteSettings,
    },
    ConfigError, Configuration, Credential, Interval, Range,
};
use url::Url;

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "metronome", version)]
#[command(
    about = "Generates a steady stream of random integers to the standard output."
)]
pub struct Cli {
    /// RANDOM.ORG API key, for fetching truly random numbers
    #[arg(long, env = "RANDOM_ORG_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Lower boundary
    #[arg(long, default_value_t = DEFAULT_MIN, allow_negative_numbers = true)]
    pub min: i64,

    /// Upper boundary, inclusive
    #[arg(long, default_value_t = DEFAULT_MAX, allow_negative_numbers = true)]
    pub max: i64,

    /// Heartbeat interval, in seconds. Specify 0 to generate only one
    /// integer and immediately exit
    #[arg(long, default_value_t = DEFAULT_INTERVAL_SECS)]
    pub interval: u64,

    /// Upper bound on each RANDOM.ORG request (e.g. 10s, 1500ms)
    #[arg(long, default_value = "10s", value_parser = humantime::parse_duration)]
    pub timeout: Duration,

    /// JSON-RPC endpoint of the randomness service
    #[arg(long, env = "RANDOM_ORG_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: Url,

    /// Seed for the local fallback generator, for reproducible output
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Cli {
    pub fn into_configuration(self) -> Result<Configuration, ConfigError> {
        let range = Range::new(self.min, self.max)?;
        let credential = self.api_key.and_then(Credential::new);

        Ok(
            Configuration::new(range, credential, Interval::from_secs(self.interval))
                .with_remote(RemoteSettings {
                    endpoint: self.endpoint,
                    timeout: self.timeout,
                })
                .with_seed(self.seed),
        )
    }
}
