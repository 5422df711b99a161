//! `strata config` – print the effective configuration.

use anyhow::Result;
use strata_core::config::{self, StrataConfig};
use strata_core::retry::RetryPolicy;

pub fn run_config(cfg: &StrataConfig, policy: &RetryPolicy) -> Result<()> {
    println!("# {}", config::config_path()?.display());
    print!("{}", toml::to_string_pretty(cfg)?);
    println!();
    println!("# effective retry policy");
    println!("enabled        = {}", policy.enabled);
    println!("max_attempts   = {}", policy.max_attempts);
    println!("initial_delay  = {:?}", policy.initial_delay);
    println!("max_delay      = {:?}", policy.max_delay);
    println!("jitter_ratio   = {}", policy.jitter_ratio);
    Ok(())
}
