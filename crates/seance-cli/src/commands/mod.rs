pub mod auth;
pub mod config;
pub mod seances;
pub mod stats;
pub mod task;
pub mod timer;

use serde::Serialize;
use seance_core::remote::{token_store, Services};
use seance_core::Config;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

pub fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Service clients carrying the stored bearer token, if any.
pub fn services(config: &Config) -> Result<Services, Box<dyn std::error::Error>> {
    let token = token_store::get()?;
    Ok(Services::from_config(&config.services, token.as_deref())?)
}
