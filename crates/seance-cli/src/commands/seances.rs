use seance_core::Config;

use super::{print_json, services, CliResult};

pub async fn run() -> CliResult {
    let config = Config::load()?;
    let seances = services(&config)?.seances.list().await?;
    print_json(&seances)
}
