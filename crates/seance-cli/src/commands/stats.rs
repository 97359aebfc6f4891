use seance_core::Config;

use super::{print_json, services, CliResult};

pub async fn run(save: bool) -> CliResult {
    let config = Config::load()?;
    let stats = services(&config)?.stats;
    if save {
        stats.save_snapshot().await?;
        println!("statistics snapshot saved");
        return Ok(());
    }
    print_json(&stats.fetch().await?)
}
