use super::*;
use crate::core::scan_config::{ScanConfig, CONFIG_FILE};
use crate::core::scanner::Scanner;
use crate::core::sync::{SyncOptions, Synchronizer};
use crate::core::sync_state::JsonStateStore;
use crate::notion::NotionClient;
use anyhow::Result;
use std::path::Path;
use tracing::info;

/// Sync the given paths under the destination page
pub async fn sync(cli: Cli) -> Result<()> {
    let destination = normalize_page_id(&cli.destination);
    let client = NotionClient::from_env()?;

    let config = ScanConfig::from_file(Path::new(CONFIG_FILE));
    let scan = Scanner::new(config).scan(&cli.paths)?;
    info!(
        "Found {} documents in {} directories under {:?}",
        scan.documents.len(),
        scan.directories.len(),
        scan.root_dir
    );

    let store = JsonStateStore::in_current_dir();
    let options = SyncOptions {
        force: cli.force,
        dry_run: cli.dry_run,
    };
    let engine = Synchronizer::new(&client, &client, &store, options);
    let summary = engine.run(&scan, &destination).await?;

    if options.dry_run {
        info!("Dry run: {}", summary);
    } else {
        info!("Sync finished: {}", summary);
    }
    if cli.verbose {
        println!("Sync complete.");
    }
    Ok(())
}
