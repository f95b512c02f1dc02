//! Status command handler.

use std::sync::Arc;

use feedgc::config::FeedGcConfig;
use feedgc::tasks::SerialTaskQueue;
use feedgc::{ContentKeyKind, FeedStore};

/// Status command.
pub fn cmd_status(config: FeedGcConfig) -> Result<(), Box<dyn std::error::Error>> {
    let data_dir = config.data_dir.clone();
    let store = FeedStore::open(Arc::new(SerialTaskQueue::new()), config);
    let status = store.status()?;

    println!("Feed Store Status");
    println!("=================");
    println!();
    println!("Data dir: {}", data_dir.display());
    for kind in ContentKeyKind::all() {
        println!("  {:<20} {}", kind.as_str(), status.count(*kind));
    }
    println!("  {:<20} {}", "total", status.total_keys());
    println!();
    println!("Dismiss actions ({}): {}", store.dismiss_journal(), status.dismiss_actions);
    println!("Journals: {}", status.journals.len());
    for journal in &status.journals {
        println!("  {journal}");
    }

    Ok(())
}
