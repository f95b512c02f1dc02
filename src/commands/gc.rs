//! Garbage collection command handlers.

use std::collections::HashSet;
use std::sync::Arc;

use feedgc::config::FeedGcConfig;
use feedgc::tasks::SerialTaskQueue;
use feedgc::{ContentId, FeedStore};

use super::parse_ids;

/// Content GC command.
///
/// The CLI owns its queue, so the sweep normally runs at once. Anything the
/// collector queues is drained before returning.
///
/// ```bash
/// # Keep c1, pin c9, delete everything else that is collectable
/// feedgc gc --data-dir ./store --accessible c1 --reserved c9
/// ```
pub fn cmd_gc(
    config: FeedGcConfig,
    accessible: Vec<String>,
    reserved: Vec<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let accessible: HashSet<ContentId> = parse_ids(accessible).collect();
    let reserved: HashSet<ContentId> = parse_ids(reserved).collect();

    println!("Feed Content GC");
    println!("===============");
    println!();
    println!("Data dir: {}", config.data_dir.display());
    println!("Accessible: {}", accessible.len());
    println!("Reserved: {}", reserved.len());
    println!(
        "Shared states: {}",
        if config.gc.keep_shared_states {
            "kept"
        } else {
            "collected"
        }
    );
    println!();

    let queue = Arc::new(SerialTaskQueue::new());
    let store = FeedStore::open(queue.clone(), config);
    let before = store.content_keys()?.len();

    let gc = store.content_gc(Arc::new(move || accessible.clone()), reserved);
    let outcome = gc.gc()?;
    queue.run_all();

    let after = store.content_keys()?.len();
    match outcome {
        feedgc::ContentGcOutcome::Swept(result) => println!("{}", result.summary()),
        feedgc::ContentGcOutcome::Deferred { attempt } => {
            println!("Deferred (attempt {attempt}), completed on queue drain");
        },
    }
    println!("Keys: {before} -> {after}");

    Ok(())
}

/// Local action GC command.
///
/// ```bash
/// feedgc gc-actions --data-dir ./store --valid c1,c2
/// ```
pub fn cmd_gc_actions(
    config: FeedGcConfig,
    valid: Vec<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = FeedStore::open(Arc::new(SerialTaskQueue::new()), config);

    println!("Feed Local Action GC");
    println!("====================");
    println!();
    println!("Journal: {}", store.dismiss_journal());
    println!();

    let result = store.trigger_local_action_gc(parse_ids(valid))?;
    println!("{}", result.summary());

    Ok(())
}
