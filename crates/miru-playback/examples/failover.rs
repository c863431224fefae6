//! Run with: cargo run -p miru-playback --example failover
//!
//! Walks the full provider failover chain for a sample show episode and
//! prints each embed URL the player would render.

use std::sync::Arc;

use miru_core::config::AppConfig;
use miru_core::storage::Storage;
use miru_core::watch::WatchStore;
use miru_playback::{PlaybackSession, PlaybackTarget, ProviderRegistry};

fn main() {
    let config = AppConfig::default();
    let registry = Arc::new(ProviderRegistry::new(&config.playback));
    let storage = Storage::open_memory().expect("in-memory storage");
    let mut store = WatchStore::new(storage, &config.library);

    let target = PlaybackTarget::show(1396, Some(2), Some(5));
    let mut session = PlaybackSession::start(registry.clone(), target, None, &mut store);

    while let Some(provider) = session.provider() {
        let name = registry.get(provider).name;
        match session.current_url() {
            Ok(Some(url)) => println!("{name}: {url}"),
            Ok(None) => break,
            Err(e) => println!("{name}: failed to build URL ({e})"),
        }
        session.report_failure(&mut store);
    }

    println!("\nAll providers exhausted. Resetting...");
    session.reset(&mut store);
    if let Some(provider) = session.provider() {
        println!("Back to: {}", registry.get(provider).name);
    }
}
