use std::sync::Arc;

use tracing::{debug, info};

use rankboard::config::SETTINGS;
use rankboard::core::store::Store;
use rankboard::error::BoardResult;
use rankboard::scheduler::{JobProcess, Scheduler};
use rankboard::seed::generate_users;
use rankboard::server;

#[tokio::main]
async fn main() -> BoardResult<()> {
    tracing_subscriber::fmt()
        .with_max_level(SETTINGS.get_trace_level())
        .init();

    let seeds = generate_users(SETTINGS.seed_users);
    info!("seeded {} users", seeds.len());

    let store = Arc::new(Store::new(seeds));
    // First snapshot is published before the server accepts traffic.
    store.refresh_snapshot();

    let mut scheduler = Scheduler::new(store.clone()).await?;
    if let Some(id) = scheduler
        .add_job(JobProcess::ShuffleRatings {
            batch: SETTINGS.updates_per_tick,
            every_ms: SETTINGS.tick_ms,
        })
        .await?
    {
        debug!("scheduled rating mutator job {id}");
    }
    if let Some(id) = scheduler
        .add_job(JobProcess::PublishSnapshot {
            every_ms: SETTINGS.snapshot_ms,
        })
        .await?
    {
        debug!("scheduled snapshot publisher job {id}");
    }
    scheduler.start().await?;

    server::serve(store).await?;
    scheduler.shutdown().await?;

    Ok(())
}
