use tokio_cron_scheduler::{Job, JobScheduler};

use rand::Rng;
use std::time::Duration;
use tracing::trace;

use crate::core::store::{SharedStore, UserId};
use crate::error::BoardResult;

/// Mutator deltas are drawn uniformly from this inclusive range.
const DELTA_SPREAD: i32 = 50;

/// Driver for the two background loops: the rating mutator and the
/// snapshot publisher. Both stop at their next tick when the scheduler
/// shuts down.
pub struct Scheduler {
    scheduler: JobScheduler,
    store: SharedStore,
}

pub enum JobProcess {
    /// Apply `batch` random rating deltas every `every_ms` milliseconds.
    ShuffleRatings { batch: usize, every_ms: u64 },
    /// Rebuild and publish the leaderboard snapshot every `every_ms`
    /// milliseconds.
    PublishSnapshot { every_ms: u64 },
}

impl Scheduler {
    pub async fn new(store: SharedStore) -> BoardResult<Self> {
        let scheduler = JobScheduler::new().await?;
        Ok(Scheduler { scheduler, store })
    }

    /// Register a background job. Jobs configured with a non-positive
    /// period or batch size are disabled and never scheduled.
    pub async fn add_job(&self, job_process: JobProcess) -> BoardResult<Option<uuid::Uuid>> {
        let job = match job_process {
            JobProcess::ShuffleRatings { batch, every_ms } => {
                if batch == 0 || every_ms == 0 {
                    return Ok(None);
                }
                shuffle_ratings_job(self.store.clone(), batch, every_ms)?
            }
            JobProcess::PublishSnapshot { every_ms } => {
                if every_ms == 0 {
                    return Ok(None);
                }
                publish_snapshot_job(self.store.clone(), every_ms)?
            }
        };
        Ok(Some(self.scheduler.add(job).await?))
    }

    pub async fn start(&self) -> BoardResult<()> {
        Ok(self.scheduler.start().await?)
    }

    /// Stop both loops at their next tick boundary.
    pub async fn shutdown(&mut self) -> BoardResult<()> {
        Ok(self.scheduler.shutdown().await?)
    }
}

//////////////////
// Jobs definition
//////////////////

fn shuffle_ratings_job(store: SharedStore, batch: usize, every_ms: u64) -> BoardResult<Job> {
    let job = Job::new_repeated(Duration::from_millis(every_ms), move |_uuid, _lock| {
        let user_count = store.user_count() as UserId;
        if user_count == 0 {
            return;
        }
        let mut rng = rand::rng();
        let deltas = (0..batch).map(|_| {
            (
                rng.random_range(0..user_count),
                rng.random_range(-DELTA_SPREAD..=DELTA_SPREAD),
            )
        });
        let applied = store.apply_deltas(deltas);
        trace!("rating shuffle tick: applied {applied} of {batch} deltas");
    })?;
    Ok(job)
}

fn publish_snapshot_job(store: SharedStore, every_ms: u64) -> BoardResult<Job> {
    let job = Job::new_repeated(Duration::from_millis(every_ms), move |_uuid, _lock| {
        store.refresh_snapshot();
        trace!("leaderboard snapshot republished");
    })?;
    Ok(job)
}
