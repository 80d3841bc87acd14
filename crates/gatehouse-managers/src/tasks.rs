//! Periodic maintenance jobs.
//!
//! Each registered job runs on its own fixed interval,
//! single-flight: a tick that arrives while the previous run is
//! still executing is skipped, never queued.

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use gatehouse_core::error::GateResult;
use gatehouse_core::repository::UserRepository;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

pub trait PeriodicJob: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    fn interval(&self) -> Duration;

    fn run(&self) -> Pin<Box<dyn Future<Output = GateResult<()>> + Send + '_>>;
}

/// A registered job plus its in-flight guard.
pub struct JobHandle {
    job: Arc<dyn PeriodicJob>,
    in_flight: Arc<AtomicBool>,
}

impl JobHandle {
    pub fn new(job: impl PeriodicJob) -> Self {
        Self {
            job: Arc::new(job),
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn name(&self) -> &'static str {
        self.job.name()
    }

    /// Dispatch one run unless the previous one is still executing.
    /// Returns false when the tick was skipped.
    pub fn try_dispatch(&self) -> bool {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(job = self.job.name(), "previous run still executing, tick skipped");
            return false;
        }

        let job = self.job.clone();
        let in_flight = self.in_flight.clone();
        tokio::spawn(async move {
            if let Err(err) = job.run().await {
                error!(job = job.name(), error = %err, "periodic job failed");
            }
            in_flight.store(false, Ordering::Release);
        });
        true
    }
}

/// Runs registered jobs until the returned handles are aborted.
#[derive(Default)]
pub struct PeriodicRunner {
    jobs: Vec<Arc<JobHandle>>,
}

impl PeriodicRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, job: impl PeriodicJob) {
        self.jobs.push(Arc::new(JobHandle::new(job)));
    }

    /// Spawn one ticker per job.
    pub fn spawn(self) -> Vec<JoinHandle<()>> {
        self.jobs
            .into_iter()
            .map(|handle| {
                let interval = handle.job.interval();
                tokio::spawn(async move {
                    info!(job = handle.name(), ?interval, "periodic job scheduled");
                    let mut ticker = tokio::time::interval(interval);
                    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
                    // The first tick fires immediately; skip it so a
                    // fresh process does not run every job at boot.
                    ticker.tick().await;
                    loop {
                        ticker.tick().await;
                        handle.try_dispatch();
                    }
                })
            })
            .collect()
    }
}

/// Hard-deletes soft-deleted users once they age past the retention
/// window.
pub struct PurgeDeletedUsers<S: UserRepository + Send + Sync + 'static> {
    store: S,
    interval: Duration,
    retention: chrono::Duration,
}

impl<S: UserRepository + Send + Sync + 'static> PurgeDeletedUsers<S> {
    pub fn new(store: S, interval: Duration, retention_secs: u64) -> Self {
        Self {
            store,
            interval,
            retention: chrono::Duration::seconds(retention_secs as i64),
        }
    }
}

impl<S: UserRepository + Send + Sync + 'static> PeriodicJob for PurgeDeletedUsers<S> {
    fn name(&self) -> &'static str {
        "purge-deleted-users"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn run(&self) -> Pin<Box<dyn Future<Output = GateResult<()>> + Send + '_>> {
        Box::pin(async move {
            let cutoff = Utc::now() - self.retention;
            let purged = self.store.purge_deleted_users(cutoff).await?;
            if purged > 0 {
                info!(purged, "purged soft-deleted users");
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct SlowJob {
        runs: Arc<AtomicUsize>,
        hold: Duration,
    }

    impl PeriodicJob for SlowJob {
        fn name(&self) -> &'static str {
            "slow-job"
        }

        fn interval(&self) -> Duration {
            Duration::from_millis(10)
        }

        fn run(&self) -> Pin<Box<dyn Future<Output = GateResult<()>> + Send + '_>> {
            let runs = self.runs.clone();
            let hold = self.hold;
            Box::pin(async move {
                runs.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(hold).await;
                Ok(())
            })
        }
    }

    #[tokio::test]
    async fn overlapping_tick_is_skipped_not_queued() {
        let runs = Arc::new(AtomicUsize::new(0));
        let handle = JobHandle::new(SlowJob {
            runs: runs.clone(),
            hold: Duration::from_millis(200),
        });

        assert!(handle.try_dispatch());
        // Give the spawned run a moment to start.
        tokio::time::sleep(Duration::from_millis(50)).await;
        // Second tick while the first run still holds the flag.
        assert!(!handle.try_dispatch());

        tokio::time::sleep(Duration::from_millis(250)).await;
        // The skipped tick never ran.
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        // Once the run finished, the next tick dispatches again.
        assert!(handle.try_dispatch());
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }
}
