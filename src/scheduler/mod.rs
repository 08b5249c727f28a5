use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Fired,
    Cancelled,
}

struct JobEntry {
    state: JobState,
    handle: Option<JoinHandle<()>>,
}

/// One-shot timer facility for reminder jobs. Each job sleeps on its own
/// tokio task until its fire time, so firing one job never delays another.
/// Registration is non-blocking for the caller and safe under concurrency.
pub struct ReminderScheduler {
    jobs: Arc<Mutex<HashMap<i32, JobEntry>>>,
    stop: watch::Sender<bool>,
}

impl ReminderScheduler {
    pub fn new() -> Self {
        let (stop, _) = watch::channel(false);
        Self {
            jobs: Arc::new(Mutex::new(HashMap::new())),
            stop,
        }
    }

    /// Registers a one-shot job keyed by `job_id` that runs `action` at or
    /// after `fire_at` (unix seconds). Re-registering an id replaces the
    /// previous pending job.
    pub fn schedule<F, Fut>(&self, job_id: i32, fire_at: i64, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if *self.stop.borrow() {
            lock_jobs(&self.jobs).insert(
                job_id,
                JobEntry {
                    state: JobState::Cancelled,
                    handle: None,
                },
            );
            return;
        }

        {
            let mut jobs = lock_jobs(&self.jobs);
            if let Some(previous) = jobs.insert(
                job_id,
                JobEntry {
                    state: JobState::Pending,
                    handle: None,
                },
            ) {
                if let Some(handle) = previous.handle {
                    handle.abort();
                }
            }
        }

        let jobs = Arc::clone(&self.jobs);
        let mut rx = self.stop.subscribe();
        let handle = tokio::spawn(async move {
            let wait = fire_at.saturating_sub(now_ts()).max(0) as u64;
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(wait)) => {
                    set_state(&jobs, job_id, JobState::Fired);
                    action().await;
                }
                _ = rx.changed() => {
                    if *rx.borrow() {
                        set_state(&jobs, job_id, JobState::Cancelled);
                    }
                }
            }
        });

        if let Some(entry) = lock_jobs(&self.jobs).get_mut(&job_id) {
            entry.handle = Some(handle);
        }
    }

    pub fn job_state(&self, job_id: i32) -> Option<JobState> {
        lock_jobs(&self.jobs).get(&job_id).map(|entry| entry.state)
    }

    pub fn pending_count(&self) -> usize {
        lock_jobs(&self.jobs)
            .values()
            .filter(|entry| entry.state == JobState::Pending)
            .count()
    }

    /// Flips every still-pending job to Cancelled and waits for all job
    /// tasks to settle. Best-effort drain; no durability across restarts.
    pub async fn stop(&self) {
        self.stop.send_replace(true);
        let handles: Vec<JoinHandle<()>> = lock_jobs(&self.jobs)
            .values_mut()
            .filter_map(|entry| entry.handle.take())
            .collect();
        for handle in handles {
            let _ = handle.await;
        }
    }
}

impl Default for ReminderScheduler {
    fn default() -> Self {
        Self::new()
    }
}

fn lock_jobs(jobs: &Mutex<HashMap<i32, JobEntry>>) -> MutexGuard<'_, HashMap<i32, JobEntry>> {
    jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn set_state(jobs: &Mutex<HashMap<i32, JobEntry>>, job_id: i32, state: JobState) {
    if let Some(entry) = lock_jobs(jobs).get_mut(&job_id) {
        entry.state = state;
    }
}

pub fn now_ts() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
