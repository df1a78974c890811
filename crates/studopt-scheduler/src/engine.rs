//! Job engine — named cron jobs, one tokio task per job.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{FixedOffset, Utc};
use studopt_core::error::{Result, StudoptError};
use tokio::task::JoinHandle;

use crate::cron;
use crate::snapshot::{JobState, SnapshotStore};

pub type JobFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;
pub type JobCallback = Arc<dyn Fn() -> JobFuture + Send + Sync>;

struct JobEntry {
    cron_expr: String,
    callback: JobCallback,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

/// Clears the running flag on every exit path, panics included.
struct RunGuard(Arc<AtomicBool>);

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Execute one tick under the overlap guard. A tick that finds the previous
/// run still in flight is dropped, not queued. Returns whether it ran.
async fn run_guarded(name: &str, callback: &JobCallback, running: &Arc<AtomicBool>) -> bool {
    if running.swap(true, Ordering::SeqCst) {
        tracing::warn!("⏭️ Job '{name}' still running, tick skipped");
        return false;
    }
    let _guard = RunGuard(running.clone());
    if let Err(e) = callback().await {
        tracing::warn!("⚠️ Job '{name}' failed: {e}");
    }
    true
}

fn spawn_loop(
    name: String,
    cron_expr: String,
    tz: FixedOffset,
    callback: JobCallback,
    running: Arc<AtomicBool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let now = Utc::now().with_timezone(&tz);
            let Some(next) = cron::next_run(&cron_expr, now) else {
                tracing::warn!("⚠️ Job '{name}' has unusable cron '{cron_expr}', stopping");
                break;
            };
            let wait = (next - now).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;
            run_guarded(&name, &callback, &running).await;
        }
    })
}

pub struct Scheduler {
    tz: FixedOffset,
    snapshot: SnapshotStore,
    jobs: Mutex<HashMap<String, JobEntry>>,
}

impl Scheduler {
    pub fn new(tz: FixedOffset, snapshot_path: impl AsRef<std::path::Path>) -> Self {
        Self {
            tz,
            snapshot: SnapshotStore::new(snapshot_path),
            jobs: Mutex::new(HashMap::new()),
        }
    }

    fn jobs(&self) -> Result<MutexGuard<'_, HashMap<String, JobEntry>>> {
        self.jobs
            .lock()
            .map_err(|e| StudoptError::Scheduler(e.to_string()))
    }

    /// Register and start a job. Registering an existing name stops the old
    /// job and replaces it.
    pub fn add_job(&self, name: &str, cron_expr: &str, callback: JobCallback) -> Result<()> {
        let now = Utc::now().with_timezone(&self.tz);
        if cron::next_run(cron_expr, now).is_none() {
            return Err(StudoptError::Scheduler(format!(
                "invalid cron expression '{cron_expr}' for job '{name}'"
            )));
        }

        let mut jobs = self.jobs()?;
        if let Some(old) = jobs.remove(name) {
            if let Some(handle) = old.handle {
                handle.abort();
            }
            tracing::info!("🔁 Job '{name}' replaced");
        } else {
            tracing::info!("📅 Job '{name}' registered ({cron_expr})");
        }

        let running = Arc::new(AtomicBool::new(false));
        let handle = spawn_loop(
            name.to_string(),
            cron_expr.to_string(),
            self.tz,
            callback.clone(),
            running.clone(),
        );
        jobs.insert(
            name.to_string(),
            JobEntry {
                cron_expr: cron_expr.to_string(),
                callback,
                running,
                handle: Some(handle),
            },
        );
        Ok(())
    }

    /// Closure-friendly wrapper around [`Scheduler::add_job`].
    pub fn add_job_fn<F, Fut>(&self, name: &str, cron_expr: &str, f: F) -> Result<()>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.add_job(name, cron_expr, Arc::new(move || Box::pin(f()) as JobFuture))
    }

    /// Stop and deregister. Unknown names are a no-op.
    pub fn remove_job(&self, name: &str) -> Result<bool> {
        let mut jobs = self.jobs()?;
        match jobs.remove(name) {
            Some(entry) => {
                if let Some(handle) = entry.handle {
                    handle.abort();
                }
                tracing::info!("🗑️ Job '{name}' removed");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Suspend firing without deregistering.
    pub fn stop_job(&self, name: &str) -> Result<bool> {
        let mut jobs = self.jobs()?;
        match jobs.get_mut(name) {
            Some(entry) => {
                if let Some(handle) = entry.handle.take() {
                    handle.abort();
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Fire one job now, through the overlap guard. Returns whether the
    /// callback actually ran (false when a previous run was still going).
    pub async fn fire(&self, name: &str) -> Result<bool> {
        let (callback, running) = {
            let jobs = self.jobs()?;
            let entry = jobs
                .get(name)
                .ok_or_else(|| StudoptError::Scheduler(format!("unknown job '{name}'")))?;
            (entry.callback.clone(), entry.running.clone())
        };
        Ok(run_guarded(name, &callback, &running).await)
    }

    /// Serialize every job's name and running flag to the snapshot file.
    pub fn save_state(&self) -> Result<()> {
        let states: Vec<JobState> = {
            let jobs = self.jobs()?;
            jobs.iter()
                .map(|(name, entry)| JobState {
                    name: name.clone(),
                    running: entry.running.load(Ordering::SeqCst),
                })
                .collect()
        };
        self.snapshot.save(&states)
    }

    /// Re-arm jobs from the last snapshot. Snapshot entries whose name is
    /// registered get a cleared running flag and a (re)started loop; names
    /// nothing registered under are logged and dropped.
    pub fn restore_all_jobs(&self) -> Result<usize> {
        let states = self.snapshot.load();
        let mut jobs = self.jobs()?;
        let mut restored = 0;
        for state in states {
            match jobs.get_mut(&state.name) {
                Some(entry) => {
                    entry.running.store(false, Ordering::SeqCst);
                    if entry.handle.is_none() {
                        entry.handle = Some(spawn_loop(
                            state.name.clone(),
                            entry.cron_expr.clone(),
                            self.tz,
                            entry.callback.clone(),
                            entry.running.clone(),
                        ));
                    }
                    restored += 1;
                }
                None => {
                    tracing::warn!("⚠️ Snapshot job '{}' is not registered, dropping", state.name);
                }
            }
        }
        tracing::info!("♻️ Restored {restored} jobs from snapshot");
        Ok(restored)
    }

    pub fn stop_all(&self) -> Result<()> {
        let mut jobs = self.jobs()?;
        for entry in jobs.values_mut() {
            if let Some(handle) = entry.handle.take() {
                handle.abort();
            }
        }
        Ok(())
    }

    pub fn destroy_all(&self) -> Result<()> {
        let mut jobs = self.jobs()?;
        for (_, entry) in jobs.drain() {
            if let Some(handle) = entry.handle {
                handle.abort();
            }
        }
        tracing::info!("🛑 All jobs destroyed");
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.jobs().map(|j| j.contains_key(name)).unwrap_or(false)
    }

    pub fn job_names(&self) -> Vec<String> {
        self.jobs()
            .map(|j| j.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn job_count(&self) -> usize {
        self.jobs().map(|j| j.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn tz() -> FixedOffset {
        FixedOffset::east_opt(7 * 3600).unwrap()
    }

    fn scheduler(tag: &str) -> (Scheduler, std::path::PathBuf) {
        let path = std::env::temp_dir().join(format!("studopt-sched-{tag}.json"));
        let _ = std::fs::remove_file(&path);
        (Scheduler::new(tz(), &path), path)
    }

    fn counting_callback(counter: Arc<AtomicUsize>, delay_ms: u64) -> JobCallback {
        Arc::new(move || {
            let counter = counter.clone();
            Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }) as JobFuture
        })
    }

    #[tokio::test]
    async fn test_same_name_replaces() {
        let (sched, path) = scheduler("replace");
        let c1 = Arc::new(AtomicUsize::new(0));
        let c2 = Arc::new(AtomicUsize::new(0));
        sched.add_job("job", "0 9 * * *", counting_callback(c1.clone(), 0)).unwrap();
        sched.add_job("job", "0 9 * * *", counting_callback(c2.clone(), 0)).unwrap();
        assert_eq!(sched.job_count(), 1);

        // Only the replacement's callback fires.
        assert!(sched.fire("job").await.unwrap());
        assert_eq!(c1.load(Ordering::SeqCst), 0);
        assert_eq!(c2.load(Ordering::SeqCst), 1);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_overlap_guard_drops_concurrent_tick() {
        let (sched, path) = scheduler("overlap");
        let counter = Arc::new(AtomicUsize::new(0));
        sched
            .add_job("slow", "0 9 * * *", counting_callback(counter.clone(), 100))
            .unwrap();

        let (a, b) = tokio::join!(sched.fire("slow"), sched.fire("slow"));
        let ran = [a.unwrap(), b.unwrap()];
        assert_eq!(ran.iter().filter(|r| **r).count(), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        // Guard is released, a later tick runs again.
        assert!(sched.fire("slow").await.unwrap());
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_callback_error_releases_guard() {
        let (sched, path) = scheduler("error");
        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts2 = attempts.clone();
        sched
            .add_job_fn("flaky", "0 9 * * *", move || {
                let attempts = attempts2.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err(StudoptError::Channel("send failed".into()))
                }
            })
            .unwrap();

        assert!(sched.fire("flaky").await.unwrap());
        assert!(sched.fire("flaky").await.unwrap());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_remove_and_unknown() {
        let (sched, path) = scheduler("remove");
        let counter = Arc::new(AtomicUsize::new(0));
        sched.add_job("job", "0 9 * * *", counting_callback(counter, 0)).unwrap();
        assert!(sched.remove_job("job").unwrap());
        assert!(!sched.remove_job("job").unwrap());
        assert!(sched.fire("job").await.is_err());
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_invalid_cron_rejected() {
        let (sched, path) = scheduler("badcron");
        let counter = Arc::new(AtomicUsize::new(0));
        let err = sched.add_job("bad", "not a cron", counting_callback(counter, 0));
        assert!(err.is_err());
        assert_eq!(sched.job_count(), 0);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_stop_job_keeps_registration() {
        let (sched, path) = scheduler("stop");
        let counter = Arc::new(AtomicUsize::new(0));
        sched
            .add_job("job", "0 9 * * *", counting_callback(counter.clone(), 0))
            .unwrap();
        assert!(sched.stop_job("job").unwrap());
        assert!(sched.contains("job"));
        // Manual fire still works on a stopped job.
        assert!(sched.fire("job").await.unwrap());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_snapshot_round_trip_and_unknown_names() {
        let (sched, path) = scheduler("snapshot");
        let counter = Arc::new(AtomicUsize::new(0));
        sched
            .add_job("daily-notification", "0 9 * * *", counting_callback(counter.clone(), 0))
            .unwrap();
        sched.save_state().unwrap();

        // A fresh engine registers one known job; the snapshot also carries
        // a stale name that no longer exists in code.
        let store = SnapshotStore::new(&path);
        store
            .save(&[
                JobState { name: "daily-notification".into(), running: true },
                JobState { name: "stale-job".into(), running: false },
            ])
            .unwrap();

        let sched2 = Scheduler::new(tz(), &path);
        sched2
            .add_job("daily-notification", "0 9 * * *", counting_callback(counter, 0))
            .unwrap();
        let restored = sched2.restore_all_jobs().unwrap();
        assert_eq!(restored, 1);
        assert_eq!(sched2.job_count(), 1);
        // The wedged running flag from the snapshot is cleared.
        assert!(sched2.fire("daily-notification").await.unwrap());
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_destroy_all() {
        let (sched, path) = scheduler("destroy");
        let counter = Arc::new(AtomicUsize::new(0));
        sched.add_job("a", "0 9 * * *", counting_callback(counter.clone(), 0)).unwrap();
        sched.add_job("b", "30 14 * * *", counting_callback(counter, 0)).unwrap();
        sched.destroy_all().unwrap();
        assert_eq!(sched.job_count(), 0);
        let _ = std::fs::remove_file(&path);
    }
}
