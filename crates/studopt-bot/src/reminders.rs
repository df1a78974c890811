//! Reminder runner — delivers planner output and keeps per-user pre-start
//! jobs registered on the scheduler.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use studopt_channels::DispatchSink;
use studopt_core::config::StudoptConfig;
use studopt_core::error::Result;
use studopt_core::types::{MessageDirection, MessageKind};
use studopt_scheduler::Scheduler;
use studopt_store::Store;

use crate::planner::Planner;

/// Send one planned message and record it as outbound. Delivery failure for
/// one user never aborts the batch.
async fn deliver(store: &Store, sink: &dyn DispatchSink, external_id: &str, text: &str) {
    if let Ok(Some(user)) = store.find_user_by_external_id(external_id) {
        if let Err(e) = store.record_message(
            &user.id,
            external_id,
            text,
            MessageKind::Template,
            MessageDirection::Outgoing,
        ) {
            tracing::warn!("⚠️ Failed to record reminder for {external_id}: {e}");
        }
    } else {
        tracing::warn!("⚠️ Reminder for unknown user {external_id}");
    }
    match sink.send(external_id, text).await {
        Ok(true) => {}
        Ok(false) => tracing::warn!("⚠️ Reminder to {external_id} was not accepted"),
        Err(e) => tracing::warn!("⚠️ Reminder to {external_id} failed: {e}"),
    }
}

pub struct ReminderRunner {
    planner: Planner,
    store: Arc<Store>,
    sink: Arc<dyn DispatchSink>,
    scheduler: Arc<Scheduler>,
}

impl ReminderRunner {
    pub fn new(
        store: Arc<Store>,
        config: &StudoptConfig,
        sink: Arc<dyn DispatchSink>,
        scheduler: Arc<Scheduler>,
    ) -> Self {
        Self {
            planner: Planner::new(store.clone(), config),
            store,
            sink,
            scheduler,
        }
    }

    /// Morning tick: send every user their calendar digest, then re-register
    /// today's pre-start reminder jobs.
    pub async fn run_daily_digest(&self) -> Result<()> {
        self.run_daily_digest_at(Utc::now()).await
    }

    pub async fn run_daily_digest_at(&self, now: DateTime<Utc>) -> Result<()> {
        let planned = self.planner.daily_digest(now)?;
        tracing::info!("📅 Daily digest: {} messages planned", planned.len());
        for msg in &planned {
            deliver(&self.store, self.sink.as_ref(), &msg.external_id, &msg.text).await;
        }
        self.refresh_prestart_jobs(now)
    }

    /// Afternoon tick: assignment-due reminders for the next seven days.
    pub async fn run_due_reminders(&self) -> Result<()> {
        self.run_due_reminders_at(Utc::now()).await
    }

    pub async fn run_due_reminders_at(&self, now: DateTime<Utc>) -> Result<()> {
        let planned = self.planner.due_reminders(now)?;
        tracing::info!("📌 Due reminders: {} messages planned", planned.len());
        for msg in &planned {
            deliver(&self.store, self.sink.as_ref(), &msg.external_id, &msg.text).await;
        }
        Ok(())
    }

    /// Register today's pre-start jobs. Names are stable per user, so
    /// registering again replaces yesterday's job rather than stacking.
    fn refresh_prestart_jobs(&self, now: DateTime<Utc>) -> Result<()> {
        let jobs = self.planner.prestart_jobs(now)?;
        for job in jobs {
            let store = self.store.clone();
            let sink = self.sink.clone();
            let external_id = job.external_id.clone();
            let text = job.text.clone();
            self.scheduler
                .add_job_fn(&job.name, &job.cron_expr, move || {
                    let store = store.clone();
                    let sink = sink.clone();
                    let external_id = external_id.clone();
                    let text = text.clone();
                    async move {
                        deliver(&store, sink.as_ref(), &external_id, &text).await;
                        Ok(())
                    }
                })?;
        }
        Ok(())
    }
}
