//! Notification planner — composes who gets told what, and when.
//!
//! Pure planning over the store: delivery is the reminder runner's job.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, FixedOffset, Timelike, Utc};
use studopt_core::config::StudoptConfig;
use studopt_core::error::Result;
use studopt_core::time;
use studopt_core::types::{ClassSubject, User};
use studopt_store::Store;

use crate::responses;

/// One message the planner wants delivered to one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMessage {
    pub external_id: String,
    pub text: String,
}

/// A per-user pre-start reminder job to (re)register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrestartJob {
    pub name: String,
    pub cron_expr: String,
    pub external_id: String,
    pub text: String,
}

pub struct Planner {
    store: Arc<Store>,
    tz: FixedOffset,
    year: String,
    semester: u8,
    lead_minutes: i64,
}

impl Planner {
    pub fn new(store: Arc<Store>, config: &StudoptConfig) -> Self {
        Self {
            store,
            tz: config.tz(),
            year: config.academic.year.clone(),
            semester: config.academic.semester,
            lead_minutes: config.schedule.prestart_lead_minutes,
        }
    }

    fn day_of_week(&self, now: DateTime<Utc>) -> u8 {
        now.with_timezone(&self.tz).weekday().num_days_from_sunday() as u8
    }

    fn classes_today(&self, user: &User, now: DateTime<Utc>) -> Result<Vec<ClassSubject>> {
        self.store
            .classes_for_user_on_day(&user.id, self.day_of_week(now), &self.year, self.semester)
    }

    fn compose_digest(&self, classes: &[ClassSubject]) -> String {
        let lines: Vec<String> = classes
            .iter()
            .map(|cls| {
                format!(
                    "• Môn: {}\n• Giảng viên: {}\n• Thời gian: {} đến {} {}",
                    cls.subject_name,
                    cls.teacher,
                    cls.start_time,
                    cls.end_time,
                    time::day_of_week_text(cls.day_of_week),
                )
            })
            .collect();
        format!(
            "📅 Lịch học hôm nay của bạn:\n{}\nChúc bạn một ngày học tập hiệu quả! 🎉",
            lines.join("\n")
        )
    }

    /// Daily calendar digest for every notify-eligible user. Users with no
    /// classes today are silently skipped.
    pub fn daily_digest(&self, now: DateTime<Utc>) -> Result<Vec<PlannedMessage>> {
        let mut planned = Vec::new();
        for user in self.store.find_active_notify_users()? {
            let classes = self.classes_today(&user, now)?;
            if classes.is_empty() {
                continue;
            }
            planned.push(PlannedMessage {
                external_id: user.external_id,
                text: self.compose_digest(&classes),
            });
        }
        Ok(planned)
    }

    /// The `/today` composition; unlike the digest, an empty day gets text.
    pub fn today_message(&self, user: &User, now: DateTime<Utc>) -> Result<String> {
        let classes = self.classes_today(user, now)?;
        if classes.is_empty() {
            return Ok(responses::NO_CLASSES_TODAY.to_string());
        }
        Ok(self.compose_digest(&classes))
    }

    /// Per-user assignment-due reminders: pending, non-deleted copies whose
    /// deadline falls within the next seven days. Users with none are skipped.
    pub fn due_reminders(&self, now: DateTime<Utc>) -> Result<Vec<PlannedMessage>> {
        let mut planned = Vec::new();
        for user in self.store.find_active_notify_users()? {
            let due = self.store.assignments_due_within(&user.id, now, 7)?;
            if due.is_empty() {
                continue;
            }
            let lines: Vec<String> = due
                .iter()
                .map(|(_, a)| {
                    format!(
                        "📍 {}   ✒️ Hạn nộp: {}",
                        a.name,
                        time::format_date_time(a.deadline, self.tz)
                    )
                })
                .collect();
            let text = format!(
                "📌 Nhắc nhở: Bạn có {} bài tập sắp đến hạn:\n{}\nHãy hoàn thành chúng đúng hạn nhé! 💪",
                due.len(),
                lines.join("\n")
            );
            planned.push(PlannedMessage {
                external_id: user.external_id,
                text,
            });
        }
        Ok(planned)
    }

    /// Pre-start reminder jobs for today's classes, `lead_minutes` before
    /// each start. Reminders whose fire time already passed are dropped.
    /// Job names are deterministic per user so re-planning replaces
    /// yesterday's registration.
    pub fn prestart_jobs(&self, now: DateTime<Utc>) -> Result<Vec<PrestartJob>> {
        let local_now = now.with_timezone(&self.tz);
        let mut jobs = Vec::new();
        for user in self.store.find_active_notify_users()? {
            for cls in self.classes_today(&user, now)? {
                let start =
                    match time::next_class_occurrence(local_now, cls.day_of_week, &cls.start_time)
                    {
                        Ok(start) => start,
                        Err(e) => {
                            tracing::warn!(
                                "⚠️ Bad start time for class {}: {e}",
                                cls.subject_id
                            );
                            continue;
                        }
                    };
                let notify_at = start - Duration::minutes(self.lead_minutes);
                if notify_at <= local_now {
                    continue;
                }
                jobs.push(PrestartJob {
                    name: format!("notify-before-start-subject-{}", user.external_id),
                    cron_expr: format!("{} {} * * *", notify_at.minute(), notify_at.hour()),
                    external_id: user.external_id.clone(),
                    text: format!(
                        "⏰ Nhắc nhở: Môn {} của bạn sẽ bắt đầu vào lúc {} hôm nay. \
Hãy chuẩn bị sẵn sàng!",
                        cls.subject_name, cls.start_time
                    ),
                });
            }
        }
        Ok(jobs)
    }
}
