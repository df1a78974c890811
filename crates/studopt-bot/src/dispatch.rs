//! Command dispatch engine — one inbound turn, one outbound response.
//!
//! Every turn is persisted in both directions. Validation and authorization
//! problems become response text here; only store failures propagate.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use rand::seq::SliceRandom;
use serde::Deserialize;
use studopt_core::config::StudoptConfig;
use studopt_core::error::Result;
use studopt_core::time;
use studopt_core::types::{
    new_id, Assignment, AssignmentStatus, MessageDirection, MessageKind, Sender, User,
    UserAssignment,
};
use studopt_store::Store;

use crate::commands::{self, Command};
use crate::planner::Planner;
use crate::responses;

/// What the gateway should do with a turn.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    /// False when dispatch was administratively short-circuited; nothing is
    /// sent and nothing outbound was recorded.
    pub handled: bool,
    pub response: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddAssignmentPayload {
    #[serde(default)]
    name: String,
    #[serde(default)]
    class_subject_id: String,
    #[serde(default)]
    deadline: String,
    #[serde(default)]
    description: String,
}

pub struct DispatchEngine {
    store: Arc<Store>,
    planner: Planner,
    tz: FixedOffset,
    year: String,
    semester: u8,
    assignment_editors: Vec<String>,
}

impl DispatchEngine {
    pub fn new(store: Arc<Store>, config: &StudoptConfig) -> Self {
        Self {
            planner: Planner::new(store.clone(), config),
            store,
            tz: config.tz(),
            year: config.academic.year.clone(),
            semester: config.academic.semester,
            assignment_editors: config.authz.assignment_editors.clone(),
        }
    }

    /// Process one text turn.
    pub fn handle_text(&self, sender: &Sender, text: &str) -> Result<DispatchOutcome> {
        self.handle_text_at(sender, text, Utc::now())
    }

    pub fn handle_text_at(
        &self,
        sender: &Sender,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<DispatchOutcome> {
        let user = self.ensure_user(sender, now)?;
        self.store.record_message(
            &user.id,
            &sender.chat_id,
            text,
            MessageKind::Text,
            MessageDirection::Incoming,
        )?;

        if !self.store.bot_enabled() {
            tracing::info!("🔇 Bot disabled, dropping turn from {}", sender.external_id);
            return Ok(DispatchOutcome {
                handled: false,
                response: String::new(),
            });
        }

        let registered = user.active;
        let response = match commands::parse(text) {
            Some((Command::Help, _)) => responses::HELP_TEXT.to_string(),
            Some((Command::Menu, _)) => responses::menu_message(),
            Some((Command::Info, _)) => responses::INFO_TEXT.to_string(),
            Some((
                Command::Class
                | Command::Today
                | Command::RemoveAssignment
                | Command::StatusAssignment
                | Command::Docs,
                _,
            )) if !registered => responses::NOT_REGISTERED.to_string(),
            Some((Command::Class, arg)) => self.cmd_class(&user, arg)?,
            Some((Command::Today, _)) => self.planner.today_message(&user, now)?,
            Some((Command::Register, _)) => self.cmd_register(sender, &user, now)?,
            Some((Command::Unregister, _)) => self.cmd_unregister(&user)?,
            Some((Command::Assignments, _)) => self.cmd_assignments(&user)?,
            Some((Command::AddAssignmentClass, arg)) => {
                self.cmd_add_assignment(sender, arg, now)?
            }
            Some((Command::RemoveAssignment, arg)) => self.cmd_remove_assignment(&user, arg)?,
            Some((Command::StatusAssignment, arg)) => self.cmd_status_assignment(&user, arg)?,
            Some((Command::Notify, arg)) => self.cmd_notify(sender, &user, arg)?,
            Some((Command::Docs, arg)) => self.cmd_docs(arg),
            // Free text: the admin-set default response wins over the
            // built-in personalized fallback.
            None => match self.store.config_get(studopt_store::KEY_DEFAULT_RESPONSE)? {
                Some(text) if !text.is_empty() => text,
                _ => responses::unknown_response(&self.display_name(sender)),
            },
        };

        self.store.record_message(
            &user.id,
            &sender.chat_id,
            &response,
            MessageKind::Text,
            MessageDirection::Outgoing,
        )?;
        Ok(DispatchOutcome {
            handled: true,
            response,
        })
    }

    /// Process a non-text turn (sticker, photo) with a canned acknowledgement.
    pub fn handle_media(
        &self,
        sender: &Sender,
        kind: MessageKind,
        content: &str,
    ) -> Result<DispatchOutcome> {
        let user = self.ensure_user(sender, Utc::now())?;
        let logged = match kind {
            MessageKind::Sticker => format!("Sticker ID: {content}"),
            MessageKind::Photo => format!("Photo URL: {content}"),
            _ => content.to_string(),
        };
        self.store.record_message(
            &user.id,
            &sender.chat_id,
            &logged,
            kind,
            MessageDirection::Incoming,
        )?;

        if !self.store.bot_enabled() {
            return Ok(DispatchOutcome {
                handled: false,
                response: String::new(),
            });
        }

        let response = match kind {
            MessageKind::Sticker => {
                let mut rng = rand::thread_rng();
                responses::STICKER_ACKS
                    .choose(&mut rng)
                    .copied()
                    .unwrap_or(responses::STICKER_ACKS[0])
                    .to_string()
            }
            _ => responses::photo_ack(&self.display_name(sender)),
        };

        self.store.record_message(
            &user.id,
            &sender.chat_id,
            &response,
            kind,
            MessageDirection::Outgoing,
        )?;
        Ok(DispatchOutcome {
            handled: true,
            response,
        })
    }

    fn display_name(&self, sender: &Sender) -> String {
        if sender.display_name.is_empty() {
            "bạn".to_string()
        } else {
            sender.display_name.clone()
        }
    }

    /// A user row always exists once someone talks to the bot; it starts
    /// inactive until `/register`.
    fn ensure_user(&self, sender: &Sender, now: DateTime<Utc>) -> Result<User> {
        if let Some(user) = self.store.find_user_by_external_id(&sender.external_id)? {
            return Ok(user);
        }
        let user = User {
            id: new_id(),
            external_id: sender.external_id.clone(),
            name: sender.display_name.clone(),
            active: false,
            notify: false,
            created_at: now,
            updated_at: now,
        };
        self.store.upsert_user(&user)?;
        Ok(user)
    }

    fn format_class_block(&self, cls: &studopt_core::types::ClassSubject) -> String {
        format!(
            "• Mã: {}\n• Môn: {}\n• Giảng viên: {}\n• Thời gian: {} đến {} {}\n{}",
            cls.subject_id,
            cls.subject_name,
            cls.teacher,
            cls.start_time,
            cls.end_time,
            time::day_of_week_text(cls.day_of_week),
            "-".repeat(50),
        )
    }

    fn cmd_class(&self, user: &User, arg: &str) -> Result<String> {
        let classes = self.store.classes_for_user(&user.id)?;
        if classes.is_empty() {
            return Ok(responses::NO_CLASSES.to_string());
        }

        let body = if arg.is_empty() {
            let blocks: Vec<String> = classes.iter().map(|c| self.format_class_block(c)).collect();
            format!("📚 Lớp học của bạn:\n{}", blocks.join("\n"))
        } else {
            match classes
                .iter()
                .find(|c| c.subject_id.starts_with(arg) || c.subject_name == arg)
            {
                None => return Ok(format!("❌ Không tìm thấy lớp học với mã: {arg}")),
                Some(cls) => format!("📚 Lớp học của bạn:\n{}", self.format_class_block(cls)),
            }
        };
        Ok(format!("{body}\nChúc bạn một tuần học tập hiệu quả! 🎉"))
    }

    fn cmd_register(&self, sender: &Sender, user: &User, now: DateTime<Utc>) -> Result<String> {
        if user.active {
            return Ok(responses::REGISTER_ALREADY.to_string());
        }
        let mut updated = user.clone();
        updated.active = true;
        updated.notify = true;
        if !sender.display_name.is_empty() {
            updated.name = sender.display_name.clone();
        }
        updated.updated_at = now;
        self.store.upsert_user(&updated)?;

        let main = self.store.main_classes(&self.year, self.semester)?;
        let enrolled = self
            .store
            .enroll_replace(&updated.id, &main, &self.year, self.semester)?;
        tracing::info!(
            "🎓 User {} registered into {enrolled} classes",
            sender.external_id
        );
        Ok(responses::register_success_message())
    }

    fn cmd_unregister(&self, user: &User) -> Result<String> {
        if !user.active {
            return Ok(responses::NOT_REGISTERED.to_string());
        }
        self.store.set_user_active(&user.id, false)?;
        self.store.set_user_notify(&user.id, false)?;
        Ok(responses::UNREGISTER_SUCCESS.to_string())
    }

    fn cmd_assignments(&self, user: &User) -> Result<String> {
        let assignments = self.store.user_assignments(&user.id)?;
        if assignments.is_empty() {
            return Ok(responses::NO_ASSIGNMENTS.to_string());
        }
        let mut blocks = Vec::new();
        for (ua, a) in &assignments {
            let subject = self
                .store
                .find_class_by_id(&a.class_subject_id)?
                .map(|c| c.subject_name)
                .unwrap_or_else(|| "Không xác định".to_string());
            blocks.push(format!(
                "• Mã: {}\n• Bài tập: {}\n• Mô tả: {}\n• Hạn nộp: {}\n• Môn: {}\n• Hoàn thành: {}\n{}",
                ua.id,
                a.name,
                a.description,
                time::format_date(a.deadline, self.tz),
                subject,
                ua.status.icon(),
                "-".repeat(36),
            ));
        }
        Ok(format!(
            "🫣 Danh sách bài tập của bạn:\n\n{}\nHãy cố gắng hoàn thành đúng hạn nhé! 😊",
            blocks.join("\n")
        ))
    }

    fn cmd_add_assignment(
        &self,
        sender: &Sender,
        arg: &str,
        now: DateTime<Utc>,
    ) -> Result<String> {
        if !self
            .assignment_editors
            .iter()
            .any(|e| e == &sender.external_id)
        {
            return Ok(responses::PERMISSION_DENIED.to_string());
        }

        let payload: AddAssignmentPayload = match serde_json::from_str(arg) {
            Ok(p) => p,
            Err(_) => return Ok(responses::ADD_ASSIGNMENT_SYNTAX.to_string()),
        };
        if payload.name.is_empty() || payload.class_subject_id.is_empty() || payload.deadline.is_empty()
        {
            return Ok(responses::ADD_ASSIGNMENT_SYNTAX.to_string());
        }

        let Some(cls) = self
            .store
            .find_class_by_code_contains(&payload.class_subject_id)?
        else {
            return Ok(format!(
                "Không tìm thấy môn học với mã hoặc tên chứa: {}. Vui lòng kiểm tra lại.",
                payload.class_subject_id
            ));
        };

        let deadline = match time::parse_local(&payload.deadline, self.tz) {
            Ok(d) => d,
            Err(_) => return Ok(responses::ADD_ASSIGNMENT_BAD_DATE.to_string()),
        };

        let existing = self.store.assignments_for_class(&cls.id)?;
        if existing
            .iter()
            .any(|a| a.name == payload.name && time::is_same_day(a.deadline, deadline, self.tz))
        {
            return Ok(format!(
                "Bài tập với tên \"{}\" thuộc môn {} và hạn nộp vào {} đã tồn tại. Vui lòng kiểm tra lại.",
                payload.name,
                cls.subject_name,
                time::format_date(deadline, self.tz),
            ));
        }

        let assignment = Assignment {
            id: new_id(),
            class_subject_id: cls.id.clone(),
            name: payload.name.clone(),
            description: payload.description.clone(),
            deadline,
            deadline_remind: None,
            created_at: now,
        };
        self.store.create_assignment(&assignment)?;

        let mut message = format!(
            "Đã thêm bài tập: {} thuộc môn {} với hạn nộp vào {}",
            payload.name,
            cls.subject_name,
            time::format_date(deadline, self.tz),
        );

        // Fan-out: one pending copy per enrolled user. Failures are reported
        // and skipped, never rolled back.
        for enrolled in self.store.users_enrolled(&cls.id)? {
            let copy = UserAssignment {
                id: new_id(),
                assignment_id: assignment.id.clone(),
                user_id: enrolled.id.clone(),
                status: AssignmentStatus::Pending,
                is_deleted: false,
                created_by: sender.external_id.clone(),
                created_at: now,
            };
            match self.store.create_user_assignment(&copy) {
                Ok(()) => {
                    message.push_str(&format!(
                        "\nĐã gán bài tập cho người dùng: {}",
                        enrolled.external_id
                    ));
                }
                Err(e) => {
                    tracing::warn!(
                        "⚠️ Failed to assign '{}' to user {}: {e}",
                        payload.name,
                        enrolled.external_id
                    );
                    message.push_str(&format!(
                        "\n⚠️ Không thể gán bài tập cho người dùng: {}",
                        enrolled.external_id
                    ));
                }
            }
        }
        Ok(message)
    }

    fn cmd_remove_assignment(&self, user: &User, arg: &str) -> Result<String> {
        if arg.is_empty() {
            return Ok(responses::REMOVE_ASSIGNMENT_SYNTAX.to_string());
        }
        let Some(record) = self.store.find_user_assignment(arg, &user.id)? else {
            return Ok(format!(
                "Không tìm thấy bài tập với mã: {arg}. Vui lòng kiểm tra lại cú pháp."
            ));
        };
        self.store.soft_delete_user_assignment(&record.id, &user.id)?;
        let name = self
            .store
            .find_assignment(&record.assignment_id)?
            .map(|a| a.name)
            .unwrap_or_default();
        Ok(format!("Đã xóa bài tập \"{name}\" khỏi danh sách của bạn."))
    }

    fn cmd_status_assignment(&self, user: &User, arg: &str) -> Result<String> {
        let mut parts = arg.split('|').map(str::trim);
        let assignment_id = parts.next().unwrap_or("");
        let completed = match parts.next() {
            Some("true") => true,
            Some("false") => false,
            _ => {
                return Ok(responses::STATUS_ASSIGNMENT_SYNTAX.to_string());
            }
        };
        if assignment_id.is_empty() {
            return Ok(responses::STATUS_ASSIGNMENT_SYNTAX.to_string());
        }

        let Some(record) = self.store.find_user_assignment(assignment_id, &user.id)? else {
            return Ok(format!(
                "Không tìm thấy bài tập với mã: {assignment_id}. Vui lòng kiểm tra lại cú pháp."
            ));
        };
        let status = if completed {
            AssignmentStatus::Completed
        } else {
            AssignmentStatus::Pending
        };
        self.store
            .set_user_assignment_status(&record.id, &user.id, status)?;

        let assignment = self.store.find_assignment(&record.assignment_id)?;
        let subject = match &assignment {
            Some(a) => self
                .store
                .find_class_by_id(&a.class_subject_id)?
                .map(|c| c.subject_name)
                .unwrap_or_default(),
            None => String::new(),
        };
        Ok(format!(
            "Đã cập nhật trạng thái bài tập \"{}\" môn [{}] thành {}.",
            assignment.map(|a| a.name).unwrap_or_default(),
            subject,
            if completed {
                "hoàn thành ✅"
            } else {
                "chưa hoàn thành ❌"
            },
        ))
    }

    fn cmd_notify(&self, sender: &Sender, user: &User, arg: &str) -> Result<String> {
        let enable = match arg.to_lowercase().as_str() {
            "on" => true,
            "off" => false,
            _ => return Ok(responses::NOTIFY_INVALID.to_string()),
        };
        self.store.set_user_notify(&user.id, enable)?;
        let mut message = format!(
            "Chào {}, Bạn đã {} thông báo nhắc nhở lịch học và bài tập.",
            self.display_name(sender),
            if enable { "bật" } else { "tắt" },
        );
        if !enable {
            message.push_str(" Bạn sẽ không nhận được thông báo nhắc nhở về bài tập nữa ạ!");
        }
        Ok(message)
    }

    fn cmd_docs(&self, arg: &str) -> String {
        let code = arg.trim().to_uppercase();
        if code.is_empty() {
            return responses::docs_listing();
        }
        match responses::docs_link(&code) {
            Some(link) => format!("📚 Tài liệu cho lớp học {code}:\n{link}"),
            None => responses::DOCS_NOT_FOUND.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studopt_core::types::ClassSubject;

    fn sender(id: &str) -> Sender {
        Sender {
            external_id: id.to_string(),
            display_name: "An".to_string(),
            chat_id: id.to_string(),
        }
    }

    fn main_class(code: &str, day: u8) -> ClassSubject {
        ClassSubject {
            id: new_id(),
            subject_id: code.to_string(),
            subject_name: format!("Môn {code}"),
            teacher: "GV".to_string(),
            day_of_week: day,
            start_time: "09:00".to_string(),
            end_time: "11:30".to_string(),
            year: "2025-2026".to_string(),
            semester: 3,
            is_main: true,
        }
    }

    fn engine() -> (DispatchEngine, Arc<Store>) {
        let store = Arc::new(Store::open_in_memory().unwrap());
        store.insert_class_subject(&main_class("IT003", 1)).unwrap();
        store.insert_class_subject(&main_class("MA004", 2)).unwrap();
        let mut config = StudoptConfig::default();
        config.authz.assignment_editors = vec!["admin1".to_string()];
        (DispatchEngine::new(store.clone(), &config), store)
    }

    fn register(engine: &DispatchEngine, id: &str) {
        let out = engine.handle_text(&sender(id), "/register").unwrap();
        assert!(out.response.contains("ĐĂNG KÝ THÀNH CÔNG"));
    }

    fn add_assignment(engine: &DispatchEngine, name: &str) -> DispatchOutcome {
        let cmd = format!(
            "/add_assignment_class {{\"name\": \"{name}\", \"classSubjectId\": \"IT003\", \"deadline\": \"2026-03-01 10:00\"}}"
        );
        engine.handle_text(&sender("admin1"), &cmd).unwrap()
    }

    #[test]
    fn test_register_enrolls_and_is_idempotent() {
        let (engine, store) = engine();
        register(&engine, "z1");

        let user = store.find_user_by_external_id("z1").unwrap().unwrap();
        assert!(user.active);
        assert!(user.notify);
        assert_eq!(store.classes_for_user(&user.id).unwrap().len(), 2);

        let again = engine.handle_text(&sender("z1"), "/register").unwrap();
        assert_eq!(again.response, responses::REGISTER_ALREADY);
        // Still exactly one enrollment per main class.
        assert_eq!(store.classes_for_user(&user.id).unwrap().len(), 2);
    }

    #[test]
    fn test_registration_precondition() {
        let (engine, _) = engine();
        for cmd in ["/class", "/today", "/remove_assignment x", "/status_assignment x|true", "/docs"] {
            let out = engine.handle_text(&sender("stranger"), cmd).unwrap();
            assert_eq!(out.response, responses::NOT_REGISTERED, "cmd: {cmd}");
        }
    }

    #[test]
    fn test_unregister_round_trip() {
        let (engine, store) = engine();
        register(&engine, "z1");
        let out = engine.handle_text(&sender("z1"), "/unregister").unwrap();
        assert_eq!(out.response, responses::UNREGISTER_SUCCESS);
        let user = store.find_user_by_external_id("z1").unwrap().unwrap();
        assert!(!user.active);
        assert!(!user.notify);

        let again = engine.handle_text(&sender("z1"), "/unregister").unwrap();
        assert_eq!(again.response, responses::NOT_REGISTERED);
    }

    #[test]
    fn test_class_listing_and_lookup() {
        let (engine, _) = engine();
        register(&engine, "z1");

        let all = engine.handle_text(&sender("z1"), "/class").unwrap();
        assert!(all.response.contains("IT003"));
        assert!(all.response.contains("MA004"));

        let one = engine.handle_text(&sender("z1"), "/class IT003").unwrap();
        assert!(one.response.contains("Môn IT003"));
        assert!(!one.response.contains("MA004"));

        let missing = engine.handle_text(&sender("z1"), "/class XX999").unwrap();
        assert!(missing.response.contains("Không tìm thấy lớp học"));
    }

    #[test]
    fn test_add_assignment_fans_out_to_enrolled_users() {
        let (engine, store) = engine();
        register(&engine, "z1");
        register(&engine, "z2");

        let out = add_assignment(&engine, "BT1");
        assert!(out.response.contains("Đã thêm bài tập: BT1"));

        for id in ["z1", "z2"] {
            let user = store.find_user_by_external_id(id).unwrap().unwrap();
            let copies = store.user_assignments(&user.id).unwrap();
            assert_eq!(copies.len(), 1, "user {id}");
            assert_eq!(copies[0].0.status, AssignmentStatus::Pending);
        }
    }

    #[test]
    fn test_add_assignment_rejects_duplicates() {
        let (engine, store) = engine();
        register(&engine, "z1");
        add_assignment(&engine, "BT1");
        let dup = add_assignment(&engine, "BT1");
        assert!(dup.response.contains("đã tồn tại"));

        let cls = store.find_class_by_code_contains("IT003").unwrap().unwrap();
        assert_eq!(store.assignments_for_class(&cls.id).unwrap().len(), 1);
    }

    #[test]
    fn test_add_assignment_requires_editor() {
        let (engine, _) = engine();
        register(&engine, "z1");
        let out = engine
            .handle_text(
                &sender("z1"),
                "/add_assignment_class {\"name\": \"BT\", \"classSubjectId\": \"IT003\", \"deadline\": \"2026-03-01 10:00\"}",
            )
            .unwrap();
        assert_eq!(out.response, responses::PERMISSION_DENIED);
    }

    #[test]
    fn test_add_assignment_validation() {
        let (engine, _) = engine();
        let bad_json = engine
            .handle_text(&sender("admin1"), "/add_assignment_class not json")
            .unwrap();
        assert_eq!(bad_json.response, responses::ADD_ASSIGNMENT_SYNTAX);

        let bad_date = engine
            .handle_text(
                &sender("admin1"),
                "/add_assignment_class {\"name\": \"BT\", \"classSubjectId\": \"IT003\", \"deadline\": \"01-03-2026\"}",
            )
            .unwrap();
        assert_eq!(bad_date.response, responses::ADD_ASSIGNMENT_BAD_DATE);

        let bad_class = engine
            .handle_text(
                &sender("admin1"),
                "/add_assignment_class {\"name\": \"BT\", \"classSubjectId\": \"ZZ111\", \"deadline\": \"2026-03-01 10:00\"}",
            )
            .unwrap();
        assert!(bad_class.response.contains("Không tìm thấy môn học"));
    }

    #[test]
    fn test_status_assignment_round_trip_with_icon() {
        let (engine, store) = engine();
        register(&engine, "z1");
        add_assignment(&engine, "BT1");

        let user = store.find_user_by_external_id("z1").unwrap().unwrap();
        let ua_id = store.user_assignments(&user.id).unwrap()[0].0.id.clone();

        let done = engine
            .handle_text(&sender("z1"), &format!("/status_assignment {ua_id}|true"))
            .unwrap();
        assert!(done.response.contains("hoàn thành ✅"));
        let listing = engine.handle_text(&sender("z1"), "/assignments").unwrap();
        assert!(listing.response.contains("✅"));

        let undone = engine
            .handle_text(&sender("z1"), &format!("/status_assignment {ua_id}|false"))
            .unwrap();
        assert!(undone.response.contains("chưa hoàn thành ❌"));
        let listing = engine.handle_text(&sender("z1"), "/assignments").unwrap();
        assert!(listing.response.contains("❌"));
    }

    #[test]
    fn test_status_assignment_syntax_errors() {
        let (engine, _) = engine();
        register(&engine, "z1");
        for arg in ["", "abc", "abc|maybe", "|true"] {
            let out = engine
                .handle_text(&sender("z1"), &format!("/status_assignment {arg}"))
                .unwrap();
            assert_eq!(out.response, responses::STATUS_ASSIGNMENT_SYNTAX, "arg: '{arg}'");
        }
    }

    #[test]
    fn test_remove_assignment() {
        let (engine, store) = engine();
        register(&engine, "z1");
        add_assignment(&engine, "BT1");
        let user = store.find_user_by_external_id("z1").unwrap().unwrap();
        let ua_id = store.user_assignments(&user.id).unwrap()[0].0.id.clone();

        let missing_arg = engine.handle_text(&sender("z1"), "/remove_assignment").unwrap();
        assert_eq!(missing_arg.response, responses::REMOVE_ASSIGNMENT_SYNTAX);

        let unknown = engine
            .handle_text(&sender("z1"), "/remove_assignment nope")
            .unwrap();
        assert!(unknown.response.contains("Không tìm thấy bài tập"));

        let removed = engine
            .handle_text(&sender("z1"), &format!("/remove_assignment {ua_id}"))
            .unwrap();
        assert!(removed.response.contains("Đã xóa bài tập \"BT1\""));
        assert!(store.user_assignments(&user.id).unwrap().is_empty());
    }

    #[test]
    fn test_notify_invalid_leaves_state_unchanged() {
        let (engine, store) = engine();
        register(&engine, "z1");

        let out = engine.handle_text(&sender("z1"), "/notify xyz").unwrap();
        assert_eq!(out.response, responses::NOTIFY_INVALID);
        let user = store.find_user_by_external_id("z1").unwrap().unwrap();
        assert!(user.notify);
    }

    #[test]
    fn test_notify_toggle() {
        let (engine, store) = engine();
        register(&engine, "z1");

        let off = engine.handle_text(&sender("z1"), "/notify OFF").unwrap();
        assert!(off.response.contains("tắt thông báo"));
        let user = store.find_user_by_external_id("z1").unwrap().unwrap();
        assert!(!user.notify);

        engine.handle_text(&sender("z1"), "/notify on").unwrap();
        let user = store.find_user_by_external_id("z1").unwrap().unwrap();
        assert!(user.notify);
    }

    #[test]
    fn test_docs() {
        let (engine, _) = engine();
        register(&engine, "z1");

        let listing = engine.handle_text(&sender("z1"), "/docs").unwrap();
        assert!(listing.response.contains("IT003"));
        assert!(listing.response.contains("MA005"));

        let known = engine.handle_text(&sender("z1"), "/docs it003").unwrap();
        assert!(known.response.contains("drive.google.com"));

        let unknown = engine.handle_text(&sender("z1"), "/docs XX999").unwrap();
        assert_eq!(unknown.response, responses::DOCS_NOT_FOUND);
    }

    #[test]
    fn test_unknown_text_gets_fallback() {
        let (engine, _) = engine();
        let out = engine.handle_text(&sender("z1"), "xin chào bot").unwrap();
        assert!(out.handled);
        assert!(out.response.contains("/help"));
    }

    #[test]
    fn test_default_response_override() {
        let (engine, store) = engine();
        store
            .config_set(studopt_store::KEY_DEFAULT_RESPONSE, "Thử /help nhé!", "")
            .unwrap();
        let out = engine.handle_text(&sender("z1"), "xin chào bot").unwrap();
        assert_eq!(out.response, "Thử /help nhé!");
    }

    #[test]
    fn test_turn_persists_both_directions() {
        let (engine, store) = engine();
        engine.handle_text(&sender("z1"), "/help").unwrap();
        let user = store.find_user_by_external_id("z1").unwrap().unwrap();
        assert_eq!(store.message_count(&user.id).unwrap(), 2);
    }

    #[test]
    fn test_disabled_bot_short_circuits() {
        let (engine, store) = engine();
        store.set_bot_enabled(false).unwrap();
        let out = engine.handle_text(&sender("z1"), "/help").unwrap();
        assert!(!out.handled);
        assert!(out.response.is_empty());
        // Incoming is still on record; nothing outbound.
        let user = store.find_user_by_external_id("z1").unwrap().unwrap();
        assert_eq!(store.message_count(&user.id).unwrap(), 1);
    }

    #[test]
    fn test_media_acknowledgements() {
        let (engine, store) = engine();
        let sticker = engine
            .handle_media(&sender("z1"), MessageKind::Sticker, "sticker-42")
            .unwrap();
        assert!(responses::STICKER_ACKS.contains(&sticker.response.as_str()));

        let photo = engine
            .handle_media(&sender("z1"), MessageKind::Photo, "https://img/1.jpg")
            .unwrap();
        assert!(photo.response.contains("bức ảnh"));

        let user = store.find_user_by_external_id("z1").unwrap().unwrap();
        assert_eq!(store.message_count(&user.id).unwrap(), 4);
    }
}
