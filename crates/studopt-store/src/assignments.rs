//! Assignments and per-user assignment copies.

use chrono::{DateTime, Duration, Utc};
use rusqlite::Row;
use studopt_core::error::Result;
use studopt_core::types::{Assignment, AssignmentStatus, UserAssignment};

use crate::users::parse_ts;
use crate::{db_err, Store};

fn row_to_assignment(row: &Row) -> rusqlite::Result<Assignment> {
    Ok(Assignment {
        id: row.get(0)?,
        class_subject_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        deadline: parse_ts(row.get(4)?),
        deadline_remind: row.get::<_, Option<String>>(5)?.map(parse_ts),
        created_at: parse_ts(row.get(6)?),
    })
}

fn row_to_user_assignment(row: &Row) -> rusqlite::Result<UserAssignment> {
    Ok(UserAssignment {
        id: row.get(0)?,
        assignment_id: row.get(1)?,
        user_id: row.get(2)?,
        status: AssignmentStatus::parse(&row.get::<_, String>(3)?)
            .unwrap_or(AssignmentStatus::Pending),
        is_deleted: row.get::<_, i64>(4)? != 0,
        created_by: row.get(5)?,
        created_at: parse_ts(row.get(6)?),
    })
}

const ASSIGNMENT_COLS: &str =
    "id, class_subject_id, name, description, deadline, deadline_remind, created_at";
const UA_COLS: &str = "id, assignment_id, user_id, status, is_deleted, created_by, created_at";

impl Store {
    pub fn create_assignment(&self, a: &Assignment) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            &format!(
                "INSERT INTO assignments ({ASSIGNMENT_COLS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
            ),
            rusqlite::params![
                a.id,
                a.class_subject_id,
                a.name,
                a.description,
                a.deadline.to_rfc3339(),
                a.deadline_remind.map(|d| d.to_rfc3339()),
                a.created_at.to_rfc3339(),
            ],
        )
        .map_err(db_err)?;
        Ok(())
    }

    pub fn find_assignment(&self, id: &str) -> Result<Option<Assignment>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!("SELECT {ASSIGNMENT_COLS} FROM assignments WHERE id = ?1"))
            .map_err(db_err)?;
        Ok(stmt.query_row(rusqlite::params![id], row_to_assignment).ok())
    }

    pub fn assignments_for_class(&self, class_subject_id: &str) -> Result<Vec<Assignment>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {ASSIGNMENT_COLS} FROM assignments
                 WHERE class_subject_id = ?1 ORDER BY deadline"
            ))
            .map_err(db_err)?;
        let rows = stmt
            .query_map(rusqlite::params![class_subject_id], row_to_assignment)
            .map_err(db_err)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    pub fn update_assignment(&self, a: &Assignment) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE assignments SET name = ?1, description = ?2, deadline = ?3 WHERE id = ?4",
            rusqlite::params![a.name, a.description, a.deadline.to_rfc3339(), a.id],
        )
        .map_err(db_err)?;
        Ok(())
    }

    pub fn delete_assignment(&self, id: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM assignments WHERE id = ?1", rusqlite::params![id])
            .map_err(db_err)?;
        conn.execute(
            "DELETE FROM user_assignments WHERE assignment_id = ?1",
            rusqlite::params![id],
        )
        .map_err(db_err)?;
        Ok(())
    }

    pub fn create_user_assignment(&self, ua: &UserAssignment) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            &format!(
                "INSERT INTO user_assignments ({UA_COLS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
            ),
            rusqlite::params![
                ua.id,
                ua.assignment_id,
                ua.user_id,
                ua.status.as_str(),
                ua.is_deleted as i64,
                ua.created_by,
                ua.created_at.to_rfc3339(),
            ],
        )
        .map_err(db_err)?;
        Ok(())
    }

    /// A user's live assignment copies joined with assignment details.
    pub fn user_assignments(&self, user_id: &str) -> Result<Vec<(UserAssignment, Assignment)>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT ua.id, ua.assignment_id, ua.user_id, ua.status, ua.is_deleted,
                        ua.created_by, ua.created_at,
                        a.id, a.class_subject_id, a.name, a.description, a.deadline,
                        a.deadline_remind, a.created_at
                 FROM user_assignments ua
                 JOIN assignments a ON a.id = ua.assignment_id
                 WHERE ua.user_id = ?1 AND ua.is_deleted = 0
                 ORDER BY a.deadline",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(rusqlite::params![user_id], |row| {
                Ok((
                    UserAssignment {
                        id: row.get(0)?,
                        assignment_id: row.get(1)?,
                        user_id: row.get(2)?,
                        status: AssignmentStatus::parse(&row.get::<_, String>(3)?)
                            .unwrap_or(AssignmentStatus::Pending),
                        is_deleted: row.get::<_, i64>(4)? != 0,
                        created_by: row.get(5)?,
                        created_at: parse_ts(row.get(6)?),
                    },
                    Assignment {
                        id: row.get(7)?,
                        class_subject_id: row.get(8)?,
                        name: row.get(9)?,
                        description: row.get(10)?,
                        deadline: parse_ts(row.get(11)?),
                        deadline_remind: row.get::<_, Option<String>>(12)?.map(parse_ts),
                        created_at: parse_ts(row.get(13)?),
                    },
                ))
            })
            .map_err(db_err)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// One live copy belonging to one user, by copy id.
    pub fn find_user_assignment(&self, id: &str, user_id: &str) -> Result<Option<UserAssignment>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {UA_COLS} FROM user_assignments
                 WHERE id = ?1 AND user_id = ?2 AND is_deleted = 0"
            ))
            .map_err(db_err)?;
        Ok(stmt
            .query_row(rusqlite::params![id, user_id], row_to_user_assignment)
            .ok())
    }

    pub fn soft_delete_user_assignment(&self, id: &str, user_id: &str) -> Result<bool> {
        let conn = self.lock()?;
        let n = conn
            .execute(
                "UPDATE user_assignments SET is_deleted = 1 WHERE id = ?1 AND user_id = ?2",
                rusqlite::params![id, user_id],
            )
            .map_err(db_err)?;
        Ok(n > 0)
    }

    pub fn set_user_assignment_status(
        &self,
        id: &str,
        user_id: &str,
        status: AssignmentStatus,
    ) -> Result<bool> {
        let conn = self.lock()?;
        let n = conn
            .execute(
                "UPDATE user_assignments SET status = ?1
                 WHERE id = ?2 AND user_id = ?3 AND is_deleted = 0",
                rusqlite::params![status.as_str(), id, user_id],
            )
            .map_err(db_err)?;
        Ok(n > 0)
    }

    /// Pending live copies whose deadline falls in `(now, now + days]`.
    ///
    /// Window filtering happens here rather than in SQL so the boundary is
    /// exact regardless of timestamp formatting.
    pub fn assignments_due_within(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
        days: i64,
    ) -> Result<Vec<(UserAssignment, Assignment)>> {
        let window_end = now + Duration::days(days);
        let all = self.user_assignments(user_id)?;
        Ok(all
            .into_iter()
            .filter(|(ua, a)| {
                ua.status == AssignmentStatus::Pending
                    && a.deadline > now
                    && a.deadline <= window_end
            })
            .collect())
    }
}
