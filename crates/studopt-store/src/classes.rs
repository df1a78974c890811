//! Class sections and enrollments.

use rusqlite::Row;
use studopt_core::error::Result;
use studopt_core::types::{new_id, ClassSubject, User, UserClassSubject};

use crate::{db_err, Store};

fn row_to_class(row: &Row) -> rusqlite::Result<ClassSubject> {
    Ok(ClassSubject {
        id: row.get(0)?,
        subject_id: row.get(1)?,
        subject_name: row.get(2)?,
        teacher: row.get(3)?,
        day_of_week: row.get::<_, i64>(4)? as u8,
        start_time: row.get(5)?,
        end_time: row.get(6)?,
        year: row.get(7)?,
        semester: row.get::<_, i64>(8)? as u8,
        is_main: row.get::<_, i64>(9)? != 0,
    })
}

const CLASS_COLS: &str =
    "id, subject_id, subject_name, teacher, day_of_week, start_time, end_time, year, semester, is_main";

impl Store {
    pub fn insert_class_subject(&self, cs: &ClassSubject) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO class_subjects ({CLASS_COLS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
            ),
            rusqlite::params![
                cs.id,
                cs.subject_id,
                cs.subject_name,
                cs.teacher,
                cs.day_of_week as i64,
                cs.start_time,
                cs.end_time,
                cs.year,
                cs.semester as i64,
                cs.is_main as i64,
            ],
        )
        .map_err(db_err)?;
        Ok(())
    }

    pub fn all_class_subjects(&self) -> Result<Vec<ClassSubject>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {CLASS_COLS} FROM class_subjects ORDER BY day_of_week, start_time"
            ))
            .map_err(db_err)?;
        let rows = stmt.query_map([], row_to_class).map_err(db_err)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    pub fn find_class_by_id(&self, id: &str) -> Result<Option<ClassSubject>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!("SELECT {CLASS_COLS} FROM class_subjects WHERE id = ?1"))
            .map_err(db_err)?;
        Ok(stmt.query_row(rusqlite::params![id], row_to_class).ok())
    }

    /// Subject-code prefix or exact subject-name match, case-insensitive.
    pub fn find_class_by_code_prefix(&self, query: &str) -> Result<Option<ClassSubject>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {CLASS_COLS} FROM class_subjects
                 WHERE UPPER(subject_id) LIKE UPPER(?1) || '%'
                    OR LOWER(subject_name) = LOWER(?1)
                 LIMIT 1"
            ))
            .map_err(db_err)?;
        Ok(stmt.query_row(rusqlite::params![query.trim()], row_to_class).ok())
    }

    /// Subject-code substring match, case-insensitive.
    pub fn find_class_by_code_contains(&self, query: &str) -> Result<Option<ClassSubject>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {CLASS_COLS} FROM class_subjects
                 WHERE UPPER(subject_id) LIKE '%' || UPPER(?1) || '%'
                 LIMIT 1"
            ))
            .map_err(db_err)?;
        Ok(stmt.query_row(rusqlite::params![query.trim()], row_to_class).ok())
    }

    /// Main-track sections for one academic term.
    pub fn main_classes(&self, year: &str, semester: u8) -> Result<Vec<ClassSubject>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {CLASS_COLS} FROM class_subjects
                 WHERE is_main = 1 AND year = ?1 AND semester = ?2
                 ORDER BY day_of_week, start_time"
            ))
            .map_err(db_err)?;
        let rows = stmt
            .query_map(rusqlite::params![year, semester as i64], row_to_class)
            .map_err(db_err)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    pub fn classes_for_user(&self, user_id: &str) -> Result<Vec<ClassSubject>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT c.id, c.subject_id, c.subject_name, c.teacher, c.day_of_week,
                        c.start_time, c.end_time, c.year, c.semester, c.is_main
                 FROM class_subjects c
                 JOIN user_class_subjects u ON u.class_subject_id = c.id
                 WHERE u.user_id = ?1
                 ORDER BY c.day_of_week, c.start_time",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(rusqlite::params![user_id], row_to_class)
            .map_err(db_err)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    pub fn classes_for_user_on_day(
        &self,
        user_id: &str,
        day_of_week: u8,
        year: &str,
        semester: u8,
    ) -> Result<Vec<ClassSubject>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT c.id, c.subject_id, c.subject_name, c.teacher, c.day_of_week,
                        c.start_time, c.end_time, c.year, c.semester, c.is_main
                 FROM class_subjects c
                 JOIN user_class_subjects u ON u.class_subject_id = c.id
                 WHERE u.user_id = ?1 AND c.day_of_week = ?2 AND c.year = ?3 AND c.semester = ?4
                 ORDER BY c.start_time",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(
                rusqlite::params![user_id, day_of_week as i64, year, semester as i64],
                row_to_class,
            )
            .map_err(db_err)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Replace a user's enrollments with the given sections. Returns the
    /// number inserted.
    pub fn enroll_replace(
        &self,
        user_id: &str,
        classes: &[ClassSubject],
        year: &str,
        semester: u8,
    ) -> Result<usize> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM user_class_subjects WHERE user_id = ?1",
            rusqlite::params![user_id],
        )
        .map_err(db_err)?;
        let mut inserted = 0;
        for cs in classes {
            conn.execute(
                "INSERT INTO user_class_subjects (id, user_id, class_subject_id, year, semester)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![new_id(), user_id, cs.id, year, semester as i64],
            )
            .map_err(db_err)?;
            inserted += 1;
        }
        Ok(inserted)
    }

    pub fn enroll_one(&self, enrollment: &UserClassSubject) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO user_class_subjects (id, user_id, class_subject_id, year, semester)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                enrollment.id,
                enrollment.user_id,
                enrollment.class_subject_id,
                enrollment.year,
                enrollment.semester as i64,
            ],
        )
        .map_err(db_err)?;
        Ok(())
    }

    pub fn unenroll_one(&self, user_id: &str, class_subject_id: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM user_class_subjects WHERE user_id = ?1 AND class_subject_id = ?2",
            rusqlite::params![user_id, class_subject_id],
        )
        .map_err(db_err)?;
        Ok(())
    }

    /// All users enrolled in a section, regardless of notify flag.
    pub fn users_enrolled(&self, class_subject_id: &str) -> Result<Vec<User>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT u.id, u.external_id, u.name, u.active, u.notify, u.created_at, u.updated_at
                 FROM users u
                 JOIN user_class_subjects ucs ON ucs.user_id = u.id
                 WHERE ucs.class_subject_id = ?1",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(rusqlite::params![class_subject_id], |row| {
                Ok(User {
                    id: row.get(0)?,
                    external_id: row.get(1)?,
                    name: row.get(2)?,
                    active: row.get::<_, i64>(3)? != 0,
                    notify: row.get::<_, i64>(4)? != 0,
                    created_at: crate::users::parse_ts(row.get(5)?),
                    updated_at: crate::users::parse_ts(row.get(6)?),
                })
            })
            .map_err(db_err)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }
}
