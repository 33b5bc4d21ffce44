use std::path::Path;

use rusqlite::{Connection, ErrorCode, Row};
use thiserror::Error;

use crate::db::{get_connection, init_db};
use crate::error::Result;
use crate::listing::{SortDirection, SortField};
use crate::models::{EnrollmentStatus, Gender, StudentRecord};
use crate::preview::SourceFile;
use crate::reports::StudentSource;

#[derive(Error, Debug)]
pub enum StoreError {
    /// The store could not be reached or opened.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store was reachable but refused the request.
    #[error("{0}")]
    Rejected(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        match e.sqlite_error_code() {
            Some(
                ErrorCode::CannotOpen
                | ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::NotADatabase
                | ErrorCode::SystemIoFailure
                | ErrorCode::ReadOnly,
            ) => Self::Unavailable(e.to_string()),
            _ => Self::Rejected(e.to_string()),
        }
    }
}

/// The persistent "students" collection as seen by the import flow.
pub trait StudentStore {
    /// Insert all rows or none; returns the number inserted.
    fn insert(&mut self, rows: &[StudentRecord]) -> std::result::Result<usize, StoreError>;

    fn query(
        &self,
        order_by: SortField,
        direction: SortDirection,
    ) -> std::result::Result<Vec<StudentRecord>, StoreError>;

    /// Check that the store is reachable and would accept `sample`, without
    /// persisting it.
    fn probe(&mut self, _sample: &StudentRecord) -> std::result::Result<(), StoreError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SQLite store
// ---------------------------------------------------------------------------

const INSERT_SQL: &str = "INSERT INTO students (
    student_id, name, grade, section, first_name, last_name, middle_name, gender,
    date_of_birth, address, contact_number, email, guardian_name, guardian_contact,
    grade_level, academic_year, lrn, enrollment_status, enrollment_date, attendance_rate, subjects
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)";

const SELECT_COLUMNS: &str = "student_id, name, grade, section, first_name, last_name, middle_name, gender, \
     date_of_birth, address, contact_number, email, guardian_name, guardian_contact, \
     grade_level, academic_year, lrn, enrollment_status, enrollment_date, attendance_rate, subjects";

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = get_connection(db_path)?;
        init_db(&conn)?;
        Ok(Self { conn })
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn student_count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT count(*) FROM students", [], |r| r.get(0))?)
    }

    pub fn import_count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT count(*) FROM imports", [], |r| r.get(0))?)
    }

    pub fn has_student(&self, student_id: &str) -> Result<bool> {
        let mut stmt = self.conn.prepare("SELECT 1 FROM students WHERE student_id = ?1")?;
        Ok(stmt.exists([student_id])?)
    }

    pub fn has_import(&self, checksum: &str) -> Result<bool> {
        let mut stmt = self.conn.prepare("SELECT 1 FROM imports WHERE checksum = ?1")?;
        Ok(stmt.exists([checksum])?)
    }

    pub fn record_import(&self, source: &SourceFile, record_count: usize) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO imports (filename, record_count, checksum) VALUES (?1, ?2, ?3)",
            rusqlite::params![source.name, record_count as i64, source.checksum],
        )?;
        Ok(self.conn.last_insert_rowid())
    }
}

fn insert_rows(conn: &Connection, rows: &[StudentRecord]) -> rusqlite::Result<usize> {
    let mut stmt = conn.prepare_cached(INSERT_SQL)?;
    for r in rows {
        let subjects = serde_json::to_string(&r.subjects)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
        stmt.execute(rusqlite::params![
            r.student_id.trim(),
            r.name.trim(),
            r.grade.trim(),
            r.section.trim(),
            r.first_name,
            r.last_name,
            r.middle_name,
            r.gender.as_str(),
            r.date_of_birth,
            r.address,
            r.contact_number,
            r.email,
            r.guardian_name,
            r.guardian_contact,
            r.grade_level,
            r.academic_year,
            r.lrn,
            r.enrollment_status.as_str(),
            r.enrollment_date,
            r.attendance_rate,
            subjects,
        ])?;
    }
    Ok(rows.len())
}

fn row_to_record(row: &Row) -> rusqlite::Result<StudentRecord> {
    let gender: String = row.get(7)?;
    let status: String = row.get(17)?;
    let subjects: String = row.get(20)?;
    let subjects = serde_json::from_str(&subjects).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(20, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(StudentRecord {
        student_id: row.get(0)?,
        name: row.get(1)?,
        grade: row.get(2)?,
        section: row.get(3)?,
        first_name: row.get(4)?,
        last_name: row.get(5)?,
        middle_name: row.get(6)?,
        gender: Gender::parse(&gender),
        date_of_birth: row.get(8)?,
        address: row.get(9)?,
        contact_number: row.get(10)?,
        email: row.get(11)?,
        guardian_name: row.get(12)?,
        guardian_contact: row.get(13)?,
        grade_level: row.get(14)?,
        academic_year: row.get(15)?,
        lrn: row.get(16)?,
        enrollment_status: EnrollmentStatus::parse(&status).unwrap_or_default(),
        enrollment_date: row.get(18)?,
        attendance_rate: row.get(19)?,
        subjects,
    })
}

impl StudentStore for SqliteStore {
    fn insert(&mut self, rows: &[StudentRecord]) -> std::result::Result<usize, StoreError> {
        let tx = self.conn.transaction()?;
        let inserted = insert_rows(&tx, rows)?;
        tx.commit()?;
        Ok(inserted)
    }

    fn query(
        &self,
        order_by: SortField,
        direction: SortDirection,
    ) -> std::result::Result<Vec<StudentRecord>, StoreError> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM students ORDER BY {} {}, id ASC",
            order_by.column(),
            direction.sql()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_record)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    fn probe(&mut self, sample: &StudentRecord) -> std::result::Result<(), StoreError> {
        // Dropped without commit, so the probe row is rolled back.
        let sp = self.conn.savepoint()?;
        insert_rows(&sp, std::slice::from_ref(sample))?;
        Ok(())
    }
}

impl StudentSource for SqliteStore {
    fn students(&self) -> Result<Vec<StudentRecord>> {
        self.query(SortField::Name, SortDirection::Asc)
            .map_err(|e| crate::error::RosterError::Connection(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{QuarterScore, SubjectGrades};

    fn test_store() -> (tempfile::TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(&dir.path().join("test.db")).unwrap();
        (dir, store)
    }

    fn rec(id: &str, name: &str) -> StudentRecord {
        StudentRecord::new(id, name, "7", "A")
    }

    #[test]
    fn test_insert_and_query_roundtrip_profile() {
        let (_dir, mut store) = test_store();
        let mut r = rec("2024-0001", "Juan Dela Cruz");
        r.gender = Gender::Male;
        r.enrollment_status = EnrollmentStatus::Graduated;
        r.attendance_rate = 91.5;
        r.subjects = vec![SubjectGrades {
            name: "Math".into(),
            grades: vec![QuarterScore { quarter: 1, score: 88.0 }],
        }];
        assert_eq!(store.insert(&[r.clone()]).unwrap(), 1);
        let rows = store.query(SortField::Name, SortDirection::Asc).unwrap();
        assert_eq!(rows, vec![r]);
    }

    #[test]
    fn test_query_orders_by_field() {
        let (_dir, mut store) = test_store();
        store
            .insert(&[rec("2", "Ben"), rec("1", "Cy"), rec("3", "Ana")])
            .unwrap();
        let names: Vec<String> = store
            .query(SortField::Name, SortDirection::Asc)
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, ["Ana", "Ben", "Cy"]);
        let ids: Vec<String> = store
            .query(SortField::StudentId, SortDirection::Desc)
            .unwrap()
            .into_iter()
            .map(|r| r.student_id)
            .collect();
        assert_eq!(ids, ["3", "2", "1"]);
    }

    #[test]
    fn test_insert_is_all_or_nothing() {
        let (_dir, mut store) = test_store();
        store.insert(&[rec("1", "Ana")]).unwrap();
        assert!(store.has_student("1").unwrap());
        let err = store.insert(&[rec("2", "Ben"), rec("1", "Dup")]).unwrap_err();
        assert!(matches!(err, StoreError::Rejected(_)));
        assert_eq!(store.student_count().unwrap(), 1);
        assert!(!store.has_student("2").unwrap());
    }

    #[test]
    fn test_probe_does_not_persist() {
        let (_dir, mut store) = test_store();
        store.probe(&rec("1", "Ana")).unwrap();
        assert_eq!(store.student_count().unwrap(), 0);
        store.insert(&[rec("1", "Ana")]).unwrap();
        assert!(store.probe(&rec("1", "Ana again")).is_err());
        assert_eq!(store.student_count().unwrap(), 1);
    }

    #[test]
    fn test_probe_reports_missing_schema() {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("bare.db")).unwrap();
        let mut store = SqliteStore::from_connection(conn);
        let err = store.probe(&rec("1", "Ana")).unwrap_err();
        assert!(err.to_string().contains("no such table"));
    }

    #[test]
    fn test_import_log() {
        let (_dir, store) = test_store();
        let source = SourceFile { name: "a.csv".into(), checksum: "abc".into() };
        assert!(!store.has_import("abc").unwrap());
        store.record_import(&source, 3).unwrap();
        assert!(store.has_import("abc").unwrap());
        assert_eq!(store.import_count().unwrap(), 1);
    }

    #[test]
    fn test_students_source_orders_by_name() {
        let (_dir, mut store) = test_store();
        store.insert(&[rec("1", "Zed"), rec("2", "Amy")]).unwrap();
        let students = store.students().unwrap();
        assert_eq!(students[0].name, "Amy");
    }
}
