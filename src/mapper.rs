use chrono::{Datelike, Local, NaiveDate};

use crate::models::{CellValue, EnrollmentStatus, Gender, RawRow, StudentRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    StudentId,
    Name,
    Grade,
    Section,
    FirstName,
    LastName,
    MiddleName,
    Gender,
    DateOfBirth,
    Address,
    ContactNumber,
    Email,
    GuardianName,
    GuardianContact,
    GradeLevel,
    AcademicYear,
    Lrn,
    EnrollmentStatus,
    EnrollmentDate,
    AttendanceRate,
}

/// Accepted source headers per canonical field, probed in order.
pub const ALIASES: &[(Field, &[&str])] = &[
    (Field::StudentId, &["studentId", "student_id", "Student ID", "id", "ID"]),
    (Field::Name, &["name", "Name", "Full Name", "full_name", "fullName", "Student Name"]),
    (Field::Grade, &["grade", "Grade", "gradeLevel", "grade_level", "Grade Level"]),
    (Field::Section, &["section", "Section"]),
    (Field::FirstName, &["firstName", "first_name", "First Name"]),
    (Field::LastName, &["lastName", "last_name", "Last Name"]),
    (Field::MiddleName, &["middleName", "middle_name", "Middle Name"]),
    (Field::Gender, &["gender", "Gender", "sex", "Sex"]),
    (Field::DateOfBirth, &["dateOfBirth", "date_of_birth", "Date of Birth", "birthdate"]),
    (Field::Address, &["address", "Address"]),
    (Field::ContactNumber, &["contactNumber", "contact_number", "Contact Number"]),
    (Field::Email, &["email", "Email"]),
    (Field::GuardianName, &["guardianName", "guardian_name", "Guardian Name"]),
    (Field::GuardianContact, &["guardianContact", "guardian_contact", "Guardian Contact"]),
    (Field::GradeLevel, &["gradeLevel", "grade_level", "Grade Level"]),
    (Field::AcademicYear, &["academicYear", "academic_year", "Academic Year"]),
    (Field::Lrn, &["lrn", "LRN", "Learner Reference Number"]),
    (Field::EnrollmentStatus, &["enrollmentStatus", "enrollment_status", "Enrollment Status", "status", "Status"]),
    (Field::EnrollmentDate, &["enrollmentDate", "enrollment_date", "Enrollment Date"]),
    (Field::AttendanceRate, &["attendanceRate", "attendance_rate", "Attendance Rate"]),
];

pub const DEFAULT_ATTENDANCE_RATE: f64 = 100.0;

pub fn aliases(field: Field) -> &'static [&'static str] {
    ALIASES
        .iter()
        .find(|(f, _)| *f == field)
        .map(|(_, a)| *a)
        .unwrap_or(&[])
}

/// Inputs to mapping that are not part of the row. Carrying "today" here keeps
/// `map_row` a pure function.
#[derive(Debug, Clone, Copy)]
pub struct MapContext {
    pub today: NaiveDate,
}

impl MapContext {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    pub fn today() -> Self {
        Self::new(Local::now().date_naive())
    }

    /// School years start in June: 2024-06-01 falls in "2024-2025".
    pub fn academic_year(&self) -> String {
        let start = if self.today.month() >= 6 {
            self.today.year()
        } else {
            self.today.year() - 1
        };
        format!("{}-{}", start, start + 1)
    }

    fn today_iso(&self) -> String {
        self.today.format("%Y-%m-%d").to_string()
    }
}

// ---------------------------------------------------------------------------
// Probing and coercion
// ---------------------------------------------------------------------------

/// First alias present in the row, blank values included.
fn probe(row: &RawRow, field: Field) -> Option<&CellValue> {
    aliases(field).iter().find_map(|alias| row.get(alias))
}

fn text(row: &RawRow, field: Field) -> String {
    probe(row, field).map(CellValue::as_text).unwrap_or_default()
}

/// Non-blank text for the field, or `None` when absent or blank.
fn non_blank(row: &RawRow, field: Field) -> Option<String> {
    let value = text(row, field);
    (!value.is_empty()).then_some(value)
}

pub fn parse_int(raw: &str) -> Option<i64> {
    let s = raw.trim();
    let s = s
        .get(..5)
        .filter(|p| p.eq_ignore_ascii_case("grade"))
        .map_or(s, |_| s[5..].trim());
    if let Ok(i) = s.parse::<i64>() {
        return Some(i);
    }
    s.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite() && f.fract() == 0.0)
        .map(|f| f as i64)
}

pub fn parse_rate(raw: &str) -> Option<f64> {
    let s = raw.trim();
    let s = s.strip_suffix('%').unwrap_or(s).trim();
    s.parse::<f64>().ok().filter(|f| f.is_finite())
}

pub fn parse_date_mdy(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let parts: Vec<&str> = raw.split('/').collect();
    if parts.len() != 3 {
        return None;
    }
    let m: u32 = parts[0].parse().ok()?;
    let d: u32 = parts[1].parse().ok()?;
    let y: i32 = parts[2].parse().ok()?;
    NaiveDate::from_ymd_opt(y, m, d).map(|dt| dt.format("%Y-%m-%d").to_string())
}

/// Normalize ISO or M/D/Y dates to YYYY-MM-DD; other text is kept as-is.
fn normalize_date(raw: String) -> String {
    if NaiveDate::parse_from_str(&raw, "%Y-%m-%d").is_ok() {
        return raw;
    }
    parse_date_mdy(&raw).unwrap_or(raw)
}

// ---------------------------------------------------------------------------
// Mapping
// ---------------------------------------------------------------------------

/// Map one raw row onto the canonical record. Required fields missing from the
/// row come back empty and are left for the validator to flag.
pub fn map_row(row: &RawRow, ctx: &MapContext) -> StudentRecord {
    let grade = text(row, Field::Grade);
    let grade_level = non_blank(row, Field::GradeLevel)
        .and_then(|v| parse_int(&v))
        .or_else(|| parse_int(&grade))
        .unwrap_or(0);

    StudentRecord {
        student_id: text(row, Field::StudentId),
        name: text(row, Field::Name),
        section: text(row, Field::Section),
        grade,
        first_name: text(row, Field::FirstName),
        last_name: text(row, Field::LastName),
        middle_name: text(row, Field::MiddleName),
        gender: Gender::parse(&text(row, Field::Gender)),
        date_of_birth: non_blank(row, Field::DateOfBirth)
            .map(normalize_date)
            .unwrap_or_else(|| ctx.today_iso()),
        address: text(row, Field::Address),
        contact_number: text(row, Field::ContactNumber),
        email: text(row, Field::Email),
        guardian_name: text(row, Field::GuardianName),
        guardian_contact: text(row, Field::GuardianContact),
        grade_level,
        academic_year: non_blank(row, Field::AcademicYear).unwrap_or_else(|| ctx.academic_year()),
        lrn: text(row, Field::Lrn),
        enrollment_status: non_blank(row, Field::EnrollmentStatus)
            .and_then(|v| EnrollmentStatus::parse(&v))
            .unwrap_or_default(),
        enrollment_date: non_blank(row, Field::EnrollmentDate)
            .map(normalize_date)
            .unwrap_or_else(|| ctx.today_iso()),
        attendance_rate: non_blank(row, Field::AttendanceRate)
            .and_then(|v| parse_rate(&v))
            .unwrap_or(DEFAULT_ATTENDANCE_RATE),
        subjects: Vec::new(),
    }
}

pub fn map_rows(rows: &[RawRow], ctx: &MapContext) -> Vec<StudentRecord> {
    rows.iter().map(|row| map_row(row, ctx)).collect()
}
