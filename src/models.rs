use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Untyped scalar read from one spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Blank,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl CellValue {
    /// Render the cell as trimmed text. Whole floats print without a fraction
    /// so a numeric `12` cell reads back as "12".
    pub fn as_text(&self) -> String {
        match self {
            Self::Blank => String::new(),
            Self::Text(s) => s.trim().to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
            Self::Float(f) => f.to_string(),
            Self::Bool(b) => b.to_string(),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Self::Blank => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

/// One decoded sheet row: header -> cell. Every header column of the sheet is
/// present, blank cells included.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    cells: BTreeMap<String, CellValue>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn from_pairs<K: Into<String>>(pairs: impl IntoIterator<Item = (K, CellValue)>) -> Self {
        Self {
            cells: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Insert a cell; the first value for a header wins.
    pub fn insert(&mut self, header: &str, value: CellValue) {
        self.cells.entry(header.to_string()).or_insert(value);
    }

    pub fn get(&self, header: &str) -> Option<&CellValue> {
        self.cells.get(header)
    }

    pub fn is_blank(&self) -> bool {
        self.cells.values().all(CellValue::is_blank)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "male" | "m" => Self::Male,
            "female" | "f" => Self::Female,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EnrollmentStatus {
    #[default]
    Enrolled,
    Transferred,
    Graduated,
    Dropped,
}

impl EnrollmentStatus {
    pub const ALL: [EnrollmentStatus; 4] = [
        Self::Enrolled,
        Self::Transferred,
        Self::Graduated,
        Self::Dropped,
    ];

    /// Case-insensitive parse; `None` for anything unrecognized.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(raw))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enrolled => "Enrolled",
            Self::Transferred => "Transferred",
            Self::Graduated => "Graduated",
            Self::Dropped => "Dropped",
        }
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarterScore {
    pub quarter: u8,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectGrades {
    pub name: String,
    pub grades: Vec<QuarterScore>,
}

/// Canonical student record. The first four fields are required for import;
/// the rest form the extended profile and are defaulted when absent.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentRecord {
    pub student_id: String,
    pub name: String,
    pub grade: String,
    pub section: String,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: String,
    pub gender: Gender,
    pub date_of_birth: String,
    pub address: String,
    pub contact_number: String,
    pub email: String,
    pub guardian_name: String,
    pub guardian_contact: String,
    pub grade_level: i64,
    pub academic_year: String,
    pub lrn: String,
    pub enrollment_status: EnrollmentStatus,
    pub enrollment_date: String,
    pub attendance_rate: f64,
    pub subjects: Vec<SubjectGrades>,
}

impl StudentRecord {
    /// Record with only the required fields set and an empty profile.
    pub fn new(student_id: &str, name: &str, grade: &str, section: &str) -> Self {
        Self {
            student_id: student_id.to_string(),
            name: name.to_string(),
            grade: grade.to_string(),
            section: section.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            middle_name: String::new(),
            gender: Gender::Other,
            date_of_birth: String::new(),
            address: String::new(),
            contact_number: String::new(),
            email: String::new(),
            guardian_name: String::new(),
            guardian_contact: String::new(),
            grade_level: grade.trim().parse().unwrap_or(0),
            academic_year: String::new(),
            lrn: String::new(),
            enrollment_status: EnrollmentStatus::Enrolled,
            enrollment_date: String::new(),
            attendance_rate: 100.0,
            subjects: Vec::new(),
        }
    }
}
