use std::collections::BTreeSet;
use std::fmt;

use crate::models::StudentRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredField {
    StudentId,
    Name,
    Grade,
    Section,
}

impl RequiredField {
    pub const ALL: [RequiredField; 4] = [Self::StudentId, Self::Name, Self::Grade, Self::Section];

    pub fn label(&self) -> &'static str {
        match self {
            Self::StudentId => "Student ID",
            Self::Name => "Name",
            Self::Grade => "Grade",
            Self::Section => "Section",
        }
    }

    fn value<'a>(&self, record: &'a StudentRecord) -> &'a str {
        match self {
            Self::StudentId => &record.student_id,
            Self::Name => &record.name,
            Self::Grade => &record.grade,
            Self::Section => &record.section,
        }
    }
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Records in their original order plus the 0-based indices that failed the
/// required-field check. Invalid rows are kept, never dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Validated {
    pub records: Vec<StudentRecord>,
    pub invalid_indices: BTreeSet<usize>,
}

impl Validated {
    pub fn is_clean(&self) -> bool {
        self.invalid_indices.is_empty()
    }
}

pub fn missing_fields(record: &StudentRecord) -> Vec<RequiredField> {
    RequiredField::ALL
        .into_iter()
        .filter(|f| f.value(record).trim().is_empty())
        .collect()
}

pub fn is_valid(record: &StudentRecord) -> bool {
    missing_fields(record).is_empty()
}

pub fn validate(records: Vec<StudentRecord>) -> Validated {
    let invalid_indices: BTreeSet<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| !is_valid(r))
        .map(|(i, _)| i)
        .collect();
    if !invalid_indices.is_empty() {
        tracing::warn!(
            invalid = invalid_indices.len(),
            total = records.len(),
            "rows missing required fields"
        );
    }
    Validated {
        records,
        invalid_indices,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::{map_rows, MapContext};
    use crate::models::{CellValue, RawRow};

    fn rec(id: &str, name: &str, grade: &str, section: &str) -> StudentRecord {
        StudentRecord::new(id, name, grade, section)
    }

    #[test]
    fn test_valid_records_have_no_invalid_indices() {
        let v = validate(vec![rec("1", "Ana", "7", "A"), rec("2", "Ben", "8", "B")]);
        assert!(v.is_clean());
        assert_eq!(v.records.len(), 2);
    }

    #[test]
    fn test_flags_exactly_the_incomplete_rows() {
        let records = vec![
            rec("1", "Ana", "7", "A"),
            rec("", "Ben", "8", "B"),
            rec("3", "   ", "8", "B"),
            rec("4", "Cy", "9", "C"),
            rec("5", "Di", "", ""),
        ];
        let v = validate(records.clone());
        assert_eq!(v.invalid_indices, BTreeSet::from([1, 2, 4]));
        for (i, r) in records.iter().enumerate() {
            let empty = r.student_id.trim().is_empty()
                || r.name.trim().is_empty()
                || r.grade.trim().is_empty()
                || r.section.trim().is_empty();
            assert_eq!(v.invalid_indices.contains(&i), empty, "row {i}");
        }
    }

    #[test]
    fn test_never_reorders_or_mutates() {
        let records = vec![rec("", "Ben", "8", "B"), rec("1", "Ana", "7", "A")];
        let v = validate(records.clone());
        assert_eq!(v.records, records);
    }

    #[test]
    fn test_empty_input_is_not_an_error() {
        let v = validate(Vec::new());
        assert!(v.records.is_empty());
        assert!(v.invalid_indices.is_empty());
    }

    #[test]
    fn test_missing_fields_lists_labels() {
        let missing = missing_fields(&rec("", "Ana", " ", "A"));
        assert_eq!(missing, vec![RequiredField::StudentId, RequiredField::Grade]);
        assert_eq!(missing[0].to_string(), "Student ID");
    }

    #[test]
    fn test_row_missing_every_alias_is_flagged() {
        let ctx = MapContext::new(chrono::NaiveDate::from_ymd_opt(2024, 8, 15).unwrap());
        let rows = vec![
            RawRow::from_pairs([
                ("Student ID", CellValue::Text("2024-0001".into())),
                ("Name", CellValue::Text("Juan Dela Cruz".into())),
                ("Grade", CellValue::Text("12".into())),
                ("Section", CellValue::Text("A".into())),
            ]),
            RawRow::from_pairs([
                ("Name", CellValue::Text("Maria Santos".into())),
                ("Grade", CellValue::Text("11".into())),
                ("Section", CellValue::Text("B".into())),
            ]),
        ];
        let v = validate(map_rows(&rows, &ctx));
        assert_eq!(v.records[1].student_id, "");
        assert_eq!(v.invalid_indices, BTreeSet::from([1]));

        let again = validate(map_rows(&rows, &ctx));
        assert_eq!(again, v);
    }
}
