use std::io::Write;

use crate::error::Result;

pub const TEMPLATE_FILE: &str = "student_import_template.csv";

const REQUIRED: &[(&str, &str)] = &[
    ("Student ID", "2024-0001"),
    ("Name", "Juan Dela Cruz"),
    ("Grade", "12"),
    ("Section", "A"),
];

const PROFILE: &[(&str, &str)] = &[
    ("First Name", "Juan"),
    ("Last Name", "Dela Cruz"),
    ("Middle Name", "Reyes"),
    ("Gender", "Male"),
    ("Date of Birth", "2006-05-14"),
    ("Address", "123 Example St., City"),
    ("Contact Number", "09171234567"),
    ("Email", "juan.delacruz@example.com"),
    ("Guardian Name", "Maria Dela Cruz"),
    ("Guardian Contact", "09181234567"),
    ("Academic Year", "2024-2025"),
    ("LRN", "123456789012"),
    ("Enrollment Status", "Enrolled"),
    ("Enrollment Date", "2024-06-03"),
    ("Attendance Rate", "100"),
];

/// Write a header row plus one example row. `extended` adds the profile
/// columns the importer understands.
pub fn write_template(out: impl Write, extended: bool) -> Result<()> {
    let columns: Vec<&(&str, &str)> = if extended {
        REQUIRED.iter().chain(PROFILE).collect()
    } else {
        REQUIRED.iter().collect()
    };
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(columns.iter().map(|(header, _)| *header))?;
    wtr.write_record(columns.iter().map(|(_, example)| *example))?;
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::{decode, FileKind};
    use crate::mapper::{map_rows, MapContext};
    use crate::models::{EnrollmentStatus, Gender};
    use crate::validator::validate;

    fn render(extended: bool) -> String {
        let mut buf = Vec::new();
        write_template(&mut buf, extended).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_basic_template() {
        assert_eq!(
            render(false),
            "Student ID,Name,Grade,Section\n2024-0001,Juan Dela Cruz,12,A\n"
        );
    }

    #[test]
    fn test_extended_template_imports_cleanly() {
        let csv = render(true);
        let rows = decode(csv.as_bytes(), FileKind::Csv).unwrap();
        let ctx = MapContext::new(chrono::NaiveDate::from_ymd_opt(2024, 8, 1).unwrap());
        let v = validate(map_rows(&rows, &ctx));
        assert!(v.is_clean());
        let r = &v.records[0];
        assert_eq!(r.student_id, "2024-0001");
        assert_eq!(r.gender, Gender::Male);
        assert_eq!(r.lrn, "123456789012");
        assert_eq!(r.grade_level, 12);
        assert_eq!(r.enrollment_status, EnrollmentStatus::Enrolled);
        assert_eq!(r.date_of_birth, "2006-05-14");
    }
}
