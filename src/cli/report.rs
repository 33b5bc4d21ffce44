use colored::Colorize;
use comfy_table::{Cell, Table};

use super::ReportKind;
use crate::demo::GeneratedRoster;
use crate::error::Result;
use crate::fmt::{bar, percent};
use crate::models::StudentRecord;
use crate::reports::{self, Distribution, StudentSource};
use crate::settings::load_settings;

const BAR_WIDTH: usize = 30;

fn distribution_table(title: &str, rows: &[Distribution]) -> String {
    let max = rows.iter().map(|d| d.value).max().unwrap_or(0) as f64;
    let mut table = Table::new();
    table.set_header(vec![title, "Students", ""]);
    for d in rows {
        table.add_row(vec![
            Cell::new(&d.name),
            Cell::new(d.value),
            Cell::new(bar(d.value as f64, max, BAR_WIDTH)),
        ]);
    }
    format!("{}\n{table}", title.bold())
}

// ---------------------------------------------------------------------------
// Formatters
// ---------------------------------------------------------------------------

pub fn format_dashboard(students: &[StudentRecord]) -> String {
    let s = reports::summary(students);
    let mut table = Table::new();
    table.set_header(vec!["Metric", "Value"]);
    table.add_row(vec![Cell::new("Total students"), Cell::new(s.total)]);
    table.add_row(vec![Cell::new("Enrolled"), Cell::new(s.enrolled)]);
    table.add_row(vec![Cell::new("Transferred"), Cell::new(s.transferred)]);
    table.add_row(vec![Cell::new("Graduated"), Cell::new(s.graduated)]);
    table.add_row(vec![Cell::new("Dropped"), Cell::new(s.dropped)]);
    table.add_row(vec![Cell::new("Average attendance"), Cell::new(percent(s.average_attendance))]);
    table.add_row(vec![Cell::new("Male / Female / Other"), Cell::new(format!("{} / {} / {}", s.male, s.female, s.other))]);

    format!(
        "{}\n{table}\n\n{}",
        "Dashboard".bold(),
        distribution_table("Grade Level", &reports::grade_distribution(students))
    )
}

pub fn format_enrollment(students: &[StudentRecord]) -> String {
    [
        distribution_table("Grade Level", &reports::grade_distribution(students)),
        distribution_table("Section", &reports::section_distribution(students)),
        distribution_table("Gender", &reports::gender_distribution(students)),
        distribution_table("Enrollment Status", &reports::status_distribution(students)),
    ]
    .join("\n\n")
}

pub fn format_attendance(students: &[StudentRecord]) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Grade Level", "Students", "Average", ""]);
    for row in reports::attendance_by_grade(students) {
        table.add_row(vec![
            Cell::new(&row.label),
            Cell::new(row.students),
            Cell::new(percent(row.average)),
            Cell::new(bar(row.average, 100.0, BAR_WIDTH)),
        ]);
    }
    format!("{}\n{table}", "Attendance by Grade Level".bold())
}

pub fn format_academic(students: &[StudentRecord]) -> String {
    let perf = reports::academic_performance(students);
    if perf.is_empty() {
        return "No subject grades recorded.".to_string();
    }
    let mut subjects: Vec<String> = Vec::new();
    for g in &perf {
        for s in &g.subjects {
            if !subjects.contains(&s.subject) {
                subjects.push(s.subject.clone());
            }
        }
    }
    let mut header = vec!["Grade Level".to_string()];
    header.extend(subjects.iter().cloned());

    let mut table = Table::new();
    table.set_header(header);
    for g in &perf {
        let mut row = vec![Cell::new(&g.label)];
        for name in &subjects {
            let value = g
                .subjects
                .iter()
                .find(|s| &s.subject == name)
                .map(|s| format!("{:.1}", s.average))
                .unwrap_or_else(|| "\u{2014}".to_string());
            row.push(Cell::new(value));
        }
        table.add_row(row);
    }
    format!("{}\n{table}", "Academic Performance (average score)".bold())
}

pub fn run(kind: ReportKind, demo: bool) -> Result<()> {
    let students = if demo {
        GeneratedRoster::default().into_records()
    } else {
        super::open_store(&load_settings())?.students()?
    };

    if students.is_empty() {
        println!("No students found. Import a file or pass --demo.");
        return Ok(());
    }

    let out = match kind {
        ReportKind::Dashboard => format_dashboard(&students),
        ReportKind::Enrollment => format_enrollment(&students),
        ReportKind::Attendance => format_attendance(&students),
        ReportKind::Academic => format_academic(&students),
    };
    println!("{out}");
    Ok(())
}
