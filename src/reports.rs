use std::collections::BTreeMap;

use crate::error::Result;
use crate::models::{EnrollmentStatus, Gender, StudentRecord};

/// Anything that can hand over the full set of student records for reporting.
pub trait StudentSource {
    fn students(&self) -> Result<Vec<StudentRecord>>;
}

/// One labelled count, ready for a bar or pie chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distribution {
    pub name: String,
    pub value: usize,
}

fn grade_label(grade_level: i64) -> String {
    if grade_level > 0 {
        format!("Grade {grade_level}")
    } else {
        "Unassigned".to_string()
    }
}

fn counts_to_distribution<K: Ord>(counts: BTreeMap<K, usize>, label: impl Fn(K) -> String) -> Vec<Distribution> {
    counts
        .into_iter()
        .map(|(k, value)| Distribution { name: label(k), value })
        .collect()
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total: usize,
    pub enrolled: usize,
    pub transferred: usize,
    pub graduated: usize,
    pub dropped: usize,
    pub average_attendance: f64,
    pub male: usize,
    pub female: usize,
    pub other: usize,
}

pub fn summary(students: &[StudentRecord]) -> Summary {
    let by_status = |s: EnrollmentStatus| students.iter().filter(|r| r.enrollment_status == s).count();
    let by_gender = |g: Gender| students.iter().filter(|r| r.gender == g).count();
    let average_attendance = if students.is_empty() {
        0.0
    } else {
        students.iter().map(|r| r.attendance_rate).sum::<f64>() / students.len() as f64
    };
    Summary {
        total: students.len(),
        enrolled: by_status(EnrollmentStatus::Enrolled),
        transferred: by_status(EnrollmentStatus::Transferred),
        graduated: by_status(EnrollmentStatus::Graduated),
        dropped: by_status(EnrollmentStatus::Dropped),
        average_attendance,
        male: by_gender(Gender::Male),
        female: by_gender(Gender::Female),
        other: by_gender(Gender::Other),
    }
}

// ---------------------------------------------------------------------------
// Distributions
// ---------------------------------------------------------------------------

/// Students per grade level, labelled "Grade N", in numeric order.
pub fn grade_distribution(students: &[StudentRecord]) -> Vec<Distribution> {
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for r in students {
        *counts.entry(r.grade_level).or_default() += 1;
    }
    counts_to_distribution(counts, grade_label)
}

pub fn section_distribution(students: &[StudentRecord]) -> Vec<Distribution> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for r in students {
        *counts.entry(r.section.trim().to_string()).or_default() += 1;
    }
    counts_to_distribution(counts, |s| s)
}

pub fn gender_distribution(students: &[StudentRecord]) -> Vec<Distribution> {
    [Gender::Male, Gender::Female, Gender::Other]
        .into_iter()
        .map(|g| Distribution {
            name: g.to_string(),
            value: students.iter().filter(|r| r.gender == g).count(),
        })
        .filter(|d| d.value > 0)
        .collect()
}

pub fn status_distribution(students: &[StudentRecord]) -> Vec<Distribution> {
    EnrollmentStatus::ALL
        .into_iter()
        .map(|s| Distribution {
            name: s.to_string(),
            value: students.iter().filter(|r| r.enrollment_status == s).count(),
        })
        .filter(|d| d.value > 0)
        .collect()
}

// ---------------------------------------------------------------------------
// Attendance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct GradeAttendance {
    pub label: String,
    pub students: usize,
    pub average: f64,
}

pub fn attendance_by_grade(students: &[StudentRecord]) -> Vec<GradeAttendance> {
    let mut totals: BTreeMap<i64, (usize, f64)> = BTreeMap::new();
    for r in students {
        let entry = totals.entry(r.grade_level).or_default();
        entry.0 += 1;
        entry.1 += r.attendance_rate;
    }
    totals
        .into_iter()
        .map(|(level, (count, sum))| GradeAttendance {
            label: grade_label(level),
            students: count,
            average: sum / count as f64,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Academic performance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SubjectAverage {
    pub subject: String,
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradePerformance {
    pub label: String,
    pub subjects: Vec<SubjectAverage>,
}

/// Mean quarter score per subject for each grade level. Subjects keep the
/// order they first appear in; grade levels with no scores are left out.
pub fn academic_performance(students: &[StudentRecord]) -> Vec<GradePerformance> {
    let mut by_grade: BTreeMap<i64, Vec<(String, f64, usize)>> = BTreeMap::new();
    for r in students {
        for subject in &r.subjects {
            if subject.grades.is_empty() {
                continue;
            }
            let acc = by_grade.entry(r.grade_level).or_default();
            let idx = match acc.iter().position(|(name, _, _)| *name == subject.name) {
                Some(i) => i,
                None => {
                    acc.push((subject.name.clone(), 0.0, 0));
                    acc.len() - 1
                }
            };
            for q in &subject.grades {
                acc[idx].1 += q.score;
                acc[idx].2 += 1;
            }
        }
    }
    by_grade
        .into_iter()
        .map(|(level, acc)| GradePerformance {
            label: grade_label(level),
            subjects: acc
                .into_iter()
                .map(|(subject, sum, n)| SubjectAverage {
                    subject,
                    average: sum / n as f64,
                })
                .collect(),
        })
        .collect()
}
