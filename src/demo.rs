use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::error::Result;
use crate::models::{EnrollmentStatus, Gender, QuarterScore, StudentRecord, SubjectGrades};
use crate::reports::StudentSource;

pub const DEFAULT_COUNT: usize = 50;
pub const DEFAULT_SEED: u64 = 2023;

pub const SECTIONS: &[&str] = &["Peace", "Love", "Hope", "Faith", "Charity"];

pub const SUBJECTS: &[&str] = &[
    "Math",
    "Science",
    "English",
    "Filipino",
    "History",
    "P.E.",
    "Values Education",
];

const FIRST_NAMES: &[(&str, Gender)] = &[
    ("Juan", Gender::Male),
    ("Jose", Gender::Male),
    ("Miguel", Gender::Male),
    ("Paolo", Gender::Male),
    ("Carlo", Gender::Male),
    ("Andres", Gender::Male),
    ("Maria", Gender::Female),
    ("Ana", Gender::Female),
    ("Sofia", Gender::Female),
    ("Isabel", Gender::Female),
    ("Camille", Gender::Female),
    ("Bea", Gender::Female),
];

const LAST_NAMES: &[&str] = &[
    "Dela Cruz", "Santos", "Reyes", "Garcia", "Mendoza", "Bautista", "Villanueva", "Ramos",
    "Aquino", "Castillo", "Flores", "Torres",
];

const ACADEMIC_YEAR: &str = "2023-2024";

/// A reproducible roster of made-up students. The same seed always yields the
/// same records.
pub struct GeneratedRoster {
    students: Vec<StudentRecord>,
}

impl GeneratedRoster {
    pub fn new(count: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let students = (1..=count).map(|n| generate_student(&mut rng, n)).collect();
        Self { students }
    }

    pub fn records(&self) -> &[StudentRecord] {
        &self.students
    }

    pub fn into_records(self) -> Vec<StudentRecord> {
        self.students
    }
}

impl Default for GeneratedRoster {
    fn default() -> Self {
        Self::new(DEFAULT_COUNT, DEFAULT_SEED)
    }
}

impl StudentSource for GeneratedRoster {
    fn students(&self) -> Result<Vec<StudentRecord>> {
        Ok(self.students.clone())
    }
}

fn phone(rng: &mut StdRng) -> String {
    format!("09{:09}", rng.gen_range(0..1_000_000_000u64))
}

fn date(year: i32, month: u32, day: u32) -> String {
    NaiveDate::from_ymd_opt(year, month, day)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn generate_student(rng: &mut StdRng, n: usize) -> StudentRecord {
    let id = format!("DEMO-{n:04}");
    let grade_level: i64 = rng.gen_range(7..=12);
    let section = SECTIONS.choose(rng).copied().unwrap_or("Peace");
    let (first, gender) = FIRST_NAMES.choose(rng).copied().unwrap_or(("Juan", Gender::Male));
    let last = LAST_NAMES.choose(rng).copied().unwrap_or("Santos");
    let middle = LAST_NAMES.choose(rng).copied().unwrap_or("Reyes");

    let subjects = SUBJECTS
        .iter()
        .map(|name| SubjectGrades {
            name: name.to_string(),
            grades: (1..=4)
                .map(|quarter| QuarterScore {
                    quarter,
                    score: rng.gen_range(70..=100) as f64,
                })
                .collect(),
        })
        .collect();

    let mut r = StudentRecord::new(&id, &format!("{first} {last}"), &grade_level.to_string(), section);
    r.first_name = first.to_string();
    r.last_name = last.to_string();
    r.middle_name = middle.to_string();
    r.gender = gender;
    r.date_of_birth = date(2000 + rng.gen_range(0..10), rng.gen_range(1..=12), rng.gen_range(1..=28));
    r.address = format!("{} Example St., City", rng.gen_range(1..=1000));
    r.contact_number = phone(rng);
    r.email = format!("student{n:04}@example.com");
    r.guardian_name = format!("Guardian of {first} {last}");
    r.guardian_contact = phone(rng);
    r.academic_year = ACADEMIC_YEAR.to_string();
    r.lrn = format!("{:012}", rng.gen_range(0..10_000_000_000u64));
    r.enrollment_status = EnrollmentStatus::Enrolled;
    r.enrollment_date = date(2023, 6, rng.gen_range(1..=30));
    r.attendance_rate = rng.gen_range(80..=100) as f64;
    r.subjects = subjects;
    r
}
