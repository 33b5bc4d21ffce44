pub mod browse;
pub mod demo;
pub mod import;
pub mod init;
pub mod report;
pub mod status;
pub mod students;
pub mod template;

use clap::{Parser, Subcommand, ValueEnum};

use crate::error::Result;
use crate::settings::Settings;
use crate::store::SqliteStore;

/// Open the student database under the configured data directory, creating
/// the directory and schema on first use.
pub(crate) fn open_store(settings: &Settings) -> Result<SqliteStore> {
    std::fs::create_dir_all(&settings.data_dir)?;
    SqliteStore::open(&settings.db_path())
}

#[derive(Parser)]
#[command(name = "roster", about = "Student records: spreadsheet import, search, and enrollment reports.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and initialize the database.
    Init {
        /// Path for roster data (default: ~/Documents/roster)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Import students from an Excel or CSV file.
    Import {
        /// Path to a .xlsx, .xls or .csv file
        file: String,
        /// Commit without asking for confirmation
        #[arg(long, short = 'y')]
        yes: bool,
        /// Import even if this exact file was imported before
        #[arg(long = "allow-duplicate")]
        allow_duplicate: bool,
    },
    /// List students with search, filters, sorting and paging.
    Students {
        /// Case-insensitive text matched against names, IDs, section, LRN and email
        #[arg(long)]
        search: Option<String>,
        /// Exact grade, e.g. 7 or 12
        #[arg(long)]
        grade: Option<String>,
        /// Exact section name
        #[arg(long)]
        section: Option<String>,
        /// Exact numeric grade level
        #[arg(long = "grade-level")]
        grade_level: Option<i64>,
        /// Enrollment status: enrolled, transferred, graduated, dropped
        #[arg(long)]
        status: Option<String>,
        /// Sort field: student-id, name, first-name, last-name, grade, grade-level,
        /// section, lrn, attendance, enrollment-date
        #[arg(long)]
        sort: Option<String>,
        /// Sort descending
        #[arg(long)]
        desc: bool,
        /// Page number (clamped to the available pages)
        #[arg(long, default_value = "1")]
        page: usize,
    },
    /// Interactively browse students.
    Browse,
    /// Enrollment, attendance and academic reports.
    Report {
        #[arg(value_enum)]
        kind: ReportKind,
        /// Report on a generated demo roster instead of the database
        #[arg(long)]
        demo: bool,
    },
    /// Write a CSV import template.
    Template {
        /// Output path (default: ./student_import_template.csv)
        #[arg(long)]
        output: Option<String>,
        /// Include the optional profile columns
        #[arg(long)]
        extended: bool,
    },
    /// Add a generated demo roster to the database. Students already stored
    /// (by id) are skipped.
    Demo {
        #[arg(long, default_value_t = crate::demo::DEFAULT_COUNT)]
        count: usize,
        #[arg(long, default_value_t = crate::demo::DEFAULT_SEED)]
        seed: u64,
    },
    /// Show the data directory and database statistics.
    Status,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ReportKind {
    /// Totals, status and gender counts, grade distribution
    Dashboard,
    /// Students by grade level, section and status
    Enrollment,
    /// Average attendance per grade level
    Attendance,
    /// Average subject scores per grade level
    Academic,
}
