use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::error::{Result, RosterError};
use crate::fmt::percent;
use crate::listing::{self, Filters, ListingQuery, Page, Sort, SortDirection, SortField};
use crate::models::EnrollmentStatus;
use crate::settings::load_settings;
use crate::store::StudentStore;

pub struct StudentsArgs {
    pub search: Option<String>,
    pub grade: Option<String>,
    pub section: Option<String>,
    pub grade_level: Option<i64>,
    pub status: Option<String>,
    pub sort: Option<String>,
    pub desc: bool,
    pub page: usize,
}

impl StudentsArgs {
    pub fn to_query(&self) -> Result<ListingQuery> {
        let status = match &self.status {
            Some(raw) => Some(
                EnrollmentStatus::parse(raw)
                    .ok_or_else(|| RosterError::Other(format!("Unknown enrollment status: {raw}")))?,
            ),
            None => None,
        };
        let sort = match &self.sort {
            Some(key) => Some(Sort {
                field: SortField::parse(key)?,
                direction: if self.desc { SortDirection::Desc } else { SortDirection::Asc },
            }),
            None => None,
        };
        Ok(ListingQuery {
            search: self.search.clone().unwrap_or_default(),
            filters: Filters {
                grade: self.grade.clone(),
                section: self.section.clone(),
                grade_level: self.grade_level,
                status,
            },
            sort,
            page: self.page,
        })
    }
}

pub fn render_page(page: &Page) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Student ID", "Name", "Grade", "Section", "LRN", "Attendance", "Status"]);
    for r in &page.rows {
        table.add_row(vec![
            Cell::new(&r.student_id),
            Cell::new(&r.name),
            Cell::new(&r.grade),
            Cell::new(&r.section),
            Cell::new(&r.lrn),
            Cell::new(percent(r.attendance_rate)),
            Cell::new(r.enrollment_status),
        ]);
    }
    table
}

pub fn run(args: StudentsArgs) -> Result<()> {
    let settings = load_settings();
    let query = args.to_query()?;
    let store = super::open_store(&settings)?;
    let records = store
        .query(SortField::StudentId, SortDirection::Asc)
        .map_err(|e| RosterError::Connection(e.to_string()))?;

    let page = listing::apply(&records, &query, settings.page_size);
    if page.filtered == 0 {
        if page.total == 0 {
            println!("No students yet. Import a file with `roster import <FILE>`.");
        } else {
            println!("No students match ({} in total).", page.total);
        }
        return Ok(());
    }

    println!("{}", render_page(&page));
    println!("{}", footer(&page, &query.filters).dimmed());
    Ok(())
}

pub fn footer(page: &Page, filters: &Filters) -> String {
    let mut line = format!(
        "Page {} of {} | showing {}-{} of {} matching | {} total",
        page.page,
        page.total_pages,
        page.offset + 1,
        page.offset + page.rows.len(),
        page.filtered,
        page.total
    );
    if !filters.is_empty() {
        line.push_str(&format!(" | {} filter(s) active", filters.active_count()));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StudentRecord;

    fn args() -> StudentsArgs {
        StudentsArgs {
            search: None,
            grade: None,
            section: None,
            grade_level: None,
            status: None,
            sort: None,
            desc: false,
            page: 1,
        }
    }

    #[test]
    fn test_to_query_parses_sort_and_status() {
        let q = StudentsArgs {
            search: Some("san".into()),
            status: Some("graduated".into()),
            sort: Some("grade_level".into()),
            desc: true,
            ..args()
        }
        .to_query()
        .unwrap();
        assert_eq!(q.search, "san");
        assert_eq!(q.filters.status, Some(EnrollmentStatus::Graduated));
        assert_eq!(
            q.sort,
            Some(Sort { field: SortField::GradeLevel, direction: SortDirection::Desc })
        );
    }

    #[test]
    fn test_to_query_rejects_unknown_values() {
        let bad_sort = StudentsArgs { sort: Some("shoe-size".into()), ..args() }.to_query();
        assert!(matches!(bad_sort, Err(RosterError::UnknownSortField(_))));
        let bad_status = StudentsArgs { status: Some("expelled".into()), ..args() }.to_query();
        assert!(bad_status.is_err());
    }

    #[test]
    fn test_render_page_lists_rows() {
        let records = vec![
            StudentRecord::new("2024-0001", "Juan Dela Cruz", "12", "A"),
            StudentRecord::new("2024-0002", "Maria Santos", "11", "B"),
        ];
        let query = StudentsArgs { search: Some("san".into()), ..args() }.to_query().unwrap();
        let page = listing::apply(&records, &query, 10);
        let rendered = render_page(&page).to_string();
        assert!(rendered.contains("Maria Santos"));
        assert!(!rendered.contains("Juan Dela Cruz"));
    }

    #[test]
    fn test_footer_counts_active_filters() {
        let records: Vec<StudentRecord> = (1..=12)
            .map(|i| StudentRecord::new(&format!("2024-{i:04}"), &format!("Student {i}"), "7", "A"))
            .collect();
        let plain = args().to_query().unwrap();
        let page = listing::apply(&records, &plain, 10);
        assert_eq!(
            footer(&page, &plain.filters),
            "Page 1 of 2 | showing 1-10 of 12 matching | 12 total"
        );

        let filtered = StudentsArgs {
            grade: Some("7".into()),
            section: Some("A".into()),
            page: 2,
            ..args()
        }
        .to_query()
        .unwrap();
        let page = listing::apply(&records, &filtered, 10);
        assert_eq!(
            footer(&page, &filtered.filters),
            "Page 2 of 2 | showing 11-12 of 12 matching | 12 total | 2 filter(s) active"
        );
    }
}
