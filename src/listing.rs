use std::cmp::Ordering;

use crate::error::{Result, RosterError};
use crate::models::{EnrollmentStatus, StudentRecord};

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    pub fn sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            Self::Asc => "\u{25b2}",
            Self::Desc => "\u{25bc}",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    StudentId,
    Name,
    FirstName,
    LastName,
    Grade,
    GradeLevel,
    Section,
    Lrn,
    AttendanceRate,
    EnrollmentDate,
}

impl SortField {
    pub const ALL: [SortField; 10] = [
        Self::StudentId,
        Self::Name,
        Self::FirstName,
        Self::LastName,
        Self::Grade,
        Self::GradeLevel,
        Self::Section,
        Self::Lrn,
        Self::AttendanceRate,
        Self::EnrollmentDate,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::StudentId => "student-id",
            Self::Name => "name",
            Self::FirstName => "first-name",
            Self::LastName => "last-name",
            Self::Grade => "grade",
            Self::GradeLevel => "grade-level",
            Self::Section => "section",
            Self::Lrn => "lrn",
            Self::AttendanceRate => "attendance",
            Self::EnrollmentDate => "enrollment-date",
        }
    }

    /// Parse a command-line key; underscores are accepted in place of dashes.
    pub fn parse(key: &str) -> Result<Self> {
        let normalized = key.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|f| f.key() == normalized)
            .ok_or_else(|| RosterError::UnknownSortField(key.to_string()))
    }

    /// Store column backing this field. Fixed strings only, never user input.
    pub fn column(&self) -> &'static str {
        match self {
            Self::StudentId => "student_id",
            Self::Name => "name",
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::Grade => "grade",
            Self::GradeLevel => "grade_level",
            Self::Section => "section",
            Self::Lrn => "lrn",
            Self::AttendanceRate => "attendance_rate",
            Self::EnrollmentDate => "enrollment_date",
        }
    }

    pub fn compare(&self, a: &StudentRecord, b: &StudentRecord) -> Ordering {
        match self {
            Self::StudentId => a.student_id.cmp(&b.student_id),
            Self::Name => a.name.cmp(&b.name),
            Self::FirstName => a.first_name.cmp(&b.first_name),
            Self::LastName => a.last_name.cmp(&b.last_name),
            Self::Grade => a.grade.cmp(&b.grade),
            Self::GradeLevel => a.grade_level.cmp(&b.grade_level),
            Self::Section => a.section.cmp(&b.section),
            Self::Lrn => a.lrn.cmp(&b.lrn),
            Self::AttendanceRate => a
                .attendance_rate
                .partial_cmp(&b.attendance_rate)
                .unwrap_or(Ordering::Equal),
            Self::EnrollmentDate => a.enrollment_date.cmp(&b.enrollment_date),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: SortField,
    pub direction: SortDirection,
}

/// Categorical filters; each set filter must match exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    pub grade: Option<String>,
    pub section: Option<String>,
    pub grade_level: Option<i64>,
    pub status: Option<EnrollmentStatus>,
}

impl Filters {
    pub fn matches(&self, r: &StudentRecord) -> bool {
        self.grade.as_ref().map_or(true, |g| &r.grade == g)
            && self.section.as_ref().map_or(true, |s| &r.section == s)
            && self.grade_level.map_or(true, |l| r.grade_level == l)
            && self.status.map_or(true, |s| r.enrollment_status == s)
    }

    pub fn active_count(&self) -> usize {
        [
            self.grade.is_some(),
            self.section.is_some(),
            self.grade_level.is_some(),
            self.status.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
    }

    pub fn is_empty(&self) -> bool {
        self.active_count() == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingQuery {
    pub search: String,
    pub filters: Filters,
    pub sort: Option<Sort>,
    pub page: usize,
}

/// One page of a listing plus the counts needed to render pagination.
#[derive(Debug)]
pub struct Page<'a> {
    pub rows: Vec<&'a StudentRecord>,
    pub page: usize,
    pub total_pages: usize,
    pub filtered: usize,
    pub total: usize,
    /// Position of `rows[0]` within the filtered list.
    pub offset: usize,
}

// ---------------------------------------------------------------------------
// Filter, sort, paginate
// ---------------------------------------------------------------------------

/// Case-insensitive substring match across identity fields and the
/// "first last" / "last, first" name forms. A blank term matches everything.
pub fn matches_search(r: &StudentRecord, term: &str) -> bool {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return true;
    }
    let first = r.first_name.to_lowercase();
    let last = r.last_name.to_lowercase();
    let candidates = [
        r.name.to_lowercase(),
        r.student_id.to_lowercase(),
        r.section.to_lowercase(),
        r.lrn.to_lowercase(),
        r.middle_name.to_lowercase(),
        r.email.to_lowercase(),
        format!("{first} {last}"),
        format!("{last}, {first}"),
        first,
        last,
    ];
    candidates.iter().any(|c| c.contains(&term))
}

/// Filters, then search, then a stable sort. The source slice is untouched.
pub fn filter_sort<'a>(records: &'a [StudentRecord], query: &ListingQuery) -> Vec<&'a StudentRecord> {
    let mut rows: Vec<&StudentRecord> = records
        .iter()
        .filter(|r| query.filters.matches(r))
        .filter(|r| matches_search(r, &query.search))
        .collect();
    if let Some(sort) = query.sort {
        rows.sort_by(|a, b| {
            let ord = sort.field.compare(a, b);
            match sort.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        });
    }
    rows
}

pub fn total_pages(filtered: usize, page_size: usize) -> usize {
    filtered.div_ceil(page_size.max(1))
}

/// Clamp a 1-based page into `[1, total_pages]`, or 1 when nothing matched.
pub fn clamp_page(page: usize, filtered: usize, page_size: usize) -> usize {
    page.clamp(1, total_pages(filtered, page_size).max(1))
}

pub fn apply<'a>(records: &'a [StudentRecord], query: &ListingQuery, page_size: usize) -> Page<'a> {
    let page_size = page_size.max(1);
    let rows = filter_sort(records, query);
    let filtered = rows.len();
    let page = clamp_page(query.page, filtered, page_size);
    let offset = (page - 1) * page_size;
    let rows: Vec<&StudentRecord> = rows.into_iter().skip(offset).take(page_size).collect();
    Page {
        rows,
        page,
        total_pages: total_pages(filtered, page_size),
        filtered,
        total: records.len(),
        offset,
    }
}

// ---------------------------------------------------------------------------
// Listing state
// ---------------------------------------------------------------------------

/// Table state driven by user actions: search, sort toggles, filters, paging.
#[derive(Debug, Clone)]
pub struct Listing {
    query: ListingQuery,
    page_size: usize,
}

impl Listing {
    pub fn new(page_size: usize) -> Self {
        Self {
            query: ListingQuery {
                page: 1,
                ..ListingQuery::default()
            },
            page_size: page_size.max(1),
        }
    }

    pub fn query(&self) -> &ListingQuery {
        &self.query
    }

    pub fn set_search(&mut self, term: &str) {
        self.query.search = term.to_string();
        self.query.page = 1;
    }

    /// Same field flips direction; a new field starts ascending.
    pub fn toggle_sort(&mut self, field: SortField) {
        self.query.sort = Some(match self.query.sort {
            Some(current) if current.field == field => Sort {
                field,
                direction: current.direction.toggled(),
            },
            _ => Sort {
                field,
                direction: SortDirection::Asc,
            },
        });
        self.query.page = 1;
    }

    pub fn set_sort(&mut self, sort: Option<Sort>) {
        self.query.sort = sort;
        self.query.page = 1;
    }

    pub fn set_filters(&mut self, filters: Filters) {
        self.query.filters = filters;
        self.query.page = 1;
    }

    pub fn clear_filters(&mut self) {
        self.query.filters = Filters::default();
        self.query.search.clear();
        self.query.page = 1;
    }

    pub fn set_page(&mut self, page: usize) {
        self.query.page = page.max(1);
    }

    pub fn next_page(&mut self) {
        self.query.page = self.query.page.saturating_add(1);
    }

    pub fn prev_page(&mut self) {
        self.query.page = self.query.page.saturating_sub(1).max(1);
    }

    /// Render the current page, storing back the clamped page number.
    pub fn view<'a>(&mut self, records: &'a [StudentRecord]) -> Page<'a> {
        let page = apply(records, &self.query, self.page_size);
        self.query.page = page.page;
        page
    }
}
