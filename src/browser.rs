use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout},
    text::Line,
    widgets::{Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::listing::{Filters, Listing, SortField};
use crate::models::{EnrollmentStatus, StudentRecord};
use crate::tui::{self, View, ViewAction, FOOTER_STYLE, HEADER_STYLE, SELECTED_STYLE};

/// Columns shown in the table; the digit key above each toggles its sort.
const COLUMNS: &[(&str, Option<SortField>)] = &[
    ("ID", Some(SortField::StudentId)),
    ("Name", Some(SortField::Name)),
    ("Grade", Some(SortField::GradeLevel)),
    ("Section", Some(SortField::Section)),
    ("LRN", Some(SortField::Lrn)),
    ("Attendance", Some(SortField::AttendanceRate)),
    ("Status", None),
];

enum BrowseMode {
    Normal,
    Search(String),
    GotoPage(String),
}

pub struct StudentBrowser {
    records: Vec<StudentRecord>,
    listing: Listing,
    grades: Vec<String>,
    sections: Vec<String>,
    selected: usize,
    mode: BrowseMode,
    status_message: Option<String>,
    table_state: TableState,
}

/// Step through `options`, then back to "no filter".
fn cycle<T: Clone + PartialEq>(options: &[T], current: Option<&T>) -> Option<T> {
    match current {
        None => options.first().cloned(),
        Some(value) => {
            let idx = options.iter().position(|o| o == value)?;
            options.get(idx + 1).cloned()
        }
    }
}

fn distinct(records: &[StudentRecord], key: impl Fn(&StudentRecord) -> &str) -> Vec<String> {
    let mut values: Vec<String> = records.iter().map(|r| key(r).to_string()).collect();
    values.sort();
    values.dedup();
    values
}

impl StudentBrowser {
    pub fn new(records: Vec<StudentRecord>, page_size: usize) -> Self {
        let mut grades = distinct(&records, |r| r.grade.as_str());
        grades.sort_by_key(|g| (g.parse::<i64>().unwrap_or(i64::MAX), g.clone()));
        let sections = distinct(&records, |r| r.section.as_str());
        Self {
            records,
            listing: Listing::new(page_size),
            grades,
            sections,
            selected: 0,
            mode: BrowseMode::Normal,
            status_message: None,
            table_state: TableState::default(),
        }
    }

    #[cfg(test)]
    pub fn listing(&self) -> &Listing {
        &self.listing
    }

    fn filters_desc(&self) -> String {
        let q = self.listing.query();
        let mut parts = Vec::new();
        if !q.search.is_empty() {
            parts.push(format!("search \"{}\"", q.search));
        }
        if let Some(g) = &q.filters.grade {
            parts.push(format!("grade {g}"));
        }
        if let Some(s) = &q.filters.section {
            parts.push(format!("section {s}"));
        }
        if let Some(s) = q.filters.status {
            parts.push(format!("status {s}"));
        }
        parts.join(", ")
    }

    fn update_filters(&mut self, edit: impl FnOnce(&mut Filters)) {
        let mut filters = self.listing.query().filters.clone();
        edit(&mut filters);
        self.listing.set_filters(filters);
        self.selected = 0;
    }

    fn handle_normal_key(&mut self, code: KeyCode) -> ViewAction {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Close,
            KeyCode::Down => self.selected = self.selected.saturating_add(1),
            KeyCode::Up => self.selected = self.selected.saturating_sub(1),
            KeyCode::Char('n') | KeyCode::Right | KeyCode::PageDown => {
                self.listing.next_page();
                self.selected = 0;
            }
            KeyCode::Char('p') | KeyCode::Left | KeyCode::PageUp => {
                self.listing.prev_page();
                self.selected = 0;
            }
            KeyCode::Home => {
                self.listing.set_page(1);
                self.selected = 0;
            }
            KeyCode::Char('/') => {
                self.mode = BrowseMode::Search(self.listing.query().search.clone());
            }
            KeyCode::Char(':') => self.mode = BrowseMode::GotoPage(String::new()),
            KeyCode::Char('g') => {
                let next = cycle(&self.grades, self.listing.query().filters.grade.as_ref());
                self.update_filters(|f| f.grade = next);
            }
            KeyCode::Char('c') => {
                let next = cycle(&self.sections, self.listing.query().filters.section.as_ref());
                self.update_filters(|f| f.section = next);
            }
            KeyCode::Char('s') => {
                let next = cycle(&EnrollmentStatus::ALL[..], self.listing.query().filters.status.as_ref());
                self.update_filters(|f| f.status = next);
            }
            KeyCode::Char('r') => {
                self.listing.clear_filters();
                self.listing.set_sort(None);
                self.selected = 0;
            }
            KeyCode::Char(c @ '1'..='9') => {
                let idx = (c as u8 - b'1') as usize;
                match COLUMNS.get(idx) {
                    Some((_, Some(field))) => {
                        self.listing.toggle_sort(*field);
                        self.selected = 0;
                    }
                    Some((label, None)) => {
                        self.status_message = Some(format!("{label} is not sortable"));
                    }
                    None => {}
                }
            }
            _ => {}
        }
        ViewAction::Continue
    }

    fn handle_search_key(&mut self, code: KeyCode) {
        let BrowseMode::Search(term) = &mut self.mode else {
            return;
        };
        match code {
            KeyCode::Enter => self.mode = BrowseMode::Normal,
            KeyCode::Esc => {
                self.mode = BrowseMode::Normal;
                self.listing.set_search("");
            }
            KeyCode::Backspace => {
                term.pop();
                let term = term.clone();
                self.listing.set_search(&term);
            }
            KeyCode::Char(c) => {
                term.push(c);
                let term = term.clone();
                self.listing.set_search(&term);
            }
            _ => {}
        }
        self.selected = 0;
    }

    fn handle_goto_key(&mut self, code: KeyCode) {
        let BrowseMode::GotoPage(input) = &mut self.mode else {
            return;
        };
        match code {
            KeyCode::Esc => self.mode = BrowseMode::Normal,
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Char(c) if c.is_ascii_digit() => input.push(c),
            KeyCode::Enter => {
                if let Ok(page) = input.trim().parse::<usize>() {
                    self.listing.set_page(page);
                    self.selected = 0;
                }
                self.mode = BrowseMode::Normal;
            }
            _ => {}
        }
    }
}

impl View for StudentBrowser {
    fn draw(&mut self, frame: &mut Frame) {
        let areas = Layout::vertical([
            Constraint::Length(1), // title
            Constraint::Fill(1),   // table
            Constraint::Length(1), // status
            Constraint::Length(1), // keys
        ])
        .split(frame.area());

        frame.render_widget(Paragraph::new("Students").style(HEADER_STYLE), areas[0]);

        let page = self.listing.view(&self.records);
        self.selected = self.selected.min(page.rows.len().saturating_sub(1));

        let sort = self.listing.query().sort;
        let header: Vec<String> = COLUMNS
            .iter()
            .enumerate()
            .map(|(i, (label, field))| {
                let arrow = match (sort, field) {
                    (Some(s), Some(f)) if s.field == *f => s.direction.arrow(),
                    _ => "",
                };
                format!("{} {label}{arrow}", i + 1)
            })
            .collect();

        let rows: Vec<Row> = page
            .rows
            .iter()
            .map(|r| {
                Row::new(vec![
                    Cell::from(r.student_id.clone()),
                    Cell::from(r.name.clone()),
                    Cell::from(r.grade.clone()),
                    Cell::from(r.section.clone()),
                    Cell::from(r.lrn.clone()),
                    Cell::from(tui::attendance_span(r.attendance_rate)),
                    Cell::from(tui::status_span(r.enrollment_status)),
                ])
            })
            .collect();

        let widths = [
            Constraint::Length(12),
            Constraint::Fill(1),
            Constraint::Length(9),
            Constraint::Length(12),
            Constraint::Length(14),
            Constraint::Length(13),
            Constraint::Length(13),
        ];

        self.table_state
            .select(if rows.is_empty() { None } else { Some(self.selected) });
        let table = Table::new(rows, widths)
            .header(Row::new(header).style(HEADER_STYLE).bottom_margin(1))
            .column_spacing(1)
            .row_highlight_style(SELECTED_STYLE);
        frame.render_stateful_widget(table, areas[1], &mut self.table_state);

        let mut status = if page.filtered == 0 {
            format!("No matching students (of {})", page.total)
        } else {
            format!(
                "Page {} of {} | {}-{} of {} shown | {} total",
                page.page,
                page.total_pages,
                page.offset + 1,
                page.offset + page.rows.len(),
                page.filtered,
                page.total
            )
        };
        let filters = self.filters_desc();
        if !filters.is_empty() {
            status.push_str(&format!(" | {filters}"));
        }
        if let Some(msg) = &self.status_message {
            status.push_str(&format!(" | {msg}"));
        }
        frame.render_widget(Paragraph::new(status).style(FOOTER_STYLE), areas[2]);

        let keys = match &self.mode {
            BrowseMode::Normal => Paragraph::new(Line::from(
                "/:search  1-6:sort  g:grade  c:section  s:status  r:reset  \u{2190}/\u{2192}:page  ::goto  q:quit",
            ))
            .style(FOOTER_STYLE),
            BrowseMode::Search(term) => Paragraph::new(format!("Search: {term}\u{2588}")),
            BrowseMode::GotoPage(input) => Paragraph::new(format!("Go to page: {input}\u{2588}")),
        };
        frame.render_widget(keys, areas[3]);
    }

    fn handle_key(&mut self, code: KeyCode) -> ViewAction {
        self.status_message = None;
        match self.mode {
            BrowseMode::Normal => return self.handle_normal_key(code),
            BrowseMode::Search(_) => self.handle_search_key(code),
            BrowseMode::GotoPage(_) => self.handle_goto_key(code),
        }
        ViewAction::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::{Sort, SortDirection};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn make_browser() -> StudentBrowser {
        let mut records = Vec::new();
        for i in 0..25 {
            let grade = if i % 2 == 0 { "7" } else { "10" };
            let section = ["A", "B", "C"][i % 3];
            records.push(StudentRecord::new(&format!("{i:04}"), &format!("Student {i:02}"), grade, section));
        }
        records.push(StudentRecord::new("9999", "Maria Santos", "12", "B"));
        StudentBrowser::new(records, 10)
    }

    fn press(b: &mut StudentBrowser, keys: &[KeyCode]) {
        for k in keys {
            b.handle_key(*k);
        }
    }

    fn render(b: &mut StudentBrowser) {
        let mut terminal = Terminal::new(TestBackend::new(120, 20)).unwrap();
        terminal.draw(|f| b.draw(f)).unwrap();
    }

    #[test]
    fn test_q_closes() {
        let mut b = make_browser();
        assert!(matches!(b.handle_key(KeyCode::Char('q')), ViewAction::Close));
    }

    #[test]
    fn test_grades_cycle_in_numeric_order() {
        let b = make_browser();
        assert_eq!(b.grades, ["7", "10", "12"]);
    }

    #[test]
    fn test_search_mode_filters_live() {
        let mut b = make_browser();
        press(
            &mut b,
            &[KeyCode::Char('/'), KeyCode::Char('s'), KeyCode::Char('a'), KeyCode::Char('n')],
        );
        assert_eq!(b.listing().query().search, "san");
        press(&mut b, &[KeyCode::Enter]);
        assert!(matches!(b.mode, BrowseMode::Normal));
        let records = b.records.clone();
        let page = b.listing.view(&records);
        assert_eq!(page.filtered, 1);
        assert_eq!(page.rows[0].name, "Maria Santos");
    }

    #[test]
    fn test_esc_in_search_clears_term() {
        let mut b = make_browser();
        press(&mut b, &[KeyCode::Char('/'), KeyCode::Char('x'), KeyCode::Esc]);
        assert!(b.listing().query().search.is_empty());
    }

    #[test]
    fn test_digit_toggles_sort() {
        let mut b = make_browser();
        press(&mut b, &[KeyCode::Char('2')]);
        assert_eq!(
            b.listing().query().sort,
            Some(Sort { field: SortField::Name, direction: SortDirection::Asc })
        );
        press(&mut b, &[KeyCode::Char('2')]);
        assert_eq!(b.listing().query().sort.unwrap().direction, SortDirection::Desc);
        press(&mut b, &[KeyCode::Char('7')]);
        assert!(b.status_message.is_some());
    }

    #[test]
    fn test_filter_cycling_and_reset() {
        let mut b = make_browser();
        press(&mut b, &[KeyCode::Char('g')]);
        assert_eq!(b.listing().query().filters.grade.as_deref(), Some("7"));
        press(&mut b, &[KeyCode::Char('g'), KeyCode::Char('g'), KeyCode::Char('g')]);
        assert_eq!(b.listing().query().filters.grade, None);

        press(&mut b, &[KeyCode::Char('c'), KeyCode::Char('s')]);
        assert_eq!(b.listing().query().filters.section.as_deref(), Some("A"));
        assert_eq!(b.listing().query().filters.status, Some(EnrollmentStatus::Enrolled));

        press(&mut b, &[KeyCode::Char('r')]);
        assert!(b.listing().query().filters.is_empty());
    }

    #[test]
    fn test_paging_clamps_on_draw() {
        let mut b = make_browser();
        press(&mut b, &[KeyCode::Right, KeyCode::Right, KeyCode::Right, KeyCode::Right]);
        render(&mut b);
        assert_eq!(b.listing().query().page, 3);
        press(&mut b, &[KeyCode::Left]);
        assert_eq!(b.listing().query().page, 2);
    }

    #[test]
    fn test_goto_page() {
        let mut b = make_browser();
        press(&mut b, &[KeyCode::Char(':'), KeyCode::Char('3'), KeyCode::Enter]);
        assert_eq!(b.listing().query().page, 3);
    }

    #[test]
    fn test_selection_clamped_to_page() {
        let mut b = make_browser();
        press(&mut b, &[KeyCode::Down; 15]);
        render(&mut b);
        assert_eq!(b.selected, 9);
    }

    #[test]
    fn test_draw_empty_result() {
        let mut b = make_browser();
        press(&mut b, &[KeyCode::Char('/'), KeyCode::Char('z'), KeyCode::Char('z'), KeyCode::Enter]);
        render(&mut b);
        assert_eq!(b.selected, 0);
    }
}
