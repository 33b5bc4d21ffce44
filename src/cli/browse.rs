use crate::browser::StudentBrowser;
use crate::error::{Result, RosterError};
use crate::listing::{SortDirection, SortField};
use crate::settings::load_settings;
use crate::store::StudentStore;
use crate::tui::run_view;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let store = super::open_store(&settings)?;
    let records = store
        .query(SortField::StudentId, SortDirection::Asc)
        .map_err(|e| RosterError::Connection(e.to_string()))?;
    if records.is_empty() {
        println!("No students found. Import a file with `roster import <FILE>`.");
        return Ok(());
    }
    let mut browser = StudentBrowser::new(records, settings.page_size);
    run_view(&mut browser)
}
