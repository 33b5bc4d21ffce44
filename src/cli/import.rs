use std::io::{self, Write};
use std::path::Path;

use colored::Colorize;
use comfy_table::{Cell, Color, Table};

use crate::error::Result;
use crate::importer::{ImportSession, Notice};
use crate::mapper::MapContext;
use crate::preview::PreviewState;
use crate::settings::load_settings;
use crate::validator::missing_fields;

const PREVIEW_ROWS: usize = 5;

fn render_notice(notice: &Notice) {
    // Failures come back as the command's error and are printed by main.
    if notice.is_failure() {
        return;
    }
    match notice {
        Notice::ValidationWarning { .. } => println!("{}", notice.to_string().yellow()),
        Notice::Progress(_) => println!("  {notice}"),
        Notice::CommitSucceeded { .. } => println!("{}", notice.to_string().green().bold()),
        _ => println!("{notice}"),
    }
}

fn missing_label(preview: &PreviewState, idx: usize) -> Option<String> {
    if !preview.invalid_indices().contains(&idx) {
        return None;
    }
    let labels: Vec<&str> = missing_fields(&preview.records()[idx])
        .iter()
        .map(|f| f.label())
        .collect();
    Some(format!("Missing: {}", labels.join(", ")))
}

/// The first `limit` rows, plus any invalid row beyond them.
pub fn preview_table(preview: &PreviewState, limit: usize) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["#", "Student ID", "Name", "Grade", "Section", "Check"]);
    for (idx, r) in preview.records().iter().enumerate() {
        let missing = missing_label(preview, idx);
        if idx >= limit && missing.is_none() {
            continue;
        }
        let check = match missing {
            Some(label) => Cell::new(label).fg(Color::Red),
            None => Cell::new("OK").fg(Color::Green),
        };
        table.add_row(vec![
            Cell::new(idx + 1),
            Cell::new(&r.student_id),
            Cell::new(&r.name),
            Cell::new(&r.grade),
            Cell::new(&r.section),
            check,
        ]);
    }
    table
}

/// Rows left out of `preview_table`: valid rows past `limit`.
pub fn hidden_rows(preview: &PreviewState, limit: usize) -> usize {
    (limit..preview.records().len())
        .filter(|idx| !preview.invalid_indices().contains(idx))
        .count()
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
}

pub fn run(file: &str, yes: bool, allow_duplicate: bool) -> Result<()> {
    let settings = load_settings();
    let mut store = super::open_store(&settings)?;
    let mut session = ImportSession::new(MapContext::today(), settings.max_upload_bytes);
    let mut notify = |n: Notice| render_notice(&n);

    session.load_file(Path::new(file), &mut notify)?;
    if !allow_duplicate {
        session.ensure_not_imported(&store)?;
    }

    let preview = session.preview();
    let name = preview.source().map(|s| s.name.as_str()).unwrap_or(file);
    println!("{} ({} rows)", name.bold(), preview.records().len());
    println!("{}", preview_table(preview, PREVIEW_ROWS));
    let hidden = hidden_rows(preview, PREVIEW_ROWS);
    if hidden > 0 {
        println!("... and {hidden} more");
    }

    if preview.can_commit() && !yes {
        let prompt = format!("Import {} students?", preview.records().len());
        if !confirm(&prompt)? {
            println!("Import cancelled.");
            return Ok(());
        }
    }

    session.commit_and_record(&mut store, settings.commit_options(), &mut notify)?;
    println!("{} students in the database", store.student_count()?);
    Ok(())
}
