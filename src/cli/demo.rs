use crate::committer::{partition, store_failure};
use crate::demo::GeneratedRoster;
use crate::error::Result;
use crate::models::StudentRecord;
use crate::settings::load_settings;
use crate::store::{SqliteStore, StudentStore};

/// Generated students whose ids are not stored yet.
fn missing_records(store: &SqliteStore, records: Vec<StudentRecord>) -> Result<Vec<StudentRecord>> {
    let mut missing = Vec::with_capacity(records.len());
    for r in records {
        if !store.has_student(&r.student_id)? {
            missing.push(r);
        }
    }
    Ok(missing)
}

pub fn run(count: usize, seed: u64) -> Result<()> {
    let settings = load_settings();
    let mut store = super::open_store(&settings)?;

    let roster = GeneratedRoster::new(count, seed);
    if roster.records().is_empty() {
        println!("Nothing to generate.");
        return Ok(());
    }
    let missing = missing_records(&store, roster.into_records())?;
    if missing.is_empty() {
        println!("Demo data already loaded ({count} students).");
        return Ok(());
    }

    let total = missing.len();
    let mut inserted = 0;
    for (batch_index, batch) in partition(&missing, settings.batch_size).into_iter().enumerate() {
        let n = store
            .insert(batch)
            .map_err(|e| store_failure(e, batch_index, inserted, total))?;
        inserted += n;
    }
    tracing::info!(inserted, seed, "demo roster loaded");

    println!("Demo data loaded: {inserted} students (seed {seed}).");
    println!();
    println!("Try these next:");
    println!("  roster students --search santos");
    println!("  roster students --grade 7 --sort name");
    println!("  roster report dashboard");
    println!("  roster browse");
    Ok(())
}
