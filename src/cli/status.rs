use crate::db::get_connection;
use crate::error::Result;
use crate::fmt::format_bytes;
use crate::settings::{load_settings, settings_file_exists};
use crate::store::SqliteStore;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let db_path = settings.db_path();

    println!("Data dir:   {}", settings.data_dir);
    println!("Database:   {}", db_path.display());
    if !settings_file_exists() {
        println!("Settings:   (defaults)");
    }

    if db_path.exists() {
        let size = std::fs::metadata(&db_path)?.len();
        println!("DB size:    {}", format_bytes(size));

        let store = SqliteStore::from_connection(get_connection(&db_path)?);
        println!();
        println!("Students:   {}", store.student_count()?);
        println!("Imports:    {}", store.import_count()?);
    } else {
        println!();
        println!("Database not found. Run `roster init` to set up.");
    }

    Ok(())
}
