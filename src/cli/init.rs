use std::path::PathBuf;

use crate::error::Result;
use crate::settings::{load_settings, save_settings, shellexpand_path};

pub fn run(data_dir: Option<String>) -> Result<()> {
    let mut settings = load_settings();
    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    }
    let resolved = PathBuf::from(&settings.data_dir);

    let store = super::open_store(&settings)?;
    save_settings(&settings)?;

    println!("Data dir:  {}", resolved.display());
    println!("Database:  {}", settings.db_path().display());
    println!("Students:  {}", store.student_count()?);
    println!();
    println!("Next steps:");
    println!("  roster template            write a CSV template to fill in");
    println!("  roster import <FILE>       import students from .xlsx/.xls/.csv");
    println!("  roster demo                load a generated demo roster");
    Ok(())
}
