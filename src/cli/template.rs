use std::fs::File;
use std::path::PathBuf;

use crate::error::Result;
use crate::template::{write_template, TEMPLATE_FILE};

pub fn run(output: Option<String>, extended: bool) -> Result<()> {
    let path = output.map(PathBuf::from).unwrap_or_else(|| PathBuf::from(TEMPLATE_FILE));
    write_template(File::create(&path)?, extended)?;
    println!("Template written to {}", path.display());
    println!("Fill in one student per row, then run `roster import {}`.", path.display());
    Ok(())
}
