use festgen_core::error::FestgenError;
use serde::Serialize;
use std::path::Path;

/// Pretty JSON to stdout, or to `file` when given.
pub fn emit<T: Serialize + ?Sized>(value: &T, file: Option<&Path>) -> Result<(), FestgenError> {
    let json = serde_json::to_string_pretty(value)?;
    match file {
        Some(path) => {
            std::fs::write(path, json)?;
            eprintln!("Written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
