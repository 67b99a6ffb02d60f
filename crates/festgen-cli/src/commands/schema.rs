use festgen_core::error::FestgenError;
use festgen_core::schema::{FIELD_DESCRIPTIONS, LIST_FIELDS, NOT_FOUND};

pub fn run() -> Result<(), FestgenError> {
    let width = FIELD_DESCRIPTIONS
        .iter()
        .map(|(name, _)| name.len())
        .max()
        .unwrap_or(10);

    println!("Extraction fields (every field is always present):\n");
    for (name, description) in FIELD_DESCRIPTIONS {
        let kind = if LIST_FIELDS.contains(&name) {
            "list"
        } else {
            "string"
        };
        println!("  {name:<width$}  ({kind:<6})  {description}");
    }
    println!(
        r#"
Missing information is reported as "{NOT_FOUND}". List fields carry either
an array of strings or that same string when nothing was found.

Money figures (budgets, project costs) and any field not listed above,
such as safety plans or administrative details, are never reported. A
response containing them is rejected."#
    );
    Ok(())
}
