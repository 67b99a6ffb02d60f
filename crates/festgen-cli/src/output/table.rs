use festgen_core::schema::{FestivalSummary, ListField, SummaryRecord, SCHEMA_FIELDS};

pub fn print_record(record: &SummaryRecord) {
    match record {
        SummaryRecord::Error { error } => println!("  Error: {error}"),
        SummaryRecord::Summary(summary) => print_summary(summary),
    }
}

fn print_summary(summary: &FestivalSummary) {
    let rows = rows(summary);
    let width = rows.iter().map(|(label, _)| label.chars().count()).max().unwrap_or(10);

    println!("=== {} ===\n", summary.title);
    for (label, value) in &rows {
        match value {
            Cell::Text(text) => println!("  {label:<width$}  {text}"),
            Cell::List(ListField::Items(items)) if !items.is_empty() => {
                println!("  {label:<width$}  - {}", items[0]);
                for item in &items[1..] {
                    println!("  {:<width$}  - {item}", "");
                }
            }
            Cell::List(ListField::Items(_)) => println!("  {label:<width$}  -"),
            Cell::List(ListField::NotFound(text)) => println!("  {label:<width$}  {text}"),
        }
    }
}

enum Cell<'a> {
    Text(&'a str),
    List(&'a ListField),
}

/// Field name paired with its value, in schema order.
fn rows(summary: &FestivalSummary) -> Vec<(&'static str, Cell<'_>)> {
    let cells = [
        Cell::Text(&summary.title),
        Cell::Text(&summary.date),
        Cell::Text(&summary.location),
        Cell::Text(&summary.host),
        Cell::Text(&summary.organizer),
        Cell::Text(&summary.target_audience),
        Cell::Text(&summary.summary),
        Cell::List(&summary.programs),
        Cell::List(&summary.events),
        Cell::List(&summary.visual_keywords),
        Cell::Text(&summary.contact_info),
        Cell::Text(&summary.directions),
    ];
    SCHEMA_FIELDS.into_iter().zip(cells).collect()
}
