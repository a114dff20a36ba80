use std::borrow::Cow;

use csv::{QuoteStyle, WriterBuilder};

fn needs_formula_guard(value: &str) -> bool {
    match value.chars().next() {
        Some('=' | '@') => true,
        // A lone sign is the placeholder for a missing value.
        Some('+' | '-') => value.len() > 1,
        _ => false,
    }
}

/// Prefixes cells that a spreadsheet would evaluate as a formula.
pub fn guard_formula(value: &str) -> Cow<'_, str> {
    if needs_formula_guard(value) {
        Cow::Owned(format!("'{}", value))
    } else {
        Cow::Borrowed(value)
    }
}

/// Writes a header row plus data rows with every cell quoted.
pub fn write_csv<I, R>(headers: &[&str], rows: I) -> anyhow::Result<Vec<u8>>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator,
    R::Item: AsRef<str>,
{
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(Vec::new());

    writer.write_record(headers.iter().map(|header| guard_formula(header).into_owned()))?;
    for row in rows {
        let cells: Vec<String> = row
            .into_iter()
            .map(|cell| guard_formula(cell.as_ref()).into_owned())
            .collect();
        writer.write_record(&cells)?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV output: {}", e))
}
