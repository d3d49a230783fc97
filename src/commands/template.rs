//! Keyword template export and keyword file import.

use anyhow::{bail, Context, Result};
use std::path::Path;
use tracing::debug;

/// Default file name of the keyword template.
pub const TEMPLATE_FILE_NAME: &str = "keywords_template.csv";

/// Header of the keyword column.
const KEYWORD_COLUMN: &str = "keyword";

/// A `keyword` header followed by two sample rows.
pub fn template_contents() -> String {
    format!("{}\nkeyword 1\nkeyword 2\n", KEYWORD_COLUMN)
}

/// Writes the keyword template to `path`.
pub fn write_template(path: &Path) -> Result<()> {
    std::fs::write(path, template_contents())
        .with_context(|| format!("Failed to write template: {}", path.display()))?;
    debug!("Wrote keyword template to {}", path.display());
    Ok(())
}

/// Reads keywords from a file, see [`parse_keyword_file`].
pub fn load_keyword_file(path: &Path) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read keyword file: {}", path.display()))?;
    parse_keyword_file(&contents)
}

/// Extracts keywords from CSV or plain text.
///
/// When the first row has a `keyword` column only that column is read;
/// otherwise every non-blank line is a keyword.
pub fn parse_keyword_file(contents: &str) -> Result<Vec<String>> {
    let contents = contents.trim_start_matches('\u{feff}');
    let mut lines = contents.lines();

    let header = lines.next().map(split_csv_line).unwrap_or_default();
    let column = header.iter().position(|h| h.trim().eq_ignore_ascii_case(KEYWORD_COLUMN));

    let keywords: Vec<String> = match column {
        Some(idx) => lines
            .map(split_csv_line)
            .filter_map(|fields| fields.into_iter().nth(idx))
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect(),
        None => contents
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect(),
    };

    if keywords.is_empty() {
        bail!("No keywords found. Put them under a column named \"keyword\".");
    }
    Ok(keywords)
}

/// Splits one CSV row, honouring double-quoted fields.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}
