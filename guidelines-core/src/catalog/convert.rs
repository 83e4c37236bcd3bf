//! Catalog conversion - guideline spreadsheet export to catalog YAML
//!
//! Reads a tab-separated export of a guideline table and produces the
//! `guidelines:` document consumed by [`GuidelineCatalog`](super::GuidelineCatalog).
//! Punctuation is normalized through a fixed substitution table so that a
//! regenerated catalog is byte-for-byte stable.

use std::collections::BTreeMap;
use tracing::{debug, info};

use super::{CatalogDocument, EntryRecord, IDENTIFIER};
use crate::error::{GuidelineError, Result};

const REFERENCE: &str = "Reference";
const DETAIL: &str = "Detail to specify if used/applicable";
const ASPECTS: [&str; 4] = ["Aspect1", "Aspect2", "Aspect3", "Aspect4"];
const INFO_DELIMITER: &str = " | ";

/// Ordered substitution table, applied first to last
pub const SUBSTITUTIONS: &[(&str, &str)] = &[
    (" \u{00ad}", "-"),
    ("\u{00ad} ", "-"),
    ("\u{00ad}", "-"),
    ("\u{00d7}", "x"),
    ("\u{037e}", ";"),
    (" \u{2013}", "-"),
    ("\u{2013} ", "-"),
    ("\u{2013}", "-"),
    (" \u{2014}", "-"),
    ("\u{2014} ", "-"),
    ("\u{2014}", "-"),
    ("\u{2018}", "'"),
    ("\u{2019}", "'"),
    ("\u{201c}", "\""),
    ("\u{201d}", "\""),
    (" \u{2212}", "-"),
    ("\u{2212} ", "-"),
    ("\u{2212}", "-"),
];

/// Apply the substitution table
pub fn normalize(text: &str) -> String {
    SUBSTITUTIONS
        .iter()
        .fold(text.to_string(), |acc, (pattern, replacement)| {
            acc.replace(pattern, replacement)
        })
}

/// Normalization for detail text: the table, then hyphen cleanup
pub fn normalize_detail(text: &str) -> String {
    normalize(text).replace("--", "-").replace(" -", "-")
}

/// Build the descriptive label from the table and aspect columns
pub fn join_info(table: &str, aspects: &[&str]) -> String {
    let mut parts = vec![table];
    if let Some(first) = aspects.first() {
        parts.push(first);
    }
    parts.extend(aspects.iter().skip(1).filter(|a| !a.trim().is_empty()));

    normalize(&parts.join(INFO_DELIMITER))
}

/// Column positions resolved from the header row
struct Columns {
    reference: usize,
    table: usize,
    aspects: [usize; 4],
    detail: usize,
}

impl Columns {
    fn resolve(header: &[String]) -> Result<Self> {
        let find = |name: &str| {
            header
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| GuidelineError::Convert(format!("missing column '{name}'")))
        };

        // A sheet with two "Table" columns exports the second as "Table.1"
        let table = match header.iter().position(|h| h == "Table.1") {
            Some(idx) => idx,
            None => header
                .iter()
                .rposition(|h| h == "Table")
                .ok_or_else(|| GuidelineError::Convert("missing column 'Table.1'".to_string()))?,
        };

        Ok(Self {
            reference: find(REFERENCE)?,
            table,
            aspects: [
                find(ASPECTS[0])?,
                find(ASPECTS[1])?,
                find(ASPECTS[2])?,
                find(ASPECTS[3])?,
            ],
            detail: find(DETAIL)?,
        })
    }
}

/// Split tab-separated content into rows of trimmed fields
///
/// A field that opens with `"` runs to the matching close quote and may span
/// line breaks; `""` inside it is a literal quote.
fn split_records(content: &str) -> Vec<Vec<String>> {
    let content = content.replace("\r\n", "\n");
    let mut records = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if quoted => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    quoted = false;
                }
            }
            '"' if field.trim().is_empty() => {
                field.clear();
                quoted = true;
            }
            '\t' if !quoted => row.push(take_field(&mut field)),
            '\n' if !quoted => {
                row.push(take_field(&mut field));
                records.push(std::mem::take(&mut row));
            }
            _ => field.push(c),
        }
    }

    if !field.is_empty() || !row.is_empty() {
        row.push(take_field(&mut field));
        records.push(row);
    }

    records
        .into_iter()
        .filter(|r| r.iter().any(|f| !f.is_empty()))
        .collect()
}

fn take_field(field: &mut String) -> String {
    std::mem::take(field).trim().to_string()
}

/// Convert a tab-separated guideline table into a catalog document
///
/// `skip_rows` leading lines are discarded before the header row.
pub fn convert_table(content: &str, skip_rows: usize) -> Result<CatalogDocument> {
    let body = content.lines().skip(skip_rows).collect::<Vec<_>>().join("\n");
    let mut rows = split_records(&body).into_iter();

    let header = rows
        .next()
        .ok_or_else(|| GuidelineError::Convert("guideline table has no header row".to_string()))?;
    let columns = Columns::resolve(&header)?;

    let mut guidelines = BTreeMap::new();

    for (row_number, row) in rows.enumerate() {
        let cell = |idx: usize| row.get(idx).map(String::as_str).unwrap_or("");

        let reference = cell(columns.reference).trim();
        if reference.is_empty() {
            debug!("Skipping row {} without a reference", row_number + 1);
            continue;
        }
        if !IDENTIFIER.is_match(reference) {
            return Err(GuidelineError::Convert(format!(
                "row {}: invalid reference '{reference}'",
                row_number + 1
            )));
        }

        let aspects: Vec<&str> = columns.aspects.iter().map(|&idx| cell(idx)).collect();
        let record = EntryRecord {
            info: join_info(cell(columns.table), &aspects),
            text: normalize_detail(cell(columns.detail)),
        };

        if guidelines.insert(reference.to_string(), record).is_some() {
            return Err(GuidelineError::Convert(format!(
                "duplicate reference '{reference}'"
            )));
        }
    }

    info!("Converted {} guideline rows", guidelines.len());

    Ok(CatalogDocument { guidelines })
}

/// Serialize a catalog document as YAML
pub fn to_yaml(document: &CatalogDocument) -> Result<String> {
    serde_yaml_ng::to_string(document).map_err(|e| GuidelineError::Convert(e.to_string()))
}
