use std::io::Read;

use serde_json;

use cell::{Cell, CellId};
use errors::*;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCellId {
    Text(String),
    Number(serde_json::Number),
}

impl From<RawCellId> for CellId {
    fn from(raw: RawCellId) -> Self {
        match raw {
            RawCellId::Text(text) => CellId::new(text),
            RawCellId::Number(number) => CellId::new(number.to_string()),
        }
    }
}

#[derive(Deserialize)]
struct CellProperties {
    id: RawCellId,
    xmin: f64,
    xmax: f64,
    ymin: f64,
    ymax: f64,
}

#[derive(Deserialize)]
struct Feature {
    properties: CellProperties,
}

#[derive(Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

/// `load_cells` reads a GeoJSON `FeatureCollection` of grid cells.
///
/// Each feature's `properties` must carry `id`, `xmin`, `xmax`, `ymin` and `ymax`. Cells are
/// returned in file order, which decides boundary ties.
pub fn load_cells<R: Read>(source: R) -> Result<Vec<Cell>> {
    let collection: FeatureCollection = serde_json::from_reader(source).chain_err(
        || "Error parsing grid JSON.",
    )?;

    let cells = collection
        .features
        .into_iter()
        .map(|feature| {
            let properties = feature.properties;
            Cell::new(
                CellId::from(properties.id),
                properties.xmin,
                properties.xmax,
                properties.ymin,
                properties.ymax,
            )
        })
        .collect();
    Ok(cells)
}

/// Returns how far the brackets of `text` close past its own opening brackets.
///
/// Brackets inside string literals are ignored.
fn unmatched_closers(text: &str) -> usize {
    let mut depth: i64 = 0;
    let mut in_string = false;
    let mut escaped = false;
    for c in text.chars() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => depth -= 1,
            _ => {}
        }
    }
    if depth < 0 { (-depth) as usize } else { 0 }
}

fn strip_trailing_comma(text: &str) -> &str {
    let text = text.trim_end();
    if text.ends_with(',') {
        text[..text.len() - 1].trim_end()
    } else {
        text
    }
}

/// `clean_record_line` strips the array punctuation around one record of a tweet dump.
///
/// Dumps are a single JSON array spread over lines: a header line opening the array, one record
/// per line followed by `,`, and a closing `]}` which may share the last record's line. Returns
/// `None` for lines that hold no record.
pub fn clean_record_line(line: &str) -> Option<&str> {
    let mut trimmed = strip_trailing_comma(line.trim());
    if !trimmed.starts_with('{') || trimmed.ends_with('[') {
        return None;
    }

    for _ in 0..unmatched_closers(trimmed) {
        trimmed = strip_trailing_comma(trimmed);
        if !(trimmed.ends_with(']') || trimmed.ends_with('}')) {
            break;
        }
        trimmed = &trimmed[..trimmed.len() - 1];
    }
    trimmed = strip_trailing_comma(trimmed);

    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
