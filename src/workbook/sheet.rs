//! Worksheet parsing.

use std::collections::{BTreeMap, HashMap};

use roxmltree::{Document, Node};

use super::address::{CellRef, RangeRef, MAX_COLUMN};
use super::formula;
use super::styles::{self, Styles};
use super::value::CellValue;
use super::xml;
use super::WorkbookError;

static EMPTY: CellValue = CellValue::Empty;

/// The cells of one sheet, read from its part.
#[derive(Debug, Clone)]
pub struct Worksheet {
    name: String,
    cells: BTreeMap<CellRef, CellValue>,
    max_row: u32,
    max_col: u32,
}

impl Worksheet {
    pub(crate) fn parse(
        name: &str,
        part: &str,
        text: &str,
        shared_strings: &[String],
        styles: &Styles,
    ) -> Result<Self, WorkbookError> {
        let doc = Document::parse(text).map_err(|e| xml::parse_error(part, e))?;

        let mut sheet = Worksheet {
            name: name.to_string(),
            cells: BTreeMap::new(),
            max_row: 0,
            max_col: 0,
        };

        let Some(sheet_data) = doc.descendants().find(|n| n.has_tag_name("sheetData")) else {
            return Ok(sheet);
        };

        let mut shared_formulas = HashMap::new();
        let mut row_index = 0u32;

        for row in sheet_data.children().filter(|n| n.has_tag_name("row")) {
            row_index = match row.attribute("r") {
                Some(r) => r
                    .trim()
                    .parse()
                    .map_err(|_| WorkbookError::Parse(format!("{}: bad row number {:?}", part, r)))?,
                None => row_index + 1,
            };

            let mut col_index = 0u32;
            for cell in row.children().filter(|n| n.has_tag_name("c")) {
                let at = match cell.attribute("r") {
                    Some(r) => CellRef::parse(r).map_err(|_| {
                        WorkbookError::Parse(format!("{}: bad cell reference {:?}", part, r))
                    })?,
                    None => CellRef::new(col_index + 1, row_index),
                };
                col_index = at.col;

                sheet.max_row = sheet.max_row.max(at.row);
                sheet.max_col = sheet.max_col.max(at.col);

                let value = read_cell(cell, at, shared_strings, styles, &mut shared_formulas)?;
                if !value.is_empty() {
                    sheet.cells.insert(at, value);
                }
            }
        }

        Ok(sheet)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Highest row holding a cell element, 0 for an empty sheet.
    pub fn max_row(&self) -> u32 {
        self.max_row
    }

    pub fn max_column(&self) -> u32 {
        self.max_col
    }

    /// Number of cells with a value.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cell(&self, at: CellRef) -> &CellValue {
        self.cells.get(&at).unwrap_or(&EMPTY)
    }

    /// Populated cells inside `range`, row-major.
    pub fn cells_in<'a>(
        &'a self,
        range: &RangeRef,
    ) -> impl Iterator<Item = (CellRef, &'a CellValue)> + 'a {
        range
            .bounds(self.max_row, self.max_col)
            .into_iter()
            .flat_map(move |(start, end)| {
                self.cells
                    .range(CellRef::new(1, start.row)..=CellRef::new(MAX_COLUMN, end.row))
                    .filter(move |(at, _)| (start.col..=end.col).contains(&at.col))
                    .map(|(at, value)| (*at, value))
            })
    }

    /// Values of the populated cells inside `range`, row-major.
    pub fn range<'a>(&'a self, range: &RangeRef) -> impl Iterator<Item = &'a CellValue> + 'a {
        self.cells_in(range).map(|(_, value)| value)
    }

    /// Every row from 1 to `max_row`, each spanning columns 1 to `max_column`.
    pub fn rows(&self) -> impl Iterator<Item = Vec<&CellValue>> + '_ {
        (1..=self.max_row).map(move |row| {
            (1..=self.max_col)
                .map(|col| self.cell(CellRef::new(col, row)))
                .collect()
        })
    }
}

fn read_cell(
    cell: Node<'_, '_>,
    at: CellRef,
    shared_strings: &[String],
    styles: &Styles,
    shared_formulas: &mut HashMap<String, (CellRef, String)>,
) -> Result<CellValue, WorkbookError> {
    if let Some(f) = xml::child(cell, "f") {
        if let Some(text) = formula_text(f, at, shared_formulas) {
            return Ok(CellValue::Text(format!("={}", xml::decode_xstring(&text))));
        }
    }

    let raw = xml::child(cell, "v").and_then(|v| v.text());

    let value = match cell.attribute("t").unwrap_or("n") {
        "s" => match raw {
            Some(raw) => {
                let index: usize = raw.trim().parse().map_err(|_| {
                    WorkbookError::Parse(format!("{}: bad shared string index {:?}", at, raw))
                })?;
                let text = shared_strings.get(index).ok_or_else(|| {
                    WorkbookError::Parse(format!("{}: shared string {} out of range", at, index))
                })?;
                CellValue::Text(text.clone())
            }
            None => CellValue::Empty,
        },
        "b" => raw
            .map(|r| CellValue::Bool(matches!(r.trim(), "1" | "true")))
            .unwrap_or(CellValue::Empty),
        "e" => raw
            .map(|r| CellValue::Error(r.to_string()))
            .unwrap_or(CellValue::Empty),
        "str" => raw
            .map(|r| CellValue::Text(xml::decode_xstring(r)))
            .unwrap_or(CellValue::Empty),
        "d" => raw
            .map(|r| styles::parse_iso(r).unwrap_or_else(|| CellValue::Text(r.to_string())))
            .unwrap_or(CellValue::Empty),
        "inlineStr" => xml::child(cell, "is")
            .map(|is| CellValue::Text(xml::rich_text(is)))
            .unwrap_or(CellValue::Empty),
        _ => match raw.map(CellValue::from_number_text) {
            Some(number) if styles.is_date_style(cell.attribute("s")) => {
                date_of(&number, styles).unwrap_or(number)
            }
            Some(number) => number,
            None => CellValue::Empty,
        },
    };

    Ok(value)
}

fn date_of(number: &CellValue, styles: &Styles) -> Option<CellValue> {
    let serial = number.as_number()?.as_f64();
    styles.date_value(serial)
}

/// Formula text of a cell. Shared-formula masters are remembered so that
/// later dependents of the same group can be translated from them.
fn formula_text(
    f: Node<'_, '_>,
    at: CellRef,
    shared_formulas: &mut HashMap<String, (CellRef, String)>,
) -> Option<String> {
    let text = f.text().filter(|t| !t.trim().is_empty());
    let group = (f.attribute("t") == Some("shared"))
        .then(|| f.attribute("si"))
        .flatten();

    match (text, group) {
        (Some(text), Some(si)) => {
            shared_formulas.insert(si.to_string(), (at, text.to_string()));
            Some(text.to_string())
        }
        (Some(text), None) => Some(text.to_string()),
        (None, Some(si)) => shared_formulas.get(si).map(|(origin, text)| {
            formula::translate(
                text,
                i64::from(at.row) - i64::from(origin.row),
                i64::from(at.col) - i64::from(origin.col),
            )
        }),
        (None, None) => None,
    }
}
