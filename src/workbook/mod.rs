//! Reading and editing `.xlsx` workbooks.
//!
//! A workbook is kept as its raw OOXML package. Sheets are parsed on demand
//! and edits are spliced into the affected part, so writing a workbook back
//! leaves every untouched part exactly as it was read.
//!
//! # Example
//!
//! ```no_run
//! use sheetbox::workbook::{CellInput, CellRef, Workbook};
//!
//! # fn example(bytes: &[u8]) -> Result<(), sheetbox::workbook::WorkbookError> {
//! let mut workbook = Workbook::from_bytes(bytes)?;
//! let sheet = workbook.sheet("Sheet1")?;
//! println!("B2 = {:?}", sheet.cell(CellRef::parse("B2")?));
//!
//! workbook.set_cell("Sheet1", CellRef::parse("C3")?, &CellInput::from_text("42"))?;
//! let updated = workbook.to_bytes()?;
//! # let _ = updated;
//! # Ok(())
//! # }
//! ```

pub mod address;
pub mod edit;
pub mod formula;
pub mod package;
pub mod sheet;
pub mod styles;
pub mod value;
mod xml;

#[cfg(test)]
pub(crate) mod testing;

use roxmltree::Document;
use thiserror::Error;
use tracing::debug;

pub use address::{split_qualified, CellRef, RangeRef};
pub use package::Package;
pub use sheet::Worksheet;
pub use styles::Styles;
pub use value::{CellInput, CellValue, Number};

use package::{parse_relationships, rels_path_for, resolve_target, Relationship};

const CONTENT_TYPES: &str = "[Content_Types].xml";
const DEFAULT_WORKBOOK_PART: &str = "xl/workbook.xml";

/// Errors raised while reading or editing a workbook
#[derive(Debug, Error)]
pub enum WorkbookError {
    /// The bytes are not a readable xlsx package
    #[error("Failed to parse Excel file: {0}")]
    Parse(String),

    /// No sheet with this exact name
    #[error("Worksheet {0} does not exist.")]
    SheetNotFound(String),

    /// A cell or range reference could not be parsed
    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),

    /// A qualified `Sheet!Range` reference is malformed
    #[error("{0}")]
    InvalidRange(String),

    /// The package could not be written back
    #[error("Failed to write Excel file: {0}")]
    Write(String),

    /// The workbook or its export goes over a configured [`Limits`] bound
    #[error("Workbook too large: {0}")]
    TooLarge(String),
}

/// Bounds on how much work one workbook may cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Total bytes all package parts may inflate to. Also bounds the size
    /// of a CSV export.
    pub max_unpacked_bytes: u64,
    /// Cells a CSV export may emit, counting the blanks that fill out the
    /// used rectangle.
    pub max_export_cells: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_unpacked_bytes: 128 * 1024 * 1024,
            max_export_cells: 4_000_000,
        }
    }
}

#[derive(Debug, Clone)]
struct SheetEntry {
    name: String,
    part: String,
}

/// An xlsx workbook held as its package parts.
#[derive(Debug, Clone)]
pub struct Workbook {
    package: Package,
    workbook_part: String,
    sheets: Vec<SheetEntry>,
    shared_strings: Vec<String>,
    styles: Styles,
    active: usize,
}

impl Workbook {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WorkbookError> {
        Self::from_bytes_with_limits(bytes, &Limits::default())
    }

    pub fn from_bytes_with_limits(bytes: &[u8], limits: &Limits) -> Result<Self, WorkbookError> {
        let package = Package::read(bytes, limits.max_unpacked_bytes)?;

        let workbook_part = match package.part_text("_rels/.rels")? {
            Some(text) => parse_relationships("_rels/.rels", text)?
                .into_iter()
                .find(|r| r.is_kind("officeDocument"))
                .map(|r| resolve_target("", &r.target)),
            None => None,
        }
        .unwrap_or_else(|| DEFAULT_WORKBOOK_PART.to_string());

        let rels_name = rels_path_for(&workbook_part);
        let rels = match package.part_text(&rels_name)? {
            Some(text) => parse_relationships(&rels_name, text)?,
            None => Vec::new(),
        };

        let (sheets, active, date1904) = read_sheet_list(&package, &workbook_part, &rels)?;

        let shared_strings = match rels.iter().find(|r| r.is_kind("sharedStrings")) {
            Some(rel) => {
                let part = resolve_target(&workbook_part, &rel.target);
                match package.part_text(&part)? {
                    Some(text) => parse_shared_strings(&part, text)?,
                    None => Vec::new(),
                }
            }
            None => Vec::new(),
        };

        let styles = match rels.iter().find(|r| r.is_kind("styles")) {
            Some(rel) => {
                let part = resolve_target(&workbook_part, &rel.target);
                match package.part_text(&part)? {
                    Some(text) => Styles::parse(&part, text, date1904)?,
                    None => Styles::new(Vec::new(), date1904),
                }
            }
            None => Styles::new(Vec::new(), date1904),
        };

        debug!(
            sheets = sheets.len(),
            shared_strings = shared_strings.len(),
            active,
            date1904,
            "Loaded workbook"
        );

        Ok(Self {
            package,
            workbook_part,
            sheets,
            shared_strings,
            styles,
            active,
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, WorkbookError> {
        self.package.write()
    }

    pub fn package(&self) -> &Package {
        &self.package
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn active_sheet_name(&self) -> &str {
        &self.sheets[self.active].name
    }

    /// Sheet lookup is exact and case-sensitive.
    pub fn sheet(&self, name: &str) -> Result<Worksheet, WorkbookError> {
        let entry = self.entry(name)?;
        self.load(entry)
    }

    /// The sheet selected when the workbook was last saved.
    pub fn active_sheet(&self) -> Result<Worksheet, WorkbookError> {
        self.load(&self.sheets[self.active])
    }

    /// Writes `input` into one cell of `sheet`.
    ///
    /// The calculation chain is dropped, as Excel rebuilds it on load and a
    /// stale chain pointing at a replaced formula makes the file invalid.
    pub fn set_cell(
        &mut self,
        sheet: &str,
        at: CellRef,
        input: &CellInput,
    ) -> Result<(), WorkbookError> {
        let part = self.entry(sheet)?.part.clone();
        let text = self.package.require_text(&part)?;
        let updated = edit::set_cell(&part, text, at, input)?;
        self.package.replace(&part, updated.into_bytes());
        self.drop_calc_chain()?;

        debug!(sheet, cell = %at, "Updated cell");
        Ok(())
    }

    fn entry(&self, name: &str) -> Result<&SheetEntry, WorkbookError> {
        self.sheets
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| WorkbookError::SheetNotFound(name.to_string()))
    }

    fn load(&self, entry: &SheetEntry) -> Result<Worksheet, WorkbookError> {
        let text = self.package.require_text(&entry.part)?;
        Worksheet::parse(&entry.name, &entry.part, text, &self.shared_strings, &self.styles)
    }

    fn drop_calc_chain(&mut self) -> Result<(), WorkbookError> {
        let rels_name = rels_path_for(&self.workbook_part);
        let Some(rels_text) = self.package.part_text(&rels_name)? else {
            return Ok(());
        };
        let rels = parse_relationships(&rels_name, rels_text)?;
        let Some(calc) = rels.iter().find(|r| r.is_kind("calcChain")) else {
            return Ok(());
        };

        let calc_part = resolve_target(&self.workbook_part, &calc.target);
        let updated_rels = xml::remove_elements(&rels_name, rels_text, |n| {
            n.has_tag_name("Relationship") && n.attribute("Id") == Some(calc.id.as_str())
        })?;
        let updated_types = match self.package.part_text(CONTENT_TYPES)? {
            Some(text) => Some(xml::remove_elements(CONTENT_TYPES, text, |n| {
                let part_name = n.attribute("PartName").unwrap_or_default();
                n.has_tag_name("Override")
                    && part_name.trim_start_matches('/').eq_ignore_ascii_case(&calc_part)
            })?),
            None => None,
        };

        self.package.replace(&rels_name, updated_rels.into_bytes());
        if let Some(types) = updated_types {
            self.package.replace(CONTENT_TYPES, types.into_bytes());
        }
        self.package.remove(&calc_part);

        debug!(part = %calc_part, "Dropped calculation chain");
        Ok(())
    }
}

/// Sheet entries in workbook order, the active tab index and whether
/// serial dates count from 1904.
fn read_sheet_list(
    package: &Package,
    workbook_part: &str,
    rels: &[Relationship],
) -> Result<(Vec<SheetEntry>, usize, bool), WorkbookError> {
    let text = package.require_text(workbook_part)?;
    let doc = Document::parse(text).map_err(|e| xml::parse_error(workbook_part, e))?;

    let mut sheets = Vec::new();
    for node in doc.descendants().filter(|n| n.has_tag_name("sheet")) {
        let name = node
            .attribute("name")
            .ok_or_else(|| WorkbookError::Parse("sheet without a name".into()))?;
        let rel_id = xml::attribute_local(node, "id").ok_or_else(|| {
            WorkbookError::Parse(format!("sheet {} has no relationship id", name))
        })?;
        let rel = rels.iter().find(|r| r.id == rel_id).ok_or_else(|| {
            WorkbookError::Parse(format!(
                "sheet {} points at missing relationship {}",
                name, rel_id
            ))
        })?;

        sheets.push(SheetEntry {
            name: name.to_string(),
            part: resolve_target(workbook_part, &rel.target),
        });
    }

    if sheets.is_empty() {
        return Err(WorkbookError::Parse("workbook contains no worksheets".into()));
    }

    let active = doc
        .descendants()
        .find(|n| n.has_tag_name("workbookView"))
        .and_then(|n| n.attribute("activeTab"))
        .and_then(|tab| tab.parse::<usize>().ok())
        .filter(|tab| *tab < sheets.len())
        .unwrap_or(0);

    let date1904 = doc
        .descendants()
        .find(|n| n.has_tag_name("workbookPr"))
        .and_then(|n| n.attribute("date1904"))
        .map(|flag| matches!(flag.trim(), "1" | "true"))
        .unwrap_or(false);

    Ok((sheets, active, date1904))
}

fn parse_shared_strings(part: &str, text: &str) -> Result<Vec<String>, WorkbookError> {
    let doc = Document::parse(text).map_err(|e| xml::parse_error(part, e))?;
    Ok(doc
        .root_element()
        .children()
        .filter(|n| n.has_tag_name("si"))
        .map(xml::rich_text)
        .collect())
}
