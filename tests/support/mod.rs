//! Shared helpers for integration tests: an xlsx package builder and the
//! path of the compiled binary.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::PathBuf;

use zip::write::FileOptions;
use zip::ZipWriter;

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub fn sheetbox_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_sheetbox"))
}

/// Builds small but complete xlsx packages.
///
/// Sheet bodies are the inner XML of `<sheetData>`. With `prefixed`, sheet
/// parts use an `x:` namespace prefix, as some producers write them.
#[derive(Debug, Default, Clone)]
pub struct WorkbookBuilder {
    sheets: Vec<(String, String)>,
    shared: Vec<String>,
    active: usize,
    prefixed: bool,
    styles: Option<String>,
    date1904: bool,
}

impl WorkbookBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sheet(mut self, name: &str, rows: &str) -> Self {
        self.sheets.push((name.to_string(), rows.to_string()));
        self
    }

    pub fn shared_strings(mut self, strings: &[&str]) -> Self {
        self.shared = strings.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn active(mut self, index: usize) -> Self {
        self.active = index;
        self
    }

    pub fn prefixed(mut self) -> Self {
        self.prefixed = true;
        self
    }

    /// Adds `xl/styles.xml` with this inner XML of `<styleSheet>`.
    pub fn styles(mut self, body: &str) -> Self {
        self.styles = Some(body.to_string());
        self
    }

    pub fn date1904(mut self) -> Self {
        self.date1904 = true;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let mut add = |name: &str, body: String| {
            writer.start_file(name, FileOptions::default()).unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        };

        let mut overrides = String::new();
        let mut rels = String::new();
        let mut sheet_list = String::new();
        for (i, (name, _)) in self.sheets.iter().enumerate() {
            let n = i + 1;
            overrides.push_str(&format!(
                "<Override PartName=\"/xl/worksheets/sheet{n}.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml\"/>"
            ));
            rels.push_str(&format!(
                "<Relationship Id=\"rId{n}\" Type=\"{REL_NS}/worksheet\" Target=\"worksheets/sheet{n}.xml\"/>"
            ));
            sheet_list.push_str(&format!(
                "<sheet name=\"{name}\" sheetId=\"{n}\" r:id=\"rId{n}\"/>"
            ));
        }
        if self.styles.is_some() {
            overrides.push_str("<Override PartName=\"/xl/styles.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml\"/>");
            rels.push_str(&format!(
                "<Relationship Id=\"rIdStyles\" Type=\"{REL_NS}/styles\" Target=\"styles.xml\"/>"
            ));
        }
        if !self.shared.is_empty() {
            overrides.push_str("<Override PartName=\"/xl/sharedStrings.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml\"/>");
            rels.push_str(&format!(
                "<Relationship Id=\"rIdStrings\" Type=\"{REL_NS}/sharedStrings\" Target=\"sharedStrings.xml\"/>"
            ));
        }

        add(
            "[Content_Types].xml",
            format!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\"><Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/><Default Extension=\"xml\" ContentType=\"application/xml\"/><Override PartName=\"/xl/workbook.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml\"/>{overrides}</Types>"
            ),
        );
        add(
            "_rels/.rels",
            format!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\"><Relationship Id=\"rId1\" Type=\"{REL_NS}/officeDocument\" Target=\"xl/workbook.xml\"/></Relationships>"
            ),
        );
        add(
            "xl/workbook.xml",
            format!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?><workbook xmlns=\"{MAIN_NS}\" xmlns:r=\"{REL_NS}\"><workbookPr date1904=\"{}\"/><bookViews><workbookView activeTab=\"{}\"/></bookViews><sheets>{sheet_list}</sheets></workbook>",
                u8::from(self.date1904),
                self.active
            ),
        );
        add(
            "xl/_rels/workbook.xml.rels",
            format!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">{rels}</Relationships>"
            ),
        );

        for (i, (_, rows)) in self.sheets.iter().enumerate() {
            let body = if self.prefixed {
                format!(
                    "<?xml version=\"1.0\" encoding=\"UTF-8\"?><x:worksheet xmlns:x=\"{MAIN_NS}\"><x:dimension ref=\"A1\"/><x:sheetData>{rows}</x:sheetData></x:worksheet>"
                )
            } else {
                format!(
                    "<?xml version=\"1.0\" encoding=\"UTF-8\"?><worksheet xmlns=\"{MAIN_NS}\"><dimension ref=\"A1\"/><sheetData>{rows}</sheetData></worksheet>"
                )
            };
            add(&format!("xl/worksheets/sheet{}.xml", i + 1), body);
        }

        if !self.shared.is_empty() {
            let items: String = self
                .shared
                .iter()
                .map(|s| format!("<si><t>{}</t></si>", s))
                .collect();
            add(
                "xl/sharedStrings.xml",
                format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?><sst xmlns=\"{MAIN_NS}\">{items}</sst>"),
            );
        }

        if let Some(styles) = &self.styles {
            add(
                "xl/styles.xml",
                format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?><styleSheet xmlns=\"{MAIN_NS}\">{styles}</styleSheet>"),
            );
        }

        drop(add);
        writer.finish().unwrap().into_inner()
    }
}

/// Number formats for `dated_workbook`: style 1 is the built-in short
/// date, style 2 a custom date-time, style 3 a plain decimal.
pub const DATE_STYLES: &str = concat!(
    r#"<numFmts count="2"><numFmt numFmtId="164" formatCode="yyyy\-mm\-dd\ hh:mm"/>"#,
    r#"<numFmt numFmtId="165" formatCode="0.000"/></numFmts>"#,
    r#"<cellXfs count="4"><xf numFmtId="0"/><xf numFmtId="14" applyNumberFormat="1"/>"#,
    r#"<xf numFmtId="164" applyNumberFormat="1"/><xf numFmtId="165" applyNumberFormat="1"/></cellXfs>"#,
);

/// A shipping log: dates in column A, amounts in column B.
pub fn dated_workbook() -> WorkbookBuilder {
    WorkbookBuilder::new()
        .sheet(
            "Log",
            concat!(
                r#"<row r="1"><c r="A1" s="1"><v>45306</v></c><c r="B1" s="3"><v>10</v></c></row>"#,
                r#"<row r="2"><c r="A2" s="2"><v>45306.75</v></c><c r="B2"><v>5</v></c></row>"#,
                r#"<row r="3"><c r="A3" s="1"><v>0.5</v></c></row>"#,
            ),
        )
        .styles(DATE_STYLES)
}

/// Quarterly sales figures used across the integration tests.
///
/// `Sales` holds a header row, three data rows with a text note and a
/// formula total; `Notes` holds a single string.
pub fn sales_workbook() -> WorkbookBuilder {
    WorkbookBuilder::new()
        .sheet(
            "Sales",
            concat!(
                r#"<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c></row>"#,
                r#"<row r="2"><c r="A2" t="s"><v>2</v></c><c r="B2"><v>120</v></c></row>"#,
                r#"<row r="3"><c r="A3" t="s"><v>3</v></c><c r="B3"><v>80.5</v></c></row>"#,
                r#"<row r="4"><c r="A4" t="s"><v>4</v></c><c r="B4" t="s"><v>5</v></c></row>"#,
                r#"<row r="5"><c r="B5"><f>SUM(B2:B4)</f><v>200.5</v></c></row>"#,
            ),
        )
        .sheet(
            "Notes",
            r#"<row r="1"><c r="A1" t="inlineStr"><is><t>checked</t></is></c></row>"#,
        )
        .shared_strings(&["Region", "Revenue", "North", "South", "East", "pending"])
}
