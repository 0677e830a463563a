//! Minimal xlsx packages for unit tests.

use std::io::{Cursor, Write};

use zip::write::FileOptions;
use zip::ZipWriter;

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PKG_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// Describes a workbook to build. Sheet bodies are the inner XML of
/// `<sheetData>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BookSpec<'a> {
    pub sheets: &'a [(&'a str, &'a str)],
    pub shared: &'a [&'a str],
    pub active: usize,
    pub calc_chain: bool,
    /// Inner XML of `<styleSheet>`; a single general style when unset.
    pub styles: Option<&'a str>,
    pub date1904: bool,
}

pub fn xlsx(sheets: &[(&str, &str)], shared: &[&str]) -> Vec<u8> {
    build_xlsx(&BookSpec {
        sheets,
        shared,
        ..Default::default()
    })
}

pub fn build_xlsx(spec: &BookSpec<'_>) -> Vec<u8> {
    let mut parts: Vec<(String, String)> = Vec::new();

    let mut overrides = String::new();
    let mut workbook_rels = String::new();
    let mut sheet_list = String::new();

    for (i, (name, rows)) in spec.sheets.iter().enumerate() {
        let n = i + 1;
        overrides.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        ));
        workbook_rels.push_str(&format!(
            r#"<Relationship Id="rId{n}" Type="{REL_NS}/worksheet" Target="worksheets/sheet{n}.xml"/>"#
        ));
        sheet_list.push_str(&format!(
            r#"<sheet name="{name}" sheetId="{n}" r:id="rId{n}"/>"#
        ));
        parts.push((
            format!("xl/worksheets/sheet{n}.xml"),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="{MAIN_NS}" xmlns:r="{REL_NS}"><dimension ref="A1"/><sheetData>{rows}</sheetData></worksheet>"#
            ),
        ));
    }

    let next = spec.sheets.len() + 1;
    workbook_rels.push_str(&format!(
        r#"<Relationship Id="rId{next}" Type="{REL_NS}/styles" Target="styles.xml"/>"#
    ));
    parts.push((
        "xl/styles.xml".to_string(),
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><styleSheet xmlns="{MAIN_NS}">{styles}</styleSheet>"#,
            styles = spec
                .styles
                .unwrap_or(r#"<cellXfs count="1"><xf numFmtId="0"/></cellXfs>"#)
        ),
    ));

    if !spec.shared.is_empty() {
        let id = next + 1;
        overrides.push_str(
            r#"<Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>"#,
        );
        workbook_rels.push_str(&format!(
            r#"<Relationship Id="rId{id}" Type="{REL_NS}/sharedStrings" Target="sharedStrings.xml"/>"#
        ));
        let items: String = spec
            .shared
            .iter()
            .map(|s| format!("<si><t>{}</t></si>", s))
            .collect();
        parts.push((
            "xl/sharedStrings.xml".to_string(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><sst xmlns="{MAIN_NS}" count="{c}" uniqueCount="{c}">{items}</sst>"#,
                c = spec.shared.len()
            ),
        ));
    }

    if spec.calc_chain {
        let id = next + 2;
        overrides.push_str(
            r#"<Override PartName="/xl/calcChain.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.calcChain+xml"/>"#,
        );
        workbook_rels.push_str(&format!(
            r#"<Relationship Id="rId{id}" Type="{REL_NS}/calcChain" Target="calcChain.xml"/>"#
        ));
        parts.push((
            "xl/calcChain.xml".to_string(),
            format!(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><calcChain xmlns="{MAIN_NS}"><c r="A1" i="1"/></calcChain>"#),
        ));
    }

    let content_types = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>{overrides}</Types>"#
    );
    let root_rels = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{PKG_REL_NS}"><Relationship Id="rId1" Type="{REL_NS}/officeDocument" Target="xl/workbook.xml"/></Relationships>"#
    );
    let workbook = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook xmlns="{MAIN_NS}" xmlns:r="{REL_NS}"><workbookPr date1904="{date1904}"/><bookViews><workbookView activeTab="{active}"/></bookViews><sheets>{sheet_list}</sheets></workbook>"#,
        active = spec.active,
        date1904 = u8::from(spec.date1904)
    );
    let workbook_rels = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{PKG_REL_NS}">{workbook_rels}</Relationships>"#
    );

    let mut ordered = vec![
        ("[Content_Types].xml".to_string(), content_types),
        ("_rels/.rels".to_string(), root_rels),
        ("xl/workbook.xml".to_string(), workbook),
        ("xl/_rels/workbook.xml.rels".to_string(), workbook_rels),
    ];
    ordered.extend(parts);

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, body) in ordered {
        writer.start_file(name, FileOptions::default()).unwrap();
        writer.write_all(body.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}
