//! In-place cell edits on a worksheet part.
//!
//! The part is rewritten by splicing new markup into the original text, so
//! everything outside the touched cell (styles, merged ranges, extensions the
//! parser does not understand) survives byte-for-byte.

use roxmltree::{Document, Node};

use super::address::{CellRef, RangeRef};
use super::value::CellInput;
use super::xml::{self, Splice};
use super::WorkbookError;

/// Returns the sheet part text with `at` set to `input`.
pub fn set_cell(
    part: &str,
    text: &str,
    at: CellRef,
    input: &CellInput,
) -> Result<String, WorkbookError> {
    let doc = Document::parse(text).map_err(|e| xml::parse_error(part, e))?;
    let root = doc.root_element();
    let prefix = xml::element_prefix(text, root);

    let sheet_data = doc
        .descendants()
        .find(|n| n.has_tag_name("sheetData"))
        .ok_or_else(|| WorkbookError::Parse(format!("{}: missing sheetData", part)))?;

    let mut splices = vec![cell_splice(text, prefix, sheet_data, at, input)];
    if let Some(splice) = dimension_splice(prefix, root, at) {
        splices.push(splice);
    }

    Ok(xml::apply(text, splices))
}

fn cell_splice(
    text: &str,
    prefix: &str,
    sheet_data: Node<'_, '_>,
    at: CellRef,
    input: &CellInput,
) -> Splice {
    let mut row_index = 0u32;
    for row in sheet_data.children().filter(|n| n.has_tag_name("row")) {
        row_index = row
            .attribute("r")
            .and_then(|r| r.trim().parse().ok())
            .unwrap_or(row_index + 1);

        if row_index < at.row {
            continue;
        }
        if row_index > at.row {
            let markup = format!(
                "<{p}row r=\"{r}\">{c}</{p}row>",
                p = prefix,
                r = at.row,
                c = cell_markup(prefix, at, None, input)
            );
            return Splice::insert(row.range().start, markup);
        }

        let mut col_index = 0u32;
        for cell in row.children().filter(|n| n.has_tag_name("c")) {
            col_index = cell
                .attribute("r")
                .and_then(|r| CellRef::parse(r).ok())
                .map_or(col_index + 1, |r| r.col);

            if col_index == at.col {
                let markup = cell_markup(prefix, at, cell.attribute("s"), input);
                return Splice::replace(cell.range(), markup);
            }
            if col_index > at.col {
                let markup = cell_markup(prefix, at, None, input);
                return Splice::insert(cell.range().start, markup);
            }
        }

        return xml::append_child(text, row, &cell_markup(prefix, at, None, input));
    }

    let markup = format!(
        "<{p}row r=\"{r}\">{c}</{p}row>",
        p = prefix,
        r = at.row,
        c = cell_markup(prefix, at, None, input)
    );
    xml::append_child(text, sheet_data, &markup)
}

/// Markup for one `<c>` element. `style` carries over the `s` attribute of
/// the cell being replaced.
pub fn cell_markup(prefix: &str, at: CellRef, style: Option<&str>, input: &CellInput) -> String {
    let style = style
        .map(|s| format!(" s=\"{}\"", xml::escape_text(s)))
        .unwrap_or_default();

    match input {
        CellInput::Number(n) => format!(
            "<{p}c r=\"{at}\"{style}><{p}v>{n}</{p}v></{p}c>",
            p = prefix,
            at = at,
            style = style,
            n = n
        ),
        CellInput::Text(s) => format!(
            "<{p}c r=\"{at}\"{style} t=\"inlineStr\"><{p}is><{p}t xml:space=\"preserve\">{s}</{p}t></{p}is></{p}c>",
            p = prefix,
            at = at,
            style = style,
            s = xml::escape_xstring(s)
        ),
        CellInput::Formula(f) => format!(
            "<{p}c r=\"{at}\"{style}><{p}f>{f}</{p}f></{p}c>",
            p = prefix,
            at = at,
            style = style,
            f = xml::escape_xstring(f)
        ),
    }
}

/// Widens `<dimension ref>` so that it covers `at`.
fn dimension_splice(prefix: &str, root: Node<'_, '_>, at: CellRef) -> Option<Splice> {
    let dimension = root
        .children()
        .find(|n| n.is_element() && n.has_tag_name("dimension"))?;

    let (start, end) = match dimension.attribute("ref").map(RangeRef::parse) {
        Some(Ok(RangeRef::Cells { start, end })) => (start, end),
        _ => (at, at),
    };

    let widened = RangeRef::Cells {
        start: CellRef::new(start.col.min(at.col), start.row.min(at.row)),
        end: CellRef::new(end.col.max(at.col), end.row.max(at.row)),
    };

    Some(Splice::replace(
        dimension.range(),
        format!("<{}dimension ref=\"{}\"/>", prefix, widened),
    ))
}
