//! Shared-formula translation.
//!
//! A shared formula stores its text once on the master cell; dependent cells
//! only carry the group index. Their formula is the master's with every
//! relative reference moved by the offset between the two cells.

use std::sync::OnceLock;

use regex::Regex;

use super::address::{column_index, column_letters, MAX_COLUMN, MAX_ROW};

fn reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(\$?)([A-Za-z]{1,3})(\$?)([0-9]+)").expect("reference pattern is valid")
    })
}

/// Shifts relative references in `formula` by the given row/column deltas.
///
/// String literals and quoted sheet names are copied untouched. A reference
/// pushed off the sheet becomes `#REF!`.
pub fn translate(formula: &str, row_delta: i64, col_delta: i64) -> String {
    if row_delta == 0 && col_delta == 0 {
        return formula.to_string();
    }

    let mut out = String::with_capacity(formula.len() + 8);
    let mut rest = formula;

    while !rest.is_empty() {
        let quote = rest.find(['"', '\'']);
        let (plain, quoted) = match quote {
            Some(i) => rest.split_at(i),
            None => (rest, ""),
        };
        out.push_str(&shift_segment(plain, row_delta, col_delta));

        if quoted.is_empty() {
            break;
        }

        let delimiter = quoted.as_bytes()[0] as char;
        let literal_len = quoted_len(quoted, delimiter);
        out.push_str(&quoted[..literal_len]);
        rest = &quoted[literal_len..];
    }

    out
}

/// Length of a quoted run starting at `text[0]`, honouring doubled quotes.
fn quoted_len(text: &str, delimiter: char) -> usize {
    let bytes = text.as_bytes();
    let mut i = 1;
    while i < bytes.len() {
        if bytes[i] as char == delimiter {
            if bytes.get(i + 1).map(|b| *b as char) == Some(delimiter) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

fn shift_segment(segment: &str, row_delta: i64, col_delta: i64) -> String {
    let bytes = segment.as_bytes();
    let mut out = String::with_capacity(segment.len());
    let mut last = 0;

    for caps in reference_pattern().captures_iter(segment) {
        let Some(whole) = caps.get(0) else { continue };

        let before = whole.start().checked_sub(1).map(|i| bytes[i]);
        let after = bytes.get(whole.end()).copied();
        let glued_before =
            before.is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'.');
        let glued_after = after
            .is_some_and(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'(' | b'!'));
        if glued_before || glued_after {
            continue;
        }

        let col_abs = !caps[1].is_empty();
        let row_abs = !caps[3].is_empty();
        let (Some(col), Ok(row)) = (column_index(&caps[2]), caps[4].parse::<i64>()) else {
            continue;
        };

        let new_col = if col_abs {
            i64::from(col)
        } else {
            i64::from(col) + col_delta
        };
        let new_row = if row_abs { row } else { row + row_delta };

        out.push_str(&segment[last..whole.start()]);
        let on_sheet = (1..=i64::from(MAX_COLUMN)).contains(&new_col)
            && (1..=i64::from(MAX_ROW)).contains(&new_row);
        if !on_sheet {
            out.push_str("#REF!");
        } else {
            out.push_str(&caps[1]);
            out.push_str(&column_letters(new_col as u32));
            out.push_str(&caps[3]);
            out.push_str(&new_row.to_string());
        }
        last = whole.end();
    }

    out.push_str(&segment[last..]);
    out
}
