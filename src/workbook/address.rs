//! A1-style cell and range references.

use std::fmt;
use std::str::FromStr;

use super::WorkbookError;

/// Last column Excel can address (`XFD`).
pub const MAX_COLUMN: u32 = 16_384;

/// Last row Excel can address.
pub const MAX_ROW: u32 = 1_048_576;

/// A single cell position, 1-based.
///
/// Ordering is row-major so that a `BTreeMap<CellRef, _>` iterates cells in
/// the same order they appear in a sheet part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellRef {
    pub row: u32,
    pub col: u32,
}

impl CellRef {
    pub fn new(col: u32, row: u32) -> Self {
        Self { row, col }
    }

    /// Parses `A1`, `$A$1` or `a1`.
    pub fn parse(input: &str) -> Result<Self, WorkbookError> {
        let invalid = || WorkbookError::InvalidAddress(input.to_string());

        let text = input.trim();
        let text = text.strip_prefix('$').unwrap_or(text);
        let split = text
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(text.len());
        let (letters, rest) = text.split_at(split);
        let digits = rest.strip_prefix('$').unwrap_or(rest);

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let col = column_index(letters).ok_or_else(invalid)?;
        let row = digits.parse::<u32>().map_err(|_| invalid())?;
        if row == 0 || row > MAX_ROW {
            return Err(invalid());
        }

        Ok(Self { row, col })
    }

    pub fn column_name(&self) -> String {
        column_letters(self.col)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letters(self.col), self.row)
    }
}

impl FromStr for CellRef {
    type Err = WorkbookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Converts column letters (`A`, `AB`, `xfd`) to a 1-based index.
pub fn column_index(letters: &str) -> Option<u32> {
    if letters.is_empty() || letters.len() > 3 {
        return None;
    }

    let mut index: u32 = 0;
    for b in letters.bytes() {
        if !b.is_ascii_alphabetic() {
            return None;
        }
        index = index * 26 + u32::from(b.to_ascii_uppercase() - b'A' + 1);
    }

    (index <= MAX_COLUMN).then_some(index)
}

/// Converts a 1-based column index to its letters.
pub fn column_letters(mut col: u32) -> String {
    let mut letters = Vec::with_capacity(3);
    while col > 0 {
        let rem = (col - 1) % 26;
        letters.push(b'A' + rem as u8);
        col = (col - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// A rectangular selection on a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeRef {
    /// `A1:B10`, or a single `A1`. Corners are normalized.
    Cells { start: CellRef, end: CellRef },
    /// `A:C`, bounded by the rows the sheet uses.
    Columns { start: u32, end: u32 },
    /// `2:5`, bounded by the columns the sheet uses.
    Rows { start: u32, end: u32 },
}

impl RangeRef {
    pub fn parse(input: &str) -> Result<Self, WorkbookError> {
        let invalid = || WorkbookError::InvalidAddress(input.to_string());
        let text = input.trim();

        let Some((left, right)) = text.split_once(':') else {
            let cell = CellRef::parse(text)?;
            return Ok(RangeRef::Cells {
                start: cell,
                end: cell,
            });
        };

        let left = left.trim_start_matches('$');
        let right = right.trim_start_matches('$');

        if is_all(left, |b| b.is_ascii_alphabetic()) && is_all(right, |b| b.is_ascii_alphabetic())
        {
            let a = column_index(left).ok_or_else(invalid)?;
            let b = column_index(right).ok_or_else(invalid)?;
            return Ok(RangeRef::Columns {
                start: a.min(b),
                end: a.max(b),
            });
        }

        if is_all(left, |b| b.is_ascii_digit()) && is_all(right, |b| b.is_ascii_digit()) {
            let a = parse_row(left).ok_or_else(invalid)?;
            let b = parse_row(right).ok_or_else(invalid)?;
            return Ok(RangeRef::Rows {
                start: a.min(b),
                end: a.max(b),
            });
        }

        let a = CellRef::parse(left)?;
        let b = CellRef::parse(right)?;
        Ok(RangeRef::Cells {
            start: CellRef::new(a.col.min(b.col), a.row.min(b.row)),
            end: CellRef::new(a.col.max(b.col), a.row.max(b.row)),
        })
    }

    pub fn is_single_cell(&self) -> bool {
        matches!(self, RangeRef::Cells { start, end } if start == end)
    }

    /// Concrete corners of this range on a sheet of the given extent.
    ///
    /// Returns `None` when a whole-row/column range meets an empty sheet.
    pub fn bounds(&self, max_row: u32, max_col: u32) -> Option<(CellRef, CellRef)> {
        match *self {
            RangeRef::Cells { start, end } => Some((start, end)),
            RangeRef::Columns { start, end } => {
                (max_row > 0).then(|| (CellRef::new(start, 1), CellRef::new(end, max_row)))
            }
            RangeRef::Rows { start, end } => {
                (max_col > 0).then(|| (CellRef::new(1, start), CellRef::new(max_col, end)))
            }
        }
    }
}

impl fmt::Display for RangeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeRef::Cells { start, end } if start == end => write!(f, "{}", start),
            RangeRef::Cells { start, end } => write!(f, "{}:{}", start, end),
            RangeRef::Columns { start, end } => {
                write!(f, "{}:{}", column_letters(*start), column_letters(*end))
            }
            RangeRef::Rows { start, end } => write!(f, "{}:{}", start, end),
        }
    }
}

fn is_all(s: &str, pred: impl Fn(u8) -> bool) -> bool {
    !s.is_empty() && s.bytes().all(pred)
}

fn parse_row(s: &str) -> Option<u32> {
    s.parse::<u32>()
        .ok()
        .filter(|row| (1..=MAX_ROW).contains(row))
}

/// Splits `Sheet1!A1:B10` into the sheet name and the reference part.
///
/// The split happens at the first `!`. A quoted sheet name (`'My Sheet'`) is
/// unquoted, with `''` standing for a literal quote.
pub fn split_qualified(input: &str) -> Result<(String, &str), WorkbookError> {
    let (sheet, reference) = input.split_once('!').ok_or_else(|| {
        WorkbookError::InvalidRange("Invalid range format. Expected 'SheetName!A1:B10'.".into())
    })?;

    let sheet = match sheet
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
    {
        Some(quoted) => quoted.replace("''", "'"),
        None => sheet.to_string(),
    };

    Ok((sheet, reference))
}
