//! Number formats from `xl/styles.xml`, as far as reading values needs them:
//! which cell styles display a date or time, and from which epoch.

use std::sync::OnceLock;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use roxmltree::Document;

use super::value::CellValue;
use super::xml;
use super::WorkbookError;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Date handling for the cells of one workbook.
#[derive(Debug, Clone, Default)]
pub struct Styles {
    /// Per `cellXfs` index: does the style format a date or time.
    date_xfs: Vec<bool>,
    /// `workbookPr date1904`: serials count from 1904-01-01.
    date1904: bool,
}

impl Styles {
    pub fn new(date_xfs: Vec<bool>, date1904: bool) -> Self {
        Self { date_xfs, date1904 }
    }

    /// Reads `cellXfs` and the custom `numFmts` of a styles part.
    pub fn parse(part: &str, text: &str, date1904: bool) -> Result<Self, WorkbookError> {
        let doc = Document::parse(text).map_err(|e| xml::parse_error(part, e))?;

        let custom: Vec<(u32, &str)> = doc
            .descendants()
            .filter(|n| n.has_tag_name("numFmt"))
            .filter_map(|n| {
                let id = n.attribute("numFmtId")?.trim().parse().ok()?;
                Some((id, n.attribute("formatCode")?))
            })
            .collect();

        let date_xfs = doc
            .descendants()
            .find(|n| n.has_tag_name("cellXfs"))
            .map(|xfs| {
                xfs.children()
                    .filter(|n| n.has_tag_name("xf"))
                    .map(|xf| {
                        let id = xf
                            .attribute("numFmtId")
                            .and_then(|id| id.trim().parse::<u32>().ok())
                            .unwrap_or(0);
                        match custom.iter().find(|(custom_id, _)| *custom_id == id) {
                            Some((_, code)) => is_date_format(code),
                            None => is_builtin_date(id),
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self { date_xfs, date1904 })
    }

    pub fn is_date_style(&self, style: Option<&str>) -> bool {
        style
            .and_then(|s| s.trim().parse::<usize>().ok())
            .and_then(|index| self.date_xfs.get(index).copied())
            .unwrap_or(false)
    }

    /// A numeric serial shown through a date format. Serials outside the
    /// calendar stay numbers.
    pub fn date_value(&self, serial: f64) -> Option<CellValue> {
        serial_to_value(serial, self.date1904)
    }
}

/// Built-in format ids that display dates or times.
fn is_builtin_date(id: u32) -> bool {
    matches!(id, 14..=22 | 45..=47)
}

fn elapsed_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)\[(h+|m+|s+)\]").expect("elapsed pattern is valid"))
}

fn literal_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#""[^"]*"|\[[^\]]*\]|\\.|[_*]."#).expect("literal pattern is valid")
    })
}

/// Whether a format code renders a date or time.
///
/// Only the first section counts. Quoted text, bracketed colors and
/// conditions, escapes and padding are ignored, except elapsed-time
/// brackets such as `[h]`.
pub fn is_date_format(code: &str) -> bool {
    let section = code.split(';').next().unwrap_or_default();
    if section.eq_ignore_ascii_case("general") {
        return false;
    }

    if elapsed_pattern().is_match(section) {
        return true;
    }

    literal_pattern()
        .replace_all(section, "")
        .chars()
        .any(|c| matches!(c.to_ascii_lowercase(), 'd' | 'm' | 'y' | 'h' | 's'))
}

/// Converts an Excel serial into a date, or a time of day for serials in
/// `[0, 1)`. The 1900 system keeps Excel's phantom 1900-02-29, so serials
/// below 60 are shifted by a day.
pub fn serial_to_value(serial: f64, date1904: bool) -> Option<CellValue> {
    if !serial.is_finite() {
        return None;
    }

    let day = serial.floor();
    let millis = ((serial - day) * MILLIS_PER_DAY as f64).round() as i64;
    let fraction = Duration::try_milliseconds(millis)?;

    if (0.0..1.0).contains(&serial) && millis < MILLIS_PER_DAY {
        return Some(CellValue::Time(NaiveTime::MIN + fraction));
    }

    let mut day = day as i64;
    if !date1904 && 0.0 < serial && serial < 60.0 {
        day += 1;
    }

    let epoch = if date1904 {
        NaiveDate::from_ymd_opt(1904, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)
    }?
    .and_time(NaiveTime::MIN);

    epoch
        .checked_add_signed(Duration::try_days(day)?)?
        .checked_add_signed(fraction)
        .map(CellValue::Date)
}

/// An ISO 8601 value stored in a `t="d"` cell.
pub fn parse_iso(text: &str) -> Option<CellValue> {
    let text = text.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(CellValue::Date(dt));
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(CellValue::Date(date.and_time(NaiveTime::MIN)));
    }
    NaiveTime::parse_from_str(text, "%H:%M:%S%.f")
        .ok()
        .map(CellValue::Time)
}
