//! Cell values as read from, and written to, a worksheet.

use chrono::{NaiveDateTime, NaiveTime, Timelike};
use serde_json::{json, Value};

/// A value read from a cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    /// Error literal such as `#DIV/0!`
    Error(String),
    /// A number shown through a date format
    Date(NaiveDateTime),
    /// A date-formatted number below one day
    Time(NaiveTime),
}

/// A numeric view of a cell, used by aggregations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    pub fn to_json(self) -> Value {
        match self {
            Number::Int(i) => json!(i),
            Number::Float(f) => float_json(f),
        }
    }
}

impl CellValue {
    /// Interprets the stored text of a numeric cell.
    ///
    /// Text containing `.`, `e` or `E` is a float, anything else an integer.
    /// Integers too large for `i64` degrade to floats.
    pub fn from_number_text(raw: &str) -> Self {
        let text = raw.trim();
        if text.is_empty() {
            return CellValue::Empty;
        }

        if text.contains(['.', 'e', 'E']) {
            return text
                .parse::<f64>()
                .map(CellValue::Float)
                .unwrap_or_else(|_| CellValue::Text(raw.to_string()));
        }

        match text.parse::<i64>() {
            Ok(i) => CellValue::Int(i),
            Err(_) => text
                .parse::<f64>()
                .map(CellValue::Float)
                .unwrap_or_else(|_| CellValue::Text(raw.to_string())),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Booleans count as 1 and 0. Dates and times are not numbers.
    pub fn as_number(&self) -> Option<Number> {
        match self {
            CellValue::Int(i) => Some(Number::Int(*i)),
            CellValue::Float(f) => Some(Number::Float(*f)),
            CellValue::Bool(b) => Some(Number::Int(i64::from(*b))),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            CellValue::Empty => Value::Null,
            CellValue::Int(i) => json!(i),
            CellValue::Float(f) => float_json(*f),
            CellValue::Bool(b) => json!(b),
            CellValue::Text(s) | CellValue::Error(s) => json!(s),
            CellValue::Date(dt) => json!(iso_datetime(dt)),
            CellValue::Time(t) => json!(iso_time(t)),
        }
    }

    /// Text written for this value in a CSV export.
    pub fn to_csv_field(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Int(i) => i.to_string(),
            CellValue::Float(f) => format_float(*f),
            CellValue::Bool(true) => "True".to_string(),
            CellValue::Bool(false) => "False".to_string(),
            CellValue::Text(s) | CellValue::Error(s) => s.clone(),
            CellValue::Date(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            CellValue::Time(t) => t.format("%H:%M:%S").to_string(),
        }
    }
}

/// `YYYY-MM-DDTHH:MM:SS`, with microseconds only when there are any.
fn iso_datetime(dt: &NaiveDateTime) -> String {
    if dt.nanosecond() == 0 {
        dt.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        dt.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}

fn iso_time(t: &NaiveTime) -> String {
    if t.nanosecond() == 0 {
        t.format("%H:%M:%S").to_string()
    } else {
        t.format("%H:%M:%S%.6f").to_string()
    }
}

/// Non-finite floats have no JSON representation and become `null`.
fn float_json(f: f64) -> Value {
    serde_json::Number::from_f64(f)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Shortest round-trip text for a float, always showing a fractional part or
/// an exponent (`5.0`, `0.25`, `1e+20`, `1e-07`).
pub fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let abs = f.abs();
    if abs == 0.0 || (1e-4..1e16).contains(&abs) {
        let text = f.to_string();
        return if text.contains('.') {
            text
        } else {
            format!("{}.0", text)
        };
    }

    let sci = format!("{:e}", f);
    match sci.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => sci,
    }
}

/// A value to store into a cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellInput {
    Number(f64),
    Text(String),
    /// Formula text without the leading `=`.
    Formula(String),
}

impl CellInput {
    /// Classifies user text: finite numbers are stored as numbers, text
    /// starting with `=` as a formula, everything else as a string.
    pub fn from_text(text: &str) -> Self {
        if let Ok(number) = text.trim().parse::<f64>() {
            if number.is_finite() {
                return CellInput::Number(number);
            }
        }

        match text.strip_prefix('=') {
            Some(formula) if !formula.is_empty() => CellInput::Formula(formula.to_string()),
            _ => CellInput::Text(text.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_number_text_classification() {
        assert_eq!(CellValue::from_number_text("42"), CellValue::Int(42));
        assert_eq!(CellValue::from_number_text("-7"), CellValue::Int(-7));
        assert_eq!(CellValue::from_number_text("4.0"), CellValue::Float(4.0));
        assert_eq!(CellValue::from_number_text("1E3"), CellValue::Float(1000.0));
        assert_eq!(
            CellValue::from_number_text("99999999999999999999"),
            CellValue::Float(1e20)
        );
        assert_eq!(CellValue::from_number_text(""), CellValue::Empty);
    }

    #[test]
    fn test_booleans_are_numeric() {
        assert_eq!(CellValue::Bool(true).as_number(), Some(Number::Int(1)));
        assert_eq!(CellValue::Bool(false).as_number(), Some(Number::Int(0)));
        assert_eq!(CellValue::Text("3".into()).as_number(), None);
        assert_eq!(CellValue::Empty.as_number(), None);
    }

    #[test]
    fn test_json_values() {
        assert_eq!(CellValue::Empty.to_json(), Value::Null);
        assert_eq!(CellValue::Int(3).to_json(), json!(3));
        assert_eq!(CellValue::Float(2.5).to_json(), json!(2.5));
        assert_eq!(CellValue::Float(f64::NAN).to_json(), Value::Null);
        assert_eq!(CellValue::Error("#N/A".into()).to_json(), json!("#N/A"));
    }

    #[test]
    fn test_dates() {
        let noon = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let date = CellValue::Date(noon);
        assert_eq!(date.to_json(), json!("2024-01-15T12:00:00"));
        assert_eq!(date.to_csv_field(), "2024-01-15 12:00:00");
        assert_eq!(date.as_number(), None);

        let precise = CellValue::Date(noon + chrono::Duration::try_milliseconds(250).unwrap());
        assert_eq!(precise.to_json(), json!("2024-01-15T12:00:00.250000"));

        let time = CellValue::Time(NaiveTime::from_hms_opt(6, 30, 0).unwrap());
        assert_eq!(time.to_json(), json!("06:30:00"));
        assert_eq!(time.to_csv_field(), "06:30:00");
        assert_eq!(time.as_number(), None);
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(5.0), "5.0");
        assert_eq!(format_float(0.25), "0.25");
        assert_eq!(format_float(-1.5), "-1.5");
        assert_eq!(format_float(0.0), "0.0");
        assert_eq!(format_float(1e20), "1e+20");
        assert_eq!(format_float(1.5e-7), "1.5e-07");
        assert_eq!(format_float(f64::INFINITY), "inf");
    }

    #[test]
    fn test_csv_fields() {
        assert_eq!(CellValue::Empty.to_csv_field(), "");
        assert_eq!(CellValue::Bool(true).to_csv_field(), "True");
        assert_eq!(CellValue::Float(3.0).to_csv_field(), "3.0");
        assert_eq!(CellValue::Int(3).to_csv_field(), "3");
    }

    #[test]
    fn test_input_classification() {
        assert_eq!(CellInput::from_text("12.5"), CellInput::Number(12.5));
        assert_eq!(CellInput::from_text(" 7 "), CellInput::Number(7.0));
        assert_eq!(
            CellInput::from_text("=SUM(A1:A3)"),
            CellInput::Formula("SUM(A1:A3)".into())
        );
        assert_eq!(CellInput::from_text("="), CellInput::Text("=".into()));
        assert_eq!(CellInput::from_text("nan"), CellInput::Text("nan".into()));
        assert_eq!(CellInput::from_text("hello"), CellInput::Text("hello".into()));
    }
}
