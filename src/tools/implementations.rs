use serde_json::{json, Value};
use tracing::debug;

use super::error::ToolError;
use super::trait_def::{ParameterSpec, Tool};
use crate::datauri::{self, CSV_MIME, XLSX_MIME};
use crate::workbook::{
    split_qualified, CellInput, CellRef, Limits, Number, RangeRef, Workbook, WorkbookError,
};

const FILE_PARAM: ParameterSpec = ParameterSpec::file("file", "The .xlsx file to process.");
const RANGE_PARAM: ParameterSpec =
    ParameterSpec::string("range", "The cell range string (e.g., 'Sheet1!A1:A10').");

/// Typed access to the JSON parameter object of a call.
struct Params<'a> {
    args: &'a Value,
}

impl<'a> Params<'a> {
    fn new(args: &'a Value) -> Self {
        Self { args }
    }

    fn string(&self, name: &str) -> Result<&'a str, ToolError> {
        self.args
            .get(name)
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::MissingParameter(name.to_string()))
    }

    fn workbook(&self, limits: &Limits) -> Result<Workbook, ToolError> {
        let bytes = datauri::decode(self.string("file")?)?;
        debug!(bytes = bytes.len(), "Decoded workbook payload");
        Ok(Workbook::from_bytes_with_limits(&bytes, limits)?)
    }

    fn range(&self, name: &str) -> Result<(String, RangeRef), ToolError> {
        let (sheet, reference) = split_qualified(self.string(name)?)?;
        Ok((sheet, RangeRef::parse(reference)?))
    }

    /// A qualified reference that must name exactly one cell.
    fn cell(&self, name: &str) -> Result<(String, CellRef), ToolError> {
        let (sheet, reference) = split_qualified(self.string(name)?)?;
        if reference.contains(':') {
            return Err(ToolError::invalid(
                name,
                format!("expected a single cell address, got '{}'", reference),
            ));
        }
        Ok((sheet, CellRef::parse(reference)?))
    }
}

/// Sum and count of the numeric cells in a range.
fn numeric_total(workbook: &Workbook, sheet: &str, range: &RangeRef) -> Result<(Number, usize), ToolError> {
    let sheet = workbook.sheet(sheet)?;

    let mut total = Number::Int(0);
    let mut count = 0usize;
    for value in sheet.range(range).filter_map(|v| v.as_number()) {
        total = match (total, value) {
            (Number::Int(a), Number::Int(b)) => a
                .checked_add(b)
                .map_or(Number::Float(a as f64 + b as f64), Number::Int),
            (a, b) => Number::Float(a.as_f64() + b.as_f64()),
        };
        count += 1;
    }

    Ok((total, count))
}

#[derive(Debug, Default)]
pub struct SumRangeTool {
    limits: Limits,
}

impl SumRangeTool {
    pub fn new(limits: Limits) -> Self {
        Self { limits }
    }
}

impl Tool for SumRangeTool {
    fn id(&self) -> &'static str {
        "sum_range"
    }

    fn name(&self) -> &'static str {
        "Sum Cell Range"
    }

    fn description(&self) -> &'static str {
        "Calculates the sum of all numbers in a given cell range (e.g., 'Sheet1!A1:A10')."
    }

    fn parameters(&self) -> &'static [ParameterSpec] {
        const PARAMS: &[ParameterSpec] = &[FILE_PARAM, RANGE_PARAM];
        PARAMS
    }

    fn execute(&self, args: &Value) -> Result<Value, ToolError> {
        let params = Params::new(args);
        let workbook = params.workbook(&self.limits)?;
        let (sheet, range) = params.range("range")?;

        debug!(sheet = %sheet, range = %range, "sum_range parameters");

        let (total, count) = numeric_total(&workbook, &sheet, &range)?;
        debug!(count, "sum_range completed");

        Ok(json!({ "value": total.to_json() }))
    }
}

#[derive(Debug, Default)]
pub struct AvgRangeTool {
    limits: Limits,
}

impl AvgRangeTool {
    pub fn new(limits: Limits) -> Self {
        Self { limits }
    }
}

impl Tool for AvgRangeTool {
    fn id(&self) -> &'static str {
        "avg_range"
    }

    fn name(&self) -> &'static str {
        "Average Cell Range"
    }

    fn description(&self) -> &'static str {
        "Calculates the average of all numbers in a given cell range."
    }

    fn parameters(&self) -> &'static [ParameterSpec] {
        const PARAMS: &[ParameterSpec] = &[FILE_PARAM, RANGE_PARAM];
        PARAMS
    }

    fn execute(&self, args: &Value) -> Result<Value, ToolError> {
        let params = Params::new(args);
        let workbook = params.workbook(&self.limits)?;
        let (sheet, range) = params.range("range")?;

        debug!(sheet = %sheet, range = %range, "avg_range parameters");

        let (total, count) = numeric_total(&workbook, &sheet, &range)?;
        debug!(count, "avg_range completed");

        if count == 0 {
            return Ok(json!({ "value": 0 }));
        }
        let average = Number::Float(total.as_f64() / count as f64);
        Ok(json!({ "value": average.to_json() }))
    }
}

#[derive(Debug, Default)]
pub struct GetCellTool {
    limits: Limits,
}

impl GetCellTool {
    pub fn new(limits: Limits) -> Self {
        Self { limits }
    }
}

impl Tool for GetCellTool {
    fn id(&self) -> &'static str {
        "get_cell"
    }

    fn name(&self) -> &'static str {
        "Get Cell Value"
    }

    fn description(&self) -> &'static str {
        "Retrieves the value from a single, specific cell (e.g., 'Sheet1!B2')."
    }

    fn parameters(&self) -> &'static [ParameterSpec] {
        const PARAMS: &[ParameterSpec] = &[
            FILE_PARAM,
            ParameterSpec::string("cell", "The cell address (e.g., 'Sheet1!B2')."),
        ];
        PARAMS
    }

    fn execute(&self, args: &Value) -> Result<Value, ToolError> {
        let params = Params::new(args);
        let workbook = params.workbook(&self.limits)?;
        let (sheet, at) = params.cell("cell")?;

        debug!(sheet = %sheet, cell = %at, "get_cell parameters");

        let sheet = workbook.sheet(&sheet)?;
        Ok(json!({ "value": sheet.cell(at).to_json() }))
    }
}

#[derive(Debug, Default)]
pub struct SetCellTool {
    limits: Limits,
}

impl SetCellTool {
    pub fn new(limits: Limits) -> Self {
        Self { limits }
    }

    /// Strings are classified by content; bare JSON numbers are stored as
    /// numbers.
    fn input(args: &Value) -> Result<CellInput, ToolError> {
        match args.get("value") {
            None | Some(Value::Null) => Err(ToolError::MissingParameter("value".to_string())),
            Some(Value::String(text)) => Ok(CellInput::from_text(text)),
            Some(Value::Number(n)) => n
                .as_f64()
                .map(CellInput::Number)
                .ok_or_else(|| ToolError::invalid("value", "number out of range")),
            Some(other) => Err(ToolError::invalid(
                "value",
                format!("expected a string or number, got {}", other),
            )),
        }
    }
}

impl Tool for SetCellTool {
    fn id(&self) -> &'static str {
        "set_cell"
    }

    fn name(&self) -> &'static str {
        "Set Cell Value"
    }

    fn description(&self) -> &'static str {
        "Writes a new value to a specific cell and returns the modified Excel file."
    }

    fn parameters(&self) -> &'static [ParameterSpec] {
        const PARAMS: &[ParameterSpec] = &[
            FILE_PARAM,
            ParameterSpec::string("cell", "The cell address to modify (e.g., 'Sheet1!C3')."),
            ParameterSpec::string("value", "The new value to write into the cell."),
        ];
        PARAMS
    }

    fn execute(&self, args: &Value) -> Result<Value, ToolError> {
        let params = Params::new(args);
        let mut workbook = params.workbook(&self.limits)?;
        let (sheet, at) = params.cell("cell")?;
        let input = Self::input(args)?;

        debug!(sheet = %sheet, cell = %at, input = ?input, "set_cell parameters");

        workbook.set_cell(&sheet, at, &input)?;
        let bytes = workbook.to_bytes()?;

        debug!(bytes = bytes.len(), "set_cell completed");
        Ok(json!({ "file": datauri::encode(XLSX_MIME, &bytes) }))
    }
}

#[derive(Debug, Default)]
pub struct ToCsvTool {
    limits: Limits,
}

impl ToCsvTool {
    pub fn new(limits: Limits) -> Self {
        Self { limits }
    }
}

impl Tool for ToCsvTool {
    fn id(&self) -> &'static str {
        "to_csv"
    }

    fn name(&self) -> &'static str {
        "Convert to CSV"
    }

    fn description(&self) -> &'static str {
        "Converts the first worksheet of an Excel file into CSV format."
    }

    fn parameters(&self) -> &'static [ParameterSpec] {
        const PARAMS: &[ParameterSpec] =
            &[ParameterSpec::file("file", "The .xlsx file to convert.")];
        PARAMS
    }

    fn execute(&self, args: &Value) -> Result<Value, ToolError> {
        let workbook = Params::new(args).workbook(&self.limits)?;
        let sheet = workbook.active_sheet()?;

        debug!(
            sheet = sheet.name(),
            rows = sheet.max_row(),
            columns = sheet.max_column(),
            "to_csv parameters"
        );

        // Blank cells inside the used rectangle are written too.
        let cells = u64::from(sheet.max_row()) * u64::from(sheet.max_column());
        if cells > self.limits.max_export_cells {
            return Err(WorkbookError::TooLarge(format!(
                "sheet {} spans {} rows by {} columns, over the export limit of {} cells",
                sheet.name(),
                sheet.max_row(),
                sheet.max_column(),
                self.limits.max_export_cells
            ))
            .into());
        }

        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::CRLF)
            .from_writer(Vec::new());
        let mut written = 0u64;
        for row in sheet.rows() {
            let fields: Vec<String> = row.iter().map(|v| v.to_csv_field()).collect();
            written += fields.iter().map(|f| f.len() as u64 + 1).sum::<u64>();
            if written > self.limits.max_unpacked_bytes {
                return Err(WorkbookError::TooLarge(format!(
                    "CSV export of {} goes past {} bytes",
                    sheet.name(),
                    self.limits.max_unpacked_bytes
                ))
                .into());
            }
            writer
                .write_record(&fields)
                .map_err(|e| ToolError::Internal(format!("Failed to write CSV: {}", e)))?;
        }
        let content = writer
            .into_inner()
            .map_err(|e| ToolError::Internal(format!("Failed to write CSV: {}", e)))?;

        debug!(bytes = content.len(), "to_csv completed");
        Ok(json!({ "file": datauri::encode(CSV_MIME, &content) }))
    }
}
