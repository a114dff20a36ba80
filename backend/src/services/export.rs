//! Sheet layouts for attendance exports and their CSV/XLSX encodings.

use chrono::{Datelike, NaiveDateTime};
use rust_xlsxwriter::{Format, Workbook};

use crate::error::AppError;
use crate::models::attendance::{round_to, Attendance, AttendanceRow};
use crate::models::employee::EmployeeProfile;
use crate::models::report::EmployeeSummary;
use crate::utils::csv::write_csv;
use crate::utils::time::{month_name, weekday_label};

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// Worksheet titles are limited to 31 characters and may not contain these.
const FORBIDDEN_TITLE_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];
const MAX_TITLE_CHARS: usize = 31;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Xlsx,
}

impl ExportFormat {
    /// Parses the `type` query parameter; absent means CSV.
    pub fn parse(raw: Option<&str>) -> Result<Self, AppError> {
        match raw.map(str::trim).filter(|value| !value.is_empty()) {
            None => Ok(ExportFormat::Csv),
            Some(value) if value.eq_ignore_ascii_case("csv") => Ok(ExportFormat::Csv),
            Some(value) if value.eq_ignore_ascii_case("xlsx") => Ok(ExportFormat::Xlsx),
            Some(_) => Err(AppError::validation("type", "Export type must be csv or xlsx.")),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => CSV_CONTENT_TYPE,
            ExportFormat::Xlsx => XLSX_CONTENT_TYPE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Integer(i64),
    /// Rendered with a fixed number of decimal places in CSV.
    Decimal(f64, usize),
}

impl Cell {
    fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    fn to_text(&self) -> String {
        match self {
            Cell::Text(value) => value.clone(),
            Cell::Integer(value) => value.to_string(),
            Cell::Decimal(value, places) => format!("{:.*}", places, value),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub title: String,
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<Cell>>,
}

#[derive(Debug, Clone)]
pub struct ExportFile {
    pub filename: String,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

fn yes_no(flag: bool) -> Cell {
    Cell::text(if flag { "Yes" } else { "No" })
}

fn time_or_dash(value: Option<NaiveDateTime>, format: &str) -> Cell {
    Cell::text(
        value
            .map(|time| time.format(format).to_string())
            .unwrap_or_else(|| "-".to_string()),
    )
}

/// One row per attendance record for the filtered listing export.
pub fn attendance_rows_sheet(rows: &[AttendanceRow]) -> Sheet {
    let rows = rows
        .iter()
        .map(|row| {
            let record = &row.attendance;
            vec![
                Cell::text(row.employee_code.as_str()),
                Cell::text(row.employee_name.as_str()),
                Cell::text(row.department_name.clone().unwrap_or_default()),
                Cell::text(row.sub_department_name.clone().unwrap_or_default()),
                Cell::text(record.date.format("%Y-%m-%d").to_string()),
                time_or_dash(record.clock_in, "%Y-%m-%d %H:%M:%S"),
                time_or_dash(record.clock_out, "%Y-%m-%d %H:%M:%S"),
                Cell::Decimal(record.net_hours(), 2),
                Cell::text(record.status.as_str()),
                yes_no(record.is_late),
            ]
        })
        .collect();

    Sheet {
        title: "Attendance".to_string(),
        headers: vec![
            "Employee ID",
            "Name",
            "Department",
            "Sub-Department",
            "Date",
            "Clock In",
            "Clock Out",
            "Net Hours",
            "Status",
            "Late?",
        ],
        rows,
    }
}

/// Monthly per-employee summary, shared by the employee report and the report overview exports.
pub fn employee_summary_sheet(summaries: &[EmployeeSummary], month: u32, year: i32) -> Sheet {
    let rows = summaries
        .iter()
        .map(|summary| {
            let employee = &summary.employee;
            vec![
                Cell::text(employee.employee_code.as_str()),
                Cell::text(employee.name.as_str()),
                Cell::text(employee.email.as_str()),
                Cell::text(employee.department_name.clone().unwrap_or_default()),
                Cell::text(employee.sub_department_name.clone().unwrap_or_default()),
                Cell::text(employee.designation.as_str()),
                Cell::Integer(summary.attendance_days as i64),
                Cell::Integer(summary.on_time_days as i64),
                Cell::Integer(summary.late_days as i64),
                Cell::Decimal(summary.total_hours, 1),
                Cell::Decimal(summary.avg_hours_per_day, 1),
            ]
        })
        .collect();

    Sheet {
        title: format!("Attendance Report - {} {}", month_name(month), year),
        headers: vec![
            "Employee ID",
            "Name",
            "Email",
            "Department",
            "Sub Department",
            "Designation",
            "Attendance Days",
            "On Time Days",
            "Late Days",
            "Total Working Hours",
            "Avg Hours/Day",
        ],
        rows,
    }
}

/// Day-by-day sheet for one employee.
pub fn employee_detail_sheet(employee: &EmployeeProfile, records: &[Attendance]) -> Sheet {
    let rows = records
        .iter()
        .map(|record| {
            let net_hours = match record.net_minutes {
                Some(minutes) if minutes > 0 => Cell::Decimal(round_to(f64::from(minutes) / 60.0, 2), 2),
                _ => Cell::text("-"),
            };
            vec![
                Cell::text(record.date.format("%Y-%m-%d").to_string()),
                Cell::text(weekday_label(record.date.weekday())),
                time_or_dash(record.clock_in, "%H:%M"),
                time_or_dash(record.clock_out, "%H:%M"),
                net_hours,
                Cell::text(record.status.label()),
                yes_no(record.is_late),
                Cell::Integer(i64::from(record.late_minutes)),
            ]
        })
        .collect();

    Sheet {
        title: format!("{} - Attendance", employee.name),
        headers: vec![
            "Date",
            "Day",
            "Clock In",
            "Clock Out",
            "Net Hours",
            "Status",
            "Late",
            "Late Minutes",
        ],
        rows,
    }
}

pub fn attendance_export_filename(now: NaiveDateTime, format: ExportFormat) -> String {
    format!(
        "attendance_export_{}.{}",
        now.format("%Y-%m-%d_%H-%M"),
        format.extension()
    )
}

/// `prefix` is `employee_report` or `attendance_report`.
pub fn monthly_report_filename(prefix: &str, month: u32, year: i32, format: ExportFormat) -> String {
    format!("{}_{}_{}.{}", prefix, month_name(month), year, format.extension())
}

pub fn employee_detail_filename(employee_code: &str, month: u32, year: i32, format: ExportFormat) -> String {
    let code: String = employee_code
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!(
        "{}_attendance_{}_{}.{}",
        code,
        month_name(month),
        year,
        format.extension()
    )
}

pub fn sanitize_sheet_title(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| !FORBIDDEN_TITLE_CHARS.contains(c))
        .take(MAX_TITLE_CHARS)
        .collect();
    let trimmed = cleaned.trim().trim_matches('\'');
    if trimmed.is_empty() {
        "Sheet1".to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn render_csv(sheet: &Sheet) -> anyhow::Result<Vec<u8>> {
    write_csv(
        &sheet.headers,
        sheet
            .rows
            .iter()
            .map(|row| row.iter().map(Cell::to_text).collect::<Vec<_>>()),
    )
}

pub fn render_xlsx(sheet: &Sheet) -> anyhow::Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sanitize_sheet_title(&sheet.title))?;

    for (col, header) in sheet.headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &bold)?;
    }
    for (index, row) in sheet.rows.iter().enumerate() {
        let row_num = index as u32 + 1;
        for (col, cell) in row.iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Text(value) => {
                    worksheet.write_string(row_num, col, value.as_str())?;
                }
                Cell::Integer(value) => {
                    worksheet.write_number(row_num, col, *value as f64)?;
                }
                Cell::Decimal(value, _) => {
                    worksheet.write_number(row_num, col, *value)?;
                }
            }
        }
    }
    worksheet.autofit();

    Ok(workbook.save_to_buffer()?)
}

pub fn render(sheet: &Sheet, format: ExportFormat) -> anyhow::Result<Vec<u8>> {
    match format {
        ExportFormat::Csv => render_csv(sheet),
        ExportFormat::Xlsx => render_xlsx(sheet),
    }
}

/// Encodes the sheet off the async runtime.
pub async fn render_file(sheet: Sheet, format: ExportFormat, filename: String) -> Result<ExportFile, AppError> {
    let rows = sheet.rows.len();
    let body = tokio::task::spawn_blocking(move || render(&sheet, format))
        .await
        .map_err(|e| AppError::InternalServerError(e.into()))??;

    tracing::info!(filename = %filename, rows, bytes = body.len(), "export rendered");
    Ok(ExportFile {
        filename,
        content_type: format.content_type(),
        body,
    })
}
