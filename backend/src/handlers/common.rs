//! Query parsing and response helpers shared by the HTTP handlers.

use std::{net::IpAddr, str::FromStr};

use axum::{
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

use crate::error::AppError;
use crate::services::export::ExportFile;
use crate::services::ClientInfo;

pub const MIN_REPORT_YEAR: i32 = 2000;
pub const MAX_REPORT_YEAR: i32 = 2100;
const MAX_USER_AGENT_LEN: usize = 512;

pub fn parse_date_value(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|value| !value.is_empty())
}

pub fn parse_optional_date(field: &str, raw: Option<&str>) -> Result<Option<NaiveDate>, AppError> {
    match non_empty(raw) {
        Some(value) => parse_date_value(value)
            .map(Some)
            .ok_or_else(|| AppError::BadRequest(format!("`{}` must be a valid date (YYYY-MM-DD)", field))),
        None => Ok(None),
    }
}

/// Parses `start_date`/`end_date`; the end may not precede the start.
pub fn parse_date_range(
    start: Option<&str>,
    end: Option<&str>,
) -> Result<(Option<NaiveDate>, Option<NaiveDate>), AppError> {
    let start = parse_optional_date("start_date", start)?;
    let end = parse_optional_date("end_date", end)?;
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(AppError::validation(
                "end_date",
                "The end date must be a date after or equal to start date.",
            ));
        }
    }
    Ok((start, end))
}

pub fn parse_optional_id<T: FromStr>(field: &str, raw: Option<&str>) -> Result<Option<T>, AppError> {
    match non_empty(raw) {
        Some(value) => parse_id(field, value).map(Some),
        None => Ok(None),
    }
}

pub fn parse_id<T: FromStr>(field: &str, raw: &str) -> Result<T, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("`{}` must be a valid identifier", field)))
}

/// Month and year from the query, defaulting to the month containing `today`.
pub fn resolve_month_year(
    month: Option<&str>,
    year: Option<&str>,
    today: NaiveDate,
) -> Result<(u32, i32), AppError> {
    let month = match non_empty(month) {
        Some(raw) => raw
            .parse::<u32>()
            .ok()
            .filter(|m| (1..=12).contains(m))
            .ok_or_else(|| AppError::validation("month", "The month must be between 1 and 12."))?,
        None => today.month(),
    };
    let year = match non_empty(year) {
        Some(raw) => raw
            .parse::<i32>()
            .ok()
            .filter(|y| (MIN_REPORT_YEAR..=MAX_REPORT_YEAR).contains(y))
            .ok_or_else(|| AppError::validation("year", "The year must be between 2000 and 2100."))?,
        None => today.year(),
    };
    Ok((month, year))
}

fn parse_ip(raw: &str) -> Option<String> {
    raw.trim().parse::<IpAddr>().ok().map(|ip| ip.to_string())
}

/// Caller address and user agent recorded with clock events. Addresses that
/// do not parse as an IP are dropped.
pub fn client_info(headers: &HeaderMap) -> ClientInfo {
    let header_str = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };
    let ip = header_str("x-forwarded-for")
        .and_then(|raw| raw.split(',').next())
        .and_then(parse_ip)
        .or_else(|| header_str("x-real-ip").and_then(parse_ip));
    let user_agent = header_str(header::USER_AGENT.as_str())
        .map(|agent| agent.chars().take(MAX_USER_AGENT_LEN).collect());
    ClientInfo { ip, user_agent }
}

/// Renders an export as a file download.
pub fn file_download(file: ExportFile) -> Result<Response, AppError> {
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", file.filename))
        .map_err(|e| AppError::InternalServerError(e.into()))?;
    let headers = [
        (header::CONTENT_TYPE, HeaderValue::from_static(file.content_type)),
        (header::CONTENT_DISPOSITION, disposition),
    ];
    Ok((headers, file.body).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UserId;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parse_date_value_supports_rfc3339_sql_and_plain_date() {
        assert_eq!(parse_date_value("2026-02-04T09:10:11+09:00"), Some(date(2026, 2, 4)));
        assert_eq!(parse_date_value("2026-02-04 09:10:11"), Some(date(2026, 2, 4)));
        assert_eq!(parse_date_value("2026-02-04"), Some(date(2026, 2, 4)));
        assert!(parse_date_value("2026-13-01").is_none());
    }

    #[test]
    fn date_range_rejects_end_before_start() {
        assert_eq!(
            parse_date_range(Some("2024-05-01"), Some("2024-05-01")).unwrap(),
            (Some(date(2024, 5, 1)), Some(date(2024, 5, 1)))
        );
        assert!(matches!(
            parse_date_range(Some("2024-05-02"), Some("2024-05-01")),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            parse_date_range(Some("yesterday"), None),
            Err(AppError::BadRequest(_))
        ));
        assert_eq!(parse_date_range(Some(""), None).unwrap(), (None, None));
    }

    #[test]
    fn month_and_year_default_to_today_and_are_bounded() {
        let today = date(2024, 7, 15);
        assert_eq!(resolve_month_year(None, None, today).unwrap(), (7, 2024));
        assert_eq!(resolve_month_year(Some("12"), Some("2023"), today).unwrap(), (12, 2023));
        assert!(resolve_month_year(Some("13"), None, today).is_err());
        assert!(resolve_month_year(None, Some("1999"), today).is_err());
        assert!(resolve_month_year(None, Some("2101"), today).is_err());
    }

    #[test]
    fn ids_are_parsed_or_rejected() {
        let id = UserId::new();
        assert_eq!(
            parse_optional_id::<UserId>("employee", Some(&id.to_string())).unwrap(),
            Some(id)
        );
        assert!(parse_optional_id::<UserId>("employee", None).unwrap().is_none());
        assert!(parse_id::<UserId>("employee", "42").is_err());
    }

    #[test]
    fn client_info_prefers_the_first_forwarded_address() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.1, 10.0.0.2"));
        headers.insert(header::USER_AGENT, HeaderValue::from_static("curl/8.0"));
        let info = client_info(&headers);
        assert_eq!(info.ip.as_deref(), Some("10.0.0.1"));
        assert_eq!(info.user_agent.as_deref(), Some("curl/8.0"));
        assert_eq!(client_info(&HeaderMap::new()), ClientInfo::default());
    }

    #[test]
    fn client_info_drops_addresses_that_are_not_ips() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("client-behind-corporate-proxy.example.internal.lan, 10.0.0.1"),
        );
        assert_eq!(client_info(&headers).ip, None);

        headers.insert("x-real-ip", HeaderValue::from_static("2001:db8::1"));
        assert_eq!(client_info(&headers).ip.as_deref(), Some("2001:db8::1"));

        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(" 192.168.1.20 "));
        assert_eq!(client_info(&headers).ip.as_deref(), Some("192.168.1.20"));
    }
}
