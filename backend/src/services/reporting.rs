//! Read-side folds over attendance records.
//!
//! Callers load the in-scope employees and their records; everything here is
//! plain computation so it can be tested without a database.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::models::attendance::{round_to, Attendance};
use crate::models::employee::{EmployeeBrief, EmployeeProfile};
use crate::models::report::{
    AnalyticsResponse, AttendanceStats, DailyTrendPoint, DaySummary, EmployeeCount, EmployeeSummary,
    GroupAttendance, NamedHours, ReportOverview, ReportStats, StatusBreakdown, TrendPoint,
};
use crate::types::UserId;
use crate::utils::time::{days_in_range, month_bounds, month_start_offset};

const TOP_LIST_LIMIT: usize = 5;

fn is_present(record: &Attendance) -> bool {
    record.clock_in.is_some()
}

fn is_late(record: &Attendance) -> bool {
    record.clock_in.is_some() && record.is_late
}

fn hours(minutes: f64, decimals: i32) -> f64 {
    round_to(minutes / 60.0, decimals)
}

fn average_net_minutes<'a>(records: impl Iterator<Item = &'a Attendance>) -> Option<f64> {
    let (sum, count) = records
        .filter_map(|record| record.net_minutes)
        .fold((0i64, 0usize), |(sum, count), net| (sum + i64::from(net), count + 1));
    (count > 0).then(|| sum as f64 / count as f64)
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        round_to(part as f64 / whole as f64 * 100.0, 1)
    }
}

/// Counts and hours over a record set.
pub fn attendance_stats(records: &[Attendance]) -> AttendanceStats {
    let total_net: i64 = records
        .iter()
        .filter_map(|record| record.net_minutes)
        .map(i64::from)
        .sum();

    AttendanceStats {
        total_days: records.len(),
        late_days: records.iter().filter(|record| record.is_late).count(),
        total_net_hours: hours(total_net as f64, 2),
        average_net_hours: average_net_minutes(records.iter())
            .map(|avg| hours(avg, 2))
            .unwrap_or(0.0),
    }
}

/// Partitions `employees` into present, late and absent for `date`.
///
/// Present means a record with a clock-in; late is a subset of present.
/// An employee without a clock-in is absent unless `date` falls on one of
/// their weekend days, in which case they are in neither list.
pub fn day_summary(employees: &[EmployeeProfile], records: &[Attendance], date: NaiveDate) -> DaySummary {
    let by_user: HashMap<UserId, &Attendance> = records
        .iter()
        .filter(|record| record.date == date)
        .map(|record| (record.user_id, record))
        .collect();

    let mut present_list = Vec::new();
    let mut absent_list = Vec::new();
    let mut late_list = Vec::new();

    for employee in employees {
        match by_user.get(&employee.id) {
            Some(record) if is_present(record) => {
                present_list.push(EmployeeBrief::from(employee));
                if record.is_late {
                    late_list.push(EmployeeBrief::from(employee));
                }
            }
            _ if employee.is_weekend(date.weekday()) => {}
            _ => absent_list.push(EmployeeBrief::from(employee)),
        }
    }

    DaySummary {
        date,
        total_employees: employees.len(),
        present: present_list.len(),
        absent: absent_list.len(),
        late: late_list.len(),
        all_list: employees.iter().map(EmployeeBrief::from).collect(),
        present_list,
        absent_list,
        late_list,
    }
}

/// Days in the inclusive range that are not the employee's weekend.
pub fn working_days(employee: &EmployeeProfile, start: NaiveDate, end: NaiveDate) -> usize {
    days_in_range(start, end)
        .filter(|day| !employee.is_weekend(day.weekday()))
        .count()
}

/// Working days in range without a clock-in.
pub fn absent_days(employee: &EmployeeProfile, records: &[Attendance], start: NaiveDate, end: NaiveDate) -> usize {
    days_in_range(start, end)
        .filter(|day| !employee.is_weekend(day.weekday()))
        .filter(|day| {
            !records
                .iter()
                .any(|record| record.user_id == employee.id && record.date == *day && is_present(record))
        })
        .count()
}

/// One summary row per employee, in the order given.
pub fn employee_summaries(employees: &[EmployeeProfile], records: &[Attendance]) -> Vec<EmployeeSummary> {
    let mut by_user: HashMap<UserId, Vec<&Attendance>> = HashMap::new();
    for record in records {
        by_user.entry(record.user_id).or_default().push(record);
    }

    employees
        .iter()
        .map(|employee| {
            let own = by_user.get(&employee.id).map(Vec::as_slice).unwrap_or(&[]);
            let attendance_days = own.iter().filter(|record| is_present(record)).count();
            let late_days = own.iter().filter(|record| is_late(record)).count();
            let total_net: i64 = own
                .iter()
                .filter_map(|record| record.net_minutes)
                .map(i64::from)
                .sum();

            EmployeeSummary {
                employee: employee.clone(),
                attendance_days,
                on_time_days: attendance_days - late_days,
                late_days,
                total_hours: hours(total_net as f64, 1),
                avg_hours_per_day: if attendance_days > 0 {
                    hours(total_net as f64 / attendance_days as f64, 1)
                } else {
                    0.0
                },
            }
        })
        .collect()
}

fn ranked_counts<F>(employees: &[EmployeeProfile], records: &[Attendance], limit: usize, counts: F) -> Vec<EmployeeCount>
where
    F: Fn(&Attendance) -> bool,
{
    let mut tally: HashMap<UserId, usize> = HashMap::new();
    for record in records.iter().filter(|record| counts(record)) {
        *tally.entry(record.user_id).or_default() += 1;
    }

    let mut ranked: Vec<EmployeeCount> = employees
        .iter()
        .filter_map(|employee| {
            tally.get(&employee.id).map(|count| EmployeeCount {
                employee: EmployeeBrief::from(employee),
                count: *count,
            })
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.employee.name.cmp(&b.employee.name))
    });
    ranked.truncate(limit);
    ranked
}

/// Employees with the most late arrivals.
pub fn top_late(employees: &[EmployeeProfile], records: &[Attendance], limit: usize) -> Vec<EmployeeCount> {
    ranked_counts(employees, records, limit, is_late)
}

fn in_range(records: &[Attendance], start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = &Attendance> {
    records
        .iter()
        .filter(move |record| record.date >= start && record.date <= end)
}

fn status_breakdown<'a>(records: impl Iterator<Item = &'a Attendance>) -> StatusBreakdown {
    let (present, late) = records.fold((0, 0), |(present, late), record| {
        (
            present + usize::from(is_present(record)),
            late + usize::from(is_late(record)),
        )
    });
    StatusBreakdown {
        on_time: present - late,
        late,
        total_records: present,
    }
}

/// Named set of employees aggregated together.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedGroup {
    pub name: String,
    pub members: Vec<UserId>,
}

/// Groups employees by department name, skipping employees without one.
pub fn group_by_department(employees: &[EmployeeProfile]) -> Vec<NamedGroup> {
    let mut groups: BTreeMap<String, Vec<UserId>> = BTreeMap::new();
    for employee in employees {
        if let Some(name) = employee.department_name.as_ref() {
            groups.entry(name.clone()).or_default().push(employee.id);
        }
    }
    groups
        .into_iter()
        .map(|(name, members)| NamedGroup { name, members })
        .collect()
}

pub fn group_by_sub_department(employees: &[EmployeeProfile]) -> Vec<NamedGroup> {
    let mut groups: BTreeMap<String, Vec<UserId>> = BTreeMap::new();
    for employee in employees {
        if let Some(name) = employee.sub_department_name.as_ref() {
            groups.entry(name.clone()).or_default().push(employee.id);
        }
    }
    groups
        .into_iter()
        .map(|(name, members)| NamedGroup { name, members })
        .collect()
}

/// Present/late/absent per group for one date. Absent is members without a clock-in.
pub fn groups_on_date(groups: &[NamedGroup], records: &[Attendance], date: NaiveDate) -> Vec<GroupAttendance> {
    groups
        .iter()
        .map(|group| {
            let day_records: Vec<&Attendance> = records
                .iter()
                .filter(|record| record.date == date && group.members.contains(&record.user_id))
                .collect();
            let present = day_records.iter().filter(|record| is_present(record)).count();
            let late = day_records.iter().filter(|record| is_late(record)).count();
            let total = group.members.len();
            GroupAttendance {
                name: group.name.clone(),
                total,
                present,
                late,
                absent: total.saturating_sub(present),
                on_time: present - late,
                percentage: percentage(present, total),
            }
        })
        .collect()
}

/// Monthly report overview for `start..=end`.
pub fn report_overview(
    employees: &[EmployeeProfile],
    records: &[Attendance],
    month: u32,
    year: i32,
    start: NaiveDate,
    end: NaiveDate,
) -> ReportOverview {
    let period: Vec<&Attendance> = in_range(records, start, end).collect();
    let breakdown = status_breakdown(period.iter().copied());

    let daily_trend = days_in_range(start, end)
        .map(|day| {
            let on_day = period.iter().filter(|record| record.date == day);
            let summary = status_breakdown(on_day.copied());
            DailyTrendPoint {
                date: day,
                label: day.format("%b %d").to_string(),
                day: day.format("%a").to_string(),
                present: summary.total_records,
                late: summary.late,
            }
        })
        .collect();

    let department_distribution = group_by_department(employees)
        .into_iter()
        .map(|group| {
            let members: Vec<&EmployeeProfile> = employees
                .iter()
                .filter(|employee| group.members.contains(&employee.id))
                .collect();
            let expected: usize = members
                .iter()
                .map(|employee| working_days(employee, start, end))
                .sum();
            let summary = status_breakdown(
                period
                    .iter()
                    .copied()
                    .filter(|record| group.members.contains(&record.user_id)),
            );
            GroupAttendance {
                name: group.name,
                total: members.len(),
                present: summary.total_records,
                late: summary.late,
                absent: expected.saturating_sub(summary.total_records),
                on_time: summary.on_time,
                percentage: percentage(summary.total_records, expected),
            }
        })
        .collect();

    let hours_by_day = [
        Weekday::Sun,
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
    ]
    .into_iter()
    .map(|weekday| NamedHours {
        name: weekday.to_string(),
        hours: average_net_minutes(
            period
                .iter()
                .copied()
                .filter(|record| record.date.weekday() == weekday),
        )
        .map(|avg| hours(avg, 1))
        .unwrap_or(0.0),
    })
    .collect();

    let owned: Vec<Attendance> = period.iter().map(|record| (*record).clone()).collect();

    ReportOverview {
        month,
        year,
        start_date: start,
        end_date: end,
        stats: ReportStats {
            total_employees: employees.len(),
            monthly_present: breakdown.total_records,
            monthly_late: breakdown.late,
            avg_working_hours: average_net_minutes(period.iter().copied())
                .map(|avg| hours(avg, 1))
                .unwrap_or(0.0),
        },
        daily_trend,
        department_distribution,
        status_breakdown: breakdown,
        hours_by_day,
        top_performers: ranked_counts(employees, &owned, TOP_LIST_LIMIT, |record| {
            is_present(record) && !record.is_late
        }),
        needs_attention: ranked_counts(employees, &owned, TOP_LIST_LIMIT, is_late),
    }
}

/// Who the analytics are computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyticsView {
    /// A manager's sub-departments: six months, top five, hours per employee.
    Team,
    /// Everyone: twelve months, top ten, hours per group.
    Company,
}

impl AnalyticsView {
    pub fn trend_months(&self) -> u32 {
        match self {
            AnalyticsView::Team => 6,
            AnalyticsView::Company => 12,
        }
    }

    pub fn top_late_limit(&self) -> usize {
        match self {
            AnalyticsView::Team => 5,
            AnalyticsView::Company => 10,
        }
    }

    /// Earliest date the analytics read; records from here to today are needed.
    pub fn window_start(&self, today: NaiveDate) -> NaiveDate {
        let trend_start = month_start_offset(today, self.trend_months() - 1).unwrap_or(today);
        let year_start = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
        trend_start.min(year_start)
    }
}

/// Present/late per calendar month, oldest first, ending with the month of `today`.
pub fn monthly_trend(records: &[Attendance], today: NaiveDate, months: u32, label_format: &str) -> Vec<TrendPoint> {
    (0..months)
        .rev()
        .filter_map(|back| {
            let first = month_start_offset(today, back)?;
            let (_, last) = month_bounds(first.year(), first.month())?;
            let summary = status_breakdown(in_range(records, first, last));
            Some(TrendPoint {
                label: first.format(label_format).to_string(),
                present: summary.total_records,
                late: summary.late,
            })
        })
        .collect()
}

/// Present/late per calendar week (ending Sunday) of the current month up to `today`.
pub fn weekly_trend(records: &[Attendance], today: NaiveDate) -> Vec<TrendPoint> {
    let mut points = Vec::new();
    let Some(mut start) = NaiveDate::from_ymd_opt(today.year(), today.month(), 1) else {
        return points;
    };
    let mut week = 1;
    while start <= today {
        let days_to_sunday = i64::from(6 - start.weekday().num_days_from_monday());
        let end = (start + Duration::days(days_to_sunday)).min(today);
        let summary = status_breakdown(in_range(records, start, end));
        points.push(TrendPoint {
            label: format!("Week {}", week),
            present: summary.total_records,
            late: summary.late,
        });
        start = end + Duration::days(1);
        week += 1;
    }
    points
}

/// Analytics for `view`. `groups` are sub-departments for a team view and
/// departments for a company view; `records` must cover
/// [`AnalyticsView::window_start`] through `today`.
pub fn analytics(
    view: AnalyticsView,
    employees: &[EmployeeProfile],
    groups: &[NamedGroup],
    records: &[Attendance],
    today: NaiveDate,
) -> AnalyticsResponse {
    let month_start = NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today);
    let year_start = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
    let this_month: Vec<Attendance> = in_range(records, month_start, today).cloned().collect();

    let label_format = match view {
        AnalyticsView::Team => "%b %Y",
        AnalyticsView::Company => "%b",
    };

    let average_hours = match view {
        AnalyticsView::Team => employees
            .iter()
            .filter_map(|employee| {
                average_net_minutes(this_month.iter().filter(|record| record.user_id == employee.id))
                    .map(|avg| NamedHours {
                        name: employee.name.clone(),
                        hours: hours(avg, 1),
                    })
            })
            .collect(),
        AnalyticsView::Company => groups
            .iter()
            .map(|group| NamedHours {
                name: group.name.clone(),
                hours: average_net_minutes(
                    this_month
                        .iter()
                        .filter(|record| group.members.contains(&record.user_id)),
                )
                .map(|avg| hours(avg, 1))
                .unwrap_or(0.0),
            })
            .collect(),
    };

    AnalyticsResponse {
        monthly_trend: monthly_trend(records, today, view.trend_months(), label_format),
        weekly_trend: weekly_trend(records, today),
        status_breakdown: status_breakdown(this_month.iter()),
        year_to_date: status_breakdown(in_range(records, year_start, today)),
        top_late: top_late(employees, &this_month, view.top_late_limit()),
        average_hours,
        groups_today: groups_on_date(groups, records, today),
    }
}
