//! Lateness, worked time and override planning against an office schedule.
//!
//! Nothing here touches the clock or the database: callers pass the policy,
//! the current wall-clock time and the stored record.

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};

use crate::config::AttendancePolicy;
use crate::error::AttendanceError;
use crate::models::attendance::{Attendance, AttendanceStatus};
use crate::utils::time::minutes_between;

const AUDIT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn office_start_at(policy: &AttendancePolicy, date: NaiveDate) -> NaiveDateTime {
    date.and_time(policy.office_start)
}

pub fn office_end_at(policy: &AttendancePolicy, date: NaiveDate) -> NaiveDateTime {
    date.and_time(policy.office_end)
}

/// Latest clock-in on `date` that still counts as on time.
pub fn late_threshold(policy: &AttendancePolicy, date: NaiveDate) -> NaiveDateTime {
    office_start_at(policy, date) + Duration::minutes(policy.late_grace_minutes)
}

/// Drops sub-second precision so stored and audited values agree.
pub fn truncate_to_second(value: NaiveDateTime) -> NaiveDateTime {
    value.with_nanosecond(0).unwrap_or(value)
}

fn clamp_minutes(minutes: i64) -> i32 {
    minutes.clamp(0, i64::from(i32::MAX)) as i32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lateness {
    pub is_late: bool,
    /// Minutes after office start (not after the grace period); zero when on time.
    pub late_minutes: i32,
}

pub fn assess_lateness(policy: &AttendancePolicy, date: NaiveDate, clock_in: NaiveDateTime) -> Lateness {
    if clock_in > late_threshold(policy, date) {
        Lateness {
            is_late: true,
            late_minutes: clamp_minutes(minutes_between(office_start_at(policy, date), clock_in)),
        }
    } else {
        Lateness {
            is_late: false,
            late_minutes: 0,
        }
    }
}

/// Minutes left before office end at clock-out; zero at or after office end.
pub fn early_exit_minutes(policy: &AttendancePolicy, date: NaiveDate, clock_out: NaiveDateTime) -> i32 {
    let end = office_end_at(policy, date);
    if clock_out < end {
        clamp_minutes(minutes_between(clock_out, end))
    } else {
        0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkedMinutes {
    pub gross: i32,
    pub net: i32,
}

pub fn worked_minutes(clock_in: NaiveDateTime, clock_out: NaiveDateTime, break_minutes: i32) -> WorkedMinutes {
    let gross = clamp_minutes(minutes_between(clock_in, clock_out));
    WorkedMinutes {
        gross,
        net: (gross - break_minutes.max(0)).max(0),
    }
}

/// Values written by a clock-in.
#[derive(Debug, Clone, PartialEq)]
pub struct ClockInPlan {
    pub date: NaiveDate,
    pub clock_in: NaiveDateTime,
    pub lateness: Lateness,
    pub break_minutes: i32,
    pub status: AttendanceStatus,
}

/// Plans a clock-in at `now`. A clock-in on one of the employee's weekend
/// days is still recorded, with status `weekend`.
pub fn plan_clock_in(policy: &AttendancePolicy, now: NaiveDateTime, on_weekend: bool) -> ClockInPlan {
    let clock_in = truncate_to_second(now);
    let date = clock_in.date();
    ClockInPlan {
        date,
        clock_in,
        lateness: assess_lateness(policy, date, clock_in),
        break_minutes: policy.default_break_minutes,
        status: if on_weekend {
            AttendanceStatus::Weekend
        } else {
            AttendanceStatus::Present
        },
    }
}

/// Values written by a clock-out.
#[derive(Debug, Clone, PartialEq)]
pub struct ClockOutPlan {
    pub clock_out: NaiveDateTime,
    pub worked: WorkedMinutes,
    pub early_exit_minutes: i32,
}

/// Checks today's record and plans a clock-out at `now`.
pub fn plan_clock_out(
    policy: &AttendancePolicy,
    today: Option<&Attendance>,
    now: NaiveDateTime,
) -> Result<ClockOutPlan, AttendanceError> {
    let record = today.ok_or(AttendanceError::NotClockedIn)?;
    let clock_in = record.clock_in.ok_or(AttendanceError::NotClockedIn)?;
    if record.clock_out.is_some() {
        return Err(AttendanceError::AlreadyClockedOut);
    }

    // Same-second clock-outs and wall-clock regressions (DST fall-back) close
    // the record at the clock-in time with zero worked minutes.
    let clock_out = truncate_to_second(now).max(clock_in);

    Ok(ClockOutPlan {
        clock_out,
        worked: worked_minutes(clock_in, clock_out, record.break_minutes),
        early_exit_minutes: early_exit_minutes(policy, record.date, clock_out),
    })
}

/// Fields an administrator may correct. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttendanceChanges {
    pub clock_in: Option<NaiveDateTime>,
    pub clock_out: Option<NaiveDateTime>,
    pub break_minutes: Option<i32>,
    pub is_late: Option<bool>,
}

impl AttendanceChanges {
    pub fn is_empty(&self) -> bool {
        self.clock_in.is_none()
            && self.clock_out.is_none()
            && self.break_minutes.is_none()
            && self.is_late.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideField {
    ClockIn,
    ClockOut,
    BreakMinutes,
    IsLate,
}

impl OverrideField {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverrideField::ClockIn => "clock_in",
            OverrideField::ClockOut => "clock_out",
            OverrideField::BreakMinutes => "break_minutes",
            OverrideField::IsLate => "is_late",
        }
    }
}

/// One editable field whose stored value changes, in audit form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: OverrideField,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverridePlan {
    /// The record as it will be stored.
    pub updated: Attendance,
    /// Empty when the request matches what is already stored.
    pub changes: Vec<FieldChange>,
}

impl OverridePlan {
    pub fn is_noop(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Merges `changes` into `current` and recomputes the derived columns.
///
/// Worked minutes follow any change to the times or the break. Lateness is
/// reassessed against the record's own date when clock-in moves; otherwise an
/// explicit `is_late` is taken as given. Status is never touched.
pub fn plan_override(
    policy: &AttendancePolicy,
    current: &Attendance,
    changes: &AttendanceChanges,
) -> Result<OverridePlan, AttendanceError> {
    if changes.is_empty() {
        return Err(AttendanceError::NothingToOverride);
    }

    let mut updated = current.clone();
    if let Some(clock_in) = changes.clock_in {
        updated.clock_in = Some(truncate_to_second(clock_in));
    }
    if let Some(clock_out) = changes.clock_out {
        updated.clock_out = Some(truncate_to_second(clock_out));
    }
    if let Some(break_minutes) = changes.break_minutes {
        updated.break_minutes = break_minutes;
    }

    match (updated.clock_in, updated.clock_out) {
        (Some(clock_in), Some(clock_out)) if clock_out <= clock_in => {
            return Err(AttendanceError::ClockOutBeforeClockIn);
        }
        (None, Some(_)) => return Err(AttendanceError::NotClockedIn),
        _ => {}
    }

    let clock_in_changed = updated.clock_in != current.clock_in;
    let clock_out_changed = updated.clock_out != current.clock_out;
    let break_changed = updated.break_minutes != current.break_minutes;

    if clock_in_changed || clock_out_changed || break_changed {
        if let (Some(clock_in), Some(clock_out)) = (updated.clock_in, updated.clock_out) {
            let worked = worked_minutes(clock_in, clock_out, updated.break_minutes);
            updated.gross_minutes = Some(worked.gross);
            updated.net_minutes = Some(worked.net);
        }
    }

    match (clock_in_changed, updated.clock_in, changes.is_late) {
        (true, Some(clock_in), _) => {
            let lateness = assess_lateness(policy, updated.date, clock_in);
            updated.is_late = lateness.is_late;
            updated.late_minutes = lateness.late_minutes;
        }
        (_, _, Some(is_late)) => {
            updated.is_late = is_late;
            if !is_late {
                updated.late_minutes = 0;
            }
        }
        _ => {}
    }

    if clock_out_changed {
        if let Some(clock_out) = updated.clock_out {
            updated.early_exit_minutes = early_exit_minutes(policy, updated.date, clock_out);
        }
    }

    let changes = diff_editable_fields(current, &updated);
    if changes.is_empty() {
        return Ok(OverridePlan {
            updated: current.clone(),
            changes,
        });
    }

    Ok(OverridePlan { updated, changes })
}

fn diff_editable_fields(before: &Attendance, after: &Attendance) -> Vec<FieldChange> {
    let pairs = [
        (
            OverrideField::ClockIn,
            timestamp_value(before.clock_in),
            timestamp_value(after.clock_in),
        ),
        (
            OverrideField::ClockOut,
            timestamp_value(before.clock_out),
            timestamp_value(after.clock_out),
        ),
        (
            OverrideField::BreakMinutes,
            Some(before.break_minutes.to_string()),
            Some(after.break_minutes.to_string()),
        ),
        (
            OverrideField::IsLate,
            Some(before.is_late.to_string()),
            Some(after.is_late.to_string()),
        ),
    ];

    pairs
        .into_iter()
        .filter(|(_, old_value, new_value)| old_value != new_value)
        .map(|(field, old_value, new_value)| FieldChange {
            field,
            old_value,
            new_value,
        })
        .collect()
}

fn timestamp_value(value: Option<NaiveDateTime>) -> Option<String> {
    value.map(|ts| ts.format(AUDIT_TIMESTAMP_FORMAT).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AttendanceId, UserId};
    use chrono::Utc;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 6).unwrap()
    }

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        day().and_hms_opt(h, m, s).unwrap()
    }

    fn policy() -> AttendancePolicy {
        AttendancePolicy::default()
    }

    fn record(clock_in: Option<NaiveDateTime>, clock_out: Option<NaiveDateTime>) -> Attendance {
        let mut attendance = Attendance {
            id: AttendanceId::new(),
            user_id: UserId::new(),
            date: day(),
            clock_in,
            clock_out,
            gross_minutes: None,
            break_minutes: 60,
            net_minutes: None,
            is_late: false,
            late_minutes: 0,
            early_exit_minutes: 0,
            status: AttendanceStatus::Present,
            clock_in_ip: None,
            clock_out_ip: None,
            clock_in_user_agent: None,
            clock_out_user_agent: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        if let Some(clock_in) = clock_in {
            let lateness = assess_lateness(&policy(), day(), clock_in);
            attendance.is_late = lateness.is_late;
            attendance.late_minutes = lateness.late_minutes;
        }
        if let (Some(clock_in), Some(clock_out)) = (clock_in, clock_out) {
            let worked = worked_minutes(clock_in, clock_out, 60);
            attendance.gross_minutes = Some(worked.gross);
            attendance.net_minutes = Some(worked.net);
        }
        attendance
    }

    #[test]
    fn grace_period_boundary_is_exclusive() {
        let p = policy();
        assert!(!assess_lateness(&p, day(), at(9, 14, 0)).is_late);
        assert!(!assess_lateness(&p, day(), at(9, 15, 0)).is_late);

        let late = assess_lateness(&p, day(), at(9, 16, 0));
        assert!(late.is_late);
        assert_eq!(late.late_minutes, 16);
    }

    #[test]
    fn seconds_past_the_threshold_count_as_late() {
        let late = assess_lateness(&policy(), day(), at(9, 15, 30));
        assert!(late.is_late);
        assert_eq!(late.late_minutes, 15);
    }

    #[test]
    fn worked_minutes_subtracts_break_and_never_goes_negative() {
        let worked = worked_minutes(at(8, 50, 0), at(18, 10, 0), 60);
        assert_eq!(worked, WorkedMinutes { gross: 560, net: 500 });

        let short = worked_minutes(at(9, 0, 0), at(9, 30, 0), 60);
        assert_eq!(short, WorkedMinutes { gross: 30, net: 0 });
    }

    #[test]
    fn early_exit_counts_minutes_before_office_end() {
        let p = policy();
        assert_eq!(early_exit_minutes(&p, day(), at(17, 30, 0)), 30);
        assert_eq!(early_exit_minutes(&p, day(), at(18, 0, 0)), 0);
        assert_eq!(early_exit_minutes(&p, day(), at(19, 5, 0)), 0);
    }

    #[test]
    fn clock_in_on_weekend_is_recorded_with_weekend_status() {
        let plan = plan_clock_in(&policy(), at(10, 0, 0), true);
        assert_eq!(plan.status, AttendanceStatus::Weekend);
        assert_eq!(plan.break_minutes, 60);
        assert!(plan.lateness.is_late);

        let weekday = plan_clock_in(&policy(), at(8, 59, 59), false);
        assert_eq!(weekday.status, AttendanceStatus::Present);
        assert_eq!(weekday.date, day());
    }

    #[test]
    fn clock_in_drops_sub_second_precision() {
        let now = at(9, 0, 0) + Duration::milliseconds(750);
        let plan = plan_clock_in(&policy(), now, false);
        assert_eq!(plan.clock_in, at(9, 0, 0));
    }

    #[test]
    fn clock_out_requires_an_open_clock_in() {
        let p = policy();
        assert_eq!(
            plan_clock_out(&p, None, at(18, 0, 0)),
            Err(AttendanceError::NotClockedIn)
        );

        let closed = record(Some(at(9, 0, 0)), Some(at(17, 0, 0)));
        assert_eq!(
            plan_clock_out(&p, Some(&closed), at(18, 0, 0)),
            Err(AttendanceError::AlreadyClockedOut)
        );

    }

    #[test]
    fn clock_out_in_the_clock_in_second_records_zero_minutes() {
        let p = policy();
        let open = record(Some(at(9, 0, 0)), None);
        let same_second = at(9, 0, 0) + Duration::milliseconds(900);

        let plan = plan_clock_out(&p, Some(&open), same_second).unwrap();
        assert_eq!(plan.clock_out, at(9, 0, 0));
        assert_eq!(plan.worked, WorkedMinutes { gross: 0, net: 0 });

        let wall_clock_went_back = plan_clock_out(&p, Some(&open), at(8, 30, 0)).unwrap();
        assert_eq!(wall_clock_went_back.clock_out, at(9, 0, 0));
        assert_eq!(wall_clock_went_back.worked.gross, 0);
    }

    #[test]
    fn clock_out_computes_worked_and_early_exit() {
        let open = record(Some(at(8, 50, 0)), None);
        let plan = plan_clock_out(&policy(), Some(&open), at(17, 40, 0)).unwrap();
        assert_eq!(plan.worked.gross, 530);
        assert_eq!(plan.worked.net, 470);
        assert_eq!(plan.early_exit_minutes, 20);
    }

    #[test]
    fn override_requires_at_least_one_field() {
        let current = record(Some(at(9, 0, 0)), Some(at(18, 0, 0)));
        assert_eq!(
            plan_override(&policy(), &current, &AttendanceChanges::default()),
            Err(AttendanceError::NothingToOverride)
        );
    }

    #[test]
    fn break_only_override_keeps_lateness() {
        let current = record(Some(at(9, 40, 0)), Some(at(18, 0, 0)));
        assert!(current.is_late);

        let plan = plan_override(
            &policy(),
            &current,
            &AttendanceChanges {
                break_minutes: Some(30),
                ..Default::default()
            },
        )
        .unwrap();

        assert!(plan.updated.is_late);
        assert_eq!(plan.updated.late_minutes, 40);
        assert_eq!(plan.updated.gross_minutes, Some(500));
        assert_eq!(plan.updated.net_minutes, Some(470));
        assert_eq!(plan.changes.len(), 1);
        assert_eq!(plan.changes[0].field, OverrideField::BreakMinutes);
        assert_eq!(plan.changes[0].old_value.as_deref(), Some("60"));
        assert_eq!(plan.changes[0].new_value.as_deref(), Some("30"));
    }

    #[test]
    fn moving_clock_in_reassesses_lateness_against_the_record_date() {
        let current = record(Some(at(9, 40, 0)), Some(at(18, 0, 0)));
        let plan = plan_override(
            &policy(),
            &current,
            &AttendanceChanges {
                clock_in: Some(at(9, 5, 0)),
                ..Default::default()
            },
        )
        .unwrap();

        assert!(!plan.updated.is_late);
        assert_eq!(plan.updated.late_minutes, 0);
        assert_eq!(plan.updated.gross_minutes, Some(535));
        assert_eq!(plan.updated.status, AttendanceStatus::Present);

        let fields: Vec<_> = plan.changes.iter().map(|c| c.field).collect();
        assert_eq!(fields, vec![OverrideField::ClockIn, OverrideField::IsLate]);
        assert_eq!(plan.changes[0].old_value.as_deref(), Some("2024-05-06 09:40:00"));
        assert_eq!(plan.changes[0].new_value.as_deref(), Some("2024-05-06 09:05:00"));
        assert_eq!(plan.changes[1].old_value.as_deref(), Some("true"));
        assert_eq!(plan.changes[1].new_value.as_deref(), Some("false"));
    }

    #[test]
    fn explicit_on_time_flag_clears_late_minutes() {
        let current = record(Some(at(9, 40, 0)), None);
        let plan = plan_override(
            &policy(),
            &current,
            &AttendanceChanges {
                is_late: Some(false),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(!plan.updated.is_late);
        assert_eq!(plan.updated.late_minutes, 0);
        assert_eq!(plan.updated.gross_minutes, None);
    }

    #[test]
    fn setting_clock_out_on_an_open_record_fills_worked_time() {
        let current = record(Some(at(9, 0, 0)), None);
        let plan = plan_override(
            &policy(),
            &current,
            &AttendanceChanges {
                clock_out: Some(at(17, 0, 0)),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(plan.updated.net_minutes, Some(420));
        assert_eq!(plan.updated.early_exit_minutes, 60);
        assert_eq!(plan.changes[0].old_value, None);
    }

    #[test]
    fn override_rejects_inverted_times_after_merging() {
        let current = record(Some(at(9, 0, 0)), Some(at(18, 0, 0)));
        let result = plan_override(
            &policy(),
            &current,
            &AttendanceChanges {
                clock_in: Some(at(18, 30, 0)),
                ..Default::default()
            },
        );
        assert_eq!(result, Err(AttendanceError::ClockOutBeforeClockIn));
    }

    #[test]
    fn override_matching_stored_values_is_a_noop() {
        let current = record(Some(at(9, 0, 0)), Some(at(18, 0, 0)));
        let plan = plan_override(
            &policy(),
            &current,
            &AttendanceChanges {
                clock_in: Some(at(9, 0, 0)),
                break_minutes: Some(60),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(plan.is_noop());
        assert_eq!(plan.updated, current);
    }
}
