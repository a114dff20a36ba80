use std::collections::BTreeMap;

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    config::{AttendancePolicy, WEEKEND_PRESETS},
    state::AppState,
    utils::time::weekday_name,
};

#[derive(Debug, Serialize, ToSchema, PartialEq)]
pub struct AttendanceConfigResponse {
    pub office_start_time: String,
    pub office_end_time: String,
    pub late_grace_minutes: i64,
    pub default_break_minutes: i32,
    pub default_weekend_days: Vec<String>,
    pub weekend_options: BTreeMap<String, Vec<String>>,
    pub time_zone: String,
}

impl AttendanceConfigResponse {
    pub fn from_policy(policy: &AttendancePolicy, time_zone: String) -> Self {
        let weekend_options = WEEKEND_PRESETS
            .iter()
            .map(|(name, days)| {
                let days = days.iter().map(|day| weekday_name(*day).to_string()).collect();
                (name.to_string(), days)
            })
            .collect();

        Self {
            office_start_time: policy.office_start.format("%H:%M").to_string(),
            office_end_time: policy.office_end.format("%H:%M").to_string(),
            late_grace_minutes: policy.late_grace_minutes,
            default_break_minutes: policy.default_break_minutes,
            default_weekend_days: policy.default_weekend_names(),
            weekend_options,
            time_zone,
        }
    }
}

pub async fn attendance_config(State(state): State<AppState>) -> Json<AttendanceConfigResponse> {
    Json(AttendanceConfigResponse::from_policy(
        &state.config.attendance,
        state.config.time_zone.to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_maps_to_the_documented_values() {
        let response = AttendanceConfigResponse::from_policy(&AttendancePolicy::default(), "UTC".into());
        assert_eq!(response.office_start_time, "09:00");
        assert_eq!(response.office_end_time, "18:00");
        assert_eq!(response.late_grace_minutes, 15);
        assert_eq!(response.default_break_minutes, 60);
        assert_eq!(response.default_weekend_days, vec!["saturday", "sunday"]);
        assert_eq!(response.weekend_options["fri_sat"], vec!["friday", "saturday"]);
        assert_eq!(response.weekend_options["sun_only"], vec!["sunday"]);
        assert_eq!(response.weekend_options.len(), 5);
    }
}
