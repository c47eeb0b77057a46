use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use strum_macros::{AsRefStr, Display, EnumString, EnumVariantNames};
use utoipa::ToSchema;

/// Daily attendance outcome. Stored as upper-case strings in the
/// `attendance.status` column.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, EnumString, EnumVariantNames, AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    HalfDay,
    OnLeave,
}

/// One canonical record per (employee_id, date); the pair is UNIQUE at the
/// store level.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Attendance {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 1)]
    pub employee_id: u64,

    #[schema(example = "2024-01-15", value_type = String, format = "date")]
    pub date: NaiveDate,

    #[schema(example = "2024-01-15T09:05:00", value_type = String, nullable = true)]
    pub check_in: Option<NaiveDateTime>,

    #[schema(example = "2024-01-15T18:00:00", value_type = String, nullable = true)]
    pub check_out: Option<NaiveDateTime>,

    #[schema(example = "2024-01-15T13:00:00", value_type = String, nullable = true)]
    pub break_start: Option<NaiveDateTime>,

    #[schema(example = "2024-01-15T13:30:00", value_type = String, nullable = true)]
    pub break_end: Option<NaiveDateTime>,

    #[schema(example = "PRESENT")]
    pub status: String,

    #[schema(example = "Worked from office", nullable = true)]
    pub notes: Option<String>,

    #[schema(example = "2024-01-15T09:05:11Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,

    #[schema(example = "2024-01-15T18:00:42Z", format = "date-time", value_type = String)]
    pub updated_at: DateTime<Utc>,
}

/// Raw submission payload for `POST /attendance`. Date, timestamp and status
/// fields arrive as strings so parse failures can name the offending field
/// instead of dying inside the JSON extractor.
#[derive(Debug, Deserialize, ToSchema)]
pub struct MarkAttendance {
    #[schema(example = 1)]
    pub employee_id: u64,

    #[schema(example = "2024-01-15", nullable = true)]
    pub date: Option<String>,

    #[schema(example = "2024-01-15T09:05:00", nullable = true)]
    pub check_in: Option<String>,

    #[schema(example = "2024-01-15T18:00:00", nullable = true)]
    pub check_out: Option<String>,

    #[schema(example = "2024-01-15T13:00:00", nullable = true)]
    pub break_start: Option<String>,

    #[schema(example = "2024-01-15T13:30:00", nullable = true)]
    pub break_end: Option<String>,

    #[schema(example = "PRESENT", nullable = true)]
    pub status: Option<String>,

    /// Omitted: keep the stored note. Null or blank: clear it.
    #[serde(default, deserialize_with = "deserialize_double_option")]
    #[schema(example = "Worked from office", value_type = Option<String>, nullable = true)]
    pub notes: Option<Option<String>>,
}

/// Deserialize a present field (including explicit JSON `null`) as
/// `Some(inner)`, leaving an omitted field as `None` via `#[serde(default)]`.
/// Distinguishes "field absent" from "field set to null".
fn deserialize_double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::VariantNames;

    #[test]
    fn attendance_status_round_trips_screaming_snake_case() {
        assert_eq!(AttendanceStatus::HalfDay.to_string(), "HALF_DAY");
        assert_eq!(
            AttendanceStatus::from_str("ON_LEAVE").unwrap(),
            AttendanceStatus::OnLeave
        );
        assert!(AttendanceStatus::from_str("half_day").is_err());
    }

    #[test]
    fn attendance_status_variant_list() {
        assert_eq!(
            AttendanceStatus::VARIANTS,
            &["PRESENT", "ABSENT", "LATE", "HALF_DAY", "ON_LEAVE"]
        );
    }

    #[test]
    fn mark_attendance_distinguishes_missing_notes_from_null() {
        let omitted: MarkAttendance =
            serde_json::from_str(r#"{"employee_id": 1}"#).unwrap();
        assert_eq!(omitted.notes, None);

        let cleared: MarkAttendance =
            serde_json::from_str(r#"{"employee_id": 1, "notes": null}"#).unwrap();
        assert_eq!(cleared.notes, Some(None));

        let set: MarkAttendance =
            serde_json::from_str(r#"{"employee_id": 1, "notes": "wfh"}"#).unwrap();
        assert_eq!(set.notes, Some(Some("wfh".to_string())));
    }
}
