//! Turns a raw attendance submission into a canonical record: parsing and
//! ordering validation, status inference for first-time submissions, and the
//! field-level merge applied when a record already exists for the
//! (employee, day) key. Everything here is pure; handlers own the I/O.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use strum::VariantNames;

use crate::error::ApiError;
use crate::model::attendance::{Attendance, AttendanceStatus, MarkAttendance};

/// Check-ins strictly later than this wall-clock time are inferred LATE.
fn late_threshold() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 30, 0).unwrap()
}

/// A submission after parsing and ordering validation. Timestamp fields keep
/// their supplied/absent distinction; `notes` keeps a second level so
/// "omitted" and "supplied but blank" stay separate.
#[derive(Debug)]
pub struct Submission {
    pub employee_id: u64,
    pub date: NaiveDate,
    pub check_in: Option<NaiveDateTime>,
    pub check_out: Option<NaiveDateTime>,
    pub break_start: Option<NaiveDateTime>,
    pub break_end: Option<NaiveDateTime>,
    pub status: Option<AttendanceStatus>,
    pub notes: Option<Option<String>>,
}

/// Column values to persist, either as a fresh INSERT or as a full-column
/// UPDATE of merged state.
#[derive(Debug, PartialEq)]
pub struct AttendanceUpdate {
    pub check_in: Option<NaiveDateTime>,
    pub check_out: Option<NaiveDateTime>,
    pub break_start: Option<NaiveDateTime>,
    pub break_end: Option<NaiveDateTime>,
    pub status: String,
    pub notes: Option<String>,
}

/// Validate and normalize a raw submission. `today` is injected by the
/// caller so date defaulting stays deterministic under test.
pub fn validate_submission(
    raw: &MarkAttendance,
    today: NaiveDate,
) -> Result<Submission, ApiError> {
    let date = match raw.date.as_deref() {
        Some(value) => parse_day(value).ok_or_else(|| {
            ApiError::validation("Invalid date format. Use ISO 8601 format (YYYY-MM-DD)")
        })?,
        None => today,
    };

    let check_in = parse_timestamp_field("check_in", raw.check_in.as_deref())?;
    let check_out = parse_timestamp_field("check_out", raw.check_out.as_deref())?;
    let break_start = parse_timestamp_field("break_start", raw.break_start.as_deref())?;
    let break_end = parse_timestamp_field("break_end", raw.break_end.as_deref())?;

    let status = match raw.status.as_deref() {
        Some(value) => Some(AttendanceStatus::from_str(value).map_err(|_| {
            ApiError::validation(format!(
                "Invalid status. Must be one of: {}",
                AttendanceStatus::VARIANTS.join(", ")
            ))
        })?),
        None => None,
    };

    check_ordering(check_in, check_out, break_start, break_end)?;

    // Outer level: was the field supplied at all. Inner level: a trimmed
    // note, or a clear when the supplied value was null/blank.
    let notes = raw.notes.as_ref().map(|supplied| {
        supplied
            .as_deref()
            .map(str::trim)
            .filter(|trimmed| !trimmed.is_empty())
            .map(String::from)
    });

    Ok(Submission {
        employee_id: raw.employee_id,
        date,
        check_in,
        check_out,
        break_start,
        break_end,
        status,
        notes,
    })
}

/// Ordering rules run only over the fields actually supplied; a partial
/// submission never compares against an absent bound.
fn check_ordering(
    check_in: Option<NaiveDateTime>,
    check_out: Option<NaiveDateTime>,
    break_start: Option<NaiveDateTime>,
    break_end: Option<NaiveDateTime>,
) -> Result<(), ApiError> {
    if let (Some(ci), Some(co)) = (check_in, check_out) {
        if co <= ci {
            return Err(ApiError::validation(
                "Check-out time must be after check-in time",
            ));
        }
    }

    if let (Some(bs), Some(ci)) = (break_start, check_in) {
        if bs < ci {
            return Err(ApiError::validation(
                "Break start time must be after check-in time",
            ));
        }
    }

    if let (Some(be), Some(bs)) = (break_end, break_start) {
        if be <= bs {
            return Err(ApiError::validation(
                "Break end time must be after break start time",
            ));
        }
    }

    if let (Some(be), Some(co)) = (break_end, check_out) {
        if be > co {
            return Err(ApiError::validation(
                "Break end time must be before check-out time",
            ));
        }
    }

    Ok(())
}

/// Status for a first-time record. An explicit status always wins; otherwise
/// PRESENT, bumped to LATE when the check-in lands strictly after 09:30 on
/// its own calendar day. Amends never re-infer.
pub fn resolve_new_status(
    explicit: Option<AttendanceStatus>,
    check_in: Option<NaiveDateTime>,
) -> AttendanceStatus {
    if let Some(status) = explicit {
        return status;
    }

    match check_in {
        Some(ts) if ts.time() > late_threshold() => AttendanceStatus::Late,
        _ => AttendanceStatus::Present,
    }
}

/// Column values for a fresh record.
pub fn new_record(submission: &Submission) -> AttendanceUpdate {
    AttendanceUpdate {
        check_in: submission.check_in,
        check_out: submission.check_out,
        break_start: submission.break_start,
        break_end: submission.break_end,
        status: resolve_new_status(submission.status, submission.check_in).to_string(),
        notes: submission.notes.clone().flatten(),
    }
}

/// Field-level merge into an existing record: supplied fields replace,
/// absent fields keep the stored value. Merging identical input is
/// idempotent by construction.
pub fn merge(existing: &Attendance, submission: &Submission) -> AttendanceUpdate {
    AttendanceUpdate {
        check_in: submission.check_in.or(existing.check_in),
        check_out: submission.check_out.or(existing.check_out),
        break_start: submission.break_start.or(existing.break_start),
        break_end: submission.break_end.or(existing.break_end),
        status: submission
            .status
            .map(|status| status.to_string())
            .unwrap_or_else(|| existing.status.clone()),
        notes: match &submission.notes {
            Some(supplied) => supplied.clone(),
            None => existing.notes.clone(),
        },
    }
}

fn parse_timestamp_field(
    field: &str,
    value: Option<&str>,
) -> Result<Option<NaiveDateTime>, ApiError> {
    match value {
        Some(raw) => parse_instant(raw).map(Some).ok_or_else(|| {
            ApiError::validation(format!("Invalid {field} format. Use ISO 8601 format"))
        }),
        None => Ok(None),
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Accepts RFC 3339 (offset kept as submitted wall-clock) and the common
/// offset-less ISO 8601 shapes.
fn parse_instant(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
}

/// A day key: plain date, or any parsable instant with the time-of-day
/// discarded. Also used by the range query for its window bounds.
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_instant(raw).map(|dt| dt.date()))
}
