//! Derived working-hours and break-duration, computed on the read path and
//! never persisted.

use chrono::NaiveDateTime;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedMetrics {
    pub working_hours: Option<f64>,
    pub break_duration: Option<f64>,
}

/// Both punches present: working hours is the span, minus the break window
/// when both break bounds are present too. Values are rounded to two
/// decimals and deliberately not clamped; a misordered span that slipped
/// past validation surfaces as a negative number rather than being hidden.
pub fn derive_metrics(
    check_in: Option<NaiveDateTime>,
    check_out: Option<NaiveDateTime>,
    break_start: Option<NaiveDateTime>,
    break_end: Option<NaiveDateTime>,
) -> DerivedMetrics {
    let (Some(start), Some(end)) = (check_in, check_out) else {
        return DerivedMetrics {
            working_hours: None,
            break_duration: None,
        };
    };

    let mut working_hours = hours_between(start, end);

    let break_duration = match (break_start, break_end) {
        (Some(from), Some(to)) => {
            let duration = hours_between(from, to);
            working_hours -= duration;
            Some(round2(duration))
        }
        _ => None,
    };

    DerivedMetrics {
        working_hours: Some(round2(working_hours)),
        break_duration,
    }
}

fn hours_between(from: NaiveDateTime, to: NaiveDateTime) -> f64 {
    (to - from).num_milliseconds() as f64 / 3_600_000.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(hour: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(hour, min, 0)
            .unwrap()
    }

    #[test]
    fn full_day_with_break() {
        let metrics = derive_metrics(
            Some(ts(9, 0)),
            Some(ts(18, 0)),
            Some(ts(13, 0)),
            Some(ts(13, 30)),
        );
        assert_eq!(metrics.working_hours, Some(8.5));
        assert_eq!(metrics.break_duration, Some(0.5));
    }

    #[test]
    fn no_checkout_means_no_metrics() {
        let metrics = derive_metrics(Some(ts(9, 0)), None, Some(ts(13, 0)), Some(ts(13, 30)));
        assert_eq!(metrics.working_hours, None);
        assert_eq!(metrics.break_duration, None);
    }

    #[test]
    fn partial_break_is_ignored() {
        let metrics = derive_metrics(Some(ts(9, 0)), Some(ts(17, 0)), Some(ts(13, 0)), None);
        assert_eq!(metrics.working_hours, Some(8.0));
        assert_eq!(metrics.break_duration, None);
    }

    #[test]
    fn rounds_to_two_decimals() {
        let metrics = derive_metrics(Some(ts(9, 0)), Some(ts(17, 20)), None, None);
        assert_eq!(metrics.working_hours, Some(8.33));
    }

    #[test]
    fn negative_span_is_preserved_unclamped() {
        // Only reachable when upstream validation is bypassed; the value
        // must come back as computed.
        let metrics = derive_metrics(Some(ts(18, 0)), Some(ts(9, 0)), None, None);
        assert_eq!(metrics.working_hours, Some(-9.0));
    }

    #[test]
    fn zero_span_is_zero_not_absent() {
        let metrics = derive_metrics(Some(ts(9, 0)), Some(ts(9, 0)), None, None);
        assert_eq!(metrics.working_hours, Some(0.0));
    }
}
