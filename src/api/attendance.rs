use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use std::str::FromStr;
use strum::VariantNames;
use utoipa::{IntoParams, ToSchema};

use crate::api::{Pagination, build_pagination};
use crate::db::is_duplicate_key;
use crate::error::ApiError;
use crate::model::attendance::{Attendance, AttendanceStatus, MarkAttendance};
use crate::model::employee::{Employee, EmployeeSummary};
use crate::service::metrics::derive_metrics;
use crate::service::reconcile;

#[derive(Serialize, ToSchema)]
pub struct AttendanceDetail {
    pub record: Attendance,
    pub employee: EmployeeSummary,
}

#[derive(Serialize, ToSchema)]
pub struct MarkAttendanceResponse {
    pub success: bool,
    #[schema(example = "Attendance marked successfully")]
    pub message: String,
    pub data: AttendanceDetail,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct AttendanceQuery {
    /// Window start, inclusive of the whole day
    #[schema(example = "2024-01-01")]
    pub start_date: Option<String>,
    /// Window end, inclusive of the whole day
    #[schema(example = "2024-01-31")]
    pub end_date: Option<String>,
    /// Filter by attendance status
    #[schema(example = "PRESENT")]
    pub status: Option<String>,
    /// Pagination page number (start with 1)
    #[schema(example = 1)]
    pub page: Option<u32>,
    /// Records per page, at most 100
    #[schema(example = 30)]
    pub limit: Option<u32>,
}

/// A record annotated with derived metrics for the read path. Working hours
/// and break duration are computed per response, never persisted.
#[derive(Serialize, ToSchema)]
pub struct AttendanceWithMetrics {
    pub id: u64,
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
    #[schema(example = 8.5, nullable = true)]
    pub working_hours: Option<f64>,
    #[schema(example = 0.5, nullable = true)]
    pub break_duration: Option<f64>,
}

impl From<Attendance> for AttendanceWithMetrics {
    fn from(record: Attendance) -> Self {
        let metrics = derive_metrics(
            record.check_in,
            record.check_out,
            record.break_start,
            record.break_end,
        );

        Self {
            id: record.id,
            date: record.date,
            check_in: record.check_in,
            check_out: record.check_out,
            break_start: record.break_start,
            break_end: record.break_end,
            status: record.status,
            notes: record.notes,
            created_at: record.created_at,
            updated_at: record.updated_at,
            working_hours: metrics.working_hours,
            break_duration: metrics.break_duration,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceListData {
    pub employee: EmployeeSummary,
    pub attendances: Vec<AttendanceWithMetrics>,
    pub pagination: Pagination,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceListResponse {
    pub success: bool,
    pub data: AttendanceListData,
}

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    Str(String),
    Date(NaiveDate),
}

#[derive(Debug, PartialEq)]
struct RangeFilter {
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    status: Option<AttendanceStatus>,
    page: u32,
    limit: u32,
}

fn validate_range_query(query: &AttendanceQuery) -> Result<RangeFilter, ApiError> {
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(30);

    if page < 1 || limit < 1 {
        return Err(ApiError::validation(
            "Page and limit must be positive integers",
        ));
    }

    if limit > 100 {
        return Err(ApiError::validation("Limit cannot exceed 100"));
    }

    let status = match query.status.as_deref() {
        Some(value) => Some(AttendanceStatus::from_str(value).map_err(|_| {
            ApiError::validation(format!(
                "Invalid status. Must be one of: {}",
                AttendanceStatus::VARIANTS.join(", ")
            ))
        })?),
        None => None,
    };

    let start_date = match query.start_date.as_deref() {
        Some(value) => Some(reconcile::parse_day(value).ok_or_else(|| {
            ApiError::validation("Invalid start_date format. Use ISO 8601 format (YYYY-MM-DD)")
        })?),
        None => None,
    };

    let end_date = match query.end_date.as_deref() {
        Some(value) => Some(reconcile::parse_day(value).ok_or_else(|| {
            ApiError::validation("Invalid end_date format. Use ISO 8601 format (YYYY-MM-DD)")
        })?),
        None => None,
    };

    if let (Some(start), Some(end)) = (start_date, end_date) {
        if start > end {
            return Err(ApiError::validation(
                "start_date must be before or equal to end_date",
            ));
        }
    }

    Ok(RangeFilter {
        start_date,
        end_date,
        status,
        page,
        limit,
    })
}

async fn fetch_employee(pool: &MySqlPool, employee_id: u64) -> Result<Employee, ApiError> {
    let employee = sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = ?")
        .bind(employee_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, employee_id, "Failed to fetch employee");
            ApiError::Internal
        })?;

    employee.ok_or_else(|| ApiError::not_found("Employee not found"))
}

async fn fetch_record(pool: &MySqlPool, record_id: u64) -> Result<Attendance, ApiError> {
    sqlx::query_as::<_, Attendance>("SELECT * FROM attendance WHERE id = ?")
        .bind(record_id)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, record_id, "Failed to fetch attendance record");
            ApiError::Internal
        })
}

/// Mark attendance: create or amend the one record for (employee, day)
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = MarkAttendance,
    responses(
        (status = 201, description = "Attendance marked successfully", body = MarkAttendanceResponse),
        (status = 200, description = "Attendance updated successfully", body = MarkAttendanceResponse),
        (status = 400, description = "Validation failure", body = Object, example = json!({
            "success": false,
            "message": "Check-out time must be after check-in time"
        })),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Employee not active, or duplicate record for the day"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn mark_attendance(
    pool: web::Data<MySqlPool>,
    payload: web::Json<MarkAttendance>,
) -> Result<impl Responder, ApiError> {
    let today = Local::now().date_naive();
    let submission = reconcile::validate_submission(&payload, today)?;

    // Gate on the employee's state as of this call; never cached.
    let employee = fetch_employee(pool.get_ref(), submission.employee_id).await?;
    if !employee.is_active() {
        return Err(ApiError::conflict(format!(
            "Cannot mark attendance for employee with status: {}",
            employee.status
        )));
    }

    let existing = sqlx::query_as::<_, Attendance>(
        "SELECT * FROM attendance WHERE employee_id = ? AND date = ?",
    )
    .bind(submission.employee_id)
    .bind(submission.date)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id = submission.employee_id, "Failed to look up attendance");
        ApiError::Internal
    })?;

    match existing {
        Some(current) => {
            let update = reconcile::merge(&current, &submission);

            sqlx::query(
                r#"
                UPDATE attendance
                SET check_in = ?, check_out = ?, break_start = ?, break_end = ?,
                    status = ?, notes = ?
                WHERE id = ?
                "#,
            )
            .bind(update.check_in)
            .bind(update.check_out)
            .bind(update.break_start)
            .bind(update.break_end)
            .bind(&update.status)
            .bind(&update.notes)
            .bind(current.id)
            .execute(pool.get_ref())
            .await
            .map_err(|e| {
                tracing::error!(error = %e, record_id = current.id, "Failed to amend attendance");
                ApiError::Internal
            })?;

            let record = fetch_record(pool.get_ref(), current.id).await?;

            Ok(HttpResponse::Ok().json(MarkAttendanceResponse {
                success: true,
                message: "Attendance updated successfully".to_string(),
                data: AttendanceDetail {
                    record,
                    employee: EmployeeSummary::from(&employee),
                },
            }))
        }
        None => {
            let new = reconcile::new_record(&submission);

            let result = sqlx::query(
                r#"
                INSERT INTO attendance
                (employee_id, date, check_in, check_out, break_start, break_end, status, notes)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(submission.employee_id)
            .bind(submission.date)
            .bind(new.check_in)
            .bind(new.check_out)
            .bind(new.break_start)
            .bind(new.break_end)
            .bind(&new.status)
            .bind(&new.notes)
            .execute(pool.get_ref())
            .await;

            let result = match result {
                Ok(result) => result,
                // A concurrent creation for the same (employee, day) lost the
                // race; the unique key reports it as a conflict.
                Err(e) if is_duplicate_key(&e) => {
                    return Err(ApiError::conflict(
                        "Attendance record already exists for this employee and date",
                    ));
                }
                Err(e) => {
                    tracing::error!(error = %e, employee_id = submission.employee_id, "Failed to create attendance");
                    return Err(ApiError::Internal);
                }
            };

            let record = fetch_record(pool.get_ref(), result.last_insert_id()).await?;

            Ok(HttpResponse::Created().json(MarkAttendanceResponse {
                success: true,
                message: "Attendance marked successfully".to_string(),
                data: AttendanceDetail {
                    record,
                    employee: EmployeeSummary::from(&employee),
                },
            }))
        }
    }
}

/// Paginated attendance history for one employee, newest day first
#[utoipa::path(
    get,
    path = "/api/attendance/employee/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee ID"),
        AttendanceQuery
    ),
    responses(
        (status = 200, description = "Paginated attendance records", body = AttendanceListResponse),
        (status = 400, description = "Validation failure"),
        (status = 404, description = "Employee not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn attendance_by_employee(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    query: web::Query<AttendanceQuery>,
) -> Result<impl Responder, ApiError> {
    let employee_id = path.into_inner();

    let employee = fetch_employee(pool.get_ref(), employee_id).await?;
    let filter = validate_range_query(&query)?;
    let offset = (filter.page - 1) * filter.limit;

    // ---------- WHERE clause ----------
    let mut where_sql = String::from(" WHERE employee_id = ?");
    let mut args = vec![FilterValue::U64(employee_id)];

    if let Some(status) = filter.status {
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status.to_string()));
    }

    if let Some(start) = filter.start_date {
        where_sql.push_str(" AND date >= ?");
        args.push(FilterValue::Date(start));
    }

    if let Some(end) = filter.end_date {
        where_sql.push_str(" AND date <= ?");
        args.push(FilterValue::Date(end));
    }

    let count_sql = format!("SELECT COUNT(*) FROM attendance{}", where_sql);
    let data_sql = format!(
        "SELECT * FROM attendance{} ORDER BY date DESC LIMIT ? OFFSET ?",
        where_sql
    );

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(s.clone()),
            FilterValue::Date(d) => count_q.bind(*d),
        };
    }

    let mut data_q = sqlx::query_as::<_, Attendance>(&data_sql);
    for arg in &args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(*v),
            FilterValue::Str(s) => data_q.bind(s.clone()),
            FilterValue::Date(d) => data_q.bind(*d),
        };
    }
    data_q = data_q.bind(filter.limit as i64).bind(offset as i64);

    // Count and page fetch are independent; run them concurrently.
    let (total, records) = futures::try_join!(
        count_q.fetch_one(pool.get_ref()),
        data_q.fetch_all(pool.get_ref())
    )
    .map_err(|e| {
        tracing::error!(error = %e, employee_id, "Failed to fetch attendance records");
        ApiError::Internal
    })?;

    let attendances = records
        .into_iter()
        .map(AttendanceWithMetrics::from)
        .collect();

    Ok(HttpResponse::Ok().json(AttendanceListResponse {
        success: true,
        data: AttendanceListData {
            employee: EmployeeSummary::from(&employee),
            attendances,
            pagination: build_pagination(filter.page, filter.limit, total),
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> AttendanceQuery {
        AttendanceQuery {
            start_date: None,
            end_date: None,
            status: None,
            page: None,
            limit: None,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn defaults_page_and_limit() {
        let filter = validate_range_query(&query()).unwrap();
        assert_eq!(filter.page, 1);
        assert_eq!(filter.limit, 30);
    }

    #[test]
    fn rejects_out_of_range_pagination() {
        let mut q = query();
        q.page = Some(0);
        assert!(validate_range_query(&q).is_err());

        let mut q = query();
        q.limit = Some(0);
        assert!(validate_range_query(&q).is_err());

        let mut q = query();
        q.limit = Some(101);
        let err = validate_range_query(&q).unwrap_err();
        assert!(err.to_string().contains("cannot exceed 100"));
    }

    #[test]
    fn single_day_window_is_inclusive() {
        let mut q = query();
        q.start_date = Some("2024-01-01".to_string());
        q.end_date = Some("2024-01-01".to_string());

        let filter = validate_range_query(&q).unwrap();
        assert_eq!(filter.start_date, Some(date(2024, 1, 1)));
        assert_eq!(filter.end_date, Some(date(2024, 1, 1)));
    }

    #[test]
    fn rejects_inverted_window() {
        let mut q = query();
        q.start_date = Some("2024-02-01".to_string());
        q.end_date = Some("2024-01-01".to_string());

        let err = validate_range_query(&q).unwrap_err();
        assert!(err.to_string().contains("before or equal"));
    }

    #[test]
    fn rejects_bad_dates_and_status() {
        let mut q = query();
        q.start_date = Some("01/02/2024".to_string());
        assert!(validate_range_query(&q).is_err());

        let mut q = query();
        q.status = Some("WORKING".to_string());
        assert!(validate_range_query(&q).is_err());

        let mut q = query();
        q.status = Some("HALF_DAY".to_string());
        let filter = validate_range_query(&q).unwrap();
        assert_eq!(filter.status, Some(AttendanceStatus::HalfDay));
    }

    #[test]
    fn annotation_derives_metrics_from_punches() {
        let day = date(2024, 1, 15);
        let created = DateTime::<Utc>::from_timestamp(1_705_309_200, 0).unwrap();
        let record = Attendance {
            id: 1,
            employee_id: 1,
            date: day,
            check_in: day.and_hms_opt(9, 0, 0),
            check_out: day.and_hms_opt(18, 0, 0),
            break_start: day.and_hms_opt(13, 0, 0),
            break_end: day.and_hms_opt(13, 30, 0),
            status: "PRESENT".to_string(),
            notes: None,
            created_at: created,
            updated_at: created,
        };

        let annotated = AttendanceWithMetrics::from(record);
        assert_eq!(annotated.working_hours, Some(8.5));
        assert_eq!(annotated.break_duration, Some(0.5));
    }
}
