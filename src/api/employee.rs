use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use std::str::FromStr;
use strum::VariantNames;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

use crate::api::{Pagination, build_pagination};
use crate::db::is_duplicate_key;
use crate::error::ApiError;
use crate::model::employee::{Employee, EmployeeStatus};
use crate::service::reconcile;

#[derive(Deserialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "EMP-001")]
    pub employee_code: String,
    #[schema(example = "John")]
    pub first_name: String,
    #[schema(example = "Doe")]
    pub last_name: String,
    #[schema(example = "john.doe@company.com", format = "email")]
    pub email: String,
    #[schema(example = "+8801712345678", nullable = true)]
    pub phone: Option<String>,
    #[schema(example = "Engineering", nullable = true)]
    pub department: Option<String>,
    #[schema(example = "Backend Developer", nullable = true)]
    pub position: Option<String>,
    #[schema(example = "2024-01-01", nullable = true)]
    pub hire_date: Option<String>,
    #[schema(example = "ACTIVE", nullable = true)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct EmployeeQuery {
    /// Pagination page number (start with 1)
    #[schema(example = 1)]
    pub page: Option<u32>,
    /// Employees per page, at most 100
    #[schema(example = 10)]
    pub limit: Option<u32>,
    /// Filter by lifecycle status
    #[schema(example = "ACTIVE")]
    pub status: Option<String>,
    /// Substring match on department
    #[schema(example = "Engineering")]
    pub department: Option<String>,
    /// Substring match on name, email or employee code
    #[schema(example = "john")]
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeResponse {
    pub success: bool,
    #[schema(example = "Employee created successfully")]
    pub message: String,
    pub data: Employee,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub success: bool,
    pub data: Vec<Employee>,
    pub pagination: Pagination,
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.contains('@') {
        return false;
    }
    if email.contains(char::is_whitespace) {
        return false;
    }

    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

fn normalize_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|trimmed| !trimmed.is_empty())
        .map(String::from)
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created successfully", body = EmployeeResponse),
        (status = 400, description = "Validation failure", body = Object, example = json!({
            "success": false,
            "message": "Invalid email format"
        })),
        (status = 409, description = "Employee code or email already taken"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee"
)]
pub async fn create_employee(
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateEmployee>,
) -> Result<impl Responder, ApiError> {
    let employee_code = payload.employee_code.trim();
    let first_name = payload.first_name.trim();
    let last_name = payload.last_name.trim();
    let email = payload.email.trim().to_lowercase();

    if employee_code.is_empty() || first_name.is_empty() || last_name.is_empty() || email.is_empty()
    {
        return Err(ApiError::validation(
            "Missing required fields: employee_code, first_name, last_name, and email are required",
        ));
    }

    if !is_valid_email(&email) {
        return Err(ApiError::validation("Invalid email format"));
    }

    let status = match payload.status.as_deref() {
        Some(value) => EmployeeStatus::from_str(value)
            .map_err(|_| {
                ApiError::validation(format!(
                    "Invalid status. Must be one of: {}",
                    EmployeeStatus::VARIANTS.join(", ")
                ))
            })?
            .to_string(),
        None => EmployeeStatus::Active.to_string(),
    };

    let hire_date: Option<NaiveDate> = match payload.hire_date.as_deref() {
        Some(value) => Some(reconcile::parse_day(value).ok_or_else(|| {
            ApiError::validation("Invalid hire_date format. Use ISO 8601 format (YYYY-MM-DD)")
        })?),
        None => None,
    };

    // Pre-check both natural keys for a friendlier message; the unique
    // indexes still backstop any race.
    let code_taken =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employees WHERE employee_code = ?")
            .bind(employee_code)
            .fetch_one(pool.get_ref())
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to check employee code");
                ApiError::Internal
            })?;

    if code_taken > 0 {
        return Err(ApiError::conflict(format!(
            "Employee with code {employee_code} already exists"
        )));
    }

    let email_taken = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employees WHERE email = ?")
        .bind(&email)
        .fetch_one(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to check employee email");
            ApiError::Internal
        })?;

    if email_taken > 0 {
        return Err(ApiError::conflict(format!(
            "Employee with email {email} already exists"
        )));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO employees
        (employee_code, first_name, last_name, email, phone, department, position, hire_date, status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee_code)
    .bind(first_name)
    .bind(last_name)
    .bind(&email)
    .bind(normalize_optional(payload.phone.as_deref()))
    .bind(normalize_optional(payload.department.as_deref()))
    .bind(normalize_optional(payload.position.as_deref()))
    .bind(hire_date)
    .bind(&status)
    .execute(pool.get_ref())
    .await;

    let result = match result {
        Ok(result) => result,
        Err(e) if is_duplicate_key(&e) => {
            return Err(ApiError::conflict("Employee code or email already exists"));
        }
        Err(e) => {
            error!(error = %e, "Failed to create employee");
            return Err(ApiError::Internal);
        }
    };

    let employee = sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = ?")
        .bind(result.last_insert_id())
        .fetch_one(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch created employee");
            ApiError::Internal
        })?;

    Ok(HttpResponse::Created().json(EmployeeResponse {
        success: true,
        message: "Employee created successfully".to_string(),
        data: employee,
    }))
}

/// List employees with filtering and pagination
#[utoipa::path(
    get,
    path = "/api/employees",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeeListResponse),
        (status = 400, description = "Validation failure"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee"
)]
pub async fn list_employees(
    pool: web::Data<MySqlPool>,
    query: web::Query<EmployeeQuery>,
) -> Result<impl Responder, ApiError> {
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(10);

    if page < 1 || limit < 1 {
        return Err(ApiError::validation(
            "Page and limit must be positive integers",
        ));
    }

    if limit > 100 {
        return Err(ApiError::validation("Limit cannot exceed 100"));
    }

    let status = match query.status.as_deref() {
        Some(value) => Some(EmployeeStatus::from_str(value).map_err(|_| {
            ApiError::validation(format!(
                "Invalid status. Must be one of: {}",
                EmployeeStatus::VARIANTS.join(", ")
            ))
        })?),
        None => None,
    };

    let offset = (page - 1) * limit;

    // ---------- WHERE clause ----------
    let mut conditions = Vec::new();
    let mut args: Vec<String> = Vec::new();

    if let Some(status) = status {
        conditions.push("status = ?");
        args.push(status.to_string());
    }

    if let Some(department) = query.department.as_deref() {
        conditions.push("department LIKE ?");
        args.push(format!("%{department}%"));
    }

    if let Some(search) = query.search.as_deref() {
        conditions
            .push("(first_name LIKE ? OR last_name LIKE ? OR email LIKE ? OR employee_code LIKE ?)");
        let like = format!("%{search}%");
        for _ in 0..4 {
            args.push(like.clone());
        }
    }

    let where_sql = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    let count_sql = format!("SELECT COUNT(*) FROM employees{}", where_sql);
    let data_sql = format!(
        "SELECT * FROM employees{} ORDER BY created_at DESC LIMIT ? OFFSET ?",
        where_sql
    );

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = count_q.bind(arg.clone());
    }

    let mut data_q = sqlx::query_as::<_, Employee>(&data_sql);
    for arg in &args {
        data_q = data_q.bind(arg.clone());
    }
    data_q = data_q.bind(limit as i64).bind(offset as i64);

    let (total, employees) = futures::try_join!(
        count_q.fetch_one(pool.get_ref()),
        data_q.fetch_all(pool.get_ref())
    )
    .map_err(|e| {
        error!(error = %e, "Failed to fetch employees");
        ApiError::Internal
    })?;

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        success: true,
        data: employees,
        pagination: build_pagination(page, limit, total),
    }))
}

/// Get Employee by ID
#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "success": false,
            "message": "Employee not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee"
)]
pub async fn get_employee(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<impl Responder, ApiError> {
    let employee_id = path.into_inner();

    let employee = sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = ?")
        .bind(employee_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, "Failed to fetch employee");
            ApiError::Internal
        })?
        .ok_or_else(|| ApiError::not_found("Employee not found"))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": employee,
    })))
}

/// Delete Employee (attendance rows cascade with it)
#[utoipa::path(
    delete,
    path = "/api/employees/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee deleted successfully", body = Object, example = json!({
            "success": true,
            "message": "Employee deleted successfully"
        })),
        (status = 404, description = "Employee not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee"
)]
pub async fn delete_employee(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<impl Responder, ApiError> {
    let employee_id = path.into_inner();

    let result = sqlx::query("DELETE FROM employees WHERE id = ?")
        .bind(employee_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, "Failed to delete employee");
            ApiError::Internal
        })?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Employee not found"));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Employee deleted successfully",
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plausible_emails() {
        assert!(is_valid_email("john.doe@company.com"));
        assert!(is_valid_email("a@b.co"));
    }

    #[test]
    fn rejects_malformed_emails() {
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("@company.com"));
        assert!(!is_valid_email("john@company"));
        assert!(!is_valid_email("john@.com"));
        assert!(!is_valid_email("john doe@company.com"));
        assert!(!is_valid_email("john@doe@company.com"));
    }

    #[test]
    fn optional_fields_normalize_blank_to_absent() {
        assert_eq!(normalize_optional(Some("  Engineering  ")), Some("Engineering".to_string()));
        assert_eq!(normalize_optional(Some("   ")), None);
        assert_eq!(normalize_optional(None), None);
    }
}
