use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString, EnumVariantNames};
use utoipa::ToSchema;

/// Lifecycle states an employee moves through. Stored as upper-case
/// strings in the `employees.status` column.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, EnumString, EnumVariantNames, AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EmployeeStatus {
    Active,
    Inactive,
    Terminated,
    OnLeave,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "employee_code": "EMP-001",
        "first_name": "John",
        "last_name": "Doe",
        "email": "john.doe@company.com",
        "phone": "+8801712345678",
        "department": "Engineering",
        "position": "Backend Developer",
        "hire_date": "2024-01-01",
        "status": "ACTIVE",
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-01T00:00:00Z"
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "EMP-001")]
    pub employee_code: String,

    #[schema(example = "John")]
    pub first_name: String,

    #[schema(example = "Doe")]
    pub last_name: String,

    #[schema(example = "john.doe@company.com")]
    pub email: String,

    #[schema(example = "+8801712345678", nullable = true)]
    pub phone: Option<String>,

    #[schema(example = "Engineering", nullable = true)]
    pub department: Option<String>,

    #[schema(example = "Backend Developer", nullable = true)]
    pub position: Option<String>,

    #[schema(
        example = "2024-01-01",
        value_type = String,
        format = "date",
        nullable = true
    )]
    pub hire_date: Option<NaiveDate>,

    #[schema(example = "ACTIVE")]
    pub status: String,

    #[schema(example = "2024-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,

    #[schema(example = "2024-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    /// Attendance may only be recorded against an ACTIVE employee.
    pub fn is_active(&self) -> bool {
        self.status == EmployeeStatus::Active.as_ref()
    }
}

/// Slim projection embedded in attendance responses.
#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct EmployeeSummary {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "EMP-001")]
    pub employee_code: String,
    #[schema(example = "John")]
    pub first_name: String,
    #[schema(example = "Doe")]
    pub last_name: String,
    #[schema(example = "john.doe@company.com")]
    pub email: String,
    #[schema(example = "Engineering", nullable = true)]
    pub department: Option<String>,
    #[schema(example = "Backend Developer", nullable = true)]
    pub position: Option<String>,
}

impl From<&Employee> for EmployeeSummary {
    fn from(employee: &Employee) -> Self {
        Self {
            id: employee.id,
            employee_code: employee.employee_code.clone(),
            first_name: employee.first_name.clone(),
            last_name: employee.last_name.clone(),
            email: employee.email.clone(),
            department: employee.department.clone(),
            position: employee.position.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::VariantNames;

    #[test]
    fn employee_status_round_trips_screaming_snake_case() {
        assert_eq!(EmployeeStatus::Active.to_string(), "ACTIVE");
        assert_eq!(EmployeeStatus::OnLeave.to_string(), "ON_LEAVE");
        assert_eq!(
            EmployeeStatus::from_str("TERMINATED").unwrap(),
            EmployeeStatus::Terminated
        );
        assert!(EmployeeStatus::from_str("terminated").is_err());
    }

    #[test]
    fn employee_status_variant_list() {
        assert_eq!(
            EmployeeStatus::VARIANTS,
            &["ACTIVE", "INACTIVE", "TERMINATED", "ON_LEAVE"]
        );
    }
}
