use crate::api::Pagination;
use crate::api::attendance::{
    AttendanceDetail, AttendanceListData, AttendanceListResponse, AttendanceQuery,
    AttendanceWithMetrics, MarkAttendanceResponse,
};
use crate::api::employee::{
    CreateEmployee, EmployeeListResponse, EmployeeQuery, EmployeeResponse,
};
use crate::model::attendance::{Attendance, MarkAttendance};
use crate::model::employee::{Employee, EmployeeSummary};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRMS Lite API",
        version = "1.0.0",
        description = r#"
## HRMS Lite

A small human-resources record keeper for employees and their daily
attendance.

### 🔹 Key Features
- **Employee Directory**
  - Create, list, view, and delete employee profiles
- **Attendance**
  - One canonical record per employee per day: check-in/out, break window,
    status, and notes, merged across submissions
  - Late status inferred from the check-in time
  - Working hours and break duration derived on the read path

### 📦 Response Format
- JSON-based RESTful responses
- Pagination supported for list endpoints

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::mark_attendance,
        crate::api::attendance::attendance_by_employee,

        crate::api::employee::create_employee,
        crate::api::employee::list_employees,
        crate::api::employee::get_employee,
        crate::api::employee::delete_employee,
    ),
    components(
        schemas(
            Attendance,
            MarkAttendance,
            MarkAttendanceResponse,
            AttendanceDetail,
            AttendanceQuery,
            AttendanceWithMetrics,
            AttendanceListData,
            AttendanceListResponse,
            CreateEmployee,
            Employee,
            EmployeeSummary,
            EmployeeQuery,
            EmployeeResponse,
            EmployeeListResponse,
            Pagination
        )
    ),
    tags(
        (name = "Attendance", description = "Attendance reconciliation APIs"),
        (name = "Employee", description = "Employee directory APIs"),
    )
)]
pub struct ApiDoc;
