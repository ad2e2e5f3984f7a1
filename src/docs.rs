use crate::api::attendance::{AttendanceListResponse, AttendanceQuery, RecordAttendance};
use crate::api::branch::CreateBranch;
use crate::api::notification::{DispatchRequest, UpsertNotification};
use crate::api::report::{DailyCounts, ReportRangeQuery, StudentStatistics};
use crate::api::student::{CreateStudent, StudentListResponse, StudentQuery};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::branch::Branch;
use crate::model::notification::NotificationPreference;
use crate::model::student::Student;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Student Attendance Management API",
        version = "1.0.0",
        description = r#"
## Student Attendance Management System

This API powers a student attendance management system for schools with one
or more branches.

### Key Features
- **Roster Management**
  - Create, update, list, and search student records; bulk CSV import/export
- **Branches**
  - Create and list school branches
- **Attendance Tracking**
  - One record per student per day, with present/absent/late status and notes
- **Absence Notifications**
  - Queued email notices to a configured address when a student is marked absent
- **Reports**
  - Per-student statistics and per-day counts over a date range

### Security
All non-auth endpoints require **JWT Bearer authentication**. Roster and
branch mutations additionally require the **admin** role.

### Response Format
- JSON-based RESTful responses
- Pagination supported for the roster listing
"#,
    ),
    paths(
        crate::api::attendance::list_attendance,
        crate::api::attendance::record_attendance,
        crate::api::attendance::mark_attendance,

        crate::api::student::create_student,
        crate::api::student::list_students,
        crate::api::student::get_student,
        crate::api::student::update_student,
        crate::api::student::import_students,
        crate::api::student::export_students,

        crate::api::branch::list_branches,
        crate::api::branch::create_branch,

        crate::api::notification::get_notification_settings,
        crate::api::notification::upsert_notification_settings,
        crate::api::notification::dispatch_notification,

        crate::api::report::statistics,
        crate::api::report::by_date
    ),
    components(
        schemas(
            Student,
            CreateStudent,
            StudentQuery,
            StudentListResponse,
            Branch,
            CreateBranch,
            AttendanceRecord,
            AttendanceStatus,
            RecordAttendance,
            AttendanceQuery,
            AttendanceListResponse,
            NotificationPreference,
            UpsertNotification,
            DispatchRequest,
            StudentStatistics,
            DailyCounts,
            ReportRangeQuery
        )
    ),
    tags(
        (name = "Attendance", description = "Attendance tracking APIs"),
        (name = "Student", description = "Roster management APIs"),
        (name = "Branch", description = "Branch management APIs"),
        (name = "Notification", description = "Absence notification APIs"),
        (name = "Report", description = "Attendance reporting APIs"),
    )
)]
pub struct ApiDoc;
