//! Permission codes used by the built-in education center registry.
//!
//! Handlers and guards should reference these constants rather than string
//! literals so a renamed code fails to compile instead of silently denying.

// =============================================================================
// Administration
// =============================================================================

pub const CRUD_CENTER: &str = "CRUD_CENTER";
pub const CRUD_SUPERUSER: &str = "CRUD_SUPERUSER";
pub const MANAGE_PERMISSIONS: &str = "MANAGE_PERMISSIONS";

// =============================================================================
// People and timetable
// =============================================================================

pub const CRUD_STUDENT: &str = "CRUD_STUDENT";
pub const CRUD_TEACHER: &str = "CRUD_TEACHER";
pub const CRUD_CLASS: &str = "CRUD_CLASS";
pub const CRUD_SUBJECT: &str = "CRUD_SUBJECT";

// =============================================================================
// Finance
// =============================================================================

pub const CRUD_PAYMENT: &str = "CRUD_PAYMENT";
pub const CRUD_DEBT: &str = "CRUD_DEBT";
pub const VIEW_REPORTS: &str = "VIEW_REPORTS";

// =============================================================================
// Teaching
// =============================================================================

pub const CRUD_GRADE: &str = "CRUD_GRADE";
pub const CRUD_ATTENDANCE: &str = "CRUD_ATTENDANCE";
pub const CRUD_ASSIGNMENT: &str = "CRUD_ASSIGNMENT";

// =============================================================================
// Student self-service
// =============================================================================

pub const VIEW_OWN_GRADES: &str = "VIEW_OWN_GRADES";
pub const VIEW_OWN_ATTENDANCE: &str = "VIEW_OWN_ATTENDANCE";
pub const VIEW_OWN_ASSIGNMENTS: &str = "VIEW_OWN_ASSIGNMENTS";
pub const VIEW_OWN_PAYMENTS: &str = "VIEW_OWN_PAYMENTS";
pub const SUBMIT_ASSIGNMENT: &str = "SUBMIT_ASSIGNMENT";

/// Every code above, in catalog order.
pub const ALL: &[&str] = &[
    CRUD_CENTER,
    CRUD_SUPERUSER,
    MANAGE_PERMISSIONS,
    CRUD_STUDENT,
    CRUD_TEACHER,
    CRUD_CLASS,
    CRUD_SUBJECT,
    CRUD_PAYMENT,
    CRUD_DEBT,
    VIEW_REPORTS,
    CRUD_GRADE,
    CRUD_ATTENDANCE,
    CRUD_ASSIGNMENT,
    VIEW_OWN_GRADES,
    VIEW_OWN_ATTENDANCE,
    VIEW_OWN_ASSIGNMENTS,
    VIEW_OWN_PAYMENTS,
    SUBMIT_ASSIGNMENT,
];
