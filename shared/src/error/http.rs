//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::EmployeeNotFound
            | Self::UserNotFound
            | Self::AttendanceNotFound
            | Self::RegularizationNotFound
            | Self::LeaveRequestNotFound
            | Self::LeaveBalanceNotFound
            | Self::PayrollNotFound
            | Self::NotificationNotFound
            | Self::NoActiveEmployees => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::AlreadyExists
            | Self::EmailAlreadyRegistered
            | Self::EmployeeCodeExists
            | Self::PayrollAlreadyExists
            | Self::LeaveOverlap => StatusCode::CONFLICT,

            // 401 Unauthorized
            Self::NotAuthenticated
            | Self::InvalidCredentials
            | Self::TokenExpired
            | Self::TokenInvalid
            | Self::AccountDisabled
            | Self::CurrentPasswordIncorrect => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            Self::PermissionDenied
            | Self::RoleRequired
            | Self::NotDirectReport
            | Self::CannotModifySuperAdmin
            | Self::RegistrationRoleRestricted => StatusCode::FORBIDDEN,

            // 429 Too Many Requests
            Self::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,

            // 500 Internal Server Error
            Self::Unknown
            | Self::InternalError
            | Self::DatabaseError
            | Self::ConfigError => StatusCode::INTERNAL_SERVER_ERROR,

            // 400 Bad Request (default for validation/business errors)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_status() {
        assert_eq!(ErrorCode::NotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::PayrollNotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::AttendanceNotFound.http_status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_conflict_status() {
        assert_eq!(ErrorCode::PayrollAlreadyExists.http_status(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::LeaveOverlap.http_status(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::EmailAlreadyRegistered.http_status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_auth_and_permission_status() {
        assert_eq!(ErrorCode::NotAuthenticated.http_status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorCode::AccountDisabled.http_status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorCode::PermissionDenied.http_status(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorCode::NotDirectReport.http_status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ErrorCode::RegistrationRoleRestricted.http_status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_business_errors_are_bad_request() {
        assert_eq!(ErrorCode::AlreadyCheckedIn.http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::NotCheckedIn.http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::LeaveInvalidDateRange.http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ErrorCode::PayrollInvalidTransition.http_status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_system_and_rate_limit_status() {
        assert_eq!(
            ErrorCode::DatabaseError.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ErrorCode::TooManyRequests.http_status(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }
}
