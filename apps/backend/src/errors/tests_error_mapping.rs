// Unit tests for error mapping - pure domain logic without HTTP or database dependencies
use crate::errors::domain::{DomainError, InfraErrorKind, NotFoundKind};
use crate::{AppError, ErrorCode};

#[test]
fn maps_validation_to_400() {
    let de = DomainError::validation("bad field");
    let app: AppError = de.into();
    assert_eq!(app.code(), ErrorCode::ValidationError);
    assert_eq!(app.status().as_u16(), 400);
}

#[test]
fn maps_not_found() {
    let nf = DomainError::not_found(NotFoundKind::Job, "no job");
    let app: AppError = nf.into();
    assert_eq!(app.code().as_str(), "JOB_NOT_FOUND");
    assert_eq!(app.status().as_u16(), 404);

    // Generic fallback
    let other = DomainError::not_found(NotFoundKind::Other("widget".to_string()), "no widget");
    let app: AppError = other.into();
    assert_eq!(app.code().as_str(), "NOT_FOUND");
    assert_eq!(app.status().as_u16(), 404);
}

#[test]
fn maps_infra() {
    let t = DomainError::infra(InfraErrorKind::Timeout, "timeout");
    let app: AppError = t.into();
    assert_eq!(app.code().as_str(), "DB_TIMEOUT");
    assert_eq!(app.status().as_u16(), 504);
    assert!(matches!(app, AppError::Timeout { .. }));

    let down = DomainError::infra(InfraErrorKind::DbUnavailable, "down");
    let app: AppError = down.into();
    assert_eq!(app.code().as_str(), "DB_UNAVAILABLE");
    assert_eq!(app.status().as_u16(), 503);

    let queue = DomainError::infra(InfraErrorKind::QueueUnavailable, "queue down");
    let app: AppError = queue.into();
    assert_eq!(app.code().as_str(), "QUEUE_UNAVAILABLE");
    assert_eq!(app.status().as_u16(), 502);

    let other = DomainError::infra(InfraErrorKind::Other("unknown".to_string()), "other");
    let app: AppError = other.into();
    assert_eq!(app.code().as_str(), "INTERNAL_ERROR");
    assert_eq!(app.status().as_u16(), 500);
}

#[test]
fn uniform_unauthorized_shape() {
    // Whatever the underlying auth failure, the rendered error is the same.
    let app = AppError::unauthorized();
    assert_eq!(app.code(), ErrorCode::Unauthorized);
    assert_eq!(app.status().as_u16(), 401);
}

#[test]
fn constructor_helpers() {
    let validation = DomainError::validation("invalid input");
    assert!(matches!(validation, DomainError::Validation(_)));

    let not_found = DomainError::not_found(NotFoundKind::Job, "job missing");
    assert!(matches!(
        not_found,
        DomainError::NotFound(NotFoundKind::Job, _)
    ));

    let infra = DomainError::infra(InfraErrorKind::Timeout, "timeout");
    assert!(matches!(
        infra,
        DomainError::Infra(InfraErrorKind::Timeout, _)
    ));
}
