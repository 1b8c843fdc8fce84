//! SeaORM adapter for the job store - generic over ConnectionTrait.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, NotSet, QueryFilter, QueryOrder,
    Set,
};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::entities::jobs::{self, JobStatus};

pub mod dto;

pub use dto::{JobCreate, JobUpdate};

// Adapter functions return DbErr; the store layer maps to DomainError.

pub async fn insert_job<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: JobCreate,
) -> Result<jobs::Model, sea_orm::DbErr> {
    let now = OffsetDateTime::now_utc();
    let job_active = jobs::ActiveModel {
        id: Set(dto.id),
        owner_id: Set(dto.owner_id),
        status: Set(JobStatus::Pending),
        payload: Set(dto.payload),
        result: NotSet,
        error: NotSet,
        created_at: Set(now),
        updated_at: Set(now),
    };

    job_active.insert(conn).await
}

pub async fn find_by_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    job_id: Uuid,
) -> Result<Option<jobs::Model>, sea_orm::DbErr> {
    jobs::Entity::find()
        .filter(jobs::Column::Id.eq(job_id))
        .one(conn)
        .await
}

/// Find a job by id, scoped to its owner. A job owned by someone else is
/// indistinguishable from a missing one.
pub async fn find_for_owner<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    job_id: Uuid,
    owner_id: &str,
) -> Result<Option<jobs::Model>, sea_orm::DbErr> {
    jobs::Entity::find()
        .filter(jobs::Column::Id.eq(job_id))
        .filter(jobs::Column::OwnerId.eq(owner_id))
        .one(conn)
        .await
}

/// All jobs for an owner, newest first.
pub async fn list_for_owner<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    owner_id: &str,
) -> Result<Vec<jobs::Model>, sea_orm::DbErr> {
    jobs::Entity::find()
        .filter(jobs::Column::OwnerId.eq(owner_id))
        .order_by_desc(jobs::Column::CreatedAt)
        .all(conn)
        .await
}

/// Jobs stuck in `running` whose last update predates the cutoff.
pub async fn list_running_older_than<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    cutoff: OffsetDateTime,
) -> Result<Vec<jobs::Model>, sea_orm::DbErr> {
    jobs::Entity::find()
        .filter(jobs::Column::Status.eq(JobStatus::Running))
        .filter(jobs::Column::UpdatedAt.lt(cutoff))
        .all(conn)
        .await
}

/// Apply a guarded update, then refetch.
///
/// Filters by id plus, when present, the expected current status. A zero
/// rows_affected result means either the job does not exist or the guard
/// missed; both come back as `None` and the caller decides what that means.
pub async fn update_job<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    job_id: Uuid,
    update: JobUpdate,
) -> Result<Option<jobs::Model>, sea_orm::DbErr> {
    use sea_orm::sea_query::{Alias, Expr};

    let now = OffsetDateTime::now_utc();

    let mut query = jobs::Entity::update_many()
        .col_expr(jobs::Column::UpdatedAt, Expr::val(now).into())
        .filter(jobs::Column::Id.eq(job_id));

    if let Some(status) = update.status {
        query = query.col_expr(
            jobs::Column::Status,
            Expr::val(status).cast_as(Alias::new("job_status")),
        );
    }
    if let Some(result) = update.result {
        query = query.col_expr(jobs::Column::Result, Expr::val(result).into());
    }
    if let Some(error) = update.error {
        query = query.col_expr(jobs::Column::Error, Expr::val(error).into());
    }
    if let Some(expected) = update.expect_status {
        query = query.filter(jobs::Column::Status.eq(expected));
    }

    let result = query.exec(conn).await?;
    if result.rows_affected == 0 {
        return Ok(None);
    }

    find_by_id(conn, job_id).await
}
