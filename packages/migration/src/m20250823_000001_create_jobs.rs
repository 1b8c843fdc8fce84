use sea_orm::Statement;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_query::extension::postgres::Type as PgType;
use sea_orm_migration::sea_query::{ColumnDef, Index, Table};

#[derive(DeriveMigrationName)]
pub struct Migration;

// ----- Iden enums for tables & columns -----
#[derive(Iden)]
enum Jobs {
    Table,
    Id,
    OwnerId,
    Status,
    Payload,
    Result,
    Error,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum JobStatusEnum {
    #[iden = "job_status"]
    Type,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // job_status enum (PostgreSQL only)
        match manager.get_database_backend() {
            sea_orm::DatabaseBackend::Postgres => {
                async fn enum_exists(
                    manager: &SchemaManager<'_>,
                    enum_name: &str,
                ) -> Result<bool, DbErr> {
                    let result = manager
                        .get_connection()
                        .query_one(Statement::from_string(
                            sea_orm::DatabaseBackend::Postgres,
                            format!("SELECT 1 FROM pg_type WHERE typname = '{}'", enum_name),
                        ))
                        .await?;
                    Ok(result.is_some())
                }

                if !enum_exists(manager, "job_status").await? {
                    manager
                        .create_type(
                            PgType::create()
                                .as_enum(JobStatusEnum::Type)
                                .values(["pending", "running", "succeeded", "failed"])
                                .to_owned(),
                        )
                        .await?;
                }
            }
            _ => {
                return Err(DbErr::Custom("Unsupported database backend".into()));
            }
        }

        // jobs table
        manager
            .create_table(
                Table::create()
                    .table(Jobs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Jobs::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Jobs::OwnerId).string().not_null())
                    .col(
                        ColumnDef::new(Jobs::Status)
                            .custom(JobStatusEnum::Type)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Jobs::Payload).json_binary().not_null())
                    .col(ColumnDef::new(Jobs::Result).json_binary().null())
                    .col(ColumnDef::new(Jobs::Error).text().null())
                    .col(
                        ColumnDef::new(Jobs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Jobs::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Owner listings read newest-first; the composite index serves both
        // the owner filter and the created_at ordering.
        manager
            .create_index(
                Index::create()
                    .name("ix_jobs_owner_created")
                    .table(Jobs::Table)
                    .col(Jobs::OwnerId)
                    .col(Jobs::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_jobs_status")
                    .table(Jobs::Table)
                    .col(Jobs::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // drop in reverse order + drop index before table
        manager
            .drop_index(
                Index::drop()
                    .name("ix_jobs_status")
                    .table(Jobs::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("ix_jobs_owner_created")
                    .table(Jobs::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(Jobs::Table).to_owned())
            .await?;

        match manager.get_database_backend() {
            sea_orm::DatabaseBackend::Postgres => {
                manager
                    .drop_type(
                        PgType::drop()
                            .name(JobStatusEnum::Type)
                            .if_exists()
                            .to_owned(),
                    )
                    .await?;
            }
            _ => {
                return Err(DbErr::Custom("Unsupported database backend".into()));
            }
        }

        Ok(())
    }
}
