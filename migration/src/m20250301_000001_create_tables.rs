use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 班级表
        manager
            .create_table(
                Table::create()
                    .table(Classes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Classes::Id).string().not_null().primary_key())
                    .col(
                        ColumnDef::new(Classes::Code)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Classes::Name).string().null())
                    .col(ColumnDef::new(Classes::CreatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        // 用户资料表，id 即认证服务的用户 id
        manager
            .create_table(
                Table::create()
                    .table(Profiles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Profiles::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Profiles::ClassId).string().not_null())
                    .col(ColumnDef::new(Profiles::DisplayName).string().null())
                    .col(ColumnDef::new(Profiles::AvatarUrl).string().null())
                    .col(ColumnDef::new(Profiles::CreatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Profiles::Table, Profiles::ClassId)
                            .to(Classes::Table, Classes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 作业表
        manager
            .create_table(
                Table::create()
                    .table(Homework::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Homework::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Homework::ClassId).string().not_null())
                    .col(ColumnDef::new(Homework::Title).string().not_null())
                    .col(ColumnDef::new(Homework::Description).text().null())
                    .col(ColumnDef::new(Homework::Subject).string().null())
                    .col(ColumnDef::new(Homework::DueDate).big_integer().not_null())
                    .col(ColumnDef::new(Homework::CreatedBy).string().null())
                    .col(ColumnDef::new(Homework::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Homework::UpdatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Homework::Table, Homework::ClassId)
                            .to(Classes::Table, Classes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 作业附件表
        manager
            .create_table(
                Table::create()
                    .table(HomeworkAttachments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(HomeworkAttachments::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(HomeworkAttachments::HomeworkId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(HomeworkAttachments::StoragePath)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(HomeworkAttachments::Filename)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(HomeworkAttachments::MimeType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(HomeworkAttachments::UploadedBy)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(HomeworkAttachments::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(HomeworkAttachments::Table, HomeworkAttachments::HomeworkId)
                            .to(Homework::Table, Homework::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 完成状态表
        manager
            .create_table(
                Table::create()
                    .table(HomeworkCompletion::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(HomeworkCompletion::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(HomeworkCompletion::HomeworkId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(HomeworkCompletion::UserId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(HomeworkCompletion::Done)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(HomeworkCompletion::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(HomeworkCompletion::Table, HomeworkCompletion::HomeworkId)
                            .to(Homework::Table, Homework::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 公告表
        manager
            .create_table(
                Table::create()
                    .table(Announcements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Announcements::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Announcements::ClassId).string().not_null())
                    .col(ColumnDef::new(Announcements::Title).string().not_null())
                    .col(ColumnDef::new(Announcements::Content).text().null())
                    .col(
                        ColumnDef::new(Announcements::Priority)
                            .string()
                            .not_null()
                            .default("normal"),
                    )
                    .col(
                        ColumnDef::new(Announcements::Pinned)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Announcements::CreatedBy).string().null())
                    .col(
                        ColumnDef::new(Announcements::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Announcements::UpdatedAt)
                            .big_integer()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Announcements::Table, Announcements::ClassId)
                            .to(Classes::Table, Classes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 通知表
        manager
            .create_table(
                Table::create()
                    .table(Notifications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Notifications::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Notifications::UserId).string().null())
                    .col(ColumnDef::new(Notifications::ClassId).string().null())
                    .col(ColumnDef::new(Notifications::Type).string().not_null())
                    .col(ColumnDef::new(Notifications::Title).string().not_null())
                    .col(ColumnDef::new(Notifications::Message).text().null())
                    .col(
                        ColumnDef::new(Notifications::Read)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Notifications::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 审计日志表
        manager
            .create_table(
                Table::create()
                    .table(AuditLogs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(AuditLogs::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(AuditLogs::UserId).string().null())
                    .col(ColumnDef::new(AuditLogs::Action).string().not_null())
                    .col(ColumnDef::new(AuditLogs::ResourceType).string().null())
                    .col(ColumnDef::new(AuditLogs::ResourceId).string().null())
                    .col(ColumnDef::new(AuditLogs::Details).text().null())
                    .col(ColumnDef::new(AuditLogs::IpAddress).string().null())
                    .col(ColumnDef::new(AuditLogs::UserAgent).string().null())
                    .col(ColumnDef::new(AuditLogs::CreatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        // 内容举报表
        manager
            .create_table(
                Table::create()
                    .table(ContentReports::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ContentReports::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ContentReports::HomeworkId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ContentReports::ReportedBy)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ContentReports::Reason).string().not_null())
                    .col(ColumnDef::new(ContentReports::Description).text().null())
                    .col(
                        ColumnDef::new(ContentReports::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(ContentReports::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ContentReports::Table, ContentReports::HomeworkId)
                            .to(Homework::Table, Homework::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_profiles_class_id")
                    .table(Profiles::Table)
                    .col(Profiles::ClassId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_homework_class_due")
                    .table(Homework::Table)
                    .col(Homework::ClassId)
                    .col(Homework::DueDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_homework_attachments_homework_id")
                    .table(HomeworkAttachments::Table)
                    .col(HomeworkAttachments::HomeworkId)
                    .to_owned(),
            )
            .await?;

        // 每个用户对每份作业最多一条完成记录，upsert 依赖此唯一索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_homework_completion_homework_user")
                    .table(HomeworkCompletion::Table)
                    .col(HomeworkCompletion::HomeworkId)
                    .col(HomeworkCompletion::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_announcements_class_id")
                    .table(Announcements::Table)
                    .col(Announcements::ClassId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_notifications_user_id")
                    .table(Notifications::Table)
                    .col(Notifications::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_audit_logs_user_id")
                    .table(AuditLogs::Table)
                    .col(AuditLogs::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 按照创建的相反顺序删除
        manager
            .drop_table(Table::drop().table(ContentReports::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AuditLogs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Notifications::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Announcements::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(HomeworkCompletion::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(HomeworkAttachments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Homework::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Profiles::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Classes::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Classes {
    #[sea_orm(iden = "classes")]
    Table,
    Id,
    Code,
    Name,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Profiles {
    #[sea_orm(iden = "profiles")]
    Table,
    Id,
    ClassId,
    DisplayName,
    AvatarUrl,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Homework {
    #[sea_orm(iden = "homework")]
    Table,
    Id,
    ClassId,
    Title,
    Description,
    Subject,
    DueDate,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum HomeworkAttachments {
    #[sea_orm(iden = "homework_attachments")]
    Table,
    Id,
    HomeworkId,
    StoragePath,
    Filename,
    MimeType,
    UploadedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
enum HomeworkCompletion {
    #[sea_orm(iden = "homework_completion")]
    Table,
    Id,
    HomeworkId,
    UserId,
    Done,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Announcements {
    #[sea_orm(iden = "announcements")]
    Table,
    Id,
    ClassId,
    Title,
    Content,
    Priority,
    Pinned,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Notifications {
    #[sea_orm(iden = "notifications")]
    Table,
    Id,
    UserId,
    ClassId,
    Type,
    Title,
    Message,
    Read,
    CreatedAt,
}

#[derive(DeriveIden)]
enum AuditLogs {
    #[sea_orm(iden = "audit_logs")]
    Table,
    Id,
    UserId,
    Action,
    ResourceType,
    ResourceId,
    Details,
    IpAddress,
    UserAgent,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ContentReports {
    #[sea_orm(iden = "content_reports")]
    Table,
    Id,
    HomeworkId,
    ReportedBy,
    Reason,
    Description,
    Status,
    CreatedAt,
}
