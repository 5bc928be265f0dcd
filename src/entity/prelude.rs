//! 预导入模块，方便使用

pub use super::announcements::{
    ActiveModel as AnnouncementActiveModel, Entity as Announcements, Model as AnnouncementModel,
};
pub use super::audit_logs::{
    ActiveModel as AuditLogActiveModel, Entity as AuditLogs, Model as AuditLogModel,
};
pub use super::classes::{ActiveModel as ClassActiveModel, Entity as Classes, Model as ClassModel};
pub use super::content_reports::{
    ActiveModel as ContentReportActiveModel, Entity as ContentReports,
    Model as ContentReportModel,
};
pub use super::homework::{
    ActiveModel as HomeworkActiveModel, Entity as Homework, Model as HomeworkModel,
};
pub use super::homework_attachments::{
    ActiveModel as AttachmentActiveModel, Entity as HomeworkAttachments,
    Model as AttachmentModel,
};
pub use super::homework_completion::{
    ActiveModel as CompletionActiveModel, Entity as HomeworkCompletion,
    Model as CompletionModel,
};
pub use super::notifications::{
    ActiveModel as NotificationActiveModel, Entity as Notifications, Model as NotificationModel,
};
pub use super::profiles::{
    ActiveModel as ProfileActiveModel, Entity as Profiles, Model as ProfileModel,
};
