//! 通知实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: Option<String>,
    pub class_id: Option<String>,
    #[sea_orm(column_name = "type")]
    pub notification_type: String,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub message: Option<String>,
    pub read: bool,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_notification(self) -> crate::models::notifications::entities::Notification {
        crate::models::notifications::entities::Notification {
            id: self.id,
            user_id: self.user_id,
            class_id: self.class_id,
            notification_type: self.notification_type,
            title: self.title,
            message: self.message,
            read: self.read,
            created_at: super::from_unix(self.created_at),
        }
    }
}
