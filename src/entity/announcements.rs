//! 公告实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "announcements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub class_id: String,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub content: Option<String>,
    pub priority: String,
    pub pinned: bool,
    pub created_by: Option<String>,
    pub created_at: i64,
    pub updated_at: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::classes::Entity",
        from = "Column::ClassId",
        to = "super::classes::Column::Id"
    )]
    Class,
}

impl Related<super::classes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Class.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_announcement(self) -> crate::models::announcements::entities::Announcement {
        use crate::models::announcements::entities::{Announcement, AnnouncementPriority};

        Announcement {
            id: self.id,
            class_id: self.class_id,
            title: self.title,
            content: self.content,
            // 未知优先级按 normal 处理
            priority: self.priority.parse().unwrap_or(AnnouncementPriority::Normal),
            pinned: self.pinned,
            created_by: self.created_by,
            created_at: super::from_unix(self.created_at),
            updated_at: self.updated_at.map(super::from_unix),
        }
    }
}
