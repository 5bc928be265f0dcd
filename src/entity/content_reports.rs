//! 内容举报实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "content_reports")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub homework_id: String,
    pub reported_by: String,
    pub reason: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub status: String,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::homework::Entity",
        from = "Column::HomeworkId",
        to = "super::homework::Column::Id"
    )]
    Homework,
}

impl Related<super::homework::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Homework.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_report(self) -> crate::models::reports::ContentReport {
        crate::models::reports::ContentReport {
            id: self.id,
            homework_id: self.homework_id,
            reported_by: self.reported_by,
            reason: self.reason,
            description: self.description,
            status: self.status,
            created_at: super::from_unix(self.created_at),
        }
    }
}
