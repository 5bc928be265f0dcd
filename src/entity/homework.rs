//! 作业实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "homework")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub class_id: String,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub subject: Option<String>,
    pub due_date: i64,
    pub created_by: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::classes::Entity",
        from = "Column::ClassId",
        to = "super::classes::Column::Id"
    )]
    Class,
    #[sea_orm(has_many = "super::homework_attachments::Entity")]
    Attachments,
    #[sea_orm(has_many = "super::homework_completion::Entity")]
    Completion,
}

impl Related<super::classes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Class.def()
    }
}

impl Related<super::homework_attachments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attachments.def()
    }
}

impl Related<super::homework_completion::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Completion.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_homework(self) -> crate::models::homework::entities::Homework {
        crate::models::homework::entities::Homework {
            id: self.id,
            class_id: self.class_id,
            title: self.title,
            description: self.description,
            subject: self.subject,
            due_date: super::from_unix(self.due_date),
            created_by: self.created_by,
            created_at: super::from_unix(self.created_at),
            updated_at: super::from_unix(self.updated_at),
        }
    }
}
