//! 作业附件实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "homework_attachments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub homework_id: String,
    pub storage_path: String,
    pub filename: String,
    pub mime_type: String,
    pub uploaded_by: Option<String>,
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
    pub fn into_attachment(self) -> crate::models::homework::entities::Attachment {
        crate::models::homework::entities::Attachment {
            id: self.id,
            homework_id: self.homework_id,
            storage_path: self.storage_path,
            filename: self.filename,
            mime_type: self.mime_type,
            uploaded_by: self.uploaded_by,
            created_at: super::from_unix(self.created_at),
        }
    }
}
