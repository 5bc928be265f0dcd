//! 作业完成状态实体，(homework_id, user_id) 唯一

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "homework_completion")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub homework_id: String,
    pub user_id: String,
    pub done: bool,
    /// 毫秒
    pub updated_at: i64,
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
    pub fn into_completion(self) -> crate::models::homework::entities::Completion {
        crate::models::homework::entities::Completion {
            id: self.id,
            homework_id: self.homework_id,
            user_id: self.user_id,
            done: self.done,
            updated_at: super::from_unix_millis(self.updated_at),
        }
    }
}
