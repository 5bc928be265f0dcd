//! 班级实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "classes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub code: String,
    pub name: Option<String>,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::profiles::Entity")]
    Profiles,
    #[sea_orm(has_many = "super::homework::Entity")]
    Homework,
}

impl Related<super::profiles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profiles.def()
    }
}

impl Related<super::homework::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Homework.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_class(self) -> crate::models::classes::entities::Class {
        crate::models::classes::entities::Class {
            id: self.id,
            code: self.code,
            name: self.name,
            created_at: super::from_unix(self.created_at),
        }
    }

    /// 加入码查询的返回行，class_id 与 id 相同
    pub fn into_lookup_row(self) -> crate::models::classes::entities::ClassLookupRow {
        crate::models::classes::entities::ClassLookupRow {
            class_id: Some(self.id.clone()),
            id: self.id,
            code: self.code,
            name: self.name,
        }
    }
}
