//! 用户资料实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "profiles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub class_id: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: i64,
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
    pub fn into_profile(self) -> crate::models::profiles::entities::Profile {
        crate::models::profiles::entities::Profile {
            id: self.id,
            class_id: self.class_id,
            display_name: self.display_name,
            avatar_url: self.avatar_url,
            created_at: super::from_unix(self.created_at),
        }
    }

    pub fn creator(&self) -> crate::models::homework::entities::Creator {
        crate::models::homework::entities::Creator {
            display_name: self.display_name.clone(),
            avatar_url: self.avatar_url.clone(),
        }
    }
}
