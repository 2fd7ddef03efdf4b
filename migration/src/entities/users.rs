use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_staff: bool,
    pub date_joined: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::visited_city::Entity")]
    VisitedCity,
    #[sea_orm(has_many = "super::personal_collection::Entity")]
    PersonalCollection,
}

impl Related<super::visited_city::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VisitedCity.def()
    }
}

impl Related<super::personal_collection::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PersonalCollection.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
