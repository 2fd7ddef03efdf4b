use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "personal_collection_city")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub personal_collection_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub city_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::personal_collection::Entity",
        from = "Column::PersonalCollectionId",
        to = "super::personal_collection::Column::Id"
    )]
    PersonalCollection,
    #[sea_orm(
        belongs_to = "super::city::Entity",
        from = "Column::CityId",
        to = "super::city::Column::Id"
    )]
    City,
}

impl Related<super::personal_collection::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PersonalCollection.def()
    }
}

impl Related<super::city::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::City.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
