use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "collection")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::collection_city::Entity")]
    CollectionCity,
}

impl Related<super::collection_city::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CollectionCity.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
