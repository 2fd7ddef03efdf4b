use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "location")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub part_of_the_world_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::part_of_the_world::Entity",
        from = "Column::PartOfTheWorldId",
        to = "super::part_of_the_world::Column::Id"
    )]
    PartOfTheWorld,
    #[sea_orm(has_many = "super::country::Entity")]
    Country,
}

impl Related<super::part_of_the_world::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PartOfTheWorld.def()
    }
}

impl Related<super::country::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Country.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
