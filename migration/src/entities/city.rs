use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "city")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub country_id: i32,
    pub region_id: Option<i32>,
    pub population: Option<i32>,
    /// 建城年份
    pub date_of_foundation: Option<i32>,
    pub latitude: f64,
    pub longitude: f64,
    pub wiki: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::country::Entity",
        from = "Column::CountryId",
        to = "super::country::Column::Id"
    )]
    Country,
    #[sea_orm(
        belongs_to = "super::region::Entity",
        from = "Column::RegionId",
        to = "super::region::Column::Id"
    )]
    Region,
    #[sea_orm(has_many = "super::visited_city::Entity")]
    VisitedCity,
}

impl Related<super::country::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Country.def()
    }
}

impl Related<super::region::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Region.def()
    }
}

impl Related<super::visited_city::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VisitedCity.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
