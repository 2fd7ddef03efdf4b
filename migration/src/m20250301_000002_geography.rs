use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PartOfTheWorld::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PartOfTheWorld::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PartOfTheWorld::Name)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Location::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Location::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Location::Name)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Location::PartOfTheWorldId)
                            .integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_location_part_of_the_world")
                            .from(Location::Table, Location::PartOfTheWorldId)
                            .to(PartOfTheWorld::Table, PartOfTheWorld::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Country::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Country::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Country::Name).string().not_null())
                    .col(ColumnDef::new(Country::Fullname).string().null())
                    .col(
                        ColumnDef::new(Country::Code)
                            .string_len(2)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Country::LocationId).integer().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_country_location")
                            .from(Country::Table, Country::LocationId)
                            .to(Location::Table, Location::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Area::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Area::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Area::Title).string().not_null())
                    .col(ColumnDef::new(Area::CountryId).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_area_country")
                            .from(Area::Table, Area::CountryId)
                            .to(Country::Table, Country::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Region::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Region::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Region::Title).string().not_null())
                    .col(ColumnDef::new(Region::FullName).string().not_null())
                    .col(ColumnDef::new(Region::RegionType).string().not_null())
                    .col(ColumnDef::new(Region::Iso3166).string().null().unique_key())
                    .col(ColumnDef::new(Region::CountryId).integer().not_null())
                    .col(ColumnDef::new(Region::AreaId).integer().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_region_country")
                            .from(Region::Table, Region::CountryId)
                            .to(Country::Table, Country::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_region_area")
                            .from(Region::Table, Region::AreaId)
                            .to(Area::Table, Area::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(City::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(City::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(City::Title).string().not_null())
                    .col(ColumnDef::new(City::CountryId).integer().not_null())
                    .col(ColumnDef::new(City::RegionId).integer().null())
                    .col(ColumnDef::new(City::Population).integer().null())
                    .col(ColumnDef::new(City::DateOfFoundation).integer().null())
                    .col(ColumnDef::new(City::Latitude).double().not_null())
                    .col(ColumnDef::new(City::Longitude).double().not_null())
                    .col(ColumnDef::new(City::Wiki).string().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_city_country")
                            .from(City::Table, City::CountryId)
                            .to(Country::Table, Country::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_city_region")
                            .from(City::Table, City::RegionId)
                            .to(Region::Table, Region::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // 按地区、国家查询城市的索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_city_region")
                    .table(City::Table)
                    .col(City::RegionId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_city_country")
                    .table(City::Table)
                    .col(City::CountryId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_region_country")
                    .table(Region::Table)
                    .col(Region::CountryId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(City::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Region::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Area::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Country::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Location::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PartOfTheWorld::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum PartOfTheWorld {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
pub(crate) enum Location {
    Table,
    Id,
    Name,
    PartOfTheWorldId,
}

#[derive(DeriveIden)]
pub(crate) enum Country {
    Table,
    Id,
    Name,
    Fullname,
    Code,
    LocationId,
}

#[derive(DeriveIden)]
pub(crate) enum Area {
    Table,
    Id,
    Title,
    CountryId,
}

#[derive(DeriveIden)]
pub(crate) enum Region {
    Table,
    Id,
    Title,
    FullName,
    RegionType,
    Iso3166,
    CountryId,
    AreaId,
}

#[derive(DeriveIden)]
pub(crate) enum City {
    Table,
    Id,
    Title,
    CountryId,
    RegionId,
    Population,
    DateOfFoundation,
    Latitude,
    Longitude,
    Wiki,
}
