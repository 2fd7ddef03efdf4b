use sea_orm_migration::prelude::*;

use crate::m20250301_000001_users::Users;
use crate::m20250301_000002_geography::{City, Country};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建 visited_city 表
        manager
            .create_table(
                Table::create()
                    .table(VisitedCity::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VisitedCity::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(VisitedCity::UserId).integer().not_null())
                    .col(ColumnDef::new(VisitedCity::CityId).integer().not_null())
                    .col(ColumnDef::new(VisitedCity::DateOfVisit).date().null())
                    .col(
                        ColumnDef::new(VisitedCity::HasMagnet)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(VisitedCity::Impression).text().null())
                    .col(ColumnDef::new(VisitedCity::Rating).integer().not_null())
                    .col(
                        ColumnDef::new(VisitedCity::IsFirstVisit)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(VisitedCity::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VisitedCity::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_visited_city_user")
                            .from(VisitedCity::Table, VisitedCity::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_visited_city_city")
                            .from(VisitedCity::Table, VisitedCity::CityId)
                            .to(City::Table, City::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // (user, city, date_of_visit) 唯一
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uniq_visited_city_user_city_date")
                    .table(VisitedCity::Table)
                    .col(VisitedCity::UserId)
                    .col(VisitedCity::CityId)
                    .col(VisitedCity::DateOfVisit)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_visited_city_city_first")
                    .table(VisitedCity::Table)
                    .col(VisitedCity::CityId)
                    .col(VisitedCity::IsFirstVisit)
                    .to_owned(),
            )
            .await?;

        // 创建 visited_country 表
        manager
            .create_table(
                Table::create()
                    .table(VisitedCountry::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VisitedCountry::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(VisitedCountry::UserId).integer().not_null())
                    .col(
                        ColumnDef::new(VisitedCountry::CountryId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VisitedCountry::AddedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_visited_country_user")
                            .from(VisitedCountry::Table, VisitedCountry::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_visited_country_country")
                            .from(VisitedCountry::Table, VisitedCountry::CountryId)
                            .to(Country::Table, Country::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uniq_visited_country_user_country")
                    .table(VisitedCountry::Table)
                    .col(VisitedCountry::UserId)
                    .col(VisitedCountry::CountryId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(VisitedCountry::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(VisitedCity::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum VisitedCity {
    Table,
    Id,
    UserId,
    CityId,
    DateOfVisit,
    HasMagnet,
    Impression,
    Rating,
    IsFirstVisit,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum VisitedCountry {
    Table,
    Id,
    UserId,
    CountryId,
    AddedAt,
}
