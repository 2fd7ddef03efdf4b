use sea_orm_migration::prelude::*;

use crate::m20250301_000001_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CityListDefaultSettings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CityListDefaultSettings::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CityListDefaultSettings::UserId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CityListDefaultSettings::ParameterType)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CityListDefaultSettings::ParameterValue)
                            .string_len(64)
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_city_list_settings_user")
                            .from(
                                CityListDefaultSettings::Table,
                                CityListDefaultSettings::UserId,
                            )
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 每个用户每种参数类型只保存一条
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uniq_city_list_settings_user_type")
                    .table(CityListDefaultSettings::Table)
                    .col(CityListDefaultSettings::UserId)
                    .col(CityListDefaultSettings::ParameterType)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DistrictMapColorSettings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DistrictMapColorSettings::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DistrictMapColorSettings::UserId)
                            .integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(DistrictMapColorSettings::ColorVisited)
                            .string_len(7)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DistrictMapColorSettings::ColorNotVisited)
                            .string_len(7)
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_district_colors_user")
                            .from(
                                DistrictMapColorSettings::Table,
                                DistrictMapColorSettings::UserId,
                            )
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(DistrictMapColorSettings::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(CityListDefaultSettings::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CityListDefaultSettings {
    Table,
    Id,
    UserId,
    ParameterType,
    ParameterValue,
}

#[derive(DeriveIden)]
enum DistrictMapColorSettings {
    Table,
    Id,
    UserId,
    ColorVisited,
    ColorNotVisited,
}
