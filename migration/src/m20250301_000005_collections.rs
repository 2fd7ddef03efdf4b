use sea_orm_migration::prelude::*;

use crate::m20250301_000001_users::Users;
use crate::m20250301_000002_geography::City;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Collection::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Collection::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Collection::Title).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CollectionCity::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CollectionCity::CollectionId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CollectionCity::CityId).integer().not_null())
                    .primary_key(
                        Index::create()
                            .col(CollectionCity::CollectionId)
                            .col(CollectionCity::CityId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_collection_city_collection")
                            .from(CollectionCity::Table, CollectionCity::CollectionId)
                            .to(Collection::Table, Collection::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_collection_city_city")
                            .from(CollectionCity::Table, CollectionCity::CityId)
                            .to(City::Table, City::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PersonalCollection::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PersonalCollection::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PersonalCollection::OwnerId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PersonalCollection::Title)
                            .string_len(256)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PersonalCollection::IsPublic)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(PersonalCollection::IsCopied)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(PersonalCollection::CopiedFromId)
                            .integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PersonalCollection::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PersonalCollection::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_personal_collection_owner")
                            .from(PersonalCollection::Table, PersonalCollection::OwnerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_personal_collection_copied_from")
                            .from(
                                PersonalCollection::Table,
                                PersonalCollection::CopiedFromId,
                            )
                            .to(PersonalCollection::Table, PersonalCollection::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PersonalCollectionCity::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PersonalCollectionCity::PersonalCollectionId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PersonalCollectionCity::CityId)
                            .integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(PersonalCollectionCity::PersonalCollectionId)
                            .col(PersonalCollectionCity::CityId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_personal_collection_city_collection")
                            .from(
                                PersonalCollectionCity::Table,
                                PersonalCollectionCity::PersonalCollectionId,
                            )
                            .to(PersonalCollection::Table, PersonalCollection::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_personal_collection_city_city")
                            .from(PersonalCollectionCity::Table, PersonalCollectionCity::CityId)
                            .to(City::Table, City::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_personal_collection_public")
                    .table(PersonalCollection::Table)
                    .col(PersonalCollection::IsPublic)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PersonalCollectionCity::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PersonalCollection::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CollectionCity::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Collection::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Collection {
    Table,
    Id,
    Title,
}

#[derive(DeriveIden)]
enum CollectionCity {
    Table,
    CollectionId,
    CityId,
}

#[derive(DeriveIden)]
enum PersonalCollection {
    Table,
    Id,
    OwnerId,
    Title,
    IsPublic,
    IsCopied,
    CopiedFromId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum PersonalCollectionCity {
    Table,
    PersonalCollectionId,
    CityId,
}
