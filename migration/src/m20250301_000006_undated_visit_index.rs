use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DatabaseBackend;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let conn = manager.get_connection();

        match backend {
            DatabaseBackend::Postgres | DatabaseBackend::Sqlite => {
                // 唯一索引把 NULL 视为互不相同，没有日期的访问需要部分索引
                conn.execute_unprepared(
                    "CREATE UNIQUE INDEX IF NOT EXISTS uniq_visited_city_user_city_undated \
                     ON visited_city (user_id, city_id) WHERE date_of_visit IS NULL",
                )
                .await?;
            }
            _ => {
                // MySQL 不支持部分索引，依赖写入时对城市行加锁
            }
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        match manager.get_database_backend() {
            DatabaseBackend::Postgres | DatabaseBackend::Sqlite => {
                manager
                    .get_connection()
                    .execute_unprepared("DROP INDEX IF EXISTS uniq_visited_city_user_city_undated")
                    .await?;
            }
            _ => {}
        }

        Ok(())
    }
}
