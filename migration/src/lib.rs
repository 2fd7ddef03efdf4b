pub use sea_orm_migration::prelude::*;

pub mod entities;
mod m20250301_000001_users;
mod m20250301_000002_geography;
mod m20250301_000003_visits;
mod m20250301_000004_user_settings;
mod m20250301_000005_collections;
mod m20250301_000006_undated_visit_index;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_users::Migration),
            Box::new(m20250301_000002_geography::Migration),
            Box::new(m20250301_000003_visits::Migration),
            Box::new(m20250301_000004_user_settings::Migration),
            Box::new(m20250301_000005_collections::Migration),
            Box::new(m20250301_000006_undated_visit_index::Migration),
        ]
    }
}
