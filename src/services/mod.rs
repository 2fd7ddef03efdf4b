//! Service layer for business logic
//!
//! Services own validation, transactions and ownership checks. They are
//! shared by the HTTP API and the CLI commands.

pub mod collection_service;
pub mod db;
pub mod filters;
pub mod geography_service;
pub mod pagination;
pub mod personal_collection_service;
pub mod settings_service;
pub mod statistics_service;
pub mod user_service;
pub mod visited_city_service;
pub mod visited_country_service;

pub use collection_service::CollectionService;
pub use geography_service::GeographyService;
pub use personal_collection_service::PersonalCollectionService;
pub use settings_service::SettingsService;
pub use statistics_service::StatisticsService;
pub use user_service::UserService;
pub use visited_city_service::{CityVisitSummary, VisitedCityService};
pub use visited_country_service::VisitedCountryService;
