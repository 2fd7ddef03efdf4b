pub mod area;
pub mod city;
pub mod city_list_default_settings;
pub mod collection;
pub mod collection_city;
pub mod country;
pub mod district_map_color_settings;
pub mod location;
pub mod part_of_the_world;
pub mod personal_collection;
pub mod personal_collection_city;
pub mod region;
pub mod users;
pub mod visited_city;
pub mod visited_country;

pub use area::Entity as AreaEntity;
pub use city::Entity as CityEntity;
pub use city_list_default_settings::Entity as CityListDefaultSettingsEntity;
pub use collection::Entity as CollectionEntity;
pub use collection_city::Entity as CollectionCityEntity;
pub use country::Entity as CountryEntity;
pub use district_map_color_settings::Entity as DistrictMapColorSettingsEntity;
pub use location::Entity as LocationEntity;
pub use part_of_the_world::Entity as PartOfTheWorldEntity;
pub use personal_collection::Entity as PersonalCollectionEntity;
pub use personal_collection_city::Entity as PersonalCollectionCityEntity;
pub use region::Entity as RegionEntity;
pub use users::Entity as UsersEntity;
pub use visited_city::Entity as VisitedCityEntity;
pub use visited_country::Entity as VisitedCountryEntity;
