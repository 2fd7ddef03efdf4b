//! CSV 导出

use csv::WriterBuilder;
use serde::Serialize;

use crate::errors::{Result, TravelbookError};
use crate::services::CityVisitSummary;

/// 导出 CSV 的一行
#[derive(Debug, Clone, Serialize)]
pub struct CsvVisitedCityRow {
    pub city_id: i32,
    pub title: String,
    pub country_id: i32,
    pub region_id: Option<i32>,
    pub number_of_visits: i64,
    pub first_visit_date: String,
    pub last_visit_date: String,
    pub average_rating: Option<f64>,
    pub has_magnet: bool,
}

impl From<&CityVisitSummary> for CsvVisitedCityRow {
    fn from(city: &CityVisitSummary) -> Self {
        Self {
            city_id: city.city_id,
            title: city.title.clone(),
            country_id: city.country_id,
            region_id: city.region_id,
            number_of_visits: city.number_of_visits,
            first_visit_date: city
                .first_visit_date
                .map(|d| d.to_string())
                .unwrap_or_default(),
            last_visit_date: city
                .last_visit_date
                .map(|d| d.to_string())
                .unwrap_or_default(),
            average_rating: city.average_rating,
            has_magnet: city.has_magnet,
        }
    }
}

/// 将访问城市列表写成带表头的 CSV 文本
pub fn visited_cities_to_csv(cities: &[CityVisitSummary]) -> Result<String> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(Vec::new());

    for city in cities {
        writer.serialize(CsvVisitedCityRow::from(city))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| TravelbookError::serialization(format!("CSV flush failed: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| TravelbookError::serialization(format!("CSV is not valid UTF-8: {}", e)))
}
