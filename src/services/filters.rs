//! Filter and sort pipelines
//!
//! Each pipeline maps a string key (as sent by the client or stored in the
//! user's default list settings) to a transformation. City pipelines work on
//! the grouped visited-city select and translate to `HAVING` / `ORDER BY`
//! clauses; region and collection pipelines work on already aggregated rows.
//!
//! Unknown keys are rejected with [`TravelbookError::UnknownParameter`].

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use sea_orm::sea_query::{Expr, Order};
use sea_orm::{ColumnTrait, ExprTrait, QueryOrder, QuerySelect, Select};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::errors::{Result, TravelbookError};
use migration::entities::{city, visited_city};

/// 解析 key，未知 key 转为 UnknownParameter
fn parse_key<T: FromStr>(key: &str, kind: &str) -> Result<T> {
    T::from_str(key.trim())
        .map_err(|_| TravelbookError::unknown_parameter(format!("Unknown {} key: {}", kind, key)))
}

// ============ City pipelines ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum CityFilter {
    Magnet,
    NoMagnet,
    CurrentYear,
    LastYear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum CitySort {
    NameDown,
    NameUp,
    FirstVisitDateDown,
    FirstVisitDateUp,
    LastVisitDateDown,
    LastVisitDateUp,
    NumberOfVisitsDown,
    NumberOfVisitsUp,
    RatingDown,
    RatingUp,
    DateOfFoundationDown,
    DateOfFoundationUp,
    Default,
}

// 聚合表达式，列名带表名前缀以兼容三种数据库
const FIRST_VISIT_SQL: &str = "MIN(visited_city.date_of_visit)";
const LAST_VISIT_SQL: &str = "MAX(visited_city.date_of_visit)";
const VISITS_SQL: &str = "COUNT(visited_city.id)";
const RATING_SQL: &str = "AVG(visited_city.rating)";
const FOUNDATION_SQL: &str = "city.date_of_foundation";

fn year_bounds(year: i32) -> (NaiveDate, NaiveDate) {
    // 1..=12 月、1..=31 日对任意年份都合法
    let start = NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(NaiveDate::MIN);
    let end = NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or(NaiveDate::MAX);
    (start, end)
}

impl CityFilter {
    pub fn parse(key: &str) -> Result<Self> {
        parse_key(key, "filter")
    }

    /// 追加 HAVING 条件
    pub fn apply(self, query: Select<city::Entity>, today: NaiveDate) -> Select<city::Entity> {
        let magnets = Expr::case(visited_city::Column::HasMagnet.eq(true), 1)
            .finally(0)
            .sum();

        match self {
            CityFilter::Magnet => query.having(magnets.gt(0)),
            CityFilter::NoMagnet => query.having(magnets.eq(0)),
            CityFilter::CurrentYear => query.having(visits_in_year(today.year()).gt(0)),
            CityFilter::LastYear => query.having(visits_in_year(today.year() - 1).gt(0)),
        }
    }
}

fn visits_in_year(year: i32) -> Expr {
    let (start, end) = year_bounds(year);
    Expr::case(visited_city::Column::DateOfVisit.between(start, end), 1)
        .finally(0)
        .sum()
}

/// 空值排在最后的排序
fn order_nulls_last(
    query: Select<city::Entity>,
    sql: &str,
    order: Order,
) -> Select<city::Entity> {
    query
        .order_by(Expr::cust(format!("{} IS NULL", sql)), Order::Asc)
        .order_by(Expr::cust(sql.to_string()), order)
}

impl CitySort {
    pub fn parse(key: &str) -> Result<Self> {
        parse_key(key, "sort")
    }

    /// 追加 ORDER BY，最后总是按城市名、id 排序保证结果稳定
    pub fn apply(self, query: Select<city::Entity>) -> Select<city::Entity> {
        let query = match self {
            CitySort::NameUp => query.order_by(city::Column::Title, Order::Asc),
            CitySort::NameDown => query.order_by(city::Column::Title, Order::Desc),
            CitySort::FirstVisitDateUp => order_nulls_last(query, FIRST_VISIT_SQL, Order::Asc),
            CitySort::FirstVisitDateDown => order_nulls_last(query, FIRST_VISIT_SQL, Order::Desc),
            CitySort::LastVisitDateUp => order_nulls_last(query, LAST_VISIT_SQL, Order::Asc),
            CitySort::LastVisitDateDown | CitySort::Default => {
                order_nulls_last(query, LAST_VISIT_SQL, Order::Desc)
            }
            CitySort::NumberOfVisitsUp => query.order_by(Expr::cust(VISITS_SQL), Order::Asc),
            CitySort::NumberOfVisitsDown => query.order_by(Expr::cust(VISITS_SQL), Order::Desc),
            CitySort::RatingUp => order_nulls_last(query, RATING_SQL, Order::Asc),
            CitySort::RatingDown => order_nulls_last(query, RATING_SQL, Order::Desc),
            CitySort::DateOfFoundationUp => order_nulls_last(query, FOUNDATION_SQL, Order::Asc),
            CitySort::DateOfFoundationDown => {
                order_nulls_last(query, FOUNDATION_SQL, Order::Desc)
            }
        };

        query
            .order_by(city::Column::Title, Order::Asc)
            .order_by(city::Column::Id, Order::Asc)
    }
}

/// 按 key 对分组后的访问城市查询追加筛选
pub fn apply_filter_to_queryset(
    query: Select<city::Entity>,
    key: &str,
    today: NaiveDate,
) -> Result<Select<city::Entity>> {
    Ok(CityFilter::parse(key)?.apply(query, today))
}

/// 按 key 对分组后的访问城市查询追加排序
pub fn apply_sort_to_queryset(query: Select<city::Entity>, key: &str) -> Result<Select<city::Entity>> {
    Ok(CitySort::parse(key)?.apply(query))
}

// ============ Region pipelines ============

/// 区域统计行（筛选/排序所需的最小信息）
pub trait RegionProgress {
    fn title(&self) -> &str;
    fn id(&self) -> i32;
    fn total_cities(&self) -> u64;
    fn visited_cities(&self) -> u64;

    fn ratio(&self) -> u64 {
        match self.total_cities() {
            0 => 0,
            total => self.visited_cities() * 100 / total,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum RegionFilter {
    Visited,
    NotVisited,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum RegionSort {
    NameUp,
    NameDown,
    VisitedDown,
    VisitedUp,
    RatioDown,
    RatioUp,
}

impl RegionFilter {
    pub fn parse(key: &str) -> Result<Self> {
        parse_key(key, "region filter")
    }

    pub fn matches<R: RegionProgress>(self, row: &R) -> bool {
        match self {
            RegionFilter::Visited => row.visited_cities() > 0,
            RegionFilter::NotVisited => row.visited_cities() == 0,
            RegionFilter::Finished => {
                row.total_cities() > 0 && row.visited_cities() == row.total_cities()
            }
        }
    }

    pub fn apply<R: RegionProgress>(self, rows: Vec<R>) -> Vec<R> {
        rows.into_iter().filter(|row| self.matches(row)).collect()
    }
}

fn by_title_then_id<R: RegionProgress>(a: &R, b: &R) -> Ordering {
    a.title().cmp(b.title()).then(a.id().cmp(&b.id()))
}

impl RegionSort {
    pub fn parse(key: &str) -> Result<Self> {
        parse_key(key, "region sort")
    }

    pub fn apply<R: RegionProgress>(self, mut rows: Vec<R>) -> Vec<R> {
        rows.sort_by(|a, b| {
            let primary = match self {
                RegionSort::NameUp => Ordering::Equal,
                RegionSort::NameDown => b.title().cmp(a.title()),
                RegionSort::VisitedDown => b.visited_cities().cmp(&a.visited_cities()),
                RegionSort::VisitedUp => a.visited_cities().cmp(&b.visited_cities()),
                RegionSort::RatioDown => b.ratio().cmp(&a.ratio()),
                RegionSort::RatioUp => a.ratio().cmp(&b.ratio()),
            };
            primary.then_with(|| by_title_then_id(a, b))
        });
        rows
    }
}

// ============ Collection pipelines ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum CollectionFilter {
    NotStarted,
    Started,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum CollectionSort {
    NameUp,
    NameDown,
    ProgressDown,
    ProgressUp,
}

impl CollectionFilter {
    pub fn parse(key: &str) -> Result<Self> {
        parse_key(key, "collection filter")
    }

    /// started 表示已开始但未完成
    pub fn matches<R: RegionProgress>(self, row: &R) -> bool {
        let finished = row.total_cities() > 0 && row.visited_cities() == row.total_cities();
        match self {
            CollectionFilter::NotStarted => row.visited_cities() == 0,
            CollectionFilter::Started => row.visited_cities() > 0 && !finished,
            CollectionFilter::Finished => finished,
        }
    }

    pub fn apply<R: RegionProgress>(self, rows: Vec<R>) -> Vec<R> {
        rows.into_iter().filter(|row| self.matches(row)).collect()
    }
}

impl CollectionSort {
    pub fn parse(key: &str) -> Result<Self> {
        parse_key(key, "collection sort")
    }

    pub fn apply<R: RegionProgress>(self, mut rows: Vec<R>) -> Vec<R> {
        rows.sort_by(|a, b| {
            let primary = match self {
                CollectionSort::NameUp => Ordering::Equal,
                CollectionSort::NameDown => b.title().cmp(a.title()),
                CollectionSort::ProgressDown => b.ratio().cmp(&a.ratio()),
                CollectionSort::ProgressUp => a.ratio().cmp(&b.ratio()),
            };
            primary.then_with(|| by_title_then_id(a, b))
        });
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, EntityTrait, QueryTrait};
    use strum::IntoEnumIterator;

    #[derive(Debug, Clone)]
    struct Row {
        id: i32,
        title: &'static str,
        total: u64,
        visited: u64,
    }

    impl RegionProgress for Row {
        fn title(&self) -> &str {
            self.title
        }
        fn id(&self) -> i32 {
            self.id
        }
        fn total_cities(&self) -> u64 {
            self.total
        }
        fn visited_cities(&self) -> u64 {
            self.visited
        }
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { id: 1, title: "Bravo", total: 10, visited: 5 },
            Row { id: 2, title: "Alpha", total: 4, visited: 4 },
            Row { id: 3, title: "Charlie", total: 8, visited: 0 },
            Row { id: 4, title: "Alpha", total: 0, visited: 0 },
        ]
    }

    fn ids(rows: &[Row]) -> Vec<i32> {
        rows.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_city_keys_parse() {
        assert_eq!(CityFilter::parse("magnet").unwrap(), CityFilter::Magnet);
        assert_eq!(CityFilter::parse("current_year").unwrap(), CityFilter::CurrentYear);
        assert_eq!(
            CitySort::parse("first_visit_date_down").unwrap(),
            CitySort::FirstVisitDateDown
        );
        assert_eq!(CitySort::parse("default").unwrap(), CitySort::Default);
        for sort in CitySort::iter() {
            assert_eq!(CitySort::parse(sort.as_ref()).unwrap(), sort);
        }
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let err = CityFilter::parse("souvenir").unwrap_err();
        assert!(matches!(err, TravelbookError::UnknownParameter(_)));
        assert!(matches!(
            CitySort::parse("name").unwrap_err(),
            TravelbookError::UnknownParameter(_)
        ));
        assert!(RegionFilter::parse("magnet").is_err());
        assert!(CollectionSort::parse("ratio_down").is_err());
    }

    #[test]
    fn test_city_filter_builds_having() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let query = city::Entity::find();
        let sql = apply_filter_to_queryset(query, "last_year", today)
            .unwrap()
            .build(DbBackend::Sqlite)
            .to_string();
        assert!(sql.contains("HAVING"));
        assert!(sql.contains("2023-01-01"));
        assert!(sql.contains("2023-12-31"));
    }

    #[test]
    fn test_city_sort_appends_tiebreak() {
        let sql = apply_sort_to_queryset(city::Entity::find(), "number_of_visits_down")
            .unwrap()
            .build(DbBackend::Sqlite)
            .to_string();
        let visits = sql.find("COUNT(visited_city.id) DESC").unwrap();
        let title = sql.find("\"city\".\"title\" ASC").unwrap();
        assert!(visits < title);
    }

    #[test]
    fn test_region_filters() {
        assert_eq!(ids(&RegionFilter::Visited.apply(rows())), vec![1, 2]);
        assert_eq!(ids(&RegionFilter::NotVisited.apply(rows())), vec![3, 4]);
        assert_eq!(ids(&RegionFilter::Finished.apply(rows())), vec![2]);
    }

    #[test]
    fn test_region_sorts() {
        assert_eq!(ids(&RegionSort::NameUp.apply(rows())), vec![2, 4, 1, 3]);
        assert_eq!(ids(&RegionSort::NameDown.apply(rows())), vec![3, 1, 2, 4]);
        assert_eq!(ids(&RegionSort::VisitedDown.apply(rows())), vec![1, 2, 4, 3]);
        assert_eq!(ids(&RegionSort::RatioDown.apply(rows())), vec![2, 1, 4, 3]);
        assert_eq!(ids(&RegionSort::RatioUp.apply(rows())), vec![4, 3, 1, 2]);
    }

    #[test]
    fn test_collection_pipelines() {
        assert_eq!(ids(&CollectionFilter::NotStarted.apply(rows())), vec![3, 4]);
        assert_eq!(ids(&CollectionFilter::Started.apply(rows())), vec![1]);
        assert_eq!(ids(&CollectionFilter::Finished.apply(rows())), vec![2]);
        assert_eq!(ids(&CollectionSort::ProgressDown.apply(rows())), vec![2, 1, 4, 3]);
    }
}
