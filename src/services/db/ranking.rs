use sea_orm::sea_query::{Expr, Order};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, ExprTrait, FromQueryResult, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait,
};
use serde::{Deserialize, Serialize};

use super::CityScope;
use crate::errors::Result;
use migration::entities::{city, visited_city};

/// 排名依据
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingKind {
    /// 访问过该城市的不同用户数
    Users,
    /// 全部访问记录数
    Visits,
}

#[derive(Debug, Clone, FromQueryResult)]
struct RankingRow {
    city_id: i32,
    title: String,
    total: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedCity {
    /// 从 1 开始的名次
    pub rank: u64,
    pub city_id: i32,
    pub title: String,
    pub total: i64,
}

/// 范围内所有城市的排名（包括无人访问的城市）
///
/// 按数量降序，其次城市名、id 升序；名次等于排序后的位置。
pub async fn city_ranking<C: ConnectionTrait>(
    db: &C,
    scope: CityScope,
    kind: RankingKind,
) -> Result<Vec<RankedCity>> {
    let total = match kind {
        // 每个 (user, city) 恰好有一条 is_first_visit 记录
        RankingKind::Users => Expr::case(visited_city::Column::IsFirstVisit.eq(true), 1)
            .finally(0)
            .sum(),
        RankingKind::Visits => visited_city::Column::Id.count(),
    };

    let rows = city::Entity::find()
        .select_only()
        .column_as(city::Column::Id, "city_id")
        .column(city::Column::Title)
        .column_as(total, "total")
        .join(JoinType::LeftJoin, city::Relation::VisitedCity.def())
        .filter(scope.condition())
        .group_by(city::Column::Id)
        .group_by(city::Column::Title)
        .order_by(Expr::cust("total"), Order::Desc)
        .order_by(city::Column::Title, Order::Asc)
        .order_by(city::Column::Id, Order::Asc)
        .into_model::<RankingRow>()
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .enumerate()
        .map(|(idx, row)| RankedCity {
            rank: idx as u64 + 1,
            city_id: row.city_id,
            title: row.title,
            total: row.total,
        })
        .collect())
}

/// 城市在排名中的名次
pub fn rank_of(ranking: &[RankedCity], city_id: i32) -> Option<u64> {
    ranking.iter().find(|c| c.city_id == city_id).map(|c| c.rank)
}

/// 以城市为中心的 2n+1 个邻近名次
///
/// 靠近列表两端时窗口整体平移，保持长度不变（列表足够长时）。
pub fn neighboring_cities(ranking: &[RankedCity], city_id: i32, n: usize) -> Vec<RankedCity> {
    let Some(pos) = ranking.iter().position(|c| c.city_id == city_id) else {
        return Vec::new();
    };

    let window = 2 * n + 1;
    let mut start = pos.saturating_sub(n);
    let end = (start + window).min(ranking.len());
    start = end.saturating_sub(window);

    ranking[start..end].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranking(len: usize) -> Vec<RankedCity> {
        (0..len)
            .map(|i| RankedCity {
                rank: i as u64 + 1,
                city_id: i as i32 + 100,
                title: format!("City {}", i),
                total: (len - i) as i64,
            })
            .collect()
    }

    fn ranks(cities: &[RankedCity]) -> Vec<u64> {
        cities.iter().map(|c| c.rank).collect()
    }

    #[test]
    fn test_neighbors_centered() {
        let list = ranking(20);
        assert_eq!(ranks(&neighboring_cities(&list, 109, 2)), vec![8, 9, 10, 11, 12]);
    }

    #[test]
    fn test_neighbors_shift_at_edges() {
        let list = ranking(20);
        assert_eq!(ranks(&neighboring_cities(&list, 100, 2)), vec![1, 2, 3, 4, 5]);
        assert_eq!(ranks(&neighboring_cities(&list, 119, 2)), vec![16, 17, 18, 19, 20]);
    }

    #[test]
    fn test_neighbors_short_list() {
        let list = ranking(3);
        assert_eq!(ranks(&neighboring_cities(&list, 101, 5)), vec![1, 2, 3]);
        assert!(neighboring_cities(&list, 999, 5).is_empty());
    }

    #[test]
    fn test_rank_of() {
        let list = ranking(5);
        assert_eq!(rank_of(&list, 102), Some(3));
        assert_eq!(rank_of(&list, 1), None);
    }
}
