use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

pub const DIFFICULTIES: [&str; 3] = ["easy", "medium", "difficult"];

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tour {
    pub id: Uuid,
    pub name: String,
    pub duration: i32,
    pub max_group_size: i32,
    pub difficulty: String,
    pub ratings_average: f64,
    pub ratings_quantity: i32,
    pub price: f64,
    pub summary: String,
    pub description: String,
    pub start_dates: Vec<OffsetDateTime>,
    pub start_lat: f64,
    pub start_lng: f64,
    pub start_address: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Default)]
pub struct TourFilter {
    pub difficulty: Option<String>,
    pub max_price: Option<f64>,
}

/// Projection for the ratings/price statistics. The store applies the
/// rating cutoff; grouping happens in `reporting`.
#[derive(Debug, Clone, FromRow)]
pub struct StatsSource {
    pub difficulty: String,
    pub price: f64,
    pub ratings_average: f64,
    pub ratings_quantity: i32,
}

/// Projection for the monthly plan: one row per tour with its start dates.
#[derive(Debug, Clone, FromRow)]
pub struct StartDatesSource {
    pub name: String,
    pub start_dates: Vec<OffsetDateTime>,
}

/// Projection for the geo queries.
#[derive(Debug, Clone, FromRow)]
pub struct LocationSource {
    pub id: Uuid,
    pub name: String,
    pub start_lat: f64,
    pub start_lng: f64,
}

impl Tour {
    pub async fn list(
        db: &PgPool,
        filter: &TourFilter,
        limit: i64,
        offset: i64,
    ) -> sqlx::Result<Vec<Tour>> {
        sqlx::query_as::<_, Tour>(
            r#"
            SELECT id, name, duration, max_group_size, difficulty, ratings_average,
                   ratings_quantity, price, summary, description, start_dates,
                   start_lat, start_lng, start_address, created_at
            FROM tours
            WHERE ($1::TEXT IS NULL OR difficulty = $1)
              AND ($2::DOUBLE PRECISION IS NULL OR price <= $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.difficulty.as_deref())
        .bind(filter.max_price)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
    }

    /// Best-rated, cheapest-first shortlist.
    pub async fn top_five(db: &PgPool) -> sqlx::Result<Vec<Tour>> {
        sqlx::query_as::<_, Tour>(
            r#"
            SELECT id, name, duration, max_group_size, difficulty, ratings_average,
                   ratings_quantity, price, summary, description, start_dates,
                   start_lat, start_lng, start_address, created_at
            FROM tours
            ORDER BY ratings_average DESC, price ASC
            LIMIT 5
            "#,
        )
        .fetch_all(db)
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> sqlx::Result<Option<Tour>> {
        sqlx::query_as::<_, Tour>(
            r#"
            SELECT id, name, duration, max_group_size, difficulty, ratings_average,
                   ratings_quantity, price, summary, description, start_dates,
                   start_lat, start_lng, start_address, created_at
            FROM tours
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
    }

    pub async fn find_by_ids(db: &PgPool, ids: &[Uuid]) -> sqlx::Result<Vec<Tour>> {
        sqlx::query_as::<_, Tour>(
            r#"
            SELECT id, name, duration, max_group_size, difficulty, ratings_average,
                   ratings_quantity, price, summary, description, start_dates,
                   start_lat, start_lng, start_address, created_at
            FROM tours
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(db)
        .await
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        db: &PgPool,
        name: &str,
        duration: i32,
        max_group_size: i32,
        difficulty: &str,
        price: f64,
        summary: &str,
        description: &str,
        start_dates: &[OffsetDateTime],
        start_lat: f64,
        start_lng: f64,
        start_address: &str,
    ) -> sqlx::Result<Tour> {
        sqlx::query_as::<_, Tour>(
            r#"
            INSERT INTO tours (name, duration, max_group_size, difficulty, price,
                               summary, description, start_dates,
                               start_lat, start_lng, start_address)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id, name, duration, max_group_size, difficulty, ratings_average,
                      ratings_quantity, price, summary, description, start_dates,
                      start_lat, start_lng, start_address, created_at
            "#,
        )
        .bind(name)
        .bind(duration)
        .bind(max_group_size)
        .bind(difficulty)
        .bind(price)
        .bind(summary)
        .bind(description)
        .bind(start_dates)
        .bind(start_lat)
        .bind(start_lng)
        .bind(start_address)
        .fetch_one(db)
        .await
    }

    /// Partial update; unset fields keep their stored value.
    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        db: &PgPool,
        id: Uuid,
        name: Option<&str>,
        duration: Option<i32>,
        max_group_size: Option<i32>,
        difficulty: Option<&str>,
        price: Option<f64>,
        summary: Option<&str>,
        description: Option<&str>,
        start_dates: Option<&[OffsetDateTime]>,
        start_lat: Option<f64>,
        start_lng: Option<f64>,
        start_address: Option<&str>,
    ) -> sqlx::Result<Option<Tour>> {
        sqlx::query_as::<_, Tour>(
            r#"
            UPDATE tours
            SET name = COALESCE($2, name),
                duration = COALESCE($3, duration),
                max_group_size = COALESCE($4, max_group_size),
                difficulty = COALESCE($5, difficulty),
                price = COALESCE($6, price),
                summary = COALESCE($7, summary),
                description = COALESCE($8, description),
                start_dates = COALESCE($9, start_dates),
                start_lat = COALESCE($10, start_lat),
                start_lng = COALESCE($11, start_lng),
                start_address = COALESCE($12, start_address)
            WHERE id = $1
            RETURNING id, name, duration, max_group_size, difficulty, ratings_average,
                      ratings_quantity, price, summary, description, start_dates,
                      start_lat, start_lng, start_address, created_at
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(duration)
        .bind(max_group_size)
        .bind(difficulty)
        .bind(price)
        .bind(summary)
        .bind(description)
        .bind(start_dates)
        .bind(start_lat)
        .bind(start_lng)
        .bind(start_address)
        .fetch_optional(db)
        .await
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> sqlx::Result<u64> {
        let result = sqlx::query("DELETE FROM tours WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn stats_source(db: &PgPool, min_rating: f64) -> sqlx::Result<Vec<StatsSource>> {
        sqlx::query_as::<_, StatsSource>(
            r#"
            SELECT difficulty, price, ratings_average, ratings_quantity
            FROM tours
            WHERE ratings_average >= $1
            "#,
        )
        .bind(min_rating)
        .fetch_all(db)
        .await
    }

    pub async fn start_dates_source(db: &PgPool) -> sqlx::Result<Vec<StartDatesSource>> {
        sqlx::query_as::<_, StartDatesSource>(
            r#"
            SELECT name, start_dates
            FROM tours
            WHERE cardinality(start_dates) > 0
            "#,
        )
        .fetch_all(db)
        .await
    }

    pub async fn locations(db: &PgPool) -> sqlx::Result<Vec<LocationSource>> {
        sqlx::query_as::<_, LocationSource>(
            r#"
            SELECT id, name, start_lat, start_lng
            FROM tours
            "#,
        )
        .fetch_all(db)
        .await
    }
}
