use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub id: Uuid,
    pub tour_id: Uuid,
    pub user_id: Uuid,
    pub rating: i32,
    pub body: String,
    pub created_at: OffsetDateTime,
}

impl Review {
    pub async fn list_for_tour(db: &PgPool, tour_id: Uuid) -> sqlx::Result<Vec<Review>> {
        sqlx::query_as::<_, Review>(
            r#"
            SELECT id, tour_id, user_id, rating, body, created_at
            FROM reviews
            WHERE tour_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(tour_id)
        .fetch_all(db)
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> sqlx::Result<Option<Review>> {
        sqlx::query_as::<_, Review>(
            r#"
            SELECT id, tour_id, user_id, rating, body, created_at
            FROM reviews
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
    }

    pub async fn create(
        db: &PgPool,
        tour_id: Uuid,
        user_id: Uuid,
        rating: i32,
        body: &str,
    ) -> sqlx::Result<Review> {
        sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (tour_id, user_id, rating, body)
            VALUES ($1, $2, $3, $4)
            RETURNING id, tour_id, user_id, rating, body, created_at
            "#,
        )
        .bind(tour_id)
        .bind(user_id)
        .bind(rating)
        .bind(body)
        .fetch_one(db)
        .await
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> sqlx::Result<u64> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected())
    }

    /// Recomputes the tour's rating summary from its reviews. A tour with no
    /// reviews falls back to the 4.5 default.
    pub async fn recalc_tour_ratings(db: &PgPool, tour_id: Uuid) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            UPDATE tours
            SET ratings_quantity = stats.cnt,
                ratings_average = stats.avg
            FROM (
                SELECT COUNT(*)::INT AS cnt,
                       COALESCE(AVG(rating)::DOUBLE PRECISION, 4.5) AS avg
                FROM reviews
                WHERE tour_id = $1
            ) AS stats
            WHERE tours.id = $1
            "#,
        )
        .bind(tour_id)
        .execute(db)
        .await?;
        Ok(())
    }
}
