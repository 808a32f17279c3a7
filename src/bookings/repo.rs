use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub tour_id: Uuid,
    pub user_id: Uuid,
    pub price: f64,
    pub paid: bool,
    pub created_at: OffsetDateTime,
}

impl Booking {
    /// Records a booking with the tour's price at booking time.
    pub async fn create(
        db: &PgPool,
        tour_id: Uuid,
        user_id: Uuid,
        price: f64,
    ) -> sqlx::Result<Booking> {
        sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (tour_id, user_id, price)
            VALUES ($1, $2, $3)
            RETURNING id, tour_id, user_id, price, paid, created_at
            "#,
        )
        .bind(tour_id)
        .bind(user_id)
        .bind(price)
        .fetch_one(db)
        .await
    }

    pub async fn list_for_user(db: &PgPool, user_id: Uuid) -> sqlx::Result<Vec<Booking>> {
        sqlx::query_as::<_, Booking>(
            r#"
            SELECT id, tour_id, user_id, price, paid, created_at
            FROM bookings
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await
    }

    pub async fn list_all(db: &PgPool, limit: i64, offset: i64) -> sqlx::Result<Vec<Booking>> {
        sqlx::query_as::<_, Booking>(
            r#"
            SELECT id, tour_id, user_id, price, paid, created_at
            FROM bookings
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
    }
}
