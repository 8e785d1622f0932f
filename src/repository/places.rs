//! Places repository

use chrono::{NaiveDate, Utc};
use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::place::{Place, PlaceFields},
};

/// Place columns plus the aggregated security staff list
const PLACE_SELECT: &str = r#"
    SELECT p.*,
           ARRAY(
               SELECT s.user_id FROM place_security_staff s
               WHERE s.place_id = p.id ORDER BY s.user_id
           ) AS security_staff
    FROM places p
"#;

#[derive(Clone)]
pub struct PlacesRepository {
    pool: Pool<Postgres>,
}

/// Case-insensitive `LIKE` pattern matching `term` anywhere, with the
/// term's own wildcards taken literally
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.trim().to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

impl PlacesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List booking-enabled places with optional search, open-date filter and pagination
    pub async fn list_public(
        &self,
        search: Option<&str>,
        open_from: Option<NaiveDate>,
        page: i64,
        per_page: i64,
    ) -> AppResult<(Vec<Place>, i64)> {
        let offset = (page - 1) * per_page;
        let search = search.map(contains_pattern);

        let filter = r#"
            WHERE p.booking_enabled
              AND ($1::text IS NULL OR LOWER(p.name) LIKE $1 ESCAPE '\' OR LOWER(p.location) LIKE $1 ESCAPE '\')
              AND ($2::date IS NULL OR p.end_date >= $2)
        "#;

        let count_q = format!("SELECT COUNT(*) FROM places p {}", filter);
        let total = sqlx::query_scalar::<_, i64>(&count_q)
            .bind(&search)
            .bind(open_from)
            .fetch_one(&self.pool)
            .await?;

        let select_q = format!(
            "{} {} ORDER BY p.start_date, p.name LIMIT $3 OFFSET $4",
            PLACE_SELECT, filter
        );
        let rows = sqlx::query_as::<_, Place>(&select_q)
            .bind(&search)
            .bind(open_from)
            .bind(per_page)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok((rows, total))
    }

    /// Places owned by a host
    pub async fn list_by_host(&self, host_id: Uuid) -> AppResult<Vec<Place>> {
        let q = format!("{} WHERE p.host_id = $1 ORDER BY p.created_at DESC", PLACE_SELECT);
        let rows = sqlx::query_as::<_, Place>(&q)
            .bind(host_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Places a security staff member is assigned to
    pub async fn list_by_security(&self, user_id: Uuid) -> AppResult<Vec<Place>> {
        let q = format!(
            "{} WHERE EXISTS (SELECT 1 FROM place_security_staff s WHERE s.place_id = p.id AND s.user_id = $1) ORDER BY p.start_date",
            PLACE_SELECT
        );
        let rows = sqlx::query_as::<_, Place>(&q)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Get place by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Place> {
        let q = format!("{} WHERE p.id = $1", PLACE_SELECT);
        sqlx::query_as::<_, Place>(&q)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Place {} not found", id)))
    }

    /// Get place by ID and lock its row until the transaction ends.
    /// Every slot allocation for the place goes through this lock.
    pub async fn lock_by_id(&self, conn: &mut PgConnection, id: Uuid) -> AppResult<Place> {
        let q = format!("{} WHERE p.id = $1 FOR UPDATE OF p", PLACE_SELECT);
        sqlx::query_as::<_, Place>(&q)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Place {} not found", id)))
    }

    /// Create a place
    pub async fn create(&self, host_id: Uuid, fields: &PlaceFields) -> AppResult<Place> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO places (
                id, host_id, name, location, image_url, description,
                price, daily_capacity, start_date, end_date,
                refundable, before_visit_percent, same_day_percent,
                refund_description, booking_enabled
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(id)
        .bind(host_id)
        .bind(&fields.name)
        .bind(&fields.location)
        .bind(&fields.image_url)
        .bind(&fields.description)
        .bind(fields.price)
        .bind(fields.daily_capacity)
        .bind(fields.start_date)
        .bind(fields.end_date)
        .bind(fields.refundable)
        .bind(fields.before_visit_percent)
        .bind(fields.same_day_percent)
        .bind(&fields.refund_description)
        .bind(fields.booking_enabled)
        .execute(&self.pool)
        .await?;

        self.get_by_id(id).await
    }

    /// Overwrite the editable fields of a place (capacity has its own update)
    pub async fn update(&self, id: Uuid, fields: &PlaceFields) -> AppResult<Place> {
        let result = sqlx::query(
            r#"
            UPDATE places SET
                name = $1, location = $2, image_url = $3, description = $4,
                price = $5, start_date = $6, end_date = $7,
                refundable = $8, before_visit_percent = $9, same_day_percent = $10,
                refund_description = $11, booking_enabled = $12, updated_at = $13
            WHERE id = $14
            "#,
        )
        .bind(&fields.name)
        .bind(&fields.location)
        .bind(&fields.image_url)
        .bind(&fields.description)
        .bind(fields.price)
        .bind(fields.start_date)
        .bind(fields.end_date)
        .bind(fields.refundable)
        .bind(fields.before_visit_percent)
        .bind(fields.same_day_percent)
        .bind(&fields.refund_description)
        .bind(fields.booking_enabled)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Place {} not found", id)));
        }
        self.get_by_id(id).await
    }

    /// Set daily capacity inside the caller's transaction
    pub async fn set_capacity(&self, conn: &mut PgConnection, id: Uuid, capacity: i32) -> AppResult<()> {
        sqlx::query("UPDATE places SET daily_capacity = $1, updated_at = $2 WHERE id = $3")
            .bind(capacity)
            .bind(Utc::now())
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Replace the security staff of a place
    pub async fn set_security_staff(&self, id: Uuid, staff_ids: &[Uuid]) -> AppResult<Place> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM place_security_staff WHERE place_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if !staff_ids.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO place_security_staff (place_id, user_id)
                SELECT $1, UNNEST($2::uuid[])
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(id)
            .bind(staff_ids)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        self.get_by_id(id).await
    }

    /// Whether any booking references the place
    pub async fn has_bookings(&self, id: Uuid) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM bookings WHERE place_id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// Delete a place
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM places WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Place {} not found", id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("  Night Market "), "%night market%");
        assert_eq!(contains_pattern("100%"), "%100\\%%");
        assert_eq!(contains_pattern("a_b"), "%a\\_b%");
        assert_eq!(contains_pattern("c:\\x"), "%c:\\\\x%");
    }
}
