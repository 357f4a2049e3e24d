use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::Profile,
};

pub struct ProfileService {
    db: PgPool,
}

impl ProfileService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn get_profile(&self, user_id: Uuid) -> AppResult<Profile> {
        let profile: Option<Profile> = sqlx::query_as("SELECT * FROM profiles WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?;

        profile.ok_or(AppError::ProfileNotFound)
    }

    /// Create or update the caller's profile. Avatar upload happens
    /// elsewhere; only the resulting URL is stored here.
    pub async fn upsert_profile(
        &self,
        user_id: Uuid,
        full_name: &str,
        age_range: Option<String>,
        gender: Option<String>,
        avatar_url: Option<String>,
    ) -> AppResult<Profile> {
        let full_name = full_name.trim();
        if full_name.is_empty() {
            return Err(AppError::Validation(
                "full_name must not be empty".to_string(),
            ));
        }

        let profile: Profile = sqlx::query_as(
            r#"
            INSERT INTO profiles (id, full_name, age_range, gender, avatar_url)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                full_name = EXCLUDED.full_name,
                age_range = EXCLUDED.age_range,
                gender = EXCLUDED.gender,
                avatar_url = EXCLUDED.avatar_url,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(full_name)
        .bind(age_range)
        .bind(gender)
        .bind(avatar_url)
        .fetch_one(&self.db)
        .await?;

        Ok(profile)
    }
}
