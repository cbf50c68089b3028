//! Setting Repository (typed key-value)

use super::{RepoError, RepoResult};
use shared::models::{SettingRow, SettingValue};
use sqlx::SqlitePool;

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<SettingRow>> {
    let rows = sqlx::query_as::<_, SettingRow>(
        "SELECT key, value, value_type, description, updated_at FROM setting ORDER BY key",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find_by_key(pool: &SqlitePool, key: &str) -> RepoResult<Option<SettingRow>> {
    let row = sqlx::query_as::<_, SettingRow>(
        "SELECT key, value, value_type, description, updated_at FROM setting WHERE key = ?",
    )
    .bind(key)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Overwrite the value of an existing key; the declared type never changes
pub async fn update_value(pool: &SqlitePool, key: &str, value: &SettingValue) -> RepoResult<SettingRow> {
    let now = shared::util::now_millis();
    let rows = sqlx::query("UPDATE setting SET value = ?1, updated_at = ?2 WHERE key = ?3 AND value_type = ?4")
        .bind(value.to_raw())
        .bind(now)
        .bind(key)
        .bind(value.value_type())
        .execute(pool)
        .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Setting {key} not found")));
    }
    find_by_key(pool, key)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Setting {key} not found")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use shared::models::{SETTING_DEFAULT_CURRENCY, SETTING_THEME, SettingType};

    #[tokio::test]
    async fn seeded_settings() {
        let pool = test_pool().await;
        let theme = find_by_key(&pool, SETTING_THEME).await.unwrap().unwrap();
        assert_eq!(theme.value_type, SettingType::String);
        assert_eq!(theme.value, "light");
        assert!(find_by_key(&pool, SETTING_DEFAULT_CURRENCY).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn update_checks_declared_type() {
        let pool = test_pool().await;
        let row = update_value(&pool, SETTING_THEME, &SettingValue::String("dark".into()))
            .await
            .unwrap();
        assert_eq!(row.value, "dark");

        let err = update_value(&pool, SETTING_THEME, &SettingValue::Integer(3))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::NotFound(_)));
    }
}
