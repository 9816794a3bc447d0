//! SQLite birthday table.
//!
//! The table keeps its historical shape, `birthdays(user_id, username,
//! birthday)` keyed by `(user_id, username)`, so existing databases open
//! unchanged. Upserts replace every row of the user so a renamed account
//! does not end up with two birthdays.

use hearth_common::UserId;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::date::BirthdayDate;
use crate::error::Result;

/// One stored birthday.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BirthdayRecord {
    /// Discord user.
    pub user: UserId,
    /// Username at the time the birthday was saved.
    pub username: String,
    /// The birthday.
    pub date: BirthdayDate,
}

/// Birthday persistence over a SQLite pool.
#[derive(Debug, Clone)]
pub struct BirthdayStore {
    pool: SqlitePool,
}

// Discord snowflakes use 63 bits, so they fit SQLite's signed INTEGER.
fn sql_id(user: UserId) -> i64 {
    user.0 as i64
}

impl BirthdayStore {
    /// Open (creating if needed) the database file at `path`.
    pub async fn connect(path: &Path) -> Result<Self> {
        info!("Opening birthday database at {}", path.display());
        let options = SqliteConnectOptions::new().filename(path).create_if_missing(true);
        let pool = SqlitePoolOptions::new().max_connections(4).connect_with(options).await?;
        Self::with_pool(pool).await
    }

    /// A private in-memory database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self> {
        let store = Self { pool };
        store.initialize_schema().await?;
        Ok(store)
    }

    async fn initialize_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS birthdays (
                user_id INTEGER,
                username TEXT,
                birthday TEXT,
                PRIMARY KEY (user_id, username)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        debug!("Birthday schema ready");
        Ok(())
    }

    /// Save or replace the birthday of a user.
    pub async fn set(&self, user: UserId, username: &str, date: BirthdayDate) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM birthdays WHERE user_id = ?")
            .bind(sql_id(user))
            .execute(&mut *tx)
            .await?;
        sqlx::query("INSERT INTO birthdays (user_id, username, birthday) VALUES (?, ?, ?)")
            .bind(sql_id(user))
            .bind(username)
            .bind(date.to_string())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(user = %user, date = %date, "Birthday saved");
        Ok(())
    }

    /// The birthday of a user, if known.
    pub async fn get(&self, user: UserId) -> Result<Option<BirthdayDate>> {
        let stored: Option<String> = sqlx::query_scalar("SELECT birthday FROM birthdays WHERE user_id = ? LIMIT 1")
            .bind(sql_id(user))
            .fetch_optional(&self.pool)
            .await?;

        Ok(stored.and_then(|raw| match raw.parse() {
            Ok(date) => Some(date),
            Err(_) => {
                warn!(user = %user, birthday = %raw, "Ignoring unreadable stored birthday");
                None
            }
        }))
    }

    /// Every stored birthday in calendar order.
    pub async fn list(&self) -> Result<Vec<BirthdayRecord>> {
        let rows: Vec<(i64, String, String)> =
            sqlx::query_as("SELECT user_id, username, birthday FROM birthdays")
                .fetch_all(&self.pool)
                .await?;

        let mut records: Vec<_> = rows
            .into_iter()
            .filter_map(|(user_id, username, birthday)| match birthday.parse() {
                Ok(date) => Some(BirthdayRecord {
                    user: UserId(user_id as u64),
                    username,
                    date,
                }),
                Err(_) => {
                    warn!(user_id, birthday = %birthday, "Skipping unreadable stored birthday");
                    None
                }
            })
            .collect();
        // Stored strings may be unpadded ("1-5"), so sort on the parsed date.
        records.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.username.cmp(&b.username)));
        Ok(records)
    }

    /// Close every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Remove the birthday of a user. Returns whether anything was removed.
    pub async fn remove(&self, user: UserId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM birthdays WHERE user_id = ?")
            .bind(sql_id(user))
            .execute(&self.pool)
            .await?;

        let removed = result.rows_affected() > 0;
        if removed {
            info!(user = %user, "Birthday removed");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> BirthdayDate {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let store = BirthdayStore::in_memory().await.unwrap();
        let user = UserId(1_100_000_000_000_000_001);

        assert_eq!(store.get(user).await.unwrap(), None);
        store.set(user, "ada", date("12-10")).await.unwrap();
        assert_eq!(store.get(user).await.unwrap(), Some(date("12-10")));
    }

    #[tokio::test]
    async fn test_set_replaces_previous_rows_even_after_rename() {
        let store = BirthdayStore::in_memory().await.unwrap();
        let user = UserId(5);

        store.set(user, "old-name", date("03-01")).await.unwrap();
        store.set(user, "new-name", date("03-02")).await.unwrap();

        let records = store.list().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].username, "new-name");
        assert_eq!(records[0].date, date("03-02"));
    }

    #[tokio::test]
    async fn test_list_is_in_calendar_order() {
        let store = BirthdayStore::in_memory().await.unwrap();
        store.set(UserId(1), "december", date("12-01")).await.unwrap();
        store.set(UserId(2), "january", date("01-15")).await.unwrap();
        // A legacy unpadded row written by older tooling.
        sqlx::query("INSERT INTO birthdays (user_id, username, birthday) VALUES (3, 'march', '3-7')")
            .execute(&store.pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO birthdays (user_id, username, birthday) VALUES (4, 'broken', 'soon')")
            .execute(&store.pool)
            .await
            .unwrap();

        let names: Vec<_> = store.list().await.unwrap().into_iter().map(|r| r.username).collect();
        assert_eq!(names, vec!["january", "march", "december"]);
    }

    #[tokio::test]
    async fn test_remove() {
        let store = BirthdayStore::in_memory().await.unwrap();
        store.set(UserId(9), "someone", date("07-04")).await.unwrap();

        assert!(store.remove(UserId(9)).await.unwrap());
        assert!(!store.remove(UserId(9)).await.unwrap());
        assert_eq!(store.get(UserId(9)).await.unwrap(), None);
    }
}
