//! Database repository for CRUD operations.
//!
//! `Repository` is split across files by entity; this file holds the struct,
//! user accounts and the row-conversion helpers shared by the others.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::now_timestamp;
use crate::errors::AppError;
use crate::models::{Role, User};

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pub(super) pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== USER OPERATIONS ====================

    /// Insert a user with an explicit role.
    pub async fn create_user(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = now_timestamp();

        sqlx::query(
            "INSERT INTO users (id, email, name, role, password_hash, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(email)
        .bind(name)
        .bind(role.as_str())
        .bind(password_hash)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(User {
            id,
            email: email.to_string(),
            name: name.to_string(),
            role,
            password_hash: password_hash.to_string(),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Sign a new user up. The very first account becomes an admin.
    ///
    /// The role is decided inside the INSERT so concurrent first signups
    /// cannot both see an empty table.
    pub async fn register_user(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
    ) -> Result<User, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = now_timestamp();

        let row = sqlx::query(
            r#"
            INSERT INTO users (id, email, name, role, password_hash, created_at, updated_at)
            SELECT ?, ?, ?,
                   CASE WHEN (SELECT COUNT(*) FROM users) = 0 THEN ? ELSE ? END,
                   ?, ?, ?
            RETURNING id, email, name, role, password_hash, created_at, updated_at
            "#,
        )
        .bind(&id)
        .bind(email)
        .bind(name)
        .bind(Role::Admin.as_str())
        .bind(Role::Agent.as_str())
        .bind(password_hash)
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.pool)
        .await?;

        let user = user_from_row(&row)?;
        tracing::info!(user_id = %user.id, role = user.role.as_str(), "User registered");
        Ok(user)
    }

    /// Look a user up by (already normalized) email.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query(
            "SELECT id, email, name, role, password_hash, created_at, updated_at FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(user_from_row).transpose()?)
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query(
            "SELECT id, email, name, role, password_hash, created_at, updated_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(user_from_row).transpose()?)
    }

    /// List all users.
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let rows = sqlx::query(
            "SELECT id, email, name, role, password_hash, created_at, updated_at FROM users ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(user_from_row).collect::<Result<_, _>>()?)
    }

    pub async fn update_user_role(&self, id: &str, role: Role) -> Result<User, AppError> {
        let now = now_timestamp();
        let result = sqlx::query("UPDATE users SET role = ?, updated_at = ? WHERE id = ?")
            .bind(role.as_str())
            .bind(&now)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {} not found", id)));
        }

        self.get_user(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }
}

// Helper functions for row conversion

fn user_from_row(row: &SqliteRow) -> Result<User, sqlx::Error> {
    let role: String = row.try_get("role")?;
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        role: parse_column("role", &role, Role::parse)?,
        password_hash: row.try_get("password_hash")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Decode an enum stored as TEXT.
pub(super) fn parse_column<T>(
    column: &str,
    raw: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T, sqlx::Error> {
    parse(raw).ok_or_else(|| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: format!("unexpected value {:?}", raw).into(),
    })
}

pub(super) fn parse_json_array(s: &str) -> Vec<String> {
    serde_json::from_str(s).unwrap_or_default()
}

pub(super) fn to_json_array(values: &[String]) -> String {
    serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use crate::db::test_support;
    use crate::errors::AppError;
    use crate::models::Role;

    #[tokio::test]
    async fn test_first_user_is_admin() {
        let (repo, _dir) = test_support::repo().await;

        let first = repo.register_user("a@example.com", "Ana", "h").await.unwrap();
        let second = repo.register_user("b@example.com", "Beto", "h").await.unwrap();

        assert_eq!(first.role, Role::Admin);
        assert_eq!(second.role, Role::Agent);
        assert_eq!(repo.list_users().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_first_signups_yield_one_admin() {
        let (repo, _dir) = test_support::repo().await;

        let handles: Vec<_> = (0..5)
            .map(|i| {
                let repo = repo.clone();
                tokio::spawn(async move {
                    repo.register_user(&format!("user{}@example.com", i), "User", "h")
                        .await
                })
            })
            .collect();

        let mut admins = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().role == Role::Admin {
                admins += 1;
            }
        }
        assert_eq!(admins, 1);
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let (repo, _dir) = test_support::repo().await;

        repo.register_user("a@example.com", "Ana", "h").await.unwrap();
        let err = repo
            .register_user("a@example.com", "Otra", "h")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_role() {
        let (repo, _dir) = test_support::repo().await;
        let user = test_support::user(&repo, "c@example.com").await;

        let updated = repo.update_user_role(&user.id, Role::Admin).await.unwrap();
        assert_eq!(updated.role, Role::Admin);

        let found = repo.find_user_by_email("c@example.com").await.unwrap().unwrap();
        assert_eq!(found.role, Role::Admin);

        assert!(matches!(
            repo.update_user_role("missing", Role::Agent).await,
            Err(AppError::NotFound(_))
        ));
    }
}
