use study_core::model::{Role, User, UserId};

use super::SqliteRepository;
use super::mapping::{id_i64, map_user_row, unavailable, user_id_from_i64};
use crate::repository::{StorageError, UserRepository};

const USER_COLUMNS: &str = "id, name, email, phone, role, created_at";

#[async_trait::async_trait]
impl UserRepository for SqliteRepository {
    async fn insert_new_user(&self, user: &User) -> Result<UserId, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO users (name, email, phone, role, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(user.name())
        .bind(user.email())
        .bind(user.phone())
        .bind(user.role().as_str())
        .bind(user.created_at())
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        user_id_from_i64(res.last_insert_rowid())
    }

    async fn upsert_user(&self, user: &User) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO users (id, name, email, phone, role, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    email = excluded.email,
                    phone = excluded.phone,
                    role = excluded.role
            ",
        )
        .bind(id_i64("user_id", user.id().value())?)
        .bind(user.name())
        .bind(user.email())
        .bind(user.phone())
        .bind(user.role().as_str())
        .bind(user.created_at())
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id_i64("user_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?;
        row.as_ref().map(map_user_row).transpose()
    }

    async fn list_users(&self) -> Result<Vec<User>, StorageError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id DESC");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(unavailable)?;
        rows.iter().map(map_user_row).collect()
    }

    async fn list_users_by_role(&self, role: Role) -> Result<Vec<User>, StorageError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE role = ?1 ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(role.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(unavailable)?;
        rows.iter().map(map_user_row).collect()
    }

    async fn delete_user(&self, id: UserId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id_i64("user_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;
        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
