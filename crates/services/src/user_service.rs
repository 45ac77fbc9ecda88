use std::sync::Arc;

use storage::repository::{StorageError, UserRepository};
use study_core::model::{Role, User, UserId, UserProfile};

use crate::Clock;
use crate::error::UserServiceError;

/// Manages user accounts.
#[derive(Clone)]
pub struct UserService {
    clock: Clock,
    users: Arc<dyn UserRepository>,
}

impl UserService {
    #[must_use]
    pub fn new(clock: Clock, users: Arc<dyn UserRepository>) -> Self {
        Self { clock, users }
    }

    /// Validate and persist a new user.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::User` for validation failures.
    /// Returns `UserServiceError::Storage` if persistence fails.
    pub async fn create_user(&self, profile: UserProfile) -> Result<User, UserServiceError> {
        let user = User::new(UserId::new(0), profile, self.clock.now())?;
        let id = self.users.insert_new_user(&user).await?;
        tracing::info!(%id, role = %user.role(), "created user");
        Ok(user.with_id(id))
    }

    /// Replace a user's profile fields.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::Storage` with `StorageError::NotFound` for an
    /// unknown id, or `UserServiceError::User` if the profile is invalid.
    pub async fn update_user(
        &self,
        id: UserId,
        profile: UserProfile,
    ) -> Result<User, UserServiceError> {
        let existing = self
            .users
            .get_user(id)
            .await?
            .ok_or(StorageError::NotFound)?;
        let updated = existing.with_profile(profile)?;
        self.users.upsert_user(&updated).await?;
        Ok(updated)
    }

    /// Fetch a user; `Ok(None)` when absent.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::Storage` if repository access fails.
    pub async fn get_user(&self, id: UserId) -> Result<Option<User>, UserServiceError> {
        Ok(self.users.get_user(id).await?)
    }

    /// All users, newest first.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::Storage` if repository access fails.
    pub async fn list_users(&self) -> Result<Vec<User>, UserServiceError> {
        Ok(self.users.list_users().await?)
    }

    /// Users holding `role`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::Storage` if repository access fails.
    pub async fn list_users_by_role(&self, role: Role) -> Result<Vec<User>, UserServiceError> {
        Ok(self.users.list_users_by_role(role).await?)
    }

    /// # Errors
    ///
    /// Returns `UserServiceError::Storage` with `StorageError::NotFound` for an
    /// unknown id.
    pub async fn delete_user(&self, id: UserId) -> Result<(), UserServiceError> {
        self.users.delete_user(id).await?;
        tracing::info!(%id, "deleted user");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use storage::repository::InMemoryRepository;
    use study_core::model::UserError;
    use study_core::time::fixed_clock;

    fn service() -> UserService {
        UserService::new(fixed_clock(), Arc::new(InMemoryRepository::new()))
    }

    #[tokio::test]
    async fn create_update_and_list_by_role() {
        let svc = service();
        let admin = svc
            .create_user(UserProfile::new("Root", "root@example.com", "", Role::Admin))
            .await
            .unwrap();
        let learner = svc
            .create_user(UserProfile::new(" Ana ", "", "555-0100", Role::User))
            .await
            .unwrap();
        assert_eq!(learner.name(), "Ana");

        let renamed = svc
            .update_user(
                learner.id(),
                UserProfile::new("Ana Lima", "ana@example.com", "", Role::User),
            )
            .await
            .unwrap();
        assert_eq!(renamed.created_at(), learner.created_at());
        assert_eq!(
            svc.get_user(learner.id()).await.unwrap().unwrap().name(),
            "Ana Lima"
        );

        let admins = svc.list_users_by_role(Role::Admin).await.unwrap();
        assert_eq!(admins.len(), 1);
        assert_eq!(admins[0].id(), admin.id());
        assert_eq!(svc.list_users().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn invalid_profiles_are_rejected() {
        let svc = service();
        let err = svc
            .create_user(UserProfile::new("Ana", "", "", Role::User))
            .await
            .unwrap_err();
        assert!(matches!(err, UserServiceError::User(UserError::MissingContact)));
        assert!(svc.list_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_users_are_not_found() {
        let svc = service();
        let err = svc.delete_user(UserId::new(4)).await.unwrap_err();
        assert!(matches!(err, UserServiceError::Storage(StorageError::NotFound)));

        let err = svc
            .update_user(
                UserId::new(4),
                UserProfile::new("Ghost", "ghost@example.com", "", Role::User),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, UserServiceError::Storage(StorageError::NotFound)));
    }
}
