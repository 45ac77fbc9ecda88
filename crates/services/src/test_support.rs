//! Fixtures shared by the service unit tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use storage::repository::{
    InMemoryRepository, ProgressRepository, ResultRepository, StorageError, TopicRepository,
    UserRepository,
};
use study_core::model::{
    ProgressKey, ProgressRecord, ResultId, Role, StudyResult, Topic, TopicId, TopicItemDraft,
    User, UserId, UserProfile,
};
use study_core::time::fixed_now;

pub(crate) async fn add_user(repo: &InMemoryRepository, name: &str) -> UserId {
    let user = User::new(
        UserId::new(0),
        UserProfile::new(name, format!("{}@example.com", name.to_lowercase()), "", Role::User),
        fixed_now(),
    )
    .unwrap();
    repo.insert_new_user(&user).await.unwrap()
}

pub(crate) async fn add_topic(repo: &InMemoryRepository, user_id: UserId, items: usize) -> TopicId {
    let drafts = (1..=items)
        .map(|n| TopicItemDraft::new(format!("Lesson {n}"), format!("https://example.com/{n}")))
        .collect();
    let topic = Topic::new(TopicId::new(0), user_id, drafts, fixed_now()).unwrap();
    repo.insert_new_topic(&topic).await.unwrap()
}

/// Every call fails as if the backing store were offline.
pub(crate) struct UnavailableStore;

fn offline() -> StorageError {
    StorageError::Unavailable("store offline".into())
}

#[async_trait]
impl UserRepository for UnavailableStore {
    async fn insert_new_user(&self, _user: &User) -> Result<UserId, StorageError> {
        Err(offline())
    }
    async fn upsert_user(&self, _user: &User) -> Result<(), StorageError> {
        Err(offline())
    }
    async fn get_user(&self, _id: UserId) -> Result<Option<User>, StorageError> {
        Err(offline())
    }
    async fn list_users(&self) -> Result<Vec<User>, StorageError> {
        Err(offline())
    }
    async fn list_users_by_role(&self, _role: Role) -> Result<Vec<User>, StorageError> {
        Err(offline())
    }
    async fn delete_user(&self, _id: UserId) -> Result<(), StorageError> {
        Err(offline())
    }
}

#[async_trait]
impl TopicRepository for UnavailableStore {
    async fn insert_new_topic(&self, _topic: &Topic) -> Result<TopicId, StorageError> {
        Err(offline())
    }
    async fn get_topic(&self, _id: TopicId) -> Result<Option<Topic>, StorageError> {
        Err(offline())
    }
    async fn list_topics(&self) -> Result<Vec<Topic>, StorageError> {
        Err(offline())
    }
    async fn list_topics_for_user(&self, _user_id: UserId) -> Result<Vec<Topic>, StorageError> {
        Err(offline())
    }
    async fn delete_topic(&self, _id: TopicId) -> Result<(), StorageError> {
        Err(offline())
    }
}

#[async_trait]
impl ProgressRepository for UnavailableStore {
    async fn upsert_progress(&self, _record: &ProgressRecord) -> Result<(), StorageError> {
        Err(offline())
    }
    async fn get_progress(
        &self,
        _key: ProgressKey,
    ) -> Result<Option<ProgressRecord>, StorageError> {
        Err(offline())
    }
    async fn list_progress_for_user(
        &self,
        _user_id: UserId,
    ) -> Result<Vec<ProgressRecord>, StorageError> {
        Err(offline())
    }
    async fn list_completed_between(
        &self,
        _from: NaiveDate,
        _until: NaiveDate,
    ) -> Result<Vec<ProgressRecord>, StorageError> {
        Err(offline())
    }
}

#[async_trait]
impl ResultRepository for UnavailableStore {
    async fn append_result(&self, _result: &StudyResult) -> Result<ResultId, StorageError> {
        Err(offline())
    }
    async fn list_results_between(
        &self,
        _from: NaiveDate,
        _until: NaiveDate,
        _user_id: Option<UserId>,
    ) -> Result<Vec<StudyResult>, StorageError> {
        Err(offline())
    }
    async fn list_results_on(&self, _date: NaiveDate) -> Result<Vec<StudyResult>, StorageError> {
        Err(offline())
    }
    async fn list_results_for_user(
        &self,
        _user_id: UserId,
    ) -> Result<Vec<StudyResult>, StorageError> {
        Err(offline())
    }
}
