use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::model::ids::{TopicId, TopicItemId, UserId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TopicError {
    #[error("topic item title cannot be empty")]
    EmptyItemTitle,

    #[error("invalid topic item url: {0}")]
    InvalidItemUrl(String),

    #[error("duplicate topic item id: {0}")]
    DuplicateItemId(TopicItemId),
}

//
// ─── ITEMS ─────────────────────────────────────────────────────────────────────
//

/// Unvalidated title/URL pair as entered by an admin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicItemDraft {
    pub title: String,
    pub url: String,
}

impl TopicItemDraft {
    #[must_use]
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }

    /// Validate the draft and attach its identifier.
    ///
    /// # Errors
    ///
    /// Returns `TopicError::EmptyItemTitle` or `TopicError::InvalidItemUrl`.
    pub fn validate(self, id: TopicItemId) -> Result<TopicItem, TopicError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(TopicError::EmptyItemTitle);
        }
        let raw = self.url.trim();
        let url = Url::parse(raw).map_err(|_| TopicError::InvalidItemUrl(raw.to_string()))?;
        Ok(TopicItem {
            id,
            title: title.to_string(),
            url,
        })
    }
}

/// A single learning assignment. Items never change after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicItem {
    id: TopicItemId,
    title: String,
    url: Url,
}

impl TopicItem {
    #[must_use]
    pub fn id(&self) -> TopicItemId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }
}

//
// ─── TOPIC ─────────────────────────────────────────────────────────────────────
//

/// An ordered bundle of items assigned to exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    id: TopicId,
    user_id: UserId,
    items: Vec<TopicItem>,
    created_at: DateTime<Utc>,
}

impl Topic {
    /// Create a topic, numbering items 1..=n in the order given.
    ///
    /// # Errors
    ///
    /// Returns `TopicError` if any item fails validation.
    pub fn new(
        id: TopicId,
        user_id: UserId,
        items: Vec<TopicItemDraft>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, TopicError> {
        let items = items
            .into_iter()
            .zip(1_u64..)
            .map(|(draft, n)| draft.validate(TopicItemId::new(n)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            id,
            user_id,
            items,
            created_at,
        })
    }

    /// Rehydrate a topic from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `TopicError::DuplicateItemId` if two items share an id.
    pub fn from_persisted(
        id: TopicId,
        user_id: UserId,
        items: Vec<TopicItem>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, TopicError> {
        let mut seen = std::collections::HashSet::with_capacity(items.len());
        for item in &items {
            if !seen.insert(item.id) {
                return Err(TopicError::DuplicateItemId(item.id));
            }
        }
        Ok(Self {
            id,
            user_id,
            items,
            created_at,
        })
    }

    /// Copy of this topic under a different id, used when storage assigns ids.
    #[must_use]
    pub fn with_id(&self, id: TopicId) -> Self {
        Self {
            id,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn id(&self) -> TopicId {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn items(&self) -> &[TopicItem] {
        &self.items
    }

    #[must_use]
    pub fn item(&self, id: TopicItemId) -> Option<&TopicItem> {
        self.items.iter().find(|item| item.id == id)
    }

    #[must_use]
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn drafts() -> Vec<TopicItemDraft> {
        vec![
            TopicItemDraft::new("React Basics", "https://example.com/react"),
            TopicItemDraft::new(" TypeScript Fundamentals ", "https://example.com/ts"),
        ]
    }

    #[test]
    fn numbers_items_in_order() {
        let topic = Topic::new(TopicId::new(1), UserId::new(1), drafts(), fixed_now()).unwrap();
        assert_eq!(topic.item_count(), 2);
        assert_eq!(topic.items()[0].id(), TopicItemId::new(1));
        assert_eq!(topic.items()[1].id(), TopicItemId::new(2));
        assert_eq!(
            topic.item(TopicItemId::new(2)).unwrap().title(),
            "TypeScript Fundamentals"
        );
        assert!(topic.item(TopicItemId::new(3)).is_none());
    }

    #[test]
    fn rejects_bad_url() {
        let err = Topic::new(
            TopicId::new(1),
            UserId::new(1),
            vec![TopicItemDraft::new("Intro", "not a url")],
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, TopicError::InvalidItemUrl("not a url".into()));
    }

    #[test]
    fn rejects_blank_title() {
        let err = TopicItemDraft::new("  ", "https://example.com")
            .validate(TopicItemId::new(1))
            .unwrap_err();
        assert_eq!(err, TopicError::EmptyItemTitle);
    }

    #[test]
    fn from_persisted_rejects_duplicate_item_ids() {
        let item = TopicItemDraft::new("A", "https://example.com/a")
            .validate(TopicItemId::new(1))
            .unwrap();
        let err = Topic::from_persisted(
            TopicId::new(1),
            UserId::new(1),
            vec![item.clone(), item],
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, TopicError::DuplicateItemId(TopicItemId::new(1)));
    }

    #[test]
    fn empty_topic_is_allowed() {
        let topic = Topic::new(TopicId::new(9), UserId::new(2), Vec::new(), fixed_now()).unwrap();
        assert_eq!(topic.item_count(), 0);
    }
}
