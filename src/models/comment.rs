//! Comment model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Comment entity, owned by a post and authored by a user account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Opaque unique identifier
    pub id: String,
    /// Comment body
    pub content: String,
    /// Authoring user id
    pub user_id: String,
    /// Authoring user login at creation time
    pub user_login: String,
    /// Owning post id
    #[serde(skip_serializing)]
    pub post_id: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// Create a new comment with a fresh id and timestamp
    pub fn new(content: String, user_id: String, user_login: String, post_id: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content,
            user_id,
            user_login,
            post_id,
            created_at: Utc::now(),
        }
    }

    /// Whether the given user authored this comment
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ownership_check() {
        let comment = Comment::new("hello".into(), "u1".into(), "bob".into(), "p1".into());
        assert!(comment.is_owned_by("u1"));
        assert!(!comment.is_owned_by("u2"));
    }

    #[test]
    fn test_post_id_not_serialized() {
        let comment = Comment::new("hello".into(), "u1".into(), "bob".into(), "p1".into());
        let json = serde_json::to_value(&comment).unwrap();
        assert!(json.get("postId").is_none());
        assert!(json.get("userLogin").is_some());
    }
}
