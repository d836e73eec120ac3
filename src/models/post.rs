//! Post model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Post entity, owned by a blog
///
/// The owning blog's name is denormalized onto the post, matching the
/// wire shape clients receive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Opaque unique identifier
    pub id: String,
    /// Post title
    pub title: String,
    /// One-paragraph teaser
    pub short_description: String,
    /// Full content
    pub content: String,
    /// Owning blog id
    pub blog_id: String,
    /// Owning blog name at creation time
    pub blog_name: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Create a new post with a fresh id and timestamp
    pub fn new(input: PostInput, blog_id: String, blog_name: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: input.title,
            short_description: input.short_description,
            content: input.content,
            blog_id,
            blog_name,
            created_at: Utc::now(),
        }
    }
}

/// Input for creating or updating a post (without the blog reference)
#[derive(Debug, Clone)]
pub struct PostInput {
    pub title: String,
    pub short_description: String,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_post_carries_blog_back_reference() {
        let input = PostInput {
            title: "t".into(),
            short_description: "s".into(),
            content: "c".into(),
        };
        let post = Post::new(input, "blog-1".into(), "My blog".into());
        assert_eq!(post.blog_id, "blog-1");
        assert_eq!(post.blog_name, "My blog");
        assert!(!post.id.is_empty());
    }
}
