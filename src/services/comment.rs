//! Comment service
//!
//! Creation verifies the parent post exists; mutation is restricted to
//! the comment's author.

use anyhow::Context;
use std::sync::Arc;

use crate::db::repositories::{CommentRepository, PostRepository};
use crate::models::{Comment, PageRequest, Paginated, UserAccount};

/// Comment operation errors
#[derive(Debug, thiserror::Error)]
pub enum CommentError {
    #[error("comment not found")]
    NotFound,

    #[error("comment belongs to another user")]
    Forbidden,

    #[error("content must be 20-300 characters")]
    InvalidContent,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

fn validate_content(content: &str) -> Result<(), CommentError> {
    let len = content.chars().count();
    if !(20..=300).contains(&len) {
        return Err(CommentError::InvalidContent);
    }
    Ok(())
}

pub struct CommentService {
    comments: Arc<dyn CommentRepository>,
    posts: Arc<dyn PostRepository>,
}

impl CommentService {
    pub fn new(comments: Arc<dyn CommentRepository>, posts: Arc<dyn PostRepository>) -> Self {
        Self { comments, posts }
    }

    /// Comments of one post; `None` when the post itself is absent
    pub async fn list_by_post(
        &self,
        post_id: &str,
        page: &PageRequest,
    ) -> Result<Option<Paginated<Comment>>, CommentError> {
        if self
            .posts
            .get_by_id(post_id)
            .await
            .context("Failed to check post")?
            .is_none()
        {
            return Ok(None);
        }
        Ok(Some(
            self.comments
                .list_by_post(post_id, page)
                .await
                .context("Failed to list comments")?,
        ))
    }

    /// Create a comment under a post; `None` when the post is absent
    pub async fn create(
        &self,
        post_id: &str,
        content: &str,
        author: &UserAccount,
    ) -> Result<Option<Comment>, CommentError> {
        validate_content(content)?;

        if self
            .posts
            .get_by_id(post_id)
            .await
            .context("Failed to check post")?
            .is_none()
        {
            return Ok(None);
        }

        let comment = Comment::new(
            content.to_string(),
            author.id.clone(),
            author.login.clone(),
            post_id.to_string(),
        );
        Ok(Some(
            self.comments
                .create(&comment)
                .await
                .context("Failed to create comment")?,
        ))
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<Comment>, CommentError> {
        Ok(self
            .comments
            .get_by_id(id)
            .await
            .context("Failed to get comment")?)
    }

    /// Replace content; only the author may edit
    pub async fn update(
        &self,
        id: &str,
        content: &str,
        user_id: &str,
    ) -> Result<(), CommentError> {
        validate_content(content)?;

        let comment = self
            .comments
            .get_by_id(id)
            .await
            .context("Failed to get comment")?
            .ok_or(CommentError::NotFound)?;

        if !comment.is_owned_by(user_id) {
            return Err(CommentError::Forbidden);
        }

        self.comments
            .update_content(id, content)
            .await
            .context("Failed to update comment")?;
        Ok(())
    }

    /// Delete a comment; only the author may delete
    pub async fn delete(&self, id: &str, user_id: &str) -> Result<(), CommentError> {
        let comment = self
            .comments
            .get_by_id(id)
            .await
            .context("Failed to get comment")?
            .ok_or(CommentError::NotFound)?;

        if !comment.is_owned_by(user_id) {
            return Err(CommentError::Forbidden);
        }

        self.comments
            .delete(id)
            .await
            .context("Failed to delete comment")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        BlogRepository, PostRepository, SqlxBlogRepository, SqlxCommentRepository,
        SqlxPostRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::{Blog, Post, PostInput};

    const CONTENT: &str = "this comment is long enough to pass validation";

    async fn setup() -> (CommentService, Post, UserAccount) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let blog = Blog::new("devlog".into(), "https://devlog.example".into());
        SqlxBlogRepository::new(pool.clone()).create(&blog).await.unwrap();
        let post = Post::new(
            PostInput {
                title: "t".into(),
                short_description: "s".into(),
                content: "c".into(),
            },
            blog.id.clone(),
            blog.name.clone(),
        );
        SqlxPostRepository::new(pool.clone()).create(&post).await.unwrap();

        let author = UserAccount::new("bob".into(), "bob@x.com".into(), "hash".into(), None);
        let service = CommentService::new(
            SqlxCommentRepository::boxed(pool.clone()),
            SqlxPostRepository::boxed(pool),
        );
        (service, post, author)
    }

    #[tokio::test]
    async fn test_create_requires_existing_post() {
        let (service, post, author) = setup().await;

        let comment = service.create(&post.id, CONTENT, &author).await.unwrap();
        assert!(comment.is_some());
        assert_eq!(comment.unwrap().user_login, "bob");

        let missing = service.create("missing", CONTENT, &author).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_content_length_is_validated() {
        let (service, post, author) = setup().await;

        assert!(matches!(
            service.create(&post.id, "too short", &author).await,
            Err(CommentError::InvalidContent)
        ));
        let long = "x".repeat(301);
        assert!(matches!(
            service.create(&post.id, &long, &author).await,
            Err(CommentError::InvalidContent)
        ));
    }

    #[tokio::test]
    async fn test_only_author_can_mutate() {
        let (service, post, author) = setup().await;
        let comment = service
            .create(&post.id, CONTENT, &author)
            .await
            .unwrap()
            .unwrap();

        assert!(matches!(
            service.update(&comment.id, CONTENT, "someone-else").await,
            Err(CommentError::Forbidden)
        ));
        assert!(matches!(
            service.delete(&comment.id, "someone-else").await,
            Err(CommentError::Forbidden)
        ));

        service.update(&comment.id, CONTENT, &author.id).await.unwrap();
        service.delete(&comment.id, &author.id).await.unwrap();

        assert!(matches!(
            service.delete(&comment.id, &author.id).await,
            Err(CommentError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_list_by_post_reports_post_absence() {
        let (service, post, author) = setup().await;
        service.create(&post.id, CONTENT, &author).await.unwrap();

        let page = PageRequest::new(1, 10);
        let listed = service.list_by_post(&post.id, &page).await.unwrap().unwrap();
        assert_eq!(listed.total_count, 1);

        assert!(service
            .list_by_post("missing", &page)
            .await
            .unwrap()
            .is_none());
    }
}
