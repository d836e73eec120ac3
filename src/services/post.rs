//! Post service
//!
//! Thin orchestration over the post repository; create and update verify
//! the referenced blog exists first.

use anyhow::Result;
use std::sync::Arc;

use crate::db::repositories::{BlogRepository, PostRepository};
use crate::models::{PageRequest, Paginated, Post, PostInput};

/// Outcome of a post update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostUpdate {
    Updated,
    PostNotFound,
    BlogNotFound,
}

pub struct PostService {
    posts: Arc<dyn PostRepository>,
    blogs: Arc<dyn BlogRepository>,
}

impl PostService {
    pub fn new(posts: Arc<dyn PostRepository>, blogs: Arc<dyn BlogRepository>) -> Self {
        Self { posts, blogs }
    }

    pub async fn list(&self, page: &PageRequest) -> Result<Paginated<Post>> {
        self.posts.list(page).await
    }

    /// Create a post referencing a blog; `None` when the blog is absent
    pub async fn create(&self, input: PostInput, blog_id: &str) -> Result<Option<Post>> {
        let Some(blog) = self.blogs.get_by_id(blog_id).await? else {
            return Ok(None);
        };
        let post = Post::new(input, blog.id, blog.name);
        Ok(Some(self.posts.create(&post).await?))
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<Post>> {
        self.posts.get_by_id(id).await
    }

    pub async fn update(&self, id: &str, input: PostInput, blog_id: &str) -> Result<PostUpdate> {
        let Some(blog) = self.blogs.get_by_id(blog_id).await? else {
            return Ok(PostUpdate::BlogNotFound);
        };
        if self.posts.update(id, &input, &blog.id, &blog.name).await? {
            Ok(PostUpdate::Updated)
        } else {
            Ok(PostUpdate::PostNotFound)
        }
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        self.posts.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{BlogRepository, SqlxBlogRepository, SqlxPostRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::Blog;

    async fn setup() -> (PostService, Blog) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let blog_repo = SqlxBlogRepository::boxed(pool.clone());
        let blog = Blog::new("devlog".into(), "https://devlog.example".into());
        blog_repo.create(&blog).await.unwrap();

        (
            PostService::new(SqlxPostRepository::boxed(pool), blog_repo),
            blog,
        )
    }

    fn input(title: &str) -> PostInput {
        PostInput {
            title: title.into(),
            short_description: "s".into(),
            content: "c".into(),
        }
    }

    #[tokio::test]
    async fn test_create_checks_blog_reference() {
        let (service, blog) = setup().await;

        let post = service.create(input("a"), &blog.id).await.unwrap();
        assert!(post.is_some());

        let missing = service.create(input("b"), "missing").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_update_outcomes() {
        let (service, blog) = setup().await;
        let post = service.create(input("a"), &blog.id).await.unwrap().unwrap();

        assert_eq!(
            service.update(&post.id, input("b"), &blog.id).await.unwrap(),
            PostUpdate::Updated
        );
        assert_eq!(
            service.update("missing", input("b"), &blog.id).await.unwrap(),
            PostUpdate::PostNotFound
        );
        assert_eq!(
            service.update(&post.id, input("b"), "missing").await.unwrap(),
            PostUpdate::BlogNotFound
        );
    }

    #[tokio::test]
    async fn test_delete_reports_absence() {
        let (service, blog) = setup().await;
        let post = service.create(input("a"), &blog.id).await.unwrap().unwrap();

        assert!(service.delete(&post.id).await.unwrap());
        assert!(!service.delete(&post.id).await.unwrap());
    }
}
