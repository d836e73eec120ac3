//! Post repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use crate::models::{PageRequest, Paginated, Post, PostInput};

/// Post repository trait
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// List all posts with pagination
    async fn list(&self, page: &PageRequest) -> Result<Paginated<Post>>;

    /// List posts belonging to a blog; callers verify the blog exists
    async fn list_by_blog(&self, blog_id: &str, page: &PageRequest) -> Result<Paginated<Post>>;

    /// Create a new post
    async fn create(&self, post: &Post) -> Result<Post>;

    /// Get a post by id
    async fn get_by_id(&self, id: &str) -> Result<Option<Post>>;

    /// Update a post's fields and blog reference; false when absent
    async fn update(
        &self,
        id: &str,
        input: &PostInput,
        blog_id: &str,
        blog_name: &str,
    ) -> Result<bool>;

    /// Delete a post; false when already absent
    async fn delete(&self, id: &str) -> Result<bool>;
}

/// SQLx-based post repository implementation
pub struct SqlxPostRepository {
    pool: SqlitePool,
}

impl SqlxPostRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn PostRepository> {
        Arc::new(Self::new(pool))
    }

    async fn list_where(
        &self,
        blog_id: Option<&str>,
        page: &PageRequest,
    ) -> Result<Paginated<Post>> {
        let column = sort_column(page.sort_by.as_deref());
        let direction = page.sort_direction.as_sql();

        let (rows, total) = if let Some(blog_id) = blog_id {
            let query = format!(
                "SELECT id, title, short_description, content, blog_id, blog_name, created_at \
                 FROM posts WHERE blog_id = ? ORDER BY {} {} LIMIT ? OFFSET ?",
                column, direction
            );
            let rows = sqlx::query(&query)
                .bind(blog_id)
                .bind(page.limit())
                .bind(page.offset())
                .fetch_all(&self.pool)
                .await
                .context("Failed to list posts by blog")?;
            let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE blog_id = ?")
                .bind(blog_id)
                .fetch_one(&self.pool)
                .await
                .context("Failed to count posts by blog")?;
            (rows, total)
        } else {
            let query = format!(
                "SELECT id, title, short_description, content, blog_id, blog_name, created_at \
                 FROM posts ORDER BY {} {} LIMIT ? OFFSET ?",
                column, direction
            );
            let rows = sqlx::query(&query)
                .bind(page.limit())
                .bind(page.offset())
                .fetch_all(&self.pool)
                .await
                .context("Failed to list posts")?;
            let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
                .fetch_one(&self.pool)
                .await
                .context("Failed to count posts")?;
            (rows, total)
        };

        let posts = rows.iter().map(row_to_post).collect();
        Ok(Paginated::new(posts, total, page))
    }
}

/// Whitelist of sortable columns; anything else falls back to created_at
fn sort_column(sort_by: Option<&str>) -> &'static str {
    match sort_by {
        Some("title") => "title",
        Some("shortDescription") => "short_description",
        Some("content") => "content",
        Some("blogName") => "blog_name",
        _ => "created_at",
    }
}

#[async_trait]
impl PostRepository for SqlxPostRepository {
    async fn list(&self, page: &PageRequest) -> Result<Paginated<Post>> {
        self.list_where(None, page).await
    }

    async fn list_by_blog(&self, blog_id: &str, page: &PageRequest) -> Result<Paginated<Post>> {
        self.list_where(Some(blog_id), page).await
    }

    async fn create(&self, post: &Post) -> Result<Post> {
        sqlx::query(
            r#"
            INSERT INTO posts (id, title, short_description, content, blog_id, blog_name, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&post.id)
        .bind(&post.title)
        .bind(&post.short_description)
        .bind(&post.content)
        .bind(&post.blog_id)
        .bind(&post.blog_name)
        .bind(post.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to create post")?;

        Ok(post.clone())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Post>> {
        let row = sqlx::query(
            "SELECT id, title, short_description, content, blog_id, blog_name, created_at \
             FROM posts WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get post by id")?;

        Ok(row.as_ref().map(row_to_post))
    }

    async fn update(
        &self,
        id: &str,
        input: &PostInput,
        blog_id: &str,
        blog_name: &str,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE posts SET title = ?, short_description = ?, content = ?, \
             blog_id = ?, blog_name = ? WHERE id = ?",
        )
        .bind(&input.title)
        .bind(&input.short_description)
        .bind(&input.content)
        .bind(blog_id)
        .bind(blog_name)
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to update post")?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete post")?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_post(row: &sqlx::sqlite::SqliteRow) -> Post {
    Post {
        id: row.get("id"),
        title: row.get("title"),
        short_description: row.get("short_description"),
        content: row.get("content"),
        blog_id: row.get("blog_id"),
        blog_name: row.get("blog_name"),
        created_at: row.get("created_at"),
    }
}
