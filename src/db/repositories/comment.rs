//! Comment repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use crate::models::{Comment, PageRequest, Paginated};

/// Comment repository trait
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// List comments belonging to a post; callers verify the post exists
    async fn list_by_post(&self, post_id: &str, page: &PageRequest)
        -> Result<Paginated<Comment>>;

    /// Create a new comment
    async fn create(&self, comment: &Comment) -> Result<Comment>;

    /// Get a comment by id
    async fn get_by_id(&self, id: &str) -> Result<Option<Comment>>;

    /// Replace a comment's content; false when absent
    async fn update_content(&self, id: &str, content: &str) -> Result<bool>;

    /// Delete a comment; false when already absent
    async fn delete(&self, id: &str) -> Result<bool>;
}

/// SQLx-based comment repository implementation
pub struct SqlxCommentRepository {
    pool: SqlitePool,
}

impl SqlxCommentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn CommentRepository> {
        Arc::new(Self::new(pool))
    }
}

/// Comments only sort by creation time
fn sort_column(sort_by: Option<&str>) -> &'static str {
    match sort_by {
        Some("content") => "content",
        _ => "created_at",
    }
}

#[async_trait]
impl CommentRepository for SqlxCommentRepository {
    async fn list_by_post(
        &self,
        post_id: &str,
        page: &PageRequest,
    ) -> Result<Paginated<Comment>> {
        let column = sort_column(page.sort_by.as_deref());
        let direction = page.sort_direction.as_sql();

        let query = format!(
            "SELECT id, content, user_id, user_login, post_id, created_at \
             FROM comments WHERE post_id = ? ORDER BY {} {} LIMIT ? OFFSET ?",
            column, direction
        );
        let rows = sqlx::query(&query)
            .bind(post_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await
            .context("Failed to list comments")?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE post_id = ?")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count comments")?;

        let comments = rows.iter().map(row_to_comment).collect();
        Ok(Paginated::new(comments, total, page))
    }

    async fn create(&self, comment: &Comment) -> Result<Comment> {
        sqlx::query(
            r#"
            INSERT INTO comments (id, content, user_id, user_login, post_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&comment.id)
        .bind(&comment.content)
        .bind(&comment.user_id)
        .bind(&comment.user_login)
        .bind(&comment.post_id)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to create comment")?;

        Ok(comment.clone())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Comment>> {
        let row = sqlx::query(
            "SELECT id, content, user_id, user_login, post_id, created_at \
             FROM comments WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get comment by id")?;

        Ok(row.as_ref().map(row_to_comment))
    }

    async fn update_content(&self, id: &str, content: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE comments SET content = ? WHERE id = ?")
            .bind(content)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to update comment")?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete comment")?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_comment(row: &sqlx::sqlite::SqliteRow) -> Comment {
    Comment {
        id: row.get("id"),
        content: row.get("content"),
        user_id: row.get("user_id"),
        user_login: row.get("user_login"),
        post_id: row.get("post_id"),
        created_at: row.get("created_at"),
    }
}
