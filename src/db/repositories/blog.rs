//! Blog repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use crate::models::{Blog, BlogInput, PageRequest, Paginated};

/// Blog repository trait
#[async_trait]
pub trait BlogRepository: Send + Sync {
    /// List blogs with pagination, optionally filtered by a name substring
    async fn list(
        &self,
        page: &PageRequest,
        search_name: Option<&str>,
    ) -> Result<Paginated<Blog>>;

    /// Create a new blog
    async fn create(&self, blog: &Blog) -> Result<Blog>;

    /// Get a blog by id
    async fn get_by_id(&self, id: &str) -> Result<Option<Blog>>;

    /// Update name and website URL; false when the blog is absent
    async fn update(&self, id: &str, input: &BlogInput) -> Result<bool>;

    /// Delete a blog; false when already absent
    async fn delete(&self, id: &str) -> Result<bool>;
}

/// SQLx-based blog repository implementation
pub struct SqlxBlogRepository {
    pool: SqlitePool,
}

impl SqlxBlogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn BlogRepository> {
        Arc::new(Self::new(pool))
    }
}

/// Whitelist of sortable columns; anything else falls back to created_at
fn sort_column(sort_by: Option<&str>) -> &'static str {
    match sort_by {
        Some("name") => "name",
        Some("websiteUrl") => "website_url",
        _ => "created_at",
    }
}

#[async_trait]
impl BlogRepository for SqlxBlogRepository {
    async fn list(
        &self,
        page: &PageRequest,
        search_name: Option<&str>,
    ) -> Result<Paginated<Blog>> {
        let column = sort_column(page.sort_by.as_deref());
        let direction = page.sort_direction.as_sql();
        let pattern = search_name.map(|term| format!("%{}%", term));

        let (rows, total) = if let Some(pattern) = &pattern {
            let query = format!(
                "SELECT id, name, website_url, created_at FROM blogs \
                 WHERE name LIKE ? ORDER BY {} {} LIMIT ? OFFSET ?",
                column, direction
            );
            let rows = sqlx::query(&query)
                .bind(pattern)
                .bind(page.limit())
                .bind(page.offset())
                .fetch_all(&self.pool)
                .await
                .context("Failed to list blogs")?;
            let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM blogs WHERE name LIKE ?")
                .bind(pattern)
                .fetch_one(&self.pool)
                .await
                .context("Failed to count blogs")?;
            (rows, total)
        } else {
            let query = format!(
                "SELECT id, name, website_url, created_at FROM blogs \
                 ORDER BY {} {} LIMIT ? OFFSET ?",
                column, direction
            );
            let rows = sqlx::query(&query)
                .bind(page.limit())
                .bind(page.offset())
                .fetch_all(&self.pool)
                .await
                .context("Failed to list blogs")?;
            let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM blogs")
                .fetch_one(&self.pool)
                .await
                .context("Failed to count blogs")?;
            (rows, total)
        };

        let blogs = rows.iter().map(row_to_blog).collect();
        Ok(Paginated::new(blogs, total, page))
    }

    async fn create(&self, blog: &Blog) -> Result<Blog> {
        sqlx::query(
            "INSERT INTO blogs (id, name, website_url, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&blog.id)
        .bind(&blog.name)
        .bind(&blog.website_url)
        .bind(blog.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to create blog")?;

        Ok(blog.clone())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Blog>> {
        let row = sqlx::query("SELECT id, name, website_url, created_at FROM blogs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get blog by id")?;

        Ok(row.as_ref().map(row_to_blog))
    }

    async fn update(&self, id: &str, input: &BlogInput) -> Result<bool> {
        let result = sqlx::query("UPDATE blogs SET name = ?, website_url = ? WHERE id = ?")
            .bind(&input.name)
            .bind(&input.website_url)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to update blog")?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM blogs WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete blog")?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_blog(row: &sqlx::sqlite::SqliteRow) -> Blog {
    Blog {
        id: row.get("id"),
        name: row.get("name"),
        website_url: row.get("website_url"),
        created_at: row.get("created_at"),
    }
}
