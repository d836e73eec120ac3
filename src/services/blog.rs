//! Blog service
//!
//! Thin orchestration over the blog and post repositories; nested post
//! operations verify the blog exists before touching posts.

use anyhow::Result;
use std::sync::Arc;

use crate::db::repositories::{BlogRepository, PostRepository};
use crate::models::{Blog, BlogInput, PageRequest, Paginated, Post, PostInput};

pub struct BlogService {
    blogs: Arc<dyn BlogRepository>,
    posts: Arc<dyn PostRepository>,
}

impl BlogService {
    pub fn new(blogs: Arc<dyn BlogRepository>, posts: Arc<dyn PostRepository>) -> Self {
        Self { blogs, posts }
    }

    pub async fn list(
        &self,
        page: &PageRequest,
        search_name: Option<&str>,
    ) -> Result<Paginated<Blog>> {
        self.blogs.list(page, search_name).await
    }

    pub async fn create(&self, input: BlogInput) -> Result<Blog> {
        let blog = Blog::new(input.name, input.website_url);
        self.blogs.create(&blog).await
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<Blog>> {
        self.blogs.get_by_id(id).await
    }

    pub async fn update(&self, id: &str, input: BlogInput) -> Result<bool> {
        self.blogs.update(id, &input).await
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        self.blogs.delete(id).await
    }

    /// Posts of one blog; `None` when the blog itself is absent
    pub async fn list_posts(
        &self,
        blog_id: &str,
        page: &PageRequest,
    ) -> Result<Option<Paginated<Post>>> {
        if self.blogs.get_by_id(blog_id).await?.is_none() {
            return Ok(None);
        }
        Ok(Some(self.posts.list_by_blog(blog_id, page).await?))
    }

    /// Create a post under a blog; `None` when the blog is absent
    pub async fn create_post(&self, blog_id: &str, input: PostInput) -> Result<Option<Post>> {
        let Some(blog) = self.blogs.get_by_id(blog_id).await? else {
            return Ok(None);
        };
        let post = Post::new(input, blog.id, blog.name);
        Ok(Some(self.posts.create(&post).await?))
    }
}
