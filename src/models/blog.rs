//! Blog model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Blog entity: a content source owning posts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    /// Opaque unique identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Public site URL
    pub website_url: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Blog {
    /// Create a new blog with a fresh id and timestamp
    pub fn new(name: String, website_url: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            website_url,
            created_at: Utc::now(),
        }
    }
}

/// Input for creating or updating a blog
#[derive(Debug, Clone)]
pub struct BlogInput {
    pub name: String,
    pub website_url: String,
}
