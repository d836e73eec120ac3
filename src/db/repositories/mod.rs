//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity.

pub mod account;
pub mod blacklist;
pub mod blog;
pub mod comment;
pub mod device;
pub mod post;
pub mod rate_limit;

pub use account::{AccountRepository, SqlxAccountRepository};
pub use blacklist::{BlacklistRepository, SqlxBlacklistRepository};
pub use blog::{BlogRepository, SqlxBlogRepository};
pub use comment::{CommentRepository, SqlxCommentRepository};
pub use device::{DeviceRepository, SqlxDeviceRepository};
pub use post::{PostRepository, SqlxPostRepository};
pub use rate_limit::{RateLimitRepository, SqlxRateLimitRepository};
