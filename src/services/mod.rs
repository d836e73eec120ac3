//! Business logic services
//!
//! One service per concern, constructed once at startup and shared via
//! `Arc` in the application state. Entity services are thin pass-throughs
//! over their repositories; the account and session services carry the
//! auth state machines.

pub mod account;
pub mod blog;
pub mod comment;
pub mod email;
pub mod jwt;
pub mod password;
pub mod post;
pub mod rate_limit;
pub mod session;
pub mod user;

pub use account::{AccountError, AccountService};
pub use blog::BlogService;
pub use comment::{CommentError, CommentService};
pub use email::EmailService;
pub use jwt::{Claims, JwtService, TokenKind};
pub use post::{PostService, PostUpdate};
pub use rate_limit::{RateLimitDecision, RateLimitService};
pub use session::{SessionError, SessionService, TokenPair};
pub use user::UserService;
