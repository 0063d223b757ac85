pub mod commands;
pub mod directory;
pub mod error;
pub mod events;
pub mod handlers;
pub mod lifecycle;
pub mod permissions;
pub mod rate_limiter;
pub mod validation;
