pub mod auth;
pub mod events;
pub mod messages;
pub mod moderation;
pub mod profiles;
pub mod public;
pub mod system;
