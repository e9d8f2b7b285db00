//! # auth-adapters
//!
//! Everything that talks to the hosted auth provider or proves access:
//! session token verification, the auth-code exchange, the signed
//! invitation pass, and the outbound mail webhook.

pub mod gateway;
pub mod invite;
pub mod mail;

#[cfg(feature = "auth-jwt")]
pub mod jwt;

pub use gateway::HttpAuthGateway;
pub use invite::{secrets_match, InvitePass, INVITE_COOKIE};
pub use mail::WebhookEmailSender;

#[cfg(feature = "auth-jwt")]
pub use jwt::{JwtSessionVerifier, DEFAULT_AUDIENCE};
