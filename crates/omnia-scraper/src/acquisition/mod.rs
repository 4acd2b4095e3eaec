//! Transport layer: the cookie-carrying JSON client and the login handshake
//! that seeds its session.

pub mod auth;
pub mod http_client;
