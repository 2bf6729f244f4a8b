//! bizmate: multi-tenant backend for a small-business toolkit.
//!
//! One business per account, one JWT-authenticated owner per request,
//! and every business-owned record stamped and filtered by the tenancy
//! layer. Storage is Sled with JSON documents, one tree per collection.

pub mod config;
pub mod error;
pub mod identity;
pub mod models;
pub mod password;
pub mod routes;
pub mod state;
pub mod store;
pub mod tenancy;
pub mod token;
pub mod upstream;
