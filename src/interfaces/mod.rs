//! Interface adapters
//!
//! - `http`: REST API (axum) with Swagger UI

pub mod http;
