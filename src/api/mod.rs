//! HTTP layer: JWT handling, middleware and the versioned JSON API

pub mod constants;
pub mod jwt;
pub mod middleware;
pub mod services;
