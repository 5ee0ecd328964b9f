// Field mapping between source records and list columns
pub mod mapping;

// Client-credentials authentication
pub mod auth;

// Settings file, environment overrides, typed provider
pub mod config;

// Gated diagnostic events
pub mod diagnostics;

// Entry submission
pub mod submit;

// Inbound HTTP API
pub mod api;
