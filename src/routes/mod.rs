//! Router Module Index
//!
//! Splits the news resource by access level. The gate is applied to a whole router
//! with a layer, so a mutating route cannot be registered without it by accident.

/// Read-only routes open to any client.
pub mod public;

/// Mutating routes protected by the API key gate.
pub mod authenticated;
