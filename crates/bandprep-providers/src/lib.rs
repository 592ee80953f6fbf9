//! bandprep-providers — external collaborator clients.
//!
//! HTTP implementations of the `bandprep-core` collaborator traits: the
//! Gemini text-generation service for answer explanations, a Supabase-style
//! identity service, and the profile/stats row store, plus a deterministic
//! mock explainer for tests and offline practice.

pub mod config;
pub mod gemini;
pub mod identity;
pub mod mock;
pub mod profile;

pub use config::{create_explainer, BandprepConfig};
