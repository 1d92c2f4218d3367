//! # Starlight Planner
//!
//! Astrophotography session planning engine.
//!
//! Given a location, a piece of imaging equipment and a date, the planner
//! computes the moon phase deterministically, resolves the equipment to an
//! optics profile, asks an external reasoning service for a ranked target
//! list, and normalizes whatever comes back into a structurally valid plan.
//!
//! ## Features
//!
//! - **Moon Phase**: Deterministic lunar phase and illumination for any date
//! - **Optics Catalog**: Free-text equipment names mapped to field-of-view profiles
//! - **Mission Brief**: Prompt assembly with moon- and device-specific directives
//! - **Normalization**: JSON repair, schema coercion and a fallback plan that is never empty
//! - **HTTP API**: RESTful endpoints for frontend integration
//!
//! ## Architecture
//!
//! - [`models`]: Domain types (requests, plans, moon readings, optics profiles)
//! - [`services`]: Planning pipeline and the reasoning service adapter
//! - [`config`]: TOML + environment configuration
//! - [`error`]: Error types shared by all layers
//! - [`http`]: Axum-based HTTP server and request handlers

pub mod config;
pub mod error;
pub mod models;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;

pub use config::PlannerConfig;
pub use error::{PlannerError, PlannerResult};
pub use services::SessionPlanner;
