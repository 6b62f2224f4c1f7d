//! Pixel Raster - Rastériseur de triangles logiciel
//!
//! Cette bibliothèque transforme des maillages de triangles 3D en image 2D,
//! sans accélération matérielle :
//! - transformation model/view/projection et viewport
//! - suréchantillonnage configurable (grille 2x2 par défaut)
//! - test de profondeur par échantillon
//! - export PNG du framebuffer

pub mod config;
pub mod error;
pub mod pipeline;

pub use config::*;
pub use error::RasterError;
pub use pipeline::*;

/// Version du rastériseur
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Borne proche du remappage de profondeur
pub const DEPTH_NEAR: f32 = 0.1;

/// Borne lointaine du remappage de profondeur
pub const DEPTH_FAR: f32 = 50.0;
