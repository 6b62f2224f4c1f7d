//! Configuration du rendu

use anyhow::Result;
use glam::Vec3;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;

use crate::pipeline::SamplePattern;

/// Configuration principale du rendu
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub output: OutputConfig,
    pub camera: CameraConfig,
    pub sampling: SamplingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub width: u32,
    pub height: u32,
    pub path: String,
}

/// Paramètres de la matrice de projection ; le remappage de profondeur
/// reste fixé à [DEPTH_NEAR, DEPTH_FAR].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub eye: [f32; 3],
    pub fov_deg: f32,
    pub near: f32,
    pub far: f32,
    /// Rotation du modèle autour de Z, en degrés
    pub angle_deg: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub pattern: String, // "grid", "rotated" ou "single"
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            width: 700,
            height: 700,
            path: "output.png".to_string(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            eye: [0.0, 0.0, 5.0],
            fov_deg: 45.0,
            near: crate::DEPTH_NEAR,
            far: crate::DEPTH_FAR,
            angle_deg: 0.0,
        }
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            pattern: "grid".to_string(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            output: OutputConfig::default(),
            camera: CameraConfig::default(),
            sampling: SamplingConfig::default(),
        }
    }
}

impl CameraConfig {
    pub fn eye(&self) -> Vec3 {
        Vec3::from_array(self.eye)
    }

    pub fn aspect_ratio(&self, output: &OutputConfig) -> f32 {
        output.width as f32 / output.height as f32
    }
}

impl RenderConfig {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: RenderConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    pub fn load_or_default(path: &str) -> Self {
        Self::load_from_file(path).unwrap_or_else(|e| {
            warn!("Configuration {} ignorée ({}), valeurs par défaut", path, e);
            Self::default()
        })
    }

    /// Motif d'échantillonnage désigné par `sampling.pattern`
    pub fn sample_pattern(&self) -> crate::pipeline::Result<SamplePattern> {
        SamplePattern::from_name(&self.sampling.pattern)
    }
}
