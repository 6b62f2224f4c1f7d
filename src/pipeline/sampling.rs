//! Motifs de suréchantillonnage
//!
//! Un motif est une suite ordonnée de décalages sous-pixel, relatifs à
//! l'origine entière du pixel. L'index d'un décalage dans le motif est
//! aussi l'index de son slot dans les buffers d'échantillons.

use glam::Vec2;

use super::Result;
use crate::error::RasterError;

/// Suite ordonnée de points d'échantillonnage dans le pixel
#[derive(Debug, Clone, PartialEq)]
pub struct SamplePattern {
    offsets: Vec<Vec2>,
}

impl SamplePattern {
    /// Crée un motif ; chaque décalage doit être dans [0, 1)
    pub fn new(offsets: Vec<Vec2>) -> Result<Self> {
        if offsets.is_empty() {
            return Err(RasterError::InvalidSamplePattern(
                "aucun décalage".to_string(),
            ));
        }
        if let Some(bad) = offsets
            .iter()
            .find(|o| !(0.0..1.0).contains(&o.x) || !(0.0..1.0).contains(&o.y))
        {
            return Err(RasterError::InvalidSamplePattern(format!(
                "décalage ({}, {}) hors du pixel",
                bad.x, bad.y
            )));
        }
        Ok(Self { offsets })
    }

    /// Grille ordonnée 2x2, motif par défaut
    pub fn grid_2x2() -> Self {
        Self {
            offsets: vec![
                Vec2::new(0.25, 0.25),
                Vec2::new(0.75, 0.25),
                Vec2::new(0.25, 0.75),
                Vec2::new(0.75, 0.75),
            ],
        }
    }

    /// Grille tournée à 4 points
    pub fn rotated_grid() -> Self {
        Self {
            offsets: vec![
                Vec2::new(0.375, 0.125),
                Vec2::new(0.875, 0.375),
                Vec2::new(0.125, 0.625),
                Vec2::new(0.625, 0.875),
            ],
        }
    }

    /// Un seul échantillon au centre du pixel : pas d'anti-aliasing
    pub fn single() -> Self {
        Self {
            offsets: vec![Vec2::splat(0.5)],
        }
    }

    /// Retrouve un motif prédéfini par son nom de configuration
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "grid" => Ok(Self::grid_2x2()),
            "rotated" => Ok(Self::rotated_grid()),
            "single" => Ok(Self::single()),
            other => Err(RasterError::InvalidSamplePattern(format!(
                "motif inconnu '{}'",
                other
            ))),
        }
    }

    pub fn offsets(&self) -> &[Vec2] {
        &self.offsets
    }

    /// Nombre d'échantillons par pixel
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Points d'échantillonnage du pixel (x, y), dans l'ordre des slots
    pub fn sample_points(&self, x: i32, y: i32) -> impl Iterator<Item = Vec2> + '_ {
        let origin = Vec2::new(x as f32, y as f32);
        self.offsets.iter().map(move |offset| origin + *offset)
    }
}

impl Default for SamplePattern {
    fn default() -> Self {
        Self::grid_2x2()
    }
}
