//! Pipeline de rastérisation logicielle
//!
//! Les données descendent dans un seul sens :
//! - registre de buffers (positions, indices, couleurs)
//! - étage de transformation (MVP, division homogène, viewport)
//! - rastérisation suréchantillonnée avec test de profondeur
//! - résolution des échantillons vers le framebuffer

pub mod buffers;
pub mod framebuffer;
pub mod geometry;
pub mod rasterizer;
pub mod sampling;

use std::time::Instant;

use bitflags::bitflags;
use glam::{Mat4, Vec3};
use log::{debug, info, trace, warn};

pub use buffers::*;
pub use framebuffer::*;
pub use geometry::*;
pub use rasterizer::*;
pub use sampling::*;

use crate::error::RasterError;

pub type Result<T> = std::result::Result<T, RasterError>;

/// Plus grande dimension acceptée pour le framebuffer
pub const MAX_DIMENSION: u32 = 16_384;

bitflags! {
    /// Buffers à remettre à zéro par `Rasterizer::clear`
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Buffers: u8 {
        /// Framebuffer couleur
        const COLOR = 1 << 0;

        /// Profondeur par pixel et buffers d'échantillons appariés
        const DEPTH = 1 << 1;
    }
}

/// Type de primitive d'un appel de dessin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Primitive {
    #[default]
    Triangle,
}

/// Statistiques de rendu pour le débogage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Nombre d'appels à `draw` réussis
    pub draw_calls: u64,

    /// Triangles reçus par l'étage de transformation
    pub triangles_submitted: u64,

    /// Triangles dont la boîte touche l'écran
    pub triangles_rasterized: u64,

    /// Triangles dégénérés ou hors écran
    pub triangles_skipped: u64,

    /// Échantillons ayant passé le test de profondeur
    pub samples_written: u64,

    /// Durée du dernier appel de dessin (en microsecondes)
    pub last_draw_time_us: u64,
}

/// Contexte de rastérisation : possède l'état de transformation, les
/// buffers uploadés et les buffers de sortie.
pub struct Rasterizer {
    registry: BufferRegistry,
    geometry: GeometryProcessor,
    pattern: SamplePattern,
    framebuffer: Framebuffer,
    samples: SampleBuffer,
    stats: RenderStats,
}

impl Rasterizer {
    /// Crée un rastériseur avec le motif 2x2 par défaut
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Self::with_pattern(width, height, SamplePattern::default())
    }

    /// Crée un rastériseur avec un motif d'échantillonnage donné
    pub fn with_pattern(width: u32, height: u32, pattern: SamplePattern) -> Result<Self> {
        if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(RasterError::InvalidDimensions { width, height });
        }
        if pattern.is_empty() {
            return Err(RasterError::InvalidSamplePattern(
                "aucun décalage".to_string(),
            ));
        }

        info!(
            "Allocation des buffers {}x{} ({} échantillons par pixel)",
            width,
            height,
            pattern.len()
        );

        Ok(Self {
            registry: BufferRegistry::new(),
            geometry: GeometryProcessor::new(width, height),
            framebuffer: Framebuffer::new(width, height),
            samples: SampleBuffer::new(width, height, pattern.len()),
            pattern,
            stats: RenderStats::default(),
        })
    }

    pub fn width(&self) -> u32 {
        self.framebuffer.width
    }

    pub fn height(&self) -> u32 {
        self.framebuffer.height
    }

    pub fn load_positions(&mut self, positions: Vec<Vec3>) -> PositionBufferId {
        self.registry.load_positions(positions)
    }

    pub fn load_indices(&mut self, indices: Vec<IndexTriple>) -> IndexBufferId {
        self.registry.load_indices(indices)
    }

    pub fn load_colors(&mut self, colors: Vec<Vec3>) -> ColorBufferId {
        self.registry.load_colors(colors)
    }

    /// Accès au registre, par exemple pour libérer des buffers
    pub fn registry(&self) -> &BufferRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut BufferRegistry {
        &mut self.registry
    }

    pub fn set_model(&mut self, matrix: Mat4) {
        self.geometry.set_model_matrix(matrix);
    }

    pub fn set_view(&mut self, matrix: Mat4) {
        self.geometry.set_view_matrix(matrix);
    }

    pub fn set_projection(&mut self, matrix: Mat4) {
        self.geometry.set_projection_matrix(matrix);
    }

    pub fn geometry(&self) -> &GeometryProcessor {
        &self.geometry
    }

    pub fn geometry_mut(&mut self) -> &mut GeometryProcessor {
        &mut self.geometry
    }

    pub fn sample_pattern(&self) -> &SamplePattern {
        &self.pattern
    }

    /// Change de motif ; les buffers d'échantillons sont réalloués vides
    pub fn set_sample_pattern(&mut self, pattern: SamplePattern) {
        info!("Nouveau motif: {} échantillons par pixel", pattern.len());
        self.samples = SampleBuffer::new(self.width(), self.height(), pattern.len());
        self.pattern = pattern;
    }

    /// Change la taille de sortie ; tous les buffers de sortie sont réalloués
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(RasterError::InvalidDimensions { width, height });
        }
        info!("Redimensionnement des buffers en {}x{}", width, height);
        self.geometry.resize(width, height);
        self.framebuffer = Framebuffer::new(width, height);
        self.samples = SampleBuffer::new(width, height, self.pattern.len());
        Ok(())
    }

    /// Dessine les triangles d'un maillage avec la transformation courante.
    ///
    /// Tous les indices sont validés avant la moindre écriture : un appel
    /// en erreur laisse les buffers intacts.
    pub fn draw(
        &mut self,
        positions: PositionBufferId,
        indices: IndexBufferId,
        colors: ColorBufferId,
        primitive: Primitive,
    ) -> Result<()> {
        let Primitive::Triangle = primitive;
        let start = Instant::now();

        let buf = self.registry.positions(positions)?;
        let ind = self.registry.indices(indices)?;
        let col = self.registry.colors(colors)?;

        if let Err(e) = validate_indices(ind, buf.len(), col.len()) {
            warn!("Appel de dessin rejeté: {}", e);
            return Err(e);
        }

        let mvp = self.geometry.get_mvp_matrix();
        let mut dirty: Option<PixelBounds> = None;
        let mut skipped = 0u64;
        let mut rasterized = 0u64;
        let mut samples_written = 0u64;

        for (n, triple) in ind.iter().enumerate() {
            let [a, b, c] = triple.map(|i| i as usize);
            let triangle = self.geometry.transform_triangle(
                &mvp,
                [buf[a], buf[b], buf[c]],
                [col[a], col[b], col[c]],
            );

            match rasterize_triangle(&triangle, &self.pattern, &mut self.samples) {
                RasterOutcome::Covered {
                    bounds,
                    samples_written: written,
                } => {
                    rasterized += 1;
                    samples_written += written as u64;
                    dirty = Some(dirty.map_or(bounds, |d| d.union(bounds)));
                }
                outcome => {
                    trace!("Triangle {} ignoré: {:?}", n, outcome);
                    skipped += 1;
                }
            }
        }

        let resolved = dirty.map_or(0, |region| {
            self.framebuffer.resolve(&self.samples, region);
            region.pixel_count()
        });

        let elapsed = start.elapsed().as_micros() as u64;
        debug!(
            "draw: {} triangles, {} rastérisés, {} ignorés, {} échantillons, {} pixels en {} µs",
            ind.len(),
            rasterized,
            skipped,
            samples_written,
            resolved,
            elapsed
        );

        self.stats.draw_calls += 1;
        self.stats.triangles_submitted += ind.len() as u64;
        self.stats.triangles_rasterized += rasterized;
        self.stats.triangles_skipped += skipped;
        self.stats.samples_written += samples_written;
        self.stats.last_draw_time_us = elapsed;
        Ok(())
    }

    /// Rastérise un triangle déjà en coordonnées écran puis résout sa région
    pub fn rasterize_triangle(&mut self, triangle: &ScreenTriangle) -> RasterOutcome {
        let outcome = rasterize_triangle(triangle, &self.pattern, &mut self.samples);
        if let RasterOutcome::Covered { bounds, .. } = outcome {
            self.framebuffer.resolve(&self.samples, bounds);
        }
        outcome
    }

    /// Résout l'écran entier à partir de l'état courant des échantillons
    pub fn resolve_all(&mut self) {
        if let Some(screen) = PixelBounds::screen(self.width(), self.height()) {
            self.framebuffer.resolve(&self.samples, screen);
        }
    }

    /// Remet à zéro les buffers sélectionnés.
    ///
    /// `DEPTH` remet aussi les slots d'échantillons (profondeur et couleur),
    /// si bien que `clear(COLOR | DEPTH)` rend la frame suivante
    /// indépendante des précédentes.
    pub fn clear(&mut self, buffers: Buffers) {
        if buffers.contains(Buffers::COLOR) {
            self.framebuffer.clear_color();
        }
        if buffers.contains(Buffers::DEPTH) {
            self.framebuffer.clear_depth();
            self.samples.clear();
        }
    }

    pub fn frame_buffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    pub fn sample_buffer(&self) -> &SampleBuffer {
        &self.samples
    }

    pub fn stats(&self) -> &RenderStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = RenderStats::default();
    }
}

/// Vérifie qu'aucun triplet ne sort des buffers de positions et de couleurs
fn validate_indices(indices: &[IndexTriple], positions: usize, colors: usize) -> Result<()> {
    for (triangle, triple) in indices.iter().enumerate() {
        for &index in triple {
            if index as usize >= positions {
                return Err(RasterError::IndexOutOfRange {
                    triangle,
                    index,
                    len: positions,
                });
            }
            if index as usize >= colors {
                return Err(RasterError::ColorOutOfRange {
                    triangle,
                    index,
                    len: colors,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_dimensions() {
        assert!(matches!(
            Rasterizer::new(0, 10),
            Err(RasterError::InvalidDimensions { width: 0, height: 10 })
        ));
        assert!(Rasterizer::new(10, MAX_DIMENSION + 1).is_err());
        assert!(Rasterizer::new(1, 1).is_ok());
    }

    #[test]
    fn test_validate_indices() {
        assert!(validate_indices(&[[0, 1, 2]], 3, 3).is_ok());
        assert!(matches!(
            validate_indices(&[[0, 1, 2], [0, 3, 1]], 3, 4),
            Err(RasterError::IndexOutOfRange { triangle: 1, index: 3, len: 3 })
        ));
        assert!(matches!(
            validate_indices(&[[0, 1, 2]], 3, 2),
            Err(RasterError::ColorOutOfRange { triangle: 0, index: 2, len: 2 })
        ));
    }

    #[test]
    fn test_clear_flags() {
        let mut rasterizer = Rasterizer::new(4, 4).unwrap();
        let triangle = ScreenTriangle::from_screen(
            [Vec3::ZERO, Vec3::new(4.0, 0.0, 1.0), Vec3::new(0.0, 4.0, 1.0)],
            Vec3::splat(100.0),
        );
        rasterizer.rasterize_triangle(&triangle);
        assert_ne!(rasterizer.frame_buffer().pixel(0, 0), Some(Vec3::ZERO));

        // COLOR seul : les échantillons restent
        rasterizer.clear(Buffers::COLOR);
        assert_eq!(rasterizer.frame_buffer().pixel(0, 0), Some(Vec3::ZERO));
        assert!(rasterizer.sample_buffer().depth_slice().iter().any(|d| d.is_finite()));

        rasterizer.clear(Buffers::DEPTH);
        assert!(rasterizer.sample_buffer().depth_slice().iter().all(|d| d.is_infinite()));
        assert!(rasterizer.sample_buffer().color_slice().iter().all(|c| *c == Vec3::ZERO));
        assert!(rasterizer.frame_buffer().depth_slice().iter().all(|d| d.is_infinite()));
    }

    #[test]
    fn test_set_sample_pattern_reallocates() {
        let mut rasterizer = Rasterizer::new(4, 2).unwrap();
        assert_eq!(rasterizer.sample_buffer().depth_slice().len(), 4 * 2 * 4);

        rasterizer.set_sample_pattern(SamplePattern::single());
        assert_eq!(rasterizer.sample_buffer().samples_per_pixel(), 1);
        assert_eq!(rasterizer.sample_buffer().depth_slice().len(), 4 * 2);
    }

    #[test]
    fn test_resize() {
        let mut rasterizer = Rasterizer::new(4, 2).unwrap();
        rasterizer.resize(6, 3).unwrap();
        assert_eq!((rasterizer.width(), rasterizer.height()), (6, 3));
        assert_eq!(rasterizer.geometry().viewport(), (6, 3));
        assert_eq!(rasterizer.frame_buffer().as_slice().len(), 18);
        assert!(rasterizer.resize(0, 3).is_err());
    }
}
