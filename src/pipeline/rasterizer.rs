//! Rastérisation des triangles écran
//!
//! Pour chaque pixel de la boîte englobante, chaque point du motif
//! d'échantillonnage est testé par les trois fonctions d'arête. Un
//! échantillon est dedans si les trois valeurs ont strictement le même
//! signe : un point exactement sur une arête est dehors.

use glam::{Vec2, Vec3, Vec3Swizzles};

use super::framebuffer::SampleBuffer;
use super::geometry::{ScreenTriangle, ScreenVertex};
use super::sampling::SamplePattern;

/// Aire (doublée) minimale d'un triangle écran rastérisable
pub const MIN_TRIANGLE_AREA: f32 = 1e-6;

/// Boîte englobante en pixels, bornes incluses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBounds {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

impl PixelBounds {
    pub fn new(min_x: i32, max_x: i32, min_y: i32, max_y: i32) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// Boîte [floor(min), ceil(max)] des x, y des trois sommets
    pub fn of_triangle(v: &[Vec3; 3]) -> Self {
        let min = v[0].min(v[1]).min(v[2]);
        let max = v[0].max(v[1]).max(v[2]);
        Self {
            min_x: min.x.floor() as i32,
            max_x: max.x.ceil() as i32,
            min_y: min.y.floor() as i32,
            max_y: max.y.ceil() as i32,
        }
    }

    /// Boîte de l'écran entier
    pub fn screen(width: u32, height: u32) -> Option<Self> {
        Self::new(0, width as i32 - 1, 0, height as i32 - 1).clip(width, height)
    }

    /// Restreint la boîte à l'écran ; None si elle ne le touche pas
    pub fn clip(self, width: u32, height: u32) -> Option<Self> {
        let clipped = Self {
            min_x: self.min_x.max(0),
            max_x: self.max_x.min(width as i32 - 1),
            min_y: self.min_y.max(0),
            max_y: self.max_y.min(height as i32 - 1),
        };
        (clipped.min_x <= clipped.max_x && clipped.min_y <= clipped.max_y).then_some(clipped)
    }

    /// Plus petite boîte contenant les deux
    pub fn union(self, other: Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            max_x: self.max_x.max(other.max_x),
            min_y: self.min_y.min(other.min_y),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Nombre de pixels couverts, 0 pour une boîte vide
    pub fn pixel_count(&self) -> u64 {
        let span = |min: i32, max: i32| (i64::from(max) - i64::from(min) + 1).max(0) as u64;
        span(self.min_x, self.max_x) * span(self.min_y, self.max_y)
    }
}

/// Résultat de la rastérisation d'un triangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterOutcome {
    /// Triangle parcouru ; `bounds` est la région à résoudre
    Covered {
        bounds: PixelBounds,
        samples_written: usize,
    },
    /// Boîte englobante entièrement hors de l'écran
    Offscreen,
    /// Aire nulle ou projection invalide : triangle ignoré
    Degenerate,
}

/// Fonction d'arête : produit vectoriel 2D de (b - a) et (p - a)
#[inline]
pub fn edge_function(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b - a).perp_dot(p - a)
}

/// Valeurs des arêtes v0->v1, v1->v2, v2->v0 au point p
#[inline]
fn edge_values(p: Vec2, v: &[Vec3; 3]) -> [f32; 3] {
    let (a, b, c) = (v[0].xy(), v[1].xy(), v[2].xy());
    [
        edge_function(a, b, p),
        edge_function(b, c, p),
        edge_function(c, a, p),
    ]
}

#[inline]
fn same_strict_sign(e: &[f32; 3]) -> bool {
    (e[0] > 0.0 && e[1] > 0.0 && e[2] > 0.0) || (e[0] < 0.0 && e[1] < 0.0 && e[2] < 0.0)
}

/// Aire signée doublée du triangle écran
pub fn signed_area(v: &[Vec3; 3]) -> f32 {
    edge_function(v[0].xy(), v[1].xy(), v[2].xy())
}

/// Vrai si (x, y) est strictement à l'intérieur du triangle
pub fn inside_triangle(x: f32, y: f32, v: &[Vec3; 3]) -> bool {
    same_strict_sign(&edge_values(Vec2::new(x, y), v))
}

/// Coordonnées barycentriques écran (alpha, beta, gamma) de (x, y).
///
/// None pour un triangle d'aire nulle.
pub fn barycentric_2d(x: f32, y: f32, v: &[Vec3; 3]) -> Option<Vec3> {
    let area = signed_area(v);
    if area.abs() < MIN_TRIANGLE_AREA {
        return None;
    }
    let e = edge_values(Vec2::new(x, y), v);
    Some(barycentric_from_edges(&e, area))
}

#[inline]
fn barycentric_from_edges(e: &[f32; 3], area: f32) -> Vec3 {
    // Le poids d'un sommet est l'arête opposée rapportée à l'aire
    Vec3::new(e[1] / area, e[2] / area, e[0] / area)
}

/// Profondeur interpolée avec correction de perspective, à partir des w
/// d'avant la division homogène.
#[inline]
pub fn interpolate_depth(bary: Vec3, vertices: &[ScreenVertex; 3]) -> f32 {
    let w = Vec3::new(
        vertices[0].clip_position.w,
        vertices[1].clip_position.w,
        vertices[2].clip_position.w,
    );
    let z = Vec3::new(
        vertices[0].position.z,
        vertices[1].position.z,
        vertices[2].position.z,
    );

    let w_reciprocal = 1.0 / (bary / w).element_sum();
    w_reciprocal * (bary * z / w).element_sum()
}

/// Rastérise un triangle dans les buffers d'échantillons.
///
/// Chaque échantillon couvert passe un test de profondeur strict ; en cas
/// de succès, profondeur et couleur unie du triangle sont écrites ensemble.
pub fn rasterize_triangle(
    triangle: &ScreenTriangle,
    pattern: &SamplePattern,
    samples: &mut SampleBuffer,
) -> RasterOutcome {
    if triangle.has_invalid_projection() {
        return RasterOutcome::Degenerate;
    }

    let v = triangle.screen_positions();
    let area = signed_area(&v);
    if area.abs() < MIN_TRIANGLE_AREA {
        return RasterOutcome::Degenerate;
    }

    let Some(bounds) = PixelBounds::of_triangle(&v).clip(samples.width, samples.height) else {
        return RasterOutcome::Offscreen;
    };

    let color = triangle.flat_color();
    let mut samples_written = 0;

    for y in bounds.min_y..=bounds.max_y {
        for x in bounds.min_x..=bounds.max_x {
            let pixel = samples.pixel_index(x as u32, y as u32);

            for (slot, point) in pattern.sample_points(x, y).enumerate() {
                let e = edge_values(point, &v);
                if !same_strict_sign(&e) {
                    continue;
                }

                let bary = barycentric_from_edges(&e, area);
                let z = interpolate_depth(bary, &triangle.vertices);

                if samples.test_and_set(pixel, slot, z, color) {
                    samples_written += 1;
                }
            }
        }
    }

    RasterOutcome::Covered {
        bounds,
        samples_written,
    }
}
