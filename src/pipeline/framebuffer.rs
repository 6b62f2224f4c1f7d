//! Framebuffer et buffers d'échantillons
//!
//! Le framebuffer est stocké ligne par ligne depuis le haut de l'image,
//! alors que les coordonnées pixel ont leur origine en bas à gauche :
//! `index = (height - 1 - y) * width + x`.

use std::path::Path;

use glam::Vec3;
use image::{GrayImage, Luma, Rgb, RgbImage};
use log::info;

use super::rasterizer::PixelBounds;
use super::Result;

/// Index linéaire du pixel (x, y), origine en bas à gauche
#[inline]
fn flipped_index(width: u32, height: u32, x: u32, y: u32) -> usize {
    (height - 1 - y) as usize * width as usize + x as usize
}

/// Framebuffer couleur et profondeur résolue par pixel
#[derive(Debug, Clone)]
pub struct Framebuffer {
    pub width: u32,
    pub height: u32,
    color_data: Vec<Vec3>,
    depth_data: Vec<f32>,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Self {
        let pixel_count = width as usize * height as usize;
        Self {
            width,
            height,
            color_data: vec![Vec3::ZERO; pixel_count],
            depth_data: vec![f32::INFINITY; pixel_count],
        }
    }

    /// Index linéaire du pixel (x, y)
    pub fn get_index(&self, x: u32, y: u32) -> usize {
        flipped_index(self.width, self.height, x, y)
    }

    fn checked_index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| self.get_index(x, y))
    }

    /// Couleur du pixel (x, y), None hors de l'écran
    pub fn pixel(&self, x: u32, y: u32) -> Option<Vec3> {
        self.checked_index(x, y).map(|i| self.color_data[i])
    }

    /// Profondeur résolue du pixel (x, y)
    pub fn depth(&self, x: u32, y: u32) -> Option<f32> {
        self.checked_index(x, y).map(|i| self.depth_data[i])
    }

    /// Écrit la couleur d'un pixel ; ignoré hors de l'écran
    #[cfg(test)]
    fn set_pixel(&mut self, x: u32, y: u32, color: Vec3) {
        if let Some(i) = self.checked_index(x, y) {
            self.color_data[i] = color;
        }
    }

    /// Pixels en ordre ligne par ligne depuis le haut
    pub fn as_slice(&self) -> &[Vec3] {
        &self.color_data
    }

    pub fn depth_slice(&self) -> &[f32] {
        &self.depth_data
    }

    pub fn clear_color(&mut self) {
        self.color_data.fill(Vec3::ZERO);
    }

    pub fn clear_depth(&mut self) {
        self.depth_data.fill(f32::INFINITY);
    }

    /// Moyenne les échantillons de chaque pixel de la région.
    ///
    /// Les échantillons jamais couverts restent noirs et comptent dans la
    /// moyenne. La profondeur du pixel devient la plus petite de ses
    /// échantillons.
    pub fn resolve(&mut self, samples: &SampleBuffer, bounds: PixelBounds) {
        for y in bounds.min_y..=bounds.max_y {
            for x in bounds.min_x..=bounds.max_x {
                let index = self.get_index(x as u32, y as u32);
                self.color_data[index] = samples.average_color(index);
                self.depth_data[index] = samples.min_depth(index);
            }
        }
    }

    /// Convertit en image RGB 8 bits, canaux bornés à [0, 255]
    pub fn to_rgb_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |x, y| {
            let c = self.color_data[y as usize * self.width as usize + x as usize];
            let channel = |v: f32| v.clamp(0.0, 255.0).round() as u8;
            Rgb([channel(c.x), channel(c.y), channel(c.z)])
        })
    }

    /// Visualisation de la profondeur : plus proche = plus clair, noir si vide
    pub fn depth_image(&self) -> GrayImage {
        let (min, max) = self
            .depth_data
            .iter()
            .filter(|d| d.is_finite())
            .fold((f32::MAX, f32::MIN), |(lo, hi), &d| (lo.min(d), hi.max(d)));
        let range = max - min;

        GrayImage::from_fn(self.width, self.height, |x, y| {
            let d = self.depth_data[y as usize * self.width as usize + x as usize];
            let value = if !d.is_finite() {
                0
            } else if range <= f32::EPSILON {
                255
            } else {
                (55.0 + 200.0 * (max - d) / range).round() as u8
            };
            Luma([value])
        })
    }

    /// Enregistre le framebuffer en PNG
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.to_rgb_image().save(path.as_ref())?;
        info!(
            "Image {}x{} enregistrée dans {}",
            self.width,
            self.height,
            path.as_ref().display()
        );
        Ok(())
    }
}

/// Profondeur et couleur par échantillon, slots appariés.
///
/// Le slot `s` du pixel d'index `p` est à `p * samples_per_pixel + s`,
/// avec le même index de pixel que le framebuffer.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    pub width: u32,
    pub height: u32,
    samples_per_pixel: usize,
    depth: Vec<f32>,
    color: Vec<Vec3>,
}

impl SampleBuffer {
    pub fn new(width: u32, height: u32, samples_per_pixel: usize) -> Self {
        let len = width as usize * height as usize * samples_per_pixel;
        Self {
            width,
            height,
            samples_per_pixel,
            depth: vec![f32::INFINITY; len],
            color: vec![Vec3::ZERO; len],
        }
    }

    pub fn samples_per_pixel(&self) -> usize {
        self.samples_per_pixel
    }

    /// Index de pixel partagé avec le framebuffer
    pub fn pixel_index(&self, x: u32, y: u32) -> usize {
        flipped_index(self.width, self.height, x, y)
    }

    fn range(&self, pixel: usize) -> std::ops::Range<usize> {
        let start = pixel * self.samples_per_pixel;
        start..start + self.samples_per_pixel
    }

    /// Profondeurs des échantillons du pixel (x, y)
    pub fn depths(&self, x: u32, y: u32) -> Option<&[f32]> {
        (x < self.width && y < self.height).then(|| &self.depth[self.range(self.pixel_index(x, y))])
    }

    /// Couleurs des échantillons du pixel (x, y)
    pub fn colors(&self, x: u32, y: u32) -> Option<&[Vec3]> {
        (x < self.width && y < self.height).then(|| &self.color[self.range(self.pixel_index(x, y))])
    }

    pub fn depth_slice(&self) -> &[f32] {
        &self.depth
    }

    pub fn color_slice(&self) -> &[Vec3] {
        &self.color
    }

    /// Test de profondeur strict : écrit profondeur et couleur ensemble
    /// si `z` est plus proche que la valeur stockée.
    #[inline]
    pub fn test_and_set(&mut self, pixel: usize, slot: usize, z: f32, color: Vec3) -> bool {
        let i = pixel * self.samples_per_pixel + slot;
        if z < self.depth[i] {
            self.depth[i] = z;
            self.color[i] = color;
            true
        } else {
            false
        }
    }

    /// Moyenne des couleurs des échantillons d'un pixel
    pub fn average_color(&self, pixel: usize) -> Vec3 {
        let sum: Vec3 = self.color[self.range(pixel)].iter().copied().sum();
        sum / self.samples_per_pixel as f32
    }

    /// Plus petite profondeur parmi les échantillons d'un pixel
    pub fn min_depth(&self, pixel: usize) -> f32 {
        self.depth[self.range(pixel)]
            .iter()
            .copied()
            .fold(f32::INFINITY, f32::min)
    }

    /// Remet profondeurs à +inf et couleurs à noir
    pub fn clear(&mut self) {
        self.depth.fill(f32::INFINITY);
        self.color.fill(Vec3::ZERO);
    }
}
