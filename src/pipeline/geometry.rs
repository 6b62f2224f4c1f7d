//! Étage de transformation
//!
//! Passe les sommets de l'espace objet à l'espace écran : matrice
//! model-view-projection, division homogène, puis transformation viewport
//! avec remappage de la profondeur sur la plage fixe [DEPTH_NEAR, DEPTH_FAR].

use glam::{Mat4, Vec3, Vec4, Vec4Swizzles};

use crate::{DEPTH_FAR, DEPTH_NEAR};

/// |w| minimal accepté avant la division homogène
pub const MIN_CLIP_W: f32 = 1e-6;

/// Sommet projeté à l'écran
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenVertex {
    /// Position en clip space, avant la division homogène
    pub clip_position: Vec4,
    /// x, y en pixels, z en profondeur remappée
    pub position: Vec3,
}

/// Triangle transitoire, vit le temps de sa rastérisation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenTriangle {
    pub vertices: [ScreenVertex; 3],
    pub colors: [Vec3; 3],
}

impl ScreenTriangle {
    /// Construit un triangle déjà en coordonnées écran, avec w = 1
    pub fn from_screen(positions: [Vec3; 3], color: Vec3) -> Self {
        let vertex = |p: Vec3| ScreenVertex {
            clip_position: p.extend(1.0),
            position: p,
        };
        Self {
            vertices: [vertex(positions[0]), vertex(positions[1]), vertex(positions[2])],
            colors: [color; 3],
        }
    }

    /// Positions écran des trois sommets
    pub fn screen_positions(&self) -> [Vec3; 3] {
        [
            self.vertices[0].position,
            self.vertices[1].position,
            self.vertices[2].position,
        ]
    }

    /// Couleur unie du triangle : celle du premier sommet, sans interpolation
    pub fn flat_color(&self) -> Vec3 {
        self.colors[0]
    }

    /// Vrai si la division homogène ou les coordonnées écran sont inexploitables
    pub fn has_invalid_projection(&self) -> bool {
        let near_zero = self.vertices.iter().any(|v| {
            v.clip_position.w.abs() < MIN_CLIP_W || !v.position.is_finite()
        });
        // Des w de signes opposés : le triangle traverse le plan de l'œil
        let straddles_eye = {
            let positive = self.vertices.iter().filter(|v| v.clip_position.w > 0.0).count();
            positive != 0 && positive != 3
        };
        near_zero || straddles_eye
    }
}

/// Processeur de géométrie : état de transformation du pipeline
#[derive(Debug, Clone)]
pub struct GeometryProcessor {
    pub model_matrix: Mat4,
    pub view_matrix: Mat4,
    pub projection_matrix: Mat4,

    width: u32,
    height: u32,

    // Cache de projection * view * model
    mvp_cache: Option<Mat4>,
}

impl GeometryProcessor {
    /// Crée un processeur avec des matrices identité
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            model_matrix: Mat4::IDENTITY,
            view_matrix: Mat4::IDENTITY,
            projection_matrix: Mat4::IDENTITY,
            width,
            height,
            mvp_cache: None,
        }
    }

    /// Remplace la matrice de modèle
    pub fn set_model_matrix(&mut self, matrix: Mat4) {
        self.model_matrix = matrix;
        self.invalidate_cache();
    }

    /// Remplace la matrice de vue
    pub fn set_view_matrix(&mut self, matrix: Mat4) {
        self.view_matrix = matrix;
        self.invalidate_cache();
    }

    /// Remplace la matrice de projection
    pub fn set_projection_matrix(&mut self, matrix: Mat4) {
        self.projection_matrix = matrix;
        self.invalidate_cache();
    }

    /// Configure une caméra look-at (repère main droite)
    pub fn set_camera(&mut self, eye: Vec3, target: Vec3, up: Vec3) {
        self.set_view_matrix(Mat4::look_at_rh(eye, target, up));
    }

    /// Configure une projection perspective.
    ///
    /// Volume de clip de type OpenGL : un point plus proche de la caméra
    /// obtient une profondeur plus petite après remappage.
    pub fn set_perspective(&mut self, fov: f32, aspect: f32, near: f32, far: f32) {
        self.set_projection_matrix(Mat4::perspective_rh_gl(fov, aspect, near, far));
    }

    /// Obtient la matrice MVP (Model-View-Projection) avec cache
    pub fn get_mvp_matrix(&mut self) -> Mat4 {
        if let Some(cached) = self.mvp_cache {
            return cached;
        }

        let mvp = self.projection_matrix * self.view_matrix * self.model_matrix;
        self.mvp_cache = Some(mvp);
        mvp
    }

    /// Dimensions du viewport
    pub fn viewport(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub(crate) fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    /// Projette un sommet : MVP, division homogène, viewport
    pub fn project_vertex(&self, mvp: &Mat4, position: Vec3) -> ScreenVertex {
        let clip_position = *mvp * position.extend(1.0);

        // Division homogène
        let ndc = clip_position / clip_position.w;

        ScreenVertex {
            clip_position,
            position: self.viewport_transform(ndc.xyz()),
        }
    }

    /// Transformation viewport : NDC [-1, 1] vers pixels [0, width] x [0, height]
    pub fn viewport_transform(&self, ndc: Vec3) -> Vec3 {
        let f1 = (DEPTH_FAR - DEPTH_NEAR) / 2.0;
        let f2 = (DEPTH_FAR + DEPTH_NEAR) / 2.0;

        Vec3::new(
            0.5 * self.width as f32 * (ndc.x + 1.0),
            0.5 * self.height as f32 * (ndc.y + 1.0),
            ndc.z * f1 + f2,
        )
    }

    /// Projette un triangle complet avec la MVP fournie
    pub fn transform_triangle(
        &self,
        mvp: &Mat4,
        positions: [Vec3; 3],
        colors: [Vec3; 3],
    ) -> ScreenTriangle {
        ScreenTriangle {
            vertices: [
                self.project_vertex(mvp, positions[0]),
                self.project_vertex(mvp, positions[1]),
                self.project_vertex(mvp, positions[2]),
            ],
            colors,
        }
    }

    fn invalidate_cache(&mut self) {
        self.mvp_cache = None;
    }
}

/// Rotation autour de l'axe Z, angle en degrés
pub fn model_rotation_z(angle_deg: f32) -> Mat4 {
    Mat4::from_rotation_z(angle_deg.to_radians())
}
