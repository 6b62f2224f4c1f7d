//! Erreurs du pipeline de rastérisation

/// Erreurs explicites remontées par le pipeline
#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    /// Handle inconnu, libéré ou périmé
    #[error("handle de buffer invalide: {kind} #{id}")]
    InvalidHandle { kind: &'static str, id: u64 },

    /// Un triangle référence un sommet hors du buffer de positions
    #[error("triangle {triangle}: indice de position {index} hors limites (taille {len})")]
    IndexOutOfRange {
        triangle: usize,
        index: u32,
        len: usize,
    },

    /// Un triangle référence une couleur hors du buffer de couleurs
    #[error("triangle {triangle}: indice de couleur {index} hors limites (taille {len})")]
    ColorOutOfRange {
        triangle: usize,
        index: u32,
        len: usize,
    },

    /// Dimensions de rendu nulles ou trop grandes
    #[error("dimensions invalides: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// Motif d'échantillonnage vide ou hors du pixel
    #[error("motif d'échantillonnage invalide: {0}")]
    InvalidSamplePattern(String),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}
