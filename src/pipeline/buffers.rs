//! Registre des buffers de sommets
//!
//! Chaque type de buffer (positions, indices, couleurs) possède sa propre
//! arène. Un handle porte l'emplacement dans l'arène et un identifiant
//! unique global : un handle libéré ou d'un autre type ne peut jamais
//! désigner les données d'un autre upload.

use std::fmt;
use std::marker::PhantomData;

use glam::Vec3;
use log::debug;

use super::Result;
use crate::error::RasterError;

/// Triplet d'indices de sommets formant un triangle
pub type IndexTriple = [u32; 3];

/// Type de buffer, associé à son contenu
pub trait BufferKind {
    /// Élément stocké dans le buffer
    type Item: Clone;

    /// Nom utilisé dans les messages d'erreur
    const NAME: &'static str;
}

/// Buffer de positions en espace objet
#[derive(Debug)]
pub enum Positions {}

/// Buffer de triplets d'indices
#[derive(Debug)]
pub enum Indices {}

/// Buffer de couleurs par sommet
#[derive(Debug)]
pub enum Colors {}

impl BufferKind for Positions {
    type Item = Vec3;
    const NAME: &'static str = "positions";
}

impl BufferKind for Indices {
    type Item = IndexTriple;
    const NAME: &'static str = "indices";
}

impl BufferKind for Colors {
    type Item = Vec3;
    const NAME: &'static str = "couleurs";
}

/// Handle typé vers un buffer du registre
pub struct BufferId<K> {
    slot: usize,
    id: u64,
    _kind: PhantomData<fn() -> K>,
}

pub type PositionBufferId = BufferId<Positions>;
pub type IndexBufferId = BufferId<Indices>;
pub type ColorBufferId = BufferId<Colors>;

impl<K> BufferId<K> {
    fn new(slot: usize, id: u64) -> Self {
        Self {
            slot,
            id,
            _kind: PhantomData,
        }
    }

    /// Identifiant unique, jamais réutilisé, tous types confondus
    pub fn raw(&self) -> u64 {
        self.id
    }
}

// Implémentations manuelles : les marqueurs de type n'ont pas besoin de Clone/Eq.
impl<K> Clone for BufferId<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for BufferId<K> {}

impl<K> PartialEq for BufferId<K> {
    fn eq(&self, other: &Self) -> bool {
        self.slot == other.slot && self.id == other.id
    }
}

impl<K> Eq for BufferId<K> {}

impl<K: BufferKind> fmt::Debug for BufferId<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BufferId<{}>(slot {}, id {})", K::NAME, self.slot, self.id)
    }
}

struct Entry<T> {
    id: u64,
    data: Vec<T>,
}

/// Arène d'un seul type de buffer
struct Arena<K: BufferKind> {
    slots: Vec<Option<Entry<K::Item>>>,
    free: Vec<usize>,
}

impl<K: BufferKind> Arena<K> {
    fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    fn insert(&mut self, id: u64, data: Vec<K::Item>) -> BufferId<K> {
        let entry = Some(Entry { id, data });
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = entry;
                slot
            }
            None => {
                self.slots.push(entry);
                self.slots.len() - 1
            }
        };
        BufferId::new(slot, id)
    }

    fn get(&self, handle: BufferId<K>) -> Result<&[K::Item]> {
        match self.slots.get(handle.slot) {
            Some(Some(entry)) if entry.id == handle.id => Ok(&entry.data),
            _ => Err(RasterError::InvalidHandle {
                kind: K::NAME,
                id: handle.id,
            }),
        }
    }

    fn remove(&mut self, handle: BufferId<K>) -> Result<Vec<K::Item>> {
        self.get(handle)?;
        let entry = self.slots[handle.slot].take();
        self.free.push(handle.slot);
        Ok(entry.map(|e| e.data).unwrap_or_default())
    }

    fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }
}

/// Registre des buffers uploadés, consulté au moment du dessin
pub struct BufferRegistry {
    positions: Arena<Positions>,
    indices: Arena<Indices>,
    colors: Arena<Colors>,
    next_id: u64,
}

impl BufferRegistry {
    pub fn new() -> Self {
        Self {
            positions: Arena::new(),
            indices: Arena::new(),
            colors: Arena::new(),
            next_id: 0,
        }
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Stocke une liste de positions telle quelle
    pub fn load_positions(&mut self, positions: Vec<Vec3>) -> PositionBufferId {
        let id = self.next_id();
        debug!("Upload de {} positions (id {})", positions.len(), id);
        self.positions.insert(id, positions)
    }

    /// Stocke une liste de triplets d'indices telle quelle
    pub fn load_indices(&mut self, indices: Vec<IndexTriple>) -> IndexBufferId {
        let id = self.next_id();
        debug!("Upload de {} triangles (id {})", indices.len(), id);
        self.indices.insert(id, indices)
    }

    /// Stocke une liste de couleurs par sommet telle quelle
    pub fn load_colors(&mut self, colors: Vec<Vec3>) -> ColorBufferId {
        let id = self.next_id();
        debug!("Upload de {} couleurs (id {})", colors.len(), id);
        self.colors.insert(id, colors)
    }

    pub fn positions(&self, handle: PositionBufferId) -> Result<&[Vec3]> {
        self.positions.get(handle)
    }

    pub fn indices(&self, handle: IndexBufferId) -> Result<&[IndexTriple]> {
        self.indices.get(handle)
    }

    pub fn colors(&self, handle: ColorBufferId) -> Result<&[Vec3]> {
        self.colors.get(handle)
    }

    /// Libère un buffer de positions et rend ses données
    pub fn release_positions(&mut self, handle: PositionBufferId) -> Result<Vec<Vec3>> {
        self.positions.remove(handle)
    }

    pub fn release_indices(&mut self, handle: IndexBufferId) -> Result<Vec<IndexTriple>> {
        self.indices.remove(handle)
    }

    pub fn release_colors(&mut self, handle: ColorBufferId) -> Result<Vec<Vec3>> {
        self.colors.remove(handle)
    }

    /// Nombre de buffers vivants, tous types confondus
    pub fn live_buffers(&self) -> usize {
        self.positions.len() + self.indices.len() + self.colors.len()
    }
}

impl Default for BufferRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_returns_stored_data() {
        let mut registry = BufferRegistry::new();
        let pos = registry.load_positions(vec![Vec3::X, Vec3::Y]);
        let ind = registry.load_indices(vec![[0, 1, 0]]);

        assert_eq!(registry.positions(pos).unwrap(), &[Vec3::X, Vec3::Y]);
        assert_eq!(registry.indices(ind).unwrap(), &[[0, 1, 0]]);
        assert_eq!(registry.live_buffers(), 2);
    }

    #[test]
    fn test_ids_are_shared_across_kinds() {
        let mut registry = BufferRegistry::new();
        let pos = registry.load_positions(vec![]);
        let ind = registry.load_indices(vec![]);
        let col = registry.load_colors(vec![]);

        assert_eq!(pos.raw(), 0);
        assert_eq!(ind.raw(), 1);
        assert_eq!(col.raw(), 2);
    }

    #[test]
    fn test_released_handle_is_stale() {
        let mut registry = BufferRegistry::new();
        let old = registry.load_colors(vec![Vec3::ONE]);
        assert_eq!(registry.release_colors(old).unwrap(), vec![Vec3::ONE]);

        // Le slot est réutilisé, mais pas l'identifiant
        let new = registry.load_colors(vec![Vec3::ZERO]);
        assert_ne!(old, new);
        assert!(matches!(
            registry.colors(old),
            Err(RasterError::InvalidHandle { kind: "couleurs", .. })
        ));
        assert_eq!(registry.colors(new).unwrap(), &[Vec3::ZERO]);
        assert!(registry.release_colors(old).is_err());
    }

    #[test]
    fn test_unknown_slot_is_rejected() {
        let mut big = BufferRegistry::new();
        big.load_indices(vec![]);
        let second = big.load_indices(vec![[0, 1, 2]]);

        let empty = BufferRegistry::new();
        assert!(matches!(
            empty.indices(second),
            Err(RasterError::InvalidHandle { kind: "indices", id: 1 })
        ));
    }
}
