use std::collections::BTreeMap;

use crate::assets::bitmap::Bitmap;

/// Role of a bitmap within an effect.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SourceKey {
    /// The image being revealed, cut or folded.
    Cover,
    /// Brand image moving over the unveil.
    Brand,
    /// Shape mask for the shape-cut effect.
    Shape,
    /// Left half of a split cover.
    LeftHalf,
    /// Right half of a split cover.
    RightHalf,
}

/// Bitmaps owned by one animation run, keyed by role.
#[derive(Clone, Debug, Default)]
pub struct SourceSet {
    bitmaps: BTreeMap<SourceKey, Bitmap>,
}

impl SourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: SourceKey, bitmap: Bitmap) -> Self {
        self.bitmaps.insert(key, bitmap);
        self
    }

    pub fn insert(&mut self, key: SourceKey, bitmap: Bitmap) -> Option<Bitmap> {
        self.bitmaps.insert(key, bitmap)
    }

    pub fn get(&self, key: SourceKey) -> Option<&Bitmap> {
        self.bitmaps.get(&key)
    }

    pub fn remove(&mut self, key: SourceKey) -> Option<Bitmap> {
        self.bitmaps.remove(&key)
    }

    pub fn contains(&self, key: SourceKey) -> bool {
        self.bitmaps.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.bitmaps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bitmaps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::PixelSize;

    #[test]
    fn insert_get_remove() {
        let bm = Bitmap::solid(PixelSize::new(2, 2), [1, 2, 3, 255]).unwrap();
        let mut set = SourceSet::new().with(SourceKey::Cover, bm.clone());
        assert!(set.contains(SourceKey::Cover));
        assert!(set.get(SourceKey::Brand).is_none());
        set.insert(SourceKey::Brand, bm);
        assert_eq!(set.len(), 2);
        assert!(set.contains(SourceKey::Brand));
        assert!(set.remove(SourceKey::Cover).is_some());
        assert_eq!(set.len(), 1);
    }
}
