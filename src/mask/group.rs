use std::collections::HashMap;

/// Raw coverage-mask buffers sharing one mask name, one entry per source bundle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MaskGroup {
    pub name: String,
    /// Bundle id for each entry of `buffers`, same order.
    pub bundles: Vec<String>,
    pub buffers: Vec<Vec<u8>>,
}

impl MaskGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}

/// Mask name -> ordered raw buffers.
///
/// Groups iterate in the order their name was first seen; buffers within a group keep insertion
/// order. No deduplication happens: the same bundle may contribute twice under one name.
#[derive(Clone, Debug, Default)]
pub struct MaskGroups {
    groups: Vec<MaskGroup>,
    index: HashMap<String, usize>,
}

impl MaskGroups {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, bundle_id: impl Into<String>, name: &str, bytes: Vec<u8>) {
        let slot = match self.index.get(name) {
            Some(&slot) => slot,
            None => {
                let slot = self.groups.len();
                self.groups.push(MaskGroup::new(name));
                self.index.insert(name.to_string(), slot);
                slot
            }
        };
        let group = &mut self.groups[slot];
        group.bundles.push(bundle_id.into());
        group.buffers.push(bytes);
    }

    pub fn get(&self, name: &str) -> Option<&MaskGroup> {
        self.index.get(name).map(|&slot| &self.groups[slot])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MaskGroup> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn into_groups(self) -> Vec<MaskGroup> {
        self.groups
    }
}

impl<B: Into<String>> FromIterator<(B, String, Vec<u8>)> for MaskGroups {
    fn from_iter<I: IntoIterator<Item = (B, String, Vec<u8>)>>(iter: I) -> Self {
        let mut groups = Self::new();
        for (bundle, name, bytes) in iter {
            groups.insert(bundle, &name, bytes);
        }
        groups
    }
}
