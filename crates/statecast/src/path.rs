use std::fmt;
use std::sync::Arc;

/// Route from the tree root to a node, one tag per step.
///
/// A path is captured by value when a node is built and never follows the
/// node afterwards. It is used for provenance in events and errors only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path {
    tags: Arc<[u32]>,
}

impl Default for Path {
    fn default() -> Self {
        Self::from(Vec::new())
    }
}

impl Path {
    pub fn root() -> Self {
        Self::default()
    }

    /// This path extended by one tag.
    pub fn child(&self, tag: u32) -> Self {
        let mut tags = Vec::with_capacity(self.tags.len() + 1);
        tags.extend_from_slice(&self.tags);
        tags.push(tag);
        Self { tags: tags.into() }
    }

    pub fn parent(&self) -> Option<Self> {
        let (_, parent) = self.tags.split_last()?;
        Some(Self::from(parent))
    }

    pub fn last(&self) -> Option<u32> {
        self.tags.last().copied()
    }

    pub fn tags(&self) -> &[u32] {
        &self.tags
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_root(&self) -> bool {
        self.tags.is_empty()
    }
}

impl From<&[u32]> for Path {
    fn from(tags: &[u32]) -> Self {
        Self { tags: tags.into() }
    }
}

impl From<Vec<u32>> for Path {
    fn from(tags: Vec<u32>) -> Self {
        Self { tags: tags.into() }
    }
}

impl<const N: usize> From<[u32; N]> for Path {
    fn from(tags: [u32; N]) -> Self {
        Self::from(&tags[..])
    }
}

/// Formats as `/1/0/3`; the root is `/`.
impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tags.is_empty() {
            return f.write_str("/");
        }
        for tag in self.tags.iter() {
            write!(f, "/{tag}")?;
        }
        Ok(())
    }
}
