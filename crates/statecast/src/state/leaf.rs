use crate::{Path, Scalar};

/// A decoded scalar. Leaves have no children and are only ever replaced
/// wholesale by their container.
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
    path: Path,
    value: Scalar,
}

impl Leaf {
    pub fn new(path: Path, value: Scalar) -> Self {
        Self { path, value }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn value(&self) -> &Scalar {
        &self.value
    }

    pub fn into_value(self) -> Scalar {
        self.value
    }
}
