use std::path::Path;

use crate::error::ViewerError;

/// Something that can turn an image path into a displayable asset.
///
/// Loading is synchronous; the caller decides what to keep around.
pub trait AssetSource {
    type Asset;

    fn load(&mut self, path: &Path) -> Result<Self::Asset, ViewerError>;
}

impl<F, A> AssetSource for F
where
    F: FnMut(&Path) -> Result<A, ViewerError>,
{
    type Asset = A;

    fn load(&mut self, path: &Path) -> Result<A, ViewerError> {
        self(path)
    }
}
