use std::io::Cursor;

use exif::{In, Reader, Tag, Value};

/// EXIF orientation of a JPEG, if it carries one.
///
/// 1 = normal, 2 = mirrored, 3 = 180°, 4 = flipped, 6 = 90° CW, 8 = 90° CCW.
/// Transposed variants (5, 7) are reported but not corrected by the loader.
pub fn exif_orientation(file_bytes: &[u8]) -> Option<u16> {
    let exif = Reader::new().read_from_container(&mut Cursor::new(file_bytes)).ok()?;
    let field = exif.get_field(Tag::Orientation, In::PRIMARY)?;
    match &field.value {
        Value::Short(values) => values.first().copied(),
        _ => None,
    }
}

#[cfg_attr(not(feature = "viewer"), allow(dead_code))]
fn has_exif(extension: &str) -> bool {
    extension == "jpg" || extension == "jpeg"
}

#[cfg(feature = "viewer")]
pub use self::raylib_loader::{TextureSource, load_texture_with_exif_rotation};

#[cfg(feature = "viewer")]
mod raylib_loader {
    use std::cell::RefCell;
    use std::fs;
    use std::path::Path;
    use std::rc::Rc;

    use raylib::prelude::*;
    use tracing::{debug, warn};

    use super::{exif_orientation, has_exif};
    use crate::asset::AssetSource;
    use crate::error::ViewerError;

    /// Reads an image from disk, rotates it upright and uploads it to the GPU.
    pub fn load_texture_with_exif_rotation(
        rl: &mut RaylibHandle,
        thread: &RaylibThread,
        image_path: &Path,
    ) -> Result<Texture2D, ViewerError> {
        let file_bytes = fs::read(image_path).map_err(|source| ViewerError::Io {
            path: image_path.to_path_buf(),
            source,
        })?;

        let extension = image_path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();

        // Attempt to read EXIF data (only JPEG carries it reliably)
        let orientation = if has_exif(&extension) {
            exif_orientation(&file_bytes).unwrap_or_else(|| {
                warn!(path = ?image_path, "could not read EXIF orientation, assuming upright");
                1
            })
        } else {
            1
        };

        // Decode into a CPU-side Image, the extension is the format hint
        let mut image = Image::load_image_from_mem(&format!(".{extension}"), &file_bytes)
            .map_err(|e| ViewerError::asset_load(image_path, e))?;

        // --- Apply EXIF orientation ---
        match orientation {
            2 => image.flip_horizontal(), // mirrored
            3 => {
                image.rotate_cw();
                image.rotate_cw(); // 180 deg
            }
            4 => image.flip_vertical(), // upside-down mirror
            6 => image.rotate_cw(),     // 90 deg clockwise
            8 => image.rotate_ccw(),    // 90 deg counter-clockwise
            _ => { /* 1 is upright; transposed 5 and 7 are left alone */ }
        }
        debug!(path = ?image_path, orientation, width = image.width(), height = image.height(), "decoded image");

        // The CPU-side image is released when it goes out of scope.
        rl.load_texture_from_image(thread, &image)
            .map_err(|e| ViewerError::asset_load(image_path, e))
    }

    /// Loads panoramas as GPU textures through the shared raylib handle.
    pub struct TextureSource {
        rl: Rc<RefCell<RaylibHandle>>,
        thread: Rc<RaylibThread>,
    }

    impl TextureSource {
        pub fn new(rl: Rc<RefCell<RaylibHandle>>, thread: Rc<RaylibThread>) -> Self {
            Self { rl, thread }
        }
    }

    impl AssetSource for TextureSource {
        type Asset = Texture2D;

        fn load(&mut self, path: &Path) -> Result<Texture2D, ViewerError> {
            let mut rl = self
                .rl
                .try_borrow_mut()
                .map_err(|_| ViewerError::asset_load(path, "raylib handle is busy"))?;
            load_texture_with_exif_rotation(&mut rl, &self.thread, path)
        }
    }
}
