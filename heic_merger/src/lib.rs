pub mod color;
pub mod formats;
pub mod headroom;
pub mod loader;
pub mod writer;

pub use color::{ColorDescription, Primaries, Transfer, DISPLAY_P3};
pub use formats::{ftyp_major_brand, is_bmff_container};
pub use headroom::content_headroom;
pub use loader::{load_rendition, DynamicRange, Rendition, RenditionPixels};
pub use writer::{derive_output_path, write_heic};

pub use shared_utils::errors::{HeicMergeError, Result};
