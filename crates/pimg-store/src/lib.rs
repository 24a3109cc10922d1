//! Local file storage for product images.
//!
//! Objects are addressed by a numeric collection id and a restricted
//! filename and stored at `<root>/<collection>/<filename>` on the local
//! filesystem.
//!
//! # Components
//!
//! - [`PathResolver`] -- maps an [`ObjectKey`] to a path strictly inside the
//!   root, rejecting anything that would escape it
//! - [`copy_bounded`] / [`PartialFile`] -- stream copy with a byte ceiling
//!   into a staging file that is removed unless persisted
//! - [`LocalStorage`] -- the [`FileStore`] implementation tying both together
//!
//! # Design Rules
//!
//! 1. Key grammar is checked before any filesystem call.
//! 2. Containment in the root is checked separately from the grammar.
//! 3. A target path only ever holds a complete upload.
//! 4. Re-saving a key replaces it; the last completed save wins.
//! 5. No in-process locks and no background tasks.

pub mod bounded;
pub mod error;
pub mod key;
pub mod local;
pub mod resolver;
pub mod traits;

pub use bounded::{copy_bounded, PartialFile, CHUNK_SIZE};
pub use error::{StoreError, StoreResult};
pub use key::{CollectionId, Filename, ObjectKey};
pub use local::{LocalStorage, StorageConfig};
pub use resolver::{lexical_clean, PathResolver};
pub use traits::{FileStore, UploadReader};
