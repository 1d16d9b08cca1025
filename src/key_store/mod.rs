/*!
 * Key store
 *
 * Owns every key of a keyring in one ordered collection indexed by grip.
 * Adding a key that is already present merges the two copies; subkeys and
 * primaries are linked through grips; search walks the collection in
 * insertion order with resumable cursors.
 *
 * Byte formats, key validation and fetching of missing keys are supplied
 * through the [`KeyCodec`], [`KeyValidator`] and [`KeyProvider`] traits.
 */

mod format;
mod link;
mod merge;
mod search;
mod store;
mod validate;

pub use format::{key_file_name, KeyBlock, KeyCodec, KeyStoreFormat, NativeCodec};
pub use merge::merge;
pub use search::KeySearch;
pub use store::{ImportStatus, KeyStore, SignatureImportStatus};
pub use validate::{KeyProvider, KeyValidator, StructuralValidator, Validity};
