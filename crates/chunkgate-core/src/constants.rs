//! Protocol constants shared by the server and the SDK

/// One mebibyte
pub const MIB: usize = 1024 * 1024;

/// Smallest part the object store accepts for any chunk but the last one
pub const MIN_CHUNK_SIZE: usize = 5 * MIB;

/// Chunk size used by the SDK when splitting a file
pub const DEFAULT_CHUNK_SIZE: usize = 5 * MIB;

/// Upper bound on the number of parts in one multipart upload
pub const MAX_CHUNKS: u32 = 10_000;

/// Name of the entry holding the hex key inside a secret-store path
pub const VAULT_KEY_NAME: &str = "key";

/// State sent to the metadata service once every part is stored
pub const UPLOADED_STATE: &str = "UPLOADED";

/// Multipart form part carrying chunk bytes
pub const FILE_FORM_FIELD: &str = "file";
