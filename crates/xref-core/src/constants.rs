//! Shared constants for the xref graph observer.

/// xref version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default language field of emitted VNames.
pub const DEFAULT_LANGUAGE: &str = "c++";

/// Signatures longer than this many bytes are replaced by their hash.
pub const DEFAULT_COMPRESS_THRESHOLD: usize = 128;

/// Recursion cap for macro expansion chains.
pub const DEFAULT_MAX_EXPANSION_DEPTH: u32 = 64;

/// Answer of the static claim client for VNames nobody has assigned.
pub const DEFAULT_PROCESS_UNKNOWN_STATUS: bool = true;

/// Number of claim slots the dynamic claim client tries per VName.
pub const DEFAULT_MAX_REDUNDANT_CLAIMS: u32 = 1;

/// Suffix of the signature of an implicit (purely syntactic) anchor.
pub const SYNTACTIC_SUFFIX: &str = "@syntactic";

/// Suffix of builtin node signatures.
pub const BUILTIN_SUFFIX: &str = "#builtin";

/// Suffix of meta node signatures.
pub const META_SUFFIX: &str = "#meta";

/// Suffix that turns a name identity into a nominal type identity.
pub const NOMINAL_TYPE_SUFFIX: &str = "#t";

/// File extensions that never mark a file as reached through a header.
pub const NON_HEADER_EXTENSIONS: [&str; 1] = [".inc"];

/// Format tag of JSON metadata overlay files.
pub const METADATA_FORMAT_TAG: &str = "kythe0";

/// File suffixes of protoc's generated-code annotations.
pub const PROTOBUF_METADATA_SUFFIXES: [&str; 2] = [".pb.h.meta", ".proto.h.meta"];

/// Language of VNames naming protobuf descriptors.
pub const PROTOBUF_LANGUAGE: &str = "protobuf";

/// Name of the project-level config file.
pub const PROJECT_CONFIG_FILE: &str = "xref.toml";
