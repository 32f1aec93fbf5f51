//! Error types for orthoscan.

/// Result type alias for orthoscan operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for orthoscan.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration directory could not be determined.
    #[error("could not determine configuration directory for this platform")]
    ConfigDirNotFound,

    /// Failed to read configuration file.
    #[error("failed to read config file '{path}'")]
    ConfigRead {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration file.
    #[error("failed to parse config file '{path}'")]
    ConfigParse {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Failed to write configuration file.
    #[error("failed to write config file '{path}'")]
    ConfigWrite {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize configuration.
    #[error("failed to serialize config")]
    ConfigSerialize {
        /// Underlying serialization error.
        #[source]
        source: toml::ser::Error,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// No valid raster files found.
    #[error("no valid raster files found in the provided paths")]
    NoValidRasterFiles,

    /// Raster source could not be opened.
    #[error("failed to open raster '{path}'")]
    SourceOpen {
        /// Path to the raster.
        path: std::path::PathBuf,
        /// Underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// World file sidecar was not found for a raster.
    #[error("no world file found for raster '{path}' (tried format-specific and .wld sidecars)")]
    WorldFileMissing {
        /// Path to the raster.
        path: std::path::PathBuf,
    },

    /// World file sidecar could not be parsed.
    #[error("failed to parse world file '{path}': {reason}")]
    WorldFileParse {
        /// Path to the world file.
        path: std::path::PathBuf,
        /// Description of the parse failure.
        reason: String,
    },

    /// No coordinate reference system identifier could be determined.
    ///
    /// Non-fatal at raster open (reported as a warning); fatal at the
    /// point a persistence store needs a CRS to create its layer.
    #[error("no CRS identifier available for '{path}'")]
    CrsUnavailable {
        /// Path to the raster or store the CRS was needed for.
        path: std::path::PathBuf,
    },

    /// Failed to build the detector.
    #[error("failed to build detector: {reason}")]
    DetectorBuild {
        /// Description of the build failure.
        reason: String,
    },

    /// Inference failed for a tile.
    #[error("inference failed: {reason}")]
    Inference {
        /// Description of the inference failure.
        reason: String,
    },

    /// Persistence store could not be opened or created.
    #[error("failed to open or create store '{path}'")]
    StoreOpen {
        /// Path to the store.
        path: std::path::PathBuf,
        /// Underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Appending a feature to the persistence store failed.
    #[error("failed to append feature to store '{path}'")]
    StoreAppend {
        /// Path to the store.
        path: std::path::PathBuf,
        /// Underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Invalid tile size.
    #[error("invalid tile size: {value} (must be greater than zero)")]
    InvalidTileSize {
        /// Invalid value.
        value: usize,
    },

    /// Invalid buffer capacity.
    #[error("invalid buffer capacity: {value} (must be greater than zero)")]
    InvalidBufferCapacity {
        /// Invalid value.
        value: usize,
    },

    /// Internal error (for unexpected failures).
    #[error("internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}
