use std::path::PathBuf;

/// Failures while reading or decoding an STL file
#[derive(Debug, thiserror::Error)]
pub enum StlError {
    #[error("Could not read STL file: {path}")]
    Io {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("File too small to be a valid binary STL: {len} bytes")]
    TooShort { len: usize },
    #[error("Binary STL truncated: {count} triangles need {expected} bytes, got {actual}")]
    Truncated {
        count: u32,
        expected: usize,
        actual: usize,
    },
    #[error("Invalid ASCII STL at line {line}: expected {expected}")]
    Ascii { line: usize, expected: String },
}

/// Failures while loading or validating the configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not read config file: {path}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("Could not parse config file: {path}\n{source}")]
    Parse {
        #[source]
        source: toml::de::Error,
        path: PathBuf,
    },
    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Stl(#[from] StlError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
