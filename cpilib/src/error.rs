use thiserror::Error;

/// Raised when a cache, hierarchy or address source is built with an unusable geometry
///
/// This is the only error the simulation core can produce; once construction succeeds every
/// address maps to a valid set and tag
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{what} must be non-zero")]
    ZeroParameter { what: &'static str },

    #[error("cache size {size} is not a multiple of line size {line_size} x associativity {associativity}")]
    IndivisibleGeometry {
        size: u64,
        line_size: u64,
        associativity: u64,
    },

    #[error("{what} must be a power of two, got {value}")]
    NotPowerOfTwo { what: &'static str, value: u64 },
}

/// Raised when an address trace can't be loaded
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("couldn't read the trace file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid address {token:?} on line {line}")]
    InvalidAddress { line: usize, token: String },

    #[error("the trace file contains no addresses")]
    Empty,
}

/// Raised when an address pattern descriptor such as `strided:32:1m` can't be parsed
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PatternParseError {
    #[error("unknown address pattern {0:?}")]
    Unknown(String),

    #[error("invalid number {0:?} in address pattern")]
    InvalidNumber(String),

    #[error("couldn't build the pattern matcher: {0}")]
    Regex(String),
}

/// Any error the library can return
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Trace(#[from] TraceError),

    #[error(transparent)]
    Pattern(#[from] PatternParseError),
}
