use std::fmt;
use std::io::Read;
use std::str::FromStr;
use regex::Regex;
use serde::{Deserialize, Serialize};
use crate::error::PatternParseError;

/// 64MB of simulated DRAM. Full-range address sources are bounded by this
pub const DRAM_SIZE: u64 = 64 * 1024 * 1024;

pub const L1_SIZE: u64 = 16 * 1024;
pub const L1_ASSOCIATIVITY: u64 = 4;
pub const L1_HIT_LATENCY: u64 = 1;
pub const L2_SIZE: u64 = 128 * 1024;
pub const L2_LINE_SIZE: u64 = 64;
pub const L2_ASSOCIATIVITY: u64 = 8;
pub const L2_HIT_LATENCY: u64 = 10;
pub const DRAM_PENALTY: u64 = 50;

pub const ITERATIONS: u64 = 1_000_000;
pub const MEMORY_INSTRUCTION_PROBABILITY: f64 = 0.35;
pub const WRITE_PROBABILITY: f64 = 0.5;

/// The L1 line sizes swept by default
pub const LINE_SIZES: [u64; 4] = [16, 32, 64, 128];

/// A full simulation setup: what to run, and on which hierarchy. Every field is optional in JSON
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub driver: DriverConfig,
    #[serde(default)]
    pub seed: Option<SeedConfig>,
    #[serde(default = "default_dram_size")]
    pub dram_size: u64,
    #[serde(default)]
    pub hierarchy: HierarchyConfig,
    #[serde(default = "default_line_sizes")]
    pub line_sizes: Vec<u64>,
    #[serde(default = "AddressPatternConfig::defaults")]
    pub patterns: Vec<AddressPatternConfig>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            driver: DriverConfig::default(),
            seed: None,
            dram_size: DRAM_SIZE,
            hierarchy: HierarchyConfig::default(),
            line_sizes: default_line_sizes(),
            patterns: AddressPatternConfig::defaults(),
        }
    }
}

impl SimulationConfig {
    /// Parses a JSON configuration
    pub fn from_reader(reader: impl Read) -> Result<Self, serde_json::Error> {
        serde_json::from_reader(reader)
    }
}

/// Explicit seed words for the random stream
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SeedConfig {
    pub w: u32,
    pub z: u32,
}

/// Controls the instruction mix of a run
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DriverConfig {
    #[serde(default = "default_iterations")]
    pub iterations: u64,
    #[serde(default = "default_memory_instruction_probability")]
    pub memory_instruction_probability: f64,
    #[serde(default = "default_write_probability")]
    pub write_probability: f64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            iterations: ITERATIONS,
            memory_instruction_probability: MEMORY_INSTRUCTION_PROBABILITY,
            write_probability: WRITE_PROBABILITY,
        }
    }
}

/// A two-level hierarchy: L1, L2 and the cost of going to DRAM
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HierarchyConfig {
    pub l1: CacheConfig,
    pub l2: CacheConfig,
    #[serde(default = "default_dram_penalty")]
    pub dram_penalty: u64,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self::with_l1_line_size(L2_LINE_SIZE)
    }
}

impl HierarchyConfig {
    /// The fixed demonstration hierarchy, with only the L1 line size varying
    pub fn with_l1_line_size(l1_line_size: u64) -> Self {
        Self {
            l1: CacheConfig {
                name: "L1".to_string(),
                size: L1_SIZE,
                line_size: l1_line_size,
                associativity: L1_ASSOCIATIVITY,
                hit_latency: L1_HIT_LATENCY,
                replacement_policy: ReplacementPolicyConfig::default(),
            },
            l2: CacheConfig {
                name: "L2".to_string(),
                size: L2_SIZE,
                line_size: L2_LINE_SIZE,
                associativity: L2_ASSOCIATIVITY,
                hit_latency: L2_HIT_LATENCY,
                replacement_policy: ReplacementPolicyConfig::default(),
            },
            dram_penalty: DRAM_PENALTY,
        }
    }

    /// A copy of this configuration with a different L1 line size
    pub fn override_l1_line_size(&self, l1_line_size: u64) -> Self {
        let mut config = self.clone();
        config.l1.line_size = l1_line_size;
        config
    }
}

/// A configuration for a single cache
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CacheConfig {
    pub name: String,
    pub size: u64,
    pub line_size: u64,
    pub associativity: u64,
    pub hit_latency: u64,
    #[serde(default)]
    pub replacement_policy: ReplacementPolicyConfig,
}

/// The replacement policy - random, round robin, or lru. Defaults to random.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum ReplacementPolicyConfig {
    #[default]
    #[serde(alias = "random")]
    Random,
    #[serde(alias = "rr")]
    RoundRobin,
    #[serde(alias = "lru")]
    LeastRecentlyUsed,
}

/// The shape of an address stream
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AddressPatternConfig {
    SequentialFullRange,
    RandomBounded { window: u64 },
    RandomFullRange,
    SequentialBounded { window: u64 },
    Strided { stride: u64, window: u64 },
    Trace { path: String },
}

impl AddressPatternConfig {
    /// The five demonstration streams, in their customary order
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::SequentialFullRange,
            Self::RandomBounded { window: 24 * 1024 },
            Self::RandomFullRange,
            Self::SequentialBounded { window: 4 * 1024 },
            Self::Strided { stride: 32, window: 1024 * 1024 },
        ]
    }
}

impl fmt::Display for AddressPatternConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SequentialFullRange => write!(f, "sequential"),
            Self::RandomBounded { window } => write!(f, "random:{window}"),
            Self::RandomFullRange => write!(f, "random"),
            Self::SequentialBounded { window } => write!(f, "sequential:{window}"),
            Self::Strided { stride, window } => write!(f, "strided:{stride}:{window}"),
            Self::Trace { path } => write!(f, "trace:{path}"),
        }
    }
}

/// Parses the short descriptor form used on the command line
///
/// # Examples
///
/// ```
/// use cpilib::config::AddressPatternConfig;
/// let pattern: AddressPatternConfig = "strided:32:1m".parse().unwrap();
/// assert_eq!(pattern, AddressPatternConfig::Strided { stride: 32, window: 1024 * 1024 });
/// ```
impl FromStr for AddressPatternConfig {
    type Err = PatternParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Paths may contain colons, so traces are split off before matching
        if let Some(path) = s.strip_prefix("trace:") {
            return Ok(Self::Trace { path: path.to_string() });
        }
        let pattern = Regex::new(r"^(?P<kind>[a-z]+)(?::(?P<first>[^:]+))?(?::(?P<second>[^:]+))?$")
            .map_err(|e| PatternParseError::Regex(e.to_string()))?;
        let tokens = pattern.captures(s).ok_or_else(|| PatternParseError::Unknown(s.to_string()))?;
        let first = tokens.name("first").map(|m| parse_size(m.as_str())).transpose()?;
        let second = tokens.name("second").map(|m| parse_size(m.as_str())).transpose()?;
        match (&tokens["kind"], first, second) {
            ("sequential", None, None) => Ok(Self::SequentialFullRange),
            ("sequential", Some(window), None) => Ok(Self::SequentialBounded { window }),
            ("random", None, None) => Ok(Self::RandomFullRange),
            ("random", Some(window), None) => Ok(Self::RandomBounded { window }),
            ("strided", Some(stride), Some(window)) => Ok(Self::Strided { stride, window }),
            _ => Err(PatternParseError::Unknown(s.to_string())),
        }
    }
}

/// Parses a byte count such as `4096`, `24k` or `1m`
fn parse_size(token: &str) -> Result<u64, PatternParseError> {
    let invalid = || PatternParseError::InvalidNumber(token.to_string());
    let pattern = Regex::new(r"^(?P<digits>[0-9]+)(?P<unit>[kKmM]?)$")
        .map_err(|e| PatternParseError::Regex(e.to_string()))?;
    let tokens = pattern.captures(token).ok_or_else(invalid)?;
    let value: u64 = tokens["digits"].parse().map_err(|_| invalid())?;
    let multiplier = match &tokens["unit"] {
        "k" | "K" => 1024,
        "m" | "M" => 1024 * 1024,
        _ => 1,
    };
    value.checked_mul(multiplier).ok_or_else(invalid)
}

fn default_dram_size() -> u64 {
    DRAM_SIZE
}

fn default_dram_penalty() -> u64 {
    DRAM_PENALTY
}

fn default_iterations() -> u64 {
    ITERATIONS
}

fn default_memory_instruction_probability() -> f64 {
    MEMORY_INSTRUCTION_PROBABILITY
}

fn default_write_probability() -> f64 {
    WRITE_PROBABILITY
}

fn default_line_sizes() -> Vec<u64> {
    LINE_SIZES.to_vec()
}
