use std::path::Path;
use crate::config::AddressPatternConfig;
use crate::error::{ConfigError, Error};
use crate::io::read_trace;
use crate::rng::PseudoRandomStream;

/// A producer of simulated memory addresses
///
/// Every output is reduced modulo the source's bound, so `next_address` never fails. Sources
/// which need randomness draw it from the shared stream they are handed, never from their own
pub trait AddressSource {
    fn next_address(&mut self, rng: &mut PseudoRandomStream) -> u64;
}

fn check_bound(bound: u64) -> Result<u64, ConfigError> {
    if bound == 0 {
        Err(ConfigError::ZeroParameter { what: "address bound" })
    } else {
        Ok(bound)
    }
}

/// Walks the address space one byte at a time, wrapping at the bound
///
/// The first address produced is 0. There is no reset, a fresh instance starts over
#[derive(Debug, Clone)]
pub struct Sequential {
    counter: u64,
    bound: u64,
}

impl Sequential {
    pub fn new(bound: u64) -> Result<Self, ConfigError> {
        Ok(Self { counter: 0, bound: check_bound(bound)? })
    }
}

impl AddressSource for Sequential {
    fn next_address(&mut self, _rng: &mut PseudoRandomStream) -> u64 {
        let address = self.counter % self.bound;
        self.counter = self.counter.wrapping_add(1);
        address
    }
}

/// Advances by a fixed stride before every access, wrapping at the bound
///
/// The counter is advanced first, so the first address produced is `stride % bound`
#[derive(Debug, Clone)]
pub struct Strided {
    counter: u64,
    stride: u64,
    bound: u64,
}

impl Strided {
    pub fn new(stride: u64, bound: u64) -> Result<Self, ConfigError> {
        Ok(Self { counter: 0, stride, bound: check_bound(bound)? })
    }
}

impl AddressSource for Strided {
    fn next_address(&mut self, _rng: &mut PseudoRandomStream) -> u64 {
        self.counter = self.counter.wrapping_add(self.stride);
        self.counter % self.bound
    }
}

/// Draws one value from the shared stream per address
#[derive(Debug, Clone)]
pub struct UniformRandom {
    bound: u64,
}

impl UniformRandom {
    pub fn new(bound: u64) -> Result<Self, ConfigError> {
        Ok(Self { bound: check_bound(bound)? })
    }
}

impl AddressSource for UniformRandom {
    fn next_address(&mut self, rng: &mut PseudoRandomStream) -> u64 {
        u64::from(rng.next()) % self.bound
    }
}

/// Replays a recorded list of addresses, starting over once it runs out
#[derive(Debug, Clone)]
pub struct TraceReplay {
    addresses: Vec<u64>,
    position: usize,
    bound: u64,
}

impl TraceReplay {
    /// Builds a replay from addresses already in memory
    pub fn new(addresses: Vec<u64>, bound: u64) -> Result<Self, ConfigError> {
        if addresses.is_empty() {
            return Err(ConfigError::ZeroParameter { what: "trace length" });
        }
        Ok(Self { addresses, position: 0, bound: check_bound(bound)? })
    }

    /// Loads a trace file, see [`crate::io::parse_trace`] for the format
    pub fn open(path: impl AsRef<Path>, bound: u64) -> Result<Self, Error> {
        let addresses = read_trace(path)?;
        Ok(Self::new(addresses, bound)?)
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

impl AddressSource for TraceReplay {
    fn next_address(&mut self, _rng: &mut PseudoRandomStream) -> u64 {
        let address = self.addresses[self.position] % self.bound;
        self.position = (self.position + 1) % self.addresses.len();
        address
    }
}

/// Enum for the address sources provided by the library, dispatched statically for the same
/// reasons as [`crate::cache::GenericCache`]
#[derive(Debug, Clone)]
pub enum AddressStream {
    Sequential(Sequential),
    Strided(Strided),
    Random(UniformRandom),
    Trace(TraceReplay),
}

impl AddressStream {
    /// Builds the stream described by a pattern
    ///
    /// # Arguments
    ///
    /// * `pattern`: The pattern
    /// * `dram_size`: The bound used by full-range patterns and traces
    ///
    /// returns: Result<AddressStream, Error>
    ///
    /// # Examples
    ///
    /// ```
    /// use cpilib::address::{AddressSource, AddressStream};
    /// use cpilib::config::AddressPatternConfig;
    /// use cpilib::rng::PseudoRandomStream;
    /// let pattern = AddressPatternConfig::Strided { stride: 32, window: 64 };
    /// let mut stream = AddressStream::from_config(&pattern, 1024).unwrap();
    /// let mut rng = PseudoRandomStream::new();
    /// assert_eq!(stream.next_address(&mut rng), 32);
    /// assert_eq!(stream.next_address(&mut rng), 0);
    /// ```
    pub fn from_config(pattern: &AddressPatternConfig, dram_size: u64) -> Result<Self, Error> {
        let stream: AddressStream = match pattern {
            AddressPatternConfig::SequentialFullRange => Sequential::new(dram_size)?.into(),
            AddressPatternConfig::RandomBounded { window } => UniformRandom::new(*window)?.into(),
            AddressPatternConfig::RandomFullRange => UniformRandom::new(dram_size)?.into(),
            AddressPatternConfig::SequentialBounded { window } => Sequential::new(*window)?.into(),
            AddressPatternConfig::Strided { stride, window } => Strided::new(*stride, *window)?.into(),
            AddressPatternConfig::Trace { path } => TraceReplay::open(path, dram_size)?.into(),
        };
        Ok(stream)
    }
}

impl From<Sequential> for AddressStream {
    fn from(value: Sequential) -> Self {
        Self::Sequential(value)
    }
}

impl From<Strided> for AddressStream {
    fn from(value: Strided) -> Self {
        Self::Strided(value)
    }
}

impl From<UniformRandom> for AddressStream {
    fn from(value: UniformRandom) -> Self {
        Self::Random(value)
    }
}

impl From<TraceReplay> for AddressStream {
    fn from(value: TraceReplay) -> Self {
        Self::Trace(value)
    }
}

impl AddressSource for AddressStream {
    fn next_address(&mut self, rng: &mut PseudoRandomStream) -> u64 {
        match self {
            AddressStream::Sequential(s) => s.next_address(rng),
            AddressStream::Strided(s) => s.next_address(rng),
            AddressStream::Random(s) => s.next_address(rng),
            AddressStream::Trace(s) => s.next_address(rng),
        }
    }
}
