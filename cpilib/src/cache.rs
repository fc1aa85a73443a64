use log::trace;
use crate::error::ConfigError;
use crate::replacement_policies::{LeastRecentlyUsed, Random, ReplacementPolicy, RoundRobin};
use crate::rng::PseudoRandomStream;

/// Whether an access reads or writes the line
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AccessKind {
    Read,
    Write,
}

/// Whether an access found its line in the cache
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Outcome {
    Hit,
    Miss,
}

/// The result of a single cache access
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AccessResult {
    pub outcome: Outcome,
    /// Set when the line evicted to make room was dirty and has to be written to the next level
    pub writeback_needed: bool,
}

impl AccessResult {
    pub fn is_hit(&self) -> bool {
        self.outcome == Outcome::Hit
    }
}

/// One line of a cache. Only the metadata is modelled, never the data itself
///
/// Invariant: `dirty` implies `valid`
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct CacheLine {
    pub valid: bool,
    pub tag: u64,
    pub dirty: bool,
}

/// A generic trait for caches
///
/// Technically not required as we're using static dispatch through [`GenericCache`] instead of
/// dyn Cache, but it keeps the hierarchy independent of the replacement policy
pub trait CacheTrait {
    /// Converts an address into a set index and a tag
    ///
    /// The set can be used directly as an index into the collection of sets, the tag is the block
    /// address with the set bits shifted out
    ///
    /// # Arguments
    ///
    /// * `address`:
    ///
    /// returns: (usize, u64)
    fn address_to_set_and_tag(&self, address: u64) -> (usize, u64);

    /// Looks up a line, installing it on a miss
    ///
    /// On a hit, a write marks the line dirty. On a miss the first invalid way is filled, and only
    /// when the set is full is the replacement policy asked for a victim. The installed line is
    /// dirty if and only if the access was a write
    ///
    /// # Arguments
    ///
    /// * `address`: The address of the access. Note this is for the line at that address, hence
    /// no size argument
    /// * `kind`: Read or write
    /// * `rng`: The shared random stream, used by random replacement
    ///
    /// returns: AccessResult
    fn access(&mut self, address: u64, kind: AccessKind, rng: &mut PseudoRandomStream) -> AccessResult;

    /// Invalidates every line and zeroes every counter
    fn reset(&mut self);

    fn hits(&self) -> u64;

    fn misses(&self) -> u64;

    fn writebacks(&self) -> u64;

    /// Fraction of accesses which hit, or 0 before the first access
    fn hit_rate(&self) -> f64 {
        let total = self.hits() + self.misses();
        if total == 0 {
            0.0
        } else {
            self.hits() as f64 / total as f64
        }
    }

    fn name(&self) -> &str;

    /// Gets the latency, in cycles, charged for looking up this cache
    fn get_hit_latency(&self) -> u64;

    /// Gets the line size used by this cache
    fn get_line_size(&self) -> u64;

    fn num_sets(&self) -> usize;

    fn associativity(&self) -> usize;

    /// Gets the number of invalid cache lines. Useful for analysing cache performance or
    /// debugging
    fn get_uninitialised_line_count(&self) -> usize;
}

/// Checks a cache geometry, returning the number of sets
///
/// The geometry has to divide evenly, and both the line size and the set count must be powers of
/// two so that addresses can be split by bit extraction
///
/// # Examples
///
/// ```
/// use cpilib::cache::validate_geometry;
/// assert_eq!(validate_geometry(16 * 1024, 64, 4), Ok(64));
/// assert!(validate_geometry(1000, 64, 4).is_err());
/// ```
pub fn validate_geometry(size: u64, line_size: u64, associativity: u64) -> Result<u64, ConfigError> {
    if size == 0 {
        return Err(ConfigError::ZeroParameter { what: "cache size" });
    }
    if line_size == 0 {
        return Err(ConfigError::ZeroParameter { what: "line size" });
    }
    if associativity == 0 {
        return Err(ConfigError::ZeroParameter { what: "associativity" });
    }
    // A set wider than u64 can't divide any cache size
    let set_bytes = line_size
        .checked_mul(associativity)
        .ok_or(ConfigError::IndivisibleGeometry { size, line_size, associativity })?;
    if size % set_bytes != 0 {
        return Err(ConfigError::IndivisibleGeometry { size, line_size, associativity });
    }
    if !line_size.is_power_of_two() {
        return Err(ConfigError::NotPowerOfTwo { what: "line size", value: line_size });
    }
    let num_sets = size / set_bytes;
    if !num_sets.is_power_of_two() {
        return Err(ConfigError::NotPowerOfTwo { what: "set count", value: num_sets });
    }
    Ok(num_sets)
}

/// A set-associative cache, parameterised by a replacement policy
///
/// Lines are stored in one flat vector, set by set, so the lines of set `s` occupy
/// `s * associativity..(s + 1) * associativity`. We rely on monomorphisation for the policy hooks
/// to be inlined
#[derive(Debug, Clone)]
pub struct Cache<R: ReplacementPolicy> {
    name: String,
    line_size: u64,
    associativity: usize,
    hit_latency: u64,
    num_sets: usize,
    offset_bits: u32,
    set_bits: u32,
    set_mask: u64,
    lines: Vec<CacheLine>,
    replacement_policy: R,
    hits: u64,
    misses: u64,
    writebacks: u64,
}

impl<R: ReplacementPolicy> Cache<R> {
    /// Creates a new cache with every line invalid
    ///
    /// # Arguments
    ///
    /// * `name`: Used when reporting results
    /// * `size`: Total capacity in bytes
    /// * `line_size`: Bytes per line, a power of two
    /// * `associativity`: Ways per set
    /// * `hit_latency`: Cycles charged for every lookup
    ///
    /// The replacement policy is sized from the validated geometry
    ///
    /// returns: Result<Cache<R>, ConfigError>
    pub fn new(name: impl Into<String>, size: u64, line_size: u64, associativity: u64, hit_latency: u64) -> Result<Self, ConfigError> {
        let num_sets = validate_geometry(size, line_size, associativity)?;
        let offset_bits = line_size.trailing_zeros();
        let set_bits = num_sets.trailing_zeros();
        Ok(Self {
            name: name.into(),
            line_size,
            associativity: associativity as usize,
            hit_latency,
            num_sets: num_sets as usize,
            offset_bits,
            set_bits,
            set_mask: num_sets - 1,
            lines: vec![CacheLine::default(); (num_sets * associativity) as usize],
            replacement_policy: R::for_geometry(num_sets as usize, associativity as usize),
            hits: 0,
            misses: 0,
            writebacks: 0,
        })
    }

    /// The lines of one set, in way order
    pub fn set(&self, set: usize) -> &[CacheLine] {
        let lower = set * self.associativity;
        &self.lines[lower..lower + self.associativity]
    }
}

impl<R: ReplacementPolicy> CacheTrait for Cache<R> {
    fn address_to_set_and_tag(&self, address: u64) -> (usize, u64) {
        let block = address >> self.offset_bits;
        ((block & self.set_mask) as usize, block >> self.set_bits)
    }

    fn access(&mut self, address: u64, kind: AccessKind, rng: &mut PseudoRandomStream) -> AccessResult {
        let (set, tag) = self.address_to_set_and_tag(address);
        let set_lower_bound = set * self.associativity;
        let set_upper_bound = set_lower_bound + self.associativity;

        // Only search the relevant set
        if let Some(index) = (set_lower_bound..set_upper_bound).find(|&i| self.lines[i].valid && self.lines[i].tag == tag) {
            if kind == AccessKind::Write {
                self.lines[index].dirty = true;
            }
            self.replacement_policy.update_on_use(index);
            self.hits += 1;
            return AccessResult { outcome: Outcome::Hit, writeback_needed: false };
        }

        self.misses += 1;
        let (index, writeback_needed) = match (set_lower_bound..set_upper_bound).find(|&i| !self.lines[i].valid) {
            Some(index) => (index, false),
            None => {
                let way = self.replacement_policy.get_victim_way(set_lower_bound, set, self.associativity, rng);
                let index = set_lower_bound + way;
                (index, self.lines[index].dirty)
            }
        };
        if writeback_needed {
            self.writebacks += 1;
            trace!("{}: writing back dirty victim in set {set}", self.name);
        }
        self.lines[index] = CacheLine {
            valid: true,
            tag,
            dirty: kind == AccessKind::Write,
        };
        self.replacement_policy.update_on_use(index);
        AccessResult { outcome: Outcome::Miss, writeback_needed }
    }

    fn reset(&mut self) {
        self.lines.iter_mut().for_each(|line| *line = CacheLine::default());
        self.replacement_policy.reset();
        self.hits = 0;
        self.misses = 0;
        self.writebacks = 0;
    }

    fn hits(&self) -> u64 {
        self.hits
    }

    fn misses(&self) -> u64 {
        self.misses
    }

    fn writebacks(&self) -> u64 {
        self.writebacks
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn get_hit_latency(&self) -> u64 {
        self.hit_latency
    }

    fn get_line_size(&self) -> u64 {
        self.line_size
    }

    fn num_sets(&self) -> usize {
        self.num_sets
    }

    fn associativity(&self) -> usize {
        self.associativity
    }

    fn get_uninitialised_line_count(&self) -> usize {
        self.lines.iter().filter(|line| !line.valid).count()
    }
}

/// Enum for the cache types provided by the library, one per replacement policy
///
/// Trait objects would reduce boilerplate, but we go through this on every simulated memory
/// access and dyn dispatch is opaque to the compiler. Branching explicitly on the implementations
/// lets the compiler reason about the concrete types and inline the policy
#[derive(Debug, Clone)]
pub enum GenericCache {
    Random(Cache<Random>),
    RoundRobin(Cache<RoundRobin>),
    LeastRecentlyUsed(Cache<LeastRecentlyUsed>),
}

impl From<Cache<Random>> for GenericCache {
    fn from(value: Cache<Random>) -> Self {
        Self::Random(value)
    }
}

impl From<Cache<RoundRobin>> for GenericCache {
    fn from(value: Cache<RoundRobin>) -> Self {
        Self::RoundRobin(value)
    }
}

impl From<Cache<LeastRecentlyUsed>> for GenericCache {
    fn from(value: Cache<LeastRecentlyUsed>) -> Self {
        Self::LeastRecentlyUsed(value)
    }
}

macro_rules! dispatch {
    ($self:ident, $c:ident => $body:expr) => {
        match $self {
            GenericCache::Random($c) => $body,
            GenericCache::RoundRobin($c) => $body,
            GenericCache::LeastRecentlyUsed($c) => $body,
        }
    };
}

impl GenericCache {
    /// The lines of one set, in way order
    pub fn set(&self, set: usize) -> &[CacheLine] {
        dispatch!(self, c => c.set(set))
    }
}

impl CacheTrait for GenericCache {
    fn address_to_set_and_tag(&self, address: u64) -> (usize, u64) {
        dispatch!(self, c => c.address_to_set_and_tag(address))
    }

    fn access(&mut self, address: u64, kind: AccessKind, rng: &mut PseudoRandomStream) -> AccessResult {
        dispatch!(self, c => c.access(address, kind, rng))
    }

    fn reset(&mut self) {
        dispatch!(self, c => c.reset())
    }

    fn hits(&self) -> u64 {
        dispatch!(self, c => c.hits())
    }

    fn misses(&self) -> u64 {
        dispatch!(self, c => c.misses())
    }

    fn writebacks(&self) -> u64 {
        dispatch!(self, c => c.writebacks())
    }

    fn name(&self) -> &str {
        dispatch!(self, c => c.name())
    }

    fn get_hit_latency(&self) -> u64 {
        dispatch!(self, c => c.get_hit_latency())
    }

    fn get_line_size(&self) -> u64 {
        dispatch!(self, c => c.get_line_size())
    }

    fn num_sets(&self) -> usize {
        dispatch!(self, c => c.num_sets())
    }

    fn associativity(&self) -> usize {
        dispatch!(self, c => c.associativity())
    }

    fn get_uninitialised_line_count(&self) -> usize {
        dispatch!(self, c => c.get_uninitialised_line_count())
    }
}
