use log::debug;
use crate::cache::{AccessKind, Cache, CacheTrait, GenericCache};
use crate::config::{CacheConfig, HierarchyConfig, ReplacementPolicyConfig};
use crate::error::ConfigError;
use crate::replacement_policies::{LeastRecentlyUsed, Random, RoundRobin};
use crate::rng::PseudoRandomStream;

/// A write-back, non-inclusive two-level hierarchy in front of DRAM
///
/// The hierarchy only costs accesses. Evicted lines are never moved between levels: a dirty L1
/// victim is charged one L2 lookup, and a dirty L2 victim one extra DRAM penalty, but neither
/// lands anywhere
#[derive(Debug, Clone)]
pub struct MemoryHierarchy {
    l1: GenericCache,
    l2: GenericCache,
    dram_penalty: u64,
    total_accesses: u64,
    total_cycles: u64,
}

impl MemoryHierarchy {
    /// Creates the fixed demonstration hierarchy with the given L1 line size
    ///
    /// L1 is 16KB 4-way with a 1 cycle hit, L2 is 128KB 8-way with 64B lines and a 10 cycle hit,
    /// and DRAM costs 50 cycles
    ///
    /// # Examples
    ///
    /// ```
    /// use cpilib::cache::AccessKind;
    /// use cpilib::hierarchy::MemoryHierarchy;
    /// use cpilib::rng::PseudoRandomStream;
    /// let mut rng = PseudoRandomStream::new();
    /// let mut hierarchy = MemoryHierarchy::new(64).unwrap();
    /// assert_eq!(hierarchy.memory_access(0x1000, AccessKind::Read, &mut rng), 61);
    /// assert_eq!(hierarchy.memory_access(0x1000, AccessKind::Read, &mut rng), 1);
    /// ```
    pub fn new(l1_line_size: u64) -> Result<Self, ConfigError> {
        Self::from_config(&HierarchyConfig::with_l1_line_size(l1_line_size))
    }

    /// Creates a hierarchy from a configuration, usually resulting from parsing JSON
    pub fn from_config(config: &HierarchyConfig) -> Result<Self, ConfigError> {
        let l1 = config_to_cache(&config.l1)?;
        let l2 = config_to_cache(&config.l2)?;
        debug!(
            "Built hierarchy: {} ({} sets x {} ways, {}B lines), {} ({} sets x {} ways, {}B lines), DRAM penalty {}",
            l1.name(), l1.num_sets(), l1.associativity(), l1.get_line_size(),
            l2.name(), l2.num_sets(), l2.associativity(), l2.get_line_size(),
            config.dram_penalty,
        );
        Ok(Self {
            l1,
            l2,
            dram_penalty: config.dram_penalty,
            total_accesses: 0,
            total_cycles: 0,
        })
    }

    /// Performs one access through the hierarchy, returning its cost in cycles
    ///
    /// The L1 lookup is always charged. On an L1 miss the L2 lookup is charged (twice if the L1
    /// victim was dirty), and the refill is always a read at L2. On an L2 miss the DRAM penalty is
    /// charged (twice if the L2 victim was dirty)
    ///
    /// # Arguments
    ///
    /// * `address`: The address accessed
    /// * `kind`: Read or write. Only affects L1 state
    /// * `rng`: The shared random stream
    ///
    /// returns: u64
    pub fn memory_access(&mut self, address: u64, kind: AccessKind, rng: &mut PseudoRandomStream) -> u64 {
        let mut cycles = self.l1.get_hit_latency();
        let l1_result = self.l1.access(address, kind, rng);
        if !l1_result.is_hit() {
            if l1_result.writeback_needed {
                cycles += self.l2.get_hit_latency();
            }
            cycles += self.l2.get_hit_latency();
            let l2_result = self.l2.access(address, AccessKind::Read, rng);
            if !l2_result.is_hit() {
                cycles += self.dram_penalty;
                if l2_result.writeback_needed {
                    cycles += self.dram_penalty;
                }
            }
        }
        self.total_accesses += 1;
        self.total_cycles += cycles;
        cycles
    }

    /// Resets both levels and the running totals
    pub fn reset(&mut self) {
        self.l1.reset();
        self.l2.reset();
        self.total_accesses = 0;
        self.total_cycles = 0;
    }

    /// Mean cycles per access so far, or 0 before the first access
    pub fn average_access_time(&self) -> f64 {
        if self.total_accesses == 0 {
            0.0
        } else {
            self.total_cycles as f64 / self.total_accesses as f64
        }
    }

    pub fn l1(&self) -> &GenericCache {
        &self.l1
    }

    pub fn l2(&self) -> &GenericCache {
        &self.l2
    }

    pub fn dram_penalty(&self) -> u64 {
        self.dram_penalty
    }

    pub fn total_accesses(&self) -> u64 {
        self.total_accesses
    }

    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }
}

/// Creates a new cache from a cache configuration
fn config_to_cache(config: &CacheConfig) -> Result<GenericCache, ConfigError> {
    let (name, size, line_size, associativity, hit_latency) =
        (config.name.clone(), config.size, config.line_size, config.associativity, config.hit_latency);
    let cache = match config.replacement_policy {
        ReplacementPolicyConfig::Random => {
            GenericCache::from(Cache::<Random>::new(name, size, line_size, associativity, hit_latency)?)
        }
        ReplacementPolicyConfig::RoundRobin => {
            GenericCache::from(Cache::<RoundRobin>::new(name, size, line_size, associativity, hit_latency)?)
        }
        ReplacementPolicyConfig::LeastRecentlyUsed => {
            GenericCache::from(Cache::<LeastRecentlyUsed>::new(name, size, line_size, associativity, hit_latency)?)
        }
    };
    Ok(cache)
}
