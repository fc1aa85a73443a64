use std::time::{Duration, Instant};
use log::debug;
use serde::{Deserialize, Serialize};
use crate::address::AddressSource;
use crate::cache::{AccessKind, CacheTrait, GenericCache};
use crate::config::{DriverConfig, HierarchyConfig, SimulationConfig};
use crate::error::ConfigError;
use crate::hierarchy::MemoryHierarchy;
use crate::rng::PseudoRandomStream;

/// The simulator runs instruction mixes against fresh hierarchies, and collects results.
///
/// It owns the random stream shared by everything it drives, so consecutive runs continue the
/// same sequence. Address sources belong to the caller: reusing one across runs carries its
/// counter over, building a new one starts it from scratch
#[derive(Debug)]
pub struct Simulator {
    hierarchy: HierarchyConfig,
    driver: DriverConfig,
    rng: PseudoRandomStream,
    simulation_time: Duration,
}

/// The result of a simulation run. Can be serialised to JSON
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationReport {
    pub l1_line_size: u64,
    pub instructions: u64,
    pub memory_instructions: u64,
    pub total_cycles: u64,
    pub cpi: f64,
    pub average_access_time: f64,
    pub caches: Vec<CacheResult>,
}

/// The result for an individual cache. Can be serialised to JSON
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheResult {
    pub name: String,
    pub hits: u64,
    pub misses: u64,
    pub writebacks: u64,
    pub hit_rate: f64,
    /// Lines never filled during the run
    pub uninitialised_lines: usize,
}

impl From<&GenericCache> for CacheResult {
    fn from(cache: &GenericCache) -> Self {
        Self {
            name: cache.name().to_string(),
            hits: cache.hits(),
            misses: cache.misses(),
            writebacks: cache.writebacks(),
            hit_rate: cache.hit_rate(),
            uninitialised_lines: cache.get_uninitialised_line_count(),
        }
    }
}

impl Simulator {
    /// Creates a new simulator
    ///
    /// # Arguments
    ///
    /// * `hierarchy`: The hierarchy template, its L1 line size is replaced on every run
    /// * `driver`: The instruction mix
    /// * `rng`: The stream shared by the instruction mix, the address sources and the caches
    ///
    /// returns: Simulator
    pub fn new(hierarchy: HierarchyConfig, driver: DriverConfig, rng: PseudoRandomStream) -> Self {
        Self {
            hierarchy,
            driver,
            rng,
            simulation_time: Duration::new(0, 0),
        }
    }

    /// Creates a simulator from a full configuration, seeding the stream from it or with the
    /// defaults
    pub fn from_config(config: &SimulationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => PseudoRandomStream::with_seed(seed.w, seed.z),
            None => PseudoRandomStream::new(),
        };
        Self::new(config.hierarchy.clone(), config.driver.clone(), rng)
    }

    /// Runs the configured number of instructions and reports the resulting CPI
    ///
    /// Each instruction is a memory instruction with the configured probability, in which case an
    /// address is drawn from `source` and it is classified as a read or a write. Memory
    /// instructions cost whatever the hierarchy charges, every other instruction costs 1 cycle
    ///
    /// Draws happen in a fixed order: instruction type, address, read/write, then any victim
    /// selection inside the hierarchy
    ///
    /// # Arguments
    ///
    /// * `source`: Where the addresses come from
    /// * `l1_line_size`: The L1 line size for this run
    ///
    /// returns: Result<SimulationReport, ConfigError>, an error only if the line size gives an
    /// invalid L1 geometry
    pub fn run<S: AddressSource + ?Sized>(&mut self, source: &mut S, l1_line_size: u64) -> Result<SimulationReport, ConfigError> {
        let mut hierarchy = MemoryHierarchy::from_config(&self.hierarchy.override_l1_line_size(l1_line_size))?;
        let start = Instant::now();
        let mut total_cycles: u64 = 0;
        let mut memory_instructions: u64 = 0;
        for _ in 0..self.driver.iterations {
            if self.rng.next_fraction() <= self.driver.memory_instruction_probability {
                let address = source.next_address(&mut self.rng);
                let kind = if self.rng.next_fraction() < self.driver.write_probability {
                    AccessKind::Write
                } else {
                    AccessKind::Read
                };
                total_cycles += hierarchy.memory_access(address, kind, &mut self.rng);
                memory_instructions += 1;
            } else {
                total_cycles += 1;
            }
        }
        self.simulation_time += start.elapsed();

        let instructions = self.driver.iterations;
        let cpi = if instructions == 0 { 0.0 } else { total_cycles as f64 / instructions as f64 };
        debug!("L1 line size {l1_line_size}B: {instructions} instructions, {memory_instructions} memory, CPI {cpi:.4}");
        Ok(SimulationReport {
            l1_line_size,
            instructions,
            memory_instructions,
            total_cycles,
            cpi,
            average_access_time: hierarchy.average_access_time(),
            caches: vec![CacheResult::from(hierarchy.l1()), CacheResult::from(hierarchy.l2())],
        })
    }

    /// Gets the wall-clock time spent simulating, over every run so far
    pub fn get_execution_time(&self) -> &Duration {
        &self.simulation_time
    }

    pub fn rng(&self) -> &PseudoRandomStream {
        &self.rng
    }

    /// The shared stream, for callers which need to draw from it between runs
    pub fn rng_mut(&mut self) -> &mut PseudoRandomStream {
        &mut self.rng
    }

    pub fn driver(&self) -> &DriverConfig {
        &self.driver
    }
}
