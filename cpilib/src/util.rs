use serde::{Deserialize, Serialize};
use crate::address::AddressStream;
use crate::config::{AddressPatternConfig, SimulationConfig};
use crate::error::Error;
use crate::simulator::{SimulationReport, Simulator};

/// The reports for one address pattern across every swept line size
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatternResult {
    pub pattern: String,
    pub results: Vec<SimulationReport>,
}

/// Runs every configured pattern at every configured L1 line size
///
/// Each pattern gets one address stream, built once and reused for all its line sizes, so
/// sequential and strided streams carry their position from one run into the next. The
/// simulator's random stream is likewise shared by every run
///
/// # Arguments
///
/// * `simulator`: The simulator, seeded as desired
/// * `config`: Supplies the patterns, line sizes and DRAM size
///
/// returns: Result<Vec<PatternResult>, Error>
pub fn run_sweep(simulator: &mut Simulator, config: &SimulationConfig) -> Result<Vec<PatternResult>, Error> {
    config
        .patterns
        .iter()
        .map(|pattern| run_pattern(simulator, pattern, &config.line_sizes, config.dram_size))
        .collect()
}

fn run_pattern(simulator: &mut Simulator, pattern: &AddressPatternConfig, line_sizes: &[u64], dram_size: u64) -> Result<PatternResult, Error> {
    let mut stream = AddressStream::from_config(pattern, dram_size)?;
    let results = line_sizes
        .iter()
        .map(|&line_size| simulator.run(&mut stream, line_size))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(PatternResult {
        pattern: pattern.to_string(),
        results,
    })
}
