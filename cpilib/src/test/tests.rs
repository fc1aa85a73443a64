use crate::address::{AddressStream, Sequential, UniformRandom};
use crate::config::{AddressPatternConfig, DriverConfig, HierarchyConfig, ReplacementPolicyConfig, SimulationConfig, DRAM_SIZE};
use crate::error::{ConfigError, PatternParseError};
use crate::rng::PseudoRandomStream;
use crate::simulator::Simulator;
use crate::util::run_sweep;

fn simulator(iterations: u64) -> Simulator {
    let driver = DriverConfig { iterations, ..DriverConfig::default() };
    Simulator::new(HierarchyConfig::default(), driver, PseudoRandomStream::new())
}

#[test]
fn runs_are_reproducible_for_a_seed() {
    let run = || {
        let mut source = UniformRandom::new(24 * 1024).unwrap();
        simulator(20_000).run(&mut source, 32).unwrap()
    };
    assert_eq!(run(), run());
}

#[test]
fn different_seeds_diverge() {
    let driver = DriverConfig { iterations: 20_000, ..DriverConfig::default() };
    let mut a = Simulator::new(HierarchyConfig::default(), driver.clone(), PseudoRandomStream::with_seed(1, 2));
    let mut b = Simulator::new(HierarchyConfig::default(), driver, PseudoRandomStream::with_seed(3, 4));
    let report_a = a.run(&mut UniformRandom::new(DRAM_SIZE).unwrap(), 64).unwrap();
    let report_b = b.run(&mut UniformRandom::new(DRAM_SIZE).unwrap(), 64).unwrap();
    assert_ne!(report_a, report_b);
}

#[test]
fn memory_instruction_fraction_converges() {
    let mut sim = simulator(200_000);
    let report = sim.run(&mut Sequential::new(DRAM_SIZE).unwrap(), 64).unwrap();
    let fraction = report.memory_instructions as f64 / report.instructions as f64;
    assert!((fraction - 0.35).abs() < 0.01, "memory fraction {fraction}");
}

#[test]
fn report_is_consistent() {
    let mut sim = simulator(50_000);
    let report = sim.run(&mut UniformRandom::new(256 * 1024).unwrap(), 64).unwrap();
    assert_eq!(report.instructions, 50_000);
    assert_eq!(report.l1_line_size, 64);
    assert_eq!(report.cpi, report.total_cycles as f64 / 50_000.0);
    assert!(report.cpi >= 1.0);

    let (l1, l2) = (&report.caches[0], &report.caches[1]);
    assert_eq!(l1.name, "L1");
    assert_eq!(l2.name, "L2");
    assert_eq!(l1.hits + l1.misses, report.memory_instructions);
    // L2 is only consulted on an L1 miss, and always with a read
    assert_eq!(l2.hits + l2.misses, l1.misses);
    assert_eq!(l2.writebacks, 0);

    let non_memory = report.instructions - report.memory_instructions;
    let average = (report.total_cycles - non_memory) as f64 / report.memory_instructions as f64;
    assert!((report.average_access_time - average).abs() < 1e-9);
}

#[test]
fn sequential_locality_beats_random_access() {
    let mut sequential = simulator(100_000);
    let mut random = simulator(100_000);
    let local = sequential.run(&mut Sequential::new(4 * 1024).unwrap(), 64).unwrap();
    let scattered = random.run(&mut UniformRandom::new(DRAM_SIZE).unwrap(), 64).unwrap();
    assert!(local.caches[0].hit_rate > scattered.caches[0].hit_rate);
    assert!(local.caches[0].hit_rate > 0.95);
    assert!(local.cpi < scattered.cpi);
}

#[test]
fn every_run_starts_with_a_cold_hierarchy() {
    let mut sim = simulator(100_000);
    let mut source = Sequential::new(4 * 1024).unwrap();
    // The 4KB window fits in both levels, so only compulsory misses remain
    for _ in 0..2 {
        let report = sim.run(&mut source, 64).unwrap();
        assert_eq!(report.caches[0].misses, 64);
        assert_eq!(report.caches[1].misses, 64);
    }
}

#[test]
fn zero_iterations_give_zero_cpi() {
    let mut sim = simulator(0);
    let report = sim.run(&mut Sequential::new(64).unwrap(), 64).unwrap();
    assert_eq!(report.cpi, 0.0);
    assert_eq!(report.memory_instructions, 0);
    assert_eq!(report.average_access_time, 0.0);
}

#[test]
fn invalid_line_size_is_a_config_error() {
    let mut sim = simulator(10);
    let result = sim.run(&mut Sequential::new(64).unwrap(), 96);
    assert!(matches!(result, Err(ConfigError::IndivisibleGeometry { .. }) | Err(ConfigError::NotPowerOfTwo { .. })));
}

#[test]
fn shared_stream_advances_across_runs() {
    let mut sim = simulator(1_000);
    let mut source = AddressStream::from_config(&AddressPatternConfig::RandomFullRange, DRAM_SIZE).unwrap();
    let first = sim.run(&mut source, 64).unwrap();
    let second = sim.run(&mut source, 64).unwrap();
    assert_ne!(first, second);
    assert_ne!(sim.rng(), &PseudoRandomStream::new());
}

#[test]
fn sweep_covers_every_pattern_and_line_size() {
    let config = SimulationConfig {
        driver: DriverConfig { iterations: 2_000, ..DriverConfig::default() },
        line_sizes: vec![16, 128],
        ..SimulationConfig::default()
    };
    let mut sim = Simulator::from_config(&config);
    let results = run_sweep(&mut sim, &config).unwrap();
    let names: Vec<&str> = results.iter().map(|r| r.pattern.as_str()).collect();
    assert_eq!(names, vec!["sequential", "random:24576", "random", "sequential:4096", "strided:32:1048576"]);
    for result in &results {
        let line_sizes: Vec<u64> = result.results.iter().map(|r| r.l1_line_size).collect();
        assert_eq!(line_sizes, vec![16, 128]);
    }
}

#[test]
fn empty_config_uses_defaults() {
    let config = SimulationConfig::from_reader("{}".as_bytes()).unwrap();
    assert_eq!(config, SimulationConfig::default());
    assert_eq!(config.driver.iterations, 1_000_000);
    assert_eq!(config.driver.memory_instruction_probability, 0.35);
    assert_eq!(config.line_sizes, vec![16, 32, 64, 128]);
    assert_eq!(config.hierarchy.l2.hit_latency, 10);
    assert_eq!(config.hierarchy.dram_penalty, 50);
}

#[test]
fn partial_config_is_filled_in() {
    let json = r#"{
        "driver": { "iterations": 10 },
        "seed": { "w": 1, "z": 2 },
        "hierarchy": {
            "l1": { "name": "I", "size": 1024, "line_size": 32, "associativity": 2, "hit_latency": 2, "replacement_policy": "lru" },
            "l2": { "name": "U", "size": 8192, "line_size": 64, "associativity": 4, "hit_latency": 12 }
        },
        "patterns": [ { "kind": "strided", "stride": 8, "window": 512 }, { "kind": "random_full_range" } ]
    }"#;
    let config = SimulationConfig::from_reader(json.as_bytes()).unwrap();
    assert_eq!(config.driver.iterations, 10);
    assert_eq!(config.driver.write_probability, 0.5);
    assert_eq!(config.hierarchy.l1.replacement_policy, ReplacementPolicyConfig::LeastRecentlyUsed);
    assert_eq!(config.hierarchy.l2.replacement_policy, ReplacementPolicyConfig::Random);
    assert_eq!(config.hierarchy.dram_penalty, 50);
    assert_eq!(
        config.patterns,
        vec![AddressPatternConfig::Strided { stride: 8, window: 512 }, AddressPatternConfig::RandomFullRange]
    );

    let mut sim = Simulator::from_config(&config);
    assert_eq!(sim.rng(), &PseudoRandomStream::with_seed(1, 2));
    let results = run_sweep(&mut sim, &config).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].results.len(), 4);
}

#[test]
fn pattern_descriptors_parse() {
    assert_eq!("sequential".parse(), Ok(AddressPatternConfig::SequentialFullRange));
    assert_eq!("sequential:4096".parse(), Ok(AddressPatternConfig::SequentialBounded { window: 4096 }));
    assert_eq!("random".parse(), Ok(AddressPatternConfig::RandomFullRange));
    assert_eq!("random:24k".parse(), Ok(AddressPatternConfig::RandomBounded { window: 24 * 1024 }));
    assert_eq!("strided:32:1M".parse(), Ok(AddressPatternConfig::Strided { stride: 32, window: 1024 * 1024 }));
    assert_eq!(
        "trace:C:/traces/a.txt".parse(),
        Ok(AddressPatternConfig::Trace { path: "C:/traces/a.txt".to_string() })
    );
    assert_eq!(
        "random:12q".parse::<AddressPatternConfig>(),
        Err(PatternParseError::InvalidNumber("12q".to_string()))
    );
    assert_eq!(
        "strided:32".parse::<AddressPatternConfig>(),
        Err(PatternParseError::Unknown("strided:32".to_string()))
    );
    assert!("zigzag".parse::<AddressPatternConfig>().is_err());
}

#[test]
fn pattern_names_round_trip() {
    for pattern in AddressPatternConfig::defaults() {
        assert_eq!(pattern.to_string().parse(), Ok(pattern));
    }
}
