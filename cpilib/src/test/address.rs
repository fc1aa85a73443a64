use std::fs;
use crate::address::{AddressSource, AddressStream, Sequential, Strided, TraceReplay, UniformRandom};
use crate::config::AddressPatternConfig;
use crate::error::{ConfigError, Error, TraceError};
use crate::io::parse_trace;
use crate::rng::PseudoRandomStream;

fn take<S: AddressSource>(source: &mut S, rng: &mut PseudoRandomStream, count: usize) -> Vec<u64> {
    (0..count).map(|_| source.next_address(rng)).collect()
}

#[test]
fn sequential_starts_at_zero_and_wraps() {
    let mut rng = PseudoRandomStream::new();
    let mut source = Sequential::new(4).unwrap();
    assert_eq!(take(&mut source, &mut rng, 6), vec![0, 1, 2, 3, 0, 1]);
    assert_eq!(rng, PseudoRandomStream::new());
}

#[test]
fn strided_advances_before_returning() {
    let mut rng = PseudoRandomStream::new();
    let mut source = Strided::new(32, 1024 * 1024).unwrap();
    assert_eq!(take(&mut source, &mut rng, 3), vec![32, 64, 96]);

    let mut wrapping = Strided::new(32, 64).unwrap();
    assert_eq!(take(&mut wrapping, &mut rng, 4), vec![32, 0, 32, 0]);
}

#[test]
fn sources_continue_where_they_left_off() {
    let mut rng = PseudoRandomStream::new();
    let mut source = Sequential::new(4096).unwrap();
    take(&mut source, &mut rng, 10);
    assert_eq!(source.next_address(&mut rng), 10);
    let mut fresh = Sequential::new(4096).unwrap();
    assert_eq!(fresh.next_address(&mut rng), 0);
}

#[test]
fn random_draws_once_per_address_within_bound() {
    let mut rng = PseudoRandomStream::with_seed(5, 6);
    let mut expected = rng.clone();
    let mut source = UniformRandom::new(24 * 1024).unwrap();
    for _ in 0..1000 {
        let address = source.next_address(&mut rng);
        assert!(address < 24 * 1024);
        assert_eq!(address, u64::from(expected.next()) % (24 * 1024));
    }
}

#[test]
fn zero_bounds_are_rejected() {
    let zero = ConfigError::ZeroParameter { what: "address bound" };
    assert_eq!(Sequential::new(0).unwrap_err(), zero);
    assert_eq!(Strided::new(32, 0).unwrap_err(), zero);
    assert_eq!(UniformRandom::new(0).unwrap_err(), zero);
    assert!(TraceReplay::new(vec![], 64).is_err());
    let pattern = AddressPatternConfig::SequentialBounded { window: 0 };
    assert!(matches!(AddressStream::from_config(&pattern, 64), Err(Error::Config(_))));
}

#[test]
fn trace_replays_cyclically_within_bound() {
    let mut rng = PseudoRandomStream::new();
    let mut source = TraceReplay::new(vec![5, 100], 64).unwrap();
    assert_eq!(source.len(), 2);
    assert_eq!(take(&mut source, &mut rng, 5), vec![5, 36, 5, 36, 5]);
}

#[test]
fn trace_file_is_loaded() {
    let path = std::env::temp_dir().join(format!("cpilib-trace-{}.txt", std::process::id()));
    fs::write(&path, "# header\nR 0x40 4\nW 80\n\n0xC0\n").unwrap();
    let pattern = AddressPatternConfig::Trace { path: path.to_string_lossy().into_owned() };
    let mut stream = AddressStream::from_config(&pattern, 1 << 20).unwrap();
    let mut rng = PseudoRandomStream::new();
    assert_eq!(take(&mut stream, &mut rng, 4), vec![0x40, 0x80, 0xC0, 0x40]);
    fs::remove_file(&path).unwrap();
}

#[test]
fn missing_trace_file_is_an_io_error() {
    let pattern = AddressPatternConfig::Trace { path: "/nonexistent/cpilib/trace.txt".to_string() };
    assert!(matches!(
        AddressStream::from_config(&pattern, 64),
        Err(Error::Trace(TraceError::Io(_)))
    ));
}

#[test]
fn malformed_traces_are_rejected() {
    match parse_trace(b"0x10\nW zz\n") {
        Err(TraceError::InvalidAddress { line, token }) => {
            assert_eq!(line, 2);
            assert_eq!(token, "zz");
        }
        other => panic!("unexpected result {other:?}"),
    }
    assert!(matches!(parse_trace(b"# nothing here\n\n"), Err(TraceError::Empty)));
}

#[test]
fn default_patterns_build_in_order() {
    let mut rng = PseudoRandomStream::new();
    let streams: Vec<AddressStream> = AddressPatternConfig::defaults()
        .iter()
        .map(|pattern| AddressStream::from_config(pattern, 64 * 1024 * 1024).unwrap())
        .collect();
    assert_eq!(streams.len(), 5);
    assert!(matches!(streams[0], AddressStream::Sequential(_)));
    assert!(matches!(streams[1], AddressStream::Random(_)));
    assert!(matches!(streams[2], AddressStream::Random(_)));
    assert!(matches!(streams[3], AddressStream::Sequential(_)));
    let mut strided = streams[4].clone();
    assert_eq!(strided.next_address(&mut rng), 32);
}
