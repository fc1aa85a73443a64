use std::fs::File;
use std::path::Path;
use crate::error::TraceError;

/// Reads every address from a trace file
///
/// The file is memory mapped and scanned once, sequentially
///
/// # Arguments
///
/// * `path`: The trace file, one hexadecimal address per line
///
/// returns: Result<Vec<u64>, TraceError>
pub fn read_trace(path: impl AsRef<Path>) -> Result<Vec<u64>, TraceError> {
    let file = File::open(path)?;
    // Mapping an empty file fails on some platforms
    if file.metadata()?.len() == 0 {
        return Err(TraceError::Empty);
    }
    #[cfg(unix)]
    {
        use memmap2::{Advice, Mmap};
        // Safety: the map is only read here and dropped before returning. A file truncated by
        // another process in the meantime is outside what we support
        let mmap = unsafe { Mmap::map(&file)? };
        mmap.advise(Advice::Sequential)?;
        parse_trace(&mmap)
    }
    #[cfg(not(unix))]
    {
        use memmap2::Mmap;
        let mmap = unsafe { Mmap::map(&file)? };
        parse_trace(&mmap)
    }
}

/// Parses the contents of a trace
///
/// Each non-empty line holds an address in hexadecimal, with an optional `0x` prefix. A leading
/// `R`/`W` access type and any trailing tokens (such as an access size) are ignored, as are lines
/// starting with `#`
///
/// # Examples
///
/// ```
/// use cpilib::io::parse_trace;
/// let trace = b"# comment\nR 0x1f40 4\nW 20\n\n7fff\n";
/// assert_eq!(parse_trace(trace).unwrap(), vec![0x1f40, 0x20, 0x7fff]);
/// ```
pub fn parse_trace(bytes: &[u8]) -> Result<Vec<u64>, TraceError> {
    let text = String::from_utf8_lossy(bytes);
    let mut addresses = Vec::new();
    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut tokens = line.split_whitespace();
        let mut token = tokens.next().unwrap_or_default();
        if matches!(token, "R" | "W" | "r" | "w") {
            token = tokens.next().unwrap_or_default();
        }
        let address = parse_address(token).ok_or_else(|| TraceError::InvalidAddress {
            line: number + 1,
            token: token.to_string(),
        })?;
        addresses.push(address);
    }
    if addresses.is_empty() {
        return Err(TraceError::Empty);
    }
    Ok(addresses)
}

/// Parses a hexadecimal address with an optional `0x` prefix
///
/// # Examples
///
/// ```
/// use cpilib::io::parse_address;
/// assert_eq!(parse_address("000000000000000A"), Some(10));
/// assert_eq!(parse_address("0xff"), Some(255));
/// assert_eq!(parse_address("zz"), None);
/// ```
pub fn parse_address(token: &str) -> Option<u64> {
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);
    if digits.is_empty() {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}
