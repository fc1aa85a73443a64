use std::time::{SystemTime, UNIX_EPOCH};

/// Default value for the `w` state word, also substituted for a zero seed
pub const DEFAULT_W: u32 = 0xABAB_AB55;

/// Default value for the `z` state word, also substituted for a zero seed
pub const DEFAULT_Z: u32 = 0x0508_0902;

const TWO_POW_32: f64 = 4_294_967_296.0;

/// A multiply-with-carry pseudo-random stream built from two 16-bit lag generators
///
/// Every component which needs randomness (victim selection, random address sources and
/// instruction classification) must draw from the same instance, passed by mutable reference.
/// The output is a pure function of the seed and the order of calls, so any reordering of draws
/// between components changes every later outcome
///
/// Cloning a stream forks it: the clone replays exactly the values the original is about to
/// produce
///
/// # Examples
///
/// ```
/// use cpilib::rng::PseudoRandomStream;
/// let mut a = PseudoRandomStream::with_seed(1, 1);
/// let mut b = a.clone();
/// assert_eq!(a.next(), b.next());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PseudoRandomStream {
    w: u32,
    z: u32,
}

impl Default for PseudoRandomStream {
    fn default() -> Self {
        Self::new()
    }
}

impl PseudoRandomStream {
    /// Creates a stream seeded with the default constants
    pub fn new() -> Self {
        Self {
            w: DEFAULT_W,
            z: DEFAULT_Z,
        }
    }

    /// Creates a stream from an explicit seed pair. Zero words are replaced by their defaults, as
    /// an all-zero state would only ever produce zero
    pub fn with_seed(w: u32, z: u32) -> Self {
        let mut stream = Self::new();
        stream.seed(w, z);
        stream
    }

    /// Creates a stream seeded from the wall clock. Runs seeded this way are not reproducible
    pub fn from_time() -> Self {
        // A clock before the epoch just falls back to the defaults
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self::with_seed(now.as_secs() as u32, now.subsec_nanos())
    }

    /// Resets the state of the stream
    ///
    /// # Arguments
    ///
    /// * `w`: The new `w` word, or 0 for the default
    /// * `z`: The new `z` word, or 0 for the default
    ///
    /// returns: ()
    pub fn seed(&mut self, w: u32, z: u32) {
        self.w = if w == 0 { DEFAULT_W } else { w };
        self.z = if z == 0 { DEFAULT_Z } else { z };
    }

    /// Returns the current `(w, z)` state, which can be fed back into [`Self::with_seed`]
    pub fn state(&self) -> (u32, u32) {
        (self.w, self.z)
    }

    /// Advances the stream and returns the next 32-bit value
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> u32 {
        // Neither product can exceed u32::MAX, only the final sum wraps
        self.z = 36969 * (self.z & 0xFFFF) + (self.z >> 16);
        self.w = 18000 * (self.w & 0xFFFF) + (self.w >> 16);
        (self.z << 16).wrapping_add(self.w)
    }

    /// Advances the stream and returns the next value scaled to `[0, 1)`
    pub fn next_fraction(&mut self) -> f64 {
        self.next() as f64 / TWO_POW_32
    }
}
