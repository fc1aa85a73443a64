use crate::rng::PseudoRandomStream;

/// A generic trait for implementing new replacement policies. Can be used to parameterise a Cache.
///
/// The cache always fills invalid ways first, so a policy is only asked for a victim when every
/// way of the set holds a valid line
pub trait ReplacementPolicy {
    /// Creates the policy state for a cache of `num_sets` sets of `associativity` ways
    fn for_geometry(num_sets: usize, associativity: usize) -> Self
    where
        Self: Sized;

    /// Updates the policy when a cache line is used, either by a hit or by a fresh install
    ///
    /// Not applicable for some policies, a default which does nothing is provided
    ///
    /// # Arguments
    ///
    /// * `cache_index`: The index of the cache line which was used
    ///
    /// returns: ()
    fn update_on_use(&mut self, _cache_index: usize) {}

    /// Used by the cache to pick the way to evict from a full set
    ///
    /// # Arguments
    ///
    /// * `set_lower_bound_index`: The index of the first line of the set. This is equal to
    /// set * associativity, but the cache already knows it
    /// * `set`: The cache set
    /// * `associativity`: The number of lines per set
    /// * `rng`: The shared random stream
    ///
    /// returns: usize, the way within the set
    fn get_victim_way(
        &mut self,
        set_lower_bound_index: usize,
        set: usize,
        associativity: usize,
        rng: &mut PseudoRandomStream,
    ) -> usize;

    /// Clears any state kept by the policy
    fn reset(&mut self) {}
}

/// Uniform random replacement, drawing one value from the shared stream per eviction
///
/// The draw happens even for direct mapped caches, so the stream advances identically whatever
/// the associativity
#[derive(Debug, Default, Clone)]
pub struct Random;

impl ReplacementPolicy for Random {
    fn for_geometry(_num_sets: usize, _associativity: usize) -> Self {
        Random
    }

    fn get_victim_way(&mut self, _set_lower_bound_index: usize, _set: usize, associativity: usize, rng: &mut PseudoRandomStream) -> usize {
        (rng.next() % associativity as u32) as usize
    }
}

/// Standard round robin replacement policy, which keeps separate indices for each set
#[derive(Debug, Clone)]
pub struct RoundRobin {
    set_indices: Vec<usize>,
}

impl ReplacementPolicy for RoundRobin {
    fn for_geometry(num_sets: usize, _associativity: usize) -> Self {
        Self {
            set_indices: vec![0; num_sets]
        }
    }

    fn get_victim_way(&mut self, _set_lower_bound_index: usize, set: usize, associativity: usize, _rng: &mut PseudoRandomStream) -> usize {
        let set_index = &mut self.set_indices[set];
        let way = *set_index;
        *set_index = (*set_index + 1) % associativity;
        way
    }

    fn reset(&mut self) {
        self.set_indices.iter_mut().for_each(|i| *i = 0);
    }
}

/// Least Recently Used replacement policy
///
/// This implementation keeps track of when each line was last used, and also keeps track of a
/// logical clock, which is updated each time a line is used
#[derive(Debug, Clone)]
pub struct LeastRecentlyUsed {
    last_used_times: Vec<u64>,
    time: u64,
}

impl ReplacementPolicy for LeastRecentlyUsed {
    fn for_geometry(num_sets: usize, associativity: usize) -> Self {
        Self {
            last_used_times: vec![0; num_sets * associativity],
            time: 0,
        }
    }

    fn update_on_use(&mut self, cache_index: usize) {
        self.time += 1;
        self.last_used_times[cache_index] = self.time;
    }

    fn get_victim_way(&mut self, set_lower_bound_index: usize, _set: usize, associativity: usize, _rng: &mut PseudoRandomStream) -> usize {
        let set_times = &self.last_used_times[set_lower_bound_index..set_lower_bound_index + associativity];
        let mut min_value = u64::MAX;
        let mut min_way = 0;
        for (way, &time) in set_times.iter().enumerate() {
            if time < min_value {
                min_value = time;
                min_way = way;
            }
        }
        min_way
    }

    fn reset(&mut self) {
        self.last_used_times.iter_mut().for_each(|t| *t = 0);
        self.time = 0;
    }
}
