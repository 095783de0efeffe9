//! Lockless transposition table with generation-aware replacement.
//!
//! The table is an array of 64-byte clusters, each holding four 16-byte slots of two
//! `AtomicU64` words. The cluster count is a power of two; the low bits of a key pick
//! the cluster and the high 32 bits are stored as the slot's signature.
//!
//! ## Bit layout
//!
//! ```text
//! key word:
//!   bits 63-32: signature   (key >> 32)
//!   bits 31-0:  check       signature ^ data[63:32] ^ data[31:0]
//!
//! data word:
//!   bits 63-58: generation  (6 bits, wraps at 64)
//!   bits 57-56: bound       (0 = empty slot)
//!   bits 55-48: depth       (i8)
//!   bits 47-32: move
//!   bits 31-16: score       (i16)
//!   bits 15-0:  eval        (i16)
//! ```
//!
//! ## Collisions and torn writes
//!
//! At most 2^32 clusters are allocated, so index bits and signature bits never
//! overlap. Two positions sharing a cluster and a signature are indistinguishable;
//! with four slots per cluster a probe for an absent position returns a foreign
//! entry with probability about 4 * 2^-32. Callers must treat a stored move as a
//! hint and check it for legality before playing it.
//!
//! Concurrent writers may interleave the two words of a slot. The check field then
//! no longer matches and the slot reads as a miss. All accesses are `Relaxed`.
//!
//! ## Generations
//!
//! The generation is 6 bits and wraps after 64 calls to `new_search`. An entry left
//! untouched for a multiple of 64 searches then compares as current and is kept like a
//! fresh one until it is overwritten or the generation moves on. Its depth and bound
//! still decide against other current entries.
//!
//! ## Sharing
//!
//! `probe`, `store`, `new_search` and `clear` take `&self`, so one table can be
//! shared by reference between search threads. [`TranspositionTable::alloc`] takes
//! `&mut self` and therefore cannot race with them.

use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

use tracing::{debug, info};

use cinder_core::Move;

use crate::error::TtError;

const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn check() {
        assert_send_sync::<TranspositionTable>();
    }
    let _ = check;
};

/// Slots per cluster.
pub const CLUSTER_SLOTS: usize = 4;

const GENERATION_MASK: u8 = 0x3F;
const MAX_INDEX_BITS: u32 = 32;
const HASHFULL_SAMPLE: usize = 1000;

/// What the stored score says about the true score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Bound {
    Exact = 1,
    /// Failed high: the true score is at least the stored one.
    Lower = 2,
    /// Failed low: the true score is at most the stored one.
    Upper = 3,
}

impl Bound {
    const fn from_bits(bits: u64) -> Option<Bound> {
        match bits & 0b11 {
            1 => Some(Bound::Exact),
            2 => Some(Bound::Lower),
            3 => Some(Bound::Upper),
            _ => None,
        }
    }
}

/// A decoded table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtEntry {
    pub bound: Bound,
    pub depth: i8,
    pub score: i16,
    pub eval: i16,
    /// `Move::NULL` when no best move is known.
    pub mv: Move,
    pub generation: u8,
}

impl TtEntry {
    fn pack(&self) -> u64 {
        (u64::from(self.generation & GENERATION_MASK) << 58)
            | ((self.bound as u64) << 56)
            | (u64::from(self.depth as u8) << 48)
            | (u64::from(self.mv.bits()) << 32)
            | (u64::from(self.score as u16) << 16)
            | u64::from(self.eval as u16)
    }

    fn unpack(data: u64) -> Option<TtEntry> {
        Some(TtEntry {
            bound: Bound::from_bits(data >> 56)?,
            depth: (data >> 48) as u8 as i8,
            score: (data >> 16) as u16 as i16,
            eval: data as u16 as i16,
            mv: Move::from_bits((data >> 32) as u16),
            generation: (data >> 58) as u8,
        })
    }
}

#[inline]
fn signature(key: u64) -> u32 {
    (key >> 32) as u32
}

#[inline]
fn check_word(sig: u32, data: u64) -> u32 {
    sig ^ (data >> 32) as u32 ^ data as u32
}

/// Parsed fields the replacement policy looks at.
#[inline]
fn slot_meta(data: u64) -> (bool, u8, Option<Bound>, i8) {
    let bound = Bound::from_bits(data >> 56);
    (bound.is_none(), (data >> 58) as u8, bound, (data >> 48) as u8 as i8)
}

#[derive(Default)]
struct Slot {
    key: AtomicU64,
    data: AtomicU64,
}

impl Slot {
    #[inline]
    fn load(&self) -> (u64, u64) {
        (self.key.load(Ordering::Relaxed), self.data.load(Ordering::Relaxed))
    }

    /// The entry stored under `sig`, if the slot is occupied, intact and matching.
    #[inline]
    fn read(&self, sig: u32) -> Option<TtEntry> {
        let (key, data) = self.load();
        if signature(key) != sig || key as u32 != check_word(sig, data) {
            return None;
        }
        TtEntry::unpack(data)
    }

    #[inline]
    fn write(&self, sig: u32, data: u64) {
        let key = (u64::from(sig) << 32) | u64::from(check_word(sig, data));
        self.key.store(key, Ordering::Relaxed);
        self.data.store(data, Ordering::Relaxed);
    }

    #[inline]
    fn zero(&self) {
        self.key.store(0, Ordering::Relaxed);
        self.data.store(0, Ordering::Relaxed);
    }
}

/// Four slots, one cache line.
#[repr(C, align(64))]
#[derive(Default)]
struct Cluster {
    slots: [Slot; CLUSTER_SLOTS],
}

/// Cluster-based, cache-line-aligned transposition table.
pub struct TranspositionTable {
    clusters: Box<[Cluster]>,
    generation: AtomicU8,
}

impl TranspositionTable {
    /// Size of one cluster in bytes.
    pub const CLUSTER_BYTES: usize = std::mem::size_of::<Cluster>();

    /// Allocate a table for a budget of `bytes`.
    pub fn new(bytes: usize) -> Result<TranspositionTable, TtError> {
        let mut tt = TranspositionTable { clusters: Box::default(), generation: AtomicU8::new(0) };
        tt.alloc(bytes)?;
        Ok(tt)
    }

    /// Largest power of two `n` with `n` clusters fitting in `bytes`, at least one.
    pub fn cluster_count_for(bytes: usize) -> usize {
        let fit = (bytes / Self::CLUSTER_BYTES).max(1);
        1usize << fit.ilog2().min(MAX_INDEX_BITS)
    }

    /// Resize to a budget of `bytes`, clearing the table. A budget that yields the
    /// current cluster count is a no-op and keeps all entries.
    ///
    /// The old store is released before the new one is reserved. On failure the
    /// table is left empty and every probe misses.
    pub fn alloc(&mut self, bytes: usize) -> Result<(), TtError> {
        let count = Self::cluster_count_for(bytes);
        if count == self.clusters.len() {
            debug!(clusters = count, "transposition table size unchanged");
            return Ok(());
        }

        self.clusters = Box::default();
        let mut clusters: Vec<Cluster> = Vec::new();
        clusters.try_reserve_exact(count).map_err(|source| TtError::Alloc {
            clusters: count,
            bytes: count * Self::CLUSTER_BYTES,
            source,
        })?;
        clusters.resize_with(count, Cluster::default);
        self.clusters = clusters.into_boxed_slice();
        self.clear();

        info!(clusters = count, bytes = count * Self::CLUSTER_BYTES, "transposition table allocated");
        Ok(())
    }

    /// Zero every slot and reset the generation.
    pub fn clear(&self) {
        for slot in self.clusters.iter().flat_map(|c| c.slots.iter()) {
            slot.zero();
        }
        self.generation.store(0, Ordering::Relaxed);
        debug!(clusters = self.clusters.len(), "transposition table cleared");
    }

    /// Start a new search: entries written from now on are the fresh generation.
    /// Existing entries are kept and merely age.
    pub fn new_search(&self) {
        let current = self.generation.load(Ordering::Relaxed);
        self.generation.store(current.wrapping_add(1) & GENERATION_MASK, Ordering::Relaxed);
    }

    pub fn generation(&self) -> u8 {
        self.generation.load(Ordering::Relaxed)
    }

    /// Number of clusters.
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    #[inline]
    fn cluster(&self, key: u64) -> Option<&Cluster> {
        let mask = self.clusters.len().wrapping_sub(1);
        self.clusters.get(key as usize & mask)
    }

    /// The first entry of `key`'s cluster whose signature matches.
    pub fn probe(&self, key: u64) -> Option<TtEntry> {
        let sig = signature(key);
        self.cluster(key)?.slots.iter().find_map(|slot| slot.read(sig))
    }

    /// Store a search result for `key`.
    ///
    /// An empty slot or the slot already holding `key` is overwritten in place; a
    /// null `mv` then keeps the move stored before. Otherwise the victim is the slot
    /// that loses the least: stale over fresh, non-exact over exact, shallow over deep.
    pub fn store(&self, key: u64, bound: Bound, depth: i8, score: i16, eval: i16, mut mv: Move) {
        let Some(cluster) = self.cluster(key) else {
            return;
        };
        let sig = signature(key);
        let generation = self.generation();

        let mut victim = 0;
        let (_, mut victim_gen, _, mut victim_depth) = slot_meta(cluster.slots[0].load().1);
        for (i, slot) in cluster.slots.iter().enumerate() {
            let (key_word, data) = slot.load();
            let (empty, slot_gen, slot_bound, slot_depth) = slot_meta(data);

            if empty || signature(key_word) == sig {
                victim = i;
                if mv.is_null() {
                    if let Some(previous) = slot.read(sig) {
                        mv = previous.mv;
                    }
                }
                break;
            }

            let keep_victim = if victim_gen == generation { 2 } else { 0 };
            let keep_slot = if slot_gen == generation || slot_bound == Some(Bound::Exact) { -2 } else { 0 };
            let shallower = if slot_depth < victim_depth { 1 } else { 0 };
            if keep_victim + keep_slot + shallower > 0 {
                victim = i;
                victim_gen = slot_gen;
                victim_depth = slot_depth;
            }
        }

        let entry = TtEntry { bound, depth, score, eval, mv, generation };
        cluster.slots[victim].write(sig, entry.pack());
    }

    /// Per-mille occupancy by the current generation, sampled over the first
    /// clusters of the table.
    pub fn hashfull(&self) -> usize {
        let generation = self.generation();
        let sample = &self.clusters[..self.clusters.len().min(HASHFULL_SAMPLE)];
        if sample.is_empty() {
            return 0;
        }
        let fresh = sample
            .iter()
            .flat_map(|c| c.slots.iter())
            .filter(|slot| {
                let (empty, slot_gen, _, _) = slot_meta(slot.load().1);
                !empty && slot_gen == generation
            })
            .count();
        fresh * 1000 / (sample.len() * CLUSTER_SLOTS)
    }
}

impl std::fmt::Debug for TranspositionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranspositionTable")
            .field("clusters", &self.clusters.len())
            .field("generation", &self.generation())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinder_core::Square;

    const MIB: usize = 1 << 20;

    /// Keys landing in the same cluster of a table with `clusters` clusters.
    fn same_cluster(clusters: usize, n: u64) -> impl Iterator<Item = u64> {
        (1..=n).map(move |i| (i << 40) | (i << 33) | 5 % clusters as u64)
    }

    #[test]
    fn cluster_is_one_cache_line() {
        assert_eq!(std::mem::size_of::<Slot>(), 16);
        assert_eq!(TranspositionTable::CLUSTER_BYTES, 64);
        assert_eq!(std::mem::align_of::<Cluster>(), 64);
    }

    #[test]
    fn cluster_count_is_largest_fitting_power_of_two() {
        assert_eq!(TranspositionTable::cluster_count_for(0), 1);
        assert_eq!(TranspositionTable::cluster_count_for(63), 1);
        assert_eq!(TranspositionTable::cluster_count_for(64), 1);
        assert_eq!(TranspositionTable::cluster_count_for(200), 2);
        assert_eq!(TranspositionTable::cluster_count_for(MIB), MIB / 64);
        assert_eq!(TranspositionTable::cluster_count_for(3 * MIB), 2 * MIB / 64);
    }

    #[test]
    fn backing_store_is_cache_line_aligned() {
        let tt = TranspositionTable::new(MIB).unwrap();
        assert_eq!(tt.clusters.as_ptr() as usize % 64, 0);
        assert_eq!(tt.len(), MIB / 64);
    }

    #[test]
    fn store_then_probe_returns_the_fields() {
        let tt = TranspositionTable::new(MIB).unwrap();
        let mv = Move::new(Square::E2, Square::E4);
        tt.store(0x1234, Bound::Exact, 10, 100, 90, mv);

        let entry = tt.probe(0x1234).unwrap();
        assert_eq!(entry.bound, Bound::Exact);
        assert_eq!(entry.depth, 10);
        assert_eq!(entry.score, 100);
        assert_eq!(entry.eval, 90);
        assert_eq!(entry.mv, mv);
        assert_eq!(entry.generation, 0);

        assert_eq!(tt.probe(0x5678), None);
    }

    #[test]
    fn negative_fields_survive_packing() {
        let tt = TranspositionTable::new(MIB).unwrap();
        tt.store(0xABCD_0000_0000_0042, Bound::Upper, -3, -32000, -17, Move::NULL);
        let entry = tt.probe(0xABCD_0000_0000_0042).unwrap();
        assert_eq!((entry.bound, entry.depth, entry.score, entry.eval), (Bound::Upper, -3, -32000, -17));
        assert!(entry.mv.is_null());
    }

    #[test]
    fn null_move_keeps_the_stored_move() {
        let tt = TranspositionTable::new(MIB).unwrap();
        let mv = Move::new(Square::G1, Square::F3);
        tt.store(0x9999, Bound::Lower, 4, 30, 10, mv);
        tt.store(0x9999, Bound::Upper, 6, -5, 12, Move::NULL);

        let entry = tt.probe(0x9999).unwrap();
        assert_eq!(entry.mv, mv);
        assert_eq!(entry.bound, Bound::Upper);
        assert_eq!(entry.depth, 6);

        let other = Move::new(Square::B1, Square::C3);
        tt.store(0x9999, Bound::Exact, 7, 0, 0, other);
        assert_eq!(tt.probe(0x9999).unwrap().mv, other);
    }

    #[test]
    fn new_search_ages_without_erasing() {
        let tt = TranspositionTable::new(MIB).unwrap();
        tt.store(0x1234, Bound::Exact, 10, 100, 90, Move::NULL);
        for _ in 0..70 {
            tt.new_search();
        }
        assert_eq!(tt.generation(), 70 % 64);
        let entry = tt.probe(0x1234).unwrap();
        assert_eq!((entry.depth, entry.score, entry.generation), (10, 100, 0));
    }

    #[test]
    fn clear_erases_and_resets_generation() {
        let tt = TranspositionTable::new(MIB).unwrap();
        tt.new_search();
        tt.store(0x1234, Bound::Exact, 10, 100, 90, Move::NULL);
        tt.clear();
        assert_eq!(tt.probe(0x1234), None);
        assert_eq!(tt.generation(), 0);
    }

    #[test]
    fn resize_to_same_count_keeps_entries() {
        let mut tt = TranspositionTable::new(MIB).unwrap();
        tt.store(0x1234, Bound::Exact, 10, 100, 90, Move::NULL);
        tt.alloc(MIB + 63).unwrap();
        assert!(tt.probe(0x1234).is_some());

        tt.alloc(4 * MIB).unwrap();
        assert_eq!(tt.len(), 4 * MIB / 64);
        assert_eq!(tt.probe(0x1234), None);
    }

    #[test]
    fn degenerate_budget_gives_one_cluster() {
        let tt = TranspositionTable::new(0).unwrap();
        assert_eq!(tt.len(), 1);
        let keys: Vec<u64> = same_cluster(1, 4).collect();
        for (depth, &key) in keys.iter().enumerate() {
            tt.store(key, Bound::Lower, depth as i8, 0, 0, Move::NULL);
        }
        assert!(keys.iter().all(|&k| tt.probe(k).is_some()));
    }

    #[test]
    fn full_cluster_evicts_the_shallowest_stale_entry() {
        let tt = TranspositionTable::new(64).unwrap();
        let keys: Vec<u64> = same_cluster(1, 5).collect();
        for (&key, depth) in keys[..4].iter().zip([8, 3, 12, 5]) {
            tt.store(key, Bound::Lower, depth, 0, 0, Move::NULL);
        }
        tt.new_search();
        tt.store(keys[4], Bound::Lower, 1, 0, 0, Move::NULL);

        assert_eq!(tt.probe(keys[1]), None, "depth 3 was the cheapest to lose");
        for &key in [keys[0], keys[2], keys[3], keys[4]].iter() {
            assert!(tt.probe(key).is_some());
        }
    }

    #[test]
    fn fresh_entries_outlive_stale_deeper_ones() {
        let tt = TranspositionTable::new(64).unwrap();
        let keys: Vec<u64> = same_cluster(1, 6).collect();
        tt.store(keys[0], Bound::Lower, 20, 0, 0, Move::NULL);
        tt.new_search();
        for &key in &keys[1..4] {
            tt.store(key, Bound::Lower, 2, 0, 0, Move::NULL);
        }
        tt.store(keys[4], Bound::Lower, 1, 0, 0, Move::NULL);
        assert_eq!(tt.probe(keys[0]), None, "stale entry goes first despite its depth");

        // Among same-generation entries the shallowest goes, exact bounds excepted.
        tt.store(keys[5], Bound::Lower, 9, 0, 0, Move::NULL);
        assert_eq!(tt.probe(keys[4]), None);
    }

    #[test]
    fn stale_exact_entry_is_kept_over_deeper_stale_bound() {
        let tt = TranspositionTable::new(64).unwrap();
        let keys: Vec<u64> = same_cluster(1, 5).collect();
        tt.store(keys[0], Bound::Upper, 6, 0, 0, Move::NULL);
        tt.store(keys[1], Bound::Exact, 1, 0, 0, Move::NULL);
        tt.store(keys[2], Bound::Upper, 6, 0, 0, Move::NULL);
        tt.store(keys[3], Bound::Upper, 6, 0, 0, Move::NULL);
        tt.new_search();
        tt.store(keys[4], Bound::Upper, 6, 0, 0, Move::NULL);
        assert!(tt.probe(keys[1]).is_some());
        assert_eq!(tt.probe(keys[0]), None);
    }

    #[test]
    fn torn_slot_reads_as_a_miss() {
        let tt = TranspositionTable::new(MIB).unwrap();
        let key = 0xDEAD_BEEF_1234_5678;
        tt.store(key, Bound::Exact, 5, 100, 50, Move::NULL);
        let slot = &tt.cluster(key).unwrap().slots[0];
        slot.data.fetch_xor(1 << 20, Ordering::Relaxed);
        assert_eq!(tt.probe(key), None);
    }

    #[test]
    fn generation_wraps_after_64_searches() {
        let tt = TranspositionTable::new(64).unwrap();
        let keys: Vec<u64> = same_cluster(1, 5).collect();
        tt.store(keys[0], Bound::Lower, 20, 0, 0, Move::NULL);
        for _ in 0..64 {
            tt.new_search();
        }
        assert_eq!(tt.generation(), 0);
        assert_eq!(tt.hashfull(), 1000 / CLUSTER_SLOTS);

        // Sixty-four searches old, the entry competes as a current one: the shallowest
        // current entry goes instead of it.
        for (&key, depth) in keys[1..].iter().zip([2, 3, 4, 5]) {
            tt.store(key, Bound::Lower, depth, 0, 0, Move::NULL);
        }
        assert!(tt.probe(keys[0]).is_some());
        assert_eq!(tt.probe(keys[1]), None);
    }

    #[test]
    fn empty_table_after_failed_alloc_is_inert() {
        let source = Vec::<u8>::new().try_reserve_exact(usize::MAX).unwrap_err();
        let err = TtError::Alloc { clusters: 4, bytes: 256, source };
        assert!(err.to_string().starts_with("cannot allocate 4 clusters (256 bytes)"));

        // The state `alloc` leaves behind when reserving fails.
        let tt = TranspositionTable { clusters: Box::default(), generation: AtomicU8::new(0) };
        assert!(tt.is_empty());
        tt.store(0x1234, Bound::Exact, 10, 100, 90, Move::new(Square::E2, Square::E4));
        assert_eq!(tt.probe(0x1234), None);
        assert_eq!(tt.hashfull(), 0);
        tt.new_search();
        tt.clear();
        assert_eq!(tt.generation(), 0);
        cinder_core::init();
        assert!(tt.get_pv(&mut cinder_core::Game::default(), 8).is_empty());
    }

    #[test]
    fn hashfull_counts_current_generation() {
        let tt = TranspositionTable::new(64 * 1000).unwrap();
        assert_eq!(tt.len(), 512);
        assert_eq!(tt.hashfull(), 0);
        for i in 0..512u64 {
            tt.store(i, Bound::Exact, 1, 0, 0, Move::NULL);
        }
        assert_eq!(tt.hashfull(), 250);
        tt.new_search();
        assert_eq!(tt.hashfull(), 0);
    }
}
