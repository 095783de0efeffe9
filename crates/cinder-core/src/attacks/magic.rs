//! Magic bitboards for sliding pieces.
//!
//! For each square the relevant occupancy (ray squares that can block, minus the
//! board edge at the end of each ray) is hashed with `(occ * magic) >> shift` into a
//! per-square slice of one shared attack table.

use tracing::warn;

use crate::bitboard::Bitboard;
use crate::prng::Xorshift;
use crate::square::Square;

use super::magic_data::{BISHOP_MAGICS, ROOK_MAGICS};

/// The two sliding movement patterns. Queens combine both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slider {
    Bishop,
    Rook,
}

impl Slider {
    const fn directions(self) -> [(i8, i8); 4] {
        match self {
            Slider::Bishop => [(1, 1), (-1, 1), (1, -1), (-1, -1)],
            Slider::Rook => [(0, 1), (0, -1), (1, 0), (-1, 0)],
        }
    }

    const fn precomputed(self) -> &'static [u64; 64] {
        match self {
            Slider::Bishop => &BISHOP_MAGICS,
            Slider::Rook => &ROOK_MAGICS,
        }
    }

    const fn search_seed(self) -> u64 {
        match self {
            Slider::Bishop => 0x2545_F491_4F6C_DD1D,
            Slider::Rook => 0x9E37_79B9_7F4A_7C15,
        }
    }

    /// Ray-trace the attack set from `sq`; each ray stops on, and includes, the first
    /// occupied square.
    pub(crate) fn trace(self, sq: Square, occupied: Bitboard) -> Bitboard {
        let mut attacks = Bitboard::EMPTY;
        for (df, dr) in self.directions() {
            let mut cur = sq;
            while let Some(next) = cur.offset(df, dr) {
                attacks.set(next);
                if occupied.contains(next) {
                    break;
                }
                cur = next;
            }
        }
        attacks
    }

    /// Squares whose occupancy can change the attack set from `sq`.
    pub(crate) fn relevant_mask(self, sq: Square) -> Bitboard {
        let mut mask = Bitboard::EMPTY;
        for (df, dr) in self.directions() {
            let mut cur = sq;
            while let Some(next) = cur.offset(df, dr) {
                // The last square before the edge blocks nothing beyond itself.
                if next.offset(df, dr).is_some() {
                    mask.set(next);
                }
                cur = next;
            }
        }
        mask
    }

    /// Every relevant occupancy of `sq` paired with its traced attack set.
    fn occupancies(self, sq: Square, mask: Bitboard) -> Vec<(Bitboard, Bitboard)> {
        subsets(mask).map(|occ| (occ, self.trace(sq, occ))).collect()
    }
}

/// Every subset of `mask`, starting with the empty set (carry-rippler enumeration).
pub(crate) fn subsets(mask: Bitboard) -> impl Iterator<Item = Bitboard> {
    let mask = mask.inner();
    let mut next = Some(0u64);
    std::iter::from_fn(move || {
        let current = next?;
        let following = current.wrapping_sub(mask) & mask;
        next = (following != 0).then_some(following);
        Some(Bitboard::new(current))
    })
}

#[inline(always)]
fn slot(relevant: Bitboard, magic: u64, shift: u32) -> usize {
    (relevant.inner().wrapping_mul(magic) >> shift) as usize
}

/// Populate `table` through `magic`. Returns `false` on a destructive collision,
/// i.e. two occupancies with different attack sets hashing to one slot.
///
/// Slider attack sets are never empty, so `EMPTY` marks a free slot.
fn try_fill(
    table: &mut [Bitboard],
    magic: u64,
    shift: u32,
    occupancies: &[(Bitboard, Bitboard)],
) -> bool {
    table.fill(Bitboard::EMPTY);
    for &(occ, attacks) in occupancies {
        let entry = &mut table[slot(occ, magic, shift)];
        if entry.is_empty() {
            *entry = attacks;
        } else if *entry != attacks {
            return false;
        }
    }
    true
}

fn search_magic(
    table: &mut [Bitboard],
    mask: Bitboard,
    shift: u32,
    occupancies: &[(Bitboard, Bitboard)],
    rng: &mut Xorshift,
) -> u64 {
    loop {
        let magic = rng.sparse_u64();
        // Reject multipliers that scatter too few mask bits into the index bits.
        if (mask.inner().wrapping_mul(magic) >> 56).count_ones() < 6 {
            continue;
        }
        if try_fill(table, magic, shift, occupancies) {
            return magic;
        }
    }
}

/// Search a magic multiplier for `sq` from scratch.
pub(crate) fn find_magic(slider: Slider, sq: Square, rng: &mut Xorshift) -> u64 {
    let mask = slider.relevant_mask(sq);
    let shift = 64 - mask.count();
    let occupancies = slider.occupancies(sq, mask);
    let mut table = vec![Bitboard::EMPTY; 1usize << mask.count()];
    search_magic(&mut table, mask, shift, &occupancies, rng)
}

#[derive(Debug, Clone, Copy)]
struct Magic {
    mask: Bitboard,
    magic: u64,
    shift: u32,
    offset: usize,
}

impl Magic {
    const UNSET: Magic = Magic { mask: Bitboard::EMPTY, magic: 0, shift: 0, offset: 0 };

    #[inline(always)]
    fn index(&self, occupied: Bitboard) -> usize {
        self.offset + slot(occupied & self.mask, self.magic, self.shift)
    }
}

/// Magic parameters for all 64 squares plus the attack table they index.
pub(crate) struct SliderTable {
    magics: [Magic; 64],
    attacks: Box<[Bitboard]>,
}

impl SliderTable {
    pub(crate) fn build(slider: Slider) -> SliderTable {
        let mut rng = Xorshift::new(slider.search_seed());
        let mut magics = [Magic::UNSET; 64];
        let mut attacks = Vec::new();
        let mut replaced = 0u32;

        for sq in Square::all() {
            let mask = slider.relevant_mask(sq);
            let shift = 64 - mask.count();
            let occupancies = slider.occupancies(sq, mask);
            let mut table = vec![Bitboard::EMPTY; 1usize << mask.count()];

            let mut magic = slider.precomputed()[sq.index()];
            if !try_fill(&mut table, magic, shift, &occupancies) {
                magic = search_magic(&mut table, mask, shift, &occupancies, &mut rng);
                replaced += 1;
            }

            magics[sq.index()] = Magic { mask, magic, shift, offset: attacks.len() };
            attacks.extend_from_slice(&table);
        }

        if replaced > 0 {
            warn!(?slider, replaced, "precomputed magics collided, searched replacements");
        }

        SliderTable { magics, attacks: attacks.into_boxed_slice() }
    }

    #[inline]
    pub(crate) fn attacks(&self, sq: Square, occupied: Bitboard) -> Bitboard {
        self.attacks[self.magics[sq.index()].index(occupied)]
    }

    /// Total number of attack slots across all squares.
    pub(crate) fn len(&self) -> usize {
        self.attacks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relevant_mask_sizes() {
        assert_eq!(Slider::Rook.relevant_mask(Square::A1).count(), 12);
        assert_eq!(Slider::Rook.relevant_mask(Square::E4).count(), 10);
        assert_eq!(Slider::Bishop.relevant_mask(Square::A1).count(), 6);
        assert_eq!(Slider::Bishop.relevant_mask(Square::D4).count(), 9);
        assert!(!Slider::Rook.relevant_mask(Square::A1).contains(Square::A8));
        assert!(!Slider::Rook.relevant_mask(Square::A1).contains(Square::H1));
    }

    #[test]
    fn subsets_enumerates_power_set() {
        let mask = Square::B2.bitboard() | Square::C5.bitboard() | Square::G7.bitboard();
        let all: Vec<_> = subsets(mask).collect();
        assert_eq!(all.len(), 8);
        assert_eq!(all[0], Bitboard::EMPTY);
        assert!(all.iter().all(|s| (*s & !mask).is_empty()));
    }

    #[test]
    fn trace_stops_at_first_blocker() {
        let occ = Square::E6.bitboard() | Square::G4.bitboard();
        let attacks = Slider::Rook.trace(Square::E4, occ);
        assert!(attacks.contains(Square::E6));
        assert!(!attacks.contains(Square::E7));
        assert!(attacks.contains(Square::G4));
        assert!(!attacks.contains(Square::H4));
        assert!(attacks.contains(Square::E1));
    }

    #[test]
    fn precomputed_magics_are_collision_free() {
        for slider in [Slider::Bishop, Slider::Rook] {
            for sq in Square::all() {
                let mask = slider.relevant_mask(sq);
                let occupancies = slider.occupancies(sq, mask);
                let mut table = vec![Bitboard::EMPTY; 1usize << mask.count()];
                assert!(
                    try_fill(&mut table, slider.precomputed()[sq.index()], 64 - mask.count(), &occupancies),
                    "{slider:?} magic for {sq} collides"
                );
            }
        }
    }

    #[test]
    fn searched_magic_is_valid() {
        let mut rng = Xorshift::new(0xC0FF_EE00_1234_5678);
        for (slider, sq) in [(Slider::Bishop, Square::C1), (Slider::Rook, Square::D4)] {
            let magic = find_magic(slider, sq, &mut rng);
            let mask = slider.relevant_mask(sq);
            let occupancies = slider.occupancies(sq, mask);
            let mut table = vec![Bitboard::EMPTY; 1usize << mask.count()];
            assert!(try_fill(&mut table, magic, 64 - mask.count(), &occupancies));
        }
    }
}
