//! Attack generation and board geometry.
//!
//! Every table is built once by [`init`]. Lookups made before `init` are a contract
//! violation and panic when debug assertions are enabled.

mod magic;
mod magic_data;
mod tables;

use std::sync::OnceLock;

use tracing::debug;

use crate::bitboard::Bitboard;
use crate::color::Color;
use crate::piece_kind::PieceKind;
use crate::square::Square;

use self::magic::{Slider, SliderTable};
use self::tables::{Geometry, Leapers, PawnMasks};

struct Tables {
    leapers: Leapers,
    geometry: Geometry,
    pawn_masks: PawnMasks,
    bishop: SliderTable,
    rook: SliderTable,
    bishop_pseudo: [Bitboard; 64],
    rook_pseudo: [Bitboard; 64],
}

impl Tables {
    fn build() -> Tables {
        let bishop = SliderTable::build(Slider::Bishop);
        let rook = SliderTable::build(Slider::Rook);
        let mut bishop_pseudo = [Bitboard::EMPTY; 64];
        let mut rook_pseudo = [Bitboard::EMPTY; 64];
        for sq in Square::all() {
            bishop_pseudo[sq.index()] = bishop.attacks(sq, Bitboard::EMPTY);
            rook_pseudo[sq.index()] = rook.attacks(sq, Bitboard::EMPTY);
        }
        debug!(
            bishop_slots = bishop.len(),
            rook_slots = rook.len(),
            "attack tables built"
        );
        Tables {
            leapers: Leapers::build(),
            geometry: Geometry::build(),
            pawn_masks: PawnMasks::build(),
            bishop,
            rook,
            bishop_pseudo,
            rook_pseudo,
        }
    }
}

static TABLES: OnceLock<Tables> = OnceLock::new();

/// Build all attack and geometry tables. Idempotent and thread-safe.
pub fn init() {
    TABLES.get_or_init(Tables::build);
}

#[inline(always)]
fn tables() -> &'static Tables {
    debug_assert!(TABLES.get().is_some(), "attack tables used before attacks::init()");
    TABLES.get_or_init(Tables::build)
}

#[inline]
pub fn knight_attacks(sq: Square) -> Bitboard {
    tables().leapers.knight[sq.index()]
}

#[inline]
pub fn king_attacks(sq: Square) -> Bitboard {
    tables().leapers.king[sq.index()]
}

/// Squares a pawn of `color` standing on `sq` captures on.
#[inline]
pub fn pawn_attacks(color: Color, sq: Square) -> Bitboard {
    tables().leapers.pawn[color.index()][sq.index()]
}

#[inline]
pub fn bishop_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    tables().bishop.attacks(sq, occupied)
}

#[inline]
pub fn rook_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    tables().rook.attacks(sq, occupied)
}

#[inline]
pub fn queen_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    bishop_attacks(sq, occupied) | rook_attacks(sq, occupied)
}

/// Bishop attacks on an empty board.
#[inline]
pub fn bishop_pseudo_attacks(sq: Square) -> Bitboard {
    tables().bishop_pseudo[sq.index()]
}

/// Rook attacks on an empty board.
#[inline]
pub fn rook_pseudo_attacks(sq: Square) -> Bitboard {
    tables().rook_pseudo[sq.index()]
}

/// Attacks of any piece; `color` only matters for pawns.
#[inline]
pub fn piece_attacks(kind: PieceKind, color: Color, sq: Square, occupied: Bitboard) -> Bitboard {
    match kind {
        PieceKind::Pawn => pawn_attacks(color, sq),
        PieceKind::Knight => knight_attacks(sq),
        PieceKind::Bishop => bishop_attacks(sq, occupied),
        PieceKind::Rook => rook_attacks(sq, occupied),
        PieceKind::Queen => queen_attacks(sq, occupied),
        PieceKind::King => king_attacks(sq),
    }
}

/// The segment `]s1, s2]`: squares after `s1` up to and including `s2` when the two
/// share a rank, file or diagonal; empty otherwise.
#[inline]
pub fn segment_between(s1: Square, s2: Square) -> Bitboard {
    tables().geometry.segment[s1.index()][s2.index()]
}

/// Half-line from `s1` through `s2` to the board edge (`s1` excluded); empty when
/// the squares are not aligned.
#[inline]
pub fn ray_direction(s1: Square, s2: Square) -> Bitboard {
    tables().geometry.direction[s1.index()][s2.index()]
}

/// Every rank strictly ahead of `rank` from `color`'s point of view.
#[inline]
pub fn in_front(color: Color, rank: u8) -> Bitboard {
    tables().pawn_masks.in_front[color.index()][rank as usize]
}

/// The files on either side of `file`.
#[inline]
pub fn adjacent_files(file: u8) -> Bitboard {
    tables().pawn_masks.adjacent_files[file as usize]
}

/// Squares ahead of `sq` on its own file.
#[inline]
pub fn squares_in_front(color: Color, sq: Square) -> Bitboard {
    tables().pawn_masks.squares_in_front[color.index()][sq.index()]
}

/// Squares ahead of `sq` on the adjacent files: where enemy pawns could stop or
/// capture a pawn on `sq`.
#[inline]
pub fn pawn_span(color: Color, sq: Square) -> Bitboard {
    tables().pawn_masks.pawn_span[color.index()][sq.index()]
}

/// Pawn shield of a king on `sq`: its own and adjacent files on the two ranks ahead.
#[inline]
pub fn shield(color: Color, sq: Square) -> Bitboard {
    tables().pawn_masks.shield[color.index()][sq.index()]
}

#[cfg(test)]
mod tests {
    use super::magic::{Slider, subsets};
    use super::*;

    fn lcg(state: &mut u64) -> u64 {
        *state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        *state
    }

    #[test]
    fn leaper_spot_checks() {
        init();
        assert_eq!(knight_attacks(Square::E4).count(), 8);
        assert_eq!(knight_attacks(Square::A1).count(), 2);
        assert_eq!(king_attacks(Square::E1).count(), 5);
        assert_eq!(king_attacks(Square::H8).count(), 3);
    }

    #[test]
    fn pawn_attacks_do_not_wrap() {
        init();
        assert_eq!(pawn_attacks(Color::White, Square::A4), Square::B5.bitboard());
        assert_eq!(pawn_attacks(Color::White, Square::H4), Square::G5.bitboard());
        assert_eq!(
            pawn_attacks(Color::Black, Square::E5),
            Square::D4.bitboard() | Square::F4.bitboard()
        );
    }

    #[test]
    fn sliders_on_empty_board() {
        init();
        for sq in Square::all() {
            assert_eq!(rook_attacks(sq, Bitboard::EMPTY).count(), 14);
            assert_eq!(rook_pseudo_attacks(sq), rook_attacks(sq, Bitboard::EMPTY));
        }
        assert_eq!(bishop_attacks(Square::D4, Bitboard::EMPTY).count(), 13);
        assert_eq!(bishop_pseudo_attacks(Square::A1).count(), 7);
    }

    #[test]
    fn magic_lookup_matches_ray_trace_on_every_relevant_subset_sample() {
        init();
        for slider in [Slider::Bishop, Slider::Rook] {
            for sq in Square::all() {
                // Every 7th subset of the relevant mask, plus the two extremes.
                let mask = slider.relevant_mask(sq);
                for (i, occ) in subsets(mask).enumerate() {
                    if i % 7 != 0 && occ != mask {
                        continue;
                    }
                    let looked_up = match slider {
                        Slider::Bishop => bishop_attacks(sq, occ),
                        Slider::Rook => rook_attacks(sq, occ),
                    };
                    assert_eq!(looked_up, slider.trace(sq, occ), "{slider:?} on {sq}");
                }
            }
        }
    }

    #[test]
    fn magic_lookup_matches_ray_trace_on_random_boards() {
        init();
        let mut state = 0xDEAD_BEEF_1234_5678u64;
        for sq in Square::all() {
            for _ in 0..128 {
                let occ = Bitboard::new(lcg(&mut state) & lcg(&mut state));
                assert_eq!(rook_attacks(sq, occ), Slider::Rook.trace(sq, occ));
                assert_eq!(bishop_attacks(sq, occ), Slider::Bishop.trace(sq, occ));
                assert_eq!(
                    queen_attacks(sq, occ),
                    piece_attacks(PieceKind::Queen, Color::White, sq, occ)
                );
            }
        }
    }

    #[test]
    fn segment_is_open_closed() {
        init();
        assert_eq!(
            segment_between(Square::E1, Square::E4),
            Square::E2.bitboard() | Square::E3.bitboard() | Square::E4.bitboard()
        );
        assert_eq!(segment_between(Square::A1, Square::H8).count(), 7);
        assert_eq!(segment_between(Square::E4, Square::F5), Square::F5.bitboard());
        assert!(segment_between(Square::A1, Square::B3).is_empty());
        assert!(segment_between(Square::C3, Square::C3).is_empty());
    }

    #[test]
    fn direction_runs_to_the_edge() {
        init();
        assert_eq!(
            ray_direction(Square::E4, Square::E5),
            Square::E5.bitboard() | Square::E6.bitboard() | Square::E7.bitboard() | Square::E8.bitboard()
        );
        assert_eq!(ray_direction(Square::C3, Square::A1), Square::B2.bitboard() | Square::A1.bitboard());
        assert!(ray_direction(Square::A1, Square::B3).is_empty());
    }

    #[test]
    fn geometry_is_consistent_with_sliders() {
        init();
        for s1 in Square::all() {
            for s2 in Square::all() {
                let seg = segment_between(s1, s2);
                if seg.is_nonempty() {
                    assert!(seg.contains(s2));
                    assert!(!seg.contains(s1));
                    assert_eq!(seg & ray_direction(s1, s2), seg);
                    // With everything between them empty, s1 attacks s2 as a queen.
                    assert!(queen_attacks(s1, s2.bitboard()).contains(s2));
                }
            }
        }
    }

    #[test]
    fn pawn_structure_masks() {
        init();
        assert_eq!(in_front(Color::White, 6), Bitboard::RANK_8);
        assert_eq!(in_front(Color::Black, 1), Bitboard::RANK_1);
        assert!(in_front(Color::White, 7).is_empty());
        assert_eq!(adjacent_files(0), Bitboard::file(1));
        assert_eq!(adjacent_files(4), Bitboard::file(3) | Bitboard::file(5));

        let front = squares_in_front(Color::White, Square::E5);
        assert_eq!(front, Square::E6.bitboard() | Square::E7.bitboard() | Square::E8.bitboard());

        let span = pawn_span(Color::Black, Square::B3);
        assert_eq!(
            span,
            Square::A2.bitboard() | Square::A1.bitboard() | Square::C2.bitboard() | Square::C1.bitboard()
        );

        assert_eq!(shield(Color::White, Square::G1).count(), 6);
        assert!(shield(Color::White, Square::G1).contains(Square::H3));
        assert_eq!(shield(Color::Black, Square::A8).count(), 4);
        assert!(shield(Color::White, Square::E8).is_empty());
    }
}
