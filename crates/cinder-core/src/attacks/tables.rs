//! Occupancy-independent tables: leaper attacks, square-pair geometry and
//! pawn-structure masks.

use crate::bitboard::Bitboard;
use crate::color::Color;
use crate::square::Square;

const KNIGHT_DELTAS: [(i8, i8); 8] =
    [(1, 2), (2, 1), (2, -1), (1, -2), (-1, -2), (-2, -1), (-2, 1), (-1, 2)];
const KING_DELTAS: [(i8, i8); 8] =
    [(0, 1), (1, 1), (1, 0), (1, -1), (0, -1), (-1, -1), (-1, 0), (-1, 1)];

fn leaper(sq: Square, deltas: &[(i8, i8)]) -> Bitboard {
    deltas
        .iter()
        .filter_map(|&(df, dr)| sq.offset(df, dr))
        .fold(Bitboard::EMPTY, |bb, to| bb.with(to))
}

/// Unit step from `from` towards `to`, if the two share a rank, file or diagonal.
fn alignment(from: Square, to: Square) -> Option<(i8, i8)> {
    if from == to {
        return None;
    }
    let df = to.file() as i8 - from.file() as i8;
    let dr = to.rank() as i8 - from.rank() as i8;
    if df == 0 || dr == 0 || df.abs() == dr.abs() {
        Some((df.signum(), dr.signum()))
    } else {
        None
    }
}

pub(crate) struct Leapers {
    pub(crate) knight: [Bitboard; 64],
    pub(crate) king: [Bitboard; 64],
    pub(crate) pawn: [[Bitboard; 64]; 2],
}

impl Leapers {
    pub(crate) fn build() -> Leapers {
        let mut leapers = Leapers {
            knight: [Bitboard::EMPTY; 64],
            king: [Bitboard::EMPTY; 64],
            pawn: [[Bitboard::EMPTY; 64]; 2],
        };
        for sq in Square::all() {
            let i = sq.index();
            leapers.knight[i] = leaper(sq, &KNIGHT_DELTAS);
            leapers.king[i] = leaper(sq, &KING_DELTAS);
            leapers.pawn[Color::White.index()][i] = leaper(sq, &[(-1, 1), (1, 1)]);
            leapers.pawn[Color::Black.index()][i] = leaper(sq, &[(-1, -1), (1, -1)]);
        }
        leapers
    }
}

/// Per square-pair geometry, 64 x 64 bitboards each.
pub(crate) struct Geometry {
    /// `]s1, s2]`: the squares after `s1` up to and including `s2`.
    pub(crate) segment: Box<[[Bitboard; 64]; 64]>,
    /// Half-line from `s1` through `s2` to the edge, `s1` excluded.
    pub(crate) direction: Box<[[Bitboard; 64]; 64]>,
}

impl Geometry {
    pub(crate) fn build() -> Geometry {
        let mut segment = Box::new([[Bitboard::EMPTY; 64]; 64]);
        let mut direction = Box::new([[Bitboard::EMPTY; 64]; 64]);

        for s1 in Square::all() {
            for s2 in Square::all() {
                let Some((df, dr)) = alignment(s1, s2) else {
                    continue;
                };
                let mut cur = s1;
                let mut reached = false;
                while let Some(next) = cur.offset(df, dr) {
                    if !reached {
                        segment[s1.index()][s2.index()].set(next);
                        reached = next == s2;
                    }
                    direction[s1.index()][s2.index()].set(next);
                    cur = next;
                }
            }
        }

        Geometry { segment, direction }
    }
}

/// Masks used by pawn-structure evaluation.
pub(crate) struct PawnMasks {
    /// Ranks strictly in front of a rank, from the colour's point of view.
    pub(crate) in_front: [[Bitboard; 8]; 2],
    pub(crate) adjacent_files: [Bitboard; 8],
    pub(crate) squares_in_front: [[Bitboard; 64]; 2],
    pub(crate) pawn_span: [[Bitboard; 64]; 2],
    pub(crate) shield: [[Bitboard; 64]; 2],
}

impl PawnMasks {
    pub(crate) fn build() -> PawnMasks {
        let mut masks = PawnMasks {
            in_front: [[Bitboard::EMPTY; 8]; 2],
            adjacent_files: [Bitboard::EMPTY; 8],
            squares_in_front: [[Bitboard::EMPTY; 64]; 2],
            pawn_span: [[Bitboard::EMPTY; 64]; 2],
            shield: [[Bitboard::EMPTY; 64]; 2],
        };

        for rank in 0..8u8 {
            for ahead in rank + 1..8 {
                masks.in_front[Color::White.index()][rank as usize] |= Bitboard::rank(ahead);
            }
            for behind in 0..rank {
                masks.in_front[Color::Black.index()][rank as usize] |= Bitboard::rank(behind);
            }
        }

        for file in 0..8u8 {
            let mut adjacent = Bitboard::EMPTY;
            if file > 0 {
                adjacent |= Bitboard::file(file - 1);
            }
            if file < 7 {
                adjacent |= Bitboard::file(file + 1);
            }
            masks.adjacent_files[file as usize] = adjacent;
        }

        for color in Color::ALL {
            let c = color.index();
            let step = color.push_offset() / 8;
            for sq in Square::all() {
                let i = sq.index();
                let ahead = masks.in_front[c][sq.rank() as usize];
                let file = Bitboard::file(sq.file());
                let adjacent = masks.adjacent_files[sq.file() as usize];

                masks.squares_in_front[c][i] = file & ahead;
                masks.pawn_span[c][i] = adjacent & ahead;

                let band = file | adjacent;
                for dist in 1..=2i8 {
                    let rank = sq.rank() as i8 + step * dist;
                    if (0..8).contains(&rank) {
                        masks.shield[c][i] |= band & Bitboard::rank(rank as u8);
                    }
                }
            }
        }

        masks
    }
}
