//! Castling rights as a 4-bit set.

use std::fmt;
use std::ops::{BitAnd, BitOr, Not};

use crate::color::Color;
use crate::error::FenError;
use crate::square::Square;

/// Which wing a castling move goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastleSide {
    KingSide,
    QueenSide,
}

impl CastleSide {
    pub const ALL: [CastleSide; 2] = [CastleSide::KingSide, CastleSide::QueenSide];

    /// King origin and destination.
    pub const fn king_squares(self, color: Color) -> (Square, Square) {
        match (color, self) {
            (Color::White, CastleSide::KingSide) => (Square::E1, Square::G1),
            (Color::White, CastleSide::QueenSide) => (Square::E1, Square::C1),
            (Color::Black, CastleSide::KingSide) => (Square::E8, Square::G8),
            (Color::Black, CastleSide::QueenSide) => (Square::E8, Square::C8),
        }
    }

    /// Rook origin and destination.
    pub const fn rook_squares(self, color: Color) -> (Square, Square) {
        match (color, self) {
            (Color::White, CastleSide::KingSide) => (Square::H1, Square::F1),
            (Color::White, CastleSide::QueenSide) => (Square::A1, Square::D1),
            (Color::Black, CastleSide::KingSide) => (Square::H8, Square::F8),
            (Color::Black, CastleSide::QueenSide) => (Square::A8, Square::D8),
        }
    }

    /// The wing a king move to `king_dst` castles towards.
    pub const fn from_king_dest(king_dst: Square) -> CastleSide {
        if king_dst.file() > 4 { CastleSide::KingSide } else { CastleSide::QueenSide }
    }
}

/// Castling rights: bit 0 = White king side, 1 = White queen side, 2 = Black king
/// side, 3 = Black queen side. Sixteen subsets, one Zobrist key each.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CastleRights(u8);

impl CastleRights {
    pub const NONE: CastleRights = CastleRights(0);
    pub const ALL: CastleRights = CastleRights(0b1111);

    pub const WHITE_KING: CastleRights = CastleRights(0b0001);
    pub const WHITE_QUEEN: CastleRights = CastleRights(0b0010);
    pub const BLACK_KING: CastleRights = CastleRights(0b0100);
    pub const BLACK_QUEEN: CastleRights = CastleRights(0b1000);

    #[inline]
    pub const fn new(bits: u8) -> CastleRights {
        CastleRights(bits & 0b1111)
    }

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn contains(self, other: CastleRights) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn remove(self, other: CastleRights) -> CastleRights {
        CastleRights(self.0 & !other.0)
    }

    #[inline]
    pub const fn flag(color: Color, side: CastleSide) -> CastleRights {
        match (color, side) {
            (Color::White, CastleSide::KingSide) => Self::WHITE_KING,
            (Color::White, CastleSide::QueenSide) => Self::WHITE_QUEEN,
            (Color::Black, CastleSide::KingSide) => Self::BLACK_KING,
            (Color::Black, CastleSide::QueenSide) => Self::BLACK_QUEEN,
        }
    }

    #[inline]
    pub const fn has(self, color: Color, side: CastleSide) -> bool {
        self.contains(Self::flag(color, side))
    }

    /// Rights lost when any piece leaves or lands on `sq`.
    #[inline]
    pub const fn revoked_by(sq: Square) -> CastleRights {
        match sq {
            Square::E1 => CastleRights(0b0011),
            Square::H1 => Self::WHITE_KING,
            Square::A1 => Self::WHITE_QUEEN,
            Square::E8 => CastleRights(0b1100),
            Square::H8 => Self::BLACK_KING,
            Square::A8 => Self::BLACK_QUEEN,
            _ => Self::NONE,
        }
    }

    /// Parse the FEN castling field ("KQkq", "Kq", "-").
    pub fn from_fen(s: &str) -> Result<CastleRights, FenError> {
        if s == "-" {
            return Ok(CastleRights::NONE);
        }
        s.chars().try_fold(CastleRights::NONE, |rights, c| {
            let flag = match c {
                'K' => Self::WHITE_KING,
                'Q' => Self::WHITE_QUEEN,
                'k' => Self::BLACK_KING,
                'q' => Self::BLACK_QUEEN,
                _ => return Err(FenError::InvalidCastlingChar { character: c }),
            };
            Ok(rights | flag)
        })
    }
}

impl BitAnd for CastleRights {
    type Output = CastleRights;
    #[inline]
    fn bitand(self, rhs: CastleRights) -> CastleRights {
        CastleRights(self.0 & rhs.0)
    }
}

impl BitOr for CastleRights {
    type Output = CastleRights;
    #[inline]
    fn bitor(self, rhs: CastleRights) -> CastleRights {
        CastleRights(self.0 | rhs.0)
    }
}

impl Not for CastleRights {
    type Output = CastleRights;
    #[inline]
    fn not(self) -> CastleRights {
        CastleRights(!self.0 & 0b1111)
    }
}

impl fmt::Display for CastleRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("-");
        }
        for (flag, c) in [
            (Self::WHITE_KING, 'K'),
            (Self::WHITE_QUEEN, 'Q'),
            (Self::BLACK_KING, 'k'),
            (Self::BLACK_QUEEN, 'q'),
        ] {
            if self.contains(flag) {
                write!(f, "{c}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for CastleRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CastleRights({self})")
    }
}
