//! Zobrist keys.
//!
//! A position's key is the XOR of one key per piece on the board, the turn key when
//! Black is to move, the en-passant key of the target square when an en-passant
//! capture is available, and the key of the current castling-rights subset.

use crate::castle_rights::CastleRights;
use crate::color::Color;
use crate::piece_kind::PieceKind;
use crate::prng::xorshift64;
use crate::square::Square;

const SEED: u64 = 0x4349_4E44_4552_4B59;

struct Keys {
    piece: [[[u64; 64]; PieceKind::COUNT]; Color::COUNT],
    turn: u64,
    en_passant: [u64; 64],
    castling: [u64; 16],
}

impl Keys {
    /// Draw every key from one xorshift stream, in declaration order.
    const fn generate() -> Keys {
        let mut keys = Keys {
            piece: [[[0; 64]; PieceKind::COUNT]; Color::COUNT],
            turn: 0,
            en_passant: [0; 64],
            castling: [0; 16],
        };
        let mut state = SEED;

        let mut color = 0;
        while color < Color::COUNT {
            let mut kind = 0;
            while kind < PieceKind::COUNT {
                let mut sq = 0;
                while sq < 64 {
                    state = xorshift64(state);
                    keys.piece[color][kind][sq] = state;
                    sq += 1;
                }
                kind += 1;
            }
            color += 1;
        }

        state = xorshift64(state);
        keys.turn = state;

        let mut sq = 0;
        while sq < 64 {
            state = xorshift64(state);
            keys.en_passant[sq] = state;
            sq += 1;
        }

        let mut rights = 0;
        while rights < 16 {
            state = xorshift64(state);
            keys.castling[rights] = state;
            rights += 1;
        }

        keys
    }
}

static KEYS: Keys = Keys::generate();

/// Key of a `color` `kind` standing on `sq`.
#[inline]
pub fn piece_key(color: Color, kind: PieceKind, sq: Square) -> u64 {
    KEYS.piece[color.index()][kind.index()][sq.index()]
}

/// Key folded in while Black is to move.
#[inline]
pub fn turn_key() -> u64 {
    KEYS.turn
}

/// Key of an available en-passant capture onto `sq`.
#[inline]
pub fn en_passant_key(sq: Square) -> u64 {
    KEYS.en_passant[sq.index()]
}

/// Key of a castling-rights subset.
#[inline]
pub fn castling_key(rights: CastleRights) -> u64 {
    KEYS.castling[rights.bits() as usize]
}
