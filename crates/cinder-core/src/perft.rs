//! Perft: leaf counts of the legal move tree, for verifying move generation.

use crate::board::Board;
use crate::movegen::generate_legal_moves;

/// Count leaf nodes at `depth`. Depth 1 is bulk-counted.
pub fn perft(board: &Board, depth: usize) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = generate_legal_moves(board);
    if depth == 1 {
        return moves.len() as u64;
    }
    moves.as_slice().iter().map(|&mv| perft(&board.play(mv), depth - 1)).sum()
}

/// Per-move leaf counts, sorted by move text.
pub fn divide(board: &Board, depth: usize) -> Vec<(String, u64)> {
    let mut results: Vec<(String, u64)> = generate_legal_moves(board)
        .as_slice()
        .iter()
        .map(|&mv| (mv.to_string(), perft(&board.play(mv), depth.saturating_sub(1))))
        .collect();
    results.sort_unstable();
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attacks;

    fn board(fen: &str) -> Board {
        attacks::init();
        fen.parse().unwrap()
    }

    const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
    const POSITION_3: &str = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";
    const POSITION_4: &str = "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1";
    const POSITION_5: &str = "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8";

    #[test]
    fn starting_position() {
        attacks::init();
        let start = Board::starting_position();
        assert_eq!(perft(&start, 0), 1);
        assert_eq!(perft(&start, 1), 20);
        assert_eq!(perft(&start, 2), 400);
        assert_eq!(perft(&start, 3), 8_902);
    }

    #[test]
    fn kiwipete() {
        let b = board(KIWIPETE);
        assert_eq!(perft(&b, 1), 48);
        assert_eq!(perft(&b, 2), 2_039);
        assert_eq!(perft(&b, 3), 97_862);
    }

    #[test]
    fn position_3() {
        let b = board(POSITION_3);
        assert_eq!(perft(&b, 1), 14);
        assert_eq!(perft(&b, 2), 191);
        assert_eq!(perft(&b, 3), 2_812);
        assert_eq!(perft(&b, 4), 43_238);
    }

    #[test]
    fn position_4() {
        let b = board(POSITION_4);
        assert_eq!(perft(&b, 1), 6);
        assert_eq!(perft(&b, 2), 264);
        assert_eq!(perft(&b, 3), 9_467);
    }

    #[test]
    fn position_5() {
        let b = board(POSITION_5);
        assert_eq!(perft(&b, 1), 44);
        assert_eq!(perft(&b, 2), 1_486);
        assert_eq!(perft(&b, 3), 62_379);
    }

    #[test]
    #[ignore] // slow
    fn deep_counts() {
        assert_eq!(perft(&board(KIWIPETE), 4), 4_085_603);
        assert_eq!(perft(&board(POSITION_4), 4), 422_333);
        assert_eq!(perft(&board(POSITION_5), 4), 2_103_487);
    }

    #[test]
    fn divide_sums_to_perft() {
        let b = board(KIWIPETE);
        let results = divide(&b, 2);
        assert_eq!(results.len(), 48);
        assert_eq!(results.iter().map(|(_, n)| n).sum::<u64>(), 2_039);
        assert!(results.windows(2).all(|w| w[0].0 <= w[1].0));
    }
}
