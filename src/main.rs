use anyhow::{Context, Result};
use tracing::{info, warn};

use cinder_core::{Board, STARTING_FEN};
use cinder_engine::{SpinOption, TranspositionTable};

/// `cinder [depth] [fen]`: allocate the table sized by `CINDER_HASH` (MiB) and
/// print a perft divide.
fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    cinder_core::init();

    let mut hash = SpinOption::hash();
    if let Ok(text) = std::env::var("CINDER_HASH") {
        if let Err(error) = hash.set_str(&text) {
            warn!(%error, "keeping default hash size");
        }
    }
    let tt = TranspositionTable::new(hash.hash_bytes())?;
    info!(clusters = tt.len(), "cinder starting");
    println!("{hash}");

    let mut args = std::env::args().skip(1);
    let depth: usize = match args.next() {
        Some(text) => text.parse().with_context(|| format!("invalid depth {text:?}"))?,
        None => 4,
    };
    let rest = args.collect::<Vec<_>>().join(" ");
    let fen = if rest.is_empty() { STARTING_FEN } else { rest.as_str() };
    let board: Board = fen.parse().with_context(|| format!("invalid FEN {fen:?}"))?;

    let mut total = 0;
    for (mv, nodes) in cinder_core::divide(&board, depth) {
        println!("{mv}: {nodes}");
        total += nodes;
    }
    println!("\nNodes searched: {total}");
    Ok(())
}
