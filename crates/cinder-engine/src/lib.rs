//! Search-side storage for cinder: the shared transposition table, principal
//! variation reconstruction and the `Hash` option that sizes the table.

mod error;
mod options;
mod pv;
mod tt;

pub use error::{OptionError, TtError};
pub use options::SpinOption;
pub use pv::{PvBoard, Rollback};
pub use tt::{Bound, CLUSTER_SLOTS, TranspositionTable, TtEntry};
