//! Index builder: walks the source tree, dispatches to parsers,
//! enriches, and persists.

mod builder;

pub use builder::{IndexBuilder, IndexStatistics};
