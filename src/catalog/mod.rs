//! Translation key bookkeeping: key table, delta set and reference merging.
mod delta;
mod references;
mod table;

pub use delta::DeltaSet;
pub use references::{
    file_portion,
    merge_references,
};
pub use table::{
    IngestOutcome,
    KeyTable,
};
