//! Incremental merge of extraction results into the key table.
mod coordinator;
mod emit;

pub use coordinator::{
    CoordinatorState,
    FlushDecision,
    MergeCoordinator,
    MergeOutcome,
};
pub use emit::{
    EmitHandle,
    FileExtraction,
};
