//! Incremental merge coordinator state machine.

use super::emit::EmitHandle;
use crate::catalog::KeyTable;
use crate::config::FlushPolicy;

/// Phase of the current compilation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordinatorState {
    /// Between passes.
    #[default]
    Idle,
    /// Module-loaded results are being buffered.
    Collecting,
    /// The buffer is being folded into the key table.
    Merging,
    /// The pass merged new data that must be flushed.
    FlushRequired,
    /// The pass merged nothing worth flushing.
    NoFlushNeeded,
}

/// Whether the merged pass needs a catalog flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushDecision {
    /// Write catalogs and artifacts.
    Flush,
    /// Leave everything on disk as it is.
    Skip,
}

impl FlushDecision {
    /// Returns true for [`FlushDecision::Flush`].
    #[must_use]
    pub const fn is_flush(self) -> bool {
        matches!(self, Self::Flush)
    }
}

/// Summary of one merge step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Buffered file results that were merged.
    pub files: usize,
    /// (key, context) pairs first seen in this pass.
    pub new_pairs: usize,
    /// Whether the catalogs must be flushed.
    pub decision: FlushDecision,
}

/// Sequences collecting, merging and the flush decision of each pass.
///
/// The key table is only borrowed mutably inside [`MergeCoordinator::merge`],
/// so no extraction can observe it half-merged.
#[derive(Debug)]
pub struct MergeCoordinator {
    /// Current lifecycle state.
    state: CoordinatorState,
    /// Extractions of the running pass.
    pending: EmitHandle,
    /// How the flush decision is made.
    policy: FlushPolicy,
    /// Table generation at the end of the last pass.
    flushed_generation: u64,
}

impl MergeCoordinator {
    /// Creates an idle coordinator.
    #[must_use]
    pub fn new(policy: FlushPolicy) -> Self {
        Self {
            state: CoordinatorState::Idle,
            pending: EmitHandle::new(),
            policy,
            flushed_generation: 0,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> CoordinatorState {
        self.state
    }

    /// The configured flush policy.
    #[must_use]
    pub const fn policy(&self) -> FlushPolicy {
        self.policy
    }

    /// Handle for module-loaded callbacks of the current build.
    #[must_use]
    pub fn emitter(&self) -> EmitHandle {
        self.pending.clone()
    }

    /// Enters `Collecting`. A pass already in progress keeps its buffer.
    pub fn begin_pass(&mut self) {
        if self.state == CoordinatorState::Idle {
            tracing::debug!("Collecting extraction results");
        }
        self.state = CoordinatorState::Collecting;
    }

    /// Drains the buffer into `table` and decides whether to flush.
    pub async fn merge(&mut self, table: &mut KeyTable) -> MergeOutcome {
        self.state = CoordinatorState::Merging;

        let extractions = self.pending.drain().await;
        let files = extractions.len();
        let mut new_pairs = 0;

        for extraction in extractions {
            for (key, contexts) in extraction.strings {
                new_pairs += table.ingest(&key, contexts).new_pairs;
            }
        }

        let needs_flush = match self.policy {
            FlushPolicy::NewKeys => !table.delta().is_empty(),
            FlushPolicy::SnapshotDiff => table.generation() != self.flushed_generation,
        };
        let decision = if needs_flush {
            self.state = CoordinatorState::FlushRequired;
            FlushDecision::Flush
        } else {
            self.state = CoordinatorState::NoFlushNeeded;
            FlushDecision::Skip
        };

        tracing::debug!(files, new_pairs, ?decision, "Merged extraction results");
        MergeOutcome { files, new_pairs, decision }
    }

    /// Ends the pass: the delta set is cleared whether or not the flush
    /// succeeded, and the coordinator returns to `Idle`.
    pub fn finish_pass(&mut self, table: &mut KeyTable) {
        table.clear_delta();
        self.flushed_generation = table.generation();
        self.state = CoordinatorState::Idle;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;
    use crate::merge::FileExtraction;
    use crate::types::{
        ExtractedStrings,
        MessageContext,
        TranslationUnit,
    };

    fn strings(key: &str, reference: &str) -> ExtractedStrings {
        let unit = TranslationUnit::new().with_reference(reference);
        ExtractedStrings::from([(key.to_string(), [(MessageContext::None, unit)].into())])
    }

    async fn run_pass(
        coordinator: &mut MergeCoordinator,
        table: &mut KeyTable,
        input: Vec<ExtractedStrings>,
    ) -> MergeOutcome {
        coordinator.begin_pass();
        let emitter = coordinator.emitter();
        for (i, strings) in input.into_iter().enumerate() {
            emitter.emit(FileExtraction::new(PathBuf::from(format!("{i}.js")), strings)).await;
        }
        let outcome = coordinator.merge(table).await;
        coordinator.finish_pass(table);
        outcome
    }

    #[tokio::test]
    async fn state_machine_walks_through_a_pass() {
        let mut coordinator = MergeCoordinator::new(FlushPolicy::NewKeys);
        let mut table = KeyTable::new();
        assert_that!(coordinator.state(), eq(CoordinatorState::Idle));

        coordinator.begin_pass();
        assert_that!(coordinator.state(), eq(CoordinatorState::Collecting));

        let extraction = FileExtraction::new("a.js".into(), strings("Hi", "a.js:1"));
        coordinator.emitter().emit(extraction).await;
        let outcome = coordinator.merge(&mut table).await;
        assert_that!(coordinator.state(), eq(CoordinatorState::FlushRequired));
        assert_that!(
            outcome,
            eq(MergeOutcome { files: 1, new_pairs: 1, decision: FlushDecision::Flush })
        );

        coordinator.finish_pass(&mut table);
        assert_that!(coordinator.state(), eq(CoordinatorState::Idle));
        assert_that!(table.delta().is_empty(), eq(true));
    }

    #[rstest]
    #[case::new_keys(FlushPolicy::NewKeys)]
    #[case::snapshot_diff(FlushPolicy::SnapshotDiff)]
    #[tokio::test]
    async fn identical_pass_needs_no_flush(#[case] policy: FlushPolicy) {
        let mut coordinator = MergeCoordinator::new(policy);
        let mut table = KeyTable::new();
        run_pass(&mut coordinator, &mut table, vec![strings("Hi", "a.js:1")]).await;

        let outcome = run_pass(&mut coordinator, &mut table, vec![strings("Hi", "a.js:1")]).await;

        assert_that!(outcome.decision, eq(FlushDecision::Skip));
        assert_that!(outcome.new_pairs, eq(0));
    }

    #[rstest]
    #[case::new_keys(FlushPolicy::NewKeys, FlushDecision::Skip)]
    #[case::snapshot_diff(FlushPolicy::SnapshotDiff, FlushDecision::Flush)]
    #[tokio::test]
    async fn reference_only_change_depends_on_policy(
        #[case] policy: FlushPolicy,
        #[case] expected: FlushDecision,
    ) {
        let mut coordinator = MergeCoordinator::new(policy);
        let mut table = KeyTable::new();
        run_pass(&mut coordinator, &mut table, vec![strings("Hi", "a.js:1")]).await;

        let outcome = run_pass(&mut coordinator, &mut table, vec![strings("Hi", "a.js:2")]).await;

        assert_that!(outcome.decision, eq(expected));
    }

    #[tokio::test]
    async fn empty_pass_is_skipped() {
        let mut coordinator = MergeCoordinator::new(FlushPolicy::SnapshotDiff);
        let mut table = KeyTable::new();

        let outcome = run_pass(&mut coordinator, &mut table, Vec::new()).await;

        assert_that!(
            outcome,
            eq(MergeOutcome { files: 0, new_pairs: 0, decision: FlushDecision::Skip })
        );
    }

    #[tokio::test]
    async fn buffer_order_does_not_change_the_table() {
        let input = vec![strings("A", "a.js:1"), strings("B", "b.js:1"), strings("A", "c.js:3")];
        let mut reversed = input.clone();
        reversed.reverse();

        let mut forward_table = KeyTable::new();
        run_pass(&mut MergeCoordinator::new(FlushPolicy::NewKeys), &mut forward_table, input).await;
        let mut reverse_table = KeyTable::new();
        run_pass(&mut MergeCoordinator::new(FlushPolicy::NewKeys), &mut reverse_table, reversed)
            .await;

        assert_eq!(forward_table.entries(), reverse_table.entries());
    }
}
