mod aggregator;
mod error;
mod snapshot;

pub use aggregator::StatusAggregator;
pub use error::StatusError;
pub use snapshot::{
    CompletionRecommendation, DetailLevel, FocusItem, LevelCounts, MilestoneNode, SidequestNode,
    SnapshotCounts, SnapshotFlags, StageNode, StateSnapshot, SubtaskNode, TaskNode, WorkSets,
};
