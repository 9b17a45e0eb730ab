use crate::store::StoreError;

/// Structural configuration errors. All of these are fatal at load time:
/// the engine refuses to serve requests over an inconsistent graph.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("invalid directive name `{name}`: {reason}")]
    InvalidDirectiveName { name: String, reason: String },
    #[error("invalid category `{value}` for directive `{directive}`")]
    InvalidCategory { directive: String, value: String },
    #[error("directive `{directive}` confidence threshold {value} is outside 0.0..=1.0")]
    InvalidConfidence { directive: String, value: f64 },
    #[error("invalid flow type `{value}` on edge `{from}` -> `{to}`")]
    InvalidFlowType {
        from: String,
        to: String,
        value: String,
    },
    #[error("edge `{from}` -> `{to}` names unknown directive `{unknown}`")]
    UnknownEdgeEndpoint {
        from: String,
        to: String,
        unknown: String,
    },
    #[error("edge `{from}` -> `{to}` must carry both condition key and value or neither")]
    ConditionHalfSpecified { from: String, to: String },
    #[error("reference store does not designate a root status directive")]
    RootDirectiveUnset,
    #[error("designated root directive `{name}` is not in the catalog")]
    RootDirectiveUnknown { name: String },
    #[error(
        "completion directive `{directive}` must have exactly one completion_loop edge, found {count}"
    )]
    CompletionLoopCount { directive: String, count: usize },
    #[error("completion directive `{directive}` loops back to `{target}`, expected root `{root}`")]
    CompletionLoopTarget {
        directive: String,
        target: String,
        root: String,
    },
}
