//! Flow resolution over the loaded catalog. A pure query: the resolver
//! ranks candidate transitions and never picks a winner, runs a directive,
//! or touches a store.

use crate::catalog::{Catalog, FlowType};
use crate::shared::ids::DirectiveName;
use crate::status::StateSnapshot;

#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("directive `{name}` is not in the catalog")]
    UnknownDirective { name: String },
}

/// One candidate transition out of the current directive. `matched` is true
/// when the edge is unconditional or its condition holds against the
/// snapshot; unmatched edges are still reported so the caller can see what
/// almost applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEdge {
    pub to: DirectiveName,
    pub flow_type: FlowType,
    pub matched: bool,
}

/// Condition values compare as trimmed, ASCII-lowercased strings.
fn normalize(value: &str) -> String {
    value.trim().to_ascii_lowercase()
}

/// Ranks every edge leaving `current_directive` (wildcard edges included)
/// against the snapshot. Matched edges sort ahead of unmatched ones, then by
/// priority descending, then by flow type precedence. An unknown directive
/// is an error, never an empty list: callers must be able to tell "no edges
/// defined" from "no such directive".
pub fn resolve_next(
    catalog: &Catalog,
    current_directive: &str,
    snapshot: &StateSnapshot,
) -> Result<Vec<ResolvedEdge>, FlowError> {
    if !catalog.contains(current_directive) {
        return Err(FlowError::UnknownDirective {
            name: current_directive.to_string(),
        });
    }

    let mut keyed: Vec<((bool, i64, u8), ResolvedEdge)> = catalog
        .edges_from(current_directive)
        .map(|edge| {
            let matched = match &edge.condition {
                None => true,
                Some(condition) => snapshot
                    .flags
                    .value(&condition.key)
                    .is_some_and(|actual| normalize(&actual) == normalize(&condition.value)),
            };
            (
                (!matched, -edge.priority, edge.flow_type.precedence()),
                ResolvedEdge {
                    to: edge.to.clone(),
                    flow_type: edge.flow_type,
                    matched,
                },
            )
        })
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(keyed.into_iter().map(|(_, edge)| edge).collect())
}
