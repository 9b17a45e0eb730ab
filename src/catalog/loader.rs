use crate::catalog::error::CatalogError;
use crate::catalog::{
    Catalog, Directive, DirectiveCategory, EdgeCondition, EdgeSource, FlowEdge, FlowType,
    ReferenceStore, WILDCARD_SOURCE,
};
use crate::shared::ids::DirectiveName;
use crate::store::sql_error;
use rusqlite::OptionalExtension;
use std::collections::BTreeMap;

/// Loads the catalog from the reference store and validates it structurally.
/// Any error here is a configuration fault: callers must treat it as fatal
/// and refuse to serve flow resolution.
pub fn load_catalog(db_path: &std::path::Path) -> Result<Catalog, CatalogError> {
    let store = ReferenceStore::open(db_path)?;
    let connection = store.connect()?;

    let mut directives: BTreeMap<DirectiveName, Directive> = BTreeMap::new();
    {
        let mut statement = connection
            .prepare("SELECT name, category, workflow, confidence_threshold FROM directives")
            .map_err(sql_error)?;
        let rows = statement
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, f64>(3)?,
                ))
            })
            .map_err(sql_error)?;

        for row in rows {
            let (name_raw, category_raw, workflow, confidence_threshold) =
                row.map_err(sql_error)?;
            let name = DirectiveName::parse(&name_raw).map_err(|reason| {
                CatalogError::InvalidDirectiveName {
                    name: name_raw.clone(),
                    reason,
                }
            })?;
            let category = DirectiveCategory::parse(&category_raw).ok_or_else(|| {
                CatalogError::InvalidCategory {
                    directive: name_raw.clone(),
                    value: category_raw.clone(),
                }
            })?;
            if !(0.0..=1.0).contains(&confidence_threshold) {
                return Err(CatalogError::InvalidConfidence {
                    directive: name_raw,
                    value: confidence_threshold,
                });
            }
            directives.insert(
                name.clone(),
                Directive {
                    name,
                    category,
                    workflow,
                    confidence_threshold,
                },
            );
        }
    }

    let mut edges: Vec<FlowEdge> = Vec::new();
    {
        let mut statement = connection
            .prepare(
                "
                SELECT from_directive, to_directive, flow_type,
                       condition_key, condition_value, priority
                FROM flow_edges
                ORDER BY id ASC
                ",
            )
            .map_err(sql_error)?;
        let rows = statement
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, i64>(5)?,
                ))
            })
            .map_err(sql_error)?;

        for row in rows {
            let (from_raw, to_raw, flow_type_raw, condition_key, condition_value, priority) =
                row.map_err(sql_error)?;
            let flow_type = FlowType::parse(&flow_type_raw).ok_or_else(|| {
                CatalogError::InvalidFlowType {
                    from: from_raw.clone(),
                    to: to_raw.clone(),
                    value: flow_type_raw.clone(),
                }
            })?;
            let condition = match (condition_key, condition_value) {
                (None, None) => None,
                (Some(key), Some(value)) => Some(EdgeCondition { key, value }),
                _ => {
                    return Err(CatalogError::ConditionHalfSpecified {
                        from: from_raw,
                        to: to_raw,
                    })
                }
            };
            let from = if from_raw == WILDCARD_SOURCE {
                EdgeSource::Wildcard
            } else {
                EdgeSource::Directive(DirectiveName::parse(&from_raw).map_err(|reason| {
                    CatalogError::InvalidDirectiveName {
                        name: from_raw.clone(),
                        reason,
                    }
                })?)
            };
            let to = DirectiveName::parse(&to_raw).map_err(|reason| {
                CatalogError::InvalidDirectiveName {
                    name: to_raw.clone(),
                    reason,
                }
            })?;
            edges.push(FlowEdge {
                from,
                to,
                flow_type,
                condition,
                priority,
            });
        }
    }

    let root_raw: Option<String> = connection
        .query_row(
            "SELECT value FROM catalog_meta WHERE key = 'root_directive'",
            [],
            |row| row.get(0),
        )
        .optional()
        .map_err(sql_error)?;

    let root_raw = root_raw.ok_or(CatalogError::RootDirectiveUnset)?;
    let root = DirectiveName::parse(&root_raw).map_err(|_| CatalogError::RootDirectiveUnknown {
        name: root_raw.clone(),
    })?;
    if !directives.contains_key(root.as_str()) {
        return Err(CatalogError::RootDirectiveUnknown { name: root_raw });
    }

    validate_edges(&directives, &edges)?;
    validate_completion_loops(&directives, &edges, &root)?;

    Ok(Catalog::new(directives, edges, root))
}

fn validate_edges(
    directives: &BTreeMap<DirectiveName, Directive>,
    edges: &[FlowEdge],
) -> Result<(), CatalogError> {
    for edge in edges {
        if let EdgeSource::Directive(from) = &edge.from {
            if !directives.contains_key(from.as_str()) {
                return Err(CatalogError::UnknownEdgeEndpoint {
                    from: from.to_string(),
                    to: edge.to.to_string(),
                    unknown: from.to_string(),
                });
            }
        }
        if !directives.contains_key(edge.to.as_str()) {
            return Err(CatalogError::UnknownEdgeEndpoint {
                from: edge.from.as_str().to_string(),
                to: edge.to.to_string(),
                unknown: edge.to.to_string(),
            });
        }
    }
    Ok(())
}

/// The loop-back invariant: every completion directive has exactly one
/// outgoing completion_loop edge, targeting the root status directive.
/// Wildcard-sourced edges never participate.
fn validate_completion_loops(
    directives: &BTreeMap<DirectiveName, Directive>,
    edges: &[FlowEdge],
    root: &DirectiveName,
) -> Result<(), CatalogError> {
    for directive in directives.values() {
        if directive.category != DirectiveCategory::Completion {
            continue;
        }
        let loops: Vec<&FlowEdge> = edges
            .iter()
            .filter(|edge| {
                !edge.from.is_wildcard()
                    && edge.from.matches(directive.name.as_str())
                    && edge.flow_type == FlowType::CompletionLoop
            })
            .collect();
        if loops.len() != 1 {
            return Err(CatalogError::CompletionLoopCount {
                directive: directive.name.to_string(),
                count: loops.len(),
            });
        }
        let target = &loops[0].to;
        if target != root {
            return Err(CatalogError::CompletionLoopTarget {
                directive: directive.name.to_string(),
                target: target.to_string(),
                root: root.to_string(),
            });
        }
    }
    Ok(())
}
