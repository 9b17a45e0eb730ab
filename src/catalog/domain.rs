use crate::shared::ids::DirectiveName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Edges carrying this source marker are reachable from any directive.
pub const WILDCARD_SOURCE: &str = "*";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectiveCategory {
    Session,
    Planning,
    Implementation,
    Completion,
    Reference,
    ErrorRecovery,
}

impl DirectiveCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            DirectiveCategory::Session => "session",
            DirectiveCategory::Planning => "planning",
            DirectiveCategory::Implementation => "implementation",
            DirectiveCategory::Completion => "completion",
            DirectiveCategory::Reference => "reference",
            DirectiveCategory::ErrorRecovery => "error_recovery",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "session" => Some(DirectiveCategory::Session),
            "planning" => Some(DirectiveCategory::Planning),
            "implementation" => Some(DirectiveCategory::Implementation),
            "completion" => Some(DirectiveCategory::Completion),
            "reference" => Some(DirectiveCategory::Reference),
            "error_recovery" => Some(DirectiveCategory::ErrorRecovery),
            _ => None,
        }
    }
}

impl std::fmt::Display for DirectiveCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cataloged behavioral step. Immutable after load; the workflow text and
/// confidence threshold are opaque to the resolution engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub name: DirectiveName,
    pub category: DirectiveCategory,
    pub workflow: String,
    pub confidence_threshold: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowType {
    StatusBranch,
    CompletionLoop,
    Conditional,
    Canonical,
    ErrorHandler,
}

impl FlowType {
    /// Tie-break order when priorities are equal; lower sorts first.
    pub fn precedence(self) -> u8 {
        match self {
            FlowType::StatusBranch => 0,
            FlowType::CompletionLoop => 1,
            FlowType::Conditional => 2,
            FlowType::Canonical => 3,
            FlowType::ErrorHandler => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FlowType::StatusBranch => "status_branch",
            FlowType::CompletionLoop => "completion_loop",
            FlowType::Conditional => "conditional",
            FlowType::Canonical => "canonical",
            FlowType::ErrorHandler => "error_handler",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "status_branch" => Some(FlowType::StatusBranch),
            "completion_loop" => Some(FlowType::CompletionLoop),
            "conditional" => Some(FlowType::Conditional),
            "canonical" => Some(FlowType::Canonical),
            "error_handler" => Some(FlowType::ErrorHandler),
            _ => None,
        }
    }
}

impl std::fmt::Display for FlowType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeSource {
    Wildcard,
    Directive(DirectiveName),
}

impl EdgeSource {
    pub fn matches(&self, directive: &str) -> bool {
        match self {
            EdgeSource::Wildcard => true,
            EdgeSource::Directive(name) => name.as_str() == directive,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EdgeSource::Wildcard => WILDCARD_SOURCE,
            EdgeSource::Directive(name) => name.as_str(),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, EdgeSource::Wildcard)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeCondition {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowEdge {
    pub from: EdgeSource,
    pub to: DirectiveName,
    pub flow_type: FlowType,
    pub condition: Option<EdgeCondition>,
    pub priority: i64,
}

/// The once-loaded, immutable directive catalog plus its flow graph.
/// Always passed by reference; there is no ambient global lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    directives: BTreeMap<DirectiveName, Directive>,
    edges: Vec<FlowEdge>,
    root_directive: DirectiveName,
}

impl Catalog {
    pub(crate) fn new(
        directives: BTreeMap<DirectiveName, Directive>,
        edges: Vec<FlowEdge>,
        root_directive: DirectiveName,
    ) -> Self {
        Self {
            directives,
            edges,
            root_directive,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.directives.contains_key(name)
    }

    pub fn directive(&self, name: &str) -> Option<&Directive> {
        self.directives.get(name)
    }

    pub fn directives(&self) -> impl Iterator<Item = &Directive> {
        self.directives.values()
    }

    pub fn edges(&self) -> &[FlowEdge] {
        &self.edges
    }

    /// Edges whose source is `directive` or the wildcard marker.
    pub fn edges_from<'a>(&'a self, directive: &'a str) -> impl Iterator<Item = &'a FlowEdge> {
        self.edges.iter().filter(move |edge| edge.from.matches(directive))
    }

    pub fn root_directive(&self) -> &DirectiveName {
        &self.root_directive
    }
}
