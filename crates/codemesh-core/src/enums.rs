//! Closed tagged-union enums for everything the data model stores as a
//! string column. Per the design notes, new variants require both a
//! migration and a code change here — there is deliberately no open
//! "Other(String)" escape hatch.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

macro_rules! closed_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident { $($variant:ident => $wire:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        $vis enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire),+
                }
            }

            pub const ALL: &'static [$name] = &[$(Self::$variant),+];
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok(Self::$variant)),+,
                    other => Err(CoreError::Validation(format!(
                        concat!("unknown ", stringify!($name), " variant: {}"),
                        other
                    ))),
                }
            }
        }
    };
}

closed_enum! {
    /// Where a `Source`'s content originates from.
    pub enum SourceKind {
        Git => "git",
        Database => "database",
        Filesystem => "filesystem",
        Upload => "upload",
        S3 => "s3",
    }
}

closed_enum! {
    /// `IndexRun` lifecycle. Transitions are monotonic except `Cancel`,
    /// which can interrupt `Pending` or `Running`.
    pub enum IndexRunStatus {
        Pending => "pending",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Cancelled => "cancelled",
    }
}

closed_enum! {
    /// Single pipeline stage name, used to record where an `IndexRun` failed.
    pub enum PipelineStage {
        Materialize => "materialize",
        Enumerate => "enumerate",
        Parse => "parse",
        Resolve => "resolve",
        Lineage => "lineage",
        Embed => "embed",
        GraphSync => "graph_sync",
        Analytics => "analytics",
    }
}

closed_enum! {
    /// What a `Symbol` represents.
    pub enum SymbolKind {
        Table => "table",
        View => "view",
        Column => "column",
        Procedure => "procedure",
        Function => "function",
        Trigger => "trigger",
        Class => "class",
        Interface => "interface",
        Struct => "struct",
        Enum => "enum",
        Method => "method",
        Property => "property",
        Field => "field",
        Module => "module",
        Namespace => "namespace",
        Endpoint => "endpoint",
        Constant => "constant",
        Type => "type",
    }
}

impl SymbolKind {
    /// Rank used to break result-ordering ties in `search_symbols`:
    /// containers (tables, classes) outrank members (columns, fields).
    pub fn search_priority(&self) -> u8 {
        match self {
            SymbolKind::Table | SymbolKind::Class | SymbolKind::View => 0,
            SymbolKind::Interface
            | SymbolKind::Struct
            | SymbolKind::Enum
            | SymbolKind::Procedure
            | SymbolKind::Function
            | SymbolKind::Module
            | SymbolKind::Namespace
            | SymbolKind::Endpoint => 1,
            SymbolKind::Method
            | SymbolKind::Property
            | SymbolKind::Field
            | SymbolKind::Column
            | SymbolKind::Constant
            | SymbolKind::Type
            | SymbolKind::Trigger => 2,
        }
    }
}

closed_enum! {
    /// Recognized programming/data languages a parser may declare.
    pub enum Language {
        TSql => "tsql",
        Postgres => "postgresql",
        CSharp => "csharp",
        JavaScript => "javascript",
        TypeScript => "typescript",
        AspClassic => "asp_classic",
        Delphi => "delphi",
        Java => "java",
        Unknown => "unknown",
    }
}

closed_enum! {
    /// Directed relationship type between two symbols. Closed set.
    pub enum EdgeType {
        ReadsFrom => "reads_from",
        WritesTo => "writes_to",
        Calls => "calls",
        Inherits => "inherits",
        Implements => "implements",
        Imports => "imports",
        UsesTable => "uses_table",
        UsesColumn => "uses_column",
        DirectCopy => "direct_copy",
        TransformsTo => "transforms_to",
        Joins => "joins",
        References => "references",
        CallsApi => "calls_api",
    }
}

closed_enum! {
    /// How a staged `ColumnReference` derives its target from its source.
    pub enum DerivationType {
        DirectCopy => "direct_copy",
        Transform => "transform",
        Aggregate => "aggregate",
        Conditional => "conditional",
        Filter => "filter",
        Join => "join",
        Other => "other",
    }
}

impl DerivationType {
    /// Maps a derivation to the edge it produces and the confidence
    /// attached to it.
    pub fn to_edge(&self) -> (EdgeType, f32) {
        match self {
            DerivationType::DirectCopy => (EdgeType::DirectCopy, 0.90),
            DerivationType::Transform | DerivationType::Aggregate | DerivationType::Conditional => {
                (EdgeType::TransformsTo, 1.00)
            }
            DerivationType::Filter | DerivationType::Join => (EdgeType::UsesColumn, 0.85),
            DerivationType::Other => (EdgeType::UsesColumn, 0.70),
        }
    }
}

closed_enum! {
    /// Scope a `ProjectAnalytics` row summarizes.
    pub enum AnalyticsScope {
        Project => "project",
        Source => "source",
        Schema => "schema",
        Namespace => "namespace",
        Bridge => "bridge",
    }
}

closed_enum! {
    /// Architectural bucket assigned to a symbol by the analytics engine.
    pub enum Layer {
        Data => "data",
        Business => "business",
        Api => "api",
        Infrastructure => "infrastructure",
        CrossCutting => "cross_cutting",
    }
}

closed_enum! {
    /// `analyze_impact` severity classification.
    pub enum Severity {
        Critical => "critical",
        High => "high",
        Medium => "medium",
        Low => "low",
    }
}

closed_enum! {
    /// `analyze_impact` change kind.
    pub enum ChangeType {
        Modify => "modify",
        Delete => "delete",
        Rename => "rename",
    }
}

closed_enum! {
    /// Traversal direction for lineage/impact queries.
    pub enum Direction {
        Upstream => "upstream",
        Downstream => "downstream",
        Both => "both",
    }
}

closed_enum! {
    /// MCP response detail tier.
    pub enum Verbosity {
        Summary => "summary",
        Standard => "standard",
        Full => "full",
    }
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::Standard
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_display_and_from_str() {
        for kind in SymbolKind::ALL {
            let parsed: SymbolKind = kind.as_str().parse().unwrap();
            assert_eq!(parsed, *kind);
        }
    }

    #[test]
    fn unknown_variant_is_a_validation_error() {
        let err = "bogus".parse::<Language>().unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn derivation_to_edge_matches_the_table() {
        assert_eq!(
            DerivationType::DirectCopy.to_edge(),
            (EdgeType::DirectCopy, 0.90)
        );
        assert_eq!(
            DerivationType::Aggregate.to_edge(),
            (EdgeType::TransformsTo, 1.00)
        );
        assert_eq!(DerivationType::Join.to_edge(), (EdgeType::UsesColumn, 0.85));
    }

    #[test]
    fn search_priority_ranks_containers_above_members() {
        assert!(SymbolKind::Table.search_priority() < SymbolKind::Function.search_priority());
        assert!(SymbolKind::Function.search_priority() < SymbolKind::Column.search_priority());
    }
}
