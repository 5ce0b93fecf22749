use thiserror::Error;

/// Problems found while validating a [`crate::scene::Scene`] before anything is emitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    #[error("duplicate host id `{0}`")]
    DuplicateHost(String),

    #[error("unknown host `{0}`")]
    UnknownHost(String),

    #[error("host `{host}` is placed in column {column}, but only {count} columns are defined")]
    UnknownColumn {
        host: String,
        column: usize,
        count: usize,
    },

    #[error("node {host}-{index} does not exist ({host} has {count} nodes)")]
    UnknownNode {
        host: String,
        index: usize,
        count: usize,
    },

    #[error("node {0} cannot be both affected and a database node")]
    ConflictingRoles(String),

    #[error("{what} is at {value}%, outside 0..=100")]
    PercentOutOfRange { what: String, value: u32 },

    #[error("{what}: window starts at {start}% but ends at {end}%")]
    InvertedWindow { what: String, start: u32, end: u32 },

    #[error("host `{0}` has affected nodes but no invalidation phase")]
    MissingInvalidation(String),

    #[error("host `{0}` has affected nodes but no recomputation phase")]
    MissingRecompute(String),

    #[error("host `{0}` has a timing phase but no affected nodes")]
    NoAffectedNodes(String),

    #[error("recomputation override targets {0}, which is not an affected node")]
    OverrideNotAffected(String),

    #[error("{0} is declared more than once")]
    DuplicatePhase(String),

    #[error("edge {0} is declared more than once")]
    DuplicateEdge(String),
}

impl SceneError {
    pub fn out_of_range(what: impl Into<String>, value: u32) -> Self {
        Self::PercentOutOfRange {
            what: what.into(),
            value,
        }
    }

    pub fn inverted(what: impl Into<String>, start: u32, end: u32) -> Self {
        Self::InvertedWindow {
            what: what.into(),
            start,
            end,
        }
    }
}

/// Failures of the post-generation self-check.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("failed to parse generated svg: {0}")]
    Parse(#[from] roxmltree::Error),

    #[error("generated svg has no <style> element")]
    MissingStyle,

    #[error("self-check failed: {}", .0.join("; "))]
    Mismatch(Vec<String>),
}
