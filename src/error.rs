// src/error.rs
//
// Failure taxonomy. Per-tick failures stay inside the pipelines;
// only fatal subsystem failures reach the gate or the collaborator.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectionError {
    /// A model or its metadata failed to load. Fatal to the owning
    /// subsystem's readiness; the gate never activates for it. No retry.
    #[error("failed to load {subsystem}")]
    LoadFailure {
        subsystem: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// The inference call itself failed. Caught per tick; the previous
    /// snapshot stays published.
    #[error("inference call failed")]
    InferenceFailure(#[source] anyhow::Error),

    /// Label catalog length does not match the classifier output vector.
    /// Fatal to the clothing pipeline, never a per-tick condition.
    #[error("label catalog has {labels} entries but classifier emitted {outputs} probabilities")]
    ConfigMismatch { labels: usize, outputs: usize },
}

/// What an admitted tick did. `FrameNotReady` is deliberately absent:
/// a missing or zero-dimensioned frame is a silent skip, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Snapshot published with this many annotations.
    Published(usize),
    /// Frame missing or degenerate; nothing ran.
    SkippedNoFrame,
    /// Result completed after teardown or gate deactivation and was dropped.
    Discarded,
    /// Pipeline was permanently disabled by an earlier fatal failure.
    Disabled,
}
