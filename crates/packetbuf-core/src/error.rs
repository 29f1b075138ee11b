use thiserror::Error;

/// Construction-time configuration errors. Per-cycle protocol violations
/// (a spurious control command, ingress during back-pressure) are a
/// separate concern entirely: every input combination has defined behavior,
/// so they're logged via `tracing` rather than reported through `Result`.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("flit store capacity must be at least 1")]
    ZeroFlitCapacity,
    #[error("packet-length queue capacity must be at least 1")]
    ZeroPacketCapacity,
}
