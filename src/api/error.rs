use serde::Serialize;

/// Failure classes surfaced to callers: client input problems, the external
/// tool exiting nonzero, and local infrastructure faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Tool,
    Infra,
}
