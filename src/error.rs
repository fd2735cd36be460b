use thiserror::Error;

/// Why a typed extraction did not produce a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CastError {
    /// The container holds nothing.
    #[error("container is empty")]
    Empty,
    /// The container holds a value of another type.
    #[error("container holds `{stored}`, not the requested `{requested}`")]
    Mismatch {
        stored: &'static str,
        requested: &'static str,
    },
}
