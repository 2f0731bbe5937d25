//! Error taxonomy for the core library. The core never panics on malformed
//! input; every failure mode surfaces as a typed variant here.

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Decoder: the packet's value count does not match the shape it was
    /// decoded against.
    #[error("shape mismatch: expected {expected} leaf values, found {found}")]
    ShapeMismatch { expected: usize, found: usize },

    /// Shape extraction or fingerprinting recursed past the configured
    /// depth cap. Not expected for well-formed JSON; bounds pathological
    /// input rather than overflowing the stack.
    #[error("recursion depth exceeded cap of {cap}")]
    CycleDepthExceeded { cap: usize },
}

pub type CoreResult<T> = Result<T, CoreError>;
