/// Error from a mathematical operation whose input has no meaningful result.
///
/// None of these are recoverable by retrying with the same input; the caller decides
/// whether the failure ruins a single pixel or a whole frame.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, displaydoc::Display)]
#[non_exhaustive]
pub enum MathError {
    /// cannot normalize a vector of zero or non-finite length
    DegenerateVector,

    /// matrix is singular and has no inverse
    SingularMatrix,

    /// precondition violated: {0}
    Precondition(&'static str),

    /// homogeneous point has w = 0 and cannot be projected
    PointAtInfinity,
}

impl core::error::Error for MathError {}
