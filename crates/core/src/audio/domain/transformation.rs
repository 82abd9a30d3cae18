use super::waveform::Waveform;

/// Error type returned across the transformation seam.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Domain interface for one pipeline stage (an audio augmentation).
///
/// Implementations return a new [`Waveform`] and never touch their input.
/// Stochastic implementations must take an explicit seed so that a run can
/// be reproduced.
pub trait Transformation: Send + Sync {
    fn apply(&self, waveform: &Waveform) -> Result<Waveform, BoxError>;

    /// Display name of the stage, derived from the concrete type.
    fn name(&self) -> String {
        display_name(std::any::type_name::<Self>())
    }

    /// Rate of the waveform `apply` returns for an input at `input_rate`.
    /// Only transformations that resample override this.
    fn output_rate(&self, input_rate: u32) -> u32 {
        input_rate
    }
}

/// Strips the module path and generic arguments from a type name:
/// `augscope_core::x::Gain` becomes `Gain`.
pub fn display_name(type_name: &str) -> String {
    let base = type_name.split('<').next().unwrap_or(type_name);
    base.rsplit("::").next().unwrap_or(base).to_string()
}
