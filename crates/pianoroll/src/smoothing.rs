//! Hook for the dynamics smoothing filter.
//!
//! The converter hands over the raw envelope at the end of every part and
//! multiplies the part's matrices by whatever comes back. The filter itself
//! lives with the caller.

use crate::dynamics::DynamicFlags;

/// Smooths a raw dynamics envelope.
///
/// Implementations must return exactly `envelope.len()` values.
pub trait Smoother {
    fn smooth(
        &self,
        envelope: &[f32],
        flags: &DynamicFlags,
        quantization: u32,
        horizon: u32,
    ) -> Vec<f32>;
}

/// Returns the envelope unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct Unsmoothed;

impl Smoother for Unsmoothed {
    fn smooth(&self, envelope: &[f32], _: &DynamicFlags, _: u32, _: u32) -> Vec<f32> {
        envelope.to_vec()
    }
}

impl<F> Smoother for F
where
    F: Fn(&[f32], &DynamicFlags, u32, u32) -> Vec<f32>,
{
    fn smooth(
        &self,
        envelope: &[f32],
        flags: &DynamicFlags,
        quantization: u32,
        horizon: u32,
    ) -> Vec<f32> {
        self(envelope, flags, quantization, horizon)
    }
}
