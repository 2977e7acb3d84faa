use biosoup_data::Activation;

/// Slope of the steepened sigmoid.
const SIGMOID_STEEPNESS: f32 = 4.924_273;

#[inline]
pub fn apply(activation: Activation, x: f32) -> f32 {
    match activation {
        Activation::Sigmoid => 1.0 / (1.0 + (-SIGMOID_STEEPNESS * x).exp()),
        Activation::Tanh => x.tanh(),
        Activation::Gaussian => (-(2.5 * x).powi(2)).exp(),
        Activation::Sine => x.sin(),
        Activation::Linear => x,
        Activation::Relu => x.max(0.0),
    }
}

/// Output range, `None` for unbounded activations.
pub fn range(activation: Activation) -> Option<(f32, f32)> {
    match activation {
        Activation::Sigmoid | Activation::Gaussian => Some((0.0, 1.0)),
        Activation::Tanh | Activation::Sine => Some((-1.0, 1.0)),
        Activation::Linear | Activation::Relu => None,
    }
}
