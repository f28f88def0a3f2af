use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use num_complex::Complex32;

use crate::echo::{EchoError, EchoResponse};

/// Complex samples decoded from an echo response.
#[derive(Debug, Clone, PartialEq)]
pub struct EchoSamples {
    pub shape: Vec<usize>,
    pub samples: Vec<Complex32>,
}

impl EchoSamples {
    #[allow(dead_code)]
    pub fn real(&self) -> Vec<f32> {
        self.samples.iter().map(|s| s.re).collect()
    }

    #[allow(dead_code)]
    pub fn imag(&self) -> Vec<f32> {
        self.samples.iter().map(|s| s.im).collect()
    }

    pub fn peak_magnitude(&self) -> f32 {
        self.samples.iter().map(|s| s.norm()).fold(0.0, f32::max)
    }
}

impl EchoResponse {
    /// Decode `data` as interleaved little-endian `f32` pairs. The sample
    /// count is the last dimension of `shape`.
    pub fn decode(&self) -> Result<EchoSamples, EchoError> {
        let num_samples = *self.shape.last().ok_or(EchoError::EmptyShape)?;
        let bytes = STANDARD.decode(self.data.trim())?;

        let expected = num_samples
            .checked_mul(2 * std::mem::size_of::<f32>())
            .ok_or(EchoError::ShapeMismatch {
                expected: usize::MAX,
                actual: bytes.len(),
            })?;
        if bytes.len() < expected {
            return Err(EchoError::ShapeMismatch {
                expected,
                actual: bytes.len(),
            });
        }

        let raw: Vec<f32> = bytes[..expected]
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();

        let samples = raw
            .chunks_exact(2)
            .map(|pair| Complex32::new(pair[0], pair[1]))
            .collect();

        Ok(EchoSamples {
            shape: self.shape.clone(),
            samples,
        })
    }
}
