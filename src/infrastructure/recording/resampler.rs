//! Incremental resampling from the device rate to the capture rate

use rubato::{FftFixedIn, Resampler};

use crate::application::ports::CaptureError;

/// Feeds arbitrary-length sample runs through a fixed-frame rubato resampler,
/// carrying the remainder over to the next call.
pub struct StreamResampler {
    inner: Option<FftFixedIn<f32>>,
    pending: Vec<f32>,
    ratio: f64,
}

impl StreamResampler {
    pub fn new(source_rate: u32, target_rate: u32) -> Result<Self, CaptureError> {
        let inner = if source_rate == target_rate {
            None
        } else {
            Some(
                FftFixedIn::<f32>::new(
                    source_rate as usize,
                    target_rate as usize,
                    1024, // Chunk size
                    2,    // Sub-chunks
                    1,    // Mono
                )
                .map_err(|e| CaptureError::DeviceError(format!("Resampler init failed: {}", e)))?,
            )
        };
        Ok(Self {
            inner,
            pending: Vec::new(),
            ratio: f64::from(target_rate) / f64::from(source_rate),
        })
    }

    /// Resample every complete frame available so far
    pub fn push(&mut self, samples: &[i16]) -> Result<Vec<i16>, CaptureError> {
        let Some(resampler) = self.inner.as_mut() else {
            return Ok(samples.to_vec());
        };
        self.pending
            .extend(samples.iter().map(|&s| f32::from(s) / 32768.0));

        let mut output = Vec::new();
        loop {
            let frames_needed = resampler.input_frames_next();
            if self.pending.len() < frames_needed {
                break;
            }
            let frame: Vec<f32> = self.pending.drain(..frames_needed).collect();
            let resampled = resampler
                .process(&[frame], None)
                .map_err(|e| CaptureError::DeviceError(format!("Resampling failed: {}", e)))?;
            output.extend(resampled[0].iter().map(|&s| to_i16(s)));
        }
        Ok(output)
    }

    /// Pad and resample whatever is left
    pub fn finish(&mut self) -> Result<Vec<i16>, CaptureError> {
        let Some(resampler) = self.inner.as_mut() else {
            return Ok(Vec::new());
        };
        if self.pending.is_empty() {
            return Ok(Vec::new());
        }

        let expected = (self.pending.len() as f64 * self.ratio).ceil() as usize;
        let mut frame = std::mem::take(&mut self.pending);
        frame.resize(resampler.input_frames_next(), 0.0);
        let resampled = resampler
            .process(&[frame], None)
            .map_err(|e| CaptureError::DeviceError(format!("Resampling failed: {}", e)))?;

        let mut output: Vec<i16> = resampled[0].iter().map(|&s| to_i16(s)).collect();
        output.truncate(expected);
        Ok(output)
    }
}

fn to_i16(sample: f32) -> i16 {
    (sample * 32767.0).clamp(-32768.0, 32767.0) as i16
}
