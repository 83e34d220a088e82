//! Microphone adapter using cpal
//!
//! Captures mono speech at the device rate, resamples to 16kHz and emits
//! encoded chunks on a fixed interval:
//! - WAV: streaming header with the first samples, then raw PCM chunks
//! - FLAC: one complete stream when the input closes
//!
//! The stream lives on a dedicated thread because `cpal::Stream` is not
//! `Send`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, StreamConfig};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::flac_encoder::SpeechFlacEncoder;
use super::resampler::StreamResampler;
use super::wav::{pcm_bytes, streaming_header};
use crate::application::ports::{
    CaptureError, CaptureRequest, ChunkSender, EncodingSupport, InputHandle, Microphone,
};
use crate::domain::recording::EncodingId;

/// Process-wide ownership of the input device
static DEVICE_CLAIMED: AtomicBool = AtomicBool::new(false);

/// Held for as long as a capture thread owns the device
struct DeviceClaim;

impl DeviceClaim {
    fn acquire() -> Option<Self> {
        DEVICE_CLAIMED
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self)
    }
}

impl Drop for DeviceClaim {
    fn drop(&mut self) {
        DEVICE_CLAIMED.store(false, Ordering::SeqCst);
    }
}

/// Samples captured by the stream callback, not yet encoded
type CaptureBuffer = Arc<Mutex<Vec<i16>>>;

/// Microphone backed by the default cpal input device
pub struct CpalMicrophone {
    encodings: Vec<EncodingId>,
}

impl CpalMicrophone {
    /// Microphone producing FLAC or WAV. Opus needs libopus and is not offered.
    pub fn new() -> Self {
        Self {
            encodings: vec![EncodingId::Flac, EncodingId::Wav],
        }
    }

    /// Microphone limited to streamed WAV
    pub fn wav_only() -> Self {
        Self {
            encodings: vec![EncodingId::Wav],
        }
    }

    fn input_device() -> Result<cpal::Device, CaptureError> {
        let host = cpal::default_host();
        host.default_input_device()
            .ok_or_else(|| CaptureError::DeviceError("No audio input device found".into()))
    }

    /// Pick a stream configuration, preferring mono and the requested rate
    fn input_config(
        device: &cpal::Device,
        target_rate: u32,
    ) -> Result<(StreamConfig, SampleFormat), CaptureError> {
        let supported_configs = device
            .supported_input_configs()
            .map_err(|e| classify(format!("Failed to get configs: {}", e)))?;

        let mut best_config: Option<cpal::SupportedStreamConfigRange> = None;

        for config in supported_configs {
            if config.sample_format() != SampleFormat::I16
                && config.sample_format() != SampleFormat::F32
            {
                continue;
            }

            let includes_target = config.min_sample_rate().0 <= target_rate
                && config.max_sample_rate().0 >= target_rate;

            let is_better = match &best_config {
                None => true,
                Some(current) => {
                    let fewer_channels = config.channels() < current.channels();
                    let better_rate =
                        includes_target && current.min_sample_rate().0 > target_rate;
                    fewer_channels || better_rate
                }
            };
            if is_better {
                best_config = Some(config);
            }
        }

        let config_range = best_config
            .ok_or_else(|| CaptureError::DeviceError("No suitable input config found".into()))?;

        let sample_rate = if config_range.min_sample_rate().0 <= target_rate
            && config_range.max_sample_rate().0 >= target_rate
        {
            SampleRate(target_rate)
        } else {
            config_range.min_sample_rate()
        };

        let config = StreamConfig {
            channels: config_range.channels(),
            sample_rate,
            buffer_size: cpal::BufferSize::Default,
        };

        Ok((config, config_range.sample_format()))
    }

    /// Mix interleaved frames down to mono
    fn downmix(samples: &[i16], channels: u16) -> Vec<i16> {
        if channels == 1 {
            return samples.to_vec();
        }

        samples
            .chunks(channels as usize)
            .map(|frame| {
                let sum: i32 = frame.iter().map(|&s| i32::from(s)).sum();
                (sum / i32::from(channels)) as i16
            })
            .collect()
    }

    fn build_stream(
        device: &cpal::Device,
        config: &StreamConfig,
        sample_format: SampleFormat,
        captured: CaptureBuffer,
    ) -> Result<cpal::Stream, CaptureError> {
        let channels = config.channels;
        let on_error = |err: cpal::StreamError| warn!(error = %err, "audio stream error");

        let stream = match sample_format {
            SampleFormat::I16 => device.build_input_stream(
                config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    let mono = Self::downmix(data, channels);
                    captured.lock().extend_from_slice(&mono);
                },
                on_error,
                None,
            ),
            SampleFormat::F32 => device.build_input_stream(
                config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let i16_data: Vec<i16> =
                        data.iter().map(|&s| (s * 32767.0) as i16).collect();
                    let mono = Self::downmix(&i16_data, channels);
                    captured.lock().extend_from_slice(&mono);
                },
                on_error,
                None,
            ),
            other => {
                return Err(CaptureError::DeviceError(format!(
                    "Unsupported sample format: {:?}",
                    other
                )))
            }
        };

        stream.map_err(|e| classify(e.to_string()))
    }

    /// Body of the capture thread
    fn run_capture(
        request: CaptureRequest,
        chunks: ChunkSender,
        stop: Arc<AtomicBool>,
        ready: oneshot::Sender<Result<u32, CaptureError>>,
    ) -> Result<(), CaptureError> {
        let captured: CaptureBuffer = Arc::new(Mutex::new(Vec::new()));

        let opened = Self::input_device().and_then(|device| {
            let (config, sample_format) = Self::input_config(&device, request.sample_rate)?;
            let stream = Self::build_stream(&device, &config, sample_format, Arc::clone(&captured))?;
            stream.play().map_err(|e| classify(e.to_string()))?;
            Ok((stream, config.sample_rate.0))
        });

        let (stream, device_rate) = match opened {
            Ok(opened) => opened,
            Err(err) => {
                let _ = ready.send(Err(err.clone()));
                return Err(err);
            }
        };

        let mut encoder = match ChunkEncoder::new(request, device_rate) {
            Ok(encoder) => encoder,
            Err(err) => {
                let _ = ready.send(Err(err.clone()));
                return Err(err);
            }
        };
        let _ = ready.send(Ok(device_rate));

        while !stop.load(Ordering::SeqCst) {
            std::thread::sleep(request.chunk_interval);
            let samples = std::mem::take(&mut *captured.lock());
            if let Some(chunk) = encoder.push(&samples)? {
                if chunks.send(chunk).is_err() {
                    debug!("chunk receiver dropped, ending capture");
                    break;
                }
            }
        }

        drop(stream);
        let rest = std::mem::take(&mut *captured.lock());
        if let Some(chunk) = encoder.finish(&rest)? {
            let _ = chunks.send(chunk);
        }
        Ok(())
    }
}

impl Default for CpalMicrophone {
    fn default() -> Self {
        Self::new()
    }
}

impl EncodingSupport for CpalMicrophone {
    fn supports(&self, encoding: EncodingId) -> bool {
        self.encodings.contains(&encoding)
    }
}

#[async_trait]
impl Microphone for CpalMicrophone {
    async fn open(
        &self,
        request: CaptureRequest,
        chunks: ChunkSender,
    ) -> Result<Box<dyn InputHandle>, CaptureError> {
        if !self.supports(request.encoding) {
            return Err(CaptureError::Unsupported(request.encoding));
        }
        let claim = DeviceClaim::acquire().ok_or(CaptureError::DeviceBusy)?;

        // cpal exposes no capture DSP switches; the platform default applies
        debug!(
            echo_cancellation = request.echo_cancellation,
            noise_suppression = request.noise_suppression,
            "requested input processing"
        );

        let stop = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = oneshot::channel();
        let (done_tx, done_rx) = oneshot::channel();

        let thread_stop = Arc::clone(&stop);
        std::thread::Builder::new()
            .name("nivelver-capture".into())
            .spawn(move || {
                let _claim = claim;
                let result = Self::run_capture(request, chunks, thread_stop, ready_tx);
                if let Err(ref err) = result {
                    warn!(error = %err, "capture thread failed");
                }
                let _ = done_tx.send(result);
            })
            .map_err(|e| CaptureError::DeviceError(format!("Failed to spawn capture thread: {}", e)))?;

        match ready_rx.await {
            Ok(Ok(device_rate)) => {
                info!(
                    device_rate,
                    target_rate = request.sample_rate,
                    encoding = %request.encoding,
                    "microphone opened"
                );
                Ok(Box::new(CpalInputHandle {
                    stop,
                    done: Some(done_rx),
                }))
            }
            Ok(Err(err)) => Err(err),
            Err(_) => Err(CaptureError::DeviceError(
                "Capture thread exited before the device opened".into(),
            )),
        }
    }
}

/// Open cpal input session
struct CpalInputHandle {
    stop: Arc<AtomicBool>,
    done: Option<oneshot::Receiver<Result<(), CaptureError>>>,
}

#[async_trait]
impl InputHandle for CpalInputHandle {
    async fn close(self: Box<Self>) -> Result<(), CaptureError> {
        let mut this = self;
        this.stop.store(true, Ordering::SeqCst);
        let Some(done) = this.done.take() else {
            return Ok(());
        };
        match done.await {
            Ok(result) => result,
            Err(_) => Err(CaptureError::DeviceError(
                "Capture thread ended without reporting".into(),
            )),
        }
    }
}

impl Drop for CpalInputHandle {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

/// Turns captured samples into chunks of the negotiated encoding
enum ChunkEncoder {
    Wav {
        resampler: StreamResampler,
        sample_rate: u32,
        header_sent: bool,
    },
    Flac {
        resampler: StreamResampler,
        encoder: SpeechFlacEncoder,
        samples: Vec<i16>,
    },
}

impl ChunkEncoder {
    fn new(request: CaptureRequest, device_rate: u32) -> Result<Self, CaptureError> {
        let resampler = StreamResampler::new(device_rate, request.sample_rate)?;
        match request.encoding {
            EncodingId::Wav => Ok(Self::Wav {
                resampler,
                sample_rate: request.sample_rate,
                header_sent: false,
            }),
            EncodingId::Flac => Ok(Self::Flac {
                resampler,
                encoder: SpeechFlacEncoder::new(request.sample_rate)
                    .map_err(|e| CaptureError::DeviceError(e.to_string()))?,
                samples: Vec::new(),
            }),
            other => Err(CaptureError::Unsupported(other)),
        }
    }

    fn push(&mut self, captured: &[i16]) -> Result<Option<Vec<u8>>, CaptureError> {
        match self {
            Self::Wav {
                resampler,
                sample_rate,
                header_sent,
            } => {
                let pcm = resampler.push(captured)?;
                Ok(wav_chunk(&pcm, *sample_rate, header_sent))
            }
            Self::Flac {
                resampler,
                samples,
                ..
            } => {
                samples.extend(resampler.push(captured)?);
                Ok(None)
            }
        }
    }

    fn finish(&mut self, captured: &[i16]) -> Result<Option<Vec<u8>>, CaptureError> {
        match self {
            Self::Wav {
                resampler,
                sample_rate,
                header_sent,
            } => {
                let mut pcm = resampler.push(captured)?;
                pcm.extend(resampler.finish()?);
                Ok(wav_chunk(&pcm, *sample_rate, header_sent))
            }
            Self::Flac {
                resampler,
                encoder,
                samples,
            } => {
                samples.extend(resampler.push(captured)?);
                samples.extend(resampler.finish()?);
                if samples.is_empty() {
                    return Ok(None);
                }
                let flac = encoder
                    .encode(samples.as_slice())
                    .map_err(|e| CaptureError::DeviceError(e.to_string()))?;
                Ok(Some(flac))
            }
        }
    }
}

/// PCM bytes, preceded by the header on the first non-empty chunk
fn wav_chunk(pcm: &[i16], sample_rate: u32, header_sent: &mut bool) -> Option<Vec<u8>> {
    if pcm.is_empty() {
        return None;
    }
    let mut chunk = Vec::new();
    if !*header_sent {
        chunk.extend(streaming_header(sample_rate));
        *header_sent = true;
    }
    chunk.extend(pcm_bytes(pcm));
    Some(chunk)
}

/// Map a platform error message onto the capture taxonomy
fn classify(message: String) -> CaptureError {
    let lower = message.to_ascii_lowercase();
    if lower.contains("permission") || lower.contains("not authorized") || lower.contains("denied")
    {
        CaptureError::PermissionDenied
    } else {
        CaptureError::DeviceError(message)
    }
}
