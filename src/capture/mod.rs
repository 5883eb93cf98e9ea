//! Raw capture loading.
//!
//! A capture file is a flat little-endian array of fixed-width real samples
//! in which even-indexed values are real parts and odd-indexed values are
//! imaginary parts. Files are decoded in list order and concatenated into a
//! single immutable [`Capture`].
//!
//! Truncation policy: a file whose element count is odd loses its final
//! unpaired element, and trailing bytes that do not fill a whole element are
//! ignored. Both happen per file, before concatenation.

pub mod synthetic;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rustfft::num_complex::Complex32;
use serde::{Deserialize, Serialize};

use crate::error::CaptureError;

/// Fixed-width real sample encodings understood by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleType {
    F32,
    F64,
    I16,
    I8,
    /// Offset-binary bytes centred on 127.5
    U8,
}

impl SampleType {
    /// Bytes per real element
    pub fn width(self) -> usize {
        match self {
            SampleType::F32 => 4,
            SampleType::F64 => 8,
            SampleType::I16 => 2,
            SampleType::I8 | SampleType::U8 => 1,
        }
    }

    fn decode(self, bytes: &[u8]) -> f32 {
        match self {
            SampleType::F32 => f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            SampleType::F64 => {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(&bytes[..8]);
                f64::from_le_bytes(raw) as f32
            }
            SampleType::I16 => i16::from_le_bytes([bytes[0], bytes[1]]) as f32 / 32768.0,
            SampleType::I8 => bytes[0] as i8 as f32 / 128.0,
            SampleType::U8 => (bytes[0] as f32 - 127.5) / 127.5,
        }
    }

    fn encode(self, value: f32, out: &mut Vec<u8>) {
        match self {
            SampleType::F32 => out.extend_from_slice(&value.to_le_bytes()),
            SampleType::F64 => out.extend_from_slice(&(value as f64).to_le_bytes()),
            SampleType::I16 => {
                let scaled = (value * 32768.0).round().clamp(-32768.0, 32767.0) as i16;
                out.extend_from_slice(&scaled.to_le_bytes());
            }
            SampleType::I8 => {
                let scaled = (value * 128.0).round().clamp(-128.0, 127.0) as i8;
                out.push(scaled as u8);
            }
            SampleType::U8 => {
                let scaled = (value * 127.5 + 127.5).round().clamp(0.0, 255.0);
                out.push(scaled as u8);
            }
        }
    }
}

impl FromStr for SampleType {
    type Err = CaptureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "f32" | "float32" => Ok(SampleType::F32),
            "f64" | "float64" => Ok(SampleType::F64),
            "i16" | "int16" => Ok(SampleType::I16),
            "i8" | "int8" => Ok(SampleType::I8),
            "u8" | "uint8" => Ok(SampleType::U8),
            _ => Err(CaptureError::InvalidSampleType {
                name: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for SampleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SampleType::F32 => "f32",
            SampleType::F64 => "f64",
            SampleType::I16 => "i16",
            SampleType::I8 => "i8",
            SampleType::U8 => "u8",
        };
        f.write_str(name)
    }
}

/// An ordered, non-empty sequence of complex samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Capture {
    samples: Vec<Complex32>,
}

impl Capture {
    /// Wrap samples, rejecting an empty sequence
    pub fn new(samples: Vec<Complex32>) -> Result<Self, CaptureError> {
        if samples.is_empty() {
            return Err(CaptureError::EmptyCapture { paths: Vec::new() });
        }
        Ok(Self { samples })
    }

    pub fn samples(&self) -> &[Complex32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Reads raw interleaved captures of one sample type.
#[derive(Debug, Clone, Copy)]
pub struct SignalLoader {
    sample_type: SampleType,
}

impl SignalLoader {
    pub fn new(sample_type: SampleType) -> Self {
        Self { sample_type }
    }

    pub fn sample_type(&self) -> SampleType {
        self.sample_type
    }

    /// Load and concatenate captures in path order
    ///
    /// # Errors
    /// Any missing or unreadable file aborts the whole load with the
    /// offending path; no partial capture is returned.
    pub fn load<P: AsRef<Path>>(&self, paths: &[P]) -> Result<Capture, CaptureError> {
        if paths.is_empty() {
            return Err(CaptureError::NoFiles);
        }

        let mut samples = Vec::new();
        for path in paths {
            let path = path.as_ref();
            let bytes =
                fs::read(path).map_err(|err| CaptureError::from_io(path.to_path_buf(), &err))?;
            let before = samples.len();
            self.decode_into(&bytes, path, &mut samples);
            tracing::debug!(
                path = %path.display(),
                bytes = bytes.len(),
                samples = samples.len() - before,
                "decoded capture file"
            );
        }

        if samples.is_empty() {
            return Err(CaptureError::EmptyCapture {
                paths: paths.iter().map(|p| p.as_ref().to_path_buf()).collect(),
            });
        }

        tracing::info!(
            files = paths.len(),
            samples = samples.len(),
            sample_type = %self.sample_type,
            "loaded capture"
        );
        Ok(Capture { samples })
    }

    fn decode_into(&self, bytes: &[u8], path: &Path, samples: &mut Vec<Complex32>) {
        let width = self.sample_type.width();
        let reals: Vec<f32> = bytes
            .chunks_exact(width)
            .map(|chunk| self.sample_type.decode(chunk))
            .collect();

        if reals.len() % 2 == 1 {
            tracing::debug!(
                path = %path.display(),
                "odd element count, dropping final unpaired sample"
            );
        }

        samples.extend(
            reals
                .chunks_exact(2)
                .map(|pair| Complex32::new(pair[0], pair[1])),
        );
    }
}

/// Encode a capture as interleaved little-endian samples
pub fn encode_interleaved(capture: &Capture, sample_type: SampleType) -> Vec<u8> {
    let mut out = Vec::with_capacity(capture.len() * 2 * sample_type.width());
    for sample in capture.samples() {
        sample_type.encode(sample.re, &mut out);
        sample_type.encode(sample.im, &mut out);
    }
    out
}

/// Write a capture file readable by [`SignalLoader`]
pub fn write_interleaved<P: AsRef<Path>>(
    path: P,
    capture: &Capture,
    sample_type: SampleType,
) -> Result<(), CaptureError> {
    let path = path.as_ref();
    fs::write(path, encode_interleaved(capture, sample_type)).map_err(|err| {
        CaptureError::WriteFailed {
            path: PathBuf::from(path),
            reason: err.to_string(),
        }
    })
}
