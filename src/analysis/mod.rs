// Analysis module - per-capture DSP and two-stage classification
//
// Pipeline: Capture → SpectralAnalyzer (PSD + spectrogram)
//                   → BlobMorphologyAnalyzer (spectrogram regions)
//                   → FeatureExtractor (19-field FeatureVector)
//                   → DeviceClassifier (class stage, then identity stage)

pub mod classifier;
pub mod features;
pub mod morphology;
pub mod spectral;
pub mod stft;
