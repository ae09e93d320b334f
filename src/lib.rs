pub mod annotate;
pub mod engines;
pub mod models;
pub mod pipeline;
pub mod recognition;

pub use models::{ReadingSource, RecognitionResult, Rectangle, RegionReading};
pub use recognition::{DigitRecognizer, build_standard_normalizer, load_image};
pub use recognition::ocr::{DIGIT_CONFIGS, OcrConfig, OcrEngine, SegmentationMode};
pub use pipeline::{DebugConfig, NormalizeStep, Normalizer, PipelineContext};
pub use engines::{EngineKind, EngineSettings, build_engine};
