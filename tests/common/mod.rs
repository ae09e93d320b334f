#![allow(dead_code)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from barcode_digits for tests
pub use barcode_digits::{
    DigitRecognizer, OcrConfig, OcrEngine, ReadingSource, RecognitionResult, Rectangle,
    SegmentationMode,
};
