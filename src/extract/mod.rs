//! Prescription-text extraction pipeline: OCR cleanup, then dictionary
//! driven segmentation and per-segment dosage/frequency/duration parsing.
//!
//! Everything here is a pure function over the input text and the loaded
//! [`ReferenceData`](crate::reference::ReferenceData) — no I/O, no state.

pub mod extractor;
pub mod normalize;

pub use extractor::extract_medicines;
pub use normalize::normalize_ocr_text;
