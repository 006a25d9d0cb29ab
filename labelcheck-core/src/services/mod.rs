//! External collaborators: OCR service and SQLite-backed reference and
//! product tables

pub mod batch;
pub mod ocr_client;
pub mod product_source;
pub mod reference_store;

pub use batch::BatchReader;
pub use ocr_client::{
    parse_vision_response, scan_label, ImageSource, OcrError, OcrOutput, OcrProvider,
    VisionOcrClient,
};
pub use product_source::ProductSource;
pub use reference_store::{
    open_read_only, InMemoryReferenceStore, ReferenceStore, SqliteReferenceStore,
};
