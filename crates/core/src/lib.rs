pub mod error;
pub mod traits;
pub mod types;

pub use error::{ServiceError, StoreError};
pub use traits::{CompletionProvider, CompletionRequest, CompletionResponse, FrameCleaner};
pub use types::{CleanedFrame, FrameObservation, FrameStatus, OcrFragment, PlayerStack};
