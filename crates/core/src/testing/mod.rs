//! Testing utilities and mock implementations.
//!
//! Mocks for the external seams (LLM calls, file uploads, per-item
//! processing) so the whole pipeline can run without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use tubedigest_core::testing::{fixtures, MockLlmClient, MockUploader};
//!
//! let llm = MockLlmClient::new();
//! llm.fail_call("Goroutines", 2);
//!
//! let uploader = MockUploader::new();
//! uploader.fail_on("go1.17.pdf");
//! ```

mod mock_llm;
mod mock_uploader;
mod stub_processor;

pub use crate::digest::MemorySink;
pub use mock_llm::MockLlmClient;
pub use mock_uploader::MockUploader;
pub use stub_processor::StubProcessor;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::playlist::VideoItem;

    /// Create a playlist video with reasonable defaults.
    pub fn video_item(video_id: &str, title: &str) -> VideoItem {
        VideoItem::new(video_id, title)
    }

    /// Create `count` videos titled "Lesson 1", "Lesson 2", ...
    pub fn lessons(count: usize) -> Vec<VideoItem> {
        (1..=count)
            .map(|i| {
                let mut item = video_item(&format!("vid{:03}", i), &format!("Lesson {}", i));
                item.position = (i - 1) as u32;
                item
            })
            .collect()
    }
}
