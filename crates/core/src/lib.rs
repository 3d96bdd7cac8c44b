pub mod config;
pub mod digest;
pub mod llm;
pub mod playlist;
pub mod references;
pub mod testing;

pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config,
    ConfigError, SanitizedConfig,
};
pub use digest::{
    run_digest, Coordinator, DigestError, DigestReport, ItemProcessor, MarkdownDirSink,
    PipelineStage, ResultSink, SummarizeAndVerify, WorkItem,
};
pub use llm::{FileUploader, GeminiClient, LlmClient, LlmError};
pub use playlist::{ItemSource, SourceError, StaticItemSource, VideoItem, YouTubePlaylistSource};
pub use references::{ReferenceDocument, ReferenceError, ReferenceSet};
