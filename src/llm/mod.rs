//! Text generation backends
//!
//! Every participant talks to a [`Generator`]. The orchestrator only ever sees
//! the trait; which backend sits behind it is decided from configuration:
//!
//! - **openai**: hosted chat completions over HTTP
//! - **local**: an on-device model loaded with mistral.rs (feature `local-llm`)

pub mod generator;
#[cfg(feature = "local-llm")]
pub mod local;
pub mod openai;

pub use generator::{GenerationOptions, GenerationRequest, Generator};
#[cfg(feature = "local-llm")]
pub use local::LocalGenerator;
pub use openai::OpenAiGenerator;
