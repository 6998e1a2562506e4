pub mod inference_client;
pub mod orchestrator;

pub use inference_client::{GroqClient, ImageSource, InferenceGateway, InferenceOutcome};
pub use orchestrator::{AnalysisOrchestrator, AnalysisOutcome, PipelineState};
