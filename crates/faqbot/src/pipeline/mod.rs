pub mod certificate;
pub mod context;
pub mod qa;
pub mod synthesizer;

pub use certificate::{CertificateVerifier, DocumentUploader};
pub use qa::{EmptyContextPolicy, QaAnswer, QaOptions, QaOrchestrator, QaOutcome};
pub use synthesizer::{AnswerSynthesizer, GenerationFailurePolicy, Synthesis};
