//! Content classification
//!
//! The curation stage asks an LLM whether each harvested page carries real
//! content. The oracle is reached through the [`Classifier`] trait;
//! [`LlmClassifier`] is the default implementation against a
//! generateContent-style API. Verdict parsing lives here so fakes and the
//! real client share it.

mod llm;

pub use llm::LlmClassifier;

use async_trait::async_trait;
use thiserror::Error;

/// Instruction sent with every classification request
///
/// The tie-break policy is delegated entirely to this prompt: a page is
/// USELESS only when its content is overwhelmingly placeholder, error, or
/// empty text; substantive content mixed with boilerplate is still USEFUL.
pub const CLASSIFY_INSTRUCTION: &str = "You are reviewing the text extracted from one web page. \
Reply with exactly one word: USEFUL or USELESS. \
The page is USELESS only if its content is overwhelmingly placeholder text, an error page, \
or effectively empty. Any page with substantive content is USEFUL, \
even if it is mixed with boilerplate.";

/// Usefulness verdict for one harvested page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Useful,
    Useless,
}

/// Parses an oracle response into a verdict
///
/// Case-insensitive substring match on "useless"; anything else, including
/// chatter around the expected one-word answer, counts as useful. There is
/// no unparsable case: an ambiguous response retains the content.
pub fn parse_verdict(response: &str) -> Verdict {
    if response.to_lowercase().contains("useless") {
        Verdict::Useless
    } else {
        Verdict::Useful
    }
}

/// Errors from the classification oracle
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("Classifier HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Classifier returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Classifier response contained no text")]
    EmptyResponse,

    #[error("Missing API key: environment variable {0} is not set")]
    MissingCredential(String),

    #[error("Curation requested but no classifier was configured")]
    NotConfigured,
}

/// Capability to label page text as useful or useless
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Submits the instruction and content, returning the raw response text
    async fn classify(&self, instruction: &str, content: &str) -> Result<String, ClassifyError>;
}
