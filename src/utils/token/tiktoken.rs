use anyhow::{Context, Result};
pub use tiktoken_rs::{cl100k_base, get_bpe_from_model, CoreBPE};

use crate::utils::token::CountToken;

/// Counter using the Tiktoken tokenizer.
///
/// The extraction model has its own SentencePiece vocabulary, so counts from this counter are an
/// estimate. They are close enough to budget prompts against
/// [TENTATIVE_MAX_LENGTH_BEFORE_COMPLETION](crate::utils::token::TENTATIVE_MAX_LENGTH_BEFORE_COMPLETION).
#[derive(Clone)]
#[readonly::make]
pub struct Tiktoken {
    /// The model name of the tokenizer. read-only.
    #[readonly]
    pub model: String,
    /// The tokenizer. read-only.
    #[readonly]
    pub bpe: CoreBPE,
}

impl Tiktoken {
    /// Create a new Tiktoken counter for a model known to `tiktoken-rs`.
    pub fn new(model: impl Into<String>) -> Result<Self> {
        let model = model.into();
        let bpe = get_bpe_from_model(model.as_str())
            .with_context(|| format!("no tiktoken encoding for model {}", model))?;
        Ok(Self { model, bpe })
    }

    /// Create a counter backed by the `cl100k_base` encoding.
    pub fn cl100k() -> Result<Self> {
        Ok(Self {
            model: "cl100k_base".to_string(),
            bpe: cl100k_base()?,
        })
    }
}

impl CountToken for Tiktoken {
    fn count_token(&self, string: &str) -> usize {
        self.bpe.encode_with_special_tokens(string).len()
    }
}
