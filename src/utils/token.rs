//! Token counting traits and utilities

pub mod tiktoken;

/// Label value ignored by the loss when fine-tuning on prompt/answer pairs.
pub const IGNORE_INDEX: i64 = -100;
pub const DEFAULT_PAD_TOKEN: &str = "<pad>";
pub const DEFAULT_EOS_TOKEN: &str = "</s>";
pub const DEFAULT_BOS_TOKEN: &str = "<s>";
pub const DEFAULT_UNK_TOKEN: &str = "<unk>";

/// Context window of the extraction model minus the room reserved for one answer.
pub const TENTATIVE_MAX_LENGTH_BEFORE_COMPLETION: usize = 2048 - 130;

/// Trait for counting tokens in a string.
pub trait CountToken {
    fn count_token(&self, string: &str) -> usize;
}

/// Blanket impl of CountToken for Fn(&str) -> usize.
impl<F> CountToken for F where F: Fn(&str) -> usize {
    fn count_token(&self, string: &str) -> usize {
        self(string)
    }
}

/// Count the number of tokens in a string by the length of the string.
#[inline]
pub fn count_tokens_by_len(string: &str) -> usize {
    string.len()
}

/// Number of tokens the counter produces for `text`, without truncation.
#[inline]
pub fn tokenized_length(text: &str, counter: &impl CountToken) -> usize {
    counter.count_token(text)
}

/// Whether a prompt leaves enough room in the context window for a completion.
pub fn fits_before_completion(text: &str, counter: &impl CountToken) -> bool {
    tokenized_length(text, counter) <= TENTATIVE_MAX_LENGTH_BEFORE_COMPLETION
}
