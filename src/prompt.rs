//! # Prompt
//! A prompt is simply a string.
//!
//! ## PromptTemplate
//! A prompt template is a string with placeholders. It can also carry metadata in JSON format, for
//! example the task table row a question template was generated from.
//!
//! ## Placeholder
//! A placeholder looks like `{[name]}`. The name is the text between the brackets and may not
//! contain line breaks.
//!
//! ## PartialPrompt
//! A partial prompt is a template with some placeholders filled. It can only be built with
//! [PromptTemplate::construct_prompt]. Fill placeholders with [PartialPrompt::fill] or
//! [PartialPrompt::try_fill] (filling again replaces the earlier value), then turn it into the final
//! text with [PartialPrompt::complete].
//!
//! [PartialPrompt::current_token_num] measures the prompt as it currently stands, which is how the
//! record-extraction prompts are checked against the model's context window before generation.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use log::warn;

use crate::prompt::errors::{PlaceholderNotExist, UnfilledPlaceholders};
use crate::utils::string::{get_placeholders, replace_placeholders};
use crate::utils::token::CountToken;
use crate::utils::JsonMap;


/// A prompt template with placeholders and optional metadata.
#[derive(Debug, Clone)]
#[readonly::make]
pub struct PromptTemplate {
    template: Arc<String>,

    /// The placeholders in the template, readonly
    #[readonly]
    pub placeholders: BTreeSet<String>,

    /// The metadata of the prompt template, readonly
    #[readonly]
    pub meta_data: Arc<JsonMap>,
}

impl PromptTemplate {
    /// Create a prompt template from a string without metadata.
    pub fn new(template: impl Into<String>) -> Self {
        Self::with_metadata(template, JsonMap::new())
    }

    /// Create a prompt template from a string with metadata. Warns if the template has no placeholder.
    pub fn with_metadata(template: impl Into<String>, metadata: JsonMap) -> Self {
        let template = template.into();
        let placeholders: BTreeSet<String> = get_placeholders(&template).into_iter().collect();
        if placeholders.is_empty() {
            warn!("Prompt template has no placeholder; check that placeholders are written as {{[name]}}.\n\
            Got prompt template:\n\
            {}", template);
        }
        Self {
            template: Arc::new(template),
            placeholders,
            meta_data: Arc::new(metadata),
        }
    }

    #[inline]
    pub fn str(&self) -> &str {
        &self.template
    }

    /// Start filling the template.
    pub fn construct_prompt(&self) -> PartialPrompt {
        PartialPrompt {
            template: self.clone(),
            values: HashMap::with_capacity(self.placeholders.len()),
        }
    }
}

/// A prompt template with some placeholders filled.
#[derive(Debug, Clone)]
#[readonly::make]
pub struct PartialPrompt {
    /// The template of the partial prompt, readonly
    #[readonly]
    pub template: PromptTemplate,

    values: HashMap<String, String>,
}

impl PartialPrompt {
    /// Fill a placeholder. Panics if the template has no such placeholder.
    ///
    /// Use it with placeholder names that are fixed in the code; use [PartialPrompt::try_fill] otherwise.
    pub fn fill(&mut self, placeholder: impl Into<String>, value: impl Into<String>) -> &mut Self {
        match self.try_fill(placeholder, value) {
            Ok(prompt) => prompt,
            Err(e) => panic!("{}", e),
        }
    }

    /// Fill a placeholder, or return [PlaceholderNotExist] if the template has no such placeholder.
    pub fn try_fill(&mut self, placeholder: impl Into<String>, value: impl Into<String>) -> Result<&mut Self, PlaceholderNotExist> {
        let placeholder = placeholder.into();
        if self.template.placeholders.contains(&placeholder) {
            self.values.insert(placeholder, value.into());
            Ok(self)
        } else {
            Err(PlaceholderNotExist::new(placeholder, value, &self.template.placeholders))
        }
    }

    pub fn value_of(&self, placeholder: &str) -> Option<&str> {
        self.values.get(placeholder).map(String::as_str)
    }

    pub fn unfilled_placeholders(&self) -> Vec<String> {
        self.template.placeholders.iter()
            .filter(|p| !self.values.contains_key(p.as_str()))
            .cloned()
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.values.len() == self.template.placeholders.len()
    }

    /// Count the tokens of the prompt as it currently stands. Unfilled placeholders are counted verbatim.
    pub fn current_token_num(&self, counter: &impl CountToken) -> usize {
        counter.count_token(&replace_placeholders(self.template.str(), &self.values))
    }

    /// Replace every placeholder with its value, or return [UnfilledPlaceholders] if some are still empty.
    pub fn complete(&self) -> Result<String, UnfilledPlaceholders> {
        if self.is_complete() {
            Ok(replace_placeholders(self.template.str(), &self.values))
        } else {
            Err(UnfilledPlaceholders {
                all_placeholders: self.template.placeholders.iter().cloned().collect(),
                unfilled_placeholders: self.unfilled_placeholders(),
            })
        }
    }
}

pub mod errors {
    use std::collections::BTreeSet;
    use std::error::Error;
    use std::fmt;
    use std::fmt::Formatter;

    /// Error when trying to complete a partial prompt but there are still unfilled placeholders.
    #[derive(Debug)]
    pub struct UnfilledPlaceholders {
        pub unfilled_placeholders: Vec<String>,
        pub all_placeholders: Vec<String>,
    }

    impl fmt::Display for UnfilledPlaceholders {
        fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
            write!(f, "UnfilledPlaceholders: to complete the prompt template,\n  Requires Placeholders:{:?}\n  Unfilled Placeholders:{:?}",
                   self.all_placeholders, self.unfilled_placeholders)
        }
    }

    impl Error for UnfilledPlaceholders {}

    /// Error when trying to fill a placeholder that the template does not have.
    #[derive(Debug)]
    pub struct PlaceholderNotExist {
        pub try_fill_placeholder: String,
        pub value: String,
        pub available_placeholders: Vec<String>,
    }

    impl PlaceholderNotExist {
        pub(crate) fn new(try_fill_placeholder: impl Into<String>,
                          value: impl Into<String>,
                          available_placeholders: &BTreeSet<String>) -> Self {
            PlaceholderNotExist {
                try_fill_placeholder: try_fill_placeholder.into(),
                value: value.into(),
                available_placeholders: available_placeholders.iter().cloned().collect(),
            }
        }
    }

    impl fmt::Display for PlaceholderNotExist {
        fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
            write!(f, "PlaceholderNotExist: try to fill placeholder = {} with value = {}, but available placeholders are {:?}",
                   self.try_fill_placeholder,
                   self.value,
                   self.available_placeholders)
        }
    }

    impl Error for PlaceholderNotExist {}
}

#[cfg(test)]
mod test_prompt {
    use serde_json::json;
    use super::PromptTemplate;
    use crate::utils::token::count_tokens_by_len;

    #[test]
    fn test_fill_and_complete() {
        let template = PromptTemplate::new("Record: {[record]}\nAnswer {[question]} for {[record]}");
        let mut prompt = template.construct_prompt();
        assert!(!prompt.is_complete());
        prompt.fill("record", "GSM1");
        let err = prompt.complete().unwrap_err();
        assert_eq!(vec!["question".to_string()], err.unfilled_placeholders);
        assert_eq!(vec!["question".to_string(), "record".to_string()], err.all_placeholders);

        prompt.fill("question", "1").fill("record", "GSM2");
        assert_eq!(Some("GSM2"), prompt.value_of("record"));
        assert_eq!("Record: GSM2\nAnswer 1 for GSM2", prompt.complete().unwrap());
    }

    #[test]
    fn test_try_fill_unknown() {
        let template = PromptTemplate::new("{[a]}");
        let mut prompt = template.construct_prompt();
        let err = prompt.try_fill("b", "x").unwrap_err();
        assert_eq!("b", err.try_fill_placeholder);
        assert_eq!(vec!["a".to_string()], err.available_placeholders);
    }

    #[test]
    fn test_token_num_and_metadata() {
        let metadata = json!({"row": 12}).as_object().unwrap().clone();
        let template = PromptTemplate::with_metadata("ab{[x]}", metadata);
        assert_eq!(json!(12), template.meta_data["row"]);
        let mut prompt = template.construct_prompt();
        assert_eq!(7, prompt.current_token_num(&count_tokens_by_len));
        prompt.fill("x", "c");
        assert_eq!(3, prompt.current_token_num(&count_tokens_by_len));
    }
}
