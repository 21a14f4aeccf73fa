//! # Filler
//! Anything that fills one or more placeholders of a [PartialPrompt].
//!
//! A filler that needs nothing but itself implements [FillWith<()>](FillWith) and gets [Fill] for
//! free. Fillers that need per-call input, such as the sample record for the extraction prompt,
//! take it as the context of [FillWith] and hand it back when done.

use std::collections::BTreeMap;

use anyhow::Result;

use crate::prompt::PartialPrompt;

pub trait FillPlaceholders {
    fn placeholders_to_fill(&self) -> &[String];
}

pub trait Fill: FillPlaceholders {
    fn fill(&self, partial_prompt: &mut PartialPrompt) -> Result<()>;
}

pub trait FillWith<CTX>: FillPlaceholders {
    fn fill_with(&self, partial_prompt: &mut PartialPrompt, context: CTX) -> Result<CTX>;
}

impl<T: FillWith<()>> Fill for T {
    fn fill(&self, partial_prompt: &mut PartialPrompt) -> Result<()> {
        self.fill_with(partial_prompt, ())
    }
}

/// Fills placeholders with fixed values, e.g. the header and footer shared by every record prompt.
#[derive(Debug, Clone, Default)]
pub struct StaticFiller {
    placeholders: Vec<String>,
    values: BTreeMap<String, String>,
}

impl StaticFiller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, placeholder: impl Into<String>, value: impl Into<String>) -> Self {
        let placeholder = placeholder.into();
        if self.values.insert(placeholder.clone(), value.into()).is_none() {
            self.placeholders.push(placeholder);
        }
        self
    }
}

impl FillPlaceholders for StaticFiller {
    fn placeholders_to_fill(&self) -> &[String] {
        &self.placeholders
    }
}

impl FillWith<()> for StaticFiller {
    fn fill_with(&self, partial_prompt: &mut PartialPrompt, context: ()) -> Result<()> {
        for (placeholder, value) in &self.values {
            partial_prompt.try_fill(placeholder.as_str(), value.as_str())?;
        }
        Ok(context)
    }
}

#[cfg(test)]
mod tests {
    use super::{Fill, FillPlaceholders, StaticFiller};
    use crate::prompt::PromptTemplate;

    #[test]
    fn test_static_filler() {
        let filler = StaticFiller::new()
            .with("header", "Barb is a biologist.")
            .with("footer", "Answer below.")
            .with("header", "Barb is a biologist analyzing metadata.");
        assert_eq!(&["header".to_string(), "footer".to_string()], filler.placeholders_to_fill());

        let template = PromptTemplate::new("{[header]} {[record]} {[footer]}");
        let mut prompt = template.construct_prompt();
        filler.fill(&mut prompt).unwrap();
        assert_eq!(vec!["record".to_string()], prompt.unfilled_placeholders());
        prompt.fill("record", "GSM1");
        assert_eq!("Barb is a biologist analyzing metadata. GSM1 Answer below.", prompt.complete().unwrap());
    }

    #[test]
    fn test_static_filler_unknown_placeholder() {
        let filler = StaticFiller::new().with("missing", "x");
        let mut prompt = PromptTemplate::new("{[record]}").construct_prompt();
        assert!(filler.fill(&mut prompt).is_err());
    }
}
