//! # ChIP-seq record prompts
//!
//! Two prompts drive the extraction model:
//!
//! * the *Barb* prompt asks for the metadata of one sample record, one numbered answer per row of
//!   the [task table](crate::tasks);
//! * the *Bob* prompt triages the sentences of a record's protocol text, answering seven Yes/No
//!   questions per sentence and ending each answer with [BOB_ANSWER_END_MARKER].
//!
//! Both are [PromptTemplate]s. The Barb header and footer are put in place by a [StaticFiller]; the
//! Bob text is part of its template. Callers only provide the record or the sentences.

use anyhow::Result;
use lazy_static::lazy_static;
use log::debug;

use crate::filler::{Fill, FillPlaceholders, FillWith, StaticFiller};
use crate::prompt::{PartialPrompt, PromptTemplate};
use crate::tasks::TaskTable;
use crate::utils::string::{find_nth_occurrence, join_strings_with_period};
use crate::utils::token::{CountToken, TENTATIVE_MAX_LENGTH_BEFORE_COMPLETION};

/// Opening of the record-extraction prompt, up to the fence that precedes the record.
pub const BARB_HEADER: &str = r#"
Barb is a biologist analyzing metadata from a ChIP-seq experiment database. Her task is to extract information from a record describing a single sample that is part of a larger study. The record may contain incomplete or misorganized metadata, and it's Barb's job to identify the protein that was targeted in the ChIP experiment and to extract information about the sample.

The record is:
```
"#;

/// Closes the record fence and introduces the questions.
pub const BARB_FOOTER: &str = r#"```

Barb parses all of the information above to complete the following (she outputs "N/A" or "Unsure" where appropriate). Unless a concise answer is requested, she thinks step by step and details her reasoning. Barb provides concise, professional, insightful, helpful, and truthful explanations for her answers.

"#;

/// Sentence-triage prompt, up to the fence that precedes the sentences.
pub const SHORTENED_BOB_PROMPT_BASE: &str = r#"
Bob is an expert biologist analyzing sentences from a database record describing a ChIP-seq experiment. Bob needs to identify sentences that contain information about ChIP targets, cells processed, or treatments applied to those cells. This will help downstream text analysis to be performed in the future. Bob is not interested in fine technical detail, as his purpose is not to reproduce the experiments or to optimize them. Bob is also not **at all** interested in the technical aspect of the ChIP protocol. To perform his task, Bob outputs a numbered list of Yes/No answers about each sentence:
1. Is this sentence of interest to Bob?
2. Does it correspond to scientific background of the study, or to interpretation of its results?
3. Does it contain a file name with substrings (possibly abbreviated) that refer to sample-specific antibodies or their targets, cell line names, drugs, or treatment conditions?
4. Does it pertain solely to metadata?
5. Does it mention the specific antibodies used for IP, their catalogue numbers or manufacturers, or how they were raised?
6. Does it add **new** information (not already included in preceding sentences) about the cell line, tissue, or organ used for ChIP, or about the gene expression, overexpression or silencing status, or vectors the cells may contain?
7. Does it mention "interesting" cell treatments including e.g. drug treatments, application of stress or stimuli, or drugs to induce expression? Bob is not interested in regular cell culture techniques or cell preparation for ChIP.

Bob provides concise, professional, insightful, helpful, and truthful explanations for his answers.

Bob now analyzes *one by one* all the sentences in the text below.
```
"#;

/// [SHORTENED_BOB_PROMPT_BASE] with one worked example.
pub const SHORTENED_BOB_PROMPT_BASE_WITH_EXAMPLE: &str = r#"
Bob is an expert biologist analyzing sentences from a database record describing a ChIP-seq experiment. Bob's needs to identify sentences that contain information about ChIP targets, cells processed, or treatments applied to those cells. This will help downstream text analysis to be performed in the future. Bob is not interested in fine technical detail, as his purpose is not to reproduce the experiments or to optimize them. Bob is also not **at all** interested in the technical aspect of the ChIP protocol. To perform his task, Bob outputs a numbered list of Yes/No answers about each sentence:
1. Is this sentence of interest to Bob?
2. Does it correspond to scientific background of the study, or to interpretation of its results?
3. Does it contain a file name with substrings (possibly abbreviated) that refer to sample-specific antibodies or their targets, cell line names, drugs, or treatment conditions?
4. Does it pertain solely to metadata?
5. Does it mention the specific antibodies used for IP, their catalogue numbers or manufacturers, or how they were raised?
6. Does it add **new** information (not already included in preceding sentences) about the cell line, tissue, or organ used for ChIP, or about the gene expression, overexpression or silencing status, or vectors the cells may contain?
7. Does it mention "interesting" cell treatments including e.g. drug treatments, application of stress or stimuli, or drugs to induce expression? Bob is not interested in regular cell culture techniques or cell preparation for ChIP.

Bob provides concise, professional, insightful, helpful, and truthful explanations for his answers, as shown in the following example:

Sentence:
The second day, after 2 washes with RIPA-0.5, 1 wash with RIPA-0.3, 1 wash with RIPA-0, 2 washes with LiCl buffer (10 mM Tris-HCl, 0.25 M LiCl, 0.25% NP-40, and 0,25% NaDOC, pH7.4), and 2 washes with TE buffer, bound protein-DNA complexes were resuspended in elution buffer (10 mM Tris-HCl, 1mM EDTA, and 1% SDS, pH7.4) supplemented with 10 µg/ml RNase A for elution and RNA digestion, and incubated at 55 °C for 1 hour.
Bob's explanation:
The sentence describes protocol details of no relevance (hence 1:No) and gives no information about antibodies (hence 5:No), or cell genetic background (hence 6:No), cell treatments (hence 7:No), etc.
Bob's answer:
1:No  2:No  3:No  4:No  5:No  6:No  7:No  ###END

Bob now analyzes *one by one* all the sentences in the text below.
```
"#;

/// Appended after each of Barb's answers.
pub const BARB_QA_EOL_MARKER: &str = "";
/// Opening words of the model's summary of a protocol paragraph.
pub const PROTOCOL_PARAGRAPH_HEADER: &str = "The protocol information in this paragraph likely";
/// Sentence used to probe where the model stops reading a protocol.
pub const LAST_SENTENCE_MARKER: &str = "We used siRNA to knock down Notch1";
/// Ends each of Bob's answers.
pub const BOB_ANSWER_END_MARKER: &str = "###END";

pub const RECORD_PLACEHOLDER: &str = "record";
pub const QUESTIONS_PLACEHOLDER: &str = "questions";
pub const SENTENCES_PLACEHOLDER: &str = "sentences";

lazy_static! {
    static ref BARB_TEMPLATE: PromptTemplate = PromptTemplate::new("{[header]}{[record]}\n{[footer]}{[questions]}");
    static ref BOB_TEMPLATE: PromptTemplate = PromptTemplate::new(format!("{}{{[sentences]}}\n```\n", SHORTENED_BOB_PROMPT_BASE));
    static ref BOB_TEMPLATE_WITH_EXAMPLE: PromptTemplate = PromptTemplate::new(format!("{}{{[sentences]}}\n```\n", SHORTENED_BOB_PROMPT_BASE_WITH_EXAMPLE));
}

pub fn barb_template() -> PromptTemplate {
    BARB_TEMPLATE.clone()
}

/// The Bob prompt with only the sentences left to fill, optionally including the worked example.
pub fn bob_template(with_example: bool) -> PromptTemplate {
    if with_example {
        BOB_TEMPLATE_WITH_EXAMPLE.clone()
    } else {
        BOB_TEMPLATE.clone()
    }
}

/// Fixed parts of the Barb prompt.
pub fn barb_static_filler() -> StaticFiller {
    StaticFiller::new()
        .with("header", BARB_HEADER)
        .with("footer", BARB_FOOTER)
}

/// The ordered questions of a task table as a numbered list, one question per line.
pub fn format_task_questions(table: &TaskTable) -> String {
    table.ordered_questions()
        .iter()
        .filter_map(|task| task.order.map(|order| {
            format!("{}. {}: {}{}", order, task.title, task.description, BARB_QA_EOL_MARKER)
        }))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fills the record and the question list of a Barb prompt. The record is the filling context.
pub struct BarbPromptFiller {
    questions: String,
    placeholders: Vec<String>,
}

impl BarbPromptFiller {
    pub fn new(table: &TaskTable) -> Self {
        Self {
            questions: format_task_questions(table),
            placeholders: vec![RECORD_PLACEHOLDER.to_string(), QUESTIONS_PLACEHOLDER.to_string()],
        }
    }
}

impl FillPlaceholders for BarbPromptFiller {
    fn placeholders_to_fill(&self) -> &[String] {
        &self.placeholders
    }
}

impl<'a> FillWith<&'a str> for BarbPromptFiller {
    fn fill_with(&self, partial_prompt: &mut PartialPrompt, record: &'a str) -> Result<&'a str> {
        partial_prompt
            .try_fill(RECORD_PLACEHOLDER, record.trim())?
            .try_fill(QUESTIONS_PLACEHOLDER, self.questions.as_str())?;
        Ok(record)
    }
}

/// The complete Barb prompt for one sample record.
pub fn barb_prompt(record: &str, table: &TaskTable) -> Result<String> {
    let mut prompt = barb_template().construct_prompt();
    barb_static_filler().fill(&mut prompt)?;
    BarbPromptFiller::new(table).fill_with(&mut prompt, record)?;
    Ok(prompt.complete()?)
}

/// Like [barb_prompt], but fails if the prompt leaves no room for the answer.
pub fn barb_prompt_within_budget(record: &str, table: &TaskTable, counter: &impl CountToken) -> Result<String> {
    let prompt = barb_prompt(record, table)?;
    let token_num = counter.count_token(&prompt);
    debug!("Barb prompt has {} tokens", token_num);
    if token_num > TENTATIVE_MAX_LENGTH_BEFORE_COMPLETION {
        anyhow::bail!("Barb prompt has {} tokens, more than the {} allowed before completion",
            token_num, TENTATIVE_MAX_LENGTH_BEFORE_COMPLETION);
    }
    Ok(prompt)
}

/// The complete Bob prompt for the sentences of a protocol text.
pub fn bob_prompt<S: AsRef<str>>(sentences: &[S], with_example: bool) -> Result<String> {
    let mut prompt = bob_template(with_example).construct_prompt();
    prompt.try_fill(SENTENCES_PLACEHOLDER, join_strings_with_period(sentences))?;
    Ok(prompt.complete()?)
}

/// The part of a Bob completion before its first end marker, or the whole completion if there is none.
pub fn bob_answer(completion: &str) -> &str {
    match find_nth_occurrence(BOB_ANSWER_END_MARKER, completion, 1) {
        Some(end) => completion[..end].trim_end(),
        None => completion,
    }
}
