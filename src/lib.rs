//! # chipprompt
//!
//! Prompts and plumbing for extracting structured metadata (cell line, ChIP target, treatments,
//! gene ontology terms) from free-text ChIP-seq sample records with a large language model.
//!
//! ## What is in here
//!
//! ### Prompts and the task table
//!
//! The extraction model is asked a fixed list of questions about every sample record. The
//! questions live in a tab-separated [task table](crate::tasks) and are rendered into the
//! *Barb* prompt by [chip_seq::barb_prompt]. A second prompt, *Bob*, triages the sentences of a
//! record's protocol text ([chip_seq::bob_prompt]).
//!
//! Prompts are [PromptTemplate](crate::prompt::PromptTemplate)s with `{[name]}` placeholders. A
//! template is turned into a [PartialPrompt](crate::prompt::PartialPrompt), filled by hand or by
//! [fillers](crate::filler), and completed into a plain string once every placeholder has a value.
//!
//! ### Lazily computed persistent store
//!
//! Model answers are expensive, so they are kept in an
//! [AutoComputedStore](crate::cache::AutoComputedStore): a sled-backed string store that calls a
//! compute function on a miss, writes the result and flushes it before returning. Reopening the
//! store later returns the stored answer without computing it again.
//!
//! ```no_run
//! use chipprompt::cache::AutoComputedStore;
//! let mut answers = AutoComputedStore::open("answers", |key: &str| -> anyhow::Result<String> {
//!     Ok(format!("{}_result", key))
//! })?;
//! assert_eq!(answers.get_or_compute("sample1")?, "sample1_result");
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ### Helpers
//!
//! * [Memoizer](crate::memo::Memoizer): explicit memoization keyed by serialized arguments;
//! * [defaults](crate::defaults): default injection for named arguments given as JSON;
//! * [string](crate::utils::string): boolean parsing, sentence joining, substring search;
//! * [token](crate::utils::token): token counting and the prompt length budget;
//! * [timing](crate::utils::timing): deadlines for work that may hang.
//!
//! ## Errors and logging
//!
//! Operations that combine storage, caller code and parsing return [anyhow::Result]; the typed
//! errors of each module (e.g. [KeyNotFound](crate::cache::errors::KeyNotFound)) can be recovered
//! with `downcast_ref`. The crate logs through the [log] facade and never installs a logger.

pub mod cache;
pub mod chip_seq;
pub mod config;
pub mod defaults;
pub mod filler;
pub mod memo;
pub mod prompt;
pub mod tasks;
pub mod utils;
