use std::env::temp_dir;
use std::time::Duration;

use anyhow::Result;
use chipprompt::cache::AutoComputedStore;
use chipprompt::chip_seq::barb_prompt_within_budget;
use chipprompt::tasks::TaskTable;
use chipprompt::utils::timing::run_with_deadline;
use chipprompt::utils::token::tiktoken::Tiktoken;
use chipprompt_examples::fake_completion;

const RECORD: &str = r#"
Sample name: MCF7_ER_E2_rep1
Cell line: MCF-7
Antibody: ER-alpha (Santa Cruz, HC-20, sc-543)
Treatment: 10 nM estradiol for 45 min
"#;

fn main() -> Result<()> {
    let table = TaskTable::default_v2();
    let counter = Tiktoken::cl100k()?;
    let prompt = barb_prompt_within_budget(RECORD, &table, &counter)?;
    println!("{}", prompt);

    let mut answers = AutoComputedStore::open(temp_dir().join("chipprompt-answers"), |prompt: &str| -> Result<String> {
        let prompt = prompt.to_string();
        run_with_deadline(Duration::from_secs(30), move |_| fake_completion(&prompt))
    })?;
    println!("{}", answers.get_or_compute(&prompt)?);
    answers.close()
}
