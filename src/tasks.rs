//! # Task table
//!
//! The questions asked about every sample record, one tab-separated row per question:
//!
//! | column | meaning |
//! |---|---|
//! | 1 | row id |
//! | 2 | boolean marker (`True`/`False`) |
//! | 3 | position in the ordered question list, `-1` if the row is not asked there |
//! | 4 | comma-separated ids of the rows the answer depends on, possibly empty |
//! | 5 | short title |
//! | 6 | full question text |
//!
//! Blank lines separate groups of rows and carry no meaning.

use std::collections::BTreeMap;

use anyhow::Result;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::tasks::errors::MalformedTaskRow;
use crate::utils::string::parse_bool_string;

/// Version 2 of the ChIP-seq record task table.
pub const TASK_DATA_V2: &str = "\
1\tFalse\t1\t\tCell line name\tName of the cell line used **for this particular sample**, preferably as a single word.  Barb does not include particular modifications introduced in this study. She outputs \"primary\" if tissue was used instead of an established [immortalized] cell line, or \"N/A\" if no reference to a specific cell line is provided\n\
2\tFalse\t2\t1\tCell type\tCell type (e.g. fibroblast, cardiomyoblast, monocyte, adenocarcinoma, etc.), as noted in the record or as inferred by Barb from the cell line name. Barb checks for any typos (e.g. \"epitheilal\" instead of \"epithelial\") and corrects them\n\
3\tFalse\t3\t1,2\tOrgan\tOrgan of origin denoted in the record or inferred by Barb from the cell line name, preferably as a single word, using the most common term (e.g., lung, PBMC, liver, cornea, ovary, breast)\n\
4\tFalse\t4\t1,2,3\tIntra-organ location\tMore detailed location within the organ (e.g. right atrium auricular region, bronchus, etc.)\n\
5\tFalse\t5\t\tGenetic modifications\tGenetic modifications (e.g. gene knockout, shRNA or RNAi knockdown or silencing, etc.) introduced by the experimenters **for this particular sample**, with names of genes targeted (if any), and excluding wild-type (\"WT\") genes\n\
6\tFalse\t6\t\tInput control\tDoes the string \"input\" appear anywhere in the sample name? Is the sample an input control?\n\
7\tFalse\t7\t1,5\tCell name or abbreviation appears in sample name\tDoes the full name of the cells used, or an abbreviation of that name, appear in the sample name?\n\
\n\
8\tTrue\t-1\t\tAntibody catalog numbers and manufacturer strings\tQuote any catalog numbers, lot numbers, and manufacturers exactly as they appear in the record (e.g. \"Santa Cruz, C-20, sc-1008, lot# H1216\")\n\
9\tFalse\t-1\t\tAntibody catalog references\tAntibody catalog references in record, formatted as e.g. manufacturer=santa_cruz,clone=C-20,catalog=sc-1008,lot=H1216,target=VDR\n\
10\tFalse\t-1\t\tHuman gene names or protein complexes mentioned in record\tQuote any human gene names, or human protein complexes, exactly as they appear in the record. If the same gene is mentioned in different ways, choose the form corresponding to the standardized symbol (e.g., prefer \"AR\" over \"Androgen receptor\", or \"ESR1\" over \"ER-alpha\").\n\
\n\
11\tFalse\t8\t1,5,6,7\tBarb's rationale for ChIP target extraction\tBarb's rationale for ChIP target extraction **for this particular sample** from the record and from Barb's own understanding, or for identification as an \"input\" / empty-vector (not expressing tagged protein) sample. Barb includes the strategy for protein tagging, if relevant, but ignores genetic modifications (e.g. Cas9 gene editing) or genetic background or genetic modifications that do not involve protein tagging of ChIP targets. She thinks step by step, pays particular attention to the sample name, and repeats record entries providing the information as well as words present in the sample name that refer to the ChIP target or \"input\" and not to the genetic background.\n\
12\tFalse\t9\t6,7,11\tChIP target\tName of ChIP target **for this particular sample**, or \"input\" if this is an \"input\" control sample (as indicated, e.g., by the sample name), or if the targeted tag was not actually expressed (e.g., empty vector)\n\
13\tFalse\t10\t12\tHGNC official gene name for ChIP target\tHGNC official human gene name for ChIP target, or \"Unsure\" if the official name does not appear consistent with the context of the experiment\n\
14\tFalse\t11\t11,12\tSample is generic ChIP-seq\tDoes this sample correspond to generic ChIP-seq? (Barb answers as: ChIP-seq for sure / No, it may be [ATAC-seq, RNA-seq, etc.] / Unsure.)\n\
15\tFalse\t12\t5,11,12\tBarb's rationale for notable treatment extraction\tBarb's rationale for identification of notable treatments applied **to this particular sample** OTHER THAN any genetic modifications (knockout, knockdown, silencing, etc.) already reported above by Barb and OTHER THAN those related to crosslinking, library preparation and sequencing, regular cell culture, etc. Barb includes references to the record entries providing the information, and to relevant words present in the sample name, including possibly \"control\" if that refers to a *treatment* control instead of a *ChIP input* control; if applicable, Barb compares the sample name to the names of the other samples in the study to identify abbreviations showing which samples had the treatment applied and which did not\n\
16\tFalse\t13\t5,15\tNotable treatments\tNotable treatments applied to **this particular sample** OTHER THAN genetic modifications (knockout, knockdown, silencing, etc.) already reported above, and OTHER THAN those related to crosslinking, library preparation and sequencing, regular cell culture, etc., and formatted as e.g. \"cisplatin (concentration=2_uM, duration=3_days, details=DNA_alkylating_agent)\". Barb does not report treatments that don't seem to make sense.\n\
17\tFalse\t14\t5,6,15,16\tThis sample received a control genetic modification or has a control genetic background\tDoes this sample correspond to a control genetic modification, or control genetic background? If so, Barb also names the genetic background/modification to which it should be compared.\n\
18\tFalse\t15\t5,6,15,16,17\tThis sample received a control treatment\tDoes this sample correspond to a control **treatment** (other than genetic modification or background), for comparison with a different treatment in the same experiment? If so, Barb also names that different treatment.\n\
19\tFalse\t16\t\tLow-level gene ontology terms\tLow-level gene ontology terms for biological processes Barb can infer for this experiment. Barb does not report generic processes such as histone or chromatin modification, or \"Gene Regulation\", \"Gene expression\", \"Transcription\", \"Chromatin Accessibility\", \"Epigenetic regulation\", \"Remodeling\", etc. and focuses instead on more specific processes such as \"DNA damage repair\", \"Response to hypoxia\", \"Response to viral infection\", \"Brain development\", etc\n\
20\tFalse\t17\t19\tRelationship to COVID/pneumonia/inflammation/DNA damage\tIs this sample related to COVID/pneumonia/inflammation/DNA damage? (Barb answers as: Yes / No / Unsure)\n";

lazy_static! {
    /// [TASK_DATA_V2] parsed once.
    pub static ref TASK_TABLE_V2: TaskTable = TaskTable::parse(TASK_DATA_V2).unwrap();
}

/// One row of the task table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub id: u32,
    pub marked: bool,
    /// Position in the ordered question list; `None` for rows with order `-1`.
    pub order: Option<u32>,
    pub depends_on: Vec<u32>,
    pub title: String,
    pub description: String,
}

/// Parse a single non-blank row. `line_number` is 1-based and only used in errors.
pub fn parse_task_row(line: &str, line_number: usize) -> Result<TaskSpec, MalformedTaskRow> {
    let malformed = |reason: String| MalformedTaskRow {
        line_number,
        line: line.to_string(),
        reason,
    };
    let fields: Vec<&str> = line.split('\t').collect();
    let [id, marked, order, depends_on, title, description] = fields[..] else {
        return Err(malformed(format!("expected 6 tab-separated fields, got {}", fields.len())));
    };
    let id = id.trim().parse::<u32>()
        .map_err(|e| malformed(format!("invalid row id {:?}: {}", id, e)))?;
    let marked = parse_bool_string(marked)
        .map_err(|e| malformed(e.to_string()))?;
    let order = match order.trim().parse::<i64>() {
        Ok(-1) => None,
        Ok(o) => Some(u32::try_from(o).map_err(|_| malformed(format!("invalid order {}", o)))?),
        Err(e) => return Err(malformed(format!("invalid order {:?}: {}", order, e))),
    };
    let depends_on = depends_on.split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(|d| d.parse::<u32>().map_err(|e| malformed(format!("invalid dependency {:?}: {}", d, e))))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(TaskSpec {
        id,
        marked,
        order,
        depends_on,
        title: title.trim().to_string(),
        description: description.trim().to_string(),
    })
}

/// Parse every non-blank row of a table, in the order they appear.
pub fn parse_task_table(text: &str) -> Result<Vec<TaskSpec>> {
    let mut rows = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if !line.trim().is_empty() {
            rows.push(parse_task_row(line, idx + 1)?);
        }
    }
    Ok(rows)
}

/// All rows of a task table, indexed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTable {
    tasks: BTreeMap<u32, TaskSpec>,
}

impl TaskTable {
    /// Parse a whole table. Row ids must be unique and dependencies must refer to rows of the table.
    pub fn parse(text: &str) -> Result<Self> {
        let mut tasks = BTreeMap::new();
        for task in parse_task_table(text)? {
            if tasks.contains_key(&task.id) {
                anyhow::bail!("duplicate task row id {}", task.id);
            }
            tasks.insert(task.id, task);
        }
        for task in tasks.values() {
            if let Some(missing) = task.depends_on.iter().find(|d| !tasks.contains_key(*d)) {
                anyhow::bail!("task row {} depends on unknown row {}", task.id, missing);
            }
        }
        Ok(Self { tasks })
    }

    /// The built-in version 2 table.
    pub fn default_v2() -> Self {
        TASK_TABLE_V2.clone()
    }

    pub fn get(&self, id: u32) -> Option<&TaskSpec> {
        self.tasks.get(&id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// All rows by id.
    pub fn iter(&self) -> impl Iterator<Item = &TaskSpec> {
        self.tasks.values()
    }

    /// Rows that belong to the ordered question list, by their order.
    pub fn ordered_questions(&self) -> Vec<&TaskSpec> {
        let mut ordered: Vec<&TaskSpec> = self.tasks.values().filter(|t| t.order.is_some()).collect();
        ordered.sort_by_key(|t| t.order);
        ordered
    }

    /// The rows `id` depends on, or `None` if there is no such row.
    pub fn dependencies_of(&self, id: u32) -> Option<Vec<&TaskSpec>> {
        self.get(id).map(|task| {
            task.depends_on.iter().filter_map(|d| self.tasks.get(d)).collect()
        })
    }
}

pub mod errors {
    use std::error::Error;
    use std::fmt;
    use std::fmt::Formatter;

    /// Error when a row of the task table cannot be parsed.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct MalformedTaskRow {
        pub line_number: usize,
        pub line: String,
        pub reason: String,
    }

    impl fmt::Display for MalformedTaskRow {
        fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
            write!(f, "MalformedTaskRow: line {}: {}\n  {}", self.line_number, self.reason, self.line)
        }
    }

    impl Error for MalformedTaskRow {}
}

#[cfg(test)]
mod tests {
    use super::errors::MalformedTaskRow;
    use super::*;

    #[test]
    fn test_default_table() {
        let table = TaskTable::default_v2();
        assert_eq!(20, table.len());
        let first = table.get(1).unwrap();
        assert_eq!("Cell line name", first.title);
        assert_eq!(Some(1), first.order);
        assert!(first.depends_on.is_empty());

        let quotes = table.get(8).unwrap();
        assert!(quotes.marked);
        assert_eq!(None, quotes.order);
        assert_eq!(1, table.iter().filter(|t| t.marked).count());
    }

    #[test]
    fn test_ordered_questions() {
        let table = TaskTable::default_v2();
        let ordered = table.ordered_questions();
        assert_eq!(17, ordered.len());
        assert_eq!(vec![1, 2, 3], ordered.iter().take(3).map(|t| t.id).collect::<Vec<_>>());
        assert_eq!(11, ordered[7].id);
        assert_eq!(20, ordered.last().unwrap().id);
        assert!(ordered.iter().all(|t| t.id != 9 && t.id != 10));
    }

    #[test]
    fn test_dependencies() {
        let table = TaskTable::default_v2();
        let titles: Vec<&str> = table.dependencies_of(12).unwrap().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(vec!["Input control", "Cell name or abbreviation appears in sample name", "Barb's rationale for ChIP target extraction"], titles);
        assert!(table.dependencies_of(99).is_none());
    }

    #[test]
    fn test_parse_task_table_keeps_row_order() {
        let rows = parse_task_table("2\tFalse\t-1\t1\tCell type\tWhich cells?\n\n1\tTrue\t1\t\tCell line name\tWhich line?\n").unwrap();
        assert_eq!(vec![2, 1], rows.iter().map(|t| t.id).collect::<Vec<_>>());
        assert_eq!(vec![1], rows[0].depends_on);
        assert_eq!(None, rows[0].order);
        assert_eq!(20, parse_task_table(TASK_DATA_V2).unwrap().len());

        let err = TaskTable::parse("1\tFalse\t1\t\tA\tQ\n1\tFalse\t2\t\tB\tQ").unwrap_err();
        assert!(err.to_string().contains("duplicate task row id 1"));
    }

    #[test]
    fn test_malformed_rows() {
        let err = parse_task_row("1\tFalse\t1\tCell line name", 3).unwrap_err();
        assert_eq!(3, err.line_number);

        let err = parse_task_row("1\tmaybe\t1\t\tTitle\tQuestion", 1).unwrap_err();
        assert!(err.reason.contains("maybe"));

        let err = TaskTable::parse("1\tFalse\t1\t2\tTitle\tQuestion").unwrap_err();
        assert!(err.to_string().contains("unknown row 2"));

        let err = TaskTable::parse("\nx\tFalse\t1\t\tTitle\tQuestion").unwrap_err();
        assert_eq!(2, err.downcast_ref::<MalformedTaskRow>().unwrap().line_number);
    }
}
