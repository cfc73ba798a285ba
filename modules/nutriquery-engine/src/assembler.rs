use tracing::warn;

use crate::interpreter::{ResultRow, ResultTable};

/// Returned instead of a prompt when the result table has no rows.
pub const EMPTY_NOTICE: &str = "No matching data found for the query.";

pub const DEFAULT_MAX_PROMPT_ROWS: usize = 50;

/// User-role text for one generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub text: String,
    /// Rows serialized into `text`.
    pub included_rows: usize,
    /// Rows in the result table.
    pub total_rows: usize,
}

impl Prompt {
    pub fn is_truncated(&self) -> bool {
        self.included_rows < self.total_rows
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assembled {
    Prompt(Prompt),
    Empty(&'static str),
}

/// Builds the generation prompt from a result table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assembler {
    max_prompt_rows: usize,
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PROMPT_ROWS)
    }
}

impl Assembler {
    /// `max_prompt_rows` is clamped to at least 1.
    pub fn new(max_prompt_rows: usize) -> Self {
        Self {
            max_prompt_rows: max_prompt_rows.max(1),
        }
    }

    pub fn max_prompt_rows(&self) -> usize {
        self.max_prompt_rows
    }

    /// Rules with their own row bound are never truncated further.
    fn row_limit(&self, result: &ResultTable) -> usize {
        match result.rule().and_then(|kind| kind.row_cap()) {
            Some(_) => result.len(),
            None => self.max_prompt_rows,
        }
    }

    pub fn assemble_prompt(&self, result: &ResultTable, query: &str) -> Assembled {
        if result.is_empty() {
            return Assembled::Empty(EMPTY_NOTICE);
        }

        let total_rows = result.len();
        let included = &result.rows()[..total_rows.min(self.row_limit(result))];
        let records = serialize_records(included);

        let heading = if included.len() < total_rows {
            format!(
                "Here is a summary of the top {} of {} matching products:",
                included.len(),
                total_rows
            )
        } else {
            format!(
                "Here is a summary of the top {} matching products:",
                total_rows
            )
        };

        let text = format!(
            r#"You are an expert assistant for analyzing food product datasets. The user has asked the following question:
"{query}"

{heading}
{records}

Please provide:
1. A detailed answer to the query.
2. Key insights from the dataset.
3. Suggestions for the user based on their query."#
        );

        Assembled::Prompt(Prompt {
            text,
            included_rows: included.len(),
            total_rows,
        })
    }
}

/// Shorthand for [`Assembler::assemble_prompt`] with the default row cap.
pub fn assemble_prompt(result: &ResultTable, query: &str) -> Assembled {
    Assembler::default().assemble_prompt(result, query)
}

fn serialize_records(rows: &[ResultRow]) -> String {
    match serde_json::to_string(rows) {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, "Failed to serialize result rows, falling back to debug format");
            format!("{:?}", rows)
        }
    }
}
