pub mod assembler;
pub mod generation;
pub mod interpreter;
pub mod session;
pub mod summary;

pub use assembler::{assemble_prompt, Assembled, Assembler, Prompt, EMPTY_NOTICE};
pub use generation::{
    FailureKind, GenerationClient, GenerationOutcome, INVALID_API_KEY_MESSAGE, RATE_LIMIT_MESSAGE,
    SYSTEM_ROLE,
};
pub use interpreter::{interpret, select_rule, ResultRow, ResultTable, Rule, RuleKind, RULES};
pub use session::{QueryAnswer, QuerySession};
pub use summary::{summarize, DatasetSummary, Stats};
