use ai_client::ChatCompletion;
use nutriquery_common::{Catalog, Category, Result};
use tracing::info;

use crate::assembler::Assembler;
use crate::generation::{GenerationClient, GenerationOutcome};
use crate::interpreter::{interpret, ResultTable};

/// Everything one query produces for display.
#[derive(Debug, Clone)]
pub struct QueryAnswer {
    pub result: ResultTable,
    pub outcome: GenerationOutcome,
}

impl QueryAnswer {
    pub fn response(&self) -> &str {
        self.outcome.render()
    }
}

/// Wires category lookup → interpret → assemble → generate for one session.
///
/// The catalog is read-only; each `ask` owns its result table and prompt.
pub struct QuerySession<C> {
    catalog: Catalog,
    assembler: Assembler,
    generator: GenerationClient<C>,
}

impl<C: ChatCompletion> QuerySession<C> {
    pub fn new(catalog: Catalog, assembler: Assembler, generator: GenerationClient<C>) -> Self {
        Self {
            catalog,
            assembler,
            generator,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Only an unloaded category is an error; generation failures come back
    /// as outcomes.
    pub async fn ask(&self, category: Category, query: &str) -> Result<QueryAnswer> {
        let table = self.catalog.get(category)?;
        let result = interpret(table, query);

        info!(
            category = %category,
            rule = %result.rule().map(|r| r.to_string()).unwrap_or_else(|| "pass_through".into()),
            rows = result.len(),
            "Query interpreted"
        );

        let assembled = self.assembler.assemble_prompt(&result, query);
        let outcome = self.generator.respond(&assembled).await;

        Ok(QueryAnswer { result, outcome })
    }
}
