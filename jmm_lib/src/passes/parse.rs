use crate::diagnostic::AggregateResult;
use crate::structures::ast::Program;

/// Parses Jmm source text into an AST.
pub fn parse(source: &str) -> AggregateResult<Program> {
    crate::parser::parse(source)
}
