//! Semantic analysis.
//!
//! Checks run as an ordered sequence of independent passes. The driver stops
//! at the first pass that produced any report, so later passes may assume the
//! invariants established by earlier ones (e.g. the type checker never sees
//! an unresolved identifier).

pub mod passes;
mod type_utils;

#[cfg(test)]
mod tests;

pub use type_utils::TypeEngine;

use crate::diagnostic::{AggregateResult, Diagnostic};
use crate::structures::ast::Program;
use crate::structures::symbol_table::SymbolTable;

type AnalysisPass = fn(&Program, &SymbolTable) -> Vec<Diagnostic>;

const PASSES: &[AnalysisPass] = &[
    passes::duplicated_element::check,
    passes::this_in_static::check,
    passes::field_in_static::check,
    passes::method_declarations::check,
    passes::undeclared_variable::check,
    passes::undefined_method::check,
    passes::type_error::check,
    passes::array_access::check,
    passes::varargs::check,
];

pub fn analyze(program: &Program, table: &SymbolTable) -> AggregateResult<()> {
    for pass in PASSES {
        let reports = pass(program, table);
        if !reports.is_empty() {
            let mut res = AggregateResult::new_ok(());
            for diagnostic in reports {
                res.add_err(diagnostic);
            }
            return res;
        }
    }
    AggregateResult::new_ok(())
}
