use crate::analysis::TypeEngine;
use crate::diagnostic::{Diagnostic, DiagnosticBuilder};
use crate::structures::ast::{Expr, Program};
use crate::structures::symbol_table::SymbolTable;

pub fn check(program: &Program, table: &SymbolTable) -> Vec<Diagnostic> {
    let engine = TypeEngine::new(table);
    let mut reports = Vec::new();

    for method in &program.class.methods {
        for stmt in &method.body {
            stmt.for_each_expr(&mut |expr| {
                let Expr::ArrayAccess { array, .. } = &expr.data else {
                    return;
                };
                let Some(ty) = engine.expr_type(array, &method.name.data) else {
                    return;
                };
                if !ty.is_array && !ty.is_any() {
                    reports.push(DiagnosticBuilder::new(expr.span).build_invalid_array_access(&ty));
                }
            });
        }
    }

    reports
}
