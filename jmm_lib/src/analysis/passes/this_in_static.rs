use crate::diagnostic::{Diagnostic, DiagnosticBuilder};
use crate::structures::ast::{Expr, Program};
use crate::structures::symbol_table::SymbolTable;

pub fn check(program: &Program, _table: &SymbolTable) -> Vec<Diagnostic> {
    let mut reports = Vec::new();

    for method in &program.class.methods {
        if !method.is_static {
            continue;
        }
        for stmt in &method.body {
            stmt.for_each_expr(&mut |expr| {
                if matches!(expr.data, Expr::This) {
                    reports.push(DiagnosticBuilder::new(expr.span).build_this_in_static_method());
                }
            });
        }
    }

    reports
}
