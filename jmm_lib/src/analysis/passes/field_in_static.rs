use crate::diagnostic::{Diagnostic, DiagnosticBuilder};
use crate::structures::ast::{Expr, Program};
use crate::structures::symbol_table::SymbolTable;

pub fn check(program: &Program, table: &SymbolTable) -> Vec<Diagnostic> {
    let mut reports = Vec::new();

    for method in &program.class.methods {
        if !method.is_static {
            continue;
        }
        for stmt in &method.body {
            stmt.for_each_expr(&mut |expr| {
                let Expr::VarRef(ident) = &expr.data else {
                    return;
                };
                if table.is_field_unshadowed(&method.name.data, &ident.data) {
                    reports.push(
                        DiagnosticBuilder::new(expr.span)
                            .build_field_in_static_method(&ident.data),
                    );
                }
            });
        }
    }

    reports
}
