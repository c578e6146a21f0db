use crate::diagnostic::{Diagnostic, DiagnosticBuilder};
use crate::structures::ast::{Expr, Program};
use crate::structures::symbol_table::SymbolTable;

pub fn check(program: &Program, table: &SymbolTable) -> Vec<Diagnostic> {
    let mut reports = Vec::new();

    for method in &program.class.methods {
        for stmt in &method.body {
            stmt.for_each_expr(&mut |expr| {
                let Expr::VarRef(ident) = &expr.data else {
                    return;
                };
                let resolves = table.var_type(&method.name.data, &ident.data).is_some()
                    || table.has_import(&ident.data);
                if !resolves {
                    reports.push(
                        DiagnosticBuilder::new(expr.span).build_undeclared_variable(&ident.data),
                    );
                }
            });
        }
    }

    reports
}
