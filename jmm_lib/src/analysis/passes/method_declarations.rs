use crate::diagnostic::{builder::MainViolation, Diagnostic, DiagnosticBuilder};
use crate::structures::ast::{Program, Stmt};
use crate::structures::symbol_table::SymbolTable;
use crate::structures::types::Type;

pub fn check(program: &Program, table: &SymbolTable) -> Vec<Diagnostic> {
    let mut reports = Vec::new();

    for method in &program.class.methods {
        let name = method.name.data.as_str();
        let return_type = table
            .return_type_of(name)
            .cloned()
            .unwrap_or(Type::VOID);

        if name == "main" {
            if !method.is_static {
                reports.push(
                    DiagnosticBuilder::new(method.prototype_span)
                        .build_invalid_main(MainViolation::NotStatic),
                );
            }
            if !return_type.is_void() {
                reports.push(
                    DiagnosticBuilder::new(method.prototype_span)
                        .build_invalid_main(MainViolation::NotVoid),
                );
            }
            let params = table.params_of(name);
            if params.len() != 1 || params[0].ty != Type::STRING_ARRAY {
                reports.push(
                    DiagnosticBuilder::new(method.prototype_span)
                        .build_invalid_main(MainViolation::Params),
                );
            }
        } else if method.is_static {
            reports.push(
                DiagnosticBuilder::new(method.prototype_span).build_static_non_main(name),
            );
            continue;
        }

        let returns: Vec<_> = method
            .body
            .iter()
            .filter(|stmt| matches!(stmt.data, Stmt::Return(_)))
            .collect();

        if return_type.is_void() {
            if let Some(ret) = returns.first() {
                reports.push(DiagnosticBuilder::new(ret.span).build_return_in_void_method(name));
            }
            continue;
        }

        match returns.as_slice() {
            [] => reports.push(
                DiagnosticBuilder::new(method.prototype_span)
                    .build_missing_return(name, &return_type),
            ),
            [only] => {
                let is_last = method
                    .body
                    .last()
                    .is_some_and(|last| std::ptr::eq(last, *only));
                if !is_last {
                    reports.push(DiagnosticBuilder::new(only.span).build_return_not_last(name));
                }
            }
            [_, second, ..] => {
                reports.push(DiagnosticBuilder::new(second.span).build_multiple_returns(name));
            }
        }
    }

    reports
}
