use crate::analysis::TypeEngine;
use crate::diagnostic::{Diagnostic, DiagnosticBuilder};
use crate::structures::ast::{Expr, Program};
use crate::structures::symbol_table::SymbolTable;
use crate::structures::types::TypeName;

pub fn check(program: &Program, table: &SymbolTable) -> Vec<Diagnostic> {
    let engine = TypeEngine::new(table);
    let mut reports = Vec::new();

    for method in &program.class.methods {
        for stmt in &method.body {
            stmt.for_each_expr(&mut |expr| {
                let Expr::Call {
                    receiver,
                    method: callee,
                    ..
                } = &expr.data
                else {
                    return;
                };

                // Declared in this class.
                if table.has_method(&callee.data) {
                    return;
                }

                // Instances of this class inherit from an imported superclass,
                // assumed to provide the method.
                if let Some(super_class) = table.super_class() {
                    if table.has_import(super_class) {
                        return;
                    }
                }

                // Calls on values of an imported type are assumed available.
                let receiver_type = engine.expr_type(receiver, &method.name.data);
                if let Some(ty) = &receiver_type {
                    let known_import = match &ty.name {
                        TypeName::Class(name) => table.has_import(name),
                        TypeName::Any => true,
                        _ => false,
                    };
                    if known_import {
                        return;
                    }
                }

                reports.push(DiagnosticBuilder::new(expr.span).build_undefined_method(&callee.data));
            });
        }
    }

    reports
}
