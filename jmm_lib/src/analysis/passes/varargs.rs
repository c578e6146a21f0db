use crate::diagnostic::{Diagnostic, DiagnosticBuilder};
use crate::structures::ast::Program;
use crate::structures::symbol_table::SymbolTable;

pub fn check(program: &Program, _table: &SymbolTable) -> Vec<Diagnostic> {
    let mut reports = Vec::new();
    let class = &program.class;

    for field in &class.fields {
        if field.ty.data.is_varargs {
            reports.push(DiagnosticBuilder::new(field.span).build_varargs_field());
        }
    }

    for method in &class.methods {
        for local in &method.locals {
            if local.ty.data.is_varargs {
                reports.push(DiagnosticBuilder::new(local.span).build_varargs_local());
            }
        }

        if method.return_type.data.is_varargs {
            reports.push(DiagnosticBuilder::new(method.return_type.span).build_varargs_return());
        }

        let mut varargs_seen = false;
        for (i, param) in method.params.iter().enumerate() {
            if !param.ty.data.is_varargs {
                continue;
            }
            if varargs_seen {
                reports.push(DiagnosticBuilder::new(param.span).build_multiple_varargs());
                break;
            }
            varargs_seen = true;
            if i != method.params.len() - 1 {
                reports.push(DiagnosticBuilder::new(param.span).build_varargs_not_last());
            }
        }
    }

    reports
}
