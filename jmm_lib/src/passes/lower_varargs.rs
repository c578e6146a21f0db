//! Varargs reification.
//!
//! Rewrites every call to a known method whose last parameter is an array so
//! that the trailing arguments are grouped into a single array literal. After
//! this pass call sites have exactly as many arguments as the callee has
//! parameters.

use crate::analysis::TypeEngine;
use crate::structures::ast::{Expr, ExprNode, Program, Stmt, StmtNode};
use crate::structures::symbol_table::SymbolTable;

pub fn lower_varargs(program: &mut Program, table: &SymbolTable) {
    for method in &mut program.class.methods {
        let rewriter = Rewriter {
            table,
            method: method.name.data.clone(),
        };
        for stmt in &mut method.body {
            rewriter.rewrite_stmt(stmt);
        }
    }
}

struct Rewriter<'t> {
    table: &'t SymbolTable,
    method: String,
}

impl Rewriter<'_> {
    fn rewrite_stmt(&self, stmt: &mut StmtNode) {
        match &mut stmt.data {
            Stmt::Assign { rhs, .. } => self.rewrite_expr(rhs),
            Stmt::ArrayAssign { index, rhs, .. } => {
                self.rewrite_expr(index);
                self.rewrite_expr(rhs);
            }
            Stmt::If {
                cond,
                then_body,
                else_body,
            } => {
                self.rewrite_expr(cond);
                self.rewrite_stmt(then_body);
                self.rewrite_stmt(else_body);
            }
            Stmt::While { cond, body } => {
                self.rewrite_expr(cond);
                self.rewrite_stmt(body);
            }
            Stmt::Scope(stmts) => {
                for stmt in stmts {
                    self.rewrite_stmt(stmt);
                }
            }
            Stmt::Return(expr) | Stmt::Expr(expr) => self.rewrite_expr(expr),
        }
    }

    fn rewrite_expr(&self, expr: &mut ExprNode) {
        match &mut expr.data {
            Expr::Binary { left, right, .. } => {
                self.rewrite_expr(left);
                self.rewrite_expr(right);
            }
            Expr::Not(inner) | Expr::Paren(inner) => self.rewrite_expr(inner),
            Expr::Member { object, .. } => self.rewrite_expr(object),
            Expr::ArrayAccess { array, index } => {
                self.rewrite_expr(array);
                self.rewrite_expr(index);
            }
            Expr::ArrayLiteral(elems) => {
                for elem in elems {
                    self.rewrite_expr(elem);
                }
            }
            Expr::NewIntArray(size) => self.rewrite_expr(size),
            Expr::Call {
                receiver,
                method,
                args,
            } => {
                self.rewrite_expr(receiver);
                for arg in args.iter_mut() {
                    self.rewrite_expr(arg);
                }
                self.reify_call(method.data.clone(), args, expr.span);
            }
            _ => {}
        }
    }

    fn reify_call(
        &self,
        callee: String,
        args: &mut Vec<ExprNode>,
        call_span: crate::diagnostic::Span,
    ) {
        let Some(entry) = self.table.method(&callee) else {
            return;
        };
        let Some(last_param) = entry.params.last() else {
            return;
        };
        if !last_param.ty.is_array {
            return;
        }

        let fixed = entry.params.len() - 1;

        // Already normalised call sites are left alone: a trailing array
        // literal, or exactly one array-typed value for the varargs slot.
        if let Some(last_arg) = args.last() {
            if matches!(last_arg.data, Expr::ArrayLiteral(_)) {
                return;
            }
            if args.len() == entry.params.len() {
                let engine = TypeEngine::new(self.table);
                if engine
                    .expr_type(last_arg, &self.method)
                    .is_some_and(|ty| ty.is_array)
                {
                    return;
                }
            }
        }

        let trailing: Vec<ExprNode> = args.drain(fixed.min(args.len())..).collect();
        let span = trailing
            .iter()
            .map(|e| e.span)
            .reduce(|a, b| a.merge(b))
            .unwrap_or(call_span);
        args.push(ExprNode {
            span,
            data: Expr::ArrayLiteral(trailing),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::{build_symbol_table, parse};

    fn lowered(source: &str) -> Program {
        let mut program = parse::parse(source).into_value().expect("parse failed");
        let table = build_symbol_table::build(&program);
        lower_varargs(&mut program, &table);
        program
    }

    fn first_call_args(program: &Program, method_index: usize) -> &[ExprNode] {
        let Stmt::Expr(expr) = &program.class.methods[method_index].body[0].data else {
            panic!("expected expression statement");
        };
        let Expr::Call { args, .. } = &expr.data else {
            panic!("expected call");
        };
        args
    }

    #[test]
    fn groups_trailing_arguments_into_an_array() {
        let program = lowered(
            "class A { public int sum(int... xs) { return xs[0]; } \
             public void f() { this.sum(1, 2, 3); } }",
        );
        let args = first_call_args(&program, 1);
        assert_eq!(args.len(), 1);
        let Expr::ArrayLiteral(elems) = &args[0].data else {
            panic!("expected array literal, got {:?}", args[0].data);
        };
        assert_eq!(elems.len(), 3);
    }

    #[test]
    fn keeps_fixed_arguments_in_place() {
        let program = lowered(
            "class A { public int sum(int a, int... xs) { return a; } \
             public void f() { this.sum(7, 1, 2); } }",
        );
        let args = first_call_args(&program, 1);
        assert_eq!(args.len(), 2);
        assert_eq!(args[0].data, Expr::IntLiteral(7));
        assert!(matches!(args[1].data, Expr::ArrayLiteral(_)));
    }

    #[test]
    fn leaves_explicit_arrays_alone() {
        let program = lowered(
            "class A { public int sum(int... xs) { return xs[0]; } \
             public void f(int[] ys) { this.sum(ys); } }",
        );
        let args = first_call_args(&program, 1);
        assert_eq!(args.len(), 1);
        assert!(matches!(args[0].data, Expr::VarRef(_)));
    }

    #[test]
    fn empty_varargs_become_an_empty_array() {
        let program = lowered(
            "class A { public int sum(int... xs) { return 0; } \
             public void f() { this.sum(); } }",
        );
        let args = first_call_args(&program, 1);
        assert_eq!(args.len(), 1);
        let Expr::ArrayLiteral(elems) = &args[0].data else {
            panic!("expected array literal");
        };
        assert!(elems.is_empty());
    }
}
