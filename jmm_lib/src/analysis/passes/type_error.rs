use crate::analysis::TypeEngine;
use crate::diagnostic::{Diagnostic, DiagnosticBuilder};
use crate::structures::ast::{Expr, ExprNode, MethodNode, Program, Stmt, StmtNode};
use crate::structures::symbol_table::SymbolTable;
use crate::structures::types::Type;

pub fn check(program: &Program, table: &SymbolTable) -> Vec<Diagnostic> {
    let mut reports = Vec::new();

    for method in &program.class.methods {
        let mut checker = MethodChecker {
            engine: TypeEngine::new(table),
            table,
            method,
            reports: &mut reports,
        };
        for stmt in &method.body {
            checker.check_stmt(stmt);
        }
    }

    reports
}

struct MethodChecker<'a> {
    engine: TypeEngine<'a>,
    table: &'a SymbolTable,
    method: &'a MethodNode,
    reports: &'a mut Vec<Diagnostic>,
}

impl MethodChecker<'_> {
    fn method_name(&self) -> &str {
        &self.method.name.data
    }

    /// The type of `expr`, or `None` for unresolved identifiers (already
    /// reported by an earlier pass).
    fn type_of(&self, expr: &ExprNode) -> Option<Type> {
        self.engine.expr_type(expr, self.method_name())
    }

    fn check_stmt(&mut self, stmt: &StmtNode) {
        match &stmt.data {
            Stmt::Assign { target, rhs } => {
                self.check_expr_tree(rhs);

                let Some(target_ty) = self
                    .table
                    .var_type(self.method_name(), &target.data)
                    .cloned()
                else {
                    return;
                };
                let Some(rhs_ty) = self.type_of(rhs) else {
                    return;
                };

                if !self.engine.assignable(&rhs_ty, &target_ty) {
                    self.reports.push(
                        DiagnosticBuilder::new(stmt.span)
                            .build_incompatible_assign(&rhs_ty, &target_ty),
                    );
                    return;
                }

                if target_ty.is_array {
                    if let Expr::ArrayLiteral(elems) = &rhs.data {
                        let elem_ty = target_ty.element_type();
                        for elem in elems {
                            let Some(found) = self.type_of(elem) else {
                                continue;
                            };
                            if !self.engine.assignable(&found, &elem_ty) {
                                self.reports.push(
                                    DiagnosticBuilder::new(elem.span)
                                        .build_invalid_array_element(&elem_ty, &found),
                                );
                            }
                        }
                    }
                }
            }
            Stmt::ArrayAssign { target, index, rhs } => {
                self.check_expr_tree(index);
                self.check_expr_tree(rhs);

                let target_ty = self
                    .table
                    .var_type(self.method_name(), &target.data)
                    .cloned();
                if let Some(target_ty) = &target_ty {
                    if !target_ty.is_array {
                        self.reports.push(
                            DiagnosticBuilder::new(stmt.span)
                                .build_array_assign_not_array(target_ty),
                        );
                    }
                }

                if let Some(index_ty) = self.type_of(index) {
                    if !self.engine.assignable(&index_ty, &Type::INT) {
                        self.reports.push(
                            DiagnosticBuilder::new(index.span).build_array_index_not_int(&index_ty),
                        );
                    }
                }

                if let (Some(target_ty), Some(rhs_ty)) = (target_ty, self.type_of(rhs)) {
                    let elem_ty = target_ty.element_type();
                    if !self.engine.assignable(&rhs_ty, &elem_ty) {
                        self.reports.push(
                            DiagnosticBuilder::new(rhs.span)
                                .build_incompatible_assign(&rhs_ty, &elem_ty),
                        );
                    }
                }
            }
            Stmt::If {
                cond,
                then_body,
                else_body,
            } => {
                self.check_condition(cond, "if");
                self.check_stmt(then_body);
                self.check_stmt(else_body);
            }
            Stmt::While { cond, body } => {
                self.check_condition(cond, "while");
                self.check_stmt(body);
            }
            Stmt::Scope(stmts) => {
                for stmt in stmts {
                    self.check_stmt(stmt);
                }
            }
            Stmt::Return(expr) => {
                self.check_expr_tree(expr);

                let Some(declared) = self.table.return_type_of(self.method_name()).cloned() else {
                    return;
                };
                let Some(found) = self.type_of(expr) else {
                    return;
                };
                if !self.engine.assignable(&found, &declared) {
                    self.reports.push(
                        DiagnosticBuilder::new(stmt.span)
                            .build_incompatible_return(&found, &declared),
                    );
                }
            }
            Stmt::Expr(expr) => self.check_expr_tree(expr),
        }
    }

    fn check_condition(&mut self, cond: &ExprNode, construct: &str) {
        self.check_expr_tree(cond);
        if let Some(ty) = self.type_of(cond) {
            if !self.engine.assignable(&ty, &Type::BOOLEAN) {
                self.reports
                    .push(DiagnosticBuilder::new(cond.span).build_incompatible_condition(construct, &ty));
            }
        }
    }

    fn check_expr_tree(&mut self, root: &ExprNode) {
        // Collecting first keeps the borrow on `self` out of the closure.
        let mut nodes = Vec::new();
        root.for_each(&mut |node| nodes.push(node));
        for node in nodes {
            self.check_expr(node);
        }
    }

    fn check_expr(&mut self, expr: &ExprNode) {
        match &expr.data {
            Expr::Binary { op, left, right } => {
                let (Some(left_ty), Some(right_ty)) = (self.type_of(left), self.type_of(right))
                else {
                    return;
                };

                if left_ty.is_array || right_ty.is_array {
                    self.reports
                        .push(DiagnosticBuilder::new(expr.span).build_array_in_binary_expr());
                    return;
                }

                let op_str = op.data.as_str();
                if op.data.is_arithmetic() {
                    if !self.engine.assignable(&left_ty, &Type::INT)
                        || !self.engine.assignable(&right_ty, &Type::INT)
                    {
                        self.reports.push(
                            DiagnosticBuilder::new(expr.span).build_incompatible_operands(
                                op_str,
                                &Type::INT,
                                &left_ty,
                                &right_ty,
                            ),
                        );
                    }
                } else if op.data.is_comparison() {
                    if !self.engine.assignable(&left_ty, &right_ty) {
                        self.reports.push(
                            DiagnosticBuilder::new(expr.span).build_incompatible_comparison(
                                op_str, &left_ty, &right_ty,
                            ),
                        );
                    }
                } else if !self.engine.assignable(&left_ty, &Type::BOOLEAN)
                    || !self.engine.assignable(&right_ty, &Type::BOOLEAN)
                {
                    self.reports.push(
                        DiagnosticBuilder::new(expr.span).build_incompatible_operands(
                            op_str,
                            &Type::BOOLEAN,
                            &left_ty,
                            &right_ty,
                        ),
                    );
                }
            }
            Expr::ArrayAccess { index, .. } => {
                if let Some(index_ty) = self.type_of(index) {
                    if !self.engine.assignable(&index_ty, &Type::INT) {
                        self.reports.push(
                            DiagnosticBuilder::new(index.span).build_array_index_not_int(&index_ty),
                        );
                    }
                }
            }
            Expr::Member { object, path } => {
                // The only member reads the language defines are `length` on
                // an array and a field of `this`.
                let single = path.len() == 1;
                if single && path.first().data == "length" {
                    if let Some(object_ty) = self.type_of(object) {
                        if !object_ty.is_array {
                            self.reports.push(
                                DiagnosticBuilder::new(expr.span)
                                    .build_invalid_array_access(&object_ty),
                            );
                        }
                    }
                    return;
                }
                if single && matches!(object.data, Expr::This) {
                    if self.table.field(&path.first().data).is_some() {
                        return;
                    }
                }
                let dotted = path
                    .iter()
                    .map(|segment| segment.data.as_str())
                    .collect::<Vec<_>>()
                    .join(".");
                self.reports.push(
                    DiagnosticBuilder::new(expr.span).build_invalid_member_access(&dotted),
                );
            }
            Expr::Call { method, args, .. } => self.check_call(expr, method.data.as_str(), args),
            _ => {}
        }
    }

    fn check_call(&mut self, call: &ExprNode, callee: &str, args: &[ExprNode]) {
        // Methods of imported classes are opaque.
        let Some(entry) = self.table.method(callee) else {
            return;
        };
        let params = entry.params.clone();

        if entry.has_varargs {
            let fixed = params.len() - 1;
            if args.len() < fixed {
                self.reports.push(
                    DiagnosticBuilder::new(call.span)
                        .build_too_few_varargs_arguments(callee, fixed, args.len()),
                );
                return;
            }

            for (i, (arg, param)) in args.iter().zip(&params[..fixed]).enumerate() {
                self.check_argument(callee, i + 1, arg, &param.ty);
            }

            let vararg_ty = &params[fixed].ty;
            let array_form = args.len() == params.len()
                && self
                    .type_of(&args[fixed])
                    .is_some_and(|ty| ty.is_array || ty.is_any());
            if array_form {
                self.check_argument(callee, fixed + 1, &args[fixed], vararg_ty);
            } else {
                let elem_ty = vararg_ty.element_type();
                for (i, arg) in args.iter().enumerate().skip(fixed) {
                    self.check_argument(callee, i + 1, arg, &elem_ty);
                }
            }
        } else {
            if args.len() != params.len() {
                self.reports.push(
                    DiagnosticBuilder::new(call.span).build_wrong_argument_count(
                        callee,
                        params.len(),
                        args.len(),
                    ),
                );
                return;
            }
            for (i, (arg, param)) in args.iter().zip(&params).enumerate() {
                self.check_argument(callee, i + 1, arg, &param.ty);
            }
        }
    }

    fn check_argument(&mut self, callee: &str, index: usize, arg: &ExprNode, expected: &Type) {
        let Some(found) = self.type_of(arg) else {
            return;
        };
        if !self.engine.assignable(&found, expected) {
            self.reports.push(
                DiagnosticBuilder::new(arg.span)
                    .build_incompatible_argument(index, callee, expected, &found),
            );
        }
    }
}
