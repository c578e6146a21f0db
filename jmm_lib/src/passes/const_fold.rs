//! Constant propagation and folding.
//!
//! `propagate` pushes known literal bindings into uses, `fold` collapses
//! pure literal expression trees. The two alternate until neither rewrites
//! anything.

use std::collections::{HashMap, HashSet};

use crate::structures::ast::{
    BinaryOp, Expr, ExprNode, Program, Stmt, StmtNode,
};

pub fn const_fold(program: &mut Program) {
    while propagate(program) || fold(program) {}
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Value {
    Int(i32),
    Bool(bool),
}

fn literal_value(expr: &ExprNode) -> Option<Value> {
    match &expr.data {
        Expr::IntLiteral(v) => Some(Value::Int(*v)),
        Expr::BoolLiteral(b) => Some(Value::Bool(*b)),
        _ => None,
    }
}

fn replace_with_literal(expr: &mut ExprNode, value: Value) {
    expr.data = match value {
        Value::Int(v) => Expr::IntLiteral(v),
        Value::Bool(b) => Expr::BoolLiteral(b),
    };
}

// ---------------------------------------------------------------------------
// Propagation

fn propagate(program: &mut Program) -> bool {
    let mut changed = false;
    for method in &mut program.class.methods {
        let mut propagator = Propagator::default();
        propagator.visit_stmts(&mut method.body);
        changed |= propagator.changed;
    }
    changed
}

/// Straight-line propagation environment for one method.
///
/// Bindings never survive a statement that might invalidate them: assigning
/// a non-literal drops the binding, and branches/loops drop every variable
/// they assign.
#[derive(Default)]
struct Propagator {
    int_env: HashMap<String, i32>,
    bool_env: HashMap<String, bool>,
    changed: bool,
}

impl Propagator {
    fn visit_stmts(&mut self, stmts: &mut [StmtNode]) {
        for stmt in stmts {
            self.visit_stmt(stmt);
        }
    }

    fn visit_stmt(&mut self, stmt: &mut StmtNode) {
        match &mut stmt.data {
            Stmt::Assign { target, rhs } => {
                // Occurrences of the target in the right-hand side still read
                // the old value, so the current binding applies to them; the
                // left-hand side itself is never touched.
                self.substitute(rhs, &HashSet::new());
                let name = target.data.clone();
                self.int_env.remove(&name);
                self.bool_env.remove(&name);
                match literal_value(rhs) {
                    Some(Value::Int(v)) => {
                        self.int_env.insert(name, v);
                    }
                    Some(Value::Bool(b)) => {
                        self.bool_env.insert(name, b);
                    }
                    None => {}
                }
            }
            Stmt::ArrayAssign { index, rhs, .. } => {
                let skip = HashSet::new();
                self.substitute(index, &skip);
                self.substitute(rhs, &skip);
            }
            Stmt::If {
                cond,
                then_body,
                else_body,
            } => {
                let mut then_mutated = HashSet::new();
                let mut else_mutated = HashSet::new();
                assigned_vars(then_body, &mut then_mutated);
                assigned_vars(else_body, &mut else_mutated);

                // Each branch sees the pre-branch environment, minus the
                // variables it mutates itself.
                self.substitute_branch(then_body, &then_mutated);
                self.substitute_branch(else_body, &else_mutated);

                for name in then_mutated.iter().chain(&else_mutated) {
                    self.int_env.remove(name);
                    self.bool_env.remove(name);
                }

                self.substitute(cond, &HashSet::new());
            }
            Stmt::While { cond, body } => {
                // Anything the body assigns has no single known value at the
                // loop head, so it is dropped before any substitution.
                let mut mutated = HashSet::new();
                assigned_vars(body, &mut mutated);
                for name in &mutated {
                    self.int_env.remove(name);
                    self.bool_env.remove(name);
                }

                self.substitute_branch(body, &HashSet::new());
                self.substitute(cond, &HashSet::new());
            }
            Stmt::Scope(stmts) => self.visit_stmts(stmts),
            Stmt::Return(expr) | Stmt::Expr(expr) => self.substitute(expr, &HashSet::new()),
        }
    }

    /// Pure substitution over every expression in a branch; creates no new
    /// bindings.
    fn substitute_branch(&mut self, stmt: &mut StmtNode, skip: &HashSet<String>) {
        match &mut stmt.data {
            Stmt::Assign { rhs, .. } => self.substitute(rhs, skip),
            Stmt::ArrayAssign { index, rhs, .. } => {
                self.substitute(index, skip);
                self.substitute(rhs, skip);
            }
            Stmt::If {
                cond,
                then_body,
                else_body,
            } => {
                self.substitute(cond, skip);
                self.substitute_branch(then_body, skip);
                self.substitute_branch(else_body, skip);
            }
            Stmt::While { cond, body } => {
                self.substitute(cond, skip);
                self.substitute_branch(body, skip);
            }
            Stmt::Scope(stmts) => {
                for stmt in stmts {
                    self.substitute_branch(stmt, skip);
                }
            }
            Stmt::Return(expr) | Stmt::Expr(expr) => self.substitute(expr, skip),
        }
    }

    fn substitute(&mut self, expr: &mut ExprNode, skip: &HashSet<String>) {
        if let Expr::VarRef(ident) = &expr.data {
            if skip.contains(&ident.data) {
                return;
            }
            if let Some(v) = self.int_env.get(&ident.data) {
                let value = Value::Int(*v);
                replace_with_literal(expr, value);
                self.changed = true;
            } else if let Some(b) = self.bool_env.get(&ident.data) {
                let value = Value::Bool(*b);
                replace_with_literal(expr, value);
                self.changed = true;
            }
            return;
        }

        match &mut expr.data {
            Expr::Binary { left, right, .. } => {
                self.substitute(left, skip);
                self.substitute(right, skip);
            }
            Expr::Not(inner) | Expr::Paren(inner) => self.substitute(inner, skip),
            Expr::Call { receiver, args, .. } => {
                self.substitute(receiver, skip);
                for arg in args {
                    self.substitute(arg, skip);
                }
            }
            Expr::Member { object, .. } => self.substitute(object, skip),
            Expr::ArrayAccess { array, index } => {
                self.substitute(array, skip);
                self.substitute(index, skip);
            }
            Expr::ArrayLiteral(elems) => {
                for elem in elems {
                    self.substitute(elem, skip);
                }
            }
            Expr::NewIntArray(size) => self.substitute(size, skip),
            _ => {}
        }
    }
}

/// Collects the names of all variables assigned anywhere below `stmt`.
fn assigned_vars(stmt: &StmtNode, out: &mut HashSet<String>) {
    match &stmt.data {
        Stmt::Assign { target, .. } => {
            out.insert(target.data.clone());
        }
        Stmt::ArrayAssign { .. } => {}
        Stmt::If {
            then_body,
            else_body,
            ..
        } => {
            assigned_vars(then_body, out);
            assigned_vars(else_body, out);
        }
        Stmt::While { body, .. } => assigned_vars(body, out),
        Stmt::Scope(stmts) => {
            for stmt in stmts {
                assigned_vars(stmt, out);
            }
        }
        Stmt::Return(_) | Stmt::Expr(_) => {}
    }
}

// ---------------------------------------------------------------------------
// Folding

fn fold(program: &mut Program) -> bool {
    let mut folder = Folder { changed: false };
    for method in &mut program.class.methods {
        for stmt in &mut method.body {
            folder.visit_stmt(stmt);
        }
    }
    folder.changed
}

struct Folder {
    changed: bool,
}

impl Folder {
    fn visit_stmt(&mut self, stmt: &mut StmtNode) {
        match &mut stmt.data {
            Stmt::Assign { rhs, .. } | Stmt::ArrayAssign { rhs, .. } => self.fold_expr(rhs),
            Stmt::If {
                then_body,
                else_body,
                ..
            } => {
                self.visit_stmt(then_body);
                self.visit_stmt(else_body);
            }
            Stmt::While { body, .. } => self.visit_stmt(body),
            Stmt::Scope(stmts) => {
                for stmt in stmts {
                    self.visit_stmt(stmt);
                }
            }
            Stmt::Return(_) | Stmt::Expr(_) => {}
        }
    }

    fn fold_expr(&mut self, expr: &mut ExprNode) {
        // Literals are already as folded as possible.
        if literal_value(expr).is_some() {
            return;
        }
        if let Some(value) = evaluate(expr) {
            replace_with_literal(expr, value);
            self.changed = true;
        }
    }
}

/// Evaluates a pure literal expression tree with 32-bit wrap-around
/// semantics. Returns `None` for anything impure, non-literal, or a division
/// by zero (left for runtime semantics to decide).
fn evaluate(expr: &ExprNode) -> Option<Value> {
    match &expr.data {
        Expr::IntLiteral(v) => Some(Value::Int(*v)),
        Expr::BoolLiteral(b) => Some(Value::Bool(*b)),
        Expr::Paren(inner) => evaluate(inner),
        Expr::Not(inner) => match evaluate(inner)? {
            Value::Bool(b) => Some(Value::Bool(!b)),
            Value::Int(_) => None,
        },
        Expr::Binary { op, left, right } => {
            let left = evaluate(left)?;
            let right = evaluate(right)?;
            evaluate_binary(op.data, left, right)
        }
        _ => None,
    }
}

fn evaluate_binary(op: BinaryOp, left: Value, right: Value) -> Option<Value> {
    use Value::*;
    let value = match (left, right) {
        (Int(a), Int(b)) => match op {
            BinaryOp::Add => Int(a.wrapping_add(b)),
            BinaryOp::Sub => Int(a.wrapping_sub(b)),
            BinaryOp::Mul => Int(a.wrapping_mul(b)),
            BinaryOp::Div => Int(a.checked_div(b)?),
            BinaryOp::Lt => Bool(a < b),
            BinaryOp::Le => Bool(a <= b),
            BinaryOp::Gt => Bool(a > b),
            BinaryOp::Ge => Bool(a >= b),
            BinaryOp::Eq => Bool(a == b),
            BinaryOp::Ne => Bool(a != b),
            BinaryOp::And | BinaryOp::Or => return None,
        },
        (Bool(a), Bool(b)) => match op {
            BinaryOp::And => Bool(a && b),
            BinaryOp::Or => Bool(a || b),
            BinaryOp::Eq => Bool(a == b),
            BinaryOp::Ne => Bool(a != b),
            _ => return None,
        },
        _ => return None,
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::parse;

    fn optimized(source: &str) -> Program {
        let mut program = parse::parse(source).into_value().expect("parse failed");
        const_fold(&mut program);
        program
    }

    fn body_of(program: &Program, index: usize) -> &[StmtNode] {
        &program.class.methods[index].body
    }

    #[test]
    fn folds_reassignment_through_old_value() {
        let program = optimized(
            "class A { public int f() { int x; x = 2; x = x + 3; return x; } }",
        );
        let body = body_of(&program, 0);
        let Stmt::Assign { rhs, .. } = &body[1].data else {
            panic!("expected assignment");
        };
        assert_eq!(rhs.data, Expr::IntLiteral(5));
        let Stmt::Return(expr) = &body[2].data else {
            panic!("expected return");
        };
        assert_eq!(expr.data, Expr::IntLiteral(5));
    }

    #[test]
    fn folds_literal_arithmetic_and_logic() {
        let program = optimized(
            "class A { public boolean f() { boolean b; b = (1 + 2 * 3 < 10) && true; return b; } }",
        );
        let Stmt::Assign { rhs, .. } = &body_of(&program, 0)[0].data else {
            panic!("expected assignment");
        };
        assert_eq!(rhs.data, Expr::BoolLiteral(true));
    }

    #[test]
    fn never_folds_division_by_zero() {
        let program = optimized("class A { public int f() { int x; x = 1 / 0; return x; } }");
        let Stmt::Assign { rhs, .. } = &body_of(&program, 0)[0].data else {
            panic!("expected assignment");
        };
        assert!(matches!(rhs.data, Expr::Binary { .. }));
    }

    #[test]
    fn drops_bindings_mutated_in_a_branch() {
        let program = optimized(
            "class A { public int f(boolean c) { int x; int y; x = 1; \
             if (c) { x = this.g(); } else { y = x; } y = x; return y; } \
             public int g() { return 2; } }",
        );
        let body = body_of(&program, 0);
        // Inside the else branch `x` is still 1.
        let Stmt::If { else_body, .. } = &body[1].data else {
            panic!("expected if");
        };
        let Stmt::Scope(stmts) = &else_body.data else {
            panic!("expected scope");
        };
        let Stmt::Assign { rhs, .. } = &stmts[0].data else {
            panic!("expected assignment");
        };
        assert_eq!(rhs.data, Expr::IntLiteral(1));
        // After the branch the binding is gone.
        let Stmt::Assign { rhs, .. } = &body[2].data else {
            panic!("expected assignment");
        };
        assert!(matches!(rhs.data, Expr::VarRef(_)));
    }

    #[test]
    fn never_substitutes_into_loop_mutated_variables() {
        let program = optimized(
            "class A { public int f() { int i; i = 0; \
             while (i < 10) { i = i + 1; } return i; } }",
        );
        let body = body_of(&program, 0);
        let Stmt::While { cond, .. } = &body[1].data else {
            panic!("expected while");
        };
        // `i` is mutated in the body, so the condition still reads it.
        let Expr::Binary { left, .. } = &cond.data else {
            panic!("expected comparison");
        };
        assert!(matches!(left.data, Expr::VarRef(_)));
    }

    #[test]
    fn propagates_into_loop_invariant_uses() {
        let program = optimized(
            "class A { public int f(int n) { int k; int s; k = 3; s = 0; \
             while (s < n) { s = s + k; } return s; } }",
        );
        let body = body_of(&program, 0);
        let Stmt::While { body: loop_body, .. } = &body[2].data else {
            panic!("expected while");
        };
        let Stmt::Scope(stmts) = &loop_body.data else {
            panic!("expected scope");
        };
        let Stmt::Assign { rhs, .. } = &stmts[0].data else {
            panic!("expected assignment");
        };
        let Expr::Binary { right, .. } = &rhs.data else {
            panic!("expected addition");
        };
        assert_eq!(right.data, Expr::IntLiteral(3));
    }
}
