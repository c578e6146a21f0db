//! OLLIR emission.
//!
//! Expressions are linearised into a `(computation, code)` pair: the
//! computation holds complete prelude statements (one per line), the code is
//! the operand usable in the enclosing context. Statements append their lines
//! directly to the method body.

mod expr;

pub(crate) use expr::{Ctx, ExprResult};

use crate::structures::ast::{MethodNode, Program, Stmt, StmtNode};
use crate::structures::symbol_table::SymbolTable;
use crate::structures::types::{Type, TypeName};

/// Generates the OLLIR text for a whole program.
pub fn build_from_ast(program: &Program, table: &SymbolTable) -> String {
    Generator::new(program, table).generate()
}

/// The OLLIR type suffix of a semantic type, including the leading dot.
pub(crate) fn ollir_type(ty: &Type) -> String {
    let base = match &ty.name {
        TypeName::Int => "i32",
        TypeName::Boolean => "bool",
        TypeName::Void | TypeName::Any => "V",
        TypeName::String => "String",
        TypeName::Class(name) => name,
    };
    if ty.is_array {
        format!(".array.{base}")
    } else {
        format!(".{base}")
    }
}

pub(crate) struct Generator<'p> {
    program: &'p Program,
    table: &'p SymbolTable,
    /// Name of the method currently being emitted.
    method: String,
    temp_counter: usize,
    label_counter: usize,
}

impl<'p> Generator<'p> {
    fn new(program: &'p Program, table: &'p SymbolTable) -> Self {
        Self {
            program,
            table,
            method: String::new(),
            temp_counter: 0,
            label_counter: 0,
        }
    }

    pub(crate) fn fresh_temp(&mut self) -> String {
        self.temp_counter += 1;
        format!("t{}", self.temp_counter)
    }

    /// A fresh label number, shared by the labels of one construct.
    pub(crate) fn fresh_label(&mut self) -> usize {
        let n = self.label_counter;
        self.label_counter += 1;
        n
    }

    fn generate(mut self) -> String {
        let mut out = String::new();

        for import in self.table.imports() {
            out.push_str(&format!("import {import};\n"));
        }

        let super_class = self.table.super_class().unwrap_or("Object");
        out.push_str(&format!("{} extends {} {{\n", self.table.class_name(), super_class));

        for field in self.table.fields() {
            out.push_str(&format!(
                "    .field public {}{};\n",
                field.name,
                ollir_type(&field.ty)
            ));
        }

        out.push('\n');
        out.push_str(&format!("    .construct {}().V {{\n", self.table.class_name()));
        out.push_str("        invokespecial(this, \"<init>\").V;\n");
        out.push_str("    }\n");

        for method in &self.program.class.methods {
            out.push('\n');
            let body = self.generate_method(method);
            out.push_str(&body);
        }

        out.push_str("}\n");
        out
    }

    fn generate_method(&mut self, method: &MethodNode) -> String {
        self.method = method.name.data.clone();

        let mut header = String::from("    .method ");
        if method.is_public {
            header.push_str("public ");
        }
        if method.is_static {
            header.push_str("static ");
        }
        header.push_str(&method.name.data);

        let params = self
            .table
            .params_of(&method.name.data)
            .iter()
            .map(|param| format!("{}{}", param.name, ollir_type(&param.ty)))
            .collect::<Vec<_>>()
            .join(", ");
        let return_type = self
            .table
            .return_type_of(&method.name.data)
            .cloned()
            .unwrap_or(Type::VOID);
        header.push_str(&format!("({params}){} {{\n", ollir_type(&return_type)));

        let mut body = String::new();
        for stmt in &method.body {
            self.stmt(stmt, &mut body);
        }
        if return_type.is_void() {
            body.push_str("ret.V;\n");
        }

        let mut out = header;
        for line in body.lines() {
            if line.ends_with(':') {
                out.push_str(&format!("    {line}\n"));
            } else {
                out.push_str(&format!("        {line}\n"));
            }
        }
        out.push_str("    }\n");
        out
    }

    fn stmt(&mut self, stmt: &StmtNode, out: &mut String) {
        match &stmt.data {
            Stmt::Assign { target, rhs } => self.assign(target, rhs, out),
            Stmt::ArrayAssign { target, index, rhs } => {
                let index_res = self.expr(index, Ctx::Value(Some(&Type::INT)));
                let rhs_res = self.expr(rhs, Ctx::Value(Some(&Type::INT)));
                out.push_str(&index_res.computation);
                out.push_str(&rhs_res.computation);

                let array_name = if self.table.is_field_unshadowed(&self.method, &target.data) {
                    let field_ty = self.table.field(&target.data).map(|f| f.ty.clone());
                    let suffix = ollir_type(&field_ty.unwrap_or(Type::INT_ARRAY));
                    let temp = self.fresh_temp();
                    out.push_str(&format!(
                        "{temp}{suffix} :={suffix} getfield(this, {}{suffix}){suffix};\n",
                        target.data
                    ));
                    temp
                } else {
                    target.data.clone()
                };

                out.push_str(&format!(
                    "{array_name}[{}].i32 :=.i32 {};\n",
                    index_res.code, rhs_res.code
                ));
            }
            Stmt::If {
                cond,
                then_body,
                else_body,
            } => {
                let n = self.fresh_label();
                let cond_code = self.condition(cond, out);
                out.push_str(&format!("if ({cond_code}) goto L_then{n};\n"));
                self.stmt(else_body, out);
                out.push_str(&format!("goto L_endif{n};\n"));
                out.push_str(&format!("L_then{n}:\n"));
                self.stmt(then_body, out);
                out.push_str(&format!("L_endif{n}:\n"));
            }
            Stmt::While { cond, body } => {
                let n = self.fresh_label();
                out.push_str(&format!("goto L_cond{n};\n"));
                out.push_str(&format!("L_body{n}:\n"));
                self.stmt(body, out);
                out.push_str(&format!("L_cond{n}:\n"));
                let cond_code = self.condition(cond, out);
                out.push_str(&format!("if ({cond_code}) goto L_body{n};\n"));
            }
            Stmt::Scope(stmts) => {
                for stmt in stmts {
                    self.stmt(stmt, out);
                }
            }
            Stmt::Return(expr) => {
                let return_type = self
                    .table
                    .return_type_of(&self.method)
                    .cloned()
                    .unwrap_or(Type::VOID);
                let res = self.expr(expr, Ctx::Value(Some(&return_type)));
                out.push_str(&res.computation);
                out.push_str(&format!("ret{} {};\n", ollir_type(&return_type), res.code));
            }
            Stmt::Expr(expr) => {
                let res = self.expr(expr, Ctx::Statement);
                out.push_str(&res.computation);
            }
        }
    }

    fn assign(&mut self, target: &crate::structures::ast::IdentNode, rhs: &crate::structures::ast::ExprNode, out: &mut String) {
        use crate::structures::ast::Expr;

        if self.table.is_field_unshadowed(&self.method, &target.data) {
            let field_ty = self
                .table
                .field(&target.data)
                .map(|f| f.ty.clone())
                .unwrap_or(Type::INT);
            let suffix = ollir_type(&field_ty);
            let res = self.expr(rhs, Ctx::Value(Some(&field_ty)));
            out.push_str(&res.computation);
            out.push_str(&format!(
                "putfield(this, {}{suffix}, {}).V;\n",
                target.data, res.code
            ));
            return;
        }

        let target_ty = self
            .table
            .var_type(&self.method, &target.data)
            .cloned()
            .unwrap_or(Type::INT);
        let suffix = ollir_type(&target_ty);

        // A binary right-hand side whose operands are already plain operands
        // is inlined into the assignment instead of going through a
        // temporary.
        if let Expr::Binary { op, left, right } = &rhs.data {
            if op.data != crate::structures::ast::BinaryOp::And {
                if let (Some(left_code), Some(right_code)) =
                    (self.trivial_operand(left), self.trivial_operand(right))
                {
                    let result_ty = self.binary_result_type(op.data);
                    out.push_str(&format!(
                        "{}{suffix} :={suffix} {left_code} {}{} {right_code};\n",
                        target.data,
                        op.data.as_str(),
                        ollir_type(&result_ty),
                    ));
                    return;
                }
            }
        }

        let res = self.expr(rhs, Ctx::Value(Some(&target_ty)));
        out.push_str(&res.computation);
        out.push_str(&format!("{}{suffix} :={suffix} {};\n", target.data, res.code));
    }

    /// Emits the computation of a branch condition and returns the condition
    /// text for the `if (...) goto` statement. Plain comparisons and
    /// negations stay inline so the backend can pick the matching branch
    /// instruction.
    fn condition(&mut self, cond: &crate::structures::ast::ExprNode, out: &mut String) -> String {
        use crate::structures::ast::{BinaryOp, Expr};

        match &cond.data {
            Expr::Paren(inner) => self.condition(inner, out),
            Expr::Binary { op, left, right } if op.data != BinaryOp::And => {
                if let (Some(left_code), Some(right_code)) =
                    (self.trivial_operand(left), self.trivial_operand(right))
                {
                    let result_ty = self.binary_result_type(op.data);
                    return format!(
                        "{left_code} {}{} {right_code}",
                        op.data.as_str(),
                        ollir_type(&result_ty),
                    );
                }
                let res = self.expr(cond, Ctx::Value(Some(&Type::BOOLEAN)));
                out.push_str(&res.computation);
                res.code
            }
            Expr::Not(inner) => {
                let inner_res = self.expr(inner, Ctx::Value(Some(&Type::BOOLEAN)));
                out.push_str(&inner_res.computation);
                format!("!.bool {}", inner_res.code)
            }
            _ => {
                let res = self.expr(cond, Ctx::Value(Some(&Type::BOOLEAN)));
                out.push_str(&res.computation);
                res.code
            }
        }
    }

    pub(crate) fn binary_result_type(&self, op: crate::structures::ast::BinaryOp) -> Type {
        if op.is_arithmetic() {
            Type::INT
        } else {
            Type::BOOLEAN
        }
    }

    pub(crate) fn binary_operand_type(&self, op: crate::structures::ast::BinaryOp) -> Type {
        if op.is_logical() {
            Type::BOOLEAN
        } else {
            Type::INT
        }
    }
}
