use super::{ollir_type, Generator};
use crate::structures::ast::{BinaryOp, Expr, ExprNode, IdentNode};
use crate::structures::types::Type;

/// Result of linearising one expression: the prelude statements that must
/// run, and the operand usable in the enclosing context.
pub(crate) struct ExprResult {
    pub computation: String,
    pub code: String,
}

impl ExprResult {
    fn operand(code: String) -> Self {
        Self {
            computation: String::new(),
            code,
        }
    }
}

/// Where an expression's value ends up; decides the resolved type of calls
/// into imported code.
#[derive(Clone, Copy)]
pub(crate) enum Ctx<'a> {
    /// The value is discarded (expression statement).
    Statement,
    /// The value flows into a slot of the given type, when one is known.
    Value(Option<&'a Type>),
}

impl Generator<'_> {
    /// The operand text for expressions that need no prelude: literals and
    /// plain (non-field) variable reads.
    pub(crate) fn trivial_operand(&self, expr: &ExprNode) -> Option<String> {
        match &expr.data {
            Expr::IntLiteral(v) => Some(format!("{v}.i32")),
            Expr::BoolLiteral(b) => Some(format!("{}.bool", if *b { 1 } else { 0 })),
            Expr::VarRef(ident) => {
                if self.table.is_field_unshadowed(&self.method, &ident.data) {
                    return None;
                }
                let ty = self.table.var_type(&self.method, &ident.data)?;
                Some(format!("{}{}", ident.data, ollir_type(ty)))
            }
            Expr::Paren(inner) => self.trivial_operand(inner),
            _ => None,
        }
    }

    pub(crate) fn expr(&mut self, expr: &ExprNode, ctx: Ctx) -> ExprResult {
        match &expr.data {
            Expr::IntLiteral(_) | Expr::BoolLiteral(_) => {
                ExprResult::operand(self.trivial_operand(expr).unwrap())
            }
            Expr::Paren(inner) => self.expr(inner, ctx),
            Expr::VarRef(ident) => self.var_ref(ident),
            Expr::This => ExprResult::operand(format!("this.{}", self.table.class_name())),
            Expr::Not(inner) => {
                let inner_res = self.expr(inner, Ctx::Value(Some(&Type::BOOLEAN)));
                let temp = self.fresh_temp();
                let mut computation = inner_res.computation;
                computation.push_str(&format!(
                    "{temp}.bool :=.bool !.bool {};\n",
                    inner_res.code
                ));
                ExprResult {
                    computation,
                    code: format!("{temp}.bool"),
                }
            }
            Expr::Binary { op, left, right } => {
                if op.data == BinaryOp::And {
                    self.short_circuit_and(left, right)
                } else {
                    self.binary(op.data, left, right)
                }
            }
            Expr::Call {
                receiver,
                method,
                args,
            } => self.call(receiver, method, args, ctx),
            Expr::Member { object, path } => self.member(object, path),
            Expr::ArrayAccess { array, index } => {
                let array_res = self.expr(array, Ctx::Value(Some(&Type::INT_ARRAY)));
                let index_res = self.expr(index, Ctx::Value(Some(&Type::INT)));
                let mut computation = array_res.computation;
                computation.push_str(&index_res.computation);
                let temp = self.fresh_temp();
                computation.push_str(&format!(
                    "{temp}.i32 :=.i32 {}[{}].i32;\n",
                    operand_name(&array_res.code),
                    index_res.code
                ));
                ExprResult {
                    computation,
                    code: format!("{temp}.i32"),
                }
            }
            Expr::ArrayLiteral(elems) => {
                let mut computation = String::new();
                let mut codes = Vec::with_capacity(elems.len());
                for elem in elems {
                    let res = self.expr(elem, Ctx::Value(Some(&Type::INT)));
                    computation.push_str(&res.computation);
                    codes.push(res.code);
                }

                let temp = self.fresh_temp();
                computation.push_str(&format!(
                    "{temp}.array.i32 :=.array.i32 new(array, {}.i32).array.i32;\n",
                    elems.len()
                ));
                for (i, code) in codes.iter().enumerate() {
                    computation.push_str(&format!("{temp}[{i}.i32].i32 :=.i32 {code};\n"));
                }
                ExprResult {
                    computation,
                    code: format!("{temp}.array.i32"),
                }
            }
            Expr::New(class) => {
                let suffix = format!(".{}", class.data);
                let temp = self.fresh_temp();
                let mut computation = String::new();
                computation.push_str(&format!(
                    "{temp}{suffix} :={suffix} new({}){suffix};\n",
                    class.data
                ));
                computation.push_str(&format!("invokespecial({temp}{suffix}, \"<init>\").V;\n"));
                ExprResult {
                    computation,
                    code: format!("{temp}{suffix}"),
                }
            }
            Expr::NewIntArray(size) => {
                let size_res = self.expr(size, Ctx::Value(Some(&Type::INT)));
                let temp = self.fresh_temp();
                let mut computation = size_res.computation;
                computation.push_str(&format!(
                    "{temp}.array.i32 :=.array.i32 new(array, {}).array.i32;\n",
                    size_res.code
                ));
                ExprResult {
                    computation,
                    code: format!("{temp}.array.i32"),
                }
            }
        }
    }

    fn var_ref(&mut self, ident: &IdentNode) -> ExprResult {
        if self.table.is_field_unshadowed(&self.method, &ident.data) {
            let field = self
                .table
                .field(&ident.data)
                .expect("unshadowed field must exist");
            let suffix = ollir_type(&field.ty);
            let temp = self.fresh_temp();
            let computation = format!(
                "{temp}{suffix} :={suffix} getfield(this, {}{suffix}){suffix};\n",
                ident.data
            );
            return ExprResult {
                computation,
                code: format!("{temp}{suffix}"),
            };
        }

        let ty = self
            .table
            .var_type(&self.method, &ident.data)
            .unwrap_or_else(|| unreachable!("identifier `{}` survived analysis unresolved", ident.data));
        ExprResult::operand(format!("{}{}", ident.data, ollir_type(ty)))
    }

    fn binary(&mut self, op: BinaryOp, left: &ExprNode, right: &ExprNode) -> ExprResult {
        let operand_ty = self.binary_operand_type(op);
        let left_res = self.expr(left, Ctx::Value(Some(&operand_ty)));
        let right_res = self.expr(right, Ctx::Value(Some(&operand_ty)));

        let result_suffix = ollir_type(&self.binary_result_type(op));
        let mut computation = left_res.computation;
        computation.push_str(&right_res.computation);

        let temp = self.fresh_temp();
        computation.push_str(&format!(
            "{temp}{result_suffix} :={result_suffix} {} {}{result_suffix} {};\n",
            left_res.code,
            op.as_str(),
            right_res.code
        ));
        ExprResult {
            computation,
            code: format!("{temp}{result_suffix}"),
        }
    }

    /// `&&` evaluates the right operand only when the left one was true.
    fn short_circuit_and(&mut self, left: &ExprNode, right: &ExprNode) -> ExprResult {
        let n = self.fresh_label();
        let temp = self.fresh_temp();

        let left_res = self.expr(left, Ctx::Value(Some(&Type::BOOLEAN)));
        let mut computation = left_res.computation;
        computation.push_str(&format!("if (!.bool {}) goto L_false{n};\n", left_res.code));

        let right_res = self.expr(right, Ctx::Value(Some(&Type::BOOLEAN)));
        computation.push_str(&right_res.computation);
        computation.push_str(&format!("{temp}.bool :=.bool {};\n", right_res.code));
        computation.push_str(&format!("goto L_end{n};\n"));
        computation.push_str(&format!("L_false{n}:\n"));
        computation.push_str(&format!("{temp}.bool :=.bool 0.bool;\n"));
        computation.push_str(&format!("L_end{n}:\n"));

        ExprResult {
            computation,
            code: format!("{temp}.bool"),
        }
    }

    fn call(
        &mut self,
        receiver: &ExprNode,
        method: &IdentNode,
        args: &[ExprNode],
        ctx: Ctx,
    ) -> ExprResult {
        // The type at the call site: enclosing context first, then the
        // declared return type, then void.
        let expected = match ctx {
            Ctx::Value(Some(ty)) if !ty.is_any() => Some(ty.clone()),
            _ => None,
        };
        let declared = self.table.return_type_of(&method.data).cloned();
        let return_type = expected.or(declared).unwrap_or(Type::VOID);
        let return_suffix = ollir_type(&return_type);

        let mut computation = String::new();

        let param_types: Vec<Option<Type>> = match self.table.method(&method.data) {
            Some(entry) => args
                .iter()
                .enumerate()
                .map(|(i, _)| entry.params.get(i).map(|p| p.ty.clone()))
                .collect(),
            None => vec![None; args.len()],
        };

        let mut arg_codes = Vec::with_capacity(args.len());
        for (arg, param_ty) in args.iter().zip(&param_types) {
            let res = self.expr(arg, Ctx::Value(param_ty.as_ref()));
            computation.push_str(&res.computation);
            arg_codes.push(res.code);
        }

        let (invoke, caller) = match &receiver.data {
            Expr::This => ("invokevirtual", "this".to_owned()),
            Expr::VarRef(ident)
                if self.table.var_type(&self.method, &ident.data).is_none()
                    && self.table.has_import(&ident.data) =>
            {
                ("invokestatic", ident.data.clone())
            }
            _ => {
                let res = self.expr(receiver, Ctx::Value(None));
                computation.push_str(&res.computation);
                ("invokevirtual", res.code)
            }
        };

        let mut call_text = format!("{invoke}({caller}, \"{}\"", method.data);
        for code in &arg_codes {
            call_text.push_str(", ");
            call_text.push_str(code);
        }
        call_text.push(')');
        call_text.push_str(&return_suffix);

        if matches!(ctx, Ctx::Statement) {
            computation.push_str(&call_text);
            computation.push_str(";\n");
            return ExprResult {
                computation,
                code: String::new(),
            };
        }

        let temp = self.fresh_temp();
        computation.push_str(&format!(
            "{temp}{return_suffix} :={return_suffix} {call_text};\n"
        ));
        ExprResult {
            computation,
            code: format!("{temp}{return_suffix}"),
        }
    }

    fn member(&mut self, object: &ExprNode, path: &vec1::Vec1<IdentNode>) -> ExprResult {
        let engine = crate::analysis::TypeEngine::new(self.table);

        if path.last().data == "length" {
            let is_array = engine
                .expr_type(object, &self.method)
                .is_some_and(|ty| ty.is_array);
            if is_array && path.len() == 1 {
                let object_res = self.expr(object, Ctx::Value(Some(&Type::INT_ARRAY)));
                let temp = self.fresh_temp();
                let mut computation = object_res.computation;
                computation.push_str(&format!(
                    "{temp}.i32 :=.i32 arraylength({}).i32;\n",
                    object_res.code
                ));
                return ExprResult {
                    computation,
                    code: format!("{temp}.i32"),
                };
            }
        }

        // `this.f` reads a field of the current class.
        if path.len() == 1 && matches!(object.data, Expr::This) {
            if self.table.field(&path.first().data).is_some() {
                return self.var_ref(path.first());
            }
        }

        // The type checker only lets array `length` and `this`-field reads
        // through.
        unreachable!("member read survived analysis: {:?}", path.first().data)
    }
}

fn operand_name(code: &str) -> &str {
    code.split('.').next().unwrap_or(code)
}
