//! Jasmin output.
//!
//! Walks the instruction list of every method and emits stack-machine
//! mnemonics, tracking the operand-stack depth as it goes: every push
//! increments, every consume decrements, and the peak becomes the
//! `.limit stack` of the method. `.limit locals` follows the highest
//! register touched.

#[cfg(test)]
mod test;

use std::collections::HashMap;

use crate::class_unit::{ClassUnit, Method};
use crate::instruction::{BinOp, Element, Instruction, InvokeKind, Operand, UnOp};
use crate::types::OllirType;

const INDENT: &str = "    ";

/// Can be used to format a [`ClassUnit`] as Jasmin assembly text.
///
/// One outputter per class unit; label and limit counters reset per method.
pub struct JasminOutputter<'u> {
    unit: &'u ClassUnit,
    /// Simple name of every import to its slash-qualified form.
    import_map: HashMap<String, String>,
    method: Option<&'u Method>,
    stack: i32,
    max_stack: i32,
    max_locals: usize,
    label_counter: usize,
}

impl<'u> JasminOutputter<'u> {
    pub fn new(unit: &'u ClassUnit) -> Self {
        let mut import_map = HashMap::new();
        for import in &unit.imports {
            let simple = import.rsplit('.').next().unwrap_or(import);
            import_map.insert(simple.to_owned(), import.replace('.', "/"));
        }
        Self {
            unit,
            import_map,
            method: None,
            stack: 0,
            max_stack: 0,
            max_locals: 0,
            label_counter: 0,
        }
    }

    pub fn build(mut self) -> String {
        let mut out = String::new();

        out.push_str(&format!(".class public {}\n", self.unit.class_name));
        out.push_str(&format!(".super {}\n", self.super_class_name()));

        if !self.unit.fields.is_empty() {
            out.push('\n');
        }
        for field in &self.unit.fields {
            out.push_str(&format!(
                ".field public {} {}\n",
                field.name,
                self.descriptor(&field.ty)
            ));
        }

        for method in &self.unit.methods {
            out.push('\n');
            if method.is_construct {
                out.push_str(&self.constructor());
            } else {
                out.push_str(&self.write_method(method));
            }
        }

        out
    }

    fn super_class_name(&self) -> String {
        match self.unit.super_class.as_deref() {
            None | Some("Object") => "java/lang/Object".to_owned(),
            Some(name) => self.resolve_class(name),
        }
    }

    /// Qualifies a simple class name through the import map.
    fn resolve_class(&self, name: &str) -> String {
        self.import_map
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_owned())
    }

    fn constructor(&self) -> String {
        format!(
            ".method public <init>()V\n\
             {INDENT}aload_0\n\
             {INDENT}invokespecial {}/<init>()V\n\
             {INDENT}return\n\
             .end method\n",
            self.super_class_name()
        )
    }

    fn descriptor(&self, ty: &OllirType) -> String {
        match ty {
            OllirType::Int32 => "I".to_owned(),
            OllirType::Bool => "Z".to_owned(),
            OllirType::Void => "V".to_owned(),
            OllirType::String => "Ljava/lang/String;".to_owned(),
            OllirType::Array(inner) => format!("[{}", self.descriptor(inner)),
            OllirType::Object(name) => format!("L{};", self.resolve_class(name)),
        }
    }

    fn update_stack(&mut self, delta: i32) {
        self.stack += delta;
        debug_assert!(self.stack >= 0, "operand stack underflow");
        self.max_stack = self.max_stack.max(self.stack);
    }

    fn update_locals(&mut self, reg: usize) {
        self.max_locals = self.max_locals.max(reg + 1);
    }

    fn register_of(&self, name: &str) -> usize {
        let method = self.method.expect("method context");
        method
            .var_table
            .get(name)
            .unwrap_or_else(|| panic!("no register for `{name}` in `{}`", method.name))
            .reg
    }

    fn fresh_label_pair(&mut self) -> (String, String) {
        let n = self.label_counter;
        self.label_counter += 1;
        (format!("L_ctrue{n}"), format!("L_cend{n}"))
    }

    fn write_method(&mut self, method: &'u Method) -> String {
        self.method = Some(method);
        self.stack = 0;
        self.max_stack = 0;
        self.max_locals = method.params.len() + 1;
        self.label_counter = 0;

        let mut header = String::from(".method public ");
        if method.is_static {
            header.push_str("static ");
        }
        header.push_str(&method.name);
        header.push('(');
        for param in &method.params {
            header.push_str(&self.descriptor(&param.ty));
        }
        header.push(')');
        header.push_str(&self.descriptor(&method.return_type));
        header.push('\n');

        let mut body = String::new();
        let mut skip_next = false;
        for (i, instruction) in method.instructions.iter().enumerate() {
            if skip_next {
                skip_next = false;
                continue;
            }
            for label in method.labels_at(i) {
                body.push_str(&format!("{label}:\n"));
            }

            if let Some(code) = self.assign_feeding_return(method, i) {
                body.push_str(&code);
                skip_next = true;
            } else {
                body.push_str(&self.instruction(instruction));
            }

            // Values left over by statements with unused results are
            // discarded so terminators always see an empty stack.
            while self.stack > 0 {
                body.push_str("pop\n");
                self.stack -= 1;
            }
        }

        let mut out = header;
        out.push_str(&format!("{INDENT}.limit stack {}\n", self.max_stack));
        out.push_str(&format!("{INDENT}.limit locals {}\n", self.max_locals));
        for line in body.lines() {
            if line.ends_with(':') {
                out.push_str(&format!("{line}\n"));
            } else {
                out.push_str(&format!("{INDENT}{line}\n"));
            }
        }
        out.push_str(".end method\n");

        self.method = None;
        out
    }

    /// An assignment whose value is immediately returned needs no store: the
    /// right-hand side is left on the stack for the return instruction. Only
    /// valid when nothing can jump between the two instructions.
    fn assign_feeding_return(&mut self, method: &Method, i: usize) -> Option<String> {
        let Instruction::Assign { dest, rhs } = &method.instructions[i] else {
            return None;
        };
        let Element::Operand(dest_op) = dest else {
            return None;
        };
        let next = method.instructions.get(i + 1)?;
        let Instruction::Return {
            operand: Some(Element::Operand(returned)),
            return_type,
        } = next
        else {
            return None;
        };
        if returned.name != dest_op.name || method.labels_at(i + 1).next().is_some() {
            return None;
        }

        let mut code = self.rhs(rhs);
        code.push_str(if return_type.is_reference() {
            "areturn\n"
        } else {
            "ireturn\n"
        });
        self.update_stack(-1);
        Some(code)
    }

    fn instruction(&mut self, instruction: &Instruction) -> String {
        match instruction {
            Instruction::Assign { dest, rhs } => self.assign(dest, rhs),
            Instruction::PutField {
                object,
                field,
                value,
            } => self.put_field(object, field, value),
            Instruction::Call { .. } => self.call(instruction),
            Instruction::Return {
                return_type,
                operand,
            } => self.return_instruction(return_type, operand.as_ref()),
            Instruction::Goto { label } => format!("goto {label}\n"),
            Instruction::CondBranch { condition, label } => self.cond_branch(condition, label),
            // Bare value computations only appear as assignment right-hand
            // sides, but emitting them standalone keeps the walk total.
            other => self.rhs(other),
        }
    }

    // -- loads ------------------------------------------------------------

    fn literal(&mut self, value: &str) -> String {
        self.update_stack(1);
        let n: i32 = value.parse().expect("malformed integer literal");
        if n == -1 {
            return "iconst_m1\n".to_owned();
        }
        if (0..=5).contains(&n) {
            return format!("iconst_{n}\n");
        }
        if (i8::MIN as i32..=i8::MAX as i32).contains(&n) {
            return format!("bipush {n}\n");
        }
        if (i16::MIN as i32..=i16::MAX as i32).contains(&n) {
            return format!("sipush {n}\n");
        }
        format!("ldc {n}\n")
    }

    fn load_register(&mut self, reg: usize, reference: bool) -> String {
        self.update_locals(reg);
        self.update_stack(1);
        let prefix = if reference { "aload" } else { "iload" };
        if reg <= 3 {
            format!("{prefix}_{reg}\n")
        } else {
            format!("{prefix} {reg}\n")
        }
    }

    fn load_element(&mut self, element: &Element) -> String {
        match element {
            Element::Literal { value, .. } => self.literal(value),
            Element::Operand(op) => self.load_operand(op),
            Element::ArrayOperand { name, index, .. } => {
                let reg = self.register_of(name);
                let mut code = self.load_register(reg, true);
                code.push_str(&self.load_element(index));
                code.push_str("iaload\n");
                self.update_stack(-1);
                code
            }
        }
    }

    fn load_operand(&mut self, operand: &Operand) -> String {
        let reg = self.register_of(&operand.name);
        self.load_register(reg, operand.ty.is_reference())
    }

    // -- stores -----------------------------------------------------------

    fn store_operand(&mut self, operand: &Operand) -> String {
        let reg = self.register_of(&operand.name);
        self.update_locals(reg);
        self.update_stack(-1);
        let prefix = if operand.ty.is_reference() {
            "astore"
        } else {
            "istore"
        };
        if reg <= 3 {
            format!("{prefix}_{reg}\n")
        } else {
            format!("{prefix} {reg}\n")
        }
    }

    fn assign(&mut self, dest: &Element, rhs: &Instruction) -> String {
        match dest {
            Element::ArrayOperand { name, index, .. } => {
                let reg = self.register_of(name);
                let mut code = self.load_register(reg, true);
                code.push_str(&self.load_element(index));
                code.push_str(&self.rhs(rhs));
                code.push_str("iastore\n");
                self.update_stack(-3);
                code
            }
            Element::Operand(dest_op) => {
                if let Some(code) = self.increment(dest_op, rhs) {
                    return code;
                }
                let mut code = self.rhs(rhs);
                code.push_str(&self.store_operand(dest_op));
                code
            }
            Element::Literal { .. } => unreachable!("literal assignment destination"),
        }
    }

    /// `x = x ± k` with `k` in signed-byte range becomes `iinc`. The
    /// subtraction form requires the literal on the right; `k - x` is not an
    /// increment.
    fn increment(&mut self, dest: &Operand, rhs: &Instruction) -> Option<String> {
        let Instruction::BinaryOp { left, op, right } = rhs else {
            return None;
        };
        if left.ty() != &OllirType::Int32 || right.ty() != &OllirType::Int32 {
            return None;
        }

        let (name, value) = match (op, left, right) {
            (BinOp::Add, Element::Literal { value, .. }, Element::Operand(op2)) => {
                (&op2.name, value.parse::<i32>().ok()?)
            }
            (BinOp::Add | BinOp::Sub, Element::Operand(op1), Element::Literal { value, .. }) => {
                let v = value.parse::<i32>().ok()?;
                (&op1.name, if *op == BinOp::Sub { -v } else { v })
            }
            _ => return None,
        };

        if name != &dest.name || !(i8::MIN as i32..=i8::MAX as i32).contains(&value) {
            return None;
        }

        let reg = self.register_of(&dest.name);
        self.update_locals(reg);
        Some(format!("iinc {reg} {value}\n"))
    }

    // -- computations ------------------------------------------------------

    fn rhs(&mut self, rhs: &Instruction) -> String {
        match rhs {
            Instruction::SingleOp { operand } => self.load_element(operand),
            Instruction::BinaryOp { left, op, right } => self.binary_op(left, *op, right),
            Instruction::UnaryOp { op: UnOp::Not, operand } => {
                let mut code = self.load_element(operand);
                code.push_str("iconst_1\nixor\n");
                self.update_stack(1);
                self.update_stack(-1);
                code
            }
            Instruction::GetField { object, field } => self.get_field(object, field),
            Instruction::Call { .. } => self.call(rhs),
            other => unreachable!("{other:?} cannot be an assignment right-hand side"),
        }
    }

    fn binary_op(&mut self, left: &Element, op: BinOp, right: &Element) -> String {
        let mut code = self.load_element(left);
        code.push_str(&self.load_element(right));

        let mnemonic = match op {
            BinOp::Add => "iadd",
            BinOp::Mul => "imul",
            BinOp::Div => "idiv",
            BinOp::And => "iand",
            BinOp::Or => "ior",
            BinOp::Sub | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge | BinOp::Eq | BinOp::Ne => {
                "isub"
            }
        };
        code.push_str(mnemonic);
        code.push('\n');

        if op.is_comparison() {
            let branch = match op {
                BinOp::Lt => "iflt",
                BinOp::Le => "ifle",
                BinOp::Gt => "ifgt",
                BinOp::Ge => "ifge",
                BinOp::Eq => "ifeq",
                BinOp::Ne => "ifne",
                _ => unreachable!(),
            };
            let (true_label, end_label) = self.fresh_label_pair();
            code.push_str(&format!("{branch} {true_label}\n"));
            code.push_str(&format!("iconst_0\ngoto {end_label}\n"));
            code.push_str(&format!("{true_label}:\niconst_1\n"));
            code.push_str(&format!("{end_label}:\n"));
        }

        self.update_stack(-1);
        code
    }

    fn get_field(&mut self, object: &Operand, field: &Operand) -> String {
        let mut code = self.load_operand(object);
        code.push_str(&format!(
            "getfield {}/{} {}\n",
            self.field_class(object),
            field.name,
            self.descriptor(&field.ty)
        ));
        // The object reference is replaced by the value.
        code
    }

    fn put_field(&mut self, object: &Operand, field: &Operand, value: &Element) -> String {
        let mut code = self.load_operand(object);
        code.push_str(&self.load_element(value));
        code.push_str(&format!(
            "putfield {}/{} {}\n",
            self.field_class(object),
            field.name,
            self.descriptor(&field.ty)
        ));
        self.update_stack(-2);
        code
    }

    fn field_class(&self, object: &Operand) -> String {
        match &object.ty {
            OllirType::Object(name) => self.resolve_class(name),
            _ => self.unit.class_name.clone(),
        }
    }

    // -- calls -------------------------------------------------------------

    fn call(&mut self, call: &Instruction) -> String {
        let Instruction::Call {
            kind,
            caller,
            method,
            args,
            return_type,
        } = call
        else {
            unreachable!("call lowering on a non-call");
        };

        match kind {
            InvokeKind::New => self.new_instruction(caller, args, return_type),
            InvokeKind::ArrayLength => {
                let mut code = self.load_element(caller);
                code.push_str("arraylength\n");
                code
            }
            InvokeKind::Ldc => {
                let name = caller.name().expect("ldc needs a constant operand");
                self.update_stack(1);
                format!("ldc {name}\n")
            }
            InvokeKind::Static | InvokeKind::Special | InvokeKind::Virtual => {
                self.invoke(*kind, caller, method.as_deref(), args, return_type)
            }
        }
    }

    fn new_instruction(
        &mut self,
        caller: &Element,
        args: &[Element],
        return_type: &OllirType,
    ) -> String {
        if matches!(return_type, OllirType::Array(_)) {
            let mut code = self.load_element(&args[0]);
            code.push_str("newarray int\n");
            return code;
        }
        let class = caller.name().expect("new needs a class operand");
        self.update_stack(1);
        format!("new {}\n", self.resolve_class(class))
    }

    fn invoke(
        &mut self,
        kind: InvokeKind,
        caller: &Element,
        method: Option<&str>,
        args: &[Element],
        return_type: &OllirType,
    ) -> String {
        let mut code = String::new();
        if kind != InvokeKind::Static {
            code.push_str(&self.load_element(caller));
        }
        for arg in args {
            code.push_str(&self.load_element(arg));
        }

        let class = match kind {
            InvokeKind::Static => {
                let name = caller.name().expect("static call needs a class operand");
                self.resolve_class(name)
            }
            _ => match caller.ty() {
                OllirType::Object(name) => self.resolve_class(name),
                _ => self.unit.class_name.clone(),
            },
        };

        let (mnemonic, method_name) = match kind {
            InvokeKind::Static => ("invokestatic", method.unwrap_or("<unknown>").to_owned()),
            InvokeKind::Virtual => ("invokevirtual", method.unwrap_or("<unknown>").to_owned()),
            // Constructors are the only special calls.
            InvokeKind::Special => ("invokespecial", "<init>".to_owned()),
            _ => unreachable!(),
        };

        code.push_str(&format!("{mnemonic} {class}/{method_name}("));
        for arg in args {
            code.push_str(&self.descriptor(arg.ty()));
        }
        code.push_str(&format!("){}\n", self.descriptor(return_type)));

        self.update_stack(-(args.len() as i32));
        if kind != InvokeKind::Static {
            self.update_stack(-1);
        }
        if !return_type.is_void() {
            self.update_stack(1);
        }
        code
    }

    // -- control flow ------------------------------------------------------

    fn return_instruction(
        &mut self,
        return_type: &OllirType,
        operand: Option<&Element>,
    ) -> String {
        match operand {
            None => "return\n".to_owned(),
            Some(element) => {
                let mut code = self.load_element(element);
                code.push_str(if return_type.is_reference() {
                    "areturn\n"
                } else {
                    "ireturn\n"
                });
                self.update_stack(-1);
                code
            }
        }
    }

    fn cond_branch(&mut self, condition: &Instruction, label: &str) -> String {
        match condition {
            Instruction::BinaryOp { left, op, right } => {
                // The comparison lowering has already materialised 0/1.
                let mut code = self.binary_op(left, *op, right);
                code.push_str(&format!("ifne {label}\n"));
                self.update_stack(-1);
                code
            }
            Instruction::UnaryOp {
                op: UnOp::Not,
                operand,
            } => {
                // Branch on the inner operand being false directly.
                let mut code = self.load_element(operand);
                code.push_str(&format!("ifeq {label}\n"));
                self.update_stack(-1);
                code
            }
            Instruction::SingleOp { operand } => {
                let mut code = self.load_element(operand);
                code.push_str(&format!("ifne {label}\n"));
                self.update_stack(-1);
                code
            }
            other => unreachable!("{other:?} cannot be a branch condition"),
        }
    }
}
