//! Reader for OLLIR text.
//!
//! Parses the dialect emitted by the front end into a [`ClassUnit`]. The
//! input is line-oriented: every statement ends with `;`, labels end with
//! `:`, headers open a `{` block closed by a lone `}`.

use std::collections::HashMap;
use std::fmt;

use crate::class_unit::{ClassUnit, Descriptor, Field, Method, Param};
use crate::instruction::{BinOp, Element, Instruction, InvokeKind, Operand, UnOp};
use crate::types::OllirType;

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    /// 1-based line number in the OLLIR text.
    pub line: usize,
    pub message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ollir line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ParseError {}

pub fn parse(source: &str) -> Result<ClassUnit, ParseError> {
    Reader::new(source).read()
}

struct Reader<'s> {
    lines: Vec<(usize, &'s str)>,
    next: usize,
    unit: ClassUnit,
}

impl<'s> Reader<'s> {
    fn new(source: &'s str) -> Self {
        let lines = source
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l.trim()))
            .filter(|(_, l)| !l.is_empty())
            .collect();
        Self {
            lines,
            next: 0,
            unit: ClassUnit::default(),
        }
    }

    fn next_line(&mut self) -> Option<(usize, &'s str)> {
        let line = self.lines.get(self.next).copied();
        self.next += 1;
        line
    }

    fn error(line: usize, message: impl Into<String>) -> ParseError {
        ParseError {
            line,
            message: message.into(),
        }
    }

    fn read(mut self) -> Result<ClassUnit, ParseError> {
        // Imports and the class header.
        loop {
            let Some((n, line)) = self.next_line() else {
                return Err(Self::error(0, "missing class declaration"));
            };
            if let Some(rest) = line.strip_prefix("import ") {
                let path = rest
                    .strip_suffix(';')
                    .ok_or_else(|| Self::error(n, "import not terminated by `;`"))?;
                self.unit.imports.push(path.trim().to_owned());
                continue;
            }

            let header = line
                .strip_suffix('{')
                .ok_or_else(|| Self::error(n, "expected class header"))?;
            let mut words = header.split_whitespace();
            let name = words
                .next()
                .ok_or_else(|| Self::error(n, "missing class name"))?;
            self.unit.class_name = name.to_owned();
            if let Some(kw) = words.next() {
                if kw != "extends" {
                    return Err(Self::error(n, format!("unexpected `{kw}` in class header")));
                }
                let parent = words
                    .next()
                    .ok_or_else(|| Self::error(n, "missing superclass name"))?;
                self.unit.super_class = Some(parent.to_owned());
            }
            break;
        }

        // Class body.
        while let Some((n, line)) = self.next_line() {
            if line == "}" {
                return Ok(self.unit);
            }
            if let Some(rest) = line.strip_prefix(".field public ") {
                let text = rest
                    .strip_suffix(';')
                    .ok_or_else(|| Self::error(n, "field not terminated by `;`"))?;
                let class_name = self.unit.class_name.clone();
                let mut cursor = Cursor::new(text, n, &class_name);
                let name = cursor.ident()?;
                let ty = cursor.parse_type()?;
                self.unit.fields.push(Field { name, ty });
                continue;
            }
            if line.starts_with(".construct ") {
                self.skip_block(n)?;
                self.unit.methods.push(Method {
                    name: "<init>".to_owned(),
                    is_static: false,
                    is_construct: true,
                    params: Vec::new(),
                    return_type: OllirType::Void,
                    instructions: Vec::new(),
                    labels: Vec::new(),
                    var_table: HashMap::new(),
                });
                continue;
            }
            if line.starts_with(".method ") {
                let method = self.read_method(n, line)?;
                self.unit.methods.push(method);
                continue;
            }
            return Err(Self::error(n, format!("unexpected line `{line}`")));
        }

        Err(Self::error(0, "missing closing `}` of class"))
    }

    fn skip_block(&mut self, start: usize) -> Result<(), ParseError> {
        while let Some((_, line)) = self.next_line() {
            if line == "}" {
                return Ok(());
            }
        }
        Err(Self::error(start, "unterminated block"))
    }

    fn read_method(&mut self, n: usize, header: &str) -> Result<Method, ParseError> {
        let class_name = self.unit.class_name.clone();
        let mut cursor = Cursor::new(header, n, &class_name);
        cursor.expect_str(".method")?;

        let mut is_static = false;
        let name = loop {
            let word = cursor.ident()?;
            if cursor.peek() == Some('(') {
                break word;
            }
            match word.as_str() {
                "public" => {}
                "static" => is_static = true,
                other => {
                    return Err(Self::error(n, format!("unknown method modifier `{other}`")))
                }
            }
        };

        cursor.expect('(')?;
        let mut params = Vec::new();
        if !cursor.eat(')') {
            loop {
                let name = cursor.ident()?;
                let ty = cursor.parse_type()?;
                params.push(Param { name, ty });
                if !cursor.eat(',') {
                    break;
                }
            }
            cursor.expect(')')?;
        }
        let return_type = cursor.parse_type()?;
        cursor.expect('{')?;

        let mut method = Method {
            name,
            is_static,
            is_construct: false,
            params,
            return_type,
            instructions: Vec::new(),
            labels: Vec::new(),
            var_table: HashMap::new(),
        };

        loop {
            let Some((n, line)) = self.next_line() else {
                return Err(Self::error(n, "unterminated method body"));
            };
            if line == "}" {
                break;
            }
            if let Some(label) = line.strip_suffix(':') {
                method
                    .labels
                    .push((label.to_owned(), method.instructions.len()));
                continue;
            }
            let text = line
                .strip_suffix(';')
                .ok_or_else(|| Self::error(n, "statement not terminated by `;`"))?;
            let mut cursor = Cursor::new(text, n, &class_name);
            let instruction = cursor.parse_statement()?;
            cursor.expect_end()?;
            method.instructions.push(instruction);
        }

        build_var_table(&mut method, &class_name);
        Ok(method)
    }
}

/// Assigns frame slots: `this` gets 0, parameters the following slots, and
/// every other name a fresh slot at its first occurrence.
fn build_var_table(method: &mut Method, class_name: &str) {
    let mut table = HashMap::new();

    if !method.is_static {
        table.insert(
            "this".to_owned(),
            Descriptor {
                reg: 0,
                ty: OllirType::Object(class_name.to_owned()),
            },
        );
    }
    let base = if method.is_static { 0 } else { 1 };
    for (i, param) in method.params.iter().enumerate() {
        table.insert(
            param.name.clone(),
            Descriptor {
                reg: base + i,
                ty: param.ty.clone(),
            },
        );
    }

    let mut next = base + method.params.len();
    for instruction in &method.instructions {
        collect_vars(instruction, &mut |name: &str, ty: &OllirType| {
            if !table.contains_key(name) {
                table.insert(
                    name.to_owned(),
                    Descriptor {
                        reg: next,
                        ty: ty.clone(),
                    },
                );
                next += 1;
            }
        });
    }

    method.var_table = table;
}

fn element_vars(element: &Element, f: &mut impl FnMut(&str, &OllirType)) {
    match element {
        Element::Literal { .. } => {}
        Element::Operand(op) => f(&op.name, &op.ty),
        Element::ArrayOperand { name, ty, index } => {
            let array_ty = OllirType::Array(Box::new(ty.clone()));
            f(name, &array_ty);
            element_vars(index, f);
        }
    }
}

fn collect_vars(instruction: &Instruction, f: &mut impl FnMut(&str, &OllirType)) {
    match instruction {
        Instruction::Assign { dest, rhs } => {
            element_vars(dest, f);
            collect_vars(rhs, f);
        }
        Instruction::BinaryOp { left, right, .. } => {
            element_vars(left, f);
            element_vars(right, f);
        }
        Instruction::UnaryOp { operand, .. } | Instruction::SingleOp { operand } => {
            element_vars(operand, f)
        }
        Instruction::GetField { object, .. } => f(&object.name, &object.ty),
        Instruction::PutField { object, value, .. } => {
            f(&object.name, &object.ty);
            element_vars(value, f);
        }
        Instruction::Call {
            kind, caller, args, ..
        } => {
            match kind {
                InvokeKind::Virtual | InvokeKind::Special | InvokeKind::ArrayLength => {
                    element_vars(caller, f)
                }
                InvokeKind::Static | InvokeKind::New | InvokeKind::Ldc => {}
            }
            for arg in args {
                element_vars(arg, f);
            }
        }
        Instruction::Return { operand, .. } => {
            if let Some(operand) = operand {
                element_vars(operand, f);
            }
        }
        Instruction::CondBranch { condition, .. } => collect_vars(condition, f),
        Instruction::Goto { .. } => {}
    }
}

// ---------------------------------------------------------------------------
// Statement-level cursor

struct Cursor<'s> {
    src: &'s str,
    pos: usize,
    line: usize,
    class_name: &'s str,
}

impl<'s> Cursor<'s> {
    fn new(src: &'s str, line: usize, class_name: &'s str) -> Self {
        Self {
            src,
            pos: 0,
            line,
            class_name,
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            line: self.line,
            message: message.into(),
        }
    }

    fn skip_ws(&mut self) {
        while self.src[self.pos..].starts_with(|c: char| c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_ws();
        self.src[self.pos..].chars().next()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<(), ParseError> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(format!("expected `{c}` in `{}`", self.src)))
        }
    }

    fn starts_with(&mut self, s: &str) -> bool {
        self.skip_ws();
        self.src[self.pos..].starts_with(s)
    }

    fn eat_str(&mut self, s: &str) -> bool {
        if self.starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn expect_str(&mut self, s: &str) -> Result<(), ParseError> {
        if self.eat_str(s) {
            Ok(())
        } else {
            Err(self.error(format!("expected `{s}` in `{}`", self.src)))
        }
    }

    fn expect_end(&mut self) -> Result<(), ParseError> {
        self.skip_ws();
        if self.pos == self.src.len() {
            Ok(())
        } else {
            Err(self.error(format!(
                "trailing input `{}`",
                &self.src[self.pos..]
            )))
        }
    }

    /// Consumes `kw` only when it is not the prefix of a longer name.
    fn eat_keyword(&mut self, kw: &str) -> bool {
        if !self.starts_with(kw) {
            return false;
        }
        let rest = &self.src[self.pos + kw.len()..];
        if rest.starts_with(|c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '$')) {
            return false;
        }
        self.pos += kw.len();
        true
    }

    fn ident(&mut self) -> Result<String, ParseError> {
        self.skip_ws();
        let start = self.pos;
        for c in self.src[self.pos..].chars() {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '<' | '>') {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        if self.pos == start {
            return Err(self.error(format!("expected a name in `{}`", self.src)));
        }
        Ok(self.src[start..self.pos].to_owned())
    }

    fn number(&mut self) -> Result<String, ParseError> {
        self.skip_ws();
        let start = self.pos;
        if self.src[self.pos..].starts_with('-') {
            self.pos += 1;
        }
        while self.src[self.pos..].starts_with(|c: char| c.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error("expected a number"));
        }
        Ok(self.src[start..self.pos].to_owned())
    }

    /// Parses a `.T` suffix.
    fn parse_type(&mut self) -> Result<OllirType, ParseError> {
        self.expect('.')?;
        if self.eat_str("array.") {
            let inner = self.parse_base_type()?;
            return Ok(OllirType::Array(Box::new(inner)));
        }
        self.parse_base_type()
    }

    fn parse_base_type(&mut self) -> Result<OllirType, ParseError> {
        let name = self.ident()?;
        let ty = match name.as_str() {
            "i32" => OllirType::Int32,
            "bool" => OllirType::Bool,
            "V" => OllirType::Void,
            "String" => OllirType::String,
            _ => OllirType::Object(name),
        };
        Ok(ty)
    }

    fn parse_element(&mut self) -> Result<Element, ParseError> {
        self.skip_ws();
        let c = self
            .peek()
            .ok_or_else(|| self.error("expected an element"))?;

        if c.is_ascii_digit() || c == '-' {
            let value = self.number()?;
            let ty = self.parse_type()?;
            return Ok(Element::Literal { value, ty });
        }

        let name = self.ident()?;
        if self.eat('[') {
            let index = self.parse_element()?;
            self.expect(']')?;
            let ty = self.parse_type()?;
            return Ok(Element::ArrayOperand {
                name,
                ty,
                index: Box::new(index),
            });
        }
        if self.starts_with(".") {
            let ty = self.parse_type()?;
            return Ok(Element::Operand(Operand { name, ty }));
        }

        // A bare name: `this` or a class reference.
        let ty = if name == "this" {
            OllirType::Object(self.class_name.to_owned())
        } else {
            OllirType::Object(name.clone())
        };
        Ok(Element::Operand(Operand { name, ty }))
    }

    fn operator(&mut self) -> Result<BinOp, ParseError> {
        self.skip_ws();
        let start = self.pos;
        while self.src[self.pos..]
            .starts_with(|c: char| matches!(c, '+' | '-' | '*' | '/' | '<' | '>' | '=' | '&' | '|' | '!'))
        {
            self.pos += 1;
        }
        let text = &self.src[start..self.pos];
        BinOp::from_str(text)
            .ok_or_else(|| self.error(format!("unknown operator `{text}`")))
    }

    fn parse_statement(&mut self) -> Result<Instruction, ParseError> {
        if self.eat_keyword("ret") {
            let return_type = self.parse_type()?;
            self.skip_ws();
            let operand = if self.pos == self.src.len() {
                None
            } else {
                Some(self.parse_element()?)
            };
            return Ok(Instruction::Return {
                return_type,
                operand,
            });
        }
        if self.eat_keyword("goto") {
            let label = self.ident()?;
            return Ok(Instruction::Goto { label });
        }
        if self.eat_keyword("if") {
            self.expect('(')?;
            let condition = self.parse_condition()?;
            self.expect(')')?;
            self.expect_str("goto")?;
            let label = self.ident()?;
            return Ok(Instruction::CondBranch {
                condition: Box::new(condition),
                label,
            });
        }
        if self.starts_with("putfield(") {
            self.expect_str("putfield")?;
            self.expect('(')?;
            let object = self.parse_operand()?;
            self.expect(',')?;
            let field = self.parse_operand()?;
            self.expect(',')?;
            let value = self.parse_element()?;
            self.expect(')')?;
            self.parse_type()?;
            return Ok(Instruction::PutField {
                object,
                field,
                value,
            });
        }
        if self.starts_with("invokestatic(")
            || self.starts_with("invokespecial(")
            || self.starts_with("invokevirtual(")
        {
            return self.parse_invoke();
        }

        // Assignment.
        let dest = self.parse_element()?;
        self.expect_str(":=")?;
        self.parse_type()?;
        let rhs = self.parse_rhs()?;
        Ok(Instruction::Assign {
            dest,
            rhs: Box::new(rhs),
        })
    }

    fn parse_operand(&mut self) -> Result<Operand, ParseError> {
        match self.parse_element()? {
            Element::Operand(op) => Ok(op),
            other => Err(self.error(format!("expected an operand, got {other:?}"))),
        }
    }

    fn parse_rhs(&mut self) -> Result<Instruction, ParseError> {
        if self.starts_with("getfield(") {
            self.expect_str("getfield")?;
            self.expect('(')?;
            let object = self.parse_operand()?;
            self.expect(',')?;
            let field = self.parse_operand()?;
            self.expect(')')?;
            self.parse_type()?;
            return Ok(Instruction::GetField { object, field });
        }
        if self.starts_with("invokestatic(")
            || self.starts_with("invokespecial(")
            || self.starts_with("invokevirtual(")
        {
            return self.parse_invoke();
        }
        if self.starts_with("new(") {
            self.expect_str("new")?;
            self.expect('(')?;
            if self.eat_keyword("array") {
                self.expect(',')?;
                let size = self.parse_element()?;
                self.expect(')')?;
                let return_type = self.parse_type()?;
                return Ok(Instruction::Call {
                    kind: InvokeKind::New,
                    caller: Element::Operand(Operand::new("array", return_type.clone())),
                    method: None,
                    args: vec![size],
                    return_type,
                });
            }
            let class = self.ident()?;
            self.expect(')')?;
            let return_type = self.parse_type()?;
            return Ok(Instruction::Call {
                kind: InvokeKind::New,
                caller: Element::Operand(Operand::new(class.clone(), OllirType::Object(class))),
                method: None,
                args: Vec::new(),
                return_type,
            });
        }
        if self.starts_with("arraylength(") {
            self.expect_str("arraylength")?;
            self.expect('(')?;
            let caller = self.parse_element()?;
            self.expect(')')?;
            let return_type = self.parse_type()?;
            return Ok(Instruction::Call {
                kind: InvokeKind::ArrayLength,
                caller,
                method: None,
                args: Vec::new(),
                return_type,
            });
        }
        if self.starts_with("!.") {
            self.expect('!')?;
            self.parse_type()?;
            let operand = self.parse_element()?;
            return Ok(Instruction::UnaryOp {
                op: UnOp::Not,
                operand,
            });
        }

        let left = self.parse_element()?;
        self.skip_ws();
        if self.pos == self.src.len() {
            return Ok(Instruction::SingleOp { operand: left });
        }
        let op = self.operator()?;
        self.parse_type()?;
        let right = self.parse_element()?;
        Ok(Instruction::BinaryOp { left, op, right })
    }

    fn parse_condition(&mut self) -> Result<Instruction, ParseError> {
        if self.starts_with("!.") {
            self.expect('!')?;
            self.parse_type()?;
            let operand = self.parse_element()?;
            return Ok(Instruction::UnaryOp {
                op: UnOp::Not,
                operand,
            });
        }
        let left = self.parse_element()?;
        if self.peek() == Some(')') {
            return Ok(Instruction::SingleOp { operand: left });
        }
        let op = self.operator()?;
        self.parse_type()?;
        let right = self.parse_element()?;
        Ok(Instruction::BinaryOp { left, op, right })
    }

    fn parse_invoke(&mut self) -> Result<Instruction, ParseError> {
        let kind = if self.eat_str("invokestatic") {
            InvokeKind::Static
        } else if self.eat_str("invokespecial") {
            InvokeKind::Special
        } else if self.eat_str("invokevirtual") {
            InvokeKind::Virtual
        } else {
            return Err(self.error("expected an invocation"));
        };

        self.expect('(')?;
        let caller = self.parse_element()?;
        self.expect(',')?;
        self.skip_ws();
        self.expect('"')?;
        let start = self.pos;
        while !self.src[self.pos..].starts_with('"') {
            if self.pos >= self.src.len() {
                return Err(self.error("unterminated method name"));
            }
            self.pos += 1;
        }
        let method = self.src[start..self.pos].to_owned();
        self.pos += 1;

        let mut args = Vec::new();
        while self.eat(',') {
            args.push(self.parse_element()?);
        }
        self.expect(')')?;
        let return_type = self.parse_type()?;

        Ok(Instruction::Call {
            kind,
            caller,
            method: Some(method),
            args,
            return_type,
        })
    }
}
