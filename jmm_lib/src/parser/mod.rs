mod lexer;
mod token;

use lexer::Lexer;
use token::Token;

use crate::diagnostic::{AggregateResult, Diagnostic, DiagnosticBuilder, Span};
use crate::structures::ast::*;
use vec1::vec1;

/// Parses a Jmm source text into a [`Program`].
///
/// Syntax errors put the result in an _err_ state; the parser recovers to the
/// next statement or member boundary so that several errors can be reported
/// in one run.
pub fn parse(source: &str) -> AggregateResult<Program> {
    Parser::new(source).parse_program()
}

struct Parser<'s> {
    lexer: Lexer<'s>,
    cur: (Token, Span),
    peek: (Token, Span),
    last_end: usize,
    diagnostics: Vec<Diagnostic>,
}

impl<'s> Parser<'s> {
    fn new(source: &'s str) -> Self {
        let mut lexer = Lexer::new(source);
        let cur = lexer.next_token();
        let peek = lexer.next_token();
        Self {
            lexer,
            cur,
            peek,
            last_end: 0,
            diagnostics: Vec::new(),
        }
    }

    fn bump(&mut self) -> (Token, Span) {
        let next = self.lexer.next_token();
        let cur = std::mem::replace(&mut self.cur, std::mem::replace(&mut self.peek, next));
        self.last_end = cur.1.excl_end();
        cur
    }

    fn at(&self, token: &Token) -> bool {
        &self.cur.0 == token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.at(token) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn span_from(&self, start: usize) -> Span {
        (start..self.last_end.max(start)).into()
    }

    fn error(&mut self, expected: Vec<&str>) {
        let diagnostic = DiagnosticBuilder::new(self.cur.1)
            .build_syntax_error(&self.cur.0.to_string(), expected);
        self.diagnostics.push(diagnostic);
    }

    fn expect(&mut self, token: Token, expected: &str) -> Option<Span> {
        if self.at(&token) {
            Some(self.bump().1)
        } else {
            self.error(vec![expected]);
            None
        }
    }

    fn expect_ident(&mut self) -> Option<IdentNode> {
        match &self.cur.0 {
            Token::Ident(_) => {
                let (token, span) = self.bump();
                let Token::Ident(data) = token else {
                    unreachable!()
                };
                Some(IdentNode { span, data })
            }
            _ => {
                self.error(vec!["an identifier"]);
                None
            }
        }
    }

    /// Skips to just past the next `;`, or to a closing brace, whichever
    /// comes first.
    fn recover(&mut self) {
        loop {
            match &self.cur.0 {
                Token::Semicolon => {
                    self.bump();
                    return;
                }
                Token::RBrace | Token::Eof => return,
                _ => {
                    self.bump();
                }
            }
        }
    }

    fn finish<T>(self, value: Option<T>) -> AggregateResult<T> {
        if self.diagnostics.is_empty() {
            if let Some(value) = value {
                return AggregateResult::new_ok(value);
            }
        }
        let mut iter = self.diagnostics.into_iter();
        let first = iter.next().unwrap_or_else(|| {
            DiagnosticBuilder::new(Span::default()).build_syntax_error("end of input", Vec::new())
        });
        let mut res = AggregateResult::new_err(first);
        for diagnostic in iter {
            res.add_err(diagnostic);
        }
        res
    }

    fn parse_program(mut self) -> AggregateResult<Program> {
        let mut imports = Vec::new();
        while self.at(&Token::Import) {
            match self.parse_import() {
                Some(import) => imports.push(import),
                None => self.recover(),
            }
        }

        let class = self.parse_class();

        if class.is_some() && !self.cur.0.is_eof() {
            self.error(vec!["end of input"]);
        }

        let value = class.map(|class| Program { imports, class });
        self.finish(value)
    }

    fn parse_import(&mut self) -> Option<ImportNode> {
        let start = self.cur.1.start();
        self.expect(Token::Import, "`import`")?;
        let first = self.expect_ident()?;
        let mut path = vec1![first.data];
        while self.eat(&Token::Dot) {
            path.push(self.expect_ident()?.data);
        }
        self.expect(Token::Semicolon, "`;`")?;
        Some(ImportNode {
            span: self.span_from(start),
            path,
        })
    }

    fn parse_class(&mut self) -> Option<ClassNode> {
        let start = self.cur.1.start();
        self.expect(Token::Class, "`class`")?;
        let name = self.expect_ident()?;
        let extends = if self.eat(&Token::Extends) {
            Some(self.expect_ident()?)
        } else {
            None
        };
        self.expect(Token::LBrace, "`{`")?;

        let mut fields = Vec::new();
        let mut methods = Vec::new();
        while !self.at(&Token::RBrace) && !self.cur.0.is_eof() {
            if self.parse_member(&mut fields, &mut methods).is_none() {
                self.recover();
            }
        }
        self.expect(Token::RBrace, "`}`")?;

        Some(ClassNode {
            span: self.span_from(start),
            name,
            extends,
            fields,
            methods,
        })
    }

    fn parse_member(
        &mut self,
        fields: &mut Vec<VarDeclNode>,
        methods: &mut Vec<MethodNode>,
    ) -> Option<()> {
        let start = self.cur.1.start();
        let is_public = self.eat(&Token::Public);
        let is_static = self.eat(&Token::Static);
        let ty = self.parse_type(false)?;
        let name = self.expect_ident()?;

        if self.at(&Token::LParen) {
            let method = self.parse_method(start, is_public, is_static, ty, name)?;
            methods.push(method);
        } else {
            self.expect(Token::Semicolon, "`;`")?;
            fields.push(VarDeclNode {
                span: self.span_from(start),
                ty,
                name,
            });
        }
        Some(())
    }

    fn parse_type(&mut self, allow_varargs: bool) -> Option<TypeNode> {
        let start = self.cur.1.start();
        let name = match &self.cur.0 {
            Token::Int => {
                self.bump();
                "int".to_owned()
            }
            Token::Boolean => {
                self.bump();
                "boolean".to_owned()
            }
            Token::Void => {
                self.bump();
                "void".to_owned()
            }
            Token::Ident(_) => self.expect_ident()?.data,
            _ => {
                self.error(vec!["a type"]);
                return None;
            }
        };

        let data = if allow_varargs && self.eat(&Token::Ellipsis) {
            AstType::varargs(name)
        } else if self.at(&Token::LBracket) && self.peek.0 == Token::RBracket {
            self.bump();
            self.bump();
            AstType::array(name)
        } else {
            AstType::plain(name)
        };

        Some(TypeNode {
            span: self.span_from(start),
            data,
        })
    }

    fn parse_method(
        &mut self,
        start: usize,
        is_public: bool,
        is_static: bool,
        return_type: TypeNode,
        name: IdentNode,
    ) -> Option<MethodNode> {
        self.expect(Token::LParen, "`(`")?;
        let mut params = Vec::new();
        if !self.at(&Token::RParen) {
            loop {
                params.push(self.parse_param()?);
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(Token::RParen, "`)`")?;
        let prototype_span = self.span_from(start);

        self.expect(Token::LBrace, "`{`")?;

        let mut locals = Vec::new();
        while self.starts_var_decl() {
            match self.parse_var_decl() {
                Some(local) => locals.push(local),
                None => self.recover(),
            }
        }

        let mut body = Vec::new();
        while !self.at(&Token::RBrace) && !self.cur.0.is_eof() {
            match self.parse_stmt() {
                Some(stmt) => body.push(stmt),
                None => self.recover(),
            }
        }
        self.expect(Token::RBrace, "`}`")?;

        Some(MethodNode {
            span: self.span_from(start),
            prototype_span,
            name,
            is_public,
            is_static,
            return_type,
            params,
            locals,
            body,
        })
    }

    fn parse_param(&mut self) -> Option<ParamNode> {
        let start = self.cur.1.start();
        let ty = self.parse_type(true)?;
        let name = self.expect_ident()?;
        Some(ParamNode {
            span: self.span_from(start),
            ty,
            name,
        })
    }

    fn starts_var_decl(&self) -> bool {
        match &self.cur.0 {
            Token::Int | Token::Boolean => true,
            Token::Ident(_) => matches!(self.peek.0, Token::Ident(_)),
            _ => false,
        }
    }

    fn parse_var_decl(&mut self) -> Option<VarDeclNode> {
        let start = self.cur.1.start();
        let ty = self.parse_type(false)?;
        let name = self.expect_ident()?;
        self.expect(Token::Semicolon, "`;`")?;
        Some(VarDeclNode {
            span: self.span_from(start),
            ty,
            name,
        })
    }

    fn parse_stmt(&mut self) -> Option<StmtNode> {
        let start = self.cur.1.start();
        let data = match &self.cur.0 {
            Token::LBrace => {
                self.bump();
                let mut stmts = Vec::new();
                while !self.at(&Token::RBrace) && !self.cur.0.is_eof() {
                    match self.parse_stmt() {
                        Some(stmt) => stmts.push(stmt),
                        None => self.recover(),
                    }
                }
                self.expect(Token::RBrace, "`}`")?;
                Stmt::Scope(stmts)
            }
            Token::If => {
                self.bump();
                self.expect(Token::LParen, "`(`")?;
                let cond = self.parse_expr()?;
                self.expect(Token::RParen, "`)`")?;
                let then_body = Box::new(self.parse_stmt()?);
                self.expect(Token::Else, "`else`")?;
                let else_body = Box::new(self.parse_stmt()?);
                Stmt::If {
                    cond,
                    then_body,
                    else_body,
                }
            }
            Token::While => {
                self.bump();
                self.expect(Token::LParen, "`(`")?;
                let cond = self.parse_expr()?;
                self.expect(Token::RParen, "`)`")?;
                let body = Box::new(self.parse_stmt()?);
                Stmt::While { cond, body }
            }
            Token::Return => {
                self.bump();
                let expr = self.parse_expr()?;
                self.expect(Token::Semicolon, "`;`")?;
                Stmt::Return(expr)
            }
            Token::Ident(_) if self.peek.0 == Token::Assign => {
                let target = self.expect_ident()?;
                self.bump();
                let rhs = self.parse_expr()?;
                self.expect(Token::Semicolon, "`;`")?;
                Stmt::Assign { target, rhs }
            }
            _ => {
                let expr = self.parse_expr()?;
                if self.at(&Token::Assign) {
                    // `a[i] = e;` parses as an expression up to the `=`.
                    let Expr::ArrayAccess { array, index } = expr.data else {
                        self.error(vec!["`;`"]);
                        return None;
                    };
                    let Expr::VarRef(target) = array.data else {
                        self.error(vec!["`;`"]);
                        return None;
                    };
                    self.bump();
                    let rhs = self.parse_expr()?;
                    self.expect(Token::Semicolon, "`;`")?;
                    Stmt::ArrayAssign {
                        target,
                        index: *index,
                        rhs,
                    }
                } else {
                    self.expect(Token::Semicolon, "`;`")?;
                    Stmt::Expr(expr)
                }
            }
        };

        Some(StmtNode {
            span: self.span_from(start),
            data,
        })
    }

    fn parse_expr(&mut self) -> Option<ExprNode> {
        self.parse_or()
    }

    fn binary(
        &mut self,
        op: BinaryOp,
        op_span: Span,
        left: ExprNode,
        right: ExprNode,
    ) -> ExprNode {
        ExprNode {
            span: left.span.merge(right.span),
            data: Expr::Binary {
                op: BinaryOpNode {
                    span: op_span,
                    data: op,
                },
                left: Box::new(left),
                right: Box::new(right),
            },
        }
    }

    fn parse_or(&mut self) -> Option<ExprNode> {
        let mut left = self.parse_and()?;
        while self.at(&Token::OrOr) {
            let op_span = self.bump().1;
            let right = self.parse_and()?;
            left = self.binary(BinaryOp::Or, op_span, left, right);
        }
        Some(left)
    }

    fn parse_and(&mut self) -> Option<ExprNode> {
        let mut left = self.parse_comparison()?;
        while self.at(&Token::AndAnd) {
            let op_span = self.bump().1;
            let right = self.parse_comparison()?;
            left = self.binary(BinaryOp::And, op_span, left, right);
        }
        Some(left)
    }

    fn parse_comparison(&mut self) -> Option<ExprNode> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match &self.cur.0 {
                Token::Lt => BinaryOp::Lt,
                Token::Le => BinaryOp::Le,
                Token::Gt => BinaryOp::Gt,
                Token::Ge => BinaryOp::Ge,
                Token::EqEq => BinaryOp::Eq,
                Token::NotEq => BinaryOp::Ne,
                _ => break,
            };
            let op_span = self.bump().1;
            let right = self.parse_additive()?;
            left = self.binary(op, op_span, left, right);
        }
        Some(left)
    }

    fn parse_additive(&mut self) -> Option<ExprNode> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match &self.cur.0 {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => break,
            };
            let op_span = self.bump().1;
            let right = self.parse_multiplicative()?;
            left = self.binary(op, op_span, left, right);
        }
        Some(left)
    }

    fn parse_multiplicative(&mut self) -> Option<ExprNode> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match &self.cur.0 {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                _ => break,
            };
            let op_span = self.bump().1;
            let right = self.parse_unary()?;
            left = self.binary(op, op_span, left, right);
        }
        Some(left)
    }

    fn parse_unary(&mut self) -> Option<ExprNode> {
        if self.at(&Token::Not) {
            let start = self.bump().1.start();
            let inner = self.parse_unary()?;
            return Some(ExprNode {
                span: self.span_from(start),
                data: Expr::Not(Box::new(inner)),
            });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Option<ExprNode> {
        let mut expr = self.parse_primary()?;
        loop {
            match &self.cur.0 {
                Token::LBracket => {
                    self.bump();
                    let index = self.parse_expr()?;
                    self.expect(Token::RBracket, "`]`")?;
                    expr = ExprNode {
                        span: self.span_from(expr.span.start()),
                        data: Expr::ArrayAccess {
                            array: Box::new(expr),
                            index: Box::new(index),
                        },
                    };
                }
                Token::Dot => {
                    self.bump();
                    let member = self.expect_ident()?;
                    if self.at(&Token::LParen) {
                        self.bump();
                        let mut args = Vec::new();
                        if !self.at(&Token::RParen) {
                            loop {
                                args.push(self.parse_expr()?);
                                if !self.eat(&Token::Comma) {
                                    break;
                                }
                            }
                        }
                        self.expect(Token::RParen, "`)`")?;
                        expr = ExprNode {
                            span: self.span_from(expr.span.start()),
                            data: Expr::Call {
                                receiver: Box::new(expr),
                                method: member,
                                args,
                            },
                        };
                    } else {
                        let span = self.span_from(expr.span.start());
                        expr = match expr.data {
                            Expr::Member { object, mut path } => {
                                path.push(member);
                                ExprNode {
                                    span,
                                    data: Expr::Member { object, path },
                                }
                            }
                            _ => ExprNode {
                                span,
                                data: Expr::Member {
                                    object: Box::new(expr),
                                    path: vec1![member],
                                },
                            },
                        };
                    }
                }
                _ => break,
            }
        }
        Some(expr)
    }

    fn parse_primary(&mut self) -> Option<ExprNode> {
        let start = self.cur.1.start();
        let data = match &self.cur.0 {
            Token::LParen => {
                self.bump();
                let inner = self.parse_expr()?;
                self.expect(Token::RParen, "`)`")?;
                Expr::Paren(Box::new(inner))
            }
            Token::LBracket => {
                self.bump();
                let mut elems = Vec::new();
                if !self.at(&Token::RBracket) {
                    loop {
                        elems.push(self.parse_expr()?);
                        if !self.eat(&Token::Comma) {
                            break;
                        }
                    }
                }
                self.expect(Token::RBracket, "`]`")?;
                Expr::ArrayLiteral(elems)
            }
            Token::IntLit(_) => {
                let (token, span) = self.bump();
                let Token::IntLit(raw) = token else {
                    unreachable!()
                };
                match raw.parse::<i32>() {
                    Ok(value) => Expr::IntLiteral(value),
                    Err(_) => {
                        let diagnostic = DiagnosticBuilder::new(span)
                            .build_syntax_error(&format!("integer `{raw}`"), vec!["a 32-bit integer"]);
                        self.diagnostics.push(diagnostic);
                        return None;
                    }
                }
            }
            Token::True => {
                self.bump();
                Expr::BoolLiteral(true)
            }
            Token::False => {
                self.bump();
                Expr::BoolLiteral(false)
            }
            Token::This => {
                self.bump();
                Expr::This
            }
            Token::New => {
                self.bump();
                if self.at(&Token::Int) {
                    self.bump();
                    self.expect(Token::LBracket, "`[`")?;
                    let size = self.parse_expr()?;
                    self.expect(Token::RBracket, "`]`")?;
                    Expr::NewIntArray(Box::new(size))
                } else {
                    let class = self.expect_ident()?;
                    self.expect(Token::LParen, "`(`")?;
                    self.expect(Token::RParen, "`)`")?;
                    Expr::New(class)
                }
            }
            Token::Ident(_) => Expr::VarRef(self.expect_ident()?),
            _ => {
                self.error(vec!["an expression"]);
                return None;
            }
        };

        Some(ExprNode {
            span: self.span_from(start),
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> Program {
        let res = parse(source);
        assert!(res.is_ok(), "diagnostics: {:?}", res.diagnostics().collect::<Vec<_>>());
        res.into_value().unwrap()
    }

    #[test]
    fn parses_imports_and_class_header() {
        let program = parse_ok("import a.b.io; class A extends B {}");
        assert_eq!(program.imports.len(), 1);
        assert_eq!(program.imports[0].dotted(), "a.b.io");
        assert_eq!(program.imports[0].last_segment(), "io");
        assert_eq!(program.class.name.data, "A");
        assert_eq!(program.class.extends.as_ref().unwrap().data, "B");
    }

    #[test]
    fn parses_fields_and_methods() {
        let program = parse_ok(
            "class A { int q; public int add(int a, int b) { return a + b; } }",
        );
        assert_eq!(program.class.fields.len(), 1);
        assert_eq!(program.class.methods.len(), 1);
        let method = &program.class.methods[0];
        assert!(method.is_public);
        assert!(!method.is_static);
        assert_eq!(method.params.len(), 2);
        assert!(matches!(method.body[0].data, Stmt::Return(_)));
    }

    #[test]
    fn parses_varargs_parameter() {
        let program = parse_ok("class A { public int sum(int... xs) { return xs[0]; } }");
        let param = &program.class.methods[0].params[0];
        assert!(param.ty.data.is_varargs);
        assert!(param.ty.data.is_array);
    }

    #[test]
    fn parses_main_method() {
        let program = parse_ok("class A { public static void main(String[] args) { } }");
        let method = &program.class.methods[0];
        assert!(method.is_static);
        assert_eq!(method.params[0].ty.data.name, "String");
        assert!(method.params[0].ty.data.is_array);
    }

    #[test]
    fn parses_precedence() {
        let program = parse_ok("class A { public boolean p() { return 1 + 2 * 3 < 4 && true; } }");
        let Stmt::Return(expr) = &program.class.methods[0].body[0].data else {
            panic!("expected return");
        };
        let Expr::Binary { op, left, .. } = &expr.data else {
            panic!("expected binary");
        };
        assert_eq!(op.data, BinaryOp::And);
        let Expr::Binary { op, .. } = &left.data else {
            panic!("expected comparison on the left");
        };
        assert_eq!(op.data, BinaryOp::Lt);
    }

    #[test]
    fn parses_array_assignment_and_member_access() {
        let program = parse_ok(
            "class A { public int f(int[] xs) { xs[0] = 1; return xs.length; } }",
        );
        let body = &program.class.methods[0].body;
        assert!(matches!(body[0].data, Stmt::ArrayAssign { .. }));
        let Stmt::Return(expr) = &body[1].data else {
            panic!("expected return");
        };
        assert!(matches!(expr.data, Expr::Member { .. }));
    }

    #[test]
    fn reports_syntax_errors() {
        let res = parse("class A { public int f( { return 1; } }");
        assert!(res.is_err());
    }

    #[test]
    fn recovers_and_reports_multiple_errors() {
        let res = parse("class A { public int f() { x = ; y = ; return 1; } }");
        assert!(res.is_err());
        assert!(res.diagnostics().count() >= 2);
    }
}
