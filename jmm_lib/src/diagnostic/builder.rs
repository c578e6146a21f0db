use super::{Code, Diagnostic, Span, Stage};
use crate::structures::types::Type;

pub struct DiagnosticBuilder {
    span: Span,
    additional_spans: Vec<(Span, Option<String>)>,
}

/// The ways a `main` declaration can be malformed.
#[derive(Debug, Clone, Copy)]
pub enum MainViolation {
    NotStatic,
    NotVoid,
    Params,
}

impl DiagnosticBuilder {
    pub fn new(span: impl Into<Span>) -> Self {
        Self {
            span: span.into(),
            additional_spans: Vec::new(),
        }
    }

    pub fn with_additional_span(mut self, span: impl Into<Span>, message: Option<String>) -> Self {
        self.add_additional_span(span, message);
        self
    }

    pub fn add_additional_span(&mut self, span: impl Into<Span>, message: Option<String>) {
        self.additional_spans.push((span.into(), message));
    }

    fn build_custom(self, code: Code, stage: Stage, message: String) -> Diagnostic {
        Diagnostic {
            code,
            stage,
            message,
            main_span: (self.span, None),
            additional_spans: self.additional_spans,
        }
    }

    fn build_semantic(self, code: Code, message: String) -> Diagnostic {
        self.build_custom(code, Stage::Semantic, message)
    }

    pub fn build_syntax_error(self, unexpected: &str, expected: Vec<&str>) -> Diagnostic {
        let message = if expected.is_empty() {
            format!("unexpected token: {unexpected}")
        } else {
            let expected = expected.join(", ");
            format!("unexpected token: {unexpected}, expected one of: {expected}")
        };
        self.build_custom(Code::SyntaxError, Stage::Syntactic, message)
    }

    pub fn build_duplicated_import(mut self, name: &str, first_seen: Span) -> Diagnostic {
        self.add_additional_span(first_seen, Some("first imported here".to_owned()));
        self.build_semantic(Code::DuplicatedImport, format!("duplicated import `{name}`"))
    }

    pub fn build_duplicated_field(mut self, name: &str, first_seen: Span) -> Diagnostic {
        self.add_additional_span(first_seen, Some("first declared here".to_owned()));
        self.build_semantic(
            Code::DuplicatedField,
            format!("duplicated field name `{name}`"),
        )
    }

    pub fn build_duplicated_method(mut self, name: &str, first_seen: Span) -> Diagnostic {
        self.add_additional_span(first_seen, Some("first declared here".to_owned()));
        self.build_semantic(
            Code::DuplicatedMethod,
            format!("duplicated method name `{name}`"),
        )
    }

    pub fn build_duplicated_parameter(mut self, name: &str, method: &str, first_seen: Span) -> Diagnostic {
        self.add_additional_span(first_seen, Some("first declared here".to_owned()));
        self.build_semantic(
            Code::DuplicatedParameter,
            format!("duplicated parameter name `{name}` in method `{method}`"),
        )
    }

    pub fn build_duplicated_local(mut self, name: &str, method: &str, first_seen: Span) -> Diagnostic {
        self.add_additional_span(first_seen, Some("first declared here".to_owned()));
        self.build_semantic(
            Code::DuplicatedLocal,
            format!("duplicated local variable name `{name}` in method `{method}`"),
        )
    }

    pub fn build_this_in_static_method(self) -> Diagnostic {
        self.build_semantic(
            Code::ThisInStaticMethod,
            "cannot use `this` in a static method".to_owned(),
        )
    }

    pub fn build_field_in_static_method(self, name: &str) -> Diagnostic {
        self.build_semantic(
            Code::FieldInStaticMethod,
            format!("field `{name}` cannot be accessed from a static method"),
        )
    }

    pub fn build_invalid_main(self, violation: MainViolation) -> Diagnostic {
        let message = match violation {
            MainViolation::NotStatic => "`main` must be declared static",
            MainViolation::NotVoid => "`main` must return void",
            MainViolation::Params => "`main` must have a single parameter of type `String[]`",
        };
        self.build_semantic(Code::InvalidMainMethod, message.to_owned())
    }

    pub fn build_static_non_main(self, name: &str) -> Diagnostic {
        self.build_semantic(
            Code::StaticNonMainMethod,
            format!("method `{name}` is declared static but is not `main`"),
        )
    }

    pub fn build_return_in_void_method(self, name: &str) -> Diagnostic {
        self.build_semantic(
            Code::ReturnInVoidMethod,
            format!("method `{name}` is declared void but has a return statement"),
        )
    }

    pub fn build_multiple_returns(self, name: &str) -> Diagnostic {
        self.build_semantic(
            Code::MultipleReturns,
            format!("method `{name}` has more than one return statement"),
        )
    }

    pub fn build_missing_return(self, name: &str, return_type: &Type) -> Diagnostic {
        self.build_semantic(
            Code::MissingReturn,
            format!("method `{name}` is declared `{return_type}` but has no return statement"),
        )
    }

    pub fn build_return_not_last(self, name: &str) -> Diagnostic {
        self.build_semantic(
            Code::ReturnNotLast,
            format!("the return statement must be the last statement of method `{name}`"),
        )
    }

    pub fn build_undeclared_variable(self, name: &str) -> Diagnostic {
        self.build_semantic(
            Code::UndeclaredVariable,
            format!("identifier `{name}` isn't declared in this scope"),
        )
    }

    pub fn build_undefined_method(self, name: &str) -> Diagnostic {
        self.build_semantic(Code::UndefinedMethod, format!("method `{name}` is not defined"))
    }

    pub fn build_array_in_binary_expr(self) -> Diagnostic {
        self.build_semantic(
            Code::ArrayInBinaryExpr,
            "array types are not supported in binary expressions".to_owned(),
        )
    }

    pub fn build_incompatible_operands(
        self,
        op: &str,
        expected: &Type,
        left: &Type,
        right: &Type,
    ) -> Diagnostic {
        self.build_semantic(
            Code::IncompatibleOperands,
            format!(
                "binary operator `{op}` requires both operands to be `{expected}`, found `{left}` and `{right}`"
            ),
        )
    }

    pub fn build_incompatible_comparison(self, op: &str, left: &Type, right: &Type) -> Diagnostic {
        self.build_semantic(
            Code::IncompatibleOperands,
            format!(
                "binary operator `{op}` requires both operands to have the same type, found `{left}` and `{right}`"
            ),
        )
    }

    pub fn build_array_index_not_int(self, found: &Type) -> Diagnostic {
        self.build_semantic(
            Code::IncompatibleOperands,
            format!("array index must be an integer expression, found `{found}`"),
        )
    }

    pub fn build_incompatible_assign(self, from: &Type, to: &Type) -> Diagnostic {
        self.build_semantic(
            Code::IncompatibleAssign,
            format!("cannot assign a value of type `{from}` to a variable of type `{to}`"),
        )
    }

    pub fn build_array_assign_not_array(self, found: &Type) -> Diagnostic {
        self.build_semantic(
            Code::IncompatibleAssign,
            format!("array assignment needs an array variable, found `{found}`"),
        )
    }

    pub fn build_invalid_array_element(self, expected: &Type, found: &Type) -> Diagnostic {
        self.build_semantic(
            Code::InvalidArrayElement,
            format!("array elements must be of type `{expected}`, found `{found}`"),
        )
    }

    pub fn build_incompatible_condition(self, construct: &str, found: &Type) -> Diagnostic {
        self.build_semantic(
            Code::IncompatibleCondition,
            format!("{construct} condition must be a boolean expression, found `{found}`"),
        )
    }

    pub fn build_incompatible_return(self, found: &Type, declared: &Type) -> Diagnostic {
        self.build_semantic(
            Code::IncompatibleReturn,
            format!(
                "cannot return a value of type `{found}` from a method that returns `{declared}`"
            ),
        )
    }

    pub fn build_incompatible_argument(
        self,
        index: usize,
        method: &str,
        expected: &Type,
        found: &Type,
    ) -> Diagnostic {
        self.build_semantic(
            Code::IncompatibleArgument,
            format!(
                "argument {index} of method `{method}` must be of type `{expected}`, found `{found}`"
            ),
        )
    }

    pub fn build_wrong_argument_count(
        self,
        method: &str,
        expected: usize,
        found: usize,
    ) -> Diagnostic {
        self.build_semantic(
            Code::WrongArgumentCount,
            format!("method `{method}` expects {expected} arguments, but {found} were provided"),
        )
    }

    pub fn build_too_few_varargs_arguments(
        self,
        method: &str,
        at_least: usize,
        found: usize,
    ) -> Diagnostic {
        self.build_semantic(
            Code::WrongArgumentCount,
            format!(
                "method `{method}` expects at least {at_least} arguments, but {found} were provided"
            ),
        )
    }

    pub fn build_invalid_array_access(self, found: &Type) -> Diagnostic {
        self.build_semantic(
            Code::InvalidArrayAccess,
            format!("only arrays can be indexed, found `{found}`"),
        )
    }

    pub fn build_invalid_member_access(self, path: &str) -> Diagnostic {
        self.build_semantic(
            Code::InvalidMemberAccess,
            format!(
                "cannot read member `{path}`; only fields of `this` and array `length` can be read"
            ),
        )
    }

    pub fn build_varargs_field(self) -> Diagnostic {
        self.build_semantic(Code::VarargsField, "field type cannot be varargs".to_owned())
    }

    pub fn build_varargs_local(self) -> Diagnostic {
        self.build_semantic(
            Code::VarargsLocal,
            "local variable type cannot be varargs".to_owned(),
        )
    }

    pub fn build_varargs_return(self) -> Diagnostic {
        self.build_semantic(
            Code::VarargsReturn,
            "method return type cannot be varargs".to_owned(),
        )
    }

    pub fn build_varargs_not_last(self) -> Diagnostic {
        self.build_semantic(
            Code::VarargsNotLast,
            "the varargs parameter must be the last parameter".to_owned(),
        )
    }

    pub fn build_multiple_varargs(self) -> Diagnostic {
        self.build_semantic(
            Code::MultipleVarargs,
            "only one varargs parameter is allowed".to_owned(),
        )
    }

    pub fn build_not_enough_registers(self, needed: usize) -> Diagnostic {
        self.build_custom(
            Code::NotEnoughRegisters,
            Stage::Optimization,
            format!("Need at least {needed} registers."),
        )
    }

    pub fn build_internal_error(self, pass: &str, detail: impl std::fmt::Display) -> Diagnostic {
        self.build_custom(
            Code::InternalError,
            Stage::Generation,
            format!("internal error in {pass}: {detail}"),
        )
    }
}
