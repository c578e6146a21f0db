mod expr;
mod stmt;

pub use expr::*;
pub use stmt::*;

use crate::diagnostic::Span;
use vec1::Vec1;

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub imports: Vec<ImportNode>,
    pub class: ClassNode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportNode {
    pub span: Span,
    /// The segments of the dotted import path.
    pub path: Vec1<String>,
}

impl ImportNode {
    pub fn dotted(&self) -> String {
        self.path.join(".")
    }

    /// The simple name the import makes visible.
    pub fn last_segment(&self) -> &str {
        self.path.last()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassNode {
    pub span: Span,
    pub name: IdentNode,
    pub extends: Option<IdentNode>,
    pub fields: Vec<VarDeclNode>,
    pub methods: Vec<MethodNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDeclNode {
    pub span: Span,
    pub ty: TypeNode,
    pub name: IdentNode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeNode {
    pub span: Span,
    pub data: AstType,
}

/// A declared type as written in the source. Exactly one of the flag
/// combinations holds: plain, array, or varargs (which implies array).
#[derive(Debug, Clone, PartialEq)]
pub struct AstType {
    pub name: String,
    pub is_array: bool,
    pub is_varargs: bool,
}

impl AstType {
    pub fn plain(name: impl Into<String>) -> AstType {
        AstType {
            name: name.into(),
            is_array: false,
            is_varargs: false,
        }
    }

    pub fn array(name: impl Into<String>) -> AstType {
        AstType {
            name: name.into(),
            is_array: true,
            is_varargs: false,
        }
    }

    pub fn varargs(name: impl Into<String>) -> AstType {
        AstType {
            name: name.into(),
            is_array: true,
            is_varargs: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodNode {
    pub span: Span,
    /// Covers the signature up to the opening brace.
    pub prototype_span: Span,
    pub name: IdentNode,
    pub is_public: bool,
    pub is_static: bool,
    pub return_type: TypeNode,
    pub params: Vec<ParamNode>,
    pub locals: Vec<VarDeclNode>,
    pub body: Vec<StmtNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamNode {
    pub span: Span,
    pub ty: TypeNode,
    pub name: IdentNode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IdentNode {
    pub span: Span,
    pub data: String,
}
