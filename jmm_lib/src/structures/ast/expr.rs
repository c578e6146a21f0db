use super::IdentNode;
use crate::diagnostic::Span;
use vec1::Vec1;

#[derive(Debug, Clone, PartialEq)]
pub struct ExprNode {
    pub span: Span,
    pub data: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Binary {
        op: BinaryOpNode,
        left: Box<ExprNode>,
        right: Box<ExprNode>,
    },
    /// Logical negation, the only unary operator.
    Not(Box<ExprNode>),
    Paren(Box<ExprNode>),
    VarRef(IdentNode),
    Call {
        receiver: Box<ExprNode>,
        method: IdentNode,
        args: Vec<ExprNode>,
    },
    /// A chain of member reads without a call, e.g. `xs.length`.
    Member {
        object: Box<ExprNode>,
        path: Vec1<IdentNode>,
    },
    ArrayAccess {
        array: Box<ExprNode>,
        index: Box<ExprNode>,
    },
    /// `[e, ...]`
    ArrayLiteral(Vec<ExprNode>),
    /// `new C()`
    New(IdentNode),
    /// `new int[size]`
    NewIntArray(Box<ExprNode>),
    IntLiteral(i32),
    BoolLiteral(bool),
    This,
}

impl Expr {
    /// `true` for nodes that are usable as an OLLIR operand without any
    /// prelude computation.
    pub fn is_trivial_operand(&self) -> bool {
        matches!(
            self,
            Expr::IntLiteral(_) | Expr::BoolLiteral(_) | Expr::VarRef(_)
        )
    }
}

impl ExprNode {
    /// Calls `f` on this node and every nested expression, pre-order.
    pub fn for_each<'a>(&'a self, f: &mut impl FnMut(&'a ExprNode)) {
        f(self);
        match &self.data {
            Expr::Binary { left, right, .. } => {
                left.for_each(f);
                right.for_each(f);
            }
            Expr::Not(inner) | Expr::Paren(inner) => inner.for_each(f),
            Expr::Call { receiver, args, .. } => {
                receiver.for_each(f);
                for arg in args {
                    arg.for_each(f);
                }
            }
            Expr::Member { object, .. } => object.for_each(f),
            Expr::ArrayAccess { array, index } => {
                array.for_each(f);
                index.for_each(f);
            }
            Expr::ArrayLiteral(elems) => {
                for elem in elems {
                    elem.for_each(f);
                }
            }
            Expr::NewIntArray(size) => size.for_each(f),
            Expr::VarRef(_)
            | Expr::New(_)
            | Expr::IntLiteral(_)
            | Expr::BoolLiteral(_)
            | Expr::This => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryOpNode {
    pub span: Span,
    pub data: BinaryOp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div
        )
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge | BinaryOp::Eq | BinaryOp::Ne
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}
