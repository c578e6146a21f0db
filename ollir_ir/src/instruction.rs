use crate::types::OllirType;

/// A named value with its type.
#[derive(Debug, Clone, PartialEq)]
pub struct Operand {
    pub name: String,
    pub ty: OllirType,
}

impl Operand {
    pub fn new(name: impl Into<String>, ty: OllirType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// An instruction argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Literal { value: String, ty: OllirType },
    Operand(Operand),
    ArrayOperand {
        name: String,
        ty: OllirType,
        index: Box<Element>,
    },
}

impl Element {
    pub fn ty(&self) -> &OllirType {
        match self {
            Element::Literal { ty, .. } => ty,
            Element::Operand(op) => &op.ty,
            Element::ArrayOperand { ty, .. } => ty,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Element::Literal { .. } => None,
            Element::Operand(op) => Some(&op.name),
            Element::ArrayOperand { name, .. } => Some(name),
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Element::Literal { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
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

impl BinOp {
    pub fn from_str(op: &str) -> Option<BinOp> {
        let op = match op {
            "+" => BinOp::Add,
            "-" => BinOp::Sub,
            "*" => BinOp::Mul,
            "/" => BinOp::Div,
            "<" => BinOp::Lt,
            "<=" => BinOp::Le,
            ">" => BinOp::Gt,
            ">=" => BinOp::Ge,
            "==" => BinOp::Eq,
            "!=" => BinOp::Ne,
            "&&" => BinOp::And,
            "||" => BinOp::Or,
            _ => return None,
        };
        Some(op)
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge | BinOp::Eq | BinOp::Ne
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Not,
}

/// The dispatch form of a call-shaped instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvokeKind {
    Static,
    Special,
    Virtual,
    New,
    ArrayLength,
    Ldc,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Assign {
        dest: Element,
        rhs: Box<Instruction>,
    },
    BinaryOp {
        left: Element,
        op: BinOp,
        right: Element,
    },
    UnaryOp {
        op: UnOp,
        operand: Element,
    },
    SingleOp {
        operand: Element,
    },
    GetField {
        object: Operand,
        field: Operand,
    },
    PutField {
        object: Operand,
        field: Operand,
        value: Element,
    },
    Call {
        kind: InvokeKind,
        caller: Element,
        method: Option<String>,
        args: Vec<Element>,
        return_type: OllirType,
    },
    Return {
        return_type: OllirType,
        operand: Option<Element>,
    },
    CondBranch {
        condition: Box<Instruction>,
        label: String,
    },
    Goto {
        label: String,
    },
}
