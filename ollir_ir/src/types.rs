use std::fmt;

/// A type as it appears in OLLIR text suffixes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OllirType {
    Int32,
    Bool,
    Void,
    String,
    Array(Box<OllirType>),
    Object(String),
}

impl OllirType {
    pub fn int_array() -> OllirType {
        OllirType::Array(Box::new(OllirType::Int32))
    }

    /// `true` for values the JVM handles through `a*` instructions.
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            OllirType::String | OllirType::Array(_) | OllirType::Object(_)
        )
    }

    pub fn is_void(&self) -> bool {
        matches!(self, OllirType::Void)
    }

    pub fn element_type(&self) -> Option<&OllirType> {
        match self {
            OllirType::Array(inner) => Some(inner),
            _ => None,
        }
    }
}

impl fmt::Display for OllirType {
    /// The textual suffix, without the leading dot.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OllirType::Int32 => write!(f, "i32"),
            OllirType::Bool => write!(f, "bool"),
            OllirType::Void => write!(f, "V"),
            OllirType::String => write!(f, "String"),
            OllirType::Array(inner) => write!(f, "array.{inner}"),
            OllirType::Object(name) => write!(f, "{name}"),
        }
    }
}
