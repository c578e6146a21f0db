use std::fmt;

/// The base name of a semantic type, without the array dimension.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeName {
    Int,
    Boolean,
    Void,
    /// Synthetic top type for values coming from imported code.
    Any,
    String,
    Class(String),
}

impl TypeName {
    pub fn as_str(&self) -> &str {
        match self {
            TypeName::Int => "int",
            TypeName::Boolean => "boolean",
            TypeName::Void => "void",
            TypeName::Any => "any",
            TypeName::String => "String",
            TypeName::Class(name) => name,
        }
    }

    pub fn from_name(name: &str) -> TypeName {
        match name {
            "int" => TypeName::Int,
            "boolean" => TypeName::Boolean,
            "void" => TypeName::Void,
            "any" => TypeName::Any,
            "String" => TypeName::String,
            other => TypeName::Class(other.to_owned()),
        }
    }
}

/// A semantic type. `void` never combines with `is_array`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Type {
    pub name: TypeName,
    pub is_array: bool,
}

impl Type {
    pub const INT: Type = Type {
        name: TypeName::Int,
        is_array: false,
    };
    pub const BOOLEAN: Type = Type {
        name: TypeName::Boolean,
        is_array: false,
    };
    pub const VOID: Type = Type {
        name: TypeName::Void,
        is_array: false,
    };
    pub const ANY: Type = Type {
        name: TypeName::Any,
        is_array: false,
    };
    pub const INT_ARRAY: Type = Type {
        name: TypeName::Int,
        is_array: true,
    };
    pub const STRING_ARRAY: Type = Type {
        name: TypeName::String,
        is_array: true,
    };

    pub fn class(name: impl Into<String>) -> Type {
        Type {
            name: TypeName::Class(name.into()),
            is_array: false,
        }
    }

    /// The semantic type of a declared [`AstType`]. Varargs parameters are
    /// array types from here on.
    pub fn from_ast_type(ty: &crate::structures::ast::AstType) -> Type {
        Type {
            name: TypeName::from_name(&ty.name),
            is_array: ty.is_array,
        }
    }

    pub fn is_any(&self) -> bool {
        self.name == TypeName::Any
    }

    pub fn is_void(&self) -> bool {
        !self.is_array && self.name == TypeName::Void
    }

    /// The type of a single element of this array type.
    pub fn element_type(&self) -> Type {
        Type {
            name: self.name.clone(),
            is_array: false,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name.as_str())?;
        if self.is_array {
            write!(f, "[]")?;
        }
        Ok(())
    }
}

/// A named value in some scope (field, parameter or local).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub ty: Type,
    pub name: String,
}

impl Symbol {
    pub fn new(ty: Type, name: impl Into<String>) -> Symbol {
        Symbol {
            ty,
            name: name.into(),
        }
    }
}
