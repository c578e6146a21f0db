use crate::structures::ast::{Expr, ExprNode};
use crate::structures::symbol_table::SymbolTable;
use crate::structures::types::{Type, TypeName};

/// Derives semantic types for expressions and decides assignability.
pub struct TypeEngine<'t> {
    table: &'t SymbolTable,
}

impl<'t> TypeEngine<'t> {
    pub fn new(table: &'t SymbolTable) -> Self {
        Self { table }
    }

    /// The type of `expr` inside `method`.
    ///
    /// Returns `None` when an identifier doesn't resolve to anything known;
    /// the `UndeclaredVariable` pass turns that into a diagnostic before any
    /// caller needs to rely on the value.
    pub fn expr_type(&self, expr: &ExprNode, method: &str) -> Option<Type> {
        let ty = match &expr.data {
            Expr::IntLiteral(_) => Type::INT,
            Expr::BoolLiteral(_) => Type::BOOLEAN,
            Expr::ArrayAccess { .. } => Type::INT,
            Expr::ArrayLiteral(_) | Expr::NewIntArray(_) => Type::INT_ARRAY,
            Expr::New(class) => Type::class(class.data.clone()),
            Expr::This => Type::class(self.table.class_name()),
            Expr::Not(_) => Type::BOOLEAN,
            Expr::Paren(inner) => return self.expr_type(inner, method),
            Expr::VarRef(ident) => {
                if let Some(ty) = self.table.var_type(method, &ident.data) {
                    ty.clone()
                } else if self.table.has_import(&ident.data) {
                    Type::class(ident.data.clone())
                } else {
                    return None;
                }
            }
            Expr::Binary { op, .. } => {
                if op.data.is_arithmetic() {
                    Type::INT
                } else {
                    Type::BOOLEAN
                }
            }
            Expr::Call { method: name, .. } => match self.table.return_type_of(&name.data) {
                Some(ty) => ty.clone(),
                None => Type::ANY,
            },
            Expr::Member { object, path } => {
                if path.last().data == "length" {
                    Type::INT
                } else if path.len() == 1 && matches!(object.data, Expr::This) {
                    match self.table.field(&path.first().data) {
                        Some(field) => field.ty.clone(),
                        None => Type::ANY,
                    }
                } else {
                    // Reads through imported objects are opaque; the type
                    // checker rejects them before anything consumes this.
                    self.expr_type(object, method)?;
                    Type::ANY
                }
            }
        };
        Some(ty)
    }

    /// `true` iff a value of type `src` may be assigned to a slot of type
    /// `dst`: equal types, either side `any`, the declared class into its
    /// declared superclass, or two imported types.
    pub fn assignable(&self, src: &Type, dst: &Type) -> bool {
        if src.is_any() || dst.is_any() {
            return true;
        }
        if src == dst {
            return true;
        }

        if let (TypeName::Class(src_name), TypeName::Class(dst_name)) = (&src.name, &dst.name) {
            if src_name == self.table.class_name()
                && self.table.super_class() == Some(dst_name.as_str())
            {
                return true;
            }
            if self.table.has_import(src_name) && self.table.has_import(dst_name) {
                return true;
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::{build_symbol_table, parse};

    fn engine_fixture(source: &str) -> SymbolTable {
        let program = parse::parse(source).into_value().expect("parse failed");
        build_symbol_table::build(&program)
    }

    #[test]
    fn assignable_is_reflexive_and_any_absorbs() {
        let table = engine_fixture("import A; import B; class C extends A { }");
        let engine = TypeEngine::new(&table);

        for ty in [Type::INT, Type::BOOLEAN, Type::INT_ARRAY, Type::class("C")] {
            assert!(engine.assignable(&ty, &ty));
            assert!(engine.assignable(&Type::ANY, &ty));
            assert!(engine.assignable(&ty, &Type::ANY));
        }

        // declared class into its declared superclass
        assert!(engine.assignable(&Type::class("C"), &Type::class("A")));
        assert!(!engine.assignable(&Type::class("A"), &Type::class("C")));

        // two imported types
        assert!(engine.assignable(&Type::class("A"), &Type::class("B")));

        assert!(!engine.assignable(&Type::INT, &Type::BOOLEAN));
        assert!(!engine.assignable(&Type::INT, &Type::INT_ARRAY));
    }
}
