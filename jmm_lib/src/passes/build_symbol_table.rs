use crate::structures::ast::{Program, VarDeclNode};
use crate::structures::symbol_table::{MethodEntry, SymbolTable};
use crate::structures::types::{Symbol, Type};

/// Extracts the symbol table from a parsed program.
///
/// Duplicate names are diagnosed by the analysis passes; the table itself
/// keeps every declaration in source order and lookups resolve to the first
/// occurrence.
pub fn build(program: &Program) -> SymbolTable {
    let class = &program.class;

    let imports = program.imports.iter().map(|i| i.dotted()).collect();
    let fields = class.fields.iter().map(field_symbol).collect();

    let methods = class
        .methods
        .iter()
        .map(|method| MethodEntry {
            name: method.name.data.clone(),
            return_type: Type::from_ast_type(&method.return_type.data),
            params: method
                .params
                .iter()
                .map(|param| {
                    Symbol::new(Type::from_ast_type(&param.ty.data), param.name.data.clone())
                })
                .collect(),
            locals: method.locals.iter().map(field_symbol).collect(),
            is_static: method.is_static,
            has_varargs: method
                .params
                .last()
                .is_some_and(|param| param.ty.data.is_varargs),
        })
        .collect();

    SymbolTable::new(
        class.name.data.clone(),
        class.extends.as_ref().map(|e| e.data.clone()),
        imports,
        fields,
        methods,
    )
}

fn field_symbol(decl: &VarDeclNode) -> Symbol {
    Symbol::new(Type::from_ast_type(&decl.ty.data), decl.name.data.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::parse;
    use crate::structures::types::TypeName;

    fn table_for(source: &str) -> SymbolTable {
        let program = parse::parse(source).into_value().expect("parse failed");
        build(&program)
    }

    #[test]
    fn extracts_class_facts() {
        let table = table_for(
            "import a.b.io; class A extends B { int q; boolean p; \
             public int add(int a, int b) { int tmp; return a + b; } }",
        );
        assert_eq!(table.class_name(), "A");
        assert_eq!(table.super_class(), Some("B"));
        assert_eq!(table.imports(), ["a.b.io".to_owned()]);
        assert!(table.has_import("io"));
        assert!(!table.has_import("b"));

        assert_eq!(table.fields().len(), 2);
        assert_eq!(table.fields()[0].name, "q");

        assert_eq!(table.return_type_of("add"), Some(&Type::INT));
        let params = table.params_of("add");
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].name, "a");
        assert_eq!(table.locals_of("add").len(), 1);
    }

    #[test]
    fn varargs_parameters_are_arrays() {
        let table = table_for("class A { public int sum(int... xs) { return xs[0]; } }");
        let method = table.method("sum").unwrap();
        assert!(method.has_varargs);
        assert_eq!(method.params[0].ty, Type::INT_ARRAY);
    }

    #[test]
    fn resolves_shadowing_for_emission() {
        let table = table_for(
            "class A { int x; int y; public int f(int x) { return x + y; } }",
        );
        assert!(!table.is_field_unshadowed("f", "x"));
        assert!(table.is_field_unshadowed("f", "y"));
        assert_eq!(table.var_type("f", "y").map(|t| &t.name), Some(&TypeName::Int));
    }
}
