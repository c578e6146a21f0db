use super::types::{Symbol, Type};

/// Everything the rest of the compiler needs to know about one declared
/// method.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodEntry {
    pub name: String,
    pub return_type: Type,
    pub params: Vec<Symbol>,
    pub locals: Vec<Symbol>,
    pub is_static: bool,
    /// `true` when the last parameter was declared `int...`.
    pub has_varargs: bool,
}

/// Indexed facts extracted once from a validated program.
///
/// All sequences preserve source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SymbolTable {
    class_name: String,
    super_class: Option<String>,
    imports: Vec<String>,
    fields: Vec<Symbol>,
    methods: Vec<MethodEntry>,
}

impl SymbolTable {
    pub fn new(
        class_name: String,
        super_class: Option<String>,
        imports: Vec<String>,
        fields: Vec<Symbol>,
        methods: Vec<MethodEntry>,
    ) -> Self {
        Self {
            class_name,
            super_class,
            imports,
            fields,
            methods,
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn super_class(&self) -> Option<&str> {
        self.super_class.as_deref()
    }

    /// The dotted import paths, in source order.
    pub fn imports(&self) -> &[String] {
        &self.imports
    }

    pub fn fields(&self) -> &[Symbol] {
        &self.fields
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodEntry> {
        self.methods.iter()
    }

    pub fn method(&self, name: &str) -> Option<&MethodEntry> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.method(name).is_some()
    }

    pub fn return_type_of(&self, method: &str) -> Option<&Type> {
        self.method(method).map(|m| &m.return_type)
    }

    pub fn params_of(&self, method: &str) -> &[Symbol] {
        self.method(method).map(|m| m.params.as_slice()).unwrap_or(&[])
    }

    pub fn locals_of(&self, method: &str) -> &[Symbol] {
        self.method(method).map(|m| m.locals.as_slice()).unwrap_or(&[])
    }

    pub fn field(&self, name: &str) -> Option<&Symbol> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// `true` if some import makes `name` visible as a simple name.
    pub fn has_import(&self, name: &str) -> bool {
        self.imports
            .iter()
            .any(|import| import.rsplit('.').next() == Some(name))
    }

    /// Resolves `name` inside `method`, searching fields, then parameters,
    /// then locals.
    pub fn var_type(&self, method: &str, name: &str) -> Option<&Type> {
        if let Some(field) = self.field(name) {
            return Some(&field.ty);
        }
        self.params_of(method)
            .iter()
            .chain(self.locals_of(method))
            .find(|s| s.name == name)
            .map(|s| &s.ty)
    }

    /// `true` if `name` names a field that is not shadowed by a parameter or
    /// local of `method`.
    pub fn is_field_unshadowed(&self, method: &str, name: &str) -> bool {
        if self
            .params_of(method)
            .iter()
            .chain(self.locals_of(method))
            .any(|s| s.name == name)
        {
            return false;
        }
        self.field(name).is_some()
    }
}
