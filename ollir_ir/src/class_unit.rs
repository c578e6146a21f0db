use std::collections::HashMap;

use crate::instruction::Instruction;
use crate::types::OllirType;

/// One parsed OLLIR compilation unit.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClassUnit {
    pub class_name: String,
    pub super_class: Option<String>,
    /// Dotted import paths in source order.
    pub imports: Vec<String>,
    pub fields: Vec<Field>,
    pub methods: Vec<Method>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: OllirType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: OllirType,
}

/// The JVM local-variable slot assigned to a name.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    pub reg: usize,
    pub ty: OllirType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub name: String,
    pub is_static: bool,
    /// The canonical `.construct` block.
    pub is_construct: bool,
    pub params: Vec<Param>,
    pub return_type: OllirType,
    pub instructions: Vec<Instruction>,
    /// Labels and the instruction index they precede.
    pub labels: Vec<(String, usize)>,
    /// Variable name to frame-slot mapping; rewritten by register
    /// allocation.
    pub var_table: HashMap<String, Descriptor>,
}

impl Method {
    pub fn labels_at(&self, index: usize) -> impl Iterator<Item = &str> {
        self.labels
            .iter()
            .filter(move |(_, i)| *i == index)
            .map(|(label, _)| label.as_str())
    }

    pub fn label_target(&self, label: &str) -> Option<usize> {
        self.labels
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, i)| *i)
    }

    /// The highest register in use, if any variable exists.
    pub fn max_register(&self) -> Option<usize> {
        self.var_table.values().map(|d| d.reg).max()
    }
}
