pub mod build_symbol_table;
pub mod const_fold;
pub mod lower_varargs;
pub mod parse;
