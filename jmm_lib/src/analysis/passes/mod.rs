pub mod array_access;
pub mod duplicated_element;
pub mod field_in_static;
pub mod method_declarations;
pub mod this_in_static;
pub mod type_error;
pub mod undeclared_variable;
pub mod undefined_method;
pub mod varargs;
