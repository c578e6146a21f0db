pub mod jasmin;
pub mod ollir;
