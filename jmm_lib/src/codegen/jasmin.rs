//! Jasmin generation from OLLIR text.
//!
//! Re-parses the emitted OLLIR into the backend model, optionally runs
//! register allocation, and hands the result to the Jasmin outputter.

use crate::diagnostic::{AggregateResult, DiagnosticBuilder, Span};
use ollir_ir::outputter::JasminOutputter;
use ollir_ir::passes::register_allocation;

/// Lowers OLLIR text to Jasmin assembly.
///
/// `max_registers`: `None` keeps the frame slots assigned by the reader;
/// `Some(0)` minimises without a ceiling; `Some(n)` additionally enforces
/// `n` as the per-method frame size.
pub fn build_from_ollir(ollir: &str, max_registers: Option<usize>) -> AggregateResult<String> {
    let mut unit = match ollir_ir::parser::parse(ollir) {
        Ok(unit) => unit,
        Err(err) => {
            // The text came from our own emitter, so this is a compiler bug.
            return AggregateResult::new_err(
                DiagnosticBuilder::new(Span::default()).build_internal_error("ollir reader", err),
            );
        }
    };

    if let Some(max_registers) = max_registers {
        if let Err(err) = register_allocation::run(&mut unit, max_registers) {
            return AggregateResult::new_err(
                DiagnosticBuilder::new(Span::default()).build_not_enough_registers(err.needed),
            );
        }
    }

    AggregateResult::new_ok(JasminOutputter::new(&unit).build())
}
