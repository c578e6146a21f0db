//! Register allocation.
//!
//! Builds interference from the live-variable solution and colours it
//! Chaitin-style, then rewrites the per-method var tables. Parameters and
//! `this` keep their frame slots; only the remaining locals are recoloured.

mod coloring;

use std::fmt;

use crate::class_unit::ClassUnit;

/// The requested register ceiling cannot be met.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationError {
    pub needed: usize,
}

impl fmt::Display for AllocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Need at least {} registers.", self.needed)
    }
}

impl std::error::Error for AllocationError {}

/// Recolours every method of `unit`.
///
/// With `max_registers == 0` the allocator just minimises; a positive value
/// is enforced as a ceiling on the per-method frame size.
pub fn run(unit: &mut ClassUnit, max_registers: usize) -> Result<(), AllocationError> {
    for method in &mut unit.methods {
        if method.is_construct {
            continue;
        }
        coloring::allocate(method);
    }

    if max_registers > 0 {
        let needed = unit
            .methods
            .iter()
            .filter_map(|m| m.max_register())
            .max()
            .map(|reg| reg + 1)
            .unwrap_or(0);
        if needed > max_registers {
            return Err(AllocationError { needed });
        }
    }

    Ok(())
}
