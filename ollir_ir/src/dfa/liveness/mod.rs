//! Live-variable analysis.
//!
//! Classic backward dataflow at instruction granularity:
//! `in[i] = use[i] ∪ (out[i] − def[i])`, `out[i] = ∪ in[s]` over the
//! successors of `i`, iterated to a fixed point.
//!
//! Assignments define their destination and `putfield` is treated as
//! defining the field name. Every operand read anywhere counts as a use:
//! right-hand sides, array indices, call receivers and arguments, branch
//! conditions, and return values. Dropping any of those would let the
//! allocator merge two registers that are in fact simultaneously live.

use std::collections::BTreeSet;

use crate::cfg::Cfg;
use crate::class_unit::Method;
use crate::instruction::{Element, Instruction, InvokeKind};

#[derive(Debug, Clone, Default)]
pub struct LiveSets {
    pub defs: Vec<BTreeSet<String>>,
    pub uses: Vec<BTreeSet<String>>,
    pub live_in: Vec<BTreeSet<String>>,
    pub live_out: Vec<BTreeSet<String>>,
}

impl LiveSets {
    pub fn build_from(method: &Method, cfg: &Cfg) -> Self {
        let count = method.instructions.len();
        let mut sets = LiveSets {
            defs: Vec::with_capacity(count),
            uses: Vec::with_capacity(count),
            live_in: vec![BTreeSet::new(); count],
            live_out: vec![BTreeSet::new(); count],
        };

        for instruction in &method.instructions {
            sets.defs.push(defs(instruction));
            sets.uses.push(uses(instruction));
        }

        let mut changed = true;
        while changed {
            changed = false;
            for i in 0..count {
                let mut new_in: BTreeSet<String> = sets
                    .live_out[i]
                    .difference(&sets.defs[i])
                    .cloned()
                    .collect();
                new_in.extend(sets.uses[i].iter().cloned());

                let mut new_out = BTreeSet::new();
                for &succ in cfg.successors(i) {
                    new_out.extend(sets.live_in[succ].iter().cloned());
                }

                if new_in != sets.live_in[i] {
                    sets.live_in[i] = new_in;
                    changed = true;
                }
                if new_out != sets.live_out[i] {
                    sets.live_out[i] = new_out;
                    changed = true;
                }
            }
        }

        sets
    }
}

fn defs(instruction: &Instruction) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    match instruction {
        Instruction::Assign { dest, .. } => {
            if let Some(name) = dest.name() {
                out.insert(name.to_owned());
            }
        }
        Instruction::PutField { field, .. } => {
            out.insert(field.name.clone());
        }
        _ => {}
    }
    out
}

fn uses(instruction: &Instruction) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    match instruction {
        Instruction::Assign { dest, rhs } => {
            // An indexed destination consumes its index.
            if let Element::ArrayOperand { index, .. } = dest {
                element_uses(index, &mut out);
            }
            value_uses(rhs, &mut out);
        }
        other => value_uses(other, &mut out),
    }
    out
}

/// Operand names read by an instruction (or an assignment right-hand side).
fn value_uses(instruction: &Instruction, out: &mut BTreeSet<String>) {
    match instruction {
        Instruction::BinaryOp { left, right, .. } => {
            element_uses(left, out);
            element_uses(right, out);
        }
        Instruction::UnaryOp { operand, .. } | Instruction::SingleOp { operand } => {
            element_uses(operand, out)
        }
        Instruction::GetField { field, .. } => {
            out.insert(field.name.clone());
        }
        Instruction::PutField { value, .. } => element_uses(value, out),
        Instruction::Call {
            kind, caller, args, ..
        } => {
            // Static, new, and ldc callers name a class or constant, not a
            // register.
            match kind {
                InvokeKind::Virtual | InvokeKind::Special | InvokeKind::ArrayLength => {
                    element_uses(caller, out)
                }
                InvokeKind::Static | InvokeKind::New | InvokeKind::Ldc => {}
            }
            for arg in args {
                element_uses(arg, out);
            }
        }
        Instruction::Return { operand, .. } => {
            if let Some(operand) = operand {
                element_uses(operand, out);
            }
        }
        Instruction::CondBranch { condition, .. } => value_uses(condition, out),
        Instruction::Assign { .. } | Instruction::Goto { .. } => {}
    }
}

fn element_uses(element: &Element, out: &mut BTreeSet<String>) {
    match element {
        Element::Literal { .. } => {}
        Element::Operand(op) => {
            out.insert(op.name.clone());
        }
        Element::ArrayOperand { name, index, .. } => {
            out.insert(name.clone());
            element_uses(index, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn straight_line_liveness() {
        let source = "\
A extends Object {
    .method public f().i32 {
        a.i32 :=.i32 1.i32;
        b.i32 :=.i32 2.i32;
        c.i32 :=.i32 a.i32 +.i32 b.i32;
        ret.i32 c.i32;
    }
}
";
        let unit = parser::parse(source).unwrap();
        let method = &unit.methods[0];
        let cfg = Cfg::build_from(method);
        let live = LiveSets::build_from(method, &cfg);

        assert_eq!(live.uses[2], set(&["a", "b"]));
        assert_eq!(live.uses[3], set(&["c"]));
        assert_eq!(live.live_in[2], set(&["a", "b"]));
        assert_eq!(live.live_out[0], set(&["a"]));
        assert_eq!(live.live_out[1], set(&["a", "b"]));
        // The return keeps `c` live out of its definition.
        assert_eq!(live.live_out[2], set(&["c"]));
    }

    #[test]
    fn returns_branches_and_calls_count_as_uses() {
        let source = "\
A extends Object {
    .method public f(c.bool).i32 {
        x.i32 :=.i32 1.i32;
        y.i32 :=.i32 2.i32;
        if (c.bool) goto L_then0;
        invokevirtual(this, \"g\", y.i32).V;
        L_then0:
        ret.i32 x.i32;
    }
}
";
        let unit = parser::parse(source).unwrap();
        let method = &unit.methods[0];
        let cfg = Cfg::build_from(method);
        let live = LiveSets::build_from(method, &cfg);

        // The branch reads `c`, the call reads its receiver and `y`, the
        // return reads `x`.
        assert_eq!(live.uses[2], set(&["c"]));
        assert_eq!(live.uses[3], set(&["this", "y"]));
        assert_eq!(live.uses[4], set(&["x"]));
        // `x` stays live across everything between its definition and the
        // return.
        assert!(live.live_out[0].contains("x"));
        assert!(live.live_out[1].contains("x"));
        assert!(live.live_out[2].contains("x"));
    }

    #[test]
    fn liveness_flows_through_loops() {
        let source = "\
A extends Object {
    .method public f(n.i32).i32 {
        s.i32 :=.i32 0.i32;
        goto L_cond0;
        L_body0:
        s.i32 :=.i32 s.i32 +.i32 1.i32;
        L_cond0:
        t1.bool :=.bool s.i32 <.bool n.i32;
        if (t1.bool) goto L_body0;
        ret.i32 s.i32;
    }
}
";
        let unit = parser::parse(source).unwrap();
        let method = &unit.methods[0];
        let cfg = Cfg::build_from(method);
        let live = LiveSets::build_from(method, &cfg);

        // `s` is live around the back edge.
        assert!(live.live_out[2].contains("s"));
        assert!(live.live_in[2].contains("s"));
        assert!(live.live_out[0].contains("s"));
        // `n` is live from entry to the comparison.
        assert!(live.live_in[0].contains("n"));
    }
}
