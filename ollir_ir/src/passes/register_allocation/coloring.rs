use std::collections::{BTreeMap, BTreeSet};

use crate::cfg::Cfg;
use crate::class_unit::Method;
use crate::dfa::liveness::LiveSets;

/// Rewrites the registers of the non-parameter locals of `method`.
pub(super) fn allocate(method: &mut Method) {
    let cfg = Cfg::build_from(method);
    let live = LiveSets::build_from(method, &cfg);
    Colorer::new(method, &live).color();
}

struct Colorer<'m> {
    method: &'m mut Method,
    /// Working copy of the interference edges, consumed by simplification.
    edges: BTreeMap<String, BTreeSet<String>>,
    /// Untouched copy used when assigning colours.
    persistent: BTreeMap<String, BTreeSet<String>>,
}

impl<'m> Colorer<'m> {
    fn new(method: &'m mut Method, live: &LiveSets) -> Self {
        let params: BTreeSet<&str> = method.params.iter().map(|p| p.name.as_str()).collect();
        let nodes: BTreeSet<String> = method
            .var_table
            .keys()
            .filter(|name| name.as_str() != "this" && !params.contains(name.as_str()))
            .cloned()
            .collect();

        let mut edges: BTreeMap<String, BTreeSet<String>> =
            nodes.iter().map(|n| (n.clone(), BTreeSet::new())).collect();

        // Two locals interfere when one is defined while the other is live
        // out of the same instruction.
        for i in 0..live.defs.len() {
            let def_out: BTreeSet<&String> =
                live.defs[i].iter().chain(&live.live_out[i]).collect();
            for a in &def_out {
                for b in &def_out {
                    if a == b || !nodes.contains(*a) || !nodes.contains(*b) {
                        continue;
                    }
                    edges.get_mut(*a).unwrap().insert((*b).clone());
                    edges.get_mut(*b).unwrap().insert((*a).clone());
                }
            }
        }

        Self {
            method,
            persistent: edges.clone(),
            edges,
        }
    }

    fn color(mut self) {
        let mut stack = self.simplify();
        let floor = 1 + self.method.params.len();
        let mut colors: BTreeMap<String, usize> = BTreeMap::new();

        while let Some(node) = stack.pop() {
            let taken: BTreeSet<usize> = self.persistent[&node]
                .iter()
                .filter_map(|neighbour| colors.get(neighbour).copied())
                .collect();
            let mut reg = floor;
            while taken.contains(&reg) {
                reg += 1;
            }
            colors.insert(node, reg);
        }

        for (name, reg) in colors {
            self.method
                .var_table
                .get_mut(&name)
                .expect("coloured node must be in the var table")
                .reg = reg;
        }
    }

    /// Chaitin simplification: repeatedly remove nodes of degree `< k`,
    /// raising `k` whenever no node qualifies.
    fn simplify(&mut self) -> Vec<String> {
        let mut remaining: BTreeSet<String> = self.edges.keys().cloned().collect();
        let mut stack = Vec::with_capacity(remaining.len());
        let mut k = 1;

        while !remaining.is_empty() {
            let mut removed = Vec::new();
            for node in &remaining {
                if self.edges[node].len() < k {
                    stack.push(node.clone());
                    removed.push(node.clone());
                    for neighbours in self.edges.values_mut() {
                        neighbours.remove(node);
                    }
                }
            }
            if removed.is_empty() {
                k += 1;
                continue;
            }
            for node in removed {
                remaining.remove(&node);
                self.edges.remove(&node);
            }
        }

        stack
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    fn allocated(source: &str) -> Method {
        let mut unit = parser::parse(source).unwrap();
        let mut method = unit.methods.remove(0);
        allocate(&mut method);
        method
    }

    #[test]
    fn reuses_registers_for_disjoint_lifetimes() {
        let method = allocated(
            "\
A extends Object {
    .method public f().i32 {
        a.i32 :=.i32 1.i32;
        b.i32 :=.i32 2.i32;
        c.i32 :=.i32 a.i32 +.i32 b.i32;
        ret.i32 c.i32;
    }
}
",
        );
        let a = method.var_table["a"].reg;
        let b = method.var_table["b"].reg;
        let c = method.var_table["c"].reg;

        // `a` and `b` are simultaneously live and must differ.
        assert_ne!(a, b);
        // All registers start after the (empty) parameter block.
        assert!(a >= 1 && b >= 1 && c >= 1);
        // `c` is dead immediately, so it can share with `a` or `b`.
        assert_eq!(method.max_register(), Some(2));
    }

    #[test]
    fn parameters_keep_their_slots() {
        let method = allocated(
            "\
A extends Object {
    .method public f(x.i32).i32 {
        t1.i32 :=.i32 x.i32 +.i32 1.i32;
        ret.i32 t1.i32;
    }
}
",
        );
        assert_eq!(method.var_table["this"].reg, 0);
        assert_eq!(method.var_table["x"].reg, 1);
        // Locals start above `1 + #params`.
        assert_eq!(method.var_table["t1"].reg, 2);
    }

    #[test]
    fn values_read_only_by_the_return_stay_apart() {
        let method = allocated(
            "\
A extends Object {
    .method public f().i32 {
        x.i32 :=.i32 1.i32;
        y.i32 :=.i32 2.i32;
        ret.i32 x.i32;
    }
}
",
        );
        // `x` is live across the definition of `y`; merging them would make
        // the method return 2.
        assert_ne!(method.var_table["x"].reg, method.var_table["y"].reg);
    }

    #[test]
    fn interfering_loop_variables_stay_apart() {
        let method = allocated(
            "\
A extends Object {
    .method public f(n.i32).i32 {
        s.i32 :=.i32 0.i32;
        i.i32 :=.i32 0.i32;
        goto L_cond0;
        L_body0:
        s.i32 :=.i32 s.i32 +.i32 i.i32;
        i.i32 :=.i32 i.i32 +.i32 1.i32;
        L_cond0:
        t1.bool :=.bool i.i32 <.bool n.i32;
        if (t1.bool) goto L_body0;
        ret.i32 s.i32;
    }
}
",
        );
        assert_ne!(method.var_table["s"].reg, method.var_table["i"].reg);
    }
}
