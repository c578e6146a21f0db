//! Per-method control-flow graph.
//!
//! The graph is at instruction granularity: every instruction has at most
//! two successors (fall-through and/or branch target), returns have none.

use arrayvec::ArrayVec;

use crate::class_unit::Method;
use crate::instruction::Instruction;

#[derive(Debug, Clone, Default)]
pub struct Cfg {
    successors: Vec<ArrayVec<usize, 2>>,
}

impl Cfg {
    pub fn build_from(method: &Method) -> Self {
        let count = method.instructions.len();
        let mut successors = Vec::with_capacity(count);

        for (i, instruction) in method.instructions.iter().enumerate() {
            let mut succs: ArrayVec<usize, 2> = ArrayVec::new();
            match instruction {
                Instruction::Return { .. } => {}
                Instruction::Goto { label } => {
                    succs.push(Self::target(method, label));
                }
                Instruction::CondBranch { label, .. } => {
                    succs.push(Self::target(method, label));
                    if i + 1 < count {
                        succs.push(i + 1);
                    }
                }
                _ => {
                    if i + 1 < count {
                        succs.push(i + 1);
                    }
                }
            }
            successors.push(succs);
        }

        Self { successors }
    }

    fn target(method: &Method, label: &str) -> usize {
        method
            .label_target(label)
            .unwrap_or_else(|| panic!("jump to unknown label `{label}`"))
    }

    pub fn len(&self) -> usize {
        self.successors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.successors.is_empty()
    }

    pub fn successors(&self, index: usize) -> &[usize] {
        &self.successors[index]
    }
}
