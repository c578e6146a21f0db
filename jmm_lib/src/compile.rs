use crate::diagnostic::AggregateResult;
use crate::{analysis, codegen, passes};

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum OutputFormat {
    AstRustDbg,
    Ollir,
    #[default]
    Jasmin,
}

pub struct CompileOpts {
    output_format: OutputFormat,
    optimize: bool,
    register_allocation: i32,
}

pub struct CompileOptsBuilder {
    output_format: OutputFormat,
    optimize: bool,
    register_allocation: i32,
}

impl Default for CompileOptsBuilder {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::default(),
            optimize: false,
            register_allocation: -1,
        }
    }
}

impl CompileOptsBuilder {
    /// Output Jasmin, without constant folding or register allocation.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Enable constant propagation and folding.
    pub fn optimize(mut self, optimize: bool) -> Self {
        self.optimize = optimize;
        self
    }

    /// `-1` keeps the frame slots assigned during lowering; `0` minimises;
    /// a positive value also enforces a ceiling.
    pub fn register_allocation(mut self, registers: i32) -> Self {
        self.register_allocation = registers;
        self
    }

    pub fn build(self) -> CompileOpts {
        CompileOpts {
            output_format: self.output_format,
            optimize: self.optimize,
            register_allocation: self.register_allocation,
        }
    }
}

pub fn compile(source: &str, opts: &CompileOpts) -> AggregateResult<Vec<u8>> {
    let mut res = passes::parse::parse(source).and_then(|program| {
        let table = passes::build_symbol_table::build(&program);
        analysis::analyze(&program, &table).map(|()| (program, table))
    });

    if let Some((program, table)) = res.value_mut() {
        if opts.optimize {
            passes::const_fold::const_fold(program);
        }
        passes::lower_varargs::lower_varargs(program, table);
    }

    if opts.output_format == OutputFormat::AstRustDbg {
        return res.map(|(program, _)| format!("{program:#?}\n").into_bytes());
    }

    let ollir = res.map(|(program, table)| codegen::ollir::build_from_ast(&program, &table));

    if opts.output_format == OutputFormat::Ollir {
        return ollir.map(String::into_bytes);
    }

    let max_registers = match opts.register_allocation {
        n if n >= 0 => Some(n as usize),
        _ => None,
    };
    ollir
        .and_then(|text| codegen::jasmin::build_from_ollir(&text, max_registers))
        .map(String::into_bytes)
}
