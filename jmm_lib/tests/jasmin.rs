//! End-to-end tests down to Jasmin text.

use jmm_lib::compile::{compile, CompileOpts, CompileOptsBuilder, OutputFormat};
use jmm_lib::diagnostic::{Code, Stage};
use pretty_assertions::assert_str_eq;

fn opts() -> CompileOptsBuilder {
    CompileOptsBuilder::new().output_format(OutputFormat::Jasmin)
}

fn jasmin_for(source: &str, opts: &CompileOpts) -> String {
    let res = compile(source, opts);
    let Some(bytes) = res.into_value() else {
        panic!("compilation failed for:\n{source}");
    };
    String::from_utf8(bytes).unwrap()
}

/// The output with indentation stripped, for instruction-sequence checks.
fn flat(output: &str) -> String {
    let mut s = output
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n");
    s.push('\n');
    s
}

#[test]
fn compiles_addition_to_stack_code() {
    let output = jasmin_for(
        "class A { public int add(int a, int b) { return a + b; } }",
        &opts().build(),
    );
    assert_str_eq!(
        output,
        "\
.class public A
.super java/lang/Object

.method public <init>()V
    aload_0
    invokespecial java/lang/Object/<init>()V
    return
.end method

.method public add(II)I
    .limit stack 2
    .limit locals 3
    iload_1
    iload_2
    iadd
    ireturn
.end method
"
    );
}

#[test]
fn compiles_folded_constants_to_stores() {
    let output = jasmin_for(
        "class A { public int f() { int x; x = 2; x = x + 3; return x; } }",
        &opts().optimize(true).build(),
    );
    let flat = flat(&output);
    assert!(flat.contains("iconst_2\nistore_1\n"));
    assert!(flat.contains("iconst_5\nistore_1\niconst_5\nireturn\n"));
}

#[test]
fn short_circuit_translates_to_branches() {
    let output = jasmin_for(
        "class A { public boolean p(boolean a, boolean b) { return a && b; } }",
        &opts().build(),
    );
    let flat = flat(&output);
    assert!(flat.contains("iload_1\nifeq L_false0\n"));
    assert!(flat.contains("iload_2\nistore_3\n"));
    assert!(flat.contains("goto L_end0\n"));
    assert!(flat.contains("L_false0:\n"));
    assert!(flat.contains("L_end0:\n"));
    assert!(flat.contains("iload_3\nireturn\n"));
}

#[test]
fn while_loop_compiles_to_comparison_and_branches() {
    let output = jasmin_for(
        "class A { public int f(int n) { int s; s = 0; \
         while (s < n) { s = s + 1; } return s; } }",
        &opts().build(),
    );
    assert!(output.contains("goto L_cond0\n"));
    assert!(output.contains("L_body0:\n"));
    assert!(output.contains("iinc 2 1\n"));
    assert!(output.contains("isub\n"));
    assert!(output.contains("iflt L_ctrue0\n"));
    assert!(output.contains("ifne L_body0\n"));
}

#[test]
fn extends_resolves_the_imported_superclass() {
    let output = jasmin_for(
        "import a.b.Base; class A extends Base { public int f() { return 1; } }",
        &opts().build(),
    );
    assert!(output.contains(".super a/b/Base\n"));
    assert!(output.contains("invokespecial a/b/Base/<init>()V\n"));
}

#[test]
fn static_method_params_start_at_slot_zero() {
    let output = jasmin_for(
        "import io; class A { public static void main(String[] args) { io.println(7); } }",
        &opts().build(),
    );
    assert!(output.contains(".method public static main([Ljava/lang/String;)V\n"));
    let flat = flat(&output);
    assert!(flat.contains("bipush 7\ninvokestatic io/println(I)V\n"));
    assert!(flat.contains("return\n"));
}

#[test]
fn register_allocation_fits_disjoint_lifetimes() {
    let source = "class A { public int f() { int a; int b; int c; \
                  a = 1; b = 2; c = a + b; return c + a; } }";

    // Without allocation, every local keeps its own slot.
    let plain = jasmin_for(source, &opts().build());
    assert!(plain.contains(".limit locals 4\n"));

    // With allocation, `c` reuses the slot `b` no longer needs.
    let allocated = jasmin_for(source, &opts().register_allocation(0).build());
    assert!(allocated.contains(".limit locals 3\n"));
}

#[test]
fn allocation_never_merges_values_read_by_return() {
    let source = "class A { public int f() { int x; int y; x = 1; y = 2; return x; } }";
    let output = jasmin_for(source, &opts().register_allocation(0).build());
    let flat = flat(&output);
    // `x` and `y` keep distinct slots and the return reloads `x`'s slot.
    assert!(flat.contains("iconst_1\nistore_2\n"));
    assert!(flat.contains("iconst_2\nistore_1\n"));
    assert!(flat.contains("iload_2\nireturn\n"));
    assert!(output.contains(".limit locals 3\n"));
}

#[test]
fn register_ceiling_violation_reports_needed_count() {
    let source = "class A { public int f() { int a; int b; int c; \
                  a = 1; b = 2; c = a + b; return c; } }";

    let res = compile(source, &opts().register_allocation(2).build());
    assert!(res.is_err());
    let (_, diagnostic) = res.diagnostics().next().expect("expected a diagnostic");
    assert_eq!(diagnostic.code(), &Code::NotEnoughRegisters);
    assert_eq!(diagnostic.stage(), Stage::Optimization);
    assert_eq!(diagnostic.message(), "Need at least 3 registers.");

    // A ceiling of 3 is satisfiable.
    let res = compile(source, &opts().register_allocation(3).build());
    assert!(res.is_ok());
}

#[test]
fn stack_limits_cover_peak_depth() {
    let source = "class A { public int g(int a, int b) { return a + b; } \
                  public int f(int a, int b) { return this.g(a, b); } }";
    let output = jasmin_for(source, &opts().build());
    // Receiver plus both arguments are on the stack before the invoke.
    assert!(output.contains(".limit stack 3\n"));
}

#[test]
fn jasmin_output_is_deterministic() {
    let source = "import io; class A { int q; \
        public int f(int n) { int s; s = 0; \
        while (s < n) { if (s < 3) { s = s + 1; } else { s = s + 2; } } return s; } \
        public static void main(String[] args) { io.println(1); } }";
    let first = jasmin_for(source, &opts().optimize(true).register_allocation(0).build());
    let second = jasmin_for(source, &opts().optimize(true).register_allocation(0).build());
    assert_eq!(first, second);
}

#[test]
fn field_access_in_static_method_is_rejected() {
    let res = compile(
        "class A { int q; public static void main(String[] args) { int x; x = q; } }",
        &opts().build(),
    );
    assert!(res.is_err());
    let codes: Vec<_> = res.diagnostics().map(|(_, d)| *d.code()).collect();
    assert_eq!(codes, vec![Code::FieldInStaticMethod]);
}
