//! End-to-end tests for OLLIR emission.

use jmm_lib::compile::{compile, CompileOpts, CompileOptsBuilder, OutputFormat};
use pretty_assertions::assert_str_eq;

fn opts(optimize: bool) -> CompileOpts {
    CompileOptsBuilder::new()
        .output_format(OutputFormat::Ollir)
        .optimize(optimize)
        .build()
}

fn ollir_for(source: &str, optimize: bool) -> String {
    let res = compile(source, &opts(optimize));
    let Some(bytes) = res.into_value() else {
        panic!("compilation failed for:\n{source}");
    };
    String::from_utf8(bytes).unwrap()
}

#[test]
fn emits_binary_method() {
    let ollir = ollir_for(
        "class A { public int add(int a, int b) { return a + b; } }",
        false,
    );
    assert_str_eq!(
        ollir,
        "\
A extends Object {

    .construct A().V {
        invokespecial(this, \"<init>\").V;
    }

    .method public add(a.i32, b.i32).i32 {
        t1.i32 :=.i32 a.i32 +.i32 b.i32;
        ret.i32 t1.i32;
    }
}
"
    );
}

#[test]
fn folds_constants_when_optimizing() {
    let ollir = ollir_for(
        "class A { public int f() { int x; x = 2; x = x + 3; return x; } }",
        true,
    );
    assert!(ollir.contains("x.i32 :=.i32 2.i32;\n"));
    assert!(ollir.contains("x.i32 :=.i32 5.i32;\n"));
    assert!(ollir.contains("ret.i32 5.i32;\n"));
}

#[test]
fn reifies_varargs_calls() {
    let ollir = ollir_for(
        "class A { public int sum(int... xs) { return xs[0]; } \
         public int f() { return this.sum(1, 2, 3); } }",
        false,
    );
    assert!(ollir.contains("t2.array.i32 :=.array.i32 new(array, 3.i32).array.i32;\n"));
    assert!(ollir.contains("t2[0.i32].i32 :=.i32 1.i32;\n"));
    assert!(ollir.contains("t2[1.i32].i32 :=.i32 2.i32;\n"));
    assert!(ollir.contains("t2[2.i32].i32 :=.i32 3.i32;\n"));
    assert!(ollir.contains("invokevirtual(this, \"sum\", t2.array.i32).i32;\n"));
}

#[test]
fn short_circuits_logical_and() {
    let ollir = ollir_for(
        "class A { public boolean p(boolean a, boolean b) { return a && b; } }",
        false,
    );
    assert!(ollir.contains("if (!.bool a.bool) goto L_false0;\n"));
    assert!(ollir.contains("t1.bool :=.bool b.bool;\n"));
    assert!(ollir.contains("goto L_end0;\n"));
    assert!(ollir.contains("t1.bool :=.bool 0.bool;\n"));
    assert!(ollir.contains("ret.bool t1.bool;\n"));
    // The right operand is only read after the conditional skip.
    let skip = ollir.find("goto L_false0").unwrap();
    let read_b = ollir.find("b.bool;").unwrap();
    assert!(skip < read_b);
}

#[test]
fn lowers_fields_through_getfield_and_putfield() {
    let ollir = ollir_for(
        "class A { int q; \
         public int get() { return q; } \
         public void set(int v) { q = v; } \
         public int getExplicit() { return this.q; } }",
        false,
    );
    assert!(ollir.contains(".field public q.i32;\n"));
    assert!(ollir.contains("t1.i32 :=.i32 getfield(this, q.i32).i32;\n"));
    assert!(ollir.contains("putfield(this, q.i32, v.i32).V;\n"));
    // `this.q` reads the field just like the bare name.
    assert!(ollir.contains("t2.i32 :=.i32 getfield(this, q.i32).i32;\n"));
    // The void method gets its implicit return.
    assert!(ollir.contains("ret.V;\n"));
}

#[test]
fn lowers_control_flow_with_fresh_labels() {
    let ollir = ollir_for(
        "class A { public int f(int n) { int s; s = 0; \
         while (0 < n) { if (n < 10) { s = s + 1; } else { s = s + 2; } n = n - 1; } \
         return s; } }",
        false,
    );
    assert!(ollir.contains("goto L_cond0;\n"));
    assert!(ollir.contains("L_body0:\n"));
    assert!(ollir.contains("if (0.i32 <.bool n.i32) goto L_body0;\n"));
    assert!(ollir.contains("if (n.i32 <.bool 10.i32) goto L_then1;\n"));
    assert!(ollir.contains("L_endif1:\n"));
}

#[test]
fn lowers_imported_static_and_virtual_calls() {
    let ollir = ollir_for(
        "import io; import Other; \
         class A { public void f(Other o) { io.println(1); o.run(2); } }",
        false,
    );
    assert!(ollir.contains("import io;\n"));
    assert!(ollir.contains("invokestatic(io, \"println\", 1.i32).V;\n"));
    assert!(ollir.contains("invokevirtual(o.Other, \"run\", 2.i32).V;\n"));
}

#[test]
fn constructs_objects_with_invokespecial() {
    let ollir = ollir_for(
        "class A { public A make() { A a; a = new A(); return a; } }",
        false,
    );
    assert!(ollir.contains("t1.A :=.A new(A).A;\n"));
    assert!(ollir.contains("invokespecial(t1.A, \"<init>\").V;\n"));
    assert!(ollir.contains("a.A :=.A t1.A;\n"));
}

#[test]
fn lowers_array_length_and_new_array() {
    let ollir = ollir_for(
        "class A { public int f(int n) { int[] xs; xs = new int[n]; return xs.length; } }",
        false,
    );
    assert!(ollir.contains("t1.array.i32 :=.array.i32 new(array, n.i32).array.i32;\n"));
    assert!(ollir.contains("t2.i32 :=.i32 arraylength(xs.array.i32).i32;\n"));
}

#[test]
fn output_is_deterministic() {
    let source = "import io; class A extends B { int q; \
        public int f(int n) { int s; s = 0; while (s < n) { s = s + 1; } return s; } \
        public static void main(String[] args) { io.println(3); } }";
    let first = ollir_for(source, true);
    let second = ollir_for(source, true);
    assert_eq!(first, second);
}

#[test]
fn temporaries_and_labels_are_fresh() {
    let ollir = ollir_for(
        "class A { public int f(int a, int b) { int x; boolean c; \
         x = a * b + a / b - a; \
         c = a < b && b < a; \
         if (c) { x = x + 1; } else { x = x - 1; } \
         while (x < 100) { x = x + this.f(a, b); } \
         return x; } }",
        false,
    );
    // Every temporary is defined exactly once.
    let mut temp_defs = Vec::new();
    for line in ollir.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix('t') {
            if let Some((digits, _)) = rest.split_once('.') {
                if digits.chars().all(|c| c.is_ascii_digit()) && line.contains(":=") {
                    temp_defs.push(format!("t{digits}"));
                }
            }
        }
    }
    let mut unique = temp_defs.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(temp_defs.len(), unique.len(), "duplicate temporary in:\n{ollir}");

    // Every label is declared exactly once.
    let mut labels: Vec<&str> = ollir
        .lines()
        .map(str::trim)
        .filter(|l| l.ends_with(':'))
        .collect();
    let count = labels.len();
    labels.sort();
    labels.dedup();
    assert_eq!(count, labels.len(), "duplicate label in:\n{ollir}");
}

#[test]
fn statements_are_terminated_and_assignments_well_typed() {
    let source = "class A { int q; public int f(int n) { int[] xs; int s; \
        xs = new int[n]; xs[0] = 1; s = xs[0] + q; q = s; \
        while (s < n) { s = s + 1; } return s; } }";
    let ollir = ollir_for(source, false);

    for line in ollir.lines() {
        let line = line.trim();
        if line.is_empty() || line.ends_with('{') || line == "}" || line.ends_with(':') {
            continue;
        }
        assert!(line.ends_with(';'), "unterminated statement: {line}");

        // Assignments carry the same type on both sides of `:=`.
        if let Some((lhs, rest)) = line.split_once(" :=.") {
            let suffix = rest.split_whitespace().next().unwrap();
            assert!(
                lhs.ends_with(&format!(".{suffix}")),
                "type mismatch in: {line}"
            );
        }
    }

    // Every method body ends in a return.
    let mut in_method = false;
    let mut last_statement = String::new();
    for line in ollir.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with(".method") {
            in_method = true;
            last_statement.clear();
        } else if trimmed == "}" {
            if in_method {
                assert!(
                    last_statement.starts_with("ret."),
                    "method does not end in ret: {last_statement}"
                );
            }
            in_method = false;
        } else if trimmed.ends_with(';') {
            last_statement = trimmed.to_owned();
        }
    }
}

#[test]
fn halts_with_diagnostics_on_semantic_errors() {
    let res = compile(
        "class A { public int f() { return x; } }",
        &opts(false),
    );
    assert!(res.is_err());
    assert!(res.diagnostics().count() > 0);
}
