use crate::diagnostic::{AggregateResult, Code, Stage};
use crate::passes::{build_symbol_table, parse};

fn analyze_source(source: &str) -> AggregateResult<()> {
    let program = parse::parse(source).into_value().expect("parse failed");
    let table = build_symbol_table::build(&program);
    super::analyze(&program, &table)
}

/// Panics if the analysis does *not* report a diagnostic with the given
/// code.
#[track_caller]
fn has_error(source: &str, code: Code) {
    let res = analyze_source(source);
    let found = res.diagnostics().any(|(_, d)| d.code() == &code);
    if !found {
        let diagnostics: Vec<_> = res.into_diagnostics().map(|(_, d)| d).collect();
        panic!("didn't find diagnostic with code {code:?}, got: {diagnostics:#?}");
    }
}

#[track_caller]
fn is_clean(source: &str) {
    let res = analyze_source(source);
    assert!(
        res.is_ok(),
        "expected clean analysis, got: {:#?}",
        res.diagnostics().collect::<Vec<_>>()
    );
}

#[test]
fn accepts_well_typed_program() {
    is_clean(
        "import io; \
         class A { \
             int q; \
             public int add(int a, int b) { int t; t = a + b; return t; } \
             public boolean p(boolean a, boolean b) { return a && b; } \
             public static void main(String[] args) { io.println(1); } \
         }",
    );
}

#[test]
fn reports_duplicated_elements() {
    has_error("import io; import io; class A { }", Code::DuplicatedImport);
    has_error("class A { int x; int x; }", Code::DuplicatedField);
    has_error(
        "class A { public int f() { return 1; } public int f() { return 2; } }",
        Code::DuplicatedMethod,
    );
    has_error(
        "class A { public int f(int a, int a) { return a; } }",
        Code::DuplicatedParameter,
    );
    has_error(
        "class A { public int f() { int a; int a; return 1; } }",
        Code::DuplicatedLocal,
    );
}

#[test]
fn reports_this_in_static_method() {
    has_error(
        "class A { public int g() { return 1; } \
         public static void main(String[] args) { this.g(); } }",
        Code::ThisInStaticMethod,
    );
}

#[test]
fn reports_field_in_static_method() {
    has_error(
        "class A { int q; public static void main(String[] args) { int x; x = q; } }",
        Code::FieldInStaticMethod,
    );
    // Parameters shadowing a field are fine.
    is_clean("class A { int x; public int f(int x) { return x; } }");
}

#[test]
fn reports_invalid_method_declarations() {
    has_error(
        "class A { public void main(String[] args) { } }",
        Code::InvalidMainMethod,
    );
    has_error(
        "class A { public static int main(String[] args) { return 1; } }",
        Code::InvalidMainMethod,
    );
    has_error(
        "class A { public static int f() { return 1; } }",
        Code::StaticNonMainMethod,
    );
    has_error("class A { public int f() { int x; x = 1; } }", Code::MissingReturn);
    has_error(
        "class A { public int f() { return 1; return 2; } }",
        Code::MultipleReturns,
    );
    has_error(
        "class A { public int f() { return 1; x = 2; } }",
        Code::ReturnNotLast,
    );
    has_error(
        "class A { public void f() { return 1; } }",
        Code::ReturnInVoidMethod,
    );
}

#[test]
fn reports_undeclared_variables() {
    has_error(
        "class A { public int f() { return x; } }",
        Code::UndeclaredVariable,
    );
    is_clean("import io; class A { public void f() { io.println(1); } }");
}

#[test]
fn reports_undefined_methods() {
    has_error(
        "class A { public int f() { return this.g(); } }",
        Code::UndefinedMethod,
    );
    // Inherited from an imported superclass.
    is_clean("import B; class A extends B { public int f() { return this.g(); } }");
}

#[test]
fn reports_type_errors() {
    has_error(
        "class A { public int f(boolean b) { return 1 + b; } }",
        Code::IncompatibleOperands,
    );
    has_error(
        "class A { public boolean f(int a, boolean b) { return a == b; } }",
        Code::IncompatibleOperands,
    );
    has_error(
        "class A { public int f(int[] xs) { return xs + 1; } }",
        Code::ArrayInBinaryExpr,
    );
    has_error(
        "class A { public int f() { int x; x = true; return x; } }",
        Code::IncompatibleAssign,
    );
    has_error(
        "class A { public int f(int x) { if (x) { } else { } return 1; } }",
        Code::IncompatibleCondition,
    );
    has_error(
        "class A { public boolean f() { return 1; } }",
        Code::IncompatibleReturn,
    );
    has_error(
        "class A { public int g(int a) { return a; } \
         public int f() { return this.g(true); } }",
        Code::IncompatibleArgument,
    );
    has_error(
        "class A { public int g(int a) { return a; } \
         public int f() { return this.g(1, 2); } }",
        Code::WrongArgumentCount,
    );
    has_error(
        "class A { public int f(int[] xs, boolean b) { return xs[b]; } }",
        Code::IncompatibleOperands,
    );
}

#[test]
fn reports_varargs_call_arity() {
    has_error(
        "class A { public int sum(int a, int b, int... xs) { return a; } \
         public int f() { return this.sum(1); } }",
        Code::WrongArgumentCount,
    );
    is_clean(
        "class A { public int sum(int... xs) { return xs[0]; } \
         public int f() { return this.sum(1, 2, 3); } }",
    );
    is_clean(
        "class A { public int sum(int... xs) { return xs[0]; } \
         public int f(int[] ys) { return this.sum(ys); } }",
    );
}

#[test]
fn reports_invalid_array_access() {
    has_error(
        "class A { public int f(int x) { return x[0]; } }",
        Code::InvalidArrayAccess,
    );
    has_error(
        "import Other; class A { public int f(Other o) { return o.length; } }",
        Code::InvalidArrayAccess,
    );
    is_clean("class A { public int f(int[] xs) { return xs[0]; } }");
    is_clean("class A { public int f(int[] xs) { return xs.length; } }");
}

#[test]
fn reports_invalid_member_access() {
    // Reads through imported objects are not supported.
    has_error(
        "import Other; class A { public int f(Other o) { return o.size; } }",
        Code::InvalidMemberAccess,
    );
    // `this.x` only works for declared fields.
    has_error(
        "class A { public int f() { return this.missing; } }",
        Code::InvalidMemberAccess,
    );
    // Chained member reads have no defined meaning.
    has_error(
        "class A { int q; public int f() { return this.q.inner; } }",
        Code::InvalidMemberAccess,
    );
    is_clean("class A { int q; public int f() { return this.q; } }");
}

#[test]
fn driver_halts_at_first_failing_pass() {
    // The duplicated field would also be an undeclared-variable error later;
    // only the first pass reports.
    let res = analyze_source("class A { int x; int x; public int f() { return y; } }");
    assert!(res.is_err());
    let codes: Vec<_> = res.diagnostics().map(|(_, d)| *d.code()).collect();
    assert_eq!(codes, vec![Code::DuplicatedField]);
}

#[test]
fn diagnostics_carry_the_semantic_stage() {
    let res = analyze_source("class A { public int f() { return x; } }");
    for (_, diagnostic) in res.diagnostics() {
        assert_eq!(diagnostic.stage(), Stage::Semantic);
    }
}
