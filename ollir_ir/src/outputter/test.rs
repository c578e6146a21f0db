use super::*;
use crate::parser;
use pretty_assertions::assert_str_eq;

fn jasmin_for(ollir: &str) -> String {
    let unit = parser::parse(ollir).unwrap();
    JasminOutputter::new(&unit).build()
}

#[test]
fn outputs_class_constructor_and_simple_method() {
    let output = jasmin_for(
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
",
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
fn outputs_constant_stores_and_reloads() {
    let output = jasmin_for(
        "\
A extends Object {
    .method public f().i32 {
        x.i32 :=.i32 2.i32;
        x.i32 :=.i32 5.i32;
        ret.i32 5.i32;
    }
}
",
    );
    assert_str_eq!(
        output,
        "\
.class public A
.super java/lang/Object

.method public f()I
    .limit stack 1
    .limit locals 2
    iconst_2
    istore_1
    iconst_5
    istore_1
    iconst_5
    ireturn
.end method
"
    );
}

#[test]
fn selects_integer_constant_instructions() {
    let output = jasmin_for(
        "\
A extends Object {
    .method public f().V {
        a.i32 :=.i32 -1.i32;
        b.i32 :=.i32 100.i32;
        c.i32 :=.i32 1000.i32;
        d.i32 :=.i32 100000.i32;
        ret.V;
    }
}
",
    );
    assert!(output.contains("iconst_m1\n"));
    assert!(output.contains("bipush 100\n"));
    assert!(output.contains("sipush 1000\n"));
    assert!(output.contains("ldc 100000\n"));
}

#[test]
fn recognises_increments() {
    let output = jasmin_for(
        "\
A extends Object {
    .method public f().i32 {
        i.i32 :=.i32 0.i32;
        i.i32 :=.i32 i.i32 +.i32 1.i32;
        i.i32 :=.i32 i.i32 -.i32 3.i32;
        i.i32 :=.i32 7.i32 +.i32 i.i32;
        ret.i32 i.i32;
    }
}
",
    );
    assert!(output.contains("iinc 1 1\n"));
    assert!(output.contains("iinc 1 -3\n"));
    assert!(output.contains("iinc 1 7\n"));
}

#[test]
fn literal_first_subtraction_is_not_an_increment() {
    let output = jasmin_for(
        "\
A extends Object {
    .method public f().i32 {
        i.i32 :=.i32 0.i32;
        i.i32 :=.i32 7.i32 -.i32 i.i32;
        ret.i32 i.i32;
    }
}
",
    );
    assert!(!output.contains("iinc"));
    assert!(output.contains("isub\n"));
}

#[test]
fn lowers_comparisons_and_branches() {
    let output = jasmin_for(
        "\
A extends Object {
    .method public f(a.i32, b.i32).i32 {
        if (a.i32 <.bool b.i32) goto L_then0;
        x.i32 :=.i32 0.i32;
        goto L_endif0;
        L_then0:
        x.i32 :=.i32 1.i32;
        L_endif0:
        ret.i32 x.i32;
    }
}
",
    );
    assert_str_eq!(
        output,
        "\
.class public A
.super java/lang/Object

.method public f(II)I
    .limit stack 2
    .limit locals 4
    iload_1
    iload_2
    isub
    iflt L_ctrue0
    iconst_0
    goto L_cend0
L_ctrue0:
    iconst_1
L_cend0:
    ifne L_then0
    iconst_0
    istore_3
    goto L_endif0
L_then0:
    iconst_1
    istore_3
L_endif0:
    iload_3
    ireturn
.end method
"
    );
}

#[test]
fn resolves_imports_in_calls_fields_and_descriptors() {
    let output = jasmin_for(
        "\
import a.b.io;
import x.Other;
A extends Object {
    .field public o.Other;

    .method public static main(args.array.String).V {
        invokestatic(io, \"println\", 1.i32).V;
        ret.V;
    }
}
",
    );
    assert!(output.contains(".field public o Lx/Other;\n"));
    assert!(output.contains("invokestatic a/b/io/println(I)V\n"));
    assert!(output.contains(".method public static main([Ljava/lang/String;)V\n"));
}

#[test]
fn drains_unused_call_results() {
    let output = jasmin_for(
        "\
A extends Object {
    .method public f().V {
        invokevirtual(this, \"g\").i32;
        ret.V;
    }

    .method public g().i32 {
        ret.i32 1.i32;
    }
}
",
    );
    let flat: String = output
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n");
    assert!(flat.contains("invokevirtual A/g()I\npop\n"));
}

#[test]
fn stack_limit_covers_field_and_array_traffic() {
    let output = jasmin_for(
        "\
A extends Object {
    .field public q.i32;

    .method public f(xs.array.i32).i32 {
        putfield(this, q.i32, 3.i32).V;
        t1.i32 :=.i32 getfield(this, q.i32).i32;
        xs[0.i32].i32 :=.i32 t1.i32;
        t2.i32 :=.i32 xs[0.i32].i32;
        t3.i32 :=.i32 arraylength(xs.array.i32).i32;
        ret.i32 t2.i32;
    }
}
",
    );
    assert!(output.contains(".limit stack 3\n"));
    assert!(output.contains("getfield A/q I\n"));
    assert!(output.contains("putfield A/q I\n"));
    assert!(output.contains("iastore\n"));
    assert!(output.contains("iaload\n"));
    assert!(output.contains("arraylength\n"));
}
