//! Evaluation tests through the public API: compile → evaluate.
//!
//! Results are checked as `Value`s so int/num distinctions are visible.

use matx_lang::{run, Diagnostic, EnvNamespace, ErrorCode, LibraryRegistry, Options, Session, Stage, Value};

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn eval(src: &str) -> Value {
    run(src).unwrap_or_else(|errs| panic!("run failed: {errs:#?}"))
}

fn eval_err(src: &str) -> Diagnostic {
    let errs = run(src).expect_err("expected run to fail");
    assert_eq!(errs.len(), 1, "{errs:#?}");
    errs.into_iter().next().unwrap()
}

fn num(src: &str) -> f64 {
    match eval(src) {
        Value::Num(x) => x,
        other => panic!("expected num, got {other:?}"),
    }
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// ─── Operators ───────────────────────────────────────────────────────────────

#[test]
fn precedence_and_associativity() {
    assert_eq!(eval("return 1 + 2 * 3"), Value::Int(7));
    assert_eq!(eval("return 2 ** 3 ** 2"), Value::Int(512));
    assert_eq!(eval("return (2 ** 3) ** 2"), Value::Int(64));
    assert_eq!(eval("return 10 - 4 - 3"), Value::Int(3));
}

#[test]
fn scalar_promotion() {
    assert_eq!(eval("return 2 + 1.5"), Value::Num(3.5));
    assert_eq!(eval("return 7 // 2"), Value::Int(3));
    assert_eq!(eval("return 7.5 // 2.0"), Value::Int(3));
    assert_eq!(eval("return -7 // 2"), Value::Int(-3));
    assert_eq!(eval("return 7 / 2"), Value::Num(3.5));
    assert_eq!(eval("return -7 % 3"), Value::Int(-1));
}

#[test]
fn bitwise_and_logic() {
    assert_eq!(eval("return 6 & 3 | 8"), Value::Int(10));
    assert_eq!(eval("return 1 << 4 ^ 1"), Value::Int(17));
    assert_eq!(eval("bool b = true && !false\nreturn int(b)"), Value::Int(1));
}

#[test]
fn long_sums_within_the_nesting_limit() {
    let src = format!("return 1{}", "+1".repeat(100));
    assert_eq!(eval(&src), Value::Int(101));
}

#[test]
fn scalar_first_broadcasting() {
    assert_eq!(num("vec2 v = 2 - vec2(1, 3)\nreturn v[2]"), -1.0);
    assert_eq!(num("vec3 v = vec3(2, 4, 6) / 2\nreturn v[3]"), 3.0);
}

#[test]
fn scalar_integer_division_over_matrices() {
    assert_eq!(num("mat3 m = mat3(1,2,3, 4,5,6, 7,8,9)\nmat3 k = 9 // m\nreturn k[4]"), 2.0);
    assert_eq!(num("quat q = 5 // quat(2, 1, 3, 4)\nreturn q[4]"), 2.0);
}

#[test]
fn array_equality() {
    assert_eq!(eval("return int(vec2(1, 2) == vec2(1, 2))"), Value::Int(1));
    assert_eq!(eval("return int(vec2(1, 2) != vec2(1, 5))"), Value::Int(1));
}

// ─── Matrices and quaternions ────────────────────────────────────────────────

#[test]
fn matrix_vector_conventions() {
    let m = "mat3 m = mat3(1,2,3, 4,5,6, 7,8,9)\n";
    // column vector: first column
    assert_eq!(num(&format!("{m}vec3 r = m * vec3(1, 0, 0)\nreturn r[2]")), 2.0);
    // row vector: first row
    assert_eq!(num(&format!("{m}vec3 r = vec3(1, 0, 0) * m\nreturn r[2]")), 4.0);
    // column-major indexing
    assert_eq!(num(&format!("{m}return m[4]")), 4.0);
}

#[test]
fn erh_scenario() {
    let src = "fun erh(a, b) { return a * b; }\n\
               mat3 m = mat3(1,0,0, 0,1,0, 0,0,1);\n\
               vec3 v = vec3(1,2,3);\n\
               return erh(m, v)[2];";
    assert_eq!(eval(src), Value::Num(2.0));
}

#[test]
fn quaternion_product_and_rotation() {
    // i * i = -1, w is stored last
    assert_eq!(num("quat i = quat(0, 1, 0, 0)\nquat k = i * i\nreturn k[4]"), -1.0);

    let src = "num h = math.sqrt(0.5)\n\
               quat q = quat(h, 0, 0, h)\n\
               vec3 r = q * vec3(1, 0, 0)\n\
               return r[2]";
    assert!(approx(num(src), 1.0));
}

#[test]
fn zero_quaternion_inverse_is_zero() {
    let src = "quat r = quat.inverse(quat(0, 0, 0, 0))\nreturn r[1] + r[2] + r[3] + r[4]";
    assert_eq!(num(src), 0.0);
}

#[test]
fn quaternion_power() {
    // squaring a 90 degree rotation about z gives 180 degrees: w = 0, z = 1
    let src = "num h = math.sqrt(0.5)\nquat q = quat(h, 0, 0, h) ** 2\nreturn q[3]";
    assert!(approx(num(src), 1.0));
}

// ─── Statements ──────────────────────────────────────────────────────────────

#[test]
fn compound_assignment_desugars() {
    assert_eq!(eval("num x = 5; x += 3; return x;"), Value::Num(8.0));
    assert_eq!(eval("bool b = true\nb &&= false\nreturn int(b)"), Value::Int(0));
}

#[test]
fn lambda_and_block_functions() {
    let src = "fun double(x) => x * 2\n\
               fun area(v) {\n\
                 num w = v[1]\n\
                 return w * v[2]\n\
               }\n\
               return double(area(vec2(3, 4)))";
    assert_eq!(eval(src), Value::Num(24.0));
}

#[test]
fn comments_are_ignored() {
    assert_eq!(eval("# setup\nint a = 4 # four\n\nreturn a # done"), Value::Int(4));
}

// ─── Libraries ───────────────────────────────────────────────────────────────

#[test]
fn standard_library_calls() {
    assert_eq!(eval("return math.sqrt(16)"), Value::Num(4.0));
    assert_eq!(eval("return vec3.length(vec3(2, 3, 6))"), Value::Num(7.0));
    assert_eq!(eval("return mat4.det(mat4.identity())"), Value::Num(1.0));
    assert!(approx(num("return math.pi"), std::f64::consts::PI));
}

#[test]
fn env_values_come_from_the_session() {
    let mut env = EnvNamespace::default();
    env.set("time", 2.5).unwrap();
    env.set("Bcount", 3.0).unwrap();
    let mut libraries = LibraryRegistry::standard();
    libraries.register(Box::new(env));
    let session = Session::new(libraries, Options::default());

    assert_eq!(session.run("return env.time * env.Bcount").unwrap(), Value::Num(7.5));
    assert_eq!(run("return env.time").unwrap(), Value::Num(0.0));
}

// ─── Runtime errors ──────────────────────────────────────────────────────────

#[test]
fn dynamic_index_out_of_range() {
    let e = eval_err("vec3 v = vec3(1, 2, 3)\nint i = 4\nreturn v[i]");
    assert_eq!(e.code, ErrorCode::R001);
    assert_eq!(e.stage, Stage::Evaluator);
    assert_eq!(e.line, 3);
}

#[test]
fn arithmetic_errors() {
    assert_eq!(eval_err("int z = 0\nreturn 1 // z").code, ErrorCode::R004);
    assert_eq!(eval_err("int e = -1\nreturn 2 ** e").code, ErrorCode::R004);
    assert_eq!(eval_err("int s = 64\nreturn 1 << s").code, ErrorCode::R004);
    assert_eq!(eval_err("num z = 0\nreturn 1 / z").code, ErrorCode::R004);
}

#[test]
fn uninitialized_read() {
    let e = eval_err("num x\nreturn x");
    assert_eq!(e.code, ErrorCode::R003);
    assert!(e.message.contains("`x`"));
}
