//! Analyzer tests: one or more cases per diagnostic code, plus the success
//! paths of function instantiation and library lookup.

use crate::analysis::{self, Analysis};
use crate::analysis::scopes::{Instantiation, ROOT};
use crate::error::{Diagnostic, ErrorCode};
use crate::namespaces::LibraryRegistry;
use crate::syntax::ast::Statement;
use crate::syntax::lexer::Lexer;
use crate::syntax::parser::Parser;
use crate::types::Type;

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn parse(src: &str) -> Vec<Statement> {
    let tokens = Lexer::new(src).tokenize().expect("lex failed");
    Parser::new(tokens).parse().expect("parse failed")
}

fn analyze(src: &str) -> Result<Analysis, Vec<Diagnostic>> {
    analysis::analyze(&parse(src), &LibraryRegistry::standard())
}

fn analyze_ok(src: &str) -> Analysis {
    match analyze(src) {
        Ok(a) => a,
        Err(errs) => panic!("expected analysis to succeed, got {errs:#?}"),
    }
}

fn analyze_err(src: &str) -> Vec<Diagnostic> {
    match analyze(src) {
        Ok(_) => panic!("expected analysis to fail"),
        Err(e) => e,
    }
}

fn has_code(diags: &[Diagnostic], code: ErrorCode) -> bool {
    diags.iter().any(|d| d.code == code)
}

fn has_message(diags: &[Diagnostic], substr: &str) -> bool {
    diags.iter().any(|d| d.message.contains(substr))
}

// ─── Success paths ───────────────────────────────────────────────────────────

#[test]
fn root_result_type() {
    assert_eq!(analyze_ok("return 1 + 2").scopes.root().result, Some(Type::Int));
    assert_eq!(analyze_ok("return 2 + 1.5").scopes.root().result, Some(Type::Num));
    assert_eq!(analyze_ok("return 7 / 2").scopes.root().result, Some(Type::Num));
    assert_eq!(analyze_ok("return 7.5 // 2.0").scopes.root().result, Some(Type::Int));
}

#[test]
fn int_widens_into_num() {
    analyze_ok("num x = 1\nreturn x");
    analyze_ok("num x = 1\nx //= 2\nreturn x");
}

#[test]
fn shadowing_in_nested_block() {
    let a = analyze_ok("num x = 1\n{ vec2 x = vec2(1, 2); }\nreturn x");
    assert_eq!(a.scopes.len(), 2);
    assert_eq!(a.scopes.root().result, Some(Type::Num));
}

#[test]
fn call_site_instantiation() {
    let src = "fun erh(a, b) { return a * b; }\n\
               mat3 m = mat3(1,0,0, 0,1,0, 0,0,1)\n\
               vec3 v = vec3(1,2,3)\n\
               return erh(m, v)[2]";
    let a = analyze_ok(src);
    let (_, span) = a.scopes.lookup_fn(ROOT, "erh").unwrap();
    let sig = a.scopes.signature(span).unwrap();
    assert_eq!(sig.param_types, vec![Type::Mat3, Type::Vec3]);
    assert_eq!(sig.result, Some(Type::Vec3));
    assert_eq!(sig.state, Instantiation::Done);
    assert_eq!(a.scopes.root().result, Some(Type::Num));
}

#[test]
fn int_arguments_widen_into_num_parameters() {
    analyze_ok("fun f(a) => a * 2\nnum x = f(2.5)\nreturn f(1)");
    analyze_ok("return math.sqrt(16)");
}

#[test]
fn functions_see_their_declaring_scope() {
    analyze_ok("num k = 2\nfun f(a) => a * k\nreturn f(3)");
}

#[test]
fn zero_parameter_function_checked_without_call() {
    let a = analyze_ok("fun one() => 1\nreturn 2");
    let (_, span) = a.scopes.lookup_fn(ROOT, "one").unwrap();
    assert_eq!(a.scopes.signature(span).unwrap().result, Some(Type::Int));
}

#[test]
fn library_symbols_resolve_at_root() {
    let a = analyze_ok("num t = env.time\nreturn vec3.length(vec3(1, 2, 2)) + t + env.Bcount");
    assert_eq!(a.scopes.root().result, Some(Type::Num));
}

#[test]
fn increment_of_variable() {
    analyze_ok("int i = 1\nint j = ++i\nreturn j + i--");
}

#[test]
fn expression_types_are_recorded() {
    let statements = parse("return 2 * 1.5");
    let a = analysis::analyze(&statements, &LibraryRegistry::standard()).unwrap();
    let crate::syntax::ast::StmtKind::Return(expr) = &statements[0].kind else { panic!() };
    assert_eq!(a.scopes.type_at(expr.span), Some(Type::Num));
}

// ─── S001: undefined symbol ──────────────────────────────────────────────────

#[test]
fn s001_undefined_variable() {
    let errs = analyze_err("return y");
    assert!(has_code(&errs, ErrorCode::S001));
    assert!(has_message(&errs, "`y`"));
}

#[test]
fn s001_function_scoped_to_block() {
    let errs = analyze_err("{ fun f() => 1; }\nreturn f()");
    assert!(has_code(&errs, ErrorCode::S001));
    assert!(has_message(&errs, "undefined function"));
}

#[test]
fn s001_unknown_library_member() {
    assert!(has_code(&analyze_err("return env.speed"), ErrorCode::S001));
}

// ─── S002: type mismatch ─────────────────────────────────────────────────────

#[test]
fn s002_declaration_mismatch() {
    let errs = analyze_err("vec3 v = 1\nreturn 1");
    assert!(has_code(&errs, ErrorCode::S002));
    assert!(has_message(&errs, "vec3"));
}

#[test]
fn s002_num_does_not_narrow() {
    assert!(has_code(&analyze_err("int i = 1.5\nreturn i"), ErrorCode::S002));
    assert!(has_code(&analyze_err("int i = 1\ni += 1.5\nreturn i"), ErrorCode::S002));
}

#[test]
fn s002_num_argument_does_not_narrow_int_parameter() {
    let errs = analyze_err("fun f(a) => a * 2\nint x = f(1)\nreturn f(2.7)");
    assert!(has_code(&errs, ErrorCode::S002));
    assert!(has_message(&errs, "argument 1 of `f` expects int, found num"));
}

#[test]
fn s002_later_call_disagrees() {
    let errs = analyze_err("fun f(a) => a * 2\nvec3 v = f(vec3(1, 2, 3))\nreturn f(1)");
    assert!(has_code(&errs, ErrorCode::S002));
    assert!(has_message(&errs, "argument 1 of `f` expects vec3"));
}

#[test]
fn s002_library_argument() {
    let errs = analyze_err("return vec3.length(vec2(1, 2))");
    assert!(has_code(&errs, ErrorCode::S002));
}

#[test]
fn s002_non_int_index() {
    let errs = analyze_err("vec3 v = vec3(1, 2, 3)\nreturn v[1.5]");
    assert!(has_code(&errs, ErrorCode::S002));
    assert!(has_message(&errs, "index must be int"));
}

#[test]
fn s002_function_used_as_value() {
    let errs = analyze_err("fun f() => 1\nreturn f");
    assert!(has_message(&errs, "is a function"));
}

// ─── S003: redeclaration ─────────────────────────────────────────────────────

#[test]
fn s003_same_scope() {
    assert!(has_code(&analyze_err("num x = 1\nnum x = 2\nreturn x"), ErrorCode::S003));
    assert!(has_code(&analyze_err("num f = 1\nfun f() => 2\nreturn f"), ErrorCode::S003));
}

#[test]
fn s003_parameter_redeclared_in_body() {
    let errs = analyze_err("fun f(a) { num a = 1; return a; }\nreturn f(2)");
    assert!(has_code(&errs, ErrorCode::S003));
}

// ─── S004: argument count ────────────────────────────────────────────────────

#[test]
fn s004_local_function() {
    let errs = analyze_err("fun f(a, b) => a + b\nreturn f(1)");
    assert!(has_code(&errs, ErrorCode::S004));
    assert!(has_message(&errs, "takes 2 arguments, found 1"));
}

#[test]
fn s004_library_function() {
    assert!(has_code(&analyze_err("return math.sqrt(1, 2)"), ErrorCode::S004));
}

// ─── S005: operator undefined ────────────────────────────────────────────────

#[test]
fn s005_binary() {
    let errs = analyze_err("return true + 1");
    assert!(has_code(&errs, ErrorCode::S005));
    assert!(has_message(&errs, "bool and int"));
}

#[test]
fn s005_unary() {
    let errs = analyze_err("bool b = true\nbool c = -b\nreturn 1");
    assert!(has_code(&errs, ErrorCode::S005));
}

#[test]
fn s005_compound_assignment() {
    let errs = analyze_err("vec3 v = vec3(1, 2, 3)\nv += true\nreturn 1");
    assert!(has_code(&errs, ErrorCode::S005));
}

// ─── S006: constructor ───────────────────────────────────────────────────────

#[test]
fn s006_no_matching_signature() {
    let errs = analyze_err("vec3 v = vec3(1, 2)\nreturn 1");
    assert!(has_code(&errs, ErrorCode::S006));
    assert!(has_message(&errs, "(int, int)"));
}

// ─── S007: index ─────────────────────────────────────────────────────────────

#[test]
fn s007_literal_out_of_range() {
    let decl = "vec3 v = vec3(1, 2, 3)\n";
    analyze_ok(&format!("{decl}return v[1] + v[3]"));
    assert!(has_code(&analyze_err(&format!("{decl}return v[0]")), ErrorCode::S007));
    assert!(has_code(&analyze_err(&format!("{decl}return v[4]")), ErrorCode::S007));
    assert!(has_code(&analyze_err(&format!("{decl}return v[-1]")), ErrorCode::S007));
    assert!(has_code(&analyze_err(&format!("{decl}v[4] = 1\nreturn 1")), ErrorCode::S007));
}

#[test]
fn s007_scalar_not_indexable() {
    let errs = analyze_err("int i = 2\nreturn i[1]");
    assert!(has_code(&errs, ErrorCode::S007));
    assert!(has_message(&errs, "cannot be indexed"));
}

// ─── S008–S011: returns ──────────────────────────────────────────────────────

#[test]
fn s008_second_return() {
    let errs = analyze_err("return 1\nreturn 2");
    assert!(has_code(&errs, ErrorCode::S008));
}

#[test]
fn s009_root_without_return() {
    let errs = analyze_err("num x = 1");
    assert!(has_code(&errs, ErrorCode::S009));
    assert!(has_message(&errs, "root scope must have a return"));
}

#[test]
fn s009_function_without_return() {
    let errs = analyze_err("fun f() { num a = 1; }\nreturn 1");
    assert!(has_code(&errs, ErrorCode::S009));
    assert!(has_message(&errs, "`f` must have a return"));
}

#[test]
fn s010_return_in_block() {
    let errs = analyze_err("{ return 1; }\nreturn 2");
    assert!(has_code(&errs, ErrorCode::S010));
}

#[test]
fn s011_non_numeric_root() {
    let errs = analyze_err("return true");
    assert!(has_code(&errs, ErrorCode::S011));
    assert!(has_message(&errs, "int or num"));
    assert!(has_code(&analyze_err("return vec2(1, 2)"), ErrorCode::S011));
}

// ─── S012–S016 ───────────────────────────────────────────────────────────────

#[test]
fn s012_shadowing_library() {
    assert!(has_code(&analyze_err("num env.posX = 1\nreturn 1"), ErrorCode::S012));
    assert!(has_code(&analyze_err("fun math.sqrt(a) => a\nreturn 1"), ErrorCode::S012));
}

#[test]
fn s013_step_needs_variable() {
    let errs = analyze_err("return 1++");
    assert!(has_code(&errs, ErrorCode::S013));
}

#[test]
fn s014_duplicate_parameter() {
    let errs = analyze_err("fun f(a, a) => a\nreturn f(1, 2)");
    assert!(has_code(&errs, ErrorCode::S014));
}

#[test]
fn s015_recursion() {
    assert!(has_code(&analyze_err("fun f(a) => f(a)\nreturn f(1)"), ErrorCode::S015));
}

#[test]
fn s016_library_field_is_read_only() {
    assert!(has_code(&analyze_err("env.posX = 1\nreturn 1"), ErrorCode::S016));
    assert!(has_code(&analyze_err("return env.time++"), ErrorCode::S016));
}

// ─── Warnings ────────────────────────────────────────────────────────────────

#[test]
fn w001_uncalled_function_with_parameters() {
    let a = analyze_ok("fun f(a) => a\nreturn 1");
    assert!(has_code(&a.warnings, ErrorCode::W001));
}

#[test]
fn w002_unreachable_statement() {
    let a = analyze_ok("return 1\nnum x = 2\n# note\nx = 3");
    assert_eq!(a.warnings.iter().filter(|w| w.code == ErrorCode::W002).count(), 1);
}
