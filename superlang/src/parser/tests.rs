//! Parser tests: grammar selection, slot resolution and error reporting

use super::Parser;
use crate::ast::{BinOp, Literal, Node, Scope};
use crate::error::CompileError;
use crate::lexer::tokenize;
use crate::parser::parse;

/// Helper to parse a program and return its top-level scope
fn parse_program(source: &str) -> crate::Result<Scope> {
    let tokens = tokenize(source)?;
    parse(tokens)
}

/// Helper to parse and expect success
fn parse_ok(source: &str) -> Scope {
    parse_program(source).expect("Parse should succeed")
}

/// Helper to check if parsing fails
fn parse_fails(source: &str) -> bool {
    parse_program(source).is_err()
}

fn assign_value(node: &Node) -> &Node {
    match node {
        Node::Assign { value, .. } => &value.node,
        other => panic!("Expected Assign, got {}", other.kind()),
    }
}

// ============================================
// Literals and operators
// ============================================

#[test]
fn test_parse_int_declaration() {
    let scope = parse_ok("let x = 42;");
    assert_eq!(scope.statements.len(), 1);
    assert_eq!(scope.var_count, 1);
    match &scope.statements[0].node {
        Node::Assign {
            name,
            slot,
            declaration,
            value,
        } => {
            assert_eq!(name, "x");
            assert_eq!(*slot, 0);
            assert!(*declaration);
            assert!(matches!(value.node, Node::Literal(Literal::Int(42))));
        }
        other => panic!("Expected Assign, got {}", other.kind()),
    }
}

#[test]
fn test_parse_precedence() {
    let scope = parse_ok("let x = 1 + 2 * 3;");
    match assign_value(&scope.statements[0].node) {
        Node::BinaryOperation { op, left, right } => {
            assert_eq!(*op, BinOp::Add);
            assert!(matches!(left.node, Node::Literal(Literal::Int(1))));
            assert!(matches!(
                right.node,
                Node::BinaryOperation { op: BinOp::Mul, .. }
            ));
        }
        other => panic!("Expected BinaryOperation, got {}", other.kind()),
    }
}

#[test]
fn test_parse_left_associative_subtraction() {
    let scope = parse_ok("let x = 10 - 4 - 3;");
    match assign_value(&scope.statements[0].node) {
        Node::BinaryOperation { op, left, right } => {
            assert_eq!(*op, BinOp::Sub);
            assert!(matches!(left.node, Node::BinaryOperation { op: BinOp::Sub, .. }));
            assert!(matches!(right.node, Node::Literal(Literal::Int(3))));
        }
        other => panic!("Expected BinaryOperation, got {}", other.kind()),
    }
}

#[test]
fn test_parse_unary_minus_as_zero_minus() {
    let scope = parse_ok("let x = -5;");
    match assign_value(&scope.statements[0].node) {
        Node::BinaryOperation { op, left, right } => {
            assert_eq!(*op, BinOp::Sub);
            assert!(matches!(left.node, Node::Literal(Literal::Int(0))));
            assert!(matches!(right.node, Node::Literal(Literal::Int(5))));
        }
        other => panic!("Expected BinaryOperation, got {}", other.kind()),
    }
}

#[test]
fn test_parse_string_concatenation() {
    let scope = parse_ok(r#"let s = "a" + "b";"#);
    match assign_value(&scope.statements[0].node) {
        Node::BinaryOperation { op, left, .. } => {
            assert_eq!(*op, BinOp::Add);
            assert!(matches!(&left.node, Node::Literal(Literal::Str(s)) if s == "a"));
        }
        other => panic!("Expected BinaryOperation, got {}", other.kind()),
    }
}

#[test]
fn test_parse_comparison_of_arithmetic() {
    let scope = parse_ok("let b = 1 + 2 < 4;");
    match assign_value(&scope.statements[0].node) {
        Node::BinaryOperation { op, left, .. } => {
            assert_eq!(*op, BinOp::Lt);
            assert!(matches!(left.node, Node::BinaryOperation { op: BinOp::Add, .. }));
        }
        other => panic!("Expected BinaryOperation, got {}", other.kind()),
    }
}

#[test]
fn test_parse_string_comparison_operands() {
    let scope = parse_ok(r#"let b = "a" + "b" == "ab";"#);
    match assign_value(&scope.statements[0].node) {
        Node::BinaryOperation { op, left, right } => {
            assert_eq!(*op, BinOp::Eq);
            assert!(matches!(left.node, Node::BinaryOperation { op: BinOp::Add, .. }));
            assert!(matches!(&right.node, Node::Literal(Literal::Str(s)) if s == "ab"));
        }
        other => panic!("Expected BinaryOperation, got {}", other.kind()),
    }
}

#[test]
fn test_parse_bool_literal_declaration() {
    let scope = parse_ok("let t = true;");
    assert!(matches!(
        assign_value(&scope.statements[0].node),
        Node::Literal(Literal::Bool(true))
    ));
}

#[test]
fn test_parse_mixed_operands_are_left_to_run_time() {
    let scope = parse_ok(r#"let x = "a" + 1;"#);
    match assign_value(&scope.statements[0].node) {
        Node::BinaryOperation { op, left, right } => {
            assert_eq!(*op, BinOp::Add);
            assert!(matches!(&left.node, Node::Literal(Literal::Str(s)) if s == "a"));
            assert!(matches!(&right.node, Node::Literal(Literal::Int(1))));
        }
        other => panic!("Expected BinaryOperation, got {}", other.kind()),
    }
    assert!(!parse_fails(r#"let y = 1 + "a";"#));
    assert!(!parse_fails(r#"let z = "a" * 2;"#));
    assert!(!parse_fails("let b = true == 1 + true;"));
}

#[test]
fn test_parse_string_subtraction() {
    let scope = parse_ok(r#"let x = "a" - "b";"#);
    match assign_value(&scope.statements[0].node) {
        Node::BinaryOperation { op, left, right } => {
            assert_eq!(*op, BinOp::Sub);
            assert!(matches!(&left.node, Node::Literal(Literal::Str(s)) if s == "a"));
            assert!(matches!(&right.node, Node::Literal(Literal::Str(s)) if s == "b"));
        }
        other => panic!("Expected BinaryOperation, got {}", other.kind()),
    }
}

#[test]
fn test_parse_comparison_inside_call_argument() {
    let scope = parse_ok("fn f(b) { return 1; } let z = f(1 < 2) + 1;");
    match assign_value(&scope.statements[1].node) {
        Node::BinaryOperation { op, left, right } => {
            assert_eq!(*op, BinOp::Add);
            match &left.node {
                Node::Call { name, args, .. } => {
                    assert_eq!(name, "f");
                    assert!(matches!(
                        &args[0].node,
                        Node::BinaryOperation { op: BinOp::Lt, .. }
                    ));
                }
                other => panic!("Expected Call, got {}", other.kind()),
            }
            assert!(matches!(&right.node, Node::Literal(Literal::Int(1))));
        }
        other => panic!("Expected BinaryOperation, got {}", other.kind()),
    }
}

// ============================================
// Slot resolution
// ============================================

#[test]
fn test_parse_variable_resolves_to_declared_slot() {
    let scope = parse_ok("let a = 1; let b = 2; let c = a + b;");
    assert_eq!(scope.var_count, 3);
    match assign_value(&scope.statements[2].node) {
        Node::BinaryOperation { left, right, .. } => {
            assert!(matches!(&left.node, Node::Variable { name, slot: 0 } if name == "a"));
            assert!(matches!(&right.node, Node::Variable { name, slot: 1 } if name == "b"));
        }
        other => panic!("Expected BinaryOperation, got {}", other.kind()),
    }
}

#[test]
fn test_parse_declaration_sees_outer_binding_in_initializer() {
    let scope = parse_ok("let x = 1; { let x = x + 1; }");
    let Node::Scope(inner) = &scope.statements[1].node else {
        panic!("Expected Scope");
    };
    match &inner.statements[0].node {
        Node::Assign { slot, value, .. } => {
            assert_eq!(*slot, 1);
            match &value.node {
                Node::BinaryOperation { left, .. } => {
                    assert!(matches!(left.node, Node::Variable { slot: 0, .. }));
                }
                other => panic!("Expected BinaryOperation, got {}", other.kind()),
            }
        }
        other => panic!("Expected Assign, got {}", other.kind()),
    }
}

#[test]
fn test_parse_block_frame_descriptor() {
    let scope = parse_ok("let a = 1; { let b = 2; let c = 3; } { let d = 4; }");
    assert_eq!(scope.var_count, 1);
    let Node::Scope(first) = &scope.statements[1].node else {
        panic!("Expected Scope");
    };
    assert_eq!(first.slots(), 1..3);
    let Node::Scope(second) = &scope.statements[2].node else {
        panic!("Expected Scope");
    };
    assert_eq!(second.slots(), 1..2);
}

#[test]
fn test_parse_assignment_to_outer_variable() {
    let scope = parse_ok("let a = 1; { a = 2; }");
    let Node::Scope(inner) = &scope.statements[1].node else {
        panic!("Expected Scope");
    };
    assert!(matches!(
        &inner.statements[0].node,
        Node::Assign { slot: 0, declaration: false, .. }
    ));
    assert_eq!(inner.var_count, 0);
}

#[test]
fn test_parse_unresolved_identifier_suggests_name() {
    let err = parse_program("let count = 1; let y = cout + 1;").unwrap_err();
    assert!(matches!(err, CompileError::Resolve { .. }));
    assert!(err.message().contains("`cout`"));
    assert!(err.message().contains("count"));
}

#[test]
fn test_parse_assignment_to_undeclared_fails() {
    let err = parse_program("y = 1;").unwrap_err();
    assert!(matches!(err, CompileError::Resolve { .. }));
}

#[test]
fn test_parse_block_local_not_visible_after_block() {
    assert!(parse_fails("{ let a = 1; } let b = a;"));
}

// ============================================
// Functions
// ============================================

#[test]
fn test_parse_function_declaration_frame() {
    let scope = parse_ok("fn add(a, b) { let sum = a + b; return sum; }");
    assert_eq!(scope.var_count, 0);
    let Node::Function(def) = &scope.statements[0].node else {
        panic!("Expected Function");
    };
    assert_eq!(def.name.as_deref(), Some("add"));
    assert_eq!(def.params, vec!["a".to_string(), "b".to_string()]);
    assert_eq!((def.body.base, def.body.var_count), (2, 1));
    match &def.body.statements[1].node {
        Node::Return(Some(value)) => {
            assert!(matches!(value.node, Node::Variable { slot: 2, .. }));
        }
        other => panic!("Expected Return, got {}", other.kind()),
    }
}

#[test]
fn test_parse_function_body_cannot_see_caller_locals() {
    let err = parse_program("let outer = 1; fn f() { return outer; }").unwrap_err();
    assert!(matches!(err, CompileError::Resolve { .. }));
}

#[test]
fn test_parse_recursive_call_by_name() {
    let scope = parse_ok("fn f(n) { if (n > 0) { f(n - 1); } }");
    assert_eq!(scope.statements.len(), 1);
}

#[test]
fn test_parse_call_records_fallback_slot() {
    let scope = parse_ok("let g = fn(x) { return x; }; let y = g(1);");
    assert!(matches!(
        assign_value(&scope.statements[0].node),
        Node::FunctionLiteral(_)
    ));
    match assign_value(&scope.statements[1].node) {
        Node::Call { name, slot, args } => {
            assert_eq!(name, "g");
            assert_eq!(*slot, Some(0));
            assert_eq!(args.len(), 1);
        }
        other => panic!("Expected Call, got {}", other.kind()),
    }
}

#[test]
fn test_parse_call_to_unknown_name_has_no_slot() {
    let scope = parse_ok("print(1, \"a\");");
    match &scope.statements[0].node {
        Node::Call { name, slot, args } => {
            assert_eq!(name, "print");
            assert!(slot.is_none());
            assert_eq!(args.len(), 2);
        }
        other => panic!("Expected Call, got {}", other.kind()),
    }
}

#[test]
fn test_parse_function_literal_argument() {
    let scope = parse_ok("apply(fn(x) { return x * 2; }, 3);");
    match &scope.statements[0].node {
        Node::Call { args, .. } => {
            assert!(matches!(args[0].node, Node::FunctionLiteral(_)));
        }
        other => panic!("Expected Call, got {}", other.kind()),
    }
}

#[test]
fn test_parse_duplicate_parameter_fails() {
    let err = parse_program("fn f(a, a) { }").unwrap_err();
    assert!(err.message().contains("duplicate parameter"));
}

#[test]
fn test_parse_bare_return() {
    let scope = parse_ok("fn f() { return; }");
    let Node::Function(def) = &scope.statements[0].node else {
        panic!("Expected Function");
    };
    assert!(matches!(def.body.statements[0].node, Node::Return(None)));
}

// ============================================
// Control flow
// ============================================

#[test]
fn test_parse_if_else() {
    let scope = parse_ok("let x = 1; if (x < 2) { x = 3; } else { x = 4; }");
    match &scope.statements[1].node {
        Node::Branch {
            condition,
            then_scope,
            else_scope,
        } => {
            assert!(matches!(condition.node, Node::BinaryOperation { op: BinOp::Lt, .. }));
            assert_eq!(then_scope.statements.len(), 1);
            assert!(else_scope.is_some());
        }
        other => panic!("Expected Branch, got {}", other.kind()),
    }
}

#[test]
fn test_parse_else_if_chain() {
    let scope = parse_ok("let x = 1; if (x == 0) { } else if (x == 1) { } else { }");
    let Node::Branch { else_scope, .. } = &scope.statements[1].node else {
        panic!("Expected Branch");
    };
    let nested = else_scope.as_ref().expect("else scope");
    assert_eq!(nested.statements.len(), 1);
    assert!(matches!(
        nested.statements[0].node,
        Node::Branch { else_scope: Some(_), .. }
    ));
}

#[test]
fn test_parse_while_loop() {
    let scope = parse_ok("let i = 0; while (i < 3) { print(i); i = i + 1; }");
    match &scope.statements[1].node {
        Node::Loop { condition, body } => {
            assert!(matches!(condition.node, Node::BinaryOperation { op: BinOp::Lt, .. }));
            assert_eq!(body.statements.len(), 2);
        }
        other => panic!("Expected Loop, got {}", other.kind()),
    }
}

#[test]
fn test_parse_array_literal() {
    let scope = parse_ok(r#"let a = [1, "two", 3 < 4];"#);
    match assign_value(&scope.statements[0].node) {
        Node::ArrayLiteral(elements) => {
            assert_eq!(elements.len(), 3);
            assert!(matches!(elements[2].node, Node::BinaryOperation { op: BinOp::Lt, .. }));
        }
        other => panic!("Expected ArrayLiteral, got {}", other.kind()),
    }
}

#[test]
fn test_parse_stray_semicolons_are_skipped() {
    let scope = parse_ok(";; let x = 1;; { };");
    assert_eq!(scope.statements.len(), 2);
}

// ============================================
// Errors
// ============================================

#[test]
fn test_parse_missing_semicolon_reports_position() {
    let err = parse_program("let x = 1\nlet y = 2;").unwrap_err();
    assert!(matches!(err, CompileError::Parser { .. }));
    assert!(err.message().contains("expected `;`"));
    let span = err.span().expect("span");
    assert_eq!((span.line, span.column), (2, 1));
}

#[test]
fn test_parse_unexpected_closing_brace() {
    let err = parse_program("let x = 1; }").unwrap_err();
    assert!(err.message().contains("unexpected `}`"));
}

#[test]
fn test_parse_unterminated_block() {
    let err = parse_program("{ let x = 1;").unwrap_err();
    assert!(err.message().contains("end of input"));
}

#[test]
fn test_parse_expression_statement_rejected() {
    assert!(parse_fails("1 + 2;"));
}

// ============================================
// Incremental parsing
// ============================================

#[test]
fn test_incremental_parse_extends_top_level() {
    let mut parser = Parser::new();
    let first = parser.parse(tokenize("let a = 1;").unwrap()).unwrap();
    assert_eq!((first.base, first.var_count), (0, 1));

    let second = parser.parse(tokenize("let b = a + 1;").unwrap()).unwrap();
    assert_eq!((second.base, second.var_count), (1, 1));
    match assign_value(&second.statements[0].node) {
        Node::BinaryOperation { left, .. } => {
            assert!(matches!(left.node, Node::Variable { slot: 0, .. }));
        }
        other => panic!("Expected BinaryOperation, got {}", other.kind()),
    }
}

#[test]
fn test_incremental_parse_rolls_back_on_error() {
    let mut parser = Parser::new();
    parser.parse(tokenize("let a = 1;").unwrap()).unwrap();
    assert!(parser.parse(tokenize("let b = 2; let c = ;").unwrap()).is_err());
    assert!(parser.symbols().lookup("b").is_none());
    assert_eq!(parser.symbols().next_slot(), 1);

    let next = parser.parse(tokenize("let b = 3;").unwrap()).unwrap();
    assert_eq!(next.base, 1);
}
