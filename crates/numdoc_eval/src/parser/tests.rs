use pretty_assertions::assert_eq;

use super::*;

fn parse(source: &str) -> Vec<Stmt> {
    parse_program(source).unwrap()
}

fn name(n: &str) -> Expr {
    Expr::Name(n.to_string())
}

fn boxed(expr: Expr) -> Box<Expr> {
    Box::new(expr)
}

fn syntax_message(source: &str) -> String {
    let err = parse_program(source).unwrap_err();
    assert_eq!(err.kind, "SyntaxError");
    err.message
}

// === Simple statements ===

#[test]
fn assignment_chain_binds_every_target() {
    assert_eq!(
        parse("a = b = 1"),
        vec![Stmt::Assign(
            vec![Target::Name("a".into()), Target::Name("b".into())],
            Expr::Int(1)
        )]
    );
}

#[test]
fn tuple_assignment_unpacks() {
    assert_eq!(
        parse("x, y = 1, 2"),
        vec![Stmt::Assign(
            vec![Target::Unpack(vec![
                Target::Name("x".into()),
                Target::Name("y".into())
            ])],
            Expr::Tuple(vec![Expr::Int(1), Expr::Int(2)])
        )]
    );
}

#[test]
fn augmented_assignment_to_subscript() {
    assert_eq!(
        parse("xs[0] += 2"),
        vec![Stmt::AugAssign(
            Target::Index(name("xs"), Expr::Int(0)),
            BinaryOp::Add,
            Expr::Int(2)
        )]
    );
}

#[test]
fn semicolons_separate_statements() {
    assert_eq!(parse("pass; x").len(), 2);
    assert_eq!(parse("x;").len(), 1);
}

#[test]
fn imports_with_aliases() {
    assert_eq!(
        parse("import numpy as np\nfrom math import pi, e as euler"),
        vec![
            Stmt::Import {
                module: "numpy".into(),
                alias: Some("np".into()),
            },
            Stmt::FromImport {
                module: "math".into(),
                names: vec![("pi".into(), None), ("e".into(), Some("euler".into()))],
            },
        ]
    );
}

// === Compound statements ===

#[test]
fn for_suite_follows_indentation() {
    let stmts = parse("for i in range(3):\n    x = i\n    print(x)\nprint('done')");
    assert_eq!(stmts.len(), 2);
    let Stmt::For { target, body, .. } = &stmts[0] else {
        panic!("expected a for loop, got {:?}", stmts[0]);
    };
    assert_eq!(*target, Target::Name("i".into()));
    assert_eq!(body.len(), 2);
}

#[test]
fn for_with_inline_body_and_unpacking() {
    let stmts = parse("for k, v in pairs: total += v");
    let Stmt::For { target, body, .. } = &stmts[0] else {
        panic!("expected a for loop");
    };
    assert_eq!(
        *target,
        Target::Unpack(vec![Target::Name("k".into()), Target::Name("v".into())])
    );
    assert_eq!(body.len(), 1);
}

#[test]
fn if_elif_else_chain() {
    let stmts = parse("if x < 0:\n    s = -1\nelif x == 0:\n    s = 0\nelse:\n    s = 1");
    assert_eq!(stmts.len(), 1);
    let Stmt::If {
        branches,
        otherwise,
    } = &stmts[0]
    else {
        panic!("expected an if statement");
    };
    assert_eq!(branches.len(), 2);
    assert_eq!(otherwise.len(), 1);
}

#[test]
fn nested_blocks_dedent_to_the_right_level() {
    let stmts = parse("for i in xs:\n    if i:\n        y = i\n    z = i\nw = 0");
    assert_eq!(stmts.len(), 2);
    let Stmt::For { body, .. } = &stmts[0] else {
        panic!("expected a for loop");
    };
    assert_eq!(body.len(), 2);
}

#[test]
fn def_with_defaults() {
    let stmts = parse("def scale(x, factor=2.0):\n    return x * factor");
    let Stmt::Def(def) = &stmts[0] else {
        panic!("expected a function definition");
    };
    assert_eq!(def.name, "scale");
    assert_eq!(def.params, vec!["x".to_string(), "factor".to_string()]);
    assert_eq!(def.defaults, vec![None, Some(Expr::Float(2.0))]);
    assert_eq!(
        def.body,
        vec![Stmt::Return(Some(Expr::Binary(
            BinaryOp::Mul,
            boxed(name("x")),
            boxed(name("factor"))
        )))]
    );
}

// === Expressions ===

#[test]
fn power_binds_tighter_than_unary_minus() {
    assert_eq!(
        parse("-2 ** 2"),
        vec![Stmt::Expr(Expr::Unary(
            UnaryOp::Neg,
            boxed(Expr::Binary(BinaryOp::Pow, boxed(Expr::Int(2)), boxed(Expr::Int(2))))
        ))]
    );
}

#[test]
fn chained_comparison_expands_to_and() {
    assert_eq!(
        parse("0 < x <= 1"),
        vec![Stmt::Expr(Expr::And(
            boxed(Expr::Compare(CompareOp::Lt, boxed(Expr::Int(0)), boxed(name("x")))),
            boxed(Expr::Compare(CompareOp::LtEq, boxed(name("x")), boxed(Expr::Int(1))))
        ))]
    );
}

#[test]
fn not_in_and_is_not() {
    assert_eq!(
        parse("a not in b"),
        vec![Stmt::Expr(Expr::Compare(CompareOp::NotIn, boxed(name("a")), boxed(name("b"))))]
    );
    assert_eq!(
        parse("a is not None"),
        vec![Stmt::Expr(Expr::Compare(CompareOp::IsNot, boxed(name("a")), boxed(Expr::None)))]
    );
}

#[test]
fn list_comprehension_with_condition() {
    assert_eq!(
        parse("[i * i for i in xs if i]"),
        vec![Stmt::Expr(Expr::ListComp {
            element: boxed(Expr::Binary(BinaryOp::Mul, boxed(name("i")), boxed(name("i")))),
            target: Box::new(Target::Name("i".into())),
            iter: boxed(name("xs")),
            condition: Some(boxed(name("i"))),
        })]
    );
}

#[test]
fn slices_and_multi_dimensional_indexes() {
    assert_eq!(
        parse("a[1:]"),
        vec![Stmt::Expr(Expr::Index(
            boxed(name("a")),
            boxed(Expr::Slice {
                start: Some(boxed(Expr::Int(1))),
                stop: None,
                step: None,
            })
        ))]
    );
    assert_eq!(
        parse("m[0, ::2]"),
        vec![Stmt::Expr(Expr::Index(
            boxed(name("m")),
            boxed(Expr::Tuple(vec![
                Expr::Int(0),
                Expr::Slice {
                    start: None,
                    stop: None,
                    step: Some(boxed(Expr::Int(2))),
                }
            ]))
        ))]
    );
}

#[test]
fn call_with_keyword_arguments() {
    assert_eq!(
        parse("np.round(x, decimals=2)"),
        vec![Stmt::Expr(Expr::Call {
            callee: boxed(Expr::Attr(boxed(name("np")), "round".into())),
            args: vec![name("x")],
            kwargs: vec![("decimals".into(), Expr::Int(2))],
        })]
    );
}

#[test]
fn conditional_expression() {
    assert_eq!(
        parse("1 if x else 2"),
        vec![Stmt::Expr(Expr::IfElse {
            condition: boxed(name("x")),
            then: boxed(Expr::Int(1)),
            otherwise: boxed(Expr::Int(2)),
        })]
    );
}

#[test]
fn displays_and_single_element_tuple() {
    assert_eq!(
        parse("(1,)"),
        vec![Stmt::Expr(Expr::Tuple(vec![Expr::Int(1)]))]
    );
    assert_eq!(
        parse("{'a': [1, 2]}"),
        vec![Stmt::Expr(Expr::Dict(vec![(
            Expr::Str("a".into()),
            Expr::List(vec![Expr::Int(1), Expr::Int(2)])
        )]))]
    );
    assert_eq!(parse("'ab' 'cd'"), vec![Stmt::Expr(Expr::Str("abcd".into()))]);
}

#[test]
fn bracketed_expression_spans_lines() {
    assert_eq!(
        parse("[1,\n 2]"),
        vec![Stmt::Expr(Expr::List(vec![Expr::Int(1), Expr::Int(2)]))]
    );
}

// === Errors ===

#[test]
fn unexpected_indent() {
    assert_eq!(syntax_message("x = 1\n    y = 2"), "unexpected indent");
}

#[test]
fn missing_colon() {
    assert!(syntax_message("for i in xs\n    pass").contains("`:`"));
}

#[test]
fn missing_block() {
    assert_eq!(syntax_message("if x:\n"), "expected an indented block");
    assert_eq!(syntax_message("if x:\ny = 1"), "expected an indented block");
}

#[test]
fn positional_after_keyword() {
    assert_eq!(
        syntax_message("f(a=1, 2)"),
        "positional argument follows keyword argument"
    );
}

#[test]
fn cannot_assign_to_literal() {
    assert_eq!(syntax_message("1 = x"), "cannot assign to expression");
}

#[test]
fn trailing_garbage_is_rejected() {
    assert!(parse_program("x y").is_err());
    assert!(parse_program("print(").is_err());
}

#[test]
fn deep_nesting_is_a_syntax_error() {
    let brackets = format!("{}{}", "[".repeat(100_000), "]".repeat(100_000));
    assert_eq!(syntax_message(&brackets), "too many nested expressions");
    let signs = format!("{}1", "-".repeat(100_000));
    assert_eq!(syntax_message(&signs), "too many nested expressions");
    let sum = vec!["1"; 100_000].join(" + ");
    assert_eq!(syntax_message(&sum), "too many nested expressions");
}

#[test]
fn moderate_nesting_parses() {
    let brackets = format!("{}{}", "[".repeat(50), "]".repeat(50));
    assert_eq!(parse(&brackets).len(), 1);
    let sum = vec!["1"; 150].join(" + ");
    assert_eq!(parse(&sum).len(), 1);
    // Sibling items do not add up.
    let items = vec!["[[1]]"; 500].join(", ");
    assert_eq!(parse(&format!("[{items}]")).len(), 1);
}
