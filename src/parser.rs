use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::{
    error::ParseError,
    impls::{
        class::{Class, Method},
        ops::Comparator,
    },
    lexer::Lexer,
    syntax::{
        expr::{Expr, Literal},
        stmt::Stmt,
        token::Token,
    },
};

type Result<T> = std::result::Result<T, ParseError>;

/// Recursive-descent parser over the lexer cursor. Produces a `Compound`
/// root.
///
/// Class names are tracked while parsing: a name becomes instantiable as
/// soon as its `class` header is seen (so methods may construct their own
/// class), while parent lookups need the finished class object.
pub struct Parser {
    lexer: Lexer,
    classes: HashMap<String, Rc<Class>>,
    class_names: HashSet<String>,
}

impl Parser {
    pub fn new(lexer: Lexer) -> Self {
        Self {
            lexer,
            classes: HashMap::new(),
            class_names: HashSet::new(),
        }
    }

    pub fn parse(mut self) -> Result<Stmt> {
        let mut statements = Vec::new();
        while *self.lexer.current_token() != Token::Eof {
            statements.push(self.statement()?);
        }
        Ok(Stmt::Compound { statements })
    }

    fn statement(&mut self) -> Result<Stmt> {
        match self.lexer.current_token() {
            Token::Class => self.class_definition(),
            Token::If => self.if_statement(),
            Token::Print => self.print_statement(),
            Token::Return => self.return_statement(),
            _ => self.simple_statement(),
        }
    }

    fn class_definition(&mut self) -> Result<Stmt> {
        let name = self.lexer.expect_next_id()?.to_string();
        self.lexer.next_token();

        let parent = if *self.lexer.current_token() == Token::Char('(') {
            let parent_name = self.lexer.expect_next_id()?.to_string();
            self.lexer.expect_next(&Token::Char(')'))?;
            self.lexer.next_token();
            match self.classes.get(&parent_name) {
                Some(class) => Some(Rc::clone(class)),
                None => return Err(ParseError::UndefinedClass(parent_name)),
            }
        } else {
            None
        };

        self.lexer.expect(&Token::Char(':'))?;
        self.lexer.expect_next(&Token::Newline)?;
        self.lexer.expect_next(&Token::Indent)?;
        self.lexer.next_token();

        self.class_names.insert(name.clone());

        let mut methods = Vec::new();
        while *self.lexer.current_token() == Token::Def {
            methods.push(self.method_definition()?);
        }
        self.lexer.expect(&Token::Dedent)?;
        self.lexer.next_token();

        let class = Rc::new(Class::new(name.clone(), methods, parent));
        self.classes.insert(name, Rc::clone(&class));
        Ok(Stmt::ClassDefinition { class })
    }

    fn method_definition(&mut self) -> Result<Method> {
        let name = self.lexer.expect_next_id()?.to_string();
        self.lexer.expect_next(&Token::Char('('))?;
        self.lexer.next_token();

        let mut formal_params = Vec::new();
        if let Token::Id(param) = self.lexer.current_token() {
            formal_params.push(param.clone());
            self.lexer.next_token();
            while *self.lexer.current_token() == Token::Char(',') {
                formal_params.push(self.lexer.expect_next_id()?.to_string());
                self.lexer.next_token();
            }
        }
        self.lexer.expect(&Token::Char(')'))?;
        self.lexer.expect_next(&Token::Char(':'))?;
        self.lexer.next_token();

        let body = self.suite()?;
        Ok(Method {
            name,
            formal_params,
            body: Rc::new(Stmt::MethodBody {
                body: Box::new(body),
            }),
        })
    }

    // A block: newline, indent, statements, dedent.
    fn suite(&mut self) -> Result<Stmt> {
        self.lexer.expect(&Token::Newline)?;
        self.lexer.expect_next(&Token::Indent)?;
        self.lexer.next_token();

        let mut statements = Vec::new();
        while *self.lexer.current_token() != Token::Dedent {
            statements.push(self.statement()?);
        }
        self.lexer.next_token();
        Ok(Stmt::Compound { statements })
    }

    fn if_statement(&mut self) -> Result<Stmt> {
        self.lexer.next_token();
        let condition = self.expression()?;
        self.lexer.expect(&Token::Char(':'))?;
        self.lexer.next_token();
        let then_branch = Box::new(self.suite()?);

        let else_branch = if *self.lexer.current_token() == Token::Else {
            self.lexer.expect_next(&Token::Char(':'))?;
            self.lexer.next_token();
            Some(Box::new(self.suite()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn print_statement(&mut self) -> Result<Stmt> {
        self.lexer.next_token();
        let mut args = Vec::new();
        if *self.lexer.current_token() != Token::Newline {
            args.push(self.expression()?);
            while *self.lexer.current_token() == Token::Char(',') {
                self.lexer.next_token();
                args.push(self.expression()?);
            }
        }
        self.end_of_line()?;
        Ok(Stmt::Print { args })
    }

    fn return_statement(&mut self) -> Result<Stmt> {
        self.lexer.next_token();
        let value = if *self.lexer.current_token() == Token::Newline {
            Expr::Literal {
                value: Literal::None,
            }
        } else {
            self.expression()?
        };
        self.end_of_line()?;
        Ok(Stmt::Return { value })
    }

    fn simple_statement(&mut self) -> Result<Stmt> {
        let expr = self.expression()?;
        let statement = if *self.lexer.current_token() == Token::Char('=') {
            self.lexer.next_token();
            let value = self.expression()?;
            assignment_target(expr, value)?
        } else {
            Stmt::Expression(expr)
        };
        self.end_of_line()?;
        Ok(statement)
    }

    fn end_of_line(&mut self) -> Result<()> {
        self.lexer.expect(&Token::Newline)?;
        self.lexer.next_token();
        Ok(())
    }

    fn expression(&mut self) -> Result<Expr> {
        self.or_test()
    }

    fn or_test(&mut self) -> Result<Expr> {
        let mut expr = self.and_test()?;
        while *self.lexer.current_token() == Token::Or {
            self.lexer.next_token();
            let right = self.and_test()?;
            expr = Expr::Or {
                left: Box::new(expr),
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn and_test(&mut self) -> Result<Expr> {
        let mut expr = self.not_test()?;
        while *self.lexer.current_token() == Token::And {
            self.lexer.next_token();
            let right = self.not_test()?;
            expr = Expr::And {
                left: Box::new(expr),
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn not_test(&mut self) -> Result<Expr> {
        if *self.lexer.current_token() == Token::Not {
            self.lexer.next_token();
            let value = self.not_test()?;
            return Ok(Expr::Not {
                value: Box::new(value),
            });
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr> {
        let expr = self.term()?;
        let cmp = match self.lexer.current_token() {
            Token::Eq => Comparator::Equal,
            Token::NotEq => Comparator::NotEqual,
            Token::LessOrEq => Comparator::LessOrEqual,
            Token::GreaterOrEq => Comparator::GreaterOrEqual,
            Token::Char('<') => Comparator::Less,
            Token::Char('>') => Comparator::Greater,
            _ => return Ok(expr),
        };
        self.lexer.next_token();
        let right = self.term()?;
        Ok(Expr::Comparison {
            cmp,
            left: Box::new(expr),
            right: Box::new(right),
        })
    }

    fn term(&mut self) -> Result<Expr> {
        let mut expr = self.factor()?;
        loop {
            match self.lexer.current_token() {
                Token::Char('+') => {
                    self.lexer.next_token();
                    let right = self.factor()?;
                    expr = Expr::Add {
                        left: Box::new(expr),
                        right: Box::new(right),
                    };
                }
                Token::Char('-') => {
                    self.lexer.next_token();
                    let right = self.factor()?;
                    expr = Expr::Sub {
                        left: Box::new(expr),
                        right: Box::new(right),
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    fn factor(&mut self) -> Result<Expr> {
        let mut expr = self.unary()?;
        loop {
            match self.lexer.current_token() {
                Token::Char('*') => {
                    self.lexer.next_token();
                    let right = self.unary()?;
                    expr = Expr::Mult {
                        left: Box::new(expr),
                        right: Box::new(right),
                    };
                }
                Token::Char('/') => {
                    self.lexer.next_token();
                    let right = self.unary()?;
                    expr = Expr::Div {
                        left: Box::new(expr),
                        right: Box::new(right),
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    fn unary(&mut self) -> Result<Expr> {
        if *self.lexer.current_token() == Token::Char('-') {
            self.lexer.next_token();
            let value = self.unary()?;
            return Ok(Expr::Sub {
                left: Box::new(Expr::Literal {
                    value: Literal::Number(0),
                }),
                right: Box::new(value),
            });
        }
        self.postfix()
    }

    // Method calls chain onto any primary result, so `B().hi()` works.
    fn postfix(&mut self) -> Result<Expr> {
        let mut expr = self.primary()?;
        while *self.lexer.current_token() == Token::Char('.') {
            let method = self.lexer.expect_next_id()?.to_string();
            self.lexer.expect_next(&Token::Char('('))?;
            self.lexer.next_token();
            let args = self.arguments()?;
            expr = Expr::MethodCall {
                object: Box::new(expr),
                method,
                args,
            };
        }
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr> {
        let token = self.lexer.current_token().clone();
        match token {
            Token::Number(value) => {
                self.lexer.next_token();
                Ok(Expr::Literal {
                    value: Literal::Number(value),
                })
            }
            Token::String(value) => {
                self.lexer.next_token();
                Ok(Expr::Literal {
                    value: Literal::String(value),
                })
            }
            Token::True => {
                self.lexer.next_token();
                Ok(Expr::Literal {
                    value: Literal::Bool(true),
                })
            }
            Token::False => {
                self.lexer.next_token();
                Ok(Expr::Literal {
                    value: Literal::Bool(false),
                })
            }
            Token::None => {
                self.lexer.next_token();
                Ok(Expr::Literal {
                    value: Literal::None,
                })
            }
            Token::Char('(') => {
                self.lexer.next_token();
                let expr = self.expression()?;
                self.lexer.expect(&Token::Char(')'))?;
                self.lexer.next_token();
                Ok(expr)
            }
            Token::Id(name) => self.name_expression(name),
            other => Err(ParseError::UnexpectedToken {
                expected: "expression".to_string(),
                found: other.to_string(),
            }),
        }
    }

    // An identifier opens a dotted chain, a call on it, the `str` built-in,
    // or a plain variable reference.
    fn name_expression(&mut self, first: String) -> Result<Expr> {
        self.lexer.next_token();

        if first == "str" && *self.lexer.current_token() == Token::Char('(') {
            self.lexer.next_token();
            let value = self.expression()?;
            self.lexer.expect(&Token::Char(')'))?;
            self.lexer.next_token();
            return Ok(Expr::Stringify {
                value: Box::new(value),
            });
        }

        let mut rest = Vec::new();
        while *self.lexer.current_token() == Token::Char('.') {
            rest.push(self.lexer.expect_next_id()?.to_string());
            self.lexer.next_token();
        }

        if *self.lexer.current_token() == Token::Char('(') {
            self.lexer.next_token();
            let args = self.arguments()?;
            return match rest.pop() {
                Some(method) => {
                    let mut ids = vec![first];
                    ids.extend(rest);
                    Ok(Expr::MethodCall {
                        object: Box::new(Expr::Variable { ids }),
                        method,
                        args,
                    })
                }
                None if self.class_names.contains(&first) => Ok(Expr::NewInstance {
                    class_name: first,
                    args,
                }),
                None => Err(ParseError::UndefinedClass(first)),
            };
        }

        let mut ids = vec![first];
        ids.extend(rest);
        Ok(Expr::Variable { ids })
    }

    // The caller has consumed the opening parenthesis.
    fn arguments(&mut self) -> Result<Vec<Expr>> {
        let mut args = Vec::new();
        if *self.lexer.current_token() != Token::Char(')') {
            args.push(self.expression()?);
            while *self.lexer.current_token() == Token::Char(',') {
                self.lexer.next_token();
                args.push(self.expression()?);
            }
        }
        self.lexer.expect(&Token::Char(')'))?;
        self.lexer.next_token();
        Ok(args)
    }
}

fn assignment_target(target: Expr, value: Expr) -> Result<Stmt> {
    match target {
        Expr::Variable { mut ids } => match ids.pop() {
            Some(name) if ids.is_empty() => Ok(Stmt::Assignment { name, value }),
            Some(field) => Ok(Stmt::FieldAssignment {
                object: Expr::Variable { ids },
                field,
                value,
            }),
            None => Err(ParseError::InvalidAssignmentTarget),
        },
        _ => Err(ParseError::InvalidAssignmentTarget),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Result<Stmt> {
        let lexer = Lexer::new(source.as_bytes()).map_err(ParseError::from)?;
        Parser::new(lexer).parse()
    }

    fn parse_statements(source: &str) -> Vec<Stmt> {
        match parse(source) {
            Ok(Stmt::Compound { statements }) => statements,
            Ok(other) => panic!("expected a compound root, got {other:?}"),
            Err(error) => panic!("parse failed: {error}"),
        }
    }

    #[test]
    fn assignment_and_field_assignment_targets() {
        let statements = parse_statements("x = 1\np.x = 2\n");
        assert!(matches!(&statements[0], Stmt::Assignment { name, .. } if name == "x"));
        assert!(matches!(
            &statements[1],
            Stmt::FieldAssignment { field, object: Expr::Variable { ids }, .. }
                if field == "x" && ids == &["p".to_string()]
        ));
    }

    #[test]
    fn literal_assignment_target_is_rejected() {
        assert!(matches!(
            parse("1 = 2\n"),
            Err(ParseError::InvalidAssignmentTarget)
        ));
    }

    #[test]
    fn dotted_chain_without_call_is_a_variable() {
        let statements = parse_statements("print a.b.c\n");
        match &statements[0] {
            Stmt::Print { args } => {
                assert!(matches!(&args[0], Expr::Variable { ids } if ids.len() == 3));
            }
            other => panic!("expected print, got {other:?}"),
        }
    }

    #[test]
    fn class_definition_collects_methods_and_params() {
        let statements = parse_statements(
            "class Point:\n  def __init__(self, x, y):\n    self.x = x\n    self.y = y\n",
        );
        match &statements[0] {
            Stmt::ClassDefinition { class } => {
                assert_eq!(class.name(), "Point");
                // `self` counts as a formal but not toward the arity.
                assert!(class.has_method("__init__", 2));
                assert!(!class.has_method("__init__", 3));
            }
            other => panic!("expected a class definition, got {other:?}"),
        }
    }

    #[test]
    fn parent_must_be_defined_first() {
        assert!(matches!(
            parse("class B(A):\n  def hi(self):\n    return 1\n"),
            Err(ParseError::UndefinedClass(name)) if name == "A"
        ));

        let statements = parse_statements(
            "class A:\n  def hi(self):\n    return 1\nclass B(A):\n  def lo(self):\n    return 2\n",
        );
        match &statements[1] {
            Stmt::ClassDefinition { class } => {
                assert!(class.has_method("hi", 0));
                assert!(class.has_method("lo", 0));
            }
            other => panic!("expected a class definition, got {other:?}"),
        }
    }

    #[test]
    fn instantiating_an_unknown_class_is_a_parse_error() {
        assert!(matches!(
            parse("p = Point(1, 2)\n"),
            Err(ParseError::UndefinedClass(name)) if name == "Point"
        ));
    }

    #[test]
    fn methods_may_instantiate_their_own_class() {
        let statements = parse_statements(
            "class Vec:\n  def double(self):\n    return Vec()\n",
        );
        assert!(matches!(&statements[0], Stmt::ClassDefinition { .. }));
    }

    #[test]
    fn if_else_builds_both_suites() {
        let statements = parse_statements("if 1 < 2:\n  print 1\nelse:\n  print 2\n");
        match &statements[0] {
            Stmt::If {
                condition,
                else_branch,
                ..
            } => {
                assert!(matches!(
                    condition,
                    Expr::Comparison {
                        cmp: Comparator::Less,
                        ..
                    }
                ));
                assert!(else_branch.is_some());
            }
            other => panic!("expected an if, got {other:?}"),
        }
    }

    #[test]
    fn str_builtin_parses_to_stringify() {
        let statements = parse_statements("print str(42)\n");
        match &statements[0] {
            Stmt::Print { args } => assert!(matches!(&args[0], Expr::Stringify { .. })),
            other => panic!("expected print, got {other:?}"),
        }
    }

    #[test]
    fn method_calls_chain_on_call_results() {
        let statements = parse_statements(
            "class B:\n  def hi(self):\n    return 1\nprint B().hi()\n",
        );
        match &statements[1] {
            Stmt::Print { args } => match &args[0] {
                Expr::MethodCall { object, method, .. } => {
                    assert_eq!(method, "hi");
                    assert!(matches!(object.as_ref(), Expr::NewInstance { .. }));
                }
                other => panic!("expected a method call, got {other:?}"),
            },
            other => panic!("expected print, got {other:?}"),
        }
    }

    #[test]
    fn unary_minus_desugars_to_subtraction() {
        let statements = parse_statements("x = -5\n");
        match &statements[0] {
            Stmt::Assignment { value, .. } => match value {
                Expr::Sub { left, .. } => assert!(matches!(
                    left.as_ref(),
                    Expr::Literal {
                        value: Literal::Number(0)
                    }
                )),
                other => panic!("expected a subtraction, got {other:?}"),
            },
            other => panic!("expected an assignment, got {other:?}"),
        }
    }

    #[test]
    fn precedence_nests_factors_under_terms() {
        let statements = parse_statements("x = 1 + 2 * 3\n");
        match &statements[0] {
            Stmt::Assignment { value, .. } => match value {
                Expr::Add { right, .. } => assert!(matches!(right.as_ref(), Expr::Mult { .. })),
                other => panic!("expected an addition, got {other:?}"),
            },
            other => panic!("expected an assignment, got {other:?}"),
        }
    }

    #[test]
    fn bare_return_yields_the_none_literal() {
        let statements = parse_statements(
            "class A:\n  def f(self):\n    return\n",
        );
        match &statements[0] {
            Stmt::ClassDefinition { .. } => {}
            other => panic!("expected a class definition, got {other:?}"),
        }
    }

    #[test]
    fn missing_newline_is_reported_through_expect() {
        assert!(matches!(
            parse("print (1\n"),
            Err(ParseError::Lexer(crate::error::LexerError::Expectation { .. }))
        ));
    }
}
