// ABOUTME: Recursive-descent statement parser with precedence-climbing expressions

use crate::ast::{BinaryOp, Block, Expr, Stmt, UnaryOp};
use crate::error::KuzurError;
use crate::lexer::Lexer;
use crate::token::TokenKind;
use std::rc::Rc;

/// Minimum precedence handed to operands of prefix operators; higher than
/// every binary operator so unary binds tightest.
const UNARY_PRECEDENCE: u8 = 7;

/// Lex and parse a complete source text into the top-level block.
pub fn parse(source: &str) -> Result<Block, KuzurError> {
    let lexer = Lexer::new(source)?;
    Parser::new(lexer).parse()
}

pub struct Parser {
    lexer: Lexer,
}

impl Parser {
    pub fn new(lexer: Lexer) -> Self {
        Parser { lexer }
    }

    /// Parse the whole token stream into the program's top-level block.
    pub fn parse(mut self) -> Result<Block, KuzurError> {
        let mut statements = Vec::new();
        while self.lexer.peek().kind != TokenKind::Eof {
            if self.skip_separator() {
                continue;
            }
            statements.push(self.statement()?);
        }
        Ok(Block { statements })
    }

    /// Statement separation is structural; stray `;` tokens between
    /// statements are tolerated and skipped.
    fn skip_separator(&mut self) -> bool {
        if self.lexer.peek().is_op(";") {
            self.lexer.next();
            return true;
        }
        false
    }

    fn statement(&mut self) -> Result<Stmt, KuzurError> {
        match self.lexer.peek().kind {
            TokenKind::If => self.if_stmt(),
            TokenKind::While => self.while_stmt(),
            TokenKind::For => self.for_stmt(),
            TokenKind::Do => self.do_while_stmt(),
            TokenKind::Func => self.func_def(),
            TokenKind::Return => {
                self.lexer.next();
                let expr = if self.at_statement_end() {
                    None
                } else {
                    Some(self.expression(0)?)
                };
                Ok(Stmt::Return(expr))
            }
            TokenKind::Break => {
                self.lexer.next();
                Ok(Stmt::Break)
            }
            TokenKind::Continue => {
                self.lexer.next();
                Ok(Stmt::Continue)
            }
            TokenKind::Ident if self.lexer.peek_ahead(1).is_op("=") => {
                let name = self.lexer.next().value;
                self.expect_op("=")?;
                let expr = self.expression(0)?;
                Ok(Stmt::Assign { name, expr })
            }
            _ => Ok(Stmt::Expr(self.expression(0)?)),
        }
    }

    fn at_statement_end(&self) -> bool {
        let tok = self.lexer.peek();
        tok.kind == TokenKind::Eof || tok.is_op("}") || tok.is_op(";")
    }

    fn block(&mut self) -> Result<Block, KuzurError> {
        self.expect_op("{")?;
        let mut statements = Vec::new();
        while !self.lexer.peek().is_op("}") {
            if self.lexer.peek().kind == TokenKind::Eof {
                let pos = self.lexer.peek().pos;
                return Err(KuzurError::syntax("expected '}' before end of input", pos));
            }
            if self.skip_separator() {
                continue;
            }
            statements.push(self.statement()?);
        }
        self.lexer.next(); // consume '}'
        Ok(Block { statements })
    }

    fn if_stmt(&mut self) -> Result<Stmt, KuzurError> {
        self.lexer.expect(TokenKind::If)?;
        let mut branches = Vec::new();
        branches.push(self.condition_and_block()?);

        while self.lexer.eat(&[TokenKind::Elif]).is_some() {
            branches.push(self.condition_and_block()?);
        }

        let else_block = if self.lexer.eat(&[TokenKind::Else]).is_some() {
            Some(self.block()?)
        } else {
            None
        };

        Ok(Stmt::If {
            branches,
            else_block,
        })
    }

    fn condition_and_block(&mut self) -> Result<(Expr, Block), KuzurError> {
        self.expect_op("(")?;
        let cond = self.expression(0)?;
        self.expect_op(")")?;
        let block = self.block()?;
        Ok((cond, block))
    }

    fn while_stmt(&mut self) -> Result<Stmt, KuzurError> {
        self.lexer.expect(TokenKind::While)?;
        let (cond, body) = self.condition_and_block()?;
        Ok(Stmt::While { cond, body })
    }

    fn for_stmt(&mut self) -> Result<Stmt, KuzurError> {
        self.lexer.expect(TokenKind::For)?;
        self.expect_op("(")?;
        let var = self.lexer.expect(TokenKind::Ident)?.value;
        self.expect_op("=")?;
        let start = self.expression(0)?;
        self.expect_op(";")?;
        let end = self.expression(0)?;
        self.expect_op(")")?;
        let body = self.block()?;
        Ok(Stmt::For {
            var,
            start,
            end,
            body,
        })
    }

    fn do_while_stmt(&mut self) -> Result<Stmt, KuzurError> {
        self.lexer.expect(TokenKind::Do)?;
        let body = self.block()?;
        self.lexer.expect(TokenKind::While)?;
        self.expect_op("(")?;
        let cond = self.expression(0)?;
        self.expect_op(")")?;
        Ok(Stmt::DoWhile { body, cond })
    }

    fn func_def(&mut self) -> Result<Stmt, KuzurError> {
        self.lexer.expect(TokenKind::Func)?;
        let name = self.lexer.expect(TokenKind::Ident)?.value;
        self.expect_op("(")?;
        let mut params = Vec::new();
        if !self.lexer.peek().is_op(")") {
            loop {
                params.push(self.lexer.expect(TokenKind::Ident)?.value);
                if self.lexer.peek().is_op(",") {
                    self.lexer.next();
                    continue;
                }
                break;
            }
        }
        self.expect_op(")")?;
        let body = self.block()?;
        Ok(Stmt::FuncDef {
            name,
            params,
            body: Rc::new(body),
        })
    }

    /// Precedence-climbing expression parser: parse a primary (with any
    /// prefix operator), then fold in postfix calls and binary operators
    /// binding tighter than `min_prec`.
    fn expression(&mut self, min_prec: u8) -> Result<Expr, KuzurError> {
        let tok = self.lexer.next();
        let mut left = match tok.kind {
            TokenKind::Number => {
                let value = tok.value.parse::<f64>().map_err(|_| {
                    KuzurError::syntax(format!("invalid number literal '{}'", tok.value), tok.pos)
                })?;
                Expr::Number(value)
            }
            TokenKind::Str => Expr::Str(tok.value),
            TokenKind::True => Expr::Bool(true),
            TokenKind::False => Expr::Bool(false),
            TokenKind::Ident => Expr::Var(tok.value),
            TokenKind::Op if tok.value == "(" => {
                let inner = self.expression(0)?;
                self.expect_op(")")?;
                inner
            }
            TokenKind::Op => match UnaryOp::from_lexeme(&tok.value) {
                Some(op) => {
                    let operand = self.expression(UNARY_PRECEDENCE)?;
                    Expr::Unary {
                        op,
                        operand: Box::new(operand),
                    }
                }
                None => {
                    return Err(KuzurError::syntax(
                        format!("unexpected {}", tok.describe()),
                        tok.pos,
                    ));
                }
            },
            _ => {
                return Err(KuzurError::syntax(
                    format!("unexpected {}", tok.describe()),
                    tok.pos,
                ));
            }
        };

        loop {
            if self.lexer.peek().is_op("(") {
                self.lexer.next();
                let args = self.arguments()?;
                left = Expr::Call {
                    callee: Box::new(left),
                    args,
                };
                continue;
            }

            let op = {
                let next = self.lexer.peek();
                if next.kind == TokenKind::Op {
                    BinaryOp::from_lexeme(&next.value)
                } else {
                    None
                }
            };
            let Some(op) = op else { break };
            if op.precedence() <= min_prec {
                break;
            }
            self.lexer.next();
            let right = self.expression(op.precedence())?;
            left = Expr::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Comma-separated call arguments up to and including the closing paren.
    fn arguments(&mut self) -> Result<Vec<Expr>, KuzurError> {
        let mut args = Vec::new();
        if !self.lexer.peek().is_op(")") {
            loop {
                args.push(self.expression(0)?);
                if self.lexer.peek().is_op(",") {
                    self.lexer.next();
                    continue;
                }
                break;
            }
        }
        self.expect_op(")")?;
        Ok(args)
    }

    fn expect_op(&mut self, op: &str) -> Result<(), KuzurError> {
        let tok = self.lexer.next();
        if !tok.is_op(op) {
            return Err(KuzurError::syntax(
                format!("expected '{}', found {}", op, tok.describe()),
                tok.pos,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(source: &str) -> Stmt {
        let mut block = parse(source).expect("parses cleanly");
        assert_eq!(block.statements.len(), 1, "expected a single statement");
        block.statements.remove(0)
    }

    fn parse_expr(source: &str) -> Expr {
        match parse_one(source) {
            Stmt::Expr(expr) => expr,
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_program() {
        let block = parse("").unwrap();
        assert!(block.statements.is_empty());
    }

    #[test]
    fn test_multiplication_binds_tighter_than_addition() {
        // 2 + 3 * 4 parses as 2 + (3 * 4)
        match parse_expr("2 + 3 * 4") {
            Expr::Binary { left, op, right } => {
                assert_eq!(op, BinaryOp::Add);
                assert_eq!(*left, Expr::Number(2.0));
                match *right {
                    Expr::Binary { op, .. } => assert_eq!(op, BinaryOp::Mul),
                    other => panic!("expected nested multiply, got {:?}", other),
                }
            }
            other => panic!("expected binary expression, got {:?}", other),
        }
    }

    #[test]
    fn test_parentheses_override_precedence() {
        // (2 + 3) * 4 parses as (2 + 3) * 4
        match parse_expr("(2 + 3) * 4") {
            Expr::Binary { left, op, right } => {
                assert_eq!(op, BinaryOp::Mul);
                assert_eq!(*right, Expr::Number(4.0));
                match *left {
                    Expr::Binary { op, .. } => assert_eq!(op, BinaryOp::Add),
                    other => panic!("expected nested add, got {:?}", other),
                }
            }
            other => panic!("expected binary expression, got {:?}", other),
        }
    }

    #[test]
    fn test_left_associativity() {
        // 10 - 4 - 3 parses as (10 - 4) - 3
        match parse_expr("10 - 4 - 3") {
            Expr::Binary { left, op, right } => {
                assert_eq!(op, BinaryOp::Sub);
                assert_eq!(*right, Expr::Number(3.0));
                assert!(matches!(
                    *left,
                    Expr::Binary {
                        op: BinaryOp::Sub,
                        ..
                    }
                ));
            }
            other => panic!("expected binary expression, got {:?}", other),
        }
    }

    #[test]
    fn test_logical_operators_lowest_precedence() {
        // a == 1 && b == 2 parses as (a == 1) && (b == 2)
        match parse_expr("a == 1 && b == 2") {
            Expr::Binary { left, op, right } => {
                assert_eq!(op, BinaryOp::And);
                assert!(matches!(*left, Expr::Binary { op: BinaryOp::Eq, .. }));
                assert!(matches!(*right, Expr::Binary { op: BinaryOp::Eq, .. }));
            }
            other => panic!("expected binary expression, got {:?}", other),
        }
    }

    #[test]
    fn test_unary_binds_tighter_than_binary() {
        // -x * y parses as (-x) * y
        match parse_expr("-x * y") {
            Expr::Binary { left, op, .. } => {
                assert_eq!(op, BinaryOp::Mul);
                assert!(matches!(
                    *left,
                    Expr::Unary {
                        op: UnaryOp::Neg,
                        ..
                    }
                ));
            }
            other => panic!("expected binary expression, got {:?}", other),
        }
    }

    #[test]
    fn test_call_with_arguments() {
        match parse_expr("f(1, x, \"s\")") {
            Expr::Call { callee, args } => {
                assert_eq!(*callee, Expr::Var("f".to_string()));
                assert_eq!(args.len(), 3);
                assert_eq!(args[0], Expr::Number(1.0));
                assert_eq!(args[1], Expr::Var("x".to_string()));
                assert_eq!(args[2], Expr::Str("s".to_string()));
            }
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_calls_chain_left_to_right() {
        // f(1)(2) parses as (f(1))(2)
        match parse_expr("f(1)(2)") {
            Expr::Call { callee, args } => {
                assert_eq!(args, vec![Expr::Number(2.0)]);
                assert!(matches!(*callee, Expr::Call { .. }));
            }
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_argument_call() {
        match parse_expr("f()") {
            Expr::Call { args, .. } => assert!(args.is_empty()),
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_assignment_requires_one_token_lookahead() {
        assert!(matches!(parse_one("x = 1"), Stmt::Assign { .. }));
        // `x == 1` is an expression statement, not an assignment
        assert!(matches!(parse_one("x == 1"), Stmt::Expr(_)));
    }

    #[test]
    fn test_if_elif_else() {
        match parse_one("if (a) { b() } elif (c) { d() } elif (e) { f() } else { g() }") {
            Stmt::If {
                branches,
                else_block,
            } => {
                assert_eq!(branches.len(), 3);
                assert!(else_block.is_some());
            }
            other => panic!("expected if statement, got {:?}", other),
        }
    }

    #[test]
    fn test_if_without_else() {
        match parse_one("if (a) { b() }") {
            Stmt::If {
                branches,
                else_block,
            } => {
                assert_eq!(branches.len(), 1);
                assert!(else_block.is_none());
            }
            other => panic!("expected if statement, got {:?}", other),
        }
    }

    #[test]
    fn test_while_loop() {
        match parse_one("while (i < 10) { i = i + 1 }") {
            Stmt::While { body, .. } => assert_eq!(body.statements.len(), 1),
            other => panic!("expected while statement, got {:?}", other),
        }
    }

    #[test]
    fn test_for_loop() {
        match parse_one("for (i = 1; 10) { print(i) }") {
            Stmt::For {
                var, start, end, ..
            } => {
                assert_eq!(var, "i");
                assert_eq!(start, Expr::Number(1.0));
                assert_eq!(end, Expr::Number(10.0));
            }
            other => panic!("expected for statement, got {:?}", other),
        }
    }

    #[test]
    fn test_do_while_loop() {
        match parse_one("do { x = x - 1 } while (x > 0)") {
            Stmt::DoWhile { body, .. } => assert_eq!(body.statements.len(), 1),
            other => panic!("expected do-while statement, got {:?}", other),
        }
    }

    #[test]
    fn test_func_def() {
        match parse_one("func add(a, b) { return a + b }") {
            Stmt::FuncDef { name, params, body } => {
                assert_eq!(name, "add");
                assert_eq!(params, vec!["a".to_string(), "b".to_string()]);
                assert_eq!(body.statements.len(), 1);
            }
            other => panic!("expected function definition, got {:?}", other),
        }
    }

    #[test]
    fn test_func_def_no_params() {
        match parse_one("func f() { }") {
            Stmt::FuncDef { params, body, .. } => {
                assert!(params.is_empty());
                assert!(body.statements.is_empty());
            }
            other => panic!("expected function definition, got {:?}", other),
        }
    }

    #[test]
    fn test_return_forms() {
        let block = parse("func f() { return }\nfunc g() { return 1 }").unwrap();
        let bodies: Vec<_> = block
            .statements
            .iter()
            .map(|s| match s {
                Stmt::FuncDef { body, .. } => &body.statements[0],
                other => panic!("expected function definition, got {:?}", other),
            })
            .collect();
        assert_eq!(*bodies[0], Stmt::Return(None));
        assert_eq!(*bodies[1], Stmt::Return(Some(Expr::Number(1.0))));
    }

    #[test]
    fn test_break_and_continue() {
        let block = parse("while (x) { break }\nwhile (x) { continue }").unwrap();
        match (&block.statements[0], &block.statements[1]) {
            (Stmt::While { body: a, .. }, Stmt::While { body: b, .. }) => {
                assert_eq!(a.statements[0], Stmt::Break);
                assert_eq!(b.statements[0], Stmt::Continue);
            }
            other => panic!("expected while statements, got {:?}", other),
        }
    }

    #[test]
    fn test_semicolons_between_statements_are_skipped() {
        let block = parse("a = 1; b = 2; print(a + b)").unwrap();
        assert_eq!(block.statements.len(), 3);
    }

    #[test]
    fn test_statements_separated_by_newlines() {
        let block = parse("a = 1\nb = 2\nprint(a + b)").unwrap();
        assert_eq!(block.statements.len(), 3);
    }

    #[test]
    fn test_unexpected_token_reports_position() {
        match parse("x = ) + 1") {
            Err(KuzurError::Syntax { pos, .. }) => assert_eq!(pos, 4),
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_unclosed_block_fails() {
        assert!(matches!(
            parse("while (x) { y = 1"),
            Err(KuzurError::Syntax { .. })
        ));
    }

    #[test]
    fn test_missing_paren_fails() {
        assert!(matches!(
            parse("if x { y() }"),
            Err(KuzurError::Syntax { .. })
        ));
    }
}
