//! Recursive-descent parser: token stream to [`SurfaceModule`].
//!
//! Precedence climbs `or` < `and` < `not` < comparison < `+` < unary `-`
//! < postfix subscript/call < atom, over an `if`/`elif`/`else`/`while`
//! block grammar.

use crate::{
    ast::surface::{CompareOp, SurfaceExpr, SurfaceModule, SurfaceStmt},
    error::ParseError,
    frontend::lexer::{Spanned, Token},
};

pub fn parse(tokens: &[Spanned]) -> Result<SurfaceModule, ParseError> {
    let mut p = Parser { tokens, pos: 0 };
    let body = p.block_items_until_eof()?;
    Ok(SurfaceModule { body })
}

struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos].token
    }

    fn line(&self) -> u32 {
        self.tokens[self.pos].line
    }

    fn advance(&mut self) -> Token {
        let t = self.tokens[self.pos].token.clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    fn expect(&mut self, want: &Token, expected: &'static str) -> Result<(), ParseError> {
        if self.peek() == want {
            self.advance();
            Ok(())
        } else {
            Err(ParseError::UnexpectedToken { line: self.line(), found: format!("{:?}", self.peek()), expected })
        }
    }

    fn skip_newlines(&mut self) {
        while matches!(self.peek(), Token::Newline) {
            self.advance();
        }
    }

    fn block_items_until_eof(&mut self) -> Result<Vec<SurfaceStmt>, ParseError> {
        let mut out = Vec::new();
        self.skip_newlines();
        while !matches!(self.peek(), Token::Eof) {
            out.push(self.stmt()?);
            self.skip_newlines();
        }
        Ok(out)
    }

    /// `INDENT stmt+ DEDENT`.
    fn block(&mut self) -> Result<Vec<SurfaceStmt>, ParseError> {
        let line = self.line();
        self.expect(&Token::Indent, "an indented block")?;
        let mut out = Vec::new();
        loop {
            self.skip_newlines();
            if matches!(self.peek(), Token::Dedent) {
                break;
            }
            out.push(self.stmt()?);
        }
        self.expect(&Token::Dedent, "dedent")?;
        if out.is_empty() {
            return Err(ParseError::EmptyBlock { line });
        }
        Ok(out)
    }

    fn stmt(&mut self) -> Result<SurfaceStmt, ParseError> {
        match self.peek().clone() {
            Token::If => self.if_stmt(),
            Token::While => self.while_stmt(),
            Token::Print => {
                self.advance();
                let e = self.expr()?;
                self.end_of_stmt()?;
                Ok(SurfaceStmt::Printnl(e))
            }
            Token::Name(name) => {
                // Lookahead to distinguish `name = expr`, `name[...] = expr`,
                // and a bare expression statement.
                let save = self.pos;
                self.advance();
                if matches!(self.peek(), Token::Assign) {
                    self.advance();
                    let rhs = self.expr()?;
                    self.end_of_stmt()?;
                    return Ok(SurfaceStmt::Assign(name, rhs));
                }
                self.pos = save;
                let expr = self.expr()?;
                if matches!(self.peek(), Token::Assign) {
                    if let SurfaceExpr::Subscript(target, index) = expr {
                        self.advance();
                        let value = self.expr()?;
                        self.end_of_stmt()?;
                        return Ok(SurfaceStmt::SubscriptAssign(*target, *index, value));
                    }
                    return Err(ParseError::UnexpectedToken { line: self.line(), found: "=".to_string(), expected: "a subscript target" });
                }
                self.end_of_stmt()?;
                Ok(SurfaceStmt::Discard(expr))
            }
            _ => {
                let expr = self.expr()?;
                self.end_of_stmt()?;
                Ok(SurfaceStmt::Discard(expr))
            }
        }
    }

    fn end_of_stmt(&mut self) -> Result<(), ParseError> {
        if matches!(self.peek(), Token::Newline | Token::Eof | Token::Dedent) {
            if matches!(self.peek(), Token::Newline) {
                self.advance();
            }
            Ok(())
        } else {
            Err(ParseError::UnexpectedToken { line: self.line(), found: format!("{:?}", self.peek()), expected: "end of statement" })
        }
    }

    fn if_stmt(&mut self) -> Result<SurfaceStmt, ParseError> {
        self.advance(); // `if`
        let test = self.expr()?;
        self.expect(&Token::Colon, "':'")?;
        self.expect(&Token::Newline, "newline")?;
        let then = self.block()?;

        let mut elifs = Vec::new();
        while matches!(self.peek(), Token::Elif) {
            self.advance();
            let elif_test = self.expr()?;
            self.expect(&Token::Colon, "':'")?;
            self.expect(&Token::Newline, "newline")?;
            elifs.push((elif_test, self.block()?));
        }

        let or_else = if matches!(self.peek(), Token::Else) {
            self.advance();
            self.expect(&Token::Colon, "':'")?;
            self.expect(&Token::Newline, "newline")?;
            self.block()?
        } else {
            Vec::new()
        };

        Ok(SurfaceStmt::If { test, then, elifs, or_else })
    }

    fn while_stmt(&mut self) -> Result<SurfaceStmt, ParseError> {
        self.advance(); // `while`
        let test = self.expr()?;
        self.expect(&Token::Colon, "':'")?;
        self.expect(&Token::Newline, "newline")?;
        let body = self.block()?;
        Ok(SurfaceStmt::While { test, body })
    }

    fn expr(&mut self) -> Result<SurfaceExpr, ParseError> {
        let cond = self.or_expr()?;
        if matches!(self.peek(), Token::If) {
            self.advance();
            let test = self.or_expr()?;
            self.expect(&Token::Else, "'else'")?;
            let or_else = self.expr()?;
            return Ok(SurfaceExpr::IfExp(Box::new(test), Box::new(cond), Box::new(or_else)));
        }
        Ok(cond)
    }

    fn or_expr(&mut self) -> Result<SurfaceExpr, ParseError> {
        let mut lhs = self.and_expr()?;
        while matches!(self.peek(), Token::Or) {
            self.advance();
            let rhs = self.and_expr()?;
            lhs = SurfaceExpr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> Result<SurfaceExpr, ParseError> {
        let mut lhs = self.not_expr()?;
        while matches!(self.peek(), Token::And) {
            self.advance();
            let rhs = self.not_expr()?;
            lhs = SurfaceExpr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn not_expr(&mut self) -> Result<SurfaceExpr, ParseError> {
        if matches!(self.peek(), Token::Not) {
            self.advance();
            return Ok(SurfaceExpr::Not(Box::new(self.not_expr()?)));
        }
        self.compare_expr()
    }

    fn compare_expr(&mut self) -> Result<SurfaceExpr, ParseError> {
        let lhs = self.add_expr()?;
        let op = match self.peek() {
            Token::EqEq => CompareOp::Eq,
            Token::NotEq => CompareOp::NotEq,
            Token::Is => CompareOp::Is,
            _ => return Ok(lhs),
        };
        self.advance();
        let rhs = self.add_expr()?;
        Ok(SurfaceExpr::Compare(op, Box::new(lhs), Box::new(rhs)))
    }

    fn add_expr(&mut self) -> Result<SurfaceExpr, ParseError> {
        let mut lhs = self.unary_expr()?;
        while matches!(self.peek(), Token::Plus) {
            self.advance();
            let rhs = self.unary_expr()?;
            lhs = SurfaceExpr::Add(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary_expr(&mut self) -> Result<SurfaceExpr, ParseError> {
        if matches!(self.peek(), Token::Minus) {
            self.advance();
            return Ok(SurfaceExpr::UnarySub(Box::new(self.unary_expr()?)));
        }
        self.postfix_expr()
    }

    fn postfix_expr(&mut self) -> Result<SurfaceExpr, ParseError> {
        let mut e = self.atom()?;
        while matches!(self.peek(), Token::LBracket) {
            self.advance();
            let index = self.expr()?;
            self.expect(&Token::RBracket, "']'")?;
            e = SurfaceExpr::Subscript(Box::new(e), Box::new(index));
        }
        Ok(e)
    }

    fn atom(&mut self) -> Result<SurfaceExpr, ParseError> {
        match self.advance() {
            Token::Int(v) => Ok(SurfaceExpr::ConstInt(v)),
            Token::True => Ok(SurfaceExpr::ConstBool(true)),
            Token::False => Ok(SurfaceExpr::ConstBool(false)),
            Token::None => Ok(SurfaceExpr::ConstNone),
            Token::LParen => {
                let e = self.expr()?;
                self.expect(&Token::RParen, "')'")?;
                Ok(e)
            }
            Token::LBracket => {
                let mut items = Vec::new();
                if !matches!(self.peek(), Token::RBracket) {
                    items.push(self.expr()?);
                    while matches!(self.peek(), Token::Comma) {
                        self.advance();
                        items.push(self.expr()?);
                    }
                }
                self.expect(&Token::RBracket, "']'")?;
                Ok(SurfaceExpr::List(items))
            }
            Token::LBrace => {
                let mut items = Vec::new();
                if !matches!(self.peek(), Token::RBrace) {
                    items.push(self.dict_entry()?);
                    while matches!(self.peek(), Token::Comma) {
                        self.advance();
                        items.push(self.dict_entry()?);
                    }
                }
                self.expect(&Token::RBrace, "'}'")?;
                Ok(SurfaceExpr::Dict(items))
            }
            Token::Name(name) => {
                if matches!(self.peek(), Token::LParen) {
                    self.advance();
                    let mut args = Vec::new();
                    if !matches!(self.peek(), Token::RParen) {
                        args.push(self.expr()?);
                        while matches!(self.peek(), Token::Comma) {
                            self.advance();
                            args.push(self.expr()?);
                        }
                    }
                    self.expect(&Token::RParen, "')'")?;
                    Ok(SurfaceExpr::CallFunc(name, args))
                } else {
                    Ok(SurfaceExpr::Name(name))
                }
            }
            other => Err(ParseError::UnexpectedToken { line: self.line(), found: format!("{other:?}"), expected: "an expression" }),
        }
    }

    fn dict_entry(&mut self) -> Result<(SurfaceExpr, SurfaceExpr), ParseError> {
        let key = self.expr()?;
        self.expect(&Token::Colon, "':'")?;
        let value = self.expr()?;
        Ok((key, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::lexer::lex;

    fn parse_src(src: &str) -> SurfaceModule {
        parse(&lex(src).unwrap()).unwrap()
    }

    #[test]
    fn assignment_parses_to_a_single_stmt() {
        let m = parse_src("x = 1 + 2\n");
        assert_eq!(m.body.len(), 1);
        assert!(matches!(m.body[0], SurfaceStmt::Assign(..)));
    }

    #[test]
    fn if_elif_else_chain() {
        let m = parse_src("if a:\n  x = 1\nelif b:\n  x = 2\nelse:\n  x = 3\n");
        let SurfaceStmt::If { elifs, or_else, .. } = &m.body[0] else { panic!("expected If") };
        assert_eq!(elifs.len(), 1);
        assert!(!or_else.is_empty());
    }

    #[test]
    fn subscript_assignment() {
        let m = parse_src("a[0] = 1\n");
        assert!(matches!(m.body[0], SurfaceStmt::SubscriptAssign(..)));
    }

    #[test]
    fn ternary_and_boolean_ops() {
        let m = parse_src("x = 1 if a and not b else 2\n");
        let SurfaceStmt::Assign(_, SurfaceExpr::IfExp(test, ..)) = &m.body[0] else { panic!("expected ternary") };
        assert!(matches!(**test, SurfaceExpr::And(..)));
    }

    #[test]
    fn empty_block_is_rejected() {
        let err = parse(&lex("if a:\nx = 1\n").unwrap()).unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
    }
}
