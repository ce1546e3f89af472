//! Indentation-sensitive tokenizer.
//!
//! A Python-like off-side rule using an explicit indent stack, tabs
//! rejected outright rather than expanded, and blank/comment-only lines
//! skipped before indentation is measured.

use crate::error::LexError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Int(i32),
    Name(String),
    True,
    False,
    None,
    If,
    Elif,
    Else,
    While,
    Print,
    And,
    Or,
    Not,
    Is,
    EqEq,
    NotEq,
    Plus,
    Minus,
    Assign,
    Colon,
    Comma,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Newline,
    Indent,
    Dedent,
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned {
    pub token: Token,
    pub line: u32,
}

/// Tokenizes `source` into a flat stream, already carrying synthetic
/// `Indent`/`Dedent`/`Newline` tokens at block boundaries.
pub fn lex(source: &str) -> Result<Vec<Spanned>, LexError> {
    let mut tokens = Vec::new();
    let mut indents: Vec<usize> = vec![0];
    let mut line_no: u32 = 0;

    // Tokenized line by line: simpler to reason about than a single
    // character-at-a-time state machine mixing indentation with expressions.
    for raw_line in source.split_inclusive('\n') {
        line_no += 1;
        let line = raw_line.trim_end_matches('\n').trim_end_matches('\r');

        if line.contains('\t') {
            return Err(LexError::Tab { line: line_no });
        }

        let trimmed = line.trim_start_matches(' ');
        let indent = line.len() - trimmed.len();

        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue; // blank/comment-only lines never affect indentation
        }

        if indent > *indents.last().unwrap() {
            indents.push(indent);
            tokens.push(Spanned { token: Token::Indent, line: line_no });
        } else {
            while indent < *indents.last().unwrap() {
                indents.pop();
                tokens.push(Spanned { token: Token::Dedent, line: line_no });
            }
            if indent != *indents.last().unwrap() {
                return Err(LexError::InconsistentIndent { line: line_no });
            }
        }

        lex_line(trimmed, line_no, &mut tokens)?;
        tokens.push(Spanned { token: Token::Newline, line: line_no });
    }

    while indents.len() > 1 {
        indents.pop();
        tokens.push(Spanned { token: Token::Dedent, line: line_no });
    }
    tokens.push(Spanned { token: Token::Eof, line: line_no });

    Ok(tokens)
}

fn lex_line(line: &str, line_no: u32, out: &mut Vec<Spanned>) -> Result<(), LexError> {
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' => i += 1,
            '#' => break,
            '(' => {
                out.push(Spanned { token: Token::LParen, line: line_no });
                i += 1;
            }
            ')' => {
                out.push(Spanned { token: Token::RParen, line: line_no });
                i += 1;
            }
            '[' => {
                out.push(Spanned { token: Token::LBracket, line: line_no });
                i += 1;
            }
            ']' => {
                out.push(Spanned { token: Token::RBracket, line: line_no });
                i += 1;
            }
            '{' => {
                out.push(Spanned { token: Token::LBrace, line: line_no });
                i += 1;
            }
            '}' => {
                out.push(Spanned { token: Token::RBrace, line: line_no });
                i += 1;
            }
            ',' => {
                out.push(Spanned { token: Token::Comma, line: line_no });
                i += 1;
            }
            ':' => {
                out.push(Spanned { token: Token::Colon, line: line_no });
                i += 1;
            }
            '+' => {
                out.push(Spanned { token: Token::Plus, line: line_no });
                i += 1;
            }
            '-' => {
                out.push(Spanned { token: Token::Minus, line: line_no });
                i += 1;
            }
            '=' => {
                if chars.get(i + 1) == Some(&'=') {
                    out.push(Spanned { token: Token::EqEq, line: line_no });
                    i += 2;
                } else {
                    out.push(Spanned { token: Token::Assign, line: line_no });
                    i += 1;
                }
            }
            '!' if chars.get(i + 1) == Some(&'=') => {
                out.push(Spanned { token: Token::NotEq, line: line_no });
                i += 2;
            }
            '0'..='9' => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let value: i32 = text.parse().map_err(|_| LexError::UnexpectedChar { line: line_no, ch: chars[start] })?;
                out.push(Spanned { token: Token::Int(value), line: line_no });
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                out.push(Spanned { token: keyword_or_name(word), line: line_no });
            }
            other => return Err(LexError::UnexpectedChar { line: line_no, ch: other }),
        }
    }
    Ok(())
}

fn keyword_or_name(word: String) -> Token {
    match word.as_str() {
        "True" => Token::True,
        "False" => Token::False,
        "None" => Token::None,
        "if" => Token::If,
        "elif" => Token::Elif,
        "else" => Token::Else,
        "while" => Token::While,
        "print" => Token::Print,
        "and" => Token::And,
        "or" => Token::Or,
        "not" => Token::Not,
        "is" => Token::Is,
        _ => Token::Name(word),
    }
}
