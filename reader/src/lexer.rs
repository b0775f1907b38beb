// Byte-level tokenizer for the textual IR.

/// A single token of the textual IR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Keywords, mnemonics, type names, and block labels.
    Ident(String),
    /// `%NN`
    Var(usize),
    /// Integer literal; `-` is part of the literal.
    Int(i64),
    At,
    Colon,
    Comma,
    Equals,
    Arrow,
    LParen,
    RParen,
    LBrace,
    RBrace,
}

/// Tokenize `input`, pairing every token with its 1-based line number.
/// `;` starts a comment that runs to the end of the line.
pub fn lex(input: &str) -> Result<Vec<(Token, usize)>, String> {
    Lexer::new(input).tokenize()
}

struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
    line: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
            line: 1,
        }
    }

    fn tokenize(&mut self) -> Result<Vec<(Token, usize)>, String> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace_and_comments();
            if self.pos >= self.input.len() {
                break;
            }
            let line = self.line;
            let token = self.next_token()?;
            tokens.push((token, line));
        }
        Ok(tokens)
    }

    fn skip_whitespace_and_comments(&mut self) {
        while self.pos < self.input.len() {
            match self.input[self.pos] {
                b'\n' => {
                    self.line += 1;
                    self.pos += 1;
                }
                b' ' | b'\t' | b'\r' => self.pos += 1,
                b';' => {
                    while self.pos < self.input.len() && self.input[self.pos] != b'\n' {
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, String> {
        match self.input[self.pos] {
            b'@' => self.punct(Token::At),
            b':' => self.punct(Token::Colon),
            b',' => self.punct(Token::Comma),
            b'=' => self.punct(Token::Equals),
            b'(' => self.punct(Token::LParen),
            b')' => self.punct(Token::RParen),
            b'{' => self.punct(Token::LBrace),
            b'}' => self.punct(Token::RBrace),
            b'-' => {
                if self.peek_at(1) == Some(b'>') {
                    self.pos += 2;
                    Ok(Token::Arrow)
                } else if self.peek_at(1).is_some_and(|b| b.is_ascii_digit()) {
                    self.lex_int()
                } else {
                    Err(format!("line {}: stray '-'", self.line))
                }
            }
            b'%' => self.lex_var(),
            b'0'..=b'9' => self.lex_int(),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => Ok(self.lex_ident()),
            other => Err(format!(
                "line {}: unexpected character '{}'",
                self.line,
                char::from(other)
            )),
        }
    }

    fn punct(&mut self, token: Token) -> Result<Token, String> {
        self.pos += 1;
        Ok(token)
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn lex_var(&mut self) -> Result<Token, String> {
        self.pos += 1;
        let start = self.pos;
        while self.pos < self.input.len() && self.input[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(format!("line {}: expected a number after '%'", self.line));
        }
        let digits = std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| format!("line {}: malformed input", self.line))?;
        let id = digits
            .parse::<usize>()
            .map_err(|_| format!("line {}: variable number out of range", self.line))?;
        Ok(Token::Var(id))
    }

    fn lex_int(&mut self) -> Result<Token, String> {
        let start = self.pos;
        if self.input[self.pos] == b'-' {
            self.pos += 1;
        }
        while self.pos < self.input.len() && self.input[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
        let digits = std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| format!("line {}: malformed input", self.line))?;
        let value = digits
            .parse::<i64>()
            .map_err(|_| format!("line {}: integer literal '{}' out of range", self.line, digits))?;
        Ok(Token::Int(value))
    }

    fn lex_ident(&mut self) -> Token {
        let start = self.pos;
        while self.pos < self.input.len()
            && (self.input[self.pos].is_ascii_alphanumeric() || self.input[self.pos] == b'_')
        {
            self.pos += 1;
        }
        Token::Ident(String::from_utf8_lossy(&self.input[start..self.pos]).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<Token> {
        lex(input).unwrap().into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn tokenizes_an_instruction_line() {
        assert_eq!(
            kinds("%1 = mul i32 %0, 8"),
            vec![
                Token::Var(1),
                Token::Equals,
                Token::Ident("mul".to_string()),
                Token::Ident("i32".to_string()),
                Token::Var(0),
                Token::Comma,
                Token::Int(8),
            ]
        );
    }

    #[test]
    fn tokenizes_signatures_and_negatives() {
        assert_eq!(
            kinds("func @f() -> i8 { ret -4 }"),
            vec![
                Token::Ident("func".to_string()),
                Token::At,
                Token::Ident("f".to_string()),
                Token::LParen,
                Token::RParen,
                Token::Arrow,
                Token::Ident("i8".to_string()),
                Token::LBrace,
                Token::Ident("ret".to_string()),
                Token::Int(-4),
                Token::RBrace,
            ]
        );
    }

    #[test]
    fn comments_run_to_end_of_line() {
        assert_eq!(
            kinds("; whole line\n%1 ; trailing\n%2"),
            vec![Token::Var(1), Token::Var(2)]
        );
    }

    #[test]
    fn line_numbers_survive_comments_and_blank_lines() {
        let tokens = lex("\n; note\n\n%7\n").unwrap();
        assert_eq!(tokens, vec![(Token::Var(7), 4)]);
    }

    #[test]
    fn extreme_literals_parse() {
        assert_eq!(
            kinds("-9223372036854775808 9223372036854775807"),
            vec![Token::Int(i64::MIN), Token::Int(i64::MAX)]
        );
    }

    #[test]
    fn rejects_garbage_with_a_line_number() {
        assert!(lex("%1\n$").unwrap_err().starts_with("line 2:"));
        assert!(lex("%").unwrap_err().contains("after '%'"));
        assert!(lex("- 4").unwrap_err().contains("stray '-'"));
        assert!(
            lex("9999999999999999999999")
                .unwrap_err()
                .contains("out of range")
        );
    }
}
