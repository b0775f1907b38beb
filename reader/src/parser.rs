// Recursive-descent parser from tokens to IR.

use ir::{
    BasicBlock, BinOp, BlockId, Function, Instruction, Module, Operand, Site, Terminator, Ty, VarId,
};

use crate::lexer::Token;

/// Parse every function, returning the module plus one line table per
/// function (same order), so verifier rejections can be tied back to the
/// source.
pub(crate) fn parse(tokens: &[(Token, usize)]) -> Result<(Module, Vec<FunctionLines>), String> {
    Parser { tokens, pos: 0 }.parse_module()
}

/// Source line of every element of one parsed function, indexed the way
/// the function's blocks are laid out.
pub(crate) struct FunctionLines {
    pub header: usize,
    pub blocks: Vec<BlockLines>,
}

pub(crate) struct BlockLines {
    pub label: usize,
    pub instructions: Vec<usize>,
    pub terminator: usize,
}

impl FunctionLines {
    /// The recorded line for a verifier [`Site`]. Sites always come from
    /// verifying the function this table was built for; the header line
    /// stands in if they do not.
    pub(crate) fn line_of(&self, site: Site) -> usize {
        match site {
            Site::Header => self.header,
            Site::Block(block) => self.blocks.get(block).map_or(self.header, |b| b.label),
            Site::Inst(block, inst) => self
                .blocks
                .get(block)
                .and_then(|b| b.instructions.get(inst).copied())
                .unwrap_or(self.header),
            Site::Terminator(block) => {
                self.blocks.get(block).map_or(self.header, |b| b.terminator)
            }
        }
    }
}

struct Parser<'a> {
    tokens: &'a [(Token, usize)],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn parse_module(&mut self) -> Result<(Module, Vec<FunctionLines>), String> {
        let mut functions = Vec::new();
        let mut lines = Vec::new();
        while self.pos < self.tokens.len() {
            let (func, func_lines) = self.parse_function()?;
            functions.push(func);
            lines.push(func_lines);
        }
        Ok((Module { functions }, lines))
    }

    fn parse_function(&mut self) -> Result<(Function, FunctionLines), String> {
        let header = self.line();
        self.expect_keyword("func")?;
        self.expect(&Token::At, "'@'")?;
        let name = self.expect_ident("a function name")?;

        self.expect(&Token::LParen, "'('")?;
        let mut params = Vec::new();
        if !self.check(&Token::RParen) {
            loop {
                let var = self.expect_var("a parameter like '%0'")?;
                self.expect(&Token::Colon, "':'")?;
                let ty = self.parse_ty()?;
                params.push((ty, var));
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(&Token::RParen, "')'")?;

        let ret_ty = if self.eat(&Token::Arrow) {
            Some(self.parse_ty()?)
        } else {
            None
        };

        self.expect(&Token::LBrace, "'{'")?;
        let mut blocks = Vec::new();
        let mut block_lines = Vec::new();
        while !self.eat(&Token::RBrace) {
            if self.pos >= self.tokens.len() {
                return Err(format!(
                    "line {}: unterminated body of '@{}'",
                    self.line(),
                    name
                ));
            }
            let (block, lines) = self.parse_block()?;
            blocks.push(block);
            block_lines.push(lines);
        }

        let mut next_var = 0;
        for (_, var) in &params {
            next_var = next_var.max(var.0 + 1);
        }
        for block in &blocks {
            for inst in &block.instructions {
                if let Some(dest) = inst.dest() {
                    next_var = next_var.max(dest.0 + 1);
                }
            }
        }

        Ok((
            Function {
                name,
                params,
                ret_ty,
                blocks,
                next_var,
            },
            FunctionLines {
                header,
                blocks: block_lines,
            },
        ))
    }

    fn parse_block(&mut self) -> Result<(BasicBlock, BlockLines), String> {
        let label = self.line();
        let id = self.parse_block_ref()?;
        self.expect(&Token::Colon, "':'")?;

        let mut instructions = Vec::new();
        let mut inst_lines = Vec::new();
        let (terminator, terminator_line) = loop {
            let line = self.line();
            if self.check_var() || self.check_ident("call") {
                instructions.push(self.parse_instruction()?);
                inst_lines.push(line);
            } else if self.check_terminator() {
                break (self.parse_terminator()?, line);
            } else {
                return Err(self.unexpected("an instruction or a terminator"));
            }
        };

        Ok((
            BasicBlock {
                id,
                instructions,
                terminator,
            },
            BlockLines {
                label,
                instructions: inst_lines,
                terminator: terminator_line,
            },
        ))
    }

    fn parse_instruction(&mut self) -> Result<Instruction, String> {
        if !self.check_var() {
            // void call
            self.expect_keyword("call")?;
            let (callee, args) = self.parse_call_tail()?;
            return Ok(Instruction::Call {
                dest: None,
                callee,
                args,
            });
        }

        let dest = self.expect_var("a destination")?;
        self.expect(&Token::Equals, "'='")?;
        let line = self.line();
        let head = self.expect_ident("an operation")?;
        match head.as_str() {
            "copy" => {
                let ty = self.parse_ty()?;
                let src = self.parse_operand()?;
                Ok(Instruction::Copy { dest, src, ty })
            }
            "call" => {
                let (callee, args) = self.parse_call_tail()?;
                Ok(Instruction::Call {
                    dest: Some(dest),
                    callee,
                    args,
                })
            }
            name => match BinOp::from_mnemonic(name) {
                Some(op) => {
                    let ty = self.parse_ty()?;
                    let lhs = self.parse_operand()?;
                    self.expect(&Token::Comma, "','")?;
                    let rhs = self.parse_operand()?;
                    Ok(Instruction::Binary {
                        dest,
                        op,
                        lhs,
                        rhs,
                        ty,
                    })
                }
                None => Err(format!("line {line}: unknown operation '{name}'")),
            },
        }
    }

    fn parse_call_tail(&mut self) -> Result<(String, Vec<Operand>), String> {
        self.expect(&Token::At, "'@'")?;
        let callee = self.expect_ident("a function name")?;
        self.expect(&Token::LParen, "'('")?;
        let mut args = Vec::new();
        if !self.check(&Token::RParen) {
            loop {
                args.push(self.parse_operand()?);
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(&Token::RParen, "')'")?;
        Ok((callee, args))
    }

    fn parse_terminator(&mut self) -> Result<Terminator, String> {
        let line = self.line();
        let head = self.expect_ident("a terminator")?;
        match head.as_str() {
            "ret" => {
                if self.check_operand() {
                    Ok(Terminator::Ret(Some(self.parse_operand()?)))
                } else {
                    Ok(Terminator::Ret(None))
                }
            }
            "br" => Ok(Terminator::Br(self.parse_block_ref()?)),
            "cbr" => {
                let cond = self.parse_operand()?;
                self.expect(&Token::Comma, "','")?;
                let then_block = self.parse_block_ref()?;
                self.expect(&Token::Comma, "','")?;
                let else_block = self.parse_block_ref()?;
                Ok(Terminator::CondBr {
                    cond,
                    then_block,
                    else_block,
                })
            }
            "unreachable" => Ok(Terminator::Unreachable),
            other => Err(format!("line {line}: unknown terminator '{other}'")),
        }
    }

    fn parse_operand(&mut self) -> Result<Operand, String> {
        match self.peek() {
            Some(Token::Var(id)) => {
                let id = *id;
                self.pos += 1;
                Ok(Operand::Var(VarId(id)))
            }
            Some(Token::Int(value)) => {
                let value = *value;
                self.pos += 1;
                Ok(Operand::Const(value))
            }
            _ => Err(self.unexpected("an operand")),
        }
    }

    fn parse_ty(&mut self) -> Result<Ty, String> {
        let line = self.line();
        let name = self.expect_ident("a type")?;
        Ty::from_name(&name).ok_or_else(|| format!("line {line}: unknown type '{name}'"))
    }

    fn parse_block_ref(&mut self) -> Result<BlockId, String> {
        let line = self.line();
        let label = self.expect_ident("a block label")?;
        block_label(&label).ok_or_else(|| {
            format!("line {line}: expected a block label like 'bb0', found '{label}'")
        })
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(token, _)| token)
    }

    fn line(&self) -> usize {
        match self.tokens.get(self.pos) {
            Some((_, line)) => *line,
            None => self.tokens.last().map_or(1, |(_, line)| *line),
        }
    }

    fn check(&self, token: &Token) -> bool {
        self.peek() == Some(token)
    }

    fn check_var(&self) -> bool {
        matches!(self.peek(), Some(Token::Var(_)))
    }

    fn check_operand(&self) -> bool {
        matches!(self.peek(), Some(Token::Var(_) | Token::Int(_)))
    }

    fn check_ident(&self, name: &str) -> bool {
        matches!(self.peek(), Some(Token::Ident(s)) if s == name)
    }

    fn check_terminator(&self) -> bool {
        matches!(
            self.peek(),
            Some(Token::Ident(s)) if matches!(s.as_str(), "ret" | "br" | "cbr" | "unreachable")
        )
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token, what: &str) -> Result<(), String> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.unexpected(what))
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<String, String> {
        match self.peek() {
            Some(Token::Ident(s)) => {
                let s = s.clone();
                self.pos += 1;
                Ok(s)
            }
            _ => Err(self.unexpected(what)),
        }
    }

    fn expect_var(&mut self, what: &str) -> Result<VarId, String> {
        match self.peek() {
            Some(Token::Var(id)) => {
                let id = *id;
                self.pos += 1;
                Ok(VarId(id))
            }
            _ => Err(self.unexpected(what)),
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), String> {
        if self.check_ident(keyword) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{keyword}'")))
        }
    }

    fn unexpected(&self, what: &str) -> String {
        match self.tokens.get(self.pos) {
            Some((token, line)) => format!("line {line}: expected {what}, found {token:?}"),
            None => format!("line {}: expected {what}, found end of input", self.line()),
        }
    }
}

fn block_label(label: &str) -> Option<BlockId> {
    label.strip_prefix("bb")?.parse().ok().map(BlockId)
}
