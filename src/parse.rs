use tracing::{debug, trace};

use crate::environment::{Environment, Operator, Symbol, VARIABLE_MARKER};
use crate::error::CompileError;
use crate::expression::{CompiledExpression, Value};
use crate::real::Real;
use crate::reduce::{reduce, Token};

impl CompiledExpression {
    /// Compile the expression in `input` against the symbols of `env`.
    ///
    /// Named variables, constants and operators are resolved once here, and
    /// every sub-expression made only of literals is folded. The result can
    /// then be evaluated many times against different variable values.
    pub fn compile(input: &str, env: &Environment) -> Result<Self, CompileError> {
        if input.trim().is_empty() {
            return Err(CompileError::EmptyExpression);
        }
        let parser = ScopeParser { input, env };
        let scope = parser.parse_scope(0, None)?;
        let compiled = Self::new(scope.value);
        debug!(
            input,
            variables = compiled.variable_count(),
            constant = compiled.is_constant(),
            "compiled expression"
        );
        Ok(compiled)
    }
}

/// How a scope ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Close {
    Paren,
    Comma,
    End,
}

struct Scope {
    value: Value,
    /// Offset just past the closing delimiter.
    next: usize,
    close: Close,
}

struct ScopeParser<'a> {
    input: &'a str,
    env: &'a Environment,
}

impl ScopeParser<'_> {
    /// Tokenizes `input[start..]` up to the end of the current scope and
    /// reduces the tokens to one value. Nested groups and argument lists are
    /// parsed recursively and enter the sequence as single tokens.
    ///
    /// `open` is the offset of the parenthesis this scope sits inside, if any.
    fn parse_scope(&self, start: usize, open: Option<usize>) -> Result<Scope, CompileError> {
        trace!(start, ?open, "parsing scope");
        let mut tokens: Vec<Token> = Vec::new();
        // Start of a run of characters no symbol matched (a number or `$n`).
        let mut pending: Option<usize> = None;
        let mut pos = start;

        while let Some(c) = self.input[pos..].chars().next() {
            match c {
                '(' => {
                    self.flush(&mut tokens, &mut pending, pos)?;
                    if matches!(tokens.last(), Some(Token::Function(_))) {
                        let (arguments, next) = self.parse_arguments(pos)?;
                        tokens.push(Token::Arguments(arguments));
                        pos = next;
                    } else {
                        let inner = self.parse_scope(pos + 1, Some(pos))?;
                        if inner.close != Close::Paren {
                            return Err(CompileError::UnbalancedParenthesis { offset: pos });
                        }
                        tokens.push(Token::Value(inner.value));
                        pos = inner.next;
                    }
                }
                ')' | ',' => {
                    if open.is_none() {
                        return Err(CompileError::UnbalancedParenthesis { offset: pos });
                    }
                    self.flush(&mut tokens, &mut pending, pos)?;
                    return Ok(Scope {
                        value: reduce(tokens)?,
                        next: pos + 1,
                        close: if c == ')' { Close::Paren } else { Close::Comma },
                    });
                }
                c if c.is_whitespace() => {
                    self.flush(&mut tokens, &mut pending, pos)?;
                    pos += c.len_utf8();
                }
                c => match self.env.lookup(self.input, pos) {
                    Some((symbol, len)) => {
                        self.flush(&mut tokens, &mut pending, pos)?;
                        let token = self.symbol_token(symbol, tokens.last());
                        tokens.push(token);
                        pos += len;
                    }
                    None => {
                        pending.get_or_insert(pos);
                        pos += c.len_utf8();
                    }
                },
            }
        }

        if let Some(open) = open {
            return Err(CompileError::UnbalancedParenthesis { offset: open });
        }
        self.flush(&mut tokens, &mut pending, pos)?;
        Ok(Scope {
            value: reduce(tokens)?,
            next: pos,
            close: Close::End,
        })
    }

    /// Parses comma-separated arguments following a function name, starting
    /// at the opening parenthesis `open`. Returns the offset past the closing
    /// one.
    fn parse_arguments(&self, open: usize) -> Result<(Vec<Value>, usize), CompileError> {
        let start = open + 1;
        let rest = &self.input[start..];
        let trimmed = rest.trim_start();
        if trimmed.starts_with(')') {
            return Ok((Vec::new(), start + (rest.len() - trimmed.len()) + 1));
        }

        let mut arguments = Vec::new();
        let mut pos = start;
        loop {
            let scope = self.parse_scope(pos, Some(open))?;
            arguments.push(scope.value);
            pos = scope.next;
            match scope.close {
                Close::Paren => return Ok((arguments, pos)),
                Close::Comma => continue,
                // A scope inside parentheses reports a missing `)` itself
                // instead of ending with the input; this arm only keeps the
                // match total. Arguments missing a comma, as in `f(1 2)`,
                // fail inside their scope as adjacent values.
                Close::End => return Err(CompileError::UnbalancedParenthesis { offset: open }),
            }
        }
    }

    /// The token a matched symbol contributes. Every variable reference gets
    /// its own value, and a `-` with no value to its left negates.
    fn symbol_token(&self, symbol: &Symbol, previous: Option<&Token>) -> Token {
        match symbol {
            Symbol::Operator(Operator::Binary(op)) if self.env.is_subtraction(op) => {
                // An argument list completes a call, which is a value, so
                // `f()-1` subtracts. Treating the list as a non-value would
                // negate the `1` and leave two adjacent values.
                let follows_value = matches!(previous, Some(Token::Value(_) | Token::Arguments(_)));
                if follows_value {
                    Token::Operator(Operator::Binary(op.clone()))
                } else {
                    Token::Operator(Operator::Unary(self.env.negation().clone()))
                }
            }
            Symbol::Operator(op) => Token::Operator(op.clone()),
            Symbol::Function(function) => Token::Function(function.clone()),
            Symbol::Constant(value) => Token::Value(Value::Literal(*value)),
            Symbol::Variable(slot) => Token::Value(Value::Variable(*slot)),
        }
    }

    /// Compiles the pending raw run ending at `end`, if there is one.
    fn flush(
        &self,
        tokens: &mut Vec<Token>,
        pending: &mut Option<usize>,
        end: usize,
    ) -> Result<(), CompileError> {
        if let Some(start) = pending.take() {
            let value = compile_raw(&self.input[start..end], start)?;
            tokens.push(Token::Value(value));
        }
        Ok(())
    }
}

/// `$n` is positional variable `n`, read from slot `n - 1`. Anything else
/// must be a decimal literal.
fn compile_raw(token: &str, offset: usize) -> Result<Value, CompileError> {
    if let Some(digits) = token.strip_prefix(VARIABLE_MARKER) {
        return match digits.parse::<usize>() {
            Ok(n) if n >= 1 && digits.bytes().all(|b| b.is_ascii_digit()) => {
                Ok(Value::Variable(n - 1))
            }
            _ => Err(CompileError::InvalidVariable {
                token: token.to_string(),
                offset,
            }),
        };
    }
    let unknown = || CompileError::UnknownToken {
        token: token.to_string(),
        offset,
    };
    if !token.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return Err(unknown());
    }
    token.parse::<Real>().map(Value::Literal).map_err(|_| unknown())
}
