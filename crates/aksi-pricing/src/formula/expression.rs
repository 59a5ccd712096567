//! # Sandboxed Expression Evaluator
//!
//! A small integer-only arithmetic language for author-supplied formulas.
//!
//! ## Grammar
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/' | '%') unary)*
//! unary   := '-' unary | primary
//! primary := INTEGER
//!          | IDENT
//!          | ('min' | 'max') '(' expr ',' expr ')'
//!          | '(' expr ')'
//! ```
//!
//! ## Sandbox
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Limit              Enforced at     Failure                             │
//! │  ─────────────      ───────────     ──────────────────────────────────  │
//! │  text length        parse           FormulaSyntax                       │
//! │  nesting depth      parse           FormulaSyntax                       │
//! │  evaluation steps   evaluate        FormulaTimeout                      │
//! │  wall-clock time    evaluate        FormulaTimeout                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! There are no assignments, loops, strings, or calls other than `min`/`max`.
//! Variable values come from a lookup closure supplied by the caller, so an
//! expression can read only what it is handed.

use std::time::{Duration, Instant};

use crate::error::{PricingError, PricingResult};
use crate::money::round_half_away;

/// Variables every expression may reference.
pub(crate) const BUILTIN_VARIABLES: [&str; 4] =
    ["basePrice", "levelDiff", "startLevel", "targetLevel"];

// =============================================================================
// Budget
// =============================================================================

/// Resource limits for one expression evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpressionBudget {
    /// Maximum length of the expression text, in characters.
    pub max_length: usize,
    /// Maximum nesting of parentheses, unary minus, and function calls.
    pub max_depth: usize,
    /// Maximum number of evaluated nodes.
    pub max_steps: u64,
    /// Wall-clock limit covering parse and evaluation.
    pub timeout: Duration,
}

impl Default for ExpressionBudget {
    fn default() -> Self {
        ExpressionBudget {
            max_length: 1024,
            max_depth: 32,
            max_steps: 10_000,
            timeout: Duration::from_millis(50),
        }
    }
}

impl ExpressionBudget {
    /// Starts the clock for one evaluation.
    pub fn start_deadline(&self) -> Deadline {
        Deadline {
            expires_at: Instant::now() + self.timeout,
            max_steps: self.max_steps,
            budget_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// A running evaluation's limits.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    expires_at: Instant,
    max_steps: u64,
    budget_ms: u64,
}

impl Deadline {
    fn timeout(&self) -> PricingError {
        PricingError::FormulaTimeout {
            budget_ms: self.budget_ms,
        }
    }
}

// =============================================================================
// Syntax Tree
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Function {
    Min,
    Max,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Number(i64),
    Variable { name: String, position: usize },
    Negate(Box<Node>),
    Binary {
        op: BinaryOp,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
    Call {
        function: Function,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
}

/// A parsed expression, ready to be evaluated any number of times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    root: Node,
}

impl Expression {
    /// Parses `text` within the budget's length and depth limits.
    ///
    /// ```rust
    /// use aksi_pricing::formula::{Expression, ExpressionBudget};
    ///
    /// let budget = ExpressionBudget::default();
    /// assert!(Expression::parse("basePrice + max(levelDiff, 1) * 100", &budget).is_ok());
    /// assert!(Expression::parse("basePrice +", &budget).is_err());
    /// ```
    pub fn parse(text: &str, budget: &ExpressionBudget) -> PricingResult<Self> {
        if text.chars().count() > budget.max_length {
            return Err(PricingError::syntax(
                budget.max_length,
                format!("expression longer than {} characters", budget.max_length),
            ));
        }

        let tokens = tokenize(text)?;
        let mut parser = Parser {
            tokens: &tokens,
            pos: 0,
            depth: 0,
            max_depth: budget.max_depth,
            end: text.len(),
        };
        let root = parser.expr()?;
        if let Some(token) = parser.peek() {
            return Err(PricingError::syntax(
                token.position,
                format!("unexpected {}", token.kind.describe()),
            ));
        }
        Ok(Expression { root })
    }

    /// Fails with `FormulaSyntax` on the first identifier `known` rejects.
    pub fn check_identifiers(&self, known: impl Fn(&str) -> bool) -> PricingResult<()> {
        check_node(&self.root, &known)
    }

    /// Evaluates the expression, reading variables through `lookup`.
    pub fn evaluate(
        &self,
        deadline: &Deadline,
        lookup: impl Fn(&str) -> Option<i64>,
    ) -> PricingResult<i64> {
        let mut evaluator = Evaluator {
            deadline,
            lookup: &lookup,
            steps: 0,
        };
        evaluator.eval(&self.root)
    }
}

fn check_node(node: &Node, known: &dyn Fn(&str) -> bool) -> PricingResult<()> {
    match node {
        Node::Number(_) => Ok(()),
        Node::Variable { name, position } => {
            if known(name) {
                Ok(())
            } else {
                Err(PricingError::syntax(
                    *position,
                    format!("unknown identifier '{}'", name),
                ))
            }
        }
        Node::Negate(inner) => check_node(inner, known),
        Node::Binary { lhs, rhs, .. } | Node::Call { lhs, rhs, .. } => {
            check_node(lhs, known)?;
            check_node(rhs, known)
        }
    }
}

// =============================================================================
// Tokenizer
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenKind {
    Number(i64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    LParen,
    RParen,
    Comma,
}

impl TokenKind {
    fn describe(&self) -> String {
        match self {
            TokenKind::Number(n) => format!("number {}", n),
            TokenKind::Ident(name) => format!("identifier '{}'", name),
            TokenKind::Plus => "'+'".to_string(),
            TokenKind::Minus => "'-'".to_string(),
            TokenKind::Star => "'*'".to_string(),
            TokenKind::Slash => "'/'".to_string(),
            TokenKind::Percent => "'%'".to_string(),
            TokenKind::LParen => "'('".to_string(),
            TokenKind::RParen => "')'".to_string(),
            TokenKind::Comma => "','".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    kind: TokenKind,
    position: usize,
}

fn tokenize(text: &str) -> PricingResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some(&(position, c)) = chars.peek() {
        let kind = match c {
            c if c.is_whitespace() => {
                chars.next();
                continue;
            }
            '0'..='9' => {
                let mut end = position;
                while let Some(&(i, d)) = chars.peek() {
                    if !d.is_ascii_digit() {
                        break;
                    }
                    end = i + d.len_utf8();
                    chars.next();
                }
                let literal = &text[position..end];
                let value = literal.parse::<i64>().map_err(|_| {
                    PricingError::syntax(position, format!("integer {} is too large", literal))
                })?;
                tokens.push(Token {
                    kind: TokenKind::Number(value),
                    position,
                });
                continue;
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut end = position;
                while let Some(&(i, d)) = chars.peek() {
                    if !(d.is_alphanumeric() || d == '_') {
                        break;
                    }
                    end = i + d.len_utf8();
                    chars.next();
                }
                tokens.push(Token {
                    kind: TokenKind::Ident(text[position..end].to_string()),
                    position,
                });
                continue;
            }
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            ',' => TokenKind::Comma,
            other => {
                return Err(PricingError::syntax(
                    position,
                    format!("unexpected character '{}'", other),
                ))
            }
        };
        chars.next();
        tokens.push(Token { kind, position });
    }

    Ok(tokens)
}

// =============================================================================
// Parser
// =============================================================================

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
    max_depth: usize,
    /// Byte offset reported for "unexpected end" errors.
    end: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        match self.peek() {
            Some(token) if &token.kind == kind => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn expect(&mut self, kind: TokenKind) -> PricingResult<()> {
        match self.advance() {
            Some(token) if token.kind == kind => Ok(()),
            Some(token) => Err(PricingError::syntax(
                token.position,
                format!("expected {}, found {}", kind.describe(), token.kind.describe()),
            )),
            None => Err(PricingError::syntax(
                self.end,
                format!("expected {}, found end of expression", kind.describe()),
            )),
        }
    }

    fn enter(&mut self, position: usize) -> PricingResult<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(PricingError::syntax(
                position,
                format!("expression nested deeper than {}", self.max_depth),
            ));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn expr(&mut self) -> PricingResult<Node> {
        let mut lhs = self.term()?;
        loop {
            let op = if self.eat(&TokenKind::Plus) {
                BinaryOp::Add
            } else if self.eat(&TokenKind::Minus) {
                BinaryOp::Sub
            } else {
                return Ok(lhs);
            };
            let rhs = self.term()?;
            lhs = Node::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn term(&mut self) -> PricingResult<Node> {
        let mut lhs = self.unary()?;
        loop {
            let op = if self.eat(&TokenKind::Star) {
                BinaryOp::Mul
            } else if self.eat(&TokenKind::Slash) {
                BinaryOp::Div
            } else if self.eat(&TokenKind::Percent) {
                BinaryOp::Rem
            } else {
                return Ok(lhs);
            };
            let rhs = self.unary()?;
            lhs = Node::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn unary(&mut self) -> PricingResult<Node> {
        if let Some(token) = self.peek() {
            if token.kind == TokenKind::Minus {
                self.pos += 1;
                self.enter(token.position)?;
                let inner = self.unary()?;
                self.leave();
                return Ok(Node::Negate(Box::new(inner)));
            }
        }
        self.primary()
    }

    fn primary(&mut self) -> PricingResult<Node> {
        let token = match self.advance() {
            Some(token) => token,
            None => {
                return Err(PricingError::syntax(
                    self.end,
                    "unexpected end of expression",
                ))
            }
        };

        match &token.kind {
            TokenKind::Number(value) => Ok(Node::Number(*value)),
            TokenKind::Ident(name) => {
                if self.peek().map(|t| &t.kind) != Some(&TokenKind::LParen) {
                    return Ok(Node::Variable {
                        name: name.clone(),
                        position: token.position,
                    });
                }
                let function = match name.as_str() {
                    "min" => Function::Min,
                    "max" => Function::Max,
                    _ => {
                        return Err(PricingError::syntax(
                            token.position,
                            format!("unknown function '{}'", name),
                        ))
                    }
                };
                self.pos += 1;
                self.enter(token.position)?;
                let lhs = self.expr()?;
                self.expect(TokenKind::Comma)?;
                let rhs = self.expr()?;
                self.expect(TokenKind::RParen)?;
                self.leave();
                Ok(Node::Call {
                    function,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                })
            }
            TokenKind::LParen => {
                self.enter(token.position)?;
                let inner = self.expr()?;
                self.expect(TokenKind::RParen)?;
                self.leave();
                Ok(inner)
            }
            other => Err(PricingError::syntax(
                token.position,
                format!("unexpected {}", other.describe()),
            )),
        }
    }
}

// =============================================================================
// Evaluator
// =============================================================================

struct Evaluator<'a> {
    deadline: &'a Deadline,
    lookup: &'a dyn Fn(&str) -> Option<i64>,
    steps: u64,
}

impl Evaluator<'_> {
    /// Counts one node against the budget. The clock is read every 64 steps.
    fn tick(&mut self) -> PricingResult<()> {
        self.steps += 1;
        if self.steps > self.deadline.max_steps {
            return Err(self.deadline.timeout());
        }
        if self.steps % 64 == 1 && Instant::now() >= self.deadline.expires_at {
            return Err(self.deadline.timeout());
        }
        Ok(())
    }

    fn eval(&mut self, node: &Node) -> PricingResult<i64> {
        self.tick()?;
        match node {
            Node::Number(value) => Ok(*value),
            Node::Variable { name, position } => (self.lookup)(name).ok_or_else(|| {
                PricingError::syntax(*position, format!("unknown identifier '{}'", name))
            }),
            Node::Negate(inner) => {
                let value = self.eval(inner)?;
                value.checked_neg().ok_or_else(overflow)
            }
            Node::Binary { op, lhs, rhs } => {
                let a = self.eval(lhs)?;
                let b = self.eval(rhs)?;
                apply_binary(*op, a, b)
            }
            Node::Call { function, lhs, rhs } => {
                let a = self.eval(lhs)?;
                let b = self.eval(rhs)?;
                Ok(match function {
                    Function::Min => a.min(b),
                    Function::Max => a.max(b),
                })
            }
        }
    }
}

fn overflow() -> PricingError {
    PricingError::arithmetic("integer overflow")
}

fn apply_binary(op: BinaryOp, a: i64, b: i64) -> PricingResult<i64> {
    match op {
        BinaryOp::Add => a.checked_add(b).ok_or_else(overflow),
        BinaryOp::Sub => a.checked_sub(b).ok_or_else(overflow),
        BinaryOp::Mul => a.checked_mul(b).ok_or_else(overflow),
        BinaryOp::Div => {
            if b == 0 {
                return Err(PricingError::arithmetic("division by zero"));
            }
            i64::try_from(round_half_away(i128::from(a), i128::from(b)))
                .map_err(|_| overflow())
        }
        BinaryOp::Rem => {
            if b == 0 {
                return Err(PricingError::arithmetic("division by zero"));
            }
            a.checked_rem(b).ok_or_else(overflow)
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(text: &str) -> PricingResult<i64> {
        eval_with(text, &[])
    }

    fn eval_with(text: &str, vars: &[(&str, i64)]) -> PricingResult<i64> {
        let budget = ExpressionBudget::default();
        let expression = Expression::parse(text, &budget)?;
        expression.evaluate(&budget.start_deadline(), |name| {
            vars.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
        })
    }

    #[test]
    fn test_precedence_and_associativity() {
        assert_eq!(eval("1 + 2 * 3").unwrap(), 7);
        assert_eq!(eval("(1 + 2) * 3").unwrap(), 9);
        assert_eq!(eval("10 - 4 - 3").unwrap(), 3);
        assert_eq!(eval("-2 * -3").unwrap(), 6);
        assert_eq!(eval("17 % 5").unwrap(), 2);
    }

    #[test]
    fn test_division_rounds_half_away_from_zero() {
        assert_eq!(eval("7 / 2").unwrap(), 4);
        assert_eq!(eval("-7 / 2").unwrap(), -4);
        assert_eq!(eval("10 / 4").unwrap(), 3);
        assert_eq!(eval("10 / 3").unwrap(), 3);
    }

    #[test]
    fn test_min_max() {
        assert_eq!(eval("min(3, 9)").unwrap(), 3);
        assert_eq!(eval("max(3, 9) + min(-1, 1)").unwrap(), 8);
        assert_eq!(
            eval_with("max(levelDiff, 1) * 100", &[("levelDiff", 0)]).unwrap(),
            100
        );
    }

    #[test]
    fn test_variables() {
        assert_eq!(
            eval_with("basePrice + bonus * 2", &[("basePrice", 1000), ("bonus", 25)]).unwrap(),
            1050
        );
    }

    #[test]
    fn test_syntax_errors_carry_position() {
        assert_eq!(
            eval("1 + ").unwrap_err(),
            PricingError::syntax(4, "unexpected end of expression")
        );
        assert!(matches!(
            eval("1 + $"),
            Err(PricingError::FormulaSyntax { position: 4, .. })
        ));
        assert!(matches!(
            eval("(1 + 2"),
            Err(PricingError::FormulaSyntax { .. })
        ));
        assert!(matches!(
            eval("1 2"),
            Err(PricingError::FormulaSyntax { position: 2, .. })
        ));
        assert!(matches!(
            eval("pow(2, 3)"),
            Err(PricingError::FormulaSyntax { .. })
        ));
        assert!(matches!(
            eval("99999999999999999999"),
            Err(PricingError::FormulaSyntax { .. })
        ));
    }

    #[test]
    fn test_check_identifiers() {
        let budget = ExpressionBudget::default();
        let expression = Expression::parse("basePrice + unknownThing", &budget).unwrap();
        let err = expression
            .check_identifiers(|name| name == "basePrice")
            .unwrap_err();
        assert_eq!(
            err,
            PricingError::syntax(12, "unknown identifier 'unknownThing'")
        );
    }

    #[test]
    fn test_arithmetic_errors() {
        assert!(matches!(
            eval("1 / 0"),
            Err(PricingError::FormulaArithmetic { .. })
        ));
        assert!(matches!(
            eval("1 % 0"),
            Err(PricingError::FormulaArithmetic { .. })
        ));
        assert!(matches!(
            eval("9223372036854775807 + 1"),
            Err(PricingError::FormulaArithmetic { .. })
        ));
    }

    #[test]
    fn test_length_limit() {
        let budget = ExpressionBudget {
            max_length: 8,
            ..ExpressionBudget::default()
        };
        assert!(Expression::parse("1 + 2", &budget).is_ok());
        assert!(matches!(
            Expression::parse("1 + 2 + 3 + 4", &budget),
            Err(PricingError::FormulaSyntax { .. })
        ));
    }

    #[test]
    fn test_depth_limit() {
        let budget = ExpressionBudget {
            max_depth: 3,
            ..ExpressionBudget::default()
        };
        assert!(Expression::parse("((1))", &budget).is_ok());
        assert!(matches!(
            Expression::parse("((((1))))", &budget),
            Err(PricingError::FormulaSyntax { .. })
        ));
        assert!(matches!(
            Expression::parse("----1", &budget),
            Err(PricingError::FormulaSyntax { .. })
        ));
    }

    #[test]
    fn test_step_limit_is_timeout() {
        let budget = ExpressionBudget {
            max_steps: 4,
            ..ExpressionBudget::default()
        };
        let expression = Expression::parse("1 + 1 + 1 + 1", &budget).unwrap();
        assert_eq!(
            expression.evaluate(&budget.start_deadline(), |_| None),
            Err(PricingError::FormulaTimeout { budget_ms: 50 })
        );
    }

    #[test]
    fn test_expired_deadline_is_timeout() {
        let budget = ExpressionBudget {
            timeout: Duration::ZERO,
            ..ExpressionBudget::default()
        };
        let expression = Expression::parse("1", &budget).unwrap();
        assert_eq!(
            expression.evaluate(&budget.start_deadline(), |_| None),
            Err(PricingError::FormulaTimeout { budget_ms: 0 })
        );
    }
}
