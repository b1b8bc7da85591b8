use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use num_traits::FloatConst;
use once_cell::sync::Lazy;

use crate::lookup::SymbolTrie;
use crate::real::{is_truthy, truth, Real, SlotId};

/// Marks a positional variable reference such as `$1`.
pub const VARIABLE_MARKER: char = '$';

/// Operator priorities of the built-in operators. Higher priorities are
/// reduced first. Operators sharing a priority always group left to right,
/// so `2^3^2` is `(2^3)^2`.
pub mod priority {
    pub const OR: u8 = 0;
    pub const AND: u8 = 1;
    pub const COMPARISON: u8 = 2;
    pub const ADDITIVE: u8 = 3;
    pub const MULTIPLICATIVE: u8 = 4;
    pub const EXPONENT: u8 = 5;
    pub const UNARY: u8 = 6;
}

pub type UnaryRule = Arc<dyn Fn(Real) -> Real + Send + Sync>;
pub type BinaryRule = Arc<dyn Fn(Real, Real) -> Real + Send + Sync>;
pub type FunctionRule = Arc<dyn Fn(&[Real]) -> Real + Send + Sync>;

/// Operator taking the value to its right.
pub struct UnaryOperator {
    symbol: String,
    priority: u8,
    rule: UnaryRule,
}

impl UnaryOperator {
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn priority(&self) -> u8 {
        self.priority
    }

    pub fn apply(&self, only: Real) -> Real {
        (self.rule)(only)
    }
}

/// Operator taking the values on both of its sides.
pub struct BinaryOperator {
    symbol: String,
    priority: u8,
    rule: BinaryRule,
}

impl BinaryOperator {
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn priority(&self) -> u8 {
        self.priority
    }

    pub fn apply(&self, lhs: Real, rhs: Real) -> Real {
        (self.rule)(lhs, rhs)
    }
}

impl fmt::Debug for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnaryOperator")
            .field("symbol", &self.symbol)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinaryOperator")
            .field("symbol", &self.symbol)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug)]
pub enum Operator {
    Unary(Arc<UnaryOperator>),
    Binary(Arc<BinaryOperator>),
}

impl Operator {
    pub fn unary(
        symbol: impl Into<String>,
        priority: u8,
        rule: impl Fn(Real) -> Real + Send + Sync + 'static,
    ) -> Self {
        Self::Unary(Arc::new(UnaryOperator {
            symbol: symbol.into(),
            priority,
            rule: Arc::new(rule),
        }))
    }

    pub fn binary(
        symbol: impl Into<String>,
        priority: u8,
        rule: impl Fn(Real, Real) -> Real + Send + Sync + 'static,
    ) -> Self {
        Self::Binary(Arc::new(BinaryOperator {
            symbol: symbol.into(),
            priority,
            rule: Arc::new(rule),
        }))
    }

    pub fn symbol(&self) -> &str {
        match self {
            Self::Unary(op) => op.symbol(),
            Self::Binary(op) => op.symbol(),
        }
    }

    pub fn priority(&self) -> u8 {
        match self {
            Self::Unary(op) => op.priority(),
            Self::Binary(op) => op.priority(),
        }
    }
}

/// A named native function with a fixed number of arguments.
pub struct Function {
    name: String,
    arity: usize,
    rule: FunctionRule,
}

impl Function {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    /// `arguments` holds exactly [`Self::arity`] values, in declaration order.
    pub fn call(&self, arguments: &[Real]) -> Real {
        (self.rule)(arguments)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// Anything the compiler recognizes by spelling.
#[derive(Clone, Debug)]
pub enum Symbol {
    Operator(Operator),
    Function(Arc<Function>),
    Constant(Real),
    Variable(SlotId),
}

/// The symbols an expression is compiled against.
///
/// An environment is set up once and then only read by the compiler, so one
/// environment can be shared by any number of threads compiling at once.
///
/// ```rust
/// use crunch_expr::*;
///
/// let mut env = Environment::new();
/// env.set_variable_names(["x", "y"]);
/// env.add_function("hypot", 2, |args| args[0].hypot(args[1]));
///
/// let expression = CompiledExpression::compile("hypot(x, y) * 2", &env).unwrap();
/// assert_eq!(expression.evaluate(&[3.0, 4.0]).unwrap(), 10.0);
/// ```
#[derive(Clone, Debug)]
pub struct Environment {
    symbols: SymbolTrie<Symbol>,
    variable_names: Vec<String>,
    // Symbols hidden by a declared variable of the same name, restored when
    // the variable is dropped.
    shadowed: HashMap<String, Symbol>,
    subtraction: Arc<BinaryOperator>,
    negation: Arc<UnaryOperator>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    /// Environment holding the built-in operators and constants.
    pub fn new() -> Self {
        use priority::*;

        let subtraction = Arc::new(BinaryOperator {
            symbol: "-".into(),
            priority: ADDITIVE,
            rule: Arc::new(|lhs: Real, rhs: Real| lhs - rhs),
        });
        // Shares the `-` spelling, so it never enters the trie. The compiler
        // swaps it in where a `-` has no value to its left.
        let negation = Arc::new(UnaryOperator {
            symbol: "-".into(),
            priority: UNARY,
            rule: Arc::new(|only: Real| -only),
        });

        let mut env = Self {
            symbols: SymbolTrie::new(),
            variable_names: Vec::new(),
            shadowed: HashMap::new(),
            subtraction: subtraction.clone(),
            negation,
        };
        env.symbols
            .insert("-", Symbol::Operator(Operator::Binary(subtraction)));

        env.add_operator(Operator::binary("+", ADDITIVE, |lhs, rhs| lhs + rhs))
            .add_operator(Operator::binary("*", MULTIPLICATIVE, |lhs, rhs| lhs * rhs))
            .add_operator(Operator::binary("/", MULTIPLICATIVE, |lhs, rhs| lhs / rhs))
            .add_operator(Operator::binary("%", MULTIPLICATIVE, |lhs, rhs| lhs % rhs))
            .add_operator(Operator::binary("^", EXPONENT, |lhs, rhs| lhs.powf(rhs)))
            .add_operator(Operator::binary("=", COMPARISON, |lhs, rhs| truth(lhs == rhs)))
            .add_operator(Operator::binary("!=", COMPARISON, |lhs, rhs| truth(lhs != rhs)))
            .add_operator(Operator::binary("<", COMPARISON, |lhs, rhs| truth(lhs < rhs)))
            .add_operator(Operator::binary("<=", COMPARISON, |lhs, rhs| truth(lhs <= rhs)))
            .add_operator(Operator::binary(">", COMPARISON, |lhs, rhs| truth(lhs > rhs)))
            .add_operator(Operator::binary(">=", COMPARISON, |lhs, rhs| truth(lhs >= rhs)))
            .add_operator(Operator::binary("&", AND, |lhs, rhs| {
                truth(is_truthy(lhs) && is_truthy(rhs))
            }))
            .add_operator(Operator::binary("|", OR, |lhs, rhs| {
                truth(is_truthy(lhs) || is_truthy(rhs))
            }))
            .add_operator(Operator::unary("!", UNARY, |only| truth(!is_truthy(only))))
            .add_operator(Operator::unary("sin", UNARY, Real::sin))
            .add_operator(Operator::unary("cos", UNARY, Real::cos))
            .add_operator(Operator::unary("tan", UNARY, Real::tan))
            .add_operator(Operator::unary("asin", UNARY, Real::asin))
            .add_operator(Operator::unary("acos", UNARY, Real::acos))
            .add_operator(Operator::unary("atan", UNARY, Real::atan))
            .add_operator(Operator::unary("sqrt", UNARY, Real::sqrt))
            .add_operator(Operator::unary("cbrt", UNARY, Real::cbrt))
            .add_operator(Operator::unary("abs", UNARY, Real::abs))
            .add_operator(Operator::unary("floor", UNARY, Real::floor))
            .add_operator(Operator::unary("ceil", UNARY, Real::ceil))
            .add_operator(Operator::unary("round", UNARY, Real::round))
            .add_operator(Operator::unary("ln", UNARY, Real::ln))
            .add_operator(Operator::unary("log", UNARY, Real::log10))
            .add_constant("pi", Real::PI())
            .add_constant("e", Real::E())
            .add_constant("true", truth(true))
            .add_constant("false", truth(false));
        env
    }

    /// Registers an operator, replacing any symbol with the same spelling.
    ///
    /// # Panics
    ///
    /// If the spelling is not a valid symbol name (see [`Self::add_constant`]).
    pub fn add_operator(&mut self, operator: Operator) -> &mut Self {
        let symbol = operator.symbol().to_string();
        self.register(&symbol, Symbol::Operator(operator))
    }

    /// Registers a native function called as `name(arg, ...)` with exactly
    /// `arity` arguments.
    ///
    /// # Panics
    ///
    /// If `name` is not a valid symbol name (see [`Self::add_constant`]).
    pub fn add_function(
        &mut self,
        name: impl Into<String>,
        arity: usize,
        rule: impl Fn(&[Real]) -> Real + Send + Sync + 'static,
    ) -> &mut Self {
        let name = name.into();
        let function = Arc::new(Function {
            name: name.clone(),
            arity,
            rule: Arc::new(rule),
        });
        self.register(&name, Symbol::Function(function))
    }

    /// Registers a named constant. Expressions fold constants at compile time.
    ///
    /// # Panics
    ///
    /// If `name` is empty, starts with `$`, or contains whitespace, a
    /// parenthesis or a comma.
    pub fn add_constant(&mut self, name: &str, value: Real) -> &mut Self {
        self.register(name, Symbol::Constant(value))
    }

    /// Declares named variables. The variable at position `i` reads slot `i`
    /// of the values passed to evaluation. Replaces previously declared names.
    ///
    /// A variable named like an existing symbol hides it until the variable
    /// is replaced by a later call.
    ///
    /// # Panics
    ///
    /// If a name is not a valid symbol name (see [`Self::add_constant`]).
    pub fn set_variable_names<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut shadowed = std::mem::take(&mut self.shadowed);
        for name in std::mem::take(&mut self.variable_names) {
            // Leave the name alone if something else was registered over it.
            if let Some(Symbol::Variable(_)) = self.symbols.get(&name) {
                self.symbols.remove(&name);
                if let Some(previous) = shadowed.remove(&name) {
                    self.symbols.insert(&name, previous);
                }
            }
        }
        for (slot, name) in names.into_iter().enumerate() {
            let name = name.into();
            match self.insert_symbol(&name, Symbol::Variable(slot)) {
                Some(Symbol::Variable(_)) | None => {}
                Some(previous) => {
                    self.shadowed.insert(name.clone(), previous);
                }
            }
            self.variable_names.push(name);
        }
        self
    }

    pub fn variable_names(&self) -> &[String] {
        &self.variable_names
    }

    /// Finds the longest registered symbol spelled at byte `offset` of `text`,
    /// along with the number of bytes its spelling covers.
    pub fn lookup(&self, text: &str, offset: usize) -> Option<(&Symbol, usize)> {
        self.symbols.longest_match(text, offset)
    }

    pub(crate) fn is_subtraction(&self, operator: &Arc<BinaryOperator>) -> bool {
        Arc::ptr_eq(operator, &self.subtraction)
    }

    pub(crate) fn negation(&self) -> &Arc<UnaryOperator> {
        &self.negation
    }

    fn register(&mut self, name: &str, symbol: Symbol) -> &mut Self {
        self.insert_symbol(name, symbol);
        self
    }

    fn insert_symbol(&mut self, name: &str, symbol: Symbol) -> Option<Symbol> {
        assert!(is_valid_symbol_name(name), "Invalid symbol name: {name:?}");
        let previous = self.symbols.insert(name, symbol);
        if let Some(previous) = &previous {
            tracing::debug!(name, ?previous, "replaced registered symbol");
        }
        previous
    }
}

fn is_valid_symbol_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with(VARIABLE_MARKER)
        && !name
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '(' | ')' | ','))
}

static DEFAULT_ENVIRONMENT: Lazy<Environment> = Lazy::new(Environment::new);

/// Shared environment with only the built-in symbols.
pub fn default_environment() -> &'static Environment {
    &DEFAULT_ENVIRONMENT
}
