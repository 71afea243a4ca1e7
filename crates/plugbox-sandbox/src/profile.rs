//! Sandbox policy definition and builder helpers.

use std::collections::BTreeSet;
use std::num::NonZeroU64;

/// Default number of operations a single script call may perform.
const DEFAULT_MAX_OPERATIONS: u64 = 5_000_000;
const DEFAULT_MAX_CALL_LEVELS: usize = 64;
const DEFAULT_MAX_EXPR_DEPTH: usize = 64;
const DEFAULT_MAX_FUNCTION_EXPR_DEPTH: usize = 32;
const DEFAULT_MAX_STRING_SIZE: usize = 1024 * 1024;
const DEFAULT_MAX_ARRAY_SIZE: usize = 64 * 1024;
const DEFAULT_MAX_MAP_SIZE: usize = 64 * 1024;
const DEFAULT_MAX_MODULES: usize = 64;

/// Symbols disabled in every sandboxed engine.
const DEFAULT_DISABLED_SYMBOLS: &[&str] = &["eval"];

/// Upper bound on the work a single script call may perform.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OperationBudget {
    /// Abort the call once it has performed this many operations.
    Bounded(NonZeroU64),
    /// Let the call run until it finishes.
    Unbounded,
}

impl OperationBudget {
    /// Builds a budget from a raw limit where `0` means unbounded.
    ///
    /// ```
    /// use plugbox_sandbox::OperationBudget;
    ///
    /// assert_eq!(OperationBudget::bounded(0), OperationBudget::Unbounded);
    /// assert_eq!(OperationBudget::bounded(10).limit(), 10);
    /// ```
    #[must_use]
    pub fn bounded(limit: u64) -> Self {
        NonZeroU64::new(limit).map_or(Self::Unbounded, Self::Bounded)
    }

    /// Returns the raw limit understood by the engine, `0` when unbounded.
    #[must_use]
    pub const fn limit(self) -> u64 {
        match self {
            Self::Bounded(limit) => limit.get(),
            Self::Unbounded => 0,
        }
    }

    /// Returns true when no budget is enforced.
    #[must_use]
    pub const fn is_unbounded(self) -> bool {
        matches!(self, Self::Unbounded)
    }
}

impl Default for OperationBudget {
    fn default() -> Self {
        Self::bounded(DEFAULT_MAX_OPERATIONS)
    }
}

/// Declarative description of the limits applied to sandboxed scripts.
///
/// The profile defaults to a restrictive configuration: a finite operation
/// budget, bounded recursion and container sizes, and `eval` disabled.
/// Callers relax individual limits explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxProfile {
    operations: OperationBudget,
    max_call_levels: usize,
    max_expr_depth: usize,
    max_function_expr_depth: usize,
    max_string_size: usize,
    max_array_size: usize,
    max_map_size: usize,
    max_modules: usize,
    disabled_symbols: BTreeSet<String>,
    strict_variables: bool,
}

impl SandboxProfile {
    /// Creates a profile with the default limits.
    ///
    /// ```
    /// use plugbox_sandbox::SandboxProfile;
    ///
    /// let profile = SandboxProfile::new().disable_symbol("while");
    /// assert!(profile.disabled_symbols().any(|symbol| symbol == "eval"));
    /// assert!(!profile.operation_budget().is_unbounded());
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self {
            operations: OperationBudget::default(),
            max_call_levels: DEFAULT_MAX_CALL_LEVELS,
            max_expr_depth: DEFAULT_MAX_EXPR_DEPTH,
            max_function_expr_depth: DEFAULT_MAX_FUNCTION_EXPR_DEPTH,
            max_string_size: DEFAULT_MAX_STRING_SIZE,
            max_array_size: DEFAULT_MAX_ARRAY_SIZE,
            max_map_size: DEFAULT_MAX_MAP_SIZE,
            max_modules: DEFAULT_MAX_MODULES,
            disabled_symbols: DEFAULT_DISABLED_SYMBOLS
                .iter()
                .map(|symbol| (*symbol).to_owned())
                .collect(),
            strict_variables: false,
        }
    }

    /// Replaces the per-call operation budget.
    #[must_use]
    pub const fn with_operation_budget(mut self, budget: OperationBudget) -> Self {
        self.operations = budget;
        self
    }

    /// Replaces the maximum function call nesting depth.
    #[must_use]
    pub const fn with_max_call_levels(mut self, levels: usize) -> Self {
        self.max_call_levels = levels;
        self
    }

    /// Replaces the maximum expression nesting depths.
    #[must_use]
    pub const fn with_max_expr_depths(mut self, global: usize, in_functions: usize) -> Self {
        self.max_expr_depth = global;
        self.max_function_expr_depth = in_functions;
        self
    }

    /// Replaces the container size limits (string bytes, array and map entries).
    #[must_use]
    pub const fn with_container_limits(mut self, string: usize, array: usize, map: usize) -> Self {
        self.max_string_size = string;
        self.max_array_size = array;
        self.max_map_size = map;
        self
    }

    /// Replaces the maximum number of modules a script may import.
    #[must_use]
    pub const fn with_max_modules(mut self, modules: usize) -> Self {
        self.max_modules = modules;
        self
    }

    /// Disables a keyword, operator or function name in the engine.
    #[must_use]
    pub fn disable_symbol(mut self, symbol: impl Into<String>) -> Self {
        let _ = self.disabled_symbols.insert(symbol.into());
        self
    }

    /// Rejects scripts that reference undeclared variables at compile time.
    #[must_use]
    pub const fn with_strict_variables(mut self, strict: bool) -> Self {
        self.strict_variables = strict;
        self
    }

    /// Returns the per-call operation budget.
    #[must_use]
    pub const fn operation_budget(&self) -> OperationBudget {
        self.operations
    }

    /// Returns the maximum function call nesting depth.
    #[must_use]
    pub const fn max_call_levels(&self) -> usize {
        self.max_call_levels
    }

    /// Returns the maximum expression depths (global, inside functions).
    #[must_use]
    pub const fn max_expr_depths(&self) -> (usize, usize) {
        (self.max_expr_depth, self.max_function_expr_depth)
    }

    /// Returns the container limits (string bytes, array and map entries).
    #[must_use]
    pub const fn container_limits(&self) -> (usize, usize, usize) {
        (self.max_string_size, self.max_array_size, self.max_map_size)
    }

    /// Returns the maximum number of imported modules.
    #[must_use]
    pub const fn max_modules(&self) -> usize {
        self.max_modules
    }

    /// Iterates over the disabled symbols in lexical order.
    pub fn disabled_symbols(&self) -> impl Iterator<Item = &str> {
        self.disabled_symbols.iter().map(String::as_str)
    }

    /// Returns true when undeclared variables are compile errors.
    #[must_use]
    pub const fn strict_variables(&self) -> bool {
        self.strict_variables
    }
}

impl Default for SandboxProfile {
    fn default() -> Self {
        Self::new()
    }
}
