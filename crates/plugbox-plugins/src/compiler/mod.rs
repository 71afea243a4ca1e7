//! Compilation of plugin sources into executable script modules.
//!
//! A [`CompilationUnit`] is the primary source plus every library bundled in
//! the package. Libraries are compiled first, in name order, and become
//! importable by file stem (`import "helpers" as h;`). The primary source is
//! then compiled into a self-contained AST with its imports resolved, so a
//! missing module is reported at compile time rather than on first call.

use std::collections::BTreeSet;
use std::fmt;

use plugbox_sandbox::Sandbox;
use rhai::module_resolvers::StaticModuleResolver;
use rhai::{AST, Engine, EvalAltResult, Module, ParseError, Position, Scope};
use serde::{Deserialize, Serialize};

const COMPILER_TARGET: &str = "plugbox_plugins::compiler";

/// Severity level of a compiler finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticSeverity {
    /// Refuses activation.
    Error,
    /// Worth surfacing; does not block activation.
    Warning,
    /// Informational.
    Info,
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        })
    }
}

/// A single compiler finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    severity: DiagnosticSeverity,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    column: Option<usize>,
}

impl Diagnostic {
    /// Creates a diagnostic without a location.
    #[must_use]
    pub fn new(severity: DiagnosticSeverity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            file: None,
            line: None,
            column: None,
        }
    }

    /// Attaches the file the finding refers to.
    #[must_use]
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Attaches a source position when the engine reported one.
    #[must_use]
    pub fn with_position(mut self, position: Position) -> Self {
        self.line = position.line();
        self.column = position.position();
        self
    }

    /// Returns the severity.
    #[must_use]
    pub const fn severity(&self) -> DiagnosticSeverity {
        self.severity
    }

    /// Returns the message.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Returns the file, if known.
    #[must_use]
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    /// Returns the 1-based line, if known.
    #[must_use]
    pub const fn line(&self) -> Option<usize> {
        self.line
    }

    /// Returns the 1-based column, if known.
    #[must_use]
    pub const fn column(&self) -> Option<usize> {
        self.column
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.severity)?;
        if let Some(file) = &self.file {
            write!(f, "{file}")?;
            if let Some(line) = self.line {
                write!(f, ":{line}")?;
                if let Some(column) = self.column {
                    write!(f, ":{column}")?;
                }
            }
            write!(f, ": ")?;
        }
        f.write_str(&self.message)
    }
}

/// Ordered list of compiler findings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    /// Returns true when any finding is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.0
            .iter()
            .any(|diagnostic| diagnostic.severity == DiagnosticSeverity::Error)
    }

    /// Iterates over the findings in the order they were produced.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    /// Iterates over error-level findings only.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.iter()
            .filter(|diagnostic| diagnostic.severity == DiagnosticSeverity::Error)
    }

    /// Returns the number of findings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when there are no findings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }
}

impl From<Vec<Diagnostic>> for Diagnostics {
    fn from(diagnostics: Vec<Diagnostic>) -> Self {
        Self(diagnostics)
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut shown = self.errors().peekable();
        if shown.peek().is_none() {
            return f.write_str("no errors reported");
        }
        for (index, diagnostic) in shown.enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{diagnostic}")?;
        }
        Ok(())
    }
}

/// A library bundled alongside the primary source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibrarySource {
    name: String,
    file: String,
    source: String,
}

impl LibrarySource {
    /// Creates a library importable as `name`.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        file: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
            source: source.into(),
        }
    }

    /// Returns the import name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the package-relative file the library came from.
    #[must_use]
    pub fn file(&self) -> &str {
        self.file.as_str()
    }

    /// Returns the source text.
    #[must_use]
    pub fn source(&self) -> &str {
        self.source.as_str()
    }
}

/// Everything needed to compile one plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationUnit {
    file: String,
    source: String,
    libraries: Vec<LibrarySource>,
}

impl CompilationUnit {
    /// Creates a unit for the primary source `file`.
    #[must_use]
    pub fn new(file: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            source: source.into(),
            libraries: Vec::new(),
        }
    }

    /// Adds bundled libraries.
    #[must_use]
    pub fn with_libraries(mut self, libraries: impl IntoIterator<Item = LibrarySource>) -> Self {
        self.libraries.extend(libraries);
        self
    }

    /// Returns the primary source file name.
    #[must_use]
    pub fn file(&self) -> &str {
        self.file.as_str()
    }

    /// Returns the primary source text.
    #[must_use]
    pub fn source(&self) -> &str {
        self.source.as_str()
    }

    /// Returns the bundled libraries.
    #[must_use]
    pub fn libraries(&self) -> &[LibrarySource] {
        &self.libraries
    }

    /// Iterates over `(file, text)` for the primary source and every library.
    pub fn sources(&self) -> impl Iterator<Item = (&str, &str)> {
        std::iter::once((self.file(), self.source())).chain(
            self.libraries
                .iter()
                .map(|library| (library.file(), library.source())),
        )
    }
}

/// A compiled plugin ready for activation.
///
/// The engine owns the resolved library modules and the sandbox limits, so
/// it travels with the AST for the lifetime of the plugin.
pub struct CompiledModule {
    engine: Engine,
    ast: AST,
    diagnostics: Diagnostics,
}

impl fmt::Debug for CompiledModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledModule")
            .field("functions", &self.function_names())
            .field("diagnostics", &self.diagnostics)
            .finish_non_exhaustive()
    }
}

impl CompiledModule {
    /// Returns the non-fatal findings produced while compiling.
    #[must_use]
    pub const fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Returns the script functions defined by the primary source.
    #[must_use]
    pub fn function_names(&self) -> Vec<String> {
        self.ast
            .iter_functions()
            .map(|function| function.name.to_owned())
            .collect()
    }

    /// Splits the module into its engine and AST.
    #[must_use]
    pub fn into_parts(self) -> (Engine, AST) {
        (self.engine, self.ast)
    }
}

/// Turns a [`CompilationUnit`] into a [`CompiledModule`].
///
/// The production implementation is [`ScriptCompiler`]; tests substitute
/// counting or failing doubles.
pub trait SourceCompiler: Send + Sync {
    /// Compiles the unit.
    ///
    /// # Errors
    ///
    /// Returns the ordered diagnostics when any finding is an error.
    fn compile(&self, unit: &CompilationUnit) -> Result<CompiledModule, Diagnostics>;
}

/// Compiles plugin sources with engines built from a [`Sandbox`].
#[derive(Debug, Clone, Default)]
pub struct ScriptCompiler {
    sandbox: Sandbox,
}

impl ScriptCompiler {
    /// Creates a compiler over the given sandbox.
    #[must_use]
    pub const fn new(sandbox: Sandbox) -> Self {
        Self { sandbox }
    }

    /// Returns the sandbox used for every compiled plugin.
    #[must_use]
    pub const fn sandbox(&self) -> &Sandbox {
        &self.sandbox
    }
}

impl SourceCompiler for ScriptCompiler {
    fn compile(&self, unit: &CompilationUnit) -> Result<CompiledModule, Diagnostics> {
        let mut engine = self.sandbox.engine();
        let mut diagnostics = Diagnostics::default();

        let resolver = compile_libraries(&mut engine, unit, &mut diagnostics);
        engine.set_module_resolver(resolver);

        let compiled = engine.compile_into_self_contained(&Scope::new(), unit.source());
        let ast = match compiled {
            Ok(ast) => Some(ast),
            Err(error) => {
                diagnostics.push(eval_diagnostic(unit.file(), &error));
                None
            }
        };

        match ast {
            Some(ast) if !diagnostics.has_errors() => {
                tracing::debug!(
                    target: COMPILER_TARGET,
                    file = unit.file(),
                    libraries = unit.libraries().len(),
                    warnings = diagnostics.len(),
                    "compiled plugin source"
                );
                Ok(CompiledModule {
                    engine,
                    ast,
                    diagnostics,
                })
            }
            _ => Err(diagnostics),
        }
    }
}

fn compile_libraries(
    engine: &mut Engine,
    unit: &CompilationUnit,
    diagnostics: &mut Diagnostics,
) -> StaticModuleResolver {
    let mut resolver = StaticModuleResolver::new();
    let mut libraries: Vec<&LibrarySource> = unit.libraries().iter().collect();
    libraries.sort_by(|left, right| left.name.cmp(&right.name).then(left.file.cmp(&right.file)));

    let mut seen = BTreeSet::new();
    for library in libraries {
        if !seen.insert(library.name()) {
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticSeverity::Warning,
                    format!(
                        "library '{}' is bundled more than once; keeping the first",
                        library.name()
                    ),
                )
                .with_file(library.file()),
            );
            continue;
        }
        let ast = match engine.compile(library.source()) {
            Ok(ast) => ast,
            Err(error) => {
                diagnostics.push(parse_diagnostic(library.file(), &error));
                continue;
            }
        };
        match Module::eval_ast_as_new(Scope::new(), &ast, engine) {
            Ok(module) => {
                resolver.insert(library.name(), module);
                engine.set_module_resolver(resolver.clone());
            }
            Err(error) => diagnostics.push(eval_diagnostic(library.file(), &error)),
        }
    }
    resolver
}

fn parse_diagnostic(file: &str, error: &ParseError) -> Diagnostic {
    Diagnostic::new(DiagnosticSeverity::Error, error.err_type().to_string())
        .with_file(file)
        .with_position(error.position())
}

fn eval_diagnostic(file: &str, error: &EvalAltResult) -> Diagnostic {
    let message = match error {
        EvalAltResult::ErrorParsing(kind, _) => kind.to_string(),
        other => other.to_string(),
    };
    Diagnostic::new(DiagnosticSeverity::Error, message)
        .with_file(file)
        .with_position(error.position())
}
