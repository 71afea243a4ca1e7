//! Security gates applied before compilation and before invocation.
//!
//! The static gate is a best-effort text filter: it scans raw source for an
//! ordered list of forbidden API patterns and refuses the plugin on any hit.
//! It cannot see through obfuscation; confinement proper comes from the
//! sandboxed engine. The dynamic gate only checks that an invoked key is part
//! of the plugin's published function table.

use std::collections::BTreeSet;
use std::fmt;

use aho_corasick::AhoCorasick;

use crate::activator::FunctionTable;
use crate::error::PluginError;

const SECURITY_TARGET: &str = "plugbox_plugins::security";

/// Family of behaviour a forbidden pattern stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternCategory {
    /// Starting external processes.
    ProcessSpawn,
    /// Deleting files or directories.
    FileDeletion,
    /// Opening raw network sockets.
    RawSocket,
    /// Loading or generating code at runtime.
    DynamicLoading,
    /// Touching the system registry.
    RegistryAccess,
    /// Terminating the host or other processes.
    ProcessTermination,
    /// Writing to the system event log.
    EventLog,
}

impl PatternCategory {
    /// Returns the canonical label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ProcessSpawn => "process_spawn",
            Self::FileDeletion => "file_deletion",
            Self::RawSocket => "raw_socket",
            Self::DynamicLoading => "dynamic_loading",
            Self::RegistryAccess => "registry_access",
            Self::ProcessTermination => "process_termination",
            Self::EventLog => "event_log",
        }
    }
}

impl fmt::Display for PatternCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A literal, case-sensitive source pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForbiddenPattern {
    pattern: String,
    category: PatternCategory,
}

impl ForbiddenPattern {
    /// Creates a pattern.
    #[must_use]
    pub fn new(pattern: impl Into<String>, category: PatternCategory) -> Self {
        Self {
            pattern: pattern.into(),
            category,
        }
    }

    /// Returns the literal text.
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Returns the category.
    #[must_use]
    pub const fn category(&self) -> PatternCategory {
        self.category
    }
}

const DEFAULT_PATTERNS: &[(&str, PatternCategory)] = &[
    ("Process.Start", PatternCategory::ProcessSpawn),
    ("ProcessStartInfo", PatternCategory::ProcessSpawn),
    ("File.Delete", PatternCategory::FileDeletion),
    ("Directory.Delete", PatternCategory::FileDeletion),
    ("remove_file", PatternCategory::FileDeletion),
    ("remove_dir", PatternCategory::FileDeletion),
    ("new Socket", PatternCategory::RawSocket),
    ("TcpClient", PatternCategory::RawSocket),
    ("UdpClient", PatternCategory::RawSocket),
    ("Assembly.Load", PatternCategory::DynamicLoading),
    ("Reflection.Emit", PatternCategory::DynamicLoading),
    ("eval(", PatternCategory::DynamicLoading),
    ("Registry.", PatternCategory::RegistryAccess),
    ("RegistryKey", PatternCategory::RegistryAccess),
    ("Environment.Exit", PatternCategory::ProcessTermination),
    ("Process.Kill", PatternCategory::ProcessTermination),
    ("EventLog", PatternCategory::EventLog),
];

/// What a security gate refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// Source text matched forbidden patterns.
    ForbiddenPatterns {
        /// Matched patterns in policy order.
        patterns: Vec<String>,
        /// Source files containing at least one match.
        files: Vec<String>,
    },
    /// An invocation named a key the plugin never registered.
    UnregisteredFunction {
        /// Requested function key.
        key: String,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ForbiddenPatterns { patterns, files } => write!(
                f,
                "forbidden pattern(s) {} found in {}",
                patterns.join(", "),
                files.join(", ")
            ),
            Self::UnregisteredFunction { key } => {
                write!(f, "function '{key}' is not registered")
            }
        }
    }
}

/// Static and dynamic security gates.
///
/// # Example
///
/// ```
/// use plugbox_plugins::SecurityAnalyzer;
///
/// let analyzer = SecurityAnalyzer::new().expect("default policy");
/// assert!(analyzer.is_source_allowed("fn greet(args) { \"hi\" }"));
/// assert!(!analyzer.is_source_allowed("Process.Start(\"calc\")"));
/// ```
#[derive(Debug, Clone)]
pub struct SecurityAnalyzer {
    patterns: Vec<ForbiddenPattern>,
    matcher: AhoCorasick,
}

impl SecurityAnalyzer {
    /// Builds the analyzer with the default forbidden pattern list.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Policy`] if the matcher cannot be built.
    pub fn new() -> Result<Self, PluginError> {
        Self::with_patterns(default_patterns())
    }

    /// Builds the analyzer over an explicit ordered pattern list.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Policy`] when a pattern is empty or the matcher
    /// cannot be built.
    pub fn with_patterns(
        forbidden: impl IntoIterator<Item = ForbiddenPattern>,
    ) -> Result<Self, PluginError> {
        let patterns: Vec<ForbiddenPattern> = forbidden.into_iter().collect();
        if patterns.iter().any(|pattern| pattern.pattern.is_empty()) {
            return Err(PluginError::Policy {
                message: String::from("forbidden patterns must not be empty"),
            });
        }
        let matcher = AhoCorasick::new(patterns.iter().map(ForbiddenPattern::pattern)).map_err(
            |error| PluginError::Policy {
                message: error.to_string(),
            },
        )?;
        Ok(Self { patterns, matcher })
    }

    /// Appends host-specific patterns to the current list.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Policy`] when the extended matcher cannot be
    /// built.
    pub fn extended(
        self,
        extra: impl IntoIterator<Item = ForbiddenPattern>,
    ) -> Result<Self, PluginError> {
        Self::with_patterns(self.patterns.into_iter().chain(extra))
    }

    /// Returns the forbidden patterns in policy order.
    #[must_use]
    pub fn patterns(&self) -> &[ForbiddenPattern] {
        &self.patterns
    }

    /// Returns every pattern found in `source`, in policy order.
    #[must_use]
    pub fn scan(&self, source: &str) -> Vec<&ForbiddenPattern> {
        let hits: BTreeSet<usize> = self
            .matcher
            .find_overlapping_iter(source)
            .map(|found| found.pattern().as_usize())
            .collect();
        hits.into_iter()
            .filter_map(|index| self.patterns.get(index))
            .collect()
    }

    /// Static gate: returns `false` when `source` contains a forbidden
    /// pattern.
    #[must_use]
    pub fn is_source_allowed(&self, source: &str) -> bool {
        !self.matcher.is_match(source)
    }

    /// Runs the static gate over a plugin's sources.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::SecurityViolation`] naming every matched pattern
    /// and the files they were found in.
    pub fn check_sources<'a>(
        &self,
        plugin: &str,
        sources: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<(), PluginError> {
        let mut hits = BTreeSet::new();
        let mut files = Vec::new();
        for (file, text) in sources {
            let found = self
                .matcher
                .find_overlapping_iter(text)
                .map(|found| found.pattern().as_usize())
                .collect::<BTreeSet<_>>();
            if !found.is_empty() {
                files.push(file.to_owned());
                hits.extend(found);
            }
        }
        if hits.is_empty() {
            return Ok(());
        }

        let patterns: Vec<String> = hits
            .into_iter()
            .filter_map(|index| self.patterns.get(index))
            .map(|pattern| pattern.pattern.clone())
            .collect();
        tracing::warn!(
            target: SECURITY_TARGET,
            plugin,
            patterns = ?patterns,
            files = ?files,
            "source rejected by static security gate"
        );
        Err(PluginError::SecurityViolation {
            plugin: plugin.to_owned(),
            violation: Violation::ForbiddenPatterns { patterns, files },
        })
    }

    /// Dynamic gate: returns `true` when `key` is a published function.
    #[must_use]
    pub fn is_invocation_allowed(&self, functions: &FunctionTable, key: &str) -> bool {
        functions.contains(key)
    }

    /// Runs the dynamic gate.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::SecurityViolation`] when `key` is not in the
    /// function table.
    pub fn check_invocation(
        &self,
        plugin: &str,
        functions: &FunctionTable,
        key: &str,
    ) -> Result<(), PluginError> {
        if self.is_invocation_allowed(functions, key) {
            return Ok(());
        }
        tracing::warn!(
            target: SECURITY_TARGET,
            plugin,
            function = key,
            "invocation of unregistered function refused"
        );
        Err(PluginError::SecurityViolation {
            plugin: plugin.to_owned(),
            violation: Violation::UnregisteredFunction {
                key: key.to_owned(),
            },
        })
    }
}

fn default_patterns() -> impl Iterator<Item = ForbiddenPattern> {
    DEFAULT_PATTERNS
        .iter()
        .map(|(pattern, category)| ForbiddenPattern::new(*pattern, *category))
}
