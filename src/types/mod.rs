use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Stable identity of a symbol, derived from its fully-qualified name and kind.
///
/// The value is deterministic across runs: two normalization passes over the
/// same input always assign the same id to the same `(fqname, kind)` pair,
/// which is what makes merges and incremental updates reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolId(pub u64);

impl SymbolId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Class,
    Module,
    Method,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Class => "class",
            SymbolKind::Module => "module",
            SymbolKind::Method => "method",
        }
    }
}

impl FromStr for SymbolKind {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "class" | "Class" => Ok(SymbolKind::Class),
            "module" | "Module" => Ok(SymbolKind::Module),
            "method" | "Method" => Ok(SymbolKind::Method),
            _ => Err("unknown symbol kind"),
        }
    }
}

/// Whether a method is defined on instances or on the class/module itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodScope {
    Instance,
    Class,
}

impl MethodScope {
    /// Separator used when joining owner and method name into an fqname:
    /// `Owner#method` for instance scope, `Owner.method` for class scope.
    pub fn separator(&self) -> char {
        match self {
            MethodScope::Instance => '#',
            MethodScope::Class => '.',
        }
    }
}

impl FromStr for MethodScope {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "instance" => Ok(MethodScope::Instance),
            "class" | "singleton" => Ok(MethodScope::Class),
            _ => Err("unknown method scope"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

impl FromStr for Visibility {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Visibility::Public),
            "protected" => Ok(Visibility::Protected),
            "private" => Ok(Visibility::Private),
            _ => Err("unknown visibility"),
        }
    }
}

/// Composition relationship attaching a module's methods to a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MixinKind {
    Include,
    Extend,
    Prepend,
}

impl FromStr for MixinKind {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "include" => Ok(MixinKind::Include),
            "extend" => Ok(MixinKind::Extend),
            "prepend" => Ok(MixinKind::Prepend),
            _ => Err("unknown mixin kind"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParamKind {
    Required,
    Optional,
    Rest,
    KeywordRequired,
    KeywordOptional,
    KeywordRest,
    Block,
}

impl FromStr for ParamKind {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "required" | "req" => Ok(ParamKind::Required),
            "optional" | "opt" => Ok(ParamKind::Optional),
            "rest" => Ok(ParamKind::Rest),
            "keyword-required" | "keyreq" => Ok(ParamKind::KeywordRequired),
            "keyword-optional" | "key" => Ok(ParamKind::KeywordOptional),
            "keyword-rest" | "keyrest" => Ok(ParamKind::KeywordRest),
            "block" => Ok(ParamKind::Block),
            _ => Err("unknown parameter kind"),
        }
    }
}

/// Extraction source that contributed a fact.
///
/// The derived `Ord` IS the precedence order used to break field-level
/// conflicts during merge: later variants outrank earlier ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceOrigin {
    Inferred,
    DocInference,
    TypeSignatureWeak,
    TypeSignatureStrong,
    RuntimeIntrospection,
    StaticAnalysis,
}

impl SourceOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceOrigin::Inferred => "inferred",
            SourceOrigin::DocInference => "doc-inference",
            SourceOrigin::TypeSignatureWeak => "type-signature-weak",
            SourceOrigin::TypeSignatureStrong => "type-signature-strong",
            SourceOrigin::RuntimeIntrospection => "runtime-introspection",
            SourceOrigin::StaticAnalysis => "static-analysis",
        }
    }

    /// Confidence assumed when a record does not carry one.
    pub fn default_confidence(&self) -> f32 {
        match self {
            SourceOrigin::Inferred => 0.3,
            SourceOrigin::DocInference => 0.45,
            SourceOrigin::TypeSignatureWeak => 0.6,
            SourceOrigin::TypeSignatureStrong => 0.7,
            SourceOrigin::RuntimeIntrospection => 0.85,
            SourceOrigin::StaticAnalysis => 0.95,
        }
    }

    /// Parse with a fallback to the lowest-precedence origin for unknown tags.
    pub fn from_str_with_default(s: &str) -> Self {
        s.parse().unwrap_or(SourceOrigin::Inferred)
    }
}

impl FromStr for SourceOrigin {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inferred" => Ok(SourceOrigin::Inferred),
            "doc-inference" => Ok(SourceOrigin::DocInference),
            "type-signature-weak" => Ok(SourceOrigin::TypeSignatureWeak),
            "type-signature" | "type-signature-strong" => Ok(SourceOrigin::TypeSignatureStrong),
            "runtime-introspection" => Ok(SourceOrigin::RuntimeIntrospection),
            "static-analysis" => Ok(SourceOrigin::StaticAnalysis),
            _ => Err("unknown source origin"),
        }
    }
}
