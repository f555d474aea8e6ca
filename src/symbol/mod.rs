//! Canonical symbol model shared by every pipeline stage.
//!
//! A `Symbol` is the unit of identity: classes, modules, and methods all
//! normalize into it, with method-only detail carried in `MethodInfo`.

use crate::types::{
    MethodScope, MixinKind, ParamKind, SourceOrigin, SymbolId, SymbolKind, Visibility,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

/// Compute the deterministic id for a `(fqname, kind)` pair.
///
/// First 8 bytes of `sha256("{kind}:{fqname}")`, little-endian.
pub fn symbol_id(kind: SymbolKind, fqname: &str) -> SymbolId {
    let mut hasher = Sha256::new();
    hasher.update(kind.as_str().as_bytes());
    hasher.update(b":");
    hasher.update(fqname.as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    SymbolId::new(u64::from_le_bytes(bytes))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub kind: ParamKind,
    pub name: String,
    pub default: Option<String>,
}

impl Parameter {
    pub fn new(kind: ParamKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            default: None,
        }
    }
}

/// Signed arity encoding over a parameter list.
///
/// Each required parameter adds 1. Any optional, rest, keyword-optional, or
/// keyword-rest parameter flips the result to `-(required + 1)`; each
/// keyword-required parameter then subtracts 1 from the negative encoding,
/// and a trailing block parameter adds 1 back. Without a variadic parameter
/// the arity is exactly the required-positional count; keyword-required and
/// block parameters do not contribute.
pub fn compute_arity(params: &[Parameter]) -> i32 {
    let mut required = 0i32;
    let mut keyword_required = 0i32;
    let mut variadic = false;
    let mut trailing_block = false;

    for param in params {
        trailing_block = false;
        match param.kind {
            ParamKind::Required => required += 1,
            ParamKind::KeywordRequired => keyword_required += 1,
            ParamKind::Optional
            | ParamKind::Rest
            | ParamKind::KeywordOptional
            | ParamKind::KeywordRest => variadic = true,
            ParamKind::Block => trailing_block = true,
        }
    }

    if variadic {
        let mut arity = -(required + 1);
        arity -= keyword_required;
        if trailing_block {
            arity += 1;
        }
        arity
    } else {
        required
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mixin {
    pub kind: MixinKind,
    pub module_name: String,
}

impl Mixin {
    pub fn new(kind: MixinKind, module_name: impl Into<String>) -> Self {
        Self {
            kind,
            module_name: module_name.into(),
        }
    }
}

/// Method-specific detail attached to symbols of kind `Method`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodInfo {
    pub owner: String,
    pub scope: MethodScope,
    pub visibility: Visibility,
    pub inferred_visibility: Visibility,
    pub arity: i32,
    pub parameters: Vec<Parameter>,
}

/// Which extraction sources produced a symbol, and how much to trust them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub sources: BTreeSet<SourceOrigin>,
    pub confidence: f32,
    pub timestamp: DateTime<Utc>,
}

impl Provenance {
    pub fn from_origin(origin: SourceOrigin, confidence: Option<f32>) -> Self {
        Self {
            sources: BTreeSet::from([origin]),
            confidence: confidence.unwrap_or_else(|| origin.default_confidence()),
            timestamp: Utc::now(),
        }
    }

    /// Highest-precedence origin among the contributing sources.
    pub fn best_origin(&self) -> SourceOrigin {
        self.sources
            .iter()
            .max()
            .copied()
            .unwrap_or(SourceOrigin::Inferred)
    }
}

impl Default for Provenance {
    fn default() -> Self {
        Self::from_origin(SourceOrigin::Inferred, None)
    }
}

/// A named structural entity in the analyzed codebase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub id: SymbolId,
    pub kind: SymbolKind,
    pub name: String,
    pub fqname: String,
    pub namespace_path: Vec<String>,
    // no skip_serializing_if on the optionals: these types go through
    // bincode, which cannot tolerate absent fields
    pub superclass: Option<String>,
    pub mixins: Vec<Mixin>,
    pub instance_methods: Vec<String>,
    pub class_methods: Vec<String>,
    pub available_instance_methods: Vec<String>,
    pub available_class_methods: Vec<String>,
    pub inheritance_chain: Vec<String>,
    pub children: Vec<String>,
    pub file_path: Option<String>,
    pub method: Option<MethodInfo>,
    pub provenance: Provenance,
}

impl Symbol {
    pub fn new(kind: SymbolKind, name: impl Into<String>, fqname: impl Into<String>) -> Self {
        let name = name.into();
        let fqname = fqname.into();
        Self {
            id: symbol_id(kind, &fqname),
            kind,
            name,
            fqname,
            namespace_path: Vec::new(),
            superclass: None,
            mixins: Vec::new(),
            instance_methods: Vec::new(),
            class_methods: Vec::new(),
            available_instance_methods: Vec::new(),
            available_class_methods: Vec::new(),
            inheritance_chain: Vec::new(),
            children: Vec::new(),
            file_path: None,
            method: None,
            provenance: Provenance::default(),
        }
    }

    pub fn with_namespace(mut self, namespace_path: Vec<String>) -> Self {
        self.namespace_path = namespace_path;
        self
    }

    pub fn with_superclass(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }

    pub fn is_class(&self) -> bool {
        self.kind == SymbolKind::Class
    }

    pub fn is_module(&self) -> bool {
        self.kind == SymbolKind::Module
    }

    pub fn is_method(&self) -> bool {
        self.kind == SymbolKind::Method
    }

    /// Fqname of the immediate enclosing namespace, if any.
    pub fn parent_namespace(&self) -> Option<String> {
        if self.namespace_path.is_empty() {
            None
        } else {
            Some(self.namespace_path.join("::"))
        }
    }
}

/// Join a namespace path and simple name into an fqname.
pub fn join_fqname(namespace_path: &[String], name: &str) -> String {
    if namespace_path.is_empty() {
        name.to_string()
    } else {
        format!("{}::{}", namespace_path.join("::"), name)
    }
}

/// Fqname of a method on its owner: `Owner#name` or `Owner.name` by scope.
pub fn method_fqname(owner: &str, name: &str, scope: MethodScope) -> String {
    format!("{owner}{}{name}", scope.separator())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(kind: ParamKind) -> Parameter {
        Parameter::new(kind, "x")
    }

    #[test]
    fn test_symbol_id_is_deterministic() {
        let a = symbol_id(SymbolKind::Class, "App::User");
        let b = symbol_id(SymbolKind::Class, "App::User");
        assert_eq!(a, b);
    }

    #[test]
    fn test_symbol_id_distinguishes_kind() {
        let class = symbol_id(SymbolKind::Class, "App::User");
        let module = symbol_id(SymbolKind::Module, "App::User");
        assert_ne!(class, module);
    }

    #[test]
    fn test_arity_exact_positional() {
        assert_eq!(compute_arity(&[]), 0);
        assert_eq!(compute_arity(&[p(ParamKind::Required), p(ParamKind::Required)]), 2);
    }

    #[test]
    fn test_arity_keyword_required_without_variadic_stays_positional() {
        // (a, b:) => 1; keyword-required only shifts the negative encoding
        assert_eq!(
            compute_arity(&[p(ParamKind::Required), p(ParamKind::KeywordRequired)]),
            1
        );
        // (b:) => 0
        assert_eq!(compute_arity(&[p(ParamKind::KeywordRequired)]), 0);
    }

    #[test]
    fn test_arity_optional_flips_negative() {
        // (a, b = 1) => -(1 + 1)
        assert_eq!(
            compute_arity(&[p(ParamKind::Required), p(ParamKind::Optional)]),
            -2
        );
        // (*args) => -1
        assert_eq!(compute_arity(&[p(ParamKind::Rest)]), -1);
    }

    #[test]
    fn test_arity_keyword_required_subtracts() {
        // (a, *rest, b:) => -(1+1) - 1
        assert_eq!(
            compute_arity(&[
                p(ParamKind::Required),
                p(ParamKind::Rest),
                p(ParamKind::KeywordRequired),
            ]),
            -3
        );
    }

    #[test]
    fn test_arity_trailing_block_adds_back() {
        // (a, *rest, &blk) => -(1+1) + 1
        assert_eq!(
            compute_arity(&[p(ParamKind::Required), p(ParamKind::Rest), p(ParamKind::Block)]),
            -1
        );
    }

    #[test]
    fn test_method_fqname_by_scope() {
        assert_eq!(method_fqname("App::User", "save", MethodScope::Instance), "App::User#save");
        assert_eq!(method_fqname("App::User", "find", MethodScope::Class), "App::User.find");
    }

    #[test]
    fn test_join_fqname() {
        assert_eq!(join_fqname(&[], "User"), "User");
        assert_eq!(
            join_fqname(&["App".to_string(), "Models".to_string()], "User"),
            "App::Models::User"
        );
    }

    #[test]
    fn test_provenance_best_origin() {
        let mut prov = Provenance::from_origin(SourceOrigin::Inferred, None);
        prov.sources.insert(SourceOrigin::StaticAnalysis);
        prov.sources.insert(SourceOrigin::DocInference);
        assert_eq!(prov.best_origin(), SourceOrigin::StaticAnalysis);
    }
}
