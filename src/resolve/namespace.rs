use super::{ResolutionContext, Resolver};
use crate::error::NormalizeDiagnostic;

/// Links every symbol to the symbol at its immediate parent namespace path
/// by appending the child fqname to the parent's `children`.
///
/// Symbols with no resolvable parent are left untouched.
pub struct NamespaceResolver;

impl Resolver for NamespaceResolver {
    fn name(&self) -> &'static str {
        "namespace"
    }

    fn resolve(&self, ctx: &mut ResolutionContext, _errors: &mut Vec<NormalizeDiagnostic>) {
        // Collect first, apply second: the index is read-only during the scan.
        let mut links: Vec<(usize, String)> = Vec::new();
        for symbol in ctx.iter() {
            if symbol.is_method() {
                continue;
            }
            let Some(parent_key) = symbol.parent_namespace() else {
                continue;
            };
            if let Some(parent_idx) = ctx.find_idx(&parent_key) {
                links.push((parent_idx, symbol.fqname.clone()));
            }
        }

        for (parent_idx, child) in links {
            let parent = ctx.get_mut(parent_idx);
            if parent.fqname != child && !parent.children.contains(&child) {
                parent.children.push(child);
            }
        }
    }
}
