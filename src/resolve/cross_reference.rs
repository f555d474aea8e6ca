use super::{ResolutionContext, Resolver};
use crate::error::NormalizeDiagnostic;
use crate::types::MethodScope;

/// Attaches each method symbol's simple name to its owner's declared method
/// list, keyed by the method's scope.
///
/// Methods whose owner is not in the index stay unresolved; per the input
/// contract this is not an error.
pub struct CrossReferenceResolver;

impl Resolver for CrossReferenceResolver {
    fn name(&self) -> &'static str {
        "cross_reference"
    }

    fn resolve(&self, ctx: &mut ResolutionContext, _errors: &mut Vec<NormalizeDiagnostic>) {
        let mut links: Vec<(usize, MethodScope, String)> = Vec::new();

        for symbol in ctx.iter() {
            let Some(info) = &symbol.method else {
                continue;
            };
            if let Some(owner_idx) = ctx.find_idx(&info.owner) {
                links.push((owner_idx, info.scope, symbol.name.clone()));
            }
        }

        for (owner_idx, scope, name) in links {
            let owner = ctx.get_mut(owner_idx);
            let list = match scope {
                MethodScope::Instance => &mut owner.instance_methods,
                MethodScope::Class => &mut owner.class_methods,
            };
            if !list.contains(&name) {
                list.push(name);
            }
        }
    }
}
