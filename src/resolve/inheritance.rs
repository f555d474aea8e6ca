use super::{ResolutionContext, Resolver};
use crate::error::NormalizeDiagnostic;
use std::collections::HashSet;

/// Walks superclass links for every class symbol, building its
/// `inheritance_chain`.
///
/// The walk stops when a symbol has no further superclass, when the
/// referenced name is not in the index (the unresolved name is still
/// appended once), or when a previously-visited fqname reappears. The
/// visited set is seeded with the class itself, so a direct cycle back to
/// the origin terminates without re-adding it, and the chain length is
/// bounded by the number of distinct symbols.
pub struct InheritanceResolver;

impl Resolver for InheritanceResolver {
    fn name(&self) -> &'static str {
        "inheritance"
    }

    fn resolve(&self, ctx: &mut ResolutionContext, errors: &mut Vec<NormalizeDiagnostic>) {
        let mut chains: Vec<(usize, Vec<String>)> = Vec::new();

        for idx in 0..ctx.len() {
            let symbol = ctx.get(idx);
            if !symbol.is_class() {
                continue;
            }
            let Some(first) = symbol.superclass.clone() else {
                continue;
            };

            let mut chain = Vec::new();
            let mut visited: HashSet<String> = HashSet::from([symbol.fqname.clone()]);
            let origin = symbol.fqname.clone();
            let mut current = first;

            loop {
                if visited.contains(&current) {
                    errors.push(
                        NormalizeDiagnostic::cycle(format!(
                            "inheritance cycle reaching '{current}' while resolving '{origin}'"
                        ))
                        .with_data(serde_json::json!({"origin": origin, "at": current})),
                    );
                    break;
                }
                chain.push(current.clone());
                visited.insert(current.clone());

                if ctx.find(&current).is_none() {
                    errors.push(NormalizeDiagnostic::unresolved(format!(
                        "superclass '{current}' of '{origin}' not found in index"
                    )));
                    break;
                }
                match ctx.find_parent_class(&current) {
                    Some(next) => current = next.to_string(),
                    None => break,
                }
            }

            chains.push((idx, chain));
        }

        for (idx, chain) in chains {
            ctx.get_mut(idx).inheritance_chain = chain;
        }
    }
}
