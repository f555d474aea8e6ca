//! Relationship resolution over the populated symbol index.
//!
//! Four resolvers run in a fixed order over the whole resolved set. The
//! order is a named constant so it can be asserted independently of code
//! layout; each resolver only reads the index and writes its own symbol's
//! fields, so per-symbol work stays independent within a pass.

pub mod context;

mod cross_reference;
mod inheritance;
mod mixin_method;
mod namespace;

pub use context::ResolutionContext;
pub use cross_reference::CrossReferenceResolver;
pub use inheritance::InheritanceResolver;
pub use mixin_method::MixinMethodResolver;
pub use namespace::NamespaceResolver;

use crate::error::NormalizeDiagnostic;

pub trait Resolver: Sync {
    fn name(&self) -> &'static str;

    fn resolve(&self, ctx: &mut ResolutionContext, errors: &mut Vec<NormalizeDiagnostic>);
}

/// Strict resolver order; changing it changes observable results.
pub const RESOLVER_ORDER: [&str; 4] = [
    "namespace",
    "inheritance",
    "cross_reference",
    "mixin_method",
];

/// The resolver chain in `RESOLVER_ORDER`.
pub fn default_resolvers() -> Vec<Box<dyn Resolver>> {
    vec![
        Box::new(NamespaceResolver),
        Box::new(InheritanceResolver),
        Box::new(CrossReferenceResolver),
        Box::new(MixinMethodResolver),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_resolvers_follow_declared_order() {
        let resolvers = default_resolvers();
        let names: Vec<_> = resolvers.iter().map(|r| r.name()).collect();
        assert_eq!(names, RESOLVER_ORDER);
    }
}
