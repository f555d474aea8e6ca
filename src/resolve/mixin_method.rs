use super::{ResolutionContext, Resolver};
use crate::error::NormalizeDiagnostic;
use crate::types::MixinKind;

/// Computes available method sets from declared methods plus mixins.
///
/// `available_*` always starts from the symbol's own declared methods.
/// `include` and `prepend` union the module's instance methods into
/// `available_instance_methods`; `extend` unions them into
/// `available_class_methods`. Prepend's resolution-order override is not
/// modeled structurally; the typed mixin edge survives into the graph for
/// tooling that needs it. Unknown mixin targets are skipped without error.
pub struct MixinMethodResolver;

impl Resolver for MixinMethodResolver {
    fn name(&self) -> &'static str {
        "mixin_method"
    }

    fn resolve(&self, ctx: &mut ResolutionContext, _errors: &mut Vec<NormalizeDiagnostic>) {
        let mut updates: Vec<(usize, Vec<String>, Vec<String>)> = Vec::new();

        for idx in 0..ctx.len() {
            let symbol = ctx.get(idx);
            let mut instance = symbol.instance_methods.clone();
            let mut class = symbol.class_methods.clone();

            for mixin in &symbol.mixins {
                let Some(module) = ctx.find(&mixin.module_name) else {
                    continue;
                };
                let target = match mixin.kind {
                    MixinKind::Include | MixinKind::Prepend => &mut instance,
                    MixinKind::Extend => &mut class,
                };
                for name in &module.instance_methods {
                    if !target.contains(name) {
                        target.push(name.clone());
                    }
                }
            }

            updates.push((idx, instance, class));
        }

        for (idx, instance, class) in updates {
            let symbol = ctx.get_mut(idx);
            symbol.available_instance_methods = instance;
            symbol.available_class_methods = class;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::{Mixin, Symbol};
    use crate::types::SymbolKind;

    fn module_with_methods(name: &str, methods: &[&str]) -> Symbol {
        let mut symbol = Symbol::new(SymbolKind::Module, name, name);
        symbol.instance_methods = methods.iter().map(|m| m.to_string()).collect();
        symbol
    }

    #[test]
    fn test_include_unions_into_instance_methods() {
        let mut ctx = ResolutionContext::new();
        ctx.add(module_with_methods("Validatable", &["validate", "valid?"]));
        let mut user = Symbol::new(SymbolKind::Class, "User", "User");
        user.mixins.push(Mixin::new(MixinKind::Include, "Validatable"));
        ctx.add(user);

        MixinMethodResolver.resolve(&mut ctx, &mut Vec::new());

        let user = ctx.find("User").unwrap();
        assert_eq!(user.available_instance_methods, vec!["validate", "valid?"]);
        assert!(user.available_class_methods.is_empty());
    }

    #[test]
    fn test_extend_unions_into_class_methods() {
        let mut ctx = ResolutionContext::new();
        ctx.add(module_with_methods("Searchable", &["search"]));
        let mut user = Symbol::new(SymbolKind::Class, "User", "User");
        user.mixins.push(Mixin::new(MixinKind::Extend, "Searchable"));
        ctx.add(user);

        MixinMethodResolver.resolve(&mut ctx, &mut Vec::new());

        let user = ctx.find("User").unwrap();
        assert_eq!(user.available_class_methods, vec!["search"]);
        assert!(user.available_instance_methods.is_empty());
    }

    #[test]
    fn test_prepend_goes_to_instance_set() {
        let mut ctx = ResolutionContext::new();
        ctx.add(module_with_methods("Audited", &["save"]));
        let mut user = Symbol::new(SymbolKind::Class, "User", "User");
        user.instance_methods = vec!["save".to_string(), "reload".to_string()];
        user.mixins.push(Mixin::new(MixinKind::Prepend, "Audited"));
        ctx.add(user);

        MixinMethodResolver.resolve(&mut ctx, &mut Vec::new());

        let user = ctx.find("User").unwrap();
        // Own methods first, module methods unioned without duplicates.
        assert_eq!(user.available_instance_methods, vec!["save", "reload"]);
    }

    #[test]
    fn test_unknown_mixin_target_skipped_silently() {
        let mut ctx = ResolutionContext::new();
        let mut user = Symbol::new(SymbolKind::Class, "User", "User");
        user.instance_methods = vec!["save".to_string()];
        user.mixins.push(Mixin::new(MixinKind::Include, "Ghost"));
        ctx.add(user);

        let mut errors = Vec::new();
        MixinMethodResolver.resolve(&mut ctx, &mut errors);

        assert!(errors.is_empty());
        assert_eq!(
            ctx.find("User").unwrap().available_instance_methods,
            vec!["save"]
        );
    }
}
