//! Scope propagation along dependency edges.

use pomdep_core::scope::Scope;

pub struct ScopeResolver;

impl ScopeResolver {
    /// Scope of a dependency declared as `declared` by a module that was
    /// itself reached with scope `inherited` (`None` for the root module).
    ///
    /// Returns `None` when the dependency does not propagate through that
    /// edge: test and provided dependencies of a transitive module, and any
    /// dependency declared with `import` scope.
    ///
    /// | declared \ inherited | compile  | runtime | provided | test |
    /// |----------------------|----------|---------|----------|------|
    /// | compile              | compile  | runtime | provided | test |
    /// | runtime              | runtime  | runtime | provided | test |
    /// | provided / test      | dropped  | dropped | dropped  | dropped |
    pub fn effective_scope(declared: Scope, inherited: Option<Scope>) -> Option<Scope> {
        use Scope::*;

        let Some(inherited) = inherited else {
            return (declared != Import).then_some(declared);
        };
        match (declared, inherited) {
            (Import, _) => None,
            (Test | Provided, _) => None,
            (System, _) => Some(System),
            (_, Test) => Some(Test),
            (_, Provided) => Some(Provided),
            (Runtime, _) | (_, Runtime) => Some(Runtime),
            (Compile, Compile | System | Import) => Some(Compile),
        }
    }

    /// Whether the subtree below a node with `scope` is entered at all.
    pub fn should_descend(scope: Scope) -> bool {
        scope != Scope::System
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Scope::*;

    #[test]
    fn root_dependencies_keep_declared_scope() {
        for scope in [Compile, Runtime, Provided, Test, System] {
            assert_eq!(ScopeResolver::effective_scope(scope, None), Some(scope));
        }
        assert_eq!(ScopeResolver::effective_scope(Import, None), None);
    }

    #[test]
    fn propagation_table() {
        let cases = [
            (Compile, Compile, Some(Compile)),
            (Compile, Runtime, Some(Runtime)),
            (Compile, Provided, Some(Provided)),
            (Compile, Test, Some(Test)),
            (Runtime, Compile, Some(Runtime)),
            (Runtime, Runtime, Some(Runtime)),
            (Runtime, Provided, Some(Provided)),
            (Runtime, Test, Some(Test)),
            (Provided, Compile, None),
            (Test, Compile, None),
            (Test, Test, None),
            (Provided, Provided, None),
            (System, Compile, Some(System)),
        ];
        for (declared, inherited, expected) in cases {
            assert_eq!(
                ScopeResolver::effective_scope(declared, Some(inherited)),
                expected,
                "{declared} under {inherited}"
            );
        }
    }

    #[test]
    fn system_is_a_leaf() {
        assert!(!ScopeResolver::should_descend(System));
        assert!(ScopeResolver::should_descend(Test));
    }
}
