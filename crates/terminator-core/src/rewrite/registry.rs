/*!
# Rule Registry

The rules shipped with the engine, in application order. The table is
fixed at compile time; a `RuleSet` is the ordered subset active for a run.
*/

use super::rule::Rule;
use super::rules::{
    CastToConversion, ContainerMethods, CoutToPrint, ForLoopToRange, IncludeToImport, IntegerDivision,
    MainEntryGuard, MathCalls,
};
use crate::error::UnknownRule;

/// One entry of the static rule table.
pub struct RuleInfo {
    pub name: &'static str,
    pub description: &'static str,
    constructor: fn() -> Box<dyn Rule>,
}

impl RuleInfo {
    pub fn build(&self) -> Box<dyn Rule> {
        (self.constructor)()
    }
}

fn build<R: Rule + Default + 'static>() -> Box<dyn Rule> {
    Box::new(R::default())
}

static REGISTRY: &[RuleInfo] = &[
    RuleInfo {
        name: IncludeToImport::NAME,
        description: IncludeToImport::DESCRIPTION,
        constructor: build::<IncludeToImport>,
    },
    RuleInfo {
        name: ForLoopToRange::NAME,
        description: ForLoopToRange::DESCRIPTION,
        constructor: build::<ForLoopToRange>,
    },
    RuleInfo {
        name: CoutToPrint::NAME,
        description: CoutToPrint::DESCRIPTION,
        constructor: build::<CoutToPrint>,
    },
    RuleInfo {
        name: CastToConversion::NAME,
        description: CastToConversion::DESCRIPTION,
        constructor: build::<CastToConversion>,
    },
    RuleInfo {
        name: IntegerDivision::NAME,
        description: IntegerDivision::DESCRIPTION,
        constructor: build::<IntegerDivision>,
    },
    RuleInfo {
        name: MathCalls::NAME,
        description: MathCalls::DESCRIPTION,
        constructor: build::<MathCalls>,
    },
    RuleInfo {
        name: ContainerMethods::NAME,
        description: ContainerMethods::DESCRIPTION,
        constructor: build::<ContainerMethods>,
    },
    RuleInfo {
        name: MainEntryGuard::NAME,
        description: MainEntryGuard::DESCRIPTION,
        constructor: build::<MainEntryGuard>,
    },
];

/// Every registered rule, in registration order.
pub fn registered() -> &'static [RuleInfo] {
    REGISTRY
}

/// An ordered set of active rules.
pub struct RuleSet {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleSet {
    /// All registered rules.
    pub fn all() -> Self {
        Self {
            rules: REGISTRY.iter().map(RuleInfo::build).collect(),
        }
    }

    /// The named rules, kept in registration order whatever order the names
    /// come in.
    pub fn select<S: AsRef<str>>(names: &[S]) -> Result<Self, UnknownRule> {
        for name in names {
            let name = name.as_ref();
            if !REGISTRY.iter().any(|info| info.name == name) {
                return Err(UnknownRule {
                    name: name.to_string(),
                    available: REGISTRY.iter().map(|info| info.name).collect::<Vec<_>>().join(", "),
                });
            }
        }
        let rules = REGISTRY
            .iter()
            .filter(|info| names.iter().any(|name| name.as_ref() == info.name))
            .map(RuleInfo::build)
            .collect();
        Ok(Self { rules })
    }

    /// All rules, or only the listed ones.
    pub fn from_allow_list(names: Option<&[String]>) -> Result<Self, UnknownRule> {
        match names {
            Some(names) => Self::select(names),
            None => Ok(Self::all()),
        }
    }

    /// Custom rules, applied in the given order.
    pub fn from_rules(rules: Vec<Box<dyn Rule>>) -> Self {
        Self { rules }
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|rule| rule.as_ref())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::all()
    }
}

impl std::fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_order() {
        let names = RuleSet::all().names();
        assert_eq!(
            names,
            vec![
                "IncludeToImport",
                "ForLoopToRange",
                "CoutToPrint",
                "CastToConversion",
                "IntegerDivision",
                "MathCalls",
                "ContainerMethods",
                "MainEntryGuard",
            ]
        );
    }

    #[test]
    fn test_registry_names_match_rules() {
        for info in registered() {
            let rule = info.build();
            assert_eq!(rule.name(), info.name);
            assert_eq!(rule.description(), info.description);
        }
    }

    #[test]
    fn test_select_keeps_registration_order() -> anyhow::Result<()> {
        let set = RuleSet::select(&["MainEntryGuard", "CoutToPrint"])?;
        assert_eq!(set.names(), vec!["CoutToPrint", "MainEntryGuard"]);
        Ok(())
    }

    #[test]
    fn test_select_unknown_rule() {
        match RuleSet::select(&["CoutToPrint", "GotoToLoop"]) {
            Err(UnknownRule { name, available }) => {
                assert_eq!(name, "GotoToLoop");
                assert!(available.contains("ForLoopToRange"));
            }
            other => panic!("Expected UnknownRule, got {:?}", other),
        }
    }

    #[test]
    fn test_from_allow_list() -> anyhow::Result<()> {
        assert_eq!(RuleSet::from_allow_list(None)?.len(), registered().len());
        let only = vec!["IntegerDivision".to_string()];
        assert_eq!(RuleSet::from_allow_list(Some(only.as_slice()))?.names(), vec!["IntegerDivision"]);
        Ok(())
    }
}
