//! Namespace prefixing of class names and reference targets
//!
//! Local schemas refer to sibling classes through [`PREFIX_PLACEHOLDER`], e.g.
//! `"targetClass": "{{PREFIX}}Team"`. Applying a namespace resolves the token
//! to the live prefix; stripping a namespace puts the token back, so an
//! exported schema can be re-imported under any other prefix.
//!
//! Every transform returns a new [`SchemaSet`]; inputs are never mutated.

use crate::schema::{ClassSchema, SchemaSet};

/// Marker for "the active prefix goes here" inside a `targetClass`
pub const PREFIX_PLACEHOLDER: &str = "{{PREFIX}}";

/// A class-name namespace; the empty namespace is the identity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Namespace {
    prefix: Option<String>,
}

impl Namespace {
    /// Create a namespace; `None` or an empty prefix disables prefixing
    pub fn new(prefix: Option<impl Into<String>>) -> Self {
        let prefix = prefix.map(Into::into).filter(|p: &String| !p.is_empty());
        Self { prefix }
    }

    /// The namespace with no prefix
    pub fn none() -> Self {
        Self::default()
    }

    /// Active prefix, if any
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Whether a class name lies inside this namespace
    pub fn contains(&self, class_name: &str) -> bool {
        match &self.prefix {
            Some(prefix) => class_name.starts_with(prefix.as_str()),
            None => true,
        }
    }

    /// Prefix every class name and resolve placeholder tokens in targets
    pub fn apply(&self, set: &SchemaSet) -> SchemaSet {
        let Some(prefix) = self.prefix() else {
            return set.clone();
        };

        set.iter()
            .map(|class| {
                let mut class = rewrite_targets(class, |target| {
                    target
                        .strip_prefix(PREFIX_PLACEHOLDER)
                        .map(|rest| format!("{prefix}{rest}"))
                });
                class.class_name = format!("{prefix}{}", class.class_name);
                class
            })
            .collect()
    }

    /// Keep only the classes inside this namespace
    ///
    /// Remote classes outside the namespace are invisible to a run.
    pub fn scope(&self, set: &SchemaSet) -> SchemaSet {
        set.iter()
            .filter(|class| self.contains(&class.class_name))
            .cloned()
            .collect()
    }

    /// Inverse of [`Namespace::apply`] for a remote set
    ///
    /// Filters to the namespace, strips the prefix from class names and turns
    /// targets starting with the prefix back into placeholder tokens.
    pub fn strip(&self, set: &SchemaSet) -> SchemaSet {
        let Some(prefix) = self.prefix() else {
            return set.clone();
        };

        set.iter()
            .filter_map(|class| {
                let name = class.class_name.strip_prefix(prefix)?.to_string();
                let mut class = rewrite_targets(class, |target| {
                    target
                        .strip_prefix(prefix)
                        .map(|rest| format!("{PREFIX_PLACEHOLDER}{rest}"))
                });
                class.class_name = name;
                Some(class)
            })
            .collect()
    }
}

/// Copy a class, replacing each target for which `rewrite` returns a value
fn rewrite_targets<F>(class: &ClassSchema, rewrite: F) -> ClassSchema
where
    F: Fn(&str) -> Option<String>,
{
    let mut class = class.clone();
    for field in class.fields.values_mut() {
        if let Some(target) = field.target_class.as_deref().and_then(&rewrite) {
            field.target_class = Some(target);
        }
    }
    class
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldSchema, FieldType};
    use pretty_assertions::assert_eq;

    fn local_set() -> SchemaSet {
        SchemaSet::from_classes(vec![
            ClassSchema::new("Team").with_field("name", FieldSchema::new(FieldType::String)),
            ClassSchema::new("Player")
                .with_field("team", FieldSchema::pointer("{{PREFIX}}Team"))
                .with_field("friends", FieldSchema::relation("{{PREFIX}}Player"))
                .with_field("owner", FieldSchema::pointer("_User")),
        ])
    }

    #[test]
    fn apply_prefixes_names_and_resolves_tokens() {
        let prefixed = Namespace::new(Some("app_")).apply(&local_set());

        assert_eq!(prefixed.class_names(), vec!["app_Team", "app_Player"]);
        let player = prefixed.find("app_Player").unwrap();
        assert_eq!(player.fields["team"].target_class.as_deref(), Some("app_Team"));
        assert_eq!(player.fields["friends"].target_class.as_deref(), Some("app_Player"));
        assert_eq!(player.fields["owner"].target_class.as_deref(), Some("_User"));
    }

    #[test]
    fn apply_does_not_touch_input() {
        let set = local_set();
        let _ = Namespace::new(Some("app_")).apply(&set);
        assert_eq!(set, local_set());
    }

    #[test]
    fn round_trip_restores_original() {
        let namespace = Namespace::new(Some("app_"));
        let set = local_set();
        assert_eq!(namespace.strip(&namespace.apply(&set)), set);
    }

    #[test]
    fn scope_hides_foreign_classes() {
        let remote = SchemaSet::from_classes(vec![
            ClassSchema::new("app_Team"),
            ClassSchema::new("other_Team"),
            ClassSchema::new("_User"),
        ]);
        let scoped = Namespace::new(Some("app_")).scope(&remote);
        assert_eq!(scoped.class_names(), vec!["app_Team"]);
    }

    #[test]
    fn strip_filters_and_tokenizes() {
        let remote = SchemaSet::from_classes(vec![
            ClassSchema::new("app_Player").with_field("team", FieldSchema::pointer("app_Team")),
            ClassSchema::new("Unrelated"),
        ]);
        let stripped = Namespace::new(Some("app_")).strip(&remote);

        assert_eq!(stripped.class_names(), vec!["Player"]);
        assert_eq!(
            stripped.find("Player").unwrap().fields["team"].target_class.as_deref(),
            Some("{{PREFIX}}Team")
        );
    }

    #[test]
    fn literal_prefix_match_on_exact_names() {
        let namespace = Namespace::new(Some("app_"));
        let remote = SchemaSet::from_classes(vec![
            ClassSchema::new("app_").with_field("self", FieldSchema::pointer("app_")),
        ]);
        let stripped = namespace.strip(&remote);

        assert_eq!(stripped.class_names(), vec![""]);
        assert_eq!(
            stripped.find("").unwrap().fields["self"].target_class.as_deref(),
            Some("{{PREFIX}}")
        );
        assert_eq!(namespace.apply(&stripped), remote);
    }

    #[test]
    fn empty_namespace_is_identity() {
        let set = local_set();
        for namespace in [Namespace::none(), Namespace::new(Some(""))] {
            assert_eq!(namespace.prefix(), None);
            assert_eq!(namespace.apply(&set), set);
            assert_eq!(namespace.scope(&set), set);
            assert_eq!(namespace.strip(&set), set);
        }
    }
}
