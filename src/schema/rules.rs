use crate::error::RuleError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Semantic role a dataset field can play
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FieldRole {
    Region,
    Latency,
    Uptime,
}

impl FieldRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldRole::Region => "region",
            FieldRole::Latency => "latency",
            FieldRole::Uptime => "uptime",
        }
    }
}

/// One discovery rule: a role plus a name predicate
///
/// Exactly one of `contains` or `exact` must be set.
///
/// # Example TOML
/// ```toml
/// [[rule]]
/// role = "region"
/// exact = ["location", "zone", "loc"]
/// ```
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FieldRule {
    pub role: FieldRole,

    /// Lowercase field name contains this substring
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contains: Option<String>,

    /// Lowercase field name equals one of these names
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exact: Option<Vec<String>>,
}

impl FieldRule {
    pub fn contains(role: FieldRole, pattern: &str) -> Self {
        Self {
            role,
            contains: Some(pattern.to_lowercase()),
            exact: None,
        }
    }

    pub fn exact(role: FieldRole, names: &[&str]) -> Self {
        Self {
            role,
            contains: None,
            exact: Some(names.iter().map(|n| n.to_lowercase()).collect()),
        }
    }

    /// Case-insensitive match against a field name
    pub fn matches(&self, field: &str) -> bool {
        let field = field.to_lowercase();
        if let Some(pattern) = &self.contains {
            return field.contains(pattern.as_str());
        }
        if let Some(names) = &self.exact {
            return names.iter().any(|n| *n == field);
        }
        false
    }

    fn validate(&self, index: usize) -> Result<(), RuleError> {
        match (&self.contains, &self.exact) {
            (Some(pattern), None) if pattern.is_empty() => Err(RuleError::EmptyPattern { index }),
            (None, Some(names)) if names.is_empty() || names.iter().any(|n| n.is_empty()) => {
                Err(RuleError::EmptyPattern { index })
            }
            (Some(_), None) | (None, Some(_)) => Ok(()),
            _ => Err(RuleError::AmbiguousMatcher { index }),
        }
    }

    fn normalized(mut self) -> Self {
        self.contains = self.contains.map(|p| p.to_lowercase());
        self.exact = self
            .exact
            .map(|names| names.into_iter().map(|n| n.to_lowercase()).collect());
        self
    }
}

/// Ordered, validated list of discovery rules
#[derive(Debug, Clone, PartialEq)]
pub struct RulePack {
    rules: Vec<FieldRule>,
}

#[derive(Deserialize)]
struct RuleFile {
    rule: Vec<FieldRule>,
}

impl RulePack {
    /// Validate and normalize a rule list
    ///
    /// # Errors
    /// Fails if a rule has zero or two matchers, an empty pattern, or if the
    /// pack has no rule for one of the required roles (region, latency).
    pub fn from_rules(rules: Vec<FieldRule>) -> Result<Self, RuleError> {
        for (i, rule) in rules.iter().enumerate() {
            rule.validate(i + 1)?;
        }
        for required in [FieldRole::Region, FieldRole::Latency] {
            if !rules.iter().any(|r| r.role == required) {
                return Err(RuleError::MissingRole(required.as_str()));
            }
        }

        Ok(Self {
            rules: rules.into_iter().map(FieldRule::normalized).collect(),
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, RuleError> {
        let file: RuleFile = toml::from_str(content)?;
        Self::from_rules(file.rule)
    }

    /// Load a rule pack from a TOML file
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self, RuleError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|source| RuleError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Built-in rule pack embedded from field-rules.toml
    pub fn default_rules() -> Result<Self, RuleError> {
        const DEFAULT_TOML: &str = include_str!("../../field-rules.toml");
        Self::from_toml_str(DEFAULT_TOML)
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    /// Rules for one role, in precedence order
    pub fn rules_for(&self, role: FieldRole) -> impl Iterator<Item = &FieldRule> {
        self.rules.iter().filter(move |r| r.role == role)
    }

    /// First field claimed for `role`
    ///
    /// Rule precedence dominates column order: a later rule only applies
    /// when no field matched any earlier rule.
    pub fn first_match<'f>(&self, role: FieldRole, fields: &'f [String]) -> Option<&'f str> {
        self.rules_for(role).find_map(|rule| {
            fields
                .iter()
                .find(|field| rule.matches(field))
                .map(String::as_str)
        })
    }
}
