use std::collections::BTreeMap;

/// Declarative rules describing how to find entries in a page.
///
/// The context selector locates one node per candidate entry; every other
/// field selector is evaluated relative to that node. Templates, keyed by
/// field name, override the extracted value of their field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRules {
    context: String,
    fields: BTreeMap<String, String>,
    templates: BTreeMap<String, String>,
}

impl ExtractionRules {
    /// Key of the context selector inside the `entry.selectors` table.
    pub const CONTEXT_KEY: &'static str = "context";

    /// Builds a rule set. A `context` entry left in `fields` is ignored.
    pub fn new(
        context: impl Into<String>,
        mut fields: BTreeMap<String, String>,
        templates: BTreeMap<String, String>,
    ) -> Self {
        fields.remove(Self::CONTEXT_KEY);
        Self {
            context: context.into(),
            fields,
            templates,
        }
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    /// Field name → selector, excluding the context selector.
    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    pub fn templates(&self) -> &BTreeMap<String, String> {
        &self.templates
    }
}
