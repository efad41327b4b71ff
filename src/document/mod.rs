use std::collections::BTreeMap;
use std::fmt::Write as _;

/// In-process model of the document root: attributes, class list, and
/// custom properties. There is exactly one owner; every write is
/// last-writer-wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleContext {
    attributes: BTreeMap<String, String>,
    classes: Vec<String>,
    properties: BTreeMap<String, String>,
}

impl StyleContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_attribute(&mut self, name: &str, value: &str) {
        self.attributes.insert(name.to_string(), value.to_string());
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn add_class(&mut self, class: &str) {
        if !self.has_class(class) {
            self.classes.push(class.to_string());
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|existing| existing == class)
    }

    /// Removes every class starting with `prefix`; returns how many were removed.
    pub fn remove_classes_with_prefix(&mut self, prefix: &str) -> usize {
        let before = self.classes.len();
        self.classes.retain(|class| !class.starts_with(prefix));
        before - self.classes.len()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn set_property(&mut self, name: &str, value: &str) {
        self.properties.insert(name.to_string(), value.to_string());
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn clear_properties(&mut self) {
        self.properties.clear();
    }

    /// Attribute and class markup for the root element, e.g. for an inline
    /// pre-paint snippet: `class="gradient-sunset" data-theme="sunset" ...`.
    pub fn root_attributes(&self) -> String {
        let mut parts = Vec::with_capacity(self.attributes.len() + 1);
        if !self.classes.is_empty() {
            parts.push(format!("class=\"{}\"", escape_attribute(&self.classes.join(" "))));
        }
        for (name, value) in &self.attributes {
            parts.push(format!("{name}=\"{}\"", escape_attribute(value)));
        }
        parts.join(" ")
    }

    /// Custom properties rendered as a `:root` rule.
    pub fn to_css(&self) -> String {
        let mut css = String::from(":root {\n");
        for (name, value) in &self.properties {
            let _ = writeln!(css, "  {name}: {value};");
        }
        css.push_str("}\n");
        css
    }
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}
