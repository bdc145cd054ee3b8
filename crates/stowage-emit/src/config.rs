use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    pub use_colors: bool,
    pub indent: IndentStyle,
    /// Trail each statement with its node identity.
    pub show_ids: bool,
    /// Trail each statement with its type annotation, when it has one.
    pub show_types: bool,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            use_colors: true,
            indent: IndentStyle::Spaces(4),
            show_ids: false,
            show_types: false,
        }
    }
}

impl EmitterConfig {
    pub fn plain() -> Self {
        Self {
            use_colors: false,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndentStyle {
    Spaces(usize),
    Tabs,
}

impl IndentStyle {
    pub fn unit(&self) -> String {
        match self {
            IndentStyle::Spaces(n) => " ".repeat(*n),
            IndentStyle::Tabs => "\t".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indent_units() {
        assert_eq!(IndentStyle::Spaces(2).unit(), "  ");
        assert_eq!(IndentStyle::Tabs.unit(), "\t");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: EmitterConfig = serde_json::from_str(r#"{ "show_ids": true }"#).unwrap();
        assert!(config.show_ids);
        assert!(config.use_colors);
        assert_eq!(config.indent, IndentStyle::Spaces(4));
    }
}
