//! Placeholder substitution for file patterns, line patterns and subjects
//!
//! A template is plain text with `{name}` tokens. Braces that do not enclose
//! an identifier (such as the `{4}` of a regex quantifier) are kept as text.

use std::collections::HashMap;

/// Replaced by the formatted date of a log file
pub const DATE: &str = "date";
/// Replaced by a severity label
pub const TYPE: &str = "type";
/// Replaced by the configured environment name
pub const ENV: &str = "env";
/// Replaced by the label of the breached severity
pub const LEVEL: &str = "level";

/// Mapping from token name to replacement
pub type TokenValues<'a> = HashMap<&'a str, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Token(String),
}

/// A parsed template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(source: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = source;

        while let Some(open) = rest.find('{') {
            literal.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            match after.find('}') {
                Some(close) if is_token_name(&after[..close]) => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Token(after[..close].to_string()));
                    rest = &after[close + 1..];
                }
                _ => {
                    literal.push('{');
                    rest = after;
                }
            }
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self {
            source: source.to_string(),
            segments,
        }
    }

    /// The text the template was parsed from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the template references `token`
    pub fn contains(&self, token: &str) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Token(name) if name == token))
    }

    /// Substitute known tokens, leaving unknown ones untouched
    pub fn render(&self, values: &TokenValues<'_>) -> String {
        self.render_with(
            |text| text.to_string(),
            |name| values.get(name).cloned(),
            |name| format!("{{{}}}", name),
        )
    }

    /// Build regular expression source from the template
    ///
    /// Literal text is escaped, tokens are replaced by the regex fragments in
    /// `fragments`. Unknown tokens match themselves literally.
    pub fn to_regex_source(&self, fragments: &TokenValues<'_>) -> String {
        self.render_with(
            regex::escape,
            |name| fragments.get(name).cloned(),
            |name| regex::escape(&format!("{{{}}}", name)),
        )
    }

    fn render_with<L, T, U>(&self, literal: L, token: T, unknown: U) -> String
    where
        L: Fn(&str) -> String,
        T: Fn(&str) -> Option<String>,
        U: Fn(&str) -> String,
    {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(&literal(text)),
                Segment::Token(name) => match token(name) {
                    Some(value) => out.push_str(&value),
                    None => out.push_str(&unknown(name)),
                },
            }
        }
        out
    }
}

fn is_token_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&'static str, &str)]) -> TokenValues<'static> {
        pairs.iter().map(|(k, v)| (*k, v.to_string())).collect()
    }

    #[test]
    fn test_render_substitutes_tokens() {
        let template = Template::parse("[{env}] Log alert: {level}");
        let rendered = template.render(&values(&[(ENV, "staging"), (LEVEL, "ERROR")]));
        assert_eq!(rendered, "[staging] Log alert: ERROR");
    }

    #[test]
    fn test_render_keeps_unknown_tokens() {
        let template = Template::parse("app-{date}-{host}.log");
        let rendered = template.render(&values(&[(DATE, "2024-01-01")]));
        assert_eq!(rendered, "app-2024-01-01-{host}.log");
    }

    #[test]
    fn test_regex_quantifiers_are_not_tokens() {
        let template = Template::parse(r"\d{4} {type}");
        assert!(template.contains(TYPE));
        assert_eq!(
            template.render(&values(&[(TYPE, "ERROR")])),
            r"\d{4} ERROR"
        );
    }

    #[test]
    fn test_unterminated_brace_is_literal() {
        let template = Template::parse("a{b");
        assert_eq!(template.render(&TokenValues::new()), "a{b");
        assert!(!template.contains("b"));
    }

    #[test]
    fn test_to_regex_source_escapes_literals() {
        let template = Template::parse("app.{date}.log");
        let source = template.to_regex_source(&values(&[(DATE, r"\d+")]));
        assert_eq!(source, r"app\.\d+\.log");
    }

    #[test]
    fn test_repeated_tokens() {
        let template = Template::parse("{env}/{env}");
        assert_eq!(template.render(&values(&[(ENV, "x")])), "x/x");
        assert_eq!(template.source(), "{env}/{env}");
    }
}
