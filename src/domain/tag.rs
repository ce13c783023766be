use crate::domain::Version;
use crate::error::{ReleaseError, Result};
use regex::Regex;

const VERSION_PLACEHOLDER: &str = "{version}";

/// Placeholder spellings of JSON configs from the JavaScript tool, read as `{version}`
const LEGACY_PLACEHOLDERS: [&str; 3] = ["{{tag}}", "{{release}}", "{{version}}"];

/// Naming template for tags and release titles (e.g., "v{version}", "web-{version}")
#[derive(Debug, Clone)]
pub struct TagPattern {
    pattern: String,
    matcher: Regex,
}

impl TagPattern {
    /// Create a new pattern; it must contain exactly one `{version}` placeholder.
    ///
    /// `{{tag}}`, `{{release}}` and `{{version}}` are accepted as spellings of it.
    pub fn new(pattern: impl Into<String>) -> Result<Self> {
        let pattern = LEGACY_PLACEHOLDERS
            .iter()
            .fold(pattern.into(), |acc, legacy| {
                acc.replace(legacy, VERSION_PLACEHOLDER)
            });

        if pattern.matches(VERSION_PLACEHOLDER).count() != 1 {
            return Err(ReleaseError::template(format!(
                "Pattern '{}' must contain exactly one {} placeholder",
                pattern, VERSION_PLACEHOLDER
            )));
        }

        // Escape everything, then swap the escaped placeholder for a version capture
        let escaped = regex::escape(&pattern);
        let regex_pattern = escaped.replace(r"\{version\}", r"(\d+\.\d+\.\d+)");
        let matcher = Regex::new(&format!("^{}$", regex_pattern))
            .map_err(|e| ReleaseError::template(format!("Invalid pattern '{}': {}", pattern, e)))?;

        Ok(TagPattern { pattern, matcher })
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Format a version according to pattern
    /// Example: pattern="v{version}", version=1.2.3 -> "v1.2.3"
    pub fn render(&self, version: &Version) -> String {
        self.pattern.replace(VERSION_PLACEHOLDER, &version.to_string())
    }

    /// Validate if a name matches this pattern
    pub fn matches(&self, name: &str) -> bool {
        self.matcher.is_match(name)
    }

    /// Extract the version embedded in a name produced by this pattern
    pub fn extract_version(&self, name: &str) -> Option<Version> {
        let captures = self.matcher.captures(name)?;
        Version::parse(captures.get(1)?.as_str()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_render() {
        let pattern = TagPattern::new("v{version}").unwrap();
        assert_eq!(pattern.render(&Version::new(1, 2, 3)), "v1.2.3");
    }

    #[test]
    fn test_pattern_render_with_suffix() {
        let pattern = TagPattern::new("{version}-main").unwrap();
        assert_eq!(pattern.render(&Version::new(1, 2, 3)), "1.2.3-main");
    }

    #[test]
    fn test_pattern_matches() {
        let pattern = TagPattern::new("v{version}").unwrap();
        assert!(pattern.matches("v1.2.3"));
        assert!(!pattern.matches("release-1.2.3"));
        assert!(!pattern.matches("v1.2.3-web"));
    }

    #[test]
    fn test_pattern_escapes_regex_metacharacters() {
        let pattern = TagPattern::new("pkg.{version}+x").unwrap();
        assert!(pattern.matches("pkg.1.0.0+x"));
        assert!(!pattern.matches("pkgX1.0.0+x"));
    }

    #[test]
    fn test_extract_version() {
        let pattern = TagPattern::new("web-{version}").unwrap();
        assert_eq!(
            pattern.extract_version("web-2.10.0"),
            Some(Version::new(2, 10, 0))
        );
        assert_eq!(pattern.extract_version("api-2.10.0"), None);
    }

    #[test]
    fn test_legacy_placeholders() {
        let tag = TagPattern::new("{{tag}}-main").unwrap();
        assert_eq!(tag.as_str(), "{version}-main");
        assert_eq!(
            tag.extract_version("1.4.0-main"),
            Some(Version::new(1, 4, 0))
        );

        let release = TagPattern::new("Main - {{release}}").unwrap();
        assert_eq!(release.render(&Version::new(1, 4, 0)), "Main - 1.4.0");
        assert!(TagPattern::new("{{version}}").is_ok());
        assert!(TagPattern::new("{{tag}}-{version}").is_err());
    }

    #[test]
    fn test_pattern_requires_single_placeholder() {
        assert!(TagPattern::new("release").is_err());
        assert!(TagPattern::new("{version}-{version}").is_err());
    }
}
