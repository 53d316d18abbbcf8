use glob::Pattern;

/// Host pattern used to narrow a session to some hosts
#[derive(Debug, Clone)]
pub enum HostPattern {
    /// Exact hostname match (case-insensitive)
    Exact(String),
    /// Glob pattern match (e.g., *.example.com)
    Glob(Pattern),
}

impl HostPattern {
    /// Parse a host pattern string
    ///
    /// Patterns containing '*' or '?' are globs, anything else is an exact
    /// match. A trailing root dot is ignored on both sides.
    pub fn parse(pattern: &str) -> crate::Result<Self> {
        let normalized = normalize(pattern);
        if normalized.is_empty() {
            return Err(crate::Error::InvalidPattern(
                "host pattern cannot be empty".to_string(),
            ));
        }

        if normalized.contains('*') || normalized.contains('?') {
            let glob_pattern = Pattern::new(&normalized).map_err(|e| {
                crate::Error::InvalidPattern(format!("Invalid glob pattern '{}': {}", pattern, e))
            })?;
            Ok(HostPattern::Glob(glob_pattern))
        } else {
            Ok(HostPattern::Exact(normalized))
        }
    }

    pub fn matches(&self, host: &str) -> bool {
        let host = normalize(host);
        match self {
            HostPattern::Exact(pattern) => &host == pattern,
            HostPattern::Glob(pattern) => pattern.matches(&host),
        }
    }
}

fn normalize(host: &str) -> String {
    host.trim().trim_end_matches('.').to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_host() {
        let pattern = HostPattern::parse("Charles.Example.org").unwrap();
        assert!(pattern.matches("charles.example.org"));
        assert!(pattern.matches("charles.example.org."));
        assert!(!pattern.matches("www.charles.example.org"));
    }

    #[test]
    fn test_glob_subdomains() {
        let pattern = HostPattern::parse("*.tracking.net").unwrap();
        assert!(pattern.matches("pixel.tracking.net"));
        assert!(pattern.matches("EU.PIXEL.TRACKING.NET"));
        assert!(!pattern.matches("tracking.net"));
    }

    #[test]
    fn test_glob_single_character() {
        let pattern = HostPattern::parse("edge?.cdn.io").unwrap();
        assert!(pattern.matches("edge1.cdn.io"));
        assert!(!pattern.matches("edge.cdn.io"));
        assert!(!pattern.matches("edge12.cdn.io"));
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(HostPattern::parse("  ").is_err());
        assert!(HostPattern::parse("[.example.com*").is_err());
    }
}
