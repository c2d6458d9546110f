//! Step token parsing.
//!
//! Step names arrive as raw strings on the command line. Some encode
//! parameters in hyphen-delimited segments (`compile-es5-strict`), some
//! forward to npm scripts (`npm-lint-fix`), and the rest name a fixed
//! operation verbatim. Parsing is pure and total: unrecognized names
//! are classified as [`ParsedStep::Named`] and resolved (or skipped) at
//! dispatch time, never rejected here.

const NPM_PREFIX: &str = "npm-";
const COMPILE_PREFIX: &str = "compile-";

/// A classified step token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedStep {
    /// `npm-<module>-<script...>`: forwarded to the package manager's
    /// run-script verb under the hyphen-joined remainder
    NpmPassthrough { segments: Vec<String> },

    /// `compile-<level>[-<strict?>]`: a compiler invocation with a
    /// language level and an optional strictness flag
    Compile {
        language_level: String,
        strict: bool,
    },

    /// Everything else, matched verbatim against the dispatch table
    Named(String),
}

impl ParsedStep {
    /// Classify a raw step token
    pub fn parse(token: &str) -> Self {
        if let Some(rest) = token.strip_prefix(NPM_PREFIX) {
            return ParsedStep::NpmPassthrough {
                segments: rest.split('-').map(str::to_string).collect(),
            };
        }

        if let Some(rest) = token.strip_prefix(COMPILE_PREFIX) {
            let mut parts = rest.splitn(2, '-');
            let language_level = parts.next().unwrap_or_default().to_string();
            // An empty trailing segment means "parameter absent", not an error
            let strict = parts.next().map_or(false, |s| !s.is_empty());
            return ParsedStep::Compile {
                language_level,
                strict,
            };
        }

        ParsedStep::Named(token.to_string())
    }

    /// Reconstructed script name for a passthrough step, hyphen-joined
    /// in the original order. Empty for the other variants.
    pub fn script_name(&self) -> String {
        match self {
            ParsedStep::NpmPassthrough { segments } => segments.join("-"),
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_without_strictness() {
        assert_eq!(
            ParsedStep::parse("compile-es5"),
            ParsedStep::Compile {
                language_level: "es5".to_string(),
                strict: false,
            }
        );
    }

    #[test]
    fn test_compile_with_strictness() {
        assert_eq!(
            ParsedStep::parse("compile-es5-strict"),
            ParsedStep::Compile {
                language_level: "es5".to_string(),
                strict: true,
            }
        );
    }

    #[test]
    fn test_compile_empty_trailing_segment_means_absent() {
        assert_eq!(
            ParsedStep::parse("compile-es2017-"),
            ParsedStep::Compile {
                language_level: "es2017".to_string(),
                strict: false,
            }
        );
    }

    #[test]
    fn test_npm_passthrough_script_name_preserves_order() {
        let step = ParsedStep::parse("npm-lint-fix");
        assert_eq!(
            step,
            ParsedStep::NpmPassthrough {
                segments: vec!["lint".to_string(), "fix".to_string()],
            }
        );
        assert_eq!(step.script_name(), "lint-fix");
    }

    #[test]
    fn test_npm_single_segment() {
        let step = ParsedStep::parse("npm-docs");
        assert_eq!(step.script_name(), "docs");
    }

    #[test]
    fn test_named_step_is_verbatim() {
        assert_eq!(
            ParsedStep::parse("run-unit-tests"),
            ParsedStep::Named("run-unit-tests".to_string())
        );
    }

    #[test]
    fn test_unrecognized_named_step_does_not_error() {
        // Unresolved dispatch is the dispatcher's concern, not parsing's
        assert_eq!(
            ParsedStep::parse("frobnicate-the-widgets"),
            ParsedStep::Named("frobnicate-the-widgets".to_string())
        );
    }
}
