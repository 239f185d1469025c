//! Compiled pattern/replacement pair.

use std::fmt;

use regex_lite::Regex;

use crate::config::ConfigError;

/// Result of applying a rule to one tracker URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteOutcome {
    /// The pattern did not match, or the replacement produced the same URL.
    Unchanged,
    /// The URL would become this string.
    Changed(String),
}

/// A tracker rewrite rule.
///
/// The replacement template uses `$1`..`$9` for numbered groups, `$&` for the
/// whole match, `$<name>` for named groups and `$$` for a literal dollar sign.
/// A reference to a group the pattern does not define is kept as literal text.
/// Every non-overlapping match is replaced.
#[derive(Clone)]
pub struct RewriteRule {
    pattern: Regex,
    template: String,
    replacement: String,
}

impl RewriteRule {
    /// Compile a rule, failing on an invalid pattern.
    pub fn new(pattern: &str, replacement: &str) -> Result<Self, ConfigError> {
        let pattern = Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern(e.to_string()))?;
        Ok(Self {
            template: translate_template(replacement, &pattern),
            pattern,
            replacement: replacement.to_string(),
        })
    }

    /// Apply the rule to a URL.
    pub fn apply(&self, url: &str) -> RewriteOutcome {
        let rewritten = self.pattern.replace_all(url, self.template.as_str());
        if rewritten == url {
            RewriteOutcome::Unchanged
        } else {
            RewriteOutcome::Changed(rewritten.into_owned())
        }
    }
}

impl fmt::Debug for RewriteRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RewriteRule")
            .field("pattern", &self.pattern.as_str())
            .field("replacement", &self.replacement)
            .finish()
    }
}

/// Convert a `$1`-style template into the braced form the regex engine expands
/// unambiguously, so `$1abc` means group 1 followed by `abc`.
fn translate_template(template: &str, pattern: &Regex) -> String {
    let mut out = String::with_capacity(template.len() + 8);
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some('$') => {
                chars.next();
                out.push_str("$$");
            }
            Some('&') => {
                chars.next();
                out.push_str("${0}");
            }
            Some(d @ '1'..='9') => {
                chars.next();
                let group = d.to_digit(10).map_or(0, |n| n as usize);
                if group < pattern.captures_len() {
                    out.push_str("${");
                    out.push(d);
                    out.push('}');
                } else {
                    out.push_str("$$");
                    out.push(d);
                }
            }
            Some('<') => {
                let rest: String = chars.clone().skip(1).take_while(|c| *c != '>').collect();
                let closed = chars.clone().nth(1 + rest.chars().count()) == Some('>');
                let known = pattern.capture_names().flatten().any(|n| n == rest);
                if closed && known {
                    for _ in 0..rest.chars().count() + 2 {
                        chars.next();
                    }
                    out.push_str("${");
                    out.push_str(&rest);
                    out.push('}');
                } else {
                    out.push_str("$$");
                }
            }
            _ => out.push_str("$$"),
        }
    }

    out
}
