//! Swap rules — predicates over a visitor's entry URL that decide whether a
//! tracking number should be swapped in for that visitor.
//!
//! Evaluation is pure and deterministic: first matching rule wins, no match
//! defaults to "no swap". Malformed input (blank URLs, invalid regexes)
//! evaluates to "no swap" rather than failing — these decisions gate live
//! page loads.

use serde::{Deserialize, Serialize};

// ─── Rule ────────────────────────────────────────────────────────────────────

/// How a rule's pattern is applied to the entry URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlMatcher {
  Prefix,
  Contains,
  Regex,
}

/// What a matching rule decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwapAction {
  /// Swap the tracking number in for this visitor.
  Include,
  /// Explicitly keep the tracking number out, even if a later rule would
  /// include it.
  Exclude,
}

/// One entry-URL predicate owned by a number or pool. Read-only from the
/// engine's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRule {
  pub matcher: UrlMatcher,
  pub pattern: String,
  pub action:  SwapAction,
}

impl SwapRule {
  pub fn include(matcher: UrlMatcher, pattern: impl Into<String>) -> Self {
    Self { matcher, pattern: pattern.into(), action: SwapAction::Include }
  }

  pub fn exclude(matcher: UrlMatcher, pattern: impl Into<String>) -> Self {
    Self { matcher, pattern: pattern.into(), action: SwapAction::Exclude }
  }

  fn matches(&self, url: &str) -> bool {
    match self.matcher {
      UrlMatcher::Prefix => url.starts_with(&self.pattern),
      UrlMatcher::Contains => url.contains(&self.pattern),
      // An invalid pattern never matches.
      UrlMatcher::Regex => regex::Regex::new(&self.pattern)
        .map(|re| re.is_match(url))
        .unwrap_or(false),
    }
  }
}

// ─── Evaluation ──────────────────────────────────────────────────────────────

/// Decide whether the visitor's browsing context should trigger dynamic
/// number insertion for the owning number or pool.
///
/// Short-circuits on the first matching rule. A missing or blank entry URL
/// is "no swap".
pub fn should_swap(rules: &[SwapRule], entry_url: Option<&str>) -> bool {
  let Some(url) = entry_url.map(str::trim).filter(|u| !u.is_empty()) else {
    return false;
  };

  for rule in rules {
    if rule.matches(url) {
      return rule.action == SwapAction::Include;
    }
  }
  false
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn no_rules_means_no_swap() {
    assert!(!should_swap(&[], Some("https://example.com/")));
  }

  #[test]
  fn missing_or_blank_url_means_no_swap() {
    let rules = vec![SwapRule::include(UrlMatcher::Contains, "")];
    assert!(!should_swap(&rules, None));
    assert!(!should_swap(&rules, Some("")));
    assert!(!should_swap(&rules, Some("   ")));
  }

  #[test]
  fn first_matching_rule_wins() {
    let rules = vec![
      SwapRule::exclude(UrlMatcher::Contains, "utm_source=print"),
      SwapRule::include(UrlMatcher::Prefix, "https://example.com/"),
    ];
    assert!(!should_swap(
      &rules,
      Some("https://example.com/landing?utm_source=print"),
    ));
    assert!(should_swap(&rules, Some("https://example.com/landing")));
  }

  #[test]
  fn regex_rule_matches() {
    let rules =
      vec![SwapRule::include(UrlMatcher::Regex, r"[?&]gclid=[^&]+")];
    assert!(should_swap(&rules, Some("https://example.com/?gclid=abc123")));
    assert!(!should_swap(&rules, Some("https://example.com/?fbclid=xyz")));
  }

  #[test]
  fn invalid_regex_never_matches() {
    let rules = vec![SwapRule::include(UrlMatcher::Regex, "([unclosed")];
    assert!(!should_swap(&rules, Some("https://example.com/([unclosed")));
  }

  #[test]
  fn evaluation_is_pure() {
    let rules = vec![SwapRule::include(UrlMatcher::Contains, "campaign")];
    let url = Some("https://example.com/?campaign=spring");
    let first = should_swap(&rules, url);
    for _ in 0..10 {
      assert_eq!(should_swap(&rules, url), first);
    }
  }
}
