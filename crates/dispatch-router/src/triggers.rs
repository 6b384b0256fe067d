//! The mechanical escalation checklist.
//!
//! Eight triggers, evaluated in a fixed order; the first match produces an
//! escalation with confidence 1.0 and a fixed reason. Everything here is a
//! pure function of the request text: cheap, deterministic, and auditable.
//! The low-confidence trigger is the only one not evaluated here — it
//! consumes the matcher result inside the router.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Keywords that signal judgment-heavy work (trigger a).
const JUDGMENT_KEYWORDS: [&str; 10] = [
    "complex",
    "best",
    "should i",
    "recommend",
    "design",
    "architecture",
    "strategy",
    "trade-off",
    "which approach",
    "decide",
];

/// Destructive verbs (trigger b, with a bulk quantifier).
const DESTRUCTIVE_VERBS: [&str; 3] = ["delete", "remove", "drop"];

/// Bulk quantifiers (trigger b, with a destructive verb).
const BULK_QUANTIFIERS: [&str; 3] = ["all", "multiple", "every"];

/// File operation verbs (trigger c, without an explicit path).
const FILE_OP_VERBS: [&str; 6] = ["edit", "modify", "change", "update", "delete", "remove"];

/// Verbs that mutate agent definitions (trigger d).
const MUTATING_VERBS: [&str; 9] = [
    "edit", "modify", "change", "update", "delete", "remove", "create", "add", "write",
];

/// Coordinating conjunctions (trigger e, two or more).
const CONJUNCTIONS: [&str; 5] = [" and ", ", then ", " after ", " before ", ";"];

/// Creation/design keywords (trigger f).
const CREATION_KEYWORDS: [&str; 5] = ["new", "create", "design", "build", "implement"];

/// Meta-request keywords (trigger h, in interrogative form).
const META_KEYWORDS: [&str; 4] = ["router", "routing", "agent", "delegate"];

/// Question openers that mark a request as interrogative (trigger h).
const INTERROGATIVES: [&str; 14] = [
    "what", "how", "why", "which", "when", "where", "who", "can", "could", "does", "do", "is",
    "are", "should",
];

/// A token that reads as an explicit file path or filename: contains a
/// path separator, or has a short alphanumeric extension.
static PATH_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[\w.\-]*/[\w./\-]*|[\w\-]+\.[A-Za-z0-9]{1,8})$")
        .expect("path token pattern is valid")
});

/// The simple creation form exempt from trigger f: `new file <name>`.
static NEW_FILE_FORM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^new file \S+$").expect("new-file pattern is valid"));

/// Evaluate triggers a–f and h, in order. `Some(reason)` on the first
/// match; `None` when the request should go on to the matcher.
#[must_use]
pub fn checklist(request: &str) -> Option<&'static str> {
    let lower = request.to_lowercase();
    let tokens = word_tokens(&lower);

    // a. Judgment keywords.
    if JUDGMENT_KEYWORDS.iter().any(|k| contains_keyword(&lower, &tokens, k)) {
        return Some("Request contains complexity signal keywords");
    }

    // b. Destructive verb together with a bulk quantifier.
    let destructive = DESTRUCTIVE_VERBS.iter().any(|v| tokens.contains(*v));
    let bulk = BULK_QUANTIFIERS.iter().any(|q| tokens.contains(*q)) || lower.contains('*');
    if destructive && bulk {
        return Some("Bulk destructive operation");
    }

    // c. File operation with no recognisable target.
    let file_op = FILE_OP_VERBS.iter().any(|v| tokens.contains(*v));
    if file_op && explicit_path_token(request).is_none() {
        return Some("File operation needs path discovery");
    }

    // d. Touching agent definitions.
    let mentions_agent_dir = lower.contains(".claude/agents");
    let mutating = MUTATING_VERBS.iter().any(|v| tokens.contains(*v));
    if mentions_agent_dir && mutating {
        return Some("Agent definition modification");
    }

    // e. Multiple objectives.
    if conjunction_count(&lower) >= 2 {
        return Some("Multiple objectives");
    }

    // f. Creation/design work, unless it is the trivial `new file <name>`.
    let creation = CREATION_KEYWORDS.iter().any(|k| tokens.contains(*k));
    if creation && !NEW_FILE_FORM.is_match(lower.trim()) {
        return Some("Creation/design requires planning");
    }

    // h. Asking about the routing system itself.
    let meta = META_KEYWORDS.iter().any(|k| tokens.contains(*k));
    if meta && is_interrogative(&lower) {
        return Some("Meta-request about routing");
    }

    None
}

/// Total occurrences of coordinating conjunctions in the lowercased text.
#[must_use]
pub fn conjunction_count(lower: &str) -> usize {
    CONJUNCTIONS
        .iter()
        .map(|c| lower.matches(c).count())
        .sum()
}

/// The first token that reads as an explicit file path or filename.
///
/// Tokens are whitespace-separated with surrounding punctuation trimmed,
/// so `README.md:` and `(src/lib.rs)` both count.
#[must_use]
pub fn explicit_path_token(request: &str) -> Option<String> {
    request
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !(c.is_alphanumeric() || c == '/' || c == '.')))
        .map(|t| t.trim_end_matches('.'))
        .find(|t| !t.is_empty() && PATH_TOKEN.is_match(t))
        .map(ToOwned::to_owned)
}

/// Whether the request is syntactically simple: at most one operation
/// verb and at most one conjunction. Used by the explicit-path exception.
#[must_use]
pub fn is_syntactically_simple(request: &str) -> bool {
    let lower = request.to_lowercase();
    let tokens = word_tokens(&lower);
    let verb_count = FILE_OP_VERBS
        .iter()
        .chain(CREATION_KEYWORDS.iter())
        .filter(|v| tokens.contains(**v))
        .count();
    verb_count <= 1 && conjunction_count(&lower) <= 1
}

/// Alphanumeric word tokens of the lowercased text.
fn word_tokens(lower: &str) -> HashSet<&str> {
    lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Single words match as token prefixes (so `complexity` and `designing`
/// count); phrases match as substrings of the lowercased text.
fn contains_keyword(lower: &str, tokens: &HashSet<&str>, keyword: &str) -> bool {
    if keyword.contains(' ') || keyword.contains('-') {
        lower.contains(keyword)
    } else {
        tokens.iter().any(|t| t.starts_with(keyword))
    }
}

fn is_interrogative(lower: &str) -> bool {
    if lower.trim_end().ends_with('?') {
        return true;
    }
    lower
        .split_whitespace()
        .next()
        .is_some_and(|first| INTERROGATIVES.contains(&first))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_judgment_keyword_escalates() {
        assert_eq!(
            checklist("Which approach is best for authentication?"),
            Some("Request contains complexity signal keywords")
        );
    }

    #[test]
    fn test_judgment_prefix_matches_morphology() {
        assert_eq!(
            checklist("Reduce the complexity here"),
            Some("Request contains complexity signal keywords")
        );
    }

    #[test]
    fn test_bulk_destructive_escalates() {
        assert_eq!(
            checklist("Delete all files in the logs directory"),
            Some("Bulk destructive operation")
        );
    }

    #[test]
    fn test_destructive_without_bulk_needs_path() {
        // No quantifier, no path: falls to the pathless file-op trigger.
        assert_eq!(
            checklist("Delete the temporary file"),
            Some("File operation needs path discovery")
        );
    }

    #[test]
    fn test_glob_counts_as_bulk() {
        assert_eq!(
            checklist("remove *.tmp"),
            Some("Bulk destructive operation")
        );
    }

    #[test]
    fn test_pathless_file_op_escalates() {
        assert_eq!(
            checklist("Update the installation instructions"),
            Some("File operation needs path discovery")
        );
    }

    #[test]
    fn test_file_op_with_path_passes() {
        assert_eq!(checklist("Fix typo in README.md: change 'teh' to 'the'"), None);
    }

    #[test]
    fn test_agent_definition_modification() {
        assert_eq!(
            checklist("edit .claude/agents/haiku-general.yaml to widen its scope"),
            Some("Agent definition modification")
        );
    }

    #[test]
    fn test_two_conjunctions_escalate() {
        assert_eq!(
            checklist("Fix a.rs and b.rs and push"),
            Some("Multiple objectives")
        );
    }

    #[test]
    fn test_one_conjunction_passes_trigger_e() {
        assert_ne!(checklist("Fix typo in a.rs and rerun"), Some("Multiple objectives"));
    }

    #[test]
    fn test_semicolon_counts_as_conjunction() {
        assert_eq!(
            checklist("fix lint in x.rs; bump version, then tag"),
            Some("Multiple objectives")
        );
    }

    #[test]
    fn test_creation_requires_planning() {
        assert_eq!(
            checklist("implement a retry helper in util.rs"),
            Some("Creation/design requires planning")
        );
    }

    #[test]
    fn test_new_file_form_exempt() {
        assert_eq!(checklist("new file scratch.txt"), None);
    }

    #[test]
    fn test_meta_request_escalates() {
        assert_eq!(
            checklist("why did the router pick that agent?"),
            Some("Meta-request about routing")
        );
    }

    #[test]
    fn test_meta_keyword_without_question_passes() {
        assert_eq!(checklist("rename router.log to x.log"), None);
    }

    #[test]
    fn test_plain_request_passes() {
        assert_eq!(checklist("fix typo in src/lib.rs"), None);
    }

    #[test]
    fn test_explicit_path_token_extraction() {
        assert_eq!(
            explicit_path_token("Fix typo in README.md: now").as_deref(),
            Some("README.md")
        );
        assert_eq!(
            explicit_path_token("see src/lib.rs please").as_deref(),
            Some("src/lib.rs")
        );
        assert_eq!(explicit_path_token("fix the thing"), None);
    }

    #[test]
    fn test_sentence_final_period_is_not_extension() {
        assert_eq!(explicit_path_token("update the config."), None);
    }

    #[test]
    fn test_syntactic_simplicity() {
        assert!(is_syntactically_simple("fix typo in README.md"));
        assert!(!is_syntactically_simple("edit a.rs and update b.rs, then push"));
    }

    #[test]
    fn test_conjunction_count_counts_repeats() {
        assert_eq!(conjunction_count("a and b and c"), 2);
    }
}
