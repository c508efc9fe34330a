//! Generates potential email address patterns based on names and domain.

use std::collections::HashSet;

/// Generates common corporate address patterns for one name, most common first:
///
/// `first`, `first.last`, `firstlast`, `f.last`, `flast`, `first_last`,
/// `first-last`, `first.l`, `last.first`
///
/// Names are trimmed and lower-cased; the domain is only trimmed. Duplicates
/// (e.g. from one-letter names) are dropped keeping the first occurrence, and
/// the list is cut to `max_count`. Returns an empty vector if any input is
/// empty after trimming.
pub(crate) fn generate_email_patterns(
    first_name: &str,
    last_name: &str,
    domain: &str,
    max_count: usize,
) -> Vec<String> {
    let first = first_name.trim().to_lowercase();
    let last = last_name.trim().to_lowercase();
    let domain = domain.trim();

    if first.is_empty() || last.is_empty() || domain.is_empty() {
        tracing::debug!(target: "search_task",
            "Cannot generate patterns: empty name part or domain ('{}' '{}' @ '{}')",
            first_name, last_name, domain
        );
        return Vec::new();
    }

    // Both names are non-empty here.
    let first_initial: String = first.chars().take(1).collect();
    let last_initial: String = last.chars().take(1).collect();

    let local_parts = [
        first.clone(),                          // john
        format!("{}.{}", first, last),          // john.smith
        format!("{}{}", first, last),           // johnsmith
        format!("{}.{}", first_initial, last),  // j.smith
        format!("{}{}", first_initial, last),   // jsmith
        format!("{}_{}", first, last),          // john_smith
        format!("{}-{}", first, last),          // john-smith
        format!("{}.{}", first, last_initial),  // john.s
        format!("{}.{}", last, first),          // smith.john
    ];

    let mut seen = HashSet::new();
    let patterns: Vec<String> = local_parts
        .iter()
        .map(|local_part| format!("{}@{}", local_part, domain))
        .filter(|address| seen.insert(address.clone()))
        .take(max_count)
        .collect();

    tracing::trace!(target: "search_task",
        "Generated {} patterns for '{} {}' @ '{}'",
        patterns.len(), first_name, last_name, domain
    );
    patterns
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_patterns_priority_order() {
        let patterns = generate_email_patterns("john", "smith", "acme.com", 20);
        assert_eq!(
            patterns,
            vec![
                "john@acme.com",
                "john.smith@acme.com",
                "johnsmith@acme.com",
                "j.smith@acme.com",
                "jsmith@acme.com",
                "john_smith@acme.com",
                "john-smith@acme.com",
                "john.s@acme.com",
                "smith.john@acme.com",
            ]
        );
    }

    #[test]
    fn test_generate_patterns_lowercases_and_trims_names() {
        let patterns = generate_email_patterns("  John ", " SMITH", " acme.com ", 20);
        assert_eq!(patterns[0], "john@acme.com");
        assert_eq!(patterns[1], "john.smith@acme.com");
    }

    #[test]
    fn test_generate_patterns_domain_case_untouched() {
        let patterns = generate_email_patterns("John", "Smith", "Acme.COM", 20);
        assert_eq!(patterns[0], "john@Acme.COM");
    }

    #[test]
    fn test_generate_patterns_truncated_to_max() {
        let patterns = generate_email_patterns("john", "smith", "acme.com", 3);
        assert_eq!(
            patterns,
            vec!["john@acme.com", "john.smith@acme.com", "johnsmith@acme.com"]
        );
        assert!(generate_email_patterns("john", "smith", "acme.com", 0).is_empty());
    }

    #[test]
    fn test_generate_patterns_single_letter_names_deduplicated() {
        let patterns = generate_email_patterns("J", "S", "x.io", 20);
        // "j.s" appears as first.last, f.last and first.l; "js" as firstlast and flast.
        assert_eq!(
            patterns,
            vec!["j@x.io", "j.s@x.io", "js@x.io", "j_s@x.io", "j-s@x.io", "s.j@x.io"]
        );
    }

    #[test]
    fn test_generate_patterns_empty_input() {
        assert!(generate_email_patterns("", "Smith", "acme.com", 20).is_empty());
        assert!(generate_email_patterns("John", "", "acme.com", 20).is_empty());
        assert!(generate_email_patterns("John", "Smith", "", 20).is_empty());
        assert!(generate_email_patterns("  ", "Smith", "acme.com", 20).is_empty());
        assert!(generate_email_patterns("John", "Smith", "   ", 20).is_empty());
    }

    #[test]
    fn test_generate_patterns_all_distinct_and_well_formed() {
        for (first, last) in [("Jean-Pierre", "Dupont"), ("María", "José"), ("a", "a"), ("Li", "Li")] {
            let patterns = generate_email_patterns(first, last, "corp.example", 20);
            let unique: HashSet<&String> = patterns.iter().collect();
            assert_eq!(unique.len(), patterns.len());
            assert!(patterns.len() <= 20);
            for p in &patterns {
                let (local, domain) = p.split_once('@').expect("has @");
                assert!(!local.is_empty());
                assert_eq!(domain, "corp.example");
            }
        }
    }

    #[test]
    fn test_generate_patterns_idempotent() {
        let a = generate_email_patterns("Jean-Pierre", "Dupont", "acme.fr", 20);
        let b = generate_email_patterns("Jean-Pierre", "Dupont", "acme.fr", 20);
        assert_eq!(a, b);
    }

    #[test]
    fn test_generate_patterns_uses_first_character_of_multibyte_names() {
        let patterns = generate_email_patterns("Émile", "Zola", "lit.fr", 20);
        assert!(patterns.contains(&"é.zola@lit.fr".to_string()));
        assert!(patterns.contains(&"émile.z@lit.fr".to_string()));
    }
}
