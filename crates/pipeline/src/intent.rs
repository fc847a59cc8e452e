//! Intent classification: raw user text -> tutor or builder.
//!
//! The classifier is an ordered list of rules evaluated top to bottom; the
//! first rule that produces a decision wins. It is total: any input,
//! including empty text, lands on the tutor default. Keyword sets are
//! bilingual (English and Indonesian).

use regex::Regex;
use shared::chat::GenerationMode;
use std::sync::LazyLock;

/// Lead-ins that mark a clear question. Pre-empts everything else, including
/// builder keywords appearing later in the sentence.
const QUESTION_LEADINS: &[&str] = &[
    "what", "why", "how", "who", "when", "where", "which", "explain", "teach me", "tell me about",
    "can you explain", "apa", "mengapa", "kenapa", "bagaimana", "siapa", "kapan", "dimana",
    "jelaskan", "ajari",
];

/// Scheduling/planning and learning/tutorial vocabulary. These domains force
/// tutor mode even when a builder keyword also appears.
const TUTOR_DOMAINS: &[&str] = &[
    "jadwal",
    "schedule",
    "agenda",
    "rencana belajar",
    "study plan",
    "tutorial",
    "belajar",
    "pelajari",
    "kursus",
    "course",
    "homework",
    "lesson",
];

/// Build-intent phrases with weights. High-confidence phrases weigh more.
const BUILDER_KEYWORDS: &[(&str, i32)] = &[
    ("build website", 3),
    ("build a website", 3),
    ("build an app", 3),
    ("buat website", 3),
    ("buat aplikasi", 3),
    ("bikin website", 3),
    ("landing page", 3),
    ("halaman web", 3),
    ("create a website", 3),
    ("web app", 2),
    ("webpage", 2),
    ("homepage", 2),
    ("portfolio site", 2),
    ("change color", 2),
    ("change the color", 2),
    ("ganti warna", 2),
    ("ubah warna", 2),
    ("add a button", 2),
    ("tambah tombol", 2),
    ("dark mode", 1),
    ("website", 1),
    ("navbar", 1),
];

/// Question/learning phrases with weights.
const TUTOR_KEYWORDS: &[(&str, i32)] = &[
    ("what is", 2),
    ("what are", 2),
    ("how do", 2),
    ("how to", 2),
    ("explain", 2),
    ("apa itu", 2),
    ("bagaimana cara", 2),
    ("difference between", 2),
    ("teach", 2),
    ("ajarkan", 2),
    ("definition", 1),
    ("definisi", 1),
    ("example of", 1),
    ("contoh", 1),
    ("learn", 1),
    ("understand", 1),
    ("mengerti", 1),
    ("why", 1),
];

/// Bonus applied when a scored keyword sits at the start of the input.
const START_BONUS: i32 = 2;

static IMPERATIVE_BUILDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(build|create|make|buat|bikin|buatkan)\s+(a\s+|an\s+|the\s+|sebuah\s+)?(web(site)?|app(lication)?|aplikasi|page|site|landing|halaman)",
    )
    .expect("imperative builder regex")
});

static EDIT_COMMAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(ubah|ganti|change|add|remove|tambah|hapus|make|set)\b.*\b(warna|color|colour|background|button|tombol|text|teks|font|size|ukuran|layout|judul|title|image|gambar|header|footer|yellow|blue|red|green|biru|merah|kuning|hijau)\b",
    )
    .expect("edit command regex")
});

struct Rule {
    name: &'static str,
    check: fn(&str) -> Option<GenerationMode>,
}

/// Ordered rule table; first decision wins.
const RULES: &[Rule] = &[
    Rule {
        name: "question-leadin",
        check: question_leadin,
    },
    Rule {
        name: "tutor-domain",
        check: tutor_domain,
    },
    Rule {
        name: "question-mark-force",
        check: question_mark_force,
    },
    Rule {
        name: "imperative-builder",
        check: imperative_builder,
    },
    Rule {
        name: "weighted-score",
        check: weighted_score,
    },
];

fn question_leadin(text: &str) -> Option<GenerationMode> {
    QUESTION_LEADINS
        .iter()
        .any(|p| text.starts_with(p) && starts_as_word(text, p))
        .then_some(GenerationMode::Tutor)
}

// Avoid matching "whatif-style" prefixes inside a longer first word.
fn starts_as_word(text: &str, prefix: &str) -> bool {
    match text[prefix.len()..].chars().next() {
        None => true,
        Some(c) => !c.is_alphanumeric(),
    }
}

fn tutor_domain(text: &str) -> Option<GenerationMode> {
    TUTOR_DOMAINS
        .iter()
        .any(|k| text.contains(k))
        .then_some(GenerationMode::Tutor)
}

/// A `?` co-occurring with any tutor keyword forces tutor on its own, even
/// when builder keywords are also present.
fn question_mark_force(text: &str) -> Option<GenerationMode> {
    (text.contains('?') && TUTOR_KEYWORDS.iter().any(|(k, _)| text.contains(k)))
        .then_some(GenerationMode::Tutor)
}

/// An explicit imperative ("build a website") decides builder regardless of
/// any score the rest of the sentence would accumulate.
fn imperative_builder(text: &str) -> Option<GenerationMode> {
    IMPERATIVE_BUILDER
        .is_match(text)
        .then_some(GenerationMode::Builder)
}

fn weighted_score(text: &str) -> Option<GenerationMode> {
    let builder = score(text, BUILDER_KEYWORDS);
    let tutor = score(text, TUTOR_KEYWORDS);
    if builder == 0 && tutor == 0 {
        return None;
    }
    if builder > tutor {
        Some(GenerationMode::Builder)
    } else {
        // Ties go to tutor.
        Some(GenerationMode::Tutor)
    }
}

fn score(text: &str, keywords: &[(&str, i32)]) -> i32 {
    let mut total = 0;
    for (keyword, weight) in keywords {
        if let Some(pos) = text.find(keyword) {
            total += weight;
            if pos == 0 {
                total += START_BONUS;
            }
        }
    }
    total
}

/// Classify raw user text. Deterministic, no side effects, never fails.
pub fn classify(text: &str) -> GenerationMode {
    let normalized = text.trim().to_lowercase();
    if normalized.is_empty() {
        return GenerationMode::Tutor;
    }
    for rule in RULES {
        if let Some(mode) = (rule.check)(&normalized) {
            tracing::debug!(rule = rule.name, mode = %mode, "intent classified");
            return mode;
        }
    }
    GenerationMode::Tutor
}

/// Session-context rule applied on top of [`classify`]: while the session is
/// already in builder mode with a generated artifact on screen, a short edit
/// command ("make it yellow") must not be misrouted into a prose answer. Any
/// non-edit tutor-leaning utterance still switches the session to tutor.
pub fn resolve_mode(
    classified: GenerationMode,
    session_mode: GenerationMode,
    has_artifact: bool,
    text: &str,
) -> GenerationMode {
    if session_mode == GenerationMode::Builder && has_artifact && is_edit_command(text) {
        return GenerationMode::Builder;
    }
    classified
}

/// Edit verb plus a stylistic noun.
pub fn is_edit_command(text: &str) -> bool {
    EDIT_COMMAND.is_match(text.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::chat::GenerationMode::{Builder, Tutor};

    #[test]
    fn empty_and_whitespace_default_to_tutor() {
        assert_eq!(classify(""), Tutor);
        assert_eq!(classify("   \n\t "), Tutor);
    }

    #[test]
    fn question_leadins_preempt_builder_keywords() {
        assert_eq!(classify("what is a closure?"), Tutor);
        assert_eq!(classify("How do I build a website with React?"), Tutor);
        assert_eq!(classify("apa itu landing page?"), Tutor);
        assert_eq!(classify("jelaskan cara kerja flexbox"), Tutor);
    }

    #[test]
    fn leadin_must_be_a_whole_word() {
        // "whoever" starts with "who" but is not a question lead-in.
        assert_ne!(
            classify("whoever wants a landing page, build a website now"),
            Tutor
        );
    }

    #[test]
    fn tutor_domains_override_builder_keywords() {
        assert_eq!(classify("buatkan jadwal belajar mingguan"), Tutor);
        assert_eq!(classify("set up my study schedule on the website"), Tutor);
        assert_eq!(classify("tutorial for building a landing page"), Tutor);
    }

    #[test]
    fn question_mark_with_tutor_keyword_forces_tutor() {
        assert_eq!(classify("build a website, but first: what is HTML?"), Tutor);
        assert_eq!(classify("landing page itu contoh dari apa ya?"), Tutor);
    }

    #[test]
    fn imperative_builder_patterns_short_circuit() {
        assert_eq!(classify("build a landing page for a bakery"), Builder);
        assert_eq!(classify("buat aplikasi kasir sederhana"), Builder);
        assert_eq!(classify("create a website for my coffee shop"), Builder);
        assert_eq!(classify("Build web dashboard for sales"), Builder);
    }

    #[test]
    fn weighted_scoring_picks_the_heavier_side() {
        assert_eq!(classify("i need a landing page with dark mode"), Builder);
        assert_eq!(classify("i want to learn and understand recursion"), Tutor);
    }

    #[test]
    fn no_keywords_default_to_tutor() {
        assert_eq!(classify("good morning"), Tutor);
    }

    #[test]
    fn edit_commands_keep_builder_mode_with_an_artifact() {
        let classified = classify("ubah warna jadi biru");
        assert_eq!(
            resolve_mode(classified, Builder, true, "ubah warna jadi biru"),
            Builder
        );
        assert_eq!(resolve_mode(Tutor, Builder, true, "make it yellow"), Builder);
    }

    #[test]
    fn edit_commands_without_an_artifact_do_not_stick() {
        assert_eq!(resolve_mode(Tutor, Builder, false, "make it yellow"), Tutor);
        assert_eq!(resolve_mode(Tutor, Tutor, true, "make it yellow"), Tutor);
    }

    #[test]
    fn non_edit_tutor_utterances_switch_the_session() {
        assert_eq!(
            resolve_mode(Tutor, Builder, true, "what is a closure?"),
            Tutor
        );
    }
}
