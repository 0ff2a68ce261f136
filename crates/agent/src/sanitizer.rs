//! Strips stray section labels from generated answers.
//!
//! The prompt already forbids labels; this catches the ones the model emits
//! anyway. Only a line consisting of a bare label and a colon is removed,
//! together with the blank line right after it.

/// Labels compared case-insensitively, lowercase here.
const LABELS: &[&str] = &[
    "resposta direta",
    "dicas",
    "informações",
    "orientações",
    "solução",
    "resposta",
    "tips",
    "answer",
    "information",
    "guidance",
    "solution",
    "response",
];

fn is_label_line(trimmed: &str) -> bool {
    let lower = trimmed.to_lowercase();
    lower
        .strip_suffix(':')
        .is_some_and(|head| LABELS.contains(&head))
}

/// Remove label-only lines and trim the result. Idempotent.
pub fn sanitize(raw: &str) -> String {
    let mut kept: Vec<&str> = Vec::new();
    let mut skip_next_blank = false;

    for line in raw.lines() {
        let trimmed = line.trim();

        if is_label_line(trimmed) {
            skip_next_blank = true;
            continue;
        }

        if skip_next_blank && trimmed.is_empty() {
            skip_next_blank = false;
            continue;
        }

        skip_next_blank = false;
        kept.push(line);
    }

    kept.join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_label_and_following_blank_line() {
        let raw = "Resposta Direta:\n\n- Mantenha a rotina\n- Fale devagar";
        assert_eq!(sanitize(raw), "- Mantenha a rotina\n- Fale devagar");
    }

    #[test]
    fn labels_are_case_insensitive_including_accents() {
        assert_eq!(sanitize("DICAS:\nBeba água"), "Beba água");
        assert_eq!(sanitize("SOLUÇÃO:\nDescanse"), "Descanse");
        assert_eq!(sanitize("  informações:   \nTexto"), "Texto");
    }

    #[test]
    fn english_labels_are_stripped() {
        assert_eq!(sanitize("Tips:\n\n1. Rest"), "1. Rest");
        assert_eq!(sanitize("Answer:\nYes"), "Yes");
    }

    #[test]
    fn mid_line_labels_are_kept() {
        let raw = "Dicas: beba água\nA Resposta: depende";
        assert_eq!(sanitize(raw), raw);
    }

    #[test]
    fn only_one_blank_line_is_skipped() {
        let raw = "Texto inicial\nDicas:\n\n\nItem";
        assert_eq!(sanitize(raw), "Texto inicial\n\nItem");
    }

    #[test]
    fn consecutive_labels_are_all_dropped() {
        assert_eq!(sanitize("Resposta:\nDicas:\n\nItem"), "Item");
    }

    #[test]
    fn unknown_labels_are_kept() {
        assert_eq!(sanitize("Observação:\nTexto"), "Observação:\nTexto");
    }

    #[test]
    fn sanitize_is_idempotent() {
        let samples = [
            "Resposta Direta:\n\n- a\n\nDicas:\n\n- b\n",
            "  \nOrientações:\n\n\n\nTexto\n",
            "Sem rótulos aqui.",
            "",
        ];
        for s in samples {
            let once = sanitize(s);
            assert_eq!(sanitize(&once), once);
        }
    }
}
