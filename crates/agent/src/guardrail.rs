//! Pattern-based safety gate on the raw user message.
//!
//! Medication and emergency questions must never reach the model. Matching
//! is case-insensitive for accented letters too: input is lowercased with
//! full Unicode rules before the (lowercase) patterns run.

use regex_lite::Regex;

/// Medication, dosage and emergency vocabulary (pt-BR).
pub const FORBIDDEN_TERMS: &[&str] = &[
    r"medica[cç][aã]o",
    r"rem[eé]dio",
    r"dose",
    r"posologia",
    r"sangue",
    r"desmai",
    r"emerg[eê]ncia",
    r"samu",
    r"hospital",
];

/// Outcome of a guardrail check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardrailVerdict {
    Safe,
    /// `term` is the pattern that matched first.
    Unsafe { term: String },
}

impl GuardrailVerdict {
    pub fn is_safe(&self) -> bool {
        matches!(self, Self::Safe)
    }
}

/// Pure classifier over a fixed term list.
#[derive(Debug, Clone)]
pub struct GuardrailFilter {
    rules: Vec<(String, Regex)>,
}

impl GuardrailFilter {
    /// Compile a filter from lowercase patterns.
    pub fn new(terms: &[&str]) -> Result<Self, regex_lite::Error> {
        let rules = terms
            .iter()
            .map(|t| Ok((t.to_string(), Regex::new(&format!("(?i){t}"))?)))
            .collect::<Result<Vec<_>, regex_lite::Error>>()?;
        Ok(Self { rules })
    }

    /// The filter over [`FORBIDDEN_TERMS`].
    pub fn builtin() -> Result<Self, regex_lite::Error> {
        Self::new(FORBIDDEN_TERMS)
    }

    /// Classify `text`, stopping at the first matching pattern.
    pub fn evaluate(&self, text: &str) -> GuardrailVerdict {
        let folded = text.to_lowercase();
        self.rules
            .iter()
            .find(|(_, re)| re.is_match(&folded))
            .map_or(GuardrailVerdict::Safe, |(term, _)| GuardrailVerdict::Unsafe {
                term: term.clone(),
            })
    }

    pub fn is_safe(&self, text: &str) -> bool {
        self.evaluate(text).is_safe()
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|(t, _)| t.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> GuardrailFilter {
        GuardrailFilter::builtin().unwrap()
    }

    #[test]
    fn everyday_care_questions_are_safe() {
        let f = filter();
        assert!(f.is_safe("Como lidar com a agitação no fim da tarde?"));
        assert!(f.is_safe("Minha mãe não quer tomar banho, o que faço?"));
        assert!(f.is_safe(""));
    }

    #[test]
    fn medication_terms_are_blocked() {
        let f = filter();
        assert!(!f.is_safe("Qual a dose de donepezila?"));
        assert!(!f.is_safe("Posso dar o remédio antes de dormir?"));
        assert!(!f.is_safe("Qual a posologia recomendada?"));
    }

    #[test]
    fn accent_variants_match_in_any_case() {
        let f = filter();
        assert!(!f.is_safe("MEDICAÇÃO para dormir"));
        assert!(!f.is_safe("medicacao"));
        assert!(!f.is_safe("Remédio"));
        assert!(!f.is_safe("REMEDIO"));
        assert!(!f.is_safe("Isso é uma EMERGÊNCIA"));
        assert!(!f.is_safe("emergencia"));
    }

    #[test]
    fn emergency_terms_are_blocked() {
        let f = filter();
        assert!(!f.is_safe("Ele desmaiou agora"));
        assert!(!f.is_safe("Devo chamar o SAMU?"));
        assert!(!f.is_safe("Levar ao Hospital?"));
        assert!(!f.is_safe("tem sangue na urina"));
    }

    #[test]
    fn matches_inside_words() {
        // Substring semantics: "doses" and "desmaio" are caught.
        let f = filter();
        assert!(!f.is_safe("doses diárias"));
        assert!(!f.is_safe("desmaio"));
    }

    #[test]
    fn verdict_names_the_first_matching_term() {
        let verdict = filter().evaluate("remédio no hospital");
        assert_eq!(
            verdict,
            GuardrailVerdict::Unsafe {
                term: "rem[eé]dio".into()
            }
        );
    }

    #[test]
    fn custom_terms() {
        let f = GuardrailFilter::new(&["overdose"]).unwrap();
        assert!(f.is_safe("remédio"));
        assert!(!f.is_safe("OVERDOSE"));
        assert_eq!(f.terms().count(), 1);
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        assert!(GuardrailFilter::new(&["(unclosed"]).is_err());
    }
}
