use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use crate::corpus::FragmentCorpus;

pub const DEFAULT_DELIMITER: &str = ", ";
pub const DEFAULT_MAX_FRAGMENTS: usize = 6;
pub const DEFAULT_PREFIX: &str = "A Blender render of ";
pub const DEFAULT_SUFFIX: &str = ", digital texture.";

/// Cut-up prompt synthesis.
///
/// One sub-fragment is drawn from every corpus entry that contains the
/// delimiter, the draws are shuffled, and the first `max_fragments` are
/// joined and wrapped in the template.
#[derive(Debug, Clone)]
pub struct PromptSynthesizer {
    pub delimiter: String,
    pub max_fragments: usize,
    pub prefix: String,
    pub suffix: String,
}

impl Default for PromptSynthesizer {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER.to_string(),
            max_fragments: DEFAULT_MAX_FRAGMENTS,
            prefix: DEFAULT_PREFIX.to_string(),
            suffix: DEFAULT_SUFFIX.to_string(),
        }
    }
}

impl PromptSynthesizer {
    pub fn synthesize<R: Rng + ?Sized>(&self, corpus: &FragmentCorpus, rng: &mut R) -> String {
        let mut fragments: Vec<&str> = corpus
            .entries()
            .iter()
            .filter_map(|entry| {
                let parts: Vec<&str> = entry.split(self.delimiter.as_str()).collect();
                if parts.len() > 1 {
                    parts.choose(rng).copied()
                } else {
                    None
                }
            })
            .collect();

        fragments.shuffle(rng);
        fragments.truncate(self.max_fragments);

        format!("{}{}{}", self.prefix, fragments.join(&self.delimiter), self.suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn body(prompt: &str) -> &str {
        prompt
            .strip_prefix(DEFAULT_PREFIX)
            .and_then(|p| p.strip_suffix(DEFAULT_SUFFIX))
            .expect("prompt is wrapped in the template")
    }

    #[test]
    fn test_caps_at_six_fragments() {
        let text = (0..20)
            .map(|i| format!("alpha{i}, beta{i}, gamma{i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let corpus = FragmentCorpus::parse(&text).unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..50 {
            let prompt = PromptSynthesizer::default().synthesize(&corpus, &mut rng);
            let fragments: Vec<&str> = body(&prompt).split(DEFAULT_DELIMITER).collect();
            assert_eq!(fragments.len(), 6);
        }
    }

    #[test]
    fn test_short_corpus_uses_every_candidate() {
        let corpus = FragmentCorpus::parse("a, b, c\nd, e\nno delimiter here").unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        let prompt = PromptSynthesizer::default().synthesize(&corpus, &mut rng);
        let fragments: Vec<&str> = body(&prompt).split(DEFAULT_DELIMITER).collect();

        assert_eq!(fragments.len(), 2);
        assert!(fragments.iter().any(|f| ["a", "b", "c"].contains(f)));
        assert!(fragments.iter().any(|f| ["d", "e"].contains(f)));
    }

    #[test]
    fn test_no_delimited_entries_gives_empty_body() {
        let corpus = FragmentCorpus::parse("plain\nalso plain").unwrap();
        let mut rng = StdRng::seed_from_u64(3);

        let prompt = PromptSynthesizer::default().synthesize(&corpus, &mut rng);
        assert_eq!(prompt, "A Blender render of , digital texture.");
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let corpus = FragmentCorpus::parse("a, b, c\nd, e, f\ng, h\ni, j").unwrap();
        let synth = PromptSynthesizer::default();

        let first = synth.synthesize(&corpus, &mut StdRng::seed_from_u64(42));
        let second = synth.synthesize(&corpus, &mut StdRng::seed_from_u64(42));
        assert_eq!(first, second);
    }

    #[test]
    fn test_custom_template() {
        let corpus = FragmentCorpus::parse("x, x").unwrap();
        let synth = PromptSynthesizer {
            prefix: "[".into(),
            suffix: "]".into(),
            ..Default::default()
        };

        let prompt = synth.synthesize(&corpus, &mut StdRng::seed_from_u64(0));
        assert_eq!(prompt, "[x]");
    }
}
