//! Grammatical token tags and the tokenizer seam.
//!
//! Morphological analysis is an external collaborator: the pipeline only
//! requires a sequence of `(form, tag)` pairs and filters it down to
//! content-bearing tags before scoring. A deterministic script-class
//! tokenizer ships as the fallback for CLI use; a real Korean analyzer
//! plugs in behind the same trait.

use serde::{Deserialize, Serialize};

/// Grammatical tag of a token, mirroring the analyzer tag set the trained
/// vocabulary was built against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenTag {
    /// MM — determiner.
    Determiner,
    /// NNG — general noun.
    CommonNoun,
    /// NNB — bound noun.
    BoundNoun,
    /// NNP — proper noun.
    ProperNoun,
    /// SL — foreign-script token.
    Foreign,
    /// XPN — prefix.
    Prefix,
    /// MAG — general adverb.
    Adverb,
    /// SN — numeral.
    Numeral,
    /// SO — symbol.
    Symbol,
    /// W_SERIAL — serial-number token.
    Serial,
    /// Anything outside the allow-list (particles, endings, ...).
    Other,
}

impl TokenTag {
    /// Map an analyzer tag code to a `TokenTag`.
    pub fn from_code(code: &str) -> TokenTag {
        match code {
            "MM" => TokenTag::Determiner,
            "NNG" => TokenTag::CommonNoun,
            "NNB" => TokenTag::BoundNoun,
            "NNP" => TokenTag::ProperNoun,
            "SL" => TokenTag::Foreign,
            "XPN" => TokenTag::Prefix,
            "MAG" => TokenTag::Adverb,
            "SN" => TokenTag::Numeral,
            "SO" => TokenTag::Symbol,
            "W_SERIAL" => TokenTag::Serial,
            _ => TokenTag::Other,
        }
    }

    /// Whether this tag is on the content allow-list used for scoring.
    pub fn is_content(self) -> bool {
        !matches!(self, TokenTag::Other)
    }
}

/// One token produced by an analyzer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedToken {
    pub form: String,
    pub tag: TokenTag,
}

/// The tokenizer seam.
///
/// Implementations must be pure over their own frozen state so a single
/// instance can be shared across concurrent requests.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<TaggedToken>;
}

/// Normalize raw text the way the vocabulary was built: lowercase,
/// parentheses to spaces, literal "n/a" removed.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .replace(['(', ')'], " ")
        .replace("n/a", "")
}

/// Tokenize `text` and keep only content-bearing token forms.
pub fn content_tokens(tokenizer: &dyn Tokenizer, text: &str) -> Vec<String> {
    tokenizer
        .tokenize(&normalize(text))
        .into_iter()
        .filter(|t| t.tag.is_content())
        .map(|t| t.form)
        .collect()
}

/// Deterministic fallback tokenizer.
///
/// Splits the input into maximal runs of a single script class and tags by
/// class: Hangul runs as general nouns, Latin runs as foreign-script tokens,
/// digit runs as numerals, everything else (non-whitespace) as symbols.
/// No morphological segmentation — adequate for scoring already-terse
/// procurement fields, and fully reproducible.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptTokenizer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScriptClass {
    Hangul,
    Latin,
    Digit,
    Symbol,
    Space,
}

fn script_class(c: char) -> ScriptClass {
    if c.is_whitespace() {
        ScriptClass::Space
    } else if ('\u{AC00}'..='\u{D7A3}').contains(&c) {
        ScriptClass::Hangul
    } else if c.is_ascii_alphabetic() {
        ScriptClass::Latin
    } else if c.is_ascii_digit() {
        ScriptClass::Digit
    } else {
        ScriptClass::Symbol
    }
}

impl Tokenizer for ScriptTokenizer {
    fn tokenize(&self, text: &str) -> Vec<TaggedToken> {
        let mut out = Vec::new();
        let mut run = String::new();
        let mut run_class = ScriptClass::Space;

        let flush = |run: &mut String, class: ScriptClass, out: &mut Vec<TaggedToken>| {
            if run.is_empty() {
                return;
            }
            let tag = match class {
                ScriptClass::Hangul => TokenTag::CommonNoun,
                ScriptClass::Latin => TokenTag::Foreign,
                ScriptClass::Digit => TokenTag::Numeral,
                ScriptClass::Symbol => TokenTag::Symbol,
                ScriptClass::Space => return,
            };
            out.push(TaggedToken {
                form: std::mem::take(run),
                tag,
            });
        };

        for c in text.chars() {
            let class = script_class(c);
            if class != run_class {
                flush(&mut run, run_class, &mut out);
                run_class = class;
            }
            if class != ScriptClass::Space {
                run.push(c);
            }
        }
        flush(&mut run, run_class, &mut out);

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_parens_and_na() {
        assert_eq!(normalize("City Hall (Annex) n/a"), "city hall  annex  ");
    }

    #[test]
    fn script_tokenizer_splits_by_class() {
        let toks = ScriptTokenizer.tokenize("서울시청 annex 2공구");
        let forms: Vec<&str> = toks.iter().map(|t| t.form.as_str()).collect();
        assert_eq!(forms, ["서울시청", "annex", "2", "공구"]);
        assert_eq!(toks[1].tag, TokenTag::Foreign);
        assert_eq!(toks[2].tag, TokenTag::Numeral);
    }

    #[test]
    fn content_filter_drops_non_allowlist_tags() {
        struct Fixed;
        impl Tokenizer for Fixed {
            fn tokenize(&self, _: &str) -> Vec<TaggedToken> {
                vec![
                    TaggedToken {
                        form: "공사".to_string(),
                        tag: TokenTag::CommonNoun,
                    },
                    TaggedToken {
                        form: "는".to_string(),
                        tag: TokenTag::Other,
                    },
                ]
            }
        }
        assert_eq!(content_tokens(&Fixed, "ignored"), ["공사"]);
    }

    #[test]
    fn tag_codes_round_trip_the_allowlist() {
        for code in ["MM", "NNG", "NNB", "NNP", "SL", "XPN", "MAG", "SN", "SO", "W_SERIAL"] {
            assert!(TokenTag::from_code(code).is_content(), "{code}");
        }
        assert!(!TokenTag::from_code("JKS").is_content());
    }
}
