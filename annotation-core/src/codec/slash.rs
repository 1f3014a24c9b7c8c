//! # Formato de Barras (`token/TAG`)
//!
//! Todo o texto vira pares `token/TAG ` (com espaço final). Fora das anotações cada
//! palavra (sequência sem espaços) recebe `/O`; uma entidade de N tokens vira N pares
//! com a tag dela. Quebras de linha do texto são mantidas.
//!
//! ```text
//! John Smith lives in Berlin.  ->  John/PER Smith/PER lives/O in/O Berlin/LOC ./O
//! ```
//!
//! Como a tag é sempre o que vem depois da **última** barra, palavras como `TCP/IP`
//! saem `TCP/IP/O` e voltam inteiras.
//!
//! A decodificação é com perdas: duas entidades vizinhas com a mesma tag voltam como uma
//! só, e o espaçamento original é refeito pelas regras do formato de colunas (ex: `(`
//! ganha espaço antes do token seguinte).

use once_cell::sync::Lazy;
use regex::Regex;

use super::encode_with;
use crate::annotation_set::AnnotationSet;
use crate::config::CodecConfig;
use crate::error::Result;
use crate::tags::OUTSIDE;
use crate::tokenizer::tokenize;

/// Sufixo aceito como tag depois da barra.
static TAG_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9_]{1,100}$").expect("TAG_NAME regex is invalid"));

/// Converte texto com barras em colunas. Tokens sem `/TAG` recebem `O`.
pub fn to_column(slash_text: &str, config: &CodecConfig) -> String {
    let column_separator = config.column_separator;
    let mut out = String::new();

    for (i, line) in slash_text.lines().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        for word in line.split_whitespace() {
            let (token, tag) = match word.rsplit_once(config.slash_separator) {
                Some((token, tag)) if !token.is_empty() && TAG_NAME.is_match(tag) => (token, tag),
                _ => (word, OUTSIDE),
            };
            out.push_str(token);
            out.push(column_separator);
            out.push_str(tag);
            out.push('\n');
        }
    }
    out
}

/// Codifica o texto inteiro como pares `token/TAG `, com `O` fora das anotações.
pub fn encode(text: &str, annotations: &AnnotationSet, config: &CodecConfig) -> Result<String> {
    let separator = config.slash_separator;
    encode_with(
        text,
        annotations,
        |out, between| {
            for (i, line) in between.split('\n').enumerate() {
                if i > 0 {
                    out.push('\n');
                }
                for word in line.split_whitespace() {
                    push_pair(out, word, OUTSIDE, separator);
                }
            }
        },
        |out, annotation, found| {
            for token in tokenize(found) {
                push_pair(out, &token.text, annotation.tag(), separator);
            }
        },
    )
}

fn push_pair(out: &mut String, token: &str, tag: &str, separator: char) {
    out.push_str(token);
    out.push(separator);
    out.push_str(tag);
    out.push(' ');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::Annotation;
    use crate::codec::{MarkupCodec, TaggingFormat};

    #[test]
    fn test_to_column() {
        let column = to_column("John/PER Smith/PER lives in Berlin/LOC .", &CodecConfig::default());
        assert_eq!(
            column,
            "John\tPER\nSmith\tPER\nlives\tO\nin\tO\nBerlin\tLOC\n.\tO\n"
        );
    }

    #[test]
    fn test_lowercase_suffix_is_not_a_tag() {
        let column = to_column("and/or 1/2", &CodecConfig::default());
        assert_eq!(column, "and/or\tO\n1\t2\n");
    }

    #[test]
    fn test_lines_become_breaks() {
        let column = to_column("a/X\nb/Y", &CodecConfig::default());
        assert_eq!(column, "a\tX\n\nb\tY\n");
    }

    #[test]
    fn test_encode_splits_entity_tokens() {
        let annotations: AnnotationSet =
            [Annotation::new(0, "Dr. Ann Lee", "PER")].into_iter().collect();
        assert_eq!(
            encode("Dr. Ann Lee spoke", &annotations, &CodecConfig::default()).unwrap(),
            "Dr./PER Ann/PER Lee/PER spoke/O "
        );
    }

    fn decoded_entities(slash_text: &str) -> (String, Vec<(usize, String, String)>) {
        let decoded = MarkupCodec::new().decode(slash_text, TaggingFormat::Slash);
        let entities = decoded
            .annotations
            .iter()
            .map(|a| (a.offset(), a.value().to_string(), a.tag().to_string()))
            .collect();
        (decoded.text, entities)
    }

    #[test]
    fn test_words_with_slash_are_not_entities() {
        let encoded = encode("use TCP/IP now", &AnnotationSet::new(), &CodecConfig::default()).unwrap();
        assert_eq!(encoded, "use/O TCP/IP/O now/O ");
        let (text, entities) = decoded_entities(&encoded);
        assert_eq!(text, "use TCP/IP now");
        assert!(entities.is_empty());
    }

    #[test]
    fn test_punctuation_next_to_entity_stays_outside() {
        let annotations: AnnotationSet =
            [Annotation::new(7, "Berlin", "LOC")].into_iter().collect();
        let encoded =
            encode("visit (Berlin) now", &annotations, &CodecConfig::default()).unwrap();
        assert_eq!(encoded, "visit/O (/O Berlin/LOC )/O now/O ");

        let (text, entities) = decoded_entities(&encoded);
        assert_eq!(text, "visit ( Berlin ) now");
        assert_eq!(entities, vec![(8, "Berlin".to_string(), "LOC".to_string())]);
    }

    #[test]
    fn test_trailing_punctuation_round_trips() {
        let annotations: AnnotationSet =
            [Annotation::new(0, "Berlin", "LOC")].into_iter().collect();
        let encoded = encode("Berlin, now.", &annotations, &CodecConfig::default()).unwrap();
        assert_eq!(encoded, "Berlin/LOC ,/O now./O ");
        let (text, entities) = decoded_entities(&encoded);
        assert_eq!(text, "Berlin, now.");
        assert_eq!(entities, vec![(0, "Berlin".to_string(), "LOC".to_string())]);
    }

    #[test]
    fn test_encode_keeps_lines() {
        let annotations: AnnotationSet = [Annotation::new(2, "b", "X")].into_iter().collect();
        assert_eq!(
            encode("a\nb c", &annotations, &CodecConfig::default()).unwrap(),
            "a/O \nb/X c/O "
        );
    }
}
