//! # Formato Inline (`<TAG>entidade</TAG>`)
//!
//! O decodificador procura, da esquerda para a direita, o padrão
//! "tag de abertura, conteúdo não-guloso de até `max_entity_chars` caracteres, tag de
//! fechamento com o mesmo nome" (nomes sem diferenciar maiúsculas). O conteúdo pode
//! conter outras tags: elas contam como marcação, não como entidades.
//!
//! ## Recuperação de offsets
//!
//! Cada tag removida desloca todos os offsets seguintes. O decodificador mantém um
//! acumulador `cumulated` com os caracteres de marcação já vistos que não existem no
//! texto puro:
//!
//! ```text
//! text <PERSON><PHONE>John J</PHONE>. Smith</PERSON> lives
//!      ^ início do match (5)
//!
//! tag_open   = len("PERSON") + 2          = 8
//! cumulated += tag_open                   -> 8
//! offset     = 5 + tag_open - cumulated   = 5
//! cumulated += aninhadas (15) + len("PERSON") + 3   -> 32
//! ```
//!
//! O bloco inteiro vira **uma** anotação `PERSON` com valor `"John J. Smith"`; a tag
//! `PHONE` interna é descartada.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::{encode_with, CharIndex, Decoded};
use crate::annotation::Annotation;
use crate::annotation_set::AnnotationSet;
use crate::config::CodecConfig;
use crate::error::Result;

static OPEN_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<([A-Za-z]+)>").expect("OPEN_TAG regex is invalid"));

/// Qualquer tag de abertura ou fechamento.
static ANY_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"</?[A-Za-z][^<>]*>").expect("ANY_TAG regex is invalid"));

/// Remove todas as tags, devolvendo o texto puro.
pub fn plain_text(markup: &str) -> String {
    ANY_TAG.replace_all(markup, "").into_owned()
}

/// Soma dos comprimentos (em caracteres) das tags em `text`.
fn tag_markup_length(text: &str) -> usize {
    ANY_TAG
        .find_iter(text)
        .map(|m| m.as_str().chars().count())
        .sum()
}

/// Decodifica texto com tags inline.
pub fn decode(markup: &str, config: &CodecConfig) -> Decoded {
    let index = CharIndex::new(markup);
    let mut annotations = AnnotationSet::new();
    let mut cumulated = 0usize;
    let mut pos = 0usize;

    while let Some(open) = OPEN_TAG.captures_at(markup, pos) {
        let (Some(whole), Some(name)) = (open.get(0), open.get(1)) else {
            break;
        };
        let name = name.as_str();

        let Some((content_end, close_end)) =
            find_close_tag(markup, whole.end(), name, config.max_entity_chars)
        else {
            // sem fechamento: tenta de novo a partir do próximo caractere
            pos = whole.start() + 1;
            continue;
        };

        let content = &markup[whole.end()..content_end];
        let nested_length = tag_markup_length(content);
        let value = plain_text(content).replace('\n', "");

        let tag_open = name.len() + 2;
        cumulated += tag_open;
        let start_char = index.char_at(whole.start());
        let offset = start_char + tag_open - cumulated;

        let end_char = index.char_at(close_end);
        let left = context_window(
            markup,
            &index,
            start_char.saturating_sub(config.context_window),
            start_char,
        );
        let right = context_window(
            markup,
            &index,
            end_char,
            end_char.saturating_add(config.context_window),
        );

        annotations.insert(Annotation::new(offset, value, name).with_context(left, right));

        cumulated += nested_length + name.len() + 3;
        pos = close_end;
    }

    debug!(annotations = annotations.len(), "texto inline decodificado");
    Decoded {
        text: plain_text(markup),
        annotations,
    }
}

/// Procura `</name>` depois de pelo menos 1 e no máximo `max_chars` caracteres de conteúdo.
///
/// Retorna `(fim do conteúdo, fim da tag de fechamento)` em bytes.
fn find_close_tag(
    markup: &str,
    content_start: usize,
    name: &str,
    max_chars: usize,
) -> Option<(usize, usize)> {
    let rest = &markup[content_start..];
    rest.char_indices()
        .skip(1)
        .take(max_chars)
        .map(|(offset, _)| offset)
        .find(|&offset| is_close_tag(&rest[offset..], name))
        .map(|offset| {
            let content_end = content_start + offset;
            (content_end, content_end + name.len() + 3)
        })
}

fn is_close_tag(text: &str, name: &str) -> bool {
    text.starts_with("</")
        && text
            .get(2..2 + name.len())
            .is_some_and(|candidate| candidate.eq_ignore_ascii_case(name))
        && text
            .get(2 + name.len()..)
            .is_some_and(|after| after.starts_with('>'))
}

/// Trecho `[from, to)` (em caracteres) da marcação, sem tags.
fn context_window(markup: &str, index: &CharIndex, from: usize, to: usize) -> String {
    let start = index.byte_at(from, markup.len());
    let end = index.byte_at(to, markup.len());
    plain_text(&markup[start..end])
}

/// Codifica como `<TAG>entidade</TAG>`.
pub fn encode(text: &str, annotations: &AnnotationSet) -> Result<String> {
    encode_with(text, annotations, String::push_str, |out, annotation, found| {
        let tag = annotation.tag();
        out.push('<');
        out.push_str(tag);
        out.push('>');
        out.push_str(found);
        out.push_str("</");
        out.push_str(tag);
        out.push('>');
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_default(markup: &str) -> Decoded {
        decode(markup, &CodecConfig::default())
    }

    fn summary(decoded: &Decoded) -> Vec<(usize, usize, String, String)> {
        decoded
            .annotations
            .iter()
            .map(|a| (a.offset(), a.length(), a.value().to_string(), a.tag().to_string()))
            .collect()
    }

    #[test]
    fn test_nested_tags_produce_outer_annotation() {
        let decoded = decode_default("text <PERSON><PHONE>John J</PHONE>. Smith</PERSON> lives");
        assert_eq!(decoded.text, "text John J. Smith lives");
        assert_eq!(
            summary(&decoded),
            vec![(5, 13, "John J. Smith".to_string(), "PERSON".to_string())]
        );
    }

    #[test]
    fn test_offsets_after_nested_block() {
        let markup = "<A>x <B>y</B> z</A> and <C>w</C>";
        let decoded = decode_default(markup);
        assert_eq!(decoded.text, "x y z and w");
        let s = summary(&decoded);
        assert_eq!(s[0], (0, 5, "x y z".to_string(), "A".to_string()));
        assert_eq!(s[1], (10, 1, "w".to_string(), "C".to_string()));
    }

    #[test]
    fn test_sequential_tags() {
        let decoded = decode_default("<PER>John</PER> met <PER>Mary</PER> in <LOC>Rome</LOC>.");
        assert_eq!(decoded.text, "John met Mary in Rome.");
        let offsets: Vec<usize> = decoded.annotations.iter().map(Annotation::offset).collect();
        assert_eq!(offsets, vec![0, 9, 17]);
        for a in decoded.annotations.iter() {
            let found: String = decoded
                .text
                .chars()
                .skip(a.offset())
                .take(a.length())
                .collect();
            assert_eq!(found, a.value());
        }
    }

    #[test]
    fn test_close_tag_is_case_insensitive() {
        let decoded = decode_default("<per>Ana</PER>");
        assert_eq!(decoded.annotations.len(), 1);
        assert_eq!(decoded.annotations.get(0).unwrap().tag(), "per");
    }

    #[test]
    fn test_unmatched_tag_is_silent_miss() {
        let decoded = decode_default("<PER>John met <LOC>Rome</LOC>");
        let s = summary(&decoded);
        assert_eq!(s.len(), 1);
        assert_eq!(s[0].3, "LOC");
    }

    #[test]
    fn test_empty_content_does_not_match() {
        assert!(decode_default("<X></X>").annotations.is_empty());
    }

    #[test]
    fn test_max_entity_chars() {
        let config = CodecConfig {
            max_entity_chars: 3,
            ..CodecConfig::default()
        };
        assert_eq!(decode("<A>abc</A>", &config).annotations.len(), 1);
        assert!(decode("<A>abcd</A>", &config).annotations.is_empty());
    }

    #[test]
    fn test_multibyte_offsets() {
        let decoded = decode_default("Em <LOC>São Paulo</LOC> e <LOC>Grécia</LOC>");
        assert_eq!(decoded.text, "Em São Paulo e Grécia");
        let s = summary(&decoded);
        assert_eq!(s[0].0, 3);
        assert_eq!(s[1].0, 15);
    }

    #[test]
    fn test_newlines_removed_from_value() {
        let decoded = decode_default("<ORG>Acme\nCorp</ORG>");
        assert_eq!(decoded.annotations.get(0).unwrap().value(), "AcmeCorp");
    }

    #[test]
    fn test_contexts_strip_tags() {
        let config = CodecConfig {
            context_window: 15,
            ..CodecConfig::default()
        };
        let decoded = decode("<PER>John</PER> met <PER>Mary</PER> in Rome", &config);
        let mary = decoded.annotations.get(1).unwrap();
        assert_eq!(mary.left_context(), "John met ");
        assert_eq!(mary.right_context(), " in Rome");
    }

    #[test]
    fn test_unbounded_context_window() {
        let config = CodecConfig {
            context_window: usize::MAX,
            ..CodecConfig::default()
        };
        let decoded = decode("já <PER>Ana</PER> ri", &config);
        let ana = decoded.annotations.get(0).unwrap();
        assert_eq!(ana.left_context(), "já ");
        assert_eq!(ana.right_context(), " ri");
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(plain_text("a <B>b</B> c"), "a b c");
        assert_eq!(plain_text("3 < 4 and 5 > 2"), "3 < 4 and 5 > 2");
    }

    #[test]
    fn test_encode_inline() {
        let annotations: AnnotationSet = [Annotation::new(4, "Rome", "LOC")].into_iter().collect();
        assert_eq!(
            encode("Hej Rome!", &annotations).unwrap(),
            "Hej <LOC>Rome</LOC>!"
        );
    }
}
