//! # Codec de Marcação
//!
//! Converte entre `(texto puro, AnnotationSet)` e quatro codificações textuais das
//! mesmas entidades:
//!
//! | Formato      | Exemplo                                      |
//! |--------------|----------------------------------------------|
//! | Inline (XML) | `<PER>John Smith</PER> lives`                |
//! | Colunas      | `John\tPER` / `Smith\tPER` / `lives\tO`      |
//! | Colunas BIO  | `John\tB-PER` / `Smith\tI-PER` / `lives\tO`  |
//! | Colchetes    | `[PER John Smith ] lives`                    |
//! | Barras       | `John/PER Smith/PER  lives`                  |
//!
//! ## Decodificação
//!
//! Todo formato é reduzido ao formato inline e decodificado por
//! [`markup::decode`], que recupera os offsets no texto **sem tags** mesmo quando há
//! tags aninhadas.
//!
//! ## Codificação
//!
//! O conjunto é ordenado e o texto percorrido da esquerda para a direita. Anotações que
//! começam antes do fim da anterior (aninhadas ou sobrepostas) são descartadas. Antes de
//! envolver cada anotação, o texto em `[offset, end)` precisa ser igual ao valor
//! (sem diferenciar maiúsculas, e a checagem é desligada se o trecho tiver `\n`).
//! Qualquer divergência aborta a codificação com [`Error::Alignment`].

pub mod bracket;
pub mod column;
pub mod markup;
pub mod slash;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::annotation::Annotation;
use crate::annotation_set::AnnotationSet;
use crate::config::CodecConfig;
use crate::error::{Error, Result};

/// Codificações suportadas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaggingFormat {
    /// `<TAG>entidade</TAG>`, com aninhamento permitido.
    InlineTag,
    /// `token<TAB>TAG` por linha; linha em branco separa segmentos.
    Column,
    /// Colunas com prefixos `B-`/`I-`.
    ColumnBio,
    /// `[TAG conteúdo ]`.
    Bracket,
    /// `token/TAG` separados por espaço.
    Slash,
}

impl TaggingFormat {
    pub fn name(&self) -> &'static str {
        match self {
            TaggingFormat::InlineTag => "inline_tag",
            TaggingFormat::Column => "column",
            TaggingFormat::ColumnBio => "column_bio",
            TaggingFormat::Bracket => "bracket",
            TaggingFormat::Slash => "slash",
        }
    }

    pub fn all() -> [TaggingFormat; 5] {
        [
            TaggingFormat::InlineTag,
            TaggingFormat::Column,
            TaggingFormat::ColumnBio,
            TaggingFormat::Bracket,
            TaggingFormat::Slash,
        ]
    }
}

impl std::fmt::Display for TaggingFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Resultado de uma decodificação: o texto puro e as anotações sobre ele.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Decoded {
    pub text: String,
    pub annotations: AnnotationSet,
}

/// Codec entre texto anotado e as codificações de [`TaggingFormat`].
///
/// Não guarda estado além da configuração; pode ser compartilhado entre threads.
#[derive(Debug, Clone, Default)]
pub struct MarkupCodec {
    config: CodecConfig,
}

impl MarkupCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Decodifica `markup` no formato indicado.
    ///
    /// Marcação malformada nunca é erro: trechos que não casam simplesmente não geram
    /// anotações.
    pub fn decode(&self, markup: &str, format: TaggingFormat) -> Decoded {
        let decoded = match format {
            TaggingFormat::InlineTag => markup::decode(markup, &self.config),
            TaggingFormat::Column => {
                markup::decode(&column::to_inline(markup, &self.config, false), &self.config)
            }
            TaggingFormat::ColumnBio => {
                markup::decode(&column::to_inline(markup, &self.config, true), &self.config)
            }
            TaggingFormat::Bracket => markup::decode(&bracket::to_inline(markup), &self.config),
            TaggingFormat::Slash => {
                let columns = slash::to_column(markup, &self.config);
                markup::decode(&column::to_inline(&columns, &self.config, false), &self.config)
            }
        };
        debug!(
            format = %format,
            annotations = decoded.annotations.len(),
            "marcação decodificada"
        );
        decoded
    }

    /// Decodifica colunas tratando cada token anotado como uma entidade própria.
    pub fn decode_token_based(&self, column_text: &str) -> Decoded {
        markup::decode(
            &column::to_inline_token_based(column_text, &self.config),
            &self.config,
        )
    }

    /// Codifica `text` com as anotações de `annotations` no formato indicado.
    pub fn encode(
        &self,
        text: &str,
        annotations: &AnnotationSet,
        format: TaggingFormat,
    ) -> Result<String> {
        match format {
            TaggingFormat::InlineTag => markup::encode(text, annotations),
            TaggingFormat::Column => {
                Ok(column::from_inline(&markup::encode(text, annotations)?, &self.config, false))
            }
            TaggingFormat::ColumnBio => {
                Ok(column::from_inline(&markup::encode(text, annotations)?, &self.config, true))
            }
            TaggingFormat::Bracket => bracket::encode(text, annotations),
            TaggingFormat::Slash => slash::encode(text, annotations, &self.config),
        }
    }

    /// Decodifica de um formato e recodifica em outro.
    pub fn convert(&self, markup: &str, from: TaggingFormat, to: TaggingFormat) -> Result<String> {
        let decoded = self.decode(markup, from);
        self.encode(&decoded.text, &decoded.annotations, to)
    }
}

/// Percorre `text` em ordem de offset. O texto entre anotações vai para `copy` e cada
/// anotação vai para `wrap`, junto com o trecho real do texto que ela cobre.
pub(crate) fn encode_with<C, F>(
    text: &str,
    annotations: &AnnotationSet,
    mut copy: C,
    mut wrap: F,
) -> Result<String>
where
    C: FnMut(&mut String, &str),
    F: FnMut(&mut String, &Annotation, &str),
{
    let chars: Vec<char> = text.chars().collect();
    let sorted = annotations.sorted();

    let mut out = String::with_capacity(text.len() + sorted.len() * 16);
    let mut last_end = 0;
    let mut previous: Option<&Annotation> = None;
    let mut skipped = 0usize;

    for annotation in sorted.iter() {
        if annotation.offset() < last_end {
            skipped += 1;
            continue;
        }
        if annotation.end() > chars.len() {
            warn!(annotation = %annotation, text_len = chars.len(), "anotação além do fim do texto");
            return Err(Error::OutOfBounds {
                offset: annotation.offset(),
                end: annotation.end(),
                text_len: chars.len(),
            });
        }

        let found: String = chars[annotation.offset()..annotation.end()].iter().collect();
        if !found.contains('\n') && found.to_lowercase() != annotation.value().to_lowercase() {
            let previous = previous.map(ToString::to_string);
            warn!(
                annotation = %annotation,
                found = %found,
                previous = previous.as_deref().unwrap_or("-"),
                "erro de alinhamento: a anotação não corresponde ao texto"
            );
            return Err(Error::alignment(
                annotation.offset(),
                annotation.value(),
                found,
                previous,
            ));
        }

        let between: String = chars[last_end..annotation.offset()].iter().collect();
        copy(&mut out, &between);
        wrap(&mut out, annotation, &found);
        last_end = annotation.end();
        previous = Some(annotation);
    }
    let tail: String = chars[last_end..].iter().collect();
    copy(&mut out, &tail);

    debug!(
        encoded = sorted.len() - skipped,
        skipped, "anotações codificadas"
    );
    Ok(out)
}

/// Conversão de índices de byte para índices de caractere.
pub(crate) struct CharIndex {
    starts: Vec<usize>,
}

impl CharIndex {
    pub(crate) fn new(text: &str) -> Self {
        Self {
            starts: text.char_indices().map(|(i, _)| i).collect(),
        }
    }

    /// Índice de caractere do byte `byte` (que deve estar numa fronteira de caractere).
    pub(crate) fn char_at(&self, byte: usize) -> usize {
        match self.starts.binary_search(&byte) {
            Ok(index) | Err(index) => index,
        }
    }

    /// Índice de byte do caractere `char_index` (ou o comprimento total, além do fim).
    pub(crate) fn byte_at(&self, char_index: usize, text_len: usize) -> usize {
        self.starts.get(char_index).copied().unwrap_or(text_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> MarkupCodec {
        MarkupCodec::new()
    }

    fn john_in_berlin() -> (String, AnnotationSet) {
        let text = "John Smith lives in Berlin.".to_string();
        let annotations = [
            Annotation::new(20, "Berlin", "LOC"),
            Annotation::new(0, "John Smith", "PER"),
        ]
        .into_iter()
        .collect();
        (text, annotations)
    }

    #[test]
    fn test_encode_all_formats() {
        let (text, annotations) = john_in_berlin();
        let c = codec();
        assert_eq!(
            c.encode(&text, &annotations, TaggingFormat::InlineTag).unwrap(),
            "<PER>John Smith</PER> lives in <LOC>Berlin</LOC>."
        );
        assert_eq!(
            c.encode(&text, &annotations, TaggingFormat::Bracket).unwrap(),
            "[PER John Smith ] lives in [LOC Berlin ]."
        );
        assert_eq!(
            c.encode(&text, &annotations, TaggingFormat::Slash).unwrap(),
            "John/PER Smith/PER lives/O in/O Berlin/LOC ./O "
        );
        assert_eq!(
            c.encode(&text, &annotations, TaggingFormat::Column).unwrap(),
            "John\tPER\nSmith\tPER\nlives\tO\nin\tO\nBerlin\tLOC\n.\tO\n\n"
        );
        assert_eq!(
            c.encode(&text, &annotations, TaggingFormat::ColumnBio).unwrap(),
            "John\tB-PER\nSmith\tI-PER\nlives\tO\nin\tO\nBerlin\tB-LOC\n.\tO\n\n"
        );
    }

    #[test]
    fn test_decode_all_formats_agree() {
        let (text, annotations) = john_in_berlin();
        let c = codec();
        for format in TaggingFormat::all() {
            let encoded = c.encode(&text, &annotations, format).unwrap();
            let decoded = c.decode(&encoded, format);
            let found: Vec<(usize, &str, &str)> = decoded
                .annotations
                .iter()
                .map(|a| (a.offset(), a.value(), a.tag()))
                .collect();
            assert_eq!(
                found,
                vec![(0, "John Smith", "PER"), (20, "Berlin", "LOC")],
                "formato {format}"
            );
        }
    }

    #[test]
    fn test_encode_skips_nested_annotations() {
        let text = "New York City";
        let annotations: AnnotationSet = [
            Annotation::new(0, "New York City", "LOC"),
            Annotation::new(4, "York", "LOC"),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            markup::encode(text, &annotations).unwrap(),
            "<LOC>New York City</LOC>"
        );
    }

    #[test]
    fn test_alignment_error_names_previous_annotation() {
        let text = "John met Mary";
        let annotations: AnnotationSet = [
            Annotation::new(0, "John", "PER"),
            Annotation::new(9, "Jane", "PER"),
        ]
        .into_iter()
        .collect();
        match codec().encode(text, &annotations, TaggingFormat::InlineTag) {
            Err(Error::Alignment {
                offset,
                expected,
                found,
                previous,
            }) => {
                assert_eq!(offset, 9);
                assert_eq!(expected, "Jane");
                assert_eq!(found, "Mary");
                assert!(previous.unwrap().contains("entity=John"));
            }
            other => panic!("esperava erro de alinhamento, veio {other:?}"),
        }
    }

    #[test]
    fn test_alignment_check_is_case_insensitive() {
        let annotations: AnnotationSet = [Annotation::new(0, "JOHN", "PER")].into_iter().collect();
        assert_eq!(
            markup::encode("John", &annotations).unwrap(),
            "<PER>John</PER>"
        );
    }

    #[test]
    fn test_newline_disables_alignment_check() {
        let annotations: AnnotationSet = [Annotation::new(0, "xxxxxxx", "ORG")].into_iter().collect();
        assert!(markup::encode("New\nYork", &annotations).is_ok());
    }

    #[test]
    fn test_out_of_bounds() {
        // [4, 8) passa do fim de "Hi John" (7 caracteres)
        let annotations: AnnotationSet = [Annotation::new(4, "John", "PER")].into_iter().collect();
        assert!(matches!(
            markup::encode("Hi John", &annotations),
            Err(Error::OutOfBounds {
                offset: 4,
                end: 8,
                text_len: 7
            })
        ));

        // terminar exatamente no fim do texto é válido
        let annotations: AnnotationSet = [Annotation::new(3, "John", "PER")].into_iter().collect();
        assert_eq!(
            markup::encode("Hi John", &annotations).unwrap(),
            "Hi <PER>John</PER>"
        );
    }

    #[test]
    fn test_convert_bracket_to_inline() {
        let converted = codec()
            .convert(
                "[PER John ] met [PER Mary ] .",
                TaggingFormat::Bracket,
                TaggingFormat::InlineTag,
            )
            .unwrap();
        assert_eq!(converted, "<PER>John</PER> met <PER>Mary</PER> .");
    }

    #[test]
    fn test_char_index() {
        let text = "aé<b";
        let index = CharIndex::new(text);
        assert_eq!(index.char_at(0), 0);
        assert_eq!(index.char_at(3), 2);
        assert_eq!(index.char_at(text.len()), 4);
        assert_eq!(index.byte_at(2, text.len()), 3);
        assert_eq!(index.byte_at(9, text.len()), text.len());
    }
}
