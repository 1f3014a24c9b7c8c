//! # Anotação
//!
//! Uma [`Annotation`] é um [`Span`] sobre o texto puro, mais:
//!
//! - o **valor** (a substring anotada, com `value.chars().count() == span.length`),
//! - a [`TagDistribution`] com a confiança de cada tag,
//! - contextos opcionais à esquerda e à direita (texto ao redor da entidade),
//! - subtipos opcionais (rótulos livres como `"city"` ou `"capital"`).
//!
//! ## Imutabilidade
//!
//! Offset, valor e tags são definidos na construção e nunca mudam. Contexto e subtipos
//! podem ser anexados depois, mas sempre por métodos que consomem `self` e devolvem uma
//! nova anotação (estilo builder):
//!
//! ```rust
//! use annotation_core::annotation::Annotation;
//!
//! let a = Annotation::new(5, "John", "PER").with_context("text", "lives here");
//! assert_eq!(a.left_contexts()[0], "text");
//! ```
//!
//! ## Janelas de contexto
//!
//! [`Annotation::left_contexts`] e [`Annotation::right_contexts`] derivam até três janelas
//! crescentes (1, 2 e 3 palavras) a partir das strings de contexto. Tokens numéricos viram
//! o marcador `NUM`, de modo que "em 2010" e "em 1998" geram o mesmo contexto.

use serde::{Deserialize, Serialize};

use crate::annotation_set::AnnotationSet;
use crate::error::{Error, Result};
use crate::span::Span;
use crate::tags::TagDistribution;

/// Marcador que substitui tokens numéricos nas janelas de contexto.
pub const NUMBER_PLACEHOLDER: &str = "NUM";

/// Uma entidade anotada sobre o texto puro.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AnnotationRecord")]
pub struct Annotation {
    span: Span,
    value: String,
    tags: TagDistribution,
    left_context: String,
    right_context: String,
    sub_types: Option<Vec<String>>,
}

/// Forma serializada, validada na desserialização.
#[derive(Deserialize)]
struct AnnotationRecord {
    span: Span,
    value: String,
    tags: TagDistribution,
    #[serde(default)]
    left_context: String,
    #[serde(default)]
    right_context: String,
    #[serde(default)]
    sub_types: Option<Vec<String>>,
}

impl TryFrom<AnnotationRecord> for Annotation {
    type Error = Error;

    fn try_from(record: AnnotationRecord) -> Result<Self> {
        let annotation = Annotation::from_span(record.span, record.value, record.tags)?;
        let annotation = annotation.with_context(record.left_context, record.right_context);
        Ok(match record.sub_types {
            Some(sub_types) => annotation.with_sub_types(sub_types),
            None => annotation,
        })
    }
}

impl Annotation {
    /// Anotação com uma única tag; o comprimento vem do próprio valor.
    pub fn new(offset: usize, value: impl Into<String>, tag: impl Into<String>) -> Self {
        Self::with_tags(offset, value, TagDistribution::from_tag(tag))
    }

    /// Anotação com uma distribuição de tags completa.
    pub fn with_tags(offset: usize, value: impl Into<String>, tags: TagDistribution) -> Self {
        let value = value.into();
        let length = value.chars().count();
        Self {
            span: Span::new(offset, length),
            value,
            tags,
            left_context: String::new(),
            right_context: String::new(),
            sub_types: None,
        }
    }

    /// Anotação a partir de um span explícito.
    ///
    /// Falha com [`Error::LengthMismatch`] se o valor não tiver `span.length` caracteres.
    pub fn from_span(span: Span, value: impl Into<String>, tags: TagDistribution) -> Result<Self> {
        let value = value.into();
        let actual = value.chars().count();
        if actual != span.length {
            return Err(Error::LengthMismatch {
                expected: span.length,
                actual,
            });
        }
        Ok(Self::with_tags(span.offset, value, tags))
    }

    /// Anexa os contextos à esquerda e à direita.
    pub fn with_context(mut self, left: impl Into<String>, right: impl Into<String>) -> Self {
        self.left_context = left.into();
        self.right_context = right.into();
        self
    }

    /// Acrescenta subtipos aos já existentes.
    pub fn with_sub_types<I, S>(mut self, sub_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sub_types
            .get_or_insert_with(Vec::new)
            .extend(sub_types.into_iter().map(Into::into));
        self
    }

    /// Nova anotação no mesmo span, com outra distribuição de tags.
    pub fn retagged(&self, tags: TagDistribution) -> Self {
        Self {
            tags,
            ..self.clone()
        }
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn offset(&self) -> usize {
        self.span.offset
    }

    pub fn length(&self) -> usize {
        self.span.length
    }

    pub fn end(&self) -> usize {
        self.span.end()
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn tags(&self) -> &TagDistribution {
        &self.tags
    }

    /// Tag mais provável da distribuição.
    pub fn tag(&self) -> &str {
        self.tags.most_likely()
    }

    pub fn left_context(&self) -> &str {
        &self.left_context
    }

    pub fn right_context(&self) -> &str {
        &self.right_context
    }

    pub fn sub_types(&self) -> Option<&[String]> {
        self.sub_types.as_deref()
    }

    /// Mesmo span.
    pub fn matches(&self, other: &Annotation) -> bool {
        self.span.matches(&other.span)
    }

    /// Os spans compartilham pelo menos um caractere.
    pub fn overlaps(&self, other: &Annotation) -> bool {
        self.span.overlaps(&other.span)
    }

    /// Tags mais prováveis iguais, ignorando maiúsculas/minúsculas.
    pub fn same_tag(&self, other: &Annotation) -> bool {
        self.tag().to_lowercase() == other.tag().to_lowercase()
    }

    /// Janelas de 1, 2 e 3 palavras imediatamente à esquerda da entidade.
    ///
    /// Com menos palavras do que a janela pede, a janela fica vazia.
    ///
    /// ```rust
    /// use annotation_core::annotation::Annotation;
    ///
    /// let a = Annotation::new(20, "Berlin", "LOC").with_context("in 2010 he moved to", "");
    /// assert_eq!(a.left_contexts(), ["to", "moved to", "he moved to"]);
    /// ```
    pub fn left_contexts(&self) -> [String; 3] {
        let words = split_on_space(&self.left_context);
        let mut contexts = [String::new(), String::new(), String::new()];
        for (number, word) in words.iter().rev().take(3).enumerate() {
            let token = numericalize(word);
            match number {
                0 => {
                    for context in contexts.iter_mut() {
                        *context = token.to_string();
                    }
                }
                1 => {
                    contexts[1] = format!("{token} {}", contexts[1]);
                    contexts[2] = format!("{token} {}", contexts[2]);
                }
                _ => contexts[2] = format!("{token} {}", contexts[2]),
            }
        }
        clear_short_windows(&mut contexts, words.len());
        contexts
    }

    /// Janelas de 1, 2 e 3 palavras imediatamente à direita da entidade.
    pub fn right_contexts(&self) -> [String; 3] {
        let words = split_on_space(&self.right_context);
        let mut contexts = [String::new(), String::new(), String::new()];
        for (number, word) in words.iter().take(3).enumerate() {
            let token = numericalize(word);
            match number {
                0 => {
                    for context in contexts.iter_mut() {
                        *context = token.to_string();
                    }
                }
                1 => {
                    contexts[1] = format!("{} {token}", contexts[1]);
                    contexts[2] = format!("{} {token}", contexts[2]);
                }
                _ => contexts[2] = format!("{} {token}", contexts[2]),
            }
        }
        clear_short_windows(&mut contexts, words.len());
        contexts
    }

    /// Procura, dentro do valor desta anotação, anotações mais curtas do conjunto.
    ///
    /// Só se aplica a entidades inteiramente em maiúsculas (ex: manchetes como
    /// `"NEW YORK TIMES REPORTS"`), onde a capitalização não separa as entidades. Uma
    /// anotação do conjunto é reconhecida quando aparece (sem diferenciar maiúsculas)
    /// como sequência de palavras no meio, no início ou no fim do valor e tem mais de
    /// 2 caracteres. As anotações devolvidas têm offsets absolutos e a tag da anotação
    /// encontrada.
    pub fn unwrap_within(&self, annotations: &AnnotationSet) -> Vec<Annotation> {
        let mut unwrapped = Vec::new();
        if !is_completely_uppercase(&self.value) {
            return unwrapped;
        }

        let entity: Vec<char> = self.value.chars().collect();
        for other in annotations.iter() {
            if other.length() >= entity.len() || other.length() <= 2 {
                continue;
            }
            let needle: Vec<char> = other.value.chars().collect();
            let make = |index: usize| Annotation::new(self.offset() + index, other.value(), other.tag());

            // " valor " no meio
            let mut padded = Vec::with_capacity(needle.len() + 2);
            padded.push(' ');
            padded.extend_from_slice(&needle);
            padded.push(' ');
            if let Some(index) = find_ignore_case(&entity, &padded) {
                unwrapped.push(make(index + 1));
            }

            // "valor " no início
            if starts_with_ignore_case(&entity, &padded[1..]) {
                unwrapped.push(make(0));
            }

            // " valor" no fim
            let suffix = &padded[..padded.len() - 1];
            if entity.len() >= suffix.len()
                && chars_eq_ignore_case(&entity[entity.len() - suffix.len()..], suffix)
            {
                unwrapped.push(make(entity.len() - needle.len()));
            }
        }
        unwrapped
    }
}

impl std::fmt::Display for Annotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Annotation [offset={}, length={}, entity={}, tag={}]",
            self.offset(),
            self.length(),
            self.value,
            self.tag()
        )
    }
}

/// Divide em espaços simples; `""` gera `[""]` e vazios no final são descartados.
fn split_on_space(text: &str) -> Vec<&str> {
    if text.is_empty() {
        return vec![""];
    }
    let mut words: Vec<&str> = text.split(' ').collect();
    while words.last().is_some_and(|w| w.is_empty()) {
        words.pop();
    }
    words
}

fn clear_short_windows(contexts: &mut [String; 3], word_count: usize) {
    if word_count < 3 {
        contexts[2].clear();
    }
    if word_count < 2 {
        contexts[1].clear();
    }
}

fn numericalize(token: &str) -> &str {
    if is_number(token) || is_numeric_expression(token) {
        NUMBER_PLACEHOLDER
    } else {
        token
    }
}

/// Dígitos e pontos, sem começar nem terminar com ponto (ex: "3.14", "2010").
pub fn is_number(token: &str) -> bool {
    !token.is_empty()
        && token.chars().all(|c| c.is_numeric() || c == '.')
        && !token.starts_with('.')
        && !token.ends_with('.')
}

/// Dígitos misturados com pontuação numérica: traços, moeda, `%`, `.`, `,` e `:`
/// (ex: "$5", "10%", "12:30", "1,000").
pub fn is_numeric_expression(token: &str) -> bool {
    !token.is_empty()
        && token.chars().all(|c| {
            c.is_numeric()
                || c.is_whitespace()
                || matches!(
                    c,
                    '-' | '\u{2010}'..='\u{2015}' | '_' | '%' | '.' | ',' | ':'
                        | '$' | '€' | '£' | '¥' | '¢' | '₹'
                )
        })
}

fn is_completely_uppercase(text: &str) -> bool {
    text.chars().any(char::is_alphabetic) && !text.chars().any(char::is_lowercase)
}

fn char_eq_ignore_case(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

fn chars_eq_ignore_case(a: &[char], b: &[char]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| char_eq_ignore_case(*x, *y))
}

fn starts_with_ignore_case(haystack: &[char], needle: &[char]) -> bool {
    haystack.len() >= needle.len() && chars_eq_ignore_case(&haystack[..needle.len()], needle)
}

fn find_ignore_case(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    (0..=haystack.len() - needle.len())
        .find(|&i| chars_eq_ignore_case(&haystack[i..i + needle.len()], needle))
}
