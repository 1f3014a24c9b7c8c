//! # Formato de Colchetes (`[TAG conteúdo ]`)
//!
//! Sem aninhamento. A decodificação reescreve cada `[TAG conteúdo ]` como
//! `<TAG>conteúdo</TAG>` e delega ao decodificador inline.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::encode_with;
use crate::annotation_set::AnnotationSet;
use crate::error::Result;

static BRACKET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\[(\w+)\s(.+?)\s{1,2}\]").expect("BRACKET regex is invalid")
});

/// Reescreve os colchetes como tags inline.
pub fn to_inline(bracket_text: &str) -> String {
    BRACKET
        .replace_all(bracket_text, |caps: &Captures| {
            let tag = &caps[1];
            format!("<{tag}>{}</{tag}>", caps[2].trim())
        })
        .into_owned()
}

/// Codifica como `[TAG entidade ]`.
pub fn encode(text: &str, annotations: &AnnotationSet) -> Result<String> {
    encode_with(text, annotations, String::push_str, |out, annotation, found| {
        out.push('[');
        out.push_str(annotation.tag());
        out.push(' ');
        out.push_str(found);
        out.push_str(" ]");
    })
}
