//! # Formato de Colunas
//!
//! Um token por linha, `token<SEP>tag` (separador padrão: tabulação). Linha em branco
//! separa segmentos (sentenças, parágrafos). Uma sequência de linhas consecutivas com a
//! mesma tag diferente de `O` é uma entidade:
//!
//! ```text
//! John    PER
//! Smith   PER      ->   <PER>John Smith</PER> lives
//! lives   O
//! ```
//!
//! Na variante **BIO** as tags levam prefixo (`B-PER`, `I-PER`); `B-` sempre inicia uma
//! nova entidade, mesmo logo após outra da mesma tag.
//!
//! Linhas com `-DOCSTART-` (cabeçalho do CoNLL) são ignoradas, assim como linhas em
//! branco no início. Com mais de duas colunas, o token é a primeira e a tag é a última.

use std::collections::BTreeSet;

use crate::config::CodecConfig;
use crate::tags::{is_outside, BioLabel, OUTSIDE};
use crate::tokenizer::{tokenize_with_mode, TokenizerMode};

/// Uma linha do formato de colunas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRow {
    Token { token: String, tag: String },
    /// Linha em branco.
    Break,
}

/// Lê as linhas de `column_text`, descartando cabeçalhos e linhas sem tag.
pub fn parse_rows(column_text: &str, separator: char) -> Vec<ColumnRow> {
    let mut rows = Vec::new();
    for line in column_text.lines() {
        let line = line.trim_end_matches('\r');
        if line.contains("-DOCSTART-") {
            continue;
        }
        if line.is_empty() {
            rows.push(ColumnRow::Break);
            continue;
        }
        let parts: Vec<&str> = line.split(separator).filter(|p| !p.is_empty()).collect();
        if let [token, .., tag] = parts.as_slice() {
            rows.push(ColumnRow::Token {
                token: token.to_string(),
                tag: tag.to_string(),
            });
        }
    }
    rows
}

/// Todas as tags usadas no arquivo (incluindo `O`, se houver).
pub fn tags(column_text: &str, separator: char) -> BTreeSet<String> {
    parse_rows(column_text, separator)
        .into_iter()
        .filter_map(|row| match row {
            ColumnRow::Token { tag, .. } => Some(tag),
            ColumnRow::Break => None,
        })
        .collect()
}

/// Converte colunas em texto com tags inline, agrupando tokens consecutivos de mesma tag.
///
/// Os tokens são unidos por um espaço, exceto quando começam com pontuação (que fica
/// colada ao token anterior) ou logo após uma quebra de linha.
pub fn to_inline(column_text: &str, config: &CodecConfig, bio: bool) -> String {
    let mut out = String::new();
    let mut current = OUTSIDE.to_string();
    let mut previous_break = true;
    let mut pending_breaks = 0usize;

    for row in parse_rows(column_text, config.column_separator) {
        match row {
            ColumnRow::Break => {
                if out.is_empty() {
                    continue;
                }
                if !is_outside(&current) {
                    close_tag(&mut out, &current);
                    current = OUTSIDE.to_string();
                }
                pending_breaks += 1;
                previous_break = true;
            }
            ColumnRow::Token { token, tag } => {
                out.extend(std::iter::repeat('\n').take(pending_breaks));
                pending_breaks = 0;

                let (tag, begins) = if bio {
                    match BioLabel::from_label(&tag) {
                        BioLabel::Begin(tag) => (tag, true),
                        BioLabel::Inside(tag) => (tag, false),
                        BioLabel::Outside => (OUTSIDE.to_string(), false),
                    }
                } else {
                    (tag, false)
                };

                let mut opened = false;
                if !same_tag(&current, &tag) || (begins && !is_outside(&tag)) {
                    if !is_outside(&current) {
                        close_tag(&mut out, &current);
                    }
                    if !is_outside(&tag) {
                        if !out.is_empty() && !previous_break {
                            out.push(' ');
                        }
                        open_tag(&mut out, &tag);
                        opened = true;
                    }
                }
                current = tag;

                if starts_word(&token) && !opened && !out.is_empty() && !previous_break {
                    out.push(' ');
                }
                out.push_str(&token);
                previous_break = false;
            }
        }
    }

    if !is_outside(&current) {
        close_tag(&mut out, &current);
    }
    out
}

/// Como [`to_inline`], mas cada token anotado vira uma entidade própria.
pub fn to_inline_token_based(column_text: &str, config: &CodecConfig) -> String {
    let mut out = String::new();
    let mut previous_break = true;
    let mut pending_breaks = 0usize;

    for row in parse_rows(column_text, config.column_separator) {
        match row {
            ColumnRow::Break => {
                if !out.is_empty() {
                    pending_breaks += 1;
                    previous_break = true;
                }
            }
            ColumnRow::Token { token, tag } => {
                out.extend(std::iter::repeat('\n').take(pending_breaks));
                pending_breaks = 0;

                if starts_word(&token) && !out.is_empty() && !previous_break {
                    out.push(' ');
                }
                match BioLabel::from_label(&tag).tag() {
                    Some(tag) => {
                        open_tag(&mut out, tag);
                        out.push_str(&token);
                        close_tag(&mut out, tag);
                    }
                    None => out.push_str(&token),
                }
                previous_break = false;
            }
        }
    }
    out
}

/// Converte texto com tags inline em colunas.
///
/// Cada linha da marcação é tokenizada e termina com uma linha em branco. Na variante
/// BIO, o prefixo é `B-` quando a tag difere da linha anterior não vazia e `I-` quando
/// se repete.
pub fn from_inline(markup: &str, config: &CodecConfig, bio: bool) -> String {
    let separator = config.column_separator;
    let mut out = String::new();
    let mut last_tag = String::new();

    for line in markup.split('\n') {
        let mut open = OUTSIDE.to_string();
        for token in tokenize_with_mode(line, TokenizerMode::Markup) {
            let text = token.text;
            if is_tag_token(&text) {
                open = if text.starts_with("</") {
                    OUTSIDE.to_string()
                } else {
                    text[1..text.len() - 1].to_string()
                };
                continue;
            }

            let label = if !bio || is_outside(&open) {
                open.clone()
            } else if same_tag(&last_tag, &open) {
                BioLabel::Inside(open.clone()).label()
            } else {
                BioLabel::Begin(open.clone()).label()
            };
            out.push_str(&text);
            out.push(separator);
            out.push_str(&label);
            out.push('\n');
            last_tag = open.clone();
        }
        out.push('\n');
    }
    out
}

fn is_tag_token(text: &str) -> bool {
    text.len() > 2 && text.starts_with('<') && text.ends_with('>')
}

fn same_tag(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Começa com letra, dígito ou parêntese/colchete/chave.
fn starts_word(token: &str) -> bool {
    token
        .chars()
        .next()
        .is_some_and(|c| c.is_alphanumeric() || matches!(c, '(' | ')' | '[' | ']' | '{' | '}'))
}

fn open_tag(out: &mut String, tag: &str) {
    out.push('<');
    out.push_str(tag);
    out.push('>');
}

fn close_tag(out: &mut String, tag: &str) {
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::markup;

    fn config() -> CodecConfig {
        CodecConfig::default()
    }

    #[test]
    fn test_groups_consecutive_tags() {
        let column = "John\tPER\nSmith\tPER\nlives\tO\nin\tO\nBerlin\tLOC\n.\tO\n";
        assert_eq!(
            to_inline(column, &config(), false),
            "<PER>John Smith</PER> lives in <LOC>Berlin</LOC>."
        );
    }

    #[test]
    fn test_docstart_and_leading_blank_lines_are_skipped() {
        let column = "-DOCSTART- -X- O O\n\n\nEU\tORG\nrejects\tO\n";
        assert_eq!(to_inline(column, &config(), false), "<ORG>EU</ORG> rejects");
    }

    #[test]
    fn test_blank_line_closes_entity_and_breaks_line() {
        let column = "Paris\tLOC\n\nLondon\tLOC\ncalls\tO\n";
        assert_eq!(
            to_inline(column, &config(), false),
            "<LOC>Paris</LOC>\n<LOC>London</LOC> calls"
        );
    }

    #[test]
    fn test_entity_open_at_end_is_closed() {
        assert_eq!(
            to_inline("visit\tO\nNew\tLOC\nYork\tLOC", &config(), false),
            "visit <LOC>New York</LOC>"
        );
    }

    #[test]
    fn test_bio_begin_splits_adjacent_entities() {
        let column = "John\tB-PER\nMary\tB-PER\nSmith\tI-PER\n";
        assert_eq!(
            to_inline(column, &config(), true),
            "<PER>John</PER> <PER>Mary Smith</PER>"
        );
        // sem BIO, os rótulos são tags opacas e não casam com o padrão de tags
        assert!(markup::decode(&to_inline(column, &config(), false), &config())
            .annotations
            .is_empty());
    }

    #[test]
    fn test_extra_columns_use_last_as_tag() {
        let column = "EU NNP B-NP ORG\ncalls VBZ B-VP O\n";
        let space = CodecConfig {
            column_separator: ' ',
            ..config()
        };
        assert_eq!(to_inline(column, &space, false), "<ORG>EU</ORG> calls");
    }

    #[test]
    fn test_token_based_wraps_every_token() {
        let column = "New\tLOC\nYork\tLOC\nis\tO\nbig\tO\n";
        assert_eq!(
            to_inline_token_based(column, &config()),
            "<LOC>New</LOC> <LOC>York</LOC> is big"
        );
    }

    #[test]
    fn test_from_inline_bio_labels() {
        let column = from_inline("<PER>Ann Lee</PER> and <PER>Bo</PER>", &config(), true);
        assert_eq!(
            column,
            "Ann\tB-PER\nLee\tI-PER\nand\tO\nBo\tB-PER\n\n"
        );
    }

    #[test]
    fn test_from_inline_custom_separator() {
        let config = CodecConfig {
            column_separator: ';',
            ..CodecConfig::default()
        };
        assert_eq!(
            from_inline("<ORG>Acme</ORG> sells", &config, false),
            "Acme;ORG\nsells;O\n\n"
        );
    }

    #[test]
    fn test_from_inline_multiple_lines() {
        let column = from_inline("<LOC>Rome</LOC>\nok", &config(), false);
        assert_eq!(column, "Rome\tLOC\n\nok\tO\n\n");
        assert_eq!(to_inline(&column, &config(), false), "<LOC>Rome</LOC>\nok");
    }

    #[test]
    fn test_tags() {
        let found = tags("a\tPER\nb\tO\n\nc\tLOC\n", '\t');
        let expected: BTreeSet<String> =
            ["LOC", "O", "PER"].iter().map(|s| s.to_string()).collect();
        assert_eq!(found, expected);
    }
}
