//! # Tokenizador
//!
//! Divide o texto em tokens (palavras, números, pontuações), preservando a posição de
//! cada um no texto original. As posições são índices de **caractere**, a mesma unidade
//! dos spans de anotação.
//!
//! ## Modos
//!
//! - **Standard**: palavras separadas por espaços/pontuações. Abreviações comuns
//!   (`Dr.`, `Mr.`, `Inc.`) e números decimais (`3.14`) ficam inteiros.
//! - **Markup**: igual ao Standard, mas `<TAG>` e `</TAG>` viram um único token cada.
//!   É o modo usado para converter texto com tags inline em formato de colunas.
//!
//! ```rust
//! use annotation_core::tokenizer::{tokenize_with_mode, TokenizerMode};
//!
//! let tokens = tokenize_with_mode("<PER>Dr. Smith</PER> left.", TokenizerMode::Markup);
//! let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
//! assert_eq!(texts, vec!["<PER>", "Dr.", "Smith", "</PER>", "left", "."]);
//! ```

use serde::{Deserialize, Serialize};

/// Um token extraído do texto.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Token {
    pub text: String,
    /// Índice de caractere inicial (inclusivo).
    pub start: usize,
    /// Índice de caractere final (exclusivo).
    pub end: usize,
    /// Posição sequencial do token na lista.
    pub index: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenizerMode {
    #[default]
    Standard,
    /// Mantém `<TAG>` e `</TAG>` como tokens únicos.
    Markup,
}

/// Abreviações que não terminam sentença.
const ABBREVIATIONS: &[&str] = &[
    "Dr", "Mr", "Mrs", "Ms", "Prof", "Sr", "Jr", "St", "Inc", "Ltd", "Co", "Corp", "Gen",
    "Gov", "Sen", "Rep", "Capt", "Lt", "Col", "Mt", "vs", "etc", "No", "Jan", "Feb", "Mar",
    "Apr", "Jun", "Jul", "Aug", "Sep", "Sept", "Oct", "Nov", "Dec",
];

/// Tokeniza no modo padrão.
pub fn tokenize(text: &str) -> Vec<Token> {
    tokenize_with_mode(text, TokenizerMode::Standard)
}

pub fn tokenize_with_mode(text: &str, mode: TokenizerMode) -> Vec<Token> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = match mode {
        TokenizerMode::Standard => tokenize_standard(&chars, 0, chars.len()),
        TokenizerMode::Markup => tokenize_markup(&chars),
    };

    for (i, token) in tokens.iter_mut().enumerate() {
        token.index = i;
    }
    tokens
}

/// Separa as tags e tokeniza os trechos entre elas no modo padrão.
fn tokenize_markup(chars: &[char]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut segment_start = 0;
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == '<' {
            if let Some(len) = tag_length(&chars[i..]) {
                tokens.extend(tokenize_standard(chars, segment_start, i));
                push_token(&mut tokens, chars[i..i + len].iter().collect(), i, i + len);
                i += len;
                segment_start = i;
                continue;
            }
        }
        i += 1;
    }
    tokens.extend(tokenize_standard(chars, segment_start, chars.len()));
    tokens
}

/// Comprimento de `<NOME>` ou `</NOME>` no início de `chars`, se houver.
fn tag_length(chars: &[char]) -> Option<usize> {
    let mut i = 1;
    if chars.get(i) == Some(&'/') {
        i += 1;
    }
    let name_start = i;
    while chars.get(i).is_some_and(|c| c.is_alphanumeric() || *c == '_' || *c == '-') {
        i += 1;
    }
    (i > name_start && chars.get(i) == Some(&'>')).then_some(i + 1)
}

fn tokenize_standard(chars: &[char], from: usize, to: usize) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current_start = from;
    let mut current_text = String::new();
    let mut i = from;

    while i < to {
        let ch = chars[i];

        if ch.is_alphanumeric() || (ch == '-' || ch == '\'' || ch == '’') && !current_text.is_empty() {
            if current_text.is_empty() {
                current_start = i;
            }
            current_text.push(ch);
        } else if ch == '.' && !current_text.is_empty() {
            let is_abbrev = ABBREVIATIONS.contains(&current_text.as_str())
                || is_initial(&current_text);
            let current_is_num = current_text.chars().all(char::is_numeric);
            let next_is_num = i + 1 < to && chars[i + 1].is_numeric();

            if is_abbrev || (current_is_num && next_is_num) {
                current_text.push('.');
            } else {
                flush_token(&mut tokens, &mut current_text, current_start, i);
                push_token(&mut tokens, ".".to_string(), i, i + 1);
            }
        } else if ch.is_whitespace() {
            flush_token(&mut tokens, &mut current_text, current_start, i);
        } else {
            flush_token(&mut tokens, &mut current_text, current_start, i);
            push_token(&mut tokens, ch.to_string(), i, i + 1);
        }
        i += 1;
    }

    flush_token(&mut tokens, &mut current_text, current_start, to);
    tokens
}

/// Inicial de nome, como o "J" de "John J. Smith".
fn is_initial(text: &str) -> bool {
    let mut chars = text.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_uppercase())
}

/// Fecha o token acumulado (se não vazio).
fn flush_token(tokens: &mut Vec<Token>, text: &mut String, start: usize, end: usize) {
    if !text.is_empty() {
        tokens.push(Token {
            text: std::mem::take(text),
            start,
            end,
            index: 0,
        });
    }
}

fn push_token(tokens: &mut Vec<Token>, text: String, start: usize, end: usize) {
    tokens.push(Token {
        text,
        start,
        end,
        index: 0,
    });
}
