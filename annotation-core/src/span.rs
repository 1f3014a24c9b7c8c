//! # Span — Intervalo de Caracteres
//!
//! Um [`Span`] é o intervalo semiaberto `[offset, offset + length)` sobre os índices de
//! **caracteres** (não bytes) de um texto. Todas as anotações, o codec e o avaliador
//! falam nesta unidade.
//!
//! ## Relações entre spans
//!
//! | Relação     | Condição                                         |
//! |-------------|--------------------------------------------------|
//! | `matches`   | mesmo offset e mesmo comprimento                 |
//! | `overlaps`  | `a.offset < b.end && b.offset < a.end`           |
//!
//! Note que `matches` implica `overlaps` para spans não vazios; quem precisa distinguir
//! "sobreposição parcial" deve testar `matches` primeiro (como faz o avaliador).

use serde::{Deserialize, Serialize};

/// Intervalo semiaberto de caracteres.
///
/// # Exemplo
/// Em `"text John lives"`, o span de `"John"` é `Span { offset: 5, length: 4 }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Índice do primeiro caractere (inclusivo).
    pub offset: usize,
    /// Número de caracteres.
    pub length: usize,
}

impl Span {
    pub fn new(offset: usize, length: usize) -> Self {
        Self { offset, length }
    }

    /// Índice final (exclusivo).
    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Mesmo offset e mesmo comprimento.
    pub fn matches(&self, other: &Span) -> bool {
        self == other
    }

    /// Os dois intervalos compartilham pelo menos um caractere.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.offset < other.end() && other.offset < self.end()
    }

    /// `other` está inteiramente contido neste span.
    pub fn contains(&self, other: &Span) -> bool {
        self.offset <= other.offset && other.end() <= self.end()
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.offset, self.end())
    }
}
