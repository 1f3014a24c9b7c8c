//! # Erros do Núcleo de Anotações
//!
//! Apenas duas situações são realmente fatais no núcleo:
//!
//! - **Alinhamento**: ao codificar, o texto no offset da anotação não bate com o valor
//!   armazenado. Continuar produziria marcação corrompida, então a codificação é abortada.
//! - **Distribuição de tags vazia**: construir uma anotação sem nenhuma tag é erro do
//!   programador e falha imediatamente.
//!
//! Marcação malformada, inserções com offset duplicado e casos de borda da avaliação
//! **não** são erros: apenas mudam o resultado.

use thiserror::Error;

/// Resultado padrão das operações do núcleo.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// O texto em `[offset, offset + len)` não corresponde ao valor da anotação.
    #[error(
        "erro de alinhamento no offset {offset}: esperado {expected:?}, encontrado {found:?} (anotação anterior: {})",
        .previous.as_deref().unwrap_or("nenhuma")
    )]
    Alignment {
        offset: usize,
        expected: String,
        found: String,
        /// Descrição da última anotação emitida antes da falha.
        previous: Option<String>,
    },

    /// A anotação termina depois do fim do texto.
    #[error("anotação [{offset}, {end}) ultrapassa o texto de {text_len} caracteres")]
    OutOfBounds {
        offset: usize,
        end: usize,
        text_len: usize,
    },

    #[error("distribuição de tags vazia: toda anotação precisa de pelo menos uma tag")]
    EmptyTagDistribution,

    #[error("score inválido {score} para a tag {tag:?}")]
    InvalidScore { tag: String, score: f64 },

    /// O comprimento do valor (em caracteres) difere do comprimento do span.
    #[error("comprimento do valor ({actual}) difere do span ({expected})")]
    LengthMismatch { expected: usize, actual: usize },
}

impl Error {
    /// Cria um erro de alinhamento.
    pub fn alignment(
        offset: usize,
        expected: impl Into<String>,
        found: impl Into<String>,
        previous: Option<String>,
    ) -> Self {
        Error::Alignment {
            offset,
            expected: expected.into(),
            found: found.into(),
            previous,
        }
    }
}
