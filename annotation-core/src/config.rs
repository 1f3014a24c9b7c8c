//! # Configuração do Codec
//!
//! Os limites que o codec usa eram constantes fixas no sistema de origem
//! (janela de contexto de 40 caracteres, conteúdo de entidade de até 1000 caracteres).
//! Aqui eles viram um struct serializável, com esses valores como padrão.

use serde::{Deserialize, Serialize};

/// Tamanho padrão (em caracteres) da janela de contexto à esquerda e à direita.
pub const DEFAULT_CONTEXT_WINDOW: usize = 40;

/// Tamanho máximo padrão (em caracteres) do conteúdo entre `<TAG>` e `</TAG>`.
pub const DEFAULT_MAX_ENTITY_CHARS: usize = 1000;

/// Parâmetros do [`MarkupCodec`](crate::codec::MarkupCodec).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Quantos caracteres de texto ao redor de cada entidade viram contexto.
    pub context_window: usize,
    /// Limite de caracteres do conteúdo de uma tag inline. Conteúdos maiores não casam.
    pub max_entity_chars: usize,
    /// Separador entre token e tag no formato de colunas.
    pub column_separator: char,
    /// Separador entre token e tag no formato de barras (`token/TAG`).
    pub slash_separator: char,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            context_window: DEFAULT_CONTEXT_WINDOW,
            max_entity_chars: DEFAULT_MAX_ENTITY_CHARS,
            column_separator: '\t',
            slash_separator: '/',
        }
    }
}
