//! # annotation-core — Anotações, Codec de Marcação e Avaliação de NER
//!
//! Este crate implementa o núcleo de um sistema de avaliação de Reconhecimento de
//! Entidades Nomeadas: o modelo de anotações (spans sobre um texto puro), a conversão
//! entre codificações textuais das mesmas entidades e o scorer no estilo MUC.
//!
//! ## Arquitetura
//!
//! As dependências seguem uma ordem linear:
//!
//! 1.  **Span** ([`span`]): intervalo `[offset, offset + length)` em caracteres.
//! 2.  **Tags** ([`tags`]): distribuição de tags com pontuação; a mais provável é a tag da anotação.
//! 3.  **Anotação** ([`annotation`]): span + valor + tags + contexto.
//! 4.  **Conjunto** ([`annotation_set`]): coleção com offsets de início únicos.
//! 5.  **Codec** ([`codec`]): inline (`<TAG>`), colunas (com variante BIO), colchetes e barras.
//! 6.  **Scorer** ([`scorer`]): compara candidatas com o gold standard e produz um
//!     [`EvaluationResult`] ([`evaluation`]).
//!
//! O [`pipeline`] encadeia codec e scorer e emite eventos de progresso.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use std::collections::HashSet;
//! use annotation_core::{evaluate, EvaluationMode, MarkupCodec, TaggingFormat};
//!
//! let codec = MarkupCodec::new();
//! let gold = codec.decode("<PER>John</PER> visited <LOC>Rome</LOC>.", TaggingFormat::InlineTag);
//! let candidate = codec.decode("John/PER visited Rome/PER .", TaggingFormat::Slash);
//!
//! let result = evaluate(&candidate.annotations, &gold.annotations, &HashSet::new());
//! assert_eq!(result.precision(EvaluationMode::ExactMatch), Some(0.5));
//!
//! // o mesmo documento em outra codificação
//! let bracket = codec
//!     .encode(&gold.text, &gold.annotations, TaggingFormat::Bracket)
//!     .unwrap();
//! assert_eq!(bracket, "[PER John ] visited [LOC Rome ].");
//! ```
//!
//! ## Offsets
//!
//! Todos os offsets e comprimentos contam **caracteres** (não bytes) do texto puro.

pub mod annotation;
pub mod annotation_set;
pub mod codec;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod pipeline;
pub mod scorer;
pub mod span;
pub mod tags;
pub mod tokenizer;

pub use annotation::Annotation;
pub use annotation_set::AnnotationSet;
pub use codec::{Decoded, MarkupCodec, TaggingFormat};
pub use config::CodecConfig;
pub use error::{Error, Result};
pub use evaluation::{ConfusionMatrix, ErrorClass, EvaluationMode, EvaluationResult, Metrics, RealClass};
pub use pipeline::{CandidateInput, EvaluationEvent, EvaluationPipeline, EvaluationRequest};
pub use scorer::evaluate;
pub use span::Span;
pub use tags::{BioLabel, TagDistribution};
pub use tokenizer::{Token, TokenizerMode};
