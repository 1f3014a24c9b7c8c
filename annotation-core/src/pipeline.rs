//! # Pipeline de Avaliação com Eventos Observáveis
//!
//! Encadeia codec e scorer: decodifica o gold standard, obtém as anotações candidatas
//! (já prontas ou a partir de marcação), normaliza o conjunto candidato e avalia.
//! Cada passo emite um [`EvaluationEvent`] por um canal `mpsc`, para que o servidor
//! WebSocket mostre o progresso ao cliente.

use std::collections::HashSet;
use std::sync::mpsc;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::annotation_set::AnnotationSet;
use crate::codec::{MarkupCodec, TaggingFormat};
use crate::error::{Error, Result};
use crate::evaluation::{ErrorClass, EvaluationResult};
use crate::scorer::evaluate;

/// De onde vêm as anotações candidatas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CandidateInput {
    /// Marcação produzida pelo sistema avaliado.
    Markup {
        markup: String,
        format: TaggingFormat,
    },
    /// Anotações sobre o texto puro do gold standard.
    Annotations { annotations: AnnotationSet },
}

/// Um documento a avaliar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub gold_markup: String,
    pub gold_format: TaggingFormat,
    pub candidate: CandidateInput,
    /// Valores de entidades que não contam como ERROR2.
    #[serde(default)]
    pub ignore: HashSet<String>,
}

/// Eventos emitidos durante a avaliação.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum EvaluationEvent {
    /// **Passo 1**: gold standard decodificado.
    GoldDecoded { text: String, annotations: usize },
    /// **Passo 2**: anotações candidatas obtidas.
    CandidateDecoded { annotations: usize },
    /// **Passo 3**: anotações aninhadas removidas do conjunto candidato.
    NestedRemoved { removed: usize, kept: usize },
    /// **Passo 4**: total de uma classe, emitido para cada [`ErrorClass`].
    Classified {
        class: ErrorClass,
        description: String,
        count: usize,
    },
    /// **Conclusão**.
    Done {
        result: EvaluationResult,
        processing_ms: u64,
    },
    /// **Falha**: as candidatas não cabem no texto do gold standard.
    Error { message: String },
}

/// Pipeline de avaliação.
///
/// # Modos de Uso
/// - **Sync**: [`EvaluationPipeline::evaluate`].
/// - **Streaming**: [`EvaluationPipeline::evaluate_streaming`] para a UI via WebSocket.
/// - **Lote**: [`EvaluationPipeline::evaluate_batch`], documentos em paralelo.
#[derive(Debug, Clone, Default)]
pub struct EvaluationPipeline {
    pub codec: MarkupCodec,
}

impl EvaluationPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_codec(codec: MarkupCodec) -> Self {
        Self { codec }
    }

    /// Avalia um documento e retorna só o resultado final.
    ///
    /// Os eventos intermediários ficam no canal e são descartados.
    pub fn evaluate(&self, request: &EvaluationRequest) -> Result<EvaluationResult> {
        let (tx, _rx) = mpsc::channel();
        self.run(request, &tx)
    }

    /// Avalia documentos independentes em paralelo.
    pub fn evaluate_batch(&self, requests: &[EvaluationRequest]) -> Vec<Result<EvaluationResult>> {
        requests
            .par_iter()
            .map(|request| self.evaluate(request))
            .collect()
    }

    /// Avalia todos os documentos e soma os resultados.
    pub fn evaluate_corpus(&self, requests: &[EvaluationRequest]) -> Result<EvaluationResult> {
        let mut total = EvaluationResult::default();
        for result in self.evaluate_batch(requests) {
            total.merge(&result?);
        }
        info!(documents = requests.len(), "corpus avaliado");
        Ok(total)
    }

    /// Executa a avaliação enviando eventos de progresso pelo canal `tx`.
    ///
    /// # Fluxo de Eventos
    /// 1. `GoldDecoded`
    /// 2. `CandidateDecoded`
    /// 3. `NestedRemoved`
    /// 4. `Classified` (um por classe)
    /// 5. `Done`, ou `Error` se alguma candidata passar do fim do texto
    pub fn evaluate_streaming(&self, request: &EvaluationRequest, tx: mpsc::Sender<EvaluationEvent>) {
        if let Err(err) = self.run(request, &tx) {
            let _ = tx.send(EvaluationEvent::Error {
                message: err.to_string(),
            });
        }
    }

    fn run(
        &self,
        request: &EvaluationRequest,
        tx: &mpsc::Sender<EvaluationEvent>,
    ) -> Result<EvaluationResult> {
        let start = Instant::now();

        // === Passo 1: gold standard ===
        let gold = self.codec.decode(&request.gold_markup, request.gold_format);
        let _ = tx.send(EvaluationEvent::GoldDecoded {
            text: gold.text.clone(),
            annotations: gold.annotations.len(),
        });

        // === Passo 2: candidatas ===
        let mut candidate = match &request.candidate {
            CandidateInput::Annotations { annotations } => annotations.clone(),
            CandidateInput::Markup { markup, format } => {
                let decoded = self.codec.decode(markup, *format);
                if decoded.text != gold.text {
                    warn!(
                        gold_chars = gold.text.chars().count(),
                        candidate_chars = decoded.text.chars().count(),
                        "texto puro do candidato difere do gold standard"
                    );
                }
                decoded.annotations
            }
        };
        let _ = tx.send(EvaluationEvent::CandidateDecoded {
            annotations: candidate.len(),
        });

        check_bounds(&gold.text, &candidate).inspect_err(|err| {
            warn!(error = %err, "candidatas fora do texto");
        })?;

        // === Passo 3: normalização ===
        let before = candidate.len();
        candidate.sort();
        candidate.remove_nested();
        let _ = tx.send(EvaluationEvent::NestedRemoved {
            removed: before - candidate.len(),
            kept: candidate.len(),
        });

        // === Passo 4: scorer ===
        let gold_annotations = gold.annotations.sorted();
        let result = evaluate(&candidate, &gold_annotations, &request.ignore);
        for class in ErrorClass::all() {
            let _ = tx.send(EvaluationEvent::Classified {
                class,
                description: class.description().to_string(),
                count: result.total(class),
            });
        }

        let _ = tx.send(EvaluationEvent::Done {
            result: result.clone(),
            processing_ms: start.elapsed().as_millis() as u64,
        });
        Ok(result)
    }
}

/// Falha se alguma anotação termina depois do fim de `text`.
fn check_bounds(text: &str, annotations: &AnnotationSet) -> Result<()> {
    let text_len = text.chars().count();
    match annotations.iter().find(|a| a.end() > text_len) {
        Some(annotation) => Err(Error::OutOfBounds {
            offset: annotation.offset(),
            end: annotation.end(),
            text_len,
        }),
        None => Ok(()),
    }
}
