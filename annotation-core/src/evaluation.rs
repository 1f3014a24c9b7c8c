//! # Resultado da Avaliação (estilo MUC)
//!
//! Guarda o que o [`scorer`](crate::scorer) produziu ao comparar anotações candidatas com
//! o gold standard:
//!
//! - contagens por tag e por [`ErrorClass`],
//! - quantas anotações de cada tag o gold standard tem (`possible`),
//! - a matriz de confusão (tag real × tag atribuída),
//! - as anotações de cada classe de erro, para inspeção.
//!
//! ## Taxonomia
//!
//! | Classe  | Span               | Tag        | Prejudica            |
//! |---------|--------------------|------------|----------------------|
//! | CORRECT | igual              | igual      | -                    |
//! | ERROR1  | sem correspondente | -          | precisão             |
//! | ERROR2  | (gold não achado)  | -          | recall               |
//! | ERROR3  | igual              | diferente  | precisão e recall    |
//! | ERROR4  | sobreposto         | igual      | precisão e recall    |
//! | ERROR5  | sobreposto         | diferente  | precisão e recall    |
//!
//! ## Métricas
//!
//! Para cada tag, `actual` é a soma das classes que contam uma atribuição do sistema
//! (tudo menos ERROR2) e `possible` vem do gold standard.
//!
//! | Modo          | Acertos                              | Denominadores          |
//! |---------------|--------------------------------------|------------------------|
//! | `ExactMatch`  | CORRECT                              | actual / possible      |
//! | `Muc`         | ERROR3 + ERROR4 + 2·CORRECT          | 2·actual / 2·possible  |
//! | `Recognition` | CORRECT + ERROR3                     | actual / possible      |
//!
//! Razões com denominador zero são `None` (indefinidas), não zero.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::annotation::Annotation;
use crate::annotation_set::AnnotationSet;

/// Classe de um par candidato/gold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorClass {
    Correct,
    /// Anotou algo que não deveria (falso positivo).
    Error1,
    /// Deixou de anotar uma entidade do gold (falso negativo).
    Error2,
    Error3,
    Error4,
    Error5,
}

impl ErrorClass {
    pub fn all() -> [ErrorClass; 6] {
        [
            ErrorClass::Correct,
            ErrorClass::Error1,
            ErrorClass::Error2,
            ErrorClass::Error3,
            ErrorClass::Error4,
            ErrorClass::Error5,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ErrorClass::Correct => "CORRECT",
            ErrorClass::Error1 => "ERROR1",
            ErrorClass::Error2 => "ERROR2",
            ErrorClass::Error3 => "ERROR3",
            ErrorClass::Error4 => "ERROR4",
            ErrorClass::Error5 => "ERROR5",
        }
    }

    /// Explicação legível da classe.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorClass::Correct => "CORRECT: tag and boundaries correct",
            ErrorClass::Error1 => {
                "ERROR1: tagged something that should not have been tagged, false positive - bad for precision"
            }
            ErrorClass::Error2 => {
                "ERROR2: completely missed an annotation, false negative - bad for recall"
            }
            ErrorClass::Error3 => {
                "ERROR3: incorrect annotation type but correct boundaries - bad for precision and recall"
            }
            ErrorClass::Error4 => {
                "ERROR4: correct annotation type but incorrect boundaries - bad for precision and recall"
            }
            ErrorClass::Error5 => {
                "ERROR5: incorrect annotation type and incorrect boundaries - bad for precision and recall"
            }
        }
    }

    /// Conta como atribuição feita pelo sistema (entra em `actual`).
    pub fn is_assignment(&self) -> bool {
        !matches!(self, ErrorClass::Error2)
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Modo de cálculo de precisão/recall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMode {
    /// Só CORRECT conta.
    ExactMatch,
    /// Um ponto pela tag certa, um ponto pelas fronteiras certas.
    Muc,
    /// Fronteiras certas, independente da tag.
    Recognition,
}

impl EvaluationMode {
    pub fn all() -> [EvaluationMode; 3] {
        [
            EvaluationMode::ExactMatch,
            EvaluationMode::Muc,
            EvaluationMode::Recognition,
        ]
    }

    fn weight(&self) -> usize {
        match self {
            EvaluationMode::Muc => 2,
            _ => 1,
        }
    }
}

/// Classe real de uma linha da matriz de confusão.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RealClass {
    Tag(String),
    /// O candidato não corresponde a nenhuma anotação do gold (ERROR1).
    Other,
}

impl fmt::Display for RealClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RealClass::Tag(tag) => f.write_str(tag),
            RealClass::Other => f.write_str("#OTHER#"),
        }
    }
}

/// Uma célula da matriz de confusão, como aparece na serialização.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfusionCell {
    pub real: RealClass,
    pub assigned: String,
    pub count: usize,
}

/// Contagem de pares (classe real, tag atribuída).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<ConfusionCell>", into = "Vec<ConfusionCell>")]
pub struct ConfusionMatrix {
    cells: BTreeMap<(RealClass, String), usize>,
}

impl ConfusionMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, real: RealClass, assigned: impl Into<String>) {
        self.add_count(real, assigned, 1);
    }

    fn add_count(&mut self, real: RealClass, assigned: impl Into<String>, count: usize) {
        *self.cells.entry((real, assigned.into())).or_default() += count;
    }

    pub fn get(&self, real: &RealClass, assigned: &str) -> usize {
        self.cells
            .get(&(real.clone(), assigned.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Soma de todas as células.
    pub fn total(&self) -> usize {
        self.cells.values().sum()
    }

    /// Total de atribuições cuja classe real é `real`.
    pub fn real_total(&self, real: &RealClass) -> usize {
        self.cells
            .iter()
            .filter(|((r, _), _)| r == real)
            .map(|(_, count)| count)
            .sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RealClass, &str, usize)> {
        self.cells
            .iter()
            .map(|((real, assigned), count)| (real, assigned.as_str(), *count))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl From<Vec<ConfusionCell>> for ConfusionMatrix {
    fn from(cells: Vec<ConfusionCell>) -> Self {
        let mut matrix = Self::new();
        for cell in cells {
            matrix.add_count(cell.real, cell.assigned, cell.count);
        }
        matrix
    }
}

impl From<ConfusionMatrix> for Vec<ConfusionCell> {
    fn from(matrix: ConfusionMatrix) -> Self {
        matrix
            .cells
            .into_iter()
            .map(|((real, assigned), count)| ConfusionCell {
                real,
                assigned,
                count,
            })
            .collect()
    }
}

/// Precisão, recall e F1 de um modo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub precision: Option<f64>,
    pub recall: Option<f64>,
    pub f1: Option<f64>,
}

impl Metrics {
    fn new(precision: Option<f64>, recall: Option<f64>) -> Self {
        Self {
            precision,
            recall,
            f1: f1(precision, recall),
        }
    }
}

/// F1 é zero se precisão ou recall for zero, e indefinido se algum for indefinido.
fn f1(precision: Option<f64>, recall: Option<f64>) -> Option<f64> {
    if precision == Some(0.0) || recall == Some(0.0) {
        return Some(0.0);
    }
    let (p, r) = (precision?, recall?);
    Some(2.0 * p * r / (p + r))
}

fn ratio(numerator: usize, denominator: usize) -> Option<f64> {
    (denominator > 0).then(|| numerator as f64 / denominator as f64)
}

fn average(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let defined: Vec<f64> = values.flatten().collect();
    (!defined.is_empty()).then(|| defined.iter().sum::<f64>() / defined.len() as f64)
}

/// Resultado de uma avaliação. Construído uma vez pelo scorer; somente leitura depois.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    per_tag_counts: BTreeMap<String, BTreeMap<ErrorClass, usize>>,
    possible: BTreeMap<String, usize>,
    confusion_matrix: ConfusionMatrix,
    error_sets: BTreeMap<ErrorClass, AnnotationSet>,
}

impl EvaluationResult {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Garante uma linha (zerada) para `tag`.
    pub(crate) fn register_tag(&mut self, tag: &str) {
        self.per_tag_counts.entry(tag.to_string()).or_default();
    }

    pub(crate) fn add_possible(&mut self, tag: &str) {
        self.register_tag(tag);
        *self.possible.entry(tag.to_string()).or_default() += 1;
    }

    /// Registra uma classificação: conta `class` na linha `tag` e guarda a anotação.
    pub(crate) fn record(&mut self, class: ErrorClass, tag: &str, annotation: &Annotation) {
        *self
            .per_tag_counts
            .entry(tag.to_string())
            .or_default()
            .entry(class)
            .or_default() += 1;
        self.error_sets
            .entry(class)
            .or_default()
            .insert(annotation.clone());
    }

    pub(crate) fn confuse(&mut self, real: RealClass, assigned: &str) {
        self.confusion_matrix.add(real, assigned);
    }

    /// Soma outro resultado a este (ex: avaliação de vários documentos).
    ///
    /// Os conjuntos de anotações por classe mantêm a primeira anotação em cada offset,
    /// então servem apenas como amostra quando os documentos são diferentes.
    pub fn merge(&mut self, other: &EvaluationResult) {
        for (tag, counts) in &other.per_tag_counts {
            let row = self.per_tag_counts.entry(tag.clone()).or_default();
            for (class, count) in counts {
                *row.entry(*class).or_default() += count;
            }
        }
        for (tag, count) in &other.possible {
            *self.possible.entry(tag.clone()).or_default() += count;
        }
        for (real, assigned, count) in other.confusion_matrix.iter() {
            self.confusion_matrix
                .add_count(real.clone(), assigned, count);
        }
        for (class, set) in &other.error_sets {
            self.error_sets
                .entry(*class)
                .or_default()
                .extend(set.iter().cloned());
        }
    }

    pub fn per_tag_counts(&self) -> &BTreeMap<String, BTreeMap<ErrorClass, usize>> {
        &self.per_tag_counts
    }

    pub fn confusion_matrix(&self) -> &ConfusionMatrix {
        &self.confusion_matrix
    }

    /// Anotações classificadas como `class` (candidatas, ou gold no caso de ERROR2).
    pub fn error_set(&self, class: ErrorClass) -> Option<&AnnotationSet> {
        self.error_sets.get(&class)
    }

    /// Todas as tags vistas em qualquer um dos conjuntos.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.per_tag_counts.keys().map(String::as_str)
    }

    pub fn count(&self, tag: &str, class: ErrorClass) -> usize {
        self.per_tag_counts
            .get(tag)
            .and_then(|row| row.get(&class))
            .copied()
            .unwrap_or(0)
    }

    /// Total de `class` somando todas as tags.
    pub fn total(&self, class: ErrorClass) -> usize {
        self.per_tag_counts
            .values()
            .filter_map(|row| row.get(&class))
            .sum()
    }

    /// Anotações de `tag` no gold standard.
    pub fn possible(&self, tag: &str) -> usize {
        self.possible.get(tag).copied().unwrap_or(0)
    }

    pub fn total_possible(&self) -> usize {
        self.possible.values().sum()
    }

    /// Atribuições feitas pelo sistema contadas na linha `tag`.
    pub fn actual(&self, tag: &str) -> usize {
        self.per_tag_counts
            .get(tag)
            .map(|row| {
                row.iter()
                    .filter(|(class, _)| class.is_assignment())
                    .map(|(_, count)| count)
                    .sum()
            })
            .unwrap_or(0)
    }

    pub fn total_actual(&self) -> usize {
        self.tags().map(|tag| self.actual(tag)).sum()
    }

    fn correct_points(&self, tag: &str, mode: EvaluationMode) -> usize {
        let correct = self.count(tag, ErrorClass::Correct);
        match mode {
            EvaluationMode::ExactMatch => correct,
            EvaluationMode::Muc => {
                self.count(tag, ErrorClass::Error3) + self.count(tag, ErrorClass::Error4) + 2 * correct
            }
            EvaluationMode::Recognition => correct + self.count(tag, ErrorClass::Error3),
        }
    }

    pub fn precision_for(&self, tag: &str, mode: EvaluationMode) -> Option<f64> {
        ratio(self.correct_points(tag, mode), mode.weight() * self.actual(tag))
    }

    pub fn recall_for(&self, tag: &str, mode: EvaluationMode) -> Option<f64> {
        ratio(self.correct_points(tag, mode), mode.weight() * self.possible(tag))
    }

    pub fn f1_for(&self, tag: &str, mode: EvaluationMode) -> Option<f64> {
        f1(self.precision_for(tag, mode), self.recall_for(tag, mode))
    }

    pub fn tag_metrics(&self, tag: &str, mode: EvaluationMode) -> Metrics {
        Metrics::new(self.precision_for(tag, mode), self.recall_for(tag, mode))
    }

    fn total_correct_points(&self, mode: EvaluationMode) -> usize {
        self.tags().map(|tag| self.correct_points(tag, mode)).sum()
    }

    /// Precisão sobre todas as tags (micro).
    pub fn precision(&self, mode: EvaluationMode) -> Option<f64> {
        ratio(self.total_correct_points(mode), mode.weight() * self.total_actual())
    }

    /// Recall sobre todas as tags (micro).
    pub fn recall(&self, mode: EvaluationMode) -> Option<f64> {
        ratio(self.total_correct_points(mode), mode.weight() * self.total_possible())
    }

    pub fn f1(&self, mode: EvaluationMode) -> Option<f64> {
        f1(self.precision(mode), self.recall(mode))
    }

    pub fn metrics(&self, mode: EvaluationMode) -> Metrics {
        Metrics::new(self.precision(mode), self.recall(mode))
    }

    /// Média das precisões definidas de cada tag (macro).
    pub fn tag_averaged_precision(&self, mode: EvaluationMode) -> Option<f64> {
        average(self.tags().map(|tag| self.precision_for(tag, mode)))
    }

    pub fn tag_averaged_recall(&self, mode: EvaluationMode) -> Option<f64> {
        average(self.tags().map(|tag| self.recall_for(tag, mode)))
    }

    pub fn tag_averaged_f1(&self, mode: EvaluationMode) -> Option<f64> {
        f1(
            self.tag_averaged_precision(mode),
            self.tag_averaged_recall(mode),
        )
    }

    pub fn tag_averaged_metrics(&self, mode: EvaluationMode) -> Metrics {
        Metrics::new(
            self.tag_averaged_precision(mode),
            self.tag_averaged_recall(mode),
        )
    }
}

fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.2}%", v * 100.0))
}

impl fmt::Display for EvaluationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<12}", "tag")?;
        for class in ErrorClass::all() {
            write!(f, "{:>9}", class.name())?;
        }
        writeln!(f, "{:>9}", "POSSIBLE")?;

        for tag in self.tags() {
            write!(f, "{tag:<12}")?;
            for class in ErrorClass::all() {
                write!(f, "{:>9}", self.count(tag, class))?;
            }
            writeln!(f, "{:>9}", self.possible(tag))?;
        }

        for mode in EvaluationMode::all() {
            let overall = self.metrics(mode);
            let averaged = self.tag_averaged_metrics(mode);
            writeln!(
                f,
                "{mode:?}: precision {} recall {} F1 {} (tag averaged: precision {} recall {} F1 {})",
                percent(overall.precision),
                percent(overall.recall),
                percent(overall.f1),
                percent(averaged.precision),
                percent(averaged.recall),
                percent(averaged.f1),
            )?;
        }
        Ok(())
    }
}
