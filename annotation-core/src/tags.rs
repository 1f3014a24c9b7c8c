//! # Tags e Distribuição de Confiança
//!
//! Toda anotação carrega uma [`TagDistribution`]: um mapeamento tag → score
//! (relevância/confiança) que sempre tem **pelo menos uma** entrada.
//!
//! ## Tag mais provável
//!
//! A tag "vencedora" é a de maior score. Empates são resolvidos pela **ordem de
//! inserção** (a primeira tag inserida vence), nunca pela ordem alfabética. Assim uma
//! distribuição criada a partir de uma única tag é sempre determinística.
//!
//! O máximo é recalculado a cada leitura: a distribuição é imutável, então não existe
//! cache para invalidar.
//!
//! ## Esquema BIO
//!
//! O formato de colunas tem uma variante BIO (Beginning-Inside-Outside):
//!
//! - `B-TAG`: primeiro token de uma entidade
//! - `I-TAG`: tokens seguintes da mesma entidade
//! - `O`: fora de entidade
//!
//! [`BioLabel`] faz a ponte entre esses rótulos e os nomes de tag puros.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Nome da "não-tag" nos formatos de colunas e barras.
pub const OUTSIDE: &str = "O";

/// `O`/`o` significa "sem tag".
pub fn is_outside(tag: &str) -> bool {
    tag.eq_ignore_ascii_case(OUTSIDE)
}

/// Uma entrada da distribuição.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagScore {
    pub tag: String,
    pub score: f64,
}

/// Distribuição de confiança sobre nomes de tag, em ordem de inserção.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TagScore>", into = "Vec<TagScore>")]
pub struct TagDistribution {
    entries: Vec<TagScore>,
}

impl TagDistribution {
    /// Distribuição com uma única tag de score 1.0.
    pub fn from_tag(tag: impl Into<String>) -> Self {
        Self {
            entries: vec![TagScore {
                tag: tag.into(),
                score: 1.0,
            }],
        }
    }

    /// Constrói a partir de pares `(tag, score)`.
    ///
    /// Falha com [`Error::EmptyTagDistribution`] se não houver entradas e com
    /// [`Error::InvalidScore`] se algum score for negativo ou NaN. Uma tag repetida
    /// mantém a posição da primeira ocorrência e fica com o último score.
    pub fn new<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut dist = Self {
            entries: Vec::new(),
        };
        for (tag, score) in entries {
            dist.push(tag.into(), score)?;
        }
        if dist.entries.is_empty() {
            return Err(Error::EmptyTagDistribution);
        }
        Ok(dist)
    }

    /// Retorna uma cópia com `tag` adicionada (ou com o score atualizado).
    pub fn with(mut self, tag: impl Into<String>, score: f64) -> Result<Self> {
        self.push(tag.into(), score)?;
        Ok(self)
    }

    fn push(&mut self, tag: String, score: f64) -> Result<()> {
        if score.is_nan() || score < 0.0 {
            return Err(Error::InvalidScore { tag, score });
        }
        match self.entries.iter_mut().find(|e| e.tag == tag) {
            Some(entry) => entry.score = score,
            None => self.entries.push(TagScore { tag, score }),
        }
        Ok(())
    }

    /// Tag de maior score; empates ficam com a primeira inserida.
    pub fn most_likely(&self) -> &str {
        let mut best = &self.entries[0];
        for entry in &self.entries[1..] {
            if entry.score > best.score {
                best = entry;
            }
        }
        &best.tag
    }

    /// Score da tag mais provável.
    pub fn most_likely_score(&self) -> f64 {
        self.entries
            .iter()
            .map(|e| e.score)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn score(&self, tag: &str) -> Option<f64> {
        self.entries.iter().find(|e| e.tag == tag).map(|e| e.score)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|e| (e.tag.as_str(), e.score))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Sempre `false` para uma distribuição construída pelos construtores públicos.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TryFrom<Vec<TagScore>> for TagDistribution {
    type Error = Error;

    fn try_from(entries: Vec<TagScore>) -> Result<Self> {
        Self::new(entries.into_iter().map(|e| (e.tag, e.score)))
    }
}

impl From<TagDistribution> for Vec<TagScore> {
    fn from(dist: TagDistribution) -> Self {
        dist.entries
    }
}

/// Rótulo BIO de uma linha do formato de colunas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BioLabel {
    /// **Begin**: início de entidade. Ex: **John** (B-PER) Smith.
    Begin(String),
    /// **Inside**: continuação. Ex: John **Smith** (I-PER).
    Inside(String),
    Outside,
}

impl BioLabel {
    /// Parseia `B-X`, `I-X` ou `O`. Um rótulo sem prefixo vira `Inside`, ou seja,
    /// continua a entidade anterior se a tag for a mesma.
    pub fn from_label(label: &str) -> Self {
        if is_outside(label) {
            return BioLabel::Outside;
        }
        if let Some(tag) = label.strip_prefix("B-") {
            return BioLabel::Begin(tag.to_string());
        }
        if let Some(tag) = label.strip_prefix("I-") {
            return BioLabel::Inside(tag.to_string());
        }
        BioLabel::Inside(label.to_string())
    }

    /// Representação textual (ex: "B-PER", "I-ORG", "O").
    pub fn label(&self) -> String {
        match self {
            BioLabel::Begin(tag) => format!("B-{tag}"),
            BioLabel::Inside(tag) => format!("I-{tag}"),
            BioLabel::Outside => OUTSIDE.to_string(),
        }
    }

    /// Nome da tag sem prefixo (`None` para `O`).
    pub fn tag(&self) -> Option<&str> {
        match self {
            BioLabel::Begin(tag) | BioLabel::Inside(tag) => Some(tag),
            BioLabel::Outside => None,
        }
    }
}

impl std::fmt::Display for BioLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_tag() {
        let dist = TagDistribution::from_tag("PER");
        assert_eq!(dist.most_likely(), "PER");
        assert_eq!(dist.len(), 1);
        assert_eq!(dist.score("PER"), Some(1.0));
    }

    #[test]
    fn test_most_likely_picks_max() {
        let dist = TagDistribution::new([("PER", 0.2), ("ORG", 0.7), ("LOC", 0.1)]).unwrap();
        assert_eq!(dist.most_likely(), "ORG");
        assert_eq!(dist.most_likely_score(), 0.7);
    }

    #[test]
    fn test_tie_goes_to_first_inserted() {
        let dist = TagDistribution::new([("ZZZ", 0.5), ("AAA", 0.5)]).unwrap();
        assert_eq!(dist.most_likely(), "ZZZ");
    }

    #[test]
    fn test_empty_distribution_is_rejected() {
        let empty: Vec<(String, f64)> = Vec::new();
        assert_eq!(
            TagDistribution::new(empty).unwrap_err(),
            Error::EmptyTagDistribution
        );
    }

    #[test]
    fn test_negative_and_nan_scores_are_rejected() {
        assert!(matches!(
            TagDistribution::new([("PER", -1.0)]),
            Err(Error::InvalidScore { .. })
        ));
        assert!(matches!(
            TagDistribution::from_tag("PER").with("ORG", f64::NAN),
            Err(Error::InvalidScore { .. })
        ));
    }

    #[test]
    fn test_with_updates_existing_score_in_place() {
        let dist = TagDistribution::from_tag("PER")
            .with("ORG", 2.0)
            .unwrap()
            .with("PER", 3.0)
            .unwrap();
        let tags: Vec<&str> = dist.iter().map(|(t, _)| t).collect();
        assert_eq!(tags, vec!["PER", "ORG"]);
        assert_eq!(dist.most_likely(), "PER");
    }

    #[test]
    fn test_deserialize_rejects_empty() {
        assert!(serde_json::from_str::<TagDistribution>("[]").is_err());
        let dist: TagDistribution =
            serde_json::from_str(r#"[{"tag":"LOC","score":0.9}]"#).unwrap();
        assert_eq!(dist.most_likely(), "LOC");
    }

    #[test]
    fn test_is_outside() {
        assert!(is_outside("O"));
        assert!(is_outside("o"));
        assert!(!is_outside("ORG"));
    }

    #[test]
    fn test_bio_labels() {
        assert_eq!(BioLabel::from_label("B-PER"), BioLabel::Begin("PER".into()));
        assert_eq!(BioLabel::from_label("I-LOC"), BioLabel::Inside("LOC".into()));
        assert_eq!(BioLabel::from_label("O"), BioLabel::Outside);
        assert_eq!(BioLabel::from_label("ORG"), BioLabel::Inside("ORG".into()));
        assert_eq!(BioLabel::Begin("PER".into()).label(), "B-PER");
        assert_eq!(BioLabel::Outside.tag(), None);
    }
}
