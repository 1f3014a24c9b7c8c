//! # Conjunto de Anotações
//!
//! [`AnnotationSet`] guarda as anotações de **um** texto, com a invariante de que nenhum
//! par de membros começa no mesmo offset. Inserir uma anotação com offset já ocupado é
//! um no-op: a primeira vence.
//!
//! O conjunto não é ordenado por si só. As operações principais:
//!
//! 1. [`AnnotationSet::sort`]: ordena por offset crescente (estável).
//! 2. [`AnnotationSet::remove_nested`]: exige ordenação prévia e mantém, de cada grupo de
//!    anotações sobrepostas, apenas a que começa primeiro (seleção gulosa pela esquerda).
//! 3. [`AnnotationSet::serialize`]: dump `start;length;end;value;tag` por linha, usado
//!    para depuração e para guardar gold standards. Não é relido pelo codec.
//!
//! Não existe inserção ou remoção por índice: isso permitiria violar a invariante de
//! offsets únicos.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::annotation::Annotation;

/// Anotações de um único texto, sem offsets repetidos.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Annotation>", into = "Vec<Annotation>")]
pub struct AnnotationSet {
    annotations: Vec<Annotation>,
    offsets: HashSet<usize>,
}

impl AnnotationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insere `annotation` se nenhum membro começar no mesmo offset.
    ///
    /// Retorna `true` se a anotação foi inserida.
    pub fn insert(&mut self, annotation: Annotation) -> bool {
        if !self.offsets.insert(annotation.offset()) {
            return false;
        }
        self.annotations.push(annotation);
        true
    }

    /// Ordena por offset crescente.
    pub fn sort(&mut self) {
        self.annotations.sort_by_key(Annotation::offset);
    }

    /// Cópia ordenada, sem alterar `self`.
    pub fn sorted(&self) -> Self {
        let mut copy = self.clone();
        copy.sort();
        copy
    }

    pub fn is_sorted(&self) -> bool {
        self.annotations
            .windows(2)
            .all(|pair| pair[0].offset() <= pair[1].offset())
    }

    /// Remove anotações que começam antes do fim da última anotação mantida.
    ///
    /// Requer o conjunto ordenado. A anotação que começa primeiro num grupo de
    /// sobreposições sempre vence, independente do comprimento das seguintes.
    pub fn remove_nested(&mut self) {
        debug_assert!(self.is_sorted(), "remove_nested requer um conjunto ordenado");

        let before = self.annotations.len();
        let mut last_end = 0;
        let mut kept = Vec::with_capacity(before);
        for annotation in self.annotations.drain(..) {
            if annotation.offset() < last_end {
                continue;
            }
            last_end = annotation.end();
            kept.push(annotation);
        }
        self.offsets = kept.iter().map(Annotation::offset).collect();
        self.annotations = kept;

        debug!(
            removed = before - self.annotations.len(),
            kept = self.annotations.len(),
            "anotações aninhadas removidas"
        );
    }

    /// Uma linha `start;length;end;value;tag` por anotação, em ordem de offset.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for annotation in self.sorted().iter() {
            out.push_str(&format!(
                "{};{};{};{};{}\n",
                annotation.offset(),
                annotation.length(),
                annotation.end(),
                annotation.value(),
                annotation.tag()
            ));
        }
        out
    }

    /// No máximo `per_tag` anotações por tag (todas se `None`), sem valores repetidos.
    ///
    /// Serve para escolher "sementes" de treino a partir de um gold standard.
    pub fn seeds(&self, per_tag: Option<usize>) -> Self {
        let mut seeds = Self::new();
        let mut per_tag_count: BTreeMap<&str, usize> = BTreeMap::new();
        let mut seen_values: HashSet<&str> = HashSet::new();

        for annotation in &self.annotations {
            let count = per_tag_count.entry(annotation.tag()).or_default();
            let below_limit = per_tag.map_or(true, |limit| *count < limit);
            if below_limit && seen_values.insert(annotation.value()) {
                *count += 1;
                seeds.insert(annotation.clone());
            }
        }
        seeds
    }

    /// Conjunto dos valores anotados.
    pub fn entity_values(&self) -> HashSet<String> {
        self.annotations
            .iter()
            .map(|a| a.value().to_string())
            .collect()
    }

    pub fn get(&self, index: usize) -> Option<&Annotation> {
        self.annotations.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Annotation> {
        self.annotations.iter()
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn as_slice(&self) -> &[Annotation] {
        &self.annotations
    }
}

impl FromIterator<Annotation> for AnnotationSet {
    fn from_iter<I: IntoIterator<Item = Annotation>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl Extend<Annotation> for AnnotationSet {
    fn extend<I: IntoIterator<Item = Annotation>>(&mut self, iter: I) {
        for annotation in iter {
            self.insert(annotation);
        }
    }
}

impl IntoIterator for AnnotationSet {
    type Item = Annotation;
    type IntoIter = std::vec::IntoIter<Annotation>;

    fn into_iter(self) -> Self::IntoIter {
        self.annotations.into_iter()
    }
}

impl<'a> IntoIterator for &'a AnnotationSet {
    type Item = &'a Annotation;
    type IntoIter = std::slice::Iter<'a, Annotation>;

    fn into_iter(self) -> Self::IntoIter {
        self.annotations.iter()
    }
}

impl From<Vec<Annotation>> for AnnotationSet {
    fn from(annotations: Vec<Annotation>) -> Self {
        annotations.into_iter().collect()
    }
}

impl From<AnnotationSet> for Vec<Annotation> {
    fn from(set: AnnotationSet) -> Self {
        set.annotations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[(usize, &str, &str)]) -> AnnotationSet {
        items
            .iter()
            .map(|(offset, value, tag)| Annotation::new(*offset, *value, *tag))
            .collect()
    }

    #[test]
    fn test_duplicate_offset_first_writer_wins() {
        let mut s = AnnotationSet::new();
        assert!(s.insert(Annotation::new(0, "John", "PER")));
        assert!(!s.insert(Annotation::new(0, "John Smith", "PER")));
        assert_eq!(s.len(), 1);
        assert_eq!(s.get(0).unwrap().value(), "John");
    }

    #[test]
    fn test_sort_by_offset() {
        let mut s = set(&[(20, "c", "X"), (0, "a", "X"), (10, "b", "X")]);
        assert!(!s.is_sorted());
        s.sort();
        let offsets: Vec<usize> = s.iter().map(Annotation::offset).collect();
        assert_eq!(offsets, vec![0, 10, 20]);
        assert!(s.is_sorted());
    }

    #[test]
    fn test_remove_nested_keeps_earliest_start() {
        // "New York City Hall"
        let mut s = set(&[
            (0, "New York", "LOC"),
            (4, "York City Hall", "ORG"),
            (9, "City", "LOC"),
            (20, "Mayor", "PER"),
        ]);
        s.sort();
        s.remove_nested();
        let values: Vec<&str> = s.iter().map(Annotation::value).collect();
        assert_eq!(values, vec!["New York", "City", "Mayor"]);
    }

    #[test]
    fn test_remove_nested_drops_longer_later_annotation() {
        let mut s = set(&[(0, "ab", "X"), (1, "bcdefgh", "Y")]);
        s.sort();
        s.remove_nested();
        assert_eq!(s.len(), 1);
        assert_eq!(s.get(0).unwrap().tag(), "X");
    }

    #[test]
    fn test_remove_nested_frees_offsets() {
        let mut s = set(&[(0, "abcdef", "X"), (2, "cd", "Y")]);
        s.sort();
        s.remove_nested();
        assert!(s.insert(Annotation::new(2, "cd", "Z")));
    }

    #[test]
    fn test_serialize_is_sorted() {
        let s = set(&[(10, "Berlin", "LOC"), (0, "John", "PER")]);
        assert_eq!(s.serialize(), "0;4;4;John;PER\n10;6;16;Berlin;LOC\n");
    }

    #[test]
    fn test_seeds_limit_per_tag_and_skip_duplicate_values() {
        let s = set(&[
            (0, "John", "PER"),
            (10, "Mary", "PER"),
            (20, "Paul", "PER"),
            (30, "John", "PER"),
            (40, "Berlin", "LOC"),
        ]);
        let seeds = s.seeds(Some(2));
        let values: Vec<&str> = seeds.iter().map(Annotation::value).collect();
        assert_eq!(values, vec!["John", "Mary", "Berlin"]);

        assert_eq!(s.seeds(None).len(), 4);
    }

    #[test]
    fn test_entity_values() {
        let s = set(&[(0, "John", "PER"), (10, "John", "PER")]);
        assert_eq!(s.entity_values().len(), 1);
    }

    #[test]
    fn test_deserialize_dedupes_offsets() {
        let s = set(&[(0, "John", "PER")]);
        let mut items: Vec<Annotation> = s.clone().into();
        items.push(Annotation::new(0, "Jo", "ORG"));
        let json = serde_json::to_string(&items).unwrap();
        let back: AnnotationSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
