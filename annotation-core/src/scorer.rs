//! # Scorer
//!
//! Compara anotações candidatas com o gold standard e classifica cada par segundo a
//! taxonomia de [`ErrorClass`].
//!
//! ## Algoritmo
//!
//! Para cada candidata (exceto as de tag `O`), o gold é percorrido na ordem em que está
//! guardado (espera-se ordem crescente de offset):
//!
//! 1. Gold cujo valor está em `ignore` é pulado, a não ser que a candidata comece antes
//!    do fim dele e ainda não tenha sobreposição registrada.
//! 2. Span igual: CORRECT ou ERROR3; para a varredura.
//! 3. Sobreposição: ERROR4 ou ERROR5; **continua** a varredura, então uma candidata pode
//!    sobrepor mais de um gold.
//! 4. Candidata inteiramente antes deste gold, ou fim do gold: sem sobreposição
//!    registrada, é ERROR1 (real = `#OTHER#`); para a varredura.
//!
//! Gold nunca coberto por candidata vira ERROR2 sob a própria tag.
//!
//! | Classe          | Linha de `per_tag_counts` |
//! |-----------------|---------------------------|
//! | CORRECT, ERROR1 | tag atribuída             |
//! | ERROR4, ERROR5  | tag atribuída             |
//! | ERROR2, ERROR3  | tag real (gold)           |

use std::collections::HashSet;

use tracing::debug;

use crate::annotation::Annotation;
use crate::annotation_set::AnnotationSet;
use crate::evaluation::{ErrorClass, EvaluationResult, RealClass};
use crate::tags::is_outside;

/// Avalia `candidate` contra `gold`.
///
/// `ignore` lista valores de entidades do gold que não contam como ERROR2 se forem
/// esquecidos (mas ainda podem gerar erro se anotados de forma errada).
///
/// ```rust
/// use std::collections::HashSet;
/// use annotation_core::{evaluate, Annotation, AnnotationSet, ErrorClass};
///
/// let gold: AnnotationSet = [Annotation::new(0, "John", "PER")].into_iter().collect();
/// let candidate: AnnotationSet = [Annotation::new(0, "John", "LOC")].into_iter().collect();
///
/// let result = evaluate(&candidate, &gold, &HashSet::new());
/// assert_eq!(result.count("PER", ErrorClass::Error3), 1);
/// ```
pub fn evaluate(
    candidate: &AnnotationSet,
    gold: &AnnotationSet,
    ignore: &HashSet<String>,
) -> EvaluationResult {
    let mut result = EvaluationResult::new();
    let mut covered = vec![false; gold.len()];

    for annotation in gold.iter() {
        result.add_possible(annotation.tag());
    }

    for assigned in candidate.iter() {
        if is_outside(assigned.tag()) {
            continue;
        }
        result.register_tag(assigned.tag());
        classify(assigned, gold, ignore, &mut covered, &mut result);
    }

    for (annotation, _) in gold.iter().zip(&covered).filter(|(_, covered)| !**covered) {
        if ignore.contains(annotation.value()) {
            continue;
        }
        result.record(ErrorClass::Error2, annotation.tag(), annotation);
    }

    debug!(
        candidates = candidate.len(),
        gold = gold.len(),
        correct = result.total(ErrorClass::Correct),
        missed = result.total(ErrorClass::Error2),
        "avaliação concluída"
    );
    result
}

/// Varre o gold para uma candidata e registra as classificações.
fn classify(
    assigned: &Annotation,
    gold: &AnnotationSet,
    ignore: &HashSet<String>,
    covered: &mut [bool],
    result: &mut EvaluationResult,
) {
    let mut tagged_overlap = false;
    let last = gold.len().saturating_sub(1);

    for (i, real) in gold.iter().enumerate() {
        let starts_before_end = assigned.offset() < real.end();
        if ignore.contains(real.value()) && !(starts_before_end && !tagged_overlap) {
            continue;
        }

        if assigned.matches(real) {
            let class = if assigned.same_tag(real) {
                result.record(ErrorClass::Correct, assigned.tag(), assigned);
                ErrorClass::Correct
            } else {
                result.record(ErrorClass::Error3, real.tag(), assigned);
                ErrorClass::Error3
            };
            result.confuse(RealClass::Tag(real.tag().to_string()), assigned.tag());
            covered[i] = true;
            debug!(candidate = %assigned, class = %class, "span exato");
            return;
        }

        if assigned.overlaps(real) {
            let class = if assigned.same_tag(real) {
                ErrorClass::Error4
            } else {
                ErrorClass::Error5
            };
            result.record(class, assigned.tag(), assigned);
            result.confuse(RealClass::Tag(real.tag().to_string()), assigned.tag());
            covered[i] = true;
            tagged_overlap = true;
            continue;
        }

        if starts_before_end || i == last {
            if !tagged_overlap {
                spurious(assigned, result);
            }
            return;
        }
    }

    // gold vazio, ou só restavam golds ignorados
    if !tagged_overlap {
        spurious(assigned, result);
    }
}

fn spurious(assigned: &Annotation, result: &mut EvaluationResult) {
    result.record(ErrorClass::Error1, assigned.tag(), assigned);
    result.confuse(RealClass::Other, assigned.tag());
}
