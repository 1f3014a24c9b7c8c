//! Testes de ponta a ponta: decodificação de marcação aninhada e classificação do scorer.

use std::collections::HashSet;

use annotation_core::{
    evaluate, Annotation, AnnotationSet, ErrorClass, EvaluationMode, MarkupCodec, RealClass,
    TaggingFormat,
};

fn single(offset: usize, value: &str, tag: &str) -> AnnotationSet {
    [Annotation::new(offset, value, tag)].into_iter().collect()
}

#[test]
fn test_nested_markup_decodes_outer_entity() {
    let decoded = MarkupCodec::new().decode(
        "text <PERSON><PHONE>John J</PHONE>. Smith</PERSON> lives",
        TaggingFormat::InlineTag,
    );
    assert_eq!(decoded.text, "text John J. Smith lives");
    assert_eq!(decoded.annotations.len(), 1);

    let person = decoded.annotations.get(0).unwrap();
    assert_eq!(person.tag(), "PERSON");
    assert_eq!(person.value(), "John J. Smith");
    assert_eq!(person.offset(), decoded.text.find("John").unwrap());
    assert_eq!(person.length(), 13);
}

#[test]
fn test_exact_match() {
    let gold = single(0, "John", "PER");
    let result = evaluate(&gold.clone(), &gold, &HashSet::new());

    assert_eq!(result.count("PER", ErrorClass::Correct), 1);
    let cells: Vec<_> = result.confusion_matrix().iter().collect();
    assert_eq!(cells, vec![(&RealClass::Tag("PER".to_string()), "PER", 1)]);
}

#[test]
fn test_wrong_tag() {
    let gold = single(0, "John", "PER");
    let candidate = single(0, "John", "LOC");
    let result = evaluate(&candidate, &gold, &HashSet::new());

    assert_eq!(result.count("PER", ErrorClass::Error3), 1);
    assert_eq!(result.total(ErrorClass::Error3), 1);
    let cells: Vec<_> = result.confusion_matrix().iter().collect();
    assert_eq!(cells, vec![(&RealClass::Tag("PER".to_string()), "LOC", 1)]);
}

#[test]
fn test_spurious() {
    let candidate = single(5, "Inc", "ORG");
    let result = evaluate(&candidate, &AnnotationSet::new(), &HashSet::new());

    assert_eq!(result.count("ORG", ErrorClass::Error1), 1);
    let cells: Vec<_> = result.confusion_matrix().iter().collect();
    assert_eq!(cells, vec![(&RealClass::Other, "ORG", 1)]);
    assert_eq!(result.precision(EvaluationMode::ExactMatch), Some(0.0));
    assert_eq!(result.recall(EvaluationMode::ExactMatch), None);
}

#[test]
fn test_missed() {
    let gold = single(0, "IBM", "ORG");
    let result = evaluate(&AnnotationSet::new(), &gold, &HashSet::new());

    assert_eq!(result.count("ORG", ErrorClass::Error2), 1);
    assert_eq!(result.total(ErrorClass::Error2), 1);
    assert_eq!(
        result.error_set(ErrorClass::Error2).map(AnnotationSet::len),
        Some(1)
    );
    assert_eq!(result.recall(EvaluationMode::Muc), Some(0.0));
}

#[test]
fn test_decoded_documents_score_end_to_end() {
    let codec = MarkupCodec::new();
    let gold = codec.decode(
        "[PER Ann Lee ] flew to [LOC New York ] with [ORG ACME ] staff.",
        TaggingFormat::Bracket,
    );
    let candidate = codec.decode(
        "<PER>Ann</PER> Lee flew to <LOC>New York</LOC> with <PER>ACME</PER> staff.",
        TaggingFormat::InlineTag,
    );
    assert_eq!(gold.text, candidate.text);

    let result = evaluate(&candidate.annotations, &gold.annotations, &HashSet::new());
    assert_eq!(result.count("PER", ErrorClass::Error4), 1);
    assert_eq!(result.count("LOC", ErrorClass::Correct), 1);
    assert_eq!(result.count("ORG", ErrorClass::Error3), 1);
    assert_eq!(result.total(ErrorClass::Error1), 0);
    assert_eq!(result.total(ErrorClass::Error2), 0);

    // MUC: (1 + 2 + 1) pontos sobre 2 * 3 atribuições
    let muc = result.metrics(EvaluationMode::Muc);
    assert_eq!(muc.precision, Some(4.0 / 6.0));
    assert_eq!(muc.recall, Some(4.0 / 6.0));
}
