use formfill::classifier::corpus::builtin_examples;
use formfill::{preprocess, Classifier, ClassifierError, TrainingExample};
use std::sync::Arc;
use std::thread;

fn classify(label: &str) -> Option<String> {
    let classifier = Classifier::builtin().expect("Failed to build classifier");
    classifier.predict(&preprocess(label).cleaned).predicted_field
}

#[test]
fn test_builtin_self_consistency() -> Result<(), Box<dyn std::error::Error>> {
    let classifier = Classifier::builtin()?;
    let examples = builtin_examples()?;
    let rate = classifier.self_consistency(&examples);
    assert!(rate >= 0.95, "self-consistency dropped to {:.3}", rate);
    Ok(())
}

#[test]
fn test_year_of_graduation() -> Result<(), Box<dyn std::error::Error>> {
    let classifier = Classifier::builtin()?;
    let result = classifier.predict("Year of graduation");
    assert_eq!(result.predicted_field.as_deref(), Some("yearOfGraduation"));
    assert!(result.confidence >= 0.6, "confidence {}", result.confidence);
    Ok(())
}

#[test]
fn test_real_world_labels() {
    let cases = [
        ("Mobile Number - 10 digits only (Do NOT write +91 or 0)*", "phone"),
        ("E-mail ID *", "email"),
        ("Name of your college", "collegeName"),
        ("CGPA", "cgpa"),
        ("10th percentage", "tenthPercentage"),
        ("Current year of study", "yearOfStudy"),
        ("Branch / Department", "branch"),
        ("Father's Name", "fatherName"),
        ("GitHub URL, if no GitHub then mention NA", "github"),
        ("Date of Birth (DD/MM/YYYY) *", "dateOfBirth"),
        ("Full Name [as per Aadhaar]", "fullName"),
    ];
    for (label, expected) in cases {
        assert_eq!(classify(label).as_deref(), Some(expected), "label {:?}", label);
    }
}

#[test]
fn test_unknown_label() -> Result<(), Box<dyn std::error::Error>> {
    let classifier = Classifier::builtin()?;
    let result = classifier.predict("Favourite colour");
    assert_eq!(result.predicted_field, None);
    assert_eq!(result.confidence, 0.0);
    Ok(())
}

#[test]
fn test_determinism() -> Result<(), Box<dyn std::error::Error>> {
    let classifier = Classifier::builtin()?;
    for label in ["Mobile Number", "Contact", "Name", "College / University"] {
        assert_eq!(classifier.predict(label), classifier.predict(label));
    }

    // A second model trained on the same corpus agrees with the shared one.
    let rebuilt = Classifier::builder().with_builtin_corpus()?.build()?;
    assert_eq!(rebuilt.predict("Contact"), classifier.predict("Contact"));
    assert_eq!(rebuilt.info().corpus_fingerprint, classifier.info().corpus_fingerprint);
    Ok(())
}

#[test]
fn test_confidence_in_unit_range() -> Result<(), Box<dyn std::error::Error>> {
    let classifier = Classifier::builtin()?;
    for example in builtin_examples()?.iter().take(50) {
        let result = classifier.predict(&example.label);
        assert!((0.0..=1.0).contains(&result.confidence));
    }
    Ok(())
}

#[test]
fn test_builtin_info() -> Result<(), Box<dyn std::error::Error>> {
    let info = Classifier::builtin()?.info();
    assert_eq!(info.num_classes, 38);
    assert_eq!(info.class_labels[0], "fullName");
    assert_eq!(info.corpus_fingerprint.len(), 64);
    assert!(info.vocabulary_size > 100);
    Ok(())
}

#[test]
fn test_empty_corpus_is_fatal() {
    assert_eq!(Classifier::builder().build().unwrap_err(), ClassifierError::EmptyCorpus);

    let blank = Classifier::builder()
        .add_example("   ", "email")
        .add_example("Email", "")
        .build();
    assert_eq!(blank.unwrap_err(), ClassifierError::EmptyCorpus);
}

#[test]
fn test_corpus_parse_error_reports_line() {
    let result = Classifier::builder().with_corpus_str("# header\nemail\tEmail\nphone Mobile\n");
    match result {
        Err(ClassifierError::CorpusParse { line, .. }) => assert_eq!(line, 3),
        other => panic!("expected a parse error, got {:?}", other.map(|b| b.len())),
    }
}

#[test]
fn test_custom_corpus() -> Result<(), Box<dyn std::error::Error>> {
    let classifier = Classifier::builder()
        .with_corpus_str("shoeSize\tShoe size\nshoeSize\tFoot size (UK)\ntshirtSize\tT-Shirt size\n")?
        .add_examples(vec![TrainingExample::new("Jersey size", "tshirtSize")])
        .build()?;
    assert_eq!(classifier.predict("Foot").predicted_field.as_deref(), Some("shoeSize"));
    assert_eq!(classifier.predict("Jersey").predicted_field.as_deref(), Some("tshirtSize"));
    Ok(())
}

#[test]
fn test_thread_safety() -> Result<(), Box<dyn std::error::Error>> {
    let classifier: Arc<Classifier> = Classifier::builtin()?;
    let expected = classifier.predict("Mobile Number");
    let mut handles = vec![];

    for _ in 0..4 {
        let classifier = Arc::clone(&classifier);
        let expected = expected.clone();
        handles.push(thread::spawn(move || {
            for _ in 0..100 {
                assert_eq!(classifier.predict("Mobile Number"), expected);
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }
    Ok(())
}
