use std::sync::Arc;

use formfill::{
    CustomFields, DetectedField, EngineConfig, FieldKind, FillValue, FormFiller, MappingCache, OptionCandidate,
};
use serde_json::{json, Value};

fn profile() -> Value {
    json!({
        "personal": {
            "firstName": "John",
            "middleName": "",
            "lastName": "Doe",
            "gender": "Male",
            "dateOfBirth": "15/08/2003"
        },
        "contact": {"email": "john@example.com", "phone": "9876543210", "city": "Mumbai"},
        "academic": {
            "collegeName": "IIT Bombay",
            "branch": "Computer Science and Engineering",
            "yearOfStudy": 3,
            "cgpa": 8.7
        },
        "professional": {"github": "https://github.com/johndoe"}
    })
}

fn config() -> EngineConfig {
    EngineConfig {
        current_year: Some(2024),
        ..EngineConfig::default()
    }
}

fn choice(values: &[&str]) -> Vec<OptionCandidate<usize>> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| OptionCandidate::new(*v, *v, i))
        .collect()
}

fn form() -> Vec<DetectedField<usize>> {
    vec![
        DetectedField::new("Full Name *", FieldKind::Text),
        DetectedField::new("Email ID *", FieldKind::Text),
        DetectedField::new("Date of Birth", FieldKind::Date),
        DetectedField::new("Gender", FieldKind::Radio(choice(&["Female", "Male", "Other"]))),
        DetectedField::new(
            "College Name",
            FieldKind::Select(choice(&[
                "Indian Institute of Technology Delhi",
                "Indian Institute of Technology Bombay",
            ])),
        ),
        DetectedField::new("Branch", FieldKind::Select(choice(&["CSE", "IT", "ECE"]))),
        DetectedField::new("Year of graduation", FieldKind::Radio(choice(&["2025", "2026", "2027"]))),
        DetectedField::new("LinkedIn Profile (mention NA if not applicable)", FieldKind::Text),
        DetectedField::new("Portfolio website", FieldKind::Text),
    ]
}

fn value_of<'a>(mappings: &'a [formfill::FillMapping<usize>], field: &str) -> Option<&'a FillValue> {
    mappings.iter().find(|m| m.field == field).map(|m| &m.value)
}

#[test]
fn test_fill_form_without_cache() -> Result<(), Box<dyn std::error::Error>> {
    let filler = FormFiller::builtin(config())?;
    let mappings = filler.fill_without_cache(&form(), &profile(), &CustomFields::new());

    let single = |field: &str| value_of(&mappings, field).and_then(|v| v.as_single().map(str::to_string));
    assert_eq!(single("fullName").as_deref(), Some("John Doe"));
    assert_eq!(single("email").as_deref(), Some("john@example.com"));
    assert_eq!(single("dateOfBirth").as_deref(), Some("2003-08-15"));
    assert_eq!(single("gender").as_deref(), Some("Male"));
    assert_eq!(single("collegeName").as_deref(), Some("Indian Institute of Technology Bombay"));
    assert_eq!(single("branch").as_deref(), Some("CSE"));
    assert_eq!(single("yearOfGraduation").as_deref(), Some("2025"));
    assert_eq!(single("linkedin").as_deref(), Some("NA"));

    // No portfolio in the profile and no NA instruction: the field is omitted.
    assert!(value_of(&mappings, "portfolio").is_none());
    assert_eq!(mappings.len(), 8);
    Ok(())
}

#[test]
fn test_selected_handles_point_at_options() -> Result<(), Box<dyn std::error::Error>> {
    let filler = FormFiller::builtin(config())?;
    let mappings = filler.fill_without_cache(&form(), &profile(), &CustomFields::new());
    let gender = mappings.iter().find(|m| m.field == "gender").expect("gender filled");
    assert_eq!(gender.selected, vec![1]);
    let email = mappings.iter().find(|m| m.field == "email").expect("email filled");
    assert!(email.selected.is_empty());
    Ok(())
}

#[test]
fn test_fuzzy_option_needs_confident_prediction() -> Result<(), Box<dyn std::error::Error>> {
    let strict = EngineConfig {
        option_trust_threshold: 1.0,
        ..config()
    };
    let field = DetectedField::new("City", FieldKind::Select(choice(&["Pune, Maharashtra", "Mumbai, Maharashtra"])));
    let fields = vec![field];

    let lenient = FormFiller::builtin(EngineConfig {
        option_trust_threshold: 0.0,
        ..config()
    })?;
    let mappings = lenient.fill_without_cache(&fields, &profile(), &CustomFields::new());
    assert_eq!(mappings[0].value.as_single(), Some("Mumbai, Maharashtra"));

    // The same containment match is declined when no prediction is trusted enough.
    let mappings = FormFiller::builtin(strict)?.fill_without_cache(&fields, &profile(), &CustomFields::new());
    assert!(mappings.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_fill_updates_cache() -> Result<(), Box<dyn std::error::Error>> {
    let cache = Arc::new(MappingCache::in_memory());
    let filler = FormFiller::builtin(config())?.with_cache(cache.clone());

    let mappings = filler.fill(&form(), &profile(), &CustomFields::new()).await;
    assert_eq!(mappings.len(), 8);

    let entry = cache.get("Email ID *").await.expect("email cached");
    assert_eq!(entry.field, "email");
    assert!(cache.get("Portfolio website").await.is_none());
    Ok(())
}

#[tokio::test]
async fn test_cache_biases_unknown_label() -> Result<(), Box<dyn std::error::Error>> {
    let cache = Arc::new(MappingCache::in_memory());
    cache.store("Reach me at", "phone", 0.9).await;
    let filler = FormFiller::builtin(config())?.with_cache(cache);

    let fields = vec![DetectedField::new("Reach me at", FieldKind::<usize>::Text)];
    let mappings = filler.fill(&fields, &profile(), &CustomFields::new()).await;
    assert_eq!(mappings.len(), 1);
    assert_eq!(mappings[0].field, "phone");
    assert_eq!(mappings[0].value.as_single(), Some("9876543210"));
    Ok(())
}

#[tokio::test]
async fn test_custom_fields() -> Result<(), Box<dyn std::error::Error>> {
    let filler = FormFiller::builtin(config())?;
    let mut custom = CustomFields::new();
    custom.insert("Hostel Preference".to_string(), "Yes".to_string());

    let fields = vec![DetectedField::new(
        "Hostel preference *",
        FieldKind::Radio(choice(&["Yes", "No"])),
    )];
    let mappings = filler.fill(&fields, &profile(), &custom).await;
    assert_eq!(mappings.len(), 1);
    assert_eq!(mappings[0].field, "Hostel Preference");
    assert_eq!(mappings[0].selected, vec![0]);
    Ok(())
}

#[tokio::test]
async fn test_custom_field_fills_are_not_cached() -> Result<(), Box<dyn std::error::Error>> {
    let cache = Arc::new(MappingCache::in_memory());
    let filler = FormFiller::builtin(config())?.with_cache(cache.clone());
    let mut custom = CustomFields::new();
    custom.insert("Hostel Preference".to_string(), "Yes".to_string());
    let fields = vec![DetectedField::new("Hostel preference *", FieldKind::Radio(choice(&["Yes", "No"])))];

    let mappings = filler.fill(&fields, &profile(), &custom).await;
    assert_eq!(mappings.len(), 1);
    assert!(cache.get("Hostel preference *").await.is_none());

    // Once the custom field is gone, nothing stale fills the label.
    let mappings = filler.fill(&fields, &profile(), &CustomFields::new()).await;
    assert!(mappings.is_empty());
    Ok(())
}

#[test]
fn test_mappings_serialize() -> Result<(), Box<dyn std::error::Error>> {
    let filler = FormFiller::builtin(config())?;
    let mappings = filler.fill_without_cache(&form(), &profile(), &CustomFields::new());
    let json = serde_json::to_value(&mappings)?;
    assert_eq!(json[0]["field"], "fullName");
    assert_eq!(json[0]["value"], "John Doe");
    assert!(json[0].get("selected").is_none());
    Ok(())
}
