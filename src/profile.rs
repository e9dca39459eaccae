//! Resolves a predicted field id to a concrete value from the user's profile.
//!
//! The profile snapshot is plain JSON owned by the caller, grouped into
//! sections (`personal`, `contact`, `academic`, `professional`). Field ids the
//! table below does not know are looked up in the custom fields instead.

use std::collections::HashMap;

use chrono::NaiveDate;
use lazy_static::lazy_static;
use serde_json::Value;

/// Read-only view of the stored profile.
pub type ProfileSnapshot = Value;

/// User-defined extra fields, keyed by field id or normalized label.
pub type CustomFields = HashMap<String, String>;

/// Literal filled into fields that accept "NA" when the profile has nothing.
pub const NA_VALUE: &str = "NA";

/// Where a field's value comes from.
#[derive(Debug, Clone, Copy)]
enum FieldSource {
    /// First non-empty value among the JSON pointers
    Paths(&'static [&'static str]),
    /// First, middle and last name joined with single spaces
    FullName,
    /// A date, reformatted to `YYYY-MM-DD` for date controls
    Date(&'static str),
}

lazy_static! {
    static ref FIELD_TABLE: HashMap<&'static str, FieldSource> = {
        use FieldSource::*;
        let entries: &[(&'static str, FieldSource)] = &[
            ("fullName", FullName),
            ("firstName", Paths(&["/personal/firstName"])),
            ("middleName", Paths(&["/personal/middleName"])),
            ("lastName", Paths(&["/personal/lastName"])),
            ("gender", Paths(&["/personal/gender"])),
            ("dateOfBirth", Date("/personal/dateOfBirth")),
            ("age", Paths(&["/personal/age"])),
            ("fatherName", Paths(&["/personal/fatherName"])),
            ("motherName", Paths(&["/personal/motherName"])),
            ("nationality", Paths(&["/personal/nationality"])),
            ("email", Paths(&["/contact/email"])),
            ("phone", Paths(&["/contact/phone"])),
            ("alternatePhone", Paths(&["/contact/alternatePhone"])),
            ("whatsappNumber", Paths(&["/contact/whatsappNumber", "/contact/phone"])),
            ("address", Paths(&["/contact/address"])),
            ("city", Paths(&["/contact/city"])),
            ("state", Paths(&["/contact/state"])),
            ("pincode", Paths(&["/contact/pincode"])),
            ("country", Paths(&["/contact/country"])),
            ("collegeName", Paths(&["/academic/collegeName"])),
            ("universityName", Paths(&["/academic/universityName", "/academic/collegeName"])),
            ("rollNumber", Paths(&["/academic/rollNumber"])),
            ("branch", Paths(&["/academic/branch"])),
            ("degree", Paths(&["/academic/degree"])),
            ("yearOfStudy", Paths(&["/academic/yearOfStudy"])),
            ("yearOfGraduation", Paths(&["/academic/yearOfGraduation", "/academic/yearOfStudy"])),
            ("cgpa", Paths(&["/academic/cgpa"])),
            ("tenthPercentage", Paths(&["/academic/tenthPercentage"])),
            ("twelfthPercentage", Paths(&["/academic/twelfthPercentage"])),
            ("backlogs", Paths(&["/academic/backlogs"])),
            ("linkedin", Paths(&["/professional/linkedin"])),
            ("github", Paths(&["/professional/github"])),
            ("portfolio", Paths(&["/professional/portfolio"])),
            ("resume", Paths(&["/professional/resume"])),
            ("skills", Paths(&["/professional/skills"])),
            ("role", Paths(&["/professional/role"])),
            ("company", Paths(&["/professional/company"])),
            ("experience", Paths(&["/professional/experience"])),
        ];
        entries.iter().copied().collect()
    };
}

/// Stored date layouts understood when reformatting for date controls.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y/%m/%d", "%d %B %Y", "%d %b %Y", "%B %d, %Y",
];

/// Per-field context that changes how a value is produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveHints {
    /// The label accepts "NA" when there is no value
    pub has_na_instruction: bool,
    /// The value is destined for a date-typed control
    pub date_control: bool,
}

/// Returns true if the field id has an entry in the profile table.
pub fn is_known_field(field_id: &str) -> bool {
    FIELD_TABLE.contains_key(field_id)
}

/// All field ids the profile table can resolve, sorted.
pub fn known_fields() -> Vec<&'static str> {
    let mut fields: Vec<&'static str> = FIELD_TABLE.keys().copied().collect();
    fields.sort_unstable();
    fields
}

/// Resolves a field id against the profile and custom fields.
///
/// Returns `None` when nothing is stored and the label carries no NA
/// instruction; the caller must then leave the field alone.
///
/// # Example
/// ```
/// use formfill::profile::{resolve, CustomFields, ResolveHints};
/// use serde_json::json;
///
/// let profile = json!({"personal": {"firstName": "John", "middleName": "", "lastName": "Doe"}});
/// let value = resolve("fullName", &profile, &CustomFields::new(), ResolveHints::default());
/// assert_eq!(value.as_deref(), Some("John Doe"));
/// ```
pub fn resolve(
    field_id: &str,
    profile: &ProfileSnapshot,
    custom: &CustomFields,
    hints: ResolveHints,
) -> Option<String> {
    let value = match FIELD_TABLE.get(field_id) {
        Some(FieldSource::Paths(paths)) => paths.iter().find_map(|p| lookup(profile, p)),
        Some(FieldSource::FullName) => full_name(profile),
        Some(FieldSource::Date(path)) => lookup(profile, path).map(|raw| {
            if hints.date_control {
                to_iso_date(&raw).unwrap_or(raw)
            } else {
                raw
            }
        }),
        None => custom
            .get(field_id)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty()),
    };

    match value {
        Some(v) => Some(v),
        None if hints.has_na_instruction => Some(NA_VALUE.to_string()),
        None => None,
    }
}

/// Reads a JSON pointer, falling back to the last path segment at the top level
/// so flat profiles work too.
fn lookup(profile: &ProfileSnapshot, pointer: &str) -> Option<String> {
    profile
        .pointer(pointer)
        .and_then(value_to_string)
        .or_else(|| {
            let key = pointer.rsplit('/').next()?;
            profile.get(key).and_then(value_to_string)
        })
}

fn value_to_string(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(true) => "Yes".to_string(),
        Value::Bool(false) => "No".to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(value_to_string)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Null | Value::Object(_) => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn full_name(profile: &ProfileSnapshot) -> Option<String> {
    let parts: Vec<String> = ["/personal/firstName", "/personal/middleName", "/personal/lastName"]
        .iter()
        .filter_map(|p| lookup(profile, p))
        .collect();
    if parts.is_empty() {
        // A single stored name is still a full name.
        return lookup(profile, "/personal/fullName");
    }
    Some(parts.join(" ").trim().to_string())
}

/// Reformats a stored date to `YYYY-MM-DD`, or `None` if no known layout matches.
pub fn to_iso_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .map(|d| d.format("%Y-%m-%d").to_string())
        .or_else(|| {
            log::debug!("Unrecognized date layout: {:?}", raw);
            None
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::corpus::builtin_examples;
    use serde_json::json;

    fn profile() -> ProfileSnapshot {
        json!({
            "personal": {
                "firstName": "John",
                "middleName": "",
                "lastName": "Doe",
                "dateOfBirth": "15/08/2003",
                "gender": "Male"
            },
            "contact": { "phone": "9876543210", "pincode": 400076 },
            "academic": { "yearOfStudy": 3, "cgpa": 8.7 },
            "professional": { "skills": ["Rust", "SQL", ""], "github": "  " }
        })
    }

    fn hints(na: bool, date: bool) -> ResolveHints {
        ResolveHints {
            has_na_instruction: na,
            date_control: date,
        }
    }

    #[test]
    fn test_full_name_skips_empty_parts() {
        let value = resolve("fullName", &profile(), &CustomFields::new(), hints(false, false));
        assert_eq!(value.as_deref(), Some("John Doe"));
    }

    #[test]
    fn test_full_name_with_middle_name() {
        let p = json!({"personal": {"firstName": "Asha", "middleName": "K", "lastName": "Rao"}});
        let value = resolve("fullName", &p, &CustomFields::new(), hints(false, false));
        assert_eq!(value.as_deref(), Some("Asha K Rao"));
    }

    #[test]
    fn test_date_reformatted_only_for_date_controls() {
        let custom = CustomFields::new();
        assert_eq!(
            resolve("dateOfBirth", &profile(), &custom, hints(false, true)).as_deref(),
            Some("2003-08-15")
        );
        assert_eq!(
            resolve("dateOfBirth", &profile(), &custom, hints(false, false)).as_deref(),
            Some("15/08/2003")
        );
    }

    #[test]
    fn test_iso_date_layouts() {
        assert_eq!(to_iso_date("2003-08-15").as_deref(), Some("2003-08-15"));
        assert_eq!(to_iso_date("15-08-2003").as_deref(), Some("2003-08-15"));
        assert_eq!(to_iso_date("15 August 2003").as_deref(), Some("2003-08-15"));
        assert_eq!(to_iso_date("not a date"), None);
    }

    #[test]
    fn test_scalar_and_list_values() {
        let custom = CustomFields::new();
        let p = profile();
        assert_eq!(resolve("pincode", &p, &custom, hints(false, false)).as_deref(), Some("400076"));
        assert_eq!(resolve("cgpa", &p, &custom, hints(false, false)).as_deref(), Some("8.7"));
        assert_eq!(resolve("skills", &p, &custom, hints(false, false)).as_deref(), Some("Rust, SQL"));
    }

    #[test]
    fn test_fallback_paths() {
        let custom = CustomFields::new();
        let p = profile();
        assert_eq!(
            resolve("whatsappNumber", &p, &custom, hints(false, false)).as_deref(),
            Some("9876543210")
        );
        assert_eq!(
            resolve("yearOfGraduation", &p, &custom, hints(false, false)).as_deref(),
            Some("3")
        );
    }

    #[test]
    fn test_na_only_when_instructed() {
        let custom = CustomFields::new();
        let p = profile();
        assert_eq!(resolve("github", &p, &custom, hints(false, false)), None);
        assert_eq!(resolve("github", &p, &custom, hints(true, false)).as_deref(), Some(NA_VALUE));
        assert_eq!(resolve("linkedin", &p, &custom, hints(true, false)).as_deref(), Some("NA"));
    }

    #[test]
    fn test_unknown_ids_use_custom_fields() {
        let mut custom = CustomFields::new();
        custom.insert("tshirtSize".to_string(), " L ".to_string());
        assert_eq!(
            resolve("tshirtSize", &profile(), &custom, hints(false, false)).as_deref(),
            Some("L")
        );
        assert_eq!(resolve("shoeSize", &profile(), &custom, hints(false, false)), None);
    }

    #[test]
    fn test_flat_profile_lookup() {
        let p = json!({"email": "john@example.com"});
        assert_eq!(
            resolve("email", &p, &CustomFields::new(), hints(false, false)).as_deref(),
            Some("john@example.com")
        );
    }

    #[test]
    fn test_every_corpus_target_is_resolvable() {
        for example in builtin_examples().unwrap() {
            assert!(
                is_known_field(&example.target),
                "corpus field '{}' missing from profile table",
                example.target
            );
        }
        assert!(known_fields().contains(&"fullName"));
    }
}
