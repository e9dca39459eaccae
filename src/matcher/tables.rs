//! Static, versioned data tables used by the option matcher.
//!
//! The tables are region-specific (Indian engineering colleges) and are kept
//! apart from the matching code so they can be extended or swapped without
//! touching the cascade.

use crate::normalize::{contains_words, normalize};

/// Bumped whenever a table entry is added, removed or re-keyed.
pub const TABLES_VERSION: u32 = 3;

/// Variants shorter than this only match a whole normalized string.
const MIN_PARTIAL_VARIANT_LEN: usize = 3;

/// A canonical key and the normalized spellings that mean it.
#[derive(Debug)]
pub struct SynonymGroup {
    pub key: &'static str,
    pub variants: &'static [&'static str],
}

/// A named set of synonym groups for one category.
#[derive(Debug)]
pub struct SynonymTable {
    pub name: &'static str,
    pub groups: &'static [SynonymGroup],
}

impl SynonymTable {
    /// Canonical keys whose variants occur in `normalized`, in table order.
    pub fn keys_for(&self, normalized: &str) -> Vec<&'static str> {
        self.groups
            .iter()
            .filter(|g| g.variants.iter().any(|v| variant_matches(normalized, v)))
            .map(|g| g.key)
            .collect()
    }

    /// The first canonical key for `text`, if any.
    pub fn canonical(&self, text: &str) -> Option<&'static str> {
        let normalized = normalize(text);
        self.keys_for(&normalized).into_iter().next()
    }
}

fn variant_matches(normalized: &str, variant: &str) -> bool {
    if variant.len() < MIN_PARTIAL_VARIANT_LEN {
        normalized == variant
    } else {
        contains_words(normalized, variant)
    }
}

pub static GENDER: SynonymTable = SynonymTable {
    name: "gender",
    groups: &[
        SynonymGroup { key: "male", variants: &["male", "m", "man", "boy", "he him"] },
        SynonymGroup { key: "female", variants: &["female", "f", "woman", "girl", "she her"] },
        SynonymGroup {
            key: "other",
            variants: &[
                "other", "others", "non binary", "nonbinary", "transgender",
                "prefer not to say", "prefer not to disclose",
            ],
        },
    ],
};

pub static BRANCH: SynonymTable = SynonymTable {
    name: "branch",
    groups: &[
        SynonymGroup {
            key: "cse",
            variants: &[
                "cse", "cs", "coe", "computer science", "computer engineering",
                "computer science and engineering", "computer science engineering", "comp sci",
            ],
        },
        SynonymGroup { key: "it", variants: &["it", "information technology", "infotech"] },
        SynonymGroup {
            key: "ece",
            variants: &[
                "ece", "ec", "entc", "extc", "electronics and communication",
                "electronics communication", "electronics and telecommunication",
            ],
        },
        SynonymGroup {
            key: "eee",
            variants: &["eee", "ee", "electrical", "electrical and electronics"],
        },
        SynonymGroup { key: "mech", variants: &["me", "mech", "mechanical"] },
        SynonymGroup { key: "civil", variants: &["ce", "civil"] },
        SynonymGroup { key: "chemical", variants: &["che", "chemical"] },
        SynonymGroup {
            key: "aiml",
            variants: &[
                "aiml", "ai ml", "ai and ml", "artificial intelligence and machine learning",
                "machine learning",
            ],
        },
        SynonymGroup {
            key: "ds",
            variants: &["ds", "aids", "ai ds", "data science", "artificial intelligence and data science"],
        },
        SynonymGroup { key: "biotech", variants: &["bt", "biotech", "biotechnology"] },
    ],
};

pub static DEGREE: SynonymTable = SynonymTable {
    name: "degree",
    groups: &[
        SynonymGroup {
            key: "btech",
            variants: &["btech", "b tech", "be", "bachelor of technology", "bachelor of engineering"],
        },
        SynonymGroup { key: "mtech", variants: &["mtech", "m tech", "master of technology"] },
        SynonymGroup { key: "bsc", variants: &["bsc", "b sc", "bachelor of science"] },
        SynonymGroup { key: "msc", variants: &["msc", "m sc", "master of science"] },
        SynonymGroup { key: "bca", variants: &["bca", "bachelor of computer applications"] },
        SynonymGroup { key: "mca", variants: &["mca", "master of computer applications"] },
        SynonymGroup { key: "mba", variants: &["mba", "master of business administration"] },
        SynonymGroup { key: "phd", variants: &["phd", "doctorate", "doctor of philosophy"] },
        SynonymGroup { key: "diploma", variants: &["diploma", "polytechnic"] },
    ],
};

pub static ROLE: SynonymTable = SynonymTable {
    name: "role",
    groups: &[
        SynonymGroup {
            key: "student",
            variants: &["student", "studying", "undergraduate", "ug student", "pg student"],
        },
        SynonymGroup {
            key: "professional",
            variants: &["working professional", "professional", "employed", "working", "employee"],
        },
        SynonymGroup {
            key: "fresher",
            variants: &["fresher", "freshers", "recent graduate", "job seeker"],
        },
        SynonymGroup { key: "intern", variants: &["intern", "internship", "trainee"] },
    ],
};

pub static BOOLEAN: SynonymTable = SynonymTable {
    name: "boolean",
    groups: &[
        SynonymGroup { key: "yes", variants: &["yes", "y", "true"] },
        SynonymGroup { key: "no", variants: &["no", "n", "false", "none", "nil", "zero", "0"] },
    ],
};

/// Tables consulted by the generic synonym tier.
pub static SYNONYM_TABLES: &[&SynonymTable] = &[&GENDER, &BRANCH, &DEGREE, &ROLE, &BOOLEAN];

/// Category table for a predicted field id, used by the category pre-transform.
pub fn category_table(field_id: &str) -> Option<&'static SynonymTable> {
    match field_id {
        "gender" => Some(&GENDER),
        "branch" => Some(&BRANCH),
        "degree" => Some(&DEGREE),
        "role" => Some(&ROLE),
        _ => None,
    }
}

/// A known institution: its official name and the short forms people use.
#[derive(Debug)]
pub struct Institution {
    pub key: &'static str,
    pub full_name: &'static str,
    /// Normalized keywords; hits are weighted by keyword length
    pub keywords: &'static [&'static str],
}

impl Institution {
    /// Keywords of this institution found in normalized text.
    pub fn keyword_hits<'a>(&'a self, normalized: &'a str) -> impl Iterator<Item = &'static str> + 'a {
        self.keywords
            .iter()
            .copied()
            .filter(move |k| variant_matches(normalized, k))
    }

    /// True if normalized text names this institution by keyword or full name.
    pub fn is_named_in(&self, normalized: &str) -> bool {
        self.keyword_hits(normalized).next().is_some()
            || contains_words(normalized, &normalize(self.full_name))
    }
}

pub static INSTITUTIONS: &[Institution] = &[
    Institution {
        key: "iit_bombay",
        full_name: "Indian Institute of Technology Bombay",
        keywords: &["iitb", "iit bombay", "bombay", "powai"],
    },
    Institution {
        key: "iit_delhi",
        full_name: "Indian Institute of Technology Delhi",
        keywords: &["iitd", "iit delhi"],
    },
    Institution {
        key: "iit_madras",
        full_name: "Indian Institute of Technology Madras",
        keywords: &["iitm", "iit madras", "madras"],
    },
    Institution {
        key: "iit_kanpur",
        full_name: "Indian Institute of Technology Kanpur",
        keywords: &["iitk", "iit kanpur", "kanpur"],
    },
    Institution {
        key: "iit_kharagpur",
        full_name: "Indian Institute of Technology Kharagpur",
        keywords: &["iitkgp", "iit kgp", "iit kharagpur", "kharagpur"],
    },
    Institution {
        key: "iit_roorkee",
        full_name: "Indian Institute of Technology Roorkee",
        keywords: &["iitr", "iit roorkee", "roorkee"],
    },
    Institution {
        key: "nit_trichy",
        full_name: "National Institute of Technology Tiruchirappalli",
        keywords: &["nitt", "nit trichy", "trichy", "tiruchirappalli"],
    },
    Institution {
        key: "nit_surathkal",
        full_name: "National Institute of Technology Karnataka",
        keywords: &["nitk", "nit surathkal", "surathkal"],
    },
    Institution {
        key: "bits_pilani",
        full_name: "Birla Institute of Technology and Science Pilani",
        keywords: &["bits", "bits pilani", "pilani", "birla"],
    },
    Institution {
        key: "vit_vellore",
        full_name: "Vellore Institute of Technology",
        keywords: &["vit", "vit vellore", "vellore"],
    },
    Institution {
        key: "iiit_hyderabad",
        full_name: "International Institute of Information Technology Hyderabad",
        keywords: &["iiith", "iiit hyderabad", "iiit h"],
    },
    Institution {
        key: "dtu",
        full_name: "Delhi Technological University",
        keywords: &["dtu", "dce", "delhi technological", "delhi college of engineering"],
    },
    Institution {
        key: "nsut",
        full_name: "Netaji Subhas University of Technology",
        keywords: &["nsut", "nsit", "netaji subhas"],
    },
    Institution {
        key: "anna",
        full_name: "Anna University",
        keywords: &["anna university", "anna univ", "ceg", "guindy"],
    },
    Institution {
        key: "jadavpur",
        full_name: "Jadavpur University",
        keywords: &["jadavpur", "ju"],
    },
    Institution {
        key: "manipal",
        full_name: "Manipal Institute of Technology",
        keywords: &["mit manipal", "manipal"],
    },
    Institution {
        key: "srm",
        full_name: "SRM Institute of Science and Technology",
        keywords: &["srm", "srmist", "kattankulathur"],
    },
    Institution {
        key: "coep",
        full_name: "College of Engineering Pune",
        keywords: &["coep", "college of engineering pune"],
    },
    Institution {
        key: "vjti",
        full_name: "Veermata Jijabai Technological Institute",
        keywords: &["vjti", "veermata jijabai"],
    },
    Institution {
        key: "pes",
        full_name: "PES University",
        keywords: &["pes", "pesu", "pes university"],
    },
];

/// Institutions named in normalized text.
pub fn institutions_named_in(normalized: &str) -> Vec<&'static Institution> {
    INSTITUTIONS.iter().filter(|i| i.is_named_in(normalized)).collect()
}

/// Canonical keys across every synonym table and the institution table.
pub fn canonical_keys(text: &str) -> Vec<&'static str> {
    let normalized = normalize(text);
    if normalized.is_empty() {
        return Vec::new();
    }
    let mut keys: Vec<&'static str> = SYNONYM_TABLES
        .iter()
        .flat_map(|t| t.keys_for(&normalized))
        .collect();
    keys.extend(institutions_named_in(&normalized).into_iter().map(|i| i.key));
    keys
}

pub const ORDINAL_WORDS: [&str; 10] = [
    "first", "second", "third", "fourth", "fifth", "sixth", "seventh", "eighth", "ninth", "tenth",
];

/// Ordinal spellings of `n` for `1..=10`: `"4th"` and `"fourth"` for 4.
pub fn ordinal_forms(n: u32) -> Option<[String; 2]> {
    if !(1..=10).contains(&n) {
        return None;
    }
    let suffix = match n {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    };
    Some([format!("{}{}", n, suffix), ORDINAL_WORDS[(n - 1) as usize].to_string()])
}
