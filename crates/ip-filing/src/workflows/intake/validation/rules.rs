use crate::workflows::intake::domain::FilingDomain;

/// Declarative rule descriptor for one submitted field.
pub struct FieldRule {
    pub name: &'static str,
    pub kind: RuleKind,
    pub required: bool,
}

/// Value kind plus the bounds checked by the interpreter.
pub enum RuleKind {
    Text {
        min_len: usize,
        max_len: usize,
        pattern: Option<&'static str>,
    },
    Email,
    Integer {
        min: i64,
        max: i64,
    },
    Flag,
    List {
        max_items: usize,
    },
    Date,
    Enumerated(&'static [&'static str]),
}

/// Rule table for one `(domain, step)` pair.
///
/// `date_ranges` lists `(from, to)` field pairs checked for ordering, with the
/// `to` side also rejected when it lies in the future.
pub struct StepRules {
    pub fields: &'static [FieldRule],
    pub date_ranges: &'static [(&'static str, &'static str)],
}

const TITLE_PATTERN: &str = r"^[A-Za-z0-9 .,()\-]+$";
const PHONE_PATTERN: &str = r"^\+?[0-9][0-9 \-]{5,18}$";

const PATENT_STEPS: [StepRules; 7] = [
    // Step 1: applicant identity.
    StepRules {
        fields: &[
            FieldRule {
                name: "applicant_name",
                kind: RuleKind::Text {
                    min_len: 2,
                    max_len: 120,
                    pattern: None,
                },
                required: true,
            },
            FieldRule {
                name: "applicant_email",
                kind: RuleKind::Email,
                required: true,
            },
            FieldRule {
                name: "applicant_phone",
                kind: RuleKind::Text {
                    min_len: 7,
                    max_len: 20,
                    pattern: Some(PHONE_PATTERN),
                },
                required: false,
            },
            FieldRule {
                name: "entity_type",
                kind: RuleKind::Enumerated(&["individual", "organization"]),
                required: true,
            },
        ],
        date_ranges: &[],
    },
    // Step 2: priority claim.
    StepRules {
        fields: &[
            FieldRule {
                name: "priority_claimed",
                kind: RuleKind::Flag,
                required: false,
            },
            FieldRule {
                name: "priority_country",
                kind: RuleKind::Text {
                    min_len: 2,
                    max_len: 60,
                    pattern: None,
                },
                required: false,
            },
            FieldRule {
                name: "priority_from",
                kind: RuleKind::Date,
                required: false,
            },
            FieldRule {
                name: "priority_to",
                kind: RuleKind::Date,
                required: false,
            },
        ],
        date_ranges: &[("priority_from", "priority_to")],
    },
    // Step 3: invention disclosure.
    StepRules {
        fields: &[
            FieldRule {
                name: "invention_title",
                kind: RuleKind::Text {
                    min_len: 5,
                    max_len: 200,
                    pattern: Some(TITLE_PATTERN),
                },
                required: true,
            },
            FieldRule {
                name: "technical_field",
                kind: RuleKind::Text {
                    min_len: 5,
                    max_len: 200,
                    pattern: None,
                },
                required: false,
            },
            FieldRule {
                name: "technical_description",
                kind: RuleKind::Text {
                    min_len: 50,
                    max_len: 10_000,
                    pattern: None,
                },
                required: true,
            },
        ],
        date_ranges: &[],
    },
    // Step 4: claims and prior art context (claim structure is checked by
    // the dependency checker, not these rules).
    StepRules {
        fields: &[
            FieldRule {
                name: "claims_count",
                kind: RuleKind::Integer { min: 1, max: 200 },
                required: false,
            },
            FieldRule {
                name: "prior_art_notes",
                kind: RuleKind::Text {
                    min_len: 10,
                    max_len: 5_000,
                    pattern: None,
                },
                required: false,
            },
        ],
        date_ranges: &[],
    },
    // Step 5: drawings and supporting documents.
    StepRules {
        fields: &[
            FieldRule {
                name: "drawings_included",
                kind: RuleKind::Flag,
                required: false,
            },
            FieldRule {
                name: "drawing_sheets",
                kind: RuleKind::Integer { min: 0, max: 500 },
                required: false,
            },
            FieldRule {
                name: "document_notes",
                kind: RuleKind::Text {
                    min_len: 1,
                    max_len: 1_000,
                    pattern: None,
                },
                required: false,
            },
        ],
        date_ranges: &[],
    },
    // Step 6: examination request.
    StepRules {
        fields: &[
            FieldRule {
                name: "examination_requested",
                kind: RuleKind::Flag,
                required: true,
            },
            FieldRule {
                name: "expedited",
                kind: RuleKind::Flag,
                required: false,
            },
        ],
        date_ranges: &[],
    },
    // Step 7: declaration and signature.
    StepRules {
        fields: &[
            FieldRule {
                name: "declaration_accepted",
                kind: RuleKind::Flag,
                required: true,
            },
            FieldRule {
                name: "signature_name",
                kind: RuleKind::Text {
                    min_len: 2,
                    max_len: 120,
                    pattern: None,
                },
                required: true,
            },
            FieldRule {
                name: "signed_on",
                kind: RuleKind::Date,
                required: false,
            },
        ],
        date_ranges: &[],
    },
];

const COPYRIGHT_STEPS: [StepRules; 5] = [
    // Step 1: applicant identity.
    StepRules {
        fields: &[
            FieldRule {
                name: "applicant_name",
                kind: RuleKind::Text {
                    min_len: 2,
                    max_len: 120,
                    pattern: None,
                },
                required: true,
            },
            FieldRule {
                name: "applicant_email",
                kind: RuleKind::Email,
                required: true,
            },
            FieldRule {
                name: "applicant_phone",
                kind: RuleKind::Text {
                    min_len: 7,
                    max_len: 20,
                    pattern: Some(PHONE_PATTERN),
                },
                required: false,
            },
        ],
        date_ranges: &[],
    },
    // Step 2: the work being registered.
    StepRules {
        fields: &[
            FieldRule {
                name: "work_title",
                kind: RuleKind::Text {
                    min_len: 5,
                    max_len: 200,
                    pattern: Some(TITLE_PATTERN),
                },
                required: true,
            },
            FieldRule {
                name: "work_category",
                kind: RuleKind::Enumerated(&["literary", "musical", "artistic", "software"]),
                required: true,
            },
            FieldRule {
                name: "work_description",
                kind: RuleKind::Text {
                    min_len: 50,
                    max_len: 5_000,
                    pattern: None,
                },
                required: true,
            },
        ],
        date_ranges: &[],
    },
    // Step 3: authorship and creation window.
    StepRules {
        fields: &[
            FieldRule {
                name: "authors",
                kind: RuleKind::List { max_items: 20 },
                required: true,
            },
            FieldRule {
                name: "creation_from",
                kind: RuleKind::Date,
                required: false,
            },
            FieldRule {
                name: "creation_to",
                kind: RuleKind::Date,
                required: false,
            },
            FieldRule {
                name: "first_published",
                kind: RuleKind::Flag,
                required: false,
            },
        ],
        date_ranges: &[("creation_from", "creation_to")],
    },
    // Step 4: deposit copies.
    StepRules {
        fields: &[FieldRule {
            name: "deposit_copy_notes",
            kind: RuleKind::Text {
                min_len: 1,
                max_len: 1_000,
                pattern: None,
            },
            required: false,
        }],
        date_ranges: &[],
    },
    // Step 5: declaration and signature.
    StepRules {
        fields: &[
            FieldRule {
                name: "declaration_accepted",
                kind: RuleKind::Flag,
                required: true,
            },
            FieldRule {
                name: "signature_name",
                kind: RuleKind::Text {
                    min_len: 2,
                    max_len: 120,
                    pattern: None,
                },
                required: true,
            },
        ],
        date_ranges: &[],
    },
];

const CONSULTATION_STEPS: [StepRules; 1] = [StepRules {
    fields: &[
        FieldRule {
            name: "client_name",
            kind: RuleKind::Text {
                min_len: 2,
                max_len: 120,
                pattern: None,
            },
            required: true,
        },
        FieldRule {
            name: "client_email",
            kind: RuleKind::Email,
            required: true,
        },
        FieldRule {
            name: "topic",
            kind: RuleKind::Enumerated(&["patent", "copyright", "trademark", "general"]),
            required: true,
        },
        FieldRule {
            name: "summary",
            kind: RuleKind::Text {
                min_len: 20,
                max_len: 2_000,
                pattern: None,
            },
            required: true,
        },
        FieldRule {
            name: "preferred_date",
            kind: RuleKind::Date,
            required: false,
        },
    ],
    date_ranges: &[],
}];

/// Look up the rule table for a `(domain, step)` pair.
pub fn step_rules(domain: FilingDomain, step: u8) -> Option<&'static StepRules> {
    if step == 0 {
        return None;
    }
    let index = usize::from(step - 1);
    match domain {
        FilingDomain::Patent => PATENT_STEPS.get(index),
        FilingDomain::Copyright => COPYRIGHT_STEPS.get(index),
        FilingDomain::Consultation => CONSULTATION_STEPS.get(index),
    }
}
