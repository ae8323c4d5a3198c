//! Fixed industry → roles table and supported languages.

use serde::Serialize;

pub struct Industry {
    pub name: &'static str,
    pub roles: &'static [&'static str],
}

pub const INDUSTRIES: &[Industry] = &[
    Industry {
        name: "Technology",
        roles: &[
            "Software Engineer",
            "Product Manager",
            "Data Scientist",
            "DevOps Engineer",
            "UI/UX Designer",
        ],
    },
    Industry {
        name: "Marketing",
        roles: &[
            "Marketing Manager",
            "Content Strategist",
            "SEO Specialist",
            "Social Media Manager",
            "Digital Marketing Analyst",
        ],
    },
    Industry {
        name: "Finance",
        roles: &[
            "Financial Analyst",
            "Accountant",
            "Investment Banker",
            "Auditor",
            "Financial Advisor",
        ],
    },
    Industry {
        name: "Healthcare",
        roles: &[
            "Registered Nurse",
            "Medical Doctor",
            "Healthcare Administrator",
            "Pharmacist",
            "Medical Assistant",
        ],
    },
    Industry {
        name: "Education",
        roles: &[
            "Teacher",
            "School Principal",
            "Instructional Designer",
            "Academic Advisor",
            "Librarian",
        ],
    },
    Industry {
        name: "Human Resources",
        roles: &[
            "HR Manager",
            "Recruiter",
            "HR Generalist",
            "Compensation and Benefits Specialist",
            "Training and Development Manager",
        ],
    },
];

pub const LANGUAGES: &[&str] = &["English", "French", "Arabic", "Darija"];

#[derive(Debug, Serialize)]
pub struct IndustryView {
    pub name: &'static str,
    pub roles: &'static [&'static str],
}

#[derive(Debug, Serialize)]
pub struct CatalogView {
    pub industries: Vec<IndustryView>,
    pub languages: &'static [&'static str],
}

pub fn catalog_view() -> CatalogView {
    CatalogView {
        industries: INDUSTRIES
            .iter()
            .map(|i| IndustryView {
                name: i.name,
                roles: i.roles,
            })
            .collect(),
        languages: LANGUAGES,
    }
}

pub fn roles_for(industry: &str) -> Option<&'static [&'static str]> {
    INDUSTRIES
        .iter()
        .find(|i| i.name == industry)
        .map(|i| i.roles)
}

/// Checks a session configuration against the catalog.
pub fn validate_selection(industry: &str, role: &str, language: &str) -> Result<(), String> {
    let roles = roles_for(industry).ok_or_else(|| "Please select an industry.".to_string())?;
    if !roles.contains(&role) {
        return Err("Please select a role.".to_string());
    }
    if !LANGUAGES.contains(&language) {
        return Err("Please select a language.".to_string());
    }
    Ok(())
}
