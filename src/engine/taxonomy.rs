//! Fixed twelve-section SPMP taxonomy: trigger phrases, expected
//! subclauses and the weight category of each section.

use serde::{Deserialize, Serialize};

pub const TOTAL_SECTIONS_REQUIRED: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SectionId {
    Overview,
    References,
    Definitions,
    ProjectOrganization,
    StaffOrganization,
    RiskManagement,
    BudgetAndResources,
    MasterSchedule,
    StandardsAndPractices,
    ReviewsAndAudits,
    ProblemResolutionAndChange,
    GlossaryAndAppendices,
}

impl SectionId {
    /// Canonical evaluation order.
    pub const ALL: [SectionId; TOTAL_SECTIONS_REQUIRED] = [
        SectionId::Overview,
        SectionId::References,
        SectionId::Definitions,
        SectionId::ProjectOrganization,
        SectionId::StaffOrganization,
        SectionId::RiskManagement,
        SectionId::BudgetAndResources,
        SectionId::MasterSchedule,
        SectionId::StandardsAndPractices,
        SectionId::ReviewsAndAudits,
        SectionId::ProblemResolutionAndChange,
        SectionId::GlossaryAndAppendices,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SectionId::Overview => "OVERVIEW",
            SectionId::References => "REFERENCES",
            SectionId::Definitions => "DEFINITIONS",
            SectionId::ProjectOrganization => "PROJECT_ORGANIZATION",
            SectionId::StaffOrganization => "STAFF_ORGANIZATION",
            SectionId::RiskManagement => "RISK_MANAGEMENT",
            SectionId::BudgetAndResources => "BUDGET_AND_RESOURCES",
            SectionId::MasterSchedule => "MASTER_SCHEDULE",
            SectionId::StandardsAndPractices => "STANDARDS_AND_PRACTICES",
            SectionId::ReviewsAndAudits => "REVIEWS_AND_AUDITS",
            SectionId::ProblemResolutionAndChange => "PROBLEM_RESOLUTION_AND_CHANGE",
            SectionId::GlossaryAndAppendices => "GLOSSARY_AND_APPENDICES",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_uppercase();
        SectionId::ALL
            .into_iter()
            .find(|section| section.as_str() == normalized)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            SectionId::Overview => "Project Overview",
            SectionId::References => "References",
            SectionId::Definitions => "Definitions & Acronyms",
            SectionId::ProjectOrganization => "Project Organization",
            SectionId::StaffOrganization => "Staff Organization",
            SectionId::RiskManagement => "Risk Management",
            SectionId::BudgetAndResources => "Budget & Resource Planning",
            SectionId::MasterSchedule => "Master Schedule",
            SectionId::StandardsAndPractices => "Standards & Practices (Technical Process)",
            SectionId::ReviewsAndAudits => "Reviews & Audits",
            SectionId::ProblemResolutionAndChange => "Problem Resolution & Change Management",
            SectionId::GlossaryAndAppendices => "Glossary & Appendices (Additional Plans)",
        }
    }

    pub fn ordinal(self) -> usize {
        SectionId::ALL
            .iter()
            .position(|section| *section == self)
            .unwrap_or_default()
    }

    pub fn category(self) -> WeightCategory {
        match self {
            SectionId::Overview => WeightCategory::Overview,
            SectionId::References => WeightCategory::References,
            SectionId::Definitions => WeightCategory::Definitions,
            SectionId::ProjectOrganization | SectionId::StaffOrganization => {
                WeightCategory::Organization
            }
            SectionId::RiskManagement
            | SectionId::BudgetAndResources
            | SectionId::MasterSchedule => WeightCategory::ManagerialProcess,
            SectionId::StandardsAndPractices => WeightCategory::TechnicalProcess,
            SectionId::ReviewsAndAudits | SectionId::ProblemResolutionAndChange => {
                WeightCategory::SupportingProcess
            }
            SectionId::GlossaryAndAppendices => WeightCategory::AdditionalPlans,
        }
    }

    /// Severity of the gap when the section is missing entirely.
    pub fn absent_severity(self) -> Severity {
        match self {
            SectionId::ProjectOrganization
            | SectionId::RiskManagement
            | SectionId::BudgetAndResources
            | SectionId::MasterSchedule
            | SectionId::StandardsAndPractices => Severity::High,
            SectionId::Overview
            | SectionId::References
            | SectionId::Definitions
            | SectionId::StaffOrganization
            | SectionId::ReviewsAndAudits
            | SectionId::ProblemResolutionAndChange => Severity::Medium,
            SectionId::GlossaryAndAppendices => Severity::Low,
        }
    }

    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            SectionId::Overview => &[
                "project overview",
                "overview",
                "introduction",
                "purpose",
                "scope",
                "project summary",
            ],
            SectionId::References => &[
                "references",
                "reference documents",
                "bibliography",
                "applicable documents",
            ],
            SectionId::Definitions => &[
                "definitions",
                "acronyms",
                "abbreviations",
                "terminology",
            ],
            SectionId::ProjectOrganization => &[
                "project organization",
                "organizational structure",
                "organization chart",
                "external interfaces",
                "internal structure",
            ],
            SectionId::StaffOrganization => &[
                "staff organization",
                "staffing plan",
                "team structure",
                "roles and responsibilities",
                "team members",
            ],
            SectionId::RiskManagement => &[
                "risk management",
                "risk identification",
                "risk assessment",
                "risk mitigation",
                "risk register",
            ],
            SectionId::BudgetAndResources => &[
                "budget",
                "resource planning",
                "resource allocation",
                "cost estimate",
                "resource acquisition",
            ],
            SectionId::MasterSchedule => &[
                "master schedule",
                "schedule",
                "milestones",
                "gantt",
                "timeline",
                "work breakdown structure",
            ],
            SectionId::StandardsAndPractices => &[
                "standards and practices",
                "technical process",
                "methods, tools, and techniques",
                "methods, tools and techniques",
                "process model",
                "coding standards",
            ],
            SectionId::ReviewsAndAudits => &[
                "reviews and audits",
                "review",
                "audit",
                "inspection",
                "walkthrough",
            ],
            SectionId::ProblemResolutionAndChange => &[
                "problem resolution",
                "change management",
                "change control",
                "configuration management",
                "change request",
            ],
            SectionId::GlossaryAndAppendices => &[
                "glossary",
                "appendix",
                "appendices",
                "additional plans",
                "annex",
            ],
        }
    }

    pub fn subclauses(self) -> &'static [Subclause] {
        match self {
            SectionId::Overview => OVERVIEW_SUBCLAUSES,
            SectionId::References => REFERENCES_SUBCLAUSES,
            SectionId::Definitions => DEFINITIONS_SUBCLAUSES,
            SectionId::ProjectOrganization => PROJECT_ORGANIZATION_SUBCLAUSES,
            SectionId::StaffOrganization => STAFF_ORGANIZATION_SUBCLAUSES,
            SectionId::RiskManagement => RISK_MANAGEMENT_SUBCLAUSES,
            SectionId::BudgetAndResources => BUDGET_SUBCLAUSES,
            SectionId::MasterSchedule => SCHEDULE_SUBCLAUSES,
            SectionId::StandardsAndPractices => STANDARDS_SUBCLAUSES,
            SectionId::ReviewsAndAudits => REVIEWS_SUBCLAUSES,
            SectionId::ProblemResolutionAndChange => CHANGE_SUBCLAUSES,
            SectionId::GlossaryAndAppendices => APPENDIX_SUBCLAUSES,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    High,
    Medium,
    Low,
    Info,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
            Severity::Info => "INFO",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "HIGH" => Some(Severity::High),
            "MEDIUM" => Some(Severity::Medium),
            "LOW" => Some(Severity::Low),
            "INFO" => Some(Severity::Info),
            _ => None,
        }
    }
}

/// The eight weight buckets a grading profile assigns percentages to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeightCategory {
    Overview,
    References,
    Definitions,
    Organization,
    ManagerialProcess,
    TechnicalProcess,
    SupportingProcess,
    AdditionalPlans,
}

impl WeightCategory {
    pub const ALL: [WeightCategory; 8] = [
        WeightCategory::Overview,
        WeightCategory::References,
        WeightCategory::Definitions,
        WeightCategory::Organization,
        WeightCategory::ManagerialProcess,
        WeightCategory::TechnicalProcess,
        WeightCategory::SupportingProcess,
        WeightCategory::AdditionalPlans,
    ];

    pub fn sections(self) -> Vec<SectionId> {
        SectionId::ALL
            .into_iter()
            .filter(|section| section.category() == self)
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Subclause {
    pub label: &'static str,
    pub keywords: &'static [&'static str],
}

const OVERVIEW_SUBCLAUSES: &[Subclause] = &[
    Subclause {
        label: "1.1 Purpose and Scope",
        keywords: &["purpose", "scope", "objectives"],
    },
    Subclause {
        label: "1.2 Assumptions and Constraints",
        keywords: &["assumptions", "constraints"],
    },
    Subclause {
        label: "1.3 Project Deliverables",
        keywords: &["deliverables"],
    },
    Subclause {
        label: "1.4 Evolution of the Plan",
        keywords: &["evolution of the plan", "plan updates", "revision history"],
    },
];

const REFERENCES_SUBCLAUSES: &[Subclause] = &[
    Subclause {
        label: "2.1 Cited Standards",
        keywords: &["ieee", "iso", "standard"],
    },
    Subclause {
        label: "2.2 Source Identification",
        keywords: &["version", "publisher", "available at", "http"],
    },
];

const DEFINITIONS_SUBCLAUSES: &[Subclause] = &[
    Subclause {
        label: "3.1 Term Definitions",
        keywords: &["definitions", "terms"],
    },
    Subclause {
        label: "3.2 Acronyms and Abbreviations",
        keywords: &["acronyms", "abbreviations"],
    },
];

const PROJECT_ORGANIZATION_SUBCLAUSES: &[Subclause] = &[
    Subclause {
        label: "4.1 External Interfaces",
        keywords: &["external interfaces", "stakeholders", "client"],
    },
    Subclause {
        label: "4.2 Internal Structure",
        keywords: &["internal structure", "organizational structure", "organization chart"],
    },
    Subclause {
        label: "4.3 Roles and Responsibilities",
        keywords: &["roles and responsibilities", "responsibility", "raci"],
    },
];

const STAFF_ORGANIZATION_SUBCLAUSES: &[Subclause] = &[
    Subclause {
        label: "5.1 Staffing Plan",
        keywords: &["staffing plan", "staff acquisition", "team members"],
    },
    Subclause {
        label: "5.2 Skills and Training",
        keywords: &["skills", "training"],
    },
];

const RISK_MANAGEMENT_SUBCLAUSES: &[Subclause] = &[
    Subclause {
        label: "5.2.1 Risk Identification",
        keywords: &["risk identification", "identified risks", "identify risks"],
    },
    Subclause {
        label: "5.2.2 Risk Assessment",
        keywords: &["risk assessment", "probability", "impact"],
    },
    Subclause {
        label: "5.2.3 Risk Mitigation",
        keywords: &["risk mitigation", "mitigation", "contingency"],
    },
    Subclause {
        label: "5.2.4 Risk Monitoring",
        keywords: &["risk monitoring", "monitor", "risk register"],
    },
];

const BUDGET_SUBCLAUSES: &[Subclause] = &[
    Subclause {
        label: "6.1 Cost Estimate",
        keywords: &["cost estimate", "estimated cost", "budget"],
    },
    Subclause {
        label: "6.2 Resource Allocation",
        keywords: &["resource allocation", "resources"],
    },
    Subclause {
        label: "6.3 Resource Acquisition",
        keywords: &["resource acquisition", "procurement", "equipment"],
    },
];

const SCHEDULE_SUBCLAUSES: &[Subclause] = &[
    Subclause {
        label: "7.1 Work Breakdown Structure",
        keywords: &["work breakdown structure", "wbs", "work packages"],
    },
    Subclause {
        label: "7.2 Milestones",
        keywords: &["milestone"],
    },
    Subclause {
        label: "7.3 Task Dependencies",
        keywords: &["dependencies", "critical path", "gantt"],
    },
];

const STANDARDS_SUBCLAUSES: &[Subclause] = &[
    Subclause {
        label: "8.1 Process Model",
        keywords: &["process model", "life cycle", "lifecycle", "agile", "scrum", "waterfall"],
    },
    Subclause {
        label: "8.2 Methods and Tools",
        keywords: &["methods", "tools", "techniques"],
    },
    Subclause {
        label: "8.3 Coding and Documentation Standards",
        keywords: &["coding standards", "documentation standards", "style guide"],
    },
    Subclause {
        label: "8.4 Infrastructure Plan",
        keywords: &["infrastructure", "environment", "repository"],
    },
];

const REVIEWS_SUBCLAUSES: &[Subclause] = &[
    Subclause {
        label: "9.1 Review Schedule",
        keywords: &["review schedule", "review meeting", "milestone review"],
    },
    Subclause {
        label: "9.2 Audit Procedures",
        keywords: &["audit"],
    },
    Subclause {
        label: "9.3 Quality Assurance",
        keywords: &["quality assurance", "qa"],
    },
];

const CHANGE_SUBCLAUSES: &[Subclause] = &[
    Subclause {
        label: "10.1 Problem Reporting",
        keywords: &["problem resolution", "issue tracking", "defect", "bug report"],
    },
    Subclause {
        label: "10.2 Change Control Procedure",
        keywords: &["change control", "change request", "change management"],
    },
    Subclause {
        label: "10.3 Configuration Management",
        keywords: &["configuration management", "version control", "baseline"],
    },
];

const APPENDIX_SUBCLAUSES: &[Subclause] = &[
    Subclause {
        label: "11.1 Glossary",
        keywords: &["glossary"],
    },
    Subclause {
        label: "11.2 Additional Plans",
        keywords: &["additional plans", "appendix", "appendices", "annex"],
    },
];
