//! Phase 7: data-quality audit of the component records.
//!
//! Findings are informational and never abort the run.

use serde::{Deserialize, Serialize};

use crate::config::ComponentKey;
use crate::records::RecordAccessor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuditKind {
    /// Submitted as a final design although its name is not top-level.
    SubmittedLeaf,
    /// Top-level by name but built from no subcomponents.
    TopLevelWithoutSubcomponents,
}

impl AuditKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SubmittedLeaf => "submitted-leaf",
            Self::TopLevelWithoutSubcomponents => "top-level-without-subcomponents",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditFinding {
    pub kind: AuditKind,
    pub component: ComponentKey,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    #[serde(default)]
    pub findings: Vec<AuditFinding>,
}

impl AuditReport {
    pub fn count(&self, kind: AuditKind) -> usize {
        self.findings.iter().filter(|f| f.kind == kind).count()
    }

    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Check every component for structural oddities.
pub fn audit_components<R: RecordAccessor + ?Sized>(records: &R) -> AuditReport {
    let mut findings = Vec::new();
    for comp in records.list_components() {
        let top_level = records.is_top_level_name(&comp.name);
        if comp.submit && !top_level {
            log::warn!("Submitted leaf component: {}", comp.key());
            findings.push(AuditFinding {
                kind: AuditKind::SubmittedLeaf,
                component: comp.key(),
            });
        }
        if top_level && comp.subcomponents.is_empty() {
            log::warn!("Top-level component without subcomponents: {}", comp.key());
            findings.push(AuditFinding {
                kind: AuditKind::TopLevelWithoutSubcomponents,
                component: comp.key(),
            });
        }
    }
    findings.sort_by(|a, b| {
        a.component
            .cmp(&b.component)
            .then(a.kind.as_str().cmp(b.kind.as_str()))
    });
    AuditReport { findings }
}
