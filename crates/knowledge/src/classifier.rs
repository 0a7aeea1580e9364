//! Keyword-based department routing for queries.

use crate::types::Department;
use serde::{Deserialize, Serialize};

/// Keywords that route a query to one department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentKeywords {
    pub department: Department,
    pub keywords: Vec<String>,
}

impl DepartmentKeywords {
    pub fn new(department: impl Into<Department>, keywords: &[&str]) -> Self {
        Self {
            department: department.into(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Default routing table, in priority order.
pub fn default_departments() -> Vec<DepartmentKeywords> {
    vec![
        DepartmentKeywords::new(
            "RH",
            &[
                "férias",
                "ferias",
                "benefício",
                "beneficios",
                "salário",
                "salario",
                "home office",
                "remoto",
                "folga",
                "licença",
                "licenca",
                "ponto",
            ],
        ),
        DepartmentKeywords::new(
            "TI",
            &[
                "vpn",
                "senha",
                "acesso",
                "login",
                "sistema",
                "email",
                "computador",
                "rede",
                "segurança",
                "seguranca",
            ],
        ),
    ]
}

/// Maps a free-text query to at most one department.
///
/// Departments are tried in table order and the first one with a keyword
/// contained in the lower-cased query wins.
#[derive(Debug, Clone)]
pub struct DepartmentClassifier {
    table: Vec<DepartmentKeywords>,
}

impl Default for DepartmentClassifier {
    fn default() -> Self {
        Self::new(default_departments())
    }
}

impl DepartmentClassifier {
    pub fn new(table: Vec<DepartmentKeywords>) -> Self {
        let table = table
            .into_iter()
            .map(|entry| DepartmentKeywords {
                department: entry.department,
                keywords: entry
                    .keywords
                    .iter()
                    .map(|k| k.trim().to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect(),
            })
            .collect();
        Self { table }
    }

    pub fn departments(&self) -> impl Iterator<Item = &Department> {
        self.table.iter().map(|entry| &entry.department)
    }

    pub fn classify(&self, query: &str) -> Option<Department> {
        let query = query.to_lowercase();

        self.table
            .iter()
            .find(|entry| entry.keywords.iter().any(|k| query.contains(k.as_str())))
            .map(|entry| entry.department.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_ti() {
        let classifier = DepartmentClassifier::default();
        assert_eq!(
            classifier.classify("Como configuro a VPN?"),
            Some(Department::new("TI"))
        );
        assert_eq!(
            classifier.classify("Esqueci minha SENHA"),
            Some(Department::new("TI"))
        );
    }

    #[test]
    fn test_classify_rh() {
        let classifier = DepartmentClassifier::default();
        assert_eq!(
            classifier.classify("Quantos dias de férias eu tenho?"),
            Some(Department::new("RH"))
        );
        assert_eq!(
            classifier.classify("Posso trabalhar em Home Office?"),
            Some(Department::new("RH"))
        );
    }

    #[test]
    fn test_multi_department_resolves_by_priority() {
        let classifier = DepartmentClassifier::default();
        assert_eq!(
            classifier.classify("Preciso de acesso à VPN durante as férias"),
            Some(Department::new("RH"))
        );
    }

    #[test]
    fn test_no_match() {
        let classifier = DepartmentClassifier::default();
        assert_eq!(classifier.classify("Qual o horário do refeitório?"), None);
        assert_eq!(classifier.classify(""), None);
    }

    #[test]
    fn test_substring_match() {
        let classifier = DepartmentClassifier::default();
        // "apontamento" contains "ponto"
        assert_eq!(
            classifier.classify("Como faço o apontamento de horas?"),
            Some(Department::new("RH"))
        );
    }

    #[test]
    fn test_custom_table_is_normalized() {
        let classifier = DepartmentClassifier::new(vec![
            DepartmentKeywords::new("fin", &[" Reembolso ", ""]),
            DepartmentKeywords::new("ti", &["vpn"]),
        ]);

        assert_eq!(
            classifier.classify("reembolso de viagem"),
            Some(Department::new("FIN"))
        );
        assert_eq!(classifier.classify("vpn"), Some(Department::new("TI")));
        assert_eq!(classifier.classify("qualquer coisa"), None);
        assert_eq!(classifier.departments().count(), 2);
    }
}
