//! Built-in document templates
//!
//! Each template is an ordered list of questions plus a body with
//! `{{placeholder}}` slots filled from the answers and the deal record.

use serde::Serialize;

/// One question asked while gathering
#[derive(Debug, Clone, Serialize)]
pub struct Question {
    /// Answer key in `gatheredAnswers` and placeholder name in the body
    pub key: &'static str,
    /// Short label used in the recap
    pub label: &'static str,
    pub prompt: &'static str,
    /// Canned answers offered as quick options
    pub suggestions: &'static [&'static str],
    /// Deal field that can prefill this answer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deal_field: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub questions: Vec<Question>,
    #[serde(skip)]
    pub body: &'static str,
}

impl DocumentTemplate {
    pub fn question_keys(&self) -> Vec<&'static str> {
        self.questions.iter().map(|q| q.key).collect()
    }

    /// Whether `input` names this template by id or display name
    fn matches(&self, input: &str) -> bool {
        let wanted = normalize(input);
        !wanted.is_empty() && (wanted == normalize(self.id) || wanted == normalize(self.name))
    }
}

fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// The set of templates the assistant can produce
#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    templates: Vec<DocumentTemplate>,
}

impl TemplateCatalog {
    pub fn new(templates: Vec<DocumentTemplate>) -> Self {
        Self { templates }
    }

    pub fn builtin() -> Self {
        Self::new(vec![nda(), letter_of_intent(), exclusivity()])
    }

    pub fn templates(&self) -> &[DocumentTemplate] {
        &self.templates
    }

    pub fn get(&self, id: &str) -> Option<&DocumentTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    /// Resolve free user input to a template
    pub fn find(&self, input: &str) -> Option<&DocumentTemplate> {
        self.templates.iter().find(|t| t.matches(input))
    }
}

impl Default for TemplateCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn nda() -> DocumentTemplate {
    DocumentTemplate {
        id: "nda",
        name: "Non-Disclosure Agreement",
        description: "Mutual confidentiality agreement before sharing deal information",
        questions: vec![
            Question {
                key: "disclosing_party",
                label: "Disclosing party",
                prompt: "Who is the disclosing party (usually the business being sold)?",
                suggestions: &[],
                deal_field: Some("business_name"),
            },
            Question {
                key: "receiving_party",
                label: "Receiving party",
                prompt: "Who is receiving the confidential information?",
                suggestions: &[],
                deal_field: Some("counterparty_name"),
            },
            Question {
                key: "term",
                label: "Confidentiality term",
                prompt: "How long should the confidentiality obligations last?",
                suggestions: &["1 year", "2 years", "3 years"],
                deal_field: None,
            },
            Question {
                key: "governing_law",
                label: "Governing law",
                prompt: "Which jurisdiction's law should govern the agreement?",
                suggestions: &["England and Wales", "Delaware", "New York"],
                deal_field: None,
            },
        ],
        body: "MUTUAL NON-DISCLOSURE AGREEMENT\n\n\
Date: {{date}}\n\n\
This agreement is made between {{disclosing_party}} (the \"Disclosing Party\") and \
{{receiving_party}} (the \"Receiving Party\") in connection with the proposed transaction \
concerning {{business_name}}.\n\n\
1. Confidential Information. All financial, commercial and operational information \
disclosed about {{business_name}} is confidential.\n\n\
2. Obligations. The Receiving Party shall use Confidential Information solely to evaluate \
the proposed transaction and shall not disclose it to any third party.\n\n\
3. Term. These obligations continue for {{term}} from the date above.\n\n\
4. Governing Law. This agreement is governed by the laws of {{governing_law}}.\n",
    }
}

fn letter_of_intent() -> DocumentTemplate {
    DocumentTemplate {
        id: "loi",
        name: "Letter of Intent",
        description: "Non-binding summary of the proposed purchase terms",
        questions: vec![
            Question {
                key: "buyer",
                label: "Buyer",
                prompt: "Who is the prospective buyer?",
                suggestions: &[],
                deal_field: Some("counterparty_name"),
            },
            Question {
                key: "purchase_price",
                label: "Purchase price",
                prompt: "What purchase price is being offered?",
                suggestions: &[],
                deal_field: Some("asking_price"),
            },
            Question {
                key: "structure",
                label: "Deal structure",
                prompt: "Is this an asset purchase or a share purchase?",
                suggestions: &["Asset purchase", "Share purchase"],
                deal_field: None,
            },
            Question {
                key: "closing_date",
                label: "Target closing date",
                prompt: "When should the transaction close?",
                suggestions: &[],
                deal_field: None,
            },
        ],
        body: "LETTER OF INTENT\n\n\
Date: {{date}}\n\n\
Re: Proposed acquisition of {{business_name}}\n\n\
{{buyer}} (the \"Buyer\") sets out below the principal terms on which it proposes to \
acquire {{business_name}}.\n\n\
1. Price. The purchase price is {{purchase_price}}, subject to due diligence.\n\n\
2. Structure. The transaction will be structured as a {{structure}}.\n\n\
3. Timing. The parties intend to complete the transaction by {{closing_date}}.\n\n\
4. Non-binding. Except for confidentiality, this letter is not legally binding.\n",
    }
}

fn exclusivity() -> DocumentTemplate {
    DocumentTemplate {
        id: "exclusivity",
        name: "Exclusivity Agreement",
        description: "Seller agrees not to negotiate with other buyers for a period",
        questions: vec![
            Question {
                key: "buyer",
                label: "Buyer",
                prompt: "Which buyer is being granted exclusivity?",
                suggestions: &[],
                deal_field: Some("counterparty_name"),
            },
            Question {
                key: "period",
                label: "Exclusivity period",
                prompt: "How long should the exclusivity period run?",
                suggestions: &["30 days", "60 days", "90 days"],
                deal_field: None,
            },
        ],
        body: "EXCLUSIVITY AGREEMENT\n\n\
Date: {{date}}\n\n\
In consideration of {{buyer}} incurring costs in evaluating {{business_name}}, the seller \
agrees that for {{period}} from the date above it will not solicit, negotiate or accept \
any offer for {{business_name}} from any other party.\n",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_by_id_or_name() {
        let catalog = TemplateCatalog::builtin();
        assert_eq!(catalog.find("nda").map(|t| t.id), Some("nda"));
        assert_eq!(catalog.find("NDA").map(|t| t.id), Some("nda"));
        assert_eq!(catalog.find("letter of intent").map(|t| t.id), Some("loi"));
        assert_eq!(
            catalog.find("  Exclusivity-Agreement ").map(|t| t.id),
            Some("exclusivity")
        );
        assert!(catalog.find("start").is_none());
        assert!(catalog.find("").is_none());
    }

    #[test]
    fn test_builtin_question_keys_are_unique() {
        for template in TemplateCatalog::builtin().templates() {
            let mut keys = template.question_keys();
            let len = keys.len();
            keys.sort_unstable();
            keys.dedup();
            assert_eq!(keys.len(), len, "duplicate key in {}", template.id);
        }
    }

    #[test]
    fn test_builtin_bodies_reference_every_question() {
        for template in TemplateCatalog::builtin().templates() {
            for key in template.question_keys() {
                assert!(
                    template.body.contains(&format!("{{{{{key}}}}}")),
                    "{} body never uses {key}",
                    template.id
                );
            }
        }
    }
}
