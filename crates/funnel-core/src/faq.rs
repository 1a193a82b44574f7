//! FAQ accordion: at most one entry open at a time.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
}

pub fn default_entries() -> Vec<FaqEntry> {
    vec![
        FaqEntry {
            question: "O acesso é anônimo?".into(),
            answer: "Sim. A fatura do cartão virá com um nome genérico (\"PAYT\" ou \"HOTM\") e o material é digital, enviado diretamente para o seu e-mail.".into(),
        },
        FaqEntry {
            question: "Serve para homens ou mulheres?".into(),
            answer: "O padrão predatório é comportamental e humano, independente de gênero. O guia serve para identificar manipulação em qualquer relacionamento.".into(),
        },
        FaqEntry {
            question: "Como recebo o acesso?".into(),
            answer: "Imediatamente após a confirmação do pagamento, você recebe um e-mail com o link para baixar o Dossiê e os áudios complementares.".into(),
        },
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaqAccordion {
    entries: Vec<FaqEntry>,
    open: Option<usize>,
}

impl FaqAccordion {
    pub fn new(entries: Vec<FaqEntry>) -> Self {
        Self {
            entries,
            open: None,
        }
    }

    pub fn entries(&self) -> &[FaqEntry] {
        &self.entries
    }

    pub fn open_index(&self) -> Option<usize> {
        self.open
    }

    /// Open `index`, or close it if it is already open.
    pub fn toggle(&mut self, index: usize) -> Result<Option<usize>, ValidationError> {
        if index >= self.entries.len() {
            return Err(ValidationError::OutOfBounds {
                collection: "faq".into(),
                index,
                len: self.entries.len(),
            });
        }
        self.open = if self.open == Some(index) {
            None
        } else {
            Some(index)
        };
        Ok(self.open)
    }
}
