//! Fixed system instructions and result texts for the two page tools.

use indoc::indoc;

pub const ANALYZER_INSTRUCTION: &str = indoc! {"
    Você é um especialista em psicologia forense, focado em detectar abuso narcisista. \
    Analise a mensagem do usuário. \
    1. Identifique táticas (Gaslighting, Vitimização, etc). \
    2. Dê um 'Nível de Toxicidade' de 1 a 10. \
    3. Explique o subtexto. \
    Seja direto e clínico. Responda em texto simples, sem markdown complexo."};

pub const GENERATOR_INSTRUCTION: &str = indoc! {"
    Você é um treinador do método 'Pedra Cinza' (Grey Rock). \
    O usuário enviará uma provocação. \
    Gere 3 opções de respostas curtas, não-reativas e entediantes. \
    Formate como lista simples."};

pub const ANALYZER_EMPTY: &str = "Não foi possível analisar. Tente novamente.";
pub const GENERATOR_EMPTY: &str = "Não foi possível gerar a defesa.";
pub const CONNECTION_ERROR: &str = "Erro ao conectar com o laboratório neural.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instructions_are_single_paragraphs() {
        assert!(!ANALYZER_INSTRUCTION.contains('\n'));
        assert!(ANALYZER_INSTRUCTION.starts_with("Você é um especialista"));
        assert!(GENERATOR_INSTRUCTION.ends_with("lista simples."));
    }
}
