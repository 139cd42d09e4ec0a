use crate::llm::TextGenerator;
use anyhow::Result;
use std::sync::Arc;

/// Instruction template for the generator. The challenge text is
/// deliberately obfuscated by the platform; the generator does the
/// extraction and arithmetic, we only normalize its output.
const SOLVE_TEMPLATE: &str = "Solve this math problem. The text is intentionally obfuscated \
with random characters and case changes.\n\
Extract the math problem and solve it.\n\
Return ONLY the numeric answer with 2 decimal places (e.g., '525.00').\n\n\
Challenge: ";

/// Solves platform verification challenges. Both challenge sources (the
/// inline post response and the polled pending-post list) go through this
/// one solver, so the answer normalization is identical for both.
pub struct ChallengeSolver {
    generator: Arc<dyn TextGenerator>,
}

impl ChallengeSolver {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    pub async fn solve(&self, challenge: &str) -> Result<String> {
        let raw = self
            .generator
            .generate(&format!("{SOLVE_TEMPLATE}{challenge}"))
            .await?;
        normalize_answer(&raw)
            .ok_or_else(|| anyhow::anyhow!("generator produced no numeric answer: {raw:?}"))
    }
}

/// Normalize a generator reply into the platform's expected answer format:
/// strip everything but digits and dots, then pad to two decimal places.
/// Returns `None` when nothing numeric remains.
pub fn normalize_answer(raw: &str) -> Option<String> {
    let stripped: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    if !stripped.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    Some(match stripped.split_once('.') {
        None => format!("{stripped}.00"),
        Some((_, frac)) if frac.len() == 1 => format!("{stripped}0"),
        Some(_) => stripped,
    })
}
