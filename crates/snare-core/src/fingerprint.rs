use crate::model::Question;
use sha2::{Digest, Sha256};

#[derive(Debug, Clone)]
pub struct Fingerprint {
    pub hex: String,
    pub components: Vec<String>,
}

pub fn sha256_hex(s: &str) -> String {
    let mut h = Sha256::new();
    h.update(s.as_bytes());
    hex::encode(h.finalize())
}

/// Computes the deterministic fingerprint for a question under the current
/// judge configuration.
///
/// Any change to the question text, its judge prompt, the global judge
/// system prompt, or the judge model identifier changes the output, which
/// invalidates every stored answer produced under the old configuration.
/// The hex string carries equality semantics only.
pub fn compute(question: &Question, judge_system_prompt: &str, judge_model: &str) -> Fingerprint {
    let mut parts = Vec::new();

    // Identity
    parts.push(format!("question_id={}", question.id));

    // Inputs (exact text match required)
    parts.push(format!("question={}", question.question));
    parts.push(format!("judge_prompt={}", question.judge_prompt));

    // Judge configuration
    parts.push(format!("judge_system_prompt={judge_system_prompt}"));
    parts.push(format!("judge_model={judge_model}"));

    let raw = parts.join("\n");
    let hex = sha256_hex(&raw);

    Fingerprint {
        hex,
        components: parts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question() -> Question {
        Question {
            id: "q1".into(),
            question: "How many r's are in strawberry?".into(),
            judge_prompt: "PASS only if the answer says three.".into(),
            token_limit: None,
        }
    }

    #[test]
    fn deterministic_and_fixed_length() {
        let a = compute(&question(), "You are a strict judge.", "openai/gpt-4o");
        let b = compute(&question(), "You are a strict judge.", "openai/gpt-4o");
        assert_eq!(a.hex, b.hex);
        assert_eq!(a.hex.len(), 64);
    }

    #[test]
    fn sensitive_to_every_input() {
        let base = compute(&question(), "sys", "judge-a").hex;

        let mut q = question();
        q.question.push('!');
        assert_ne!(compute(&q, "sys", "judge-a").hex, base);

        let mut q = question();
        q.judge_prompt.push('!');
        assert_ne!(compute(&q, "sys", "judge-a").hex, base);

        assert_ne!(compute(&question(), "sys2", "judge-a").hex, base);
        assert_ne!(compute(&question(), "sys", "judge-b").hex, base);
    }

    #[test]
    fn token_limit_does_not_affect_hash() {
        let base = compute(&question(), "sys", "judge-a").hex;
        let mut q = question();
        q.token_limit = Some(512);
        assert_eq!(compute(&q, "sys", "judge-a").hex, base);
    }
}
