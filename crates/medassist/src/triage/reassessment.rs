use super::error::TriageError;

pub const ORIGINAL_SITUATION_HEADER: &str = "--- Original Situation ---";
pub const FOLLOW_UP_HEADER: &str = "--- Follow-up Information Provided by User ---";

/// Fold a follow-up answer into the prior situation text. The prior text is kept verbatim
/// as the first segment so nothing said in an earlier round is lost.
pub fn merge_follow_up(prior: &str, answer: &str) -> Result<String, TriageError> {
    if answer.trim().is_empty() {
        return Err(TriageError::EmptyFollowUp);
    }

    Ok(format!(
        "{ORIGINAL_SITUATION_HEADER}\n{prior}\n\n{FOLLOW_UP_HEADER}\n{answer}"
    ))
}

/// Pair outstanding questions with the user's answers. Unanswered questions are skipped and
/// answers beyond the last question are kept as free text.
pub fn compose_answers(questions: &[String], answers: &[String]) -> String {
    answers
        .iter()
        .enumerate()
        .filter(|(_, answer)| !answer.trim().is_empty())
        .map(|(index, answer)| match questions.get(index) {
            Some(question) => format!("Q: {}\nA: {}", question.trim(), answer.trim()),
            None => answer.trim().to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
