use serde::{Deserialize, Serialize};

/// One question and its answer from a review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

/// A structured review record, written as one JSON line
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub author: Vec<String>,
    pub company_size: Vec<String>,
    pub role: Vec<String>,
    pub date: Vec<String>,
    pub qa_pairs: Vec<QaPair>,
}

impl Record {
    /// Builds a record, pairing questions and answers positionally
    ///
    /// See [`pair_up`] for the mismatch policy.
    pub fn new(
        author: Vec<String>,
        company_size: Vec<String>,
        role: Vec<String>,
        date: Vec<String>,
        questions: Vec<String>,
        answers: Vec<String>,
    ) -> Self {
        Self {
            author,
            company_size,
            role,
            date,
            qa_pairs: pair_up(questions, answers),
        }
    }

    /// Returns true if no field carries any value
    pub fn is_empty(&self) -> bool {
        self.author.is_empty()
            && self.company_size.is_empty()
            && self.role.is_empty()
            && self.date.is_empty()
            && self.qa_pairs.is_empty()
    }
}

/// Pairs questions with answers by position
///
/// When the counts differ the shorter length wins and the surplus entries on
/// the longer side are dropped.
pub fn pair_up(questions: Vec<String>, answers: Vec<String>) -> Vec<QaPair> {
    if questions.len() != answers.len() {
        tracing::debug!(
            questions = questions.len(),
            answers = answers.len(),
            dropped = questions.len().abs_diff(answers.len()),
            "Question/answer counts differ; dropping unpaired entries"
        );
    }

    questions
        .into_iter()
        .zip(answers)
        .map(|(question, answer)| QaPair { question, answer })
        .collect()
}
