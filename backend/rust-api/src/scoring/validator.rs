//! Answer validation per question family.
//!
//! Validation never fails: malformed input is scored as incorrect with a
//! best-effort display string.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

use crate::models::question::format_pairs;
use crate::models::{AnswerFamily, MatchingPayload, QuestionType, Submission, ValidationResult};

/// Display sentinel when neither pairs nor an expected answer are known.
/// Informational only, never ground truth.
pub const UNDETERMINED_MATCHES: &str = "Could not determine correct matches";

const NO_ANSWER: &str = "No answer";
const NO_MATCHES: &str = "No matches made";
const INCOMPLETE_MATCHES: &str = "Incomplete matches";

lazy_static! {
    static ref PUNCTUATION: Regex = Regex::new(r"[^\w\s]").expect("valid punctuation regex");
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").expect("valid whitespace regex");
}

pub fn validate(submission: &Submission) -> ValidationResult {
    validate_answer(
        submission.question_type,
        &submission.answer,
        &submission.correct_answer,
        submission.matching.as_ref(),
    )
}

pub fn validate_answer(
    question_type: QuestionType,
    user_answer: &str,
    correct_answer: &str,
    matching: Option<&MatchingPayload>,
) -> ValidationResult {
    match question_type.family() {
        AnswerFamily::ExactChoice => ValidationResult {
            is_correct: !user_answer.is_empty() && user_answer == correct_answer,
            normalized_user_answer: display_answer(user_answer),
            normalized_correct_answer: correct_answer.to_string(),
        },
        AnswerFamily::FreeText => ValidationResult {
            is_correct: text_matches(user_answer, correct_answer, false),
            normalized_user_answer: display_answer(user_answer),
            normalized_correct_answer: correct_answer.to_string(),
        },
        AnswerFamily::SentenceConstruction => ValidationResult {
            is_correct: text_matches(user_answer, correct_answer, true),
            normalized_user_answer: display_answer(user_answer),
            normalized_correct_answer: correct_answer.to_string(),
        },
        AnswerFamily::Matching => validate_matching(user_answer, matching),
        AnswerFamily::Unsupported => ValidationResult {
            is_correct: false,
            normalized_user_answer: display_answer(user_answer),
            normalized_correct_answer: correct_answer.to_string(),
        },
    }
}

fn display_answer(answer: &str) -> String {
    if answer.is_empty() {
        NO_ANSWER.to_string()
    } else {
        answer.to_string()
    }
}

/// Case-insensitive trimmed comparison, retried once with punctuation
/// stripped (and whitespace runs collapsed when `collapse_spaces` is set).
fn text_matches(user_answer: &str, correct_answer: &str, collapse_spaces: bool) -> bool {
    if user_answer.is_empty() || correct_answer.is_empty() {
        return false;
    }

    let user_clean = user_answer.trim().to_lowercase();
    let correct_clean = correct_answer.trim().to_lowercase();
    if user_clean == correct_clean {
        return true;
    }

    let relax = |value: &str| {
        let stripped = PUNCTUATION.replace_all(value, "");
        if collapse_spaces {
            WHITESPACE_RUN.replace_all(&stripped, " ").trim().to_string()
        } else {
            stripped.trim().to_string()
        }
    };

    relax(&user_clean) == relax(&correct_clean)
}

fn fallback_correct_answer(matching: Option<&MatchingPayload>) -> String {
    matching
        .and_then(|payload| payload.expected_answer.as_deref())
        .filter(|expected| !expected.is_empty())
        .unwrap_or(UNDETERMINED_MATCHES)
        .to_string()
}

fn validate_matching(user_answer: &str, matching: Option<&MatchingPayload>) -> ValidationResult {
    let user_answer = user_answer.trim();

    if user_answer.is_empty() {
        let correct = match matching {
            Some(payload) if !payload.pairs.is_empty() => format_pairs(&payload.pairs),
            _ => fallback_correct_answer(matching),
        };
        return ValidationResult {
            is_correct: false,
            normalized_user_answer: NO_MATCHES.to_string(),
            normalized_correct_answer: correct,
        };
    }

    let payload = match matching {
        Some(payload) if payload.is_complete() => payload,
        _ => {
            return ValidationResult {
                is_correct: false,
                normalized_user_answer: INCOMPLETE_MATCHES.to_string(),
                normalized_correct_answer: fallback_correct_answer(matching),
            }
        }
    };

    let mut submitted: HashMap<&str, &str> = HashMap::new();
    let mut shown = Vec::new();

    for token in user_answer.split(',') {
        let Some((left, right)) = token.split_once(':') else {
            continue;
        };
        let (Ok(left), Ok(right)) = (left.trim().parse::<usize>(), right.trim().parse::<usize>())
        else {
            continue;
        };
        let (Some(left_item), Some(right_item)) =
            (payload.left_items.get(left), payload.right_items.get(right))
        else {
            continue;
        };

        submitted.insert(left_item.as_str(), right_item.as_str());
        shown.push(format!("{} → {}", left_item, right_item));
    }

    let matched = payload
        .pairs
        .iter()
        .filter(|pair| submitted.get(pair.left.as_str()) == Some(&pair.right.as_str()))
        .count();
    let is_correct = matched == payload.pairs.len() && submitted.len() == payload.pairs.len();

    ValidationResult {
        is_correct,
        normalized_user_answer: if shown.is_empty() {
            INCOMPLETE_MATCHES.to_string()
        } else {
            shown.join(", ")
        },
        normalized_correct_answer: format_pairs(&payload.pairs),
    }
}
