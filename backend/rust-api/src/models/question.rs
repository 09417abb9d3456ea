use serde::{Deserialize, Serialize};

fn default_points() -> u32 {
    10
}

fn default_time_limit() -> u32 {
    30
}

fn default_shuffled() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    MultipleChoiceImage,
    ErrorSpotting,
    #[serde(alias = "context_response")]
    ContextResponses,
    MiniDialogue,
    PhraseCompletion,
    IdiomInterpretation,
    #[serde(alias = "cultural_nuance")]
    CulturalNuances,
    NewsHeadline,
    DebateStyle,
    ComplexRephrasing,
    AudioRecognition,
    BasicVocab,
    SimpleSentences,
    FillBlank,
    GrammarApplication,
    SentenceConstruction,
    Matching,
    WordMatching,
    #[serde(other)]
    Unknown,
}

/// Comparison rule applied to a question type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerFamily {
    ExactChoice,
    FreeText,
    SentenceConstruction,
    Matching,
    Unsupported,
}

impl AnswerFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerFamily::ExactChoice => "exact_choice",
            AnswerFamily::FreeText => "free_text",
            AnswerFamily::SentenceConstruction => "sentence_construction",
            AnswerFamily::Matching => "matching",
            AnswerFamily::Unsupported => "unsupported",
        }
    }
}

impl QuestionType {
    pub fn family(&self) -> AnswerFamily {
        match self {
            QuestionType::MultipleChoice
            | QuestionType::MultipleChoiceImage
            | QuestionType::ErrorSpotting
            | QuestionType::ContextResponses
            | QuestionType::MiniDialogue
            | QuestionType::PhraseCompletion
            | QuestionType::IdiomInterpretation
            | QuestionType::CulturalNuances
            | QuestionType::NewsHeadline
            | QuestionType::DebateStyle
            | QuestionType::ComplexRephrasing
            | QuestionType::AudioRecognition
            | QuestionType::BasicVocab
            | QuestionType::SimpleSentences => AnswerFamily::ExactChoice,
            QuestionType::FillBlank | QuestionType::GrammarApplication => AnswerFamily::FreeText,
            QuestionType::SentenceConstruction => AnswerFamily::SentenceConstruction,
            QuestionType::Matching | QuestionType::WordMatching => AnswerFamily::Matching,
            QuestionType::Unknown => AnswerFamily::Unsupported,
        }
    }

    /// Types whose explanation is shown next to the result.
    pub fn shows_explanation(&self) -> bool {
        matches!(
            self,
            QuestionType::ErrorSpotting
                | QuestionType::IdiomInterpretation
                | QuestionType::CulturalNuances
        )
    }
}

/// One left/right pair of a matching question. Stored as a two-element
/// array in catalog files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct MatchPair {
    pub left: String,
    pub right: String,
}

impl MatchPair {
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }

    pub fn display(&self) -> String {
        format!("{} → {}", self.left, self.right)
    }
}

impl From<(String, String)> for MatchPair {
    fn from((left, right): (String, String)) -> Self {
        Self { left, right }
    }
}

impl From<MatchPair> for (String, String) {
    fn from(pair: MatchPair) -> Self {
        (pair.left, pair.right)
    }
}

pub fn format_pairs(pairs: &[MatchPair]) -> String {
    pairs
        .iter()
        .map(MatchPair::display)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuestionPayload {
    Choice {
        options: Vec<String>,
        answer: String,
        explanation: Option<String>,
        audio_file: Option<String>,
    },
    Text {
        answer: String,
        hint: Option<String>,
    },
    Matching {
        pairs: Vec<MatchPair>,
        shuffled: bool,
    },
    Construction {
        words: Vec<String>,
        answer: String,
    },
    Opaque {
        answer: Option<String>,
    },
}

/// Immutable catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "QuestionRecord")]
pub struct Question {
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub prompt: String,
    pub payload: QuestionPayload,
    pub points: u32,
    pub time_limit_seconds: u32,
}

/// Flat on-disk shape of a catalog question.
#[derive(Debug, Deserialize)]
struct QuestionRecord {
    #[serde(rename = "type")]
    question_type: QuestionType,
    #[serde(alias = "prompt")]
    question: String,
    #[serde(default)]
    options: Vec<String>,
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    hint: Option<String>,
    #[serde(default)]
    explanation: Option<String>,
    #[serde(default)]
    audio_file: Option<String>,
    #[serde(default)]
    pairs: Vec<MatchPair>,
    #[serde(default = "default_shuffled")]
    shuffled: bool,
    #[serde(default)]
    words: Vec<String>,
    #[serde(default = "default_points")]
    points: u32,
    #[serde(default = "default_time_limit", alias = "time_limit_seconds")]
    time_limit: u32,
}

impl TryFrom<QuestionRecord> for Question {
    type Error = String;

    fn try_from(record: QuestionRecord) -> Result<Self, Self::Error> {
        let require_answer = |answer: Option<String>| {
            answer.ok_or_else(|| {
                format!(
                    "Question '{}' of type {:?} has no answer",
                    record.question, record.question_type
                )
            })
        };

        let payload = match record.question_type.family() {
            AnswerFamily::ExactChoice => {
                if record.options.is_empty() {
                    return Err(format!("Question '{}' has no options", record.question));
                }
                QuestionPayload::Choice {
                    options: record.options,
                    answer: require_answer(record.answer)?,
                    explanation: record.explanation,
                    audio_file: record.audio_file,
                }
            }
            AnswerFamily::FreeText => QuestionPayload::Text {
                answer: require_answer(record.answer)?,
                hint: record.hint,
            },
            AnswerFamily::SentenceConstruction => QuestionPayload::Construction {
                words: record.words,
                answer: require_answer(record.answer)?,
            },
            AnswerFamily::Matching => {
                if record.pairs.is_empty() {
                    return Err(format!(
                        "Matching question '{}' has no pairs",
                        record.question
                    ));
                }
                QuestionPayload::Matching {
                    pairs: record.pairs,
                    shuffled: record.shuffled,
                }
            }
            AnswerFamily::Unsupported => QuestionPayload::Opaque {
                answer: record.answer,
            },
        };

        Ok(Question {
            question_type: record.question_type,
            prompt: record.question,
            payload,
            points: record.points,
            time_limit_seconds: record.time_limit,
        })
    }
}

/// A question as handed to the learner, carrying everything needed to
/// capture a [`Submission`] without going back to the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderedQuestion {
    pub number: usize,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub prompt: String,
    pub points: u32,
    pub time_limit_seconds: u32,
    pub correct_answer: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_file: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub words: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matching: Option<MatchingPayload>,
}

/// A full quiz ready to be taken.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderedQuiz {
    pub language: String,
    pub difficulty: super::Difficulty,
    pub questions: Vec<RenderedQuestion>,
}

/// Auxiliary data for matching questions: item lists in rendered order and
/// the correct pairs by item text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingPayload {
    #[serde(default)]
    pub left_items: Vec<String>,
    #[serde(default)]
    pub right_items: Vec<String>,
    #[serde(default)]
    pub pairs: Vec<MatchPair>,
    /// Hidden pre-formatted answer used for display when the rest is missing.
    #[serde(default)]
    pub expected_answer: Option<String>,
}

impl MatchingPayload {
    pub fn is_complete(&self) -> bool {
        !self.left_items.is_empty() && !self.right_items.is_empty() && !self.pairs.is_empty()
    }
}

/// One learner response, with the question data captured at render time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub question_type: QuestionType,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub elapsed_seconds: u32,
    #[serde(default)]
    pub correct_answer: String,
    #[serde(default)]
    pub matching: Option<MatchingPayload>,
}

impl Submission {
    pub fn new(
        question_type: QuestionType,
        answer: impl Into<String>,
        correct_answer: impl Into<String>,
        elapsed_seconds: u32,
    ) -> Self {
        Self {
            question_type,
            prompt: String::new(),
            answer: answer.into(),
            elapsed_seconds,
            correct_answer: correct_answer.into(),
            matching: None,
        }
    }

    pub fn capture(question: &RenderedQuestion, answer: impl Into<String>, elapsed_seconds: u32) -> Self {
        Self {
            question_type: question.question_type,
            prompt: question.prompt.clone(),
            answer: answer.into(),
            elapsed_seconds,
            correct_answer: question.correct_answer.clone(),
            matching: question.matching.clone(),
        }
    }

    pub fn with_matching(mut self, matching: MatchingPayload) -> Self {
        self.matching = Some(matching);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_correct: bool,
    pub normalized_user_answer: String,
    pub normalized_correct_answer: String,
}
