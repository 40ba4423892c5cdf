use serde::Serialize;

/// One step of a reasoning run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Turn {
    Reasoning {
        text: String,
    },
    ToolCall {
        tool: String,
        query: String,
        observation: String,
    },
    FinalAnswer {
        text: String,
    },
}

/// The question and every turn taken to answer it, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transcript {
    question: String,
    turns: Vec<Turn>,
}

impl Transcript {
    #[must_use]
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            turns: Vec::new(),
        }
    }

    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }

    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    #[must_use]
    pub fn tool_calls(&self) -> usize {
        self.turns
            .iter()
            .filter(|t| matches!(t, Turn::ToolCall { .. }))
            .count()
    }

    #[must_use]
    pub fn final_answer(&self) -> Option<&str> {
        self.turns.iter().rev().find_map(|t| match t {
            Turn::FinalAnswer { text } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Observations returned by `tool`, in call order.
    pub fn observations<'a>(&'a self, tool: &'a str) -> impl Iterator<Item = &'a str> {
        self.turns.iter().filter_map(move |t| match t {
            Turn::ToolCall {
                tool: name,
                observation,
                ..
            } if name == tool => Some(observation.as_str()),
            _ => None,
        })
    }
}
