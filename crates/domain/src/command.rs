use reposignal_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Trigger token that opens every recognized command line.
pub const COMMAND_TRIGGER: &str = "/reposignal";

/// Issue difficulty on the 1-5 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Difficulty(u8);

impl Difficulty {
    /// Creates a validated difficulty value.
    pub fn new(value: u8) -> AppResult<Self> {
        if !(1..=5).contains(&value) {
            return Err(AppError::Validation(
                "difficulty must be between 1 and 5".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the numeric value.
    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

/// Contributor rating on the 1-5 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rating(u8);

impl Rating {
    /// Creates a validated rating value.
    pub fn new(value: u8) -> AppResult<Self> {
        if !(1..=5).contains(&value) {
            return Err(AppError::Validation(
                "rating must be between 1 and 5".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the numeric value.
    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

/// Issue classification type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueType {
    /// Documentation work.
    Docs,
    /// Defect report.
    Bug,
    /// New functionality.
    Feature,
    /// Restructuring without behavior change.
    Refactor,
    /// Test-only work.
    Test,
    /// Build, CI, or environment work.
    Infra,
}

impl IssueType {
    /// Parses a type name case-insensitively; unknown names are non-matches.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "docs" => Some(Self::Docs),
            "bug" => Some(Self::Bug),
            "feature" => Some(Self::Feature),
            "refactor" => Some(Self::Refactor),
            "test" => Some(Self::Test),
            "infra" => Some(Self::Infra),
            _ => None,
        }
    }

    /// Returns the stable lowercase wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Docs => "docs",
            Self::Bug => "bug",
            Self::Feature => "feature",
            Self::Refactor => "refactor",
            Self::Test => "test",
            Self::Infra => "infra",
        }
    }
}

/// One parsed command; payload only, no identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Sets the issue difficulty field.
    SetDifficulty(Difficulty),
    /// Sets the issue type field.
    SetType(IssueType),
    /// Hides the issue.
    Hide,
    /// Rates the difficulty of a merged pull request.
    RateDifficulty(Rating),
    /// Rates maintainer responsiveness on a merged pull request.
    RateResponsiveness(Rating),
}

/// One contributor rate command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateCommand {
    /// Difficulty rating.
    Difficulty(Rating),
    /// Responsiveness rating.
    Responsiveness(Rating),
}

/// Merged classification fields from one comment; last occurrence wins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassificationBatch {
    difficulty: Option<Difficulty>,
    issue_type: Option<IssueType>,
    hide: bool,
}

impl ClassificationBatch {
    /// Returns the difficulty to set, when present.
    #[must_use]
    pub fn difficulty(&self) -> Option<Difficulty> {
        self.difficulty
    }

    /// Returns the issue type to set, when present.
    #[must_use]
    pub fn issue_type(&self) -> Option<IssueType> {
        self.issue_type
    }

    /// Returns whether the issue should be hidden.
    #[must_use]
    pub fn hide(&self) -> bool {
        self.hide
    }

    /// Returns true when no classification field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.difficulty.is_none() && self.issue_type.is_none() && !self.hide
    }
}

/// Parse result for one comment: one merged classification batch plus the
/// ordered rate commands, each of which dispatches on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandBatch {
    classification: ClassificationBatch,
    ratings: Vec<RateCommand>,
}

impl CommandBatch {
    /// Parses a comment body into a batch.
    #[must_use]
    pub fn parse(body: &str) -> Self {
        Self::from_commands(parse_comment(body))
    }

    /// Merges individual commands into a batch.
    #[must_use]
    pub fn from_commands(commands: impl IntoIterator<Item = Command>) -> Self {
        let mut batch = Self::default();
        for command in commands {
            match command {
                Command::SetDifficulty(value) => batch.classification.difficulty = Some(value),
                Command::SetType(value) => batch.classification.issue_type = Some(value),
                Command::Hide => batch.classification.hide = true,
                Command::RateDifficulty(value) => {
                    batch.ratings.push(RateCommand::Difficulty(value));
                }
                Command::RateResponsiveness(value) => {
                    batch.ratings.push(RateCommand::Responsiveness(value));
                }
            }
        }

        batch
    }

    /// Returns the classification batch when any field is set.
    #[must_use]
    pub fn classification(&self) -> Option<&ClassificationBatch> {
        (!self.classification.is_empty()).then_some(&self.classification)
    }

    /// Returns the rate commands in comment order.
    #[must_use]
    pub fn ratings(&self) -> &[RateCommand] {
        self.ratings.as_slice()
    }

    /// Returns true when the comment carried no recognized command.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classification.is_empty() && self.ratings.is_empty()
    }
}

/// Scans a comment body line by line and returns every recognized command.
///
/// A line matches only when it starts with the trigger token followed by a
/// sub-token and a typed argument. Keywords are case-insensitive; argument
/// domain violations and trailing tokens make the line a non-match, never an
/// error.
#[must_use]
pub fn parse_comment(body: &str) -> Vec<Command> {
    body.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<Command> {
    let mut tokens = line.split_whitespace();
    if !tokens.next()?.eq_ignore_ascii_case(COMMAND_TRIGGER) {
        return None;
    }

    let keyword = tokens.next()?.to_ascii_lowercase();
    let command = match keyword.as_str() {
        "difficulty" => Command::SetDifficulty(Difficulty::new(parse_scale(tokens.next()?)?).ok()?),
        "type" => Command::SetType(IssueType::parse(tokens.next()?)?),
        "hide" => Command::Hide,
        "rate" => {
            let subject = tokens.next()?.to_ascii_lowercase();
            let value = Rating::new(parse_scale(tokens.next()?)?).ok()?;
            match subject.as_str() {
                "difficulty" => Command::RateDifficulty(value),
                "responsiveness" => Command::RateResponsiveness(value),
                _ => return None,
            }
        }
        _ => return None,
    };

    tokens.next().is_none().then_some(command)
}

fn parse_scale(token: &str) -> Option<u8> {
    token.parse().ok()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{Command, CommandBatch, Difficulty, IssueType, RateCommand, Rating, parse_comment};

    #[test]
    fn text_without_trigger_yields_nothing() {
        assert!(parse_comment("just a regular review comment").is_empty());
        assert!(parse_comment("difficulty 3 without the trigger").is_empty());
        assert!(parse_comment("").is_empty());
    }

    #[test]
    fn trigger_alone_is_a_non_match() {
        assert!(parse_comment("/reposignal").is_empty());
        assert!(parse_comment("/reposignal unknowncommand").is_empty());
    }

    #[test]
    fn difficulty_command_parses_in_range_values() {
        let commands = parse_comment("/reposignal difficulty 3");
        assert_eq!(
            commands,
            vec![Command::SetDifficulty(
                Difficulty::new(3).unwrap_or_else(|_| unreachable!())
            )]
        );
    }

    #[test]
    fn out_of_range_arguments_are_non_matches() {
        assert!(parse_comment("/reposignal difficulty 0").is_empty());
        assert!(parse_comment("/reposignal difficulty 6").is_empty());
        assert!(parse_comment("/reposignal rate difficulty 99").is_empty());
        assert!(parse_comment("/reposignal difficulty three").is_empty());
    }

    #[test]
    fn keywords_match_case_insensitively() {
        let commands = parse_comment("/REPOSIGNAL TYPE Bug");
        assert_eq!(commands, vec![Command::SetType(IssueType::Bug)]);

        let commands = parse_comment("/reposignal Rate Responsiveness 5");
        assert_eq!(commands.len(), 1);
    }

    #[test]
    fn hide_rejects_trailing_tokens() {
        assert_eq!(parse_comment("/reposignal hide"), vec![Command::Hide]);
        assert!(parse_comment("/reposignal hide now").is_empty());
    }

    #[test]
    fn one_comment_can_carry_multiple_commands() {
        let body = "/reposignal difficulty 3\nsome prose in between\n/reposignal type bug\n/reposignal hide";
        let batch = CommandBatch::parse(body);
        let classification = batch.classification();
        assert!(classification.is_some_and(|batch| {
            batch.difficulty().map(Difficulty::value) == Some(3)
                && batch.issue_type() == Some(IssueType::Bug)
                && batch.hide()
        }));
        assert!(batch.ratings().is_empty());
    }

    #[test]
    fn duplicate_classification_fields_last_wins() {
        let batch = CommandBatch::parse("/reposignal difficulty 2\n/reposignal difficulty 4");
        let difficulty = batch
            .classification()
            .and_then(|classification| classification.difficulty());
        assert_eq!(difficulty.map(Difficulty::value), Some(4));
    }

    #[test]
    fn rate_commands_stay_separate() {
        let batch =
            CommandBatch::parse("/reposignal rate difficulty 4\n/reposignal rate responsiveness 2");
        assert_eq!(batch.ratings().len(), 2);
        assert!(matches!(batch.ratings()[0], RateCommand::Difficulty(_)));
        assert!(matches!(
            batch.ratings()[1],
            RateCommand::Responsiveness(_)
        ));
        assert!(batch.classification().is_none());
    }

    #[test]
    fn mixed_lines_yield_only_matching_commands() {
        let body = "thanks for the report!\n/reposignal type docs\n/reposignal type unknown\n/reposignal hide please";
        let commands = parse_comment(body);
        assert_eq!(commands, vec![Command::SetType(IssueType::Docs)]);
    }

    #[test]
    fn issue_type_parses_all_six_names() {
        for (name, expected) in [
            ("docs", IssueType::Docs),
            ("bug", IssueType::Bug),
            ("feature", IssueType::Feature),
            ("refactor", IssueType::Refactor),
            ("test", IssueType::Test),
            ("infra", IssueType::Infra),
        ] {
            assert_eq!(IssueType::parse(name), Some(expected));
            assert_eq!(expected.as_str(), name);
        }
        assert_eq!(IssueType::parse("enhancement"), None);
    }

    proptest! {
        #[test]
        fn every_in_range_scale_value_parses(value in 1u8..=5) {
            let commands = parse_comment(&format!("/reposignal difficulty {value}"));
            prop_assert_eq!(commands.len(), 1);

            let commands = parse_comment(&format!("/reposignal rate responsiveness {value}"));
            prop_assert_eq!(commands.len(), 1);
        }

        #[test]
        fn every_out_of_range_integer_is_a_non_match(value in proptest::num::i64::ANY) {
            prop_assume!(!(1..=5).contains(&value));
            let commands = parse_comment(&format!("/reposignal difficulty {value}"));
            prop_assert!(commands.is_empty());
        }

        #[test]
        fn arbitrary_text_never_panics(body in ".*") {
            let _ = parse_comment(&body);
        }
    }

    #[test]
    fn scale_constructors_validate_bounds() {
        assert!(Difficulty::new(0).is_err());
        assert!(Difficulty::new(6).is_err());
        assert!(Rating::new(5).is_ok());
    }
}
