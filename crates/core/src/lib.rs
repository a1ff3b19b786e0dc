pub mod coordinator;
pub mod error;
pub mod fetch;
pub mod formatters;
pub mod matcher;
pub mod model;
pub mod parse;
pub mod preprocess;
pub mod question;
pub mod report;
pub mod session;
pub mod transport;

pub use coordinator::{
    AbortOutcome, BatchCoordinator, BatchJob, CoordinatorConfig, CoordinatorConfigBuilder, UrlSubmission,
    WELCOME_MESSAGE,
};
pub use error::{FetchError, QuizError, Result, SessionError};
pub use fetch::{FetchConfig, FetchConfigBuilder, FetchedDocument, Fetcher, fetch_file, retry_with_backoff};
#[cfg(feature = "fetch")]
pub use fetch::{HttpFetcher, SourceFetcher};
pub use formatters::{JsonConfig, JsonFormatter, TextConfig, TextFormatter};
pub use formatters::{convert_to_json, format_question, join_blocks};
pub use matcher::{AnswerMatch, MatchKind, find_correct_option, match_answer};
pub use model::{Bucket, ClassifiedResult, ExtractedQuestion, OptionCandidate, classify};
pub use parse::{Document, Element};
#[doc(hidden)]
pub use preprocess::PreprocessConfig;
pub use preprocess::preprocess_html;
pub use question::{ParserConfig, QuestionParser, RawCandidate, parse_questions};
pub use report::{BatchOutcome, BatchReport, BatchState, FailedUrl, MAIN_FILE_NAME, Progress, UNDETECTED_FILE_NAME};
pub use session::{Phase, Session, SessionSnapshot, SessionStore};
pub use transport::{NullTransport, Transport};
