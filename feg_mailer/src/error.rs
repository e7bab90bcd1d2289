use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("Could not initialize mail client: {0}")]
    Initialization(String),
    #[error("Invalid email: {0}")]
    InvalidEmail(String),
    #[error("Could not reach the mail provider: {0}")]
    RequestError(String),
    #[error("Mail provider rejected the message. Error {status}. {message}")]
    Rejected { status: u16, message: String },
    #[error("Unknown mail provider: {0}")]
    UnknownProvider(String),
}
