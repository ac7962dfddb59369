//! Document-store adapters.
//!
//! Persistence is an external collaborator: handlers only see the repository
//! traits below. The bundled [`memory::MemoryStore`] backend keeps documents
//! in process and is the default for single-node deployments and tests;
//! swapping in a real document database means implementing these traits.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::token::Role;

pub mod memory;
pub mod password;

pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error("record not found")]
    NotFound,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// User document. Mutated by registration, login (last-login stamp), and the
/// verify/reset flows; never deleted by this service.
#[derive(Clone, Debug)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub verified: bool,
    pub reputation: i64,
    pub verification_token_hash: Option<Vec<u8>>,
    pub verification_expires_unix: Option<i64>,
    pub reset_token_hash: Option<Vec<u8>>,
    pub reset_expires_unix: Option<i64>,
    pub created_at_unix: i64,
    pub last_login_unix: Option<i64>,
}

/// Fields required to create a user. The email must already be normalized and
/// the password already hashed; the store never sees raw credentials.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub verification_token_hash: Vec<u8>,
    pub verification_expires_unix: i64,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>>;
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<UserRecord>>;
    /// Lookup by verification-token hash; raw tokens never reach the store.
    async fn find_by_verification_token_hash(
        &self,
        token_hash: &[u8],
    ) -> StoreResult<Option<UserRecord>>;
    async fn find_by_reset_token_hash(&self, token_hash: &[u8])
    -> StoreResult<Option<UserRecord>>;
    /// Create a user, failing with [`StoreError::DuplicateEmail`] when the
    /// normalized email is taken. Must be atomic: of two concurrent creates
    /// for one email, exactly one succeeds.
    async fn create(&self, new_user: NewUser) -> StoreResult<UserRecord>;
    async fn save(&self, record: &UserRecord) -> StoreResult<()>;
}

/// Question document.
#[derive(Clone, Debug)]
pub struct QuestionRecord {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
    pub created_at_unix: i64,
    pub updated_at_unix: i64,
}

#[derive(Clone, Debug)]
pub struct NewQuestion {
    pub author_id: Uuid,
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
}

#[async_trait]
pub trait QuestionStore: Send + Sync {
    /// All questions, newest first.
    async fn list(&self) -> StoreResult<Vec<QuestionRecord>>;
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<QuestionRecord>>;
    async fn create(&self, new_question: NewQuestion) -> StoreResult<QuestionRecord>;
    async fn save(&self, record: &QuestionRecord) -> StoreResult<()>;
    /// Returns `false` when the question was already absent.
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;
}

/// Answer document.
#[derive(Clone, Debug)]
pub struct AnswerRecord {
    pub id: Uuid,
    pub question_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    pub created_at_unix: i64,
}

#[derive(Clone, Debug)]
pub struct NewAnswer {
    pub question_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
}

#[async_trait]
pub trait AnswerStore: Send + Sync {
    /// Answers for one question, oldest first.
    async fn list_for_question(&self, question_id: Uuid) -> StoreResult<Vec<AnswerRecord>>;
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<AnswerRecord>>;
    async fn create(&self, new_answer: NewAnswer) -> StoreResult<AnswerRecord>;
    /// Returns `false` when the answer was already absent.
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;
    /// Cascade used when a question is removed; returns how many were dropped.
    async fn delete_for_question(&self, question_id: Uuid) -> StoreResult<u64>;
}
