//! In-process map-backed document store.

use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use async_trait::async_trait;

use super::{
    AnswerRecord, AnswerStore, NewAnswer, NewQuestion, NewUser, QuestionRecord, QuestionStore,
    StoreError, StoreResult, UserRecord, UserStore,
};
use crate::token::{Role, now_unix_seconds};

/// Single-node backend holding all documents in locked maps. Per-document
/// atomicity only: multi-record updates are not transactional, matching what
/// a document database would give the handlers.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, UserRecord>>,
    questions: RwLock<HashMap<Uuid, QuestionRecord>>,
    answers: RwLock<HashMap<Uuid, AnswerRecord>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        let users = self.users.read().await;
        Ok(users.values().find(|user| user.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<UserRecord>> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn find_by_verification_token_hash(
        &self,
        token_hash: &[u8],
    ) -> StoreResult<Option<UserRecord>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|user| {
                user.verification_token_hash
                    .as_deref()
                    .is_some_and(|stored| stored == token_hash)
            })
            .cloned())
    }

    async fn find_by_reset_token_hash(
        &self,
        token_hash: &[u8],
    ) -> StoreResult<Option<UserRecord>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|user| {
                user.reset_token_hash
                    .as_deref()
                    .is_some_and(|stored| stored == token_hash)
            })
            .cloned())
    }

    async fn create(&self, new_user: NewUser) -> StoreResult<UserRecord> {
        // Uniqueness check and insert under one write lock; concurrent
        // duplicate registrations admit exactly one.
        let mut users = self.users.write().await;
        if users.values().any(|user| user.email == new_user.email) {
            return Err(StoreError::DuplicateEmail);
        }
        let record = UserRecord {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            role: Role::User,
            verified: false,
            reputation: 0,
            verification_token_hash: Some(new_user.verification_token_hash),
            verification_expires_unix: Some(new_user.verification_expires_unix),
            reset_token_hash: None,
            reset_expires_unix: None,
            created_at_unix: now_unix_seconds(),
            last_login_unix: None,
        };
        users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn save(&self, record: &UserRecord) -> StoreResult<()> {
        let mut users = self.users.write().await;
        if !users.contains_key(&record.id) {
            return Err(StoreError::NotFound);
        }
        users.insert(record.id, record.clone());
        Ok(())
    }
}

#[async_trait]
impl QuestionStore for MemoryStore {
    async fn list(&self) -> StoreResult<Vec<QuestionRecord>> {
        let questions = self.questions.read().await;
        let mut all: Vec<QuestionRecord> = questions.values().cloned().collect();
        all.sort_by(|a, b| b.created_at_unix.cmp(&a.created_at_unix));
        Ok(all)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<QuestionRecord>> {
        let questions = self.questions.read().await;
        Ok(questions.get(&id).cloned())
    }

    async fn create(&self, new_question: NewQuestion) -> StoreResult<QuestionRecord> {
        let now = now_unix_seconds();
        let record = QuestionRecord {
            id: Uuid::new_v4(),
            author_id: new_question.author_id,
            title: new_question.title,
            body: new_question.body,
            tags: new_question.tags,
            created_at_unix: now,
            updated_at_unix: now,
        };
        let mut questions = self.questions.write().await;
        questions.insert(record.id, record.clone());
        Ok(record)
    }

    async fn save(&self, record: &QuestionRecord) -> StoreResult<()> {
        let mut questions = self.questions.write().await;
        if !questions.contains_key(&record.id) {
            return Err(StoreError::NotFound);
        }
        questions.insert(record.id, record.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut questions = self.questions.write().await;
        Ok(questions.remove(&id).is_some())
    }
}

#[async_trait]
impl AnswerStore for MemoryStore {
    async fn list_for_question(&self, question_id: Uuid) -> StoreResult<Vec<AnswerRecord>> {
        let answers = self.answers.read().await;
        let mut matching: Vec<AnswerRecord> = answers
            .values()
            .filter(|answer| answer.question_id == question_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.created_at_unix.cmp(&b.created_at_unix));
        Ok(matching)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<AnswerRecord>> {
        let answers = self.answers.read().await;
        Ok(answers.get(&id).cloned())
    }

    async fn create(&self, new_answer: NewAnswer) -> StoreResult<AnswerRecord> {
        let record = AnswerRecord {
            id: Uuid::new_v4(),
            question_id: new_answer.question_id,
            author_id: new_answer.author_id,
            body: new_answer.body,
            created_at_unix: now_unix_seconds(),
        };
        let mut answers = self.answers.write().await;
        answers.insert(record.id, record.clone());
        Ok(record)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut answers = self.answers.write().await;
        Ok(answers.remove(&id).is_some())
    }

    async fn delete_for_question(&self, question_id: Uuid) -> StoreResult<u64> {
        let mut answers = self.answers.write().await;
        let before = answers.len();
        answers.retain(|_, answer| answer.question_id != question_id);
        Ok(u64::try_from(before.saturating_sub(answers.len())).unwrap_or(u64::MAX))
    }
}
