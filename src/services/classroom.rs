//! Classroom workflows: registration, questions, and classify-and-persist.

use super::{QuestionClassifier, StorageService};
use crate::llm::LlmProvider;
use crate::models::{
    ClassificationResult, QUESTIONS, Question, QuestionView, RecordId, STUDENTS, Student,
};
use crate::storage::Query;
use crate::{Error, Result};
use serde_json::{Value, json};
use std::collections::HashMap;
use tracing::instrument;

/// Application service combining storage and classification.
pub struct ClassroomService<'a, P: LlmProvider> {
    storage: &'a StorageService,
    classifier: &'a QuestionClassifier<P>,
}

impl<'a, P: LlmProvider> ClassroomService<'a, P> {
    /// Creates the service over a connected storage service and a classifier.
    #[must_use]
    pub const fn new(storage: &'a StorageService, classifier: &'a QuestionClassifier<P>) -> Self {
        Self {
            storage,
            classifier,
        }
    }

    /// Registers a student.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if either field is blank or the external
    /// id is already registered. Storage is not modified in that case.
    #[instrument(skip(self, name))]
    pub fn register_student(&self, student_id: &str, name: &str) -> Result<Student> {
        let student_id = require_text("student_id", student_id)?;
        let name = require_text("name", name)?;

        if self.lookup_student(student_id)?.is_some() {
            return Err(Error::Validation(format!(
                "student id already exists: {student_id}"
            )));
        }

        let student = self
            .storage
            .create_model(STUDENTS, &Student::new(student_id, name))?;
        tracing::info!(id = ?student.id, "Registered student");
        Ok(student)
    }

    /// Registers several students, skipping ids that already exist (including
    /// repeats within the batch). Returns the students actually created.
    ///
    /// The whole batch is validated before anything is stored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming the first entry with a blank
    /// field, in which case nothing is created. Storage errors are returned
    /// as they occur.
    pub fn register_students<I, A, B>(&self, batch: I) -> Result<Vec<Student>>
    where
        I: IntoIterator<Item = (A, B)>,
        A: AsRef<str>,
        B: AsRef<str>,
    {
        let entries = batch
            .into_iter()
            .enumerate()
            .map(|(index, (student_id, name))| {
                Ok((
                    batch_field(index, "student_id", student_id.as_ref())?,
                    batch_field(index, "name", name.as_ref())?,
                ))
            })
            .collect::<Result<Vec<(String, String)>>>()?;

        let mut created = Vec::new();
        for (student_id, name) in entries {
            if self.lookup_student(&student_id)?.is_some() {
                tracing::debug!(student_id, "Skipping existing student");
                continue;
            }
            created.push(self.register_student(&student_id, &name)?);
        }
        Ok(created)
    }

    /// Returns every registered student.
    ///
    /// # Errors
    ///
    /// Returns storage or conversion errors.
    pub fn students(&self) -> Result<Vec<Student>> {
        self.storage.read_all_models(STUDENTS)
    }

    /// Finds a student by external id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no student has that id.
    pub fn student(&self, student_id: &str) -> Result<Student> {
        self.lookup_student(student_id)?
            .ok_or_else(|| Error::not_found(STUDENTS, student_id))
    }

    fn lookup_student(&self, student_id: &str) -> Result<Option<Student>> {
        let query = Query::new().eq("student_id", student_id);
        Ok(self
            .storage
            .query_models::<Student>(STUDENTS, &query)?
            .into_iter()
            .next())
    }

    /// Records a new, unclassified question for a student.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown student and
    /// [`Error::Validation`] for blank content.
    #[instrument(skip(self, content))]
    pub fn ask_question(&self, student_id: &str, content: &str) -> Result<Question> {
        let content = require_text("content", content)?;
        let student = self.student(student_id)?;
        let owner = student
            .id
            .ok_or_else(|| Error::Validation("stored student has no id".to_string()))?;

        let question = self
            .storage
            .create_model(QUESTIONS, &Question::new(owner, content))?;
        tracing::info!(id = ?question.id, "Recorded question");
        Ok(question)
    }

    /// Returns every question joined with its student.
    ///
    /// # Errors
    ///
    /// Returns storage or conversion errors.
    pub fn questions(&self) -> Result<Vec<QuestionView>> {
        let questions = self.storage.read_all_models(QUESTIONS)?;
        self.join_students(questions)
    }

    /// Returns questions that carry a category, including the sentinel.
    ///
    /// # Errors
    ///
    /// Returns storage or conversion errors.
    pub fn classified_questions(&self) -> Result<Vec<QuestionView>> {
        let query = Query::new().ne("category", Value::Null);
        let questions = self.storage.query_models(QUESTIONS, &query)?;
        self.join_students(questions)
    }

    fn join_students(&self, questions: Vec<Question>) -> Result<Vec<QuestionView>> {
        let students: HashMap<RecordId, Student> = self
            .students()?
            .into_iter()
            .filter_map(|s| s.id.map(|id| (id, s)))
            .collect();

        Ok(questions
            .into_iter()
            .filter_map(|q| {
                let id = q.id?;
                let Some(student) = students.get(&q.student_id) else {
                    tracing::debug!(id, student = q.student_id, "Skipping orphaned question");
                    return None;
                };
                Some(QuestionView {
                    id,
                    content: q.content,
                    category: q.category,
                    student_id: student.student_id.clone(),
                    student_name: student.name.clone(),
                })
            })
            .collect())
    }

    /// Classifies a stored question and persists its category.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id, or storage errors when
    /// persisting. Classification itself never fails.
    #[instrument(skip(self))]
    pub fn classify_question(&self, id: RecordId) -> Result<ClassificationResult> {
        let question: Question = self.storage.read_model(QUESTIONS, id)?;
        let result = self.classifier.classify(&question.content);
        self.store_category(id, &result)?;
        Ok(result)
    }

    /// Classifies every question without a category, persisting each result.
    ///
    /// Returns `(question id, result)` pairs in storage order.
    ///
    /// # Errors
    ///
    /// Returns storage errors.
    #[instrument(skip(self))]
    pub fn classify_pending(&self) -> Result<Vec<(RecordId, ClassificationResult)>> {
        let query = Query::new().eq("category", Value::Null);
        let pending: Vec<(RecordId, String)> = self
            .storage
            .query_models::<Question>(QUESTIONS, &query)?
            .into_iter()
            .filter_map(|q| q.id.map(|id| (id, q.content)))
            .collect();

        let contents: Vec<&str> = pending.iter().map(|(_, c)| c.as_str()).collect();
        let results = self.classifier.classify_batch(&contents);

        let mut classified = Vec::with_capacity(results.len());
        for ((id, _), result) in pending.iter().zip(results) {
            self.store_category(*id, &result)?;
            classified.push((*id, result));
        }
        tracing::info!(count = classified.len(), "Classified pending questions");
        Ok(classified)
    }

    /// Classifies free text without storing anything.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for blank text.
    pub fn classify_text(&self, text: &str) -> Result<ClassificationResult> {
        let text = require_text("content", text)?;
        Ok(self.classifier.classify(text))
    }

    fn store_category(&self, id: RecordId, result: &ClassificationResult) -> Result<()> {
        let partial = crate::models::record::record_from(json!({"category": result.category}));
        self.storage.update(QUESTIONS, id, partial)?;
        Ok(())
    }
}

fn require_text<'t>(field: &str, value: &'t str) -> Result<&'t str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation(format!("{field} must not be blank")));
    }
    Ok(trimmed)
}

fn batch_field(index: usize, field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation(format!(
            "entry {index}: {field} must not be blank"
        )));
    }
    Ok(trimmed.to_string())
}
