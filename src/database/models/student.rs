use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::database::entity::Entity;
use crate::database::error::RepositoryError;
use crate::database::record::RecordId;
use crate::database::repository::Repository;
use crate::database::schema::{FieldDef, Schema};
use crate::filter::error::FilterError;
use crate::filter::finder::Finder;
use crate::filter::types::{FilterOp, SortSpec};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub student_name: String,
    #[serde(default)]
    pub student_roll_no: Option<i64>,
    #[serde(default)]
    pub marks: Option<i64>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
}

impl Student {
    pub fn new(student_name: impl Into<String>) -> Self {
        Self {
            id: None,
            student_name: student_name.into(),
            student_roll_no: None,
            marks: None,
            subject: None,
            grade: None,
            result: None,
        }
    }
}

impl Entity for Student {
    const COLLECTION: &'static str = "students";

    fn schema() -> Schema {
        Schema::new(Self::COLLECTION)
            .field(FieldDef::text("student_name").required().not_blank())
            .field(FieldDef::integer("student_roll_no"))
            .field(FieldDef::integer("marks").min(0).max(100))
            .field(FieldDef::text("subject"))
            .field(FieldDef::text("grade"))
            .field(FieldDef::text("result"))
    }

    fn finders(schema: &Schema) -> Result<Vec<Finder>, FilterError> {
        let toppers = Finder::by_op("marks", FilterOp::Gte)
            .and("subject")
            .ignore_case()
            .order_by(SortSpec::desc("marks"))
            .named("findToppers");
        toppers.validate(schema)?;

        Ok(vec![
            Finder::parse("findByStudentName", schema)?,
            Finder::parse("findByStudentNameOrResult", schema)?,
            Finder::parse("findByStudentNameAndResult", schema)?,
            Finder::parse("findByMarksBetweenOrderByMarksDesc", schema)?,
            Finder::parse("countByResult", schema)?,
            toppers,
        ])
    }

    fn id(&self) -> Option<RecordId> {
        self.id
    }

    fn set_id(&mut self, id: Option<RecordId>) {
        self.id = id;
    }
}

impl Repository<Student> {
    pub async fn find_by_student_name(&self, student_name: &str) -> Result<Vec<Student>, RepositoryError> {
        self.find_named("findByStudentName", vec![json!(student_name)]).await
    }

    pub async fn find_by_student_name_or_result(
        &self,
        student_name: &str,
        result: &str,
    ) -> Result<Vec<Student>, RepositoryError> {
        self.find_named("findByStudentNameOrResult", vec![json!(student_name), json!(result)])
            .await
    }

    pub async fn find_by_student_name_and_result(
        &self,
        student_name: &str,
        result: &str,
    ) -> Result<Vec<Student>, RepositoryError> {
        self.find_named("findByStudentNameAndResult", vec![json!(student_name), json!(result)])
            .await
    }

    /// Students scoring at least `min_marks` in `subject`, best first.
    pub async fn find_toppers(&self, min_marks: i64, subject: &str) -> Result<Vec<Student>, RepositoryError> {
        self.find_named("findToppers", vec![json!(min_marks), json!(subject)]).await
    }
}
