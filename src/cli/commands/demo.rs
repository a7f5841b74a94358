use serde_json::{json, Value};

use crate::cli::utils::{output_data, output_success};
use crate::cli::OutputFormat;
use crate::database::manager::Catalog;
use crate::database::models::Student;
use crate::services::seed;

/// Seeds a fresh store and runs the sample finders against it. Returns the
/// number of students seeded and each finder's result keyed by its call.
async fn run_finders() -> anyhow::Result<(usize, Value)> {
    let catalog = Catalog::with_defaults().await?;
    let students = catalog.repository::<Student>().await?;

    let seeded = seed::seed_students(&students).await?;
    let by_name = students.find_by_student_name("Rahul").await?;
    let name_or_result = students.find_by_student_name_or_result("Raj", "").await?;
    let name_and_result = students.find_by_student_name_and_result("Rahul", "Pass").await?;

    let results = json!({
        "findByStudentName(Rahul)": by_name,
        "findByStudentNameOrResult(Raj, \"\")": name_or_result,
        "findByStudentNameAndResult(Rahul, Pass)": name_and_result,
    });
    Ok((seeded.len(), results))
}

/// Prints what the sample finders return. Needs no running server.
pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let (seeded, results) = run_finders().await?;
    output_success(&output_format, &format!("Seeded {} students", seeded), None)?;
    output_data(&output_format, &results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sample_finders_return_the_expected_students() {
        let (seeded, results) = run_finders().await.unwrap();
        assert_eq!(seeded, 4);

        let names = |key: &str| -> Vec<String> {
            results[key]
                .as_array()
                .unwrap()
                .iter()
                .map(|s| s["student_name"].as_str().unwrap().to_string())
                .collect()
        };
        assert_eq!(names("findByStudentName(Rahul)"), vec!["Rahul"]);
        assert!(names("findByStudentNameOrResult(Raj, \"\")").is_empty());
        assert_eq!(names("findByStudentNameAndResult(Rahul, Pass)"), vec!["Rahul"]);
    }
}
