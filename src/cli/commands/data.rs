use clap::Subcommand;

use crate::cli::client::ApiClient;
use crate::cli::utils::{output_data, output_success, read_stdin_json};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum DataCommands {
    #[command(about = "List records, or one page of them")]
    List {
        #[arg(help = "Collection name")]
        schema: String,
        #[arg(long, help = "Zero-based page number")]
        page: Option<i64>,
        #[arg(long, help = "Page size")]
        size: Option<i64>,
        #[arg(long, help = "Sort, e.g. \"marks desc, student_name\"")]
        sort: Option<String>,
    },

    #[command(about = "Fetch one record by id")]
    Get {
        #[arg(help = "Collection name")]
        schema: String,
        #[arg(help = "Record ID")]
        id: i64,
    },

    #[command(about = "Create record(s) from stdin (object or array)")]
    Create {
        #[arg(help = "Collection name")]
        schema: String,
    },

    #[command(about = "Update a record from stdin")]
    Update {
        #[arg(help = "Collection name")]
        schema: String,
        #[arg(help = "Record ID to update")]
        id: i64,
        #[arg(long, help = "Merge the given fields instead of replacing the record")]
        merge: bool,
    },

    #[command(about = "Delete one record, or every record with --all")]
    Delete {
        #[arg(help = "Collection name")]
        schema: String,
        #[arg(help = "Record ID to delete", required_unless_present = "all")]
        id: Option<i64>,
        #[arg(long, help = "Delete every record in the collection")]
        all: bool,
    },
}

fn list_path(schema: &str, page: Option<i64>, size: Option<i64>, sort: Option<&str>) -> String {
    let mut query = Vec::new();
    if let Some(page) = page {
        query.push(format!("page={}", page));
    }
    if let Some(size) = size {
        query.push(format!("size={}", size));
    }
    if let Some(sort) = sort {
        query.push(format!("sort={}", sort.replace(' ', "%20").replace(',', "%2C")));
    }

    if query.is_empty() {
        format!("/api/data/{}", schema)
    } else {
        format!("/api/data/{}?{}", schema, query.join("&"))
    }
}

pub async fn handle(cmd: DataCommands, client: &ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        DataCommands::List { schema, page, size, sort } => {
            let data = client.get(&list_path(&schema, page, size, sort.as_deref())).await?;
            output_data(&output_format, &data)
        }
        DataCommands::Get { schema, id } => {
            let data = client.get(&format!("/api/data/{}/{}", schema, id)).await?;
            output_data(&output_format, &data)
        }
        DataCommands::Create { schema } => {
            let body = read_stdin_json()?;
            let data = client.post(&format!("/api/data/{}", schema), body).await?;
            output_data(&output_format, &data)
        }
        DataCommands::Update { schema, id, merge } => {
            let body = read_stdin_json()?;
            let path = format!("/api/data/{}/{}", schema, id);
            let data = if merge {
                client.patch(&path, body).await?
            } else {
                client.put(&path, body).await?
            };
            output_data(&output_format, &data)
        }
        DataCommands::Delete { schema, id: Some(id), all: false } => {
            client.delete(&format!("/api/data/{}/{}", schema, id)).await?;
            output_success(&output_format, &format!("Deleted {} {}", schema, id), None)
        }
        DataCommands::Delete { schema, .. } => {
            client.delete(&format!("/api/data/{}", schema)).await?;
            output_success(&output_format, &format!("Deleted all records in {}", schema), None)
        }
    }
}
