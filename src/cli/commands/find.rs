use clap::Subcommand;
use serde_json::{json, Value};

use crate::cli::client::ApiClient;
use crate::cli::utils::{output_data, parse_arg, read_stdin_json};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum FindCommands {
    #[command(about = "Run a where filter (JSON on stdin, or --where)")]
    Filter {
        #[arg(help = "Collection name")]
        schema: String,
        #[arg(long = "where", help = "Where clause as JSON, e.g. '{\"marks\":{\"$gte\":80}}'")]
        where_clause: Option<String>,
        #[arg(long, help = "Order, e.g. \"marks desc\"")]
        order: Option<String>,
        #[arg(long, help = "Maximum number of records")]
        limit: Option<usize>,
    },

    #[command(about = "List the finders declared for a collection")]
    Finders {
        #[arg(help = "Collection name")]
        schema: String,
    },

    #[command(about = "Run a declared finder by name")]
    Run {
        #[arg(help = "Collection name")]
        schema: String,
        #[arg(help = "Finder name, e.g. findByStudentNameOrResult")]
        finder: String,
        #[arg(help = "Finder arguments in declaration order (JSON or plain strings)")]
        args: Vec<String>,
    },
}

fn filter_body(where_clause: Option<Value>, order: Option<String>, limit: Option<usize>) -> Value {
    let mut body = json!({});
    if let Some(where_clause) = where_clause {
        body["where"] = where_clause;
    }
    if let Some(order) = order {
        body["order"] = json!(order);
    }
    if let Some(limit) = limit {
        body["limit"] = json!(limit);
    }
    body
}

pub async fn handle(cmd: FindCommands, client: &ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        FindCommands::Filter { schema, where_clause, order, limit } => {
            let where_clause = match where_clause {
                Some(raw) => Some(serde_json::from_str(&raw)?),
                None if order.is_none() && limit.is_none() => Some(read_stdin_json()?),
                None => None,
            };
            let data = client
                .post(&format!("/api/find/{}", schema), filter_body(where_clause, order, limit))
                .await?;
            output_data(&output_format, &data)
        }
        FindCommands::Finders { schema } => {
            let data = client.get(&format!("/api/find/{}", schema)).await?;
            output_data(&output_format, &data)
        }
        FindCommands::Run { schema, finder, args } => {
            let args: Vec<Value> = args.iter().map(|arg| parse_arg(arg)).collect();
            let data = client
                .post(&format!("/api/find/{}/{}", schema, finder), Value::Array(args))
                .await?;
            output_data(&output_format, &data)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_filter_bodies() {
        assert_eq!(filter_body(None, None, None), json!({}));
        assert_eq!(
            filter_body(Some(json!({"result": "Pass"})), Some("marks desc".into()), Some(5)),
            json!({"where": {"result": "Pass"}, "order": "marks desc", "limit": 5})
        );
    }
}
